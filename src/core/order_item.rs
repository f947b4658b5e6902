//! Order-item lifecycle business logic.
//!
//! Implements the state machine for one line on a check:
//!
//! ```text
//! draft --(send)--> pending --(expire | fire-now)--> fired --(complete)--> completed
//! draft --(fire-now)--------------------------------> fired
//! draft/pending --(delete)--> removed
//! draft/pending --(edit)----> same state (fields updated)
//! ```
//!
//! Items in `draft` have no timer; sending starts the delay window, and a
//! successful edit on a `pending` item restarts it so the server always gets a
//! fresh editing period. Once an item is locked (fired or completed) edits and
//! deletion are permanently forbidden. All mutating operations are conditional
//! updates guarded on the lock flag, so a concurrent sweep claim cannot be
//! overwritten; the loser of such a race observes the lock, not a double write.

use crate::{
    clock::Clock,
    entities::{OrderItem, OrderItemModifier, order_item, order_item::ItemStatus,
        order_item_modifier},
    errors::{Error, Result},
};
use chrono::Duration;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::debug;

/// Arguments for adding an item to an order.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    /// Order (check) the item is added to
    pub order_id: i64,
    /// Menu item reference; only the id is kept, the price below is a snapshot
    pub menu_item_id: i64,
    /// Units ordered, >= 1
    pub quantity: i32,
    /// Unit price snapshot at add-time, >= 0
    pub price: f64,
    /// Free-text kitchen instructions
    pub special_instructions: Option<String>,
    /// Delay window for this item, in seconds
    pub delay_seconds: i32,
}

/// Field changes for an edit; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct OrderItemChanges {
    /// New quantity, >= 1
    pub quantity: Option<i32>,
    /// New unit price, >= 0
    pub price: Option<f64>,
    /// New special instructions
    pub special_instructions: Option<String>,
}

fn validate_quantity(quantity: i32) -> Result<()> {
    if quantity < 1 {
        return Err(Error::Validation {
            message: format!("quantity must be at least 1, got {quantity}"),
        });
    }
    Ok(())
}

fn validate_price(price: f64) -> Result<()> {
    if !price.is_finite() || price < 0.0 {
        return Err(Error::Validation {
            message: format!("price must be a non-negative amount, got {price}"),
        });
    }
    Ok(())
}

/// Adds a new item to an order. The item starts in `draft`, unlocked, with no
/// delay timer running; the timer starts only when the order is sent.
pub async fn create_order_item(
    db: &DatabaseConnection,
    clock: &dyn Clock,
    args: NewOrderItem,
) -> Result<order_item::Model> {
    validate_quantity(args.quantity)?;
    validate_price(args.price)?;
    if args.delay_seconds < 0 {
        return Err(Error::Validation {
            message: format!(
                "delay_seconds must be non-negative, got {}",
                args.delay_seconds
            ),
        });
    }

    let item = order_item::ActiveModel {
        order_id: Set(args.order_id),
        menu_item_id: Set(args.menu_item_id),
        quantity: Set(args.quantity),
        price: Set(args.price),
        special_instructions: Set(args.special_instructions),
        status: Set(ItemStatus::Draft),
        delay_seconds: Set(args.delay_seconds),
        delay_expires_at: Set(None),
        is_locked: Set(false),
        created_at: Set(clock.now()),
        fired_at: Set(None),
        completed_at: Set(None),
        ..Default::default()
    };

    Ok(item.insert(db).await?)
}

/// Finds an order item by its unique id.
pub async fn get_order_item(
    db: &DatabaseConnection,
    id: i64,
) -> Result<Option<order_item::Model>> {
    OrderItem::find_by_id(id).one(db).await.map_err(Into::into)
}

/// Retrieves the items on an order, optionally filtered by status.
pub async fn get_items_for_order(
    db: &DatabaseConnection,
    order_id: i64,
    status: Option<ItemStatus>,
) -> Result<Vec<order_item::Model>> {
    let mut query = OrderItem::find().filter(order_item::Column::OrderId.eq(order_id));
    if let Some(status) = status {
        query = query.filter(order_item::Column::Status.eq(status));
    }
    query
        .order_by_asc(order_item::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves all items in a given lifecycle status across orders.
pub async fn get_items_by_status(
    db: &DatabaseConnection,
    status: ItemStatus,
) -> Result<Vec<order_item::Model>> {
    OrderItem::find()
        .filter(order_item::Column::Status.eq(status))
        .order_by_asc(order_item::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Edits an unlocked item's quantity, price, or instructions.
///
/// Editing a `pending` item resets its delay window to a full
/// `delay_seconds` from now, so an edit near the deadline can never slip
/// through half-reviewed. The write is conditioned on the item still being
/// unlocked; if the sweep locks it between our read and our write, the edit is
/// rejected with [`Error::LockedItem`] and nothing changes.
pub async fn update_order_item(
    db: &DatabaseConnection,
    clock: &dyn Clock,
    id: i64,
    changes: OrderItemChanges,
) -> Result<order_item::Model> {
    if let Some(quantity) = changes.quantity {
        validate_quantity(quantity)?;
    }
    if let Some(price) = changes.price {
        validate_price(price)?;
    }

    let existing = get_order_item(db, id)
        .await?
        .ok_or(Error::ItemNotFound { id })?;
    if existing.is_locked {
        return Err(Error::LockedItem { id });
    }

    let has_field_changes = changes.quantity.is_some()
        || changes.price.is_some()
        || changes.special_instructions.is_some();
    if !has_field_changes && existing.status != ItemStatus::Pending {
        return Ok(existing);
    }

    let mut updated = <order_item::ActiveModel as Default>::default();
    if let Some(quantity) = changes.quantity {
        updated.quantity = Set(quantity);
    }
    if let Some(price) = changes.price {
        updated.price = Set(price);
    }
    if let Some(instructions) = changes.special_instructions {
        updated.special_instructions = Set(Some(instructions));
    }
    if existing.status == ItemStatus::Pending {
        let expires = clock.now() + Duration::seconds(i64::from(existing.delay_seconds));
        updated.delay_expires_at = Set(Some(expires));
    }

    let result = OrderItem::update_many()
        .set(updated)
        .filter(order_item::Column::Id.eq(id))
        .filter(order_item::Column::IsLocked.eq(false))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        // Lost a race: the sweep (or a manual fire) locked the row between
        // our read and our write.
        return match get_order_item(db, id).await? {
            Some(_) => Err(Error::LockedItem { id }),
            None => Err(Error::ItemNotFound { id }),
        };
    }

    get_order_item(db, id)
        .await?
        .ok_or(Error::ItemNotFound { id })
}

/// Sends every `draft` item on an order to the kitchen, starting each item's
/// delay window. Items not in `draft` are left untouched and not returned, so
/// repeated sends are harmless.
pub async fn send_items_for_order(
    db: &DatabaseConnection,
    clock: &dyn Clock,
    order_id: i64,
) -> Result<Vec<order_item::Model>> {
    let drafts = get_items_for_order(db, order_id, Some(ItemStatus::Draft)).await?;
    let now = clock.now();

    let mut sent = Vec::with_capacity(drafts.len());
    for item in drafts {
        let expires = now + Duration::seconds(i64::from(item.delay_seconds));
        let result = OrderItem::update_many()
            .set(order_item::ActiveModel {
                status: Set(ItemStatus::Pending),
                delay_expires_at: Set(Some(expires)),
                ..Default::default()
            })
            .filter(order_item::Column::Id.eq(item.id))
            .filter(order_item::Column::Status.eq(ItemStatus::Draft))
            .filter(order_item::Column::IsLocked.eq(false))
            .exec(db)
            .await?;

        if result.rows_affected == 0 {
            debug!(item_id = item.id, "draft item changed before send; skipping");
            continue;
        }
        if let Some(updated) = get_order_item(db, item.id).await? {
            sent.push(updated);
        }
    }

    Ok(sent)
}

/// Fires an item immediately, bypassing the delay timer.
///
/// Legal from `draft` (skipping `pending` entirely) and from `pending`. The
/// claim is conditioned on the row still being unlocked at write time, so a
/// fire-now racing the sweep on the same item produces exactly one `fired`
/// transition and one `fired_at` value; the loser gets
/// [`Error::InvalidItemState`].
pub async fn fire_item_now(
    db: &DatabaseConnection,
    clock: &dyn Clock,
    id: i64,
) -> Result<order_item::Model> {
    let existing = get_order_item(db, id)
        .await?
        .ok_or(Error::ItemNotFound { id })?;
    if existing.is_locked {
        return Err(Error::InvalidItemState {
            id,
            status: existing.status,
            action: "fire",
        });
    }

    let result = OrderItem::update_many()
        .set(order_item::ActiveModel {
            status: Set(ItemStatus::Fired),
            is_locked: Set(true),
            fired_at: Set(Some(clock.now())),
            delay_expires_at: Set(None),
            ..Default::default()
        })
        .filter(order_item::Column::Id.eq(id))
        .filter(order_item::Column::IsLocked.eq(false))
        .filter(
            order_item::Column::Status.is_in([ItemStatus::Draft, ItemStatus::Pending]),
        )
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return match get_order_item(db, id).await? {
            Some(current) => Err(Error::InvalidItemState {
                id,
                status: current.status,
                action: "fire",
            }),
            None => Err(Error::ItemNotFound { id }),
        };
    }

    get_order_item(db, id)
        .await?
        .ok_or(Error::ItemNotFound { id })
}

/// Marks a fired item as completed by the kitchen. The item stays locked;
/// `completed` is terminal.
pub async fn complete_item(
    db: &DatabaseConnection,
    clock: &dyn Clock,
    id: i64,
) -> Result<order_item::Model> {
    let existing = get_order_item(db, id)
        .await?
        .ok_or(Error::ItemNotFound { id })?;
    if existing.status != ItemStatus::Fired {
        return Err(Error::InvalidItemState {
            id,
            status: existing.status,
            action: "complete",
        });
    }

    let result = OrderItem::update_many()
        .set(order_item::ActiveModel {
            status: Set(ItemStatus::Completed),
            completed_at: Set(Some(clock.now())),
            ..Default::default()
        })
        .filter(order_item::Column::Id.eq(id))
        .filter(order_item::Column::Status.eq(ItemStatus::Fired))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return match get_order_item(db, id).await? {
            Some(current) => Err(Error::InvalidItemState {
                id,
                status: current.status,
                action: "complete",
            }),
            None => Err(Error::ItemNotFound { id }),
        };
    }

    get_order_item(db, id)
        .await?
        .ok_or(Error::ItemNotFound { id })
}

/// Hard-deletes an unlocked item and its modifier selections. Deleting a
/// locked item is rejected; the delete is conditioned on the lock flag so an
/// item locked concurrently by the sweep survives intact.
pub async fn delete_order_item(db: &DatabaseConnection, id: i64) -> Result<()> {
    let existing = get_order_item(db, id)
        .await?
        .ok_or(Error::ItemNotFound { id })?;
    if existing.is_locked {
        return Err(Error::LockedItem { id });
    }

    // Modifier selections go first so the item row's foreign key resolves;
    // the transaction rolls them back if the guarded item delete loses a race.
    let txn = db.begin().await?;

    OrderItemModifier::delete_many()
        .filter(order_item_modifier::Column::OrderItemId.eq(id))
        .exec(&txn)
        .await?;

    let result = OrderItem::delete_many()
        .filter(order_item::Column::Id.eq(id))
        .filter(order_item::Column::IsLocked.eq(false))
        .exec(&txn)
        .await?;

    if result.rows_affected == 0 {
        txn.rollback().await?;
        return match get_order_item(db, id).await? {
            Some(_) => Err(Error::LockedItem { id }),
            // Someone else deleted it first; the outcome the caller wanted.
            None => Ok(()),
        };
    }

    txn.commit().await?;
    Ok(())
}

/// Computes one line's total: `quantity * (price + sum of frozen modifier
/// adjustments)`. Adjustments come from the item's modifier snapshots, never
/// the live catalog.
pub async fn line_total(db: &DatabaseConnection, item: &order_item::Model) -> Result<f64> {
    let adjustment: f64 = OrderItemModifier::find()
        .filter(order_item_modifier::Column::OrderItemId.eq(item.id))
        .all(db)
        .await?
        .iter()
        .map(|m| m.price_adjustment)
        .sum();

    Ok(f64::from(item.quantity) * (item.price + adjustment))
}

/// Sums the line totals of every item currently on an order. Convenience for
/// callers of the order aggregate's totals recomputation, which takes the
/// subtotal as input.
pub async fn order_subtotal(db: &DatabaseConnection, order_id: i64) -> Result<f64> {
    let items = get_items_for_order(db, order_id, None).await?;
    let mut subtotal = 0.0;
    for item in &items {
        subtotal += line_total(db, item).await?;
    }
    Ok(subtotal)
}
