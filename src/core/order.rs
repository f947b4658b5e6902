//! Order aggregate business logic.
//!
//! Orders represent the entire check for a table and stay open throughout the
//! meal; the delay timer lives on the order items. Totals are not recomputed
//! on every item event - the caller reads the current line totals, sums them,
//! and asks this module to persist subtotal, tax, and total in one step.

use crate::{
    clock::Clock,
    entities::{
        Order, OrderItem, order,
        order::{OrderStatus, OrderType},
        order_item, order_item::ItemStatus,
    },
    errors::{Error, Result},
};
use sea_orm::{PaginatorTrait, QueryOrder, Set, prelude::*};

/// Rounds a dollar amount to cents, half-up.
fn round_to_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Opens a new check for a table. Starts `open` with zero totals.
pub async fn create_order(
    db: &DatabaseConnection,
    clock: &dyn Clock,
    table_id: i64,
    order_type: OrderType,
) -> Result<order::Model> {
    let new_order = order::ActiveModel {
        table_id: Set(table_id),
        order_type: Set(order_type),
        status: Set(OrderStatus::Open),
        subtotal: Set(0.0),
        tax: Set(0.0),
        total: Set(0.0),
        created_at: Set(clock.now()),
        completed_at: Set(None),
        ..Default::default()
    };

    Ok(new_order.insert(db).await?)
}

/// Finds an order by its unique id.
pub async fn get_order(db: &DatabaseConnection, id: i64) -> Result<Option<order::Model>> {
    Order::find_by_id(id).one(db).await.map_err(Into::into)
}

/// Retrieves the orders for a table, optionally filtered by status.
pub async fn get_orders_for_table(
    db: &DatabaseConnection,
    table_id: i64,
    status: Option<OrderStatus>,
) -> Result<Vec<order::Model>> {
    let mut query = Order::find().filter(order::Column::TableId.eq(table_id));
    if let Some(status) = status {
        query = query.filter(order::Column::Status.eq(status));
    }
    query
        .order_by_asc(order::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves all orders in a given status.
pub async fn get_orders_by_status(
    db: &DatabaseConnection,
    status: OrderStatus,
) -> Result<Vec<order::Model>> {
    Order::find()
        .filter(order::Column::Status.eq(status))
        .order_by_asc(order::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves all orders opened within a time frame.
pub async fn get_orders_between(
    db: &DatabaseConnection,
    start: DateTimeUtc,
    end: DateTimeUtc,
) -> Result<Vec<order::Model>> {
    Order::find()
        .filter(order::Column::CreatedAt.gte(start))
        .filter(order::Column::CreatedAt.lte(end))
        .order_by_asc(order::Column::CreatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Recomputes and persists an order's totals from a caller-supplied subtotal.
///
/// `tax = round(subtotal * tax_rate)` half-up to cents; `total = subtotal +
/// tax`. The caller computes the subtotal by summing current line totals (see
/// [`crate::core::order_item::order_subtotal`]); this aggregate does not
/// enumerate items itself.
pub async fn recompute_totals(
    db: &DatabaseConnection,
    id: i64,
    subtotal: f64,
    tax_rate: f64,
) -> Result<order::Model> {
    if !subtotal.is_finite() || subtotal < 0.0 {
        return Err(Error::Validation {
            message: format!("subtotal must be a non-negative amount, got {subtotal}"),
        });
    }
    if !tax_rate.is_finite() || tax_rate < 0.0 {
        return Err(Error::Validation {
            message: format!("tax_rate must be non-negative, got {tax_rate}"),
        });
    }

    let existing = get_order(db, id).await?.ok_or(Error::OrderNotFound { id })?;

    let tax = round_to_cents(subtotal * tax_rate);
    let total = subtotal + tax;

    let mut updated: order::ActiveModel = existing.into();
    updated.subtotal = Set(subtotal);
    updated.tax = Set(tax);
    updated.total = Set(total);

    Ok(updated.update(db).await?)
}

/// Closes out an order: `open` to `completed`, terminal.
///
/// When `require_items_fired` is false (the default policy), the check may be
/// closed while it still holds draft or pending items - whether that is
/// sensible is a business decision left to the caller. When true, closing
/// with un-fired items is rejected with [`Error::UnfiredItems`]. The status
/// write is conditioned on the order still being open, so a completed order
/// is never re-stamped.
pub async fn complete_order(
    db: &DatabaseConnection,
    clock: &dyn Clock,
    id: i64,
    require_items_fired: bool,
) -> Result<order::Model> {
    let existing = get_order(db, id).await?.ok_or(Error::OrderNotFound { id })?;
    if existing.status != OrderStatus::Open {
        return Err(Error::InvalidOrderState {
            id,
            status: existing.status,
            action: "complete",
        });
    }

    if require_items_fired {
        let unfired = OrderItem::find()
            .filter(order_item::Column::OrderId.eq(id))
            .filter(
                order_item::Column::Status.is_in([ItemStatus::Draft, ItemStatus::Pending]),
            )
            .count(db)
            .await?;
        if unfired > 0 {
            return Err(Error::UnfiredItems { id, count: unfired });
        }
    }

    let result = Order::update_many()
        .set(order::ActiveModel {
            status: Set(OrderStatus::Completed),
            completed_at: Set(Some(clock.now())),
            ..Default::default()
        })
        .filter(order::Column::Id.eq(id))
        .filter(order::Column::Status.eq(OrderStatus::Open))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return match get_order(db, id).await? {
            Some(current) => Err(Error::InvalidOrderState {
                id,
                status: current.status,
                action: "complete",
            }),
            None => Err(Error::OrderNotFound { id }),
        };
    }

    get_order(db, id).await?.ok_or(Error::OrderNotFound { id })
}
