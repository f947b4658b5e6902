//! Modifier snapshot business logic.
//!
//! When a server selects a modifier option for an order item, the option's
//! price adjustment is frozen onto the item at selection time; later catalog
//! edits never reach existing checks. Because a locked line's price is
//! immutable, its modifier set is too - selections cannot be added to or
//! removed from fired or completed items.

use crate::{
    core::order_item::get_order_item,
    entities::{OrderItemModifier, order_item_modifier},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};

/// Freezes a modifier selection onto an order item.
///
/// `price_adjustment` is the option's adjustment as observed in the catalog
/// right now; only this snapshot is ever read back.
pub async fn add_modifier(
    db: &DatabaseConnection,
    order_item_id: i64,
    modifier_id: i64,
    price_adjustment: f64,
) -> Result<order_item_modifier::Model> {
    if !price_adjustment.is_finite() {
        return Err(Error::Validation {
            message: format!("price_adjustment must be a finite amount, got {price_adjustment}"),
        });
    }

    let item = get_order_item(db, order_item_id)
        .await?
        .ok_or(Error::ItemNotFound { id: order_item_id })?;
    if item.is_locked {
        return Err(Error::LockedItem { id: order_item_id });
    }

    let selection = order_item_modifier::ActiveModel {
        order_item_id: Set(order_item_id),
        modifier_id: Set(modifier_id),
        price_adjustment: Set(price_adjustment),
        ..Default::default()
    };

    Ok(selection.insert(db).await?)
}

/// Retrieves the frozen modifier selections for an order item.
pub async fn get_modifiers_for_item(
    db: &DatabaseConnection,
    order_item_id: i64,
) -> Result<Vec<order_item_modifier::Model>> {
    OrderItemModifier::find()
        .filter(order_item_modifier::Column::OrderItemId.eq(order_item_id))
        .order_by_asc(order_item_modifier::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Removes a modifier selection from an unlocked order item.
pub async fn remove_modifier(db: &DatabaseConnection, id: i64) -> Result<()> {
    let selection = OrderItemModifier::find_by_id(id)
        .one(db)
        .await?
        .ok_or(Error::ModifierNotFound { id })?;

    let item = get_order_item(db, selection.order_item_id)
        .await?
        .ok_or(Error::ItemNotFound {
            id: selection.order_item_id,
        })?;
    if item.is_locked {
        return Err(Error::LockedItem {
            id: selection.order_item_id,
        });
    }

    OrderItemModifier::delete_by_id(id).exec(db).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::order_item::fire_item_now;
    use crate::test_utils::{
        ManualClock, create_test_item, create_test_order, setup_test_db, test_time,
    };

    #[tokio::test]
    async fn test_add_and_list_modifiers() -> Result<()> {
        let db = setup_test_db().await?;
        let clock = ManualClock::starting_at(test_time());
        let order = create_test_order(&db, &clock).await?;
        let item = create_test_item(&db, &clock, order.id).await?;

        add_modifier(&db, item.id, 3, 1.50).await?;
        add_modifier(&db, item.id, 9, -0.50).await?;

        let selections = get_modifiers_for_item(&db, item.id).await?;
        assert_eq!(selections.len(), 2);
        assert_eq!(selections[0].modifier_id, 3);
        assert_eq!(selections[0].price_adjustment, 1.50);
        assert_eq!(selections[1].price_adjustment, -0.50);
        Ok(())
    }

    #[tokio::test]
    async fn test_add_modifier_to_missing_item() -> Result<()> {
        let db = setup_test_db().await?;

        let result = add_modifier(&db, 404, 1, 0.50).await;
        assert!(matches!(result, Err(Error::ItemNotFound { id: 404 })));
        Ok(())
    }

    #[tokio::test]
    async fn test_locked_item_modifiers_are_frozen() -> Result<()> {
        let db = setup_test_db().await?;
        let clock = ManualClock::starting_at(test_time());
        let order = create_test_order(&db, &clock).await?;
        let item = create_test_item(&db, &clock, order.id).await?;
        let selection = add_modifier(&db, item.id, 3, 1.50).await?;
        fire_item_now(&db, &clock, item.id).await?;

        let result = add_modifier(&db, item.id, 4, 0.25).await;
        assert!(matches!(result, Err(Error::LockedItem { .. })));

        let result = remove_modifier(&db, selection.id).await;
        assert!(matches!(result, Err(Error::LockedItem { .. })));

        let selections = get_modifiers_for_item(&db, item.id).await?;
        assert_eq!(selections.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_remove_modifier() -> Result<()> {
        let db = setup_test_db().await?;
        let clock = ManualClock::starting_at(test_time());
        let order = create_test_order(&db, &clock).await?;
        let item = create_test_item(&db, &clock, order.id).await?;
        let selection = add_modifier(&db, item.id, 3, 1.50).await?;

        remove_modifier(&db, selection.id).await?;
        assert!(get_modifiers_for_item(&db, item.id).await?.is_empty());

        let result = remove_modifier(&db, selection.id).await;
        assert!(matches!(result, Err(Error::ModifierNotFound { .. })));
        Ok(())
    }
}
