//! Expiry sweep - fires items whose delay window has elapsed.
//!
//! The delay window is a persisted deadline (`delay_expires_at`), not a live
//! in-memory timer, so a restarted sweep resumes firing from store state. Each
//! tick scans for pending, unlocked items whose deadline has passed and claims
//! them one at a time with a conditional update that re-checks the row's
//! status and lock flag at write time. A claim that misses - because a manual
//! fire-now, an edit, a delete, or another sweep instance got there first - is
//! a lost race, not an error; it is skipped silently. Duplicate sweep
//! instances are therefore harmless.

use crate::{
    clock::Clock,
    entities::{OrderItem, order_item, order_item::ItemStatus},
    errors::Result,
};
use sea_orm::{DatabaseConnection, Set, prelude::*};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Runs one sweep tick: locks and fires every pending item whose delay window
/// has elapsed at `clock.now()`. Returns exactly the items this invocation
/// transitioned, for downstream notification; items lost to a concurrent
/// actor are absent from the result.
pub async fn sweep_expired_items(
    db: &DatabaseConnection,
    clock: &dyn Clock,
) -> Result<Vec<order_item::Model>> {
    let now = clock.now();

    let candidates = OrderItem::find()
        .filter(order_item::Column::Status.eq(ItemStatus::Pending))
        .filter(order_item::Column::IsLocked.eq(false))
        .filter(order_item::Column::DelayExpiresAt.lte(now))
        .all(db)
        .await?;

    let mut fired = Vec::with_capacity(candidates.len());
    for item in candidates {
        // Atomic claim: the row must still be pending and unlocked at write
        // time, otherwise another actor already transitioned it.
        let result = OrderItem::update_many()
            .set(order_item::ActiveModel {
                status: Set(ItemStatus::Fired),
                is_locked: Set(true),
                fired_at: Set(Some(now)),
                delay_expires_at: Set(None),
                ..Default::default()
            })
            .filter(order_item::Column::Id.eq(item.id))
            .filter(order_item::Column::Status.eq(ItemStatus::Pending))
            .filter(order_item::Column::IsLocked.eq(false))
            .exec(db)
            .await?;

        if result.rows_affected == 0 {
            debug!(item_id = item.id, "claim lost to a concurrent actor; skipping");
            continue;
        }

        if let Some(updated) = OrderItem::find_by_id(item.id).one(db).await? {
            fired.push(updated);
        }
    }

    if !fired.is_empty() {
        info!(count = fired.len(), "fired expired order items");
    }

    Ok(fired)
}

/// Recurring sweep task. Ticks on a fixed period, calling
/// [`sweep_expired_items`] each time; a failed tick is logged and the loop
/// keeps running. Intended to be spawned once per service instance, though
/// concurrent instances stay correct because every claim is per-item.
pub async fn run_sweep_loop(db: DatabaseConnection, clock: Arc<dyn Clock>, period: Duration) {
    let mut ticker = tokio::time::interval(period);

    // The first tick completes immediately to align the interval.
    ticker.tick().await;
    info!(period_secs = period.as_secs(), "expiry sweep loop started");

    loop {
        ticker.tick().await;

        match sweep_expired_items(&db, clock.as_ref()).await {
            Ok(fired) => {
                for item in &fired {
                    debug!(
                        item_id = item.id,
                        order_id = item.order_id,
                        "item dispatched to kitchen queue"
                    );
                }
            }
            Err(e) => error!(error = %e, "expiry sweep tick failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::order_item::{
        OrderItemChanges, fire_item_now, get_order_item, send_items_for_order,
        update_order_item,
    };
    use crate::errors::Error;
    use crate::test_utils::{
        ManualClock, create_test_item, create_test_order, setup_test_db, test_time,
    };

    #[tokio::test]
    async fn test_sweep_fires_only_expired_items() -> Result<()> {
        let db = setup_test_db().await?;
        let clock = ManualClock::starting_at(test_time());
        let order = create_test_order(&db, &clock).await?;

        let expiring = create_test_item(&db, &clock, order.id).await?;
        send_items_for_order(&db, &clock, order.id).await?;

        // Second item sent 10 seconds later; its window is still open when
        // the first one expires.
        clock.advance_secs(10);
        let fresh = create_test_item(&db, &clock, order.id).await?;
        send_items_for_order(&db, &clock, order.id).await?;

        clock.advance_secs(6); // 16s after the first send, 6s after the second
        let fired = sweep_expired_items(&db, &clock).await?;
        let fired_ids: Vec<i64> = fired.iter().map(|i| i.id).collect();
        assert_eq!(fired_ids, vec![expiring.id]);

        let swept = get_order_item(&db, expiring.id).await?.unwrap();
        assert_eq!(swept.status, ItemStatus::Fired);
        assert!(swept.is_locked);
        assert_eq!(swept.fired_at, Some(clock.now()));
        assert!(swept.delay_expires_at.is_none());

        let untouched = get_order_item(&db, fresh.id).await?.unwrap();
        assert_eq!(untouched.status, ItemStatus::Pending);
        assert!(!untouched.is_locked);
        Ok(())
    }

    #[tokio::test]
    async fn test_sweep_is_idempotent() -> Result<()> {
        let db = setup_test_db().await?;
        let clock = ManualClock::starting_at(test_time());
        let order = create_test_order(&db, &clock).await?;
        create_test_item(&db, &clock, order.id).await?;
        create_test_item(&db, &clock, order.id).await?;
        send_items_for_order(&db, &clock, order.id).await?;

        clock.advance_secs(20);
        let first = sweep_expired_items(&db, &clock).await?;
        assert_eq!(first.len(), 2);

        // Immediate second run with no intervening change claims nothing
        let second = sweep_expired_items(&db, &clock).await?;
        assert!(second.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_manual_fire_beats_sweep() -> Result<()> {
        let db = setup_test_db().await?;
        let clock = ManualClock::starting_at(test_time());
        let order = create_test_order(&db, &clock).await?;
        let item = create_test_item(&db, &clock, order.id).await?;
        send_items_for_order(&db, &clock, order.id).await?;

        clock.advance_secs(16);
        let fired = fire_item_now(&db, &clock, item.id).await?;
        let manual_fired_at = fired.fired_at;

        // The sweep's deadline already elapsed, but the claim finds the row
        // locked and skips it; fired_at keeps the manual value.
        clock.advance_secs(1);
        let swept = sweep_expired_items(&db, &clock).await?;
        assert!(swept.is_empty());

        let current = get_order_item(&db, item.id).await?.unwrap();
        assert_eq!(current.status, ItemStatus::Fired);
        assert_eq!(current.fired_at, manual_fired_at);
        Ok(())
    }

    #[tokio::test]
    async fn test_sweep_beats_manual_fire() -> Result<()> {
        let db = setup_test_db().await?;
        let clock = ManualClock::starting_at(test_time());
        let order = create_test_order(&db, &clock).await?;
        let item = create_test_item(&db, &clock, order.id).await?;
        send_items_for_order(&db, &clock, order.id).await?;

        clock.advance_secs(16);
        let swept = sweep_expired_items(&db, &clock).await?;
        assert_eq!(swept.len(), 1);
        let sweep_fired_at = swept[0].fired_at;

        let result = fire_item_now(&db, &clock, item.id).await;
        assert!(matches!(
            result,
            Err(Error::InvalidItemState {
                status: ItemStatus::Fired,
                ..
            })
        ));

        let current = get_order_item(&db, item.id).await?.unwrap();
        assert_eq!(current.fired_at, sweep_fired_at);
        Ok(())
    }

    #[tokio::test]
    async fn test_edit_resets_window_ahead_of_sweep() -> Result<()> {
        let db = setup_test_db().await?;
        let clock = ManualClock::starting_at(test_time());
        let order = create_test_order(&db, &clock).await?;
        let item = create_test_item(&db, &clock, order.id).await?;
        send_items_for_order(&db, &clock, order.id).await?;

        // Edit at 14s pushes the deadline out to 29s
        clock.advance_secs(14);
        update_order_item(
            &db,
            &clock,
            item.id,
            OrderItemChanges {
                quantity: Some(2),
                ..Default::default()
            },
        )
        .await?;

        clock.advance_secs(2); // 16s: original deadline passed, reset one has not
        let swept = sweep_expired_items(&db, &clock).await?;
        assert!(swept.is_empty());

        clock.advance_secs(14); // 30s: reset deadline elapsed
        let swept = sweep_expired_items(&db, &clock).await?;
        assert_eq!(swept.len(), 1);
        assert_eq!(swept[0].id, item.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_full_lifecycle_scenario() -> Result<()> {
        let db = setup_test_db().await?;
        let clock = ManualClock::starting_at(test_time());
        let order = create_test_order(&db, &clock).await?;

        let item = crate::core::order_item::create_order_item(
            &db,
            &clock,
            crate::core::order_item::NewOrderItem {
                order_id: order.id,
                menu_item_id: 11,
                quantity: 2,
                price: 17.00,
                special_instructions: None,
                delay_seconds: 15,
            },
        )
        .await?;
        let created_at = item.created_at;

        let sent = send_items_for_order(&db, &clock, order.id).await?;
        assert_eq!(sent[0].status, ItemStatus::Pending);
        assert_eq!(
            sent[0].delay_expires_at.unwrap(),
            created_at + chrono::Duration::seconds(15)
        );

        clock.advance_secs(15);
        let fired = sweep_expired_items(&db, &clock).await?;
        assert_eq!(fired.len(), 1);
        assert!(fired[0].is_locked);
        assert_eq!(fired[0].status, ItemStatus::Fired);

        let completed =
            crate::core::order_item::complete_item(&db, &clock, item.id).await?;
        assert_eq!(completed.status, ItemStatus::Completed);
        assert!(completed.completed_at.is_some());
        Ok(())
    }
}
