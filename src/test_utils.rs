//! Shared test utilities for `Fireline`.
//!
//! This module provides common helper functions for setting up test databases,
//! creating fixture orders and items with sensible defaults, and driving time
//! deterministically through a manually advanced clock.

#![allow(clippy::unwrap_used)]

use crate::{
    clock::Clock,
    core::{order, order_item},
    entities,
    entities::order::OrderType,
    errors::Result,
};
use chrono::{Duration, TimeZone, Utc};
use sea_orm::DatabaseConnection;
use sea_orm::prelude::DateTimeUtc;
use std::sync::Mutex;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// A fixed whole-second starting instant so timestamps round-trip through
/// `SQLite` exactly.
pub fn test_time() -> DateTimeUtc {
    Utc.with_ymd_and_hms(2025, 6, 1, 18, 0, 0).unwrap()
}

/// A clock that only moves when a test tells it to.
pub struct ManualClock {
    now: Mutex<DateTimeUtc>,
}

impl ManualClock {
    /// Creates a clock frozen at the given instant.
    pub fn starting_at(now: DateTimeUtc) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Moves the clock forward by whole seconds.
    pub fn advance_secs(&self, secs: i64) {
        let mut now = self.now.lock().unwrap();
        *now += Duration::seconds(secs);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTimeUtc {
        *self.now.lock().unwrap()
    }
}

/// Creates a dine-in test order on table 1.
pub async fn create_test_order(
    db: &DatabaseConnection,
    clock: &dyn Clock,
) -> Result<entities::order::Model> {
    order::create_order(db, clock, 1, OrderType::DineIn).await
}

/// Creates a draft test item with sensible defaults.
///
/// # Defaults
/// * `menu_item_id`: 1
/// * `quantity`: 1
/// * `price`: 10.0
/// * `delay_seconds`: 15
pub async fn create_test_item(
    db: &DatabaseConnection,
    clock: &dyn Clock,
    order_id: i64,
) -> Result<entities::order_item::Model> {
    order_item::create_order_item(
        db,
        clock,
        order_item::NewOrderItem {
            order_id,
            menu_item_id: 1,
            quantity: 1,
            price: 10.0,
            special_instructions: None,
            delay_seconds: 15,
        },
    )
    .await
}
