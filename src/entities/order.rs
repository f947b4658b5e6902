//! Order entity - The check for a table.
//!
//! Orders stay `open` throughout the meal; the per-item delay timer lives on
//! the order items, not here. Totals are derived values, recomputed on demand
//! by the order aggregate rather than on every item event.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Order database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    /// Unique identifier for the order
    #[sea_orm(primary_key)]
    pub id: i64,
    /// ID of the table this check belongs to
    #[sea_orm(indexed)]
    pub table_id: i64,
    /// How the order is served
    pub order_type: OrderType,
    /// Lifecycle status of the order
    #[sea_orm(indexed)]
    pub status: OrderStatus,
    /// Sum of line totals at the last recomputation, in dollars
    pub subtotal: f64,
    /// Tax at the last recomputation, rounded half-up to cents
    pub tax: f64,
    /// Subtotal plus tax at the last recomputation
    pub total: f64,
    /// When the order was opened
    pub created_at: DateTimeUtc,
    /// When the order was closed out; terminal, never reopened
    pub completed_at: Option<DateTimeUtc>,
}

/// Lifecycle status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Check is open; items may be added in any lifecycle state
    #[sea_orm(string_value = "open")]
    Open,
    /// Checkout finished; terminal
    #[sea_orm(string_value = "completed")]
    Completed,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Open => "open",
            Self::Completed => "completed",
        })
    }
}

/// How an order is served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    /// Served at a table
    #[sea_orm(string_value = "dine_in")]
    DineIn,
    /// Packed for pickup
    #[sea_orm(string_value = "takeout")]
    Takeout,
    /// Sent out for delivery
    #[sea_orm(string_value = "delivery")]
    Delivery,
}

/// Defines relationships between orders and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One order has many order items
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItems,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
