//! Order item entity - One line on a table check.
//!
//! Each item carries its own delay window: it is created in `draft`, moves to
//! `pending` when the server sends the order, and is locked and `fired` once
//! the window elapses (or immediately via fire-now). The `price` and any
//! modifier adjustments are snapshots taken at add-time; the live menu catalog
//! is never re-read after creation.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Order item database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "order_items")]
pub struct Model {
    /// Unique identifier for the order item
    #[sea_orm(primary_key)]
    pub id: i64,
    /// ID of the order (check) this item belongs to
    #[sea_orm(indexed)]
    pub order_id: i64,
    /// Menu item this line refers to (reference only; price is snapshot below)
    pub menu_item_id: i64,
    /// Number of units ordered, always >= 1
    pub quantity: i32,
    /// Unit price snapshot taken at add-time, in dollars
    pub price: f64,
    /// Free-text special instructions for the kitchen
    pub special_instructions: Option<String>,
    /// Lifecycle status of the item
    #[sea_orm(indexed)]
    pub status: ItemStatus,
    /// Length of the editable delay window, in seconds
    pub delay_seconds: i32,
    /// Deadline after which the sweep fires the item; set iff status is `pending`
    pub delay_expires_at: Option<DateTimeUtc>,
    /// True iff the item is `fired` or `completed`; locked items can never be
    /// edited or deleted
    pub is_locked: bool,
    /// When the item was added to the check
    pub created_at: DateTimeUtc,
    /// When the item was fired to the kitchen; written exactly once
    pub fired_at: Option<DateTimeUtc>,
    /// When the kitchen finished the item
    pub completed_at: Option<DateTimeUtc>,
}

/// Lifecycle status of an order item.
///
/// Modeled as a closed enumeration so unrecognized values are rejected at the
/// database boundary instead of silently accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    /// Editable, not yet sent; no timer running
    #[sea_orm(string_value = "draft")]
    Draft,
    /// Sent; delay window running, still editable and cancelable
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Locked and dispatched to the prep station
    #[sea_orm(string_value = "fired")]
    Fired,
    /// Finished by the kitchen; terminal
    #[sea_orm(string_value = "completed")]
    Completed,
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::Fired => "fired",
            Self::Completed => "completed",
        })
    }
}

/// Defines relationships between order items and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each order item belongs to one order
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id"
    )]
    Order,
    /// One order item has many frozen modifier selections
    #[sea_orm(has_many = "super::order_item_modifier::Entity")]
    Modifiers,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl Related<super::order_item_modifier::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Modifiers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
