//! Order item modifier entity - A modifier option frozen onto an order item.
//!
//! Links an order item to a selected modifier option and freezes that option's
//! price adjustment at selection time, independent of later catalog edits.
//! Line totals read these frozen adjustments, never the live modifier catalog.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Order item modifier database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "order_item_modifiers")]
pub struct Model {
    /// Unique identifier for the selection
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Order item this modifier is applied to
    #[sea_orm(indexed)]
    pub order_item_id: i64,
    /// Catalog modifier option that was selected (reference only)
    pub modifier_id: i64,
    /// Price adjustment snapshot taken at selection time, in dollars
    pub price_adjustment: f64,
}

/// Defines relationships between order item modifiers and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each modifier selection belongs to one order item
    #[sea_orm(
        belongs_to = "super::order_item::Entity",
        from = "Column::OrderItemId",
        to = "super::order_item::Column::Id"
    )]
    OrderItem,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItem.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
