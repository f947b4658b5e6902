//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod order;
pub mod order_item;
pub mod order_item_modifier;

// Re-export specific types to avoid conflicts
pub use order::{
    Column as OrderColumn, Entity as Order, Model as OrderModel, OrderStatus, OrderType,
};
pub use order_item::{
    Column as OrderItemColumn, Entity as OrderItem, ItemStatus, Model as OrderItemModel,
};
pub use order_item_modifier::{
    Column as OrderItemModifierColumn, Entity as OrderItemModifier,
    Model as OrderItemModifierModel,
};
