//! Unified error types for `Fireline`.
//!
//! Validation, lookup, lock, and illegal-transition failures are deterministic
//! business outcomes reported to the caller; they are never retried by this
//! crate. Store-level failures propagate as [`Error::Database`] and retry
//! policy is left to the caller.

use crate::entities::order::OrderStatus;
use crate::entities::order_item::ItemStatus;
use thiserror::Error;

/// All error conditions produced by the order-fulfillment core.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed input (negative price, zero quantity, ...), rejected before
    /// any state change.
    #[error("Validation error: {message}")]
    Validation {
        /// What was wrong with the input
        message: String,
    },

    /// No order item exists with the given id.
    #[error("Order item not found with id: {id}")]
    ItemNotFound {
        /// The id that was looked up
        id: i64,
    },

    /// No order exists with the given id.
    #[error("Order not found with id: {id}")]
    OrderNotFound {
        /// The id that was looked up
        id: i64,
    },

    /// No order item modifier exists with the given id.
    #[error("Order item modifier not found with id: {id}")]
    ModifierNotFound {
        /// The id that was looked up
        id: i64,
    },

    /// Mutation attempted on a locked item. Locked items have been sent to
    /// the kitchen and can never be edited or deleted again.
    #[error("Cannot modify locked order item {id}; item has been sent to kitchen")]
    LockedItem {
        /// Id of the locked item
        id: i64,
    },

    /// The requested transition is not legal from the item's current status.
    #[error("Order item {id} cannot {action} from status '{status}'")]
    InvalidItemState {
        /// Id of the item
        id: i64,
        /// Status the item was observed in
        status: ItemStatus,
        /// The transition that was attempted
        action: &'static str,
    },

    /// The requested transition is not legal from the order's current status.
    #[error("Order {id} cannot {action} from status '{status}'")]
    InvalidOrderState {
        /// Id of the order
        id: i64,
        /// Status the order was observed in
        status: OrderStatus,
        /// The transition that was attempted
        action: &'static str,
    },

    /// Strict-close policy rejected completing an order that still has
    /// draft or pending items.
    #[error("Order {id} still has {count} unfired items")]
    UnfiredItems {
        /// Id of the order
        id: i64,
        /// Number of items still in draft or pending
        count: u64,
    },

    /// Configuration file missing, unreadable, or malformed.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration problem
        message: String,
    },

    /// Store-level failure (connectivity, constraint violation).
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// I/O error outside the database (config files, signal handling).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience `Result` type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
