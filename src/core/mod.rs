//! Core business logic for the order-fulfillment lifecycle.
//!
//! Framework-agnostic operations over the entity store: the order-item state
//! machine, the recurring expiry sweep, the order aggregate, and modifier
//! snapshots. Every state transition here is expressed as a conditional update
//! guarded on the row's current status and lock flag, never a blind
//! read-then-write, so interactive actions and the sweep can race safely.

/// Modifier snapshot operations for order items
pub mod modifier;
/// Order aggregate - totals recomputation and checkout status
pub mod order;
/// Order-item lifecycle state machine
pub mod order_item;
/// Recurring expiry sweep that fires items whose delay window has elapsed
pub mod sweep;
