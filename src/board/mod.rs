//! Client-side board state: the entity store, optimistic status changes and
//! the views derived from them.

pub mod calendar;
pub mod dashboard;
pub mod drag;
pub mod notification;
pub mod optimistic;
pub mod store;
pub mod transition;
pub mod views;

pub use notification::{Notification, NotificationKind};
pub use optimistic::{OptimisticLedger, Settlement};
pub use store::EntityStore;
pub use transition::{StatusChange, StatusTransitionController, TransitionOutcome};
