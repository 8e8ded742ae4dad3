//! Prelude module for convenient imports
//!
//! This module re-exports commonly used types and traits for easy access.

// Errors
pub use crate::error::ReplayError;
// Notifications
pub use crate::notification::Notification;
// Core traits
pub use crate::observable::Observable;
pub use crate::observer::{BoxedObserver, DynObserver, FnObserver, Observer};
// Schedulers
#[cfg(feature = "tokio-scheduler")]
pub use crate::scheduler::TokioLocalScheduler;
pub use crate::scheduler::{ImmediateScheduler, LocalPoolScheduler, Scheduler, VirtualTimeScheduler};
// Subject
pub use crate::subject::{ReplayConfig, ReplaySubject, ReplaySubscription};
// Subscription
pub use crate::subscription::{self, Subscription, SubscriptionGuard};
