//! Subject implementation.
//!
//! A subject is both an observer and an observable: values pushed into it are
//! multicast to every subscriber. This crate provides one subject,
//! [`ReplaySubject`], which additionally replays recent history to late
//! subscribers.
//!
//! The pieces, bottom-up:
//!
//! - [`ReplayConfig`]: the count and age bounds of the history.
//! - `ReplayBuffer`: the timestamped history itself.
//! - `Phase`: the Active / Stopped / Disposed lifecycle.
//! - `Subscribers`: the registry, broadcast from snapshots.
//! - [`ScheduledObserver`]: one per subscriber, a FIFO queue drained on the
//!   subject's scheduler.

mod config;
mod phase;
mod replay_buffer;
mod replay_subject;
mod scheduled_observer;
mod subject_subscription;
mod subscribers;

pub use config::ReplayConfig;
pub use replay_buffer::{Entry, ReplayBuffer};
pub use replay_subject::ReplaySubject;
pub use scheduled_observer::ScheduledObserver;
pub use subject_subscription::ReplaySubscription;
