//! # rxrust-replay: a replaying subject for single-threaded reactive code
//!
//! [`ReplaySubject`] is a hot, multicast source that remembers what it
//! emitted. Late subscribers first receive the retained history, then live
//! values; after the subject stops they receive the history followed by the
//! terminal notification.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::{cell::RefCell, rc::Rc, time::Duration};
//!
//! use rxrust_replay::prelude::*;
//!
//! let scheduler = VirtualTimeScheduler::new();
//! let subject = ReplaySubject::<&str, String, _>::with_config(
//!   ReplayConfig::default().buffer_size(10).window(Duration::from_secs(1)),
//!   scheduler.clone(),
//! )
//! .unwrap();
//!
//! subject.on_next("stale").unwrap();
//! scheduler.advance_by(Duration::from_secs(2));
//! subject.on_next("fresh").unwrap();
//!
//! let seen = Rc::new(RefCell::new(vec![]));
//! let c_seen = seen.clone();
//! let _sub = subject.subscribe(move |v| c_seen.borrow_mut().push(v)).unwrap();
//! scheduler.flush();
//!
//! assert_eq!(*seen.borrow(), vec!["fresh"]);
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ReplaySubject`] | Buffers, broadcasts and replays values |
//! | [`Observable`] | Something observers subscribe to |
//! | [`Observer`] | Consumes `next`, `error`, and `complete` events |
//! | [`Subscription`] | Handle to cancel an active subscription |
//! | [`Scheduler`] | Supplies time and runs deferred deliveries |
//!
//! Everything is single-threaded: handles are `Rc`-based and not `Send`.
//!
//! ## Feature Flags
//!
//! - **`tokio-scheduler`**: a scheduler spawning onto a tokio `LocalSet`
//!
//! [`ReplaySubject`]: subject::ReplaySubject
//! [`Observable`]: observable::Observable
//! [`Observer`]: observer::Observer
//! [`Subscription`]: subscription::Subscription
//! [`Scheduler`]: scheduler::Scheduler

pub mod error;
pub mod notification;
pub mod observable;
pub mod observer;
pub mod prelude;
pub mod rc;
pub mod scheduler;
pub mod subject;
pub mod subscription;

pub use error::{ReplayError, Result};
pub use prelude::*;
