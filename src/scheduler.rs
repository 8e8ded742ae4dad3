//! Schedulers decide *when* queued deliveries run and tell subjects what time
//! it is.
//!
//! A subject never reads a clock itself. It stamps and trims its replay
//! buffer with [`Scheduler::now`] and hands every drain of a subscriber's
//! queue to [`Scheduler::schedule`]. Time is an opaque, monotonically
//! non-decreasing [`Duration`] measured from an origin chosen by the
//! scheduler.
//!
//! | Scheduler | Execution | Clock |
//! |-----------|-----------|-------|
//! | [`ImmediateScheduler`] | synchronous, inside `schedule` | wall time since creation |
//! | [`LocalPoolScheduler`] | spawned onto a `futures` `LocalPool` | wall time since creation |
//! | [`VirtualTimeScheduler`] | queued until flushed/advanced | virtual, manual |
//! | `TokioLocalScheduler` | `tokio::task::spawn_local` | wall time since creation |

use std::time::{Duration, Instant};

mod local_pool_scheduler;
pub mod test_scheduler;
#[cfg(feature = "tokio-scheduler")]
mod tokio_scheduler;

pub use local_pool_scheduler::LocalPoolScheduler;
pub use test_scheduler::VirtualTimeScheduler;
#[cfg(feature = "tokio-scheduler")]
pub use tokio_scheduler::TokioLocalScheduler;

/// Time and execution authority consumed by subjects.
pub trait Scheduler: Clone {
  /// Current logical time. Must never decrease.
  fn now(&self) -> Duration;

  /// Run `task`, either right away or on a later turn of the scheduler's
  /// executor.
  fn schedule(&self, task: impl FnOnce() + 'static);
}

/// Runs every task synchronously on the caller's stack.
#[derive(Clone, Copy, Debug)]
pub struct ImmediateScheduler {
  origin: Instant,
}

impl ImmediateScheduler {
  pub fn new() -> Self { ImmediateScheduler { origin: Instant::now() } }
}

impl Default for ImmediateScheduler {
  fn default() -> Self { Self::new() }
}

impl Scheduler for ImmediateScheduler {
  #[inline]
  fn now(&self) -> Duration { self.origin.elapsed() }

  #[inline]
  fn schedule(&self, task: impl FnOnce() + 'static) { task() }
}
