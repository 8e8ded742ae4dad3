use std::time::{Duration, Instant};

use super::Scheduler;

/// Spawns tasks with `tokio::task::spawn_local`.
///
/// # Panics
///
/// `schedule` panics when called outside of a `tokio::task::LocalSet`.
#[derive(Clone, Copy, Debug)]
pub struct TokioLocalScheduler {
  origin: Instant,
}

impl TokioLocalScheduler {
  pub fn new() -> Self { TokioLocalScheduler { origin: Instant::now() } }
}

impl Default for TokioLocalScheduler {
  fn default() -> Self { Self::new() }
}

impl Scheduler for TokioLocalScheduler {
  #[inline]
  fn now(&self) -> Duration { self.origin.elapsed() }

  fn schedule(&self, task: impl FnOnce() + 'static) {
    let _handle = tokio::task::spawn_local(async move { task() });
  }
}
