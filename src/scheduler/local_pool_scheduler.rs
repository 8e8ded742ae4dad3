use std::time::{Duration, Instant};

use futures::{
  executor::LocalSpawner,
  task::{LocalSpawnExt, SpawnError},
};

use super::Scheduler;

/// Defers tasks onto a single-threaded `futures` executor.
///
/// Tasks run when the `LocalPool` that produced the spawner is driven
/// (`run`, `run_until_stalled`, ...). No order between separate tasks is
/// promised; a subscriber's own deliveries stay ordered because its adapter
/// drains them from one queue.
#[derive(Clone)]
pub struct LocalPoolScheduler {
  spawner: LocalSpawner,
  origin: Instant,
}

impl LocalPoolScheduler {
  pub fn new(spawner: LocalSpawner) -> Self { LocalPoolScheduler { spawner, origin: Instant::now() } }

  fn try_schedule(&self, task: impl FnOnce() + 'static) -> Result<(), SpawnError> {
    self.spawner.spawn_local(async move { task() })
  }
}

impl From<LocalSpawner> for LocalPoolScheduler {
  fn from(spawner: LocalSpawner) -> Self { Self::new(spawner) }
}

impl Scheduler for LocalPoolScheduler {
  #[inline]
  fn now(&self) -> Duration { self.origin.elapsed() }

  fn schedule(&self, task: impl FnOnce() + 'static) {
    if let Err(err) = self.try_schedule(task) {
      tracing::warn!(%err, "local pool is shut down, dropping scheduled task");
    }
  }
}
