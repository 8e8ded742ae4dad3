//! Virtual time scheduler for deterministic tests.
//!
//! Time only moves when the test says so, and queued tasks only run when the
//! test flushes or advances the clock. Unlike a thread-local test clock, each
//! [`VirtualTimeScheduler`] is an explicit instance: clones share one clock
//! and one queue, separate instances are fully independent.
//!
//! ```
//! use std::time::Duration;
//!
//! use rxrust_replay::prelude::*;
//!
//! let scheduler = VirtualTimeScheduler::new();
//! let subject = ReplaySubject::<i32, (), _>::with_window(Duration::from_millis(100), scheduler.clone())
//!   .unwrap();
//! subject.on_next(1).unwrap();
//! scheduler.advance_by(Duration::from_millis(150));
//! assert!(subject.buffered().is_empty());
//! ```

use std::{
  cmp::Ordering,
  collections::BinaryHeap,
  fmt::{Debug, Formatter},
  time::Duration,
};

use super::Scheduler;
use crate::rc::{MutRc, RcDeref, RcDerefMut};

// ==================== Internal State ====================

#[derive(Default)]
struct VirtualState {
  now: Duration,
  queue: BinaryHeap<ScheduledTask>,
  next_task_id: usize,
}

struct ScheduledTask {
  at: Duration,
  task_id: usize,
  task: Box<dyn FnOnce()>,
}

impl PartialEq for ScheduledTask {
  fn eq(&self, other: &Self) -> bool { self.at == other.at && self.task_id == other.task_id }
}

impl Eq for ScheduledTask {}

impl PartialOrd for ScheduledTask {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for ScheduledTask {
  fn cmp(&self, other: &Self) -> Ordering {
    // Min-heap: earlier times first, then FIFO by task_id
    other
      .at
      .cmp(&self.at)
      .then_with(|| other.task_id.cmp(&self.task_id))
  }
}

// ==================== VirtualTimeScheduler ====================

/// A manually driven clock plus task queue.
#[derive(Clone, Default)]
pub struct VirtualTimeScheduler(MutRc<VirtualState>);

impl VirtualTimeScheduler {
  /// A scheduler whose clock reads zero.
  pub fn new() -> Self { Self::default() }

  /// Number of tasks waiting to run, due or not.
  pub fn pending_count(&self) -> usize { self.0.rc_deref().queue.len() }

  /// Queue `task` to run once virtual time reaches `now() + delay`.
  pub fn schedule_after(&self, delay: Duration, task: impl FnOnce() + 'static) {
    let mut state = self.0.rc_deref_mut();
    let task_id = state.next_task_id;
    state.next_task_id += 1;
    let at = state.now.saturating_add(delay);
    state.queue.push(ScheduledTask { at, task_id, task: Box::new(task) });
  }

  /// Run every task that is due at the current time, including tasks queued
  /// by the tasks being run. The clock does not move.
  pub fn flush(&self) {
    let now = self.now();
    self.run_until(now);
  }

  /// Move the clock forward by `delta`, running tasks in due order as their
  /// time is reached.
  pub fn advance_by(&self, delta: Duration) {
    let target = self.now().saturating_add(delta);
    self.run_until(target);
  }

  /// Move the clock to `target`. A target in the past only flushes; the
  /// clock never runs backwards.
  pub fn advance_to(&self, target: Duration) {
    let target = target.max(self.now());
    self.run_until(target);
  }

  fn run_until(&self, target: Duration) {
    while let Some(task) = self.pop_due(target) {
      (task.task)();
    }
    let mut state = self.0.rc_deref_mut();
    state.now = state.now.max(target);
  }

  fn pop_due(&self, target: Duration) -> Option<ScheduledTask> {
    let mut state = self.0.rc_deref_mut();
    if state.queue.peek()?.at > target {
      return None;
    }
    let task = state.queue.pop()?;
    state.now = state.now.max(task.at);
    Some(task)
  }
}

impl Scheduler for VirtualTimeScheduler {
  #[inline]
  fn now(&self) -> Duration { self.0.rc_deref().now }

  #[inline]
  fn schedule(&self, task: impl FnOnce() + 'static) { self.schedule_after(Duration::ZERO, task) }
}

impl Debug for VirtualTimeScheduler {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let state = self.0.rc_deref();
    f.debug_struct("VirtualTimeScheduler")
      .field("now", &state.now)
      .field("pending", &state.queue.len())
      .finish()
  }
}
