use std::{collections::VecDeque, time::Duration};

use super::config::ReplayConfig;

/// One buffered value and the scheduler time it was produced at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry<Item> {
  pub timestamp: Duration,
  pub value: Item,
}

/// Count- and age-bounded history of produced values, oldest first.
///
/// Trimming is lazy: nothing expires until [`trim`](ReplayBuffer::trim) is
/// called with a newer `now`. After every `trim(now)`:
///
/// - `len() <= buffer_size`
/// - every entry satisfies `now - timestamp <= window`
#[derive(Debug, Clone)]
pub struct ReplayBuffer<Item> {
  queue: VecDeque<Entry<Item>>,
  buffer_size: usize,
  window: Duration,
}

impl<Item> ReplayBuffer<Item> {
  pub fn new(config: ReplayConfig) -> Self {
    ReplayBuffer {
      queue: VecDeque::new(),
      buffer_size: config.buffer_size_limit(),
      window: config.window_limit(),
    }
  }

  #[inline]
  pub fn buffer_size(&self) -> usize { self.buffer_size }

  #[inline]
  pub fn window(&self) -> Duration { self.window }

  /// Append `value` stamped with `now`, then trim against `now`.
  pub fn push(&mut self, now: Duration, value: Item) {
    self.queue.push_back(Entry { timestamp: now, value });
    self.trim(now);
  }

  /// Drop entries from the front until both bounds hold. The count bound is
  /// enforced fully before the age bound. Returns how many entries went.
  pub fn trim(&mut self, now: Duration) -> usize {
    let before = self.queue.len();
    while self.queue.len() > self.buffer_size {
      self.queue.pop_front();
    }
    while let Some(oldest) = self.queue.front() {
      if now.saturating_sub(oldest.timestamp) <= self.window {
        break;
      }
      self.queue.pop_front();
    }
    let evicted = before - self.queue.len();
    if evicted > 0 {
      tracing::trace!(evicted, retained = self.queue.len(), ?now, "replay buffer trimmed");
    }
    evicted
  }

  #[inline]
  pub fn len(&self) -> usize { self.queue.len() }

  #[inline]
  pub fn is_empty(&self) -> bool { self.queue.is_empty() }

  pub fn iter(&self) -> impl Iterator<Item = &Entry<Item>> { self.queue.iter() }

  /// Buffered values, oldest first.
  pub fn values(&self) -> impl Iterator<Item = &Item> { self.queue.iter().map(|e| &e.value) }

  /// Empty the buffer, handing back what it held.
  pub fn take_entries(&mut self) -> VecDeque<Entry<Item>> { std::mem::take(&mut self.queue) }
}
