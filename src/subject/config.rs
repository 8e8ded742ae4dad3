use std::time::Duration;

use crate::error::{ReplayError, Result};

/// Bounds of a replay buffer.
///
/// Both bounds default to "unbounded" (`usize::MAX` entries, `Duration::MAX`
/// age). Either may be narrowed independently; the buffer honours both.
///
/// ```
/// use std::time::Duration;
///
/// use rxrust_replay::prelude::*;
///
/// let config = ReplayConfig::default().buffer_size(16).window(Duration::from_secs(5));
/// assert_eq!(config.buffer_size_limit(), 16);
/// assert!(config.validate().is_ok());
/// assert!(ReplayConfig::default().buffer_size(0).validate().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayConfig {
  buffer_size: usize,
  window: Duration,
}

impl Default for ReplayConfig {
  fn default() -> Self { ReplayConfig { buffer_size: usize::MAX, window: Duration::MAX } }
}

impl ReplayConfig {
  /// Retain at most `size` entries.
  #[must_use]
  pub fn buffer_size(mut self, size: usize) -> Self {
    self.buffer_size = size;
    self
  }

  /// Retain entries no older than `window`.
  #[must_use]
  pub fn window(mut self, window: Duration) -> Self {
    self.window = window;
    self
  }

  #[inline]
  pub fn buffer_size_limit(&self) -> usize { self.buffer_size }

  #[inline]
  pub fn window_limit(&self) -> Duration { self.window }

  /// Both bounds must be positive.
  pub fn validate(&self) -> Result<()> {
    if self.buffer_size == 0 {
      return Err(ReplayError::InvalidBufferSize);
    }
    if self.window.is_zero() {
      return Err(ReplayError::InvalidWindow { window: self.window });
    }
    Ok(())
  }
}
