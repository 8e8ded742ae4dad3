//! Error types raised by replay subjects.

use std::time::Duration;

use thiserror::Error;

/// Errors produced by [`ReplaySubject`](crate::subject::ReplaySubject) and
/// its configuration.
///
/// Emitting into a subject that already stopped is *not* an error; only a
/// disposed subject refuses work.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReplayError {
  /// The subject was disposed and can no longer be used.
  #[error("replay subject has been disposed")]
  Disposed,

  /// A replay buffer must retain at least one entry.
  #[error("replay buffer size must be greater than zero")]
  InvalidBufferSize,

  /// A replay window must be a positive duration.
  #[error("replay window must be a positive duration, got {window:?}")]
  InvalidWindow { window: Duration },
}

impl ReplayError {
  /// Returns a short stable label (snake_case) for use in logs.
  ///
  /// # Example
  /// ```
  /// use rxrust_replay::ReplayError;
  ///
  /// assert_eq!(ReplayError::Disposed.as_label(), "replay_disposed");
  /// ```
  pub fn as_label(&self) -> &'static str {
    match self {
      ReplayError::Disposed => "replay_disposed",
      ReplayError::InvalidBufferSize => "replay_invalid_buffer_size",
      ReplayError::InvalidWindow { .. } => "replay_invalid_window",
    }
  }
}

pub type Result<T> = std::result::Result<T, ReplayError>;
