use crate::{
  error::{ReplayError, Result},
  notification::Notification,
};

/// How a subject stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Terminal<Err> {
  Error(Err),
  Completed,
}

impl<Err> Terminal<Err> {
  pub fn into_notification<Item>(self) -> Notification<Item, Err> {
    match self {
      Terminal::Error(err) => Notification::Error(err),
      Terminal::Completed => Notification::Completed,
    }
  }
}

/// Lifecycle of a subject.
///
/// ```text
/// Active ──error/complete──▶ Stopped ──dispose──▶ Disposed
///    └──────────────────dispose───────────────────────▲
/// ```
///
/// Every transition is one-way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase<Err> {
  Active,
  Stopped(Terminal<Err>),
  Disposed,
}

impl<Err> Default for Phase<Err> {
  fn default() -> Self { Phase::Active }
}

impl<Err> Phase<Err> {
  #[inline]
  pub fn is_active(&self) -> bool { matches!(self, Phase::Active) }

  #[inline]
  pub fn is_stopped(&self) -> bool { matches!(self, Phase::Stopped(_)) }

  #[inline]
  pub fn is_disposed(&self) -> bool { matches!(self, Phase::Disposed) }

  /// Fails once disposed.
  #[inline]
  pub fn check_disposed(&self) -> Result<()> {
    if self.is_disposed() { Err(ReplayError::Disposed) } else { Ok(()) }
  }

  /// Whether an emission should go through: `Ok(true)` while active,
  /// `Ok(false)` once stopped, `Err` once disposed.
  #[inline]
  pub fn accepts_emission(&self) -> Result<bool> {
    self.check_disposed()?;
    Ok(self.is_active())
  }

  /// Record the terminal. Only the first terminal of an active phase sticks;
  /// returns whether this call made the transition.
  pub fn stop(&mut self, terminal: Terminal<Err>) -> Result<bool> {
    if !self.accepts_emission()? {
      return Ok(false);
    }
    *self = Phase::Stopped(terminal);
    Ok(true)
  }

  /// Returns whether this call made the transition.
  pub fn dispose(&mut self) -> bool {
    if self.is_disposed() {
      return false;
    }
    *self = Phase::Disposed;
    true
  }

  pub fn terminal(&self) -> Option<&Terminal<Err>> {
    match self {
      Phase::Stopped(terminal) => Some(terminal),
      _ => None,
    }
  }

  /// Short name for log fields.
  pub fn label(&self) -> &'static str {
    match self {
      Phase::Active => "active",
      Phase::Stopped(Terminal::Error(_)) => "errored",
      Phase::Stopped(Terminal::Completed) => "completed",
      Phase::Disposed => "disposed",
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn first_terminal_wins() {
    let mut phase = Phase::<&str>::default();
    assert_eq!(phase.stop(Terminal::Error("first")), Ok(true));
    assert_eq!(phase.stop(Terminal::Completed), Ok(false));
    assert_eq!(phase.terminal(), Some(&Terminal::Error("first")));
    assert_eq!(phase.accepts_emission(), Ok(false));
  }

  #[test]
  fn disposed_is_final() {
    let mut phase = Phase::<()>::Stopped(Terminal::Completed);
    assert!(phase.dispose());
    assert!(!phase.dispose());
    assert_eq!(phase.stop(Terminal::Completed), Err(ReplayError::Disposed));
    assert_eq!(phase.accepts_emission(), Err(ReplayError::Disposed));
    assert!(phase.terminal().is_none());
    assert_eq!(phase.label(), "disposed");
  }

  #[test]
  fn active_can_dispose_directly() {
    let mut phase = Phase::<()>::Active;
    assert_eq!(phase.accepts_emission(), Ok(true));
    assert!(phase.dispose());
    assert!(phase.is_disposed());
  }
}
