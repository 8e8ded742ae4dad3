use crate::observer::Observer;

/// A reified observer call.
///
/// Subjects queue these between the producer and each observer so delivery
/// can be deferred to a scheduler without losing order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification<Item, Err> {
  Next(Item),
  Error(Err),
  Completed,
}

impl<Item, Err> Notification<Item, Err> {
  /// `true` for `Error` and `Completed`.
  #[inline]
  pub fn is_terminal(&self) -> bool { !matches!(self, Notification::Next(_)) }

  /// Invoke the matching observer method.
  ///
  /// Returns the observer back if it is still usable, i.e. the notification
  /// was a `Next`.
  pub fn accept<O>(self, mut observer: O) -> Option<O>
  where
    O: Observer<Item, Err>,
  {
    match self {
      Notification::Next(value) => {
        observer.next(value);
        Some(observer)
      }
      Notification::Error(err) => {
        observer.error(err);
        None
      }
      Notification::Completed => {
        observer.complete();
        None
      }
    }
  }
}
