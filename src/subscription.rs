//! Subscription handles returned from `subscribe` to allow unsubscribing.

use std::fmt::{Debug, Formatter};

/// Handle to cancel an active subscription.
pub trait Subscription {
  /// Deregister before the stream has finished delivering all events.
  ///
  /// Calling this more than once is a no-op.
  fn unsubscribe(&mut self);

  fn is_closed(&self) -> bool;

  /// Activates "RAII" behavior for this subscription. That means
  /// `unsubscribe()` will be called automatically as soon as the returned
  /// value goes out of scope.
  ///
  /// **Attention:** If you don't assign the return value to a variable,
  /// `unsubscribe()` is called immediately, which is probably not what you
  /// want!
  fn unsubscribe_when_dropped(self) -> SubscriptionGuard<Self>
  where
    Self: Sized,
  {
    SubscriptionGuard(self)
  }
}

impl<T: ?Sized + Subscription> Subscription for Box<T> {
  #[inline]
  fn unsubscribe(&mut self) { (**self).unsubscribe() }

  #[inline]
  fn is_closed(&self) -> bool { (**self).is_closed() }
}

impl Debug for Box<dyn Subscription> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Box<dyn Subscription>")
      .field("is_closed", &self.is_closed())
      .finish()
  }
}

/// A subscription whose teardown is an arbitrary release action.
pub struct FnSubscription<F>(Option<F>);

/// Build a [`Subscription`] that runs `f` the first time it is unsubscribed.
///
/// ```
/// use std::{cell::Cell, rc::Rc};
///
/// use rxrust_replay::prelude::*;
///
/// let released = Rc::new(Cell::new(0));
/// let c_released = released.clone();
/// let mut sub = subscription::from_fn(move || c_released.set(c_released.get() + 1));
/// sub.unsubscribe();
/// sub.unsubscribe();
/// assert_eq!(released.get(), 1);
/// ```
pub fn from_fn<F: FnOnce()>(f: F) -> FnSubscription<F> { FnSubscription(Some(f)) }

impl<F: FnOnce()> Subscription for FnSubscription<F> {
  fn unsubscribe(&mut self) {
    if let Some(f) = self.0.take() {
      f()
    }
  }

  #[inline]
  fn is_closed(&self) -> bool { self.0.is_none() }
}

/// An RAII implementation of a "scoped subscribed" of a subscription.
/// When this structure is dropped (falls out of scope), the subscription will
/// be unsubscribed.
///
/// If you want to drop it immediately, wrap it in its own scope
#[derive(Debug)]
#[must_use]
pub struct SubscriptionGuard<T: Subscription>(pub(crate) T);

impl<T: Subscription> SubscriptionGuard<T> {
  /// Wraps an existing subscription with a guard to enable RAII behavior for
  /// it.
  pub fn new(subscription: T) -> SubscriptionGuard<T> { SubscriptionGuard(subscription) }
}

impl<T: Subscription> Drop for SubscriptionGuard<T> {
  #[inline]
  fn drop(&mut self) { self.0.unsubscribe() }
}

#[cfg(test)]
mod tests {
  use std::{cell::Cell, rc::Rc};

  use super::*;

  #[test]
  fn guard_unsubscribes_on_drop() {
    let hits = Rc::new(Cell::new(0));
    let c_hits = hits.clone();
    {
      let _guard = from_fn(move || c_hits.set(c_hits.get() + 1)).unsubscribe_when_dropped();
      assert_eq!(hits.get(), 0);
    }
    assert_eq!(hits.get(), 1);
  }

  #[test]
  fn boxed_subscription() {
    let mut sub: Box<dyn Subscription> = Box::new(from_fn(|| {}));
    assert!(!sub.is_closed());
    sub.unsubscribe();
    assert!(sub.is_closed());
    assert!(format!("{sub:?}").contains("is_closed: true"));
  }
}
