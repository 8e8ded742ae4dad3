//! The producing side of the reactive contract.

use crate::{
  error::Result,
  observer::{FnObserver, Observer},
  subscription::Subscription,
};

/// A source that observers can subscribe to.
///
/// Subscribing can fail: a hot source such as a disposed subject refuses new
/// observers instead of silently dropping them.
pub trait Observable<Item, Err> {
  /// a type implemented [`Subscription`]
  type Unsub: Subscription;

  /// Register `observer` for every notification this source emits.
  fn actual_subscribe<O>(&self, observer: O) -> Result<Self::Unsub>
  where
    O: Observer<Item, Err> + 'static;

  /// Subscribe with a value handler only; errors and completion are ignored.
  fn subscribe<N>(&self, next: N) -> Result<Self::Unsub>
  where
    N: FnMut(Item) + 'static,
    Item: 'static,
    Err: 'static,
  {
    self.actual_subscribe(FnObserver::new(next, |_: Err| {}, || {}))
  }

  /// Invokes an execution of an Observable and registers Observer handlers for
  /// notifications it will emit.
  ///
  /// * `error`: A handler for a terminal event resulting from an error.
  /// * `complete`: A handler for a terminal event resulting from successful
  ///   completion.
  fn subscribe_all<N, E, C>(&self, next: N, error: E, complete: C) -> Result<Self::Unsub>
  where
    N: FnMut(Item) + 'static,
    E: FnOnce(Err) + 'static,
    C: FnOnce() + 'static,
  {
    self.actual_subscribe(FnObserver::new(next, error, complete))
  }
}
