use std::fmt::{Debug, Formatter};

use super::{replay_subject::ReplayState, scheduled_observer::ScheduledObserver};
use crate::{
  rc::{RcDerefMut, WeakMutRc},
  scheduler::Scheduler,
  subscription::Subscription,
};

/// Subscription handle for a [`ReplaySubject`](super::ReplaySubject).
///
/// # Design
///
/// - **No Ownership**: Holds only a weak pointer to the subject's state, so an
///   outstanding handle never keeps a dropped subject alive.
/// - **Registry ID**: `None` when the subscriber was never registered for live
///   delivery (it subscribed to an already stopped subject).
/// - **Adapter**: Disposing the subscriber's own delivery adapter cancels
///   whatever was still queued for it, including the replay.
pub struct ReplaySubscription<Item, Err, S> {
  subject: WeakMutRc<ReplayState<Item, Err, S>>,
  id: Option<usize>,
  adapter: ScheduledObserver<Item, Err, S>,
}

impl<Item, Err, S> ReplaySubscription<Item, Err, S> {
  pub(super) fn new(
    subject: WeakMutRc<ReplayState<Item, Err, S>>, id: Option<usize>,
    adapter: ScheduledObserver<Item, Err, S>,
  ) -> Self {
    Self { subject, id, adapter }
  }
}

impl<Item, Err, S> Subscription for ReplaySubscription<Item, Err, S>
where
  Item: 'static,
  Err: 'static,
  S: Scheduler,
{
  fn unsubscribe(&mut self) {
    if let Some(id) = self.id.take() {
      if let Some(subject) = self.subject.upgrade() {
        let removed = subject.rc_deref_mut().subscribers.remove(id);
        drop(removed);
      }
    }
    self.adapter.dispose();
  }

  #[inline]
  fn is_closed(&self) -> bool { self.adapter.is_disposed() }
}

impl<Item, Err, S> Debug for ReplaySubscription<Item, Err, S>
where
  Item: 'static,
  Err: 'static,
  S: Scheduler,
{
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ReplaySubscription")
      .field("id", &self.id)
      .field("is_closed", &self.adapter.is_disposed())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, rc::Rc};

  use crate::prelude::*;

  #[test]
  fn outlives_subject() {
    let subject = ReplaySubject::<i32, (), _>::new(ImmediateScheduler::new());
    let mut sub = subject.subscribe(|_| {}).unwrap();
    drop(subject);
    assert!(!sub.is_closed());
    sub.unsubscribe();
    assert!(sub.is_closed());
  }

  #[test]
  fn guard_unsubscribes_on_drop() {
    let subject = ReplaySubject::<i32, (), _>::new(ImmediateScheduler::new());
    let seen = Rc::new(RefCell::new(vec![]));
    let c_seen = seen.clone();
    {
      let _guard = subject
        .subscribe(move |v| c_seen.borrow_mut().push(v))
        .unwrap()
        .unsubscribe_when_dropped();
      subject.on_next(1).unwrap();
      assert_eq!(subject.observer_count(), 1);
    }
    subject.on_next(2).unwrap();
    assert_eq!(*seen.borrow(), vec![1]);
    assert!(!subject.has_observers());
  }

  #[test]
  fn unsubscribing_one_keeps_others() {
    let subject = ReplaySubject::<i32, (), _>::new(ImmediateScheduler::new());
    let mut first = subject.subscribe(|_| {}).unwrap();
    let second = subject.subscribe(|_| {}).unwrap();
    first.unsubscribe();
    assert_eq!(subject.observer_count(), 1);
    assert!(!second.is_closed());
    assert!(format!("{first:?}").contains("id: None"));
  }
}
