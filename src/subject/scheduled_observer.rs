use std::collections::VecDeque;

use crate::{
  notification::Notification,
  observer::BoxedObserver,
  rc::{MutRc, RcDeref, RcDerefMut},
  scheduler::Scheduler,
  subscription::Subscription,
};

/// Per-subscriber delivery adapter.
///
/// Sits between a subject and one downstream observer. The subject only ever
/// [`enqueue`](Self::enqueue)s notifications and asks the adapter to
/// [`ensure_active`](Self::ensure_active); the adapter then drains its queue
/// through the scheduler. This keeps the producer's stack out of observer
/// code and gives every observer strict FIFO delivery.
///
/// # Re-entrancy
///
/// No internal borrow is held while the downstream observer runs, so the
/// observer may emit into the subject, subscribe, or unsubscribe (itself
/// included). Notifications enqueued while a drain is running are picked up
/// by that same drain, after everything queued before them.
///
/// # Disposal
///
/// [`dispose`](Self::dispose) drops everything still queued and the observer
/// itself; later enqueues are ignored. Disposing from inside the observer's
/// own callback takes effect as soon as that callback returns.
pub struct ScheduledObserver<Item, Err, S> {
  state: MutRc<AdapterState<Item, Err>>,
  scheduler: S,
}

type Released<Item, Err> = (VecDeque<Notification<Item, Err>>, Option<BoxedObserver<Item, Err>>);

struct AdapterState<Item, Err> {
  queue: VecDeque<Notification<Item, Err>>,
  observer: Option<BoxedObserver<Item, Err>>,
  /// A drain is scheduled or running.
  acquired: bool,
  disposed: bool,
}

impl<Item, Err> AdapterState<Item, Err> {
  /// Close the adapter, handing back what it owned so the caller can drop it
  /// after releasing the borrow.
  fn close(&mut self) -> Released<Item, Err> {
    self.disposed = true;
    self.acquired = false;
    (std::mem::take(&mut self.queue), self.observer.take())
  }
}

impl<Item, Err, S: Clone> Clone for ScheduledObserver<Item, Err, S> {
  fn clone(&self) -> Self { Self { state: self.state.clone(), scheduler: self.scheduler.clone() } }
}

impl<Item: 'static, Err: 'static, S: Scheduler> ScheduledObserver<Item, Err, S> {
  pub fn new(observer: BoxedObserver<Item, Err>, scheduler: S) -> Self {
    let state = AdapterState {
      queue: VecDeque::new(),
      observer: Some(observer),
      acquired: false,
      disposed: false,
    };
    ScheduledObserver { state: MutRc::own(state), scheduler }
  }

  /// Queue a notification behind everything already pending. Ignored once
  /// disposed.
  pub fn enqueue(&self, notification: Notification<Item, Err>) {
    let mut state = self.state.rc_deref_mut();
    if !state.disposed {
      state.queue.push_back(notification);
    }
  }

  /// Make sure pending notifications will be delivered: hand a drain to the
  /// scheduler unless one is already scheduled or running.
  pub fn ensure_active(&self) {
    {
      let mut state = self.state.rc_deref_mut();
      if state.disposed || state.acquired || state.queue.is_empty() {
        return;
      }
      state.acquired = true;
    }
    let state = self.state.clone();
    self.scheduler.schedule(move || drain(state));
  }

  /// Stop delivering, dropping anything still queued.
  pub fn dispose(&self) {
    let released = {
      let mut state = self.state.rc_deref_mut();
      if state.disposed {
        return;
      }
      state.close()
    };
    drop(released);
  }

  #[inline]
  pub fn is_disposed(&self) -> bool { self.state.rc_deref().disposed }

  /// Number of notifications waiting for the next drain.
  #[inline]
  pub fn pending(&self) -> usize { self.state.rc_deref().queue.len() }
}

impl<Item: 'static, Err: 'static, S: Scheduler> Subscription for ScheduledObserver<Item, Err, S> {
  #[inline]
  fn unsubscribe(&mut self) { self.dispose() }

  #[inline]
  fn is_closed(&self) -> bool { self.is_disposed() }
}

/// Closes the adapter if an observer callback unwinds mid-drain, so the
/// adapter is never left "acquired" with its observer gone.
struct DrainGuard<Item, Err> {
  state: MutRc<AdapterState<Item, Err>>,
  finished: bool,
}

impl<Item, Err> Drop for DrainGuard<Item, Err> {
  fn drop(&mut self) {
    if self.finished {
      return;
    }
    let released = match self.state.try_rc_deref_mut() {
      Some(mut state) => {
        tracing::debug!(dropped = state.queue.len(), "observer panicked during delivery, closing it");
        state.close()
      }
      None => return,
    };
    drop(released);
  }
}

enum Step<Item, Err> {
  Deliver(Notification<Item, Err>, BoxedObserver<Item, Err>),
  Idle,
  Closed(Released<Item, Err>),
}

fn drain<Item, Err>(state: MutRc<AdapterState<Item, Err>>) {
  let mut guard = DrainGuard { state, finished: false };
  loop {
    let step = {
      let mut state = guard.state.rc_deref_mut();
      if state.disposed {
        Step::Closed(state.close())
      } else if let Some(notification) = state.queue.pop_front() {
        match state.observer.take() {
          Some(observer) => Step::Deliver(notification, observer),
          None => Step::Closed(state.close()),
        }
      } else {
        state.acquired = false;
        Step::Idle
      }
    };

    let (notification, observer) = match step {
      Step::Deliver(notification, observer) => (notification, observer),
      Step::Idle => {
        guard.finished = true;
        return;
      }
      Step::Closed(released) => {
        guard.finished = true;
        drop(released);
        return;
      }
    };

    let observer = notification.accept(observer);

    let stale = {
      let mut state = guard.state.rc_deref_mut();
      match observer {
        Some(observer) if !state.disposed => {
          state.observer = Some(observer);
          None
        }
        // disposed from inside the callback
        Some(observer) => Some((VecDeque::new(), Some(observer))),
        // terminal delivered, the observer is gone
        None => Some(state.close()),
      }
    };
    drop(stale);
  }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, rc::Rc};

  use super::*;
  use crate::{
    observer::FnObserver,
    scheduler::{ImmediateScheduler, VirtualTimeScheduler},
  };

  type Log = Rc<RefCell<Vec<String>>>;

  fn logging_observer(log: &Log) -> BoxedObserver<i32, &'static str> {
    let (n, e, c) = (log.clone(), log.clone(), log.clone());
    Box::new(FnObserver::new(
      move |v: i32| n.borrow_mut().push(format!("next {v}")),
      move |err: &'static str| e.borrow_mut().push(format!("error {err}")),
      move || c.borrow_mut().push("complete".to_owned()),
    ))
  }

  #[test]
  fn deferred_until_scheduler_runs() {
    let log = Log::default();
    let scheduler = VirtualTimeScheduler::new();
    let adapter = ScheduledObserver::new(logging_observer(&log), scheduler.clone());
    adapter.enqueue(Notification::Next(1));
    adapter.enqueue(Notification::Next(2));
    adapter.ensure_active();
    adapter.ensure_active();
    assert_eq!(scheduler.pending_count(), 1);
    assert!(log.borrow().is_empty());

    scheduler.flush();
    assert_eq!(*log.borrow(), vec!["next 1", "next 2"]);
    assert_eq!(adapter.pending(), 0);
  }

  #[test]
  fn immediate_delivers_inline() {
    let log = Log::default();
    let adapter = ScheduledObserver::new(logging_observer(&log), ImmediateScheduler::new());
    adapter.enqueue(Notification::Next(1));
    adapter.ensure_active();
    assert_eq!(*log.borrow(), vec!["next 1"]);
  }

  #[test]
  fn terminal_closes_adapter() {
    let log = Log::default();
    let adapter = ScheduledObserver::new(logging_observer(&log), ImmediateScheduler::new());
    adapter.enqueue(Notification::Error("boom"));
    adapter.enqueue(Notification::Next(9));
    adapter.ensure_active();
    assert_eq!(*log.borrow(), vec!["error boom"]);
    assert!(adapter.is_disposed());

    adapter.enqueue(Notification::Completed);
    adapter.ensure_active();
    assert_eq!(log.borrow().len(), 1);
  }

  #[test]
  fn dispose_drops_queued() {
    let log = Log::default();
    let scheduler = VirtualTimeScheduler::new();
    let mut adapter = ScheduledObserver::new(logging_observer(&log), scheduler.clone());
    adapter.enqueue(Notification::Next(1));
    adapter.ensure_active();
    adapter.unsubscribe();
    assert!(adapter.is_closed());

    scheduler.flush();
    assert!(log.borrow().is_empty());
  }

  #[test]
  fn reentrant_enqueue_keeps_fifo() {
    let log = Log::default();
    let slot: Rc<RefCell<Option<ScheduledObserver<i32, (), ImmediateScheduler>>>> = Rc::default();
    let c_slot = slot.clone();
    let c_log = log.clone();
    let observer = FnObserver::new(
      move |v: i32| {
        c_log.borrow_mut().push(format!("next {v}"));
        if v == 1 {
          let adapter = c_slot.borrow().clone().unwrap();
          adapter.enqueue(Notification::Next(3));
          adapter.ensure_active();
        }
      },
      |_: ()| {},
      || {},
    );
    let adapter = ScheduledObserver::new(Box::new(observer), ImmediateScheduler::new());
    *slot.borrow_mut() = Some(adapter.clone());

    adapter.enqueue(Notification::Next(1));
    adapter.enqueue(Notification::Next(2));
    adapter.ensure_active();
    assert_eq!(*log.borrow(), vec!["next 1", "next 2", "next 3"]);
  }

  #[test]
  fn dispose_inside_callback_stops_drain() {
    let log = Log::default();
    let slot: Rc<RefCell<Option<ScheduledObserver<i32, (), ImmediateScheduler>>>> = Rc::default();
    let c_slot = slot.clone();
    let c_log = log.clone();
    let observer = FnObserver::new(
      move |v: i32| {
        c_log.borrow_mut().push(format!("next {v}"));
        c_slot.borrow().as_ref().unwrap().dispose();
      },
      |_: ()| {},
      || {},
    );
    let adapter = ScheduledObserver::new(Box::new(observer), ImmediateScheduler::new());
    *slot.borrow_mut() = Some(adapter.clone());

    adapter.enqueue(Notification::Next(1));
    adapter.enqueue(Notification::Next(2));
    adapter.ensure_active();
    assert_eq!(*log.borrow(), vec!["next 1"]);
    assert!(adapter.is_disposed());
    slot.borrow_mut().take();
  }

  #[test]
  fn panicking_observer_closes_adapter() {
    let observer = FnObserver::new(|_: i32| panic!("observer failed"), |_: ()| {}, || {});
    let adapter = ScheduledObserver::new(Box::new(observer), ImmediateScheduler::new());
    adapter.enqueue(Notification::Next(1));
    adapter.enqueue(Notification::Next(2));
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| adapter.ensure_active()));
    assert!(result.is_err());
    assert!(adapter.is_disposed());
    assert_eq!(adapter.pending(), 0);
  }
}
