use std::{
  fmt::{Debug, Formatter},
  time::Duration,
};

use super::{
  config::ReplayConfig,
  phase::{Phase, Terminal},
  replay_buffer::ReplayBuffer,
  scheduled_observer::ScheduledObserver,
  subject_subscription::ReplaySubscription,
  subscribers::{Snapshot, Subscribers},
};
use crate::{
  error::Result,
  notification::Notification,
  observable::Observable,
  observer::Observer,
  rc::{MutRc, RcDeref, RcDerefMut},
  scheduler::Scheduler,
};

/// ReplaySubject: a hot observable that remembers.
///
/// Acts as both an [`Observer`] (values are pushed in) and an
/// [`Observable`] (observers subscribe). Every value pushed in is stamped
/// with the scheduler's time and kept in a replay buffer bounded by count
/// and by age. A new subscriber first receives the buffered values that are
/// still within both bounds, then live values. Once the subject stops
/// (error or completion), current and future subscribers get the buffered
/// values followed by that one terminal notification.
///
/// `ReplaySubject` is a cheap handle: clones share the same buffer,
/// subscribers and lifecycle.
///
/// # Example
///
/// ```rust
/// use std::{cell::RefCell, convert::Infallible, rc::Rc};
///
/// use rxrust_replay::prelude::*;
///
/// let subject = ReplaySubject::<i32, Infallible, _>::with_buffer_size(2, ImmediateScheduler::new())
///   .unwrap();
/// subject.on_next(1).unwrap();
/// subject.on_next(2).unwrap();
/// subject.on_next(3).unwrap();
///
/// let seen = Rc::new(RefCell::new(vec![]));
/// let c_seen = seen.clone();
/// subject.subscribe(move |v| c_seen.borrow_mut().push(v)).unwrap();
/// subject.on_next(4).unwrap();
///
/// assert_eq!(*seen.borrow(), vec![2, 3, 4]);
/// ```
///
/// # Errors and panics
///
/// The inherent `on_next`/`on_error`/`on_completed` are no-ops once the
/// subject stopped and fail with [`ReplayError::Disposed`] once it was
/// disposed. The [`Observer`] implementation forwards to them and panics
/// on `Disposed`, since observer methods cannot report errors.
///
/// Observer callbacks are not isolated from each other. A panicking observer
/// unwinds into whoever triggered the delivery and its subscription is closed.
/// After a panicking `Next` round the other subscribers of that round receive
/// the value on their next drain. After a panicking terminal round they never
/// receive the terminal and their subscriptions never close, since the
/// registry was already emptied.
///
/// [`ReplayError::Disposed`]: crate::error::ReplayError::Disposed
pub struct ReplaySubject<Item, Err, S> {
  state: MutRc<ReplayState<Item, Err, S>>,
  scheduler: S,
}

pub(super) struct ReplayState<Item, Err, S> {
  buffer: ReplayBuffer<Item>,
  pub(super) subscribers: Subscribers<ScheduledObserver<Item, Err, S>>,
  phase: Phase<Err>,
}

impl<Item, Err, S> ReplayState<Item, Err, S>
where
  Item: 'static,
  Err: 'static,
  S: Scheduler,
{
  /// Copy of the live observers, leaving out adapters that closed on their
  /// own (observer panicked).
  fn live_round(&mut self) -> Snapshot<ScheduledObserver<Item, Err, S>> {
    self.subscribers.retain(|adapter| !adapter.is_disposed());
    self.subscribers.snapshot()
  }
}

// ============================================================================
// Construction
// ============================================================================

impl<Item, Err, S> ReplaySubject<Item, Err, S>
where
  Item: Clone + 'static,
  Err: Clone + 'static,
  S: Scheduler + 'static,
{
  /// A subject that replays everything it ever received.
  pub fn new(scheduler: S) -> Self { Self::from_config(ReplayConfig::default(), scheduler) }

  /// A subject bounded by `config`, which must be valid.
  pub fn with_config(config: ReplayConfig, scheduler: S) -> Result<Self> {
    config.validate()?;
    Ok(Self::from_config(config, scheduler))
  }

  /// Replay at most the last `buffer_size` values.
  pub fn with_buffer_size(buffer_size: usize, scheduler: S) -> Result<Self> {
    Self::with_config(ReplayConfig::default().buffer_size(buffer_size), scheduler)
  }

  /// Replay only values produced within `window` of the current time.
  pub fn with_window(window: Duration, scheduler: S) -> Result<Self> {
    Self::with_config(ReplayConfig::default().window(window), scheduler)
  }

  fn from_config(config: ReplayConfig, scheduler: S) -> Self {
    let state = ReplayState {
      buffer: ReplayBuffer::new(config),
      subscribers: Subscribers::default(),
      phase: Phase::Active,
    };
    ReplaySubject { state: MutRc::own(state), scheduler }
  }
}

// ============================================================================
// Producer side
// ============================================================================

impl<Item, Err, S> ReplaySubject<Item, Err, S>
where
  Item: Clone + 'static,
  Err: Clone + 'static,
  S: Scheduler + 'static,
{
  /// Buffer `value` and broadcast it to every current subscriber.
  pub fn on_next(&self, value: Item) -> Result<()> {
    let round = {
      let mut state = self.state.rc_deref_mut();
      if !state.phase.accepts_emission()? {
        return Ok(());
      }
      state.buffer.push(self.scheduler.now(), value.clone());
      state.live_round()
    };
    deliver_round(round, Notification::Next(value));
    Ok(())
  }

  /// Stop with an error. Only the first terminal call has an effect.
  pub fn on_error(&self, err: Err) -> Result<()> { self.terminate(Terminal::Error(err)) }

  /// Stop with completion. Only the first terminal call has an effect.
  pub fn on_completed(&self) -> Result<()> { self.terminate(Terminal::Completed) }

  fn terminate(&self, terminal: Terminal<Err>) -> Result<()> {
    let round = {
      let mut state = self.state.rc_deref_mut();
      if !state.phase.stop(terminal.clone())? {
        return Ok(());
      }
      state.buffer.trim(self.scheduler.now());
      tracing::debug!(
        phase = state.phase.label(),
        observers = state.subscribers.len(),
        buffered = state.buffer.len(),
        "replay subject stopped"
      );
      state.subscribers.retain(|adapter| !adapter.is_disposed());
      state.subscribers.take_all()
    };
    deliver_round(round, terminal.into_notification());
    Ok(())
  }

  /// Tear the subject down for good.
  ///
  /// Subscribers are released without a terminal notification, anything
  /// still queued for them is dropped, and the buffer is cleared. Every later
  /// `subscribe`/`on_next`/`on_error`/`on_completed` fails; calling `dispose`
  /// again does nothing.
  pub fn dispose(&self) {
    let (subscribers, entries) = {
      let mut state = self.state.rc_deref_mut();
      if !state.phase.dispose() {
        return;
      }
      tracing::debug!(
        observers = state.subscribers.len(),
        buffered = state.buffer.len(),
        "replay subject disposed"
      );
      (state.subscribers.take_all(), state.buffer.take_entries())
    };
    for adapter in subscribers {
      adapter.dispose();
    }
    drop(entries);
  }
}

// ============================================================================
// Inspection
// ============================================================================

impl<Item, Err, S> ReplaySubject<Item, Err, S>
where
  Item: Clone,
  S: Scheduler,
{
  /// `true` while at least one observer is registered for live delivery.
  /// Always `false` after the subject stopped or was disposed.
  pub fn has_observers(&self) -> bool { !self.state.rc_deref().subscribers.is_empty() }

  pub fn observer_count(&self) -> usize { self.state.rc_deref().subscribers.len() }

  /// Stopped by an error or completion (and not yet disposed).
  pub fn is_stopped(&self) -> bool { self.state.rc_deref().phase.is_stopped() }

  pub fn is_disposed(&self) -> bool { self.state.rc_deref().phase.is_disposed() }

  /// The values a subscriber joining now would be replayed, oldest first.
  pub fn buffered(&self) -> Vec<Item> {
    let mut state = self.state.rc_deref_mut();
    state.buffer.trim(self.scheduler.now());
    state.buffer.values().cloned().collect()
  }

  pub fn buffer_size(&self) -> usize { self.state.rc_deref().buffer.buffer_size() }

  pub fn window(&self) -> Duration { self.state.rc_deref().buffer.window() }
}

// ============================================================================
// Broadcast
// ============================================================================

/// Fan one notification out to a snapshot of subscribers.
///
/// This is the only place a round is delivered. It runs after the subject
/// released its own state, so observers are free to subscribe, unsubscribe
/// or emit while it runs; the snapshot they were captured in is unaffected.
///
/// The notification is first queued on every adapter of the snapshot and
/// only then are the adapters asked to drain. An observer that emits from
/// inside its callback therefore queues the newer value *behind* this round's
/// value at every later subscriber, keeping per-subscriber order equal to
/// production order.
///
/// Failure policy: observer callbacks are not isolated. A panicking observer
/// unwinds out of this function, and with a synchronous scheduler out of the
/// producer's `on_next`/`on_error`/`on_completed`. Adapters later in the
/// snapshot keep the notification queued. For a `Next` round it is delivered
/// by their next drain, which for live subscribers is the next round. A
/// terminal round has already emptied the registry, so nothing drains those
/// adapters again: they never see the terminal and never close. The adapter
/// whose observer panicked is closed and pruned from the registry.
fn deliver_round<Item, Err, S>(
  round: Snapshot<ScheduledObserver<Item, Err, S>>, notification: Notification<Item, Err>,
) where
  Item: Clone + 'static,
  Err: Clone + 'static,
  S: Scheduler,
{
  tracing::trace!(observers = round.len(), terminal = notification.is_terminal(), "broadcast round");
  if let Some((last, rest)) = round.split_last() {
    for adapter in rest {
      adapter.enqueue(notification.clone());
    }
    last.enqueue(notification);
  }
  for adapter in &round {
    adapter.ensure_active();
  }
}

// ============================================================================
// Observable / Observer
// ============================================================================

impl<Item, Err, S> Observable<Item, Err> for ReplaySubject<Item, Err, S>
where
  Item: Clone + 'static,
  Err: Clone + 'static,
  S: Scheduler + 'static,
{
  type Unsub = ReplaySubscription<Item, Err, S>;

  /// Replay the still-valid buffer (and the terminal, if stopped) to
  /// `observer`, then keep it registered for live values while active.
  fn actual_subscribe<O>(&self, observer: O) -> Result<Self::Unsub>
  where
    O: Observer<Item, Err> + 'static,
  {
    let (adapter, id) = {
      let mut state = self.state.rc_deref_mut();
      state.phase.check_disposed()?;
      state.buffer.trim(self.scheduler.now());

      let adapter = ScheduledObserver::new(Box::new(observer), self.scheduler.clone());
      for value in state.buffer.values() {
        adapter.enqueue(Notification::Next(value.clone()));
      }
      let id = match state.phase.terminal().cloned() {
        Some(terminal) => {
          adapter.enqueue(terminal.into_notification());
          None
        }
        None => Some(state.subscribers.add(adapter.clone())),
      };
      tracing::debug!(
        replayed = state.buffer.len(),
        phase = state.phase.label(),
        observers = state.subscribers.len(),
        "observer subscribed"
      );
      (adapter, id)
    };
    adapter.ensure_active();
    Ok(ReplaySubscription::new(self.state.downgrade(), id, adapter))
  }
}

macro_rules! expect_not_disposed {
  ($result:expr) => {
    if let Err(err) = $result {
      panic!("{err}: emitting into a disposed ReplaySubject through `Observer`");
    }
  };
}

impl<Item, Err, S> Observer<Item, Err> for ReplaySubject<Item, Err, S>
where
  Item: Clone + 'static,
  Err: Clone + 'static,
  S: Scheduler + 'static,
{
  fn next(&mut self, value: Item) { expect_not_disposed!(self.on_next(value)) }

  fn error(self, err: Err) { expect_not_disposed!(self.on_error(err)) }

  fn complete(self) { expect_not_disposed!(self.on_completed()) }

  fn is_closed(&self) -> bool { !self.state.rc_deref().phase.is_active() }
}

// ============================================================================
// Standard Traits
// ============================================================================

impl<Item, Err, S: Clone> Clone for ReplaySubject<Item, Err, S> {
  fn clone(&self) -> Self { Self { state: self.state.clone(), scheduler: self.scheduler.clone() } }
}

impl<Item, Err, S> Debug for ReplaySubject<Item, Err, S> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let state = self.state.rc_deref();
    f.debug_struct("ReplaySubject")
      .field("phase", &state.phase.label())
      .field("observers", &state.subscribers.len())
      .field("buffered", &state.buffer.len())
      .finish()
  }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, rc::Rc};

  use super::*;
  use crate::{
    error::ReplayError,
    scheduler::{ImmediateScheduler, VirtualTimeScheduler},
    subscription::Subscription,
  };

  type Log = Rc<RefCell<Vec<String>>>;

  fn record<S: Scheduler + 'static>(
    subject: &ReplaySubject<i32, String, S>, log: &Log,
  ) -> Result<ReplaySubscription<i32, String, S>> {
    let (n, e, c) = (log.clone(), log.clone(), log.clone());
    subject.subscribe_all(
      move |v| n.borrow_mut().push(v.to_string()),
      move |err| e.borrow_mut().push(format!("error:{err}")),
      move || c.borrow_mut().push("done".to_owned()),
    )
  }

  #[test]
  fn replays_then_goes_live() {
    let subject = ReplaySubject::<i32, String, _>::new(ImmediateScheduler::new());
    subject.on_next(1).unwrap();
    subject.on_next(2).unwrap();

    let log = Log::default();
    let _sub = record(&subject, &log).unwrap();
    subject.on_next(3).unwrap();
    assert_eq!(*log.borrow(), vec!["1", "2", "3"]);
    assert!(subject.has_observers());
  }

  #[test]
  fn terminal_clears_observers_and_is_replayed() {
    let subject = ReplaySubject::<i32, String, _>::with_buffer_size(1, ImmediateScheduler::new()).unwrap();
    let early = Log::default();
    let _sub = record(&subject, &early).unwrap();
    subject.on_next(1).unwrap();
    subject.on_next(2).unwrap();
    subject.on_error("bad".to_owned()).unwrap();
    subject.on_completed().unwrap();
    subject.on_next(3).unwrap();
    assert!(!subject.has_observers());
    assert!(subject.is_stopped());
    assert_eq!(*early.borrow(), vec!["1", "2", "error:bad"]);

    let late = Log::default();
    let sub = record(&subject, &late).unwrap();
    assert_eq!(*late.borrow(), vec!["2", "error:bad"]);
    assert!(sub.is_closed());
    assert_eq!(subject.observer_count(), 0);
  }

  #[test]
  fn unsubscribe_removes_observer() {
    let subject = ReplaySubject::<i32, String, _>::new(ImmediateScheduler::new());
    let log = Log::default();
    let mut sub = record(&subject, &log).unwrap();
    subject.on_next(1).unwrap();
    sub.unsubscribe();
    sub.unsubscribe();
    subject.on_next(2).unwrap();
    assert_eq!(*log.borrow(), vec!["1"]);
    assert!(!subject.has_observers());
  }

  #[test]
  fn unsubscribe_suppresses_queued_delivery() {
    let scheduler = VirtualTimeScheduler::new();
    let subject = ReplaySubject::<i32, String, _>::new(scheduler.clone());
    subject.on_next(1).unwrap();
    let log = Log::default();
    let mut sub = record(&subject, &log).unwrap();
    subject.on_next(2).unwrap();
    sub.unsubscribe();
    scheduler.flush();
    assert!(log.borrow().is_empty());
  }

  #[test]
  fn deferred_scheduler_keeps_order() {
    let scheduler = VirtualTimeScheduler::new();
    let subject = ReplaySubject::<i32, String, _>::new(scheduler.clone());
    subject.on_next(1).unwrap();
    let log = Log::default();
    let _sub = record(&subject, &log).unwrap();
    subject.on_next(2).unwrap();
    subject.on_completed().unwrap();
    assert!(log.borrow().is_empty());
    scheduler.flush();
    assert_eq!(*log.borrow(), vec!["1", "2", "done"]);
  }

  #[test]
  fn window_uses_scheduler_time() {
    let scheduler = VirtualTimeScheduler::new();
    let subject =
      ReplaySubject::<i32, String, _>::with_window(Duration::from_millis(100), scheduler.clone()).unwrap();
    subject.on_next(1).unwrap();
    scheduler.advance_by(Duration::from_millis(60));
    subject.on_next(2).unwrap();
    scheduler.advance_by(Duration::from_millis(60));
    assert_eq!(subject.buffered(), vec![2]);
    assert_eq!(subject.window(), Duration::from_millis(100));
    assert_eq!(subject.buffer_size(), usize::MAX);
  }

  #[test]
  fn disposed_refuses_everything() {
    let subject = ReplaySubject::<i32, String, _>::new(ImmediateScheduler::new());
    let log = Log::default();
    let sub = record(&subject, &log).unwrap();
    subject.on_next(1).unwrap();
    subject.dispose();
    subject.dispose();

    assert!(subject.is_disposed());
    assert!(!subject.has_observers());
    assert!(sub.is_closed());
    assert!(subject.buffered().is_empty());
    assert_eq!(subject.on_next(2), Err(ReplayError::Disposed));
    assert_eq!(subject.on_error("x".to_owned()), Err(ReplayError::Disposed));
    assert_eq!(subject.on_completed(), Err(ReplayError::Disposed));
    assert!(matches!(record(&subject, &log), Err(ReplayError::Disposed)));
    assert_eq!(*log.borrow(), vec!["1"]);
  }

  #[test]
  fn rejects_invalid_config() {
    let scheduler = ImmediateScheduler::new();
    assert!(matches!(
      ReplaySubject::<i32, (), _>::with_buffer_size(0, scheduler),
      Err(ReplayError::InvalidBufferSize)
    ));
    assert!(matches!(
      ReplaySubject::<i32, (), _>::with_window(Duration::ZERO, scheduler),
      Err(ReplayError::InvalidWindow { .. })
    ));
  }

  #[test]
  fn subject_observes_subject() {
    let source = ReplaySubject::<i32, String, _>::new(ImmediateScheduler::new());
    let relay = ReplaySubject::<i32, String, _>::new(ImmediateScheduler::new());
    source.on_next(1).unwrap();
    source.actual_subscribe(relay.clone()).unwrap();
    source.on_next(2).unwrap();
    source.on_completed().unwrap();

    assert_eq!(relay.buffered(), vec![1, 2]);
    assert!(relay.is_stopped());
    assert!(Observer::is_closed(&relay));
  }

  #[test]
  #[should_panic(expected = "disposed")]
  fn observer_impl_panics_when_disposed() {
    let mut subject = ReplaySubject::<i32, (), _>::new(ImmediateScheduler::new());
    subject.dispose();
    Observer::next(&mut subject, 1);
  }

  #[test]
  fn debug_output() {
    let subject = ReplaySubject::<i32, (), _>::new(ImmediateScheduler::new());
    subject.on_next(1).unwrap();
    let text = format!("{subject:?}");
    assert!(text.contains("phase: \"active\""));
    assert!(text.contains("buffered: 1"));
  }
}
