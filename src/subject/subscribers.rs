use smallvec::SmallVec;

/// Subscribers container with ID-based management.
///
/// This struct holds the observers subscribed to a subject in registration
/// order. Each observer gets a unique ID on `add`, which the subscription
/// handle later uses to remove exactly that entry.
///
/// # Design Rationale
///
/// - **Copy-on-broadcast**: a broadcast never iterates the live list. It takes
///   a [`snapshot`](Subscribers::snapshot) first, so observers may subscribe
///   or unsubscribe while a round is being delivered without the round
///   skipping or repeating anyone.
/// - **SmallVec Optimization**: Uses `SmallVec<[_; 2]>` to avoid heap
///   allocation for the common case of 0-2 observers.
///
/// # Type Parameters
///
/// - `Ob`: The observer handle stored in this container. It must be cheap to
///   clone (an `Rc`-backed handle) to take snapshots.
pub struct Subscribers<Ob> {
  next_id: usize,
  items: SmallVec<[(usize, Ob); 2]>,
}

/// An independent copy of the registry taken at the start of a round.
pub type Snapshot<Ob> = SmallVec<[Ob; 2]>;

impl<Ob> Default for Subscribers<Ob> {
  fn default() -> Self { Self { next_id: 0, items: SmallVec::new() } }
}

impl<Ob> Subscribers<Ob> {
  /// Add an observer and return its unique ID.
  #[inline]
  pub fn add(&mut self, observer: Ob) -> usize {
    let id = self.next_id;
    self.next_id += 1;
    self.items.push((id, observer));
    id
  }

  /// Remove an observer by ID. Missing IDs are ignored.
  pub fn remove(&mut self, id: usize) -> Option<Ob> {
    self
      .items
      .iter()
      .position(|(i, _)| *i == id)
      .map(|pos| self.items.remove(pos).1)
  }

  #[inline]
  pub fn len(&self) -> usize { self.items.len() }

  #[inline]
  pub fn is_empty(&self) -> bool { self.items.is_empty() }

  /// Drop every observer for which `keep` returns `false`.
  pub fn retain(&mut self, mut keep: impl FnMut(&Ob) -> bool) { self.items.retain(|(_, ob)| keep(ob)) }

  /// Remove all observers, returning them in registration order.
  pub fn take_all(&mut self) -> Snapshot<Ob> { self.items.drain(..).map(|(_, ob)| ob).collect() }
}

impl<Ob: Clone> Subscribers<Ob> {
  /// Copy the current observers, in registration order.
  pub fn snapshot(&self) -> Snapshot<Ob> { self.items.iter().map(|(_, ob)| ob.clone()).collect() }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn ids_are_unique_and_ordered() {
    let mut subscribers = Subscribers::default();
    let a = subscribers.add("a");
    let b = subscribers.add("b");
    assert_ne!(a, b);
    assert_eq!(subscribers.remove(a), Some("a"));
    assert_eq!(subscribers.remove(a), None);
    let c = subscribers.add("c");
    assert_ne!(c, a);
    assert_eq!(subscribers.remove(b), Some("b"));
    subscribers.add("b");
    assert_eq!(subscribers.snapshot().as_slice(), &["c", "b"]);
  }

  #[test]
  fn snapshot_is_independent() {
    let mut subscribers = Subscribers::default();
    let a = subscribers.add(1);
    subscribers.add(2);
    let snapshot = subscribers.snapshot();
    subscribers.remove(a);
    subscribers.add(3);
    assert_eq!(snapshot.as_slice(), &[1, 2]);
    assert_eq!(subscribers.snapshot().as_slice(), &[2, 3]);
  }

  #[test]
  fn take_all_empties() {
    let mut subscribers = Subscribers::default();
    subscribers.add(1);
    subscribers.add(2);
    subscribers.retain(|v| *v != 1);
    assert_eq!(subscribers.take_all().as_slice(), &[2]);
    assert!(subscribers.is_empty());
    assert_eq!(subscribers.len(), 0);
  }
}
