//! Document-style in-memory store. Collections support predicate find,
//! insert, update-by-id, and remove; each carries its own id counter.

use std::sync::atomic::{AtomicI64, Ordering};

use dashmap::DashMap;

use crate::model::{Machine, Reservation, User};

/// One collection of documents keyed by integer id.
///
/// Ids are allocated from a monotonically increasing counter seeded from the
/// max existing id at restore time and are never reused after deletion.
pub struct Collection<T> {
    docs: DashMap<i64, T>,
    next_id: AtomicI64,
}

impl<T: Clone> Default for Collection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Collection<T> {
    pub fn new() -> Self {
        Self {
            docs: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }

    /// Claim the next id. Safe to call concurrently; ids are unique even for
    /// inserts that later fail validation and never land.
    pub fn allocate_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Bump the counter so future allocations stay above `max_seen`.
    fn seed_counter(&self, max_seen: i64) {
        self.next_id.fetch_max(max_seen + 1, Ordering::SeqCst);
    }

    pub fn insert(&self, id: i64, doc: T) {
        self.docs.insert(id, doc);
    }

    pub fn get(&self, id: i64) -> Option<T> {
        self.docs.get(&id).map(|e| e.value().clone())
    }

    pub fn contains(&self, id: i64) -> bool {
        self.docs.contains_key(&id)
    }

    pub fn remove(&self, id: i64) -> Option<T> {
        self.docs.remove(&id).map(|(_, doc)| doc)
    }

    /// All documents matching the predicate, in unspecified order.
    pub fn find<P: Fn(&T) -> bool>(&self, pred: P) -> Vec<T> {
        self.docs
            .iter()
            .filter(|e| pred(e.value()))
            .map(|e| e.value().clone())
            .collect()
    }

    pub fn find_one<P: Fn(&T) -> bool>(&self, pred: P) -> Option<T> {
        self.docs
            .iter()
            .find(|e| pred(e.value()))
            .map(|e| e.value().clone())
    }

    pub fn count<P: Fn(&T) -> bool>(&self, pred: P) -> usize {
        self.docs.iter().filter(|e| pred(e.value())).count()
    }

    /// Mutate the document with the given id in place. Returns false if it
    /// does not exist.
    pub fn update<F: FnOnce(&mut T)>(&self, id: i64, mutate: F) -> bool {
        match self.docs.get_mut(&id) {
            Some(mut entry) => {
                mutate(entry.value_mut());
                true
            }
            None => false,
        }
    }

    /// Remove every document matching the predicate, returning how many went.
    pub fn remove_where<P: Fn(&T) -> bool>(&self, pred: P) -> usize {
        let doomed: Vec<i64> = self
            .docs
            .iter()
            .filter(|e| pred(e.value()))
            .map(|e| *e.key())
            .collect();
        let mut removed = 0;
        for id in doomed {
            if self.docs.remove(&id).is_some() {
                removed += 1;
            }
        }
        removed
    }

    pub fn all(&self) -> Vec<T> {
        self.docs.iter().map(|e| e.value().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

/// The three collections the engine works against.
pub struct Store {
    pub machines: Collection<Machine>,
    pub reservations: Collection<Reservation>,
    pub users: Collection<User>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    pub fn new() -> Self {
        Self {
            machines: Collection::new(),
            reservations: Collection::new(),
            users: Collection::new(),
        }
    }

    /// Load documents handed over by the host (e.g. read from its external
    /// persistence) and seed each id counter from the max id present.
    pub fn restore(
        machines: Vec<Machine>,
        reservations: Vec<Reservation>,
        users: Vec<User>,
    ) -> Self {
        let store = Self::new();
        for m in machines {
            store.machines.seed_counter(m.id);
            store.machines.insert(m.id, m);
        }
        for r in reservations {
            store.reservations.seed_counter(r.id);
            store.reservations.insert(r.id, r);
        }
        for u in users {
            store.users.seed_counter(u.id);
            store.users.insert(u.id, u);
        }
        store
    }
}
