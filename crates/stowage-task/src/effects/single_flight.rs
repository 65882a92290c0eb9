//! Single-flight primitives.
//!
//! [`SingleFlightGuard`] drops an invocation while another of the same key is
//! still running. [`SingleFlightGroup`] instead lets the newcomer attach to
//! the running invocation's shared value.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;

/// Admits at most one in-flight invocation per key.
pub struct SingleFlightGuard<K> {
    in_flight: Arc<Mutex<HashSet<K>>>,
}

impl<K: Eq + Hash + Clone> SingleFlightGuard<K> {
    pub fn new() -> Self {
        Self {
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Enter the flight for `key`, or `None` if one is already running.
    /// The key stays occupied until the returned permit is dropped.
    pub fn try_enter(&self, key: K) -> Option<FlightPermit<K>> {
        if !self.in_flight.lock().insert(key.clone()) {
            return None;
        }
        Some(FlightPermit {
            key,
            in_flight: Arc::clone(&self.in_flight),
        })
    }

    pub fn is_in_flight(&self, key: &K) -> bool { self.in_flight.lock().contains(key) }
}

impl<K: Eq + Hash + Clone> Default for SingleFlightGuard<K> {
    fn default() -> Self { Self::new() }
}

impl<K> Clone for SingleFlightGuard<K> {
    fn clone(&self) -> Self {
        Self {
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

/// Proof of an occupied flight. Releases the key on drop.
pub struct FlightPermit<K: Eq + Hash> {
    key:       K,
    in_flight: Arc<Mutex<HashSet<K>>>,
}

impl<K: Eq + Hash> Drop for FlightPermit<K> {
    fn drop(&mut self) { self.in_flight.lock().remove(&self.key); }
}

struct Calls<K, V> {
    entries: HashMap<K, (u64, V)>,
    next_id: u64,
}

/// Shares one running invocation per key among every caller that asks for
/// it while it runs.
pub struct SingleFlightGroup<K, V> {
    calls: Arc<Mutex<Calls<K, V>>>,
}

/// Outcome of [`SingleFlightGroup::join_or_start`].
pub enum Flight<K: Eq + Hash, V> {
    /// No invocation was running; the caller must drive the new one and keep
    /// the lease alive for as long as it runs.
    Leader { value: V, lease: FlightLease<K, V> },
    /// Attached to the invocation already running for this key.
    Follower(V),
}

impl<K: Eq + Hash + Clone, V: Clone> SingleFlightGroup<K, V> {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Calls {
                entries: HashMap::new(),
                next_id: 0,
            })),
        }
    }

    /// Attach to the running invocation for `key`, or register a new one
    /// built by `start`. `start` runs under the group's lock and must not
    /// block or re-enter the group.
    pub fn join_or_start(&self, key: K, start: impl FnOnce() -> V) -> Flight<K, V> {
        self.join_live_or_start(key, |_| true, start)
    }

    /// Like [`join_or_start`](Self::join_or_start), but only joins a running
    /// invocation that `is_live` accepts. A rejected entry, e.g. one already
    /// winding down, is replaced; its lease then no longer removes anything.
    pub fn join_live_or_start(
        &self,
        key: K,
        is_live: impl FnOnce(&V) -> bool,
        start: impl FnOnce() -> V,
    ) -> Flight<K, V> {
        let mut calls = self.calls.lock();
        if let Some((_, value)) = calls.entries.get(&key)
            && is_live(value)
        {
            return Flight::Follower(value.clone());
        }

        let id = calls.next_id;
        calls.next_id += 1;
        let value = start();
        calls.entries.insert(key.clone(), (id, value.clone()));

        Flight::Leader {
            value,
            lease: FlightLease {
                key,
                id,
                calls: Arc::clone(&self.calls),
            },
        }
    }

    pub fn contains(&self, key: &K) -> bool { self.calls.lock().entries.contains_key(key) }

    pub fn len(&self) -> usize { self.calls.lock().entries.len() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }
}

impl<K: Eq + Hash + Clone, V: Clone> Default for SingleFlightGroup<K, V> {
    fn default() -> Self { Self::new() }
}

impl<K, V> Clone for SingleFlightGroup<K, V> {
    fn clone(&self) -> Self {
        Self {
            calls: Arc::clone(&self.calls),
        }
    }
}

/// Keeps a group entry registered. Dropping it lets the next caller for the
/// same key start a fresh invocation.
pub struct FlightLease<K: Eq + Hash, V> {
    key:   K,
    id:    u64,
    calls: Arc<Mutex<Calls<K, V>>>,
}

impl<K: Eq + Hash, V> Drop for FlightLease<K, V> {
    fn drop(&mut self) {
        let mut calls = self.calls.lock();
        if calls.entries.get(&self.key).is_some_and(|(id, _)| *id == self.id) {
            calls.entries.remove(&self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_drops_second_invocation() {
        let guard = SingleFlightGuard::new();

        let permit = guard.try_enter("sample").unwrap();
        assert!(guard.is_in_flight(&"sample"));
        assert!(guard.try_enter("sample").is_none());
        assert!(guard.try_enter("other").is_some());

        drop(permit);
        assert!(!guard.is_in_flight(&"sample"));
        assert!(guard.try_enter("sample").is_some());
    }

    #[test]
    fn test_group_followers_share_leader_value() {
        let group: SingleFlightGroup<&str, u32> = SingleFlightGroup::new();

        let lease = match group.join_or_start("bucket", || 7) {
            Flight::Leader { value, lease } => {
                assert_eq!(value, 7);
                lease
            }
            Flight::Follower(_) => panic!("first caller must lead"),
        };

        match group.join_or_start("bucket", || unreachable!("must not start twice")) {
            Flight::Follower(value) => assert_eq!(value, 7),
            Flight::Leader { .. } => panic!("second caller must follow"),
        }
        assert_eq!(group.len(), 1);

        drop(lease);
        assert!(group.is_empty());
        assert!(matches!(group.join_or_start("bucket", || 8), Flight::Leader { value: 8, .. }));
    }

    #[test]
    fn test_group_replaces_dead_entry() {
        let group: SingleFlightGroup<&str, u32> = SingleFlightGroup::new();

        let stale = match group.join_or_start("bucket", || 1) {
            Flight::Leader { lease, .. } => lease,
            Flight::Follower(_) => panic!("first caller must lead"),
        };
        let fresh = group.join_live_or_start("bucket", |value| *value != 1, || 2);
        assert!(matches!(fresh, Flight::Leader { value: 2, .. }));

        drop(stale);
        assert!(group.contains(&"bucket"));
        match group.join_or_start("bucket", || 3) {
            Flight::Follower(value) => assert_eq!(value, 2),
            Flight::Leader { .. } => panic!("stale lease must not remove the fresh entry"),
        }
    }

    #[test]
    fn test_group_keys_are_independent() {
        let group: SingleFlightGroup<String, u32> = SingleFlightGroup::new();

        let _a = group.join_or_start("a".to_string(), || 1);
        let _b = group.join_or_start("b".to_string(), || 2);

        assert!(group.contains(&"a".to_string()));
        assert!(group.contains(&"b".to_string()));
        assert_eq!(group.len(), 2);
    }
}
