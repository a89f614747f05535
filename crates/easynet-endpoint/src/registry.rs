use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use easynet_transport::Identity;

/// Clients a server has heard from, in first-seen order.
///
/// Entries are never removed; a client that disconnects stays listed.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    order: Vec<Identity>,
    seen: HashSet<Identity>,
}

impl ClientRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `identity`. Returns true the first time it is seen.
    pub fn record(&self, identity: Identity) -> bool {
        let mut inner = self.lock();
        if !inner.seen.insert(identity) {
            return false;
        }
        inner.order.push(identity);
        true
    }

    /// Copy of the identities seen so far, oldest first.
    pub fn snapshot(&self) -> Vec<Identity> {
        self.lock().order.clone()
    }

    /// Whether `identity` has been recorded.
    pub fn contains(&self, identity: &Identity) -> bool {
        self.lock().seen.contains(identity)
    }

    /// Number of distinct identities recorded.
    pub fn len(&self) -> usize {
        self.lock().order.len()
    }

    /// True before the first client is recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
