//! OAuth authorizations awaiting their callback.
//!
//! Maps `state` to the PKCE verifier. In-memory only; an authorization
//! started before a restart must be restarted.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

const DEFAULT_TTL_SECS: u64 = 600;
const MAX_ENTRIES: usize = 1_000;

pub struct PendingAuthorizations {
    pending: Mutex<HashMap<String, (String, Instant)>>,
    ttl: Duration,
    max_entries: usize,
}

impl PendingAuthorizations {
    pub fn new() -> Self {
        Self::with_ttl(Duration::from_secs(DEFAULT_TTL_SECS))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self::with_limits(ttl, MAX_ENTRIES)
    }

    fn with_limits(ttl: Duration, max_entries: usize) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    /// Record a new authorization. Expired entries are dropped first; at
    /// capacity the oldest live entry is evicted.
    pub fn insert(&self, state: String, verifier: String) {
        let now = Instant::now();
        let mut pending = self
            .pending
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        pending.retain(|_, (_, created)| now.duration_since(*created) < self.ttl);
        while pending.len() >= self.max_entries {
            let Some(oldest) = pending
                .iter()
                .min_by_key(|(_, (_, created))| *created)
                .map(|(key, _)| key.clone())
            else {
                break;
            };
            pending.remove(&oldest);
        }
        pending.insert(state, (verifier, now));
    }

    /// Remove and return the verifier for `state`. Unknown, already used and
    /// expired states all yield `None`.
    pub fn take(&self, state: &str) -> Option<String> {
        let mut pending = self
            .pending
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let (verifier, created) = pending.remove(state)?;
        (created.elapsed() < self.ttl).then_some(verifier)
    }

    pub fn len(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for PendingAuthorizations {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PendingAuthorizations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingAuthorizations")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
