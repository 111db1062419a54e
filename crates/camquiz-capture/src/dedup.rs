//! Pending-set for in-flight and recently completed captures.
//!
//! A resource identifier stays in the set from the moment its capture
//! starts until `window` after that capture completes. An in-flight entry
//! never expires. Repeated events for the same identifier while it is in
//! the set are collapsed. A failed fetch releases its entry immediately so
//! the next matching request can retry.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Default collapse window.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(5);

/// Map from resource identifier to expiry time; `None` while in flight.
pub struct PendingSet {
    entries: Mutex<HashMap<String, Option<Instant>>>,
    window: Duration,
}

fn is_live(expiry: &Option<Instant>, now: Instant) -> bool {
    expiry.map_or(true, |at| at > now)
}

impl PendingSet {
    pub fn new(window: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            window,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Claim `id` at the current time. See [`PendingSet::try_acquire_at`].
    pub fn try_acquire(&self, id: &str) -> bool {
        self.try_acquire_at(id, Instant::now())
    }

    /// Claim `id` as of `now`, marking it in flight.
    ///
    /// Returns `false` if `id` is in flight or completed within the
    /// window. Expired entries are evicted first.
    pub fn try_acquire_at(&self, id: &str, now: Instant) -> bool {
        let mut entries = self.lock();
        entries.retain(|_, expiry| is_live(expiry, now));

        if entries.contains_key(id) {
            return false;
        }
        entries.insert(id.to_string(), None);
        true
    }

    /// Mark the capture of `id` finished; the window starts now.
    pub fn complete(&self, id: &str) {
        self.complete_at(id, Instant::now());
    }

    pub fn complete_at(&self, id: &str, now: Instant) {
        self.lock().insert(id.to_string(), Some(now + self.window));
    }

    /// Drop the entry for `id` so a future request can retry.
    pub fn release(&self, id: &str) {
        self.lock().remove(id);
    }

    /// True if `id` is in flight or completed within the window as of `now`.
    pub fn is_pending_at(&self, id: &str, now: Instant) -> bool {
        self.lock().get(id).is_some_and(|expiry| is_live(expiry, now))
    }

    pub fn is_pending(&self, id: &str) -> bool {
        self.is_pending_at(id, Instant::now())
    }

    /// Number of entries, expired ones included until the next access.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Option<Instant>>> {
        // A poisoned map is still a valid map
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for PendingSet {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://host/a_config.xml";

    #[test]
    fn test_second_acquire_in_window_fails() {
        let set = PendingSet::new(Duration::from_secs(5));
        let t0 = Instant::now();
        assert!(set.try_acquire_at(URL, t0));
        set.complete_at(URL, t0);
        assert!(!set.try_acquire_at(URL, t0 + Duration::from_secs(1)));
        assert!(set.is_pending_at(URL, t0 + Duration::from_secs(4)));
    }

    #[test]
    fn test_acquire_after_window_succeeds() {
        let set = PendingSet::new(Duration::from_secs(5));
        let t0 = Instant::now();
        assert!(set.try_acquire_at(URL, t0));
        set.complete_at(URL, t0);
        assert!(set.try_acquire_at(URL, t0 + Duration::from_secs(6)));
    }

    #[test]
    fn test_in_flight_entry_never_expires() {
        let set = PendingSet::new(Duration::from_millis(100));
        let t0 = Instant::now();
        assert!(set.try_acquire_at(URL, t0));

        let later = t0 + Duration::from_secs(60);
        assert!(set.is_pending_at(URL, later));
        assert!(!set.try_acquire_at(URL, later));
    }

    #[test]
    fn test_window_starts_at_completion() {
        let set = PendingSet::new(Duration::from_secs(5));
        let t0 = Instant::now();
        assert!(set.try_acquire_at(URL, t0));

        // Slow fetch: completes 20 s after it started
        let done = t0 + Duration::from_secs(20);
        set.complete_at(URL, done);
        assert!(!set.try_acquire_at(URL, done + Duration::from_secs(4)));
        assert!(set.try_acquire_at(URL, done + Duration::from_secs(6)));
    }

    #[test]
    fn test_release_allows_retry() {
        let set = PendingSet::default();
        assert!(set.try_acquire(URL));
        set.release(URL);
        assert!(!set.is_pending(URL));
        assert!(set.try_acquire(URL));
    }

    #[test]
    fn test_identifiers_independent() {
        let set = PendingSet::default();
        assert!(set.try_acquire("a"));
        assert!(set.try_acquire("b"));
        assert!(!set.try_acquire("a"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_expired_entries_evicted_on_access() {
        let set = PendingSet::new(Duration::from_millis(100));
        let t0 = Instant::now();
        set.try_acquire_at("a", t0);
        set.try_acquire_at("b", t0);
        set.complete_at("a", t0);
        set.complete_at("b", t0);
        set.try_acquire_at("pending", t0);
        assert_eq!(set.len(), 3);

        set.try_acquire_at("c", t0 + Duration::from_secs(1));
        // "pending" is still in flight and survives eviction
        assert_eq!(set.len(), 2);
        assert!(!set.is_empty());
    }
}
