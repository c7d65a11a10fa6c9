//! Registry of currently visible devices.
//!
//! The registry keeps the latest observation per address. Entries keep the
//! slot they were first inserted in, so consumers polling [`DeviceRegistry::list`]
//! see a stable ordering, and they are dropped once their latest observation
//! is older than the configured maximum age.
//!
//! A single mutex serializes the producer (`upsert`) and any number of
//! consumers (`list`); share the registry as `Arc<DeviceRegistry>`.

use crate::mac_address::MacAddress;
use crate::observation::{Observation, monotonic_nanos};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::debug;

/// Default maximum age of an entry.
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(50);

/// The most recent observation of one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    pub address: MacAddress,
    pub latest: Observation,
}

#[derive(Debug)]
struct RegistryState {
    entries: Vec<RegistryEntry>,
    /// Maximum age in nanoseconds, 0 disables eviction
    max_age: u64,
    history: Option<Vec<Observation>>,
}

impl RegistryState {
    fn upsert(&mut self, obs: Observation) {
        if let Some(history) = self.history.as_mut() {
            history.push(obs.clone());
        }

        match self
            .entries
            .iter_mut()
            .find(|entry| entry.address == obs.address)
        {
            Some(entry) => entry.latest = obs,
            None => {
                debug!(address = %obs.address, "new device");
                self.entries.push(RegistryEntry {
                    address: obs.address,
                    latest: obs,
                });
            }
        }
    }

    fn evict(&mut self, now: u64) {
        let max_age = self.max_age;
        if max_age == 0 {
            return;
        }
        self.entries.retain(|entry| {
            let timestamp = entry.latest.timestamp;
            let expired = timestamp > 0 && now.saturating_sub(timestamp) > max_age;
            if expired {
                debug!(address = %entry.address, "drop device");
            }
            !expired
        });
    }
}

/// Thread-safe store of the latest observation per device.
#[derive(Debug)]
pub struct DeviceRegistry {
    state: Mutex<RegistryState>,
}

impl Default for DeviceRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_AGE)
    }
}

fn duration_nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}

impl DeviceRegistry {
    /// Create an empty registry; a zero `max_age` disables eviction.
    pub fn new(max_age: Duration) -> Self {
        Self {
            state: Mutex::new(RegistryState {
                entries: Vec::new(),
                max_age: duration_nanos(max_age),
                history: None,
            }),
        }
    }

    /// Create a registry that also records every observation it receives.
    pub fn with_history(max_age: Duration) -> Self {
        let registry = Self::new(max_age);
        registry.lock().history = Some(Vec::new());
        registry
    }

    // Every mutation completes under the lock, so a poisoned guard still holds consistent state.
    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record `obs` as the latest observation of its device, then evict stale entries.
    pub fn upsert(&self, obs: Observation) {
        self.upsert_at(obs, monotonic_nanos());
    }

    /// Like [`upsert`](Self::upsert), evaluating ages against `now` (nanoseconds).
    pub fn upsert_at(&self, obs: Observation, now: u64) {
        let mut state = self.lock();
        state.upsert(obs);
        state.evict(now);
    }

    /// Evict stale entries and return the live ones in insertion order.
    pub fn list(&self) -> Vec<RegistryEntry> {
        self.list_at(monotonic_nanos())
    }

    /// Like [`list`](Self::list), evaluating ages against `now` (nanoseconds).
    pub fn list_at(&self, now: u64) -> Vec<RegistryEntry> {
        let mut state = self.lock();
        state.evict(now);
        state.entries.clone()
    }

    /// Remove all entries (and recorded history), e.g. when a new session starts.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.entries.clear();
        if let Some(history) = state.history.as_mut() {
            history.clear();
        }
    }

    /// Set the eviction threshold in whole seconds; 0 disables eviction.
    pub fn set_max_age_secs(&self, seconds: u64) {
        self.set_max_age(Duration::from_secs(seconds));
    }

    /// Set the eviction threshold; a zero duration disables eviction.
    pub fn set_max_age(&self, max_age: Duration) {
        self.lock().max_age = duration_nanos(max_age);
    }

    pub fn max_age(&self) -> Duration {
        Duration::from_nanos(self.lock().max_age)
    }

    /// Every observation received since the last [`clear`](Self::clear).
    ///
    /// Empty unless the registry was created [`with_history`](Self::with_history).
    pub fn history(&self) -> Vec<Observation> {
        self.lock().history.clone().unwrap_or_default()
    }

    /// Number of entries currently stored, without evicting.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{mac, observation};
    use std::sync::Arc;
    use std::thread;

    fn nanos(max_age: u64) -> DeviceRegistry {
        DeviceRegistry::new(Duration::from_nanos(max_age))
    }

    fn addresses_and_times(entries: &[RegistryEntry]) -> Vec<(MacAddress, u64)> {
        entries
            .iter()
            .map(|e| (e.address, e.latest.timestamp))
            .collect()
    }

    #[test]
    fn test_upsert_replaces_same_address() {
        let registry = nanos(0);
        registry.upsert_at(observation(mac(1), 10, vec![1]), 10);
        registry.upsert_at(observation(mac(1), 5, vec![2]), 10);

        let entries = registry.list_at(10);
        assert_eq!(entries.len(), 1);
        // Last write wins, even with an older timestamp.
        assert_eq!(entries[0].latest.timestamp, 5);
        assert_eq!(entries[0].latest.raw_payload, vec![2]);
    }

    #[test]
    fn test_list_keeps_insertion_order_across_replacements() {
        let registry = nanos(0);
        for (n, t) in [(1, 1), (2, 2), (3, 3), (2, 4), (1, 5), (3, 6), (4, 7)] {
            registry.upsert_at(observation(mac(n), t, vec![]), t);
        }

        assert_eq!(
            addresses_and_times(&registry.list_at(7)),
            vec![(mac(1), 5), (mac(2), 4), (mac(3), 6), (mac(4), 7)]
        );
    }

    #[test]
    fn test_eviction_boundary() {
        let registry = nanos(3);
        registry.upsert_at(observation(mac(1), 10, vec![]), 10);
        registry.upsert_at(observation(mac(2), 11, vec![]), 11);

        // mac(1) is exactly max_age old and stays.
        assert_eq!(registry.list_at(13).len(), 2);
        // One tick later it is one past max_age and goes.
        assert_eq!(
            addresses_and_times(&registry.list_at(14)),
            vec![(mac(2), 11)]
        );
    }

    #[test]
    fn test_zero_max_age_disables_eviction() {
        let registry = nanos(0);
        registry.upsert_at(observation(mac(1), 1, vec![]), 1);
        assert_eq!(registry.list_at(u64::MAX).len(), 1);
    }

    #[test]
    fn test_zero_timestamp_never_ages_out() {
        let registry = nanos(3);
        registry.upsert_at(observation(mac(1), 0, vec![]), 0);
        assert_eq!(registry.list_at(1_000).len(), 1);
    }

    #[test]
    fn test_replace_then_evict_scenario() {
        let registry = nanos(3);
        registry.upsert_at(observation(mac(0xA), 0, vec![]), 0);
        registry.upsert_at(observation(mac(0xB), 1, vec![]), 1);
        registry.upsert_at(observation(mac(0xA), 5, vec![]), 5);

        // B is 6 - 1 = 5 > 3 old and must be gone.
        assert_eq!(
            addresses_and_times(&registry.list_at(6)),
            vec![(mac(0xA), 5)]
        );
    }

    #[test]
    fn test_upsert_evicts_other_stale_entries() {
        let registry = nanos(3);
        registry.upsert_at(observation(mac(1), 1, vec![]), 1);
        registry.upsert_at(observation(mac(2), 10, vec![]), 10);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_timestamp_ahead_of_now_is_kept() {
        let registry = nanos(3);
        registry.upsert_at(observation(mac(1), 100, vec![]), 100);
        assert_eq!(registry.list_at(50).len(), 1);
    }

    #[test]
    fn test_set_max_age_secs() {
        let registry = DeviceRegistry::default();
        assert_eq!(registry.max_age(), DEFAULT_MAX_AGE);

        registry.set_max_age_secs(2);
        assert_eq!(registry.max_age(), Duration::from_secs(2));
        registry.upsert_at(observation(mac(1), 1, vec![]), 1);
        assert_eq!(registry.list_at(2_000_000_001).len(), 1);
        assert!(registry.list_at(2_000_000_002).is_empty());

        registry.set_max_age_secs(0);
        registry.upsert_at(observation(mac(1), 1, vec![]), 1);
        assert_eq!(registry.list_at(u64::MAX).len(), 1);
    }

    #[test]
    fn test_clear() {
        let registry = DeviceRegistry::with_history(Duration::ZERO);
        registry.upsert_at(observation(mac(1), 1, vec![]), 1);
        registry.upsert_at(observation(mac(2), 2, vec![]), 2);
        registry.clear();
        assert!(registry.is_empty());
        assert!(registry.history().is_empty());
    }

    #[test]
    fn test_history_records_every_observation() {
        let registry = DeviceRegistry::with_history(Duration::ZERO);
        registry.upsert_at(observation(mac(1), 1, vec![]), 1);
        registry.upsert_at(observation(mac(1), 2, vec![]), 2);
        registry.upsert_at(observation(mac(2), 3, vec![]), 3);

        assert_eq!(registry.len(), 2);
        let times: Vec<u64> = registry.history().iter().map(|o| o.timestamp).collect();
        assert_eq!(times, vec![1, 2, 3]);
    }

    #[test]
    fn test_history_disabled_by_default() {
        let registry = nanos(0);
        registry.upsert_at(observation(mac(1), 1, vec![]), 1);
        assert!(registry.history().is_empty());
    }

    #[test]
    fn test_wall_clock_upsert_and_list() {
        let registry = DeviceRegistry::default();
        registry.upsert(observation(mac(1), monotonic_nanos(), vec![]));
        assert_eq!(registry.list().len(), 1);
    }

    #[test]
    fn test_concurrent_upsert_and_list() {
        let registry = Arc::new(nanos(0));

        let writers: Vec<_> = (0..4u8)
            .map(|w| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    for i in 0..100u64 {
                        let address = mac(w * 10 + (i % 5) as u8);
                        registry.upsert_at(observation(address, i + 1, vec![]), i + 1);
                    }
                })
            })
            .collect();
        let reader = {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                for _ in 0..100 {
                    assert!(registry.list_at(1).len() <= 20);
                }
            })
        };

        for writer in writers {
            writer.join().unwrap();
        }
        reader.join().unwrap();

        assert_eq!(registry.list_at(1).len(), 20);
    }
}
