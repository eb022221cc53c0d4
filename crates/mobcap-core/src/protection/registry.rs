use mobcap_types::EntityId;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::thread::JoinHandle;

use super::store::{ProtectionEntries, ProtectionStore};
use crate::config::ProtectionConfig;
use crate::error::PersistenceError;

/// What one persistence attempt did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    Saved { entries: usize, evicted: usize },
    /// Another attempt was still running
    SkippedInFlight,
    /// Persistence gave up after repeated failures
    SkippedDisabled,
    Failed { consecutive: u32 },
}

/// Animals recently bred or interacted with, keyed to a timestamp
///
/// An entry protects its animal until more than `cleanup_period_ms` has
/// passed since it was written. The map is the only engine state shared with the
/// persistence worker, so it sits behind a lock.
pub struct ProtectionRegistry {
    entries: RwLock<ProtectionEntries>,
    cleanup_period_ms: u64,
    store: Arc<dyn ProtectionStore>,
    in_flight: AtomicBool,
    failures: AtomicU32,
    disabled: AtomicBool,
    max_failures: u32,
}

/// Clears the in-flight flag when a persistence attempt ends
struct FlightGuard<'a>(&'a AtomicBool);

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ProtectionRegistry {
    pub fn new(cleanup_period_ms: u64, max_failures: u32, store: Arc<dyn ProtectionStore>) -> Self {
        Self {
            entries: RwLock::new(ProtectionEntries::default()),
            cleanup_period_ms,
            store,
            in_flight: AtomicBool::new(false),
            failures: AtomicU32::new(0),
            disabled: AtomicBool::new(false),
            max_failures: max_failures.max(1),
        }
    }

    pub fn from_config(config: &ProtectionConfig, store: Arc<dyn ProtectionStore>) -> Self {
        Self::new(
            config.cleanup_period_secs.saturating_mul(1000),
            config.max_consecutive_failures,
            store,
        )
    }

    pub fn cleanup_period_ms(&self) -> u64 {
        self.cleanup_period_ms
    }

    fn read(&self) -> RwLockReadGuard<'_, ProtectionEntries> {
        self.entries.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, ProtectionEntries> {
        self.entries.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Active up to and including the moment the period elapses
    fn active(&self, since: u64, now: u64) -> bool {
        now.saturating_sub(since) <= self.cleanup_period_ms
    }

    /// Replace in-memory entries with the store's, dropping expired ones
    pub fn load(&self, now: u64) -> Result<usize, PersistenceError> {
        let loaded = self.store.load()?;
        let total = loaded.len();
        let mut entries = self.write();
        *entries = loaded
            .into_iter()
            .filter(|&(_, since)| self.active(since, now))
            .collect();
        log::info!(
            "Loaded {} protected animals ({} expired on load)",
            entries.len(),
            total - entries.len()
        );
        Ok(entries.len())
    }

    /// Whether `id` is protected at `now`; expired entries are evicted
    pub fn is_protected(&self, id: EntityId, now: u64) -> bool {
        match self.read().get(&id) {
            None => return false,
            Some(&since) if self.active(since, now) => return true,
            Some(_) => {}
        }

        let mut entries = self.write();
        if let Some(&since) = entries.get(&id) {
            if self.active(since, now) {
                return true;
            }
            entries.remove(&id);
        }
        false
    }

    /// Protect `id` from `now` on; an active entry is left untouched
    ///
    /// Returns whether a new entry was written.
    pub fn protect(&self, id: EntityId, now: u64) -> bool {
        let mut entries = self.write();
        match entries.get(&id) {
            Some(&since) if self.active(since, now) => false,
            _ => {
                entries.insert(id, now);
                true
            }
        }
    }

    /// Drop the entry of a creature that died or was removed
    pub fn forget(&self, id: EntityId) -> bool {
        self.write().remove(&id).is_some()
    }

    pub fn evict_expired(&self, now: u64) -> usize {
        let mut entries = self.write();
        let before = entries.len();
        entries.retain(|_, since| now.saturating_sub(*since) <= self.cleanup_period_ms);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn is_persistence_disabled(&self) -> bool {
        self.disabled.load(Ordering::Acquire)
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.failures.load(Ordering::Acquire)
    }

    pub fn is_persisting(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Evict expired entries and write the rest to the store
    ///
    /// Overlapping calls are skipped, not queued. After `max_failures`
    /// consecutive failed saves persistence switches itself off.
    pub fn sweep_and_persist(&self, now: u64) -> PersistOutcome {
        if self.is_persistence_disabled() {
            return PersistOutcome::SkippedDisabled;
        }
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            log::debug!("Protection persistence already running, skipping");
            return PersistOutcome::SkippedInFlight;
        }
        let _guard = FlightGuard(&self.in_flight);

        let evicted = self.evict_expired(now);
        let snapshot = self.read().clone();

        match self.store.save(&snapshot) {
            Ok(()) => {
                self.failures.store(0, Ordering::Release);
                log::info!(
                    "Persisted {} protected animals ({} expired)",
                    snapshot.len(),
                    evicted
                );
                PersistOutcome::Saved {
                    entries: snapshot.len(),
                    evicted,
                }
            }
            Err(e) => {
                let consecutive = self.failures.fetch_add(1, Ordering::AcqRel) + 1;
                if consecutive >= self.max_failures {
                    self.disabled.store(true, Ordering::Release);
                    log::error!(
                        "Protection persistence failed {} times in a row, disabling it: {}",
                        consecutive,
                        e
                    );
                } else {
                    log::warn!(
                        "Protection persistence failed ({}/{}): {}",
                        consecutive,
                        self.max_failures,
                        e
                    );
                }
                PersistOutcome::Failed { consecutive }
            }
        }
    }

    /// Run [`Self::sweep_and_persist`] on a worker thread
    ///
    /// Returns `None` when nothing was started.
    pub fn spawn_sweep_and_persist(
        self: &Arc<Self>,
        now: u64,
    ) -> Option<JoinHandle<PersistOutcome>> {
        if self.is_persistence_disabled() || self.is_persisting() {
            return None;
        }
        let registry = Arc::clone(self);
        match std::thread::Builder::new()
            .name("mobcap-protection".to_string())
            .spawn(move || registry.sweep_and_persist(now))
        {
            Ok(handle) => Some(handle),
            Err(e) => {
                log::warn!("Failed to start protection persistence worker: {}", e);
                None
            }
        }
    }
}

impl std::fmt::Debug for ProtectionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProtectionRegistry")
            .field("entries", &self.len())
            .field("cleanup_period_ms", &self.cleanup_period_ms)
            .field("failures", &self.consecutive_failures())
            .field("disabled", &self.is_persistence_disabled())
            .finish()
    }
}
