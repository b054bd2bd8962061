//! Session-wide timer registry keyed by widget identity

use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex},
};

use tracing::debug;

use super::TimerRecord;

/// Stable identity of a timer widget, derived from its configuration.
///
/// Two widget instances that derive the same key share one record and
/// therefore one countdown. That is intended behavior, not a collision.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TimerKey(String);

impl TimerKey {
    /// Identity for a widget with an explicit configured id
    pub fn explicit(id: &str) -> Self {
        Self(format!("timer-{}", id))
    }

    /// Default identity derived from title and configured duration
    pub fn derived(title: Option<&str>, duration_seconds: u64) -> Self {
        Self(format!(
            "timer-{}-{}",
            title.unwrap_or("default"),
            duration_seconds
        ))
    }
}

impl fmt::Display for TimerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Keyed store owning every timer record for the session.
///
/// Records are created lazily and never evicted; remounted widgets with
/// an unchanged identity reattach to their record mid-countdown.
#[derive(Debug)]
pub struct TimerRegistry {
    records: Mutex<HashMap<TimerKey, Arc<Mutex<TimerRecord>>>>,
}

impl TimerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
        }
    }

    /// Look up the record for `key`, creating a fresh Idle record with
    /// `default_duration_seconds` on first reference.
    ///
    /// Repeated calls with the same key return the same shared record.
    pub fn get_or_create(
        &self,
        key: &TimerKey,
        default_duration_seconds: u64,
    ) -> Result<Arc<Mutex<TimerRecord>>, String> {
        let mut records = self
            .records
            .lock()
            .map_err(|e| format!("Failed to lock timer registry: {}", e))?;

        let record = records.entry(key.clone()).or_insert_with(|| {
            debug!("Creating timer record for {}", key);
            Arc::new(Mutex::new(TimerRecord::new(default_duration_seconds)))
        });

        Ok(Arc::clone(record))
    }

    /// Update the configured duration of a live record without touching
    /// its start anchor; a running timer recalculates against the new
    /// target on its next tick. Creates the record if absent.
    pub fn set_duration(&self, key: &TimerKey, duration_seconds: u64) -> Result<(), String> {
        let record = self.get_or_create(key, duration_seconds)?;
        let mut record = record
            .lock()
            .map_err(|e| format!("Failed to lock timer record: {}", e))?;

        record.duration_seconds = duration_seconds;
        Ok(())
    }

    /// Number of records currently held
    pub fn len(&self) -> Result<usize, String> {
        let records = self
            .records
            .lock()
            .map_err(|e| format!("Failed to lock timer registry: {}", e))?;
        Ok(records.len())
    }

    /// Check whether the registry holds no records
    pub fn is_empty(&self) -> Result<bool, String> {
        Ok(self.len()? == 0)
    }
}

impl Default for TimerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::TimerPhase;
    use tokio::time::Instant;

    #[test]
    fn get_or_create_is_idempotent() {
        let registry = TimerRegistry::new();
        let key = TimerKey::derived(Some("Tea"), 180);

        let first = registry.get_or_create(&key, 180).unwrap();
        let second = registry.get_or_create(&key, 180).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len().unwrap(), 1);
    }

    #[test]
    fn fresh_records_start_idle_with_the_default_duration() {
        let registry = TimerRegistry::new();
        let key = TimerKey::derived(None, 60);

        let record = registry.get_or_create(&key, 60).unwrap();
        let record = record.lock().unwrap();
        assert_eq!(record.phase, TimerPhase::Idle);
        assert_eq!(record.duration_seconds, 60);
        assert!(record.started_at.is_none());
    }

    #[test]
    fn set_duration_preserves_the_start_anchor() {
        let registry = TimerRegistry::new();
        let key = TimerKey::explicit("kitchen");
        let start = Instant::now();

        let record = registry.get_or_create(&key, 120).unwrap();
        record.lock().unwrap().begin(start);

        registry.set_duration(&key, 300).unwrap();

        let record = record.lock().unwrap();
        assert_eq!(record.duration_seconds, 300);
        assert_eq!(record.started_at, Some(start));
        assert_eq!(record.phase, TimerPhase::Running);
    }

    #[test]
    fn distinct_identities_get_distinct_records() {
        let registry = TimerRegistry::new();
        let a = registry
            .get_or_create(&TimerKey::derived(Some("Tea"), 180), 180)
            .unwrap();
        let b = registry
            .get_or_create(&TimerKey::derived(Some("Eggs"), 180), 180)
            .unwrap();

        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len().unwrap(), 2);
    }

    #[test]
    fn key_derivation_matches_the_documented_scheme() {
        assert_eq!(
            TimerKey::derived(Some("Tea"), 180).to_string(),
            "timer-Tea-180"
        );
        assert_eq!(TimerKey::derived(None, 60).to_string(), "timer-default-60");
        assert_eq!(TimerKey::explicit("kitchen").to_string(), "timer-kitchen");
    }
}
