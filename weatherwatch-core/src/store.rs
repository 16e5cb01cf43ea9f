//! Append-only observation persistence.
//!
//! Every backend validates on [`ObservationStore::append`] and normalizes
//! location keys the same way on writes and reads. [`ObservationStore::range`]
//! returns records in ascending `record_timestamp` order; the relative order
//! of records sharing a timestamp is unspecified, and so is which of them
//! [`ObservationStore::latest`] returns.

use chrono::{DateTime, Utc};

use crate::{
    error::StoreError,
    model::{Observation, StoredObservation},
};

pub mod memory;
pub mod sqlite;

pub use memory::InMemoryObservationStore;
pub use sqlite::SqliteObservationStore;

pub trait ObservationStore: Send + Sync {
    /// Validate, normalize and persist one observation. Nothing is written
    /// when validation fails.
    fn append(&self, observation: Observation) -> Result<StoredObservation, StoreError>;

    /// Most recent record by `record_timestamp`, if the location has any.
    fn latest(&self, location_name: &str) -> Result<Option<StoredObservation>, StoreError>;

    /// Records with `from <= record_timestamp <= to`, oldest first.
    fn range(
        &self,
        location_name: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<StoredObservation>, StoreError>;
}

/// Shared write-boundary step: lowercase the key, then validate.
pub(crate) fn prepare(mut observation: Observation) -> Result<Observation, StoreError> {
    observation.location_name = crate::model::normalize_location_name(&observation.location_name);
    observation.validate()?;
    Ok(observation)
}

/// Behaviour every backend must share; run against each implementation.
#[cfg(test)]
pub(crate) mod contract {
    use super::*;
    use crate::model::fixtures;
    use chrono::{Duration, TimeZone};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 7, hour, 0, 0).unwrap()
    }

    fn obs(name: &str, hour: u32, temperature_c: f64) -> Observation {
        let mut obs = fixtures::warangal();
        obs.location_name = name.into();
        obs.record_timestamp = at(hour);
        obs.temperature_c = temperature_c;
        obs
    }

    pub fn append_normalizes_and_stamps(store: &dyn ObservationStore) {
        let before = Utc::now();
        let stored = store.append(obs("WaRangal", 10, 29.1)).unwrap();

        assert_eq!(stored.observation.location_name, "warangal");
        assert!(stored.created_on >= before - Duration::seconds(1));
        assert_ne!(stored.created_on, stored.observation.record_timestamp);
    }

    pub fn append_rejects_without_writing(store: &dyn ObservationStore) {
        let mut bad = obs("warangal", 10, 29.1);
        bad.humidity_pct = 150.0;

        match store.append(bad) {
            Err(StoreError::Validation(err)) => assert!(err.has_field("humidity_pct")),
            other => panic!("expected validation error, got {other:?}"),
        }
        assert!(store.latest("warangal").unwrap().is_none());
    }

    pub fn latest_picks_newest_record_timestamp(store: &dyn ObservationStore) {
        store.append(obs("warangal", 12, 30.0)).unwrap();
        store.append(obs("warangal", 9, 25.0)).unwrap();
        store.append(obs("hyderabad", 15, 31.0)).unwrap();

        let latest = store.latest("Warangal").unwrap().unwrap();
        assert_eq!(latest.observation.record_timestamp, at(12));
        assert_eq!(latest.observation.temperature_c, 30.0);

        assert!(store.latest("nowhere").unwrap().is_none());
    }

    pub fn range_is_inclusive_and_ascending(store: &dyn ObservationStore) {
        for hour in [14, 8, 10, 12, 6] {
            store.append(obs("warangal", hour, hour as f64)).unwrap();
        }
        store.append(obs("hyderabad", 10, 99.0)).unwrap();

        let hits = store.range("WARANGAL", at(8), at(12)).unwrap();
        let hours: Vec<f64> = hits.iter().map(|s| s.observation.temperature_c).collect();
        assert_eq!(hours, vec![8.0, 10.0, 12.0]);

        assert!(store.range("warangal", at(15), at(20)).unwrap().is_empty());
        assert!(store.range("nowhere", at(0), at(23)).unwrap().is_empty());
    }

    pub fn ids_are_distinct(store: &dyn ObservationStore) {
        let a = store.append(obs("warangal", 10, 20.0)).unwrap();
        let b = store.append(obs("warangal", 10, 20.0)).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(store.range("warangal", at(10), at(10)).unwrap().len(), 2);
    }

    pub fn sub_millisecond_lower_bound(store: &dyn ObservationStore) {
        store.append(obs("warangal", 12, 20.0)).unwrap();

        let just_after = at(12) + Duration::microseconds(400);
        assert!(store.range("warangal", just_after, at(13)).unwrap().is_empty());
        assert_eq!(store.range("warangal", at(12), at(13)).unwrap().len(), 1);
        assert_eq!(store.range("warangal", at(11), just_after).unwrap().len(), 1);
    }
}
