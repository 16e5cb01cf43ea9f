use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::{
    error::StoreError,
    model::{Observation, StoredObservation, normalize_location_name},
};

use super::{ObservationStore, prepare};

/// Process-local store; contents are lost on drop.
#[derive(Debug, Default)]
pub struct InMemoryObservationStore {
    rows: RwLock<Vec<StoredObservation>>,
}

impl InMemoryObservationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }
}

impl ObservationStore for InMemoryObservationStore {
    fn append(&self, observation: Observation) -> Result<StoredObservation, StoreError> {
        let observation = prepare(observation)?;

        let mut rows = self.rows.write();
        let stored = StoredObservation {
            id: rows.len() as i64 + 1,
            observation,
            created_on: Utc::now(),
        };
        rows.push(stored.clone());
        Ok(stored)
    }

    fn latest(&self, location_name: &str) -> Result<Option<StoredObservation>, StoreError> {
        let key = normalize_location_name(location_name);
        let rows = self.rows.read();

        Ok(rows
            .iter()
            .filter(|r| r.observation.location_name == key)
            .max_by_key(|r| r.observation.record_timestamp)
            .cloned())
    }

    fn range(
        &self,
        location_name: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<StoredObservation>, StoreError> {
        let key = normalize_location_name(location_name);
        let rows = self.rows.read();

        let mut hits: Vec<StoredObservation> = rows
            .iter()
            .filter(|r| r.observation.location_name == key)
            .filter(|r| (from..=to).contains(&r.observation.record_timestamp))
            .cloned()
            .collect();
        hits.sort_by_key(|r| r.observation.record_timestamp);
        Ok(hits)
    }
}
