//! In-memory backing store for entity state.
//!
//! Holds value-entity state, event journals, and snapshots so entity
//! instances survive passivation within a host process. Durable storage is
//! out of scope; this store is the substrate the dispatch layer and tests
//! run against.

use crate::types::{EntityId, ServiceName};
use dashmap::DashMap;

type StoreKey = (ServiceName, EntityId);

/// In-memory state store keyed by (service, entity id).
#[derive(Debug, Default)]
pub struct StateStore {
    values: DashMap<StoreKey, Vec<u8>>,
    journals: DashMap<StoreKey, Vec<Vec<u8>>>,
    snapshots: DashMap<StoreKey, (u64, Vec<u8>)>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(service: &ServiceName, entity_id: &EntityId) -> StoreKey {
        (service.clone(), entity_id.clone())
    }

    // -- Value state --

    pub fn get_value(&self, service: &ServiceName, entity_id: &EntityId) -> Option<Vec<u8>> {
        self.values
            .get(&Self::key(service, entity_id))
            .map(|v| v.clone())
    }

    pub fn set_value(&self, service: &ServiceName, entity_id: &EntityId, bytes: Vec<u8>) {
        self.values.insert(Self::key(service, entity_id), bytes);
    }

    pub fn delete_value(&self, service: &ServiceName, entity_id: &EntityId) {
        self.values.remove(&Self::key(service, entity_id));
    }

    // -- Event journal --

    /// Append events to the journal. Returns the sequence number of the last
    /// appended event (1-based).
    pub fn append_events(
        &self,
        service: &ServiceName,
        entity_id: &EntityId,
        events: Vec<Vec<u8>>,
    ) -> u64 {
        let mut journal = self
            .journals
            .entry(Self::key(service, entity_id))
            .or_default();
        journal.extend(events);
        journal.len() as u64
    }

    /// Events with sequence numbers strictly greater than `after`.
    pub fn events_after(
        &self,
        service: &ServiceName,
        entity_id: &EntityId,
        after: u64,
    ) -> Vec<Vec<u8>> {
        self.journals
            .get(&Self::key(service, entity_id))
            .map(|journal| journal.iter().skip(after as usize).cloned().collect())
            .unwrap_or_default()
    }

    pub fn event_count(&self, service: &ServiceName, entity_id: &EntityId) -> u64 {
        self.journals
            .get(&Self::key(service, entity_id))
            .map(|journal| journal.len() as u64)
            .unwrap_or(0)
    }

    // -- Snapshots --

    /// Record a snapshot of the state as of the given sequence number.
    pub fn save_snapshot(
        &self,
        service: &ServiceName,
        entity_id: &EntityId,
        sequence: u64,
        bytes: Vec<u8>,
    ) {
        self.snapshots
            .insert(Self::key(service, entity_id), (sequence, bytes));
    }

    pub fn load_snapshot(
        &self,
        service: &ServiceName,
        entity_id: &EntityId,
    ) -> Option<(u64, Vec<u8>)> {
        self.snapshots
            .get(&Self::key(service, entity_id))
            .map(|s| s.clone())
    }
}
