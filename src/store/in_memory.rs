use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::model::{ParticipantId, RawTransaction, TripId};
use crate::store::{StoreError, TransactionStore};

/// Process-local store, for tests and the command-line tool.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    transactions: RwLock<HashMap<TripId, Vec<RawTransaction>>>,
    members: RwLock<HashMap<TripId, Vec<ParticipantId>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionStore for InMemoryStore {
    async fn transactions(&self, trip_id: &str) -> Result<Vec<RawTransaction>, StoreError> {
        Ok(self
            .transactions
            .read()
            .await
            .get(trip_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn append(&self, record: RawTransaction) -> Result<(), StoreError> {
        let trip_id = record.trip_id.clone().ok_or(StoreError::MissingTripId)?;
        self.transactions
            .write()
            .await
            .entry(trip_id)
            .or_default()
            .push(record);
        Ok(())
    }

    async fn members(&self, trip_id: &str) -> Result<Option<Vec<ParticipantId>>, StoreError> {
        Ok(self.members.read().await.get(trip_id).cloned())
    }

    async fn set_members(
        &self,
        trip_id: &str,
        members: Vec<ParticipantId>,
    ) -> Result<(), StoreError> {
        self.members
            .write()
            .await
            .insert(trip_id.to_string(), members);
        Ok(())
    }
}
