//! Storage seam for trip ledgers.
//!
//! The settlement engine itself never touches storage; the
//! [`SettlementService`](crate::service::SettlementService) receives a
//! `TransactionStore` at construction and reads one snapshot per request.

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{ParticipantId, RawTransaction};

pub mod in_memory;
pub use in_memory::InMemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record has no trip id")]
    MissingTripId,

    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Every stored record of the trip, in insertion order.
    async fn transactions(&self, trip_id: &str) -> Result<Vec<RawTransaction>, StoreError>;

    /// Store one record under its `trip_id`.
    async fn append(&self, record: RawTransaction) -> Result<(), StoreError>;

    /// Member names of the trip, or `None` when the trip is unknown.
    async fn members(&self, trip_id: &str) -> Result<Option<Vec<ParticipantId>>, StoreError>;

    async fn set_members(
        &self,
        trip_id: &str,
        members: Vec<ParticipantId>,
    ) -> Result<(), StoreError>;
}
