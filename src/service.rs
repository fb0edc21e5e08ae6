//! Trip-level settlement service.
//!
//! Glues a [`TransactionStore`] to the ledger and the matcher: balances and
//! settlements are computed fresh from the stored history on every call and
//! are never written back.

use chrono::Utc;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::Amount;
use crate::ledger::{Balances, aggregate_raw};
use crate::model::{ParticipantId, RawTransaction, TransactionKind};
use crate::settlement::{Settlement, match_balances};
use crate::store::{StoreError, TransactionStore};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("amount '{0}' is not a decimal number")]
    InvalidAmount(String),

    #[error("trip {0} not found")]
    TripNotFound(String),

    #[error("{name} is not a member of trip {trip_id}")]
    NotAMember { trip_id: String, name: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A payment or settlement as submitted by a client; fields are checked on
/// recording.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewPayment {
    pub trip_id: Option<String>,
    pub payer: Option<String>,
    pub receiver: Option<String>,
    pub amount: Option<String>,
    pub description: Option<String>,
}

pub struct SettlementService<S> {
    store: S,
}

impl<S: TransactionStore> SettlementService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Set the member list that recorded payments are checked against.
    ///
    /// Registering a list makes the trip known. Payer and receiver must both
    /// appear in it, so an empty list rejects every payment with
    /// [`ServiceError::NotAMember`]. A trip that was never registered is
    /// [`ServiceError::TripNotFound`].
    pub async fn register_members(
        &self,
        trip_id: &str,
        members: Vec<ParticipantId>,
    ) -> Result<(), ServiceError> {
        info!(trip_id, members = members.len(), "registering trip members");
        self.store.set_members(trip_id, members).await?;
        Ok(())
    }

    /// Full stored history of the trip, malformed and deleted records included.
    pub async fn transactions(&self, trip_id: &str) -> Result<Vec<RawTransaction>, ServiceError> {
        Ok(self.store.transactions(trip_id).await?)
    }

    pub async fn balances(&self, trip_id: &str) -> Result<Balances, ServiceError> {
        let records = self.store.transactions(trip_id).await?;
        debug!(trip_id, records = records.len(), "aggregating trip ledger");
        Ok(aggregate_raw(records))
    }

    pub async fn settlements(&self, trip_id: &str) -> Result<Vec<Settlement>, ServiceError> {
        let balances = self.balances(trip_id).await?;
        let settlements = match_balances(&balances);
        info!(
            trip_id,
            participants = balances.len(),
            settlements = settlements.len(),
            "settlements computed"
        );
        Ok(settlements)
    }

    /// Record a `Paid` entry. Payments must carry a description.
    pub async fn record_payment(&self, payment: NewPayment) -> Result<RawTransaction, ServiceError> {
        self.record(payment, TransactionKind::Paid).await
    }

    /// Record a `Settle` entry: a transfer made to pay back debts. It is kept
    /// as history and does not change balances.
    pub async fn record_settlement(
        &self,
        payment: NewPayment,
    ) -> Result<RawTransaction, ServiceError> {
        self.record(payment, TransactionKind::Settle).await
    }
}

/// Private API
impl<S: TransactionStore> SettlementService<S> {
    async fn record(
        &self,
        payment: NewPayment,
        kind: TransactionKind,
    ) -> Result<RawTransaction, ServiceError> {
        let trip_id = required(payment.trip_id, "trip_id")?;
        let payer = required(payment.payer, "payer")?;
        let receiver = required(payment.receiver, "receiver")?;
        let amount = required(payment.amount, "amount")?;

        if amount.parse::<Amount>().is_err() {
            warn!(%trip_id, %amount, "{kind} rejected: invalid amount");
            return Err(ServiceError::InvalidAmount(amount));
        }

        let members = self
            .store
            .members(&trip_id)
            .await?
            .ok_or_else(|| ServiceError::TripNotFound(trip_id.clone()))?;

        for name in [&payer, &receiver] {
            if !members.contains(name) {
                warn!(%trip_id, %name, "{kind} rejected: not a trip member");
                return Err(ServiceError::NotAMember {
                    trip_id,
                    name: name.clone(),
                });
            }
        }

        if kind == TransactionKind::Paid && payment.description.is_none() {
            warn!(%trip_id, "{kind} rejected: missing description");
            return Err(ServiceError::MissingField("description"));
        }

        let record = RawTransaction {
            trip_id: Some(trip_id),
            payer: Some(payer),
            receiver: Some(receiver),
            amount: Some(amount),
            kind: Some(kind.to_string()),
            deleted: Some(false),
            description: payment.description,
            created_at: Some(Utc::now()),
        };
        self.store.append(record.clone()).await?;

        info!(
            trip_id = record.trip_id.as_deref(),
            payer = record.payer.as_deref(),
            receiver = record.receiver.as_deref(),
            amount = record.amount.as_deref(),
            "{kind} recorded"
        );
        Ok(record)
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ServiceError> {
    value.ok_or(ServiceError::MissingField(field))
}
