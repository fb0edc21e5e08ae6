//! Core domain types for the settlement engine.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Amount;

/// Participant identifier (the member's name within a trip).
pub type ParticipantId = String;

/// Trip identifier.
pub type TripId = String;

/// Kind of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    /// A payment advanced by the payer on behalf of the receiver.
    Paid,
    /// Historical record of a settlement transfer; never aggregated.
    Settle,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Paid => "Paid",
            TransactionKind::Settle => "Settle",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Paid" => Ok(TransactionKind::Paid),
            "Settle" => Ok(TransactionKind::Settle),
            other => Err(ValidationError::UnknownKind(other.to_string())),
        }
    }
}

/// A ledger record as the store holds it: any field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTransaction {
    pub trip_id: Option<TripId>,
    pub payer: Option<ParticipantId>,
    pub receiver: Option<ParticipantId>,
    /// Amount as entered, parsed only on validation.
    pub amount: Option<String>,
    pub kind: Option<String>,
    pub deleted: Option<bool>,
    pub description: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Reason a raw record cannot become a [`Transaction`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Only reported when records are grouped by trip.
    #[error("missing trip id")]
    MissingTripId,
    #[error("missing payer")]
    MissingPayer,
    #[error("missing receiver")]
    MissingReceiver,
    #[error("missing amount")]
    MissingAmount,
    #[error("missing transaction type")]
    MissingKind,
    #[error("amount '{value}' is not a decimal number")]
    InvalidAmount { value: String },
    #[error("unrecognized transaction type '{0}'")]
    UnknownKind(String),
}

/// A validated, immutable ledger entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub payer: ParticipantId,
    pub receiver: ParticipantId,
    pub amount: Amount,
    pub kind: TransactionKind,
    pub deleted: bool,
}

impl Transaction {
    /// A live `Paid` entry.
    pub fn paid(payer: impl Into<String>, receiver: impl Into<String>, amount: Amount) -> Self {
        Self {
            payer: payer.into(),
            receiver: receiver.into(),
            amount,
            kind: TransactionKind::Paid,
            deleted: false,
        }
    }

    /// A live `Settle` entry.
    pub fn settle(payer: impl Into<String>, receiver: impl Into<String>, amount: Amount) -> Self {
        Self {
            kind: TransactionKind::Settle,
            ..Self::paid(payer, receiver, amount)
        }
    }

    pub fn mark_deleted(mut self) -> Self {
        self.deleted = true;
        self
    }

    /// Whether this entry takes part in balance computation.
    pub fn affects_balances(&self) -> bool {
        self.kind == TransactionKind::Paid && !self.deleted
    }
}

impl TryFrom<RawTransaction> for Transaction {
    type Error = ValidationError;

    fn try_from(raw: RawTransaction) -> Result<Self, Self::Error> {
        let payer = raw.payer.ok_or(ValidationError::MissingPayer)?;
        let receiver = raw.receiver.ok_or(ValidationError::MissingReceiver)?;
        let text = raw.amount.ok_or(ValidationError::MissingAmount)?;
        let kind = raw
            .kind
            .ok_or(ValidationError::MissingKind)?
            .parse::<TransactionKind>()?;
        let amount = text
            .parse::<Amount>()
            .map_err(|_| ValidationError::InvalidAmount { value: text })?;

        Ok(Transaction {
            payer,
            receiver,
            amount,
            kind,
            deleted: raw.deleted.unwrap_or(false),
        })
    }
}

impl From<&Transaction> for RawTransaction {
    fn from(tx: &Transaction) -> Self {
        RawTransaction {
            payer: Some(tx.payer.clone()),
            receiver: Some(tx.receiver.clone()),
            amount: Some(tx.amount.to_string()),
            kind: Some(tx.kind.to_string()),
            deleted: Some(tx.deleted),
            ..RawTransaction::default()
        }
    }
}
