//! Ledger aggregation.
//!
//! The ledger folds a trip's transactions into one net balance per
//! participant. Only live `Paid` entries move balances: the payer's balance
//! decreases by the amount and the receiver's increases by the same amount,
//! so balances always sum to zero.
//!
//! [`Ledger::run`] folds an async stream of raw records the same way
//! [`aggregate_raw`] folds an iterator.

use tokio_stream::{Stream, StreamExt};
use tracing::{debug, info};

use crate::model::{RawTransaction, Transaction, ValidationError};

mod balances;
mod trips;
pub use balances::{BalanceOverflow, Balances};
pub use trips::TripLedgers;

/// Counters describing what a ledger did with the records it was given.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerStats {
    /// Live `Paid` entries that moved balances.
    pub applied: usize,
    /// Valid entries left out by kind or soft-delete.
    pub excluded: usize,
    /// Malformed records, and payments whose exact amount a balance
    /// could not hold.
    pub skipped: usize,
}

/// Balance aggregator over a single trip's transactions.
#[derive(Debug, Default)]
pub struct Ledger {
    balances: Balances,
    stats: LedgerStats,
}

/// Public API
impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the ledger over the given stream of raw records
    pub async fn run(&mut self, mut stream: impl Stream<Item = RawTransaction> + Unpin) {
        while let Some(raw) = stream.next().await {
            // malformed records never stop aggregation
            let _ = self.record(raw);
        }
        info!(
            applied = self.stats.applied,
            excluded = self.stats.excluded,
            skipped = self.stats.skipped,
            participants = self.balances.len(),
            "ledger aggregated"
        );
    }

    /// Validate a raw record and apply it.
    ///
    /// A record that fails validation leaves the balances untouched; the
    /// error is returned for the caller's information only.
    pub fn record(&mut self, raw: RawTransaction) -> Result<(), ValidationError> {
        match Transaction::try_from(raw) {
            Ok(tx) => {
                self.apply(&tx);
                Ok(())
            }
            Err(e) => {
                debug!(reason = %e, "transaction skipped");
                self.stats.skipped += 1;
                Err(e)
            }
        }
    }

    /// Apply a validated transaction; returns whether balances changed.
    pub fn apply(&mut self, tx: &Transaction) -> bool {
        if !tx.affects_balances() {
            debug!(
                payer = %tx.payer,
                receiver = %tx.receiver,
                kind = %tx.kind,
                deleted = tx.deleted,
                "transaction excluded"
            );
            self.stats.excluded += 1;
            return false;
        }

        if let Err(e) = self.balances.transfer(&tx.payer, &tx.receiver, tx.amount) {
            debug!(
                payer = %tx.payer,
                receiver = %tx.receiver,
                amount = %tx.amount,
                reason = %e,
                "transaction skipped"
            );
            self.stats.skipped += 1;
            return false;
        }
        self.stats.applied += 1;

        debug!(
            payer = %tx.payer,
            receiver = %tx.receiver,
            amount = %tx.amount,
            "payment applied"
        );
        true
    }

    /// Return the current balances.
    pub fn balances(&self) -> &Balances {
        &self.balances
    }

    pub fn into_balances(self) -> Balances {
        self.balances
    }

    pub fn stats(&self) -> LedgerStats {
        self.stats
    }
}

/// Aggregate validated transactions into net balances.
pub fn aggregate<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> Balances {
    let mut ledger = Ledger::new();
    for tx in transactions {
        ledger.apply(tx);
    }
    ledger.into_balances()
}

/// Aggregate raw records, silently skipping those that fail validation.
pub fn aggregate_raw(records: impl IntoIterator<Item = RawTransaction>) -> Balances {
    let mut ledger = Ledger::new();
    for raw in records {
        let _ = ledger.record(raw);
    }
    ledger.into_balances()
}
