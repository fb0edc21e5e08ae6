use std::collections::BTreeMap;

use tokio_stream::{Stream, StreamExt};
use tracing::{debug, info};

use super::Ledger;
use crate::model::{RawTransaction, TripId, ValidationError};

/// One [`Ledger`] per trip, fed from a single stream of mixed records.
///
/// Trips never share balances, even when their participants share names.
#[derive(Debug, Default)]
pub struct TripLedgers {
    ledgers: BTreeMap<TripId, Ledger>,
    unassigned: usize,
}

impl TripLedgers {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn run(&mut self, mut stream: impl Stream<Item = RawTransaction> + Unpin) {
        while let Some(raw) = stream.next().await {
            let _ = self.record(raw);
        }
        info!(
            trips = self.ledgers.len(),
            unassigned = self.unassigned,
            "trip ledgers aggregated"
        );
    }

    /// Route a raw record to the ledger of its trip.
    pub fn record(&mut self, raw: RawTransaction) -> Result<(), ValidationError> {
        let Some(trip_id) = raw.trip_id.clone() else {
            debug!("transaction skipped: no trip id");
            self.unassigned += 1;
            return Err(ValidationError::MissingTripId);
        };
        self.ledgers.entry(trip_id).or_default().record(raw)
    }

    pub fn get(&self, trip_id: &str) -> Option<&Ledger> {
        self.ledgers.get(trip_id)
    }

    /// Ledgers in trip id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Ledger)> + '_ {
        self.ledgers
            .iter()
            .map(|(trip_id, ledger)| (trip_id.as_str(), ledger))
    }

    pub fn len(&self) -> usize {
        self.ledgers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ledgers.is_empty()
    }

    /// Records dropped because they named no trip.
    pub fn unassigned(&self) -> usize {
        self.unassigned
    }
}
