use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use crate::Amount;
use crate::model::ParticipantId;

/// Net position of every participant of a ledger.
///
/// Negative amounts are debts, positive amounts are credits. Participants are
/// kept in identifier order so iteration is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Balances(BTreeMap<ParticipantId, Amount>);

impl Balances {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, participant: &str) -> Option<Amount> {
        self.0.get(participant).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Amount)> + '_ {
        self.0.iter().map(|(name, amount)| (name.as_str(), *amount))
    }

    /// Sum of every balance; zero for any ledger built by aggregation.
    ///
    /// `None` if a running sum leaves the `Decimal` range.
    pub fn total(&self) -> Option<Amount> {
        self.0
            .values()
            .try_fold(Amount::ZERO, |acc, amount| acc.checked_add(*amount))
    }

    /// Move `amount` from the payer's balance to the receiver's.
    ///
    /// Either both balances change or, on overflow, neither does.
    pub fn transfer(
        &mut self,
        payer: &str,
        receiver: &str,
        amount: Amount,
    ) -> Result<(), BalanceOverflow> {
        if payer == receiver {
            self.0.entry(payer.to_string()).or_default();
            return Ok(());
        }

        let debited = self
            .get(payer)
            .unwrap_or_default()
            .checked_sub(amount)
            .ok_or_else(|| BalanceOverflow(payer.to_string()))?;
        let credited = self
            .get(receiver)
            .unwrap_or_default()
            .checked_add(amount)
            .ok_or_else(|| BalanceOverflow(receiver.to_string()))?;

        self.0.insert(payer.to_string(), debited);
        self.0.insert(receiver.to_string(), credited);
        Ok(())
    }
}

/// A balance that cannot hold the exact result of a transfer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("balance of {0} cannot hold the exact amount")]
pub struct BalanceOverflow(pub ParticipantId);

impl FromIterator<(ParticipantId, Amount)> for Balances {
    fn from_iter<I: IntoIterator<Item = (ParticipantId, Amount)>>(iter: I) -> Self {
        Balances(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Balances {
    type Item = (&'a ParticipantId, &'a Amount);
    type IntoIter = std::collections::btree_map::Iter<'a, ParticipantId, Amount>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
