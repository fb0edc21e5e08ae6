//! Settlement matching.
//!
//! Turns net balances into a short list of transfers that brings every
//! participant back to zero. Debtors and creditors are each sorted by amount,
//! largest first, and paired greedily with two cursors: every step moves the
//! smaller of the two outstanding amounts, which exhausts at least one side.
//! This yields at most `debtors + creditors - 1` transfers.

use serde::Serialize;
use tracing::debug;

use crate::Amount;
use crate::ledger::{Balances, aggregate};
use crate::model::{ParticipantId, Transaction};

/// A recommended transfer: `from` pays `to` the given amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settlement {
    pub from: ParticipantId,
    pub to: ParticipantId,
    pub amount: Amount,
}

/// Outstanding amount of one side of the match.
#[derive(Debug)]
struct Position<'a> {
    participant: &'a str,
    remaining: Amount,
}

/// Produce the transfers that settle the given balances.
///
/// Balances within [`Amount::EPSILON`] of zero are considered settled.
/// Participants with equal amounts are matched in identifier order.
pub fn match_balances(balances: &Balances) -> Vec<Settlement> {
    let (mut debtors, mut creditors) = partition(balances);

    // stable sorts keep identifier order among equal amounts
    debtors.sort_by(|a, b| b.remaining.cmp(&a.remaining));
    creditors.sort_by(|a, b| b.remaining.cmp(&a.remaining));

    let mut settlements = Vec::new();
    let mut d = 0;
    let mut c = 0;

    while d < debtors.len() && c < creditors.len() {
        let debtor = &mut debtors[d];
        let creditor = &mut creditors[c];

        let transfer = debtor.remaining.min(creditor.remaining);
        if transfer > Amount::EPSILON {
            debug!(
                from = debtor.participant,
                to = creditor.participant,
                amount = %transfer,
                "settlement emitted"
            );
            settlements.push(Settlement {
                from: debtor.participant.to_string(),
                to: creditor.participant.to_string(),
                amount: transfer,
            });
        }

        debtor.remaining -= transfer;
        creditor.remaining -= transfer;

        if debtor.remaining < Amount::EPSILON {
            d += 1;
        }
        if creditor.remaining < Amount::EPSILON {
            c += 1;
        }
    }

    settlements
}

/// Aggregate the transactions and match the resulting balances.
pub fn settle<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> Vec<Settlement> {
    match_balances(&aggregate(transactions))
}

/// Split significant balances into debtors and creditors, both holding the
/// absolute amount still to be moved.
fn partition(balances: &Balances) -> (Vec<Position<'_>>, Vec<Position<'_>>) {
    let mut debtors = Vec::new();
    let mut creditors = Vec::new();

    for (participant, balance) in balances.iter() {
        if balance < -Amount::EPSILON {
            debtors.push(Position {
                participant,
                remaining: balance.abs(),
            });
        } else if balance > Amount::EPSILON {
            creditors.push(Position {
                participant,
                remaining: balance,
            });
        }
    }

    (debtors, creditors)
}
