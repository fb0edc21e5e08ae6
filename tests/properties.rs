use std::collections::BTreeMap;

use proptest::prelude::*;
use rust_decimal::Decimal;
use trip_settle::{Amount, Balances, Transaction, aggregate, match_balances, settle};

const PEOPLE: &[&str] = &["ana", "ben", "cho", "dev", "eli", "fay"];

fn participant() -> impl Strategy<Value = String> {
    prop::sample::select(PEOPLE).prop_map(str::to_string)
}

fn paid() -> impl Strategy<Value = Transaction> {
    (participant(), participant(), 1i64..1_000_000)
        .prop_map(|(payer, receiver, cents)| Transaction::paid(payer, receiver, Amount::from_cents(cents)))
}

/// Payments in whole currency units, so no balance ever lands near zero.
fn paid_whole() -> impl Strategy<Value = Transaction> {
    (participant(), participant(), 1i64..10_000).prop_map(|(payer, receiver, units)| {
        Transaction::paid(payer, receiver, Amount::from_cents(units * 100))
    })
}

/// Whole-unit payments between two people, reaching close to `Decimal::MAX`.
fn huge_paid() -> impl Strategy<Value = Transaction> {
    (any::<bool>(), 1i128..10i128.pow(28)).prop_map(|(forward, units)| {
        let (payer, receiver) = if forward { ("ana", "ben") } else { ("ben", "ana") };
        Transaction::paid(payer, receiver, Amount::new(Decimal::from_i128_with_scale(units, 0)))
    })
}

fn any_transaction() -> impl Strategy<Value = Transaction> {
    (paid(), any::<bool>(), any::<bool>()).prop_map(|(tx, is_settle, deleted)| {
        let tx = if is_settle {
            Transaction::settle(tx.payer, tx.receiver, tx.amount)
        } else {
            tx
        };
        if deleted { tx.mark_deleted() } else { tx }
    })
}

fn sent_and_received(balances: &Balances) -> (BTreeMap<String, Amount>, BTreeMap<String, Amount>) {
    let mut sent = BTreeMap::new();
    let mut received = BTreeMap::new();
    for s in match_balances(balances) {
        *sent.entry(s.from).or_insert(Amount::ZERO) += s.amount;
        *received.entry(s.to).or_insert(Amount::ZERO) += s.amount;
    }
    (sent, received)
}

proptest! {
    #[test]
    fn balances_sum_to_zero(txs in prop::collection::vec(any_transaction(), 0..50)) {
        prop_assert_eq!(aggregate(&txs).total(), Some(Amount::ZERO));
    }

    #[test]
    fn order_does_not_change_balances(
        txs in prop::collection::vec(any_transaction(), 0..30).prop_shuffle(),
    ) {
        let mut reversed = txs.clone();
        reversed.reverse();
        prop_assert_eq!(aggregate(&txs), aggregate(&reversed));
    }

    #[test]
    fn excluded_entries_never_move_balances(
        live in prop::collection::vec(paid(), 0..20),
        noise in prop::collection::vec(paid(), 0..20),
    ) {
        let mut all = live.clone();
        for (i, tx) in noise.into_iter().enumerate() {
            all.push(if i % 2 == 0 {
                tx.mark_deleted()
            } else {
                Transaction::settle(tx.payer, tx.receiver, tx.amount)
            });
        }
        prop_assert_eq!(aggregate(&all), aggregate(&live));
    }

    #[test]
    fn settlements_conserve_every_balance(txs in prop::collection::vec(paid_whole(), 0..40)) {
        let balances = aggregate(&txs);
        let (sent, received) = sent_and_received(&balances);

        for (name, balance) in balances.iter() {
            let moved = if balance < Amount::ZERO {
                sent.get(name).copied().unwrap_or_default()
            } else {
                received.get(name).copied().unwrap_or_default()
            };
            prop_assert_eq!(moved, balance.abs());
        }
    }

    #[test]
    fn settlements_are_significant_and_never_to_self(
        txs in prop::collection::vec(paid(), 0..40),
    ) {
        for s in settle(&txs) {
            prop_assert!(s.amount > Amount::EPSILON);
            prop_assert_ne!(s.from, s.to);
        }
    }

    #[test]
    fn huge_amounts_stay_exact(txs in prop::collection::vec(huge_paid(), 0..20)) {
        let balances = aggregate(&txs);
        prop_assert_eq!(balances.total(), Some(Amount::ZERO));

        let settlements = match_balances(&balances);
        match balances.get("ana") {
            Some(ana) if !ana.is_negligible() => {
                prop_assert_eq!(settlements.len(), 1);
                prop_assert_eq!(settlements[0].amount, ana.abs());
            }
            _ => prop_assert!(settlements.is_empty()),
        }
    }

    #[test]
    fn settlement_count_is_bounded(txs in prop::collection::vec(paid(), 0..40)) {
        let balances = aggregate(&txs);
        let debtors = balances.iter().filter(|(_, b)| *b < -Amount::EPSILON).count();
        let creditors = balances.iter().filter(|(_, b)| *b > Amount::EPSILON).count();

        let settlements = match_balances(&balances);
        prop_assert!(settlements.len() <= (debtors + creditors).saturating_sub(1));
    }
}

#[test]
fn empty_input() {
    assert!(aggregate(&[] as &[Transaction]).is_empty());
    assert!(match_balances(&Balances::new()).is_empty());
}
