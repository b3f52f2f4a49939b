//! Property-based tests for availability arithmetic.
//!
//! - Availability identity over arbitrary ledger histories
//! - Reserved total ignores CONSUMPTION and REVERSAL rows
//! - Reserve then release restores availability exactly

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::calculator::AvailabilityCalculator;
use super::sources::{EnvelopeBook, PostedActuals};
use crate::dimension::{BudgetScope, DimensionKey};
use crate::ledger::{DocumentRef, EntryDraft, EntryType, LedgerStore, MemoryLedger};

fn amount() -> impl Strategy<Value = Decimal> {
    (0i64..50_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn entry_type() -> impl Strategy<Value = EntryType> {
    prop_oneof![
        Just(EntryType::Reservation),
        Just(EntryType::Release),
        Just(EntryType::Consumption),
        Just(EntryType::Reversal),
        Just(EntryType::Supplement),
    ]
}

fn key() -> DimensionKey {
    DimensionKey::new("ACME", "FY2026", "CC-OPS", "6100")
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, 1).unwrap()
}

fn draft(entry_type: EntryType, amount: Decimal) -> EntryDraft {
    EntryDraft::new(key(), entry_type, amount, DocumentRef::new("Expense Claim", "EXP-P"), date())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// available == allocated - actual - reserved for any history.
    #[test]
    fn prop_availability_identity(
        envelope in amount(),
        posted in amount(),
        history in prop::collection::vec((entry_type(), amount()), 0..30),
    ) {
        let ledger = MemoryLedger::default();
        let envelopes = EnvelopeBook::new();
        envelopes.set(key(), envelope);
        let actuals = PostedActuals::new();
        actuals.post(key(), posted);
        for (entry_type, amount) in history {
            ledger.append(vec![draft(entry_type, amount)]).unwrap();
        }

        let calc = AvailabilityCalculator::new(&ledger, &envelopes, &actuals);
        let scope = BudgetScope::of(&key(), true);

        prop_assert_eq!(
            calc.available(&scope),
            calc.allocated(&scope) - calc.actual(&scope) - calc.reserved(&scope)
        );
    }

    /// Reserved equals RESERVATION minus RELEASE no matter what else is posted.
    #[test]
    fn prop_reserved_reads_only_reservation_and_release(
        history in prop::collection::vec((entry_type(), amount()), 0..30),
    ) {
        let ledger = MemoryLedger::default();
        let mut expected = Decimal::ZERO;
        for (entry_type, amount) in history {
            match entry_type {
                EntryType::Reservation => expected += amount,
                EntryType::Release => expected -= amount,
                _ => {}
            }
            ledger.append(vec![draft(entry_type, amount)]).unwrap();
        }

        prop_assert_eq!(ledger.reserved_total(&BudgetScope::of(&key(), true)), expected);
    }

    /// Reserving then releasing the same amount restores availability.
    #[test]
    fn prop_reserve_release_round_trip(
        envelope in amount(),
        prior in prop::collection::vec((entry_type(), amount()), 0..10),
        held in amount(),
    ) {
        let ledger = MemoryLedger::default();
        let envelopes = EnvelopeBook::new();
        envelopes.set(key(), envelope);
        let actuals = PostedActuals::new();
        for (entry_type, amount) in prior {
            ledger.append(vec![draft(entry_type, amount)]).unwrap();
        }
        let calc = AvailabilityCalculator::new(&ledger, &envelopes, &actuals);
        let scope = BudgetScope::of(&key(), true);
        let before = calc.available(&scope);

        ledger.append(vec![draft(EntryType::Reservation, held)]).unwrap();
        prop_assert_eq!(calc.available(&scope), before - held);
        ledger.append(vec![draft(EntryType::Release, held)]).unwrap();

        prop_assert_eq!(calc.available(&scope), before);
    }
}
