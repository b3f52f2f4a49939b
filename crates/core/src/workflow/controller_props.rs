//! Property-based tests for controller lifecycle round trips.
//!
//! - Repeated reservation events post exactly one reservation set
//! - Reserve then reject restores availability exactly
//! - Consume, cancel and restore yields the original net reservation

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::fixtures::{Fixture, employee, expense, invoice, manager};
use super::types::{DocumentState, LockStatus};
use crate::allocation::AmountLine;
use crate::ledger::{EntryType, LedgerQuery, LedgerStore};

/// Amounts from 0.01 to 10,000.00.
fn amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// One to four line amounts.
fn line_amounts() -> impl Strategy<Value = Vec<Decimal>> {
    prop::collection::vec(amount(), 1..4)
}

fn with_lines(name: &str, amounts: &[Decimal]) -> super::types::SourceDocument {
    let mut doc = expense(name, Decimal::ZERO);
    doc.lines = amounts
        .iter()
        .enumerate()
        .map(|(i, amount)| AmountLine::new(format!("61{i:02}"), *amount))
        .collect();
    doc
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Firing the lock event repeatedly reserves once.
    #[test]
    fn prop_reservation_is_idempotent(amounts in line_amounts(), repeats in 2usize..5) {
        let fixture = Fixture::new(Decimal::ZERO);
        let controller = fixture.controller();
        let doc = with_lines("EXP-P", &amounts);

        for _ in 0..repeats {
            controller.on_reach_target_state(&doc, &manager()).unwrap();
        }

        let reservations = fixture.ledger.query(
            &LedgerQuery::new()
                .for_source(doc.doc_ref.clone())
                .of_types(&[EntryType::Reservation]),
        );
        prop_assert_eq!(reservations.len(), amounts.len());
        prop_assert_eq!(
            reservations.iter().map(|e| e.amount()).sum::<Decimal>(),
            amounts.iter().copied().sum::<Decimal>()
        );
    }

    /// Reserve then reject returns availability to where it started.
    #[test]
    fn prop_reserve_reject_round_trip(envelope in amount(), held in amount()) {
        let fixture = Fixture::new(envelope);
        let controller = fixture.controller();
        let before = controller.get_availability(&fixture.key()).unwrap().available;
        let doc = expense("EXP-P", held);

        controller.on_reach_target_state(&doc, &manager()).unwrap();
        controller.on_rejected_or_reopened(&doc, &manager()).unwrap();

        prop_assert_eq!(controller.get_availability(&fixture.key()).unwrap().available, before);
        prop_assert_eq!(controller.document_summary(&doc.doc_ref).state, DocumentState::Unlocked);
    }

    /// Consuming then cancelling restores the original net reservation.
    #[test]
    fn prop_consume_cancel_restores_reservation(held in amount(), invoiced in amount()) {
        let fixture = Fixture::new(Decimal::new(100_000_000, 2));
        let controller = fixture.controller();
        let doc = expense("EXP-P", held);
        let inv = invoice("PINV-P", invoiced);

        controller.on_reach_target_state(&doc, &employee()).unwrap();
        let reserved_before = controller.get_availability(&fixture.key()).unwrap().reserved;
        controller.on_secondary_submitted(&doc, &inv, &employee()).unwrap();
        let outcome = controller.on_secondary_cancelled(&doc, &inv, &employee()).unwrap();

        let after = controller.get_availability(&fixture.key()).unwrap();
        prop_assert_eq!(outcome.status(), Some(LockStatus::Locked));
        prop_assert_eq!(after.reserved, reserved_before);
        prop_assert_eq!(after.actual, Decimal::ZERO);
        prop_assert_eq!(fixture.ledger.reserved_total(&after.scope), held);
    }
}
