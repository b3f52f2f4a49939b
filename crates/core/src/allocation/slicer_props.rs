//! Property-based tests for the allocation slicer.
//!
//! - Slice sum equals the rounded document total exactly
//! - Every slice is non-negative and rounded to currency precision

use std::collections::HashMap;

use chrono::NaiveDate;
use ledgerlock_shared::EnforceScope;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::slicer::AllocationSlicer;
use super::types::{AllocationDocument, AllocationLine, AllocationStatus, AmountLine};
use crate::dimension::{DimensionResolver, DimensionSource};
use crate::fiscal::FiscalCalendar;

/// Line amounts from 0.01 to 100,000.00.
fn line_amounts() -> impl Strategy<Value = Vec<Decimal>> {
    prop::collection::vec(
        (1i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2)),
        1..6,
    )
}

/// Positive integer target weights.
fn target_weights() -> impl Strategy<Value = Vec<u32>> {
    prop::collection::vec(1u32..1000, 1..8)
}

fn directory(targets: usize) -> HashMap<String, String> {
    (0..=targets)
        .map(|i| (format!("CC-{i}"), "ACME".to_string()))
        .collect()
}

fn template() -> DimensionSource<'static> {
    DimensionSource {
        company: Some("ACME"),
        fiscal_period: Some("FY2026"),
        cost_center: "CC-0",
        account: "",
        project: None,
        branch: None,
        posting_date: NaiveDate::from_ymd_opt(2026, 6, 30).unwrap(),
    }
}

fn lines(amounts: &[Decimal]) -> Vec<AmountLine> {
    amounts
        .iter()
        .enumerate()
        .map(|(i, amount)| AmountLine::new(format!("6{i:03}"), *amount))
        .collect()
}

/// Allocation whose lines carry `total * w_i / sum(w)`.
fn allocation(total: Decimal, weights: &[u32]) -> AllocationDocument {
    let weight_sum = Decimal::from(weights.iter().sum::<u32>());
    AllocationDocument {
        name: "ALLOC-PROP".to_string(),
        status: AllocationStatus::Approved,
        total,
        lines: weights
            .iter()
            .enumerate()
            .map(|(i, w)| AllocationLine {
                cost_center: format!("CC-{}", i + 1),
                amount: total * Decimal::from(*w) / weight_sum,
                project: None,
                branch: None,
            })
            .collect(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Direct slices sum to the document total.
    #[test]
    fn prop_direct_slices_sum_to_total(amounts in line_amounts()) {
        let dir = directory(0);
        let cal = FiscalCalendar::default();
        let resolver = DimensionResolver::new(&dir, &cal, EnforceScope::default(), None);
        let slicer = AllocationSlicer::new(&resolver, 2, Decimal::new(1, 2));

        let slices = slicer.slice_document(&template(), &lines(&amounts), None, None).unwrap();

        let total: Decimal = amounts.iter().copied().sum();
        prop_assert_eq!(slices.iter().map(|s| s.amount).sum::<Decimal>(), total);
    }

    /// Ratio slices sum exactly to the document total with no drift.
    #[test]
    fn prop_ratio_slices_sum_to_total(
        amounts in line_amounts(),
        weights in target_weights(),
    ) {
        let dir = directory(weights.len());
        let cal = FiscalCalendar::default();
        let resolver = DimensionResolver::new(&dir, &cal, EnforceScope::default(), None);
        let slicer = AllocationSlicer::new(&resolver, 2, Decimal::new(1, 2));
        let total: Decimal = amounts.iter().copied().sum();

        let slices = slicer
            .slice_document(&template(), &lines(&amounts), Some(&allocation(total, &weights)), None)
            .unwrap();

        prop_assert_eq!(slices.iter().map(|s| s.amount).sum::<Decimal>(), total);
    }

    /// Slices are never negative and never finer than the minor unit.
    #[test]
    fn prop_slices_are_rounded_and_non_negative(
        amounts in line_amounts(),
        weights in target_weights(),
    ) {
        let dir = directory(weights.len());
        let cal = FiscalCalendar::default();
        let resolver = DimensionResolver::new(&dir, &cal, EnforceScope::default(), None);
        let slicer = AllocationSlicer::new(&resolver, 2, Decimal::new(1, 2));
        let total: Decimal = amounts.iter().copied().sum();

        let slices = slicer
            .slice_document(&template(), &lines(&amounts), Some(&allocation(total, &weights)), None)
            .unwrap();

        for slice in &slices {
            prop_assert!(slice.amount > Decimal::ZERO, "slice {} not positive", slice.amount);
            prop_assert_eq!(slice.amount, slice.amount.round_dp(2));
        }
    }

    /// Zero-decimal currencies slice to whole units.
    #[test]
    fn prop_zero_precision_slices_are_whole(
        units in prop::collection::vec(1i64..1_000_000i64, 1..4),
        weights in target_weights(),
    ) {
        let amounts: Vec<Decimal> = units.into_iter().map(Decimal::from).collect();
        let dir = directory(weights.len());
        let cal = FiscalCalendar::default();
        let resolver = DimensionResolver::new(&dir, &cal, EnforceScope::default(), None);
        let slicer = AllocationSlicer::new(&resolver, 0, Decimal::ONE);
        let total: Decimal = amounts.iter().copied().sum();

        let slices = slicer
            .slice_document(&template(), &lines(&amounts), Some(&allocation(total, &weights)), None)
            .unwrap();

        prop_assert_eq!(slices.iter().map(|s| s.amount).sum::<Decimal>(), total);
        prop_assert!(slices.iter().all(|s| s.amount.fract().is_zero()));
    }
}
