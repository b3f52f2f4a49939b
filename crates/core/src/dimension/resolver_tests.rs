use std::collections::HashMap;

use chrono::NaiveDate;
use ledgerlock_shared::EnforceScope;
use rstest::rstest;

use super::resolver::{DimensionResolver, DimensionSource};
use crate::error::BudgetControlError;
use crate::fiscal::{FiscalCalendar, FiscalPeriod};

fn directory() -> HashMap<String, String> {
    HashMap::from([
        ("CC-OPS".to_string(), "ACME".to_string()),
        ("CC-ORPHAN".to_string(), String::new()),
    ])
}

fn calendar() -> FiscalCalendar {
    FiscalCalendar::new(vec![FiscalPeriod {
        name: "FY2026".to_string(),
        company: None,
        start_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2026, 12, 31).unwrap(),
    }])
}

fn source<'a>(company: Option<&'a str>, period: Option<&'a str>, date: NaiveDate) -> DimensionSource<'a> {
    DimensionSource {
        company,
        fiscal_period: period,
        cost_center: "CC-OPS",
        account: "6100-Travel",
        project: Some("PRJ-1"),
        branch: Some("BKK"),
        posting_date: date,
    }
}

fn in_year() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 4, 1).unwrap()
}

fn out_of_year() -> NaiveDate {
    NaiveDate::from_ymd_opt(2030, 4, 1).unwrap()
}

#[rstest]
#[case::explicit_field(Some("P-DOC"), Some("P-CALLER"), Some("P-GLOBAL"), in_year(), "P-DOC")]
#[case::caller_default(None, Some("P-CALLER"), Some("P-GLOBAL"), in_year(), "P-CALLER")]
#[case::global_default(None, None, Some("P-GLOBAL"), in_year(), "P-GLOBAL")]
#[case::calendar_lookup(None, None, None, in_year(), "FY2026")]
#[case::blank_field_is_ignored(Some("  "), None, None, in_year(), "FY2026")]
fn test_fiscal_period_fallback_chain(
    #[case] doc_period: Option<&str>,
    #[case] caller_default: Option<&str>,
    #[case] global_default: Option<&str>,
    #[case] posting_date: NaiveDate,
    #[case] expected: &str,
) {
    let dir = directory();
    let cal = calendar();
    let resolver = DimensionResolver::new(&dir, &cal, EnforceScope::default(), global_default);

    let key = resolver
        .resolve(&source(Some("ACME"), doc_period, posting_date), caller_default)
        .unwrap();

    assert_eq!(key.fiscal_period(), expected);
}

#[test]
fn test_company_derived_from_cost_center() {
    let dir = directory();
    let cal = calendar();
    let resolver = DimensionResolver::new(&dir, &cal, EnforceScope::default(), None);

    let key = resolver.resolve(&source(None, None, in_year()), None).unwrap();

    assert_eq!(key.company(), "ACME");
    assert_eq!(key.cost_center(), "CC-OPS");
    assert_eq!(key.account(), "6100-Travel");
}

#[test]
fn test_unknown_cost_center_fails_on_company() {
    let dir = directory();
    let cal = calendar();
    let resolver = DimensionResolver::new(&dir, &cal, EnforceScope::default(), None);
    let mut src = source(None, None, in_year());
    src.cost_center = "CC-UNKNOWN";

    let err = resolver.resolve(&src, None).unwrap_err();

    assert!(matches!(
        err,
        BudgetControlError::DimensionUnresolved {
            missing: "company",
            ..
        }
    ));
}

#[test]
fn test_blank_directory_company_is_unresolved() {
    let dir = directory();
    let cal = calendar();
    let resolver = DimensionResolver::new(&dir, &cal, EnforceScope::default(), None);
    let mut src = source(None, None, in_year());
    src.cost_center = "CC-ORPHAN";

    assert!(resolver.resolve(&src, None).is_err());
}

#[test]
fn test_no_period_anywhere_fails() {
    let dir = directory();
    let cal = calendar();
    let resolver = DimensionResolver::new(&dir, &cal, EnforceScope::default(), None);

    let err = resolver
        .resolve(&source(Some("ACME"), None, out_of_year()), None)
        .unwrap_err();

    assert!(matches!(
        err,
        BudgetControlError::DimensionUnresolved {
            missing: "fiscal_period",
            ..
        }
    ));
}

#[test]
fn test_missing_account_fails() {
    let dir = directory();
    let cal = calendar();
    let resolver = DimensionResolver::new(&dir, &cal, EnforceScope::default(), None);
    let mut src = source(Some("ACME"), None, in_year());
    src.account = "";

    let err = resolver.resolve(&src, None).unwrap_err();

    assert_eq!(err.error_code(), "DIMENSION_UNRESOLVED");
}

#[rstest]
#[case(false, false, None, None)]
#[case(true, false, Some("PRJ-1"), None)]
#[case(false, true, None, Some("BKK"))]
#[case(true, true, Some("PRJ-1"), Some("BKK"))]
fn test_enforce_scope_controls_optional_dimensions(
    #[case] project: bool,
    #[case] branch: bool,
    #[case] expected_project: Option<&str>,
    #[case] expected_branch: Option<&str>,
) {
    let dir = directory();
    let cal = calendar();
    let resolver = DimensionResolver::new(&dir, &cal, EnforceScope { project, branch }, None);

    let key = resolver
        .resolve(&source(Some("ACME"), None, in_year()), None)
        .unwrap();

    assert_eq!(key.project(), expected_project);
    assert_eq!(key.branch(), expected_branch);
}
