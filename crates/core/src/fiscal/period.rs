//! Fiscal period types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A named fiscal period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FiscalPeriod {
    /// Period name (e.g., "FY2026").
    pub name: String,
    /// Company the period belongs to. `None` applies to every company.
    #[serde(default)]
    pub company: Option<String>,
    /// Start date of the period.
    pub start_date: NaiveDate,
    /// End date of the period (inclusive).
    pub end_date: NaiveDate,
}

impl FiscalPeriod {
    /// Returns true if the given date falls within this period.
    #[must_use]
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    /// Returns true if the period applies to the company.
    #[must_use]
    pub fn applies_to(&self, company: &str) -> bool {
        self.company.as_deref().is_none_or(|c| c == company)
    }
}

/// The set of fiscal periods known to the engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FiscalCalendar {
    periods: Vec<FiscalPeriod>,
}

impl FiscalCalendar {
    /// Creates a calendar from a list of periods.
    #[must_use]
    pub fn new(periods: Vec<FiscalPeriod>) -> Self {
        Self { periods }
    }

    /// Finds the period containing `date` for `company`.
    ///
    /// A company-specific period wins over a shared one.
    #[must_use]
    pub fn period_for(&self, company: &str, date: NaiveDate) -> Option<&str> {
        let mut shared = None;
        for period in self
            .periods
            .iter()
            .filter(|p| p.applies_to(company) && p.contains_date(date))
        {
            if period.company.is_some() {
                return Some(&period.name);
            }
            shared.get_or_insert(period.name.as_str());
        }
        shared
    }
}
