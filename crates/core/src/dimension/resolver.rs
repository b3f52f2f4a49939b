//! Dimension resolution from stored document fields.
//!
//! A partial key is never returned: a key missing its company or fiscal
//! period would silently book against a different bucket than intended.

use std::collections::HashMap;

use chrono::NaiveDate;
use ledgerlock_shared::EnforceScope;

use super::key::DimensionKey;
use crate::error::BudgetControlError;
use crate::fiscal::FiscalCalendar;

/// Maps cost centers to the company that owns them.
pub trait CostCenterDirectory: Send + Sync {
    /// Returns the owning company of a cost center.
    fn company_of(&self, cost_center: &str) -> Option<String>;
}

impl CostCenterDirectory for HashMap<String, String> {
    fn company_of(&self, cost_center: &str) -> Option<String> {
        self.get(cost_center).cloned()
    }
}

/// Stored fields of one document line that a key is derived from.
#[derive(Debug, Clone, Copy)]
pub struct DimensionSource<'a> {
    /// Company, when stored on the document.
    pub company: Option<&'a str>,
    /// Fiscal period, when stored on the document.
    pub fiscal_period: Option<&'a str>,
    /// Cost center of the line.
    pub cost_center: &'a str,
    /// Account of the line.
    pub account: &'a str,
    /// Project, when present.
    pub project: Option<&'a str>,
    /// Branch, when present.
    pub branch: Option<&'a str>,
    /// Posting date used for the calendar fallback.
    pub posting_date: NaiveDate,
}

/// Derives canonical keys from document fields and system defaults.
pub struct DimensionResolver<'a> {
    directory: &'a dyn CostCenterDirectory,
    calendar: &'a FiscalCalendar,
    scope: EnforceScope,
    global_default_period: Option<&'a str>,
}

impl<'a> DimensionResolver<'a> {
    /// Creates a resolver over the given reference data.
    #[must_use]
    pub fn new(
        directory: &'a dyn CostCenterDirectory,
        calendar: &'a FiscalCalendar,
        scope: EnforceScope,
        global_default_period: Option<&'a str>,
    ) -> Self {
        Self {
            directory,
            calendar,
            scope,
            global_default_period,
        }
    }

    /// Resolves a fully populated key.
    ///
    /// Company comes from the document or, failing that, from the cost center.
    /// Fiscal period falls back through: document field, `caller_default`,
    /// the global default, then the calendar period containing the posting date.
    ///
    /// # Errors
    ///
    /// Returns `BudgetControlError::DimensionUnresolved` naming the first
    /// dimension that could not be derived.
    pub fn resolve(
        &self,
        source: &DimensionSource<'_>,
        caller_default: Option<&str>,
    ) -> Result<DimensionKey, BudgetControlError> {
        let unresolved = |missing: &'static str| BudgetControlError::DimensionUnresolved {
            missing,
            cost_center: source.cost_center.to_string(),
            account: source.account.to_string(),
        };

        let cost_center = non_blank(Some(source.cost_center)).ok_or_else(|| unresolved("cost_center"))?;
        let account = non_blank(Some(source.account)).ok_or_else(|| unresolved("account"))?;

        let company = match non_blank(source.company) {
            Some(company) => company.to_string(),
            None => self
                .directory
                .company_of(cost_center)
                .filter(|c| !c.trim().is_empty())
                .ok_or_else(|| unresolved("company"))?,
        };

        let fiscal_period = non_blank(source.fiscal_period)
            .or_else(|| non_blank(caller_default))
            .or_else(|| non_blank(self.global_default_period))
            .or_else(|| self.calendar.period_for(&company, source.posting_date))
            .ok_or_else(|| unresolved("fiscal_period"))?
            .to_string();

        let project = if self.scope.project {
            non_blank(source.project).map(str::to_string)
        } else {
            None
        };
        let branch = if self.scope.branch {
            non_blank(source.branch).map(str::to_string)
        } else {
            None
        };

        Ok(DimensionKey::new(company, fiscal_period, cost_center, account)
            .with_project(project)
            .with_branch(branch))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
