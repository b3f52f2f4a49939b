//! Shared fixtures for workflow unit tests.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use ledgerlock_shared::BudgetControlConfig;
use rust_decimal::Decimal;

use super::controller::{BudgetController, EngineSources};
use super::types::{EventContext, Principal, SecondaryDocument, SourceDocument};
use crate::allocation::AmountLine;
use crate::availability::{ActualSpendSource, EnvelopeBook};
use crate::dimension::DimensionKey;
use crate::fiscal::{FiscalCalendar, FiscalPeriod};
use crate::ledger::{DocumentRef, MemoryLedger};

pub(crate) const ACCOUNT: &str = "6100-Travel";

pub(crate) struct Fixture {
    pub config: BudgetControlConfig,
    pub ledger: Arc<MemoryLedger>,
    pub envelopes: Arc<EnvelopeBook>,
}

impl Fixture {
    pub fn new(envelope: Decimal) -> Self {
        let fixture = Self {
            config: BudgetControlConfig::default(),
            ledger: Arc::new(MemoryLedger::default()),
            envelopes: Arc::new(EnvelopeBook::new()),
        };
        fixture.envelopes.set(fixture.key(), envelope);
        fixture
    }

    pub fn key(&self) -> DimensionKey {
        key_at("CC-OPS", ACCOUNT)
    }

    pub fn controller(&self) -> BudgetController {
        BudgetController::new(self.config.clone(), self.sources())
    }

    /// A controller whose actual spend comes from `actuals` instead of the ledger.
    pub fn controller_with_actuals(&self, actuals: Arc<dyn ActualSpendSource>) -> BudgetController {
        let mut sources = self.sources();
        sources.actuals = actuals;
        BudgetController::new(self.config.clone(), sources)
    }

    fn sources(&self) -> EngineSources {
        let directory: HashMap<String, String> = ["CC-OPS", "CC-SALES", "CC-IT"]
            .into_iter()
            .map(|cc| (cc.to_string(), "ACME".to_string()))
            .collect();
        let calendar = FiscalCalendar::new(vec![FiscalPeriod {
            name: "FY2026".to_string(),
            company: None,
            start_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 12, 31).unwrap(),
        }]);
        EngineSources::ledger_backed(
            self.ledger.clone(),
            self.envelopes.clone(),
            Arc::new(directory),
            Arc::new(calendar),
            self.config.actuals_cache_ttl(),
        )
    }
}

pub(crate) fn key_at(cost_center: &str, account: &str) -> DimensionKey {
    DimensionKey::new("ACME", "FY2026", cost_center, account)
}

pub(crate) fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
}

pub(crate) fn expense(name: &str, amount: Decimal) -> SourceDocument {
    SourceDocument {
        doc_ref: DocumentRef::new("Expense Claim", name),
        company: Some("ACME".to_string()),
        fiscal_period: None,
        cost_center: "CC-OPS".to_string(),
        project: None,
        branch: None,
        posting_date: date(),
        workflow_state: "Approved".to_string(),
        lines: vec![AmountLine::new(ACCOUNT, amount)],
        allocation: None,
    }
}

pub(crate) fn invoice(name: &str, amount: Decimal) -> SecondaryDocument {
    SecondaryDocument {
        doc_ref: DocumentRef::new("Purchase Invoice", name),
        posting_date: date(),
        lines: vec![AmountLine::new(ACCOUNT, amount)],
    }
}

pub(crate) fn manager() -> EventContext {
    EventContext::acting_as(Principal::new("maria", &["Budget Manager"]))
}

pub(crate) fn employee() -> EventContext {
    EventContext::acting_as(Principal::new("eko", &["Employee"]))
}
