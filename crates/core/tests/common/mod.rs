//! Shared setup for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use ledgerlock_core::allocation::AmountLine;
use ledgerlock_core::availability::EnvelopeBook;
use ledgerlock_core::dimension::DimensionKey;
use ledgerlock_core::fiscal::{FiscalCalendar, FiscalPeriod};
use ledgerlock_core::ledger::{DocumentRef, MemoryLedger};
use ledgerlock_core::workflow::{
    BudgetController, EngineSources, EventContext, Principal, SecondaryDocument, SourceDocument,
};
use ledgerlock_shared::BudgetControlConfig;
use rust_decimal::Decimal;

pub const COMPANY: &str = "ACME";
pub const COST_CENTER: &str = "CC-OPS";
pub const ACCOUNT: &str = "6100-Travel";

/// A controller over an in-memory ledger with one envelope.
pub struct Engine {
    pub controller: Arc<BudgetController>,
    pub ledger: Arc<MemoryLedger>,
    pub envelopes: Arc<EnvelopeBook>,
}

impl Engine {
    pub fn with_envelope(allocated: Decimal) -> Self {
        Self::with_config(BudgetControlConfig::default(), allocated)
    }

    pub fn with_config(config: BudgetControlConfig, allocated: Decimal) -> Self {
        let ledger = Arc::new(MemoryLedger::new(config.lock_timeout()));
        let envelopes = Arc::new(EnvelopeBook::new());
        envelopes.set(key(), allocated);

        let directory: HashMap<String, String> =
            HashMap::from([(COST_CENTER.to_string(), COMPANY.to_string())]);
        let calendar = FiscalCalendar::new(vec![FiscalPeriod {
            name: "FY2026".to_string(),
            company: None,
            start_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 12, 31).unwrap(),
        }]);
        let ttl = config.actuals_cache_ttl();
        let controller = BudgetController::new(
            config,
            EngineSources::ledger_backed(
                ledger.clone(),
                envelopes.clone(),
                Arc::new(directory),
                Arc::new(calendar),
                ttl,
            ),
        );

        Self {
            controller: Arc::new(controller),
            ledger,
            envelopes,
        }
    }
}

pub fn key() -> DimensionKey {
    DimensionKey::new(COMPANY, "FY2026", COST_CENTER, ACCOUNT)
}

pub fn posting_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 4, 20).unwrap()
}

/// An approved expense claim charging `amount` to the travel account.
pub fn expense_claim(name: &str, amount: Decimal) -> SourceDocument {
    SourceDocument {
        doc_ref: DocumentRef::new("Expense Claim", name),
        company: None,
        fiscal_period: None,
        cost_center: COST_CENTER.to_string(),
        project: None,
        branch: None,
        posting_date: posting_date(),
        workflow_state: "Approved".to_string(),
        lines: vec![AmountLine::new(ACCOUNT, amount)],
        allocation: None,
    }
}

pub fn purchase_invoice(name: &str, amount: Decimal) -> SecondaryDocument {
    SecondaryDocument {
        doc_ref: DocumentRef::new("Purchase Invoice", name),
        posting_date: posting_date(),
        lines: vec![AmountLine::new(ACCOUNT, amount)],
    }
}

pub fn employee() -> EventContext {
    EventContext::acting_as(Principal::new("eko", &["Employee"]))
}

pub fn budget_manager() -> EventContext {
    EventContext::acting_as(Principal::new("maria", &["Employee", "Budget Manager"]))
}
