//! Event script format and replay.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use futures::future::join_all;
use ledgerlock_core::availability::{AvailabilityResult, BudgetEnvelope, EnvelopeBook};
use ledgerlock_core::dimension::DimensionKey;
use ledgerlock_core::fiscal::{FiscalCalendar, FiscalPeriod};
use ledgerlock_core::ledger::MemoryLedger;
use ledgerlock_core::workflow::{
    BudgetController, EngineSources, EventDispatcher, LifecycleEvent, Outcome,
};
use ledgerlock_shared::BudgetControlConfig;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Reference data and events to replay.
#[derive(Debug, Deserialize)]
pub struct Script {
    /// Cost center to company mapping.
    #[serde(default)]
    pub cost_centers: HashMap<String, String>,
    /// Fiscal periods for date-based resolution.
    #[serde(default)]
    pub fiscal_periods: Vec<FiscalPeriod>,
    /// Allocated ceilings.
    #[serde(default)]
    pub envelopes: Vec<BudgetEnvelope>,
    /// Lifecycle events, in submission order.
    pub events: Vec<LifecycleEvent>,
}

impl Script {
    /// Reads a script from a JSON file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read script {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("Failed to parse script {}", path.display()))
    }

    /// Parses a script from JSON text.
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Result of one replayed event.
#[derive(Debug, Serialize)]
pub struct EventReport {
    /// Position in the script.
    pub index: usize,
    /// Event name.
    pub event: &'static str,
    /// Source document.
    pub document: String,
    /// Outcome, when the event succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
    /// Error code and message, when it failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorReport>,
}

/// A failed event.
#[derive(Debug, Serialize)]
pub struct ErrorReport {
    /// Stable error code.
    pub code: &'static str,
    /// Human-readable message.
    pub message: String,
    /// Whether retrying the same event may succeed.
    pub retryable: bool,
}

/// Everything a replay produced.
#[derive(Debug, Serialize)]
pub struct ReplayReport {
    /// Per-event results, in script order.
    pub events: Vec<EventReport>,
    /// Final availability of every key touched by the ledger or an envelope.
    pub availability: Vec<AvailabilityResult>,
    /// Ledger rows written.
    pub ledger_entries: usize,
}

/// Replays `script` through a fresh in-memory engine.
pub async fn replay(config: BudgetControlConfig, script: Script) -> Result<ReplayReport> {
    let ledger = Arc::new(MemoryLedger::new(config.lock_timeout()));
    let envelope_keys: Vec<DimensionKey> = script
        .envelopes
        .iter()
        .map(|e| e.dimension_key.clone())
        .collect();
    let envelopes = Arc::new(EnvelopeBook::from(script.envelopes));
    let workers = config.dispatch_workers;
    let ttl = config.actuals_cache_ttl();

    let controller = Arc::new(BudgetController::new(
        config,
        EngineSources::ledger_backed(
            ledger.clone(),
            envelopes,
            Arc::new(script.cost_centers),
            Arc::new(FiscalCalendar::new(script.fiscal_periods)),
            ttl,
        ),
    ));
    let dispatcher = EventDispatcher::spawn(Arc::clone(&controller), workers);
    info!(events = script.events.len(), workers, "Replaying script");

    let mut submitted = Vec::with_capacity(script.events.len());
    for (index, event) in script.events.into_iter().enumerate() {
        let name = event.name();
        let document = event.document().to_string();
        let pending = dispatcher.submit(event).await?;
        submitted.push((index, name, document, pending));
    }

    let events = join_all(submitted.into_iter().map(
        |(index, event, document, pending)| async move {
            match pending.wait().await {
                Ok(outcome) => EventReport {
                    index,
                    event,
                    document,
                    outcome: Some(outcome),
                    error: None,
                },
                Err(err) => EventReport {
                    index,
                    event,
                    document,
                    outcome: None,
                    error: Some(ErrorReport {
                        code: err.error_code(),
                        message: err.to_string(),
                        retryable: err.is_retryable(),
                    }),
                },
            }
        },
    ))
    .await;
    dispatcher.shutdown().await;

    let keys: BTreeSet<DimensionKey> = ledger
        .entries()
        .iter()
        .map(|e| e.dimension_key().clone())
        .chain(envelope_keys)
        .collect();
    let availability = keys
        .iter()
        .map(|key| controller.get_availability(key))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ReplayReport {
        events,
        availability,
        ledger_entries: ledger.len(),
    })
}
