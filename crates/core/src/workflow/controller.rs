//! Budget controller: the entry point for lifecycle events.
//!
//! Every operation follows the same shape:
//! 1. Take the source document's lock
//! 2. Derive the document's state from its ledger rows
//! 3. Slice, then lock the touched control scopes
//! 4. Check availability and append one batch, or fail with nothing written

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use ledgerlock_shared::{BudgetControlConfig, ConfigError};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use super::state::{
    derive_state, last_reservation, outstanding_consumed_against, outstanding_reserved, positions,
};
use super::types::{
    DocumentState, DocumentSummary, EventContext, LifecycleEvent, LockStatus, Outcome, Principal,
    SecondaryDocument, SkipReason, SourceDocument, StatusUpdate,
};
use crate::allocation::{AllocationSlice, AllocationSlicer};
use crate::availability::{
    ActualSpendSource, AvailabilityCalculator, AvailabilityResult, CachedActuals, ConsumedActuals,
    EnvelopeSource,
};
use crate::dimension::{BudgetScope, CostCenterDirectory, DimensionKey, DimensionResolver};
use crate::error::{BudgetControlError, BudgetResult, Shortfall};
use crate::fiscal::FiscalCalendar;
use crate::ledger::{
    Direction, DocumentRef, EntryDraft, EntryType, LedgerEntry, LedgerQuery, LedgerStore,
    LockTable, LockTimeout,
};

/// Collaborators the controller reads from and writes to.
#[derive(Clone)]
pub struct EngineSources {
    /// The budget ledger.
    pub ledger: Arc<dyn LedgerStore>,
    /// Allocated ceilings.
    pub envelopes: Arc<dyn EnvelopeSource>,
    /// Posted real spend.
    pub actuals: Arc<dyn ActualSpendSource>,
    /// Cost center to company mapping.
    pub directory: Arc<dyn CostCenterDirectory>,
    /// Fiscal periods for date-based resolution.
    pub calendar: Arc<FiscalCalendar>,
}

impl EngineSources {
    /// Sources whose actuals are the ledger's own consumption, cached for `actuals_ttl`.
    #[must_use]
    pub fn ledger_backed(
        ledger: Arc<dyn LedgerStore>,
        envelopes: Arc<dyn EnvelopeSource>,
        directory: Arc<dyn CostCenterDirectory>,
        calendar: Arc<FiscalCalendar>,
        actuals_ttl: Duration,
    ) -> Self {
        let consumed = Arc::new(ConsumedActuals::new(Arc::clone(&ledger)));
        Self {
            actuals: Arc::new(CachedActuals::new(consumed, actuals_ttl)),
            ledger,
            envelopes,
            directory,
            calendar,
        }
    }
}

/// Applies lifecycle events to the budget ledger.
pub struct BudgetController {
    config: BudgetControlConfig,
    sources: EngineSources,
    document_locks: LockTable<DocumentRef>,
}

impl BudgetController {
    /// Creates a controller. The configuration is fixed until [`Self::reload_config`].
    #[must_use]
    pub fn new(config: BudgetControlConfig, sources: EngineSources) -> Self {
        let document_locks = LockTable::new(config.lock_timeout());
        Self {
            config,
            sources,
            document_locks,
        }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &BudgetControlConfig {
        &self.config
    }

    /// The ledger this controller appends to.
    #[must_use]
    pub fn ledger(&self) -> &dyn LedgerStore {
        self.sources.ledger.as_ref()
    }

    /// Replaces the configuration.
    ///
    /// Cached actuals are dropped since the control scope shape may change.
    pub fn reload_config(&mut self, config: BudgetControlConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.document_locks = LockTable::new(config.lock_timeout());
        self.config = config;
        self.sources.actuals.invalidate_all();
        info!("Budget control configuration reloaded");
        Ok(())
    }

    /// Routes an event to its handler.
    pub fn handle(&self, event: &LifecycleEvent) -> BudgetResult<Outcome> {
        match event {
            LifecycleEvent::ReachedTargetState { document, context } => {
                self.on_reach_target_state(document, context)
            }
            LifecycleEvent::SecondarySubmitted {
                document,
                secondary,
                context,
            } => self.on_secondary_submitted(document, secondary, context),
            LifecycleEvent::RejectedOrReopened { document, context } => {
                self.on_rejected_or_reopened(document, context)
            }
            LifecycleEvent::SecondaryCancelled {
                document,
                secondary,
                context,
            } => self.on_secondary_cancelled(document, secondary, context),
        }
    }

    /// Reserves budget for a document that reached the lock state.
    ///
    /// A document that already holds or has consumed budget is a duplicate.
    /// If any scope is short and the principal lacks the overrun role, the
    /// whole reservation fails and nothing is written.
    pub fn on_reach_target_state(
        &self,
        document: &SourceDocument,
        context: &EventContext,
    ) -> BudgetResult<Outcome> {
        if !self.config.enable_budget_lock {
            return Ok(Outcome::skipped(SkipReason::Disabled));
        }
        if document.workflow_state != self.config.lock_on_state {
            debug!(
                document = %document.doc_ref,
                state = %document.workflow_state,
                "Document not in lock state, skipping"
            );
            return Ok(Outcome::skipped(SkipReason::NotTargetState));
        }

        self.with_document(&document.doc_ref, || {
            let history = self.history(&document.doc_ref);
            let state = derive_state(positions(&history).values());
            if state != DocumentState::Unlocked {
                debug!(document = %document.doc_ref, ?state, "Reservation already exists");
                return Ok(Outcome::Duplicate);
            }

            let slices = self.slice_document(document, context)?;
            if slices.is_empty() {
                return Ok(Outcome::skipped(SkipReason::ZeroAmount));
            }

            let drafts = slices
                .into_iter()
                .map(|slice| {
                    EntryDraft::new(
                        slice.dimension_key,
                        EntryType::Reservation,
                        slice.amount,
                        document.doc_ref.clone(),
                        document.posting_date,
                    )
                })
                .collect();
            let (entries, overruns) =
                self.append_checked(&document.doc_ref, drafts, &context.principal)?;

            let status = if overruns.is_empty() {
                LockStatus::Locked
            } else {
                warn!(
                    document = %document.doc_ref,
                    user = %context.principal.user,
                    scopes = overruns.len(),
                    "Reservation exceeds available budget, overrun permitted"
                );
                LockStatus::OverrunAllowed
            };
            info!(document = %document.doc_ref, %status, entries = entries.len(), "Budget reserved");

            Ok(Outcome::Applied(StatusUpdate {
                document: document.doc_ref.clone(),
                status,
                entries,
                overruns,
            }))
        })
    }

    /// Recognizes spend from a secondary document.
    ///
    /// Releases the document's outstanding reservation and posts CONSUMPTION
    /// sized to the secondary document, in one batch.
    pub fn on_secondary_submitted(
        &self,
        document: &SourceDocument,
        secondary: &SecondaryDocument,
        context: &EventContext,
    ) -> BudgetResult<Outcome> {
        if !self.config.enable_budget_lock {
            return Ok(Outcome::skipped(SkipReason::Disabled));
        }

        self.with_document(&document.doc_ref, || {
            let history = self.history(&document.doc_ref);
            if !outstanding_consumed_against(&history, &secondary.doc_ref).is_empty() {
                debug!(
                    document = %document.doc_ref,
                    secondary = %secondary.doc_ref,
                    "Secondary document already consumed"
                );
                return Ok(Outcome::Duplicate);
            }

            let slices = self.slice_secondary(document, secondary, context)?;
            if slices.is_empty() {
                return Ok(Outcome::skipped(SkipReason::ZeroAmount));
            }

            let mut drafts: Vec<EntryDraft> = outstanding_reserved(&history)
                .into_iter()
                .map(|(key, amount)| {
                    EntryDraft::new(
                        key,
                        EntryType::Release,
                        amount,
                        document.doc_ref.clone(),
                        secondary.posting_date,
                    )
                    .against(secondary.doc_ref.clone())
                })
                .collect();
            drafts.extend(slices.into_iter().map(|slice| {
                EntryDraft::new(
                    slice.dimension_key,
                    EntryType::Consumption,
                    slice.amount,
                    document.doc_ref.clone(),
                    secondary.posting_date,
                )
                .against(secondary.doc_ref.clone())
            }));

            let (entries, overruns) = self.append_unchecked(drafts)?;
            if !overruns.is_empty() {
                warn!(
                    document = %document.doc_ref,
                    secondary = %secondary.doc_ref,
                    scopes = overruns.len(),
                    "Consumption left budget negative"
                );
            }
            info!(
                document = %document.doc_ref,
                secondary = %secondary.doc_ref,
                entries = entries.len(),
                "Budget consumed"
            );

            Ok(Outcome::Applied(StatusUpdate {
                document: document.doc_ref.clone(),
                status: LockStatus::Consumed,
                entries,
                overruns,
            }))
        })
    }

    /// Releases the document's outstanding reservation.
    pub fn on_rejected_or_reopened(
        &self,
        document: &SourceDocument,
        _context: &EventContext,
    ) -> BudgetResult<Outcome> {
        if !self.config.enable_budget_lock {
            return Ok(Outcome::skipped(SkipReason::Disabled));
        }

        self.with_document(&document.doc_ref, || {
            let outstanding = outstanding_reserved(&self.history(&document.doc_ref));
            if outstanding.is_empty() {
                debug!(document = %document.doc_ref, "Nothing reserved to release");
                return Ok(Outcome::skipped(SkipReason::NothingReserved));
            }

            let drafts = outstanding
                .into_iter()
                .map(|(key, amount)| {
                    EntryDraft::new(
                        key,
                        EntryType::Release,
                        amount,
                        document.doc_ref.clone(),
                        document.posting_date,
                    )
                })
                .collect();
            let (entries, _) = self.append_unchecked(drafts)?;
            info!(document = %document.doc_ref, entries = entries.len(), "Budget released");

            Ok(Outcome::Applied(StatusUpdate {
                document: document.doc_ref.clone(),
                status: LockStatus::Released,
                entries,
                overruns: Vec::new(),
            }))
        })
    }

    /// Reverses a cancelled secondary document's consumption.
    ///
    /// When nothing else is consumed or reserved for the document afterwards,
    /// its most recent reservation is re-posted in the same batch so the
    /// hold on budget is restored.
    pub fn on_secondary_cancelled(
        &self,
        document: &SourceDocument,
        secondary: &SecondaryDocument,
        _context: &EventContext,
    ) -> BudgetResult<Outcome> {
        if !self.config.enable_budget_lock {
            return Ok(Outcome::skipped(SkipReason::Disabled));
        }

        self.with_document(&document.doc_ref, || {
            let history = self.history(&document.doc_ref);
            let reversed = outstanding_consumed_against(&history, &secondary.doc_ref);
            if reversed.is_empty() {
                debug!(
                    document = %document.doc_ref,
                    secondary = %secondary.doc_ref,
                    "No consumption left to reverse"
                );
                return Ok(Outcome::Duplicate);
            }

            let others: Vec<LedgerEntry> = history
                .iter()
                .filter(|e| e.against() != Some(&secondary.doc_ref))
                .cloned()
                .collect();
            let other_consumption = positions(&others)
                .values()
                .any(|p| p.consumed > Decimal::ZERO);
            let restore = if other_consumption || !outstanding_reserved(&history).is_empty() {
                Vec::new()
            } else {
                last_reservation(&history)
            };

            let mut drafts: Vec<EntryDraft> = reversed
                .into_iter()
                .map(|(key, amount)| {
                    EntryDraft::new(
                        key,
                        EntryType::Reversal,
                        amount,
                        document.doc_ref.clone(),
                        secondary.posting_date,
                    )
                    .against(secondary.doc_ref.clone())
                })
                .collect();
            let restoring = !restore.is_empty();
            drafts.extend(restore.into_iter().map(|(key, amount)| {
                EntryDraft::new(
                    key,
                    EntryType::Reservation,
                    amount,
                    document.doc_ref.clone(),
                    document.posting_date,
                )
            }));

            let (entries, overruns) = self.append_unchecked(drafts)?;
            let status = match (restoring, overruns.is_empty(), other_consumption) {
                (true, true, _) => LockStatus::Locked,
                (true, false, _) => {
                    warn!(
                        document = %document.doc_ref,
                        scopes = overruns.len(),
                        "Restored reservation exceeds available budget"
                    );
                    LockStatus::OverrunAllowed
                }
                (false, _, true) => LockStatus::Consumed,
                (false, _, false) => LockStatus::Released,
            };
            info!(
                document = %document.doc_ref,
                secondary = %secondary.doc_ref,
                %status,
                entries = entries.len(),
                "Consumption reversed"
            );

            Ok(Outcome::Applied(StatusUpdate {
                document: document.doc_ref.clone(),
                status,
                entries,
                overruns,
            }))
        })
    }

    /// Adds budget to a key on top of its envelope.
    pub fn supplement_budget(
        &self,
        key: &DimensionKey,
        amount: Decimal,
        source: &DocumentRef,
        posting_date: NaiveDate,
    ) -> BudgetResult<Vec<LedgerEntry>> {
        ensure_positive(amount)?;
        let draft = EntryDraft::new(
            key.clone(),
            EntryType::Supplement,
            amount,
            source.clone(),
            posting_date,
        );
        let (entries, _) = self.append_unchecked(vec![draft])?;
        info!(source = %source, key = %key, %amount, "Budget supplemented");
        Ok(entries)
    }

    /// Moves budget from one key to another.
    ///
    /// The source key must have the amount available unless the principal
    /// holds the overrun role.
    pub fn reclass_budget(
        &self,
        from: &DimensionKey,
        to: &DimensionKey,
        amount: Decimal,
        source: &DocumentRef,
        posting_date: NaiveDate,
        principal: &Principal,
    ) -> BudgetResult<Vec<LedgerEntry>> {
        ensure_positive(amount)?;
        if from == to {
            return Err(BudgetControlError::InvalidAmount(format!(
                "cannot reclass {key} into itself",
                key = from
            )));
        }

        let drafts = vec![
            EntryDraft::reclass(from.clone(), Direction::Out, amount, source.clone(), posting_date),
            EntryDraft::reclass(to.clone(), Direction::In, amount, source.clone(), posting_date),
        ];
        let (entries, overruns) = self.append_checked(source, drafts, principal)?;
        if !overruns.is_empty() {
            warn!(source = %source, from = %from, user = %principal.user, "Reclass overrun permitted");
        }
        info!(source = %source, from = %from, to = %to, %amount, "Budget reclassed");
        Ok(entries)
    }

    /// Current availability for the scope a key is controlled by.
    pub fn get_availability(&self, key: &DimensionKey) -> BudgetResult<AvailabilityResult> {
        self.check_availability(key, Decimal::ZERO)
    }

    /// Whether `amount` fits in the scope a key is controlled by.
    ///
    /// The figures are read under the scope lock, so a batch appended by a
    /// concurrent operation is seen either entirely or not at all.
    pub fn check_availability(
        &self,
        key: &DimensionKey,
        amount: Decimal,
    ) -> BudgetResult<AvailabilityResult> {
        let scope = self.scope_of(key);
        self.with_scopes([scope.clone()], || Ok(self.calculator().check(&scope, amount)))
    }

    /// Derived state and per-key positions of one source document.
    #[must_use]
    pub fn document_summary(&self, document: &DocumentRef) -> DocumentSummary {
        let history = self.history(document);
        let positions = positions(&history);
        DocumentSummary {
            document: document.clone(),
            state: derive_state(positions.values()),
            positions: positions.into_values().collect(),
            entry_count: history.len(),
        }
    }

    fn history(&self, document: &DocumentRef) -> Vec<LedgerEntry> {
        self.sources
            .ledger
            .query(&LedgerQuery::new().for_source(document.clone()))
    }

    fn scope_of(&self, key: &DimensionKey) -> BudgetScope {
        BudgetScope::of(key, self.config.control_by_account)
    }

    fn calculator(&self) -> AvailabilityCalculator<'_> {
        AvailabilityCalculator::new(
            self.sources.ledger.as_ref(),
            self.sources.envelopes.as_ref(),
            self.sources.actuals.as_ref(),
        )
    }

    fn resolver(&self) -> DimensionResolver<'_> {
        DimensionResolver::new(
            self.sources.directory.as_ref(),
            &self.sources.calendar,
            self.config.enforce_scope,
            self.config.default_fiscal_period.as_deref(),
        )
    }

    fn slice_document(
        &self,
        document: &SourceDocument,
        context: &EventContext,
    ) -> BudgetResult<Vec<AllocationSlice>> {
        let resolver = self.resolver();
        let slicer = AllocationSlicer::new(
            &resolver,
            self.config.precision(),
            self.config.rounding_tolerance,
        );
        slicer.slice_document(
            &document.dimension_source(),
            &document.lines,
            document.allocation.as_ref(),
            context.default_fiscal_period.as_deref(),
        )
    }

    fn slice_secondary(
        &self,
        document: &SourceDocument,
        secondary: &SecondaryDocument,
        context: &EventContext,
    ) -> BudgetResult<Vec<AllocationSlice>> {
        let resolver = self.resolver();
        let slicer = AllocationSlicer::new(
            &resolver,
            self.config.precision(),
            self.config.rounding_tolerance,
        );
        slicer.slice_secondary(
            &document.dimension_source_at(secondary.posting_date),
            &secondary.lines,
            document.allocation.as_ref(),
            context.default_fiscal_period.as_deref(),
        )
    }

    fn with_document<R>(
        &self,
        document: &DocumentRef,
        work: impl FnOnce() -> BudgetResult<R>,
    ) -> BudgetResult<R> {
        self.document_locks
            .run_exclusive([document.clone()], work)
            .map_err(|LockTimeout(document)| BudgetControlError::DocumentBusy {
                document: document.to_string(),
            })?
    }

    fn with_scopes<R>(
        &self,
        scopes: impl IntoIterator<Item = BudgetScope>,
        work: impl FnOnce() -> BudgetResult<R>,
    ) -> BudgetResult<R> {
        self.sources
            .ledger
            .scope_locks()
            .run_exclusive(scopes, work)
            .map_err(|LockTimeout(scope)| BudgetControlError::LedgerWriteConflict {
                scope: scope.to_string(),
            })?
    }

    /// Net outflow of a batch per control scope.
    fn demand(&self, drafts: &[EntryDraft]) -> BTreeMap<BudgetScope, Decimal> {
        let mut demand: BTreeMap<BudgetScope, Decimal> = BTreeMap::new();
        for draft in drafts {
            let outflow = match draft.direction {
                Direction::Out => draft.amount,
                Direction::In => -draft.amount,
            };
            *demand.entry(self.scope_of(&draft.dimension_key)).or_default() += outflow;
        }
        demand
    }

    /// Appends after checking every scope the batch draws on.
    ///
    /// Fails with `InsufficientBudget` unless the principal holds the
    /// overrun role, in which case the shortfalls are returned instead.
    fn append_checked(
        &self,
        document: &DocumentRef,
        drafts: Vec<EntryDraft>,
        principal: &Principal,
    ) -> BudgetResult<(Vec<LedgerEntry>, Vec<Shortfall>)> {
        let demand = self.demand(&drafts);
        self.with_scopes(demand.keys().cloned(), || {
            let calculator = self.calculator();
            let shortfalls: Vec<Shortfall> = demand
                .iter()
                .filter(|(_, requested)| **requested > Decimal::ZERO)
                .map(|(scope, requested)| calculator.check(scope, *requested))
                .filter(|result| !result.ok)
                .map(|result| Shortfall {
                    scope: result.scope,
                    requested: result.requested,
                    available: result.available,
                    shortfall: result.shortfall,
                })
                .collect();

            if !shortfalls.is_empty() && !principal.has_role(&self.config.overrun_role) {
                warn!(
                    document = %document,
                    user = %principal.user,
                    scopes = shortfalls.len(),
                    "Insufficient budget"
                );
                return Err(BudgetControlError::InsufficientBudget {
                    document: document.to_string(),
                    shortfalls,
                });
            }

            let entries = self.sources.ledger.append(drafts)?;
            Ok((entries, shortfalls))
        })
    }

    /// Appends without gating, reporting scopes the batch drove negative.
    fn append_unchecked(
        &self,
        drafts: Vec<EntryDraft>,
    ) -> BudgetResult<(Vec<LedgerEntry>, Vec<Shortfall>)> {
        let scopes: Vec<BudgetScope> = self.demand(&drafts).into_keys().collect();
        let touches_actuals = drafts.iter().any(|d| {
            matches!(d.entry_type, EntryType::Consumption | EntryType::Reversal)
        });

        self.with_scopes(scopes.clone(), || {
            let calculator = self.calculator();
            let before: Vec<Decimal> = scopes.iter().map(|s| calculator.available(s)).collect();

            let entries = self.sources.ledger.append(drafts)?;
            if touches_actuals {
                for scope in &scopes {
                    self.sources.actuals.invalidate(scope);
                }
            }

            let overruns = scopes
                .iter()
                .zip(before)
                .filter_map(|(scope, before)| {
                    let after = calculator.available(scope);
                    (after < Decimal::ZERO && after < before).then(|| Shortfall {
                        scope: scope.clone(),
                        requested: before - after,
                        available: before,
                        shortfall: -after,
                    })
                })
                .collect();
            Ok((entries, overruns))
        })
    }
}

fn ensure_positive(amount: Decimal) -> BudgetResult<()> {
    if amount <= Decimal::ZERO {
        return Err(BudgetControlError::InvalidAmount(format!(
            "amount must be positive, got {amount}"
        )));
    }
    Ok(())
}
