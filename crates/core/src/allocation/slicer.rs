//! Slicing of document amounts into per-key fragments.
//!
//! Every slice is rounded to the currency's minor unit. The rounding residual
//! is folded into the last slice so the slices always sum to the rounded
//! document total exactly.

use rust_decimal::prelude::*;

use super::types::{AllocationDocument, AllocationSlice, AllocationStatus, AmountLine};
use crate::dimension::{DimensionResolver, DimensionSource};
use crate::error::{BudgetControlError, BudgetResult};

/// Splits document amounts into allocation slices.
pub struct AllocationSlicer<'a> {
    resolver: &'a DimensionResolver<'a>,
    precision: u32,
    tolerance: Decimal,
}

impl<'a> AllocationSlicer<'a> {
    /// Creates a slicer rounding to `precision` decimal places.
    #[must_use]
    pub fn new(resolver: &'a DimensionResolver<'a>, precision: u32, tolerance: Decimal) -> Self {
        Self {
            resolver,
            precision,
            tolerance,
        }
    }

    /// Rounds an amount to the slicer's precision.
    #[must_use]
    pub fn round(&self, amount: Decimal) -> Decimal {
        amount.round_dp_with_strategy(self.precision, RoundingStrategy::MidpointNearestEven)
    }

    /// Slices a source document's lines.
    ///
    /// Uses ratio mode when `allocation` is given, direct mode otherwise.
    /// The allocation must be approved and its total must match the
    /// document total within tolerance.
    ///
    /// `template` supplies the document-level dimensions; its account and
    /// cost center are replaced per line.
    pub fn slice_document(
        &self,
        template: &DimensionSource<'_>,
        lines: &[AmountLine],
        allocation: Option<&AllocationDocument>,
        caller_default: Option<&str>,
    ) -> BudgetResult<Vec<AllocationSlice>> {
        let total = self.checked_total(lines)?;
        match allocation {
            None => self.slice_direct(template, lines, total, caller_default),
            Some(allocation) => {
                self.ensure_ready(allocation)?;
                if (allocation.total - total).abs() > self.tolerance {
                    return Err(not_ready(
                        allocation,
                        format!(
                            "allocation total {} does not match document total {total}",
                            allocation.total
                        ),
                    ));
                }
                self.slice_ratio(template, lines, allocation, total, caller_default)
            }
        }
    }

    /// Slices a secondary document (e.g. an invoice) of an allocated source.
    ///
    /// The secondary amount may differ from the source total, so only the
    /// allocation's own consistency is checked.
    pub fn slice_secondary(
        &self,
        template: &DimensionSource<'_>,
        lines: &[AmountLine],
        allocation: Option<&AllocationDocument>,
        caller_default: Option<&str>,
    ) -> BudgetResult<Vec<AllocationSlice>> {
        let total = self.checked_total(lines)?;
        match allocation {
            None => self.slice_direct(template, lines, total, caller_default),
            Some(allocation) => {
                self.ensure_ready(allocation)?;
                self.slice_ratio(template, lines, allocation, total, caller_default)
            }
        }
    }

    /// Checks the allocation can be used for ratio slicing.
    pub fn ensure_ready(&self, allocation: &AllocationDocument) -> BudgetResult<()> {
        if allocation.status != AllocationStatus::Approved {
            return Err(not_ready(
                allocation,
                format!("status is {:?}, expected Approved", allocation.status),
            ));
        }
        if allocation.lines.is_empty() {
            return Err(not_ready(allocation, "allocation has no lines".to_string()));
        }
        if allocation.total <= Decimal::ZERO {
            return Err(not_ready(
                allocation,
                format!("allocation total {} is not positive", allocation.total),
            ));
        }
        if let Some(line) = allocation.lines.iter().find(|l| l.amount.is_sign_negative()) {
            return Err(not_ready(
                allocation,
                format!("line for {} has negative amount", line.cost_center),
            ));
        }
        let lines_total = allocation.lines_total();
        if (lines_total - allocation.total).abs() > self.tolerance {
            return Err(not_ready(
                allocation,
                format!(
                    "lines sum to {lines_total} but allocation total is {}",
                    allocation.total
                ),
            ));
        }
        Ok(())
    }

    fn checked_total(&self, lines: &[AmountLine]) -> BudgetResult<Decimal> {
        if let Some(line) = lines
            .iter()
            .find(|l| l.amount.is_sign_negative() && !l.amount.is_zero())
        {
            return Err(BudgetControlError::InvalidAmount(format!(
                "line for account {} is negative: {}",
                line.account, line.amount
            )));
        }
        Ok(self.round(lines.iter().map(|l| l.amount).sum()))
    }

    fn slice_direct(
        &self,
        template: &DimensionSource<'_>,
        lines: &[AmountLine],
        total: Decimal,
        caller_default: Option<&str>,
    ) -> BudgetResult<Vec<AllocationSlice>> {
        let mut slices = Vec::with_capacity(lines.len());
        for line in lines {
            let source = DimensionSource {
                account: &line.account,
                ..*template
            };
            slices.push(AllocationSlice {
                dimension_key: self.resolver.resolve(&source, caller_default)?,
                amount: self.round(line.amount),
            });
        }
        Ok(settle(slices, total))
    }

    fn slice_ratio(
        &self,
        template: &DimensionSource<'_>,
        lines: &[AmountLine],
        allocation: &AllocationDocument,
        total: Decimal,
        caller_default: Option<&str>,
    ) -> BudgetResult<Vec<AllocationSlice>> {
        let mut slices = Vec::with_capacity(lines.len() * allocation.lines.len());
        for line in lines {
            for target in &allocation.lines {
                let weight = target.amount / allocation.total;
                let source = DimensionSource {
                    cost_center: &target.cost_center,
                    account: &line.account,
                    project: target.project.as_deref().or(template.project),
                    branch: target.branch.as_deref().or(template.branch),
                    ..*template
                };
                slices.push(AllocationSlice {
                    dimension_key: self.resolver.resolve(&source, caller_default)?,
                    amount: self.round(line.amount * weight),
                });
            }
        }
        Ok(settle(slices, total))
    }
}

/// Folds the rounding residual into the last slice and drops empty slices.
///
/// If the last slice cannot absorb a negative residual, the largest slice
/// takes it instead so no slice goes below zero.
fn settle(mut slices: Vec<AllocationSlice>, total: Decimal) -> Vec<AllocationSlice> {
    let residual = total - slices.iter().map(|s| s.amount).sum::<Decimal>();
    if !residual.is_zero() {
        let last = slices.len().checked_sub(1);
        let target = match last {
            Some(i) if slices[i].amount + residual >= Decimal::ZERO => Some(i),
            _ => slices
                .iter()
                .enumerate()
                .max_by_key(|(_, s)| s.amount)
                .map(|(i, _)| i),
        };
        if let Some(i) = target {
            slices[i].amount += residual;
        }
    }
    slices.retain(|s| !s.amount.is_zero());
    slices
}

fn not_ready(allocation: &AllocationDocument, reason: String) -> BudgetControlError {
    BudgetControlError::AllocationNotReady {
        allocation: allocation.name.clone(),
        reason,
    }
}
