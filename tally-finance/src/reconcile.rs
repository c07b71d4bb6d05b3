//! Reconciliation Reporter.
//!
//! Compares totals computed from the extracted records with the totals
//! the document states about itself. Amounts are compared in cents with an
//! inclusive tolerance; the movement count must match exactly. A metric the
//! document does not state is skipped. Mismatches are reported and logged,
//! never fatal.

use serde::Serialize;
use std::fmt;
use tracing::{info, warn};

use tally_core::{Amount, BankProfile, Field, MovementRecord, Side, SummaryMetric};

use crate::summary::{SummaryTotals, SummaryValue};

/// Metrics checked, in report order.
pub const CHECKED_METRICS: [SummaryMetric; 4] = [
    SummaryMetric::TotalDebits,
    SummaryMetric::TotalCredits,
    SummaryMetric::FinalBalance,
    SummaryMetric::MovementCount,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricCheck {
    pub metric: SummaryMetric,
    pub found: Option<SummaryValue>,
    pub computed: Option<SummaryValue>,
    pub difference: Option<SummaryValue>,
    pub status: CheckStatus,
}

/// Totals derived from the records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ComputedTotals {
    pub total_debits: Amount,
    pub total_credits: Amount,
    pub final_balance: Option<Amount>,
    pub movement_count: u64,
}

impl ComputedTotals {
    pub fn get(&self, metric: SummaryMetric) -> Option<SummaryValue> {
        match metric {
            SummaryMetric::TotalDebits => Some(SummaryValue::Amount(self.total_debits)),
            SummaryMetric::TotalCredits => Some(SummaryValue::Amount(self.total_credits)),
            SummaryMetric::FinalBalance => self.final_balance.map(SummaryValue::Amount),
            SummaryMetric::MovementCount => Some(SummaryValue::Count(self.movement_count)),
            SummaryMetric::OpeningBalance => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciliationReport {
    pub profile: String,
    pub tolerance: Amount,
    pub computed: ComputedTotals,
    pub checks: Vec<MetricCheck>,
}

impl ReconciliationReport {
    /// No check failed (skipped checks do not count against it).
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|c| c.status != CheckStatus::Fail)
    }

    pub fn failures(&self) -> impl Iterator<Item = &MetricCheck> {
        self.checks.iter().filter(|c| c.status == CheckStatus::Fail)
    }

    pub fn check(&self, metric: SummaryMetric) -> Option<&MetricCheck> {
        self.checks.iter().find(|c| c.metric == metric)
    }
}

impl fmt::Display for ReconciliationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Reconciliation ({}, tolerance {})", self.profile, self.tolerance)?;
        for c in &self.checks {
            let show = |v: &Option<SummaryValue>| v.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string());
            let status = match c.status {
                CheckStatus::Pass => "ok",
                CheckStatus::Fail => "MISMATCH",
                CheckStatus::Skipped => "skipped",
            };
            writeln!(
                f,
                "  {:<16} found {:>14}  computed {:>14}  diff {:>10}  {}",
                c.metric.name(),
                show(&c.found),
                show(&c.computed),
                show(&c.difference),
                status
            )?;
        }
        write!(f, "  result: {}", if self.passed() { "PASS" } else { "FAIL" })
    }
}

/// Sum the records. With an opening balance, the final balance moves by
/// the profile's balance direction: up with credits on deposit accounts, up
/// with debits on credit cards. Without one, the last balance printed on a
/// record.
pub fn compute_totals(records: &[MovementRecord], profile: &BankProfile, opening: Option<Amount>) -> ComputedTotals {
    let value = |r: &MovementRecord, f: Field| r.amount_value(f, profile.require_decimals).map(|a| a.abs());

    let total_debits: Amount = records.iter().filter_map(|r| value(r, Field::Debit)).sum();
    let total_credits: Amount = records.iter().filter_map(|r| value(r, Field::Credit)).sum();
    let movement_count = records
        .iter()
        .filter(|r| r.debit.is_some() || r.credit.is_some())
        .count() as u64;

    let final_balance = match opening {
        Some(open) => Some(match profile.balance_increases_with {
            Side::Credit => open + total_credits - total_debits,
            Side::Debit => open + total_debits - total_credits,
        }),
        None => records
            .iter()
            .rev()
            .find_map(|r| r.amount_value(Field::Balance, profile.require_decimals)),
    };

    ComputedTotals {
        total_debits,
        total_credits,
        final_balance,
        movement_count,
    }
}

fn check(metric: SummaryMetric, found: Option<SummaryValue>, computed: Option<SummaryValue>, tolerance: Amount) -> MetricCheck {
    let (difference, status) = match (found, computed) {
        (Some(SummaryValue::Amount(f)), Some(SummaryValue::Amount(c))) => {
            // Totals of one side are often printed signed (`-45.00`).
            let f = match metric {
                SummaryMetric::TotalDebits | SummaryMetric::TotalCredits => f.abs(),
                _ => f,
            };
            let diff = c - f;
            let status = if diff.abs() <= tolerance { CheckStatus::Pass } else { CheckStatus::Fail };
            (Some(SummaryValue::Amount(diff)), status)
        }
        (Some(SummaryValue::Count(f)), Some(SummaryValue::Count(c))) => {
            let status = if f == c { CheckStatus::Pass } else { CheckStatus::Fail };
            (Some(SummaryValue::Count(f.abs_diff(c))), status)
        }
        _ => (None, CheckStatus::Skipped),
    };
    MetricCheck {
        metric,
        found,
        computed,
        difference,
        status,
    }
}

/// Build the report. `tolerance` is in currency units (`0.01`).
pub fn reconcile(
    records: &[MovementRecord],
    found: &SummaryTotals,
    profile: &BankProfile,
    tolerance: f64,
) -> ReconciliationReport {
    let tolerance = Amount::from_units(tolerance);
    let computed = compute_totals(records, profile, found.amount(SummaryMetric::OpeningBalance));

    let checks: Vec<MetricCheck> = CHECKED_METRICS
        .iter()
        .map(|&m| check(m, found.get(m), computed.get(m), tolerance))
        .collect();

    for c in checks.iter().filter(|c| c.status == CheckStatus::Fail) {
        warn!(
            metric = c.metric.name(),
            found = %c.found.map(|v| v.to_string()).unwrap_or_default(),
            computed = %c.computed.map(|v| v.to_string()).unwrap_or_default(),
            "reconciliation mismatch"
        );
    }

    let report = ReconciliationReport {
        profile: profile.name.clone(),
        tolerance,
        computed,
        checks,
    };
    info!(profile = %report.profile, passed = report.passed(), "reconciliation done");
    report
}
