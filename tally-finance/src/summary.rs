//! Labelled totals printed outside the movement table.
//!
//! Statements repeat their totals in a summary box (`Saldo Anterior`,
//! `Deposits and Additions 2 1,100.00`). For each label of the profile the
//! first row carrying it wins; the value is the first amount printed after
//! the label on that row, or the first integer for counts.
//!
//! [`labelled_values`] is the profile-free variant: every `label amount`
//! line of the document, whether or not a profile names the label.

use regex::Regex;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;
use tracing::debug;

use tally_core::amount::find_amount_literals;
use tally_core::{Amount, BankProfile, ParsedAmount, SummaryMetric};
use tally_ingest::Row;

/// A scraped or computed metric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryValue {
    Amount(Amount),
    Count(u64),
}

impl SummaryValue {
    pub fn amount(&self) -> Option<Amount> {
        match self {
            SummaryValue::Amount(a) => Some(*a),
            SummaryValue::Count(_) => None,
        }
    }

    pub fn count(&self) -> Option<u64> {
        match self {
            SummaryValue::Count(n) => Some(*n),
            SummaryValue::Amount(_) => None,
        }
    }
}

impl fmt::Display for SummaryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SummaryValue::Amount(a) => write!(f, "{a}"),
            SummaryValue::Count(n) => write!(f, "{n}"),
        }
    }
}

impl Serialize for SummaryValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Values found in the document, keyed by metric.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SummaryTotals {
    values: BTreeMap<SummaryMetric, SummaryValue>,
}

impl SummaryTotals {
    pub fn get(&self, metric: SummaryMetric) -> Option<SummaryValue> {
        self.values.get(&metric).copied()
    }

    pub fn amount(&self, metric: SummaryMetric) -> Option<Amount> {
        self.get(metric).and_then(|v| v.amount())
    }

    pub fn insert(&mut self, metric: SummaryMetric, value: SummaryValue) {
        self.values.insert(metric, value);
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SummaryMetric, SummaryValue)> + '_ {
        self.values.iter().map(|(m, v)| (*m, *v))
    }
}

fn count_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b\d{1,6}\b").expect("count regex"))
}

/// Value printed after a label.
fn value_after(text: &str, is_count: bool) -> Option<SummaryValue> {
    if is_count {
        let m = count_re().find(text)?;
        return m.as_str().parse().ok().map(SummaryValue::Count);
    }
    find_amount_literals(text).into_iter().find_map(|(start, end)| {
        ParsedAmount::parse(&text[start..end], true).map(|p| SummaryValue::Amount(p.amount))
    })
}

/// A `label amount` line found anywhere in the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelledValue {
    pub label: String,
    pub value: SummaryValue,
    pub page: usize,
}

/// Text before the first amount, when it reads as a label: starts with a
/// letter and carries no digits (dated movement rows never qualify).
fn label_before(text: &str) -> Option<&str> {
    let label = text.trim().trim_end_matches(':').trim_end();
    let starts_with_letter = label.chars().next().is_some_and(char::is_alphabetic);
    let letters = label.chars().filter(|c| c.is_alphabetic()).count();
    (starts_with_letter && letters >= 3 && !label.chars().any(|c| c.is_ascii_digit())).then_some(label)
}

/// Every row shaped like `label amount`, in document order.
pub fn labelled_values(rows: &[Row]) -> Vec<LabelledValue> {
    let mut out = Vec::new();
    for row in rows {
        let text = row.text();
        let Some((start, amount)) = find_amount_literals(&text)
            .into_iter()
            .find_map(|(start, end)| ParsedAmount::parse(&text[start..end], true).map(|p| (start, p.amount)))
        else {
            continue;
        };
        let Some(label) = label_before(&text[..start]) else {
            continue;
        };
        out.push(LabelledValue {
            label: label.to_string(),
            value: SummaryValue::Amount(amount),
            page: row.page,
        });
    }
    out
}

/// Scrape every summary label of `profile` from `rows`.
pub fn scrape_totals(rows: &[Row], profile: &BankProfile) -> SummaryTotals {
    let mut totals = SummaryTotals::default();
    for row in rows {
        let text = row.text();
        for (metric, re) in profile.summary_labels() {
            if totals.get(metric).is_some() {
                continue;
            }
            let Some(m) = re.find(&text) else {
                continue;
            };
            if let Some(value) = value_after(&text[m.end()..], metric.is_count()) {
                debug!(metric = metric.name(), value = %value, page = row.page, "summary total");
                totals.insert(metric, value);
            }
        }
    }
    totals
}
