//! Column schema: logical fields mapped to horizontal coordinate bands.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Logical column of a movement table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Date,
    Description,
    Reference,
    Debit,
    Credit,
    /// Single signed column holding both debits and credits.
    Amount,
    Balance,
    /// Balance after pending operations settle (`Liquidación`).
    SettlementBalance,
}

/// What kind of text a column carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnRole {
    Date,
    Text,
    Amount,
}

impl Field {
    pub fn role(&self) -> ColumnRole {
        match self {
            Field::Date => ColumnRole::Date,
            Field::Description | Field::Reference => ColumnRole::Text,
            Field::Debit | Field::Credit | Field::Amount | Field::Balance | Field::SettlementBalance => {
                ColumnRole::Amount
            }
        }
    }

    pub fn is_amount(&self) -> bool {
        self.role() == ColumnRole::Amount
    }

    pub fn name(&self) -> &'static str {
        match self {
            Field::Date => "date",
            Field::Description => "description",
            Field::Reference => "reference",
            Field::Debit => "debit",
            Field::Credit => "credit",
            Field::Amount => "amount",
            Field::Balance => "balance",
            Field::SettlementBalance => "settlement_balance",
        }
    }
}

/// A field and the horizontal band it occupies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnRange {
    pub field: Field,
    pub x0: f64,
    pub x1: f64,
}

impl ColumnRange {
    pub fn new(field: Field, x0: f64, x1: f64) -> Self {
        Self { field, x0, x1 }
    }

    pub fn role(&self) -> ColumnRole {
        self.field.role()
    }

    pub fn center(&self) -> f64 {
        (self.x0 + self.x1) / 2.0
    }

    pub fn contains(&self, x: f64, tolerance: f64) -> bool {
        x >= self.x0 - tolerance && x <= self.x1 + tolerance
    }

    fn overlaps(&self, other: &ColumnRange) -> bool {
        self.x0 < other.x1 && other.x0 < self.x1
    }
}

/// Ordered set of column bands for one issuer layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub columns: Vec<ColumnRange>,
    /// Slack applied on both sides of every band when testing a center.
    #[serde(default = "default_column_tolerance")]
    pub tolerance: f64,
}

fn default_column_tolerance() -> f64 {
    2.0
}

impl ColumnSchema {
    pub fn new(columns: Vec<ColumnRange>) -> Self {
        Self {
            columns,
            tolerance: default_column_tolerance(),
        }
    }

    pub fn get(&self, field: Field) -> Option<&ColumnRange> {
        self.columns.iter().find(|c| c.field == field)
    }

    pub fn has(&self, field: Field) -> bool {
        self.get(field).is_some()
    }

    pub fn amount_columns(&self) -> impl Iterator<Item = &ColumnRange> {
        self.columns.iter().filter(|c| c.field.is_amount())
    }

    pub fn other_columns(&self) -> impl Iterator<Item = &ColumnRange> {
        self.columns.iter().filter(|c| !c.field.is_amount())
    }

    /// True when debit and credit are printed in the same band.
    pub fn shares_debit_credit(&self) -> bool {
        if self.has(Field::Amount) {
            return true;
        }
        match (self.get(Field::Debit), self.get(Field::Credit)) {
            (Some(d), Some(c)) => d.x0 == c.x0 && d.x1 == c.x1,
            _ => false,
        }
    }

    /// Structural checks: a date band, at least one amount band, sane
    /// ranges, and no overlap between two non-amount bands.
    pub fn validate(&self, profile: &str) -> Result<()> {
        if !self.has(Field::Date) {
            return Err(Error::MissingColumn {
                profile: profile.to_string(),
                column: "date",
            });
        }
        if self.amount_columns().next().is_none() {
            return Err(Error::MissingColumn {
                profile: profile.to_string(),
                column: "debit/credit/amount",
            });
        }

        for c in &self.columns {
            if c.x1 <= c.x0 {
                return Err(Error::InvalidRange {
                    profile: profile.to_string(),
                    column: c.field.name().to_string(),
                    x0: c.x0,
                    x1: c.x1,
                });
            }
        }

        let text: Vec<&ColumnRange> = self.other_columns().collect();
        for (i, a) in text.iter().enumerate() {
            for b in &text[i + 1..] {
                if a.overlaps(b) {
                    return Err(Error::OverlappingColumns {
                        profile: profile.to_string(),
                        first: a.field.name().to_string(),
                        second: b.field.name().to_string(),
                    });
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> ColumnSchema {
        ColumnSchema::new(vec![
            ColumnRange::new(Field::Date, 0.0, 60.0),
            ColumnRange::new(Field::Description, 60.0, 300.0),
            ColumnRange::new(Field::Debit, 300.0, 380.0),
            ColumnRange::new(Field::Credit, 380.0, 460.0),
            ColumnRange::new(Field::Balance, 460.0, 540.0),
        ])
    }

    #[test]
    fn test_valid_schema() {
        assert!(schema().validate("t").is_ok());
        assert!(!schema().shares_debit_credit());
    }

    #[test]
    fn test_missing_date_is_fatal() {
        let mut s = schema();
        s.columns.retain(|c| c.field != Field::Date);
        let err = s.validate("t").unwrap_err();
        assert!(matches!(err, Error::MissingColumn { column: "date", .. }));
    }

    #[test]
    fn test_text_overlap_rejected_amount_overlap_allowed() {
        let mut s = schema();
        // amount nested in the description band is fine
        s.columns.push(ColumnRange::new(Field::Amount, 250.0, 320.0));
        assert!(s.validate("t").is_ok());

        s.columns.push(ColumnRange::new(Field::Reference, 40.0, 90.0));
        assert!(matches!(
            s.validate("t").unwrap_err(),
            Error::OverlappingColumns { .. }
        ));
    }

    #[test]
    fn test_inverted_range() {
        let mut s = schema();
        s.columns[1] = ColumnRange::new(Field::Description, 300.0, 60.0);
        assert!(matches!(s.validate("t").unwrap_err(), Error::InvalidRange { .. }));
    }

    #[test]
    fn test_shared_debit_credit_detection() {
        let s = ColumnSchema::new(vec![
            ColumnRange::new(Field::Date, 0.0, 60.0),
            ColumnRange::new(Field::Debit, 300.0, 380.0),
            ColumnRange::new(Field::Credit, 300.0, 380.0),
        ]);
        assert!(s.shares_debit_credit());
    }
}
