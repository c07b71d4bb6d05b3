//! Bank profiles.
//!
//! A [`ProfileConfig`] is plain data (TOML/JSON). [`BankProfile::from_config`]
//! validates it and compiles every pattern once; the compiled profile is then
//! passed by reference to each engine stage so nothing downstream branches on
//! an issuer name.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::date::{DateGrammar, DateShape};
use crate::error::{Error, Result};
use crate::schema::{ColumnRange, ColumnSchema, Field};
use crate::section::{SectionBoundary, SectionMatcher, SectionPattern};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateConfig {
    pub shape: DateShape,
    /// Regular expression for [`DateShape::Custom`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Repair digit/letter confusions (`O2` -> `02`) in the date column.
    #[serde(default)]
    pub ocr_digit_repair: bool,
}

/// Debit or credit side of a movement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    #[default]
    Debit,
    Credit,
}

impl Side {
    pub fn field(&self) -> Field {
        match self {
            Side::Debit => Field::Debit,
            Side::Credit => Field::Credit,
        }
    }

    pub fn other(&self) -> Side {
        match self {
            Side::Debit => Side::Credit,
            Side::Credit => Side::Debit,
        }
    }
}

/// How an issuer tells debits from credits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DebitCreditRule {
    /// Separate debit and credit columns.
    #[default]
    Separate,
    /// One physical column; the sign decides.
    SharedBySign {
        #[serde(default)]
        negative_is: Side,
    },
    /// The side is given by a marker printed elsewhere on the line
    /// (`CR`, `DR`, `+`, `-`).
    LineMarker {
        debit_markers: Vec<String>,
        credit_markers: Vec<String>,
        #[serde(default)]
        default: Side,
    },
}

impl DebitCreditRule {
    /// Side for a signed amount in a shared column.
    pub fn side_for_sign(&self, negative: bool) -> Option<Side> {
        match self {
            DebitCreditRule::SharedBySign { negative_is } => {
                Some(if negative { *negative_is } else { negative_is.other() })
            }
            _ => None,
        }
    }

    /// Which side a standalone word marks, if any.
    pub fn marker_side(&self, word: &str) -> Option<Side> {
        let DebitCreditRule::LineMarker {
            debit_markers,
            credit_markers,
            ..
        } = self
        else {
            return None;
        };
        let w = word.trim();
        if debit_markers.iter().any(|m| m.eq_ignore_ascii_case(w)) {
            Some(Side::Debit)
        } else if credit_markers.iter().any(|m| m.eq_ignore_ascii_case(w)) {
            Some(Side::Credit)
        } else {
            None
        }
    }

    pub fn is_shared(&self) -> bool {
        matches!(self, DebitCreditRule::SharedBySign { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptionPolicy {
    /// Minimum alphanumeric characters for a description to count.
    #[serde(default = "default_min_chars")]
    pub min_chars: usize,
    /// Accept short/empty descriptions when date and amount are valid.
    #[serde(default)]
    pub allow_empty: bool,
}

fn default_min_chars() -> usize {
    2
}

impl Default for DescriptionPolicy {
    fn default() -> Self {
        Self {
            min_chars: default_min_chars(),
            allow_empty: false,
        }
    }
}

/// Opt-in acceptance of rows whose date is present but unparseable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LenientDate {
    #[serde(default = "default_lenient_chars")]
    pub min_description_chars: usize,
}

fn default_lenient_chars() -> usize {
    6
}

impl Default for LenientDate {
    fn default() -> Self {
        Self {
            min_description_chars: default_lenient_chars(),
        }
    }
}

/// Totals printed outside the movement table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryMetric {
    TotalDebits,
    TotalCredits,
    OpeningBalance,
    FinalBalance,
    MovementCount,
}

impl SummaryMetric {
    pub fn is_count(&self) -> bool {
        matches!(self, SummaryMetric::MovementCount)
    }

    pub fn name(&self) -> &'static str {
        match self {
            SummaryMetric::TotalDebits => "total_debits",
            SummaryMetric::TotalCredits => "total_credits",
            SummaryMetric::OpeningBalance => "opening_balance",
            SummaryMetric::FinalBalance => "final_balance",
            SummaryMetric::MovementCount => "movement_count",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryLabel {
    pub metric: SummaryMetric,
    pub pattern: SectionPattern,
}

/// Serializable issuer profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileConfig {
    pub name: String,
    pub date: DateConfig,
    pub columns: Vec<ColumnRange>,
    #[serde(default = "default_column_tolerance")]
    pub column_tolerance: f64,
    pub section: SectionBoundary,
    #[serde(default)]
    pub debit_credit: DebitCreditRule,
    #[serde(default)]
    pub description: DescriptionPolicy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lenient_date: Option<LenientDate>,
    /// Keep a leading undated row with amounts (opening balance) as a record.
    #[serde(default)]
    pub allow_undated_opening_row: bool,
    #[serde(default = "default_true")]
    pub require_decimals: bool,
    /// Max vertical distance from a row's anchor token. Must exceed
    /// `split_tolerance`, otherwise collapsed rows can never be split.
    #[serde(default = "default_row_tolerance")]
    pub row_tolerance: f64,
    /// Vertical distance under which two sub-rows are the same line.
    #[serde(default = "default_split_tolerance")]
    pub split_tolerance: f64,
    /// Max horizontal gap between two fragments of one amount.
    #[serde(default = "default_fragment_gap")]
    pub fragment_gap: f64,
    #[serde(default)]
    pub noise: Vec<SectionPattern>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_pattern: Option<String>,
    #[serde(default)]
    pub summary: Vec<SummaryLabel>,
    /// Side whose movements raise the balance: credits on deposit
    /// accounts, debits (purchases) on credit cards.
    #[serde(default = "default_balance_side")]
    pub balance_increases_with: Side,
}

fn default_balance_side() -> Side {
    Side::Credit
}

fn default_true() -> bool {
    true
}

fn default_column_tolerance() -> f64 {
    2.0
}

fn default_row_tolerance() -> f64 {
    6.0
}

fn default_split_tolerance() -> f64 {
    2.0
}

fn default_fragment_gap() -> f64 {
    4.0
}

/// Validated, compiled profile.
#[derive(Debug, Clone)]
pub struct BankProfile {
    pub name: String,
    pub schema: ColumnSchema,
    pub date: DateGrammar,
    pub ocr_digit_repair: bool,
    pub section: SectionMatcher,
    pub debit_credit: DebitCreditRule,
    pub description: DescriptionPolicy,
    pub lenient_date: Option<LenientDate>,
    pub allow_undated_opening_row: bool,
    pub require_decimals: bool,
    pub row_tolerance: f64,
    pub split_tolerance: f64,
    pub fragment_gap: f64,
    pub balance_increases_with: Side,
    noise: Vec<Regex>,
    reference: Option<Regex>,
    summary: Vec<(SummaryMetric, Regex)>,
}

impl BankProfile {
    pub fn from_config(cfg: &ProfileConfig) -> Result<Self> {
        let schema = ColumnSchema {
            columns: cfg.columns.clone(),
            tolerance: cfg.column_tolerance,
        };
        schema.validate(&cfg.name)?;

        if cfg.section.start.is_empty() {
            return Err(Error::NoStartPattern(cfg.name.clone()));
        }
        if cfg.row_tolerance <= cfg.split_tolerance {
            return Err(Error::Tolerances {
                profile: cfg.name.clone(),
                row: cfg.row_tolerance,
                split: cfg.split_tolerance,
            });
        }
        if cfg.date.shape == DateShape::Custom && cfg.date.pattern.is_none() {
            return Err(Error::MissingDatePattern {
                profile: cfg.name.clone(),
            });
        }

        Ok(Self {
            name: cfg.name.clone(),
            schema,
            date: DateGrammar::new(cfg.date.shape.clone(), cfg.date.pattern.as_deref())?,
            ocr_digit_repair: cfg.date.ocr_digit_repair,
            section: SectionMatcher::new(&cfg.section)?,
            debit_credit: cfg.debit_credit.clone(),
            description: cfg.description.clone(),
            lenient_date: cfg.lenient_date.clone(),
            allow_undated_opening_row: cfg.allow_undated_opening_row,
            require_decimals: cfg.require_decimals,
            row_tolerance: cfg.row_tolerance,
            split_tolerance: cfg.split_tolerance,
            fragment_gap: cfg.fragment_gap,
            balance_increases_with: cfg.balance_increases_with,
            noise: cfg.noise.iter().map(SectionPattern::compile).collect::<Result<_>>()?,
            reference: cfg
                .reference_pattern
                .as_deref()
                .map(Regex::new)
                .transpose()?,
            summary: cfg
                .summary
                .iter()
                .map(|l| Ok((l.metric, l.pattern.compile()?)))
                .collect::<Result<_>>()?,
        })
    }

    /// Debit and credit share one band, either declared by the rule or by
    /// identical ranges in the schema.
    pub fn shares_debit_credit(&self) -> bool {
        self.debit_credit.is_shared() || self.schema.shares_debit_credit()
    }

    /// Boilerplate (legal footers, page banners) that is never a movement.
    pub fn is_noise(&self, text: &str) -> bool {
        self.noise.iter().any(|re| re.is_match(text))
    }

    /// Byte range of the first reference code in `text`.
    pub fn find_reference(&self, text: &str) -> Option<(usize, usize)> {
        self.reference
            .as_ref()
            .and_then(|re| re.find(text))
            .map(|m| (m.start(), m.end()))
    }

    /// Summary labels in configured order.
    pub fn summary_labels(&self) -> impl Iterator<Item = (SummaryMetric, &Regex)> {
        self.summary.iter().map(|(m, re)| (*m, re))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROFILE_TOML: &str = r#"
name = "demo"
row_tolerance = 4.0
noise = ["Estimado Cliente", { regex = "(?i)p[aá]gina \\d+ de \\d+" }]
reference_pattern = "(?i)ref\\.?\\s*[A-Za-z0-9-]{3,}"

[date]
shape = "day_month_name"
ocr_digit_repair = true

[[columns]]
field = "date"
x0 = 0.0
x1 = 60.0

[[columns]]
field = "description"
x0 = 60.0
x1 = 300.0

[[columns]]
field = "amount"
x0 = 300.0
x1 = 380.0

[section]
start = ["Detalle de Movimientos", { regex = "(?i)deta..e de mov" }]
end = ["Total de Movimientos"]

[debit_credit]
kind = "shared_by_sign"
negative_is = "debit"

[[summary]]
metric = "total_debits"
pattern = "Total cargos"
"#;

    #[test]
    fn test_profile_from_toml() {
        let cfg: ProfileConfig = toml::from_str(PROFILE_TOML).unwrap();
        assert_eq!(cfg.split_tolerance, 2.0);
        assert_eq!(cfg.balance_increases_with, Side::Credit);
        assert!(cfg.require_decimals);
        let p = BankProfile::from_config(&cfg).unwrap();
        assert!(p.shares_debit_credit());
        assert!(p.ocr_digit_repair);
        assert!(p.is_noise("Pagina 2 de 5"));
        assert!(p.is_noise("ESTIMADO CLIENTE: le informamos"));
        assert!(!p.is_noise("02 ENE OXXO"));
        assert_eq!(p.find_reference("SPEI Ref. 00912 X"), Some((5, 15)));
        assert_eq!(p.summary_labels().count(), 1);
    }

    #[test]
    fn test_missing_start_pattern() {
        let mut cfg: ProfileConfig = toml::from_str(PROFILE_TOML).unwrap();
        cfg.section.start.clear();
        assert!(matches!(
            BankProfile::from_config(&cfg).unwrap_err(),
            Error::NoStartPattern(_)
        ));
    }

    #[test]
    fn test_row_tolerance_must_exceed_split_tolerance() {
        let mut cfg: ProfileConfig = toml::from_str(PROFILE_TOML).unwrap();
        cfg.row_tolerance = 2.0;
        assert!(matches!(
            BankProfile::from_config(&cfg).unwrap_err(),
            Error::Tolerances { .. }
        ));
        cfg.row_tolerance = 2.5;
        assert!(BankProfile::from_config(&cfg).is_ok());
    }

    #[test]
    fn test_balance_direction_from_toml() {
        let text = format!("balance_increases_with = \"debit\"\n{PROFILE_TOML}");
        let cfg: ProfileConfig = toml::from_str(&text).unwrap();
        assert_eq!(BankProfile::from_config(&cfg).unwrap().balance_increases_with, Side::Debit);
    }

    #[test]
    fn test_custom_date_requires_pattern() {
        let mut cfg: ProfileConfig = toml::from_str(PROFILE_TOML).unwrap();
        cfg.date.shape = DateShape::Custom;
        assert!(matches!(
            BankProfile::from_config(&cfg).unwrap_err(),
            Error::MissingDatePattern { .. }
        ));
    }

    #[test]
    fn test_rule_sides() {
        let shared = DebitCreditRule::SharedBySign {
            negative_is: Side::Debit,
        };
        assert_eq!(shared.side_for_sign(true), Some(Side::Debit));
        assert_eq!(shared.side_for_sign(false), Some(Side::Credit));

        let marker = DebitCreditRule::LineMarker {
            debit_markers: vec!["DR".into(), "-".into()],
            credit_markers: vec!["CR".into(), "+".into()],
            default: Side::Debit,
        };
        assert_eq!(marker.marker_side("cr"), Some(Side::Credit));
        assert_eq!(marker.marker_side("-"), Some(Side::Debit));
        assert_eq!(marker.marker_side("tienda"), None);
        assert_eq!(marker.side_for_sign(true), None);
    }
}
