//! Capital One US credit card statement.
//!
//! Expected table:
//!   Trans Date     Post Date      Description                        Amount
//!   Jul 20         Jul 22         H-E-B #455SAN MARCOSTX             $5.82
//!   Jul 28         Jul 29         CAPITAL ONE AUTOPAY PYMT           - $14.05
//!
//! Charges are printed positive and payments negative, so negative amounts
//! are credits. The post date lands in `settlement_date`.

use tally_core::{
    ColumnRange, DateConfig, DateShape, DebitCreditRule, DescriptionPolicy, Field, ProfileConfig, SectionBoundary,
    Side, SummaryLabel, SummaryMetric,
};

use super::{lit, re};

pub fn config() -> ProfileConfig {
    ProfileConfig {
        name: "capital_one_us".to_string(),
        date: DateConfig {
            shape: DateShape::MonthNameDay,
            pattern: None,
            ocr_digit_repair: false,
        },
        columns: vec![
            ColumnRange::new(Field::Date, 20.0, 120.0),
            ColumnRange::new(Field::Description, 120.0, 430.0),
            ColumnRange::new(Field::Amount, 430.0, 520.0),
        ],
        column_tolerance: 2.0,
        section: SectionBoundary {
            start: vec![
                lit("Trans Date Post Date Description Amount"),
                re(r"(?i)trans\s*date\s+post\s*date"),
            ],
            end: vec![re(r"(?i)total\s+transactions\s+for\s+this\s+period")],
            skip_header_row: true,
        },
        debit_credit: DebitCreditRule::SharedBySign {
            negative_is: Side::Credit,
        },
        description: DescriptionPolicy::default(),
        lenient_date: None,
        allow_undated_opening_row: false,
        require_decimals: true,
        row_tolerance: 6.0,
        split_tolerance: 2.0,
        fragment_gap: 4.0,
        noise: vec![re(r"(?i)page\s+\d+\s+of\s+\d+")],
        reference_pattern: None,
        summary: vec![
            SummaryLabel {
                metric: SummaryMetric::OpeningBalance,
                pattern: lit("Previous Balance"),
            },
            SummaryLabel {
                metric: SummaryMetric::TotalCredits,
                pattern: re(r"(?i)payments\s+and\s+credits|payments"),
            },
            SummaryLabel {
                metric: SummaryMetric::TotalDebits,
                pattern: re(r"(?i)purchases\s+and\s+adjustments|transactions"),
            },
            SummaryLabel {
                metric: SummaryMetric::FinalBalance,
                pattern: lit("New Balance"),
            },
        ],
        balance_increases_with: Side::Debit,
    }
}
