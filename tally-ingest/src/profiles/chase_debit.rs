//! Chase checking statement.
//!
//! Expected table:
//!   TRANSACTION DETAIL
//!          DATE    DESCRIPTION                                AMOUNT     BALANCE
//!                  Beginning Balance                                      $68.70
//!          04/22   Discover E-Payment 8148 Web ID: 123        -15.00      53.70
//!          04/23   PAYROLL ACME INC                           100.00     153.70
//!                  Ending Balance                                        $153.70
//!
//! One signed amount column; negative amounts are debits. The beginning
//! balance row has no date and is kept as an opening record.

use tally_core::{
    ColumnRange, DateConfig, DateShape, DebitCreditRule, DescriptionPolicy, Field, ProfileConfig, SectionBoundary,
    Side, SummaryLabel, SummaryMetric,
};

use super::{lit, re};

pub fn config() -> ProfileConfig {
    ProfileConfig {
        name: "chase_debit".to_string(),
        date: DateConfig {
            shape: DateShape::MonthDay,
            pattern: None,
            ocr_digit_repair: false,
        },
        columns: vec![
            ColumnRange::new(Field::Date, 20.0, 70.0),
            ColumnRange::new(Field::Description, 70.0, 400.0),
            ColumnRange::new(Field::Amount, 400.0, 470.0),
            ColumnRange::new(Field::Balance, 470.0, 540.0),
        ],
        column_tolerance: 2.0,
        section: SectionBoundary {
            start: vec![lit("TRANSACTION DETAIL"), re(r"(?i)transact\w*\s*deta\w*")],
            end: vec![lit("Ending Balance")],
            skip_header_row: true,
        },
        debit_credit: DebitCreditRule::SharedBySign {
            negative_is: Side::Debit,
        },
        description: DescriptionPolicy::default(),
        lenient_date: None,
        allow_undated_opening_row: true,
        require_decimals: true,
        row_tolerance: 6.0,
        split_tolerance: 2.0,
        fragment_gap: 4.0,
        noise: vec![
            re(r"(?i)^\s*date\s+description"),
            re(r"(?i)page\s+\d+\s+of\s+\d+"),
            re(r"\*(?:start|end)\*"),
        ],
        reference_pattern: None,
        summary: vec![
            SummaryLabel {
                metric: SummaryMetric::OpeningBalance,
                pattern: lit("Beginning Balance"),
            },
            SummaryLabel {
                metric: SummaryMetric::TotalCredits,
                pattern: lit("Deposits and Additions"),
            },
            SummaryLabel {
                metric: SummaryMetric::TotalDebits,
                pattern: re(r"(?i)(?:electronic\s+)?withdrawals"),
            },
            SummaryLabel {
                metric: SummaryMetric::FinalBalance,
                pattern: lit("Ending Balance"),
            },
        ],
        balance_increases_with: Side::Credit,
    }
}
