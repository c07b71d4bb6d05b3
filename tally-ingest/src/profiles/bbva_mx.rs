//! BBVA Mexico checking statement.
//!
//! Expected table (coordinates in PDF points):
//!   Detalle de Movimientos Realizados
//!                                                               SALDO
//!   FECHA OPER LIQ   COD. DESCRIPCION    CARGOS   ABONOS    OPERACION LIQUIDACION
//!   01/JUN  01/JUN   SPEI RECIBIDO Ref. 00912     1,200.00  5,000.00  5,000.00
//!                    BANCO AZTECA
//!   02/JUN  02/JUN   PAGO TARJETA      150.00               4,850.00  4,850.00
//!
//! Operation and settlement dates share the date band; the operation and
//! settlement balances get a band each. Scans are common, so date digit
//! repair and the lenient date path are on.

use tally_core::{
    ColumnRange, DateConfig, DateShape, DebitCreditRule, DescriptionPolicy, Field, LenientDate, ProfileConfig,
    SectionBoundary, Side, SummaryLabel, SummaryMetric,
};

use super::{lit, re};

pub fn config() -> ProfileConfig {
    ProfileConfig {
        name: "bbva_mx".to_string(),
        date: DateConfig {
            shape: DateShape::DayMonthName,
            pattern: None,
            ocr_digit_repair: true,
        },
        columns: vec![
            ColumnRange::new(Field::Date, 15.0, 110.0),
            ColumnRange::new(Field::Description, 110.0, 330.0),
            ColumnRange::new(Field::Debit, 330.0, 400.0),
            ColumnRange::new(Field::Credit, 400.0, 470.0),
            ColumnRange::new(Field::Balance, 470.0, 515.0),
            ColumnRange::new(Field::SettlementBalance, 515.0, 570.0),
        ],
        column_tolerance: 2.0,
        section: SectionBoundary {
            start: vec![
                lit("Detalle de Movimientos Realizados"),
                re(r"(?i)deta[l1i|]{2}e\s*de\s*movim"),
                re(r"(?i)fecha\s+oper\s+liq"),
            ],
            end: vec![lit("Total de Movimientos"), re(r"(?i)total\s+importe\s+cargos")],
            skip_header_row: true,
        },
        debit_credit: DebitCreditRule::Separate,
        description: DescriptionPolicy::default(),
        lenient_date: Some(LenientDate::default()),
        allow_undated_opening_row: false,
        require_decimals: true,
        row_tolerance: 6.0,
        split_tolerance: 2.0,
        fragment_gap: 4.0,
        noise: vec![
            lit("Estimado Cliente"),
            lit("Estado de Cuenta MAESTRA"),
            lit("BBVA MEXICO"),
            re(r"(?i)por\s+disposici[oó]n\s+oficial"),
            re(r"(?i)av\.?\s*paseo\s+de\s+la\s+reforma"),
            re(r"R\.F\.C\.|\bRFC\b"),
            re(r"(?i)este\s+documento\s+es\s+una\s+representaci[oó]n\s+impresa"),
            re(r"(?i)\bcargos\s+abonos\b"),
            re(r"(?i)p[aá]gina\s+\d+\s+de\s+\d+"),
        ],
        reference_pattern: Some(r"(?i)\bref\.\s*[0-9A-Z]{5,}".to_string()),
        summary: vec![
            SummaryLabel {
                metric: SummaryMetric::OpeningBalance,
                pattern: lit("Saldo Anterior"),
            },
            SummaryLabel {
                metric: SummaryMetric::TotalCredits,
                pattern: re(r"(?i)dep[oó]sitos\s*/\s*abonos"),
            },
            SummaryLabel {
                metric: SummaryMetric::TotalDebits,
                pattern: re(r"(?i)retiros\s*/\s*cargos"),
            },
            SummaryLabel {
                metric: SummaryMetric::FinalBalance,
                pattern: lit("Saldo Final"),
            },
        ],
        balance_increases_with: Side::Credit,
    }
}
