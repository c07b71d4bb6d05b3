//! tally-finance: summary totals, reconciliation and export of extracted movements

pub mod export;
pub mod reconcile;
pub mod summary;

pub use export::{write_records, ExportFormat};
pub use reconcile::{reconcile, CheckStatus, MetricCheck, ReconciliationReport};
pub use summary::{labelled_values, scrape_totals, LabelledValue, SummaryTotals, SummaryValue};
