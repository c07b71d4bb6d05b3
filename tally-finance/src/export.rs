//! Record export for outer layers (spreadsheets, scripts).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::str::FromStr;

use tally_core::MovementRecord;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => Err(format!("unknown format '{other}' (expected csv or json)")),
        }
    }
}

/// Flat CSV row; every column is always present.
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    date: &'a str,
    settlement_date: &'a str,
    description: &'a str,
    reference: &'a str,
    debit: &'a str,
    credit: &'a str,
    balance: &'a str,
    settlement_balance: &'a str,
    page: usize,
}

impl<'a> From<&'a MovementRecord> for CsvRow<'a> {
    fn from(r: &'a MovementRecord) -> Self {
        Self {
            date: &r.date,
            settlement_date: r.settlement_date.as_deref().unwrap_or(""),
            description: &r.description,
            reference: r.reference.as_deref().unwrap_or(""),
            debit: r.debit.as_deref().unwrap_or(""),
            credit: r.credit.as_deref().unwrap_or(""),
            balance: r.balance.as_deref().unwrap_or(""),
            settlement_balance: r.settlement_balance.as_deref().unwrap_or(""),
            // one-based for humans
            page: r.page + 1,
        }
    }
}

pub fn write_csv<W: Write>(records: &[MovementRecord], out: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    for r in records {
        wtr.serialize(CsvRow::from(r)).context("writing CSV row")?;
    }
    wtr.flush().context("flushing CSV output")?;
    Ok(())
}

pub fn write_json<W: Write>(records: &[MovementRecord], mut out: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut out, records).context("writing JSON records")?;
    writeln!(out)?;
    Ok(())
}

pub fn write_records<W: Write>(records: &[MovementRecord], format: ExportFormat, out: W) -> Result<()> {
    match format {
        ExportFormat::Csv => write_csv(records, out),
        ExportFormat::Json => write_json(records, out),
    }
}
