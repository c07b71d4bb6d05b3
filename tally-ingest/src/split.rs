//! Row Splitter.
//!
//! Renderers sometimes collapse two movements printed on adjacent
//! sub-lines into one grouped row. Two signals reveal it:
//!
//! 1. several date-shaped tokens in the date band at distinct heights;
//! 2. several amounts in one amount band at distinct heights, including a
//!    single token whose text carries more than one amount literal.
//!
//! Dates take precedence. Each signal yields cut heights; every token is
//! assigned to the sub-row of the nearest cut, the upper one on a tie.
//! Heights closer than the profile's split tolerance are the same sub-line,
//! so two dates printed side by side (operation and settlement) never split.

use std::collections::HashMap;
use tracing::debug;

use tally_core::amount::find_amount_literals;
use tally_core::{BankProfile, ColumnRole, Field, ParsedAmount, PositionedToken};

use crate::classify::classify;
use crate::rows::Row;

/// Split `row` into one or more rows. Returns `[row]` when no signal fires.
pub fn split_row(row: Row, profile: &BankProfile) -> Vec<Row> {
    let tokens = explode_stacked_amounts(row.tokens, profile);

    let mut cuts = date_cuts(&tokens, profile);
    if cuts.len() < 2 {
        cuts = amount_cuts(&tokens, profile);
    }
    if cuts.len() < 2 {
        return vec![Row::new(row.page, row.anchor, tokens)];
    }

    debug!(page = row.page, top = row.anchor, parts = cuts.len(), "splitting collapsed row");

    let mut parts: Vec<Vec<PositionedToken>> = vec![Vec::new(); cuts.len()];
    for token in tokens {
        let idx = nearest_cut(&cuts, token.top());
        parts[idx].push(token);
    }

    parts
        .into_iter()
        .zip(cuts)
        .filter(|(p, _)| !p.is_empty())
        .map(|(p, cut)| Row::new(row.page, cut, p))
        .collect()
}

fn nearest_cut(cuts: &[f64], top: f64) -> usize {
    cuts.iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (top - **a).abs().total_cmp(&(top - **b).abs()))
        .map_or(0, |(i, _)| i)
}

/// Distinct heights (ascending) after merging values within `tol`.
fn distinct_heights(mut tops: Vec<f64>, tol: f64) -> Vec<f64> {
    tops.sort_by(f64::total_cmp);
    let mut out: Vec<f64> = Vec::new();
    for t in tops {
        match out.last() {
            Some(&last) if t - last <= tol => {}
            _ => out.push(t),
        }
    }
    out
}

fn date_cuts(tokens: &[PositionedToken], profile: &BankProfile) -> Vec<f64> {
    let tops = tokens
        .iter()
        .filter(|t| classify(t, &profile.schema) == Some(Field::Date))
        .filter(|t| profile.date.split_prefix(&t.text).is_some())
        .map(PositionedToken::top)
        .collect();
    distinct_heights(tops, profile.split_tolerance)
}

fn amount_cuts(tokens: &[PositionedToken], profile: &BankProfile) -> Vec<f64> {
    let mut by_column: HashMap<Field, Vec<f64>> = HashMap::new();
    for t in tokens {
        let Some(field) = classify(t, &profile.schema) else {
            continue;
        };
        if field.role() != ColumnRole::Amount {
            continue;
        }
        if ParsedAmount::parse(&t.text, profile.require_decimals).is_some() {
            by_column.entry(field).or_default().push(t.top());
        }
    }

    let mut tops = Vec::new();
    for (_, column_tops) in by_column {
        let distinct = distinct_heights(column_tops, profile.split_tolerance);
        if distinct.len() > 1 {
            tops.extend(distinct);
        }
    }
    distinct_heights(tops, profile.split_tolerance)
}

/// Break a token in an amount band that holds several amounts stacked into
/// one text (`150.00 75.00`) into one token per amount, dividing its box
/// vertically in print order.
fn explode_stacked_amounts(tokens: Vec<PositionedToken>, profile: &BankProfile) -> Vec<PositionedToken> {
    let mut out = Vec::with_capacity(tokens.len());
    for token in tokens {
        let in_amount_band = classify(&token, &profile.schema).is_some_and(|f| f.is_amount());
        let literals = find_amount_literals(&token.text);
        if !in_amount_band || literals.len() < 2 {
            out.push(token);
            continue;
        }

        let n = literals.len() as f64;
        let h = token.bbox.height() / n;
        for (k, (start, end)) in literals.into_iter().enumerate() {
            let mut part = token.clone();
            part.text = token.text[start..end].trim().to_string();
            part.bbox.top = token.bbox.top + h * k as f64;
            part.bbox.bottom = part.bbox.top + h;
            out.push(part);
        }
    }
    out
}
