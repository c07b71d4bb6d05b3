//! Movement Extractor: one row group -> one [`MovementRecord`].
//!
//! Every token is placed by the column classifier, then handled by the
//! role of its column:
//!
//! - date band: the leading date becomes `date`, a second date becomes
//!   `settlement_date`, any trailing text goes to the description;
//! - text bands: accumulated in token order;
//! - amount bands: only text passing the full amount grammar is kept,
//!   anything else (page numbers, account fragments) goes to the
//!   description.
//!
//! A text token that runs into an amount band (OCR often glues
//! `TIENDA 150.00` together) has its trailing amount sliced off and placed
//! on its own. Fields are filled once; a second value for a populated field
//! is dropped, never written over the first.

use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

use tally_core::amount::find_amount_literals;
use tally_core::{
    BankProfile, ColumnRole, DebitCreditRule, Field, MovementRecord, ParsedAmount, PositionedToken, Side,
};

use crate::classify::classify;
use crate::rows::Row;

/// A piece of row text and the field its position maps to.
#[derive(Debug, Clone, PartialEq)]
struct Placed {
    field: Field,
    text: String,
}

pub fn extract(row: &Row, profile: &BankProfile) -> MovementRecord {
    let mut record = MovementRecord::new(row.page);

    let mut pieces = Vec::with_capacity(row.tokens.len());
    for token in &row.tokens {
        place_token(token, profile, &mut pieces);
    }
    let marker = take_line_marker(&mut pieces, profile);

    for piece in pieces {
        match piece.field.role() {
            ColumnRole::Date => put_date_text(&mut record, &piece.text, profile),
            ColumnRole::Text => put_text(&mut record, piece.field, &piece.text),
            ColumnRole::Amount => put_amount(&mut record, piece.field, &piece.text, marker, profile),
        }
    }

    move_reference(&mut record, profile);
    record.description = record.description.split_whitespace().collect::<Vec<_>>().join(" ");
    record
}

fn place_token(token: &PositionedToken, profile: &BankProfile, out: &mut Vec<Placed>) {
    let Some(field) = classify(token, &profile.schema) else {
        debug!(text = %token.text, x = token.center_x(), "token outside every column dropped");
        return;
    };
    if field.is_amount() {
        out.push(Placed {
            field,
            text: token.text.trim().to_string(),
        });
        return;
    }

    let (head, tail) = peel_trailing_amounts(token, profile);
    if let Some(head) = head {
        out.push(Placed {
            field,
            text: head.text,
        });
    }
    out.extend(tail);
}

/// Slice amount literals off the end of a text token while each slice lands
/// in an amount band. Returns the remaining head (if any) and the sliced
/// amounts left to right.
fn peel_trailing_amounts(token: &PositionedToken, profile: &BankProfile) -> (Option<PositionedToken>, Vec<Placed>) {
    let mut head = token.clone();
    head.text = head.text.trim().to_string();
    let mut tail = Vec::new();

    while let Some(&(start, end)) = find_amount_literals(&head.text).last() {
        if !head.text[end..].trim().is_empty() {
            break;
        }
        let total = head.text.chars().count();
        let from = head.text[..start].chars().count();
        let piece = head.slice(head.text[start..end].trim(), from, total);
        let Some(field) = classify(&piece, &profile.schema).filter(Field::is_amount) else {
            break;
        };

        debug!(token = %token.text, amount = %piece.text, field = field.name(), "amount sliced from text token");
        tail.push(Placed {
            field,
            text: piece.text,
        });
        let rest = head.text[..start].trim_end().to_string();
        let rest_len = rest.chars().count();
        head = head.slice(rest, 0, rest_len);
        if head.text.is_empty() {
            break;
        }
    }

    tail.reverse();
    ((!head.text.is_empty()).then_some(head), tail)
}

/// Find and remove the debit/credit marker word of a line-marker profile.
/// The first marker in reading order wins.
fn take_line_marker(pieces: &mut [Placed], profile: &BankProfile) -> Option<Side> {
    if !matches!(profile.debit_credit, DebitCreditRule::LineMarker { .. }) {
        return None;
    }
    let mut found = None;
    for piece in pieces.iter_mut() {
        if piece.field == Field::Date {
            continue;
        }
        let mut kept = Vec::new();
        for word in piece.text.split_whitespace() {
            match profile.debit_credit.marker_side(word) {
                Some(side) => {
                    found.get_or_insert(side);
                }
                None => kept.push(word),
            }
        }
        piece.text = kept.join(" ");
    }
    if let Some(side) = found {
        debug!(side = ?side, "line marker");
    }
    found
}

fn raw_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[0-9OoIlSBZ|]{1,2}[\s/\-.]?[0-9A-Za-z]{2,3}\.?$").expect("raw date regex")
    })
}

/// Short date-like text the grammar could not read (`O2 EN3`). Kept as the
/// raw date so a lenient profile can still accept the movement.
fn looks_like_raw_date(text: &str) -> bool {
    raw_date_re().is_match(text) && text.chars().any(|c| c.is_ascii_digit())
}

fn put_date_text(record: &mut MovementRecord, text: &str, profile: &BankProfile) {
    let mut rest = text.trim();
    while let Some((date, after)) = profile.date.split_prefix(rest) {
        if record.date.is_empty() {
            record.date = date.to_string();
        } else if record.settlement_date.is_none() && profile.date.is_exact(&record.date) {
            record.settlement_date = Some(date.to_string());
        } else {
            record.push_description(date);
        }
        rest = after;
    }

    if rest.is_empty() {
        return;
    }
    if record.date.is_empty() && looks_like_raw_date(rest) {
        debug!(raw = %rest, "unparseable date kept raw");
        record.date = rest.to_string();
    } else {
        record.push_description(rest);
    }
}

fn put_text(record: &mut MovementRecord, field: Field, text: &str) {
    if field == Field::Reference {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        match record.reference.as_mut() {
            Some(r) => {
                r.push(' ');
                r.push_str(text);
            }
            None => record.reference = Some(text.to_string()),
        }
    } else {
        record.push_description(text);
    }
}

/// Debit or credit for an amount found in `field`.
fn side_field(field: Field, parsed: &ParsedAmount, marker: Option<Side>, profile: &BankProfile) -> Field {
    let negative = parsed.amount.is_negative();
    match &profile.debit_credit {
        rule @ DebitCreditRule::SharedBySign { .. } => rule
            .side_for_sign(negative)
            .map(|s| s.field())
            .unwrap_or(Field::Debit),
        DebitCreditRule::LineMarker { default, .. } => marker.unwrap_or(*default).field(),
        DebitCreditRule::Separate => {
            if field == Field::Amount || profile.schema.shares_debit_credit() {
                if negative { Field::Debit } else { Field::Credit }
            } else {
                field
            }
        }
    }
}

fn put_amount(record: &mut MovementRecord, field: Field, text: &str, marker: Option<Side>, profile: &BankProfile) {
    if text.is_empty() {
        return;
    }
    let Some(parsed) = ParsedAmount::parse(text, profile.require_decimals) else {
        debug!(text, column = field.name(), "not an amount, kept as text");
        record.push_description(text);
        return;
    };

    if matches!(field, Field::Balance | Field::SettlementBalance) {
        put_balance(record, field, parsed.signed_literal(), profile);
        return;
    }

    let target = side_field(field, &parsed, marker, profile);
    if profile.shares_debit_credit() && (record.debit.is_some() || record.credit.is_some()) {
        debug!(text, "shared debit/credit already set, extra amount dropped");
        return;
    }
    if !record.fill_amount(target, parsed.literal) {
        debug!(text, column = target.name(), "field already set, extra amount dropped");
    }
}

/// A second value in the balance band is the settlement balance when the
/// layout has a column for it and that column is still empty.
fn put_balance(record: &mut MovementRecord, field: Field, literal: String, profile: &BankProfile) {
    if record.fill_amount(field, literal.clone()) {
        return;
    }
    if field == Field::Balance
        && profile.schema.has(Field::SettlementBalance)
        && record.fill_amount(Field::SettlementBalance, literal.clone())
    {
        debug!(literal = %literal, "second balance taken as settlement balance");
        return;
    }
    debug!(literal = %literal, column = field.name(), "extra balance dropped");
}

/// Move the first reference code out of the description.
fn move_reference(record: &mut MovementRecord, profile: &BankProfile) {
    if record.reference.is_some() {
        return;
    }
    let Some((start, end)) = profile.find_reference(&record.description) else {
        return;
    };
    record.reference = Some(record.description[start..end].trim().to_string());
    record.description = format!("{} {}", &record.description[..start], &record.description[end..])
        .trim()
        .to_string();
}
