//! Token Normalizer.
//!
//! Repairs token text corrupted by ingestion before any geometry is
//! interpreted:
//!
//! - doubled glyphs from overprinted text (`PPaaggoo` -> `Pago`);
//! - letter/digit confusions in the date band (`O2 ENE` -> `02 ENE`),
//!   only when the profile opts in;
//! - amounts split across adjacent tokens (`$` + `50.00`, `1,200` + `.50`).
//!
//! Ambiguous input is left untouched. Geometry is never changed except when
//! two fragments merge into one token, whose box is the union of both.

use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

use tally_core::amount::contains_amount_literal;
use tally_core::{BankProfile, Field, ParsedAmount, PositionedToken};

use crate::classify::classify;
use crate::rows::group_rows;

/// A swappable cleanup stage run before row grouping.
pub trait Normalizer {
    fn normalize(&self, tokens: Vec<PositionedToken>, profile: &BankProfile) -> Vec<PositionedToken>;
}

/// Leaves tokens exactly as ingested. Suitable for clean text-layer input.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl Normalizer for Passthrough {
    fn normalize(&self, tokens: Vec<PositionedToken>, _profile: &BankProfile) -> Vec<PositionedToken> {
        tokens
    }
}

/// Default cleanup for both text-layer and OCR tokens.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatementNormalizer;

impl Normalizer for StatementNormalizer {
    fn normalize(&self, tokens: Vec<PositionedToken>, profile: &BankProfile) -> Vec<PositionedToken> {
        let tokens: Vec<PositionedToken> = tokens
            .into_iter()
            .map(|t| normalize_token(t, profile))
            .collect();
        merge_fragments(tokens, profile)
    }
}

/// Per-token repairs (no merging).
pub fn normalize_token(mut token: PositionedToken, profile: &BankProfile) -> PositionedToken {
    if let Some(fixed) = undouble(&token.text) {
        debug!(from = %token.text, to = %fixed, "collapsed doubled glyphs");
        token.text = fixed;
    }
    if profile.ocr_digit_repair && classify(&token, &profile.schema) == Some(Field::Date) {
        if let Some(fixed) = repair_date_digits(&token.text, profile) {
            debug!(from = %token.text, to = %fixed, "repaired date digits");
            token.text = fixed;
        }
    }
    token
}

/// Collapse doubled glyphs when every word carrying letters is fully
/// doubled and at least one such word is long enough to be convincing.
/// Amount-bearing text is never touched.
pub fn undouble(text: &str) -> Option<String> {
    if contains_amount_literal(text) || ParsedAmount::parse(text, false).is_some() {
        return None;
    }

    let words: Vec<&str> = text.split_whitespace().collect();
    let lettered: Vec<&str> = words
        .iter()
        .copied()
        .filter(|w| w.chars().any(char::is_alphabetic))
        .collect();
    if lettered.is_empty() {
        return None;
    }
    if !lettered.iter().all(|w| is_doubled(w)) {
        return None;
    }
    if !lettered.iter().any(|w| w.chars().count() >= 4) {
        return None;
    }

    let fixed: Vec<String> = words
        .iter()
        .map(|w| {
            if is_doubled(w) && w.chars().any(char::is_alphabetic) {
                w.chars().step_by(2).collect()
            } else {
                (*w).to_string()
            }
        })
        .collect();
    Some(fixed.join(" "))
}

fn is_doubled(word: &str) -> bool {
    let chars: Vec<char> = word.chars().collect();
    !chars.is_empty() && chars.len() % 2 == 0 && chars.chunks(2).all(|p| p[0] == p[1])
}

fn confusable_digit(c: char) -> Option<char> {
    match c {
        'O' | 'o' => Some('0'),
        'I' | 'l' | '|' => Some('1'),
        'Z' => Some('2'),
        'S' => Some('5'),
        'B' => Some('8'),
        _ => None,
    }
}

/// Swap look-alike letters that sit next to a digit. Accepted only when the
/// original is not a date of the profile's grammar and the repaired text is.
pub fn repair_date_digits(text: &str, profile: &BankProfile) -> Option<String> {
    if profile.date.split_prefix(text).is_some() {
        return None;
    }

    let chars: Vec<char> = text.chars().collect();
    let mut out = chars.clone();
    let mut changed = false;
    for i in 0..chars.len() {
        let Some(d) = confusable_digit(chars[i]) else {
            continue;
        };
        let prev = i.checked_sub(1).map(|p| out[p]);
        let next = chars.get(i + 1).copied();
        // `OO/JUN`: a run of look-alikes counts when a digit follows it
        let after = chars.get(i + 2).is_some_and(|c| c.is_ascii_digit());
        let near_digit = prev.is_some_and(|c| c.is_ascii_digit())
            || next.is_some_and(|c| c.is_ascii_digit() || (confusable_digit(c).is_some() && after));
        if near_digit {
            out[i] = d;
            changed = true;
        }
    }
    if !changed {
        return None;
    }

    let fixed: String = out.into_iter().collect();
    if profile.date.split_prefix(&fixed).is_some() {
        Some(fixed)
    } else {
        None
    }
}

fn currency_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[-+]?(?:[$€£]|MXN|USD|EUR)$").expect("currency fragment regex"))
}

fn integer_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[-+]?(?:[$€£]\s?)?(?:\d{1,3}(?:[.,]\d{3})+|\d+)[.,]?$").expect("integer fragment regex")
    })
}

fn fraction_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[.,]?\d{2}-?$").expect("fraction fragment regex"))
}

/// Text of the merged amount when `left` and `right` are two fragments of
/// one printed amount.
fn fragment_join(left: &str, right: &str) -> Option<String> {
    let joined = if currency_re().is_match(left) {
        format!("{left}{right}")
    } else if integer_re().is_match(left) && fraction_re().is_match(right) {
        let sep_left = left.ends_with(['.', ',']);
        let sep_right = right.starts_with(['.', ',']);
        if sep_left == sep_right {
            return None;
        }
        format!("{left}{right}")
    } else {
        return None;
    };
    ParsedAmount::parse(&joined, true).map(|_| joined)
}

fn adjacent(left: &PositionedToken, right: &PositionedToken, profile: &BankProfile) -> bool {
    let gap = right.bbox.x0 - left.bbox.x1;
    left.page == right.page
        && (left.bbox.top - right.bbox.top).abs() <= profile.row_tolerance
        && (-1.0..=profile.fragment_gap).contains(&gap)
}

/// Merge neighbouring fragments of one amount into a single token.
///
/// Works row by row: tokens are grouped with the profile's row tolerance
/// and scanned once left to right, so a merged token can absorb the next
/// fragment (`$` + `1,200` + `.50`). Output is in reading order.
pub fn merge_fragments(tokens: Vec<PositionedToken>, profile: &BankProfile) -> Vec<PositionedToken> {
    let mut out: Vec<PositionedToken> = Vec::with_capacity(tokens.len());
    for row in group_rows(tokens, profile.row_tolerance) {
        let start = out.len();
        for token in row.tokens {
            if out.len() > start {
                let last = out.len() - 1;
                let joined = if adjacent(&out[last], &token, profile) {
                    fragment_join(out[last].text.trim(), token.text.trim())
                } else {
                    None
                };
                if let Some(text) = joined {
                    debug!(left = %out[last].text, right = %token.text, "merged amount fragments");
                    out[last].bbox = out[last].bbox.union(&token.bbox);
                    out[last].text = text;
                    continue;
                }
            }
            out.push(token);
        }
    }
    out
}
