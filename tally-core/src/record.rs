//! Normalized output of the reconstruction engine (issuer-agnostic).

use serde::{Deserialize, Serialize};

use crate::amount::Amount;
use crate::schema::Field;

/// One reconstructed ledger entry.
///
/// Dates and amounts keep the issuer's printed form; use the profile's
/// grammars to interpret them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementRecord {
    /// Raw date string (`02 ENE`, `04/22`).
    pub date: String,
    /// Second date printed next to the first (settlement / posting date).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settlement_date: Option<String>,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Unsigned amount literals as printed.
    pub debit: Option<String>,
    pub credit: Option<String>,
    /// Signed literal; balances may legitimately be negative.
    pub balance: Option<String>,
    /// Second running balance some issuers print once pending operations
    /// settle. Signed like `balance`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settlement_balance: Option<String>,
    /// Zero-based page the movement starts on.
    pub page: usize,
}

impl MovementRecord {
    pub fn new(page: usize) -> Self {
        Self {
            page,
            ..Self::default()
        }
    }

    pub fn amount_field(&self, field: Field) -> Option<&String> {
        match field {
            Field::Debit => self.debit.as_ref(),
            Field::Credit => self.credit.as_ref(),
            Field::Balance => self.balance.as_ref(),
            Field::SettlementBalance => self.settlement_balance.as_ref(),
            _ => None,
        }
    }

    fn amount_slot(&mut self, field: Field) -> Option<&mut Option<String>> {
        match field {
            Field::Debit => Some(&mut self.debit),
            Field::Credit => Some(&mut self.credit),
            Field::Balance => Some(&mut self.balance),
            Field::SettlementBalance => Some(&mut self.settlement_balance),
            _ => None,
        }
    }

    /// Fill an amount field only if it is still empty. Returns whether the
    /// value was stored; a populated field is never overwritten.
    pub fn fill_amount(&mut self, field: Field, value: impl Into<String>) -> bool {
        match self.amount_slot(field) {
            Some(slot) if slot.is_none() => {
                *slot = Some(value.into());
                true
            }
            _ => false,
        }
    }

    /// Move a value out of an amount field.
    pub fn take_amount(&mut self, field: Field) -> Option<String> {
        self.amount_slot(field).and_then(|s| s.take())
    }

    /// Append free text with single-space separation.
    pub fn push_description(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        if !self.description.is_empty() {
            self.description.push(' ');
        }
        self.description.push_str(text);
    }

    pub fn has_any_amount(&self) -> bool {
        self.debit.is_some() || self.credit.is_some() || self.balance.is_some() || self.settlement_balance.is_some()
    }

    /// Nothing at all was captured.
    pub fn is_blank(&self) -> bool {
        self.date.trim().is_empty()
            && self.settlement_date.is_none()
            && self.description.trim().is_empty()
            && self.reference.is_none()
            && !self.has_any_amount()
    }

    /// Parsed value of an amount field; debit/credit are unsigned.
    pub fn amount_value(&self, field: Field, require_decimals: bool) -> Option<Amount> {
        self.amount_field(field)
            .and_then(|s| Amount::parse(s, require_decimals))
    }
}
