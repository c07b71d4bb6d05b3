//! Continuation Merger.
//!
//! Movements often wrap: the description continues on the next line, or
//! the amount is printed one line below the date. The merger keeps the
//! movement under construction in an explicit [`MergeCursor`]. A record
//! with a valid date (or one that is a transaction on its own) starts a
//! new movement and releases the previous one; anything else is folded
//! into the pending movement.

use tracing::debug;

use tally_core::amount::strip_amount_literals;
use tally_core::{BankProfile, Field, MovementRecord};

use crate::validate::{has_valid_amount, is_noise, is_transaction};

/// What happened to the pending movement when it was let go.
#[derive(Debug, Clone, PartialEq)]
pub enum Released {
    Nothing,
    Accepted(MovementRecord),
    Rejected(MovementRecord),
}

/// Outcome of feeding one extracted row.
#[derive(Debug, Clone, PartialEq)]
pub enum MergeStep {
    /// A new movement began; the previous one was released.
    Started(Released),
    /// Folded into the pending movement.
    Merged,
    /// Nothing usable (empty, noise, or no movement to attach to).
    Dropped,
}

/// The movement under construction.
#[derive(Debug, Clone, Default)]
pub struct MergeCursor {
    last: Option<MovementRecord>,
    /// The pending record is an undated opening row.
    opening: bool,
}

impl MergeCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<&MovementRecord> {
        self.last.as_ref()
    }

    /// Feed the record extracted from the next in-section row.
    pub fn feed(&mut self, record: MovementRecord, profile: &BankProfile) -> MergeStep {
        if begins_movement(&record, profile) {
            let released = self.release(profile);
            self.last = Some(record);
            return MergeStep::Started(released);
        }

        if record.is_blank() {
            return MergeStep::Dropped;
        }
        if is_noise(&record, profile) {
            debug!(text = %record.description, "noise continuation dropped");
            return MergeStep::Dropped;
        }

        match self.last.as_mut() {
            Some(target) => {
                merge_continuation(target, &record, profile);
                MergeStep::Merged
            }
            None if profile.allow_undated_opening_row && has_valid_amount(&record, profile) => {
                debug!(page = record.page, "undated opening row kept");
                self.last = Some(record);
                self.opening = true;
                MergeStep::Started(Released::Nothing)
            }
            None => {
                debug!(text = %record.description, "continuation without a movement dropped");
                MergeStep::Dropped
            }
        }
    }

    /// Release the pending movement at the end of the section.
    pub fn finish(mut self, profile: &BankProfile) -> Released {
        self.release(profile)
    }

    fn release(&mut self, profile: &BankProfile) -> Released {
        let opening = std::mem::take(&mut self.opening);
        let Some(record) = self.last.take() else {
            return Released::Nothing;
        };
        if is_transaction(&record, profile) || (opening && has_valid_amount(&record, profile)) {
            Released::Accepted(record)
        } else {
            debug!(date = %record.date, text = %record.description, "pending movement rejected");
            Released::Rejected(record)
        }
    }
}

/// A record starts a new movement when its date is exact or it already
/// qualifies as a transaction.
pub fn begins_movement(record: &MovementRecord, profile: &BankProfile) -> bool {
    profile.date.is_exact(&record.date) || is_transaction(record, profile)
}

/// Fold a continuation into `target`. Text is appended with amount
/// literals stripped and cut at an end marker; amounts only fill fields
/// that are still empty.
pub fn merge_continuation(target: &mut MovementRecord, cont: &MovementRecord, profile: &BankProfile) {
    if !cont.date.trim().is_empty() {
        target.push_description(&cont.date);
    }
    let text = strip_amount_literals(&cont.description);
    target.push_description(profile.section.trim_at_end(&text));

    if let Some(reference) = &cont.reference {
        if target.reference.is_none() {
            target.reference = Some(reference.clone());
        } else {
            target.push_description(reference);
        }
    }

    let shared = profile.shares_debit_credit();
    for field in [Field::Debit, Field::Credit] {
        let Some(value) = cont.amount_field(field) else {
            continue;
        };
        if shared && (target.debit.is_some() || target.credit.is_some()) {
            debug!(value = %value, "shared debit/credit already set, continuation amount dropped");
            continue;
        }
        if !target.fill_amount(field, value.clone()) {
            debug!(value = %value, column = field.name(), "continuation amount dropped, field set");
        }
    }
    for field in [Field::Balance, Field::SettlementBalance] {
        let Some(value) = cont.amount_field(field) else {
            continue;
        };
        if !target.fill_amount(field, value.clone()) {
            debug!(value = %value, column = field.name(), "continuation balance dropped, field set");
        }
    }
}
