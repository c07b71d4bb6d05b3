//! The reconstruction pipeline.
//!
//! tokens -> normalize -> group rows -> section locator -> split -> extract
//! -> merge/validate -> records
//!
//! Single pass in document order. Each run owns a fresh section state and
//! a fresh merge cursor, so nothing leaks between documents.

use serde::Serialize;
use tracing::{debug, info, warn};

use tally_core::{BankProfile, MovementRecord, PositionedToken};

use crate::extract::extract;
use crate::merge::{MergeCursor, MergeStep, Released};
use crate::normalize::{Normalizer, StatementNormalizer};
use crate::rows::{group_rows, Row};
use crate::section::{MarkerPosition, SectionAction, SectionLocator, SectionState};
use crate::split::split_row;

/// Counters collected during one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractionStats {
    pub tokens: usize,
    pub rows: usize,
    pub rows_in_section: usize,
    /// Rows the splitter broke into more than one part.
    pub rows_split: usize,
    pub records: usize,
    pub rows_merged: usize,
    /// Pending movements that failed validation.
    pub rows_rejected: usize,
    pub rows_dropped: usize,
    pub section_found: bool,
    pub section_closed: bool,
    pub section_start: Option<MarkerPosition>,
    pub section_end: Option<MarkerPosition>,
}

/// Output of one run.
#[derive(Debug, Clone, Serialize)]
pub struct Extraction {
    pub records: Vec<MovementRecord>,
    /// Every grouped row of the document, in and out of the section.
    #[serde(skip)]
    pub rows: Vec<Row>,
    pub stats: ExtractionStats,
}

pub struct Engine<'a, N: Normalizer = StatementNormalizer> {
    profile: &'a BankProfile,
    normalizer: N,
}

impl<'a> Engine<'a, StatementNormalizer> {
    pub fn new(profile: &'a BankProfile) -> Self {
        Self {
            profile,
            normalizer: StatementNormalizer,
        }
    }
}

impl<'a, N: Normalizer> Engine<'a, N> {
    pub fn with_normalizer(profile: &'a BankProfile, normalizer: N) -> Self {
        Self { profile, normalizer }
    }

    pub fn profile(&self) -> &BankProfile {
        self.profile
    }

    /// Run over pages given in order; each token's page index is taken
    /// from its position in `pages`.
    pub fn run_pages(&self, pages: Vec<Vec<PositionedToken>>) -> Extraction {
        let tokens = pages
            .into_iter()
            .enumerate()
            .flat_map(|(page, tokens)| {
                tokens.into_iter().map(move |mut t| {
                    t.page = page;
                    t
                })
            })
            .collect();
        self.run(tokens)
    }

    pub fn run(&self, tokens: Vec<PositionedToken>) -> Extraction {
        let profile = self.profile;
        let mut stats = ExtractionStats {
            tokens: tokens.len(),
            ..ExtractionStats::default()
        };

        let tokens = self.normalizer.normalize(tokens, profile);
        let rows = group_rows(tokens, profile.row_tolerance);
        stats.rows = rows.len();

        let mut locator = SectionLocator::new(&profile.section);
        let mut cursor = MergeCursor::new();
        let mut records = Vec::new();

        for row in &rows {
            let (row, last) = match locator.feed(row.clone()) {
                SectionAction::Skip => continue,
                SectionAction::Keep(row) => (row, false),
                SectionAction::Stop(Some(row)) => (row, true),
                SectionAction::Stop(None) => break,
            };
            stats.rows_in_section += 1;

            let parts = split_row(row, profile);
            if parts.len() > 1 {
                stats.rows_split += 1;
            }
            for part in &parts {
                let record = extract(part, profile);
                match cursor.feed(record, profile) {
                    MergeStep::Started(released) => collect(released, &mut records, &mut stats),
                    MergeStep::Merged => stats.rows_merged += 1,
                    MergeStep::Dropped => stats.rows_dropped += 1,
                }
            }

            if last {
                break;
            }
        }
        collect(cursor.finish(profile), &mut records, &mut stats);

        stats.section_found = locator.state() != SectionState::SearchingStart;
        stats.section_closed = locator.state() == SectionState::Done;
        stats.section_start = locator.start();
        stats.section_end = locator.end();
        stats.records = records.len();

        if !stats.section_found {
            warn!(profile = %profile.name, "movement section not found, layout not recognized");
        }
        info!(
            profile = %profile.name,
            records = stats.records,
            merged = stats.rows_merged,
            rejected = stats.rows_rejected,
            "extraction finished"
        );

        Extraction { records, rows, stats }
    }
}

fn collect(released: Released, records: &mut Vec<MovementRecord>, stats: &mut ExtractionStats) {
    match released {
        Released::Nothing => {}
        Released::Accepted(record) => {
            debug!(date = %record.date, text = %record.description, "movement");
            records.push(record);
        }
        Released::Rejected(_) => stats.rows_rejected += 1,
    }
}
