//! Section Locator: restricts processing to the movement table.
//!
//! A three-state machine fed one row at a time, in document order:
//!
//! ```text
//! SearchingStart --start marker--> InSection --end marker--> Done
//! ```
//!
//! The state only moves forward. Once `Done`, every later row is refused,
//! including rows on later pages that repeat the table header.

use serde::Serialize;
use tracing::{debug, info};

use tally_core::SectionMatcher;

use crate::rows::Row;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionState {
    SearchingStart,
    InSection,
    Done,
}

/// What the caller should do with a fed row.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionAction {
    /// Outside the table (or a repeated header inside it).
    Skip,
    /// Inside the table; process this (possibly trimmed) row.
    Keep(Row),
    /// End marker reached. The text before the marker, if any, is still
    /// part of the table; nothing after it is.
    Stop(Option<Row>),
}

/// Vertical position of a marker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MarkerPosition {
    pub page: usize,
    pub top: f64,
    /// Index of the pattern alternative that matched.
    pub alternative: usize,
}

#[derive(Debug, Clone)]
pub struct SectionLocator<'a> {
    matcher: &'a SectionMatcher,
    state: SectionState,
    start: Option<MarkerPosition>,
    end: Option<MarkerPosition>,
}

impl<'a> SectionLocator<'a> {
    pub fn new(matcher: &'a SectionMatcher) -> Self {
        Self {
            matcher,
            state: SectionState::SearchingStart,
            start: None,
            end: None,
        }
    }

    pub fn state(&self) -> SectionState {
        self.state
    }

    pub fn start(&self) -> Option<MarkerPosition> {
        self.start
    }

    pub fn end(&self) -> Option<MarkerPosition> {
        self.end
    }

    pub fn feed(&mut self, row: Row) -> SectionAction {
        match self.state {
            SectionState::SearchingStart => self.search_start(row),
            SectionState::InSection => self.inside(row),
            SectionState::Done => SectionAction::Skip,
        }
    }

    fn search_start(&mut self, row: Row) -> SectionAction {
        let text = row.text();
        let Some(hit) = self.matcher.find_start(&text) else {
            return SectionAction::Skip;
        };

        self.state = SectionState::InSection;
        self.start = Some(MarkerPosition {
            page: row.page,
            top: row.anchor,
            alternative: hit.alternative,
        });
        info!(
            page = row.page,
            top = row.anchor,
            alternative = hit.alternative,
            "movement section found"
        );

        if self.matcher.skip_header_row {
            return SectionAction::Skip;
        }
        let rest = row.keep_from(hit.end);
        if rest.is_empty() {
            return SectionAction::Skip;
        }
        // The rest of the header line may already close the table.
        self.inside(rest)
    }

    fn inside(&mut self, row: Row) -> SectionAction {
        let text = row.text();
        if let Some(hit) = self.matcher.find_end(&text) {
            self.state = SectionState::Done;
            self.end = Some(MarkerPosition {
                page: row.page,
                top: row.anchor,
                alternative: hit.alternative,
            });
            info!(page = row.page, top = row.anchor, "movement section closed");
            let head = row.truncate_before(hit.start);
            return SectionAction::Stop((!head.is_empty()).then_some(head));
        }

        if self.matcher.find_start(&text).is_some() {
            debug!(page = row.page, top = row.anchor, "repeated section header skipped");
            return SectionAction::Skip;
        }

        SectionAction::Keep(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::{PositionedToken, SectionBoundary, SectionPattern};

    fn matcher(skip_header_row: bool) -> SectionMatcher {
        SectionMatcher::new(&SectionBoundary {
            start: vec![
                SectionPattern::literal("Detalle de Movimientos"),
                SectionPattern::regex(r"(?i)deta..e\s*de\s*mov"),
            ],
            end: vec![SectionPattern::literal("Total de Movimientos")],
            skip_header_row,
        })
        .unwrap()
    }

    fn row(page: usize, top: f64, words: &[&str]) -> Row {
        let tokens = words
            .iter()
            .enumerate()
            .map(|(i, w)| PositionedToken::new(*w, page, i as f64 * 100.0, top, i as f64 * 100.0 + 60.0, top + 9.0))
            .collect();
        Row::new(page, top, tokens)
    }

    #[test]
    fn test_full_cycle() {
        let m = matcher(true);
        let mut loc = SectionLocator::new(&m);
        assert_eq!(loc.feed(row(0, 10.0, &["Estado de cuenta"])), SectionAction::Skip);
        assert_eq!(loc.feed(row(0, 20.0, &["Detalle de Movimientos"])), SectionAction::Skip);
        assert_eq!(loc.state(), SectionState::InSection);
        assert!(matches!(loc.feed(row(0, 30.0, &["02 ENE", "tienda", "150.00"])), SectionAction::Keep(_)));

        match loc.feed(row(0, 40.0, &["comision", "Total de Movimientos", "5"])) {
            SectionAction::Stop(Some(head)) => assert_eq!(head.text(), "comision"),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(loc.state(), SectionState::Done);
        assert_eq!(loc.end().unwrap().top, 40.0);
    }

    #[test]
    fn test_never_reenters_after_done() {
        let m = matcher(true);
        let mut loc = SectionLocator::new(&m);
        loc.feed(row(0, 20.0, &["Detalle de Movimientos"]));
        loc.feed(row(0, 40.0, &["Total de Movimientos"]));
        assert_eq!(loc.feed(row(1, 20.0, &["Detalle de Movimientos"])), SectionAction::Skip);
        assert_eq!(loc.feed(row(1, 30.0, &["03 ENE", "tienda", "75.00"])), SectionAction::Skip);
        assert_eq!(loc.state(), SectionState::Done);
    }

    #[test]
    fn test_degraded_header_alternative() {
        let m = matcher(true);
        let mut loc = SectionLocator::new(&m);
        loc.feed(row(0, 20.0, &["DETA11E DE MOVIMIENTOS"]));
        assert_eq!(loc.start().unwrap().alternative, 1);
    }

    #[test]
    fn test_repeated_header_inside_is_skipped() {
        let m = matcher(true);
        let mut loc = SectionLocator::new(&m);
        loc.feed(row(0, 20.0, &["Detalle de Movimientos"]));
        assert_eq!(loc.feed(row(1, 20.0, &["Detalle de Movimientos"])), SectionAction::Skip);
        assert_eq!(loc.state(), SectionState::InSection);
    }

    #[test]
    fn test_header_row_remainder_kept_when_not_skipped() {
        let m = matcher(false);
        let mut loc = SectionLocator::new(&m);
        match loc.feed(row(0, 20.0, &["Detalle de Movimientos", "02 ENE", "tienda"])) {
            SectionAction::Keep(rest) => assert_eq!(rest.text(), "02 ENE tienda"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_missing_start_keeps_nothing() {
        let m = matcher(true);
        let mut loc = SectionLocator::new(&m);
        for top in [10.0, 20.0, 30.0] {
            assert_eq!(loc.feed(row(0, top, &["02 ENE", "tienda", "150.00"])), SectionAction::Skip);
        }
        assert_eq!(loc.state(), SectionState::SearchingStart);
        assert!(loc.start().is_none());
    }
}
