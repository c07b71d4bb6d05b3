//! Row Grouper: cluster tokens into visual rows.
//!
//! Tokens are sorted by (page, top, x0). A row is anchored at its first
//! token's top edge; later tokens join while they stay within `tolerance`
//! of that anchor on the same page. Row height varies between scans, so no
//! fixed grid is assumed.

use serde::Serialize;
use tally_core::PositionedToken;

/// Tokens judged to lie on one visual line, left to right.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    pub page: usize,
    /// Top edge of the first token placed in the row.
    pub anchor: f64,
    pub tokens: Vec<PositionedToken>,
}

impl Row {
    pub fn new(page: usize, anchor: f64, mut tokens: Vec<PositionedToken>) -> Self {
        sort_left_to_right(&mut tokens);
        Self { page, anchor, tokens }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.iter().all(|t| t.text.trim().is_empty())
    }

    /// Token texts joined by single spaces.
    pub fn text(&self) -> String {
        self.tokens
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Byte span of every token inside [`Row::text`].
    fn spans(&self) -> Vec<(usize, usize)> {
        let mut out = Vec::with_capacity(self.tokens.len());
        let mut pos = 0;
        for t in &self.tokens {
            out.push((pos, pos + t.text.len()));
            pos += t.text.len() + 1;
        }
        out
    }

    /// Keep only the text before byte `offset` of [`Row::text`]. A token
    /// straddling the offset keeps its leading part.
    pub fn truncate_before(&self, offset: usize) -> Row {
        let mut tokens = Vec::new();
        for (t, (start, end)) in self.tokens.iter().zip(self.spans()) {
            if end <= offset {
                tokens.push(t.clone());
            } else if start < offset {
                let cut = offset - start;
                let head = t.text[..cut].trim_end();
                if !head.is_empty() {
                    let chars = head.chars().count();
                    tokens.push(t.slice(head, 0, chars));
                }
            }
        }
        Row { page: self.page, anchor: self.anchor, tokens }
    }

    /// Keep only the text from byte `offset` of [`Row::text`] onwards.
    pub fn keep_from(&self, offset: usize) -> Row {
        let mut tokens = Vec::new();
        for (t, (start, end)) in self.tokens.iter().zip(self.spans()) {
            if start >= offset {
                tokens.push(t.clone());
            } else if end > offset {
                let cut = offset - start;
                let tail = t.text[cut..].trim_start();
                if !tail.is_empty() {
                    let total = t.text.chars().count();
                    let from = total - tail.chars().count();
                    tokens.push(t.slice(tail, from, total));
                }
            }
        }
        Row { page: self.page, anchor: self.anchor, tokens }
    }
}

fn sort_left_to_right(tokens: &mut [PositionedToken]) {
    tokens.sort_by(|a, b| {
        a.bbox
            .x0
            .total_cmp(&b.bbox.x0)
            .then(a.bbox.top.total_cmp(&b.bbox.top))
    });
}

/// Cluster tokens into rows in page/vertical order.
pub fn group_rows(mut tokens: Vec<PositionedToken>, tolerance: f64) -> Vec<Row> {
    tokens.sort_by(|a, b| {
        a.page
            .cmp(&b.page)
            .then(a.bbox.top.total_cmp(&b.bbox.top))
            .then(a.bbox.x0.total_cmp(&b.bbox.x0))
    });

    let mut rows: Vec<Row> = Vec::new();
    let mut current: Vec<PositionedToken> = Vec::new();
    let mut anchor = (0usize, 0.0f64);

    for token in tokens {
        let joins = !current.is_empty()
            && token.page == anchor.0
            && (token.bbox.top - anchor.1).abs() <= tolerance;
        if !joins && !current.is_empty() {
            rows.push(Row::new(anchor.0, anchor.1, std::mem::take(&mut current)));
        }
        if current.is_empty() {
            anchor = (token.page, token.bbox.top);
        }
        current.push(token);
    }
    if !current.is_empty() {
        rows.push(Row::new(anchor.0, anchor.1, current));
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(text: &str, page: usize, x0: f64, top: f64) -> PositionedToken {
        PositionedToken::new(text, page, x0, top, x0 + 8.0 * text.len() as f64, top + 9.0)
    }

    #[test]
    fn test_empty_input() {
        assert!(group_rows(Vec::new(), 3.0).is_empty());
    }

    #[test]
    fn test_groups_by_tolerance_and_orders_tokens() {
        let rows = group_rows(
            vec![
                tok("150.00", 0, 400.0, 101.5),
                tok("02 ENE", 0, 10.0, 100.0),
                tok("tienda", 0, 80.0, 102.0),
                tok("03 ENE", 0, 10.0, 120.0),
            ],
            3.0,
        );
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].text(), "02 ENE tienda 150.00");
        assert_eq!(rows[0].anchor, 100.0);
        assert_eq!(rows[1].text(), "03 ENE");
    }

    #[test]
    fn test_anchor_not_chained() {
        // 100 -> 102.5 joins; 105 is within 3 of 102.5 but not of the anchor
        let rows = group_rows(
            vec![tok("a", 0, 0.0, 100.0), tok("b", 0, 20.0, 102.5), tok("c", 0, 40.0, 105.0)],
            3.0,
        );
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].text(), "c");
    }

    #[test]
    fn test_pages_never_mix() {
        let rows = group_rows(vec![tok("a", 1, 0.0, 100.0), tok("b", 0, 0.0, 100.0)], 3.0);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].page, 0);
        assert_eq!(rows[1].page, 1);
    }

    #[test]
    fn test_truncate_and_keep_from() {
        let row = Row::new(
            0,
            0.0,
            vec![tok("comision", 0, 0.0, 0.0), tok("10.00Total", 0, 100.0, 0.0), tok("x", 0, 200.0, 0.0)],
        );
        let text = row.text();
        let at = text.find("Total").unwrap();
        let head = row.truncate_before(at);
        assert_eq!(head.text(), "comision 10.00");
        let tail = row.keep_from(at);
        assert_eq!(tail.text(), "Total x");
        assert!(tail.tokens[0].bbox.x0 > 100.0);
    }
}
