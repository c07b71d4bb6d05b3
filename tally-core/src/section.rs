//! Start/end markers delimiting the movement table.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A marker, either literal text or a regular expression.
///
/// Literals match case-insensitively and tolerate any run of whitespace
/// (including none) between their words, so `Detalle de Movimientos` also
/// finds `DETALLE DE  MOVIMIENTOS` and `DetalledeMovimientos`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SectionPattern {
    Literal(String),
    Pattern { regex: String },
}

impl SectionPattern {
    pub fn literal(s: impl Into<String>) -> Self {
        SectionPattern::Literal(s.into())
    }

    pub fn regex(s: impl Into<String>) -> Self {
        SectionPattern::Pattern { regex: s.into() }
    }

    /// Compile to a regular expression.
    pub fn compile(&self) -> Result<Regex> {
        let re = match self {
            SectionPattern::Literal(text) => {
                let words: Vec<String> = text.split_whitespace().map(regex::escape).collect();
                Regex::new(&format!(r"(?i){}", words.join(r"\s*")))?
            }
            SectionPattern::Pattern { regex } => Regex::new(regex)?,
        };
        Ok(re)
    }
}

/// Configured boundary of the movement table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionBoundary {
    /// Ordered alternatives: primary first, OCR-degraded variants after.
    pub start: Vec<SectionPattern>,
    #[serde(default)]
    pub end: Vec<SectionPattern>,
    /// Drop the whole row carrying the start marker. When false, text
    /// printed after the marker on that row is kept.
    #[serde(default = "default_true")]
    pub skip_header_row: bool,
}

fn default_true() -> bool {
    true
}

/// Where a marker was found inside a row's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerHit {
    /// Index of the alternative that matched (0 = primary).
    pub alternative: usize,
    pub start: usize,
    pub end: usize,
}

/// Compiled start/end patterns.
#[derive(Debug, Clone)]
pub struct SectionMatcher {
    start: Vec<Regex>,
    end: Vec<Regex>,
    pub skip_header_row: bool,
}

impl SectionMatcher {
    pub fn new(boundary: &SectionBoundary) -> Result<Self> {
        Ok(Self {
            start: boundary
                .start
                .iter()
                .map(SectionPattern::compile)
                .collect::<Result<_>>()?,
            end: boundary
                .end
                .iter()
                .map(SectionPattern::compile)
                .collect::<Result<_>>()?,
            skip_header_row: boundary.skip_header_row,
        })
    }

    fn first_hit(patterns: &[Regex], text: &str) -> Option<MarkerHit> {
        patterns.iter().enumerate().find_map(|(i, re)| {
            re.find(text).map(|m| MarkerHit {
                alternative: i,
                start: m.start(),
                end: m.end(),
            })
        })
    }

    /// First start alternative (in configured order) found in `text`.
    pub fn find_start(&self, text: &str) -> Option<MarkerHit> {
        Self::first_hit(&self.start, text)
    }

    /// Earliest end marker found in `text`.
    pub fn find_end(&self, text: &str) -> Option<MarkerHit> {
        self.end
            .iter()
            .enumerate()
            .filter_map(|(i, re)| {
                re.find(text).map(|m| MarkerHit {
                    alternative: i,
                    start: m.start(),
                    end: m.end(),
                })
            })
            .min_by_key(|h| h.start)
    }

    /// Cut `text` at the first end marker, if any.
    pub fn trim_at_end<'a>(&self, text: &'a str) -> &'a str {
        match self.find_end(text) {
            Some(hit) => text[..hit.start].trim_end(),
            None => text,
        }
    }
}
