//! Locale-specific date grammars.
//!
//! Statements rarely print a full date: `02 ENE`, `01/JUN`, `Jul 20`,
//! `04/22`, `15/03/2024`, or only the day. Each profile declares one
//! shape; the raw string is kept on the record, a `NaiveDate` is only built
//! on request.

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Declared shape of the date column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateShape {
    /// `02 ENE`, `01/JUN`, `02-Jan`
    DayMonthName,
    /// `Jul 20`, `JAN.05`
    MonthNameDay,
    /// `22/04`
    DayMonth,
    /// `04/22`
    MonthDay,
    /// `15/03/2024`, `15-MAR-24`
    DayMonthYear,
    /// `02`
    DayOnly,
    /// Issuer-specific pattern. Named groups `d`, `m`, `y` are used when present.
    Custom,
}

const DAY: &str = r"(?P<d>3[01]|[12]\d|0?[1-9])";
const MONTH_NUM: &str = r"(?P<m>1[0-2]|0?[1-9])";
const MONTH_NAME: &str = r"(?P<m>[a-z]{3})\.?";

const MONTHS: &[(&str, u32)] = &[
    ("ene", 1),
    ("jan", 1),
    ("feb", 2),
    ("mar", 3),
    ("abr", 4),
    ("apr", 4),
    ("may", 5),
    ("jun", 6),
    ("jul", 7),
    ("ago", 8),
    ("aug", 8),
    ("sep", 9),
    ("set", 9),
    ("oct", 10),
    ("nov", 11),
    ("dic", 12),
    ("dec", 12),
];

fn month_from_name(name: &str) -> Option<u32> {
    let lower = name.to_lowercase();
    MONTHS.iter().find(|(n, _)| *n == lower).map(|(_, m)| *m)
}

/// A date recognized at the start of a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateMatch {
    /// Byte length of the recognized date within the input.
    pub len: usize,
    pub day: Option<u32>,
    pub month: Option<u32>,
    pub year: Option<i32>,
}

/// Compiled date grammar for one profile.
#[derive(Debug, Clone)]
pub struct DateGrammar {
    shape: DateShape,
    re: Regex,
}

impl DateGrammar {
    /// `pattern` is only read for [`DateShape::Custom`].
    pub fn new(shape: DateShape, pattern: Option<&str>) -> Result<Self> {
        let body = match shape {
            DateShape::DayMonthName => format!(r"{DAY}[\s/\-.]?{MONTH_NAME}"),
            DateShape::MonthNameDay => format!(r"{MONTH_NAME}\s*{DAY}"),
            DateShape::DayMonth => format!(r"{DAY}[/\-.]{MONTH_NUM}"),
            DateShape::MonthDay => format!(r"{MONTH_NUM}[/\-.]{DAY}"),
            DateShape::DayMonthYear => format!(
                r"{DAY}[/\-.\s](?P<m>1[0-2]|0?[1-9]|[a-z]{{3}})[/\-.\s](?P<y>\d{{4}}|\d{{2}})"
            ),
            DateShape::DayOnly => DAY.to_string(),
            DateShape::Custom => pattern.unwrap_or("").to_string(),
        };
        let re = Regex::new(&format!(r"(?i)^(?:{body})"))?;
        Ok(Self { shape, re })
    }

    pub fn shape(&self) -> &DateShape {
        &self.shape
    }

    /// Recognize a date at the start of `text` (leading whitespace is not
    /// skipped). The date must end the string or be followed by a
    /// separator; `02ENEtienda` is rejected rather than guessed.
    pub fn match_prefix(&self, text: &str) -> Option<DateMatch> {
        let caps = self.re.captures(text)?;
        let whole = caps.get(0)?;
        if whole.end() == 0 {
            return None;
        }
        if let Some(next) = text[whole.end()..].chars().next() {
            if !(next.is_whitespace() || matches!(next, ',' | ';' | ':' | ')' | '|')) {
                return None;
            }
        }

        let day = caps.name("d").and_then(|m| m.as_str().parse::<u32>().ok());
        let month = match caps.name("m") {
            Some(m) => {
                let s = m.as_str();
                match s.parse::<u32>() {
                    Ok(n) => Some(n),
                    Err(_) => Some(month_from_name(s)?),
                }
            }
            None => None,
        };
        let year = caps.name("y").and_then(|m| {
            let s = m.as_str();
            let y: i32 = s.parse().ok()?;
            Some(if s.len() == 2 { 2000 + y } else { y })
        });

        // Day/month combination must exist on a calendar; a leap year
        // stands in when the year is not printed.
        if let (Some(d), Some(m)) = (day, month) {
            NaiveDate::from_ymd_opt(year.unwrap_or(2000), m, d)?;
        }

        Some(DateMatch {
            len: whole.end(),
            day,
            month,
            year,
        })
    }

    /// The whole (trimmed) string is a date of this grammar.
    pub fn is_exact(&self, text: &str) -> bool {
        let t = text.trim();
        !t.is_empty() && self.match_prefix(t).is_some_and(|m| m.len == t.len())
    }

    /// Split `text` into `(date, remainder)` when it starts with a date.
    pub fn split_prefix<'a>(&self, text: &'a str) -> Option<(&'a str, &'a str)> {
        let t = text.trim_start();
        let m = self.match_prefix(t)?;
        Some((t[..m.len].trim_end(), t[m.len..].trim()))
    }

    /// Resolve a raw date to a calendar date. `year` fills in shapes that do
    /// not print one.
    pub fn to_date(&self, text: &str, year: i32) -> Option<NaiveDate> {
        let m = self.match_prefix(text.trim())?;
        NaiveDate::from_ymd_opt(m.year.unwrap_or(year), m.month?, m.day?)
    }
}
