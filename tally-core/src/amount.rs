//! Amount grammar.
//!
//! Accepted shapes: optional sign (leading, trailing, or parentheses),
//! optional currency mark, digit groups with a consistent thousands
//! separator, optional two-digit fraction. `1,234.56`, `1.234,56`,
//! `-$50.00`, `$ 5.82`, `150.00-`, `(75.00)`.
//!
//! Values are kept in integer cents.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Signed amount in cents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Amount(pub i64);

impl Amount {
    pub fn from_cents(cents: i64) -> Self {
        Amount(cents)
    }

    pub fn cents(&self) -> i64 {
        self.0
    }

    pub fn abs(&self) -> Amount {
        Amount(self.0.saturating_abs())
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Parse a whole string as an amount. See the module docs for accepted
    /// shapes; anything else returns `None`.
    pub fn parse(text: &str, require_decimals: bool) -> Option<Amount> {
        ParsedAmount::parse(text, require_decimals).map(|p| p.amount)
    }

    /// Convert a tolerance in currency units (`0.01`) to cents.
    pub fn from_units(units: f64) -> Amount {
        Amount((units * 100.0).round() as i64)
    }
}

impl std::ops::Add for Amount {
    type Output = Amount;
    fn add(self, rhs: Amount) -> Amount {
        Amount(self.0.saturating_add(rhs.0))
    }
}

impl std::ops::Sub for Amount {
    type Output = Amount;
    fn sub(self, rhs: Amount) -> Amount {
        Amount(self.0.saturating_sub(rhs.0))
    }
}

impl std::iter::Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Amount {
        iter.fold(Amount(0), |acc, a| acc + a)
    }
}

impl fmt::Display for Amount {
    /// `-1,234.56`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let abs = self.0.unsigned_abs();
        let units = (abs / 100).to_string();
        let mut grouped = String::with_capacity(units.len() + units.len() / 3);
        for (i, ch) in units.chars().enumerate() {
            if i > 0 && (units.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{sign}{grouped}.{:02}", abs % 100)
    }
}

/// Result of matching the amount grammar against a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAmount {
    pub amount: Amount,
    /// The digits and separators exactly as printed, without sign or
    /// currency mark.
    pub literal: String,
    pub had_currency: bool,
}

fn shape_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"^(?P<open>\()?\s*(?P<s1>[-+])?\s*",
            r"(?P<cur>[$€£]|MXN|USD|EUR)?\s*(?P<s2>[-+])?\s*",
            r"(?P<num>\d[\d.,]*)",
            r"\s*(?P<s3>[-+])?\s*(?P<close>\))?$"
        ))
        .expect("amount shape regex")
    })
}

fn literal_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:[-+]\s?)?(?:[$€£]\s?)?(?:\d{1,3}(?:[.,]\d{3})+|\d+)[.,]\d{2}\b")
            .expect("amount literal regex")
    })
}

impl ParsedAmount {
    pub fn parse(text: &str, require_decimals: bool) -> Option<ParsedAmount> {
        let caps = shape_re().captures(text.trim())?;

        if caps.name("open").is_some() != caps.name("close").is_some() {
            return None;
        }
        let signs: Vec<&str> = ["s1", "s2", "s3"]
            .iter()
            .filter_map(|n| caps.name(n).map(|m| m.as_str()))
            .collect();
        if signs.len() > 1 || (caps.name("open").is_some() && !signs.is_empty()) {
            return None;
        }

        let num = &caps["num"];
        let (cents, has_decimals) = parse_number(num)?;
        if require_decimals && !has_decimals {
            return None;
        }

        let negative = caps.name("open").is_some() || signs.first() == Some(&"-");
        Some(ParsedAmount {
            amount: Amount(if negative { -cents } else { cents }),
            literal: num.to_string(),
            had_currency: caps.name("cur").is_some(),
        })
    }

    /// Literal with a leading minus when negative, for fields where the
    /// sign is meaningful (balances).
    pub fn signed_literal(&self) -> String {
        if self.amount.is_negative() {
            format!("-{}", self.literal)
        } else {
            self.literal.clone()
        }
    }
}

/// Split digits/separators into cents. Decimal part must be exactly two
/// digits; thousands groups must be consistent.
fn parse_number(num: &str) -> Option<(i64, bool)> {
    if !num.ends_with(|c: char| c.is_ascii_digit()) {
        return None;
    }

    let bytes = num.as_bytes();
    let n = bytes.len();
    let (int_part, frac, dec_sep) = if n >= 4
        && (bytes[n - 3] == b'.' || bytes[n - 3] == b',')
        && bytes[n - 2].is_ascii_digit()
        && bytes[n - 1].is_ascii_digit()
    {
        (&num[..n - 3], Some(&num[n - 2..]), Some(bytes[n - 3] as char))
    } else {
        (num, None, None)
    };

    let seps: Vec<char> = int_part.chars().filter(|c| !c.is_ascii_digit()).collect();
    let digits: String = if seps.is_empty() {
        if int_part.len() > 9 {
            return None;
        }
        int_part.to_string()
    } else {
        let sep = seps[0];
        if seps.iter().any(|&c| c != sep) || Some(sep) == dec_sep {
            return None;
        }
        let groups: Vec<&str> = int_part.split(sep).collect();
        let first_ok = (1..=3).contains(&groups[0].len());
        let rest_ok = groups[1..].iter().all(|g| g.len() == 3);
        if !first_ok || !rest_ok {
            return None;
        }
        groups.concat()
    };

    if digits.is_empty() || (digits.len() > 1 && digits.starts_with('0')) {
        return None;
    }

    let units: i64 = digits.parse().ok()?;
    let frac_cents = match frac {
        Some(f) => f.parse::<i64>().ok()?,
        None => 0,
    };
    let cents = units.checked_mul(100)?.checked_add(frac_cents)?;
    Some((cents, frac.is_some()))
}

/// Byte ranges of every decimal amount literal embedded in `text`.
pub fn find_amount_literals(text: &str) -> Vec<(usize, usize)> {
    literal_re()
        .find_iter(text)
        .map(|m| (m.start(), m.end()))
        .collect()
}

/// True when `text` contains at least one decimal amount literal.
pub fn contains_amount_literal(text: &str) -> bool {
    literal_re().is_match(text)
}

/// Remove decimal amount literals from free text and collapse whitespace.
pub fn strip_amount_literals(text: &str) -> String {
    let stripped = literal_re().replace_all(text, " ");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}
