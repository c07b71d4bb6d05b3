//! Built-in issuer profiles.
//!
//! Each preset is ordinary configuration data: the same [`ProfileConfig`]
//! a user could write in TOML. Nothing in the engine looks at the name.

pub mod bbva_mx;
pub mod capital_one_us;
pub mod chase_debit;

use tally_core::{BankProfile, Error, ProfileConfig, Result, SectionPattern};

/// Name and one-line description of every preset.
pub const BUILTIN: &[(&str, &str)] = &[
    ("bbva_mx", "BBVA Mexico checking (Detalle de Movimientos Realizados)"),
    ("chase_debit", "Chase checking (TRANSACTION DETAIL, signed amount column)"),
    ("capital_one_us", "Capital One US credit card (Trans Date / Post Date)"),
];

pub fn builtin_config(name: &str) -> Result<ProfileConfig> {
    match name {
        "bbva_mx" => Ok(bbva_mx::config()),
        "chase_debit" => Ok(chase_debit::config()),
        "capital_one_us" => Ok(capital_one_us::config()),
        _ => Err(Error::UnknownProfile(name.to_string())),
    }
}

/// Compiled preset.
pub fn builtin_profile(name: &str) -> Result<BankProfile> {
    BankProfile::from_config(&builtin_config(name)?)
}

pub(crate) fn lit(s: &str) -> SectionPattern {
    SectionPattern::literal(s)
}

pub(crate) fn re(s: &str) -> SectionPattern {
    SectionPattern::regex(s)
}
