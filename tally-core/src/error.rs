//! Configuration errors.
//!
//! Bad data never surfaces here: malformed tokens are rerouted and odd rows
//! rejected inside the engine. Only a profile that cannot describe a table
//! is fatal.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("profile {profile}: missing required column: {column}")]
    MissingColumn { profile: String, column: &'static str },

    #[error("profile {profile}: column {column} has an empty or inverted range ({x0}..{x1})")]
    InvalidRange {
        profile: String,
        column: String,
        x0: f64,
        x1: f64,
    },

    #[error("profile {profile}: text columns {first} and {second} overlap")]
    OverlappingColumns {
        profile: String,
        first: String,
        second: String,
    },

    #[error("profile {0}: section has no start pattern")]
    NoStartPattern(String),

    #[error("profile {profile}: custom date shape requires a pattern")]
    MissingDatePattern { profile: String },

    #[error("profile {profile}: row tolerance {row} must exceed split tolerance {split}")]
    Tolerances { profile: String, row: f64, split: f64 },

    #[error("invalid pattern: {0}")]
    Regex(#[from] regex::Error),

    #[error("unknown profile: {0}")]
    UnknownProfile(String),
}

pub type Result<T> = std::result::Result<T, Error>;
