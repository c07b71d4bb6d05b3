//! tally-ingest: positional table reconstruction over statement tokens.
//!
//! Stages, leaves first: [`normalize`], [`rows`], [`section`], [`classify`],
//! [`split`], [`extract`], [`validate`], [`merge`]. [`engine::Engine`] runs
//! them in order; [`profiles`] holds the built-in issuer presets.

pub mod classify;
pub mod engine;
pub mod extract;
pub mod merge;
pub mod normalize;
pub mod profiles;
pub mod rows;
pub mod section;
pub mod split;
pub mod validate;

pub use engine::{Engine, Extraction, ExtractionStats};
pub use normalize::{Normalizer, Passthrough, StatementNormalizer};
pub use profiles::{builtin_config, builtin_profile, BUILTIN};
pub use rows::Row;
pub use section::{SectionAction, SectionLocator, SectionState};
pub use validate::is_transaction;
