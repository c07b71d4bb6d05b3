//! tally-core: data model, grammars and bank profiles for statement table
//! reconstruction.

pub mod amount;
pub mod date;
pub mod error;
pub mod profile;
pub mod record;
pub mod schema;
pub mod section;
pub mod token;

pub use amount::{Amount, ParsedAmount};
pub use date::{DateGrammar, DateMatch, DateShape};
pub use error::{Error, Result};
pub use profile::{
    BankProfile, DateConfig, DebitCreditRule, DescriptionPolicy, LenientDate, ProfileConfig, Side,
    SummaryLabel, SummaryMetric,
};
pub use record::MovementRecord;
pub use schema::{ColumnRange, ColumnRole, ColumnSchema, Field};
pub use section::{MarkerHit, SectionBoundary, SectionMatcher, SectionPattern};
pub use token::{BBox, PositionedToken};
