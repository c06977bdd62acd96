//! Statement import engine: normalization, validation, merchant
//! categorization, duplicate detection, and the batch orchestrator that
//! commits surviving rows to the ledger store exactly once.

pub mod categorize;
pub mod dedupe;
pub mod normalize;
pub mod pipeline;
pub mod summary;
pub mod validate;
pub(crate) mod util;

pub use categorize::{categorize_rows, CategoryRule, CategoryRuleSet};
pub use dedupe::{detect_duplicates, DedupeOptions, DEFAULT_SIMILARITY_THRESHOLD};
pub use normalize::normalize_rows;
pub use pipeline::{ImportError, ImportResult, Importer};
pub use summary::ImportSummary;
pub use validate::{screen_rows, validate_rows, Screened, ValidationReport};
