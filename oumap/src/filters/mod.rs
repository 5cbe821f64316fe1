//! Marker filtering: criteria, filter state, predicates and the interactive session.

pub mod criteria;
pub mod engine;
pub mod normalizers;
pub mod session;
pub mod state;

pub use criteria::{CheckboxRelation, FilterCriterion};
pub use engine::{FilterOutcome, MarkerSet, matches, matches_categories, matches_criterion, matches_search_text};
pub use session::FilterSession;
pub use state::FilterState;
