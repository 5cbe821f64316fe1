//! oumap core library.
//!
//! Filters the location snapshot of an Open User Map page the same way the map's
//! search box, category checkboxes and custom-field controls do, plus the supporting
//! pieces around it: opening-hours evaluation, viewport fitting and CSV import/export.
//!
//! ```
//! use oumap::filters::{FilterCriterion, FilterState, MarkerSet};
//! use oumap::types::{CustomFieldValue, FieldType, Location};
//!
//! let markers = MarkerSet::new(vec![
//!     Location::new(1, 48.2, 16.37, "Green Bowl")
//!         .with_types(["cafe"])
//!         .with_field(CustomFieldValue::new("1", FieldType::Checkbox, "veg|vegan")),
//! ]);
//! let state = FilterState::new().with_criterion("1", FilterCriterion::any_of(["vegan"]));
//! assert_eq!(markers.apply_filters(&state).visible, vec![1]);
//! ```

pub mod config;
pub mod errors;
pub mod export;
pub mod filters;
pub mod geo;
pub mod hours;
pub mod loader;
pub mod search;
pub mod types;

pub use config::OumapConfig;
pub use errors::*;
pub use filters::{CheckboxRelation, FilterCriterion, FilterOutcome, FilterSession, FilterState, MarkerSet};
pub use hours::OpeningHours;
pub use search::FilterQuery;
pub use types::{CustomFieldValue, FieldType, FieldValue, Location};
