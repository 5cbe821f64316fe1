//! # Query-string construction of a [`FilterState`]
//!
//! Front ends that cannot post a JSON filter state (the CLI, a query string) describe
//! custom-field filters with compact descriptors:
//!
//! | Descriptor              | Criterion                          |
//! |-------------------------|------------------------------------|
//! | `4:text:free wifi`      | text contains `free wifi`          |
//! | `1:any:veg,vegan`       | checkbox OR `[veg, vegan]`         |
//! | `1:checkbox:veg`        | checkbox OR `[veg]` (alias of any) |
//! | `1:all:veg,vegan`       | checkbox AND `[veg, vegan]`        |
//! | `2:radio:indoor`        | radio = `indoor`                   |
//! | `3:select:large`        | select = `large`                   |
//! | `5:open_now`            | opening hours open now             |
//!
//! Text values are taken verbatim (they may contain `:` or `,`); list values are split on
//! commas and trimmed.

use serde::Deserialize;

use crate::errors::FilterError;
use crate::filters::{FilterState, normalizers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    Text,
    Any,
    All,
    Radio,
    Select,
    OpenNow,
}

impl FilterOperator {
    pub fn parse(raw: &str) -> Result<Self, FilterError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "text" | "contains" => Ok(FilterOperator::Text),
            "any" | "or" | "checkbox" => Ok(FilterOperator::Any),
            "all" | "and" => Ok(FilterOperator::All),
            "radio" => Ok(FilterOperator::Radio),
            "select" | "eq" => Ok(FilterOperator::Select),
            "open_now" | "open" | "opening_hours_open_now" => Ok(FilterOperator::OpenNow),
            other => Err(FilterError::invalid_request(format!("Unsupported filter operator: {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterDescriptor {
    pub field: String,
    pub operator: FilterOperator,
    pub values: Vec<String>,
}

impl FilterDescriptor {
    /// Parse a `field:op[:values]` descriptor.
    pub fn parse(raw: &str) -> Result<Self, FilterError> {
        let parts: Vec<&str> = raw.splitn(3, ':').collect();
        if parts.len() < 2 {
            return Err(FilterError::invalid_request(format!("Invalid filter syntax: {raw}")));
        }

        let field = parts[0].trim();
        if field.is_empty() {
            return Err(FilterError::invalid_request(format!("Filter is missing a field id: {raw}")));
        }

        let operator = FilterOperator::parse(parts[1])?;
        let rest = parts.get(2).copied();

        let values = match (operator, rest) {
            (FilterOperator::OpenNow, None) => Vec::new(),
            (FilterOperator::OpenNow, Some(extra)) if extra.trim().is_empty() => Vec::new(),
            (FilterOperator::OpenNow, Some(extra)) => {
                return Err(FilterError::invalid_request(format!(
                    "open_now filter on {field} takes no value, got: {extra}"
                )));
            }
            (_, None) => {
                return Err(FilterError::invalid_request(format!("Filter on {field} requires a value")));
            }
            // Text filters take a single value (no splitting)
            (FilterOperator::Text, Some(value)) => vec![value.to_string()],
            (_, Some(value)) => value
                .split(',')
                .map(|segment| segment.trim().to_string())
                .filter(|segment| !segment.is_empty())
                .collect(),
        };

        Ok(Self {
            field: field.to_string(),
            operator,
            values,
        })
    }
}

/// Filter parameters as they arrive from a query string or the command line.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct FilterQuery {
    pub q: Option<String>,
    /// Selected categories. `None` leaves the category filter unset.
    pub categories: Option<Vec<String>>,
    /// Explicitly select no category at all.
    #[serde(default)]
    pub no_categories: bool,
    #[serde(default)]
    pub filter: Vec<String>,
}

impl FilterQuery {
    /// Merge the query into a filter state, overriding only what the query sets.
    pub fn apply_to(self, mut state: FilterState) -> Result<FilterState, FilterError> {
        if let Some(q) = self.q {
            state.searchtext = q;
        }

        if self.no_categories {
            if self.categories.as_ref().is_some_and(|selected| !selected.is_empty()) {
                return Err(FilterError::invalid_request(
                    "Cannot combine explicit categories with an empty category selection",
                ));
            }
            state.categories = Some(Default::default());
        } else if let Some(selected) = self.categories {
            let selected = selected
                .into_iter()
                .map(|category| category.trim().to_string())
                .filter(|category| !category.is_empty());
            state.categories = Some(selected.collect());
        }

        for raw in self.filter {
            let descriptor = FilterDescriptor::parse(&raw)?;
            let field = descriptor.field.clone();
            let criterion = normalizers::build_criterion(descriptor)?;
            state.set_criterion(field, criterion);
        }

        Ok(state)
    }

    pub fn into_state(self) -> Result<FilterState, FilterError> {
        self.apply_to(FilterState::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::FilterCriterion;

    #[test]
    fn parses_list_descriptors() {
        let descriptor = FilterDescriptor::parse("1:all: veg , vegan,").expect("descriptor should parse");
        assert_eq!(descriptor.field, "1");
        assert_eq!(descriptor.operator, FilterOperator::All);
        assert_eq!(descriptor.values, vec!["veg", "vegan"]);
    }

    #[test]
    fn text_values_keep_separators() {
        let descriptor = FilterDescriptor::parse("4:text:opens 08:00, daily").expect("descriptor should parse");
        assert_eq!(descriptor.values, vec!["opens 08:00, daily"]);
    }

    #[test]
    fn open_now_needs_no_value() {
        let descriptor = FilterDescriptor::parse("5:open_now").expect("descriptor should parse");
        assert_eq!(descriptor.operator, FilterOperator::OpenNow);
        assert!(descriptor.values.is_empty());
        assert!(FilterDescriptor::parse("5:open_now:yes").is_err());
    }

    #[test]
    fn rejects_malformed_descriptors() {
        for raw in ["", "1", ":any:x", "1:between:a", "1:any"] {
            let result = FilterDescriptor::parse(raw);
            assert!(
                matches!(result, Err(FilterError::InvalidRequest { .. })),
                "expected {raw:?} to be rejected"
            );
        }
    }

    #[test]
    fn query_builds_state() {
        let query = FilterQuery {
            q: Some("coffee".to_string()),
            categories: Some(vec!["cafe".to_string(), " ".to_string()]),
            no_categories: false,
            filter: vec!["1:any:vegan".to_string(), "5:open_now".to_string()],
        };

        let state = query.into_state().expect("query should parse");
        assert_eq!(state.searchtext, "coffee");
        assert_eq!(state.categories.as_ref().map(|c| c.len()), Some(1));

        let fields = state.customfields.expect("custom fields should be set");
        assert_eq!(fields.get("1"), Some(&FilterCriterion::any_of(["vegan"])));
        assert_eq!(fields.get("5"), Some(&FilterCriterion::OpeningHoursOpenNow));
    }

    #[test]
    fn no_categories_is_an_explicit_empty_selection() {
        let query = FilterQuery {
            no_categories: true,
            ..Default::default()
        };
        let state = query.into_state().expect("query should parse");
        assert_eq!(state.categories, Some(Default::default()));

        let conflicting = FilterQuery {
            no_categories: true,
            categories: Some(vec!["cafe".to_string()]),
            ..Default::default()
        };
        assert!(conflicting.into_state().is_err());
    }

    #[test]
    fn query_only_overrides_what_it_sets() {
        let base = FilterState::new()
            .with_search("kept")
            .with_criterion("2", FilterCriterion::radio("indoor"));
        let query = FilterQuery {
            filter: vec!["1:all:a,b".to_string()],
            ..Default::default()
        };

        let state = query.apply_to(base).expect("query should parse");
        assert_eq!(state.searchtext, "kept");
        assert_eq!(state.active_criteria().count(), 2);
    }
}
