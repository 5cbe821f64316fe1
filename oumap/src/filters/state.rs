use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::criteria::FilterCriterion;

/// The current combination of search text, category selection and custom-field criteria.
///
/// `categories: None` means no category filter has been applied yet and every marker
/// passes. `Some(empty)` is an explicit "nothing selected" and hides every categorized
/// marker.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterState {
    pub searchtext: String,
    pub categories: Option<BTreeSet<String>>,
    pub customfields: Option<BTreeMap<String, FilterCriterion>>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_search(mut self, text: impl Into<String>) -> Self {
        self.searchtext = text.into();
        self
    }

    #[inline]
    pub fn with_categories<S: Into<String>>(mut self, categories: impl IntoIterator<Item = S>) -> Self {
        self.categories = Some(categories.into_iter().map(Into::into).collect());
        self
    }

    #[inline]
    pub fn with_criterion(mut self, field_id: impl Into<String>, criterion: FilterCriterion) -> Self {
        self.set_criterion(field_id, criterion);
        self
    }

    /// Store a criterion for a field. An inactive criterion removes the entry instead.
    pub fn set_criterion(&mut self, field_id: impl Into<String>, criterion: FilterCriterion) {
        let field_id = field_id.into();
        if criterion.is_active() {
            self.customfields
                .get_or_insert_with(BTreeMap::new)
                .insert(field_id, criterion);
        } else {
            self.remove_criterion(&field_id);
        }
    }

    pub fn remove_criterion(&mut self, field_id: &str) -> Option<FilterCriterion> {
        self.customfields.as_mut().and_then(|fields| fields.remove(field_id))
    }

    /// Criteria that actually restrict the marker set.
    pub fn active_criteria(&self) -> impl Iterator<Item = (&str, &FilterCriterion)> {
        self.customfields
            .iter()
            .flat_map(|fields| fields.iter())
            .filter(|(_, criterion)| criterion.is_active())
            .map(|(field_id, criterion)| (field_id.as_str(), criterion))
    }

    /// The trimmed search needle, if any.
    pub fn search_needle(&self) -> Option<&str> {
        let trimmed = self.searchtext.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }

    /// `true` when nothing restricts the marker set.
    pub fn is_unrestricted(&self) -> bool {
        self.search_needle().is_none() && self.categories.is_none() && self.active_criteria().next().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_categories_differ_from_empty_set() {
        let unset: FilterState = serde_json::from_value(json!({ "categories": null })).unwrap();
        let empty: FilterState = serde_json::from_value(json!({ "categories": [] })).unwrap();

        assert_eq!(unset.categories, None);
        assert_eq!(empty.categories, Some(BTreeSet::new()));
        assert!(unset.is_unrestricted());
        assert!(!empty.is_unrestricted());
    }

    #[test]
    fn inactive_criterion_removes_existing_entry() {
        let mut state = FilterState::new().with_criterion("1", FilterCriterion::any_of(["veg"]));
        assert_eq!(state.active_criteria().count(), 1);

        state.set_criterion("1", FilterCriterion::any_of(Vec::<String>::new()));
        assert_eq!(state.active_criteria().count(), 0);
        assert_eq!(state.customfields, Some(BTreeMap::new()));
    }

    #[test]
    fn whitespace_search_is_no_search() {
        let state = FilterState::new().with_search("   ");
        assert_eq!(state.search_needle(), None);
        assert!(state.is_unrestricted());

        let state = FilterState::new().with_search("  Wien ");
        assert_eq!(state.search_needle(), Some("Wien"));
    }
}
