use std::collections::BTreeSet;

use chrono::NaiveDateTime;

use super::criteria::FilterCriterion;
use super::engine::{FilterOutcome, MarkerSet};
use super::state::FilterState;

/// A marker set together with the filter state driven by the map controls.
///
/// Every mutation recomputes the visible set immediately and returns the new outcome,
/// so callers never observe a state whose outcome is stale.
#[derive(Debug, Clone)]
pub struct FilterSession {
    markers: MarkerSet,
    state: FilterState,
    outcome: FilterOutcome,
}

impl FilterSession {
    pub fn new(markers: MarkerSet) -> Self {
        Self::with_state(markers, FilterState::default())
    }

    pub fn with_state(markers: MarkerSet, state: FilterState) -> Self {
        let outcome = markers.apply_filters(&state);
        Self {
            markers,
            state,
            outcome,
        }
    }

    #[inline]
    pub fn markers(&self) -> &MarkerSet {
        &self.markers
    }

    #[inline]
    pub fn state(&self) -> &FilterState {
        &self.state
    }

    #[inline]
    pub fn outcome(&self) -> &FilterOutcome {
        &self.outcome
    }

    #[inline]
    pub fn visible_count(&self) -> usize {
        self.outcome.count()
    }

    pub fn into_parts(self) -> (MarkerSet, FilterState, FilterOutcome) {
        (self.markers, self.state, self.outcome)
    }

    pub fn apply_filters(&mut self) -> &FilterOutcome {
        self.outcome = self.markers.apply_filters(&self.state);
        &self.outcome
    }

    pub fn set_search_text(&mut self, text: impl Into<String>) -> &FilterOutcome {
        self.state.searchtext = text.into();
        self.apply_filters()
    }

    /// Check or uncheck one category box.
    ///
    /// Before the first change every box is checked, so the selection starts from all
    /// categories present in the marker set.
    pub fn toggle_category(&mut self, category: &str, checked: bool) -> &FilterOutcome {
        let markers = &self.markers;
        let selected = self.state.categories.get_or_insert_with(|| markers.categories());
        if checked {
            selected.insert(category.to_string());
        } else {
            selected.remove(category);
        }
        self.apply_filters()
    }

    /// Replace the category selection. An empty iterator selects nothing.
    pub fn select_categories<S: Into<String>>(&mut self, categories: impl IntoIterator<Item = S>) -> &FilterOutcome {
        self.state.categories = Some(categories.into_iter().map(Into::into).collect::<BTreeSet<_>>());
        self.apply_filters()
    }

    /// Drop the category filter entirely.
    pub fn clear_categories(&mut self) -> &FilterOutcome {
        self.state.categories = None;
        self.apply_filters()
    }

    pub fn set_custom_field(&mut self, field_id: impl Into<String>, criterion: FilterCriterion) -> &FilterOutcome {
        self.state.set_criterion(field_id, criterion);
        self.apply_filters()
    }

    pub fn clear_custom_field(&mut self, field_id: &str) -> &FilterOutcome {
        self.state.remove_criterion(field_id);
        self.apply_filters()
    }

    pub fn replace_state(&mut self, state: FilterState) -> &FilterOutcome {
        self.state = state;
        self.apply_filters()
    }

    pub fn reset(&mut self) -> &FilterOutcome {
        self.replace_state(FilterState::default())
    }

    /// Recompute opening-hours flags for `at` and re-filter.
    pub fn refresh_open_now(&mut self, at: NaiveDateTime) -> &FilterOutcome {
        self.markers.refresh_open_now(at);
        self.apply_filters()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CustomFieldValue, FieldType, Location};

    fn session() -> FilterSession {
        FilterSession::new(MarkerSet::new(vec![
            Location::new(1, 0.0, 0.0, "Cafe").with_types(["cafe"]),
            Location::new(2, 0.0, 0.0, "Bar").with_types(["bar"]),
            Location::new(3, 0.0, 0.0, "Bar & Cafe").with_types(["bar", "cafe"]),
            Location::new(4, 0.0, 0.0, "Fountain"),
        ]))
    }

    #[test]
    fn starts_with_everything_visible() {
        let session = session();
        assert_eq!(session.visible_count(), 4);
        assert_eq!(session.state().categories, None);
    }

    #[test]
    fn first_uncheck_starts_from_all_categories() {
        let mut session = session();
        let outcome = session.toggle_category("bar", false).clone();
        assert_eq!(outcome.visible, vec![1, 3, 4]);
        assert_eq!(
            session.state().categories,
            Some(BTreeSet::from(["cafe".to_string()]))
        );

        session.toggle_category("cafe", false);
        assert_eq!(session.outcome().visible, vec![4]);

        session.toggle_category("bar", true);
        assert_eq!(session.outcome().visible, vec![2, 3, 4]);
    }

    #[test]
    fn explicit_empty_selection_and_clear() {
        let mut session = session();
        session.select_categories(Vec::<String>::new());
        assert_eq!(session.outcome().visible, vec![4]);

        session.clear_categories();
        assert_eq!(session.visible_count(), 4);
    }

    #[test]
    fn search_and_reset() {
        let mut session = session();
        assert_eq!(session.set_search_text("bar").count(), 2);
        assert_eq!(session.reset().count(), 4);
        assert_eq!(session.state(), &FilterState::default());
    }

    #[test]
    fn custom_field_updates_recompute() {
        let mut session = FilterSession::new(MarkerSet::new(vec![
            Location::new(1, 0.0, 0.0, "A").with_field(CustomFieldValue::new("7", FieldType::Radio, "indoor")),
            Location::new(2, 0.0, 0.0, "B").with_field(CustomFieldValue::new("7", FieldType::Radio, "outdoor")),
        ]));

        assert_eq!(session.set_custom_field("7", FilterCriterion::radio("indoor")).visible, vec![1]);
        assert_eq!(session.set_custom_field("7", FilterCriterion::radio("")).visible, vec![1, 2]);
        session.set_custom_field("7", FilterCriterion::radio("outdoor"));
        assert_eq!(session.clear_custom_field("7").visible, vec![1, 2]);
    }
}
