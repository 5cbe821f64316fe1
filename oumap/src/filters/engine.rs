//! Marker filter predicate engine.
//!
//! Three predicate families decide whether a location is visible:
//!
//! - **search text**: substring match over `title | stripped content`
//! - **categories**: intersection of the location's types with the selection
//! - **custom fields**: every active criterion must match its field
//!
//! They are combined with AND. A recompute always evaluates every marker; nothing is
//! cached between calls except the lowercased search text of each location, which only
//! depends on the immutable snapshot.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use log::{debug, warn};
use serde::Serialize;

use super::criteria::{CheckboxRelation, FilterCriterion};
use super::normalizers::{collapse_whitespace, contains_ignore_case, field_text, normalize_field_values, strip_html};
use super::state::FilterState;
use crate::geo::Bounds;
use crate::types::{CustomFieldValue, FieldValue, Location};

/// Result of one full filter pass.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FilterOutcome {
    /// Visible post ids in snapshot order.
    pub visible: Vec<u64>,
    /// Number of locations evaluated.
    pub total: usize,
    /// Snapshot positions of the visible locations. Post ids may repeat, positions don't.
    #[serde(skip)]
    positions: Vec<usize>,
}

impl FilterOutcome {
    #[inline]
    pub fn count(&self) -> usize {
        self.visible.len()
    }

    #[inline]
    pub fn is_visible(&self, post_id: u64) -> bool {
        self.visible.contains(&post_id)
    }
}

/// The page's locations plus the lookups the predicates need.
#[derive(Debug, Clone, Default)]
pub struct MarkerSet {
    locations: Vec<Location>,
    haystacks: Vec<String>,
    by_id: HashMap<u64, usize>,
}

impl MarkerSet {
    pub fn new(locations: Vec<Location>) -> Self {
        let mut by_id = HashMap::with_capacity(locations.len());
        for (position, location) in locations.iter().enumerate() {
            if by_id.insert(location.post_id, position).is_some() {
                warn!("duplicate location post_id {} in snapshot", location.post_id);
            }
        }
        let haystacks = locations.iter().map(search_haystack).collect();
        Self {
            locations,
            haystacks,
            by_id,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    #[inline]
    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub(crate) fn locations_mut(&mut self) -> &mut [Location] {
        &mut self.locations
    }

    /// Location by post id. With duplicate ids the last occurrence wins.
    pub fn get(&self, post_id: u64) -> Option<&Location> {
        self.by_id.get(&post_id).map(|&position| &self.locations[position])
    }

    /// Every category assigned to at least one location.
    pub fn categories(&self) -> BTreeSet<String> {
        self.locations
            .iter()
            .flat_map(|location| location.types.iter().cloned())
            .collect()
    }

    /// Re-evaluate every location against `state`.
    pub fn apply_filters(&self, state: &FilterState) -> FilterOutcome {
        let needle = state.search_needle().map(search_needle);
        let categories = state.categories.as_ref();
        let criteria: Vec<(&str, &FilterCriterion)> = state.active_criteria().collect();

        let positions: Vec<usize> = self
            .locations
            .iter()
            .zip(&self.haystacks)
            .enumerate()
            .filter(|(_, (location, haystack))| {
                needle.as_deref().is_none_or(|needle| haystack.contains(needle))
                    && matches_categories(location, categories)
                    && criteria
                        .iter()
                        .all(|(field_id, criterion)| matches_criterion(location.custom_field(field_id), criterion))
            })
            .map(|(position, _)| position)
            .collect();
        let visible: Vec<u64> = positions.iter().map(|&position| self.locations[position].post_id).collect();

        debug!("filters applied: {} of {} locations visible", visible.len(), self.locations.len());

        FilterOutcome {
            visible,
            total: self.locations.len(),
            positions,
        }
    }

    /// Visible locations of an outcome computed on this set, in snapshot order.
    pub fn visible_locations<'a>(&'a self, outcome: &'a FilterOutcome) -> impl Iterator<Item = &'a Location> + 'a {
        outcome
            .positions
            .iter()
            .filter_map(move |&position| self.locations.get(position))
    }

    /// Bounding box of the visible markers, `None` when nothing is visible.
    pub fn bounds_of(&self, outcome: &FilterOutcome) -> Option<Bounds> {
        Bounds::from_points(self.visible_locations(outcome).map(Location::position))
    }
}

// Whitespace runs are folded on both sides, so title and content compare the same way.
fn search_haystack(location: &Location) -> String {
    collapse_whitespace(&format!("{} | {}", location.title, strip_html(&location.content))).to_lowercase()
}

fn search_needle(searchtext: &str) -> String {
    collapse_whitespace(searchtext).to_lowercase()
}

/// Does the location pass every predicate of `state`?
pub fn matches(location: &Location, state: &FilterState) -> bool {
    matches_search_text(location, &state.searchtext)
        && matches_categories(location, state.categories.as_ref())
        && matches_custom_fields(location, state.customfields.as_ref())
}

/// Text predicate over `title | stripped content`. Empty search text always passes.
pub fn matches_search_text(location: &Location, searchtext: &str) -> bool {
    let needle = searchtext.trim();
    if needle.is_empty() {
        return true;
    }
    search_haystack(location).contains(&search_needle(needle))
}

/// Category predicate.
///
/// Uncategorized locations always pass; an unset selection passes everything; an empty
/// selection rejects every categorized location.
pub fn matches_categories(location: &Location, categories: Option<&BTreeSet<String>>) -> bool {
    if location.types.is_empty() {
        return true;
    }
    match categories {
        None => true,
        Some(selected) => location.types.iter().any(|category| selected.contains(category)),
    }
}

/// Custom-field predicate: every active criterion must match its field.
pub fn matches_custom_fields(location: &Location, customfields: Option<&BTreeMap<String, FilterCriterion>>) -> bool {
    let Some(customfields) = customfields else {
        return true;
    };
    customfields
        .iter()
        .filter(|(_, criterion)| criterion.is_active())
        .all(|(field_id, criterion)| matches_criterion(location.custom_field(field_id), criterion))
}

/// Match one criterion against the location's field. Missing data never matches.
pub fn matches_criterion(field: Option<&CustomFieldValue>, criterion: &FilterCriterion) -> bool {
    let Some(field) = field else {
        return false;
    };

    // Non-string values never match, whatever the precomputed flag says.
    if field.val.is_empty() || matches!(field.val, FieldValue::Other(_)) {
        return false;
    }

    if let FilterCriterion::OpeningHoursOpenNow = criterion {
        return field.open_now == Some(true);
    }

    match criterion {
        FilterCriterion::Text { value } => {
            field_text(&field.val).is_some_and(|text| contains_ignore_case(&text, value.trim()))
        }
        FilterCriterion::Checkbox { values, relation } => {
            let present = normalize_field_values(&field.val);
            let mut wanted = values.iter().map(|value| value.trim()).filter(|value| !value.is_empty());
            match relation {
                CheckboxRelation::And => wanted.all(|value| present.iter().any(|p| p == value)),
                CheckboxRelation::Or => wanted.any(|value| present.iter().any(|p| p == value)),
            }
        }
        FilterCriterion::Radio { value } | FilterCriterion::Select { value } => {
            let wanted = value.trim();
            normalize_field_values(&field.val).iter().any(|present| present == wanted)
        }
        FilterCriterion::OpeningHoursOpenNow => false,
    }
}
