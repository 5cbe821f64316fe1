//! Value normalizers shared by the predicates and the descriptor builders
//!
//! Field values come from WordPress post meta in whatever shape the form stored them.
//! Everything here is total: malformed input normalizes to "no value" rather than failing.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::errors::FilterError;
use crate::filters::criteria::{CheckboxRelation, FilterCriterion};
use crate::search::{FilterDescriptor, FilterOperator};
use crate::types::{FieldValue, VALUE_SEPARATOR};

static TAG_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->|<[^>]*>").expect("valid tag pattern"));
static ENTITY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z]+);").expect("valid entity pattern"));
static WHITESPACE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

/// Remove markup from post content, decode common entities and collapse whitespace.
pub fn strip_html(content: &str) -> String {
    if content.is_empty() {
        return String::new();
    }
    let without_tags = TAG_PATTERN.replace_all(content, " ");
    let decoded = ENTITY_PATTERN.replace_all(&without_tags, |caps: &Captures| decode_entity(&caps[1], &caps[0]));
    collapse_whitespace(&decoded)
}

/// Trim and fold every whitespace run into a single space.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_PATTERN.replace_all(text.trim(), " ").into_owned()
}

fn decode_entity(name: &str, original: &str) -> String {
    let decoded = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
        u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
    } else if let Some(decimal) = name.strip_prefix('#') {
        decimal.parse::<u32>().ok().and_then(char::from_u32)
    } else {
        match name {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            "nbsp" => Some(' '),
            "ndash" => Some('\u{2013}'),
            "mdash" => Some('\u{2014}'),
            "hellip" => Some('\u{2026}'),
            _ => None,
        }
    };
    decoded.map(String::from).unwrap_or_else(|| original.to_string())
}

/// Normalize a field value into a list of trimmed, non-empty strings.
///
/// A string is split on `|`; lists are trimmed element-wise. Missing values and
/// unsupported JSON shapes yield an empty list.
pub fn normalize_field_values(value: &FieldValue) -> Vec<String> {
    match value {
        FieldValue::Text(text) => text
            .split(VALUE_SEPARATOR)
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect(),
        FieldValue::List(items) => items
            .iter()
            .map(|item| item.trim())
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect(),
        FieldValue::Missing | FieldValue::Other(_) => Vec::new(),
    }
}

/// Textual form of a field value used by text filters. `None` when there is nothing to match.
pub fn field_text(value: &FieldValue) -> Option<String> {
    let text = match value {
        FieldValue::Text(text) => text.trim().to_string(),
        FieldValue::List(_) => normalize_field_values(value).join(" | "),
        FieldValue::Missing | FieldValue::Other(_) => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Case-insensitive substring test.
#[inline]
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn single_value(descriptor: FilterDescriptor) -> Result<String, FilterError> {
    let field = descriptor.field;
    descriptor
        .values
        .into_iter()
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
        .ok_or_else(|| FilterError::invalid_request(format!("Filter on {field} requires a value")))
}

/// Builds a text contains criterion
pub fn build_text_criterion(descriptor: FilterDescriptor) -> Result<FilterCriterion, FilterError> {
    if descriptor.operator != FilterOperator::Text {
        return Err(FilterError::invalid_request(format!(
            "Expected text operator for field {}",
            descriptor.field
        )));
    }
    single_value(descriptor).map(FilterCriterion::text)
}

/// Builds a checkbox criterion; the operator picks the relation
pub fn build_checkbox_criterion(descriptor: FilterDescriptor) -> Result<FilterCriterion, FilterError> {
    let relation = match descriptor.operator {
        FilterOperator::Any => CheckboxRelation::Or,
        FilterOperator::All => CheckboxRelation::And,
        other => {
            return Err(FilterError::invalid_request(format!(
                "Operator {other:?} is not a checkbox operator for field {}",
                descriptor.field
            )));
        }
    };
    if descriptor.values.is_empty() {
        return Err(FilterError::invalid_request(format!(
            "Checkbox filter on {} requires at least one value",
            descriptor.field
        )));
    }
    Ok(FilterCriterion::checkbox(descriptor.values, relation))
}

/// Builds a radio or select criterion (single selected value)
pub fn build_choice_criterion(descriptor: FilterDescriptor) -> Result<FilterCriterion, FilterError> {
    match descriptor.operator {
        FilterOperator::Radio => single_value(descriptor).map(FilterCriterion::radio),
        FilterOperator::Select => single_value(descriptor).map(FilterCriterion::select),
        other => Err(FilterError::invalid_request(format!(
            "Operator {other:?} is not a choice operator for field {}",
            descriptor.field
        ))),
    }
}

/// Builds the appropriate criterion based on the operator
pub fn build_criterion(descriptor: FilterDescriptor) -> Result<FilterCriterion, FilterError> {
    match descriptor.operator {
        FilterOperator::Text => build_text_criterion(descriptor),
        FilterOperator::Any | FilterOperator::All => build_checkbox_criterion(descriptor),
        FilterOperator::Radio | FilterOperator::Select => build_choice_criterion(descriptor),
        FilterOperator::OpenNow => Ok(FilterCriterion::OpeningHoursOpenNow),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(field: &str, operator: FilterOperator, values: &[&str]) -> FilterDescriptor {
        FilterDescriptor {
            field: field.to_string(),
            operator,
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    #[test]
    fn strips_tags_and_decodes_entities() {
        let content = "<p>Fish &amp; Chips</p>\n<!-- hidden -->\n<strong>&quot;best&quot;</strong>&nbsp;in&#32;town &#x2764;";
        assert_eq!(strip_html(content), "Fish & Chips \"best\" in town \u{2764}");
    }

    #[test]
    fn unknown_entities_are_left_alone() {
        assert_eq!(strip_html("a &bogus; b"), "a &bogus; b");
        assert_eq!(strip_html(""), "");
    }

    #[test]
    fn splits_delimited_strings() {
        let value = FieldValue::from(" veg | vegan ||");
        assert_eq!(normalize_field_values(&value), vec!["veg", "vegan"]);

        let list = FieldValue::List(vec!["a".into(), " ".into(), " b ".into()]);
        assert_eq!(normalize_field_values(&list), vec!["a", "b"]);

        assert!(normalize_field_values(&FieldValue::Missing).is_empty());
        assert!(normalize_field_values(&FieldValue::Other(serde_json::json!(3))).is_empty());
    }

    #[test]
    fn field_text_handles_every_shape() {
        assert_eq!(field_text(&FieldValue::from(" Free WiFi ")), Some("Free WiFi".to_string()));
        assert_eq!(
            field_text(&FieldValue::List(vec!["a".into(), "b".into()])),
            Some("a | b".to_string())
        );
        assert_eq!(field_text(&FieldValue::from("")), None);
        assert_eq!(field_text(&FieldValue::Missing), None);
    }

    #[test]
    fn builds_criteria_from_descriptors() {
        assert_eq!(
            build_criterion(descriptor("1", FilterOperator::All, &["a", "b"])).unwrap(),
            FilterCriterion::all_of(["a", "b"])
        );
        assert_eq!(
            build_criterion(descriptor("2", FilterOperator::Select, &["", "large"])).unwrap(),
            FilterCriterion::select("large")
        );
        assert_eq!(
            build_criterion(descriptor("3", FilterOperator::OpenNow, &[])).unwrap(),
            FilterCriterion::OpeningHoursOpenNow
        );
    }

    #[test]
    fn builders_reject_missing_values() {
        assert!(build_criterion(descriptor("1", FilterOperator::Any, &[])).is_err());
        assert!(build_criterion(descriptor("1", FilterOperator::Text, &["  "])).is_err());
        assert!(build_checkbox_criterion(descriptor("1", FilterOperator::Radio, &["x"])).is_err());
        assert!(build_choice_criterion(descriptor("1", FilterOperator::Text, &["x"])).is_err());
    }
}
