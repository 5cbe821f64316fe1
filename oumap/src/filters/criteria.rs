use serde::{Deserialize, Serialize};

/// How multiple selected checkbox values combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CheckboxRelation {
    #[serde(rename = "AND", alias = "and")]
    And,
    #[default]
    #[serde(rename = "OR", alias = "or")]
    Or,
}

impl CheckboxRelation {
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            CheckboxRelation::And => "AND",
            CheckboxRelation::Or => "OR",
        }
    }
}

/// A filter applied to one custom field.
///
/// Serialized with a `type` tag so the JSON shape matches what the map page posts:
///
/// ```
/// use oumap::filters::{CheckboxRelation, FilterCriterion};
///
/// let criterion: FilterCriterion =
///     serde_json::from_str(r#"{"type":"checkbox","values":["vegan"],"relation":"OR"}"#).unwrap();
/// assert_eq!(criterion, FilterCriterion::checkbox(["vegan"], CheckboxRelation::Or));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FilterCriterion {
    Text {
        value: String,
    },
    Checkbox {
        values: Vec<String>,
        #[serde(default)]
        relation: CheckboxRelation,
    },
    Radio {
        value: String,
    },
    Select {
        value: String,
    },
    OpeningHoursOpenNow,
}

impl FilterCriterion {
    #[inline]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text { value: value.into() }
    }

    #[inline]
    pub fn checkbox<S: Into<String>>(values: impl IntoIterator<Item = S>, relation: CheckboxRelation) -> Self {
        Self::Checkbox {
            values: values.into_iter().map(Into::into).collect(),
            relation,
        }
    }

    /// Checkbox criterion matching when any selected value is present.
    #[inline]
    pub fn any_of<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Self {
        Self::checkbox(values, CheckboxRelation::Or)
    }

    /// Checkbox criterion matching only when every selected value is present.
    #[inline]
    pub fn all_of<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Self {
        Self::checkbox(values, CheckboxRelation::And)
    }

    #[inline]
    pub fn radio(value: impl Into<String>) -> Self {
        Self::Radio { value: value.into() }
    }

    #[inline]
    pub fn select(value: impl Into<String>) -> Self {
        Self::Select { value: value.into() }
    }

    #[inline]
    pub fn open_now() -> Self {
        Self::OpeningHoursOpenNow
    }

    /// A criterion without any selection does not restrict the marker set.
    pub fn is_active(&self) -> bool {
        match self {
            Self::Text { value } | Self::Radio { value } | Self::Select { value } => !value.trim().is_empty(),
            Self::Checkbox { values, .. } => values.iter().any(|value| !value.trim().is_empty()),
            Self::OpeningHoursOpenNow => true,
        }
    }

    #[inline]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Checkbox { .. } => "checkbox",
            Self::Radio { .. } => "radio",
            Self::Select { .. } => "select",
            Self::OpeningHoursOpenNow => "opening_hours_open_now",
        }
    }

    /// Short human readable form, e.g. `checkbox AND [veg, vegan]`.
    pub fn describe(&self) -> String {
        match self {
            Self::Text { value } => format!("text contains \"{value}\""),
            Self::Checkbox { values, relation } => {
                format!("checkbox {} [{}]", relation.as_str(), values.join(", "))
            }
            Self::Radio { value } => format!("radio = {value}"),
            Self::Select { value } => format!("select = {value}"),
            Self::OpeningHoursOpenNow => "open now".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_tagged_shapes() {
        let text: FilterCriterion = serde_json::from_value(json!({ "type": "text", "value": "wifi" })).unwrap();
        assert_eq!(text, FilterCriterion::text("wifi"));

        let all: FilterCriterion =
            serde_json::from_value(json!({ "type": "checkbox", "values": ["a", "b"], "relation": "AND" })).unwrap();
        assert_eq!(all, FilterCriterion::all_of(["a", "b"]));

        let defaulted: FilterCriterion =
            serde_json::from_value(json!({ "type": "checkbox", "values": ["a"] })).unwrap();
        assert_eq!(defaulted, FilterCriterion::any_of(["a"]));

        let open: FilterCriterion = serde_json::from_value(json!({ "type": "opening_hours_open_now" })).unwrap();
        assert_eq!(open, FilterCriterion::OpeningHoursOpenNow);
    }

    #[test]
    fn lowercase_relation_alias_is_accepted() {
        let criterion: FilterCriterion =
            serde_json::from_value(json!({ "type": "checkbox", "values": ["a"], "relation": "and" })).unwrap();
        assert_eq!(criterion, FilterCriterion::all_of(["a"]));
    }

    #[test]
    fn empty_selections_are_inactive() {
        assert!(!FilterCriterion::text("  ").is_active());
        assert!(!FilterCriterion::any_of(Vec::<String>::new()).is_active());
        assert!(!FilterCriterion::select("").is_active());
        assert!(FilterCriterion::open_now().is_active());
        assert!(FilterCriterion::radio("red").is_active());
    }
}
