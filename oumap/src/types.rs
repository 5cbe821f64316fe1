//! Location snapshot types as injected by the map page.
//!
//! WordPress stores post meta as strings, so ids and coordinates arrive either as JSON
//! numbers or numeric strings. The deserializers below accept both shapes and treat
//! `null`/missing collections as empty.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

use crate::geo::LatLng;

/// Separator used when a multi-valued field arrives as a single string.
pub const VALUE_SEPARATOR: char = '|';

/// A single user-submitted map marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(deserialize_with = "de_post_id")]
    pub post_id: u64,
    #[serde(deserialize_with = "de_coordinate")]
    pub lat: f64,
    #[serde(deserialize_with = "de_coordinate")]
    pub lng: f64,
    #[serde(default, deserialize_with = "de_string_or_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "de_string_or_empty")]
    pub content: String,
    #[serde(default, deserialize_with = "de_string_list")]
    pub types: Vec<String>,
    #[serde(default, deserialize_with = "de_custom_fields")]
    pub custom_fields: Vec<CustomFieldValue>,
}

impl Location {
    pub fn new(post_id: u64, lat: f64, lng: f64, title: impl Into<String>) -> Self {
        Self {
            post_id,
            lat,
            lng,
            title: title.into(),
            content: String::new(),
            types: Vec::new(),
            custom_fields: Vec::new(),
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_types<S: Into<String>>(mut self, types: impl IntoIterator<Item = S>) -> Self {
        self.types = types.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_field(mut self, field: CustomFieldValue) -> Self {
        self.custom_fields.push(field);
        self
    }

    #[inline]
    pub fn position(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }

    /// First custom field carrying the given index.
    pub fn custom_field(&self, index: &str) -> Option<&CustomFieldValue> {
        self.custom_fields.iter().find(|field| field.index == index)
    }
}

/// Admin-configurable custom field kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Link,
    Email,
    Checkbox,
    Radio,
    Select,
    OpeningHours,
    #[default]
    #[serde(other)]
    Unknown,
}

impl FieldType {
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Link => "link",
            FieldType::Email => "email",
            FieldType::Checkbox => "checkbox",
            FieldType::Radio => "radio",
            FieldType::Select => "select",
            FieldType::OpeningHours => "opening_hours",
            FieldType::Unknown => "unknown",
        }
    }

    /// Parse a stored type name; anything unrecognized is `Unknown`.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "text" => FieldType::Text,
            "link" => FieldType::Link,
            "email" => FieldType::Email,
            "checkbox" => FieldType::Checkbox,
            "radio" => FieldType::Radio,
            "select" => FieldType::Select,
            "opening_hours" => FieldType::OpeningHours,
            _ => FieldType::Unknown,
        }
    }
}

/// Raw value of a custom field exactly as it was stored.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    #[default]
    Missing,
    Text(String),
    List(Vec<String>),
    /// Any other JSON shape. Kept for round-tripping, never matches a filter.
    Other(JsonValue),
}

impl FieldValue {
    /// `true` for missing values, empty strings and empty lists.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Missing => true,
            FieldValue::Text(text) => text.trim().is_empty(),
            FieldValue::List(items) => items.iter().all(|item| item.trim().is_empty()),
            FieldValue::Other(_) => false,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        FieldValue::List(value)
    }
}

/// A custom field value attached to a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomFieldValue {
    #[serde(deserialize_with = "de_string_like")]
    pub index: String,
    #[serde(default)]
    pub fieldtype: FieldType,
    #[serde(default)]
    pub val: FieldValue,
    /// Precomputed "open right now" flag for opening-hours fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_now: Option<bool>,
}

impl CustomFieldValue {
    pub fn new(index: impl Into<String>, fieldtype: FieldType, val: impl Into<FieldValue>) -> Self {
        Self {
            index: index.into(),
            fieldtype,
            val: val.into(),
            open_now: None,
        }
    }

    pub fn with_open_now(mut self, open_now: bool) -> Self {
        self.open_now = Some(open_now);
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringLike {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl StringLike {
    fn into_string(self) -> String {
        match self {
            StringLike::Str(value) => value,
            StringLike::Int(value) => value.to_string(),
            StringLike::Float(value) => value.to_string(),
            StringLike::Bool(value) => value.to_string(),
        }
    }
}

fn de_string_like<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    StringLike::deserialize(deserializer).map(StringLike::into_string)
}

fn de_string_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<StringLike> = Option::deserialize(deserializer)?;
    Ok(value.map(StringLike::into_string).unwrap_or_default())
}

fn de_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values: Option<Vec<StringLike>> = Option::deserialize(deserializer)?;
    Ok(values
        .unwrap_or_default()
        .into_iter()
        .map(StringLike::into_string)
        .collect())
}

fn de_custom_fields<'de, D>(deserializer: D) -> Result<Vec<CustomFieldValue>, D::Error>
where
    D: Deserializer<'de>,
{
    let values: Option<Vec<CustomFieldValue>> = Option::deserialize(deserializer)?;
    Ok(values.unwrap_or_default())
}

fn de_post_id<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match StringLike::deserialize(deserializer)? {
        StringLike::Int(value) => u64::try_from(value).map_err(|_| D::Error::custom(format!("invalid post_id: {value}"))),
        StringLike::Str(value) => value
            .trim()
            .parse::<u64>()
            .map_err(|_| D::Error::custom(format!("invalid post_id: {value}"))),
        StringLike::Float(value) => Err(D::Error::custom(format!("invalid post_id: {value}"))),
        StringLike::Bool(value) => Err(D::Error::custom(format!("invalid post_id: {value}"))),
    }
}

fn de_coordinate<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let parsed = match StringLike::deserialize(deserializer)? {
        StringLike::Int(value) => value as f64,
        StringLike::Float(value) => value,
        StringLike::Str(value) => value
            .trim()
            .parse::<f64>()
            .map_err(|_| D::Error::custom(format!("invalid coordinate: {value}")))?,
        StringLike::Bool(value) => return Err(D::Error::custom(format!("invalid coordinate: {value}"))),
    };
    if parsed.is_finite() {
        Ok(parsed)
    } else {
        Err(D::Error::custom(format!("invalid coordinate: {parsed}")))
    }
}
