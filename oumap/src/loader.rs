//! Loading location snapshots and saved filter states from disk.

use std::fs;
use std::path::Path;

use log::{info, warn};
use serde_json::Value as JsonValue;

use crate::errors::FilterError;
use crate::export;
use crate::filters::FilterState;
use crate::types::Location;

/// Locations read from a snapshot plus the entries that could not be used.
#[derive(Debug, Clone, Default)]
pub struct LoadedLocations {
    pub locations: Vec<Location>,
    /// One message per skipped entry.
    pub skipped: Vec<String>,
}

/// Parse the JSON array the map page is rendered with.
///
/// Entries that do not describe a usable location are skipped with a warning so one
/// broken legacy post cannot take the whole map down.
pub fn parse_locations_json(json: &str) -> Result<LoadedLocations, FilterError> {
    let entries = match serde_json::from_str::<JsonValue>(json)? {
        JsonValue::Array(entries) => entries,
        JsonValue::Object(mut object) => match object.remove("locations") {
            Some(JsonValue::Array(entries)) => entries,
            _ => {
                return Err(FilterError::invalid_request(
                    "expected a JSON array of locations or an object with a 'locations' array",
                ));
            }
        },
        _ => {
            return Err(FilterError::invalid_request("expected a JSON array of locations"));
        }
    };

    let mut loaded = LoadedLocations::default();
    for (position, entry) in entries.into_iter().enumerate() {
        match serde_json::from_value::<Location>(entry) {
            Ok(location) => loaded.locations.push(location),
            Err(err) => {
                let message = format!("entry {position}: {err}");
                warn!("skipping location {message}");
                loaded.skipped.push(message);
            }
        }
    }
    Ok(loaded)
}

/// Load a snapshot from a `.json` or `.csv` file.
pub fn load_locations(path: &Path) -> Result<LoadedLocations, FilterError> {
    let loaded = if has_extension(path, "csv") {
        LoadedLocations {
            locations: export::read_csv(fs::File::open(path)?)?,
            skipped: Vec::new(),
        }
    } else {
        parse_locations_json(&fs::read_to_string(path)?)?
    };
    info!(
        "loaded {} locations from {} ({} skipped)",
        loaded.locations.len(),
        path.display(),
        loaded.skipped.len()
    );
    Ok(loaded)
}

/// Load a saved filter state from a `.toml` or `.json` file.
pub fn load_filter_state(path: &Path) -> Result<FilterState, FilterError> {
    let content = fs::read_to_string(path)?;
    let state = if has_extension(path, "toml") {
        toml::from_str(&content)?
    } else {
        serde_json::from_str(&content)?
    };
    Ok(state)
}

fn has_extension(path: &Path, expected: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(expected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::FilterCriterion;
    use std::io::Write;

    #[test]
    fn skips_broken_entries() {
        let json = r#"[
            {"post_id": 1, "lat": "48.2", "lng": "16.3", "title": "Ok"},
            {"post_id": 2, "lat": "not a number", "lng": 0},
            {"title": "no id"}
        ]"#;
        let loaded = parse_locations_json(json).expect("array should parse");
        assert_eq!(loaded.locations.len(), 1);
        assert_eq!(loaded.skipped.len(), 2);
        assert!(loaded.skipped[0].starts_with("entry 1"));
    }

    #[test]
    fn accepts_wrapped_snapshot() {
        let loaded = parse_locations_json(r#"{"locations": [{"post_id": 3, "lat": 1, "lng": 2}]}"#).unwrap();
        assert_eq!(loaded.locations[0].post_id, 3);

        assert!(parse_locations_json(r#"{"items": []}"#).is_err());
        assert!(parse_locations_json("42").is_err());
        assert!(matches!(parse_locations_json("[").unwrap_err(), FilterError::Json(_)));
    }

    #[test]
    fn loads_toml_and_json_states() {
        let dir = tempfile::tempdir().unwrap();

        let toml_path = dir.path().join("state.toml");
        let mut file = fs::File::create(&toml_path).unwrap();
        writeln!(
            file,
            r#"searchtext = "cafe"
categories = ["bar"]

[customfields.1]
type = "checkbox"
values = ["veg", "vegan"]
relation = "AND"
"#
        )
        .unwrap();
        let state = load_filter_state(&toml_path).unwrap();
        assert_eq!(state.searchtext, "cafe");
        assert_eq!(
            state.customfields.as_ref().and_then(|fields| fields.get("1")),
            Some(&FilterCriterion::all_of(["veg", "vegan"]))
        );

        let json_path = dir.path().join("state.json");
        fs::write(&json_path, r#"{"categories": [], "customfields": {"5": {"type": "opening_hours_open_now"}}}"#)
            .unwrap();
        let state = load_filter_state(&json_path).unwrap();
        assert_eq!(state.categories, Some(Default::default()));
        assert_eq!(state.active_criteria().count(), 1);
    }

    #[test]
    fn loads_csv_snapshots_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("locations.CSV");
        fs::write(&path, "post_id,lat,lng,title\n5,1,2,Pier\n").unwrap();
        let loaded = load_locations(&path).unwrap();
        assert_eq!(loaded.locations[0].title, "Pier");
    }
}
