//! CSV export and import of location snapshots.
//!
//! Layout: `post_id,title,content,lat,lng,types` followed by one column per custom
//! field, named `custom_field_<index>:<fieldtype>`. Multi-valued cells are joined with `|`.

use std::collections::BTreeMap;
use std::io;

use log::info;

use crate::errors::FilterError;
use crate::types::{CustomFieldValue, FieldType, FieldValue, Location, VALUE_SEPARATOR};

const BASE_COLUMNS: [&str; 6] = ["post_id", "title", "content", "lat", "lng", "types"];
const CUSTOM_FIELD_PREFIX: &str = "custom_field_";

/// Write locations as CSV. Returns the number of rows written.
pub fn write_csv<'a, W: io::Write>(
    writer: W,
    locations: impl IntoIterator<Item = &'a Location>,
) -> Result<usize, FilterError> {
    let locations: Vec<&Location> = locations.into_iter().collect();
    let columns = custom_field_columns(&locations);

    let mut csv_writer = csv::Writer::from_writer(writer);
    let mut header: Vec<String> = BASE_COLUMNS.iter().map(|c| c.to_string()).collect();
    header.extend(
        columns
            .iter()
            .map(|(index, fieldtype)| format!("{CUSTOM_FIELD_PREFIX}{index}:{}", fieldtype.as_str())),
    );
    csv_writer.write_record(&header)?;

    for location in &locations {
        let mut record = vec![
            location.post_id.to_string(),
            location.title.clone(),
            location.content.clone(),
            location.lat.to_string(),
            location.lng.to_string(),
            join_values(&location.types),
        ];
        for (index, _) in &columns {
            record.push(location.custom_field(index).map(|field| cell_text(&field.val)).unwrap_or_default());
        }
        csv_writer.write_record(&record)?;
    }

    csv_writer.flush()?;
    info!("exported {} locations with {} custom field columns", locations.len(), columns.len());
    Ok(locations.len())
}

/// Read locations from CSV written by [`write_csv`] (or a hand-made file with the same
/// columns). `post_id`, `lat` and `lng` columns are required.
pub fn read_csv<R: io::Read>(reader: R) -> Result<Vec<Location>, FilterError> {
    let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = csv_reader.headers()?.clone();

    let position = |name: &str| headers.iter().position(|header| header.trim().eq_ignore_ascii_case(name));
    let require = |name: &str| {
        position(name).ok_or_else(|| FilterError::invalid_request(format!("CSV is missing the '{name}' column")))
    };
    let post_id_col = require("post_id")?;
    let lat_col = require("lat")?;
    let lng_col = require("lng")?;
    let title_col = position("title");
    let content_col = position("content");
    let types_col = position("types");

    let field_cols: Vec<(usize, String, FieldType)> = headers
        .iter()
        .enumerate()
        .filter_map(|(col, header)| {
            let column = header.trim().strip_prefix(CUSTOM_FIELD_PREFIX)?;
            let (index, fieldtype) = match column.split_once(':') {
                Some((index, fieldtype)) => (index, FieldType::from_name(fieldtype)),
                None => (column, FieldType::Unknown),
            };
            (!index.is_empty()).then(|| (col, index.to_string(), fieldtype))
        })
        .collect();

    let mut locations = Vec::new();
    for (row, record) in csv_reader.records().enumerate() {
        let record = record?;
        let line = row + 2;
        let cell = |col: usize| record.get(col).map(str::trim).unwrap_or_default();
        let number = |col: usize, name: &str| -> Result<f64, FilterError> {
            cell(col)
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
                .ok_or_else(|| FilterError::invalid_request(format!("line {line}: invalid {name} '{}'", cell(col))))
        };

        let post_id = cell(post_id_col)
            .parse::<u64>()
            .map_err(|_| FilterError::invalid_request(format!("line {line}: invalid post_id '{}'", cell(post_id_col))))?;
        let mut location = Location::new(post_id, number(lat_col, "lat")?, number(lng_col, "lng")?, "");
        if let Some(col) = title_col {
            location.title = cell(col).to_string();
        }
        if let Some(col) = content_col {
            location.content = record.get(col).unwrap_or_default().to_string();
        }
        if let Some(col) = types_col {
            location.types = split_values(cell(col));
        }
        for (col, index, fieldtype) in &field_cols {
            let value = cell(*col);
            if !value.is_empty() {
                location
                    .custom_fields
                    .push(CustomFieldValue::new(index.clone(), *fieldtype, value));
            }
        }
        locations.push(location);
    }

    info!("imported {} locations from csv", locations.len());
    Ok(locations)
}

fn custom_field_columns(locations: &[&Location]) -> Vec<(String, FieldType)> {
    let mut columns: BTreeMap<(u64, String), FieldType> = BTreeMap::new();
    for field in locations.iter().flat_map(|location| location.custom_fields.iter()) {
        let key = (field.index.parse::<u64>().unwrap_or(u64::MAX), field.index.clone());
        columns.entry(key).or_insert(field.fieldtype);
    }
    columns
        .into_iter()
        .map(|((_, index), fieldtype)| (index, fieldtype))
        .collect()
}

// Values that can never match a filter are written as empty cells so they stay unmatched after import.
fn cell_text(value: &FieldValue) -> String {
    match value {
        FieldValue::Missing | FieldValue::Other(_) => String::new(),
        FieldValue::Text(text) => text.clone(),
        FieldValue::List(items) => join_values(items),
    }
}

fn join_values(values: &[String]) -> String {
    values.join(&VALUE_SEPARATOR.to_string())
}

fn split_values(cell: &str) -> Vec<String> {
    cell.split(VALUE_SEPARATOR)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{FilterCriterion, FilterState, MarkerSet};

    fn sample() -> Vec<Location> {
        vec![
            Location::new(10, 48.2, 16.37, "Café, \"Central\"")
                .with_content("<p>Line one\nline two</p>")
                .with_types(["cafe", "historic"])
                .with_field(CustomFieldValue::new("2", FieldType::Checkbox, vec!["veg".to_string(), "vegan".to_string()]))
                .with_field(CustomFieldValue::new("10", FieldType::OpeningHours, "Mo-Fr 08:00-18:00")),
            Location::new(11, 47.07, 15.44, "Kiosk"),
        ]
    }

    #[test]
    fn writes_header_with_sorted_custom_columns() {
        let mut buffer = Vec::new();
        let written = write_csv(&mut buffer, &sample()).expect("export should succeed");
        assert_eq!(written, 2);

        let text = String::from_utf8(buffer).expect("csv is utf-8");
        let header = text.lines().next().expect("header row");
        assert_eq!(
            header,
            "post_id,title,content,lat,lng,types,custom_field_2:checkbox,custom_field_10:opening_hours"
        );
    }

    #[test]
    fn imported_rows_still_filter_the_same_way() {
        let mut buffer = Vec::new();
        write_csv(&mut buffer, &sample()).expect("export should succeed");
        let imported = read_csv(buffer.as_slice()).expect("import should succeed");

        assert_eq!(imported.len(), 2);
        assert_eq!(imported[0].title, "Café, \"Central\"");
        assert_eq!(imported[0].content, "<p>Line one\nline two</p>");
        assert_eq!(imported[0].types, vec!["cafe", "historic"]);
        assert_eq!(
            imported[0].custom_field("10").map(|f| f.fieldtype),
            Some(FieldType::OpeningHours)
        );
        assert!(imported[1].custom_fields.is_empty());

        let state = FilterState::new().with_criterion("2", FilterCriterion::all_of(["veg", "vegan"]));
        assert_eq!(MarkerSet::new(imported).apply_filters(&state).visible, vec![10]);
    }

    #[test]
    fn import_requires_coordinates() {
        let missing_column = "post_id,title\n1,A\n";
        assert!(matches!(
            read_csv(missing_column.as_bytes()),
            Err(FilterError::InvalidRequest { .. })
        ));

        let bad_value = "post_id,lat,lng\n1,north,16.3\n";
        let err = read_csv(bad_value.as_bytes()).expect_err("invalid latitude");
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn import_accepts_untyped_custom_columns() {
        let csv = "post_id,lat,lng,types,custom_field_4\n7,1.5,2.5,park | playground,shade\n";
        let imported = read_csv(csv.as_bytes()).expect("import should succeed");
        assert_eq!(imported[0].types, vec!["park", "playground"]);
        let field = imported[0].custom_field("4").expect("custom field column");
        assert_eq!(field.fieldtype, FieldType::Unknown);
        assert_eq!(field.val, FieldValue::from("shade"));
    }

    #[test]
    fn unfilterable_values_stay_unmatched_after_import() {
        let odd = Location::new(5, 1.0, 2.0, "Odd")
            .with_field(CustomFieldValue::new("3", FieldType::Text, FieldValue::Other(serde_json::json!({ "a": 1 }))));
        let mut buffer = Vec::new();
        write_csv(&mut buffer, &[odd]).expect("export should succeed");

        let text = String::from_utf8(buffer).expect("csv is utf-8");
        assert!(!text.contains("\"a\""), "unexpected cell in {text}");

        let imported = read_csv(text.as_bytes()).expect("import should succeed");
        assert!(imported[0].custom_field("3").is_none());
        let state = FilterState::new().with_criterion("3", FilterCriterion::text("a"));
        assert!(MarkerSet::new(imported).apply_filters(&state).visible.is_empty());
    }
}
