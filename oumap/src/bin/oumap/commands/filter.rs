use anyhow::Result;
use clap::Args;
use comfy_table::{Cell, Table};
use serde::Serialize;

use oumap::geo::MapView;
use oumap::types::{FieldType, Location};
use oumap::{FilterSession, OumapConfig};

use super::{FilterArgs, prepare_session};
use crate::examples::ExampleGroup;
use crate::output::{GlobalOptions, OutputManager, TableDisplay, themed_table};
use crate::theme::ICONS;

pub const EXAMPLES: &[ExampleGroup] = &[
    ExampleGroup {
        title: "Search and Categories",
        commands: &[
            "oumap filter -l locations.json -s coffee            # Title/content search",
            "oumap filter -l locations.json -c cafe -c bar       # Only cafes and bars",
            "oumap filter -l locations.json --no-categories      # Only uncategorized pins",
        ],
    },
    ExampleGroup {
        title: "Custom Fields",
        commands: &[
            "oumap filter -l locations.json -f 1:any:veg,vegan   # Checkbox, any selected value",
            "oumap filter -l locations.json -f 1:all:veg,vegan   # Checkbox, every selected value",
            "oumap filter -l locations.json -f 5:open_now --now  # Open right now",
        ],
    },
    ExampleGroup {
        title: "Saved State and Viewport",
        commands: &[
            "oumap filter -l locations.json --state filters.toml --viewport",
            "oumap --output json filter -l locations.csv -s park",
        ],
    },
];

#[derive(Args, Debug)]
pub struct FilterCommandArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Also compute the map center and zoom that frame the visible markers
    #[arg(long)]
    pub viewport: bool,
}

#[derive(Debug, Serialize)]
pub struct LocationRow {
    pub post_id: u64,
    pub title: String,
    pub lat: f64,
    pub lng: f64,
    pub types: Vec<String>,
    /// `Some` when the location has at least one opening-hours field with a flag.
    pub open_now: Option<bool>,
}

impl From<&Location> for LocationRow {
    fn from(location: &Location) -> Self {
        let mut flags = location
            .custom_fields
            .iter()
            .filter(|field| field.fieldtype == FieldType::OpeningHours)
            .filter_map(|field| field.open_now)
            .peekable();
        let open_now = flags.peek().is_some().then(|| flags.any(|open| open));
        Self {
            post_id: location.post_id,
            title: location.title.clone(),
            lat: location.lat,
            lng: location.lng,
            types: location.types.clone(),
            open_now,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FilterReport {
    pub total: usize,
    pub visible: usize,
    pub locations: Vec<LocationRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<MapView>,
}

impl FilterReport {
    pub fn from_session(session: &FilterSession, view: Option<MapView>) -> Self {
        let outcome = session.outcome();
        Self {
            total: outcome.total,
            visible: outcome.count(),
            locations: session.markers().visible_locations(outcome).map(LocationRow::from).collect(),
            view,
        }
    }
}

impl TableDisplay for FilterReport {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        let mut table = themed_table(options, &["ID", "Title", "Lat", "Lng", "Categories", "Open now"]);
        for row in &self.locations {
            let open_now = match row.open_now {
                Some(true) => ICONS.check,
                Some(false) => ICONS.cross,
                None => "",
            };
            table.add_row(vec![
                Cell::new(row.post_id),
                Cell::new(&row.title),
                Cell::new(format!("{:.5}", row.lat)),
                Cell::new(format!("{:.5}", row.lng)),
                Cell::new(row.types.join(", ")),
                Cell::new(open_now),
            ]);
        }
        table
    }

    fn to_compact(&self) -> String {
        let ids: Vec<String> = self.locations.iter().map(|row| row.post_id.to_string()).collect();
        format!("{}/{} {}", self.visible, self.total, ids.join(","))
    }
}

pub fn handle_filter(args: FilterCommandArgs, config: &OumapConfig, output: &OutputManager) -> Result<()> {
    let session = prepare_session(&args.filter, config, output)?;

    output.heading("Visible Locations");
    for (field_id, criterion) in session.state().active_criteria() {
        output.verbose(&format!("field {field_id}: {}", criterion.describe()));
    }

    let view = if args.viewport {
        let view = session.markers().bounds_of(session.outcome()).map(|bounds| {
            let settings = &config.viewport;
            MapView::fit(bounds, settings.viewport(), settings.max_zoom, settings.padding)
        });
        if view.is_none() {
            output.warning("No visible locations, the map keeps its default view");
        }
        view
    } else {
        None
    };

    let report = FilterReport::from_session(&session, view);
    output.display(&report)?;

    output.info(&format!(
        "{} Showing {} of {} locations",
        ICONS.pin, report.visible, report.total
    ));
    if let Some(view) = &report.view {
        output.key_value(
            "Center",
            &format!("{:.5}, {:.5}", view.center.lat, view.center.lng),
        );
        output.key_value("Zoom", &view.zoom.to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use oumap::types::CustomFieldValue;
    use oumap::{FilterState, MarkerSet};

    #[test]
    fn report_lists_visible_rows_and_compact_summary() {
        let markers = MarkerSet::new(vec![
            Location::new(1, 48.2, 16.37, "Cafe")
                .with_types(["cafe"])
                .with_field(CustomFieldValue::new("5", FieldType::OpeningHours, "Mo 09:00-17:00").with_open_now(true)),
            Location::new(2, 48.1, 16.3, "Bar").with_types(["bar"]),
        ]);
        let session = FilterSession::with_state(markers, FilterState::new().with_categories(["cafe"]));

        let report = FilterReport::from_session(&session, None);
        assert_eq!(report.visible, 1);
        assert_eq!(report.locations[0].open_now, Some(true));
        assert_eq!(report.to_compact(), "1/2 1");

        let rendered = report.to_table(&GlobalOptions::default()).to_string();
        assert!(rendered.contains("Cafe"));
        assert!(!rendered.contains("Bar"));
    }
}
