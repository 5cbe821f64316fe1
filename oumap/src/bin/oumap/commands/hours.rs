use anyhow::{Context, Result};
use chrono::{Utc, Weekday};
use clap::Args;
use serde::Serialize;

use oumap::hours::{OpeningHours, local_time};
use oumap::OumapConfig;

use super::parse_local_time;
use crate::examples::ExampleGroup;
use crate::output::OutputManager;

pub const EXAMPLES: &[ExampleGroup] = &[ExampleGroup {
    title: "Opening Hours",
    commands: &[
        "oumap hours \"Mo-Fr 09:00-17:00 | Sa 10:00-14:00\"               # Open now?",
        "oumap hours \"Fr 20:00-02:00\" --at 2026-10-24T01:00             # Overnight span",
        "oumap --output json hours \"Mo-Su 00:00-24:00\"",
    ],
}];

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

#[derive(Args, Debug)]
pub struct HoursArgs {
    /// Weekly schedule, e.g. "Mo-Fr 09:00-17:00 | Sa 10:00-14:00 | Su closed"
    pub schedule: String,

    /// Local time to check (RFC 3339 or YYYY-MM-DDTHH:MM); defaults to now
    #[arg(long, value_name = "TIME")]
    pub at: Option<String>,
}

#[derive(Serialize)]
struct HoursReport {
    schedule: String,
    at: String,
    open: bool,
}

pub fn handle_hours(args: HoursArgs, config: &OumapConfig, output: &OutputManager) -> Result<()> {
    let hours = OpeningHours::parse(&args.schedule).context("Invalid schedule")?;
    let offset = config.hours.utc_offset_minutes;
    let at = match args.at.as_deref() {
        Some(raw) => parse_local_time(raw, offset)?,
        None => local_time(Utc::now(), offset)?,
    };
    let open = hours.is_open_at(at);

    if output.is_json() {
        let report = HoursReport {
            schedule: hours.to_string(),
            at: at.format("%Y-%m-%dT%H:%M:%S").to_string(),
            open,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    output.heading("Opening Hours");
    for (day, code) in WEEK.iter().zip(["Mo", "Tu", "We", "Th", "Fr", "Sa", "Su"]) {
        let spans = hours.spans(*day);
        let rendered = if spans.is_empty() {
            "closed".to_string()
        } else {
            spans.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
        };
        output.key_value(code, &rendered);
    }

    let when = at.format("%a %Y-%m-%d %H:%M").to_string();
    if open {
        output.success(&format!("Open at {when}"));
    } else {
        output.info(&format!("Closed at {when}"));
    }
    Ok(())
}
