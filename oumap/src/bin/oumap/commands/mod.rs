pub mod export;
pub mod filter;
pub mod hours;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveDateTime, Utc};
use clap::Args;

use oumap::filters::{FilterSession, FilterState, MarkerSet};
use oumap::{FilterQuery, OumapConfig, hours::local_time, loader};

use crate::output::OutputManager;

const LOCAL_TIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

/// Flags shared by every command that filters a snapshot
#[derive(Args, Debug, Clone)]
pub struct FilterArgs {
    /// Location snapshot (.json array or .csv export)
    #[arg(short = 'l', long, value_name = "FILE")]
    pub locations: PathBuf,

    /// Saved filter state (.json or .toml); flags below override it
    #[arg(long, value_name = "FILE")]
    pub state: Option<PathBuf>,

    /// Search text matched against title and content
    #[arg(short = 's', long)]
    pub search: Option<String>,

    /// Selected category (repeatable)
    #[arg(short = 'c', long = "category", value_name = "CATEGORY")]
    pub categories: Vec<String>,

    /// Select no category at all (hides every categorized location)
    #[arg(long, conflicts_with = "categories")]
    pub no_categories: bool,

    /// Custom field filter `field:op[:values]`, op is text|any|all|radio|select|open_now (repeatable)
    #[arg(short = 'f', long = "filter", value_name = "DESCRIPTOR")]
    pub filters: Vec<String>,

    /// Recompute opening hours at this local time (RFC 3339 or YYYY-MM-DDTHH:MM)
    #[arg(long, value_name = "TIME", conflicts_with = "now")]
    pub at: Option<String>,

    /// Recompute opening hours at the current time
    #[arg(long)]
    pub now: bool,
}

impl FilterArgs {
    fn query(&self) -> FilterQuery {
        FilterQuery {
            q: self.search.clone(),
            categories: (!self.categories.is_empty()).then(|| self.categories.clone()),
            no_categories: self.no_categories,
            filter: self.filters.clone(),
        }
    }

    fn evaluation_time(&self, config: &OumapConfig) -> Result<Option<NaiveDateTime>> {
        let offset = config.hours.utc_offset_minutes;
        if self.now {
            return Ok(Some(local_time(Utc::now(), offset)?));
        }
        self.at.as_deref().map(|raw| parse_local_time(raw, offset)).transpose()
    }
}

/// Load the snapshot, build the filter state and run the first filter pass.
pub fn prepare_session(args: &FilterArgs, config: &OumapConfig, output: &OutputManager) -> Result<FilterSession> {
    let loaded = loader::load_locations(&args.locations)
        .with_context(|| format!("Failed to load locations from {}", args.locations.display()))?;
    for skipped in &loaded.skipped {
        output.warning(&format!("Skipped {skipped}"));
    }

    let base = match &args.state {
        Some(path) => loader::load_filter_state(path)
            .with_context(|| format!("Failed to load filter state from {}", path.display()))?,
        None => FilterState::default(),
    };
    let state = args.query().apply_to(base).context("Invalid filter arguments")?;

    let mut markers = MarkerSet::new(loaded.locations);
    if let Some(at) = args.evaluation_time(config)? {
        let updated = markers.refresh_open_now(at);
        output.verbose(&format!("Recomputed {updated} opening hours fields at {at}"));
    }

    Ok(FilterSession::with_state(markers, state))
}

/// Parse a user supplied time into site-local wall-clock time.
///
/// Times with an offset are converted using the configured site offset; naive times are
/// taken as already local.
pub fn parse_local_time(raw: &str, utc_offset_minutes: i32) -> Result<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Ok(local_time(instant.with_timezone(&Utc), utc_offset_minutes)?);
    }
    for format in LOCAL_TIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(parsed);
        }
    }
    bail!("Unrecognized time '{raw}', expected RFC 3339 or YYYY-MM-DDTHH:MM")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn parses_naive_and_offset_times() {
        let expected = NaiveDate::from_ymd_opt(2026, 10, 19)
            .and_then(|d| d.and_hms_opt(9, 30, 0))
            .unwrap();
        assert_eq!(parse_local_time("2026-10-19T09:30", 0).unwrap(), expected);
        assert_eq!(parse_local_time("2026-10-19 09:30:00", 0).unwrap(), expected);
        assert_eq!(parse_local_time("2026-10-19T07:30:00Z", 120).unwrap(), expected);
        assert!(parse_local_time("yesterday", 0).is_err());
    }
}
