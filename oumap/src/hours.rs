//! Weekly opening-hours schedules and the `open_now` flag derived from them.
//!
//! Schedules are written the way site owners type them into the opening-hours field:
//!
//! ```text
//! Mo-Fr 08:00-12:00, 13:00-18:00 | Sa 10:00-14:00 | Su closed
//! ```
//!
//! Entries are separated by `|`, `;` or newlines. Day lists accept two-letter codes,
//! English names and ranges (`Mo-Fr`, or wrapping `Sa-Mo`). A span whose end is not
//! after its start runs past midnight into the next day.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDateTime, Timelike, Utc, Weekday};
use log::warn;
use serde::Serialize;

use crate::errors::FilterError;
use crate::filters::MarkerSet;
use crate::types::{FieldType, FieldValue, Location};

const MINUTES_PER_DAY: u16 = 24 * 60;
const DAY_NAMES: [&str; 7] = ["monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday"];
const DAY_CODES: [&str; 7] = ["Mo", "Tu", "We", "Th", "Fr", "Sa", "Su"];

/// Opening span in minutes since midnight. `end <= start` marks an overnight span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeSpan {
    pub start: u16,
    pub end: u16,
}

impl TimeSpan {
    #[inline]
    pub const fn is_overnight(self) -> bool {
        self.end <= self.start
    }
}

impl fmt::Display for TimeSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}-{:02}:{:02}",
            self.start / 60,
            self.start % 60,
            self.end / 60,
            self.end % 60
        )
    }
}

/// Opening spans for each weekday, Monday first.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct OpeningHours {
    days: [Vec<TimeSpan>; 7],
}

impl OpeningHours {
    pub fn parse(input: &str) -> Result<Self, FilterError> {
        let mut hours = OpeningHours::default();
        let mut entries = 0usize;

        for entry in input.split(['|', ';', '\n']).map(str::trim).filter(|e| !e.is_empty()) {
            let (days, spans) = parse_entry(entry).map_err(|reason| FilterError::invalid_schedule(input, reason))?;
            for day in days {
                match &spans {
                    Some(spans) => hours.days[day].extend(spans.iter().copied()),
                    None => hours.days[day].clear(),
                }
            }
            entries += 1;
        }

        if entries == 0 {
            return Err(FilterError::invalid_schedule(input, "schedule is empty"));
        }
        Ok(hours)
    }

    pub fn spans(&self, day: Weekday) -> &[TimeSpan] {
        &self.days[day.num_days_from_monday() as usize]
    }

    /// Whether the schedule is open at a local wall-clock time.
    ///
    /// Span starts are inclusive, ends exclusive.
    pub fn is_open_at(&self, at: NaiveDateTime) -> bool {
        let minute = (at.hour() * 60 + at.minute()) as u16;
        let today = at.weekday();

        let open_today = self.spans(today).iter().any(|span| {
            if span.is_overnight() {
                minute >= span.start
            } else {
                minute >= span.start && minute < span.end
            }
        });

        open_today
            || self
                .spans(today.pred())
                .iter()
                .any(|span| span.is_overnight() && minute < span.end)
    }
}

impl FromStr for OpeningHours {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for OpeningHours {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, spans) in self.days.iter().enumerate() {
            if index > 0 {
                f.write_str(" | ")?;
            }
            write!(f, "{} ", DAY_CODES[index])?;
            if spans.is_empty() {
                f.write_str("closed")?;
            } else {
                let rendered: Vec<String> = spans.iter().map(ToString::to_string).collect();
                f.write_str(&rendered.join(", "))?;
            }
        }
        Ok(())
    }
}

/// `None` spans means the listed days are closed.
fn parse_entry(entry: &str) -> Result<(Vec<usize>, Option<Vec<TimeSpan>>), String> {
    let lowered = entry.to_ascii_lowercase();
    let split_at = entry
        .find(|c: char| c.is_ascii_digit())
        .or_else(|| lowered.find("closed"))
        .ok_or_else(|| format!("entry '{entry}' has no times"))?;

    let (day_part, span_part) = entry.split_at(split_at);
    let day_part = day_part.trim().trim_end_matches(':').trim();
    if day_part.is_empty() {
        return Err(format!("entry '{entry}' has no days"));
    }

    let days = parse_days(day_part)?;
    let span_part = span_part.trim();
    if span_part.eq_ignore_ascii_case("closed") {
        return Ok((days, None));
    }

    let spans = span_part
        .split(',')
        .map(str::trim)
        .filter(|span| !span.is_empty())
        .map(parse_span)
        .collect::<Result<Vec<_>, _>>()?;
    Ok((days, Some(spans)))
}

fn parse_days(raw: &str) -> Result<Vec<usize>, String> {
    let mut days = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.split_once('-') {
            Some((from, to)) => {
                let from = parse_day(from)?;
                let to = parse_day(to)?;
                let mut day = from;
                loop {
                    days.push(day);
                    if day == to {
                        break;
                    }
                    day = (day + 1) % 7;
                }
            }
            None => days.push(parse_day(part)?),
        }
    }
    if days.is_empty() {
        return Err(format!("no days in '{raw}'"));
    }
    days.sort_unstable();
    days.dedup();
    Ok(days)
}

fn parse_day(raw: &str) -> Result<usize, String> {
    let token = raw.trim().trim_end_matches('.').to_ascii_lowercase();
    if token.len() >= 2
        && let Some(index) = DAY_NAMES.iter().position(|name| name.starts_with(&token))
    {
        return Ok(index);
    }
    Err(format!("unknown day '{}'", raw.trim()))
}

fn parse_span(raw: &str) -> Result<TimeSpan, String> {
    let (start, end) = raw
        .split_once(['-', '\u{2013}'])
        .ok_or_else(|| format!("span '{raw}' must look like HH:MM-HH:MM"))?;
    let start = parse_time(start)?;
    let end = parse_time(end)?;
    if start >= MINUTES_PER_DAY {
        return Err(format!("span '{raw}' cannot start at 24:00"));
    }
    Ok(TimeSpan { start, end })
}

fn parse_time(raw: &str) -> Result<u16, String> {
    let raw = raw.trim();
    let (hours, minutes) = raw.split_once(':').unwrap_or((raw, "0"));
    let hours: u16 = hours.trim().parse().map_err(|_| format!("invalid time '{raw}'"))?;
    let minutes: u16 = minutes.trim().parse().map_err(|_| format!("invalid time '{raw}'"))?;
    if minutes >= 60 || hours > 24 || (hours == 24 && minutes > 0) {
        return Err(format!("time '{raw}' is out of range"));
    }
    Ok(hours * 60 + minutes)
}

/// Wall-clock time at a fixed UTC offset.
pub fn local_time(instant: DateTime<Utc>, utc_offset_minutes: i32) -> Result<NaiveDateTime, FilterError> {
    let offset = FixedOffset::east_opt(utc_offset_minutes * 60).ok_or_else(|| {
        FilterError::invalid_request(format!("UTC offset of {utc_offset_minutes} minutes is out of range"))
    })?;
    Ok(instant.with_timezone(&offset).naive_local())
}

impl Location {
    /// Recompute `open_now` on every opening-hours field whose schedule parses.
    ///
    /// Fields with unreadable schedules keep their previous flag. Returns the number of
    /// fields updated.
    pub fn refresh_open_now(&mut self, at: NaiveDateTime) -> usize {
        let mut updated = 0;
        for field in self
            .custom_fields
            .iter_mut()
            .filter(|field| field.fieldtype == FieldType::OpeningHours)
        {
            let FieldValue::Text(schedule) = &field.val else {
                continue;
            };
            if schedule.trim().is_empty() {
                continue;
            }
            match OpeningHours::parse(schedule) {
                Ok(hours) => {
                    field.open_now = Some(hours.is_open_at(at));
                    updated += 1;
                }
                Err(err) => warn!("location {}: skipping opening hours field {}: {err}", self.post_id, field.index),
            }
        }
        updated
    }
}

impl MarkerSet {
    /// Recompute `open_now` for every location. Returns the number of fields updated.
    pub fn refresh_open_now(&mut self, at: NaiveDateTime) -> usize {
        self.locations_mut()
            .iter_mut()
            .map(|location| location.refresh_open_now(at))
            .sum()
    }
}
