//! WASM bindings for occurrence-engine.
//!
//! Exposes the week agenda, raw occurrence expansion, and draft validation to
//! the browser client via `wasm-bindgen`. All complex types are passed as JSON
//! strings; events may be a bare array of rows or the backend's
//! `{ data, error }` response envelope.
//!
//! ## Build process
//!
//! ```sh
//! cargo build -p occurrence-engine-wasm --target wasm32-unknown-unknown --release
//! wasm-bindgen --target web --out-dir web/wasm/ \
//!   target/wasm32-unknown-unknown/release/occurrence_engine_wasm.wasm
//! ```

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use chrono_tz::Tz;
use occurrence_engine::event::parse_instant_in;
use occurrence_engine::{
    expand_all_with, CategoryFilter, DateRange, DstPolicy, EventDefinition, EventDraft,
    EventSource, ExpandOptions, JsonEventSource, Occurrence, Week, WeekAgenda,
};
use serde::Serialize;
use wasm_bindgen::prelude::*;

// ---------------------------------------------------------------------------
// Serde-friendly DTOs for crossing the WASM boundary as JSON
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct OccurrenceDto<'a> {
    id: Option<&'a str>,
    title: &'a str,
    description: Option<&'a str>,
    location: Option<&'a str>,
    category: Option<&'a str>,
    start: String,
    recurrence: Option<String>,
}

impl<'a> From<&Occurrence<'a>> for OccurrenceDto<'a> {
    fn from(o: &Occurrence<'a>) -> Self {
        Self {
            id: o.event.id.as_deref(),
            title: &o.event.title,
            description: o.event.description.as_deref(),
            location: o.event.location.as_deref(),
            category: o.event.category.as_deref(),
            start: o.start.to_rfc3339_opts(SecondsFormat::Millis, true),
            recurrence: o.event.recurrence().map(|r| r.to_string()),
        }
    }
}

#[derive(Serialize)]
struct DayDto<'a> {
    date: String,
    occurrences: Vec<OccurrenceDto<'a>>,
}

#[derive(Serialize)]
struct WeekDto<'a> {
    start: String,
    end: String,
    days: Vec<DayDto<'a>>,
}

impl<'a> From<&WeekAgenda<'a>> for WeekDto<'a> {
    fn from(agenda: &WeekAgenda<'a>) -> Self {
        let range = agenda.week.range();
        Self {
            start: range.start.to_rfc3339_opts(SecondsFormat::Millis, true),
            end: range.end.to_rfc3339_opts(SecondsFormat::Millis, true),
            days: agenda
                .days
                .iter()
                .map(|day| DayDto {
                    date: day.date.to_string(),
                    occurrences: day.occurrences.iter().map(OccurrenceDto::from).collect(),
                })
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_datetime(s: &str, tz: &Tz) -> Result<DateTime<Utc>, String> {
    parse_instant_in(s, tz).ok_or_else(|| format!("Invalid datetime '{}'", s))
}

fn parse_timezone(timezone: Option<&str>) -> Result<Tz, String> {
    match timezone {
        None | Some("") => Ok(Tz::UTC),
        Some(name) => ExpandOptions::from_timezone_name(name)
            .map(|o| o.timezone)
            .map_err(|e| e.to_string()),
    }
}

fn parse_events_json(json: &str) -> Result<Vec<EventDefinition>, String> {
    JsonEventSource::new(json)
        .fetch_events()
        .map_err(|e| format!("Invalid events JSON: {}", e))
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| format!("Serialization error: {}", e))
}

fn expand_occurrences_json(
    events_json: &str,
    range_start: &str,
    range_end: &str,
    timezone: Option<&str>,
) -> Result<String, String> {
    let events = parse_events_json(events_json)?;
    let tz = parse_timezone(timezone)?;
    let range = DateRange::parse_bounds(range_start, range_end, &tz).map_err(|e| e.to_string())?;
    let options = ExpandOptions::new(tz);

    let mut occurrences = expand_all_with(&events, &range, &options);
    occurrences.sort_by_key(|o| o.start);

    let dtos: Vec<OccurrenceDto<'_>> = occurrences.iter().map(OccurrenceDto::from).collect();
    to_json(&dtos)
}

fn week_agenda_json(
    events_json: &str,
    reference: &str,
    timezone: Option<&str>,
    category: Option<&str>,
) -> Result<String, String> {
    let events = parse_events_json(events_json)?;
    let tz = parse_timezone(timezone)?;
    let week = match NaiveDate::parse_from_str(reference, "%Y-%m-%d") {
        Ok(date) => Week::containing_date(date, tz),
        Err(_) => Week::containing(parse_datetime(reference, &tz)?, tz),
    }
    .map_err(|e| e.to_string())?;
    let filter = category.map(CategoryFilter::parse).unwrap_or_default();

    let agenda = WeekAgenda::build(&events, &week, &filter, DstPolicy::default());
    to_json(&WeekDto::from(&agenda))
}

fn validate_draft_json(draft_json: &str) -> Result<String, String> {
    let draft: EventDraft =
        serde_json::from_str(draft_json).map_err(|e| format!("Invalid draft JSON: {}", e))?;
    let event = draft.validate().map_err(|e| e.to_string())?;
    to_json(&event)
}

// ---------------------------------------------------------------------------
// WASM exports
// ---------------------------------------------------------------------------

/// Expand every event into its occurrences within `[range_start, range_end]`.
///
/// Returns a JSON array of occurrence objects sorted by `start`, each with
/// `id`, `title`, `description`, `location`, `category`, `start`, and a
/// `recurrence` label such as `"Repeats Weekly"`.
///
/// # Arguments
/// - `events_json` -- JSON array of event rows (or a `{data, error}` envelope)
/// - `range_start`, `range_end` -- ISO 8601 datetimes, both inclusive; a plain
///   `YYYY-MM-DD` covers that whole local day
/// - `timezone` -- Optional IANA zone whose wall clock steps are applied in (default UTC)
#[wasm_bindgen(js_name = "expandOccurrences")]
pub fn expand_occurrences(
    events_json: &str,
    range_start: &str,
    range_end: &str,
    timezone: Option<String>,
) -> Result<String, JsValue> {
    expand_occurrences_json(events_json, range_start, range_end, timezone.as_deref())
        .map_err(|e| JsValue::from_str(&e))
}

/// Build the Monday-to-Sunday agenda for the week containing `reference`.
///
/// `reference` is either a local date (`YYYY-MM-DD`) or an ISO 8601 instant.
/// Returns `{start, end, days: [{date, occurrences}]}` with all seven days
/// present. `category` filters by tag; omit it or pass `"all"` for everything.
#[wasm_bindgen(js_name = "weekAgenda")]
pub fn week_agenda(
    events_json: &str,
    reference: &str,
    timezone: Option<String>,
    category: Option<String>,
) -> Result<String, JsValue> {
    week_agenda_json(events_json, reference, timezone.as_deref(), category.as_deref())
        .map_err(|e| JsValue::from_str(&e))
}

/// Validate a create/edit form submission.
///
/// Returns the normalized event row as JSON, or throws the validation message.
#[wasm_bindgen(js_name = "validateDraft")]
pub fn validate_draft(draft_json: &str) -> Result<String, JsValue> {
    validate_draft_json(draft_json).map_err(|e| JsValue::from_str(&e))
}
