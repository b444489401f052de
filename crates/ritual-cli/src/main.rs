//! `ritual` CLI: print week agendas and expand recurring events from an
//! events JSON export.
//!
//! ## Usage
//!
//! ```sh
//! # This week's agenda, events piped on stdin
//! cat events.json | ritual week
//!
//! # The week after the one containing a given date, in Berlin time
//! ritual week -i events.json --date 2024-01-10 --offset 1 --tz Europe/Berlin
//!
//! # Only one category, as JSON, with event ids for editing
//! ritual week -i events.json --category games --json --admin
//!
//! # Raw occurrences between two local dates (inclusive)
//! ritual expand -i events.json --from 2024-01-01 --to 2024-01-31
//!
//! # Check a form submission before writing it
//! ritual validate -i draft.json
//! ```
//!
//! Set `RUST_LOG=occurrence_engine=debug` to see where expansion was truncated.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use chrono_tz::Tz;
use clap::{Args, Parser, Subcommand};
use occurrence_engine::{
    expand_all_with, CategoryFilter, DateRange, DstPolicy, EventDefinition, EventDraft,
    EventSource, ExpandOptions, JsonEventSource, Occurrence, Week, WeekAgenda, WriteAccess,
};
use serde::Serialize;
use std::io::{self, Read};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "ritual",
    version,
    about = "Week agendas and occurrence expansion for a recurring events calendar"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ZoneArgs {
    /// IANA timezone the calendar is displayed in
    #[arg(long = "tz", env = "RITUAL_TZ", default_value = "UTC")]
    tz: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the Monday-to-Sunday agenda for one week
    Week {
        /// Events JSON file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Any date inside the reference week (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Move this many weeks forward (negative for backward)
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        offset: i64,
        /// Only show events tagged with this category ("all" for everything)
        #[arg(long)]
        category: Option<String>,
        #[command(flatten)]
        zone: ZoneArgs,
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
        /// Signed-in view: annotate each occurrence with its event id
        #[arg(long)]
        admin: bool,
    },
    /// Print every occurrence in a window, one per line
    Expand {
        /// Events JSON file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Window start: a local date or an RFC 3339 instant
        #[arg(long)]
        from: String,
        /// Window end (inclusive): a local date or an RFC 3339 instant
        #[arg(long)]
        to: String,
        #[command(flatten)]
        zone: ZoneArgs,
    },
    /// Validate an event form submission and print the row to store
    Validate {
        /// Draft JSON file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Week {
            input,
            date,
            offset,
            category,
            zone,
            json,
            admin,
        } => {
            let tz = parse_zone(&zone)?;
            let events = load_events(input.as_deref())?;
            let reference = date.unwrap_or_else(|| Utc::now().with_timezone(&tz).date_naive());
            let week = Week::containing_date(reference, tz)?
                .offset(offset)
                .context("Week offset is out of range")?;
            let filter = category
                .as_deref()
                .map(CategoryFilter::parse)
                .unwrap_or_default();
            let access = WriteAccess::for_session(admin);

            let agenda = WeekAgenda::build(&events, &week, &filter, DstPolicy::default());
            debug!(
                monday = %week.monday(),
                occurrences = agenda.occurrence_count(),
                "built week agenda"
            );

            let out = if json {
                let mut body = serde_json::to_string_pretty(&WeekJson::new(&agenda, access))?;
                body.push('\n');
                body
            } else {
                render_week(&agenda, access, Utc::now())
            };
            print!("{}", out);
        }
        Commands::Expand {
            input,
            from,
            to,
            zone,
        } => {
            let tz = parse_zone(&zone)?;
            let events = load_events(input.as_deref())?;
            let range = DateRange::parse_bounds(&from, &to, &tz)?;

            let mut occurrences = expand_all_with(&events, &range, &ExpandOptions::new(tz));
            occurrences.sort_by_key(|o| o.start);

            let mut out = String::new();
            for o in &occurrences {
                let start = o.start.with_timezone(&tz).to_rfc3339_opts(SecondsFormat::Secs, true);
                out.push_str(&format!("{}\t{}\n", start, o.event.title));
            }
            print!("{}", out);
        }
        Commands::Validate { input } => {
            let json = read_input(input.as_deref())?;
            let draft: EventDraft =
                serde_json::from_str(&json).context("Failed to parse event draft JSON")?;
            let event = draft.validate()?;
            println!("{}", serde_json::to_string_pretty(&event)?);
        }
    }

    Ok(())
}

fn parse_zone(zone: &ZoneArgs) -> Result<Tz> {
    Ok(ExpandOptions::from_timezone_name(&zone.tz)?.timezone)
}

fn load_events(path: Option<&str>) -> Result<Vec<EventDefinition>> {
    let json = read_input(path)?;
    let events = JsonEventSource::new(json)
        .fetch_events()
        .context("Failed to load events")?;
    debug!(count = events.len(), "loaded events");
    Ok(events)
}

fn render_week(agenda: &WeekAgenda<'_>, access: WriteAccess, now: DateTime<Utc>) -> String {
    let week = agenda.week;
    let tz = week.timezone();
    let mut out = String::new();

    let last = agenda.days.last().map(|d| d.date).unwrap_or(week.monday());
    out.push_str(&format!("Week of {} to {} ({})", week.monday(), last, tz));
    if agenda.is_current_week(now) {
        out.push_str(" [this week]");
    }
    out.push('\n');

    for day in &agenda.days {
        out.push_str(&format!("\n{}\n", day.date.format("%a %Y-%m-%d")));
        if day.occurrences.is_empty() {
            out.push_str("  No events\n");
            continue;
        }
        for o in &day.occurrences {
            out.push_str(&render_occurrence(o, &tz, access));
            out.push('\n');
        }
    }
    out
}

fn render_occurrence(o: &Occurrence<'_>, tz: &Tz, access: WriteAccess) -> String {
    let event = o.event;
    let mut line = format!("  {}  {}", o.start.with_timezone(tz).format("%H:%M"), event.title);
    if let Some(location) = &event.location {
        line.push_str(&format!(" @ {}", location));
    }
    if let Some(category) = &event.category {
        line.push_str(&format!(" [{}]", category));
    }
    if let Some(recurrence) = event.recurrence() {
        line.push_str(&format!(" ({})", recurrence));
    }
    if access.allows_edit() {
        line.push_str(&format!("  #{}", event.id.as_deref().unwrap_or("-")));
    }
    line
}

#[derive(Serialize)]
struct WeekJson<'a> {
    start: String,
    end: String,
    timezone: String,
    days: Vec<DayJson<'a>>,
}

#[derive(Serialize)]
struct DayJson<'a> {
    date: String,
    occurrences: Vec<OccurrenceJson<'a>>,
}

#[derive(Serialize)]
struct OccurrenceJson<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a str>,
    title: &'a str,
    start: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    recurrence: Option<String>,
}

impl<'a> WeekJson<'a> {
    fn new(agenda: &WeekAgenda<'a>, access: WriteAccess) -> Self {
        let range = agenda.week.range();
        let days = agenda
            .days
            .iter()
            .map(|day| DayJson {
                date: day.date.to_string(),
                occurrences: day
                    .occurrences
                    .iter()
                    .map(|o| OccurrenceJson {
                        id: o.event.id.as_deref().filter(|_| access.allows_edit()),
                        title: &o.event.title,
                        start: o.start.to_rfc3339_opts(SecondsFormat::Millis, true),
                        location: o.event.location.as_deref(),
                        category: o.event.category.as_deref(),
                        recurrence: o.event.recurrence().map(|r| r.to_string()),
                    })
                    .collect(),
            })
            .collect();

        Self {
            start: range.start.to_rfc3339_opts(SecondsFormat::Millis, true),
            end: range.end.to_rfc3339_opts(SecondsFormat::Millis, true),
            timezone: agenda.week.timezone().to_string(),
            days,
        }
    }
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}
