//! Calendar event records as the store hands them over.
//!
//! Field names follow the `calendar_events` table columns so that a JSON export
//! of the table deserializes directly into [`EventDefinition`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize};

use crate::dst::resolve_shifted;

/// How often a recurring event repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceType {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl RecurrenceType {
    /// Title-cased label, e.g. `"Weekly"`.
    pub fn label(self) -> &'static str {
        match self {
            RecurrenceType::Daily => "Daily",
            RecurrenceType::Weekly => "Weekly",
            RecurrenceType::Monthly => "Monthly",
            RecurrenceType::Yearly => "Yearly",
        }
    }

    /// Singular name of one step, e.g. `"week"`.
    pub fn unit(self) -> &'static str {
        match self {
            RecurrenceType::Daily => "day",
            RecurrenceType::Weekly => "week",
            RecurrenceType::Monthly => "month",
            RecurrenceType::Yearly => "year",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RecurrenceType::Daily => "daily",
            RecurrenceType::Weekly => "weekly",
            RecurrenceType::Monthly => "monthly",
            RecurrenceType::Yearly => "yearly",
        }
    }
}

/// Returned when a string names no known recurrence type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRecurrenceType(pub String);

impl FromStr for RecurrenceType {
    type Err = UnknownRecurrenceType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(RecurrenceType::Daily),
            "weekly" => Ok(RecurrenceType::Weekly),
            "monthly" => Ok(RecurrenceType::Monthly),
            "yearly" => Ok(RecurrenceType::Yearly),
            _ => Err(UnknownRecurrenceType(s.to_string())),
        }
    }
}

/// A concrete repetition rule: every `interval` units of `frequency`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recurrence {
    pub frequency: RecurrenceType,
    pub interval: u64,
}

impl fmt::Display for Recurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.interval == 1 {
            write!(f, "Repeats {}", self.frequency.label())
        } else {
            write!(f, "Repeats every {} {}s", self.interval, self.frequency.unit())
        }
    }
}

/// One row of the events table.
///
/// `start_date` is kept as the raw stored string; [`EventDefinition::start_instant`]
/// parses it on demand and reports `None` for values that are not valid times.
/// Malformed columns (a `null` or non-string start, a fractional interval)
/// deserialize to defaults so one bad row never rejects the whole export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub start_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_recurring: bool,
    #[serde(default, deserialize_with = "lenient_recurrence_type")]
    pub recurrence_type: Option<RecurrenceType>,
    #[serde(default, deserialize_with = "lenient_interval")]
    pub recurrence_interval: Option<i64>,
    /// Ad-hoc tag read only by the category filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl EventDefinition {
    pub fn new(title: impl Into<String>, start_date: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            start_date: start_date.into(),
            ..Self::default()
        }
    }

    /// Builder-style helper that marks the event as recurring.
    pub fn repeating(mut self, frequency: RecurrenceType, interval: i64) -> Self {
        self.is_recurring = true;
        self.recurrence_type = Some(frequency);
        self.recurrence_interval = Some(interval);
        self
    }

    /// The anchor instant, or `None` if `start_date` is not a valid time.
    ///
    /// Offset-less date-times are read as UTC; see [`Self::start_instant_in`].
    pub fn start_instant(&self) -> Option<DateTime<Utc>> {
        parse_instant(&self.start_date)
    }

    /// The anchor instant with offset-less date-times read as wall-clock time in `tz`.
    pub fn start_instant_in(&self, tz: &Tz) -> Option<DateTime<Utc>> {
        parse_instant_in(&self.start_date, tz)
    }

    /// The repetition rule, if this event actually recurs.
    ///
    /// Events flagged recurring without a type behave as one-off events.
    pub fn recurrence(&self) -> Option<Recurrence> {
        if !self.is_recurring {
            return None;
        }
        self.recurrence_type.map(|frequency| Recurrence {
            frequency,
            interval: self.effective_interval(),
        })
    }

    /// `recurrence_interval` with absent and non-positive values treated as 1.
    pub fn effective_interval(&self) -> u64 {
        self.recurrence_interval
            .and_then(|n| u64::try_from(n).ok())
            .filter(|n| *n >= 1)
            .unwrap_or(1)
    }

    /// Case-insensitive comparison against the event's category tag.
    pub fn has_category(&self, category: &str) -> bool {
        self.category
            .as_deref()
            .is_some_and(|c| c.to_lowercase() == category.to_lowercase())
    }
}

/// Parse a stored timestamp into a UTC instant, reading offset-less values as UTC.
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    parse_instant_in(raw, &Tz::UTC)
}

/// Parse a stored timestamp into a UTC instant.
///
/// Accepts RFC 3339 (`2024-01-01T09:00:00Z`, `2024-01-01T09:00:00.000+02:00`),
/// Postgres text output (`2024-01-01 09:00:00+00`), naive date-times which are
/// wall-clock times in `tz`, and bare dates which mean UTC midnight. A naive
/// time inside a DST gap is shifted forward by the gap.
pub fn parse_instant_in(raw: &str, tz: &Tz) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"] {
        if let Ok(dt) = DateTime::parse_from_str(s, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, format) {
            return resolve_shifted(tz, &ndt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ndt| ndt.and_utc())
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// `null`, `"none"`, and unknown strings all deserialize to `None`.
fn lenient_recurrence_type<'de, D>(deserializer: D) -> Result<Option<RecurrenceType>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.parse().ok()))
}

/// Strings pass through; `null`, numbers, and other shapes become empty.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::String(s)) => s,
        _ => String::new(),
    })
}

/// Integers and integer strings are kept; anything else is `None`.
fn lenient_interval<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::Number(n)) => n.as_i64(),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}
