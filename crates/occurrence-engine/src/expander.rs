//! Occurrence expansion -- turns one event definition into the concrete
//! occurrences that fall inside a closed time window.
//!
//! Expansion never fails. An unparseable anchor yields nothing, a non-positive
//! interval counts as 1, and every stepping loop is bounded by one of the caps
//! below. Reaching a cap truncates the result silently (it is logged at debug
//! level only).
//!
//! The k-th candidate is always computed from the anchor as `anchor + k * step`
//! in local wall-clock time, so month-end clamping never accumulates: a monthly
//! event on the 31st lands on Feb 29, Mar 31, Apr 30.

use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;

use crate::calendar::{add_days, add_months, add_years, DateRange};
use crate::dst::{resolve_local, DstPolicy, LocalInstant};
use crate::error::{CalendarError, Result};
use crate::event::{EventDefinition, RecurrenceType};

/// Single steps taken after the closed-form jump for daily/weekly events.
pub const DAY_ALIGN_CAP: usize = 4;
/// Occurrences examined per window for daily/weekly events.
pub const DAY_EMIT_CAP: usize = 500;
/// Monthly steps taken while fast-forwarding to the window start.
pub const MONTH_ALIGN_CAP: usize = 600;
/// Occurrences examined per window for monthly events.
pub const MONTH_EMIT_CAP: usize = 200;
/// Yearly steps taken while fast-forwarding to the window start.
pub const YEAR_ALIGN_CAP: usize = 200;
/// Occurrences examined per window for yearly events.
pub const YEAR_EMIT_CAP: usize = 200;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// One concrete occurrence of an event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Occurrence<'a> {
    pub event: &'a EventDefinition,
    pub start: DateTime<Utc>,
}

/// Settings shared by every expansion in one render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpandOptions {
    /// Zone whose wall clock recurrence steps are applied in.
    pub timezone: Tz,
    pub dst_policy: DstPolicy,
}

impl Default for ExpandOptions {
    fn default() -> Self {
        Self {
            timezone: Tz::UTC,
            dst_policy: DstPolicy::default(),
        }
    }
}

impl ExpandOptions {
    pub fn new(timezone: Tz) -> Self {
        Self {
            timezone,
            ..Self::default()
        }
    }

    /// Build options from an IANA zone name such as `"Europe/Berlin"`.
    ///
    /// # Errors
    /// Returns `CalendarError::InvalidTimezone` for unknown names.
    pub fn from_timezone_name(name: &str) -> Result<Self> {
        let timezone: Tz = name
            .parse()
            .map_err(|_| CalendarError::InvalidTimezone(name.to_string()))?;
        Ok(Self::new(timezone))
    }

    pub fn with_dst_policy(mut self, dst_policy: DstPolicy) -> Self {
        self.dst_policy = dst_policy;
        self
    }
}

/// Expand `event` within `[range_start, range_end]` using UTC wall-clock steps.
pub fn expand(
    event: &EventDefinition,
    range_start: DateTime<Utc>,
    range_end: DateTime<Utc>,
) -> Vec<Occurrence<'_>> {
    expand_with(event, range_start, range_end, &ExpandOptions::default())
}

/// Expand `event` within `[range_start, range_end]`.
///
/// Results are strictly increasing in time. Non-recurring events (and events
/// flagged recurring without a type) yield the anchor alone when it is inside
/// the window.
pub fn expand_with<'a>(
    event: &'a EventDefinition,
    range_start: DateTime<Utc>,
    range_end: DateTime<Utc>,
    options: &ExpandOptions,
) -> Vec<Occurrence<'a>> {
    let Some(anchor) = event.start_instant_in(&options.timezone) else {
        tracing::trace!(
            title = %event.title,
            start_date = %event.start_date,
            "skipping event with invalid start"
        );
        return Vec::new();
    };
    let range = DateRange::new(range_start, range_end);

    let Some(recurrence) = event.recurrence() else {
        return if range.contains(anchor) {
            vec![Occurrence {
                event,
                start: anchor,
            }]
        } else {
            Vec::new()
        };
    };

    let series = Series {
        anchor,
        local_anchor: anchor.with_timezone(&options.timezone).naive_local(),
        frequency: recurrence.frequency,
        step: recurrence.interval,
        timezone: options.timezone,
    };

    let first = series.align(range.start);
    series
        .emit(first, &range, options.dst_policy)
        .into_iter()
        .map(|start| Occurrence { event, start })
        .collect()
}

/// Expand every event for one window and concatenate the results.
///
/// Occurrences of each event stay ascending; no ordering holds across events.
pub fn expand_all<'a>(events: &'a [EventDefinition], range: &DateRange) -> Vec<Occurrence<'a>> {
    expand_all_with(events, range, &ExpandOptions::default())
}

pub fn expand_all_with<'a>(
    events: &'a [EventDefinition],
    range: &DateRange,
    options: &ExpandOptions,
) -> Vec<Occurrence<'a>> {
    events
        .iter()
        .flat_map(|event| expand_with(event, range.start, range.end, options))
        .collect()
}

/// The candidate sequence of one recurring event.
struct Series {
    anchor: DateTime<Utc>,
    local_anchor: NaiveDateTime,
    frequency: RecurrenceType,
    step: u64,
    timezone: Tz,
}

impl Series {
    /// Wall-clock time of the k-th candidate, or `None` past chrono's range.
    fn local_at(&self, k: u64) -> Option<NaiveDateTime> {
        let n = k.checked_mul(self.step)?;
        match self.frequency {
            RecurrenceType::Daily => add_days(self.local_anchor, n),
            RecurrenceType::Weekly => add_days(self.local_anchor, n.checked_mul(7)?),
            RecurrenceType::Monthly => add_months(self.local_anchor, n),
            RecurrenceType::Yearly => add_years(self.local_anchor, n),
        }
    }

    fn candidate(&self, k: u64) -> Option<LocalInstant> {
        if k == 0 {
            return Some(LocalInstant::Exact(self.anchor));
        }
        resolve_local(&self.timezone, &self.local_at(k)?)
    }

    fn step_days(&self) -> u64 {
        match self.frequency {
            RecurrenceType::Weekly => self.step.saturating_mul(7),
            _ => self.step,
        }
    }

    /// Index of the first candidate not before `range_start`.
    fn align(&self, range_start: DateTime<Utc>) -> u64 {
        if self.anchor >= range_start {
            return 0;
        }
        match self.frequency {
            RecurrenceType::Daily | RecurrenceType::Weekly => self.align_by_days(range_start),
            RecurrenceType::Monthly => self.align_stepwise(range_start, MONTH_ALIGN_CAP),
            RecurrenceType::Yearly => self.align_stepwise(range_start, YEAR_ALIGN_CAP),
        }
    }

    fn align_by_days(&self, range_start: DateTime<Utc>) -> u64 {
        let elapsed_millis = (range_start - self.anchor).num_milliseconds();
        let elapsed_days = u64::try_from(elapsed_millis.div_euclid(MILLIS_PER_DAY)).unwrap_or(0);
        let mut k = elapsed_days / self.step_days();

        for _ in 0..DAY_ALIGN_CAP {
            match self.candidate(k) {
                Some(c) if c.instant() < range_start => k += 1,
                _ => break,
            }
        }
        k
    }

    fn align_stepwise(&self, range_start: DateTime<Utc>, cap: usize) -> u64 {
        let mut k = 0;
        for _ in 0..cap {
            match self.candidate(k) {
                Some(c) if c.instant() < range_start => {}
                _ => break,
            }
            if self.local_at(k + 1).is_none() || self.local_at(k + 1) == self.local_at(k) {
                break;
            }
            k += 1;
        }
        k
    }

    /// Instants of the candidates from index `first` that lie inside `range`.
    fn emit(&self, first: u64, range: &DateRange, policy: DstPolicy) -> Vec<DateTime<Utc>> {
        let cap = match self.frequency {
            RecurrenceType::Daily | RecurrenceType::Weekly => DAY_EMIT_CAP,
            RecurrenceType::Monthly => MONTH_EMIT_CAP,
            RecurrenceType::Yearly => YEAR_EMIT_CAP,
        };

        let mut starts = Vec::new();
        let mut k = first;
        let mut exhausted = true;
        for _ in 0..cap {
            let Some(candidate) = self.candidate(k) else {
                exhausted = false;
                break;
            };
            let start = candidate.instant();
            if start > range.end {
                exhausted = false;
                break;
            }
            if start >= range.start && policy.emits(&candidate) {
                starts.push(start);
            }
            k += 1;
        }

        if exhausted {
            tracing::debug!(
                frequency = self.frequency.as_str(),
                step = self.step,
                cap,
                "occurrence expansion truncated at safety cap"
            );
        }
        starts
    }
}
