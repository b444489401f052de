//! Calendar arithmetic: day/month/year stepping and Monday-based weeks.
//!
//! Steps operate on naive wall-clock values. Month and year steps clamp the
//! day-of-month to the last day of the target month (Jan 31 + 1 month is
//! Feb 28 or 29), never spilling into the following month.

use chrono::{DateTime, Datelike, Days, Duration, Months, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;

use crate::dst::resolve_shifted;
use crate::error::{CalendarError, Result};
use crate::event::parse_instant_in;

/// Advance `local` by `days` calendar days, keeping the wall-clock time.
pub fn add_days(local: NaiveDateTime, days: u64) -> Option<NaiveDateTime> {
    local.checked_add_days(Days::new(days))
}

/// Advance `local` by `months`, clamping the day-of-month.
pub fn add_months(local: NaiveDateTime, months: u64) -> Option<NaiveDateTime> {
    let months = u32::try_from(months).ok()?;
    local.checked_add_months(Months::new(months))
}

/// Advance `local` by `years`, clamping Feb 29 to Feb 28 in common years.
pub fn add_years(local: NaiveDateTime, years: u64) -> Option<NaiveDateTime> {
    add_months(local, years.checked_mul(12)?)
}

/// Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let back = u64::from(date.weekday().num_days_from_monday());
    date.checked_sub_days(Days::new(back)).unwrap_or(date)
}

/// A closed time interval, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }

    /// Every instant of the given local dates, `from` 00:00:00.000 through
    /// `to` 23:59:59.999, in `tz`.
    pub fn local_days(from: NaiveDate, to: NaiveDate, tz: &Tz) -> Result<Self> {
        let start = from
            .and_hms_opt(0, 0, 0)
            .and_then(|local| resolve_shifted(tz, &local))
            .ok_or_else(|| CalendarError::InvalidDate(from.to_string()))?;
        let end = to
            .and_hms_milli_opt(23, 59, 59, 999)
            .and_then(|local| resolve_shifted(tz, &local))
            .ok_or_else(|| CalendarError::InvalidDate(to.to_string()))?;
        Ok(Self { start, end })
    }

    /// Window from user-supplied bounds in `tz`.
    ///
    /// A plain `YYYY-MM-DD` bound covers that whole local day: `from` starts at
    /// its midnight and `to` ends at its 23:59:59.999. Other values are parsed
    /// as timestamps, offset-less ones in `tz`.
    ///
    /// # Errors
    /// `CalendarError::InvalidDate` for a bound that is neither.
    pub fn parse_bounds(from: &str, to: &str, tz: &Tz) -> Result<Self> {
        let as_date = |s: &str| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok();
        let as_instant = |s: &str| {
            parse_instant_in(s, tz).ok_or_else(|| CalendarError::InvalidDate(s.to_string()))
        };

        let start = match as_date(from) {
            Some(date) => Self::local_days(date, date, tz)?.start,
            None => as_instant(from)?,
        };
        let end = match as_date(to) {
            Some(date) => Self::local_days(date, date, tz)?.end,
            None => as_instant(to)?,
        };
        Ok(Self { start, end })
    }
}

/// One display week: Monday 00:00:00.000 through Sunday 23:59:59.999 local.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Week {
    monday: NaiveDate,
    timezone: Tz,
    range: DateRange,
}

impl Week {
    /// The week containing `reference`, as seen from `tz`.
    pub fn containing(reference: DateTime<Utc>, tz: Tz) -> Result<Self> {
        Self::starting(week_start(reference.with_timezone(&tz).date_naive()), tz)
    }

    /// The week containing the local calendar date `date`.
    pub fn containing_date(date: NaiveDate, tz: Tz) -> Result<Self> {
        Self::starting(week_start(date), tz)
    }

    fn starting(monday: NaiveDate, timezone: Tz) -> Result<Self> {
        let sunday = monday
            .checked_add_days(Days::new(6))
            .ok_or_else(|| CalendarError::InvalidDate(monday.to_string()))?;
        let range = DateRange::local_days(monday, sunday, &timezone)?;
        Ok(Self {
            monday,
            timezone,
            range,
        })
    }

    pub fn monday(&self) -> NaiveDate {
        self.monday
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn range(&self) -> DateRange {
        self.range
    }

    /// The seven local dates of the week, Monday first.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        self.monday.iter_days().take(7)
    }

    /// The week `weeks` away from this one (negative moves back).
    pub fn offset(&self, weeks: i64) -> Result<Self> {
        let monday = weeks
            .checked_mul(7)
            .and_then(Duration::try_days)
            .and_then(|delta| self.monday.checked_add_signed(delta))
            .ok_or_else(|| {
                CalendarError::InvalidDate(format!("{} weeks from {}", weeks, self.monday))
            })?;
        Self::starting(monday, self.timezone)
    }

    pub fn previous(&self) -> Result<Self> {
        self.offset(-1)
    }

    pub fn next(&self) -> Result<Self> {
        self.offset(1)
    }

    /// Whether `now` falls in this week.
    pub fn is_current(&self, now: DateTime<Utc>) -> bool {
        self.range.contains(now)
    }
}
