//! Week agenda -- expands every event for one display week, filters by
//! category, and groups the occurrences by local calendar day.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::calendar::Week;
use crate::dst::DstPolicy;
use crate::event::EventDefinition;
use crate::expander::{expand_all_with, ExpandOptions, Occurrence};

/// Which occurrences survive the category filter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    /// Exact, case-insensitive match on the event's category tag.
    Only(String),
}

impl CategoryFilter {
    /// `"all"` and blank input select everything; anything else is a tag.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            CategoryFilter::All
        } else {
            CategoryFilter::Only(trimmed.to_string())
        }
    }

    pub fn matches(&self, event: &EventDefinition) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(category) => event.has_category(category),
        }
    }
}

/// Keep the occurrences whose event passes `filter`, preserving order.
pub fn filter_by_category<'a>(
    occurrences: Vec<Occurrence<'a>>,
    filter: &CategoryFilter,
) -> Vec<Occurrence<'a>> {
    occurrences
        .into_iter()
        .filter(|o| filter.matches(o.event))
        .collect()
}

/// Group occurrences by their local calendar day in `tz`.
///
/// Each day is sorted ascending by start; the sort is stable, so occurrences
/// sharing a start keep their input order.
pub fn group_by_day<'a>(
    occurrences: Vec<Occurrence<'a>>,
    tz: &Tz,
) -> BTreeMap<NaiveDate, Vec<Occurrence<'a>>> {
    let mut groups: BTreeMap<NaiveDate, Vec<Occurrence<'a>>> = BTreeMap::new();
    for occurrence in occurrences {
        let day = occurrence.start.with_timezone(tz).date_naive();
        groups.entry(day).or_default().push(occurrence);
    }
    for day in groups.values_mut() {
        day.sort_by_key(|o| o.start);
    }
    groups
}

/// One local day of the agenda.
#[derive(Debug, Clone, PartialEq)]
pub struct DayAgenda<'a> {
    pub date: NaiveDate,
    pub occurrences: Vec<Occurrence<'a>>,
}

/// Seven days, Monday first, each with its sorted occurrences.
#[derive(Debug, Clone, PartialEq)]
pub struct WeekAgenda<'a> {
    pub week: Week,
    pub days: Vec<DayAgenda<'a>>,
}

impl<'a> WeekAgenda<'a> {
    /// Expand `events` over `week` and lay the result out day by day.
    ///
    /// Days without occurrences are still present, with an empty list.
    pub fn build(
        events: &'a [EventDefinition],
        week: &Week,
        filter: &CategoryFilter,
        dst_policy: DstPolicy,
    ) -> Self {
        let options = ExpandOptions::new(week.timezone()).with_dst_policy(dst_policy);
        let expanded = expand_all_with(events, &week.range(), &options);
        let occurrences = filter_by_category(expanded, filter);
        let mut grouped = group_by_day(occurrences, &week.timezone());

        let days = week
            .days()
            .map(|date| DayAgenda {
                date,
                occurrences: grouped.remove(&date).unwrap_or_default(),
            })
            .collect();

        Self { week: *week, days }
    }

    pub fn occurrence_count(&self) -> usize {
        self.days.iter().map(|d| d.occurrences.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.occurrence_count() == 0
    }

    pub fn is_current_week(&self, now: DateTime<Utc>) -> bool {
        self.week.is_current(now)
    }
}
