//! Tests for single-event occurrence expansion.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use occurrence_engine::expander::DAY_EMIT_CAP;
use occurrence_engine::{
    expand, expand_all, expand_with, DateRange, DstPolicy, EventDefinition, ExpandOptions,
    RecurrenceType,
};

fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

fn starts(event: &EventDefinition, from: DateTime<Utc>, to: DateTime<Utc>) -> Vec<DateTime<Utc>> {
    expand(event, from, to).into_iter().map(|o| o.start).collect()
}

// ---------------------------------------------------------------------------
// Reference scenarios
// ---------------------------------------------------------------------------

#[test]
fn daily_event_fast_forwards_into_window() {
    let event = EventDefinition::new("Standup", "2024-01-01T09:00:00Z")
        .repeating(RecurrenceType::Daily, 1);

    let result = starts(&event, utc(2024, 1, 10, 0, 0), utc(2024, 1, 12, 23, 59));

    assert_eq!(
        result,
        vec![
            utc(2024, 1, 10, 9, 0),
            utc(2024, 1, 11, 9, 0),
            utc(2024, 1, 12, 9, 0),
        ]
    );
}

#[test]
fn monthly_event_on_31st_clamps_short_months() {
    // 2024 is a leap year, so February ends on the 29th.
    let event = EventDefinition::new("Rent", "2024-01-31T10:00:00Z")
        .repeating(RecurrenceType::Monthly, 1);

    let result = starts(&event, utc(2024, 2, 1, 0, 0), utc(2024, 4, 30, 23, 59));

    assert_eq!(
        result,
        vec![
            utc(2024, 2, 29, 10, 0),
            utc(2024, 3, 31, 10, 0),
            utc(2024, 4, 30, 10, 0),
        ]
    );
}

#[test]
fn monthly_clamping_does_not_accumulate() {
    let event = EventDefinition::new("Rent", "2024-01-31T10:00:00Z")
        .repeating(RecurrenceType::Monthly, 1);

    let result = starts(&event, utc(2024, 2, 1, 0, 0), utc(2024, 12, 31, 23, 59));

    let days: Vec<u32> = result.iter().map(|dt| chrono::Datelike::day(dt)).collect();
    assert_eq!(days, vec![29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31]);
}

#[test]
fn biweekly_event_aligns_to_anchor_weekday() {
    // 2023-01-01 is a Sunday.
    let event = EventDefinition::new("Game night", "2023-01-01T08:00:00Z")
        .repeating(RecurrenceType::Weekly, 2);

    let result = starts(&event, utc(2024, 1, 1, 0, 0), utc(2024, 1, 31, 23, 59));

    assert_eq!(result, vec![utc(2024, 1, 14, 8, 0), utc(2024, 1, 28, 8, 0)]);
    for start in &result {
        assert_eq!(chrono::Datelike::weekday(start), chrono::Weekday::Sun);
        assert_eq!((*start - utc(2023, 1, 1, 8, 0)).num_days() % 14, 0);
    }
}

#[test]
fn one_off_event_outside_window_is_dropped() {
    let event = EventDefinition::new("Launch", "2024-03-01T12:00:00Z");
    assert!(starts(&event, utc(2024, 1, 1, 0, 0), utc(2024, 1, 7, 23, 59)).is_empty());
}

#[test]
fn zero_and_negative_intervals_mean_one() {
    for interval in [0, -1, -7] {
        let event = EventDefinition::new("Standup", "2024-01-01T09:00:00Z")
            .repeating(RecurrenceType::Daily, interval);

        let result = starts(&event, utc(2024, 1, 2, 0, 0), utc(2024, 1, 4, 23, 59));

        assert_eq!(
            result,
            vec![utc(2024, 1, 2, 9, 0), utc(2024, 1, 3, 9, 0), utc(2024, 1, 4, 9, 0)],
            "interval {interval}"
        );
    }
}

#[test]
fn malformed_anchor_yields_nothing() {
    let one_off = EventDefinition::new("Broken", "sometime next week");
    let recurring = EventDefinition::new("Broken", "2024-02-31T09:00:00Z")
        .repeating(RecurrenceType::Weekly, 1);

    assert!(starts(&one_off, utc(2000, 1, 1, 0, 0), utc(2100, 1, 1, 0, 0)).is_empty());
    assert!(starts(&recurring, utc(2024, 1, 1, 0, 0), utc(2024, 12, 31, 0, 0)).is_empty());
}

// ---------------------------------------------------------------------------
// Non-recurring path
// ---------------------------------------------------------------------------

#[test]
fn one_off_event_inside_window_is_emitted_once() {
    let event = EventDefinition::new("Launch", "2024-01-03T12:00:00Z");

    let result = expand(&event, utc(2024, 1, 1, 0, 0), utc(2024, 1, 7, 23, 59));

    assert_eq!(result.len(), 1);
    assert_eq!(result[0].start, utc(2024, 1, 3, 12, 0));
    assert!(std::ptr::eq(result[0].event, &event));
}

#[test]
fn recurring_flag_without_type_behaves_as_one_off() {
    let mut event = EventDefinition::new("Half-configured", "2024-01-03T12:00:00Z");
    event.is_recurring = true;

    let result = starts(&event, utc(2024, 1, 1, 0, 0), utc(2024, 1, 31, 23, 59));
    assert_eq!(result, vec![utc(2024, 1, 3, 12, 0)]);
}

#[test]
fn recurrence_type_without_flag_is_ignored() {
    let mut event = EventDefinition::new("Stale type", "2024-01-03T12:00:00Z");
    event.recurrence_type = Some(RecurrenceType::Daily);

    let result = starts(&event, utc(2024, 1, 1, 0, 0), utc(2024, 1, 31, 23, 59));
    assert_eq!(result.len(), 1);
}

// ---------------------------------------------------------------------------
// Boundaries and edge cases
// ---------------------------------------------------------------------------

#[test]
fn window_bounds_are_inclusive() {
    let event = EventDefinition::new("Midnight", "2024-01-01T00:00:00Z")
        .repeating(RecurrenceType::Daily, 1);

    let result = starts(&event, utc(2024, 1, 5, 0, 0), utc(2024, 1, 7, 0, 0));

    assert_eq!(
        result,
        vec![utc(2024, 1, 5, 0, 0), utc(2024, 1, 6, 0, 0), utc(2024, 1, 7, 0, 0)]
    );
}

#[test]
fn anchor_after_window_yields_nothing() {
    let event = EventDefinition::new("Future", "2025-01-01T09:00:00Z")
        .repeating(RecurrenceType::Daily, 1);
    assert!(starts(&event, utc(2024, 1, 1, 0, 0), utc(2024, 1, 7, 23, 59)).is_empty());
}

#[test]
fn anchor_inside_window_is_first_occurrence() {
    let event = EventDefinition::new("Kickoff", "2024-01-03T18:30:00Z")
        .repeating(RecurrenceType::Daily, 2);

    let result = starts(&event, utc(2024, 1, 1, 0, 0), utc(2024, 1, 7, 23, 59));

    assert_eq!(
        result,
        vec![utc(2024, 1, 3, 18, 30), utc(2024, 1, 5, 18, 30), utc(2024, 1, 7, 18, 30)]
    );
}

#[test]
fn yearly_leap_day_clamps_in_common_years() {
    let event = EventDefinition::new("Leap party", "2024-02-29T12:00:00Z")
        .repeating(RecurrenceType::Yearly, 1);

    let result = starts(&event, utc(2025, 1, 1, 0, 0), utc(2028, 12, 31, 23, 59));

    assert_eq!(
        result,
        vec![
            utc(2025, 2, 28, 12, 0),
            utc(2026, 2, 28, 12, 0),
            utc(2027, 2, 28, 12, 0),
            utc(2028, 2, 29, 12, 0),
        ]
    );
}

#[test]
fn yearly_interval_skips_off_years() {
    let event = EventDefinition::new("Reunion", "2000-06-15T17:00:00Z")
        .repeating(RecurrenceType::Yearly, 2);

    assert_eq!(
        starts(&event, utc(2024, 1, 1, 0, 0), utc(2024, 12, 31, 23, 59)),
        vec![utc(2024, 6, 15, 17, 0)]
    );
    assert!(starts(&event, utc(2025, 1, 1, 0, 0), utc(2025, 12, 31, 23, 59)).is_empty());
}

#[test]
fn huge_interval_does_not_overflow() {
    let event = EventDefinition::new("Never again", "2024-01-03T09:00:00Z")
        .repeating(RecurrenceType::Weekly, i64::MAX);

    assert_eq!(
        starts(&event, utc(2024, 1, 1, 0, 0), utc(2024, 1, 7, 23, 59)),
        vec![utc(2024, 1, 3, 9, 0)]
    );
    assert!(starts(&event, utc(2024, 2, 1, 0, 0), utc(2024, 2, 7, 23, 59)).is_empty());
}

#[test]
fn long_windows_are_truncated_at_the_safety_cap() {
    let event = EventDefinition::new("Daily", "2024-01-01T09:00:00Z")
        .repeating(RecurrenceType::Daily, 1);

    let result = expand(&event, utc(2024, 1, 1, 0, 0), utc(2030, 1, 1, 0, 0));
    assert_eq!(result.len(), DAY_EMIT_CAP);
}

#[test]
fn expansion_is_idempotent() {
    let event = EventDefinition::new("Weekly sync", "2023-05-17T15:00:00Z")
        .repeating(RecurrenceType::Weekly, 1);
    let (from, to) = (utc(2024, 3, 4, 0, 0), utc(2024, 3, 31, 23, 59));

    assert_eq!(expand(&event, from, to), expand(&event, from, to));
}

#[test]
fn expand_all_concatenates_per_event_results() {
    let events = vec![
        EventDefinition::new("Daily", "2024-01-01T09:00:00Z").repeating(RecurrenceType::Daily, 1),
        EventDefinition::new("Once", "2024-01-02T08:00:00Z"),
        EventDefinition::new("Elsewhere", "2023-01-02T08:00:00Z"),
    ];
    let range = DateRange::new(utc(2024, 1, 1, 0, 0), utc(2024, 1, 2, 23, 59));

    let result = expand_all(&events, &range);

    let titles: Vec<&str> = result.iter().map(|o| o.event.title.as_str()).collect();
    assert_eq!(titles, vec!["Daily", "Daily", "Once"]);
}

// ---------------------------------------------------------------------------
// Local wall-clock stepping across DST
// ---------------------------------------------------------------------------

#[test]
fn daily_event_keeps_local_time_across_spring_forward() {
    let tz = chrono_tz::America::New_York;
    // 09:00 EST on Mar 8 2024; clocks spring forward on Mar 10.
    let event = EventDefinition::new("Coffee", "2024-03-08T14:00:00Z")
        .repeating(RecurrenceType::Daily, 1);
    let range = DateRange::local_days(
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(),
        NaiveDate::from_ymd_opt(2024, 3, 11).unwrap(),
        &tz,
    )
    .unwrap();

    let result: Vec<_> = expand_with(&event, range.start, range.end, &ExpandOptions::new(tz))
        .into_iter()
        .map(|o| o.start)
        .collect();

    assert_eq!(
        result,
        vec![utc(2024, 3, 9, 14, 0), utc(2024, 3, 10, 13, 0), utc(2024, 3, 11, 13, 0)]
    );
}

#[test]
fn gap_occurrences_follow_dst_policy() {
    let tz = chrono_tz::America::New_York;
    // 02:30 EST; 2024-03-10 02:30 does not exist in New York.
    let event = EventDefinition::new("Night shift", "2024-03-08T07:30:00Z")
        .repeating(RecurrenceType::Daily, 1);
    let range = DateRange::local_days(
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(),
        NaiveDate::from_ymd_opt(2024, 3, 11).unwrap(),
        &tz,
    )
    .unwrap();

    let shifted: Vec<_> = expand_with(&event, range.start, range.end, &ExpandOptions::new(tz))
        .into_iter()
        .map(|o| o.start)
        .collect();
    assert_eq!(
        shifted,
        vec![utc(2024, 3, 9, 7, 30), utc(2024, 3, 10, 7, 30), utc(2024, 3, 11, 6, 30)]
    );

    let skip = ExpandOptions::new(tz).with_dst_policy(DstPolicy::Skip);
    let skipped: Vec<_> = expand_with(&event, range.start, range.end, &skip)
        .into_iter()
        .map(|o| o.start)
        .collect();
    assert_eq!(skipped, vec![utc(2024, 3, 9, 7, 30), utc(2024, 3, 11, 6, 30)]);
}

#[test]
fn unknown_timezone_name_is_rejected() {
    assert!(ExpandOptions::from_timezone_name("Mars/Olympus_Mons").is_err());
    assert!(ExpandOptions::from_timezone_name("Europe/Berlin").is_ok());
}

#[test]
fn offset_less_anchor_is_read_in_display_timezone() {
    let tz = chrono_tz::Europe::Berlin;
    let event = EventDefinition::new("Yoga", "2024-01-01T09:00:00")
        .repeating(RecurrenceType::Daily, 1);

    let result: Vec<_> = expand_with(
        &event,
        utc(2024, 1, 2, 0, 0),
        utc(2024, 1, 2, 23, 59),
        &ExpandOptions::new(tz),
    )
    .into_iter()
    .map(|o| o.start.with_timezone(&tz).naive_local())
    .collect();

    let nine = NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap();
    assert_eq!(result, vec![nine]);
}
