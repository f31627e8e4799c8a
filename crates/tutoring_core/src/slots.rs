//! crates/tutoring_core/src/slots.rs
//!
//! The slot generator: turns a weekly recurrence rule into concrete, dated slots
//! for one week. Pure and synchronous; nothing here touches storage.

use crate::domain::{AvailabilitySlot, WeeklyAvailabilityRequest};
use crate::error::{EngineError, EngineResult};
use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use uuid::Uuid;

const CLOCK_FORMAT: &str = "%H:%M";
const DAYS_PER_WEEK: i64 = 7;

/// The `week_start` day on or before `anchor`.
pub fn week_start_on_or_before(anchor: NaiveDate, week_start: Weekday) -> NaiveDate {
    let back = (anchor.weekday().num_days_from_monday() + 7
        - week_start.num_days_from_monday())
        % 7;
    anchor - Duration::days(back as i64)
}

/// The `week_start` day on or after `today`.
pub fn week_start_on_or_after(today: NaiveDate, week_start: Weekday) -> NaiveDate {
    let ahead = (week_start.num_days_from_monday() + 7
        - today.weekday().num_days_from_monday())
        % 7;
    today + Duration::days(ahead as i64)
}

/// Parses weekday names case-insensitively ("monday", "Mon", ...), collapsing repeats.
pub fn parse_weekdays(days: &[String]) -> EngineResult<Vec<Weekday>> {
    if days.is_empty() {
        return Err(EngineError::InvalidInput(
            "at least one weekday is required".to_string(),
        ));
    }

    let mut parsed = Vec::with_capacity(days.len());
    for name in days {
        let day = name
            .trim()
            .parse::<Weekday>()
            .map_err(|_| EngineError::InvalidInput(format!("unrecognized weekday '{}'", name)))?;
        if !parsed.contains(&day) {
            parsed.push(day);
        }
    }
    Ok(parsed)
}

/// Parses an `HH:MM` clock time.
pub fn parse_clock_time(value: &str) -> EngineResult<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), CLOCK_FORMAT).map_err(|_| {
        EngineError::InvalidInput(format!("'{}' is not a valid HH:MM time", value))
    })
}

/// Generates one week of slots for `request`.
///
/// The week starts on the `week_start` day on or before `week_anchor`. On every day of
/// that week listed in `request.days`, `[daily_start, daily_end)` is cut into back-to-back
/// slots of `slot_size_minutes`; a trailing remainder shorter than one slot is dropped.
/// Clock times are interpreted as UTC.
pub fn generate_weekly_slots(
    request: &WeeklyAvailabilityRequest,
    week_anchor: NaiveDate,
    week_start: Weekday,
) -> EngineResult<Vec<AvailabilitySlot>> {
    if request.slot_size_minutes <= 0 {
        return Err(EngineError::InvalidInput(
            "slot size must be a positive number of minutes".to_string(),
        ));
    }
    let days = parse_weekdays(&request.days)?;
    let daily_start = parse_clock_time(&request.daily_start)?;
    let daily_end = parse_clock_time(&request.daily_end)?;
    if daily_end <= daily_start {
        return Err(EngineError::InvalidInput(
            "end time must be after start time".to_string(),
        ));
    }

    let window_minutes = (daily_end - daily_start).num_minutes();
    let slots_per_day = window_minutes / request.slot_size_minutes;
    if slots_per_day == 0 {
        return Err(EngineError::NoSlotsGenerated);
    }
    let slot_length = Duration::minutes(request.slot_size_minutes);

    let first_day = week_start_on_or_before(week_anchor, week_start);
    let mut slots = Vec::new();

    for offset in 0..DAYS_PER_WEEK {
        let date = first_day + Duration::days(offset);
        if !days.contains(&date.weekday()) {
            continue;
        }

        let mut start_time = date.and_time(daily_start).and_utc();
        for _ in 0..slots_per_day {
            let end_time = start_time + slot_length;
            slots.push(AvailabilitySlot {
                id: Uuid::new_v4(),
                expert_id: request.expert_id,
                date,
                start_time,
                end_time,
                is_booked: false,
                student_id: None,
            });
            start_time = end_time;
        }
    }

    if slots.is_empty() {
        return Err(EngineError::NoSlotsGenerated);
    }
    Ok(slots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike, Utc};
    use proptest::prelude::*;

    // 2025-06-11 is a Wednesday; its week starts Monday 2025-06-09.
    fn wednesday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 11).unwrap()
    }

    fn request(days: &[&str], start: &str, end: &str, size: i64) -> WeeklyAvailabilityRequest {
        WeeklyAvailabilityRequest {
            expert_id: Uuid::new_v4(),
            days: days.iter().map(|d| d.to_string()).collect(),
            daily_start: start.to_string(),
            daily_end: end.to_string(),
            slot_size_minutes: size,
        }
    }

    #[test]
    fn monday_morning_hour_splits_into_two_half_hours() {
        let req = request(&["monday"], "10:00", "11:00", 30);
        let slots = generate_weekly_slots(&req, wednesday(), Weekday::Mon).unwrap();

        assert_eq!(slots.len(), 2);
        let monday = NaiveDate::from_ymd_opt(2025, 6, 9).unwrap();
        assert!(slots.iter().all(|s| s.date == monday));
        assert_eq!(slots[0].start_time, Utc.with_ymd_and_hms(2025, 6, 9, 10, 0, 0).unwrap());
        assert_eq!(slots[0].end_time, Utc.with_ymd_and_hms(2025, 6, 9, 10, 30, 0).unwrap());
        assert_eq!(slots[1].start_time, Utc.with_ymd_and_hms(2025, 6, 9, 10, 30, 0).unwrap());
        assert_eq!(slots[1].end_time, Utc.with_ymd_and_hms(2025, 6, 9, 11, 0, 0).unwrap());
        assert!(slots.iter().all(|s| !s.is_booked && s.student_id.is_none()));
    }

    #[test]
    fn exact_fit_yields_one_slot_per_matched_day() {
        let req = request(&["Tuesday", "THURSDAY"], "09:00", "09:30", 30);
        let slots = generate_weekly_slots(&req, wednesday(), Weekday::Mon).unwrap();

        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].date.weekday(), Weekday::Tue);
        assert_eq!(slots[1].date.weekday(), Weekday::Thu);
    }

    #[test]
    fn window_shorter_than_a_slot_generates_nothing() {
        let req = request(&["monday"], "09:00", "09:29", 30);
        let err = generate_weekly_slots(&req, wednesday(), Weekday::Mon).unwrap_err();
        assert!(matches!(err, EngineError::NoSlotsGenerated));
    }

    #[test]
    fn trailing_remainder_is_dropped() {
        let req = request(&["fri"], "09:00", "10:45", 30);
        let slots = generate_weekly_slots(&req, wednesday(), Weekday::Mon).unwrap();

        assert_eq!(slots.len(), 3);
        let last = slots.last().unwrap();
        assert_eq!((last.end_time.hour(), last.end_time.minute()), (10, 30));
    }

    #[test]
    fn rejects_malformed_requests() {
        let cases = [
            request(&["monday"], "10:00", "11:00", 0),
            request(&["monday"], "10:00", "11:00", -15),
            request(&["monday"], "25:00", "26:00", 30),
            request(&["monday"], "ten", "11:00", 30),
            request(&["monday"], "11:00", "11:00", 30),
            request(&["monday"], "12:00", "11:00", 30),
            request(&[], "10:00", "11:00", 30),
            request(&["monday", "funday"], "10:00", "11:00", 30),
        ];
        for req in cases {
            let err = generate_weekly_slots(&req, wednesday(), Weekday::Mon).unwrap_err();
            assert!(
                matches!(err, EngineError::InvalidInput(_)),
                "expected InvalidInput for {:?}, got {:?}",
                req,
                err
            );
        }
    }

    #[test]
    fn repeated_day_names_do_not_duplicate_slots() {
        let req = request(&["monday", "Monday", "mon"], "10:00", "11:00", 60);
        let slots = generate_weekly_slots(&req, wednesday(), Weekday::Mon).unwrap();
        assert_eq!(slots.len(), 1);
    }

    #[test]
    fn week_window_follows_configured_week_start() {
        // With Sunday as week start, the window for Wednesday 2025-06-11 begins 2025-06-08.
        let req = request(&["sunday"], "10:00", "11:00", 60);
        let slots = generate_weekly_slots(&req, wednesday(), Weekday::Sun).unwrap();
        assert_eq!(slots[0].date, NaiveDate::from_ymd_opt(2025, 6, 8).unwrap());
    }

    #[test]
    fn week_start_helpers() {
        let monday = NaiveDate::from_ymd_opt(2025, 6, 9).unwrap();
        assert_eq!(week_start_on_or_before(wednesday(), Weekday::Mon), monday);
        assert_eq!(week_start_on_or_before(monday, Weekday::Mon), monday);
        assert_eq!(
            week_start_on_or_after(wednesday(), Weekday::Mon),
            NaiveDate::from_ymd_opt(2025, 6, 16).unwrap()
        );
        assert_eq!(week_start_on_or_after(monday, Weekday::Mon), monday);
    }

    const DAY_NAMES: [&str; 7] = [
        "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday",
    ];

    proptest! {
        #[test]
        fn generated_slots_respect_size_days_and_never_overlap(
            day_mask in 1u8..128,
            start_minute in 0i64..(23 * 60),
            window in 1i64..(6 * 60),
            size in 1i64..180,
            anchor_offset in 0i64..365,
        ) {
            let end_minute = (start_minute + window).min(24 * 60 - 1);
            prop_assume!(end_minute > start_minute);
            let days: Vec<&str> = DAY_NAMES
                .iter()
                .enumerate()
                .filter(|(i, _)| day_mask & (1 << i) != 0)
                .map(|(_, d)| *d)
                .collect();
            let fmt = |m: i64| format!("{:02}:{:02}", m / 60, m % 60);
            let req = request(&days, &fmt(start_minute), &fmt(end_minute), size);
            let anchor = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap() + Duration::days(anchor_offset);

            match generate_weekly_slots(&req, anchor, Weekday::Mon) {
                Ok(slots) => {
                    let wanted = parse_weekdays(&req.days).unwrap();
                    for slot in &slots {
                        prop_assert_eq!((slot.end_time - slot.start_time).num_minutes(), size);
                        prop_assert!(wanted.contains(&slot.start_time.weekday()));
                        prop_assert_eq!(slot.start_time.date_naive(), slot.date);
                    }
                    for (i, a) in slots.iter().enumerate() {
                        for b in &slots[i + 1..] {
                            prop_assert!(!a.overlaps(b));
                        }
                    }
                }
                Err(EngineError::NoSlotsGenerated) => {
                    prop_assert!(end_minute - start_minute < size);
                }
                Err(other) => prop_assert!(false, "unexpected error {:?}", other),
            }
        }

        #[test]
        fn same_parameters_give_same_shape(
            size in 5i64..120,
            anchor_offset in 0i64..365,
        ) {
            let req = request(&["monday", "wednesday"], "08:00", "12:00", size);
            let anchor = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap() + Duration::days(anchor_offset);

            let first = generate_weekly_slots(&req, anchor, Weekday::Mon).unwrap();
            let second = generate_weekly_slots(&req, anchor, Weekday::Mon).unwrap();

            prop_assert_eq!(first.len(), second.len());
            for (a, b) in first.iter().zip(&second) {
                prop_assert_eq!(a.start_time, b.start_time);
                prop_assert_eq!(a.end_time, b.end_time);
                prop_assert_ne!(a.id, b.id);
            }
        }
    }
}
