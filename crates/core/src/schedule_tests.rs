// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;
use yare::parameterized;

fn at(h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, h, m, 0).unwrap()
}

fn hourly_from(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> TimeSchedule {
    TimeSchedule {
        period: Duration::from_secs(3600),
        start,
        end,
    }
}

#[parameterized(
    daemon = { Schedule::Daemon, true, "daemon" },
    time = { Schedule::Time(TimeSchedule::new(Duration::from_secs(60))), true, "time" },
    event = { Schedule::event(["deploy"]), false, "event" },
    none = { Schedule::None, false, "none" },
)]
fn schedule_kinds(schedule: Schedule, driver_managed: bool, kind: &'static str) {
    assert_eq!(schedule.is_driver_managed(), driver_managed);
    assert_eq!(schedule.kind(), kind);
}

#[test]
fn next_run_before_start_is_start() {
    let schedule = hourly_from(Some(at(10, 0)), None);
    assert_eq!(schedule.next_run(at(8, 30)), Some(at(10, 0)));
}

#[test]
fn next_run_after_start_aligns_to_period() {
    let schedule = hourly_from(Some(at(10, 0)), None);
    assert_eq!(schedule.next_run(at(10, 0)), Some(at(11, 0)));
    assert_eq!(schedule.next_run(at(12, 15)), Some(at(13, 0)));
}

#[test]
fn next_run_without_start_is_one_period_later() {
    let schedule = hourly_from(None, None);
    assert_eq!(schedule.next_run(at(9, 20)), Some(at(10, 20)));
}

#[test]
fn next_run_stops_after_end() {
    let schedule = hourly_from(Some(at(10, 0)), Some(at(12, 0)));
    assert_eq!(schedule.next_run(at(11, 0)), Some(at(12, 0)));
    assert_eq!(schedule.next_run(at(12, 0)), None);
}

#[parameterized(
    half_millisecond = { Duration::from_micros(500), Duration::from_micros(500) },
    one_microsecond = { Duration::from_micros(1), Duration::from_micros(1) },
    partial_period = { Duration::from_micros(1400), Duration::from_micros(600) },
)]
fn sub_millisecond_periods_align_to_start(period: Duration, gap: Duration) {
    let schedule = TimeSchedule {
        period,
        start: Some(at(0, 0)),
        end: None,
    };
    let after = at(1, 0);
    let next = schedule.next_run(after).unwrap();
    assert_eq!((next - after).to_std().unwrap(), gap);
}

#[test]
fn zero_period_never_runs() {
    let schedule = TimeSchedule::new(Duration::ZERO);
    assert_eq!(schedule.next_run(at(0, 0)), None);
}

#[test]
fn event_schedule_serializes_with_type_tag() {
    let schedule = Schedule::event(["deploy-now"]);
    let json = serde_json::to_value(&schedule).unwrap();
    assert_eq!(
        json,
        serde_json::json!({"type": "event", "tags": ["deploy-now"]})
    );
}

#[test]
fn time_schedule_uses_humantime_period() {
    let json = serde_json::json!({"type": "time", "period": "15m"});
    let schedule: Schedule = serde_json::from_value(json).unwrap();
    assert_eq!(
        schedule,
        Schedule::Time(TimeSchedule::new(Duration::from_secs(900)))
    );
}
