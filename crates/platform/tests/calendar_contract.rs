//! Contract tests for the calendar abstraction from outside the crate.

#![allow(clippy::unwrap_used)]
#![allow(clippy::arithmetic_side_effects)]

use embassy_time::Duration;
use platform::{AlarmCallback, Calendar, CalendarEvents, DateTime, Error};

/// Minimal calendar stub with a fixed unix-time answer, enough to exercise
/// the provided `unix_millis` composition.
struct FixedCalendar {
    seconds: u32,
}

impl Calendar for FixedCalendar {
    fn get_date_time(&mut self) -> Result<DateTime, Error> {
        Err(Error::Fail)
    }

    fn set_date_time(&mut self, _date_time: &DateTime) -> Result<(), Error> {
        Ok(())
    }

    fn get_alarm(&mut self) -> Result<DateTime, Error> {
        Err(Error::Fail)
    }

    fn set_alarm(&mut self, _alarm: &DateTime) -> Result<(), Error> {
        Ok(())
    }

    fn arm_alarm_in(&mut self, _after: Duration) -> Result<(), Error> {
        Ok(())
    }

    fn is_date_time_set(&mut self) -> Result<bool, Error> {
        Ok(true)
    }

    fn to_unix_seconds(&self, _date_time: &DateTime) -> Result<u32, Error> {
        Ok(self.seconds)
    }

    fn from_unix_seconds(&self, _seconds: u32) -> Result<DateTime, Error> {
        Err(Error::Fail)
    }
}

#[test]
fn unix_millis_composes_seconds_and_milliseconds() {
    let calendar = FixedCalendar { seconds: 1_000_000_000 };
    let date_time = DateTime { millisecond: 321, ..DateTime::default() };
    assert_eq!(calendar.unix_millis(&date_time).unwrap(), 1_000_000_000_321);
}

#[test]
fn unix_millis_does_not_overflow_at_the_u32_ceiling() {
    let calendar = FixedCalendar { seconds: u32::MAX };
    let date_time = DateTime { millisecond: 999, ..DateTime::default() };
    let millis = calendar.unix_millis(&date_time).unwrap();
    assert_eq!(millis, u64::from(u32::MAX) * 1000 + 999);
}

fn noop() {}

#[test]
fn trigger_slots_enforce_the_one_listener_contract() {
    let mut events = CalendarEvents::new();
    let callback: AlarmCallback = noop;

    events.register_alarm(callback).unwrap();
    events.register_second(callback).unwrap();
    events.register_millisecond(callback).unwrap();

    assert_eq!(events.register_alarm(callback), Err(Error::Busy));
    assert_eq!(events.register_second(callback), Err(Error::Busy));
    assert_eq!(events.register_millisecond(callback), Err(Error::Busy));

    events.unregister_alarm().unwrap();
    assert_eq!(events.unregister_alarm(), Err(Error::NullCallback));
    events.unregister_second().unwrap();
    events.unregister_millisecond().unwrap();
}
