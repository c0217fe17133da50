//! Calendar/RTC abstraction.
//!
//! The calendar block keeps wall-clock time across sleep and drives the
//! alarm, second and millisecond wake triggers. Calendar arithmetic
//! (rollover, leap years) is the hardware driver's job — the governor only
//! ever asks for "alarm in N milliseconds" or unix-time conversions.

use embassy_time::Duration;

use crate::error::Error;

/// Day of the week as the calendar hardware counts it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[allow(missing_docs)]
pub enum Weekday {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

/// Wall-clock date and time with millisecond resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DateTime {
    /// Full year (e.g. 2026).
    pub year: u16,
    /// Month, 1..=12.
    pub month: u8,
    /// Day of month, 1..=31.
    pub day: u8,
    /// Day of week.
    pub weekday: Weekday,
    /// Hour, 0..=23.
    pub hour: u8,
    /// Minute, 0..=59.
    pub minute: u8,
    /// Second, 0..=59.
    pub second: u8,
    /// Millisecond, 0..=999.
    pub millisecond: u16,
}

impl Default for DateTime {
    /// The seed value programmed when the calendar has never been set.
    fn default() -> Self {
        DateTime {
            year: 2000,
            month: 1,
            day: 1,
            weekday: Weekday::Saturday,
            hour: 0,
            minute: 0,
            second: 0,
            millisecond: 0,
        }
    }
}

/// Calendar/RTC hardware interface.
pub trait Calendar {
    /// Read the current wall-clock time.
    fn get_date_time(&mut self) -> Result<DateTime, Error>;

    /// Program the wall-clock time.
    fn set_date_time(&mut self, date_time: &DateTime) -> Result<(), Error>;

    /// Read the currently programmed alarm.
    fn get_alarm(&mut self) -> Result<DateTime, Error>;

    /// Program an absolute alarm.
    fn set_alarm(&mut self, alarm: &DateTime) -> Result<(), Error>;

    /// Program the alarm `after` from now. The driver does the date
    /// arithmetic (month lengths, rollover).
    fn arm_alarm_in(&mut self, after: Duration) -> Result<(), Error>;

    /// Whether the wall clock was ever programmed since power-on.
    fn is_date_time_set(&mut self) -> Result<bool, Error>;

    /// Convert a calendar value to unix seconds.
    fn to_unix_seconds(&self, date_time: &DateTime) -> Result<u32, Error>;

    /// Convert unix seconds to a calendar value.
    fn from_unix_seconds(&self, seconds: u32) -> Result<DateTime, Error>;

    /// Convert a calendar value to unix milliseconds.
    fn unix_millis(&self, date_time: &DateTime) -> Result<u64, Error> {
        let seconds = u64::from(self.to_unix_seconds(date_time)?);
        Ok(seconds
            .saturating_mul(1000)
            .saturating_add(u64::from(date_time.millisecond)))
    }
}

/// Callback invoked from the calendar trigger interrupt context.
///
/// Runs with interrupts masked; must not block and must not call back into
/// the governor.
pub type AlarmCallback = fn();

/// Single-slot registration for the calendar trigger callbacks.
///
/// One callback per trigger kind; a second registration without an
/// unregister in between is refused with [`Error::Busy`], unregistering an
/// empty slot is refused with [`Error::NullCallback`]. This mirrors the
/// one-listener contract of the underlying interrupt lines.
#[derive(Debug, Default)]
pub struct CalendarEvents {
    alarm: Option<AlarmCallback>,
    second: Option<AlarmCallback>,
    millisecond: Option<AlarmCallback>,
}

impl CalendarEvents {
    /// Empty registration table.
    pub const fn new() -> Self {
        CalendarEvents { alarm: None, second: None, millisecond: None }
    }

    /// Register the alarm-trigger callback.
    pub fn register_alarm(&mut self, callback: AlarmCallback) -> Result<(), Error> {
        Self::fill(&mut self.alarm, callback)
    }

    /// Remove the alarm-trigger callback.
    pub fn unregister_alarm(&mut self) -> Result<(), Error> {
        Self::clear(&mut self.alarm)
    }

    /// Register the second-trigger callback.
    pub fn register_second(&mut self, callback: AlarmCallback) -> Result<(), Error> {
        Self::fill(&mut self.second, callback)
    }

    /// Remove the second-trigger callback.
    pub fn unregister_second(&mut self) -> Result<(), Error> {
        Self::clear(&mut self.second)
    }

    /// Register the millisecond-trigger callback.
    pub fn register_millisecond(&mut self, callback: AlarmCallback) -> Result<(), Error> {
        Self::fill(&mut self.millisecond, callback)
    }

    /// Remove the millisecond-trigger callback.
    pub fn unregister_millisecond(&mut self) -> Result<(), Error> {
        Self::clear(&mut self.millisecond)
    }

    /// The registered alarm callback, if any.
    pub fn alarm(&self) -> Option<AlarmCallback> {
        self.alarm
    }

    fn fill(slot: &mut Option<AlarmCallback>, callback: AlarmCallback) -> Result<(), Error> {
        if slot.is_some() {
            return Err(Error::Busy);
        }
        *slot = Some(callback);
        Ok(())
    }

    fn clear(slot: &mut Option<AlarmCallback>) -> Result<(), Error> {
        if slot.is_none() {
            return Err(Error::NullCallback);
        }
        *slot = None;
        Ok(())
    }
}
