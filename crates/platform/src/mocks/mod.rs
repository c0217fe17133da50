//! Mock implementations for testing
//!
//! This module provides mock implementations of the platform traits for use
//! in unit and integration tests. The mock calendar keeps a millisecond
//! virtual clock the tests advance by hand.

#![cfg(any(test, feature = "std"))]
#![allow(clippy::arithmetic_side_effects)] // virtual-clock bookkeeping, test support only
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::missing_panics_doc)]

use embassy_time::Duration;

use crate::calendar::{Calendar, DateTime, Weekday};
use crate::clock::ClockControl;
use crate::error::Error;
use crate::lowpower::{RamBankSet, SleepControl, SleepKind};
use crate::power::{ClockScaling, PeripheralSet, PowerState};

const MS_PER_DAY: u64 = 86_400_000;

// Civil-date conversion (days since 1970-01-01). The governor never does
// this arithmetic itself; the mock needs it to behave like the RTC driver.
fn days_from_civil(year: i64, month: i64, day: i64) -> i64 {
    let y = if month <= 2 { year - 1 } else { year };
    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = y - era * 400;
    let mp = if month > 2 { month - 3 } else { month + 9 };
    let doy = (153 * mp + 2) / 5 + day - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

fn civil_from_days(z: i64) -> (i64, i64, i64) {
    let z = z + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let y = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    (if m <= 2 { y + 1 } else { y }, m, d)
}

fn weekday_from_days(days: i64) -> Weekday {
    // 1970-01-01 was a Thursday.
    match (days + 4).rem_euclid(7) {
        0 => Weekday::Sunday,
        1 => Weekday::Monday,
        2 => Weekday::Tuesday,
        3 => Weekday::Wednesday,
        4 => Weekday::Thursday,
        5 => Weekday::Friday,
        _ => Weekday::Saturday,
    }
}

/// Calendar mock backed by a virtual millisecond unix clock.
#[derive(Debug)]
pub struct MockCalendar {
    now_ms: u64,
    alarm_ms: Option<u64>,
    date_time_set: bool,
    /// Every `arm_alarm_in` horizon handed to the driver, in ms.
    pub armed: heapless::Vec<u64, 32>,
}

impl MockCalendar {
    /// Calendar whose wall clock was already programmed, at `now_ms` unix ms.
    pub fn new(now_ms: u64) -> Self {
        MockCalendar { now_ms, alarm_ms: None, date_time_set: true, armed: heapless::Vec::new() }
    }

    /// Fresh-from-power-on calendar (wall clock never set).
    pub fn unset() -> Self {
        MockCalendar {
            now_ms: 946_684_800_000, // 2000-01-01, the hardware reset value
            alarm_ms: None,
            date_time_set: false,
            armed: heapless::Vec::new(),
        }
    }

    /// Advance the virtual clock.
    pub fn advance(&mut self, elapsed: Duration) {
        self.now_ms += elapsed.as_millis();
    }

    /// Current virtual time in unix milliseconds.
    pub fn now_unix_millis(&self) -> u64 {
        self.now_ms
    }

    /// The alarm currently programmed, in unix milliseconds.
    pub fn alarm_unix_millis(&self) -> Option<u64> {
        self.alarm_ms
    }

    /// The horizon of the most recent `arm_alarm_in` call, in ms.
    pub fn last_armed(&self) -> Option<u64> {
        self.armed.last().copied()
    }

    fn date_time_at(&self, unix_ms: u64) -> DateTime {
        let days = (unix_ms / MS_PER_DAY) as i64;
        let rem = unix_ms % MS_PER_DAY;
        let (year, month, day) = civil_from_days(days);
        DateTime {
            year: year as u16,
            month: month as u8,
            day: day as u8,
            weekday: weekday_from_days(days),
            hour: (rem / 3_600_000) as u8,
            minute: (rem / 60_000 % 60) as u8,
            second: (rem / 1000 % 60) as u8,
            millisecond: (rem % 1000) as u16,
        }
    }
}

impl Calendar for MockCalendar {
    fn get_date_time(&mut self) -> Result<DateTime, Error> {
        Ok(self.date_time_at(self.now_ms))
    }

    fn set_date_time(&mut self, date_time: &DateTime) -> Result<(), Error> {
        self.now_ms = self.unix_millis(date_time)?;
        self.date_time_set = true;
        Ok(())
    }

    fn get_alarm(&mut self) -> Result<DateTime, Error> {
        match self.alarm_ms {
            Some(ms) => Ok(self.date_time_at(ms)),
            None => Err(Error::Fail),
        }
    }

    fn set_alarm(&mut self, alarm: &DateTime) -> Result<(), Error> {
        self.alarm_ms = Some(self.unix_millis(alarm)?);
        Ok(())
    }

    fn arm_alarm_in(&mut self, after: Duration) -> Result<(), Error> {
        let horizon = after.as_millis();
        self.alarm_ms = Some(self.now_ms + horizon);
        let _ = self.armed.push(horizon);
        Ok(())
    }

    fn is_date_time_set(&mut self) -> Result<bool, Error> {
        Ok(self.date_time_set)
    }

    fn to_unix_seconds(&self, date_time: &DateTime) -> Result<u32, Error> {
        if date_time.month == 0
            || date_time.month > 12
            || date_time.day == 0
            || date_time.day > 31
            || date_time.hour > 23
            || date_time.minute > 59
            || date_time.second > 59
            || date_time.millisecond > 999
        {
            return Err(Error::InvalidParameter);
        }
        let days = days_from_civil(
            i64::from(date_time.year),
            i64::from(date_time.month),
            i64::from(date_time.day),
        );
        let seconds = days * 86_400
            + i64::from(date_time.hour) * 3600
            + i64::from(date_time.minute) * 60
            + i64::from(date_time.second);
        u32::try_from(seconds).map_err(|_| Error::InvalidParameter)
    }

    fn from_unix_seconds(&self, seconds: u32) -> Result<DateTime, Error> {
        Ok(self.date_time_at(u64::from(seconds) * 1000))
    }
}

/// Clock-tree mock recording every configuration request.
#[derive(Debug, Default)]
pub struct MockClock {
    /// Every `configure_clocks` call in order.
    pub configured: heapless::Vec<(PowerState, ClockScaling), 32>,
    /// Every `power_peripherals` call in order.
    pub peripheral_calls: heapless::Vec<(PeripheralSet, bool), 16>,
    /// Injected failure for the next `configure_clocks` call.
    pub fail_next: Option<Error>,
}

impl MockClock {
    /// Clock mock that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClockControl for MockClock {
    fn configure_clocks(&mut self, state: PowerState, scaling: ClockScaling) -> Result<(), Error> {
        if let Some(error) = self.fail_next.take() {
            return Err(error);
        }
        let _ = self.configured.push((state, scaling));
        Ok(())
    }

    fn power_peripherals(&mut self, peripherals: &PeripheralSet, up: bool) -> Result<(), Error> {
        let _ = self.peripheral_calls.push((*peripherals, up));
        Ok(())
    }
}

/// Sleep-entry mock with scriptable veto/re-sleep hooks.
#[derive(Debug, Default)]
pub struct MockSleep {
    /// Every sleep entry in order.
    pub sleeps: heapless::Vec<SleepKind, 16>,
    /// Banks last programmed for power-down.
    pub retention: Option<RamBankSet>,
    /// Number of RC calibration runs.
    pub calibrations: usize,
    /// Number of wait-for-interrupt standbys.
    pub wfi_count: usize,
    /// When true, `ok_to_sleep` vetoes the next sleep attempt.
    pub veto_sleep: bool,
    /// Number of wakes that should immediately re-enter sleep.
    pub resleep_pending: u8,
    /// Injected failure for the next `enter_sleep` call.
    pub fail_next: Option<Error>,
}

impl MockSleep {
    /// Sleep mock that wakes immediately and never vetoes.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SleepControl for MockSleep {
    fn enter_sleep(&mut self, kind: SleepKind) -> Result<(), Error> {
        if let Some(error) = self.fail_next.take() {
            return Err(error);
        }
        let _ = self.sleeps.push(kind);
        Ok(())
    }

    fn wait_for_interrupt(&mut self) {
        self.wfi_count += 1;
    }

    fn apply_ram_retention(&mut self, banks: &RamBankSet) -> Result<(), Error> {
        banks.validate()?;
        self.retention = Some(*banks);
        Ok(())
    }

    fn calibrate_rc_oscillator(&mut self) -> Result<(), Error> {
        self.calibrations += 1;
        Ok(())
    }

    fn ok_to_sleep(&mut self) -> bool {
        !self.veto_sleep
    }

    fn resleep_on_wake(&mut self) -> bool {
        if self.resleep_pending > 0 {
            self.resleep_pending -= 1;
            return true;
        }
        false
    }
}
