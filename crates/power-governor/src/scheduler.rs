//! Wake/calibration event scheduling.
//!
//! The 32 kHz RC sleep clock drifts with temperature, so the chip must wake
//! every calibration period and re-trim it. Applications also program a
//! calendar alarm. Both demands share one hardware alarm: the scheduler
//! keeps two countdowns and, each time the chip is about to sleep, answers
//! "how far away is the next event, and is it the alarm, the calibration, or
//! both" — merging the two when they land within a coalescing threshold of
//! each other.
//!
//! All arithmetic is unsigned milliseconds and saturates at zero; a late
//! event yields a zero horizon (fire immediately), never a wrapped one.

use embassy_time::Duration;

/// Board-calibration constants of the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SchedulerConfig {
    /// Period between RC oscillator re-trims.
    pub calibration_interval: Duration,
    /// Events closer together than this fire together.
    pub coalescing_threshold: Duration,
    /// Fixed bootloader/wake latency subtracted from the first horizon
    /// computed after a wake.
    pub wakeup_overhead: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            calibration_interval: Duration::from_millis(1_800_000),
            coalescing_threshold: Duration::from_millis(10),
            wakeup_overhead: Duration::from_millis(4),
        }
    }
}

/// What the expiring alarm horizon is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WakeEvents {
    /// The RC oscillator must be re-trimmed.
    pub calibration: bool,
    /// The application alarm fired.
    pub alarm: bool,
}

/// Two-countdown horizon calculator for the shared hardware alarm.
///
/// `next_event_time` consumes scheduler state: each call plans exactly one
/// wake and updates the due flags for it. The caller re-arms the hardware
/// alarm with the returned horizon and, when it expires, reads
/// [`take_due_events`](Self::take_due_events) to learn what to do.
#[derive(Debug)]
pub struct CalibrationScheduler {
    calibration_interval: u64,
    threshold: u64,
    overhead: u64,

    alarm_interval: u64,
    remaining_time: u64,
    remaining_alarm: u64,
    remaining_calibration: u64,
    last_value: u64,

    calibration_due: bool,
    alarm_due: bool,
    periodic_wake: bool,
    overhead_pending: bool,
    application_attribution: bool,
}

impl CalibrationScheduler {
    /// Scheduler with the given board constants.
    ///
    /// Starts with a calibration request pending: the oscillator has never
    /// been trimmed at this point.
    pub fn new(config: SchedulerConfig) -> Self {
        CalibrationScheduler {
            calibration_interval: config.calibration_interval.as_millis(),
            threshold: config.coalescing_threshold.as_millis(),
            overhead: config.wakeup_overhead.as_millis(),
            alarm_interval: 0,
            remaining_time: 0,
            remaining_alarm: 0,
            remaining_calibration: 0,
            last_value: 0,
            calibration_due: true,
            alarm_due: false,
            periodic_wake: false,
            overhead_pending: false,
            application_attribution: true,
        }
    }

    /// The configured calibration period.
    pub fn calibration_interval(&self) -> Duration {
        Duration::from_millis(self.calibration_interval)
    }

    /// The alarm interval currently being tracked.
    ///
    /// Merging may clear this as a side effect of
    /// [`next_event_time`](Self::next_event_time); callers holding a copy
    /// must re-fetch it after every horizon computation.
    pub fn alarm_interval(&self) -> Duration {
        Duration::from_millis(self.alarm_interval)
    }

    /// Track an application alarm `interval` away from the counter start,
    /// and reseed the shared countdown.
    pub fn set_alarm_interval(&mut self, interval: Duration) {
        self.alarm_interval = interval.as_millis();
        self.remaining_time = self.alarm_interval.max(self.calibration_interval);
    }

    /// Stop tracking the application alarm.
    pub fn clear_alarm_interval(&mut self) {
        self.alarm_interval = 0;
    }

    /// Feed the countdowns measured against the wall clock (adjustment
    /// mode): time left to the alarm and time left to the next calibration.
    pub fn set_adjusted_remaining(&mut self, alarm: Duration, calibration: Duration) {
        self.remaining_alarm = alarm.as_millis();
        self.remaining_calibration = calibration.as_millis();
    }

    /// Mark the alarm as a periodic wake source (it re-fires every interval
    /// instead of being consumed by its first expiry).
    pub fn set_periodic_wake(&mut self, periodic: bool) {
        self.periodic_wake = periodic;
    }

    /// Whether the alarm re-fires every interval.
    pub fn is_periodic_wake(&self) -> bool {
        self.periodic_wake
    }

    /// Note that the chip just woke: the next horizon must absorb the fixed
    /// wake latency once.
    pub fn mark_wakeup_overhead(&mut self) {
        self.overhead_pending = true;
    }

    /// Ask for an RC re-trim at the next opportunity (wall clock was
    /// reprogrammed, previous trim is meaningless).
    pub fn request_calibration(&mut self) {
        self.calibration_due = true;
    }

    /// Whether the pending/next event includes a calibration.
    pub fn is_calibration_due(&self) -> bool {
        self.calibration_due
    }

    /// Whether the pending/next event includes the application alarm.
    pub fn is_alarm_due(&self) -> bool {
        self.alarm_due
    }

    /// Read and clear only the calibration request, leaving a pending alarm
    /// untouched (wall-clock reprogramming path).
    pub fn take_calibration_request(&mut self) -> bool {
        let due = self.calibration_due;
        self.calibration_due = false;
        due
    }

    /// Attribute the next calendar writes to the application (`true`) or to
    /// the scheduler's own re-arming (`false`).
    ///
    /// Calendar writes made while attribution is off must not restart the
    /// calibration counters or recurse into adjustment.
    pub fn set_application_attribution(&mut self, application: bool) {
        self.application_attribution = application;
    }

    /// Whether the current calendar write comes from the application.
    pub fn is_application_attribution(&self) -> bool {
        self.application_attribution
    }

    /// Read and clear the due flags (wake interrupt path).
    pub fn take_due_events(&mut self) -> WakeEvents {
        let events = WakeEvents { calibration: self.calibration_due, alarm: self.alarm_due };
        self.calibration_due = false;
        self.alarm_due = false;
        events
    }

    /// Compute the horizon of the next event and set the due flags for it.
    ///
    /// `adjustment` selects wall-clock mode: the alarm was programmed some
    /// unknown time after the counters started, so the horizons come from
    /// the measured countdowns fed through
    /// [`set_adjusted_remaining`](Self::set_adjusted_remaining). Without
    /// adjustment the scheduler folds whole periods off its own counters.
    pub fn next_event_time(&mut self, adjustment: bool) -> Duration {
        let horizon = if self.alarm_interval == 0 {
            // No alarm tracked (or a one-shot already consumed): pure
            // calibration cadence.
            self.set_calibration_only();
            self.calibration_interval
        } else if self.alarm_interval > self.calibration_interval {
            self.alarm_after_calibration(adjustment)
        } else if self.alarm_interval < self.calibration_interval {
            self.alarm_before_calibration(adjustment)
        } else {
            // Exactly one alarm per calibration period: both fire together
            // every cycle.
            self.set_both();
            let horizon = self.alarm_interval;
            if adjustment {
                self.alarm_interval = 0;
            }
            horizon
        };
        Duration::from_millis(horizon.saturating_sub(self.consume_overhead()))
    }

    /// Alarm lands beyond the calibration period: calibrations tick in
    /// between, and the shared countdown tracks the distance to the alarm.
    fn alarm_after_calibration(&mut self, adjustment: bool) -> u64 {
        if adjustment {
            if self.remaining_calibration > self.remaining_alarm {
                self.remaining_time =
                    self.remaining_calibration.saturating_sub(self.remaining_alarm);
                self.set_alarm_only();
                if self.remaining_time < self.threshold {
                    self.alarm_interval = 0;
                    self.set_both();
                }
                // Milliseconds from the last trim to the alarm, derived from
                // the countdowns:
                // alarm - last_trim = remaining_alarm + period - remaining_calibration
                self.last_value = self
                    .remaining_alarm
                    .saturating_add(self.calibration_interval)
                    .saturating_sub(self.remaining_calibration);
                self.remaining_time = self.calibration_interval;
                self.remaining_alarm
            } else if self.remaining_calibration < self.remaining_alarm {
                // Wake at the calibration; what stays on the countdown is
                // the stretch from that wake to the alarm.
                self.remaining_time =
                    self.remaining_alarm.saturating_sub(self.remaining_calibration);
                self.set_calibration_only();
                if self.remaining_time < self.threshold {
                    self.alarm_interval = 0;
                    self.set_both();
                }
                self.remaining_calibration
            } else {
                // Dead tie: one wake serves both, alarm consumed.
                self.alarm_interval = 0;
                self.set_both();
                self.remaining_alarm
            }
        } else if self.remaining_time >= self.calibration_interval {
            if self.last_value > 0 {
                // A previous merge left a partial period; finish it first.
                let carried = self.last_value;
                self.remaining_time = self
                    .remaining_time
                    .saturating_sub(self.calibration_interval.saturating_sub(carried));
                self.last_value = 0;
                self.set_calibration_only();
                if !self.periodic_wake {
                    self.alarm_interval = 0;
                }
                return self.calibration_interval.saturating_sub(carried);
            }
            self.remaining_time = self.remaining_time.saturating_sub(self.calibration_interval);
            self.set_calibration_only();
            if self.remaining_time <= self.threshold {
                // The alarm follows this calibration too closely (or lands
                // on it): merge, and restart the countdown for the next
                // alarm cycle.
                let residual = self.remaining_time;
                self.remaining_time = self.alarm_interval;
                self.set_both();
                if !self.periodic_wake {
                    self.alarm_interval = 0;
                }
                if self.remaining_time <= self.threshold {
                    return self.calibration_interval.saturating_add(residual);
                }
            }
            self.calibration_interval
        } else {
            // Less than a full period left to the alarm.
            self.last_value = self.remaining_time;
            self.remaining_time = self.alarm_interval;
            if self.calibration_interval.saturating_sub(self.last_value) <= self.threshold {
                let carried = self.last_value;
                self.set_both();
                self.last_value = 0;
                if !self.periodic_wake {
                    self.alarm_interval = 0;
                }
                return carried;
            }
            self.set_alarm_only();
            self.last_value
        }
    }

    /// Alarm lands within the calibration period: alarms tick while the
    /// shared countdown tracks the distance to the calibration.
    fn alarm_before_calibration(&mut self, adjustment: bool) -> u64 {
        let one_shot = !self.periodic_wake && !adjustment;
        let horizon = if self.remaining_time >= self.alarm_interval {
            if self.last_value > 0 {
                // A previous merge left a partial alarm interval behind.
                let carried = self.last_value;
                self.remaining_time = self
                    .remaining_time
                    .saturating_sub(self.alarm_interval.saturating_sub(carried));
                self.last_value = 0;
                self.set_alarm_only();
                self.alarm_interval.saturating_sub(carried)
            } else {
                self.remaining_time = self.remaining_time.saturating_sub(self.alarm_interval);
                self.set_alarm_only();
                if self.remaining_time <= self.threshold {
                    // The calibration boundary coincides with (or trails
                    // just behind) this alarm: fire both and restart the
                    // calibration countdown.
                    self.remaining_time = self.calibration_interval;
                    self.set_both();
                }
                if adjustment {
                    self.remaining_alarm
                } else {
                    self.alarm_interval
                }
            }
        } else {
            // The calibration boundary comes before the next alarm.
            self.last_value = self.remaining_time;
            self.remaining_time = self.calibration_interval;
            if self.alarm_interval.saturating_sub(self.last_value) <= self.threshold {
                self.set_both();
                self.last_value = 0;
                self.alarm_interval
            } else {
                self.set_calibration_only();
                self.last_value
            }
        };
        if one_shot && self.alarm_due {
            // Single-shot alarm: consumed the moment its horizon is handed
            // out. Callers holding a stale interval copy must re-fetch.
            self.alarm_interval = 0;
        }
        horizon
    }

    fn consume_overhead(&mut self) -> u64 {
        if self.overhead_pending {
            self.overhead_pending = false;
            return self.overhead;
        }
        0
    }

    fn set_both(&mut self) {
        self.calibration_due = true;
        self.alarm_due = true;
    }

    fn set_alarm_only(&mut self) {
        self.calibration_due = false;
        self.alarm_due = true;
    }

    fn set_calibration_only(&mut self) {
        self.calibration_due = true;
        self.alarm_due = false;
    }
}

impl Default for CalibrationScheduler {
    fn default() -> Self {
        CalibrationScheduler::new(SchedulerConfig::default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const CALIB: u64 = 1_800_000;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn starts_with_calibration_pending() {
        let mut scheduler = CalibrationScheduler::default();
        let events = scheduler.take_due_events();
        assert!(events.calibration);
        assert!(!events.alarm);
        // Cleared after the take.
        assert!(!scheduler.is_calibration_due());
    }

    #[test]
    fn no_alarm_means_pure_calibration_cadence() {
        let mut scheduler = CalibrationScheduler::default();
        let _ = scheduler.take_due_events();
        assert_eq!(scheduler.next_event_time(false), ms(CALIB));
        let events = scheduler.take_due_events();
        assert!(events.calibration && !events.alarm);
        assert_eq!(scheduler.next_event_time(false), ms(CALIB));
    }

    #[test]
    fn wake_overhead_is_subtracted_exactly_once() {
        let mut scheduler = CalibrationScheduler::default();
        scheduler.mark_wakeup_overhead();
        assert_eq!(scheduler.next_event_time(false), ms(CALIB - 4));
        assert_eq!(scheduler.next_event_time(false), ms(CALIB));
    }

    #[test]
    fn one_shot_alarm_is_consumed_with_its_horizon() {
        let mut scheduler = CalibrationScheduler::default();
        let _ = scheduler.take_due_events();
        scheduler.set_alarm_interval(ms(1000));
        let horizon = scheduler.next_event_time(false);
        assert_eq!(horizon, ms(1000));
        let events = scheduler.take_due_events();
        assert!(events.alarm && !events.calibration);
        assert_eq!(scheduler.alarm_interval(), ms(0));
        // Follow-up wakes fall back to the calibration cadence.
        assert_eq!(scheduler.next_event_time(false), ms(CALIB));
        assert!(scheduler.take_due_events().calibration);
    }

    #[test]
    fn periodic_alarm_folds_into_the_calibration_boundary() {
        let mut scheduler = CalibrationScheduler::default();
        let _ = scheduler.take_due_events();
        scheduler.set_periodic_wake(true);
        scheduler.set_alarm_interval(ms(600_000));

        // Two plain alarms...
        for _ in 0..2 {
            assert_eq!(scheduler.next_event_time(false), ms(600_000));
            let events = scheduler.take_due_events();
            assert!(events.alarm && !events.calibration);
        }
        // ...then the third coincides with the calibration boundary.
        assert_eq!(scheduler.next_event_time(false), ms(600_000));
        let events = scheduler.take_due_events();
        assert!(events.alarm && events.calibration);
        // Periodic wake source: the interval survives the merge.
        assert_eq!(scheduler.alarm_interval(), ms(600_000));
    }

    #[test]
    fn near_boundary_alarm_merges_with_calibration() {
        let mut scheduler = CalibrationScheduler::default();
        let _ = scheduler.take_due_events();
        scheduler.set_periodic_wake(true);
        // 5 ms short of the calibration period, within the 10 ms threshold.
        scheduler.set_alarm_interval(ms(CALIB - 5));
        let horizon = scheduler.next_event_time(false);
        assert_eq!(horizon, ms(CALIB - 5));
        let events = scheduler.take_due_events();
        assert!(events.alarm && events.calibration);
    }

    #[test]
    fn equal_intervals_fire_together_every_cycle() {
        let mut scheduler = CalibrationScheduler::default();
        let _ = scheduler.take_due_events();
        scheduler.set_periodic_wake(true);
        scheduler.set_alarm_interval(ms(CALIB));
        for _ in 0..3 {
            assert_eq!(scheduler.next_event_time(false), ms(CALIB));
            let events = scheduler.take_due_events();
            assert!(events.alarm && events.calibration);
            assert_eq!(scheduler.alarm_interval(), ms(CALIB));
        }
    }

    #[test]
    fn equal_intervals_in_adjustment_mode_consume_the_alarm() {
        let mut scheduler = CalibrationScheduler::default();
        let _ = scheduler.take_due_events();
        scheduler.set_alarm_interval(ms(CALIB));
        assert_eq!(scheduler.next_event_time(true), ms(CALIB));
        assert_eq!(scheduler.alarm_interval(), ms(0));
    }

    #[test]
    fn adjustment_alarm_sooner_uses_measured_countdown() {
        let mut scheduler = CalibrationScheduler::default();
        let _ = scheduler.take_due_events();
        // Alarm programmed 5 s after the counter started, 3 s out.
        scheduler.set_alarm_interval(ms(5000));
        scheduler.set_adjusted_remaining(ms(3000), ms(1_795_000));
        let horizon = scheduler.next_event_time(true);
        assert_eq!(horizon, ms(3000));
        let events = scheduler.take_due_events();
        assert!(events.alarm && !events.calibration);
    }

    #[test]
    fn adjustment_alarm_beyond_calibration_wakes_for_trim_first() {
        let mut scheduler = CalibrationScheduler::default();
        let _ = scheduler.take_due_events();
        scheduler.set_alarm_interval(ms(2_000_000));
        scheduler.set_adjusted_remaining(ms(1_900_000), ms(1_700_000));
        let horizon = scheduler.next_event_time(true);
        assert_eq!(horizon, ms(1_700_000));
        let events = scheduler.take_due_events();
        assert!(events.calibration && !events.alarm);
        // Alarm still pending for a later wake.
        assert_eq!(scheduler.alarm_interval(), ms(2_000_000));
    }

    #[test]
    fn adjustment_trim_just_behind_alarm_merges_and_consumes() {
        let mut scheduler = CalibrationScheduler::default();
        let _ = scheduler.take_due_events();
        scheduler.set_alarm_interval(ms(2_000_000));
        // Calibration 5 ms after the alarm: below the threshold.
        scheduler.set_adjusted_remaining(ms(995), ms(1000));
        let horizon = scheduler.next_event_time(true);
        assert_eq!(horizon, ms(995));
        let events = scheduler.take_due_events();
        assert!(events.calibration && events.alarm);
        assert_eq!(scheduler.alarm_interval(), ms(0));
    }

    #[test]
    fn adjustment_dead_tie_merges_and_consumes() {
        let mut scheduler = CalibrationScheduler::default();
        let _ = scheduler.take_due_events();
        scheduler.set_alarm_interval(ms(2_000_000));
        scheduler.set_adjusted_remaining(ms(1200), ms(1200));
        assert_eq!(scheduler.next_event_time(true), ms(1200));
        let events = scheduler.take_due_events();
        assert!(events.calibration && events.alarm);
        assert_eq!(scheduler.alarm_interval(), ms(0));
    }

    #[test]
    fn late_event_saturates_to_zero_horizon() {
        let mut scheduler = CalibrationScheduler::default();
        let _ = scheduler.take_due_events();
        scheduler.set_alarm_interval(ms(2));
        scheduler.mark_wakeup_overhead();
        // 2 ms horizon minus 4 ms overhead clamps to zero, never wraps.
        assert_eq!(scheduler.next_event_time(false), ms(0));
    }

    #[test]
    fn reprogramming_the_clock_requests_a_trim() {
        let mut scheduler = CalibrationScheduler::default();
        let _ = scheduler.take_due_events();
        assert!(!scheduler.is_calibration_due());
        scheduler.request_calibration();
        assert!(scheduler.take_due_events().calibration);
    }

    #[test]
    fn some_event_is_always_due_after_planning() {
        let mut scheduler = CalibrationScheduler::default();
        let _ = scheduler.take_due_events();
        for interval in [0u64, 3, 600_000, CALIB, CALIB + 7, 4_000_000] {
            scheduler.set_alarm_interval(ms(interval));
            let _ = scheduler.next_event_time(false);
            assert!(scheduler.is_calibration_due() || scheduler.is_alarm_due());
            let _ = scheduler.take_due_events();
        }
    }
}
