//! Property tests for the wake/calibration scheduler.
//!
//! Whatever alarm interval the application throws at it, every planned
//! horizon must stay within one coalescing threshold of the nearer of the
//! two cadences, and every plan must leave at least one event due — a wake
//! with nothing to do would burn the power budget the scheduler exists to
//! protect.

#![allow(clippy::unwrap_used)]
#![allow(clippy::arithmetic_side_effects)]

use embassy_time::Duration;
use power_governor::{CalibrationScheduler, SchedulerConfig};
use proptest::prelude::*;

const CALIB_MS: u64 = 1_800_000;
const THRESHOLD_MS: u64 = 10;

fn scheduler() -> CalibrationScheduler {
    let mut scheduler = CalibrationScheduler::new(SchedulerConfig::default());
    // Consume the boot-time trim request so the flags only reflect planning.
    let _ = scheduler.take_due_events();
    scheduler
}

proptest! {
    #[test]
    fn horizon_stays_within_the_nearer_cadence(
        alarm_ms in 0u64..4 * CALIB_MS,
        periodic in any::<bool>(),
    ) {
        let mut scheduler = scheduler();
        scheduler.set_periodic_wake(periodic);
        scheduler.set_alarm_interval(Duration::from_millis(alarm_ms));

        let horizon = scheduler.next_event_time(false).as_millis();
        let bound = alarm_ms.max(CALIB_MS) + THRESHOLD_MS;
        prop_assert!(horizon <= bound, "horizon {horizon} exceeds bound {bound}");
    }

    #[test]
    fn planning_always_leaves_an_event_due(alarm_ms in 0u64..4 * CALIB_MS) {
        let mut scheduler = scheduler();
        scheduler.set_alarm_interval(Duration::from_millis(alarm_ms));
        let _ = scheduler.next_event_time(false);
        prop_assert!(scheduler.is_calibration_due() || scheduler.is_alarm_due());
    }

    #[test]
    fn periodic_sequences_stay_bounded(
        alarm_ms in 1u64..2 * CALIB_MS,
        wakes in 1usize..50,
    ) {
        let mut scheduler = scheduler();
        scheduler.set_periodic_wake(true);
        scheduler.set_alarm_interval(Duration::from_millis(alarm_ms));

        let bound = alarm_ms.max(CALIB_MS) + THRESHOLD_MS;
        for _ in 0..wakes {
            let horizon = scheduler.next_event_time(false).as_millis();
            prop_assert!(horizon <= bound, "horizon {horizon} exceeds bound {bound}");
            let events = scheduler.take_due_events();
            prop_assert!(events.calibration || events.alarm);
            // A periodic alarm survives every merge.
            prop_assert!(scheduler.alarm_interval().as_millis() == alarm_ms);
        }
    }

    #[test]
    fn wake_overhead_never_wraps_the_horizon(
        alarm_ms in 0u64..2 * CALIB_MS,
        overhead_marks in 0u8..3,
    ) {
        let mut scheduler = scheduler();
        scheduler.set_alarm_interval(Duration::from_millis(alarm_ms));
        for _ in 0..overhead_marks {
            scheduler.mark_wakeup_overhead();
        }
        let horizon = scheduler.next_event_time(false).as_millis();
        prop_assert!(horizon <= alarm_ms.max(CALIB_MS) + THRESHOLD_MS);
    }
}
