//! The power governor itself.
//!
//! Owns the requirement table, the wake-source registry, the transition
//! notifier and the wake/calibration scheduler, and drives the three
//! hardware collaborators through their platform traits. All mutating
//! operations run under the global critical section so the wake interrupt
//! path and thread-mode callers never interleave.

use embassy_time::Duration;
use platform::{
    AlarmCallback, Calendar, CalendarEvents, ClockControl, ClockScaling, DateTime, Error,
    PeripheralSet, PowerState, SleepControl, SleepKind,
};

use crate::notifier::{SubscriptionHandle, TransitionCallback, TransitionEvents, TransitionNotifier};
use crate::requirements::RequirementTable;
use crate::retention::{self, RamRetentionConfig};
use crate::scheduler::{CalibrationScheduler, SchedulerConfig, WakeEvents};
use crate::state;
use crate::wakeup::{WakeSource, WakeupSourceRegistry};

/// The operating point the system idles at when nothing votes otherwise.
pub const DEFAULT_STATE: PowerState = PowerState::Ps3;

/// Power-state governor over the three hardware collaborators.
///
/// Construct with [`new`](Self::new), then [`init`](Self::init) before any
/// other operation. One instance per system; the wake interrupt calls
/// [`handle_wake_event`](Self::handle_wake_event) on the same instance.
pub struct PowerGovernor<C, K, S>
where
    C: Calendar,
    K: ClockControl,
    S: SleepControl,
{
    calendar: C,
    clocks: K,
    sleep: S,

    initialized: bool,
    current: PowerState,
    scaling: ClockScaling,
    requirements: RequirementTable,
    wake_sources: WakeupSourceRegistry,
    notifier: TransitionNotifier,
    scheduler: CalibrationScheduler,
    events: CalendarEvents,

    // Unix-ms anchors for adjustment-mode horizon computation.
    counter_epoch_ms: u64,
    last_calibration_ms: u64,
}

impl<C, K, S> PowerGovernor<C, K, S>
where
    C: Calendar,
    K: ClockControl,
    S: SleepControl,
{
    /// Wrap the collaborators. The governor starts uninitialized.
    pub fn new(calendar: C, clocks: K, sleep: S, config: SchedulerConfig) -> Self {
        PowerGovernor {
            calendar,
            clocks,
            sleep,
            initialized: false,
            current: DEFAULT_STATE,
            scaling: ClockScaling::PowerSave,
            requirements: RequirementTable::new(),
            wake_sources: WakeupSourceRegistry::new(),
            notifier: TransitionNotifier::new(),
            scheduler: CalibrationScheduler::new(config),
            events: CalendarEvents::new(),
            counter_epoch_ms: 0,
            last_calibration_ms: 0,
        }
    }

    /// Bring the governor up in the default operating point.
    pub fn init(&mut self) -> Result<(), Error> {
        if self.initialized {
            return Err(Error::AlreadyInitialized);
        }
        critical_section::with(|_| {
            self.requirements.clear();
            self.current = DEFAULT_STATE;
            self.scaling = ClockScaling::PowerSave;
            self.clocks.configure_clocks(self.current, self.scaling)?;
            self.initialized = true;
            info!("power governor up in PS{}", self.current as u8);
            Ok(())
        })
    }

    /// Tear the governor down. Requirements are dropped; the clock tree is
    /// left as-is.
    pub fn deinit(&mut self) -> Result<(), Error> {
        self.ensure_initialized()?;
        critical_section::with(|_| {
            self.requirements.clear();
            self.initialized = false;
        });
        Ok(())
    }

    /// The committed operating point.
    pub fn current_state(&self) -> PowerState {
        self.current
    }

    /// Snapshot of the requirement counters, PS0 first.
    pub fn requirement_table(&self) -> [u8; 5] {
        self.requirements.counters()
    }

    /// The deepest voted operating point, `None` when sleep-eligible.
    pub fn lowest_eligible_state(&self) -> Option<PowerState> {
        self.requirements.lowest_eligible()
    }

    /// The active clock-scaling mode.
    pub fn clock_scaling(&self) -> ClockScaling {
        self.scaling
    }

    /// Re-tune the clock tree of the current operating point.
    pub fn set_clock_scaling(&mut self, scaling: ClockScaling) -> Result<(), Error> {
        self.ensure_initialized()?;
        critical_section::with(|_| {
            self.clocks.configure_clocks(self.current, scaling)?;
            self.scaling = scaling;
            Ok(())
        })
    }

    /// Vote for `state`; transitions immediately when the vote deepens the
    /// effective operating point.
    ///
    /// A vote for PS1 while in PS2 performs the retained drop right here:
    /// the call returns after the wake, the vote already consumed.
    pub fn add_requirement(&mut self, state: PowerState) -> Result<(), Error> {
        self.ensure_initialized()?;
        critical_section::with(|_| {
            self.requirements.add(state)?;
            let target = self.requirements.lowest_eligible().unwrap_or(DEFAULT_STATE);
            let result = if target == self.current {
                Ok(())
            } else if self.current == PowerState::Ps2 && target == PowerState::Ps1 {
                self.drop_to_ps1()
            } else {
                self.transition_to(target)
            };
            if result.is_err() {
                // Leave the table exactly as the caller saw it.
                let _ = self.requirements.remove(state);
            }
            result
        })
    }

    /// Withdraw a vote for `state`; transitions when the effective
    /// operating point changes. An emptied table settles back at the
    /// default operating point — sleep stays an explicit call.
    pub fn remove_requirement(&mut self, state: PowerState) -> Result<(), Error> {
        self.ensure_initialized()?;
        critical_section::with(|_| {
            self.requirements.remove(state)?;
            let target = self.requirements.lowest_eligible().unwrap_or(DEFAULT_STATE);
            let result =
                if target == self.current { Ok(()) } else { self.transition_to(target) };
            if result.is_err() {
                let _ = self.requirements.add(state);
            }
            result
        })
    }

    /// Subscribe `callback` to the transition edges in `events`.
    pub fn subscribe(
        &mut self,
        events: TransitionEvents,
        callback: TransitionCallback,
    ) -> Result<SubscriptionHandle, Error> {
        self.ensure_initialized()?;
        critical_section::with(|_| self.notifier.subscribe(events, callback))
    }

    /// Drop a transition subscription.
    pub fn unsubscribe(&mut self, handle: SubscriptionHandle) -> Result<(), Error> {
        self.ensure_initialized()?;
        critical_section::with(|_| self.notifier.unsubscribe(handle))
    }

    /// Arm a wake source. Idempotent.
    pub fn add_wakeup_source(&mut self, source: WakeSource) -> Result<(), Error> {
        self.ensure_initialized()?;
        critical_section::with(|_| self.wake_sources.enable(source));
        Ok(())
    }

    /// Disarm a wake source. Idempotent.
    pub fn remove_wakeup_source(&mut self, source: WakeSource) -> Result<(), Error> {
        self.ensure_initialized()?;
        critical_section::with(|_| self.wake_sources.disable(source));
        Ok(())
    }

    /// The armed wake sources.
    pub fn wakeup_sources(&self) -> &WakeupSourceRegistry {
        &self.wake_sources
    }

    /// Power the named peripheral gates up.
    pub fn add_peripheral_requirement(&mut self, peripherals: &PeripheralSet) -> Result<(), Error> {
        self.ensure_initialized()?;
        peripherals.validate()?;
        if peripherals.is_empty() {
            return Ok(());
        }
        critical_section::with(|_| self.clocks.power_peripherals(peripherals, true))
    }

    /// Power the named peripheral gates down.
    pub fn remove_peripheral_requirement(
        &mut self,
        peripherals: &PeripheralSet,
    ) -> Result<(), Error> {
        self.ensure_initialized()?;
        peripherals.validate()?;
        if peripherals.is_empty() {
            return Ok(());
        }
        critical_section::with(|_| self.clocks.power_peripherals(peripherals, false))
    }

    /// Plan and program RAM retention for the next sleep.
    pub fn configure_ram_retention(&mut self, config: &RamRetentionConfig) -> Result<(), Error> {
        self.ensure_initialized()?;
        let banks = retention::power_down_banks(config)?;
        critical_section::with(|_| self.sleep.apply_ram_retention(&banks))
    }

    /// Commit to sleep until a wake source fires.
    ///
    /// Refused while no wake source is armed (`InvalidState`) and when the
    /// last-moment veto hook says the system is mid-operation (`Busy`).
    /// Spurious wakes re-enter sleep while the re-sleep hook asks for it.
    pub fn sleep(&mut self) -> Result<(), Error> {
        self.ensure_initialized()?;
        if !state::is_valid_transition(self.current, PowerState::Sleep) {
            return Err(Error::InvalidState);
        }
        if self.wake_sources.is_empty() {
            return Err(Error::InvalidState);
        }
        critical_section::with(|_| {
            if !self.sleep.ok_to_sleep() {
                return Err(Error::Busy);
            }
            let kind = if self.current == PowerState::Ps2 {
                SleepKind::Retained
            } else {
                SleepKind::FromFlash
            };
            debug!("entering sleep from PS{}", self.current as u8);
            loop {
                self.sleep.enter_sleep(kind)?;
                self.scheduler.mark_wakeup_overhead();
                if !self.sleep.resleep_on_wake() {
                    break;
                }
                trace!("spurious wake, re-entering sleep");
            }
            self.notifier.notify(PowerState::Sleep, self.current);
            self.clocks.configure_clocks(self.current, ClockScaling::PowerSave)?;
            self.scaling = ClockScaling::PowerSave;
            Ok(())
        })
    }

    /// Wait-for-interrupt standby. Silently ignored when the current state
    /// cannot stand by.
    pub fn standby(&mut self) -> Result<(), Error> {
        self.ensure_initialized()?;
        if state::is_valid_transition(self.current, PowerState::Standby) {
            self.sleep.wait_for_interrupt();
            critical_section::with(|_| self.notifier.notify(PowerState::Standby, self.current));
        }
        Ok(())
    }

    /// Bring the calendar wake path up: seed the wall clock if it was never
    /// set, register the application alarm callback, run the first RC trim
    /// and arm the first horizon.
    pub fn init_calendar_wakeup(&mut self, alarm_callback: AlarmCallback) -> Result<(), Error> {
        self.ensure_initialized()?;
        critical_section::with(|_| {
            if !self.calendar.is_date_time_set()? {
                let seed = DateTime::default();
                self.scheduler.set_application_attribution(false);
                let seeded = self.calendar.set_date_time(&seed);
                self.scheduler.set_application_attribution(true);
                seeded?;
            }
            self.events.register_alarm(alarm_callback)?;

            let now = self.calendar.get_date_time()?;
            let now_ms = self.calendar.unix_millis(&now)?;
            self.counter_epoch_ms = now_ms;
            self.last_calibration_ms = now_ms;

            // The scheduler comes up with a trim request pending.
            if self.scheduler.take_calibration_request() {
                self.sleep.calibrate_rc_oscillator()?;
            }

            self.scheduler.set_periodic_wake(true);
            let horizon = self.scheduler.next_event_time(false);
            self.arm_alarm(horizon)?;
            self.wake_sources.enable(WakeSource::Alarm);
            info!("calendar wakeup armed, first horizon {} ms", horizon.as_millis());
            Ok(())
        })
    }

    /// Program the wall clock.
    ///
    /// An application write restarts the calibration counters and re-trims
    /// immediately: the previous trim was measured against a clock that no
    /// longer exists.
    pub fn set_date_time(&mut self, date_time: &DateTime) -> Result<(), Error> {
        self.ensure_initialized()?;
        critical_section::with(|_| {
            self.calendar.set_date_time(date_time)?;
            if self.scheduler.is_application_attribution() {
                self.scheduler.request_calibration();
                if self.scheduler.take_calibration_request() {
                    self.sleep.calibrate_rc_oscillator()?;
                }
            }
            let now_ms = self.calendar.unix_millis(date_time)?;
            self.counter_epoch_ms = now_ms;
            self.last_calibration_ms = now_ms;
            Ok(())
        })
    }

    /// Read the wall clock.
    pub fn get_date_time(&mut self) -> Result<DateTime, Error> {
        self.ensure_initialized()?;
        self.calendar.get_date_time()
    }

    /// Program an application alarm and fold it into the wake schedule.
    ///
    /// The alarm was programmed some unknown time after the counters
    /// started, so the horizons are recomputed in adjustment mode from
    /// wall-clock reads. A write made by the governor's own re-arming
    /// (attribution off) skips all of this.
    pub fn set_alarm(&mut self, alarm: &DateTime) -> Result<(), Error> {
        self.ensure_initialized()?;
        critical_section::with(|_| {
            self.calendar.set_alarm(alarm)?;
            if !self.scheduler.is_application_attribution() {
                return Ok(());
            }

            let now = self.calendar.get_date_time()?;
            let now_ms = self.calendar.unix_millis(&now)?;
            let alarm_ms = self.calendar.unix_millis(alarm)?;

            let alarm_interval = alarm_ms.saturating_sub(self.counter_epoch_ms);
            let remaining_alarm = alarm_ms.saturating_sub(now_ms);
            let since_trim = now_ms.saturating_sub(self.last_calibration_ms);
            let remaining_calibration = self
                .scheduler
                .calibration_interval()
                .as_millis()
                .saturating_sub(since_trim);

            self.scheduler.set_alarm_interval(Duration::from_millis(alarm_interval));
            self.scheduler.set_adjusted_remaining(
                Duration::from_millis(remaining_alarm),
                Duration::from_millis(remaining_calibration),
            );
            let horizon = self.scheduler.next_event_time(true);
            self.arm_alarm(horizon)
        })
    }

    /// The wake-interrupt path: find out what this wake was for, re-trim if
    /// a calibration was due, re-arm the next horizon and fire the
    /// application alarm callback when its event landed.
    ///
    /// Keep this the only thing the alarm ISR calls.
    pub fn handle_wake_event(&mut self) -> Result<WakeEvents, Error> {
        self.ensure_initialized()?;
        critical_section::with(|_| {
            let events = self.scheduler.take_due_events();
            if events.calibration {
                self.sleep.calibrate_rc_oscillator()?;
                let now = self.calendar.get_date_time()?;
                self.last_calibration_ms = self.calendar.unix_millis(&now)?;
                trace!("rc oscillator re-trimmed");
            }
            let horizon = self.scheduler.next_event_time(false);
            self.arm_alarm(horizon)?;
            if events.alarm {
                if let Some(callback) = self.events.alarm() {
                    callback();
                }
            }
            Ok(events)
        })
    }

    /// Direct access to the scheduler (horizon queries, periodic-wake
    /// configuration).
    pub fn scheduler(&self) -> &CalibrationScheduler {
        &self.scheduler
    }

    /// Mutable access to the scheduler.
    pub fn scheduler_mut(&mut self) -> &mut CalibrationScheduler {
        &mut self.scheduler
    }

    /// The calendar collaborator.
    pub fn calendar(&self) -> &C {
        &self.calendar
    }

    /// Mutable access to the calendar collaborator.
    pub fn calendar_mut(&mut self) -> &mut C {
        &mut self.calendar
    }

    /// The clock-tree collaborator.
    pub fn clock_control(&self) -> &K {
        &self.clocks
    }

    /// Mutable access to the clock-tree collaborator.
    pub fn clock_control_mut(&mut self) -> &mut K {
        &mut self.clocks
    }

    /// The low-power collaborator.
    pub fn sleep_control(&self) -> &S {
        &self.sleep
    }

    /// Mutable access to the low-power collaborator.
    pub fn sleep_control_mut(&mut self) -> &mut S {
        &mut self.sleep
    }

    fn ensure_initialized(&self) -> Result<(), Error> {
        if !self.initialized {
            return Err(Error::NotInitialized);
        }
        Ok(())
    }

    /// Validate, retune clocks, notify, commit — in that order, so a clock
    /// failure aborts before anyone observes the new state.
    fn transition_to(&mut self, target: PowerState) -> Result<(), Error> {
        if !state::is_valid_transition(self.current, target) {
            return Err(Error::InvalidState);
        }
        self.clocks.configure_clocks(target, self.scaling)?;
        debug!("PS{} -> PS{}", self.current as u8, target as u8);
        self.notifier.notify(self.current, target);
        self.current = target;
        Ok(())
    }

    /// The PS2 → PS1 retained drop. Execution resumes here after the wake;
    /// the system is back in PS2 and the PS1 vote is consumed, so the next
    /// wake restores PS2 again instead of re-dropping.
    fn drop_to_ps1(&mut self) -> Result<(), Error> {
        if !self.wake_sources.has_ulp_capable_source() {
            return Err(Error::InvalidState);
        }
        self.sleep.enter_sleep(SleepKind::Retained)?;
        self.scheduler.mark_wakeup_overhead();
        self.notifier.notify(PowerState::Ps1, PowerState::Ps2);
        let _ = self.requirements.remove(PowerState::Ps1);
        Ok(())
    }

    fn arm_alarm(&mut self, horizon: Duration) -> Result<(), Error> {
        self.scheduler.set_application_attribution(false);
        let result = self.calendar.arm_alarm_in(horizon);
        self.scheduler.set_application_attribution(true);
        result
    }
}
