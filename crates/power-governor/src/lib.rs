//! Power-state governor and wake/calibration scheduler for a
//! battery-oriented MCU SoC.
//!
//! The governor arbitrates between the chip's operating points (PS0–PS4,
//! sleep, standby) with a reference-counted requirement table: subsystems
//! vote for the deepest state they can tolerate, and the governor commits
//! the deepest state everybody agrees on. Around that core sit the wake
//! source registry, synchronous transition notifications, RAM retention
//! planning and a countdown scheduler that coalesces application alarms
//! with the periodic RC-oscillator recalibration so the chip wakes once
//! instead of twice.
//!
//! # Usage
//!
//! ```ignore
//! let mut governor = PowerGovernor::new(calendar, clocks, sleep, SchedulerConfig::default());
//! governor.init()?;
//! governor.add_requirement(PowerState::Ps4)?;
//! // ... high-performance work ...
//! governor.remove_requirement(PowerState::Ps4)?;
//! governor.add_wakeup_source(WakeSource::Gpio)?;
//! governor.sleep()?;
//! ```
//!
//! # Features
//!
//! - `defmt`: route logging to `defmt` (hardware builds)
//! - `log`: route logging to the `log` facade (host builds)

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)]
// Pedantic lints suppressed for this crate:
#![allow(clippy::doc_markdown)] // PS0..PS4 and register names in doc comments
#![allow(clippy::must_use_candidate)] // state accessors — callers decide
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]

// MUST be the first module listed so the logging macros are in scope
// everywhere else.
mod fmt;

pub mod controller;
pub mod notifier;
pub mod requirements;
pub mod retention;
pub mod scheduler;
pub mod state;
pub mod wakeup;

pub use controller::{PowerGovernor, DEFAULT_STATE};
pub use notifier::{
    SubscriptionHandle, TransitionCallback, TransitionEvents, TransitionNotifier, MAX_SUBSCRIBERS,
};
pub use requirements::RequirementTable;
pub use retention::{RamRetentionConfig, MAX_MAIN_RAM_KB, MAX_ULP_RAM_KB};
pub use scheduler::{CalibrationScheduler, SchedulerConfig, WakeEvents};
pub use state::is_valid_transition;
pub use wakeup::{WakeSource, WakeupSourceRegistry};

// Shared vocabulary from the platform HAL, re-exported so applications only
// need this crate in scope.
pub use platform::{
    AlarmCallback, Calendar, ClockControl, ClockScaling, DateTime, Error, PeripheralSet,
    PowerState, RamBankSet, SleepControl, SleepKind, Weekday,
};
