//! Hardware abstraction layer for the SoC power governor.
//!
//! This crate provides trait-based abstractions for the hardware the governor
//! drives — the calendar/RTC block, the clock tree and the low-power entry
//! sequences — enabling development and testing without physical hardware.
//!
//! # Architecture Layers
//!
//! ```text
//! Application / wake ISR
//!         ↓
//! power-governor crate (state machine + scheduler)
//!         ↓
//! Platform HAL (this crate - trait abstractions)
//!         ↓
//! Hardware Layer (ROM driver / PAC)
//! ```
//!
//! # Features
//!
//! - `std`: Enable standard library support (mocks outside `cfg(test)`)
//! - `hardware`: Physical hardware implementations
//! - `defmt`: Enable defmt logging derives

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
// Pedantic lints suppressed for this hardware HAL crate:
#![allow(clippy::doc_markdown)] // register and block names in doc comments
#![allow(clippy::must_use_candidate)] // hardware accessors — callers decide
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]

pub mod calendar;
pub mod clock;
pub mod error;
pub mod lowpower;
pub mod mocks;
pub mod power;

// Re-export the shared vocabulary types
pub use calendar::{AlarmCallback, Calendar, CalendarEvents, DateTime, Weekday};
pub use clock::ClockControl;
pub use error::Error;
pub use lowpower::{RamBankSet, SleepControl, SleepKind};
pub use power::{ClockScaling, PeripheralSet, PowerState};
