//! Clock-tree abstraction.

use crate::error::Error;
use crate::power::{ClockScaling, PeripheralSet, PowerState};

/// Clock tree and peripheral power-gate interface.
///
/// `configure_clocks` retunes the PLLs and dividers for an operating point;
/// it is invoked by the governor *before* a state transition is committed,
/// so a failure here must leave the clock tree usable in the old state.
pub trait ClockControl {
    /// Retune the clock tree for `state` in the given scaling mode.
    fn configure_clocks(&mut self, state: PowerState, scaling: ClockScaling) -> Result<(), Error>;

    /// Power the selected peripheral gates up (`true`) or down (`false`).
    fn power_peripherals(&mut self, peripherals: &PeripheralSet, up: bool) -> Result<(), Error>;
}
