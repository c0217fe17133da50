//! Power-state vocabulary shared by the governor and the hardware layer.
//!
//! The SoC exposes five operating points PS0..PS4 plus the transient sleep
//! and standby states. PS0 is the deepest (coldest) point, PS4 the highest
//! performance point; the derived ordering on [`PowerState`] follows that
//! depth scale.

use crate::error::Error;

/// Operating and transient power states.
///
/// The first five variants are the steady operating points a requirement can
/// vote for; `Sleep` and `Standby` are transient and only ever entered
/// through the dedicated controller calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerState {
    /// Deepest operating point: processor shut down, only always-on logic up.
    Ps0,
    /// Low-power retained state, reached from PS2 only.
    Ps1,
    /// Ultra-low-power active state.
    Ps2,
    /// Default operating point (medium clocks, full RAM).
    Ps3,
    /// Highest performance point.
    Ps4,
    /// Transient sleep (core clock gated, wake source armed).
    Sleep,
    /// Transient standby (wait-for-interrupt, no context loss).
    Standby,
}

impl PowerState {
    /// All states a requirement counter exists for, depth order (PS0 first).
    pub const REQUIREMENT_STATES: [PowerState; 5] = [
        PowerState::Ps0,
        PowerState::Ps1,
        PowerState::Ps2,
        PowerState::Ps3,
        PowerState::Ps4,
    ];

    /// Whether this is one of the steady operating points PS0..PS4.
    pub fn is_operating_point(self) -> bool {
        !matches!(self, PowerState::Sleep | PowerState::Standby)
    }

    /// Index into the requirement table, `None` for the transient states.
    pub fn requirement_index(self) -> Option<usize> {
        match self {
            PowerState::Ps0 => Some(0),
            PowerState::Ps1 => Some(1),
            PowerState::Ps2 => Some(2),
            PowerState::Ps3 => Some(3),
            PowerState::Ps4 => Some(4),
            PowerState::Sleep | PowerState::Standby => None,
        }
    }
}

/// Clock-scaling mode within an operating point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockScaling {
    /// Reduced clocks for the current operating point.
    PowerSave,
    /// Maximum clocks for the current operating point.
    Performance,
}

/// Peripheral power-gate selection across the three power domains.
///
/// Bit positions match the hardware power-gate registers of each domain;
/// the `VALID_*` masks are the gates that actually exist on this part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PeripheralSet {
    /// Main (high-performance) domain power gates.
    pub main: u32,
    /// Ultra-low-power domain power gates.
    pub ulp: u32,
    /// Always-on domain power gates.
    pub always_on: u32,
}

impl PeripheralSet {
    /// Power gates present in the main domain.
    pub const VALID_MAIN: u32 = 0x0046_6A10;
    /// Power gates present in the ULP domain.
    pub const VALID_ULP: u32 = 0x1FEC_0000;
    /// Power gates present in the always-on domain.
    pub const VALID_ALWAYS_ON: u32 = 0x0001_07FE;

    /// Reject selections naming gates that do not exist in their domain.
    pub fn validate(&self) -> Result<(), Error> {
        if self.main & !Self::VALID_MAIN != 0 {
            return Err(Error::InvalidParameter);
        }
        if self.ulp & !Self::VALID_ULP != 0 {
            return Err(Error::InvalidParameter);
        }
        if self.always_on & !Self::VALID_ALWAYS_ON != 0 {
            return Err(Error::InvalidParameter);
        }
        Ok(())
    }

    /// True when no gate is selected in any domain.
    pub fn is_empty(&self) -> bool {
        self.main == 0 && self.ulp == 0 && self.always_on == 0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn depth_order_follows_declaration() {
        assert!(PowerState::Ps0 < PowerState::Ps1);
        assert!(PowerState::Ps1 < PowerState::Ps2);
        assert!(PowerState::Ps2 < PowerState::Ps3);
        assert!(PowerState::Ps3 < PowerState::Ps4);
    }

    #[test]
    fn transient_states_have_no_requirement_slot() {
        assert_eq!(PowerState::Sleep.requirement_index(), None);
        assert_eq!(PowerState::Standby.requirement_index(), None);
        assert!(!PowerState::Sleep.is_operating_point());
        assert!(!PowerState::Standby.is_operating_point());
    }

    #[test]
    fn requirement_indices_are_dense() {
        for (i, state) in PowerState::REQUIREMENT_STATES.iter().enumerate() {
            assert_eq!(state.requirement_index(), Some(i));
        }
    }

    #[test]
    fn peripheral_set_rejects_unknown_gates() {
        let bad = PeripheralSet { main: !PeripheralSet::VALID_MAIN, ulp: 0, always_on: 0 };
        assert_eq!(bad.validate(), Err(Error::InvalidParameter));
        let good = PeripheralSet { main: PeripheralSet::VALID_MAIN, ulp: 0, always_on: 0 };
        assert!(good.validate().is_ok());
    }
}
