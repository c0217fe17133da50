//! Reference-counted power-state requirements.

use platform::{Error, PowerState};

/// One `u8` refcount per operating point PS0..PS4.
///
/// A non-zero counter is a vote that the system must be at that operating
/// point (or already deeper). The effective state is the deepest voted
/// point; an empty table makes the system sleep-eligible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RequirementTable {
    counters: [u8; 5],
}

impl RequirementTable {
    /// Empty table (sleep-eligible).
    pub const fn new() -> Self {
        RequirementTable { counters: [0; 5] }
    }

    /// The raw counters, PS0 first.
    pub fn counters(&self) -> [u8; 5] {
        self.counters
    }

    /// The counter for one operating point.
    pub fn count(&self, state: PowerState) -> u8 {
        state
            .requirement_index()
            .and_then(|index| self.counters.get(index).copied())
            .unwrap_or(0)
    }

    /// Add one vote for `state`.
    ///
    /// Fails with `InvalidParameter` for a transient state or a counter
    /// already at `u8::MAX`.
    pub fn add(&mut self, state: PowerState) -> Result<(), Error> {
        let slot = self.slot(state)?;
        *slot = slot.checked_add(1).ok_or(Error::InvalidParameter)?;
        Ok(())
    }

    /// Remove one vote for `state`.
    ///
    /// Fails with `InvalidParameter` for a transient state or a counter
    /// already at zero; the table is left untouched on failure.
    pub fn remove(&mut self, state: PowerState) -> Result<(), Error> {
        let slot = self.slot(state)?;
        *slot = slot.checked_sub(1).ok_or(Error::InvalidParameter)?;
        Ok(())
    }

    /// The deepest operating point with a non-zero counter (scanning
    /// PS4 → PS0), or `None` when the table is empty (sleep-eligible).
    pub fn lowest_eligible(&self) -> Option<PowerState> {
        let mut deepest = None;
        for state in PowerState::REQUIREMENT_STATES.iter().rev() {
            if self.count(*state) > 0 {
                deepest = Some(*state);
            }
        }
        deepest
    }

    /// Drop every vote (used by `init`/`deinit`).
    pub fn clear(&mut self) {
        self.counters = [0; 5];
    }

    fn slot(&mut self, state: PowerState) -> Result<&mut u8, Error> {
        let index = state.requirement_index().ok_or(Error::InvalidParameter)?;
        self.counters.get_mut(index).ok_or(Error::InvalidParameter)
    }
}
