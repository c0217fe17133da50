//! Power-state transition validity.
//!
//! Only the three active operating points PS2/PS3/PS4 can initiate a
//! transition; everything else is a terminal state reached through dedicated
//! paths (PS1 retained sleep, PS0 shutdown, transient Sleep/Standby).

use platform::PowerState;

/// Legal target sets per active source state, depth order PS2, PS3, PS4.
///
/// Row layout follows [`TRANSITION_TARGETS`] column order:
/// PS0, PS1, PS2, PS3, PS4, Sleep, Standby.
const TRANSITION_TABLE: [[bool; 7]; 3] = [
    // from PS2: PS1 retained sleep, back up to PS3/PS4, transient states
    [false, true, false, true, true, true, true],
    // from PS3: PS0 shutdown, down to PS2, up to PS4, transient states
    [true, false, true, false, true, true, true],
    // from PS4: PS0 shutdown, down to PS2/PS3, transient states
    [true, false, true, true, false, true, true],
];

/// Column order of [`TRANSITION_TABLE`].
const TRANSITION_TARGETS: [PowerState; 7] = [
    PowerState::Ps0,
    PowerState::Ps1,
    PowerState::Ps2,
    PowerState::Ps3,
    PowerState::Ps4,
    PowerState::Sleep,
    PowerState::Standby,
];

/// Whether `from` → `to` is a legal edge of the power-state machine.
pub fn is_valid_transition(from: PowerState, to: PowerState) -> bool {
    let row = match from {
        PowerState::Ps2 => 0,
        PowerState::Ps3 => 1,
        PowerState::Ps4 => 2,
        _ => return false,
    };
    let Some(column) = TRANSITION_TARGETS.iter().position(|state| *state == to) else {
        return false;
    };
    TRANSITION_TABLE
        .get(row)
        .and_then(|targets| targets.get(column))
        .copied()
        .unwrap_or(false)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use platform::PowerState::*;

    #[test]
    fn active_states_reach_their_documented_targets() {
        assert!(is_valid_transition(Ps2, Ps1));
        assert!(is_valid_transition(Ps2, Ps3));
        assert!(is_valid_transition(Ps2, Ps4));
        assert!(is_valid_transition(Ps3, Ps0));
        assert!(is_valid_transition(Ps3, Ps2));
        assert!(is_valid_transition(Ps3, Ps4));
        assert!(is_valid_transition(Ps4, Ps0));
        assert!(is_valid_transition(Ps4, Ps2));
        assert!(is_valid_transition(Ps4, Ps3));
    }

    #[test]
    fn transient_states_reachable_from_all_active_states() {
        for from in [Ps2, Ps3, Ps4] {
            assert!(is_valid_transition(from, Sleep));
            assert!(is_valid_transition(from, Standby));
        }
    }

    #[test]
    fn self_transitions_are_invalid() {
        for state in [Ps0, Ps1, Ps2, Ps3, Ps4, Sleep, Standby] {
            assert!(!is_valid_transition(state, state));
        }
    }

    #[test]
    fn ps1_only_reachable_from_ps2() {
        assert!(!is_valid_transition(Ps3, Ps1));
        assert!(!is_valid_transition(Ps4, Ps1));
        assert!(!is_valid_transition(Ps0, Ps1));
    }

    #[test]
    fn terminal_states_initiate_nothing() {
        for from in [Ps0, Ps1, Sleep, Standby] {
            for to in [Ps0, Ps1, Ps2, Ps3, Ps4, Sleep, Standby] {
                assert!(!is_valid_transition(from, to));
            }
        }
    }

    #[test]
    fn ps0_unreachable_from_ps2() {
        assert!(!is_valid_transition(Ps2, Ps0));
    }
}
