//! Low-power entry and RAM-retention abstraction.

use crate::error::Error;

/// How much context survives a sleep entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SleepKind {
    /// RAM retained, execution resumes in place (PS2 sleep).
    Retained,
    /// RAM lost, wake re-executes from flash (PS3/PS4 sleep).
    FromFlash,
    /// Nothing retained.
    NoRetention,
}

/// RAM banks selected for power-down during sleep.
///
/// Bit positions match the bank power-down registers: ten main-domain banks
/// and four 2 KB ULP-domain banks. A set bit means the bank is powered
/// *down* (not retained).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RamBankSet {
    /// Main-domain bank power-down bits (bits 0..=9).
    pub main: u16,
    /// ULP-domain bank power-down bits (bits 0..=3).
    pub ulp: u8,
}

impl RamBankSet {
    /// Main-domain banks that exist on this part.
    pub const VALID_MAIN: u16 = 0x03FF;
    /// ULP-domain banks that exist on this part.
    pub const VALID_ULP: u8 = 0x0F;

    /// Reject selections naming banks that do not exist.
    pub fn validate(&self) -> Result<(), Error> {
        if self.main & !Self::VALID_MAIN != 0 || self.ulp & !Self::VALID_ULP != 0 {
            return Err(Error::InvalidParameter);
        }
        Ok(())
    }
}

/// Low-power hardware entry points.
pub trait SleepControl {
    /// Enter sleep; returns after the wake interrupt brought the core back.
    fn enter_sleep(&mut self, kind: SleepKind) -> Result<(), Error>;

    /// Wait-for-interrupt standby; returns on the next interrupt.
    fn wait_for_interrupt(&mut self);

    /// Program which RAM banks power down during the next sleep.
    fn apply_ram_retention(&mut self, banks: &RamBankSet) -> Result<(), Error>;

    /// Run the 32 kHz RC oscillator trim sequence (blocking settle).
    fn calibrate_rc_oscillator(&mut self) -> Result<(), Error>;

    /// Last-moment veto before committing to sleep. Default: go ahead.
    fn ok_to_sleep(&mut self) -> bool {
        true
    }

    /// Whether the wake reason asks for an immediate re-entry to sleep
    /// (spurious wake filtering). Default: stay awake.
    fn resleep_on_wake(&mut self) -> bool {
        false
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn bank_set_validation() {
        assert!(RamBankSet { main: 0x03FF, ulp: 0x0F }.validate().is_ok());
        assert!(RamBankSet::default().validate().is_ok());
        assert_eq!(
            RamBankSet { main: 0x0400, ulp: 0 }.validate(),
            Err(Error::InvalidParameter)
        );
        assert_eq!(
            RamBankSet { main: 0, ulp: 0x10 }.validate(),
            Err(Error::InvalidParameter)
        );
    }
}
