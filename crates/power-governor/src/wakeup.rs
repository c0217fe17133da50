//! Wake-source bookkeeping.
//!
//! The governor refuses to commit to sleep unless at least one wake source
//! is armed, and refuses the PS2→PS1 retained drop unless an
//! always-on-domain source is among them. The registry is plain set
//! semantics: enabling twice is the same as enabling once.

use platform::Error;

/// A hardware event able to wake the chip from sleep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WakeSource {
    /// Deep-sleep timer expiry.
    DeepSleepTimer,
    /// Host processor interrupt.
    Host,
    /// Wireless subsystem activity.
    Wireless,
    /// Companion-processor doorbell.
    Processor,
    /// GPIO edge.
    Gpio,
    /// Analog comparator.
    Comparator,
    /// System RTC compare.
    Sysrtc,
    /// ULP-domain peripheral (always-on domain).
    UlpPeripheral,
    /// Sensor data collector (always-on domain).
    SensorCollector,
    /// Calendar alarm.
    Alarm,
    /// Calendar second tick.
    Second,
    /// Calendar millisecond tick.
    Millisecond,
    /// Watchdog pre-reset interrupt.
    Watchdog,
}

impl WakeSource {
    /// Bit position in a [`WakeupSourceRegistry`] mask.
    #[allow(clippy::arithmetic_side_effects)] // discriminants are 0..=12, shift cannot overflow
    pub const fn mask(self) -> u32 {
        1 << (self as u32)
    }
}

const VALID_SOURCES: u32 = (1 << 13) - 1;

// Sources living in the always-on domain, the only ones able to bring the
// chip back from the PS1 retained drop.
const ULP_CAPABLE: u32 =
    WakeSource::UlpPeripheral.mask() | WakeSource::SensorCollector.mask() | WakeSource::Sysrtc.mask();

/// Set of armed wake sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WakeupSourceRegistry {
    mask: u32,
}

impl WakeupSourceRegistry {
    /// Empty registry — nothing can wake the chip yet.
    pub const fn new() -> Self {
        WakeupSourceRegistry { mask: 0 }
    }

    /// Arm one wake source. Idempotent.
    pub fn enable(&mut self, source: WakeSource) {
        self.mask |= source.mask();
    }

    /// Disarm one wake source. Idempotent.
    pub fn disable(&mut self, source: WakeSource) {
        self.mask &= !source.mask();
    }

    /// Arm a raw source mask, rejecting unknown bits.
    pub fn enable_mask(&mut self, mask: u32) -> Result<(), Error> {
        if mask & !VALID_SOURCES != 0 {
            return Err(Error::InvalidParameter);
        }
        self.mask |= mask;
        Ok(())
    }

    /// Disarm a raw source mask, rejecting unknown bits.
    pub fn disable_mask(&mut self, mask: u32) -> Result<(), Error> {
        if mask & !VALID_SOURCES != 0 {
            return Err(Error::InvalidParameter);
        }
        self.mask &= !mask;
        Ok(())
    }

    /// Whether this source is armed.
    pub fn is_enabled(&self, source: WakeSource) -> bool {
        self.mask & source.mask() != 0
    }

    /// Whether no source at all is armed.
    pub fn is_empty(&self) -> bool {
        self.mask == 0
    }

    /// Whether an always-on-domain source is armed (PS1 precondition).
    pub fn has_ulp_capable_source(&self) -> bool {
        self.mask & ULP_CAPABLE != 0
    }

    /// The raw armed mask.
    pub fn mask(&self) -> u32 {
        self.mask
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn enable_is_idempotent() {
        let mut registry = WakeupSourceRegistry::new();
        registry.enable(WakeSource::Alarm);
        let once = registry.mask();
        registry.enable(WakeSource::Alarm);
        assert_eq!(registry.mask(), once);
        assert!(registry.is_enabled(WakeSource::Alarm));
    }

    #[test]
    fn disable_clears_only_its_bit() {
        let mut registry = WakeupSourceRegistry::new();
        registry.enable(WakeSource::Gpio);
        registry.enable(WakeSource::Watchdog);
        registry.disable(WakeSource::Gpio);
        assert!(!registry.is_enabled(WakeSource::Gpio));
        assert!(registry.is_enabled(WakeSource::Watchdog));
    }

    #[test]
    fn unknown_mask_bits_are_rejected() {
        let mut registry = WakeupSourceRegistry::new();
        assert_eq!(registry.enable_mask(1 << 31), Err(Error::InvalidParameter));
        assert!(registry.is_empty());
        registry.enable_mask(WakeSource::Host.mask()).unwrap();
        assert_eq!(registry.disable_mask(1 << 30), Err(Error::InvalidParameter));
        assert!(registry.is_enabled(WakeSource::Host));
    }

    #[test]
    fn ulp_capability_detection() {
        let mut registry = WakeupSourceRegistry::new();
        registry.enable(WakeSource::Gpio);
        assert!(!registry.has_ulp_capable_source());
        registry.enable(WakeSource::SensorCollector);
        assert!(registry.has_ulp_capable_source());
    }

    #[test]
    fn source_bits_are_distinct() {
        let sources = [
            WakeSource::DeepSleepTimer,
            WakeSource::Host,
            WakeSource::Wireless,
            WakeSource::Processor,
            WakeSource::Gpio,
            WakeSource::Comparator,
            WakeSource::Sysrtc,
            WakeSource::UlpPeripheral,
            WakeSource::SensorCollector,
            WakeSource::Alarm,
            WakeSource::Second,
            WakeSource::Millisecond,
            WakeSource::Watchdog,
        ];
        let mut seen = 0u32;
        for source in sources {
            assert_eq!(seen & source.mask(), 0);
            assert_eq!(source.mask() & !VALID_SOURCES, 0);
            seen |= source.mask();
        }
        assert_eq!(seen, VALID_SOURCES);
    }
}
