//! RAM retention planning for sleep.
//!
//! Callers either name the banks to power down directly or state how many
//! kilobytes must survive; the size path picks every bank above the retained
//! amount. Bank granularity follows the memory map: the first 16 K of main
//! RAM is four 4 K banks, then progressively larger banks up to the 320 K
//! top; ULP RAM is four 2 K banks of which the size path may drop the two
//! middle ones.

use platform::{Error, RamBankSet};

/// Largest retainable main-domain RAM, in KB.
pub const MAX_MAIN_RAM_KB: u16 = 320;
/// Largest retainable ULP-domain RAM, in KB.
pub const MAX_ULP_RAM_KB: u16 = 8;

// Main-domain bank upper size boundaries, in KB, lowest bank first. A bank
// powers down when the retained size fits entirely below its boundary.
const MAIN_BANK_BOUNDARIES: [u16; 10] = [4, 8, 12, 16, 32, 64, 128, 192, 256, 320];

/// How the caller describes the RAM to keep alive through sleep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RamRetentionConfig {
    /// Power down exactly these banks.
    Banks(RamBankSet),
    /// Retain at least this much memory; power down the rest.
    Sizes {
        /// Main-domain RAM to retain, in KB.
        main_kb: u16,
        /// ULP-domain RAM to retain, in KB.
        ulp_kb: u16,
    },
}

/// The banks to power down for `config`.
///
/// Sizes above the chip maximum and unknown bank bits are rejected with
/// `InvalidParameter`.
pub fn power_down_banks(config: &RamRetentionConfig) -> Result<RamBankSet, Error> {
    match *config {
        RamRetentionConfig::Banks(banks) => {
            banks.validate()?;
            Ok(banks)
        }
        RamRetentionConfig::Sizes { main_kb, ulp_kb } => {
            if main_kb > MAX_MAIN_RAM_KB || ulp_kb > MAX_ULP_RAM_KB {
                return Err(Error::InvalidParameter);
            }
            let mut main: u16 = 0;
            let mut bank_bit: u16 = 1;
            for boundary in MAIN_BANK_BOUNDARIES {
                if main_kb < boundary {
                    main |= bank_bit;
                }
                bank_bit = bank_bit.wrapping_shl(1);
            }
            let mut ulp: u8 = 0;
            if ulp_kb < 2 {
                ulp |= 1 << 1;
            }
            if ulp_kb < 4 {
                ulp |= 1 << 2;
            }
            Ok(RamBankSet { main, ulp })
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn by_size(main_kb: u16, ulp_kb: u16) -> RamBankSet {
        power_down_banks(&RamRetentionConfig::Sizes { main_kb, ulp_kb }).unwrap()
    }

    #[test]
    fn full_retention_powers_nothing_down() {
        assert_eq!(by_size(320, 8), RamBankSet { main: 0, ulp: 0 });
    }

    #[test]
    fn zero_retention_powers_everything_down() {
        assert_eq!(by_size(0, 0), RamBankSet { main: 0x03FF, ulp: 0x06 });
    }

    #[test]
    fn boundaries_are_exclusive() {
        // Retaining exactly 16 K keeps banks 0..=3 alive.
        assert_eq!(by_size(16, 8).main, 0x03F0);
        // One byte short of a boundary drops the bank above it.
        assert_eq!(by_size(15, 8).main, 0x03F8);
        // 192 K keeps the first eight banks.
        assert_eq!(by_size(192, 8).main, 0x0300);
    }

    #[test]
    fn ulp_size_path_touches_only_the_middle_banks() {
        assert_eq!(by_size(320, 0).ulp, 0x06);
        assert_eq!(by_size(320, 2).ulp, 0x04);
        assert_eq!(by_size(320, 4).ulp, 0x00);
    }

    #[test]
    fn oversized_requests_are_rejected() {
        assert_eq!(
            power_down_banks(&RamRetentionConfig::Sizes { main_kb: 321, ulp_kb: 0 }),
            Err(Error::InvalidParameter)
        );
        assert_eq!(
            power_down_banks(&RamRetentionConfig::Sizes { main_kb: 0, ulp_kb: 9 }),
            Err(Error::InvalidParameter)
        );
    }

    #[test]
    fn explicit_banks_are_validated_and_passed_through() {
        let banks = RamBankSet { main: 0x0021, ulp: 0x01 };
        assert_eq!(power_down_banks(&RamRetentionConfig::Banks(banks)).unwrap(), banks);
        let bad = RamBankSet { main: 0x8000, ulp: 0 };
        assert_eq!(
            power_down_banks(&RamRetentionConfig::Banks(bad)),
            Err(Error::InvalidParameter)
        );
    }
}
