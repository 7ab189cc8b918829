//! Core sample types for alazar-stream
//!
//! # Main Types
//!
//! - [`SampleWidth`] - Storage width of one digitizer sample (8 or 16 bit)
//! - [`Sample`] - Trait implemented by the Rust integer types a buffer can hold
//! - [`BoardModel`] - Supported digitizer models and their bit depths
//!
//! A 12-bit board still stores each sample in a 16-bit word, so the bit depth
//! of a board and the storage width of its samples are tracked separately.

use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Storage width of one sample in a raw buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SampleWidth {
    /// 8-bit unsigned samples
    #[default]
    U8,
    /// 16-bit unsigned samples
    U16,
}

impl SampleWidth {
    /// Returns the size in bytes of one sample
    pub fn size_bytes(&self) -> usize {
        match self {
            SampleWidth::U8 => 1,
            SampleWidth::U16 => 2,
        }
    }
}

impl fmt::Display for SampleWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleWidth::U8 => write!(f, "u8"),
            SampleWidth::U16 => write!(f, "u16"),
        }
    }
}

/// A value that can be stored in a raw acquisition buffer.
///
/// Accumulating processors widen every sample to `u64` before summing, so
/// a sum of `records_per_acquisition` samples cannot overflow.
pub trait Sample: Copy + Default + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// Storage width this type corresponds to.
    const WIDTH: SampleWidth;

    /// Lossless widening used by the accumulators.
    fn widen(self) -> u64;

    /// Build a sample from a digitizer code, truncating to the storage width.
    fn from_code(code: u64) -> Self;
}

impl Sample for u8 {
    const WIDTH: SampleWidth = SampleWidth::U8;

    #[inline]
    fn widen(self) -> u64 {
        u64::from(self)
    }

    #[inline]
    fn from_code(code: u64) -> Self {
        code as u8
    }
}

impl Sample for u16 {
    const WIDTH: SampleWidth = SampleWidth::U16;

    #[inline]
    fn widen(self) -> u64 {
        u64::from(self)
    }

    #[inline]
    fn from_code(code: u64) -> Self {
        code as u16
    }
}

/// Supported digitizer boards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoardModel {
    /// ATS9870: 8-bit, 1 GS/s
    Ats9870,
    /// ATS9360: 12-bit, 1.8 GS/s
    Ats9360,
}

impl BoardModel {
    /// Look up a board from the numeric board type reported by the driver
    pub fn from_code(code: u32) -> Result<Self, ConfigurationError> {
        match code {
            13 => Ok(BoardModel::Ats9870),
            25 => Ok(BoardModel::Ats9360),
            other => Err(ConfigurationError::UnknownBoard(other)),
        }
    }

    /// Numeric board type code
    pub fn code(&self) -> u32 {
        match self {
            BoardModel::Ats9870 => 13,
            BoardModel::Ats9360 => 25,
        }
    }

    /// Model name as printed on the board
    pub fn name(&self) -> &'static str {
        match self {
            BoardModel::Ats9870 => "ATS9870",
            BoardModel::Ats9360 => "ATS9360",
        }
    }

    /// ADC resolution
    pub fn bits_per_sample(&self) -> u32 {
        match self {
            BoardModel::Ats9870 => 8,
            BoardModel::Ats9360 => 12,
        }
    }

    /// Storage width of one sample in a transferred buffer
    pub fn sample_width(&self) -> SampleWidth {
        if self.bits_per_sample() <= 8 {
            SampleWidth::U8
        } else {
            SampleWidth::U16
        }
    }

    /// Largest code the ADC can produce
    pub fn max_code(&self) -> u64 {
        (1u64 << self.bits_per_sample()) - 1
    }
}

impl fmt::Display for BoardModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_width_sizes() {
        assert_eq!(SampleWidth::U8.size_bytes(), 1);
        assert_eq!(SampleWidth::U16.size_bytes(), 2);
        assert_eq!(<u8 as Sample>::WIDTH, SampleWidth::U8);
        assert_eq!(<u16 as Sample>::WIDTH, SampleWidth::U16);
    }

    #[test]
    fn test_from_code_truncates() {
        assert_eq!(u8::from_code(256), 0);
        assert_eq!(u8::from_code(255), 255);
        assert_eq!(u16::from_code(4095), 4095);
        assert_eq!(255u8.widen(), 255);
    }

    #[test]
    fn test_board_models() {
        let b = BoardModel::from_code(25).unwrap();
        assert_eq!(b, BoardModel::Ats9360);
        assert_eq!(b.bits_per_sample(), 12);
        assert_eq!(b.sample_width(), SampleWidth::U16);
        assert_eq!(b.max_code(), 4095);

        let b = BoardModel::from_code(13).unwrap();
        assert_eq!(b.sample_width(), SampleWidth::U8);
        assert_eq!(b.to_string(), "ATS9870");

        assert_eq!(
            BoardModel::from_code(7),
            Err(ConfigurationError::UnknownBoard(7))
        );
    }

    #[test]
    fn test_sample_width_serde() {
        let json = serde_json::to_string(&SampleWidth::U16).unwrap();
        assert_eq!(json, "\"u16\"");
        let back: SampleWidth = serde_json::from_str("\"u8\"").unwrap();
        assert_eq!(back, SampleWidth::U8);
    }
}
