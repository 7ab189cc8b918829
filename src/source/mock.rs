//! Mock digitizer for testing
//!
//! Produces buffers with the same shape and sample width a real board would
//! transfer, so a whole acquisition can run without hardware.
//!
//! # Data Patterns
//!
//! - [`MockPattern::Sawtooth`] - Each record rises one code per sample, wrapping at full scale
//! - [`MockPattern::Constant`] - Every sample holds the same code
//! - [`MockPattern::Counter`] - Every sample of a record holds the global record index
//! - [`MockPattern::Random`] - Deterministic pseudo-random codes from a seed
//!
//! # Example
//!
//! ```
//! use alazar_stream::source::{BufferSource, MockDigitizer, MockPattern};
//! use alazar_stream::{AcquisitionGeometry, SampleWidth};
//! use std::time::Duration;
//!
//! let geometry = AcquisitionGeometry::new(256, 8, 4, 1, SampleWidth::U8).unwrap();
//! let mut board = MockDigitizer::<u8>::new(geometry, MockPattern::Sawtooth, 8);
//! let buffer = board.next_buffer(Duration::from_millis(100)).unwrap();
//! assert_eq!(buffer.as_slice()[255], 255);
//! ```

use super::{BufferSource, SourceError};
use crate::buffer::RawBuffer;
use crate::error::ConfigurationError;
use crate::geometry::AcquisitionGeometry;
use crate::types::{BoardModel, Sample};
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use std::time::Duration;

/// Pattern for generating mock samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MockPattern {
    /// Sample `i` of every record holds `i mod 2^bits`
    #[default]
    Sawtooth,
    /// Fixed code (masked to the bit depth)
    Constant { code: u64 },
    /// Each record holds its global record index (wraps at full scale)
    Counter,
    /// Xorshift noise, reproducible for a given seed
    Random { seed: u64 },
}

/// Imitates a digitizer board streaming one acquisition.
#[derive(Debug)]
pub struct MockDigitizer<S> {
    geometry: AcquisitionGeometry,
    pattern: MockPattern,
    bits_per_sample: u32,
    next_index: usize,
    fail_at: Option<usize>,
    delay: Duration,
    rng_state: u64,
    _sample: PhantomData<S>,
}

impl<S: Sample> MockDigitizer<S> {
    /// Create a mock board producing `bits_per_sample`-bit codes.
    pub fn new(geometry: AcquisitionGeometry, pattern: MockPattern, bits_per_sample: u32) -> Self {
        let rng_state = match pattern {
            // xorshift must never be seeded with zero
            MockPattern::Random { seed } if seed != 0 => seed,
            _ => 12345,
        };
        Self {
            geometry,
            pattern,
            bits_per_sample,
            next_index: 0,
            fail_at: None,
            delay: Duration::ZERO,
            rng_state,
            _sample: PhantomData,
        }
    }

    /// Create a mock of a specific board. The sample type must match the
    /// board's storage width.
    pub fn for_board(
        board: BoardModel,
        geometry: AcquisitionGeometry,
        pattern: MockPattern,
    ) -> Result<Self, ConfigurationError> {
        if board.sample_width() != S::WIDTH {
            return Err(ConfigurationError::SampleWidthMismatch {
                expected: board.sample_width(),
                actual: S::WIDTH,
            });
        }
        Ok(Self::new(geometry, pattern, board.bits_per_sample()))
    }

    /// Report a device error instead of producing buffer `buffer_index`.
    pub fn fail_at(mut self, buffer_index: usize) -> Self {
        self.fail_at = Some(buffer_index);
        self
    }

    /// Simulated time for each buffer to fill. A delay longer than the
    /// caller's timeout yields [`SourceError::Timeout`].
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn geometry(&self) -> &AcquisitionGeometry {
        &self.geometry
    }

    /// Index of the next buffer this board will produce.
    pub fn buffers_produced(&self) -> usize {
        self.next_index
    }

    fn mask(&self) -> u64 {
        if self.bits_per_sample >= 64 {
            u64::MAX
        } else {
            (1u64 << self.bits_per_sample) - 1
        }
    }

    fn next_random(&mut self) -> u64 {
        let mut s = self.rng_state;
        s ^= s << 13;
        s ^= s >> 7;
        s ^= s << 17;
        self.rng_state = s;
        s
    }

    fn fill(&mut self, buffer_index: usize) -> RawBuffer<S> {
        let g = self.geometry;
        let mask = self.mask();
        let first_record = g.first_record(buffer_index);
        let mut samples = Vec::with_capacity(g.buffer_len());

        for _channel in 0..g.channel_count() {
            for local in 0..g.records_per_buffer() {
                for sample in 0..g.samples_per_record() {
                    let code = match self.pattern {
                        MockPattern::Sawtooth => sample as u64,
                        MockPattern::Constant { code } => code,
                        MockPattern::Counter => (first_record + local) as u64,
                        MockPattern::Random { .. } => self.next_random(),
                    };
                    samples.push(S::from_code(code & mask));
                }
            }
        }
        RawBuffer::new(samples)
    }
}

impl<S: Sample> BufferSource<S> for MockDigitizer<S> {
    fn next_buffer(&mut self, timeout: Duration) -> Result<RawBuffer<S>, SourceError> {
        let index = self.next_index;
        if index >= self.geometry.buffers_per_acquisition() {
            return Err(SourceError::Exhausted);
        }
        if self.delay > timeout {
            std::thread::sleep(timeout);
            return Err(SourceError::Timeout {
                ms: timeout.as_millis() as u64,
            });
        }
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        if self.fail_at == Some(index) {
            return Err(SourceError::Device(format!(
                "mock DMA failure at buffer {index}"
            )));
        }

        let buffer = self.fill(index);
        self.next_index += 1;
        tracing::trace!("Mock digitizer produced buffer {}", index);
        Ok(buffer)
    }
}
