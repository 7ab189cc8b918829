//! Acquisition geometry
//!
//! [`AcquisitionGeometry`] describes how records and channels are laid out in
//! the buffers a digitizer transfers. It is validated once, is `Copy`, and is
//! shared read-only by the pipeline and every processor.
//!
//! # Layout
//!
//! Each buffer holds `records_per_buffer` records per channel, channel-major:
//!
//! ```text
//! | ch0 rec0 | ch0 rec1 | ... | ch0 rec(N-1) | ch1 rec0 | ... | ch1 rec(N-1) |
//! |<------------ channel_chunk_size -------->|
//! ```

use crate::error::ConfigurationError;
use crate::types::SampleWidth;
use serde::{Deserialize, Serialize};

/// Serializable, unvalidated form of an [`AcquisitionGeometry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeometrySettings {
    pub samples_per_record: usize,
    pub records_per_acquisition: usize,
    pub records_per_buffer: usize,
    pub channel_count: usize,
    #[serde(default)]
    pub sample_width: SampleWidth,
}

/// Immutable description of an acquisition's buffer/record/channel layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "GeometrySettings", into = "GeometrySettings")]
pub struct AcquisitionGeometry {
    samples_per_record: usize,
    records_per_acquisition: usize,
    records_per_buffer: usize,
    channel_count: usize,
    sample_width: SampleWidth,
}

impl AcquisitionGeometry {
    /// Validate the parameters and build a geometry.
    pub fn new(
        samples_per_record: usize,
        records_per_acquisition: usize,
        records_per_buffer: usize,
        channel_count: usize,
        sample_width: SampleWidth,
    ) -> Result<Self, ConfigurationError> {
        if samples_per_record == 0 {
            return Err(ConfigurationError::ZeroSamplesPerRecord);
        }
        if records_per_acquisition == 0 {
            return Err(ConfigurationError::ZeroRecordsPerAcquisition);
        }
        if records_per_buffer == 0 {
            return Err(ConfigurationError::ZeroRecordsPerBuffer);
        }
        if records_per_acquisition % records_per_buffer != 0 {
            return Err(ConfigurationError::UnevenBuffers {
                records_per_acquisition,
                records_per_buffer,
            });
        }
        if !(1..=2).contains(&channel_count) {
            return Err(ConfigurationError::InvalidChannelCount(channel_count));
        }

        Ok(Self {
            samples_per_record,
            records_per_acquisition,
            records_per_buffer,
            channel_count,
            sample_width,
        })
    }

    #[inline]
    pub fn samples_per_record(&self) -> usize {
        self.samples_per_record
    }

    #[inline]
    pub fn records_per_acquisition(&self) -> usize {
        self.records_per_acquisition
    }

    #[inline]
    pub fn records_per_buffer(&self) -> usize {
        self.records_per_buffer
    }

    #[inline]
    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    #[inline]
    pub fn sample_width(&self) -> SampleWidth {
        self.sample_width
    }

    /// Number of buffers that make up one acquisition.
    #[inline]
    pub fn buffers_per_acquisition(&self) -> usize {
        self.records_per_acquisition / self.records_per_buffer
    }

    /// Number of samples one channel occupies in a buffer.
    #[inline]
    pub fn channel_chunk_size(&self) -> usize {
        self.samples_per_record * self.records_per_buffer
    }

    /// Total number of samples in one buffer, across all channels.
    #[inline]
    pub fn buffer_len(&self) -> usize {
        self.channel_count * self.channel_chunk_size()
    }

    /// Size of one buffer in bytes.
    pub fn buffer_bytes(&self) -> usize {
        self.buffer_len() * self.sample_width.size_bytes()
    }

    /// Global index of the first record carried by `buffer_index`.
    #[inline]
    pub fn first_record(&self, buffer_index: usize) -> usize {
        buffer_index * self.records_per_buffer
    }

    /// Shape of one channel view: `(records_per_buffer, samples_per_record)`.
    #[inline]
    pub fn view_shape(&self) -> (usize, usize) {
        (self.records_per_buffer, self.samples_per_record)
    }
}

impl Default for AcquisitionGeometry {
    /// 1024 samples, 128 records in buffers of 64, two 8-bit channels.
    fn default() -> Self {
        Self {
            samples_per_record: 1024,
            records_per_acquisition: 128,
            records_per_buffer: 64,
            channel_count: 2,
            sample_width: SampleWidth::U8,
        }
    }
}

impl TryFrom<GeometrySettings> for AcquisitionGeometry {
    type Error = ConfigurationError;

    fn try_from(s: GeometrySettings) -> Result<Self, Self::Error> {
        AcquisitionGeometry::new(
            s.samples_per_record,
            s.records_per_acquisition,
            s.records_per_buffer,
            s.channel_count,
            s.sample_width,
        )
    }
}

impl From<AcquisitionGeometry> for GeometrySettings {
    fn from(g: AcquisitionGeometry) -> Self {
        Self {
            samples_per_record: g.samples_per_record,
            records_per_acquisition: g.records_per_acquisition,
            records_per_buffer: g.records_per_buffer,
            channel_count: g.channel_count,
            sample_width: g.sample_width,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let d = AcquisitionGeometry::default();
        let checked = AcquisitionGeometry::new(
            d.samples_per_record(),
            d.records_per_acquisition(),
            d.records_per_buffer(),
            d.channel_count(),
            d.sample_width(),
        );
        assert_eq!(checked, Ok(d));
    }

    #[test]
    fn test_derived_fields() {
        let g = AcquisitionGeometry::new(1024, 128, 64, 2, SampleWidth::U8).unwrap();
        assert_eq!(g.buffers_per_acquisition(), 2);
        assert_eq!(g.channel_chunk_size(), 64 * 1024);
        assert_eq!(g.buffer_len(), 2 * 64 * 1024);
        assert_eq!(g.first_record(1), 64);
        assert_eq!(g.view_shape(), (64, 1024));

        let g16 = AcquisitionGeometry::new(1024, 128, 64, 2, SampleWidth::U16).unwrap();
        assert_eq!(g16.buffer_bytes(), 2 * g.buffer_bytes());
    }

    #[test]
    fn test_rejects_uneven_buffers() {
        let err = AcquisitionGeometry::new(16, 100, 64, 1, SampleWidth::U8).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::UnevenBuffers {
                records_per_acquisition: 100,
                records_per_buffer: 64
            }
        );
    }

    #[test]
    fn test_rejects_zero_records_per_buffer() {
        assert_eq!(
            AcquisitionGeometry::new(16, 128, 0, 1, SampleWidth::U8),
            Err(ConfigurationError::ZeroRecordsPerBuffer)
        );
    }

    #[test]
    fn test_rejects_bad_channel_count() {
        for channels in [0, 3, 4] {
            assert_eq!(
                AcquisitionGeometry::new(16, 128, 64, channels, SampleWidth::U8),
                Err(ConfigurationError::InvalidChannelCount(channels))
            );
        }
    }

    #[test]
    fn test_rejects_degenerate_sizes() {
        assert_eq!(
            AcquisitionGeometry::new(0, 128, 64, 1, SampleWidth::U8),
            Err(ConfigurationError::ZeroSamplesPerRecord)
        );
        assert_eq!(
            AcquisitionGeometry::new(16, 0, 64, 1, SampleWidth::U8),
            Err(ConfigurationError::ZeroRecordsPerAcquisition)
        );
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: AcquisitionGeometry = serde_json::from_str(
            r#"{"samples_per_record":4,"records_per_acquisition":4,"records_per_buffer":2,"channel_count":1}"#,
        )
        .unwrap();
        assert_eq!(ok.sample_width(), SampleWidth::U8);
        assert_eq!(ok.buffers_per_acquisition(), 2);

        let bad = serde_json::from_str::<AcquisitionGeometry>(
            r#"{"samples_per_record":4,"records_per_acquisition":5,"records_per_buffer":2,"channel_count":1}"#,
        );
        assert!(bad.is_err());
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_buffers_cover_acquisition(
            samples in 1usize..2048,
            records_per_buffer in 1usize..256,
            buffers in 1usize..64,
            channels in 1usize..=2,
        ) {
            let records = records_per_buffer * buffers;
            let g = AcquisitionGeometry::new(samples, records, records_per_buffer, channels, SampleWidth::U16)
                .unwrap();

            // Property: buffers tile the acquisition exactly
            prop_assert_eq!(g.buffers_per_acquisition() * g.records_per_buffer(), g.records_per_acquisition());
            prop_assert_eq!(g.buffer_len(), channels * samples * records_per_buffer);
        }

        #[test]
        fn test_construction_never_panics(
            samples in 0usize..64,
            records in 0usize..512,
            records_per_buffer in 0usize..64,
            channels in 0usize..4,
        ) {
            if let Ok(g) = AcquisitionGeometry::new(samples, records, records_per_buffer, channels, SampleWidth::U8) {
                prop_assert_eq!(g.records_per_acquisition() % g.records_per_buffer(), 0);
            }
        }
    }
}
