//! Raw acquisition buffers and the zero-copy channel reshaper.
//!
//! A [`RawBuffer`] is the transfer unit between producer and worker: a flat,
//! channel-major run of samples exactly `geometry.buffer_len()` long. The
//! worker never copies it; [`reshape`] hands each processor an
//! `ArrayView2` borrowed from the buffer, so no view can outlive the fan-out
//! pass that owns the buffer.

use crate::error::BoundsError;
use crate::geometry::AcquisitionGeometry;
use crate::types::Sample;
use ndarray::ArrayView2;

/// Read-only `(records_per_buffer, samples_per_record)` view of one channel.
pub type ChannelView<'a, S> = ArrayView2<'a, S>;

/// Flat, channel-major buffer as transferred by the digitizer.
#[derive(Clone, PartialEq)]
pub struct RawBuffer<S> {
    samples: Vec<S>,
}

impl<S: Sample> RawBuffer<S> {
    pub fn new(samples: Vec<S>) -> Self {
        Self { samples }
    }

    /// A buffer where every sample of every channel equals `value`.
    pub fn filled(geometry: &AcquisitionGeometry, value: S) -> Self {
        Self {
            samples: vec![value; geometry.buffer_len()],
        }
    }

    /// Concatenate per-channel record blocks into channel-major layout.
    pub fn from_channels(
        geometry: &AcquisitionGeometry,
        channels: &[ChannelView<'_, S>],
    ) -> Result<Self, BoundsError> {
        if channels.len() != geometry.channel_count() {
            return Err(BoundsError::ChannelCount {
                expected: geometry.channel_count(),
                actual: channels.len(),
            });
        }
        let mut samples = Vec::with_capacity(geometry.buffer_len());
        for view in channels {
            if view.dim() != geometry.view_shape() {
                return Err(BoundsError::ViewShape {
                    expected: geometry.view_shape(),
                    actual: view.dim(),
                });
            }
            samples.extend(view.iter().copied());
        }
        Ok(Self { samples })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[S] {
        &self.samples
    }

    pub fn into_inner(self) -> Vec<S> {
        self.samples
    }

    /// Check the buffer length against the geometry.
    pub fn validate(&self, geometry: &AcquisitionGeometry) -> Result<(), BoundsError> {
        if self.samples.len() != geometry.buffer_len() {
            return Err(BoundsError::BufferLength {
                expected: geometry.buffer_len(),
                actual: self.samples.len(),
            });
        }
        Ok(())
    }

    /// Views of every channel, in channel order.
    pub fn channels(
        &self,
        geometry: &AcquisitionGeometry,
    ) -> Result<Vec<ChannelView<'_, S>>, BoundsError> {
        reshape_channels(&self.samples, geometry)
    }
}

impl<S: Sample> From<Vec<S>> for RawBuffer<S> {
    fn from(samples: Vec<S>) -> Self {
        Self::new(samples)
    }
}

impl<S> std::fmt::Debug for RawBuffer<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawBuffer")
            .field("len", &self.samples.len())
            .finish()
    }
}

/// View one channel's slice of `raw` as `records_per_buffer` rows of
/// `samples_per_record` samples. No data is copied.
pub fn reshape<'a, S>(
    raw: &'a [S],
    channel_index: usize,
    geometry: &AcquisitionGeometry,
) -> Result<ChannelView<'a, S>, BoundsError> {
    let expected = geometry.buffer_len();
    if raw.len() != expected {
        return Err(BoundsError::BufferLength {
            expected,
            actual: raw.len(),
        });
    }
    if channel_index >= geometry.channel_count() {
        return Err(BoundsError::Channel {
            channel: channel_index,
            channel_count: geometry.channel_count(),
        });
    }

    let chunk = geometry.channel_chunk_size();
    let offset = channel_index * chunk;
    ArrayView2::from_shape(geometry.view_shape(), &raw[offset..offset + chunk]).map_err(|_| {
        BoundsError::BufferLength {
            expected,
            actual: raw.len(),
        }
    })
}

/// Reshape every channel of `raw`, in channel order.
pub fn reshape_channels<'a, S>(
    raw: &'a [S],
    geometry: &AcquisitionGeometry,
) -> Result<Vec<ChannelView<'a, S>>, BoundsError> {
    (0..geometry.channel_count())
        .map(|channel| reshape(raw, channel, geometry))
        .collect()
}
