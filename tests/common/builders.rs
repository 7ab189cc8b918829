//! Test data builders for creating test objects

use alazar_stream::{AcquisitionGeometry, RawBuffer, Sample, SampleWidth};

/// Builder for test geometries. Defaults to the realistic board parameters
/// 1024 samples, 128 records, 64 records per buffer, 2 channels, 8-bit.
pub struct GeometryBuilder {
    samples_per_record: usize,
    records_per_acquisition: usize,
    records_per_buffer: usize,
    channel_count: usize,
    sample_width: SampleWidth,
}

impl GeometryBuilder {
    pub fn new() -> Self {
        Self {
            samples_per_record: 1024,
            records_per_acquisition: 128,
            records_per_buffer: 64,
            channel_count: 2,
            sample_width: SampleWidth::U8,
        }
    }

    pub fn samples_per_record(mut self, n: usize) -> Self {
        self.samples_per_record = n;
        self
    }

    pub fn records(mut self, per_acquisition: usize, per_buffer: usize) -> Self {
        self.records_per_acquisition = per_acquisition;
        self.records_per_buffer = per_buffer;
        self
    }

    pub fn channels(mut self, n: usize) -> Self {
        self.channel_count = n;
        self
    }

    pub fn sample_width(mut self, width: SampleWidth) -> Self {
        self.sample_width = width;
        self
    }

    pub fn build(self) -> AcquisitionGeometry {
        AcquisitionGeometry::new(
            self.samples_per_record,
            self.records_per_acquisition,
            self.records_per_buffer,
            self.channel_count,
            self.sample_width,
        )
        .expect("test geometry is valid")
    }
}

/// One full acquisition of buffers where every sample equals `value`.
pub fn buffers_same_val<S: Sample>(geometry: &AcquisitionGeometry, value: S) -> Vec<RawBuffer<S>> {
    (0..geometry.buffers_per_acquisition())
        .map(|_| RawBuffer::filled(geometry, value))
        .collect()
}

/// One full acquisition of pseudo-random buffers with codes in
/// `[min_val, max_val)`. The same seed always gives the same data.
pub fn buffers_random<S: Sample>(
    geometry: &AcquisitionGeometry,
    min_val: u64,
    max_val: u64,
    seed: u64,
) -> Vec<RawBuffer<S>> {
    let mut state = seed.max(1);
    let span = max_val - min_val;
    (0..geometry.buffers_per_acquisition())
        .map(|_| {
            let samples = (0..geometry.buffer_len())
                .map(|_| {
                    state ^= state << 13;
                    state ^= state >> 7;
                    state ^= state << 17;
                    S::from_code(min_val + state % span)
                })
                .collect();
            RawBuffer::new(samples)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_builder() {
        let g = GeometryBuilder::new()
            .samples_per_record(16)
            .records(8, 2)
            .channels(1)
            .sample_width(SampleWidth::U16)
            .build();

        assert_eq!(g.samples_per_record(), 16);
        assert_eq!(g.buffers_per_acquisition(), 4);
        assert_eq!(g.channel_count(), 1);
        assert_eq!(g.sample_width(), SampleWidth::U16);
    }

    #[test]
    fn test_random_buffers_are_seeded() {
        let g = GeometryBuilder::new().samples_per_record(8).records(4, 2).build();
        let a = buffers_random::<u8>(&g, 0, 255, 7);
        let b = buffers_random::<u8>(&g, 0, 255, 7);
        assert_eq!(a, b);
        assert!(a.iter().all(|buf| buf.len() == g.buffer_len()));
    }
}
