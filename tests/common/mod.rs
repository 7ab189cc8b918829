//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;

use alazar_stream::{AcquisitionGeometry, Processor, RawBuffer, Sample};
use ndarray::{Array2, ArrayBase, Data, Dimension};
use std::time::Duration;

/// Create a test timeout duration
pub fn test_timeout() -> Duration {
    Duration::from_millis(100)
}

/// Assert two floats are approximately equal
pub fn assert_float_eq(a: f64, b: f64, epsilon: f64) {
    assert!(
        (a - b).abs() < epsilon,
        "Expected {} to be approximately equal to {} (epsilon: {})",
        a,
        b,
        epsilon
    );
}

/// Assert two float arrays have the same shape and approximately equal elements
pub fn assert_arrays_close<A, B, D>(a: &ArrayBase<A, D>, b: &ArrayBase<B, D>, epsilon: f64)
where
    A: Data<Elem = f64>,
    B: Data<Elem = f64>,
    D: Dimension,
{
    assert_eq!(a.shape(), b.shape(), "array shapes differ");
    for (x, y) in a.iter().zip(b.iter()) {
        assert_float_eq(*x, *y, epsilon);
    }
}

/// Drive processors through a whole acquisition on the calling thread, the
/// way the pipeline worker would.
pub fn emulate_acq<S: Sample>(
    geometry: &AcquisitionGeometry,
    buffers: &[RawBuffer<S>],
    processors: &mut [Processor<S>],
) {
    for processor in processors.iter_mut() {
        processor.initialize(geometry);
    }
    for (index, buffer) in buffers.iter().enumerate() {
        let views = buffer.channels(geometry).expect("buffer matches geometry");
        for processor in processors.iter_mut() {
            processor.process(&views, index);
        }
    }
    for processor in processors.iter_mut() {
        processor.post_process();
    }
}

/// Concatenate every buffer into one `(records, samples)` array per channel.
pub fn bufs_to_raw_array<S: Sample>(
    geometry: &AcquisitionGeometry,
    buffers: &[RawBuffer<S>],
) -> Vec<Array2<S>> {
    let shape = (
        geometry.records_per_acquisition(),
        geometry.samples_per_record(),
    );
    let mut channels = vec![Array2::from_elem(shape, S::default()); geometry.channel_count()];
    for (index, buffer) in buffers.iter().enumerate() {
        let first = geometry.first_record(index);
        let views = buffer.channels(geometry).expect("buffer matches geometry");
        for (dest, view) in channels.iter_mut().zip(views) {
            dest.slice_mut(ndarray::s![first..first + geometry.records_per_buffer(), ..])
                .assign(&view);
        }
    }
    channels
}

/// Reference mean of a set of records, widened to f64.
pub fn mean_of_rows<'a, S: Sample>(
    rows: impl Iterator<Item = ndarray::ArrayView1<'a, S>>,
    width: usize,
) -> ndarray::Array1<f64> {
    let mut sum = ndarray::Array1::<u64>::zeros(width);
    let mut count = 0u64;
    for row in rows {
        sum.zip_mut_with(&row, |acc, &x| *acc += x.widen());
        count += 1;
    }
    sum.mapv(|v| v as f64 / count as f64)
}
