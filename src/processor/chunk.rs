//! Windowed record means, grouped by record type.
//!
//! Each record is reduced to the mean of its samples in `[start, stop)` and
//! written at its global record position. After the last buffer the linear
//! per-channel series is regrouped so that row `t` holds every record of
//! type `t` in acquisition order.

use crate::buffer::ChannelView;
use crate::error::{ConfigurationError, FaultCause, ProcessingError};
use crate::geometry::AcquisitionGeometry;
use crate::processor::{BufferProcessor, Lifecycle, ProcessorOutput, ProcessorState};
use crate::types::Sample;
use ndarray::{s, Array1, Array2};

/// Reduces each record to a window mean and groups the means by record type.
pub struct WindowedChunk {
    record_types: usize,
    start: usize,
    stop: usize,
    lifecycle: Lifecycle,
    linear: Vec<Array1<f64>>,
    grouped: Vec<Array2<f64>>,
}

impl WindowedChunk {
    /// Window is the half-open sample range `[start, stop)`.
    pub fn new(record_types: usize, start: usize, stop: usize) -> Result<Self, ConfigurationError> {
        if record_types < 1 {
            return Err(ConfigurationError::ZeroRecordTypes);
        }
        if start >= stop {
            return Err(ConfigurationError::EmptyWindow { start, stop });
        }
        Ok(Self {
            record_types,
            start,
            stop,
            lifecycle: Lifecycle::new("chunk"),
            linear: Vec::new(),
            grouped: Vec::new(),
        })
    }

    pub fn record_types(&self) -> usize {
        self.record_types
    }

    pub fn window(&self) -> std::ops::Range<usize> {
        self.start..self.stop
    }

    pub fn initialize(&mut self, geometry: &AcquisitionGeometry) {
        self.lifecycle.begin(geometry);
        self.linear.clear();
        self.grouped.clear();

        if geometry.records_per_acquisition() % self.record_types != 0 {
            self.lifecycle.fail(
                ConfigurationError::UnevenRecordTypes {
                    records_per_acquisition: geometry.records_per_acquisition(),
                    record_types: self.record_types,
                }
                .into(),
            );
            return;
        }
        if self.stop > geometry.samples_per_record() {
            self.lifecycle.fail(
                ConfigurationError::WindowOutOfRange {
                    stop: self.stop,
                    samples_per_record: geometry.samples_per_record(),
                }
                .into(),
            );
            return;
        }
        self.linear = (0..geometry.channel_count())
            .map(|_| Array1::zeros(geometry.records_per_acquisition()))
            .collect();
    }

    pub fn process<S: Sample>(&mut self, channels: &[ChannelView<'_, S>], buffer_index: usize) {
        let Some(geometry) = self.lifecycle.admit(channels, buffer_index) else {
            return;
        };
        let first = geometry.first_record(buffer_index);
        let width = (self.stop - self.start) as f64;

        for (linear, view) in self.linear.iter_mut().zip(channels) {
            let window = view.slice(s![.., self.start..self.stop]);
            for (local, record) in window.outer_iter().enumerate() {
                let sum: u64 = record.iter().map(|x| x.widen()).sum();
                linear[first + local] = sum as f64 / width;
            }
        }
        self.lifecycle.complete(Ok(()));
    }

    pub fn post_process(&mut self) {
        let Some(geometry) = self.lifecycle.admit_finalize() else {
            return;
        };
        let n = self.record_types;
        let per_type = geometry.records_per_acquisition() / n;
        self.grouped = self
            .linear
            .iter()
            .map(|lin| Array2::from_shape_fn((n, per_type), |(t, j)| lin[j * n + t]))
            .collect();
        self.lifecycle.finish();
    }

    pub fn abort(&mut self, cause: FaultCause) {
        self.lifecycle.fail(cause);
    }

    pub fn state(&self) -> ProcessorState {
        self.lifecycle.state()
    }

    pub fn buffers_processed(&self) -> usize {
        self.lifecycle.buffers_processed()
    }

    /// Per-channel `(record_types, records_per_acquisition / record_types)`
    /// window means.
    pub fn get_result(&self) -> Result<&[Array2<f64>], ProcessingError> {
        self.lifecycle.result_gate()?;
        Ok(&self.grouped)
    }
}

impl<S: Sample> BufferProcessor<S> for WindowedChunk {
    fn name(&self) -> &str {
        self.lifecycle.name()
    }

    fn initialize(&mut self, geometry: &AcquisitionGeometry) {
        WindowedChunk::initialize(self, geometry)
    }

    fn process(&mut self, channels: &[ChannelView<'_, S>], buffer_index: usize) {
        WindowedChunk::process(self, channels, buffer_index)
    }

    fn post_process(&mut self) {
        WindowedChunk::post_process(self)
    }

    fn abort(&mut self, cause: FaultCause) {
        WindowedChunk::abort(self, cause)
    }

    fn state(&self) -> ProcessorState {
        WindowedChunk::state(self)
    }

    fn buffers_processed(&self) -> usize {
        WindowedChunk::buffers_processed(self)
    }

    fn output(&self) -> Result<ProcessorOutput<'_, S>, ProcessingError> {
        self.get_result().map(ProcessorOutput::Chunked)
    }
}
