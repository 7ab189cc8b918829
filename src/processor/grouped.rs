//! Average of interleaved record types.
//!
//! Some acquisitions cycle through `n` record types (e.g. pump on / pump off),
//! so record `g` of the acquisition has type `g mod n`. A buffer rarely starts
//! on type 0: buffer `b` starts at global record `b * records_per_buffer`, so
//! its first local record has type `(b * records_per_buffer) mod n`. The type
//! sequence continues across buffer boundaries and is never reset per buffer.

use crate::buffer::ChannelView;
use crate::error::{ConfigurationError, FaultCause, ProcessingError};
use crate::geometry::AcquisitionGeometry;
use crate::processor::{BufferProcessor, Lifecycle, ProcessorOutput, ProcessorState};
use crate::types::Sample;
use ndarray::{s, Array2};

/// Averages records per record type, per channel.
pub struct GroupedAverage {
    record_types: usize,
    lifecycle: Lifecycle,
    sums: Vec<Array2<u64>>,
    averages: Vec<Array2<f64>>,
}

impl GroupedAverage {
    /// `record_types` must be at least 1.
    pub fn new(record_types: usize) -> Result<Self, ConfigurationError> {
        if record_types < 1 {
            return Err(ConfigurationError::ZeroRecordTypes);
        }
        Ok(Self {
            record_types,
            lifecycle: Lifecycle::new("average_n"),
            sums: Vec::new(),
            averages: Vec::new(),
        })
    }

    pub fn record_types(&self) -> usize {
        self.record_types
    }

    pub fn initialize(&mut self, geometry: &AcquisitionGeometry) {
        self.lifecycle.begin(geometry);
        self.sums.clear();
        self.averages.clear();

        let n = self.record_types;
        if geometry.records_per_acquisition() % n != 0 {
            self.lifecycle.fail(
                ConfigurationError::UnevenRecordTypes {
                    records_per_acquisition: geometry.records_per_acquisition(),
                    record_types: n,
                }
                .into(),
            );
            return;
        }
        self.sums = (0..geometry.channel_count())
            .map(|_| Array2::zeros((n, geometry.samples_per_record())))
            .collect();
    }

    pub fn process<S: Sample>(&mut self, channels: &[ChannelView<'_, S>], buffer_index: usize) {
        let Some(geometry) = self.lifecycle.admit(channels, buffer_index) else {
            return;
        };
        let n = self.record_types;
        let local_records = geometry.records_per_buffer();
        let first_type_offset = geometry.first_record(buffer_index) % n;
        let stride = n as isize;

        for (sum, view) in self.sums.iter_mut().zip(channels) {
            for record_type in 0..n {
                // Local index of the first record of this type in the buffer.
                let start = (record_type + n - first_type_offset) % n;
                if start >= local_records {
                    continue;
                }
                let mut row = sum.row_mut(record_type);
                for record in view.slice(s![start..;stride, ..]).outer_iter() {
                    row.zip_mut_with(&record, |acc, &x| *acc += x.widen());
                }
            }
        }
        self.lifecycle.complete(Ok(()));
    }

    pub fn post_process(&mut self) {
        let Some(geometry) = self.lifecycle.admit_finalize() else {
            return;
        };
        let records_per_type = (geometry.records_per_acquisition() / self.record_types) as f64;
        self.averages = self
            .sums
            .iter()
            .map(|sum| sum.mapv(|v| v as f64 / records_per_type))
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

    /// Per-channel `(record_types, samples_per_record)` means.
    pub fn get_result(&self) -> Result<&[Array2<f64>], ProcessingError> {
        self.lifecycle.result_gate()?;
        Ok(&self.averages)
    }
}

impl<S: Sample> BufferProcessor<S> for GroupedAverage {
    fn name(&self) -> &str {
        self.lifecycle.name()
    }

    fn initialize(&mut self, geometry: &AcquisitionGeometry) {
        GroupedAverage::initialize(self, geometry)
    }

    fn process(&mut self, channels: &[ChannelView<'_, S>], buffer_index: usize) {
        GroupedAverage::process(self, channels, buffer_index)
    }

    fn post_process(&mut self) {
        GroupedAverage::post_process(self)
    }

    fn abort(&mut self, cause: FaultCause) {
        GroupedAverage::abort(self, cause)
    }

    fn state(&self) -> ProcessorState {
        GroupedAverage::state(self)
    }

    fn buffers_processed(&self) -> usize {
        GroupedAverage::buffers_processed(self)
    }

    fn output(&self) -> Result<ProcessorOutput<'_, S>, ProcessingError> {
        self.get_result().map(ProcessorOutput::Grouped)
    }
}
