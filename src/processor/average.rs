//! Running average of every record in the acquisition.
//!
//! Samples are summed into `u64` accumulators and divided in `f64` once, at
//! finalize. Addition commutes, so the result depends only on every buffer
//! arriving, not on arrival order.

use crate::buffer::ChannelView;
use crate::error::{FaultCause, ProcessingError};
use crate::geometry::AcquisitionGeometry;
use crate::processor::{BufferProcessor, Lifecycle, ProcessorOutput, ProcessorState};
use crate::types::Sample;
use ndarray::Array1;

/// Averages all records together, per channel.
pub struct StreamingAverage {
    lifecycle: Lifecycle,
    sums: Vec<Array1<u64>>,
    averages: Vec<Array1<f64>>,
}

impl StreamingAverage {
    pub fn new() -> Self {
        Self {
            lifecycle: Lifecycle::new("average"),
            sums: Vec::new(),
            averages: Vec::new(),
        }
    }

    pub fn initialize(&mut self, geometry: &AcquisitionGeometry) {
        self.lifecycle.begin(geometry);
        self.sums = (0..geometry.channel_count())
            .map(|_| Array1::zeros(geometry.samples_per_record()))
            .collect();
        self.averages.clear();
    }

    pub fn process<S: Sample>(&mut self, channels: &[ChannelView<'_, S>], buffer_index: usize) {
        if self.lifecycle.admit(channels, buffer_index).is_none() {
            return;
        }
        for (sum, view) in self.sums.iter_mut().zip(channels) {
            for record in view.outer_iter() {
                sum.zip_mut_with(&record, |acc, &x| *acc += x.widen());
            }
        }
        self.lifecycle.complete(Ok(()));
    }

    pub fn post_process(&mut self) {
        let Some(geometry) = self.lifecycle.admit_finalize() else {
            return;
        };
        let records = geometry.records_per_acquisition() as f64;
        self.averages = self
            .sums
            .iter()
            .map(|sum| sum.mapv(|v| v as f64 / records))
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

    /// Per-channel mean record, length `samples_per_record`.
    pub fn get_result(&self) -> Result<&[Array1<f64>], ProcessingError> {
        self.lifecycle.result_gate()?;
        Ok(&self.averages)
    }
}

impl Default for StreamingAverage {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Sample> BufferProcessor<S> for StreamingAverage {
    fn name(&self) -> &str {
        self.lifecycle.name()
    }

    fn initialize(&mut self, geometry: &AcquisitionGeometry) {
        StreamingAverage::initialize(self, geometry)
    }

    fn process(&mut self, channels: &[ChannelView<'_, S>], buffer_index: usize) {
        StreamingAverage::process(self, channels, buffer_index)
    }

    fn post_process(&mut self) {
        StreamingAverage::post_process(self)
    }

    fn abort(&mut self, cause: FaultCause) {
        StreamingAverage::abort(self, cause)
    }

    fn state(&self) -> ProcessorState {
        StreamingAverage::state(self)
    }

    fn buffers_processed(&self) -> usize {
        StreamingAverage::buffers_processed(self)
    }

    fn output(&self) -> Result<ProcessorOutput<'_, S>, ProcessingError> {
        self.get_result().map(ProcessorOutput::Average)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::RawBuffer;
    use crate::error::AcquisitionAbortedError;
    use crate::types::SampleWidth;
    use ndarray::arr1;

    #[test]
    fn test_small_average() {
        let g = AcquisitionGeometry::new(4, 4, 2, 1, SampleWidth::U8).unwrap();
        let buffers: [RawBuffer<u8>; 2] = [
            RawBuffer::new((0..8).collect()),
            RawBuffer::new((8..16).collect()),
        ];

        let mut ave = StreamingAverage::new();
        ave.initialize(&g);
        for (i, buf) in buffers.iter().enumerate() {
            ave.process(&buf.channels(&g).unwrap(), i);
        }
        ave.post_process();

        assert_eq!(ave.get_result().unwrap()[0], arr1(&[6.0, 7.0, 8.0, 9.0]));
    }

    #[test]
    fn test_no_overflow_at_full_scale() {
        let g = AcquisitionGeometry::new(8, 4096, 512, 2, SampleWidth::U16).unwrap();
        let buf = RawBuffer::filled(&g, u16::MAX);

        let mut ave = StreamingAverage::new();
        ave.initialize(&g);
        for i in 0..g.buffers_per_acquisition() {
            ave.process(&buf.channels(&g).unwrap(), i);
        }
        ave.post_process();

        for chan in ave.get_result().unwrap() {
            assert!(chan.iter().all(|&v| v == u16::MAX as f64));
        }
    }

    #[test]
    fn test_abort_ignores_later_input() {
        let g = AcquisitionGeometry::new(4, 4, 2, 1, SampleWidth::U8).unwrap();
        let buf = RawBuffer::filled(&g, 3u8);

        let mut ave = StreamingAverage::new();
        ave.initialize(&g);
        ave.abort(AcquisitionAbortedError::new("first").into());
        ave.abort(AcquisitionAbortedError::new("second").into());
        ave.process(&buf.channels(&g).unwrap(), 0);
        ave.post_process();

        assert_eq!(ave.buffers_processed(), 0);
        let err = ave.get_result().unwrap_err();
        assert_eq!(
            err.cause(),
            &FaultCause::Aborted(AcquisitionAbortedError::new("first"))
        );
    }

    #[test]
    fn test_reinitialize_clears_abort() {
        let g = AcquisitionGeometry::new(4, 2, 2, 1, SampleWidth::U8).unwrap();
        let buf = RawBuffer::filled(&g, 5u8);

        let mut ave = StreamingAverage::new();
        ave.abort(AcquisitionAbortedError::new("stale").into());
        ave.initialize(&g);
        ave.process(&buf.channels(&g).unwrap(), 0);
        ave.post_process();

        assert_eq!(ave.get_result().unwrap()[0], arr1(&[5.0; 4]));
    }
}
