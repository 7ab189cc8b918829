//! Raw capture: keep every record of the acquisition.

use crate::buffer::ChannelView;
use crate::error::{FaultCause, ProcessingError};
use crate::geometry::AcquisitionGeometry;
use crate::processor::{BufferProcessor, Lifecycle, ProcessorOutput, ProcessorState};
use crate::types::Sample;
use ndarray::{s, Array2};

/// Copies every buffer into one `(records_per_acquisition, samples_per_record)`
/// array per channel.
pub struct RawCapture<S> {
    lifecycle: Lifecycle,
    channels: Vec<Array2<S>>,
    /// Which buffer indices have landed; a repeat would overwrite rows.
    written: Vec<bool>,
}

impl<S: Sample> RawCapture<S> {
    pub fn new() -> Self {
        Self {
            lifecycle: Lifecycle::new("raw"),
            channels: Vec::new(),
            written: Vec::new(),
        }
    }

    /// Per-channel record arrays.
    pub fn get_result(&self) -> Result<&[Array2<S>], ProcessingError> {
        self.lifecycle.result_gate()?;
        Ok(&self.channels)
    }

    fn copy_buffer(
        &mut self,
        geometry: &AcquisitionGeometry,
        channels: &[ChannelView<'_, S>],
        buffer_index: usize,
    ) -> Result<(), FaultCause> {
        if self.written[buffer_index] {
            return Err(FaultCause::Fault(format!(
                "buffer {buffer_index} delivered twice"
            )));
        }
        let first = geometry.first_record(buffer_index);
        let rows = first..first + geometry.records_per_buffer();
        for (dest, view) in self.channels.iter_mut().zip(channels) {
            dest.slice_mut(s![rows.clone(), ..]).assign(view);
        }
        self.written[buffer_index] = true;
        Ok(())
    }
}

impl<S: Sample> Default for RawCapture<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Sample> BufferProcessor<S> for RawCapture<S> {
    fn name(&self) -> &str {
        self.lifecycle.name()
    }

    fn initialize(&mut self, geometry: &AcquisitionGeometry) {
        self.lifecycle.begin(geometry);
        let shape = (
            geometry.records_per_acquisition(),
            geometry.samples_per_record(),
        );
        self.channels = (0..geometry.channel_count())
            .map(|_| Array2::from_elem(shape, S::default()))
            .collect();
        self.written = vec![false; geometry.buffers_per_acquisition()];
    }

    fn process(&mut self, channels: &[ChannelView<'_, S>], buffer_index: usize) {
        let Some(geometry) = self.lifecycle.admit(channels, buffer_index) else {
            return;
        };
        let outcome = self.copy_buffer(&geometry, channels, buffer_index);
        self.lifecycle.complete(outcome);
    }

    fn post_process(&mut self) {
        if self.lifecycle.admit_finalize().is_some() {
            self.lifecycle.finish();
        }
    }

    fn abort(&mut self, cause: FaultCause) {
        self.lifecycle.fail(cause);
    }

    fn state(&self) -> ProcessorState {
        self.lifecycle.state()
    }

    fn buffers_processed(&self) -> usize {
        self.lifecycle.buffers_processed()
    }

    fn output(&self) -> Result<ProcessorOutput<'_, S>, ProcessingError> {
        self.get_result().map(ProcessorOutput::Raw)
    }
}
