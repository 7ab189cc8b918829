//! Messages carried on the producer → worker queue.

use crate::buffer::RawBuffer;
use crate::error::AcquisitionAbortedError;

/// One queue entry. A run is exactly `buffers_per_acquisition` `Data`
/// messages, or fewer followed by a single `Error`.
#[derive(Debug)]
pub enum PipelineMessage<S> {
    /// A filled buffer and its position in the acquisition.
    Data { index: usize, buffer: RawBuffer<S> },
    /// The producer gave up; every processor is aborted with this cause.
    Error(AcquisitionAbortedError),
}
