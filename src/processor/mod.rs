//! Buffer processors.
//!
//! Every accumulation strategy implements [`BufferProcessor`]. The pipeline
//! holds them as [`Processor`] values, an enum over the built-in strategies
//! plus a boxed plugin variant, and calls them in registration order.
//!
//! # Contract
//!
//! - `initialize` resets the processor for a new acquisition, clearing any
//!   latched error.
//! - `process` and `post_process` never fail outward. A fault is stored in
//!   the processor's error latch and all later input is ignored, so one
//!   failing processor never stops its siblings.
//! - `abort` latches a cause (first cause wins) and is safe at any point.
//! - `output` / `get_result` is the only place an error is reported.
//!
//! # Built-in processors
//!
//! | Variant     | Type                 | Result                                   |
//! |-------------|----------------------|------------------------------------------|
//! | `Raw`       | [`RawCapture`]       | `(records, samples)` per channel         |
//! | `Average`   | [`StreamingAverage`] | `(samples,)` per channel                 |
//! | `AverageN`  | [`GroupedAverage`]   | `(n, samples)` per channel               |
//! | `Chunk`     | [`WindowedChunk`]    | `(n, records / n)` per channel           |

pub mod average;
pub mod chunk;
pub mod grouped;
pub mod lifecycle;
pub mod raw;

pub use average::StreamingAverage;
pub use chunk::WindowedChunk;
pub use grouped::GroupedAverage;
pub use lifecycle::{ErrorLatch, Lifecycle, ProcessorState};
pub use raw::RawCapture;

use crate::buffer::ChannelView;
use crate::error::{FaultCause, ProcessingError};
use crate::geometry::AcquisitionGeometry;
use crate::types::Sample;
use ndarray::{Array1, Array2};

/// Borrowed result of a finalized processor.
#[derive(Debug)]
pub enum ProcessorOutput<'a, S> {
    /// Every record, per channel.
    Raw(&'a [Array2<S>]),
    /// Mean record, per channel.
    Average(&'a [Array1<f64>]),
    /// Mean record of each record type, per channel.
    Grouped(&'a [Array2<f64>]),
    /// Windowed record means grouped by record type, per channel.
    Chunked(&'a [Array2<f64>]),
    /// The processor produces no data.
    Empty,
}

/// Lifecycle contract implemented by every accumulation strategy.
pub trait BufferProcessor<S: Sample>: Send {
    /// Human-readable name of this processor.
    fn name(&self) -> &str;

    /// Reset for a new acquisition and allocate storage sized from `geometry`.
    fn initialize(&mut self, geometry: &AcquisitionGeometry);

    /// Accumulate one buffer. Faults are latched, never returned.
    fn process(&mut self, channels: &[ChannelView<'_, S>], buffer_index: usize);

    /// Finalize after the last buffer. Faults are latched, never returned.
    fn post_process(&mut self);

    /// Latch `cause` unless a cause is already latched.
    fn abort(&mut self, cause: FaultCause);

    /// Current lifecycle state.
    fn state(&self) -> ProcessorState;

    /// Buffers accepted since the last `initialize`.
    fn buffers_processed(&self) -> usize;

    /// The finalized result, or the latched cause.
    fn output(&self) -> Result<ProcessorOutput<'_, S>, ProcessingError>;
}

/// Enum dispatch over the built-in processors, plus user-defined plugins.
pub enum Processor<S: Sample> {
    Raw(RawCapture<S>),
    Average(StreamingAverage),
    AverageN(GroupedAverage),
    Chunk(WindowedChunk),
    Plugin(Box<dyn BufferProcessor<S>>),
}

impl<S: Sample> Processor<S> {
    /// Wrap a user-defined processor.
    pub fn plugin(processor: impl BufferProcessor<S> + 'static) -> Self {
        Processor::Plugin(Box::new(processor))
    }

    pub fn name(&self) -> &str {
        match self {
            Processor::Raw(p) => BufferProcessor::<S>::name(p),
            Processor::Average(p) => BufferProcessor::<S>::name(p),
            Processor::AverageN(p) => BufferProcessor::<S>::name(p),
            Processor::Chunk(p) => BufferProcessor::<S>::name(p),
            Processor::Plugin(p) => p.name(),
        }
    }

    pub fn initialize(&mut self, geometry: &AcquisitionGeometry) {
        match self {
            Processor::Raw(p) => p.initialize(geometry),
            Processor::Average(p) => p.initialize(geometry),
            Processor::AverageN(p) => p.initialize(geometry),
            Processor::Chunk(p) => p.initialize(geometry),
            Processor::Plugin(p) => p.initialize(geometry),
        }
    }

    pub fn process(&mut self, channels: &[ChannelView<'_, S>], buffer_index: usize) {
        match self {
            Processor::Raw(p) => p.process(channels, buffer_index),
            Processor::Average(p) => p.process(channels, buffer_index),
            Processor::AverageN(p) => p.process(channels, buffer_index),
            Processor::Chunk(p) => p.process(channels, buffer_index),
            Processor::Plugin(p) => p.process(channels, buffer_index),
        }
    }

    pub fn post_process(&mut self) {
        match self {
            Processor::Raw(p) => p.post_process(),
            Processor::Average(p) => p.post_process(),
            Processor::AverageN(p) => p.post_process(),
            Processor::Chunk(p) => p.post_process(),
            Processor::Plugin(p) => p.post_process(),
        }
    }

    pub fn abort(&mut self, cause: FaultCause) {
        match self {
            Processor::Raw(p) => p.abort(cause),
            Processor::Average(p) => p.abort(cause),
            Processor::AverageN(p) => p.abort(cause),
            Processor::Chunk(p) => p.abort(cause),
            Processor::Plugin(p) => p.abort(cause),
        }
    }

    pub fn state(&self) -> ProcessorState {
        match self {
            Processor::Raw(p) => p.state(),
            Processor::Average(p) => p.state(),
            Processor::AverageN(p) => p.state(),
            Processor::Chunk(p) => p.state(),
            Processor::Plugin(p) => p.state(),
        }
    }

    pub fn buffers_processed(&self) -> usize {
        match self {
            Processor::Raw(p) => p.buffers_processed(),
            Processor::Average(p) => p.buffers_processed(),
            Processor::AverageN(p) => p.buffers_processed(),
            Processor::Chunk(p) => p.buffers_processed(),
            Processor::Plugin(p) => p.buffers_processed(),
        }
    }

    /// The finalized result, or a `ProcessingError` carrying the latched cause.
    pub fn get_result(&self) -> Result<ProcessorOutput<'_, S>, ProcessingError> {
        match self {
            Processor::Raw(p) => p.get_result().map(ProcessorOutput::Raw),
            Processor::Average(p) => p.get_result().map(ProcessorOutput::Average),
            Processor::AverageN(p) => p.get_result().map(ProcessorOutput::Grouped),
            Processor::Chunk(p) => p.get_result().map(ProcessorOutput::Chunked),
            Processor::Plugin(p) => p.output(),
        }
    }

    pub fn as_raw(&self) -> Option<&RawCapture<S>> {
        match self {
            Processor::Raw(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_average(&self) -> Option<&StreamingAverage> {
        match self {
            Processor::Average(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_average_n(&self) -> Option<&GroupedAverage> {
        match self {
            Processor::AverageN(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_chunk(&self) -> Option<&WindowedChunk> {
        match self {
            Processor::Chunk(p) => Some(p),
            _ => None,
        }
    }
}

impl<S: Sample> std::fmt::Debug for Processor<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Processor")
            .field("name", &self.name())
            .field("state", &self.state())
            .finish()
    }
}

impl<S: Sample> From<RawCapture<S>> for Processor<S> {
    fn from(p: RawCapture<S>) -> Self {
        Processor::Raw(p)
    }
}

impl<S: Sample> From<StreamingAverage> for Processor<S> {
    fn from(p: StreamingAverage) -> Self {
        Processor::Average(p)
    }
}

impl<S: Sample> From<GroupedAverage> for Processor<S> {
    fn from(p: GroupedAverage) -> Self {
        Processor::AverageN(p)
    }
}

impl<S: Sample> From<WindowedChunk> for Processor<S> {
    fn from(p: WindowedChunk) -> Self {
        Processor::Chunk(p)
    }
}
