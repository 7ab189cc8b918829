//! Error handling for alazar-stream
//!
//! Errors fall into two families:
//!
//! - **Outward errors** are returned directly from constructors and from the
//!   producer side of the pipeline: [`ConfigurationError`], [`BoundsError`],
//!   and the crate-level [`Error`].
//! - **Latched errors** never leave a processor at the fault site. A processor
//!   stores the first [`FaultCause`] it sees and reports it later, wrapped in a
//!   [`ProcessingError`], when the caller asks for its result.

use crate::processor::ProcessorState;
use crate::source::SourceError;
use crate::types::SampleWidth;
use thiserror::Error;

/// Invalid construction parameters.
///
/// Always detected before any buffer is processed, so it never leaves
/// partial work behind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("samples_per_record must be greater than zero")]
    ZeroSamplesPerRecord,

    #[error("records_per_acquisition must be greater than zero")]
    ZeroRecordsPerAcquisition,

    #[error("records_per_buffer must be greater than zero")]
    ZeroRecordsPerBuffer,

    #[error(
        "records_per_acquisition ({records_per_acquisition}) is not a multiple of \
         records_per_buffer ({records_per_buffer})"
    )]
    UnevenBuffers {
        records_per_acquisition: usize,
        records_per_buffer: usize,
    },

    #[error("channel count must be 1 or 2, got {0}")]
    InvalidChannelCount(usize),

    #[error("number of record types must be at least 1")]
    ZeroRecordTypes,

    #[error(
        "records_per_acquisition ({records_per_acquisition}) is not a multiple of \
         the record type count ({record_types})"
    )]
    UnevenRecordTypes {
        records_per_acquisition: usize,
        record_types: usize,
    },

    #[error("chunk window start ({start}) must be less than stop ({stop})")]
    EmptyWindow { start: usize, stop: usize },

    #[error("chunk window stop ({stop}) exceeds samples_per_record ({samples_per_record})")]
    WindowOutOfRange {
        stop: usize,
        samples_per_record: usize,
    },

    #[error("sample width mismatch: geometry uses {expected}, pipeline carries {actual}")]
    SampleWidthMismatch {
        expected: SampleWidth,
        actual: SampleWidth,
    },

    #[error("queue capacity must be greater than zero")]
    ZeroQueueCapacity,

    #[error("unknown board type code {0}")]
    UnknownBoard(u32),
}

/// A buffer or view does not fit the acquisition geometry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BoundsError {
    #[error("buffer holds {actual} samples, geometry expects {expected}")]
    BufferLength { expected: usize, actual: usize },

    #[error("channel {channel} out of range for {channel_count} channel(s)")]
    Channel { channel: usize, channel_count: usize },

    #[error("buffer index {index} out of range for {buffers_per_acquisition} buffer(s)")]
    BufferIndex {
        index: usize,
        buffers_per_acquisition: usize,
    },

    #[error("received {actual} channel view(s), geometry has {expected}")]
    ChannelCount { expected: usize, actual: usize },

    #[error("channel view shape {actual:?} does not match geometry shape {expected:?}")]
    ViewShape {
        expected: (usize, usize),
        actual: (usize, usize),
    },
}

/// Mid-stream failure signaled by the producer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("acquisition aborted: {reason}")]
pub struct AcquisitionAbortedError {
    pub reason: String,
}

impl AcquisitionAbortedError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// The cause stored in a processor's error latch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FaultCause {
    /// The producer aborted the acquisition.
    #[error(transparent)]
    Aborted(#[from] AcquisitionAbortedError),

    /// The processor cannot run with this geometry.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// A buffer or view did not match the geometry.
    #[error(transparent)]
    Bounds(#[from] BoundsError),

    /// Internal processor failure (including a caught panic).
    #[error("processor fault: {0}")]
    Fault(String),

    /// Finalization was requested before every buffer arrived.
    #[error("incomplete acquisition: processed {received} of {expected} buffer(s)")]
    Incomplete { expected: usize, received: usize },

    /// A result was requested before the processor reached a terminal state.
    /// Reported without latching.
    #[error("result requested before finalization (state: {0})")]
    NotFinalized(ProcessorState),
}

/// Error returned by `get_result` when a processor cannot deliver a result.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("acquisition failed: {cause}")]
pub struct ProcessingError {
    #[source]
    pub cause: FaultCause,
}

impl ProcessingError {
    pub fn new(cause: FaultCause) -> Self {
        Self { cause }
    }

    /// The original cause that was latched.
    pub fn cause(&self) -> &FaultCause {
        &self.cause
    }

    /// Whether the failure came from a producer abort.
    pub fn is_abort(&self) -> bool {
        matches!(self.cause, FaultCause::Aborted(_))
    }
}

/// Main error type for alazar-stream operations
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid construction parameters
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Buffer does not match the geometry
    #[error("Bounds error: {0}")]
    Bounds(#[from] BoundsError),

    /// A processor failed; carries the latched cause
    #[error(transparent)]
    Processing(#[from] ProcessingError),

    /// The acquisition was aborted by the producer
    #[error(transparent)]
    Aborted(#[from] AcquisitionAbortedError),

    /// The producer broke the submission contract
    #[error("Protocol violation: {0}")]
    Protocol(String),

    /// The worker stopped consuming (after an abort)
    #[error("Pipeline closed: the worker is no longer consuming buffers")]
    PipelineClosed,

    /// The worker thread exited without posting its reply
    #[error("Pipeline worker terminated without a reply")]
    WorkerLost,

    /// Errors from a buffer source
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Errors related to configuration loading/saving
    #[error("Config error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Error::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

/// Result type alias for alazar-stream operations
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}
