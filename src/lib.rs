//! # alazar-stream: streaming digitizer buffer processing
//!
//! Consumes the raw buffers a multi-channel digitizer transfers during an
//! acquisition and feeds them, as they arrive, to a set of independent
//! accumulation strategies ("processors") running on a worker thread. The
//! producer side never waits on processing beyond the bounded queue.
//!
//! ## Architecture
//!
//! - **Geometry**: [`AcquisitionGeometry`] fixes records, buffers and channels
//! - **Buffers**: [`RawBuffer`] plus a zero-copy per-channel reshaper
//! - **Processors**: raw capture, streaming average, grouped average and
//!   windowed chunk means, plus user plugins, behind one lifecycle contract
//! - **Pipeline**: single producer → bounded queue → worker, with an abort
//!   protocol and exactly one reply
//! - **Sources**: a mock digitizer and a replay source for running without
//!   hardware, driven by [`acquire::Acquisition`]
//!
//! ## Example
//!
//! ```
//! use alazar_stream::acquire::Acquisition;
//! use alazar_stream::processor::{RawCapture, StreamingAverage};
//! use alazar_stream::source::{MockDigitizer, MockPattern};
//! use alazar_stream::{AcquisitionGeometry, PipelineSettings, SampleWidth};
//!
//! let geometry = AcquisitionGeometry::new(256, 16, 4, 2, SampleWidth::U8).unwrap();
//! let mut board = MockDigitizer::<u8>::new(geometry, MockPattern::Sawtooth, 8);
//!
//! let report = Acquisition::<u8>::new(geometry, PipelineSettings::default())
//!     .with_processor(RawCapture::new())
//!     .with_processor(StreamingAverage::new())
//!     .run(&mut board)
//!     .unwrap();
//!
//! assert!(report.is_complete());
//! let average = report.processors[1].as_average().unwrap().get_result().unwrap();
//! assert_eq!(average[0][10], 10.0);
//! ```

pub mod acquire;
pub mod buffer;
pub mod config;
pub mod error;
pub mod geometry;
pub mod pipeline;
pub mod processor;
pub mod source;
pub mod types;

// Re-export commonly used types
pub use acquire::{Acquisition, AcquisitionReport};
pub use buffer::{reshape, reshape_channels, ChannelView, RawBuffer};
pub use config::{AcquisitionConfig, ProcessorSpec};
pub use error::{
    AcquisitionAbortedError, BoundsError, ConfigurationError, Error, FaultCause,
    ProcessingError, Result,
};
pub use geometry::{AcquisitionGeometry, GeometrySettings};
pub use pipeline::{Pipeline, PipelineHandle, PipelineSettings};
pub use processor::{BufferProcessor, Processor, ProcessorOutput, ProcessorState};
pub use types::{BoardModel, Sample, SampleWidth};
