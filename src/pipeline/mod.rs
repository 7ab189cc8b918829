//! Streaming pipeline: one producer, one bounded queue, one worker.
//!
//! # Architecture
//!
//! ```text
//! producer ──submit──► [bounded queue] ──► worker thread ──► processors
//!    ▲                                          │
//!    └──────────── finish() ◄── reply(1) ◄──────┘
//! ```
//!
//! A [`Pipeline`] is configured with a geometry and an ordered processor set,
//! then [`Pipeline::start`] moves both into the worker thread and hands back a
//! [`PipelineHandle`]. The producer blocks when the queue is full. The worker
//! posts the processor set back exactly once, finalized or aborted.
//!
//! # Example
//!
//! ```
//! use alazar_stream::pipeline::{Pipeline, PipelineSettings};
//! use alazar_stream::processor::StreamingAverage;
//! use alazar_stream::{AcquisitionGeometry, RawBuffer, SampleWidth};
//!
//! let geometry = AcquisitionGeometry::new(4, 4, 2, 1, SampleWidth::U8).unwrap();
//! let pipeline = Pipeline::<u8>::new(
//!     geometry,
//!     vec![StreamingAverage::new().into()],
//!     PipelineSettings::default(),
//! )
//! .unwrap();
//!
//! let mut handle = pipeline.start().unwrap();
//! handle.submit(RawBuffer::new((0..8).collect())).unwrap();
//! handle.submit(RawBuffer::new((8..16).collect())).unwrap();
//! let processors = handle.finish().unwrap();
//!
//! let average = processors[0].as_average().unwrap().get_result().unwrap();
//! assert_eq!(average[0].to_vec(), vec![6.0, 7.0, 8.0, 9.0]);
//! ```

pub mod bridge;
pub mod executor;
pub mod message;

pub use bridge::PipelineHandle;
pub use executor::{Worker, PRODUCER_DISCONNECTED};
pub use message::PipelineMessage;

use crate::error::{ConfigurationError, Result};
use crate::geometry::AcquisitionGeometry;
use crate::processor::Processor;
use crate::types::Sample;
use crossbeam_channel::bounded;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default buffer queue depth.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Default per-buffer wait, in milliseconds.
pub const DEFAULT_BUFFER_TIMEOUT_MS: u64 = 5000;

/// Queue and timing settings for a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Buffers that may wait in the queue before the producer blocks
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// How long a producer waits on the source for each buffer
    #[serde(default = "default_buffer_timeout_ms")]
    pub buffer_timeout_ms: u64,
}

fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

fn default_buffer_timeout_ms() -> u64 {
    DEFAULT_BUFFER_TIMEOUT_MS
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            buffer_timeout_ms: DEFAULT_BUFFER_TIMEOUT_MS,
        }
    }
}

impl PipelineSettings {
    pub fn buffer_timeout(&self) -> Duration {
        Duration::from_millis(self.buffer_timeout_ms)
    }
}

/// A configured, not yet running pipeline.
pub struct Pipeline<S: Sample> {
    geometry: AcquisitionGeometry,
    processors: Vec<Processor<S>>,
    settings: PipelineSettings,
}

impl<S: Sample> Pipeline<S> {
    /// Register the geometry and processor set for one acquisition.
    ///
    /// Processors run in the order given.
    pub fn new(
        geometry: AcquisitionGeometry,
        processors: Vec<Processor<S>>,
        settings: PipelineSettings,
    ) -> std::result::Result<Self, ConfigurationError> {
        if geometry.sample_width() != S::WIDTH {
            return Err(ConfigurationError::SampleWidthMismatch {
                expected: geometry.sample_width(),
                actual: S::WIDTH,
            });
        }
        if settings.queue_capacity == 0 {
            return Err(ConfigurationError::ZeroQueueCapacity);
        }
        Ok(Self {
            geometry,
            processors,
            settings,
        })
    }

    pub fn geometry(&self) -> &AcquisitionGeometry {
        &self.geometry
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn processor_names(&self) -> Vec<&str> {
        self.processors.iter().map(|p| p.name()).collect()
    }

    /// Spawn the worker and return the producer handle.
    pub fn start(self) -> Result<PipelineHandle<S>> {
        let Pipeline {
            geometry,
            processors,
            settings,
        } = self;
        let (data_tx, data_rx) = bounded(settings.queue_capacity);
        let (reply_tx, reply_rx) = bounded(1);

        let worker = Worker::new(geometry, processors, data_rx, reply_tx);
        let join = std::thread::Builder::new()
            .name("alazar-pipeline".to_string())
            .spawn(move || worker.run())?;

        Ok(PipelineHandle::new(geometry, data_tx, reply_rx, join))
    }
}

impl<S: Sample> std::fmt::Debug for Pipeline<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("geometry", &self.geometry)
            .field("processors", &self.processor_names())
            .field("settings", &self.settings)
            .finish()
    }
}
