//! Buffer sources
//!
//! A [`BufferSource`] is whatever fills raw buffers on the producer side: a
//! DMA engine on real hardware, or one of the in-memory sources here.
//!
//! - [`MockDigitizer`] - Synthesizes device-shaped buffers from a pattern
//! - [`ManualSource`] - Replays a prepared queue of buffers

pub mod mock;

pub use mock::{MockDigitizer, MockPattern};

use crate::buffer::RawBuffer;
use crate::types::Sample;
use std::collections::VecDeque;
use std::time::Duration;
use thiserror::Error;

/// Failure to produce the next buffer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// No buffer became ready within the timeout
    #[error("no buffer ready within {ms} ms")]
    Timeout { ms: u64 },

    /// The device reported a failure
    #[error("device error: {0}")]
    Device(String),

    /// The source has no more buffers
    #[error("source exhausted")]
    Exhausted,
}

/// Anything that can yield raw buffers on demand.
pub trait BufferSource<S: Sample>: Send {
    /// Wait up to `timeout` for the next filled buffer.
    fn next_buffer(&mut self, timeout: Duration) -> Result<RawBuffer<S>, SourceError>;
}

/// In-memory source useful for tests and deterministic playback.
#[derive(Debug, Default)]
pub struct ManualSource<S> {
    queue: VecDeque<RawBuffer<S>>,
}

impl<S: Sample> ManualSource<S> {
    pub fn new(buffers: impl IntoIterator<Item = RawBuffer<S>>) -> Self {
        Self {
            queue: buffers.into_iter().collect(),
        }
    }

    pub fn push(&mut self, buffer: RawBuffer<S>) {
        self.queue.push_back(buffer);
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl<S: Sample> BufferSource<S> for ManualSource<S> {
    fn next_buffer(&mut self, _timeout: Duration) -> Result<RawBuffer<S>, SourceError> {
        self.queue.pop_front().ok_or(SourceError::Exhausted)
    }
}
