//! Processor lifecycle bookkeeping shared by every built-in processor.
//!
//! [`Lifecycle`] owns the [`ErrorLatch`], the current [`ProcessorState`], and
//! the geometry of the running acquisition. Processors call into it at the top
//! of each hook so that guard logic (latched, not initialized, index out of
//! range, wrong view shape, incomplete acquisition) lives in one place.

use crate::buffer::ChannelView;
use crate::error::{BoundsError, FaultCause, ProcessingError};
use crate::geometry::AcquisitionGeometry;
use std::fmt;

/// Lifecycle state of a processor.
///
/// ```text
/// Created --initialize--> Ready --process*--> Ready --post_process--> Finalized
///    any state --abort / latched fault--> Aborted   (until next initialize)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessorState {
    Created,
    Ready,
    Finalized,
    Aborted,
}

impl fmt::Display for ProcessorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProcessorState::Created => "created",
            ProcessorState::Ready => "ready",
            ProcessorState::Finalized => "finalized",
            ProcessorState::Aborted => "aborted",
        };
        f.write_str(s)
    }
}

/// First-error-wins cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorLatch {
    cause: Option<FaultCause>,
}

impl ErrorLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `cause` unless a cause is already stored. Returns `true` if this
    /// call set the latch.
    pub fn latch(&mut self, cause: FaultCause) -> bool {
        if self.cause.is_some() {
            return false;
        }
        self.cause = Some(cause);
        true
    }

    #[inline]
    pub fn is_set(&self) -> bool {
        self.cause.is_some()
    }

    pub fn cause(&self) -> Option<&FaultCause> {
        self.cause.as_ref()
    }

    /// `Err` wrapping the stored cause, if any.
    pub fn check(&self) -> Result<(), ProcessingError> {
        match &self.cause {
            Some(cause) => Err(ProcessingError::new(cause.clone())),
            None => Ok(()),
        }
    }

    pub fn clear(&mut self) {
        self.cause = None;
    }
}

/// State, latch, and geometry of one processor.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    name: &'static str,
    state: ProcessorState,
    latch: ErrorLatch,
    geometry: Option<AcquisitionGeometry>,
    buffers_processed: usize,
}

impl Lifecycle {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            state: ProcessorState::Created,
            latch: ErrorLatch::new(),
            geometry: None,
            buffers_processed: 0,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn state(&self) -> ProcessorState {
        if self.latch.is_set() {
            ProcessorState::Aborted
        } else {
            self.state
        }
    }

    pub fn latch(&self) -> &ErrorLatch {
        &self.latch
    }

    pub fn geometry(&self) -> Option<&AcquisitionGeometry> {
        self.geometry.as_ref()
    }

    /// Number of buffers accepted since the last `begin`.
    pub fn buffers_processed(&self) -> usize {
        self.buffers_processed
    }

    /// Reset for a new acquisition. Clears the latch.
    pub fn begin(&mut self, geometry: &AcquisitionGeometry) {
        self.latch.clear();
        self.geometry = Some(*geometry);
        self.buffers_processed = 0;
        self.state = ProcessorState::Ready;
    }

    /// Latch `cause` (first cause wins) and move to `Aborted`.
    pub fn fail(&mut self, cause: FaultCause) {
        if self.latch.latch(cause) {
            if let Some(cause) = self.latch.cause() {
                tracing::warn!("Processor '{}' latched: {}", self.name, cause);
            }
        }
        self.state = ProcessorState::Aborted;
    }

    /// Gate a `process` call. Returns the geometry when the processor should
    /// accumulate this buffer; latches and returns `None` otherwise.
    pub fn admit<S>(
        &mut self,
        channels: &[ChannelView<'_, S>],
        buffer_index: usize,
    ) -> Option<AcquisitionGeometry> {
        if self.latch.is_set() {
            return None;
        }
        let geometry = match (self.state, self.geometry) {
            (ProcessorState::Ready, Some(g)) => g,
            (ProcessorState::Finalized, _) => {
                self.fail(FaultCause::Fault(format!(
                    "buffer {buffer_index} received after post_process"
                )));
                return None;
            }
            _ => {
                self.fail(FaultCause::Fault(format!(
                    "buffer {buffer_index} received before initialize"
                )));
                return None;
            }
        };

        if buffer_index >= geometry.buffers_per_acquisition() {
            self.fail(
                BoundsError::BufferIndex {
                    index: buffer_index,
                    buffers_per_acquisition: geometry.buffers_per_acquisition(),
                }
                .into(),
            );
            return None;
        }
        if channels.len() != geometry.channel_count() {
            self.fail(
                BoundsError::ChannelCount {
                    expected: geometry.channel_count(),
                    actual: channels.len(),
                }
                .into(),
            );
            return None;
        }
        if let Some(view) = channels.iter().find(|v| v.dim() != geometry.view_shape()) {
            self.fail(
                BoundsError::ViewShape {
                    expected: geometry.view_shape(),
                    actual: view.dim(),
                }
                .into(),
            );
            return None;
        }

        Some(geometry)
    }

    /// Record the outcome of an admitted `process` call.
    pub fn complete(&mut self, outcome: Result<(), FaultCause>) {
        match outcome {
            Ok(()) => self.buffers_processed += 1,
            Err(cause) => self.fail(cause),
        }
    }

    /// Gate a `post_process` call. Returns the geometry when the processor
    /// should finalize; latches and returns `None` otherwise.
    pub fn admit_finalize(&mut self) -> Option<AcquisitionGeometry> {
        if self.latch.is_set() {
            return None;
        }
        let geometry = match (self.state, self.geometry) {
            (ProcessorState::Ready, Some(g)) => g,
            // Already finalized: nothing left to do.
            (ProcessorState::Finalized, _) => return None,
            _ => {
                self.fail(FaultCause::Fault(
                    "post_process called before initialize".to_string(),
                ));
                return None;
            }
        };

        let expected = geometry.buffers_per_acquisition();
        if self.buffers_processed != expected {
            self.fail(FaultCause::Incomplete {
                expected,
                received: self.buffers_processed,
            });
            return None;
        }
        Some(geometry)
    }

    pub fn finish(&mut self) {
        if !self.latch.is_set() {
            self.state = ProcessorState::Finalized;
        }
    }

    /// `Ok` only when a finalized, unlatched result is available.
    pub fn result_gate(&self) -> Result<(), ProcessingError> {
        self.latch.check()?;
        match self.state {
            ProcessorState::Finalized => Ok(()),
            other => Err(ProcessingError::new(FaultCause::NotFinalized(other))),
        }
    }
}
