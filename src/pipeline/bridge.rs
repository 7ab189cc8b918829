//! Thread boundary between the producer and the pipeline worker.
//!
//! [`PipelineHandle`] is the producer's side of a running pipeline. It owns
//! the sending end of the bounded buffer queue and the receiving end of the
//! one-shot reply channel, and it enforces the producer contract before
//! anything reaches the worker.

use crate::buffer::RawBuffer;
use crate::error::{AcquisitionAbortedError, Error, Result};
use crate::geometry::AcquisitionGeometry;
use crate::pipeline::message::PipelineMessage;
use crate::processor::Processor;
use crate::types::Sample;
use crossbeam_channel::{Receiver, Sender};
use std::thread::JoinHandle;

/// Producer-side handle for one running acquisition.
///
/// Dropping the handle before the stream is complete makes the worker abort
/// every processor with "producer disconnected".
pub struct PipelineHandle<S: Sample> {
    geometry: AcquisitionGeometry,
    data_tx: Option<Sender<PipelineMessage<S>>>,
    reply_rx: Receiver<Vec<Processor<S>>>,
    worker: Option<JoinHandle<()>>,
    next_index: usize,
    errored: bool,
}

impl<S: Sample> PipelineHandle<S> {
    pub(crate) fn new(
        geometry: AcquisitionGeometry,
        data_tx: Sender<PipelineMessage<S>>,
        reply_rx: Receiver<Vec<Processor<S>>>,
        worker: JoinHandle<()>,
    ) -> Self {
        Self {
            geometry,
            data_tx: Some(data_tx),
            reply_rx,
            worker: Some(worker),
            next_index: 0,
            errored: false,
        }
    }

    pub fn geometry(&self) -> &AcquisitionGeometry {
        &self.geometry
    }

    /// Number of buffers accepted so far.
    pub fn submitted(&self) -> usize {
        self.next_index
    }

    /// Buffers still owed before the stream is complete.
    pub fn remaining(&self) -> usize {
        self.geometry.buffers_per_acquisition() - self.next_index
    }

    pub fn is_errored(&self) -> bool {
        self.errored
    }

    /// Enqueue the next buffer. Blocks while the queue is full.
    ///
    /// The buffer index is assigned here, in submission order. A buffer of
    /// the wrong length is rejected without being enqueued.
    pub fn submit(&mut self, buffer: RawBuffer<S>) -> Result<()> {
        if self.errored {
            return Err(Error::Protocol(
                "buffer submitted after the acquisition was aborted".to_string(),
            ));
        }
        let expected = self.geometry.buffers_per_acquisition();
        if self.next_index >= expected {
            return Err(Error::Protocol(format!(
                "acquisition already received all {expected} buffer(s)"
            )));
        }
        buffer.validate(&self.geometry)?;

        let index = self.next_index;
        self.send(PipelineMessage::Data { index, buffer })?;
        self.next_index += 1;
        tracing::trace!("Submitted buffer {}", index);
        Ok(())
    }

    /// Enqueue the terminal error. At most one per acquisition, and only
    /// while the stream is incomplete.
    pub fn submit_error(&mut self, cause: AcquisitionAbortedError) -> Result<()> {
        if self.errored {
            return Err(Error::Protocol("error already submitted".to_string()));
        }
        if self.next_index >= self.geometry.buffers_per_acquisition() {
            return Err(Error::Protocol(
                "error submitted after the final buffer".to_string(),
            ));
        }
        self.errored = true;
        tracing::debug!("Submitting abort after {} buffer(s): {}", self.next_index, cause);
        self.send(PipelineMessage::Error(cause))
    }

    /// Close the stream and wait for the processor set.
    ///
    /// An incomplete stream with no error is aborted here before waiting.
    pub fn finish(mut self) -> Result<Vec<Processor<S>>> {
        if !self.errored && self.remaining() > 0 {
            let cause = AcquisitionAbortedError::new(format!(
                "producer finished after {} of {} buffer(s)",
                self.next_index,
                self.geometry.buffers_per_acquisition()
            ));
            tracing::warn!("{}", cause);
            self.errored = true;
            // The worker may already have stopped; the reply still arrives.
            let _ = self.send(PipelineMessage::Error(cause));
        }
        self.data_tx = None;

        let processors = self.reply_rx.recv().map_err(|_| Error::WorkerLost)?;
        if let Some(worker) = self.worker.take() {
            worker.join().map_err(|_| Error::WorkerLost)?;
        }
        Ok(processors)
    }

    fn send(&self, message: PipelineMessage<S>) -> Result<()> {
        let tx = self.data_tx.as_ref().ok_or(Error::PipelineClosed)?;
        tx.send(message).map_err(|_| Error::PipelineClosed)
    }
}

impl<S: Sample> std::fmt::Debug for PipelineHandle<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineHandle")
            .field("submitted", &self.next_index)
            .field("errored", &self.errored)
            .finish()
    }
}
