//! Pipeline worker: the consumer end of the buffer queue.
//!
//! The worker runs on a dedicated thread. For one acquisition it:
//! 1. Initializes every processor.
//! 2. Dequeues buffers in submission order and checks each index.
//! 3. Reshapes each buffer into channel views and fans out to every processor.
//! 4. On an `Error` message (or a vanished producer) aborts every processor.
//! 5. Otherwise finalizes every processor after the last buffer.
//! 6. Posts the processor set back exactly once.

use crate::error::{AcquisitionAbortedError, FaultCause};
use crate::geometry::AcquisitionGeometry;
use crate::pipeline::message::PipelineMessage;
use crate::processor::Processor;
use crate::types::Sample;
use crossbeam_channel::{Receiver, Sender};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Instant;

/// Abort reason used when the producer handle disappears mid-stream.
pub const PRODUCER_DISCONNECTED: &str = "producer disconnected";

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
enum RunOutcome {
    Complete,
    Aborted,
}

/// Consumer side of one acquisition.
pub struct Worker<S: Sample> {
    geometry: AcquisitionGeometry,
    processors: Vec<Processor<S>>,
    data_rx: Receiver<PipelineMessage<S>>,
    reply_tx: Sender<Vec<Processor<S>>>,
}

impl<S: Sample> Worker<S> {
    pub fn new(
        geometry: AcquisitionGeometry,
        processors: Vec<Processor<S>>,
        data_rx: Receiver<PipelineMessage<S>>,
        reply_tx: Sender<Vec<Processor<S>>>,
    ) -> Self {
        Self {
            geometry,
            processors,
            data_rx,
            reply_tx,
        }
    }

    /// Consume the whole acquisition, then post the processor set.
    pub fn run(self) {
        let Worker {
            geometry,
            mut processors,
            data_rx,
            reply_tx,
        } = self;
        let started = Instant::now();
        tracing::info!(
            "Pipeline worker started: {} processor(s), {} buffer(s) expected",
            processors.len(),
            geometry.buffers_per_acquisition()
        );

        for processor in processors.iter_mut() {
            guarded(processor, "initialize", |p| p.initialize(&geometry));
        }

        let outcome = consume(&geometry, &mut processors, &data_rx);
        // Stop accepting buffers; blocked or later submits now fail.
        drop(data_rx);

        if outcome == RunOutcome::Complete {
            for processor in processors.iter_mut() {
                guarded(processor, "post_process", |p| p.post_process());
            }
        }

        tracing::info!(
            "Pipeline worker finished ({:?}) in {:.1?}",
            outcome,
            started.elapsed()
        );
        if reply_tx.send(processors).is_err() {
            tracing::debug!("Pipeline reply dropped: producer handle is gone");
        }
    }
}

fn consume<S: Sample>(
    geometry: &AcquisitionGeometry,
    processors: &mut [Processor<S>],
    data_rx: &Receiver<PipelineMessage<S>>,
) -> RunOutcome {
    let expected = geometry.buffers_per_acquisition();
    let mut received = 0;

    while received < expected {
        let message = match data_rx.recv() {
            Ok(message) => message,
            Err(_) => {
                tracing::warn!(
                    "Producer disconnected after {} of {} buffer(s)",
                    received,
                    expected
                );
                abort_all(
                    processors,
                    AcquisitionAbortedError::new(PRODUCER_DISCONNECTED).into(),
                );
                return RunOutcome::Aborted;
            }
        };

        match message {
            PipelineMessage::Data { index, buffer } => {
                if index != received {
                    tracing::warn!("Buffer {} arrived out of sequence (expected {})", index, received);
                    abort_all(
                        processors,
                        FaultCause::Fault(format!(
                            "buffer {index} arrived out of sequence, expected {received}"
                        )),
                    );
                    return RunOutcome::Aborted;
                }
                let views = match buffer.channels(geometry) {
                    Ok(views) => views,
                    Err(e) => {
                        tracing::warn!("Buffer {} rejected: {}", index, e);
                        abort_all(processors, e.into());
                        return RunOutcome::Aborted;
                    }
                };
                for processor in processors.iter_mut() {
                    guarded(processor, "process", |p| p.process(&views, index));
                }
                tracing::debug!("Buffer {}/{} processed", index + 1, expected);
                received += 1;
            }
            PipelineMessage::Error(cause) => {
                tracing::warn!("Acquisition aborted after {} buffer(s): {}", received, cause);
                abort_all(processors, cause.into());
                return RunOutcome::Aborted;
            }
        }
    }
    RunOutcome::Complete
}

fn abort_all<S: Sample>(processors: &mut [Processor<S>], cause: FaultCause) {
    for processor in processors.iter_mut() {
        let cause = cause.clone();
        guarded(processor, "abort", move |p| p.abort(cause));
    }
}

/// Run one processor hook, converting a panic into a latched fault on that
/// processor only.
fn guarded<S, F>(processor: &mut Processor<S>, stage: &str, f: F)
where
    S: Sample,
    F: FnOnce(&mut Processor<S>),
{
    let result = catch_unwind(AssertUnwindSafe(|| f(processor)));
    if let Err(payload) = result {
        let message = panic_message(payload.as_ref());
        tracing::error!(
            "Processor '{}' panicked during {}: {}",
            processor.name(),
            stage,
            message
        );
        let cause = FaultCause::Fault(format!("panicked during {stage}: {message}"));
        // A processor that panics again while aborting is left as is.
        let _ = catch_unwind(AssertUnwindSafe(|| processor.abort(cause)));
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
