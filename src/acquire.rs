//! Acquisition driver: pumps a [`BufferSource`] through a [`Pipeline`].
//!
//! The driver is the producer. It waits on the source for each buffer with
//! the configured timeout, submits it, and on any source failure submits a
//! single abort instead of the remaining buffers.

use crate::error::{AcquisitionAbortedError, Error, Result};
use crate::geometry::AcquisitionGeometry;
use crate::pipeline::{Pipeline, PipelineSettings};
use crate::processor::{Processor, ProcessorOutput};
use crate::source::BufferSource;
use crate::types::Sample;
use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};

/// Result of one acquisition run.
#[derive(Debug)]
pub struct AcquisitionReport<S: Sample> {
    /// The processor set, finalized or aborted
    pub processors: Vec<Processor<S>>,
    /// Buffers handed to the pipeline
    pub buffers_submitted: usize,
    /// Why the run was aborted, if it was
    pub aborted: Option<AcquisitionAbortedError>,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
}

impl<S: Sample> AcquisitionReport<S> {
    pub fn is_complete(&self) -> bool {
        self.aborted.is_none()
    }

    /// Find a processor by name.
    pub fn processor(&self, name: &str) -> Option<&Processor<S>> {
        self.processors.iter().find(|p| p.name() == name)
    }

    /// Result of the named processor, with a latched failure lifted into
    /// [`Error::Processing`]. `None` if no processor has that name.
    pub fn output(&self, name: &str) -> Option<Result<ProcessorOutput<'_, S>>> {
        self.processor(name)
            .map(|p| p.get_result().map_err(Error::from))
    }

    /// `Err(Error::Aborted)` carrying the abort cause if the run did not complete.
    pub fn ensure_complete(&self) -> Result<()> {
        match &self.aborted {
            Some(cause) => Err(cause.clone().into()),
            None => Ok(()),
        }
    }
}

/// One configured acquisition.
pub struct Acquisition<S: Sample> {
    geometry: AcquisitionGeometry,
    settings: PipelineSettings,
    processors: Vec<Processor<S>>,
}

impl<S: Sample> Acquisition<S> {
    pub fn new(geometry: AcquisitionGeometry, settings: PipelineSettings) -> Self {
        Self {
            geometry,
            settings,
            processors: Vec::new(),
        }
    }

    /// Append a processor; processors run in the order added.
    pub fn with_processor(mut self, processor: impl Into<Processor<S>>) -> Self {
        self.processors.push(processor.into());
        self
    }

    pub fn with_processors(mut self, processors: impl IntoIterator<Item = Processor<S>>) -> Self {
        self.processors.extend(processors);
        self
    }

    pub fn geometry(&self) -> &AcquisitionGeometry {
        &self.geometry
    }

    /// Run the acquisition to completion or abort.
    ///
    /// Source failures and buffers the pipeline rejects do not return `Err`:
    /// they abort the processors and are reported in
    /// [`AcquisitionReport::aborted`]. `Err` means the pipeline itself could
    /// not be built or its worker was lost.
    pub fn run(self, source: &mut dyn BufferSource<S>) -> Result<AcquisitionReport<S>> {
        let Acquisition {
            geometry,
            settings,
            processors,
        } = self;
        let started_at = Utc::now();
        let started = Instant::now();
        let timeout = settings.buffer_timeout();

        tracing::info!(
            "Starting acquisition: {} record(s) of {} sample(s), {} channel(s), {} buffer(s)",
            geometry.records_per_acquisition(),
            geometry.samples_per_record(),
            geometry.channel_count(),
            geometry.buffers_per_acquisition()
        );

        let mut handle = Pipeline::new(geometry, processors, settings)?.start()?;
        let mut aborted = None;

        for index in 0..geometry.buffers_per_acquisition() {
            let failure = match source.next_buffer(timeout) {
                Ok(buffer) => match handle.submit(buffer) {
                    Ok(()) => continue,
                    Err(e) => e,
                },
                Err(e) => Error::Source(e),
            };

            tracing::warn!("Buffer {} not delivered: {}", index, failure);
            let cause = AcquisitionAbortedError::new(failure.to_string());
            if let Err(e) = handle.submit_error(cause.clone()) {
                // The worker has already stopped; finish() still collects the reply.
                tracing::debug!("Abort not enqueued: {}", e);
            }
            aborted = Some(cause);
            break;
        }

        let buffers_submitted = handle.submitted();
        let processors = handle.finish()?;
        let elapsed = started.elapsed();
        tracing::info!(
            "Acquisition {} after {} buffer(s) in {:.1?}",
            if aborted.is_some() { "aborted" } else { "complete" },
            buffers_submitted,
            elapsed
        );

        Ok(AcquisitionReport {
            processors,
            buffers_submitted,
            aborted,
            started_at,
            elapsed,
        })
    }
}
