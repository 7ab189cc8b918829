//! alazar-stream demo - Main Entry Point
//!
//! Runs one acquisition against a mock digitizer and logs per-channel
//! statistics of every processor's result.
//!
//! ```text
//! alazar-stream [CONFIG.toml | CONFIG.json]
//! ```

use alazar_stream::{
    acquire::Acquisition,
    config::AcquisitionConfig,
    source::MockDigitizer,
    AcquisitionReport, ProcessorOutput, Sample, SampleWidth,
};
use anyhow::Context;
use ndarray::{ArrayBase, Data, Dimension};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,alazar_stream=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting alazar-stream demo acquisition");

    let config = match std::env::args().nth(1) {
        Some(path) => AcquisitionConfig::load(&path)
            .with_context(|| format!("Failed to load config from {path}"))?,
        None => {
            tracing::info!("No config file given, using defaults");
            AcquisitionConfig::default()
        }
    };
    config.validate().context("Invalid acquisition config")?;

    match config.geometry.sample_width() {
        SampleWidth::U8 => run::<u8>(&config),
        SampleWidth::U16 => run::<u16>(&config),
    }
}

fn run<S: Sample>(config: &AcquisitionConfig) -> anyhow::Result<()> {
    let processors = config
        .build_processors::<S>()
        .context("Failed to build processors")?;
    let mut board =
        MockDigitizer::<S>::for_board(config.mock.board, config.geometry, config.mock.pattern)
            .context("Failed to create mock board")?;
    tracing::info!(
        "Mock {} ({}-bit), pattern {:?}",
        config.mock.board,
        config.mock.board.bits_per_sample(),
        config.mock.pattern
    );

    let report = Acquisition::new(config.geometry, config.pipeline)
        .with_processors(processors)
        .run(&mut board)
        .context("Acquisition failed")?;

    log_report(&report);
    Ok(())
}

fn log_report<S: Sample>(report: &AcquisitionReport<S>) {
    tracing::info!(
        "Acquisition started {} took {:.1?}, {} buffer(s) submitted",
        report.started_at.format("%Y-%m-%d %H:%M:%S%.3f UTC"),
        report.elapsed,
        report.buffers_submitted
    );
    if let Err(e) = report.ensure_complete() {
        tracing::warn!("{}", e);
    }

    for processor in &report.processors {
        let name = processor.name();
        match processor.get_result() {
            Ok(ProcessorOutput::Raw(channels)) => {
                for (i, chan) in channels.iter().enumerate() {
                    log_stats(name, i, chan.mapv(|v| v.widen() as f64));
                }
            }
            Ok(ProcessorOutput::Average(channels)) => {
                for (i, chan) in channels.iter().enumerate() {
                    log_stats(name, i, chan.view());
                }
            }
            Ok(ProcessorOutput::Grouped(channels)) | Ok(ProcessorOutput::Chunked(channels)) => {
                for (i, chan) in channels.iter().enumerate() {
                    log_stats(name, i, chan.view());
                }
            }
            Ok(ProcessorOutput::Empty) => tracing::info!("{}: no data", name),
            Err(e) => tracing::warn!("{}: {}", name, e),
        }
    }
}

fn log_stats<A, D>(name: &str, channel: usize, data: ArrayBase<A, D>)
where
    A: Data<Elem = f64>,
    D: Dimension,
{
    let min = data.iter().copied().fold(f64::INFINITY, f64::min);
    let max = data.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean = data.mean().unwrap_or(f64::NAN);
    tracing::info!(
        "{} ch{}: shape {:?}, min {:.3}, max {:.3}, mean {:.3}",
        name,
        channel,
        data.shape(),
        min,
        max,
        mean
    );
}
