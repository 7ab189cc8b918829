//! Configuration module for alazar-stream
//!
//! An [`AcquisitionConfig`] holds everything needed to reproduce a run:
//! the acquisition geometry, pipeline settings, the processors to attach,
//! and the mock board to drive when no hardware is present.
//!
//! # Formats
//!
//! Files ending in `.toml` are read and written as TOML; anything else is
//! treated as JSON.
//!
//! # Example
//!
//! ```toml
//! [geometry]
//! samples_per_record = 1024
//! records_per_acquisition = 128
//! records_per_buffer = 64
//! channel_count = 2
//! sample_width = "u8"
//!
//! [pipeline]
//! queue_capacity = 64
//! buffer_timeout_ms = 5000
//!
//! [[processors]]
//! kind = "raw"
//!
//! [[processors]]
//! kind = "average_n"
//! n = 2
//! ```

use crate::error::{ConfigurationError, Error, Result};
use crate::geometry::AcquisitionGeometry;
use crate::pipeline::PipelineSettings;
use crate::processor::{GroupedAverage, Processor, RawCapture, StreamingAverage, WindowedChunk};
use crate::source::MockPattern;
use crate::types::{BoardModel, Sample};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Processor selection, as written in a config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProcessorSpec {
    Raw,
    Average,
    AverageN { n: usize },
    Chunk { n: usize, start: usize, stop: usize },
}

impl ProcessorSpec {
    /// Construct the processor this spec describes.
    pub fn build<S: Sample>(&self) -> std::result::Result<Processor<S>, ConfigurationError> {
        Ok(match *self {
            ProcessorSpec::Raw => RawCapture::new().into(),
            ProcessorSpec::Average => StreamingAverage::new().into(),
            ProcessorSpec::AverageN { n } => GroupedAverage::new(n)?.into(),
            ProcessorSpec::Chunk { n, start, stop } => WindowedChunk::new(n, start, stop)?.into(),
        })
    }
}

/// Mock board used by the demo binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockBoardConfig {
    #[serde(default = "default_board")]
    pub board: BoardModel,
    #[serde(default)]
    pub pattern: MockPattern,
}

fn default_board() -> BoardModel {
    BoardModel::Ats9870
}

impl Default for MockBoardConfig {
    fn default() -> Self {
        Self {
            board: default_board(),
            pattern: MockPattern::default(),
        }
    }
}

/// Complete description of one acquisition run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcquisitionConfig {
    pub geometry: AcquisitionGeometry,

    #[serde(default)]
    pub pipeline: PipelineSettings,

    /// Processors in the order they will run
    #[serde(default = "AcquisitionConfig::default_processors")]
    pub processors: Vec<ProcessorSpec>,

    #[serde(default)]
    pub mock: MockBoardConfig,
}

impl AcquisitionConfig {
    pub fn new(geometry: AcquisitionGeometry) -> Self {
        Self {
            geometry,
            pipeline: PipelineSettings::default(),
            processors: Self::default_processors(),
            mock: MockBoardConfig::default(),
        }
    }

    /// A fresh `[raw, average]` list on every call.
    pub fn default_processors() -> Vec<ProcessorSpec> {
        vec![ProcessorSpec::Raw, ProcessorSpec::Average]
    }

    /// Build every configured processor, in order.
    pub fn build_processors<S: Sample>(
        &self,
    ) -> std::result::Result<Vec<Processor<S>>, ConfigurationError> {
        self.processors.iter().map(ProcessorSpec::build).collect()
    }

    /// Check that the mock board stores samples at the geometry's width.
    pub fn validate(&self) -> std::result::Result<(), ConfigurationError> {
        let board_width = self.mock.board.sample_width();
        if board_width != self.geometry.sample_width() {
            return Err(ConfigurationError::SampleWidthMismatch {
                expected: board_width,
                actual: self.geometry.sample_width(),
            });
        }
        if self.pipeline.queue_capacity == 0 {
            return Err(ConfigurationError::ZeroQueueCapacity);
        }
        Ok(())
    }

    /// Load a config file; the format follows the file extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        let config: Self = if is_toml(path) {
            toml::from_str(&content).map_err(|e| {
                Error::Config(format!("Failed to parse config file {:?}: {}", path, e))
            })?
        } else {
            serde_json::from_str(&content).map_err(|e| {
                Error::Config(format!("Failed to parse config file {:?}: {}", path, e))
            })?
        };
        tracing::debug!("Loaded acquisition config from {:?}", path);
        Ok(config)
    }

    /// Save the config; the format follows the file extension.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = if is_toml(path) {
            toml::to_string_pretty(self).map_err(|e| Error::Serialization(e.to_string()))?
        } else {
            serde_json::to_string_pretty(self).map_err(|e| Error::Serialization(e.to_string()))?
        };
        std::fs::write(path, content)?;
        Ok(())
    }
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self::new(AcquisitionGeometry::default())
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"))
}
