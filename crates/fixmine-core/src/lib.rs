//! # Fixmine Core
//!
//! Mines recurring bug-fix idioms from the edit scripts of fixing commits:
//! - AST arena and edit operations produced by an external tree differencer
//! - Classifier chain mapping each edit to a base rule
//! - Specializers refining base rules into mutation-operator idioms
//! - Fan-out pipeline feeding a record serializer and a statistics renderer
//!
//! The CLI in `fixmine-cli` is a thin driver over [`Miner`] and
//! [`DatasetCrawler`].

#![warn(clippy::all)]

pub mod ast;
pub mod classifier;
pub mod miner;
pub mod pipeline;
pub mod rules;
pub mod source;
pub mod specialize;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

// Re-export commonly used types
pub use ast::{AstTree, Edit, EditKind, EditOperation, FileDiff, NodeId, NodeKind, NodeRef};
pub use classifier::{Classifier, ClassifierChain};
pub use miner::{MineStats, MineSummary, Miner};
pub use pipeline::{
    Compression, Consumer, ConsumerReport, FanOut, PipelineError, RecordReader, RecordSerializer,
    StatisticsRenderer,
};
pub use rules::{ClassifiedRecord, Rule, RuleTier};
pub use source::{AstDiffSource, DatasetCrawler, JsonDiffSource, SourceError};
pub use specialize::{Specialization, Specializer};

/// Fixmine version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize tracing for the miner components
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("fixmine_core=info"));
    // A subscriber may already be installed by an embedding binary or a test.
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Miner run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinerConfig {
    /// Directory holding one subdirectory per project
    pub dataset_root: PathBuf,
    /// Directory receiving the record log and the summary tables
    pub output_dir: PathBuf,
    /// File name of the raw record log inside `output_dir`
    pub record_log: String,
    pub compression: Compression,
    /// Emit specialized records next to their base records
    pub specialize: bool,
    /// File-name suffix of diff documents
    pub diff_suffix: String,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            dataset_root: "./dataset".into(),
            output_dir: "./fixmine-out".into(),
            record_log: "records.bin".to_string(),
            compression: Compression::None,
            specialize: true,
            diff_suffix: JsonDiffSource::DEFAULT_SUFFIX.to_string(),
        }
    }
}

impl MinerConfig {
    /// Load a configuration from a JSON document. Missing fields keep their
    /// defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| MinerError::Config(format!("cannot read {}: {e}", path.display())))?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Full path of the record log. A `.zst` extension is appended when the
    /// log is compressed and the name does not already carry one.
    pub fn record_log_path(&self) -> PathBuf {
        let mut name = self.record_log.clone();
        if self.compression.is_compressed() && !name.ends_with(".zst") {
            name.push_str(".zst");
        }
        self.output_dir.join(name)
    }

    pub fn validate(&self) -> Result<()> {
        if self.record_log.is_empty() {
            return Err(MinerError::Config("record log name is empty".to_string()));
        }
        if self.diff_suffix.is_empty() {
            return Err(MinerError::Config("diff suffix is empty".to_string()));
        }
        if let Compression::Zstd { level } = self.compression {
            if !(1..=22).contains(&level) {
                return Err(MinerError::Config(format!("zstd level {level} is out of range 1..=22")));
            }
        }
        Ok(())
    }

    /// Crawler over `dataset_root` reading JSON diffs with the configured
    /// suffix
    pub fn crawler(&self) -> Result<DatasetCrawler> {
        let source = JsonDiffSource::new().suffix(self.diff_suffix.clone());
        Ok(DatasetCrawler::new(&self.dataset_root, Arc::new(source))?)
    }

    /// Create the output directory and register the two standard consumers.
    /// The record log is opened here, so an unwritable destination fails
    /// before any mining starts.
    pub fn pipeline(&self) -> Result<FanOut> {
        std::fs::create_dir_all(&self.output_dir)?;

        let mut fanout = FanOut::new();
        fanout.register(RecordSerializer::create(self.record_log_path(), self.compression)?)?;
        fanout.register(StatisticsRenderer::new(&self.output_dir))?;
        Ok(fanout)
    }

    /// Producer wired to the standard pipeline
    pub fn miner(&self) -> Result<Miner> {
        self.validate()?;
        Ok(Miner::new(self.pipeline()?).specialize(self.specialize))
    }
}

/// Error types for miner operations
#[derive(thiserror::Error, Debug)]
pub enum MinerError {
    /// Filesystem error outside of diff loading
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Diff source or dataset error
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Consumer or fan-out failure
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Record log encoding error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Configuration document error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for miner operations
pub type Result<T> = std::result::Result<T, MinerError>;
