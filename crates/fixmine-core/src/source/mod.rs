/*!
# Diff Sources

The tree differencer is an external collaborator. An [`AstDiffSource`]
turns one file on disk into a [`FileDiff`]; the [`DatasetCrawler`] walks a
dataset of projects and asks a source for every file it accepts.
*/

pub mod crawler;

use std::fs;
use std::path::{Path, PathBuf};

use crate::ast::FileDiff;

pub use crawler::{DatasetCrawler, Project};

/// Diff source errors
#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    /// The diff names nodes that do not exist or has broken tree links
    #[error("Malformed diff {}: {reason}", .path.display())]
    MalformedDiff { path: PathBuf, reason: String },

    /// The file could not be read
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not a valid diff document
    #[error("Failed to decode {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The dataset root is missing or not a directory
    #[error("Dataset root does not exist: {}", .path.display())]
    MissingRoot { path: PathBuf },
}

/// Produces edit scripts for compared file pairs
pub trait AstDiffSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether `path` holds something this source can load
    fn accepts(&self, path: &Path) -> bool;

    /// Load and validate one diff
    fn load(&self, path: &Path) -> Result<FileDiff, SourceError>;
}

/// Reads [`FileDiff`] documents serialized as JSON
pub struct JsonDiffSource {
    suffix: String,
}

impl JsonDiffSource {
    pub const DEFAULT_SUFFIX: &'static str = ".diff.json";

    pub fn new() -> Self {
        Self {
            suffix: Self::DEFAULT_SUFFIX.to_string(),
        }
    }

    /// Set the file-name suffix identifying diff documents
    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }
}

impl Default for JsonDiffSource {
    fn default() -> Self {
        Self::new()
    }
}

impl AstDiffSource for JsonDiffSource {
    fn name(&self) -> &'static str {
        "json"
    }

    fn accepts(&self, path: &Path) -> bool {
        path.file_name()
            .map(|name| name.to_string_lossy().to_lowercase().ends_with(&self.suffix.to_lowercase()))
            .unwrap_or(false)
    }

    fn load(&self, path: &Path) -> Result<FileDiff, SourceError> {
        let content = fs::read_to_string(path).map_err(|source| SourceError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut diff: FileDiff = serde_json::from_str(&content).map_err(|source| SourceError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        if diff.path.as_os_str().is_empty() {
            diff.path = path.to_path_buf();
        }
        diff.validate()?;
        Ok(diff)
    }
}
