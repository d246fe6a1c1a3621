/*!
# Dataset Crawler

Walks a dataset root laid out as one directory per project and loads every
diff document below each project directory.
*/

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use super::{AstDiffSource, SourceError};
use crate::ast::FileDiff;

/// One project directory of the dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    /// Directory name, used as the project id in every record
    pub id: String,
    pub path: PathBuf,
}

pub struct DatasetCrawler {
    root: PathBuf,
    source: Arc<dyn AstDiffSource>,
}

impl DatasetCrawler {
    pub fn new(root: impl Into<PathBuf>, source: Arc<dyn AstDiffSource>) -> Result<Self, SourceError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(SourceError::MissingRoot { path: root });
        }
        Ok(Self { root, source })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Immediate subdirectories of the root, sorted by name
    pub fn projects(&self) -> Result<Vec<Project>, SourceError> {
        let mut projects = Vec::new();
        for entry in read_dir(&self.root)? {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let id = entry.file_name().to_string_lossy().to_string();
            projects.push(Project { id, path });
        }
        projects.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(projects)
    }

    /// Every diff document accepted by the source below `project`, in path
    /// order. Documents that fail to load are logged and skipped.
    pub fn diffs(&self, project: &Project) -> Result<Vec<FileDiff>, SourceError> {
        let mut files = Vec::new();
        self.collect_files(&project.path, &mut files)?;
        files.sort();

        let mut diffs = Vec::with_capacity(files.len());
        for path in files {
            match self.source.load(&path) {
                Ok(diff) => {
                    debug!(project = %project.id, file = %path.display(), edits = diff.operations.len(), "diff loaded");
                    diffs.push(diff);
                }
                Err(e) => warn!(project = %project.id, "skipping diff: {e}"),
            }
        }
        Ok(diffs)
    }

    fn collect_files(&self, dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), SourceError> {
        for entry in read_dir(dir)? {
            let path = entry.path();
            if path.is_dir() {
                self.collect_files(&path, files)?;
            } else if self.source.accepts(&path) {
                files.push(path);
            }
        }
        Ok(())
    }
}

fn read_dir(dir: &Path) -> Result<Vec<fs::DirEntry>, SourceError> {
    let read_error = |source| SourceError::Read {
        path: dir.to_path_buf(),
        source,
    };
    fs::read_dir(dir)
        .map_err(read_error)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(read_error)
}
