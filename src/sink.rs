//! Where generated documents go.
//!
//! [`OutputSink`] is the only way the pipeline touches the output tree:
//! clearing previously generated documents, writing new ones, and probing
//! for image assets. [`FsSink`] works on a directory on disk,
//! [`MemorySink`] keeps everything in memory for tests.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

/// Errors raised by an output sink.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("invalid file pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        source: glob::PatternError,
    },

    #[error("failed to list generated files: {0}")]
    Glob(#[from] glob::GlobError),

    #[error("failed to remove '{}': {source}", .path.display())]
    Remove { path: PathBuf, source: io::Error },

    #[error("failed to create directory '{}': {source}", .path.display())]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("failed to write '{}': {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
}

/// Storage for generated documents. All paths are relative to the site root.
pub trait OutputSink {
    /// Deletes every `*.{extension}` file directly inside `dir`.
    ///
    /// Returns how many files were removed. Subdirectories and other files
    /// are left alone; a missing directory removes nothing.
    fn clear(&mut self, dir: &Path, extension: &str) -> Result<usize, SinkError>;

    /// Writes a whole document, creating parent directories as needed and
    /// replacing any existing file.
    fn write(&mut self, path: &Path, contents: &str) -> Result<(), SinkError>;

    /// Whether a file exists at `path`.
    fn exists(&self, path: &Path) -> bool;
}

/// Sink backed by the filesystem under a root directory.
#[derive(Debug, Clone)]
pub struct FsSink {
    root: PathBuf,
}

impl FsSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl OutputSink for FsSink {
    fn clear(&mut self, dir: &Path, extension: &str) -> Result<usize, SinkError> {
        let dir = self.root.join(dir);
        let pattern = format!(
            "{}/*.{}",
            glob::Pattern::escape(&dir.to_string_lossy()),
            extension
        );
        let paths = glob::glob(&pattern).map_err(|source| SinkError::Pattern {
            pattern: pattern.clone(),
            source,
        })?;

        let mut removed = 0;
        for path in paths {
            let path = path?;
            if !path.is_file() {
                continue;
            }
            fs::remove_file(&path).map_err(|source| SinkError::Remove {
                path: path.clone(),
                source,
            })?;
            debug!(path = %path.display(), "removed generated document");
            removed += 1;
        }
        Ok(removed)
    }

    fn write(&mut self, path: &Path, contents: &str) -> Result<(), SinkError> {
        let path = self.root.join(path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| SinkError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&path, contents).map_err(|source| SinkError::Write { path, source })
    }

    fn exists(&self, path: &Path) -> bool {
        self.root.join(path).is_file()
    }
}

/// In-memory sink.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    files: BTreeMap<PathBuf, String>,
    assets: BTreeSet<PathBuf>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a pre-existing document, as if left over from an earlier run.
    pub fn with_file(mut self, path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        self.files.insert(path.into(), contents.into());
        self
    }

    /// Adds an asset (e.g. an image) that `exists` should report.
    pub fn with_asset(mut self, path: impl Into<PathBuf>) -> Self {
        self.assets.insert(path.into());
        self
    }

    pub fn files(&self) -> &BTreeMap<PathBuf, String> {
        &self.files
    }

    pub fn get(&self, path: impl AsRef<Path>) -> Option<&str> {
        self.files.get(path.as_ref()).map(String::as_str)
    }
}

impl OutputSink for MemorySink {
    fn clear(&mut self, dir: &Path, extension: &str) -> Result<usize, SinkError> {
        let before = self.files.len();
        self.files.retain(|path, _| {
            !(path.parent() == Some(dir)
                && path.extension().is_some_and(|ext| ext == extension))
        });
        Ok(before - self.files.len())
    }

    fn write(&mut self, path: &Path, contents: &str) -> Result<(), SinkError> {
        self.files.insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path) || self.assets.contains(path)
    }
}
