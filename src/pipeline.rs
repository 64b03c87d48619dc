//! The regeneration run: clear old documents, load the bibliography, write
//! one document per entry.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::bibtex::{load_bibliography, BibtexError, Entry};
use crate::document::{find_image, render_document};
use crate::fields::sanitize_citekey;
use crate::layout::{Category, DOCUMENT_EXTENSION};
use crate::sink::{FsSink, OutputSink, SinkError};

pub const DEFAULT_BIBLIOGRAPHY: &str = "_bibliography/my-papers.bib";
pub const DEFAULT_IMAGE_DIR: &str = "_assets/img/pubs";
pub const DEFAULT_TEMPLATE: &str = "solana";

/// Settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Bibliography file to read
    pub bibliography: PathBuf,
    /// Site root the `publications/` tree lives under
    pub output_root: PathBuf,
    /// Image directory, relative to the site root
    pub image_dir: PathBuf,
    /// Quarto `about` template name
    pub about_template: String,
    /// Record per-entry write failures instead of aborting
    pub keep_going: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bibliography: PathBuf::from(DEFAULT_BIBLIOGRAPHY),
            output_root: PathBuf::from("."),
            image_dir: PathBuf::from(DEFAULT_IMAGE_DIR),
            about_template: DEFAULT_TEMPLATE.to_string(),
            keep_going: false,
        }
    }
}

/// Errors that abort a run.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("cleanup failed: {0}")]
    Cleanup(#[source] SinkError),

    #[error("{0}")]
    Bibliography(#[from] BibtexError),

    #[error("entry '{key}': {source}")]
    Write { key: String, source: SinkError },
}

/// An entry whose document could not be written (with `keep_going`).
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FailedEntry {
    pub key: String,
    pub path: PathBuf,
    pub error: String,
}

/// What a run did.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct RunSummary {
    /// Documents deleted during cleanup
    pub removed: usize,
    /// Documents written, in entry order (a collided path appears twice)
    pub written: Vec<PathBuf>,
    pub failed: Vec<FailedEntry>,
}

/// Runs against the filesystem under `config.output_root`.
pub fn run(config: &Config) -> Result<RunSummary, RunError> {
    let mut sink = FsSink::new(&config.output_root);
    run_with_sink(config, &mut sink)
}

/// Clears old documents, then loads the bibliography and writes its entries.
///
/// Cleanup happens before loading, so a bibliography that fails to parse
/// leaves the output directories empty.
pub fn run_with_sink<S: OutputSink + ?Sized>(
    config: &Config,
    sink: &mut S,
) -> Result<RunSummary, RunError> {
    info!(bibliography = %config.bibliography.display(), "regenerating publications");

    let removed = clear_outputs(sink).map_err(RunError::Cleanup)?;
    let entries = load_bibliography(&config.bibliography)?;

    let mut summary = write_entries(config, sink, &entries)?;
    summary.removed = removed;

    info!(
        removed = summary.removed,
        written = summary.written.len(),
        failed = summary.failed.len(),
        "publications regenerated"
    );
    Ok(summary)
}

/// Deletes the generated documents in every category directory.
pub fn clear_outputs<S: OutputSink + ?Sized>(sink: &mut S) -> Result<usize, SinkError> {
    let mut removed = 0;
    for category in Category::ALL {
        removed += sink.clear(Path::new(category.dir()), DOCUMENT_EXTENSION)?;
    }
    Ok(removed)
}

/// Writes one document per entry, in order. Later entries overwrite
/// earlier ones that map to the same path.
pub fn write_entries<S: OutputSink + ?Sized>(
    config: &Config,
    sink: &mut S,
    entries: &[Entry],
) -> Result<RunSummary, RunError> {
    let mut summary = RunSummary::default();
    let mut seen = HashSet::new();

    for entry in entries {
        let id = sanitize_citekey(&entry.key);
        let path = Category::classify(&entry.entry_type).document_path(&id);

        if !seen.insert(path.clone()) {
            debug!(key = %entry.key, path = %path.display(), "overwriting document from an earlier entry");
        }

        let image = find_image(&*sink, &config.image_dir, &id);
        let document = render_document(entry, image.as_deref(), &config.about_template);

        match sink.write(&path, &document) {
            Ok(()) => {
                debug!(key = %entry.key, path = %path.display(), "document written");
                summary.written.push(path);
            }
            Err(e) if config.keep_going => {
                warn!(key = %entry.key, error = %e, "skipping entry");
                summary.failed.push(FailedEntry {
                    key: entry.key.clone(),
                    path,
                    error: e.to_string(),
                });
            }
            Err(source) => {
                return Err(RunError::Write {
                    key: entry.key.clone(),
                    source,
                })
            }
        }
    }

    Ok(summary)
}
