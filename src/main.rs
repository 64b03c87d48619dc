//! CLI for bib2qmd - Regenerate Quarto publication pages from a BibTeX file.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Parser};
use tracing::info;

use bib2qmd::pipeline::{DEFAULT_BIBLIOGRAPHY, DEFAULT_IMAGE_DIR, DEFAULT_TEMPLATE};
use bib2qmd::{run, BibtexError, Config, RunError, RunSummary};

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

/// Regenerate Quarto publication pages from a BibTeX bibliography
#[derive(Parser)]
#[command(name = "bib2qmd")]
#[command(version)]
#[command(after_help = "\
Every run deletes the *.qmd files in publications/{article,conference,forthcoming,other}
and writes one page per bibliography entry.

Examples:
  bib2qmd
  bib2qmd --bib refs.bib --root site/
  RUST_LOG=debug bib2qmd --keep-going")]
struct Cli {
    /// BibTeX file to read (relative to the working directory)
    #[arg(short, long, default_value = DEFAULT_BIBLIOGRAPHY)]
    bib: PathBuf,

    /// Site root the publications/ directories are written under
    #[arg(short, long, default_value = ".")]
    root: PathBuf,

    /// Directory with <key>.png/.jpg/.jpeg images, relative to the site root
    #[arg(long, default_value = DEFAULT_IMAGE_DIR)]
    image_dir: PathBuf,

    /// Quarto about-page template
    #[arg(long, default_value = DEFAULT_TEMPLATE)]
    template: String,

    /// Keep writing other entries when one fails
    #[arg(long)]
    keep_going: bool,

    /// Print the run summary as JSON on stdout
    #[arg(long)]
    json: bool,

    /// More logging (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    fn config(&self) -> Config {
        Config {
            bibliography: self.bib.clone(),
            output_root: self.root.clone(),
            image_dir: self.image_dir.clone(),
            about_template: self.template.clone(),
            keep_going: self.keep_going,
        }
    }

    fn log_level(&self) -> &'static str {
        match (self.quiet, self.verbose) {
            (true, _) => "error",
            (false, 0) => "warn",
            (false, 1) => "info",
            (false, _) => "debug",
        }
    }
}

// ---------------------------------------------------------------------------
// AppError: semantic exit codes
// ---------------------------------------------------------------------------

enum AppError {
    /// Exit 10: bibliography file not found / unreadable
    BibFile(String),
    /// Exit 11: bibliography is not valid BibTeX
    BibSyntax(String),
    /// Exit 12: cannot clear or write output files
    Output(String),
    /// Exit 13: some entries failed under --keep-going
    Partial(usize),
}

impl AppError {
    fn exit_code(&self) -> i32 {
        match self {
            AppError::BibFile(_) => 10,
            AppError::BibSyntax(_) => 11,
            AppError::Output(_) => 12,
            AppError::Partial(_) => 13,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::BibFile(msg) => {
                write!(
                    f,
                    "{}\n  hint: pass the bibliography with --bib, or run from the site root",
                    msg
                )
            }
            AppError::BibSyntax(msg) => {
                write!(
                    f,
                    "{}\n  hint: the publications/ directories were already cleared; fix the file and run again",
                    msg
                )
            }
            AppError::Output(msg) => {
                write!(
                    f,
                    "{}\n  hint: check that the site root exists and is writable",
                    msg
                )
            }
            AppError::Partial(count) => {
                write!(
                    f,
                    "{} entr{} could not be written\n  hint: rerun with -v to see which",
                    count,
                    if *count == 1 { "y" } else { "ies" }
                )
            }
        }
    }
}

impl AppError {
    /// Maps a failed run to its exit category. `bibliography` names the
    /// file in read errors.
    fn from_run(e: RunError, bibliography: &Path) -> Self {
        match e {
            RunError::Bibliography(BibtexError::Io(_)) => {
                AppError::BibFile(format!("'{}': {}", bibliography.display(), e))
            }
            RunError::Bibliography(_) => AppError::BibSyntax(format!("bibliography: {}", e)),
            RunError::Cleanup(_) | RunError::Write { .. } => AppError::Output(e.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(cli.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = execute(&cli) {
        eprintln!("Error: {}", e);
        process::exit(e.exit_code());
    }
}

fn execute(cli: &Cli) -> Result<(), AppError> {
    let config = cli.config();
    let summary = run(&config).map_err(|e| AppError::from_run(e, &config.bibliography))?;

    report(cli, &summary);

    if summary.failed.is_empty() {
        Ok(())
    } else {
        Err(AppError::Partial(summary.failed.len()))
    }
}

fn report(cli: &Cli, summary: &RunSummary) {
    if cli.json {
        match serde_json::to_string_pretty(summary) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Error: cannot serialize summary: {}", e),
        }
        return;
    }

    info!(
        removed = summary.removed,
        written = summary.written.len(),
        "done"
    );
    for failed in &summary.failed {
        eprintln!("failed: {} ({}): {}", failed.key, failed.path.display(), failed.error);
    }
}
