//! bib2qmd: turn a BibTeX bibliography into Quarto publication pages.
//!
//! This library provides functionality to:
//! - Parse BibTeX/BibLaTeX bibliographies
//! - Format titles, authors, dates and venues for YAML front matter
//! - Render one Quarto document per entry
//! - Regenerate the `publications/` tree, clearing stale documents first

pub mod author;
pub mod bibtex;
pub mod document;
pub mod fields;
pub mod layout;
pub mod pipeline;
pub mod sink;
pub mod titlecase;

pub use author::{format_author, AuthorError, AuthorName};
pub use bibtex::{load_bibliography, parse_bibliography, BibtexError, Entry};
pub use document::render_document;
pub use fields::{escape_yaml_string, format_date, format_title, sanitize_citekey, venue_details};
pub use layout::Category;
pub use pipeline::{run, run_with_sink, Config, RunError, RunSummary};
pub use sink::{FsSink, MemorySink, OutputSink};
