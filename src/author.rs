//! Author name parsing.
//!
//! Author fields come either as plain `Last, First` names or as biblatex
//! structured names (`family=..., given=..., prefix=..., useprefix=...`).
//! Both are normalized to `First Last` order.

use std::fmt;

use thiserror::Error;
use tracing::warn;

/// Errors for structured names missing a required part.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthorError {
    #[error("structured name '{0}' has no family= value")]
    MissingFamily(String),

    #[error("structured name '{0}' has no given= value")]
    MissingGiven(String),
}

/// A parsed author name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorName {
    /// biblatex `family=`/`given=` form
    Structured {
        given: String,
        family: String,
        prefix: Option<String>,
        use_prefix: bool,
    },
    /// `Last, First`
    LastFirst { last: String, first: String },
    /// Anything else, kept as written
    Raw(String),
}

impl AuthorName {
    /// Parses one author (already split out of the author list).
    pub fn parse(raw: &str) -> Result<Self, AuthorError> {
        let raw = raw.trim();

        if raw.contains("family=") && raw.contains("given=") {
            return parse_structured(raw);
        }

        if let Some((last, first)) = raw.split_once(',') {
            return Ok(AuthorName::LastFirst {
                last: last.trim().to_string(),
                first: first.trim().to_string(),
            });
        }

        Ok(AuthorName::Raw(raw.to_string()))
    }
}

fn parse_structured(raw: &str) -> Result<AuthorName, AuthorError> {
    let mut family = None;
    let mut given = None;
    let mut prefix = None;
    let mut use_prefix = None;

    for segment in raw.split(',') {
        let Some((key, value)) = segment.split_once('=') else {
            continue;
        };
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        let slot = match key.trim() {
            "family" => &mut family,
            "given" => &mut given,
            "prefix" => &mut prefix,
            "useprefix" => &mut use_prefix,
            _ => continue,
        };
        slot.get_or_insert_with(|| value.to_string());
    }

    let family = family.ok_or_else(|| AuthorError::MissingFamily(raw.to_string()))?;
    let given = given.ok_or_else(|| AuthorError::MissingGiven(raw.to_string()))?;

    Ok(AuthorName::Structured {
        given,
        family,
        prefix,
        use_prefix: use_prefix.as_deref() == Some("true"),
    })
}

impl fmt::Display for AuthorName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthorName::Structured {
                given,
                family,
                prefix: Some(prefix),
                use_prefix: true,
            } => write!(f, "{} {} {}", given, prefix, family),
            AuthorName::Structured { given, family, .. } => write!(f, "{} {}", given, family),
            AuthorName::LastFirst { last, first } => {
                write!(f, "{}", format!("{} {}", first, last).trim())
            }
            AuthorName::Raw(name) => write!(f, "{}", name),
        }
    }
}

/// Splits a BibTeX author list on `" and "`.
pub fn split_authors(list: &str) -> Vec<&str> {
    list.split(" and ").map(str::trim).collect()
}

/// Formats one author as `First Last`.
///
/// Malformed structured names are logged and returned as written.
pub fn format_author(raw: &str) -> String {
    match AuthorName::parse(raw) {
        Ok(name) => name.to_string(),
        Err(e) => {
            warn!(error = %e, "keeping author name as written");
            raw.trim().to_string()
        }
    }
}
