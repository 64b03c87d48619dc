//! Field formatting rules.
//!
//! Turns raw bibliography field values into the strings written to the
//! front matter: sanitized identifiers, title-cased titles with
//! brace-protected spans, normalized dates and venue descriptions.

use std::ops::Range;

use crate::bibtex::Entry;
use crate::titlecase::titlecase_protected;

/// Replaces every character outside `[A-Za-z0-9_-]` with `_`.
///
/// Works per character, so the result has as many characters as the key.
pub fn sanitize_citekey(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Unescapes the LaTeX escapes that would otherwise leak into YAML strings.
pub fn escape_yaml_string(value: &str) -> String {
    value.replace(r"\&", "&").replace(r"\:", ":")
}

/// Title-cases a title, keeping `{...}` spans exactly as written.
///
/// Doubled braces are collapsed first, so `{{NASA}}` protects like `{NASA}`.
/// Spans are the shortest `{...}` matches on a single line; the braces are
/// dropped from the output. Nested or unbalanced braces give a best-effort
/// result and never fail.
///
/// # Examples
///
/// ```
/// use bib2qmd::format_title;
///
/// assert_eq!(format_title("the {NASA} mission"), "The NASA Mission");
/// assert_eq!(format_title("{{Quantum}} computing"), "Quantum Computing");
/// ```
pub fn format_title(title: &str) -> String {
    if title.is_empty() {
        return String::new();
    }

    let collapsed = collapse_double_braces(title);
    let (text, protected) = strip_protected_spans(&collapsed);
    titlecase_protected(&text, &protected)
}

fn collapse_double_braces(title: &str) -> String {
    let mut title = title.to_string();
    while title.contains("{{") && title.contains("}}") {
        title = title.replace("{{", "{").replace("}}", "}");
    }
    title
}

/// Removes the braces of each protected span and returns the byte ranges
/// its content occupies in the resulting text.
fn strip_protected_spans(title: &str) -> (String, Vec<Range<usize>>) {
    let mut text = String::with_capacity(title.len());
    let mut spans = Vec::new();
    let mut rest = title;

    while let Some(open) = rest.find('{') {
        let after_open = &rest[open + 1..];
        let Some(close) = after_open.find('}') else {
            break;
        };
        let content = &after_open[..close];

        if content.contains('\n') {
            // Not a span; keep the brace as text and look further on.
            text.push_str(&rest[..=open]);
            rest = after_open;
            continue;
        }

        text.push_str(&rest[..open]);
        let start = text.len();
        text.push_str(content);
        spans.push(start..text.len());
        rest = &after_open[close + 1..];
    }
    text.push_str(rest);

    (text, spans)
}

/// Expands a bare year to the first of January; anything else passes through.
pub fn format_date(date: &str) -> String {
    if is_integer(date) {
        format!("{}-01-01", date)
    } else {
        date.to_string()
    }
}

/// An optionally signed run of ASCII digits, surrounding blanks allowed.
fn is_integer(text: &str) -> bool {
    let digits = text.trim();
    let digits = digits.strip_prefix(|c: char| c == '+' || c == '-').unwrap_or(digits);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Picks the human-readable venue for an entry, based on its type.
pub fn venue_details(entry: &Entry) -> String {
    match entry.entry_type.as_str() {
        "article" => entry.get("journaltitle").unwrap_or_default().to_string(),
        "inproceedings" => {
            if let Some(booktitle) = entry.get("booktitle") {
                booktitle.to_string()
            } else {
                match (entry.get("publisher"), entry.get("eventtitle")) {
                    (Some(publisher), Some(event)) => format!("{} {}", publisher, event),
                    (None, Some(event)) => event.to_string(),
                    _ => String::new(),
                }
            }
        }
        _ => entry.get("howpublished").unwrap_or_default().to_string(),
    }
}
