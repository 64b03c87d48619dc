//! BibTeX bibliography loading.
//!
//! Parses `.bib` files into [`Entry`] records: an entry type, a citation key
//! and a map of fields. Supports `{...}` and `"..."` values, bare numbers,
//! `@string` macros (with the usual month abbreviations predefined) and `#`
//! concatenation. `@comment` and `@preamble` blocks are skipped.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use thiserror::Error;
use tracing::debug;

/// Errors that can occur when loading a bibliography.
#[derive(Error, Debug)]
pub enum BibtexError {
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Syntax error at line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("Unexpected end of input in entry starting at line {line}")]
    UnexpectedEof { line: usize },
}

/// One bibliographic record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Lowercased entry type (e.g. "article", "inproceedings")
    pub entry_type: String,
    /// Citation key, verbatim
    pub key: String,
    /// Field values keyed by lowercased field name
    pub fields: BTreeMap<String, String>,
}

impl Entry {
    pub fn new(entry_type: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            entry_type: entry_type.into().to_lowercase(),
            key: key.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field setter.
    pub fn with_field(mut self, name: &str, value: impl Into<String>) -> Self {
        self.fields.insert(name.to_lowercase(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

}

/// Macros every bibliography can use without defining them.
const COMMON_STRINGS: &[(&str, &str)] = &[
    ("jan", "January"),
    ("feb", "February"),
    ("mar", "March"),
    ("apr", "April"),
    ("may", "May"),
    ("jun", "June"),
    ("jul", "July"),
    ("aug", "August"),
    ("sep", "September"),
    ("oct", "October"),
    ("nov", "November"),
    ("dec", "December"),
];

/// Loads and parses a bibliography file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid BibTeX.
pub fn load_bibliography(path: &Path) -> Result<Vec<Entry>, BibtexError> {
    let content = fs::read_to_string(path)?;
    let entries = parse_bibliography(&content)?;
    debug!(path = %path.display(), entries = entries.len(), "bibliography loaded");
    Ok(entries)
}

/// Parses BibTeX source text into entries, in source order.
pub fn parse_bibliography(source: &str) -> Result<Vec<Entry>, BibtexError> {
    Parser::new(source).parse()
}

struct Parser<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    /// Start of the block being parsed, for error reporting
    block_start: usize,
    strings: HashMap<String, String>,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        let strings = COMMON_STRINGS
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            block_start: 0,
            strings,
        }
    }

    fn parse(mut self) -> Result<Vec<Entry>, BibtexError> {
        let mut entries = Vec::new();

        while let Some(offset) = self.bytes[self.pos..].iter().position(|&b| b == b'@') {
            self.block_start = self.pos + offset;
            self.pos = self.block_start + 1;

            let kind = self.read_while(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
            if kind.is_empty() {
                continue;
            }
            let kind = kind.to_lowercase();

            self.skip_ws();
            let close = match self.peek() {
                Some(b'{') => b'}',
                Some(b'(') => b')',
                // An '@' in free text (e.g. an e-mail address), not a block
                _ => continue,
            };
            self.pos += 1;

            match kind.as_str() {
                "comment" | "preamble" => self.skip_block(close)?,
                "string" => self.parse_string_definition(close)?,
                _ => entries.push(self.parse_entry(kind, close)?),
            }
        }

        Ok(entries)
    }

    fn parse_entry(&mut self, entry_type: String, close: u8) -> Result<Entry, BibtexError> {
        self.skip_ws();
        let key = self
            .read_while(|b| b != b',' && b != close && !b.is_ascii_whitespace())
            .to_string();
        let mut entry = Entry::new(entry_type, key);

        loop {
            self.skip_ws();
            match self.peek() {
                None => return Err(self.eof()),
                Some(b) if b == close => {
                    self.pos += 1;
                    break;
                }
                Some(b',') => {
                    self.pos += 1;
                    continue;
                }
                Some(_) => {}
            }

            let name = self.read_while(is_name_byte).to_lowercase();
            if name.is_empty() {
                return Err(self.syntax("expected a field name"));
            }
            self.expect_equals(&name)?;
            let value = self.read_value()?;
            entry.fields.insert(name, value);

            self.skip_ws();
            match self.peek() {
                None => return Err(self.eof()),
                Some(b',') => self.pos += 1,
                Some(b) if b == close => {
                    self.pos += 1;
                    break;
                }
                Some(_) => {
                    return Err(self.syntax("expected ',' or the end of the entry"));
                }
            }
        }

        Ok(entry)
    }

    fn parse_string_definition(&mut self, close: u8) -> Result<(), BibtexError> {
        self.skip_ws();
        let name = self.read_while(is_name_byte).to_lowercase();
        if name.is_empty() {
            return Err(self.syntax("expected a string name"));
        }
        self.expect_equals(&name)?;
        let value = self.read_value()?;
        self.skip_ws();
        match self.peek() {
            None => Err(self.eof()),
            Some(b) if b == close => {
                self.pos += 1;
                self.strings.insert(name, value);
                Ok(())
            }
            Some(_) => Err(self.syntax("expected the end of the @string definition")),
        }
    }

    /// Reads one value: parts joined with `#`.
    fn read_value(&mut self) -> Result<String, BibtexError> {
        let mut value = String::new();

        loop {
            self.skip_ws();
            match self.peek() {
                None => return Err(self.eof()),
                Some(b'{') => {
                    let part = self.read_delimited(b'}')?;
                    value.push_str(&strip_continuation_indent(part));
                }
                Some(b'"') => {
                    let part = self.read_delimited(b'"')?;
                    value.push_str(&strip_continuation_indent(part));
                }
                Some(b) if b.is_ascii_digit() => {
                    let number = self.read_while(|b| b.is_ascii_digit());
                    value.push_str(number);
                }
                Some(b) if is_name_byte(b) => {
                    let name = self.read_while(is_name_byte).to_lowercase();
                    match self.strings.get(&name) {
                        Some(expansion) => value.push_str(expansion),
                        None => value.push_str(&name),
                    }
                }
                Some(_) => return Err(self.syntax("expected a field value")),
            }

            self.skip_ws();
            if self.peek() == Some(b'#') {
                self.pos += 1;
            } else {
                return Ok(value);
            }
        }
    }

    /// Reads a `{...}` or `"..."` part and returns its inner text.
    ///
    /// Braces nest in both forms; a quote only terminates at depth zero.
    fn read_delimited(&mut self, terminator: u8) -> Result<&'a str, BibtexError> {
        let start = self.pos + 1;
        let mut depth = 0usize;
        let mut i = start;

        while i < self.bytes.len() {
            match self.bytes[i] {
                b'{' => depth += 1,
                b'}' if depth > 0 => depth -= 1,
                b'}' if terminator == b'}' => {
                    self.pos = i + 1;
                    return Ok(&self.src[start..i]);
                }
                b'"' if terminator == b'"' && depth == 0 => {
                    self.pos = i + 1;
                    return Ok(&self.src[start..i]);
                }
                _ => {}
            }
            i += 1;
        }

        Err(self.eof())
    }

    /// Skips the body of a block whose opening delimiter was just consumed.
    fn skip_block(&mut self, close: u8) -> Result<(), BibtexError> {
        let mut depth = 0usize;
        while let Some(b) = self.peek() {
            self.pos += 1;
            match b {
                b'{' => depth += 1,
                b'}' if depth > 0 => depth -= 1,
                b if b == close && depth == 0 => return Ok(()),
                _ => {}
            }
        }
        Err(self.eof())
    }

    fn expect_equals(&mut self, name: &str) -> Result<(), BibtexError> {
        self.skip_ws();
        if self.peek() == Some(b'=') {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.syntax(&format!("expected '=' after '{}'", name)))
        }
    }

    fn read_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.pos += 1;
        }
        &self.src[start..self.pos]
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn line_at(&self, pos: usize) -> usize {
        self.bytes[..pos.min(self.bytes.len())]
            .iter()
            .filter(|&&b| b == b'\n')
            .count()
            + 1
    }

    fn syntax(&self, message: &str) -> BibtexError {
        BibtexError::Syntax {
            line: self.line_at(self.pos),
            message: message.to_string(),
        }
    }

    fn eof(&self) -> BibtexError {
        BibtexError::UnexpectedEof {
            line: self.line_at(self.block_start),
        }
    }
}

/// Drops the leading whitespace of every line but the first, so values
/// wrapped and indented in the source read as plain text.
fn strip_continuation_indent(part: &str) -> Cow<'_, str> {
    if !part.contains('\n') {
        return Cow::Borrowed(part);
    }
    let mut lines = part.split('\n');
    let mut out = String::with_capacity(part.len());
    out.push_str(lines.next().unwrap_or_default());
    for line in lines {
        out.push('\n');
        out.push_str(line.trim_start());
    }
    Cow::Owned(out)
}

/// Bytes allowed in field names, string names and bare macro references.
fn is_name_byte(b: u8) -> bool {
    !b.is_ascii_whitespace()
        && !matches!(
            b,
            b'{' | b'}' | b'(' | b')' | b',' | b'=' | b'#' | b'"' | b'@'
        )
}
