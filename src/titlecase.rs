//! English title casing.
//!
//! Follows the usual Gruber-style rules: small words stay lower case unless
//! they open or close a line or follow a subphrase delimiter, words with
//! inner capitals or inline periods are left alone, hyphenated and slashed
//! words are cased part by part.
//!
//! [`titlecase_protected`] additionally takes byte ranges that must be
//! copied through untouched. A word that overlaps one of those ranges is
//! emitted verbatim.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

const PUNCT: &str = r##"!"“#$%&'‘()*+,\-–‒—―./:;?@\[\\\]_`{|}~"##;
const SMALL: &str = r"a|an|and|as|at|but|by|en|for|if|in|of|on|or|the|to|v\.?|via|vs\.?";

#[allow(clippy::expect_used)]
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("title casing regex is valid")
}

static SMALL_WORDS: LazyLock<Regex> = LazyLock::new(|| compile(&format!(r"(?i)^(?:{SMALL})$")));
static SMALL_FIRST: LazyLock<Regex> =
    LazyLock::new(|| compile(&format!(r"(?i)^([{PUNCT}]*)({SMALL})\b")));
static SMALL_LAST: LazyLock<Regex> =
    LazyLock::new(|| compile(&format!(r"(?i)\b(?:{SMALL})[{PUNCT}]?$")));
static SMALL_PREFIX: LazyLock<Regex> = LazyLock::new(|| compile(&format!(r"^(?:{SMALL})")));
static INLINE_PERIOD: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)[a-z][.][a-z]"));
static UC_ELSEWHERE: LazyLock<Regex> =
    LazyLock::new(|| compile(&format!(r"^[{PUNCT}]*?[a-zA-Z]+[A-Z]+?")));
static UC_INITIALS: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^(?:[A-Z]\.|[A-Z]\.[A-Z])+$"));
static APOS_SECOND: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)^[dol]['‘][a-z]+(?:['s]{2})?$"));
static MAC_MC: LazyLock<Regex> = LazyLock::new(|| compile(r"^([Mm]c|MC)(\w.+)"));
static ALL_CAPS: LazyLock<Regex> = LazyLock::new(|| compile(&format!(r"^[A-Z\s\d{PUNCT}]+$")));
static CONSONANTS: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)^[bcdfghjklmnpqrstvwxz]+$"));

/// Characters that open a subphrase when followed by a space.
const SUBPHRASE_DELIMITERS: &[char] = &[':', '.', ';', '?', '!', '-', '–', '‒', '—', '―'];

/// Title-cases `text`.
pub fn titlecase(text: &str) -> String {
    titlecase_protected(text, &[])
}

/// Title-cases `text`, copying the `protected` byte ranges through unchanged.
///
/// Ranges must lie on char boundaries; overlapping or unsorted ranges are
/// tolerated but a word touching any of them is kept as is.
pub fn titlecase_protected(text: &str, protected: &[Range<usize>]) -> String {
    let unprotected: String = text
        .char_indices()
        .filter(|(i, _)| !in_ranges(*i, protected))
        .map(|(_, c)| c)
        .collect();
    let all_caps = ALL_CAPS.is_match(&unprotected);

    let mut out = String::with_capacity(text.len());
    for line in tokenize(text, protected) {
        case_line(text, &line, all_caps, &mut out);
    }
    out
}

#[derive(Debug, PartialEq)]
enum Token {
    Word { range: Range<usize>, verbatim: bool },
    /// Blanks and line breaks, copied as is
    Gap(Range<usize>),
}

/// Splits `text` into lines of tokens; a line's trailing gap holds its break.
fn tokenize(text: &str, protected: &[Range<usize>]) -> Vec<Vec<Token>> {
    let mut lines = vec![Vec::new()];
    let mut word_start: Option<usize> = None;
    let mut verbatim = false;

    for (i, c) in text.char_indices() {
        let is_protected = in_ranges(i, protected);
        if !is_protected && (c == ' ' || c == '\t' || c == '\n' || c == '\r') {
            if let Some(start) = word_start.take() {
                push_token(&mut lines, Token::Word { range: start..i, verbatim });
                verbatim = false;
            }
            push_gap(&mut lines, i..i + c.len_utf8());
            if c == '\n' || c == '\r' {
                lines.push(Vec::new());
            }
        } else {
            if word_start.is_none() {
                word_start = Some(i);
            }
            verbatim |= is_protected;
        }
    }
    if let Some(start) = word_start {
        push_token(&mut lines, Token::Word { range: start..text.len(), verbatim });
    }

    lines
}

fn push_token(lines: &mut [Vec<Token>], token: Token) {
    if let Some(line) = lines.last_mut() {
        line.push(token);
    }
}

fn push_gap(lines: &mut [Vec<Token>], range: Range<usize>) {
    if let Some(line) = lines.last_mut() {
        if let Some(Token::Gap(prev)) = line.last_mut() {
            if prev.end == range.start {
                prev.end = range.end;
                return;
            }
        }
        line.push(Token::Gap(range));
    }
}

fn in_ranges(i: usize, ranges: &[Range<usize>]) -> bool {
    ranges.iter().any(|r| r.contains(&i))
}

fn case_line(text: &str, line: &[Token], all_caps: bool, out: &mut String) {
    let first_word = line.iter().position(|t| matches!(t, Token::Word { .. }));
    let last_word = line.iter().rposition(|t| matches!(t, Token::Word { .. }));
    let mut previous_word = String::new();

    for (idx, token) in line.iter().enumerate() {
        match token {
            Token::Gap(range) => out.push_str(&text[range.clone()]),
            Token::Word { range, verbatim } => {
                let raw = &text[range.clone()];
                let word = if *verbatim {
                    raw.to_string()
                } else {
                    let mut word = case_word(raw, all_caps);
                    if Some(idx) == first_word {
                        word = capitalize_small_first(&word);
                    }
                    if Some(idx) == last_word {
                        word = capitalize_small_last(&word);
                    }
                    if opens_subphrase(text, line, idx, &previous_word) {
                        word = upper_first(&word);
                    }
                    word
                };
                out.push_str(&word);
                previous_word = word;
            }
        }
    }
}

/// A small word right after `": "`, `". "` and the like starts a subphrase.
fn opens_subphrase(text: &str, line: &[Token], idx: usize, previous_word: &str) -> bool {
    let Some(Token::Word { range, .. }) = line.get(idx) else {
        return false;
    };
    let single_space_before = idx >= 2
        && matches!(&line[idx - 1], Token::Gap(gap) if &text[gap.clone()] == " ")
        && matches!(line[idx - 2], Token::Word { .. });
    single_space_before
        && previous_word.ends_with(SUBPHRASE_DELIMITERS)
        && SMALL_PREFIX.is_match(&text[range.clone()])
}

fn case_word(word: &str, all_caps: bool) -> String {
    if all_caps && UC_INITIALS.is_match(word) {
        return word.to_string();
    }

    if APOS_SECOND.is_match(word) {
        return case_elision(word);
    }

    if let Some(caps) = MAC_MC.captures(word) {
        if let (Some(prefix), Some(rest)) = (caps.get(1), caps.get(2)) {
            return format!("{}{}", capitalize(prefix.as_str()), titlecase(rest.as_str()));
        }
    }

    if INLINE_PERIOD.is_match(word) || (!all_caps && UC_ELSEWHERE.is_match(word)) {
        return word.to_string();
    }

    if SMALL_WORDS.is_match(word) {
        return word.to_lowercase();
    }

    if word.contains('/') && !word.contains("//") {
        return word.split('/').map(titlecase).collect::<Vec<_>>().join("/");
    }

    if word.contains('-') {
        return word.split('-').map(titlecase).collect::<Vec<_>>().join("-");
    }

    let word = if all_caps {
        word.to_lowercase()
    } else {
        word.to_string()
    };

    if CONSONANTS.is_match(&word) && word.chars().count() > 2 {
        return word.to_uppercase();
    }

    cap_first(&word)
}

/// `o'neill` -> `O'Neill`, `d'alembert` -> `d'Alembert`.
fn case_elision(word: &str) -> String {
    let mut chars = word.chars();
    let (Some(first), Some(apostrophe), Some(third)) = (chars.next(), chars.next(), chars.next())
    else {
        return word.to_string();
    };
    let rest: String = chars.collect();
    let first = if "aeiouAEIOU".contains(first) {
        first.to_uppercase().collect::<String>()
    } else {
        first.to_lowercase().collect::<String>()
    };
    format!("{first}{apostrophe}{}{rest}", third.to_uppercase())
}

/// Upper-cases the first word character after any leading punctuation.
fn cap_first(word: &str) -> String {
    for (i, c) in word.char_indices() {
        if PUNCT_CHARS.contains(c) {
            continue;
        }
        if c.is_alphanumeric() || c == '_' {
            let mut out = String::with_capacity(word.len());
            out.push_str(&word[..i]);
            out.extend(c.to_uppercase());
            out.push_str(&word[i + c.len_utf8()..]);
            return out;
        }
        break;
    }
    word.to_string()
}

const PUNCT_CHARS: &str = "!\"“#$%&'‘()*+,-–‒—―./:;?@[\\]_`{|}~";

fn capitalize_small_first(word: &str) -> String {
    match SMALL_FIRST.captures(word) {
        Some(caps) => {
            let (Some(lead), Some(small)) = (caps.get(1), caps.get(2)) else {
                return word.to_string();
            };
            format!(
                "{}{}{}",
                lead.as_str(),
                capitalize(small.as_str()),
                &word[small.end()..]
            )
        }
        None => word.to_string(),
    }
}

fn capitalize_small_last(word: &str) -> String {
    match SMALL_LAST.find(word) {
        Some(m) => format!("{}{}", &word[..m.start()], capitalize(m.as_str())),
        None => word.to_string(),
    }
}

/// First character upper case, the rest lower case.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn upper_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capitalizes_major_words() {
        assert_eq!(titlecase("deep learning for graphs"), "Deep Learning for Graphs");
    }

    #[test]
    fn test_small_words_lowercased_inside() {
        assert_eq!(
            titlecase("The Lord Of The Rings And A Ring"),
            "The Lord of the Rings and a Ring"
        );
    }

    #[test]
    fn test_small_word_first_and_last_capitalized() {
        assert_eq!(titlecase("a thing to think of"), "A Thing to Think Of");
    }

    #[test]
    fn test_small_word_after_colon() {
        assert_eq!(
            titlecase("starting over: a new approach"),
            "Starting Over: A New Approach"
        );
    }

    #[test]
    fn test_inner_capitals_preserved() {
        assert_eq!(titlecase("why the iPhone uses NASA tech"), "Why the iPhone Uses NASA Tech");
    }

    #[test]
    fn test_inline_period_preserved() {
        assert_eq!(titlecase("notes on example.com"), "Notes on example.com");
    }

    #[test]
    fn test_all_caps_input_is_recased() {
        assert_eq!(titlecase("A STUDY OF THINGS"), "A Study of Things");
    }

    #[test]
    fn test_hyphenated_words() {
        assert_eq!(titlecase("a well-known result"), "A Well-Known Result");
    }

    #[test]
    fn test_slashed_words_but_not_urls() {
        assert_eq!(titlecase("input/output at http://x.org"), "Input/Output at http://x.org");
    }

    #[test]
    fn test_consonant_only_words_are_acronyms() {
        assert_eq!(titlecase("using html and xml"), "Using HTML and XML");
    }

    #[test]
    fn test_elisions() {
        assert_eq!(titlecase("o'neill and d'alembert"), "O'Neill and d'Alembert");
    }

    #[test]
    fn test_mc_prefix() {
        assert_eq!(titlecase("mcdonald and the farm"), "McDonald and the Farm");
        assert_eq!(titlecase("a McDonald story"), "A McDonald Story");
        assert_eq!(titlecase("MCDONALD FARM"), "McDonald Farm");
    }

    #[test]
    fn test_leading_punctuation() {
        assert_eq!(titlecase("\"quoted\" words"), "\"Quoted\" Words");
    }

    #[test]
    fn test_lines_cased_independently() {
        assert_eq!(titlecase("first of\nthe second"), "First Of\nThe Second");
    }

    #[test]
    fn test_whitespace_preserved() {
        assert_eq!(titlecase("  two  spaces "), "  Two  Spaces ");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(titlecase(""), "");
    }

    #[test]
    fn test_protected_word_verbatim() {
        // Given: "the nasa mission" with "nasa" protected
        let text = "the nasa mission";

        // When: we title-case it
        let result = titlecase_protected(text, &[4..8]);

        // Then: the protected word keeps its lower case
        assert_eq!(result, "The nasa Mission");
    }

    #[test]
    fn test_protected_span_with_spaces_is_one_word() {
        let text = "visiting new york in may";
        let result = titlecase_protected(text, &[9..17]);
        assert_eq!(result, "Visiting new york in May");
    }

    #[test]
    fn test_protected_text_ignored_for_all_caps_detection() {
        // The protected part alone is upper case, the rest is not
        let text = "NASA report";
        assert_eq!(titlecase_protected(text, &[0..4]), "NASA Report");
    }

    #[test]
    fn test_protected_small_word_not_capitalized_first() {
        assert_eq!(titlecase_protected("a b c", &[0..1]), "a B C");
    }
}
