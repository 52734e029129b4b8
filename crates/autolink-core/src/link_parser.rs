
use crate::buffer::{byte_to_char_index, char_to_byte_index};
use regex::Regex;
use std::sync::LazyLock;

// Compile regex once, reuse across calls
static WIKILINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\[([^\]]+)\]\]").unwrap()
});

static INLINE_CODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"`[^`]*`").unwrap()
});

/// Build a wikilink. The label is appended after a pipe only when given.
pub fn format_wikilink(target: &str, label: Option<&str>) -> String {
    match label {
        Some(label) => format!("[[{}|{}]]", target, label),
        None => format!("[[{}]]", target),
    }
}

/// Conservative check for "the cursor sits inside link syntax".
///
/// Double-bracket links: more `[[` than `]]` before the column means an open
/// link. Bracket-paren links: the last `[` before the column comes after the
/// last `]`, and `](` follows the column. A column strictly inside a complete
/// wikilink also counts. False positives are acceptable, false negatives are not.
pub fn is_inside_link(line: &str, column: usize) -> bool {
    let split = char_to_byte_index(line, column);
    let (before, after) = line.split_at(split);

    let opens = before.matches("[[").count();
    let closes = before.matches("]]").count();
    if opens > closes {
        return true;
    }

    if let Some(open) = before.rfind('[') {
        let after_close = before.rfind(']').map_or(true, |close| open > close);
        if after_close && after.contains("](") {
            return true;
        }
    }

    extract_wikilink_occurrences(line)
        .iter()
        .any(|occ| occ.start < column && column < occ.end)
}

/// True if the column falls inside an inline code span, including one that
/// is still open.
pub fn is_inside_code_span(line: &str, column: usize) -> bool {
    let split = char_to_byte_index(line, column);
    let before = &line[..split];
    if before.matches('`').count() % 2 == 1 {
        return true;
    }
    build_excluded_ranges(line)
        .iter()
        .any(|&(start, end)| split > start && split < end)
}

/// A wikilink on a single line, with char columns.
///
/// `start` is the column of the opening `[[`, `end` the column just past the
/// closing `]]`.
#[derive(Debug, PartialEq, Eq)]
pub struct WikilinkOccurrence {
    /// Trimmed target, e.g. "Foo" from `[[Foo#Section|Alias]]`
    pub target: String,
    /// Display label after `|`, if any
    pub label: Option<String>,
    pub start: usize,
    pub end: usize,
}

/// Byte ranges covered by inline code.
fn build_excluded_ranges(line: &str) -> Vec<(usize, usize)> {
    INLINE_CODE_RE
        .find_iter(line)
        .map(|m| (m.start(), m.end()))
        .collect()
}

/// Returns true if the byte offset falls within any excluded range.
fn is_excluded(offset: usize, excluded: &[(usize, usize)]) -> bool {
    excluded.iter().any(|&(start, end)| offset >= start && offset < end)
}

/// Extract wikilink occurrences from one line of text, skipping inline code.
pub fn extract_wikilink_occurrences(line: &str) -> Vec<WikilinkOccurrence> {
    let excluded = build_excluded_ranges(line);
    let mut occurrences = Vec::new();

    for cap in WIKILINK_RE.captures_iter(line) {
        let Some(full_match) = cap.get(0) else {
            continue;
        };
        if is_excluded(full_match.start(), &excluded) {
            continue;
        }

        let content = &cap[1];
        let (name, label) = match content.split_once('|') {
            Some((name, label)) => (name, Some(label.trim().to_string())),
            None => (content, None),
        };
        let target = name.split('#').next().unwrap_or(name).trim();
        if target.is_empty() {
            continue;
        }

        occurrences.push(WikilinkOccurrence {
            target: target.to_string(),
            label,
            start: byte_to_char_index(line, full_match.start()),
            end: byte_to_char_index(line, full_match.end()),
        });
    }

    occurrences
}
