use crate::buffer::char_to_byte_index;

/// Contiguous word-like text before the cursor, with its char span on the line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fragment {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

impl Fragment {
    pub fn char_len(&self) -> usize {
        self.end - self.start
    }

    /// Suffixes of this fragment that begin on a word boundary, longest first.
    /// The fragment itself is the first entry.
    pub fn word_suffixes(&self) -> Vec<Fragment> {
        let chars: Vec<char> = self.text.chars().collect();
        let mut suffixes = Vec::new();
        for (offset, ch) in chars.iter().enumerate() {
            let at_boundary = offset == 0 || chars[offset - 1].is_whitespace();
            if at_boundary && !ch.is_whitespace() {
                suffixes.push(Fragment {
                    text: chars[offset..].iter().collect(),
                    start: self.start + offset,
                    end: self.end,
                });
            }
        }
        suffixes
    }
}

/// Characters that may appear inside a fragment: word chars, hyphen,
/// underscore and whitespace.
pub fn is_fragment_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '-' || ch.is_whitespace()
}

/// Whitespace or punctuation; typing one completes a word.
pub fn is_delimiter(ch: char) -> bool {
    !(ch.is_alphanumeric() || ch == '_' || ch == '-')
}

/// The char immediately before `column`, if any.
pub fn char_before(line: &str, column: usize) -> Option<char> {
    if column == 0 {
        return None;
    }
    line[..char_to_byte_index(line, column)].chars().next_back()
}

/// Extract the fragment ending at `end`, trimmed of surrounding whitespace.
pub fn extract(line: &str, end: usize) -> Option<Fragment> {
    let chars: Vec<char> = line.chars().take(end).collect();
    let end = chars.len();

    let mut start = end;
    while start > 0 && is_fragment_char(chars[start - 1]) {
        start -= 1;
    }
    let mut trimmed_end = end;
    while start < trimmed_end && chars[start].is_whitespace() {
        start += 1;
    }
    while trimmed_end > start && chars[trimmed_end - 1].is_whitespace() {
        trimmed_end -= 1;
    }
    if start == trimmed_end {
        return None;
    }

    Some(Fragment {
        text: chars[start..trimmed_end].iter().collect(),
        start,
        end: trimmed_end,
    })
}
