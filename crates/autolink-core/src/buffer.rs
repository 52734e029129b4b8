use crate::error::{AutolinkError, Result};
use serde::{Deserialize, Serialize};

/// A (line, column) position. Columns count chars, not bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// The host editor's text, addressed by line.
pub trait TextBuffer {
    fn line_count(&self) -> usize;
    fn line(&self, index: usize) -> Option<String>;
    fn set_line(&mut self, index: usize, text: &str) -> Result<()>;
    fn cursor(&self) -> Position;
    fn set_cursor(&mut self, position: Position);
}

/// In-memory buffer. Hosts that keep their own text mirror into one of these.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineBuffer {
    lines: Vec<String>,
    cursor: Position,
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new("")
    }
}

impl LineBuffer {
    pub fn new(text: &str) -> Self {
        Self::from_lines(text.split('\n').map(str::to_string).collect())
    }

    pub fn from_lines(lines: Vec<String>) -> Self {
        let lines = if lines.is_empty() { vec![String::new()] } else { lines };
        Self {
            lines,
            cursor: Position::default(),
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Replace the whole content, keeping the cursor clamped inside it.
    pub fn replace_all(&mut self, lines: Vec<String>) {
        self.lines = if lines.is_empty() { vec![String::new()] } else { lines };
        self.cursor = self.clamp(self.cursor);
    }

    /// Type `text` at the cursor as a user would; `\n` splits the line.
    pub fn insert_at_cursor(&mut self, text: &str) {
        for ch in text.chars() {
            let Position { line, column } = self.cursor;
            let current = &mut self.lines[line];
            let byte = char_to_byte_index(current, column);
            if ch == '\n' {
                let rest = current.split_off(byte);
                self.lines.insert(line + 1, rest);
                self.cursor = Position::new(line + 1, 0);
            } else {
                current.insert(byte, ch);
                self.cursor.column += 1;
            }
        }
    }

    /// Delete the char before the cursor within the current line.
    pub fn backspace(&mut self) {
        let Position { line, column } = self.cursor;
        if column == 0 {
            return;
        }
        let current = &mut self.lines[line];
        let byte = char_to_byte_index(current, column - 1);
        current.remove(byte);
        self.cursor.column -= 1;
    }

    fn clamp(&self, position: Position) -> Position {
        let line = position.line.min(self.lines.len() - 1);
        let column = position.column.min(self.lines[line].chars().count());
        Position::new(line, column)
    }
}

impl TextBuffer for LineBuffer {
    fn line_count(&self) -> usize {
        self.lines.len()
    }

    fn line(&self, index: usize) -> Option<String> {
        self.lines.get(index).cloned()
    }

    fn set_line(&mut self, index: usize, text: &str) -> Result<()> {
        let slot = self
            .lines
            .get_mut(index)
            .ok_or(AutolinkError::PositionOutOfRange { line: index, column: 0 })?;
        *slot = text.to_string();
        Ok(())
    }

    fn cursor(&self) -> Position {
        self.cursor
    }

    fn set_cursor(&mut self, position: Position) {
        self.cursor = self.clamp(position);
    }
}

pub(crate) fn char_to_byte_index(s: &str, char_index: usize) -> usize {
    s.char_indices()
        .nth(char_index)
        .map(|(idx, _)| idx)
        .unwrap_or_else(|| s.len())
}

pub(crate) fn byte_to_char_index(s: &str, byte_index: usize) -> usize {
    s[..byte_index.min(s.len())].chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typing_advances_cursor() {
        let mut buffer = LineBuffer::new("");
        buffer.insert_at_cursor("Note ");
        assert_eq!(buffer.text(), "Note ");
        assert_eq!(buffer.cursor(), Position::new(0, 5));
    }

    #[test]
    fn newline_splits_line() {
        let mut buffer = LineBuffer::new("");
        buffer.insert_at_cursor("ab\ncd");
        assert_eq!(buffer.lines(), &["ab".to_string(), "cd".to_string()]);
        assert_eq!(buffer.cursor(), Position::new(1, 2));
    }

    #[test]
    fn typing_multibyte_chars_uses_char_columns() {
        let mut buffer = LineBuffer::new("");
        buffer.insert_at_cursor("été");
        assert_eq!(buffer.cursor().column, 3);
        buffer.backspace();
        assert_eq!(buffer.text(), "ét");
    }

    #[test]
    fn set_cursor_clamps_to_line_length() {
        let mut buffer = LineBuffer::new("abc\nde");
        buffer.set_cursor(Position::new(5, 99));
        assert_eq!(buffer.cursor(), Position::new(1, 2));
    }

    #[test]
    fn set_line_out_of_range_errors() {
        let mut buffer = LineBuffer::new("abc");
        assert!(matches!(
            buffer.set_line(3, "x"),
            Err(AutolinkError::PositionOutOfRange { line: 3, .. })
        ));
    }

    #[test]
    fn char_byte_conversions() {
        assert_eq!(char_to_byte_index("añb", 2), 3);
        assert_eq!(char_to_byte_index("ab", 9), 2);
        assert_eq!(byte_to_char_index("añb", 3), 2);
    }
}
