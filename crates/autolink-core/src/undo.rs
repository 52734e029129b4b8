use crate::buffer::{char_to_byte_index, Position, TextBuffer};
use crate::error::Result;
use crate::link_parser::{extract_wikilink_occurrences, WikilinkOccurrence};
use serde::Serialize;
use std::collections::VecDeque;
use tokio::time::{Duration, Instant};

pub const LEDGER_CAPACITY: usize = 10;
/// Backspace/Delete only undoes a link this recent.
pub const IMPLICIT_UNDO_WINDOW: Duration = Duration::from_secs(30);
/// How long auto-linking stays off after an undo.
pub const SUPPRESSION_COOLDOWN: Duration = Duration::from_secs(1);

/// Snapshot of a line taken right before the engine rewrote it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UndoRecord {
    pub line: usize,
    pub original_text: String,
    pub cursor: Position,
    pub created_at: Instant,
    /// Target identifier of the inserted link.
    pub target: String,
    /// The whole line as the engine left it.
    pub edited_text: String,
    /// Typed text the link replaced.
    pub fragment: String,
    /// Inserted link text, e.g. `[[Note]]`.
    pub link: String,
}

/// A line the engine put back, shaped like an applied edit so hosts can
/// mirror both the same way.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RestoredLine {
    pub line: usize,
    pub text: String,
    pub cursor: Position,
    #[serde(skip)]
    pub target: String,
}

impl UndoRecord {
    /// Line that still holds the engine's edit unchanged: the recorded one,
    /// or else the nearest identical line (lines above may have been added
    /// or removed since).
    pub fn locate<B: TextBuffer + ?Sized>(&self, buffer: &B) -> Option<usize> {
        let holds_edit = |index: usize| {
            buffer
                .line(index)
                .is_some_and(|text| text == self.edited_text)
        };
        if holds_edit(self.line) {
            return Some(self.line);
        }
        (0..buffer.line_count())
            .filter(|&index| holds_edit(index))
            .min_by_key(|&index| index.abs_diff(self.line))
    }

    /// Put the captured line and cursor back.
    ///
    /// Returns `None` without touching the buffer when no line still holds
    /// the edit as the engine left it.
    pub fn restore<B: TextBuffer + ?Sized>(&self, buffer: &mut B) -> Result<Option<RestoredLine>> {
        let Some(line) = self.locate(buffer) else {
            return Ok(None);
        };
        let cursor = Position::new(line, self.cursor.column);
        buffer.set_line(line, &self.original_text)?;
        buffer.set_cursor(cursor);
        Ok(Some(self.restored(line, self.original_text.clone(), cursor)))
    }

    /// Turn the link next to `cursor` back into the typed fragment, leaving
    /// the rest of the line as the user has it now.
    ///
    /// Returns `None` without touching the buffer unless a link with this
    /// record's exact text sits at or just before the cursor.
    pub fn unlink_at<B: TextBuffer + ?Sized>(
        &self,
        buffer: &mut B,
        cursor: Position,
    ) -> Result<Option<RestoredLine>> {
        let Some(text) = buffer.line(cursor.line) else {
            return Ok(None);
        };
        let Some(occ) = extract_wikilink_occurrences(&text)
            .into_iter()
            .find(|occ| occ.target == self.target && touches(occ, cursor.column))
        else {
            return Ok(None);
        };
        let start = char_to_byte_index(&text, occ.start);
        let end = char_to_byte_index(&text, occ.end);
        if text[start..end] != self.link {
            return Ok(None);
        }

        let mut unlinked = String::with_capacity(text.len());
        unlinked.push_str(&text[..start]);
        unlinked.push_str(&self.fragment);
        unlinked.push_str(&text[end..]);

        let fragment_len = self.fragment.chars().count();
        let column = if cursor.column >= occ.end {
            cursor.column - (occ.end - occ.start) + fragment_len
        } else {
            occ.start + fragment_len
        };
        let cursor = Position::new(cursor.line, column);
        buffer.set_line(cursor.line, &unlinked)?;
        buffer.set_cursor(cursor);
        Ok(Some(self.restored(cursor.line, unlinked, cursor)))
    }

    fn restored(&self, line: usize, text: String, cursor: Position) -> RestoredLine {
        RestoredLine {
            line,
            text,
            cursor,
            target: self.target.clone(),
        }
    }
}

/// Cursor inside the link, or one char past it.
fn touches(occ: &WikilinkOccurrence, column: usize) -> bool {
    column >= occ.start && column <= occ.end + 1
}

/// Bounded history of engine-made substitutions, oldest evicted first.
#[derive(Debug)]
pub struct UndoLedger {
    records: VecDeque<UndoRecord>,
    capacity: usize,
}

impl Default for UndoLedger {
    fn default() -> Self {
        Self::with_capacity(LEDGER_CAPACITY)
    }
}

impl UndoLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn record_and_bound(&mut self, record: UndoRecord) {
        self.records.push_back(record);
        while self.records.len() > self.capacity {
            self.records.pop_front();
        }
    }

    pub fn pop_latest(&mut self) -> Option<UndoRecord> {
        self.records.pop_back()
    }

    pub fn latest(&self) -> Option<&UndoRecord> {
        self.records.back()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &UndoRecord> {
        self.records.iter()
    }

    /// Whether a Backspace/Delete at `cursor` should undo the latest record.
    ///
    /// Requires the record to be within the time window and the cursor to sit
    /// inside, or one char past, a link to the recorded target on the
    /// recorded line.
    pub fn implicit_match(&self, line_text: &str, cursor: Position, now: Instant) -> bool {
        let Some(record) = self.latest() else {
            return false;
        };
        if now.saturating_duration_since(record.created_at) > IMPLICIT_UNDO_WINDOW {
            return false;
        }
        if cursor.line != record.line {
            return false;
        }
        extract_wikilink_occurrences(line_text)
            .iter()
            .any(|occ| occ.target == record.target && touches(occ, cursor.column))
    }
}

/// Timed switch that keeps the engine from re-linking text it just restored.
#[derive(Debug, Default)]
pub struct Suppression {
    until: Option<Instant>,
}

impl Suppression {
    pub fn activate(&mut self, now: Instant) {
        self.until = Some(now + SUPPRESSION_COOLDOWN);
    }

    /// Active until the cool-down elapses; resets itself afterwards.
    pub fn is_active(&mut self, now: Instant) -> bool {
        match self.until {
            Some(until) if now < until => true,
            Some(_) => {
                self.until = None;
                false
            }
            None => false,
        }
    }

    pub fn reset(&mut self) {
        self.until = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::LineBuffer;

    fn record(target: &str, created_at: Instant) -> UndoRecord {
        UndoRecord {
            line: 0,
            original_text: format!("{target} "),
            cursor: Position::new(0, target.chars().count() + 1),
            created_at,
            target: target.to_string(),
            edited_text: format!("[[{target}]] "),
            fragment: target.to_string(),
            link: format!("[[{target}]]"),
        }
    }

    // === ledger bound tests ===

    #[test]
    fn ledger_never_exceeds_capacity() {
        let now = Instant::now();
        let mut ledger = UndoLedger::new();
        for i in 0..15 {
            ledger.record_and_bound(record(&format!("Note {i}"), now));
            assert!(ledger.len() <= LEDGER_CAPACITY);
        }
        assert_eq!(ledger.len(), 10);
        // FIFO: the five oldest were evicted.
        assert_eq!(ledger.iter().next().unwrap().target, "Note 5");
        assert_eq!(ledger.latest().unwrap().target, "Note 14");
    }

    #[test]
    fn pop_latest_returns_newest_first() {
        let now = Instant::now();
        let mut ledger = UndoLedger::new();
        ledger.record_and_bound(record("First", now));
        ledger.record_and_bound(record("Second", now));
        assert_eq!(ledger.pop_latest().unwrap().target, "Second");
        assert_eq!(ledger.pop_latest().unwrap().target, "First");
        assert!(ledger.pop_latest().is_none());
    }

    // === implicit undo tests ===

    #[test]
    fn implicit_match_inside_link_within_window() {
        let now = Instant::now();
        let mut ledger = UndoLedger::new();
        ledger.record_and_bound(record("Note", now));
        let line = "[[Note]] ";
        assert!(ledger.implicit_match(line, Position::new(0, 9), now + Duration::from_secs(5)));
        assert!(ledger.implicit_match(line, Position::new(0, 4), now));
    }

    #[test]
    fn implicit_match_expires_after_window() {
        let now = Instant::now();
        let mut ledger = UndoLedger::new();
        ledger.record_and_bound(record("Note", now));
        let later = now + IMPLICIT_UNDO_WINDOW + Duration::from_millis(1);
        assert!(!ledger.implicit_match("[[Note]] ", Position::new(0, 9), later));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn implicit_match_requires_matching_target_and_position() {
        let now = Instant::now();
        let mut ledger = UndoLedger::new();
        ledger.record_and_bound(record("Note", now));
        assert!(!ledger.implicit_match("[[Other]] ", Position::new(0, 10), now));
        assert!(!ledger.implicit_match("[[Note]] tail text", Position::new(0, 15), now));
        assert!(!ledger.implicit_match("[[Note]] ", Position::new(1, 9), now));
    }

    #[test]
    fn empty_ledger_never_matches() {
        let ledger = UndoLedger::new();
        assert!(!ledger.implicit_match("[[Note]]", Position::new(0, 8), Instant::now()));
    }

    #[test]
    fn restore_puts_back_line_and_cursor() {
        let now = Instant::now();
        let mut buffer = LineBuffer::new("[[Note]] ");
        buffer.set_cursor(Position::new(0, 9));
        let restored = record("Note", now).restore(&mut buffer).unwrap().unwrap();
        assert_eq!(restored.text, "Note ");
        assert_eq!(buffer.text(), "Note ");
        assert_eq!(buffer.cursor(), Position::new(0, 5));
    }

    #[test]
    fn restore_follows_line_shifted_down() {
        let mut buffer = LineBuffer::from_lines(vec!["Heading".into(), "[[Note]] ".into()]);
        let restored = record("Note", Instant::now()).restore(&mut buffer).unwrap().unwrap();
        assert_eq!(restored.line, 1);
        assert_eq!(buffer.text(), "Heading\nNote ");
        assert_eq!(buffer.cursor(), Position::new(1, 5));
    }

    #[test]
    fn restore_leaves_edited_line_alone() {
        let mut buffer = LineBuffer::new("[[Note]] and more");
        assert!(record("Note", Instant::now()).restore(&mut buffer).unwrap().is_none());
        assert_eq!(buffer.text(), "[[Note]] and more");
    }

    #[test]
    fn unlink_keeps_text_typed_after_link() {
        let mut buffer = LineBuffer::new("[[Note]] and more");
        let cursor = Position::new(0, 9);
        let restored = record("Note", Instant::now())
            .unlink_at(&mut buffer, cursor)
            .unwrap()
            .unwrap();
        assert_eq!(restored.text, "Note and more");
        assert_eq!(buffer.text(), "Note and more");
        assert_eq!(buffer.cursor(), Position::new(0, 5));
    }

    #[test]
    fn unlink_ignores_rewritten_link() {
        let mut buffer = LineBuffer::new("[[Note|note]] and more");
        let cursor = Position::new(0, 13);
        let unlinked = record("Note", Instant::now()).unlink_at(&mut buffer, cursor).unwrap();
        assert!(unlinked.is_none());
        assert_eq!(buffer.text(), "[[Note|note]] and more");
    }

    // === suppression tests ===

    #[test]
    fn suppression_expires_after_cooldown() {
        let now = Instant::now();
        let mut suppression = Suppression::default();
        assert!(!suppression.is_active(now));
        suppression.activate(now);
        assert!(suppression.is_active(now + Duration::from_millis(999)));
        assert!(!suppression.is_active(now + SUPPRESSION_COOLDOWN));
        assert!(!suppression.is_active(now));
    }
}
