use crate::buffer::{char_to_byte_index, Position, TextBuffer};
use crate::error::{AutolinkError, Result};
use crate::fragment::{is_delimiter, Fragment};
use crate::link_parser::format_wikilink;
use crate::resolver::Candidate;
use crate::undo::{UndoLedger, UndoRecord};
use serde::Serialize;
use tokio::time::Instant;

/// A line rewrite performed by the engine, as the host needs to mirror it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AppliedEdit {
    pub line: usize,
    pub text: String,
    pub cursor: Position,
    pub link: String,
}

/// Link text for a candidate: `[[Target]]`, or `[[Target|Alias]]` for an
/// alias match.
pub fn link_text(candidate: &Candidate) -> String {
    format_wikilink(&candidate.target.id, candidate.label())
}

/// Replace `span` on `line` with a link to `candidate`.
///
/// The span must still hold its text and still end on a word boundary;
/// a span the user has since typed past is stale. The undo record is
/// pushed before the buffer is touched. Text after the
/// span (such as the delimiter that completed the word) is kept; a cursor
/// that sat past the span keeps its distance to the end of the span, a
/// cursor inside it lands right after the link. Either way it is clamped
/// to the new line.
pub fn apply_link<B: TextBuffer + ?Sized>(
    buffer: &mut B,
    line: usize,
    span: &Fragment,
    candidate: &Candidate,
    ledger: &mut UndoLedger,
    now: Instant,
) -> Result<AppliedEdit> {
    let original = buffer.line(line).ok_or(AutolinkError::PositionOutOfRange {
        line,
        column: span.start,
    })?;
    let line_len = original.chars().count();
    if span.end > line_len || span.start > span.end {
        return Err(AutolinkError::PositionOutOfRange {
            line,
            column: span.end,
        });
    }

    let start_byte = char_to_byte_index(&original, span.start);
    let end_byte = char_to_byte_index(&original, span.end);
    let continues_word = original[end_byte..].chars().next().is_some_and(|ch| !is_delimiter(ch));
    if original[start_byte..end_byte] != span.text || continues_word {
        return Err(AutolinkError::StaleFragment {
            expected: span.text.clone(),
        });
    }

    let cursor = buffer.cursor();
    let link = link_text(candidate);
    let mut text = String::with_capacity(original.len() + link.len());
    text.push_str(&original[..start_byte]);
    text.push_str(&link);
    text.push_str(&original[end_byte..]);

    ledger.record_and_bound(UndoRecord {
        line,
        original_text: original.clone(),
        cursor,
        created_at: now,
        target: candidate.target.id.clone(),
        edited_text: text.clone(),
        fragment: span.text.clone(),
        link: link.clone(),
    });

    let link_len = link.chars().count();
    let new_len = text.chars().count();
    let column = if cursor.line == line && cursor.column >= span.end {
        cursor.column - span.char_len() + link_len
    } else {
        span.start + link_len
    };
    let new_cursor = Position::new(line, column.min(new_len));

    buffer.set_line(line, &text)?;
    buffer.set_cursor(new_cursor);
    tracing::info!("Linked {:?} as {} on line {}", span.text, link, line);

    Ok(AppliedEdit {
        line,
        text,
        cursor: new_cursor,
        link,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::LineBuffer;
    use crate::vault::TargetRef;

    fn title(id: &str) -> Candidate {
        Candidate {
            display_title: id.to_string(),
            target: TargetRef {
                id: id.to_string(),
                path: format!("{id}.md"),
            },
            is_alias: false,
        }
    }

    fn alias(id: &str, alias: &str) -> Candidate {
        Candidate {
            display_title: alias.to_string(),
            is_alias: true,
            ..title(id)
        }
    }

    fn span(text: &str, start: usize) -> Fragment {
        Fragment {
            text: text.to_string(),
            start,
            end: start + text.chars().count(),
        }
    }

    fn typed(text: &str) -> LineBuffer {
        let mut buffer = LineBuffer::new("");
        buffer.insert_at_cursor(text);
        buffer
    }

    #[test]
    fn link_text_only_labels_aliases() {
        assert_eq!(link_text(&title("Note")), "[[Note]]");
        assert_eq!(link_text(&alias("Deep Work", "Focus")), "[[Deep Work|Focus]]");
    }

    #[test]
    fn keeps_trailing_delimiter_and_cursor_after_it() {
        let mut buffer = typed("Note ");
        let mut ledger = UndoLedger::new();
        let now = Instant::now();
        let edit = apply_link(&mut buffer, 0, &span("Note", 0), &title("Note"), &mut ledger, now)
            .unwrap();
        assert_eq!(edit.text, "[[Note]] ");
        assert_eq!(buffer.text(), "[[Note]] ");
        assert_eq!(edit.cursor, Position::new(0, 9));
        assert_eq!(buffer.cursor(), Position::new(0, 9));
    }

    #[test]
    fn alias_link_keeps_alias_as_label() {
        let mut buffer = typed("try Focus.");
        let mut ledger = UndoLedger::new();
        let edit = apply_link(
            &mut buffer,
            0,
            &span("Focus", 4),
            &alias("Deep Work", "Focus"),
            &mut ledger,
            Instant::now(),
        )
        .unwrap();
        assert_eq!(edit.text, "try [[Deep Work|Focus]].");
        assert_eq!(edit.cursor.column, 24);
    }

    #[test]
    fn cursor_inside_span_lands_after_link() {
        let mut buffer = LineBuffer::new("Dee and more");
        buffer.set_cursor(Position::new(0, 2));
        let mut ledger = UndoLedger::new();
        let now = Instant::now();
        let edit =
            apply_link(&mut buffer, 0, &span("Dee", 0), &title("Deep Work"), &mut ledger, now)
                .unwrap();
        assert_eq!(edit.text, "[[Deep Work]] and more");
        assert_eq!(edit.cursor.column, 13);
    }

    #[test]
    fn records_undo_before_mutating() {
        let mut buffer = typed("Note ");
        let mut ledger = UndoLedger::new();
        apply_link(&mut buffer, 0, &span("Note", 0), &title("Note"), &mut ledger, Instant::now())
            .unwrap();
        let record = ledger.latest().unwrap();
        assert_eq!(record.original_text, "Note ");
        assert_eq!(record.cursor, Position::new(0, 5));
        assert_eq!(record.target, "Note");
        assert_eq!(record.edited_text, "[[Note]] ");
        assert_eq!(record.fragment, "Note");
        assert_eq!(record.link, "[[Note]]");
    }

    #[test]
    fn stale_span_is_rejected_without_side_effects() {
        let mut buffer = typed("Nope ");
        let mut ledger = UndoLedger::new();
        let now = Instant::now();
        let err = apply_link(&mut buffer, 0, &span("Note", 0), &title("Note"), &mut ledger, now);
        assert!(matches!(err, Err(AutolinkError::StaleFragment { .. })));
        assert!(ledger.is_empty());
        assert_eq!(buffer.text(), "Nope ");
    }

    #[test]
    fn span_followed_by_more_word_is_stale() {
        // Opened on "alp", then "ha" was typed before the accept.
        let mut buffer = typed("alpha");
        let mut ledger = UndoLedger::new();
        let now = Instant::now();
        let candidate = title("Alpha One");
        let err = apply_link(&mut buffer, 0, &span("alp", 0), &candidate, &mut ledger, now);
        assert!(matches!(err, Err(AutolinkError::StaleFragment { .. })));
        assert!(ledger.is_empty());
        assert_eq!(buffer.text(), "alpha");
    }

    #[test]
    fn span_past_line_end_is_rejected() {
        let mut buffer = typed("No");
        let mut ledger = UndoLedger::new();
        let now = Instant::now();
        let err = apply_link(&mut buffer, 0, &span("Note", 0), &title("Note"), &mut ledger, now);
        assert!(matches!(err, Err(AutolinkError::PositionOutOfRange { .. })));
        assert!(ledger.is_empty());
    }

    #[test]
    fn multibyte_text_around_span() {
        let mut buffer = typed("voilà Café ");
        let mut ledger = UndoLedger::new();
        let now = Instant::now();
        let edit = apply_link(&mut buffer, 0, &span("Café", 6), &title("Café"), &mut ledger, now)
            .unwrap();
        assert_eq!(edit.text, "voilà [[Café]] ");
        assert_eq!(edit.cursor.column, 15);
    }
}
