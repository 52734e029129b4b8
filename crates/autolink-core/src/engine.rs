use crate::buffer::TextBuffer;
use crate::config::{LinkMode, Settings};
use crate::debounce::Debouncer;
use crate::disambiguation::{decide, Decision, Disambiguator, FragmentState};
use crate::edit::{apply_link, AppliedEdit};
use crate::fragment::Fragment;
use crate::link_parser::{is_inside_code_span, is_inside_link};
use crate::resolver::{find_matches, Candidate};
use crate::suggest::{
    EventOrigin, Key, KeyContext, PointerAction, SessionHost, SessionOutcome, SuggestionPopup,
    SuggestionSession,
};
use crate::title_index::TitleIndex;
use crate::undo::{RestoredLine, Suppression, UndoLedger};
use crate::vault::Document;
use tokio::time::Instant;

/// What a text-change evaluation did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TextChangeOutcome {
    /// An undo just ran; nothing was evaluated.
    Suppressed,
    /// Nothing to match here.
    Idle,
    /// Candidates exist but the decision is deferred.
    Waiting { state: FragmentState, candidates: usize },
    Linked(AppliedEdit),
    /// A suggestion session is open with this many candidates.
    Offered { candidates: usize },
}

/// What a key or pointer event did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputOutcome {
    /// The editor should handle the event natively.
    PassThrough,
    /// Handled; the editor must not act on it.
    Consumed,
    Linked(AppliedEdit),
    Undone(RestoredLine),
}

/// The auto-linking engine for one editor.
///
/// Owns every piece of mutable state (index, pending matches, undo ledger,
/// suppression flag, popup), so several engines can run side by side.
#[derive(Debug)]
pub struct AutoLinker {
    settings: Settings,
    mode: LinkMode,
    index: TitleIndex,
    active_path: Option<String>,
    disambiguator: Disambiguator,
    ledger: UndoLedger,
    suppression: Suppression,
    popup: SuggestionPopup,
    debouncer: Debouncer,
}

impl AutoLinker {
    pub fn new(settings: Settings) -> Self {
        let settings = settings.normalized();
        Self {
            mode: settings.link_mode(),
            debouncer: Debouncer::new(settings.debounce()),
            settings,
            index: TitleIndex::new(),
            active_path: None,
            disambiguator: Disambiguator::new(),
            ledger: UndoLedger::new(),
            suppression: Suppression::default(),
            popup: SuggestionPopup::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn mode(&self) -> LinkMode {
        self.mode
    }

    /// Swap settings and rebuild the index for the new scope.
    pub fn update_settings<H: SessionHost + ?Sized>(
        &mut self,
        settings: Settings,
        documents: &[Document],
        host: &mut H,
    ) {
        let settings = settings.normalized();
        self.mode = settings.link_mode();
        self.debouncer.set_delay(settings.debounce());
        self.settings = settings;
        self.popup.close(host);
        self.disambiguator.clear();
        self.rebuild_index(documents);
    }

    pub fn active_path(&self) -> Option<&str> {
        self.active_path.as_deref()
    }

    /// Switch the active document. Folder scope depends on it, so the index
    /// is rebuilt.
    pub fn set_active_document(&mut self, path: Option<&str>, documents: &[Document]) {
        self.active_path = path.map(str::to_string);
        self.disambiguator.clear();
        self.rebuild_index(documents);
    }

    pub fn rebuild_index(&mut self, documents: &[Document]) {
        let scope = self.settings.scope();
        self.index
            .rebuild(&scope, documents, self.active_path.as_deref(), &self.settings);
    }

    pub fn index(&self) -> &TitleIndex {
        &self.index
    }

    pub fn ledger(&self) -> &UndoLedger {
        &self.ledger
    }

    pub fn popup(&self) -> &SuggestionPopup {
        &self.popup
    }

    pub fn fragment_state(&self) -> FragmentState {
        self.disambiguator.state()
    }

    pub fn debouncer(&self) -> &Debouncer {
        &self.debouncer
    }

    pub fn debouncer_mut(&mut self) -> &mut Debouncer {
        &mut self.debouncer
    }

    pub fn is_suppressed(&mut self) -> bool {
        self.suppression.is_active(Instant::now())
    }

    /// Title of the active document, which never links to itself.
    fn excluded_title(&self) -> Option<String> {
        self.active_path
            .as_deref()
            .map(|path| Document::new(path).basename().to_string())
    }

    /// Candidates for arbitrary text, honoring the active-document exclusion.
    pub fn find_matches(&self, typed: &str) -> Vec<Candidate> {
        let excluded = self.excluded_title();
        find_matches(
            &self.index,
            typed,
            excluded.as_deref(),
            self.settings.max_suggestions,
        )
    }

    /// Evaluate the text before the cursor after an edit.
    pub fn on_text_changed<B, H>(&mut self, buffer: &mut B, host: &mut H) -> TextChangeOutcome
    where
        B: TextBuffer + ?Sized,
        H: SessionHost + ?Sized,
    {
        let now = Instant::now();
        if self.suppression.is_active(now) {
            self.popup.close(host);
            return TextChangeOutcome::Suppressed;
        }

        let cursor = buffer.cursor();
        let Some(line_text) = buffer.line(cursor.line) else {
            tracing::warn!("Cursor line {} is outside the buffer", cursor.line);
            return self.go_idle(host);
        };
        if is_inside_link(&line_text, cursor.column)
            || is_inside_code_span(&line_text, cursor.column)
        {
            return self.go_idle(host);
        }

        let excluded = self.excluded_title();
        let index = &self.index;
        let max = self.settings.max_suggestions;
        let evaluation = self.disambiguator.evaluate(
            &line_text,
            cursor.line,
            cursor.column,
            self.settings.min_word_length,
            |typed| find_matches(index, typed, excluded.as_deref(), max),
        );

        match decide(&self.mode, evaluation) {
            Decision::Idle => self.go_idle(host),
            Decision::Wait { candidates, .. } => {
                self.popup.close(host);
                TextChangeOutcome::Waiting {
                    state: self.disambiguator.state(),
                    candidates: candidates.len(),
                }
            }
            Decision::AutoApply {
                fragment,
                candidate,
            } => {
                self.popup.close(host);
                match self.link(buffer, cursor.line, &fragment, &candidate, now) {
                    Some(edit) => TextChangeOutcome::Linked(edit),
                    None => TextChangeOutcome::Idle,
                }
            }
            Decision::Offer {
                fragment,
                candidates,
            } => {
                let count = candidates.len();
                let session = SuggestionSession::new(
                    candidates,
                    cursor.line,
                    fragment,
                    self.mode.accept_keys(),
                );
                if self.popup.open(session, host) {
                    TextChangeOutcome::Offered { candidates: count }
                } else {
                    TextChangeOutcome::Idle
                }
            }
        }
    }

    /// Route a key press: the popup first, then Backspace/Delete undo.
    pub fn on_key<B, H>(
        &mut self,
        buffer: &mut B,
        host: &mut H,
        key: Key,
        ctx: &KeyContext,
    ) -> InputOutcome
    where
        B: TextBuffer + ?Sized,
        H: SessionHost + ?Sized,
    {
        let outcome = self.popup.handle_key(key, ctx, host);
        if let Some(result) = self.finish_session(buffer, outcome) {
            return result;
        }

        if matches!(key, Key::Backspace | Key::Delete)
            && ctx.origin == EventOrigin::Editor
            && !ctx.has_selection
        {
            return self.implicit_undo(buffer, host);
        }
        InputOutcome::PassThrough
    }

    pub fn on_pointer<B, H>(
        &mut self,
        buffer: &mut B,
        host: &mut H,
        action: PointerAction,
    ) -> InputOutcome
    where
        B: TextBuffer + ?Sized,
        H: SessionHost + ?Sized,
    {
        let outcome = self.popup.handle_pointer(action, host);
        self.finish_session(buffer, outcome)
            .unwrap_or(InputOutcome::PassThrough)
    }

    /// Explicit undo command: restore the latest record regardless of age.
    ///
    /// The record is consumed even when no line still holds its edit; the
    /// buffer is then left alone.
    pub fn undo<B, H>(&mut self, buffer: &mut B, host: &mut H) -> Option<RestoredLine>
    where
        B: TextBuffer + ?Sized,
        H: SessionHost + ?Sized,
    {
        let record = self.ledger.pop_latest()?;
        match record.restore(buffer) {
            Ok(Some(restored)) => Some(self.finish_undo(host, restored)),
            Ok(None) => {
                tracing::info!("Link to {} was edited since, nothing to undo", record.target);
                None
            }
            Err(e) => {
                tracing::warn!("Undo of link to {} failed: {}", record.target, e);
                None
            }
        }
    }

    fn implicit_undo<B, H>(&mut self, buffer: &mut B, host: &mut H) -> InputOutcome
    where
        B: TextBuffer + ?Sized,
        H: SessionHost + ?Sized,
    {
        let cursor = buffer.cursor();
        let Some(line_text) = buffer.line(cursor.line) else {
            return InputOutcome::PassThrough;
        };
        if !self.ledger.implicit_match(&line_text, cursor, Instant::now()) {
            return InputOutcome::PassThrough;
        }
        let Some(record) = self.ledger.latest().cloned() else {
            return InputOutcome::PassThrough;
        };
        // Text typed after the link stays; only the link itself reverts.
        let result = if line_text == record.edited_text {
            record.restore(buffer)
        } else {
            record.unlink_at(buffer, cursor)
        };
        match result {
            Ok(Some(restored)) => {
                self.ledger.pop_latest();
                InputOutcome::Undone(self.finish_undo(host, restored))
            }
            Ok(None) => InputOutcome::PassThrough,
            Err(e) => {
                tracing::warn!("Undo of link to {} failed: {}", record.target, e);
                InputOutcome::PassThrough
            }
        }
    }

    fn finish_undo<H>(&mut self, host: &mut H, restored: RestoredLine) -> RestoredLine
    where
        H: SessionHost + ?Sized,
    {
        self.suppression.activate(Instant::now());
        self.popup.close(host);
        self.disambiguator.clear();
        self.debouncer.cancel();
        tracing::info!("Undid link to {} on line {}", restored.target, restored.line);
        restored
    }

    /// Turn a popup outcome into an engine outcome; `None` means the popup
    /// did not handle the event.
    ///
    /// An accept whose fragment went stale (the user kept typing before the
    /// popup caught up) closes the session and lets the key through.
    fn finish_session<B>(
        &mut self,
        buffer: &mut B,
        outcome: SessionOutcome,
    ) -> Option<InputOutcome>
    where
        B: TextBuffer + ?Sized,
    {
        match outcome {
            SessionOutcome::PassThrough => None,
            SessionOutcome::Consumed | SessionOutcome::Closed => Some(InputOutcome::Consumed),
            SessionOutcome::Accepted { session, candidate } => {
                let now = Instant::now();
                let edit = self.link(buffer, session.line, &session.fragment, &candidate, now);
                Some(edit.map_or(InputOutcome::PassThrough, InputOutcome::Linked))
            }
        }
    }

    fn link<B>(
        &mut self,
        buffer: &mut B,
        line: usize,
        fragment: &Fragment,
        candidate: &Candidate,
        now: Instant,
    ) -> Option<AppliedEdit>
    where
        B: TextBuffer + ?Sized,
    {
        self.disambiguator.clear();
        match apply_link(buffer, line, fragment, candidate, &mut self.ledger, now) {
            Ok(edit) => Some(edit),
            Err(e) => {
                tracing::warn!("Could not link {:?}: {}", fragment.text, e);
                None
            }
        }
    }

    fn go_idle<H: SessionHost + ?Sized>(&mut self, host: &mut H) -> TextChangeOutcome {
        self.popup.close(host);
        self.disambiguator.clear();
        TextChangeOutcome::Idle
    }
}
