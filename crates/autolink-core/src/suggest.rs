use crate::config::AcceptKeys;
use crate::error::Result;
use crate::fragment::Fragment;
use crate::resolver::Candidate;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Key {
    ArrowUp,
    ArrowDown,
    Enter,
    Tab,
    Escape,
    Backspace,
    Delete,
    /// A number key, 0–9.
    Digit(u8),
    Other,
}

/// Where a key or pointer event came from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventOrigin {
    #[default]
    Editor,
    Session,
    Elsewhere,
}

/// Host state that decides whether a key may be intercepted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KeyContext {
    pub origin: EventOrigin,
    pub has_selection: bool,
    /// The accept key means something else at the caret (e.g. Enter
    /// continuing a list item).
    pub native_accept_conflict: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "action", content = "index")]
pub enum PointerAction {
    Hover(usize),
    Click(usize),
    ClickOutside,
}

/// What the host should render for an open session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView<'a> {
    pub candidates: &'a [Candidate],
    pub selected: usize,
    pub fragment: &'a str,
}

/// Host side of the popup. The engine never takes focus; it only asks the
/// host to show, refresh and hide the candidate list.
pub trait SessionHost {
    fn mount(&mut self, view: &SessionView<'_>) -> Result<()>;
    fn update(&mut self, view: &SessionView<'_>);
    fn unmount(&mut self);
}

/// Host without any UI, for headless use.
#[derive(Debug, Default)]
pub struct HeadlessHost;

impl SessionHost for HeadlessHost {
    fn mount(&mut self, _view: &SessionView<'_>) -> Result<()> {
        Ok(())
    }

    fn update(&mut self, _view: &SessionView<'_>) {}

    fn unmount(&mut self) {}
}

/// An open candidate list tied to the fragment it was computed for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SuggestionSession {
    pub candidates: Vec<Candidate>,
    pub selected: usize,
    pub line: usize,
    pub fragment: Fragment,
    pub accept_keys: AcceptKeys,
}

impl SuggestionSession {
    pub fn new(
        candidates: Vec<Candidate>,
        line: usize,
        fragment: Fragment,
        accept_keys: AcceptKeys,
    ) -> Self {
        Self {
            candidates,
            selected: 0,
            line,
            fragment,
            accept_keys,
        }
    }

    pub fn view(&self) -> SessionView<'_> {
        SessionView {
            candidates: &self.candidates,
            selected: self.selected,
            fragment: &self.fragment.text,
        }
    }

    /// Move the selection forward, wrapping to the first item.
    pub fn select_next(&mut self) {
        if !self.candidates.is_empty() {
            self.selected = (self.selected + 1) % self.candidates.len();
        }
    }

    /// Move the selection backward, wrapping to the last item.
    pub fn select_previous(&mut self) {
        let len = self.candidates.len();
        if len > 0 {
            self.selected = (self.selected + len - 1) % len;
        }
    }

    pub fn set_selected_index(&mut self, index: usize) -> bool {
        if index < self.candidates.len() {
            self.selected = index;
            true
        } else {
            false
        }
    }

    pub fn selected_candidate(&self) -> Option<&Candidate> {
        self.candidates.get(self.selected)
    }
}

/// Result of routing an event through the popup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Not ours; the editor handles the event natively.
    PassThrough,
    /// Handled; the editor must not also act on it.
    Consumed,
    /// The session closed without changing text.
    Closed,
    /// The user picked a candidate; the session is closed.
    Accepted {
        session: SuggestionSession,
        candidate: Candidate,
    },
}

/// Single owner of the (at most one) open suggestion session.
///
/// Lifecycle: closed -> open -> {accepted, cancelled} -> closed. Opening a
/// new session supersedes the current one.
#[derive(Debug, Default)]
pub struct SuggestionPopup {
    session: Option<SuggestionSession>,
}

impl SuggestionPopup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&SuggestionSession> {
        self.session.as_ref()
    }

    /// Show `session`, replacing any open one. An open popup is refreshed in
    /// place; a fresh mount that fails is torn down and nothing stays open.
    pub fn open<H: SessionHost + ?Sized>(
        &mut self,
        session: SuggestionSession,
        host: &mut H,
    ) -> bool {
        if self.session.is_some() {
            host.update(&session.view());
            self.session = Some(session);
            return true;
        }
        match host.mount(&session.view()) {
            Ok(()) => {
                self.session = Some(session);
                true
            }
            Err(e) => {
                tracing::warn!("Suggestion popup unavailable, continuing without it: {}", e);
                host.unmount();
                false
            }
        }
    }

    pub fn close<H: SessionHost + ?Sized>(&mut self, host: &mut H) {
        if self.session.take().is_some() {
            host.unmount();
        }
    }

    pub fn handle_key<H: SessionHost + ?Sized>(
        &mut self,
        key: Key,
        ctx: &KeyContext,
        host: &mut H,
    ) -> SessionOutcome {
        let Some(session) = self.session.as_mut() else {
            return SessionOutcome::PassThrough;
        };
        if ctx.origin == EventOrigin::Elsewhere || ctx.has_selection {
            return SessionOutcome::PassThrough;
        }

        match key {
            Key::ArrowDown => {
                session.select_next();
                host.update(&session.view());
                SessionOutcome::Consumed
            }
            Key::ArrowUp => {
                session.select_previous();
                host.update(&session.view());
                SessionOutcome::Consumed
            }
            Key::Digit(n @ 1..=9) => {
                if session.set_selected_index(usize::from(n) - 1) {
                    self.accept(host)
                } else {
                    SessionOutcome::PassThrough
                }
            }
            Key::Enter | Key::Tab => {
                let enabled = match key {
                    Key::Enter => session.accept_keys.enter,
                    _ => session.accept_keys.tab,
                };
                if enabled && !ctx.native_accept_conflict {
                    self.accept(host)
                } else {
                    SessionOutcome::PassThrough
                }
            }
            Key::Escape => {
                self.close(host);
                SessionOutcome::Closed
            }
            _ => SessionOutcome::PassThrough,
        }
    }

    pub fn handle_pointer<H: SessionHost + ?Sized>(
        &mut self,
        action: PointerAction,
        host: &mut H,
    ) -> SessionOutcome {
        let Some(session) = self.session.as_mut() else {
            return SessionOutcome::PassThrough;
        };
        match action {
            PointerAction::Hover(index) => {
                if session.set_selected_index(index) {
                    host.update(&session.view());
                }
                SessionOutcome::Consumed
            }
            PointerAction::Click(index) => {
                if session.set_selected_index(index) {
                    self.accept(host)
                } else {
                    SessionOutcome::Consumed
                }
            }
            PointerAction::ClickOutside => {
                self.close(host);
                SessionOutcome::Closed
            }
        }
    }

    fn accept<H: SessionHost + ?Sized>(&mut self, host: &mut H) -> SessionOutcome {
        let Some(session) = self.session.take() else {
            return SessionOutcome::PassThrough;
        };
        host.unmount();
        match session.selected_candidate().cloned() {
            Some(candidate) => SessionOutcome::Accepted { session, candidate },
            None => SessionOutcome::Closed,
        }
    }
}
