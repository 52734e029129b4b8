use autolink_core::{
    AutoLinker, Document, LineBuffer, Result as CoreResult, SessionHost, SessionView, Settings,
    TextChangeOutcome,
};
use dashmap::DashMap;
use serde_json::{json, Value};
use tokio::time::Instant;
use tracing::debug;

use super::jsonrpc::JsonRpcNotification;

/// Turns popup lifecycle calls into `suggestions/*` notifications for one
/// editor session. Queued until the transport drains them.
#[derive(Debug)]
pub struct NotifyingHost {
    session_id: String,
    outbox: Vec<JsonRpcNotification>,
}

impl NotifyingHost {
    pub fn new(session_id: String) -> Self {
        Self {
            session_id,
            outbox: Vec::new(),
        }
    }

    pub fn push(&mut self, method: &str, mut params: Value) {
        if let Value::Object(map) = &mut params {
            map.insert("sessionId".into(), Value::String(self.session_id.clone()));
        }
        self.outbox.push(JsonRpcNotification::new(method, params));
    }

    pub fn drain(&mut self) -> Vec<JsonRpcNotification> {
        std::mem::take(&mut self.outbox)
    }

    fn show(&mut self, view: &SessionView<'_>) {
        let view = serde_json::to_value(view).unwrap_or(Value::Null);
        self.push("suggestions/show", json!({ "view": view }));
    }
}

impl SessionHost for NotifyingHost {
    fn mount(&mut self, view: &SessionView<'_>) -> CoreResult<()> {
        self.show(view);
        Ok(())
    }

    fn update(&mut self, view: &SessionView<'_>) {
        self.show(view);
    }

    fn unmount(&mut self) {
        self.push("suggestions/hide", json!({}));
    }
}

/// One connected editor: its engine, its mirrored buffer and its popup host.
#[derive(Debug)]
pub struct EditorSession {
    pub client_name: Option<String>,
    pub engine: AutoLinker,
    pub buffer: LineBuffer,
    pub host: NotifyingHost,
}

impl EditorSession {
    /// Run the debounced evaluation. Edits the engine made are queued as an
    /// `edits/apply` notification.
    pub fn evaluate(&mut self) -> TextChangeOutcome {
        let outcome = self.engine.on_text_changed(&mut self.buffer, &mut self.host);
        debug!(client = ?self.client_name, "Evaluation outcome: {:?}", outcome);
        if let TextChangeOutcome::Linked(edit) = &outcome {
            let edit = serde_json::to_value(edit).unwrap_or(Value::Null);
            self.host.push("edits/apply", json!({ "edits": [edit] }));
        }
        outcome
    }
}

pub struct SessionManager {
    sessions: DashMap<String, EditorSession>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    pub fn create_session(
        &self,
        client_name: Option<String>,
        settings: &Settings,
        documents: &[Document],
    ) -> String {
        let session_id = nanoid::nanoid!(32);
        let mut engine = AutoLinker::new(settings.clone());
        engine.rebuild_index(documents);
        let session = EditorSession {
            client_name,
            engine,
            buffer: LineBuffer::default(),
            host: NotifyingHost::new(session_id.clone()),
        };
        self.sessions.insert(session_id.clone(), session);
        session_id
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Run `f` against one session; `None` if the id is unknown.
    pub fn with_session<R>(
        &self,
        session_id: &str,
        f: impl FnOnce(&mut EditorSession) -> R,
    ) -> Option<R> {
        let mut session = self.sessions.get_mut(session_id)?;
        Some(f(&mut session))
    }

    pub fn for_each(&self, mut f: impl FnMut(&mut EditorSession)) {
        for mut entry in self.sessions.iter_mut() {
            f(entry.value_mut());
        }
    }

    /// Earliest pending debounce deadline across sessions.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.sessions
            .iter()
            .filter_map(|entry| entry.value().engine.debouncer().deadline())
            .min()
    }

    /// Evaluate every session whose debounce has elapsed.
    pub fn fire_due(&self, now: Instant) -> usize {
        let mut fired = 0;
        self.for_each(|session| {
            if session.engine.debouncer_mut().take_ready(now) {
                session.evaluate();
                fired += 1;
            }
        });
        fired
    }

    pub fn drain_notifications(&self) -> Vec<JsonRpcNotification> {
        let mut out = Vec::new();
        self.for_each(|session| out.extend(session.host.drain()));
        out
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}
