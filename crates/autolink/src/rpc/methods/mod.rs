pub mod document;
pub mod input;
pub mod settings;
pub mod text;
pub mod vault;

use autolink_core::edit::AppliedEdit;
use autolink_core::undo::RestoredLine;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::session::EditorSession;
use crate::server::Server;

/// Deserialize method params, reporting failures as invalid-params messages.
pub fn parse_params<T: DeserializeOwned>(params: Option<&Value>) -> Result<T, String> {
    let params = params.cloned().unwrap_or(Value::Null);
    serde_json::from_value(params).map_err(|e| format!("Invalid params: {}", e))
}

/// Run `f` on the named session, or fail with an error naming the session.
pub fn with_session<R>(
    server: &Server,
    session_id: &str,
    f: impl FnOnce(&mut EditorSession) -> R,
) -> Result<R, String> {
    server
        .sessions()
        .with_session(session_id, f)
        .ok_or_else(|| format!("Unknown session: {}", session_id))
}

pub fn edit_json(edit: &AppliedEdit) -> Value {
    serde_json::to_value(edit).unwrap_or(Value::Null)
}

pub fn restore_json(restored: &RestoredLine) -> Value {
    serde_json::to_value(restored).unwrap_or(Value::Null)
}
