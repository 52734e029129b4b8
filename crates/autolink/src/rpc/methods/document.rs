use autolink_core::{Position, TextBuffer};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{parse_params, with_session};
use crate::server::Server;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OpenParams {
    session_id: String,
    path: String,
    #[serde(default)]
    lines: Vec<String>,
    #[serde(default)]
    cursor: Position,
}

/// `document/open`: make `path` the active document and mirror its text.
pub fn execute(server: &Server, params: Option<&Value>) -> Result<Value, String> {
    let params: OpenParams = parse_params(params)?;
    let documents = server.documents();
    if documents.resolve_path(&params.path).is_none() {
        tracing::debug!("Opened document {} is not in the vault", params.path);
    }

    with_session(server, &params.session_id, |session| {
        session.buffer.replace_all(params.lines);
        session.buffer.set_cursor(params.cursor);
        session.engine.debouncer_mut().cancel();
        session
            .engine
            .set_active_document(Some(&params.path), documents.documents());
        json!({
            "path": params.path,
            "indexed": session.engine.index().len(),
        })
    })
}
