use autolink_core::{Position, TextBuffer};
use serde::Deserialize;
use serde_json::Value;
use tokio::time::Instant;

use super::{parse_params, with_session};
use crate::server::Server;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChangedParams {
    session_id: String,
    /// Full content; when absent only `line` is replaced.
    lines: Option<Vec<String>>,
    line: Option<usize>,
    text: Option<String>,
    cursor: Position,
}

/// `text/changed`: mirror the edit and (re)start the debounce timer. The
/// evaluation itself runs when the timer fires.
pub fn execute(server: &Server, params: Option<&Value>) -> Result<(), String> {
    let params: ChangedParams = parse_params(params)?;
    let now = Instant::now();

    with_session(server, &params.session_id, |session| {
        match (params.lines, params.line, params.text) {
            (Some(lines), _, _) => session.buffer.replace_all(lines),
            (None, Some(line), Some(text)) => {
                let mut lines = session.buffer.lines().to_vec();
                if line >= lines.len() {
                    lines.resize(line + 1, String::new());
                }
                lines[line] = text;
                session.buffer.replace_all(lines);
            }
            _ => return Err("Invalid params: expected `lines` or `line` and `text`".to_string()),
        }
        session.buffer.set_cursor(params.cursor);
        session.engine.debouncer_mut().touch(now);
        Ok(())
    })?
}
