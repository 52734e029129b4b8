use autolink_core::{EventOrigin, InputOutcome, Key, KeyContext, PointerAction};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{edit_json, parse_params, restore_json, with_session};
use crate::server::Server;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeyParams {
    session_id: String,
    key: Key,
    #[serde(default)]
    origin: EventOrigin,
    #[serde(default)]
    has_selection: bool,
    #[serde(default)]
    native_accept_conflict: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PointerParams {
    session_id: String,
    #[serde(flatten)]
    action: PointerAction,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UndoParams {
    session_id: String,
}

/// `{consumed, edits?}` for the host. `consumed` tells it to skip its own
/// handling of the event.
fn outcome_json(outcome: &InputOutcome) -> Value {
    match outcome {
        InputOutcome::PassThrough => json!({ "consumed": false }),
        InputOutcome::Consumed => json!({ "consumed": true }),
        InputOutcome::Linked(edit) => json!({ "consumed": true, "edits": [edit_json(edit)] }),
        InputOutcome::Undone(restored) => {
            json!({ "consumed": true, "edits": [restore_json(restored)] })
        }
    }
}

/// `key/down`: route a key press before the editor handles it.
pub fn key_down(server: &Server, params: Option<&Value>) -> Result<Value, String> {
    let params: KeyParams = parse_params(params)?;
    let ctx = KeyContext {
        origin: params.origin,
        has_selection: params.has_selection,
        native_accept_conflict: params.native_accept_conflict,
    };
    with_session(server, &params.session_id, |session| {
        let outcome = session
            .engine
            .on_key(&mut session.buffer, &mut session.host, params.key, &ctx);
        outcome_json(&outcome)
    })
}

/// `pointer`: hover, click or click-outside on the suggestion list.
pub fn pointer(server: &Server, params: Option<&Value>) -> Result<Value, String> {
    let params: PointerParams = parse_params(params)?;
    with_session(server, &params.session_id, |session| {
        let outcome = session
            .engine
            .on_pointer(&mut session.buffer, &mut session.host, params.action);
        outcome_json(&outcome)
    })
}

/// `undo`: explicit undo of the most recent link, regardless of its age.
pub fn undo(server: &Server, params: Option<&Value>) -> Result<Value, String> {
    let params: UndoParams = parse_params(params)?;
    with_session(server, &params.session_id, |session| {
        match session.engine.undo(&mut session.buffer, &mut session.host) {
            Some(restored) => json!({ "undone": true, "edits": [restore_json(&restored)] }),
            None => json!({ "undone": false }),
        }
    })
}
