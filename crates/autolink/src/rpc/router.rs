use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::jsonrpc::{
    error_response, success_response, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse,
    INVALID_PARAMS, METHOD_NOT_FOUND,
};
use super::methods::{self, parse_params};
use crate::server::Server;

/// Dispatch a JSON-RPC request to the appropriate handler.
pub fn dispatch_request(server: &Server, request: &JsonRpcRequest) -> JsonRpcResponse {
    let id = request.id.clone();
    let params = request.params.as_ref();
    debug!("Request {}", request.method);

    let result = match request.method.as_str() {
        "initialize" => handle_initialize(server, params),
        "ping" => Ok(json!({})),
        "document/open" => methods::document::execute(server, params),
        "key/down" => methods::input::key_down(server, params),
        "pointer" => methods::input::pointer(server, params),
        "undo" => methods::input::undo(server, params),
        "settings/update" => methods::settings::execute(server, params),
        other => {
            return error_response(id, METHOD_NOT_FOUND, format!("Method not found: {}", other));
        }
    };

    match result {
        Ok(value) => success_response(id, value),
        Err(message) => error_response(id, INVALID_PARAMS, message),
    }
}

/// Handle a JSON-RPC notification (no response expected).
pub fn handle_notification(server: &Server, notification: &JsonRpcNotification) {
    let params = notification.params.as_ref();
    let result = match notification.method.as_str() {
        "text/changed" => methods::text::execute(server, params),
        "vault/changed" => methods::vault::execute(server, params).map(|_| ()),
        "notifications/cancelled" => Ok(()),
        other => {
            debug!("Ignoring unknown notification {}", other);
            Ok(())
        }
    };
    if let Err(e) = result {
        warn!("Notification {} failed: {}", notification.method, e);
    }
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct InitializeParams {
    client_info: Option<ClientInfo>,
}

#[derive(Deserialize)]
struct ClientInfo {
    name: String,
}

fn handle_initialize(server: &Server, params: Option<&Value>) -> Result<Value, String> {
    let params: InitializeParams = match params {
        Some(_) => parse_params(params)?,
        None => InitializeParams::default(),
    };
    let client_name = params.client_info.map(|info| info.name);
    let session_id = server.create_session(client_name);
    Ok(json!({
        "sessionId": session_id,
        "serverInfo": {
            "name": "autolink",
            "version": env!("CARGO_PKG_VERSION"),
        },
        "settings": server.settings(),
    }))
}
