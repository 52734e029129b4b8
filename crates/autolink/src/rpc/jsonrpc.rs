use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: Value,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcNotification {
    pub fn new(method: &str, params: Value) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            method: method.into(),
            params: Some(params),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// An incoming message: requests carry an `id`, notifications do not.
#[derive(Clone, Debug)]
pub enum JsonRpcMessage {
    Request(JsonRpcRequest),
    Notification(JsonRpcNotification),
}

pub fn success_response(id: Value, result: Value) -> JsonRpcResponse {
    JsonRpcResponse {
        jsonrpc: "2.0".into(),
        id,
        result: Some(result),
        error: None,
    }
}

pub fn error_response(id: Value, code: i32, message: impl Into<String>) -> JsonRpcResponse {
    JsonRpcResponse {
        jsonrpc: "2.0".into(),
        id,
        result: None,
        error: Some(JsonRpcError {
            code,
            message: message.into(),
            data: None,
        }),
    }
}

/// Parse one line of input. Failures come back as the error response to
/// send (with a null id, since none could be read).
pub fn parse_message(line: &str) -> Result<JsonRpcMessage, JsonRpcResponse> {
    let value: Value = serde_json::from_str(line)
        .map_err(|e| error_response(Value::Null, PARSE_ERROR, format!("Parse error: {}", e)))?;

    if value.get("jsonrpc").and_then(Value::as_str) != Some("2.0") {
        let id = value.get("id").cloned().unwrap_or(Value::Null);
        return Err(error_response(id, INVALID_REQUEST, "Invalid request: jsonrpc must be \"2.0\""));
    }

    let message = if value.get("id").is_some() {
        serde_json::from_value(value).map(JsonRpcMessage::Request)
    } else {
        serde_json::from_value(value).map(JsonRpcMessage::Notification)
    };
    message.map_err(|e| {
        error_response(Value::Null, INVALID_REQUEST, format!("Invalid request: {}", e))
    })
}
