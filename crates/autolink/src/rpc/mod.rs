pub mod jsonrpc;
pub mod methods;
pub mod router;
pub mod session;

pub use jsonrpc::{JsonRpcMessage, JsonRpcResponse};
pub use router::{dispatch_request, handle_notification};
pub use session::SessionManager;

use crate::server::Server;

/// Handle one line of input. Returns the response to write, if the message
/// was a request (or could not be parsed).
pub fn handle_line(server: &Server, line: &str) -> Option<JsonRpcResponse> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match jsonrpc::parse_message(line) {
        Ok(JsonRpcMessage::Request(request)) => Some(dispatch_request(server, &request)),
        Ok(JsonRpcMessage::Notification(notification)) => {
            handle_notification(server, &notification);
            None
        }
        Err(response) => Some(response),
    }
}
