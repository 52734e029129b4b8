use autolink_core::Settings;
use serde_json::Value;

use super::parse_params;
use crate::server::Server;

/// `settings/update`: replace the settings of every session. Keys missing
/// from the object take their defaults.
pub fn execute(server: &Server, params: Option<&Value>) -> Result<Value, String> {
    let settings: Settings = parse_params(params)?;
    let applied = server.update_settings(settings);
    serde_json::to_value(applied).map_err(|e| format!("Failed to encode settings: {}", e))
}
