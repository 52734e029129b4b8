use autolink_core::{Document, VaultEvent};
use serde::Deserialize;
use serde_json::Value;

use super::parse_params;
use crate::server::Server;

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
enum ChangeKind {
    Created,
    Renamed,
    Deleted,
    Modified,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VaultChangedParams {
    kind: ChangeKind,
    path: String,
    old_path: Option<String>,
    aliases: Option<Value>,
}

impl VaultChangedParams {
    fn into_event(self) -> Result<VaultEvent, String> {
        let document = || match &self.aliases {
            Some(aliases) => Document::new(self.path.clone()).with_aliases(aliases.clone()),
            None => Document::new(self.path.clone()),
        };
        Ok(match self.kind {
            ChangeKind::Created => VaultEvent::Created(document()),
            ChangeKind::Modified => VaultEvent::Modified(document()),
            ChangeKind::Deleted => VaultEvent::Deleted {
                path: self.path.clone(),
            },
            ChangeKind::Renamed => VaultEvent::Renamed {
                old_path: self.old_path.clone().ok_or_else(|| {
                    "Invalid params: `oldPath` is required for renames".to_string()
                })?,
                document: document(),
            },
        })
    }
}

/// `vault/changed`: a document was created, renamed, deleted or had its
/// aliases edited. Every session's index is rebuilt from the new set.
pub fn execute(server: &Server, params: Option<&Value>) -> Result<bool, String> {
    let params: VaultChangedParams = parse_params(params)?;
    let kind = params.kind;
    let event = params.into_event()?;
    let changed = server.apply_vault_event(event);
    tracing::info!("Vault change {:?} applied (index rebuilt: {})", kind, changed);
    Ok(changed)
}
