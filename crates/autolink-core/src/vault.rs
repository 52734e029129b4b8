use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Folder entry that matches every path in custom scope.
pub const ROOT_FOLDER: &str = "/";

/// What a link points at: the document basename used inside `[[ ]]` and its
/// vault-relative path.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetRef {
    pub id: String,
    pub path: String,
}

/// A linkable document as reported by the host.
///
/// `aliases` holds the raw frontmatter value; it may be a string, a list, or
/// anything else the author typed. Only string entries survive `alias_list`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub path: String,
    #[serde(default)]
    pub aliases: Option<Value>,
}

impl Document {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            aliases: None,
        }
    }

    pub fn with_aliases(mut self, aliases: Value) -> Self {
        self.aliases = Some(aliases);
        self
    }

    /// File name without folder and `.md` extension, e.g. "Deep Work" for
    /// "Areas/Deep Work.md".
    pub fn basename(&self) -> &str {
        let file = self.path.rsplit('/').next().unwrap_or(&self.path);
        file.strip_suffix(".md").unwrap_or(file)
    }

    /// Parent folder without trailing slash; empty for documents at the root.
    pub fn parent_folder(&self) -> &str {
        let trimmed = self.path.trim_start_matches('/');
        match trimmed.rfind('/') {
            Some(idx) => &trimmed[..idx],
            None => "",
        }
    }

    pub fn target(&self) -> TargetRef {
        TargetRef {
            id: self.basename().to_string(),
            path: self.path.clone(),
        }
    }

    /// Declared aliases, trimmed. Non-string and blank entries are dropped.
    pub fn alias_list(&self) -> Vec<String> {
        let Some(value) = &self.aliases else {
            return Vec::new();
        };
        let raw: Vec<&str> = match value {
            Value::String(s) => vec![s.as_str()],
            Value::Array(items) => items.iter().filter_map(|v| v.as_str()).collect(),
            _ => Vec::new(),
        };
        raw.into_iter()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Which documents are eligible link targets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScopeMode {
    /// Every document in the vault.
    Global,
    /// Only documents sharing the active document's parent folder.
    Folder,
    /// Only documents under one of the listed folders.
    Custom(Vec<String>),
}

impl ScopeMode {
    /// Select the relevant documents. Folder scope without an active document
    /// falls back to the whole vault.
    pub fn select<'a>(
        &self,
        documents: &'a [Document],
        active_path: Option<&str>,
    ) -> Vec<&'a Document> {
        match self {
            ScopeMode::Global => documents.iter().collect(),
            ScopeMode::Folder => {
                let Some(active) = active_path else {
                    return documents.iter().collect();
                };
                let folder = Document::new(active).parent_folder().to_string();
                documents
                    .iter()
                    .filter(|doc| doc.parent_folder() == folder)
                    .collect()
            }
            ScopeMode::Custom(folders) => {
                if folders.is_empty() {
                    return documents.iter().collect();
                }
                documents
                    .iter()
                    .filter(|doc| folders.iter().any(|f| path_in_folder(&doc.path, f)))
                    .collect()
            }
        }
    }
}

/// True if `path` lives under `folder`. The root sentinel matches everything.
pub fn path_in_folder(path: &str, folder: &str) -> bool {
    let folder = folder.trim_matches('/');
    if folder.is_empty() {
        return true;
    }
    let path = path.trim_start_matches('/');
    path.strip_prefix(folder)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Document lifecycle notifications from the host.
#[derive(Clone, Debug, PartialEq)]
pub enum VaultEvent {
    Created(Document),
    Renamed { old_path: String, document: Document },
    Deleted { path: String },
    /// Metadata (aliases) changed without a rename.
    Modified(Document),
}

/// The host's current set of linkable documents, in the order the host
/// reported them. Index iteration order (and therefore candidate order)
/// follows this order.
#[derive(Clone, Debug, Default)]
pub struct DocumentSet {
    documents: Vec<Document>,
}

impl DocumentSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_documents(documents: Vec<Document>) -> Self {
        let mut set = Self::new();
        for doc in documents {
            set.upsert(doc);
        }
        set
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn resolve_path(&self, path: &str) -> Option<&Document> {
        self.documents.iter().find(|doc| doc.path == path)
    }

    pub fn all_paths(&self) -> Vec<String> {
        self.documents.iter().map(|doc| doc.path.clone()).collect()
    }

    /// Replace the document with the same path in place, or append it.
    fn upsert(&mut self, document: Document) {
        match self.documents.iter_mut().find(|doc| doc.path == document.path) {
            Some(existing) => *existing = document,
            None => self.documents.push(document),
        }
    }

    /// Apply a lifecycle event. Returns true if the set changed and the title
    /// index needs a rebuild.
    pub fn apply(&mut self, event: VaultEvent) -> bool {
        match event {
            VaultEvent::Created(doc) | VaultEvent::Modified(doc) => {
                self.upsert(doc);
                true
            }
            VaultEvent::Renamed { old_path, document } => {
                // A rename onto an occupied path replaces the occupant.
                if old_path != document.path {
                    self.documents.retain(|doc| doc.path != document.path);
                }
                match self.documents.iter().position(|doc| doc.path == old_path) {
                    Some(idx) => self.documents[idx] = document,
                    None => {
                        tracing::warn!("Rename of unknown document {}, adding as new", old_path);
                        self.documents.push(document);
                    }
                }
                true
            }
            VaultEvent::Deleted { path } => {
                let before = self.documents.len();
                self.documents.retain(|doc| doc.path != path);
                before != self.documents.len()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn docs(paths: &[&str]) -> Vec<Document> {
        paths.iter().map(|p| Document::new(*p)).collect()
    }

    // === Document tests ===

    #[test]
    fn basename_strips_folder_and_extension() {
        assert_eq!(Document::new("Areas/Deep Work.md").basename(), "Deep Work");
        assert_eq!(Document::new("Inbox.md").basename(), "Inbox");
    }

    #[test]
    fn parent_folder_of_root_document_is_empty() {
        assert_eq!(Document::new("Inbox.md").parent_folder(), "");
        assert_eq!(Document::new("/Inbox.md").parent_folder(), "");
        assert_eq!(Document::new("A/B/Note.md").parent_folder(), "A/B");
    }

    #[test]
    fn alias_list_accepts_single_string() {
        let doc = Document::new("Deep Work.md").with_aliases(json!("Focus"));
        assert_eq!(doc.alias_list(), vec!["Focus"]);
    }

    #[test]
    fn alias_list_drops_non_strings_and_blanks() {
        let doc = Document::new("Deep Work.md")
            .with_aliases(json!(["Focus", 42, "  ", null, " Flow "]));
        assert_eq!(doc.alias_list(), vec!["Focus", "Flow"]);
    }

    #[test]
    fn alias_list_ignores_objects() {
        let doc = Document::new("Deep Work.md").with_aliases(json!({"name": "Focus"}));
        assert!(doc.alias_list().is_empty());
    }

    // === ScopeMode tests ===

    #[test]
    fn folder_scope_keeps_siblings_only() {
        let all = docs(&["Projects/Alpha.md", "Projects/Beta.md", "Archive/Alpha Old.md"]);
        let selected = ScopeMode::Folder.select(&all, Some("Projects/Current.md"));
        let paths: Vec<&str> = selected.iter().map(|d| d.path.as_str()).collect();
        assert_eq!(paths, vec!["Projects/Alpha.md", "Projects/Beta.md"]);
    }

    #[test]
    fn folder_scope_without_active_document_is_global() {
        let all = docs(&["Projects/Alpha.md", "Archive/Beta.md"]);
        assert_eq!(ScopeMode::Folder.select(&all, None).len(), 2);
    }

    #[test]
    fn custom_scope_filters_by_folder_prefix() {
        let all = docs(&["Projects/Alpha.md", "Projects2/Beta.md", "Areas/Work/Gamma.md"]);
        let scope = ScopeMode::Custom(vec!["Projects".into(), "Areas/Work/".into()]);
        let paths: Vec<&str> = scope.select(&all, None).iter().map(|d| d.path.as_str()).collect();
        assert_eq!(paths, vec!["Projects/Alpha.md", "Areas/Work/Gamma.md"]);
    }

    #[test]
    fn root_sentinel_matches_every_path() {
        let all = docs(&["Projects/Alpha.md", "Top.md"]);
        let scope = ScopeMode::Custom(vec![ROOT_FOLDER.into()]);
        assert_eq!(scope.select(&all, None).len(), 2);
    }

    // === DocumentSet tests ===

    #[test]
    fn rename_replaces_in_place() {
        let mut set = DocumentSet::from_documents(docs(&["A.md", "B.md", "C.md"]));
        let changed = set.apply(VaultEvent::Renamed {
            old_path: "B.md".into(),
            document: Document::new("Folder/Bee.md"),
        });
        assert!(changed);
        assert_eq!(set.all_paths(), vec!["A.md", "Folder/Bee.md", "C.md"]);
    }

    #[test]
    fn delete_removes_document() {
        let mut set = DocumentSet::from_documents(docs(&["A.md", "B.md"]));
        assert!(set.apply(VaultEvent::Deleted { path: "A.md".into() }));
        assert!(set.resolve_path("A.md").is_none());
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn delete_of_unknown_path_reports_no_change() {
        let mut set = DocumentSet::from_documents(docs(&["A.md"]));
        assert!(!set.apply(VaultEvent::Deleted { path: "Z.md".into() }));
    }

    #[test]
    fn modified_updates_aliases() {
        let mut set = DocumentSet::from_documents(docs(&["Deep Work.md"]));
        set.apply(VaultEvent::Modified(
            Document::new("Deep Work.md").with_aliases(json!(["Focus"])),
        ));
        let doc = set.resolve_path("Deep Work.md").unwrap();
        assert_eq!(doc.alias_list(), vec!["Focus"]);
        assert_eq!(set.len(), 1);
    }
}
