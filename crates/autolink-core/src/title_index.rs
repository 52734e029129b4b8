use crate::config::Settings;
use crate::vault::{Document, ScopeMode, TargetRef};
use std::collections::HashMap;

/// A linkable title. `key` is the normalized form used for matching,
/// `display` the title as written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TitleEntry {
    pub key: String,
    pub display: String,
    pub target: TargetRef,
}

/// An alias declared in a document's metadata, pointing at that document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AliasEntry {
    pub key: String,
    pub alias: String,
    pub target: TargetRef,
}

/// Normalize text for matching: case-folded unless case-sensitive.
pub fn normalize_key(text: &str, case_sensitive: bool) -> String {
    if case_sensitive {
        text.to_string()
    } else {
        text.to_lowercase()
    }
}

/// Searchable set of titles and aliases for the current scope.
///
/// Keys are unique per normalization; a later document with the same key
/// replaces the earlier target but keeps its slot, so iteration order stays
/// the order keys were first seen. The index is only ever rebuilt wholesale.
#[derive(Debug, Default)]
pub struct TitleIndex {
    titles: Vec<TitleEntry>,
    title_slots: HashMap<String, usize>,
    aliases: Vec<AliasEntry>,
    alias_slots: HashMap<String, usize>,
    case_sensitive: bool,
}

impl TitleIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute every entry from the relevant documents.
    pub fn rebuild(
        &mut self,
        scope: &ScopeMode,
        documents: &[Document],
        active_path: Option<&str>,
        settings: &Settings,
    ) {
        self.titles.clear();
        self.title_slots.clear();
        self.aliases.clear();
        self.alias_slots.clear();
        self.case_sensitive = settings.case_sensitive;

        let relevant = scope.select(documents, active_path);
        for doc in &relevant {
            let target = doc.target();
            let key = self.normalize(doc.basename());
            let entry = TitleEntry {
                key: key.clone(),
                display: doc.basename().to_string(),
                target: target.clone(),
            };
            match self.title_slots.get(&key) {
                Some(&slot) => self.titles[slot] = entry,
                None => {
                    self.title_slots.insert(key, self.titles.len());
                    self.titles.push(entry);
                }
            }

            if !settings.include_aliases {
                continue;
            }
            for alias in doc.alias_list() {
                let key = self.normalize(&alias);
                let entry = AliasEntry {
                    key: key.clone(),
                    alias,
                    target: target.clone(),
                };
                match self.alias_slots.get(&key) {
                    Some(&slot) => self.aliases[slot] = entry,
                    None => {
                        self.alias_slots.insert(key, self.aliases.len());
                        self.aliases.push(entry);
                    }
                }
            }
        }

        tracing::info!(
            "Rebuilt title index: {} documents in scope {:?}, {} titles, {} aliases",
            relevant.len(),
            scope,
            self.titles.len(),
            self.aliases.len()
        );
    }

    pub fn normalize(&self, text: &str) -> String {
        normalize_key(text, self.case_sensitive)
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub fn titles(&self) -> &[TitleEntry] {
        &self.titles
    }

    pub fn aliases(&self) -> &[AliasEntry] {
        &self.aliases
    }

    pub fn title(&self, key: &str) -> Option<&TitleEntry> {
        self.title_slots.get(key).map(|&slot| &self.titles[slot])
    }

    pub fn len(&self) -> usize {
        self.titles.len() + self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty() && self.aliases.is_empty()
    }
}
