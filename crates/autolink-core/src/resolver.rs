use crate::title_index::TitleIndex;
use crate::vault::TargetRef;
use serde::Serialize;

/// A potential link target for a typed fragment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub display_title: String,
    pub target: TargetRef,
    pub is_alias: bool,
}

impl Candidate {
    /// Label to show after the pipe; only alias matches carry one.
    pub fn label(&self) -> Option<&str> {
        self.is_alias.then_some(self.display_title.as_str())
    }
}

/// Prefix-match `typed` against the index.
///
/// Titles come first, then aliases, each in index order. The excluded title
/// (normally the active document) never matches, neither by title nor by
/// alias, and an alias whose target is already present is skipped.
pub fn find_matches(
    index: &TitleIndex,
    typed: &str,
    exclude_title: Option<&str>,
    max_suggestions: usize,
) -> Vec<Candidate> {
    let search_key = index.normalize(typed);
    if search_key.trim().is_empty() {
        return Vec::new();
    }
    let excluded = exclude_title.map(|title| index.normalize(title));
    let is_excluded = |key: &str| excluded.as_deref() == Some(key);

    let mut matches: Vec<Candidate> = index
        .titles()
        .iter()
        .filter(|entry| entry.key.starts_with(&search_key) && !is_excluded(&entry.key))
        .map(|entry| Candidate {
            display_title: entry.display.clone(),
            target: entry.target.clone(),
            is_alias: false,
        })
        .collect();

    for alias in index.aliases() {
        if !alias.key.starts_with(&search_key) {
            continue;
        }
        if is_excluded(&index.normalize(&alias.target.id)) {
            continue;
        }
        if matches.iter().any(|c| c.target == alias.target) {
            continue;
        }
        matches.push(Candidate {
            display_title: alias.alias.clone(),
            target: alias.target.clone(),
            is_alias: true,
        });
    }

    matches.truncate(max_suggestions);
    tracing::debug!("{} candidates for {:?}", matches.len(), typed);
    matches
}
