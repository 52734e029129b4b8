use anyhow::{Context, Result};
use autolink_core::{Document, DocumentSet};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

/// Load every markdown document under `root` into a document set.
///
/// Paths are vault-relative with `/` separators, sorted so candidate order is
/// stable across runs. Dot directories (`.obsidian`, `.git`, ...) are skipped.
pub fn load_vault(root: &Path) -> Result<DocumentSet> {
    let mut files = collect_markdown(root)
        .with_context(|| format!("failed to walk vault at {}", root.display()))?;
    files.sort();

    let mut documents = Vec::with_capacity(files.len());
    for file in files {
        let Some(path) = vault_path(root, &file) else {
            continue;
        };
        documents.push(load_document(&file, path));
    }

    info!("Loaded {} documents from {}", documents.len(), root.display());
    Ok(DocumentSet::from_documents(documents))
}

/// Read one document's frontmatter aliases. Unreadable files still count as
/// linkable documents, just without aliases.
pub fn load_document(file: &Path, path: String) -> Document {
    let document = Document::new(path);
    let content = match fs::read_to_string(file) {
        Ok(content) => content,
        Err(e) => {
            warn!("Could not read {}: {}", file.display(), e);
            return document;
        }
    };
    match extract_aliases(&content) {
        Some(aliases) => document.with_aliases(aliases),
        None => document,
    }
}

/// Markdown files under `root`. An unreadable root is an error; unreadable
/// entries below it are logged and skipped.
fn collect_markdown(root: &Path) -> walkdir::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden_dir(entry));
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => return Err(e),
            Err(e) => {
                warn!("Skipping unreadable vault entry: {}", e);
                continue;
            }
        };
        let is_markdown = entry.path().extension().is_some_and(|ext| ext == "md");
        if entry.file_type().is_file() && is_markdown {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn is_hidden_dir(entry: &DirEntry) -> bool {
    let hidden = entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'));
    if hidden {
        debug!("Skipping hidden directory {}", entry.path().display());
    }
    hidden
}

/// `root/Work/Plan.md` -> `Work/Plan.md`.
pub fn vault_path(root: &Path, file: &Path) -> Option<String> {
    let relative = file.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// The `aliases` (or singular `alias`) frontmatter field, as raw JSON.
pub fn extract_aliases(content: &str) -> Option<Value> {
    let mut fields = extract_frontmatter(content)?;
    fields.remove("aliases").or_else(|| fields.remove("alias"))
}

/// Parse the YAML block between the leading `---` lines into JSON values.
fn extract_frontmatter(content: &str) -> Option<Map<String, Value>> {
    let mut lines = content.lines();
    let first = lines.next()?.trim_start_matches('\u{feff}').trim_end();
    if first != "---" {
        return None;
    }

    let mut yaml_lines = Vec::new();
    for line in lines {
        let trimmed = line.trim_end();
        if trimmed == "---" || trimmed == "..." {
            break;
        }
        yaml_lines.push(line);
    }
    if yaml_lines.is_empty() {
        return None;
    }

    let yaml: serde_yaml::Value = serde_yaml::from_str(&yaml_lines.join("\n")).ok()?;
    match serde_json::to_value(yaml).ok()? {
        Value::Object(map) => Some(map),
        _ => None,
    }
}
