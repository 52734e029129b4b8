use autolink_core::{DocumentSet, Settings, VaultEvent};
use std::path::PathBuf;
use std::sync::{RwLock, RwLockReadGuard};
use tracing::{info, warn};

use crate::rpc::SessionManager;

/// Shared state behind the transport: the vault's documents, the settings
/// every session runs with, and the editor sessions themselves.
pub struct Server {
    documents: RwLock<DocumentSet>,
    settings: RwLock<Settings>,
    debounce_override: Option<u64>,
    /// Where `settings/update` writes settings back to, if anywhere.
    config_path: Option<PathBuf>,
    sessions: SessionManager,
}

impl Server {
    pub fn new(documents: DocumentSet, settings: Settings, debounce_override: Option<u64>) -> Self {
        let settings = Self::with_override(settings, debounce_override);
        Self {
            documents: RwLock::new(documents),
            settings: RwLock::new(settings),
            debounce_override,
            config_path: None,
            sessions: SessionManager::new(),
        }
    }

    pub fn with_config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    fn with_override(mut settings: Settings, debounce_override: Option<u64>) -> Settings {
        if let Some(ms) = debounce_override {
            settings.debounce_ms = ms;
        }
        settings.normalized()
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn documents(&self) -> RwLockReadGuard<'_, DocumentSet> {
        self.documents.read().unwrap_or_else(|e| e.into_inner())
    }

    pub fn settings(&self) -> Settings {
        self.settings.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn create_session(&self, client_name: Option<String>) -> String {
        let settings = self.settings();
        let documents = self.documents();
        let session_id = self
            .sessions
            .create_session(client_name, &settings, documents.documents());
        info!("Created editor session {}", session_id);
        session_id
    }

    /// Apply a document lifecycle event and rebuild every session's index.
    pub fn apply_vault_event(&self, event: VaultEvent) -> bool {
        let mut documents = self.documents.write().unwrap_or_else(|e| e.into_inner());
        if !documents.apply(event) {
            return false;
        }
        self.sessions
            .for_each(|session| session.engine.rebuild_index(documents.documents()));
        true
    }

    /// Replace settings for all sessions and persist them to the settings
    /// file. The command-line debounce override still wins, but is not
    /// written back.
    pub fn update_settings(&self, settings: Settings) -> Settings {
        if let Some(path) = &self.config_path {
            if let Err(e) = settings.clone().normalized().save(path) {
                warn!("Could not save settings to {}: {}", path.display(), e);
            }
        }
        let settings = Self::with_override(settings, self.debounce_override);
        *self.settings.write().unwrap_or_else(|e| e.into_inner()) = settings.clone();
        let documents = self.documents();
        self.sessions.for_each(|session| {
            session
                .engine
                .update_settings(settings.clone(), documents.documents(), &mut session.host)
        });
        info!("Settings updated: mode {:?}", settings.mode);
        settings
    }
}
