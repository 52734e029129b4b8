use crate::error::Result;
use crate::vault::ScopeMode;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::time::Duration;

/// Mode names as they appear in the persisted settings file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ModeName {
    #[default]
    Autonomous,
    SemiAutonomous,
    Suggestions,
    Custom,
}

/// Persisted configuration. Field names follow the on-disk camelCase keys;
/// any key missing from the file takes its default.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub mode: ModeName,
    pub min_word_length: usize,
    pub case_sensitive: bool,
    pub include_aliases: bool,
    pub custom_folders: Vec<String>,
    pub debounce_ms: u64,
    pub max_suggestions: usize,
    pub custom_allow_enter_accept: bool,
    pub custom_auto_insert_single_match: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mode: ModeName::Autonomous,
            min_word_length: 3,
            case_sensitive: false,
            include_aliases: true,
            custom_folders: Vec::new(),
            debounce_ms: 300,
            max_suggestions: 5,
            custom_allow_enter_accept: true,
            custom_auto_insert_single_match: false,
        }
    }
}

impl Settings {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(raw)?;
        Ok(settings.normalized())
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Read settings from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(raw) => Self::from_toml_str(&raw),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No settings at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    /// Clamp values that would disable matching entirely.
    pub fn normalized(mut self) -> Self {
        self.min_word_length = self.min_word_length.max(1);
        self.max_suggestions = self.max_suggestions.max(1);
        self
    }

    pub fn link_mode(&self) -> LinkMode {
        match self.mode {
            ModeName::Autonomous => LinkMode::Autonomous,
            ModeName::SemiAutonomous => LinkMode::SemiAutonomous,
            ModeName::Suggestions => LinkMode::Suggestions,
            ModeName::Custom => LinkMode::Custom {
                allow_enter_accept: self.custom_allow_enter_accept,
                auto_insert_single_match: self.custom_auto_insert_single_match,
            },
        }
    }

    pub fn scope(&self) -> ScopeMode {
        match self.mode {
            ModeName::Autonomous | ModeName::Suggestions => ScopeMode::Global,
            ModeName::SemiAutonomous => ScopeMode::Folder,
            ModeName::Custom => ScopeMode::Custom(self.custom_folders.clone()),
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Which keys commit the selected suggestion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AcceptKeys {
    pub enter: bool,
    pub tab: bool,
}

/// Decision policy, folded from the flat settings once per settings change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkMode {
    Autonomous,
    SemiAutonomous,
    Suggestions,
    Custom {
        allow_enter_accept: bool,
        auto_insert_single_match: bool,
    },
}

impl LinkMode {
    pub fn accept_keys(&self) -> AcceptKeys {
        match self {
            LinkMode::Autonomous | LinkMode::SemiAutonomous => AcceptKeys {
                enter: false,
                tab: false,
            },
            LinkMode::Suggestions => AcceptKeys {
                enter: true,
                tab: true,
            },
            LinkMode::Custom {
                allow_enter_accept, ..
            } => AcceptKeys {
                enter: *allow_enter_accept,
                tab: true,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let settings = Settings::from_toml_str("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.link_mode(), LinkMode::Autonomous);
    }

    #[test]
    fn parses_camel_case_keys() {
        let raw = r#"
mode = "custom"
minWordLength = 4
caseSensitive = true
customFolders = ["Projects", "Areas/Work"]
customAllowEnterAccept = false
customAutoInsertSingleMatch = true
"#;
        let settings = Settings::from_toml_str(raw).unwrap();
        assert_eq!(settings.min_word_length, 4);
        assert!(settings.case_sensitive);
        assert_eq!(
            settings.link_mode(),
            LinkMode::Custom {
                allow_enter_accept: false,
                auto_insert_single_match: true,
            }
        );
        assert_eq!(
            settings.scope(),
            ScopeMode::Custom(vec!["Projects".into(), "Areas/Work".into()])
        );
    }

    #[test]
    fn semi_autonomous_is_folder_scoped() {
        let settings = Settings::from_toml_str("mode = \"semiAutonomous\"").unwrap();
        assert_eq!(settings.scope(), ScopeMode::Folder);
        assert_eq!(settings.link_mode(), LinkMode::SemiAutonomous);
    }

    #[test]
    fn zero_limits_are_clamped() {
        let settings = Settings::from_toml_str("minWordLength = 0\nmaxSuggestions = 0").unwrap();
        assert_eq!(settings.min_word_length, 1);
        assert_eq!(settings.max_suggestions, 1);
    }

    #[test]
    fn unknown_mode_is_rejected() {
        assert!(Settings::from_toml_str("mode = \"telepathic\"").is_err());
    }

    #[test]
    fn custom_mode_accept_keys_follow_toggle() {
        let keys = LinkMode::Custom {
            allow_enter_accept: false,
            auto_insert_single_match: false,
        }
        .accept_keys();
        assert!(!keys.enter);
        assert!(keys.tab);
        assert!(LinkMode::Suggestions.accept_keys().enter);
    }

    #[test]
    fn save_then_load_preserves_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("autolink.toml");
        let settings = Settings {
            mode: ModeName::Suggestions,
            max_suggestions: 8,
            ..Settings::default()
        };
        settings.save(&path).unwrap();
        assert_eq!(Settings::load(&path).unwrap(), settings);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(settings, Settings::default());
    }
}
