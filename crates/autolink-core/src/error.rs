use thiserror::Error;

#[derive(Debug, Error)]
pub enum AutolinkError {
    #[error("invalid settings: {0}")]
    Config(#[from] toml::de::Error),

    #[error("failed to serialize settings: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("settings file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("position out of range: line {line}, column {column}")]
    PositionOutOfRange { line: usize, column: usize },

    /// The text under a fragment span changed between matching and applying.
    #[error("fragment {expected:?} is no longer present at the recorded span")]
    StaleFragment { expected: String },

    #[error("suggestion popup could not be mounted: {0}")]
    SessionMount(String),
}

pub type Result<T> = std::result::Result<T, AutolinkError>;
