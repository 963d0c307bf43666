use brainstem::{OrchestrationError, SettingsError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("Orchestration error: {0}")]
    Orchestration(#[from] OrchestrationError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown agent: {0} (expected echo or approval)")]
    UnknownAgent(String),
}

impl CliError {
    pub fn code(&self) -> &'static str {
        match self {
            CliError::Settings(_) => "SETTINGS_ERROR",
            CliError::Orchestration(err) => err.error_code(),
            CliError::Io { .. } => "IO_ERROR",
            CliError::Json(_) => "SERIALIZATION_ERROR",
            CliError::UnknownAgent(_) => "UNKNOWN_AGENT",
        }
    }
}
