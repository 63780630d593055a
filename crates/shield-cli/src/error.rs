use gammashield::engine::error::EngineError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

/// Exit status used when the sweep was stopped by an interrupt.
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Gammashield(#[from] EngineError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse file '{path}': {source}", path = path.display())]
    FileParsing {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Gammashield(EngineError::Interrupted { .. }) => INTERRUPTED_EXIT_CODE,
            _ => 1,
        }
    }
}
