use thiserror::Error;

use super::config::ConfigError;
use crate::core::io::results::ResultFileError;
use std::path::PathBuf;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid sweep configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to create results directory '{path}': {source}", path = path.display())]
    ResultsDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to save results to '{path}': {source}", path = path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: ResultFileError,
    },

    #[error(
        "Sweep interrupted after {completed} of {total} configurations; results saved to '{checkpoint}'",
        checkpoint = checkpoint.display()
    )]
    Interrupted {
        completed: usize,
        total: usize,
        checkpoint: PathBuf,
    },
}
