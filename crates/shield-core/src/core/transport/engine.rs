use super::model::TransportModel;
use super::tally::RawTallies;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("File I/O error for '{path}': {source}", path = path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to launch transport engine '{program}': {source}", program = program.display())]
    Launch {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Transport engine exited with {status}: {detail}")]
    ExitStatus { status: String, detail: String },

    #[error("Expected engine output '{path}' was not produced", path = path.display())]
    MissingOutput { path: PathBuf },

    #[error("Failed to serialize transport model: {0}")]
    ModelSerialization(String),

    #[error("Malformed tally output: {0}")]
    MalformedTally(String),

    #[error("Transport engine failed: {0}")]
    Engine(String),

    #[error("Transport engine was stopped by an interrupt")]
    Interrupted,
}

/// A Monte Carlo transport engine.
///
/// A run is split in two so callers can tell an execution failure from a failure to
/// read the results back. Both calls receive the run directory explicitly; an engine
/// must keep all of its files inside it.
pub trait TransportEngine {
    fn name(&self) -> &str;

    fn execute(&self, model: &TransportModel, workdir: &Path) -> Result<(), TransportError>;

    fn read_tallies(
        &self,
        model: &TransportModel,
        workdir: &Path,
    ) -> Result<RawTallies, TransportError>;
}
