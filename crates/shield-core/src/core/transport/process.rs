use super::engine::{TransportEngine, TransportError};
use super::model::TransportModel;
use super::tally::RawTallies;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const MODEL_FILE: &str = "model.toml";
pub const TALLY_FILE: &str = "tallies.json";
pub const ENGINE_LOG_FILE: &str = "engine.log";

const LOG_TAIL_LINES: usize = 10;
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Runs an external transport executable inside the run directory.
///
/// The model is written to `model.toml`; the executable is started with the run
/// directory as its working directory and must leave its tallies in `tallies.json`.
/// Its combined output is kept in `engine.log`. With an interrupt flag attached, a
/// running executable is killed as soon as the flag is raised.
#[derive(Debug, Clone)]
pub struct ProcessEngine {
    program: PathBuf,
    args: Vec<String>,
    cross_sections: Option<PathBuf>,
    interrupt: Option<Arc<AtomicBool>>,
}

impl ProcessEngine {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cross_sections: None,
            interrupt: None,
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_cross_sections(mut self, path: Option<PathBuf>) -> Self {
        self.cross_sections = path;
        self
    }

    pub fn with_interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupt = Some(flag);
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn write_model(&self, model: &TransportModel, workdir: &Path) -> Result<(), TransportError> {
        let text = toml::to_string_pretty(model)
            .map_err(|e| TransportError::ModelSerialization(e.to_string()))?;
        let path = workdir.join(MODEL_FILE);
        fs::write(&path, text).map_err(|source| TransportError::Io { path, source })
    }

    fn interrupted(&self) -> bool {
        self.interrupt
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    fn wait(&self, child: &mut Child) -> Result<ExitStatus, TransportError> {
        let wait_error = |e: std::io::Error| {
            TransportError::Engine(format!("failed to wait for the engine process: {e}"))
        };
        loop {
            if let Some(status) = child.try_wait().map_err(wait_error)? {
                return Ok(status);
            }
            if self.interrupted() {
                warn!(
                    "Interrupt received; stopping transport engine process {}.",
                    child.id()
                );
                if let Err(e) = child.kill() {
                    warn!("Failed to kill engine process {}: {}", child.id(), e);
                }
                child.wait().map_err(wait_error)?;
                return Err(TransportError::Interrupted);
            }
            thread::sleep(WAIT_POLL_INTERVAL);
        }
    }
}

/// The last lines of the engine log, for error messages.
fn log_tail(path: &Path) -> String {
    let text = fs::read_to_string(path).unwrap_or_default();
    let lines: Vec<&str> = text.lines().collect();
    lines[lines.len().saturating_sub(LOG_TAIL_LINES)..].join("\n")
}

impl TransportEngine for ProcessEngine {
    fn name(&self) -> &str {
        "process"
    }

    fn execute(&self, model: &TransportModel, workdir: &Path) -> Result<(), TransportError> {
        self.write_model(model, workdir)?;

        let log_path = workdir.join(ENGINE_LOG_FILE);
        let log_error = |source: std::io::Error| TransportError::Io {
            path: log_path.clone(),
            source,
        };
        let log = File::create(&log_path).map_err(log_error)?;
        let log_for_stderr = log.try_clone().map_err(log_error)?;

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .current_dir(workdir)
            .env("HDF5_USE_FILE_LOCKING", "FALSE")
            .stdin(Stdio::null())
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(log_for_stderr));
        if let Some(path) = &self.cross_sections {
            command.env("OPENMC_CROSS_SECTIONS", path);
        }

        info!(
            "Launching transport engine {:?} in {:?} ({} particles x {} batches).",
            self.program, workdir, model.settings.particles, model.settings.batches
        );
        let mut child = command.spawn().map_err(|source| TransportError::Launch {
            program: self.program.clone(),
            source,
        })?;
        let status = self.wait(&mut child)?;

        if !status.success() {
            return Err(TransportError::ExitStatus {
                status: status.to_string(),
                detail: log_tail(&log_path),
            });
        }

        debug!("Transport engine finished for {}.", model.run_id);
        Ok(())
    }

    fn read_tallies(
        &self,
        _model: &TransportModel,
        workdir: &Path,
    ) -> Result<RawTallies, TransportError> {
        let path = workdir.join(TALLY_FILE);
        if !path.exists() {
            return Err(TransportError::MissingOutput { path });
        }
        let text = fs::read_to_string(&path).map_err(|source| TransportError::Io {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|e| {
            TransportError::MalformedTally(format!("{}: {}", path.display(), e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::ShieldingGeometry;
    use crate::core::models::configuration::Configuration;
    use crate::core::transport::model::RunSettings;

    fn model() -> TransportModel {
        TransportModel::build(
            &Configuration::new(1.0, 0.5, 30.0, 0.0),
            &ShieldingGeometry::default(),
            RunSettings::fixed_source(100_000, 20),
        )
    }

    #[test]
    fn missing_executable_is_a_launch_error_and_model_is_still_written() {
        let dir = tempfile::tempdir().unwrap();
        let engine = ProcessEngine::new("/nonexistent/transport-engine");
        let result = engine.execute(&model(), dir.path());
        assert!(matches!(result, Err(TransportError::Launch { .. })));
        assert!(dir.path().join(MODEL_FILE).exists());
    }

    #[test]
    fn missing_tally_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let engine = ProcessEngine::new("unused");
        assert!(matches!(
            engine.read_tallies(&model(), dir.path()),
            Err(TransportError::MissingOutput { .. })
        ));
    }

    #[test]
    fn tally_file_is_parsed_from_the_run_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(TALLY_FILE),
            r#"{"detector_spectrum": [1.0, 2.0], "mesh_flux": [[0.0]]}"#,
        )
        .unwrap();
        let raw = ProcessEngine::new("unused")
            .read_tallies(&model(), dir.path())
            .unwrap();
        assert_eq!(raw.detector_spectrum, vec![1.0, 2.0]);
    }

    #[test]
    fn garbage_tally_file_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(TALLY_FILE), "not json").unwrap();
        assert!(matches!(
            ProcessEngine::new("unused").read_tallies(&model(), dir.path()),
            Err(TransportError::MalformedTally(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn failing_executable_reports_its_exit_status() {
        let dir = tempfile::tempdir().unwrap();
        let engine = ProcessEngine::new("sh").with_args(vec![
            "-c".to_string(),
            "echo boom >&2; exit 3".to_string(),
        ]);
        match engine.execute(&model(), dir.path()) {
            Err(TransportError::ExitStatus { detail, .. }) => assert!(detail.contains("boom")),
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(dir.path().join(ENGINE_LOG_FILE).exists());
    }

    #[cfg(unix)]
    #[test]
    fn raised_interrupt_kills_a_running_executable() {
        let dir = tempfile::tempdir().unwrap();
        let flag = Arc::new(AtomicBool::new(false));
        let engine = ProcessEngine::new("sh")
            .with_args(vec!["-c".to_string(), "sleep 30".to_string()])
            .with_interrupt(flag.clone());

        let raiser = {
            let flag = flag.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(300));
                flag.store(true, Ordering::SeqCst);
            })
        };
        let started = std::time::Instant::now();
        let result = engine.execute(&model(), dir.path());
        raiser.join().unwrap();

        assert!(matches!(result, Err(TransportError::Interrupted)));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[cfg(unix)]
    #[test]
    fn executable_runs_inside_the_run_directory() {
        let dir = tempfile::tempdir().unwrap();
        let engine = ProcessEngine::new("sh").with_args(vec![
            "-c".to_string(),
            "test -f model.toml && echo '{\"detector_spectrum\":[],\"mesh_flux\":[]}' > tallies.json"
                .to_string(),
        ]);
        let before = std::env::current_dir().unwrap();
        engine.execute(&model(), dir.path()).unwrap();
        assert_eq!(std::env::current_dir().unwrap(), before);
        assert!(engine.read_tallies(&model(), dir.path()).is_ok());
    }
}
