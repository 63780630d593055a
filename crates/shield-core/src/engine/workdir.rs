use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const LOCK_FILE: &str = ".in_progress";

/// Exclusive ownership of one configuration's run directory.
///
/// The directory `run_<key>` under the results directory is created on acquisition
/// and marked with a lock file, which is removed when the guard is dropped on every
/// exit path, panics included. The directory itself and its artifacts are kept.
#[derive(Debug)]
pub struct RunDirectory {
    path: PathBuf,
    lock: PathBuf,
}

impl RunDirectory {
    pub fn acquire(results_dir: &Path, key: &str) -> io::Result<Self> {
        let path = results_dir.join(format!("run_{key}"));
        fs::create_dir_all(&path)?;

        let lock = path.join(LOCK_FILE);
        if lock.exists() {
            warn!(
                "Run directory {:?} was left locked by an earlier run; taking it over.",
                path
            );
            fs::remove_file(&lock)?;
        }
        OpenOptions::new().write(true).create_new(true).open(&lock)?;
        debug!("Acquired run directory {:?}.", path);

        Ok(Self { path, lock })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_locked(path: &Path) -> bool {
        path.join(LOCK_FILE).exists()
    }
}

impl Drop for RunDirectory {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.lock) {
            warn!("Failed to release run directory {:?}: {}", self.path, e);
        } else {
            debug!("Released run directory {:?}.", self.path);
        }
    }
}
