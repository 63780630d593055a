use crate::core::io::traits::ResultFile;
use crate::core::models::store::ResultStore;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ResultFileError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid result JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to replace '{path}': {source}", path = path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result stores as a pretty-printed JSON object keyed by configuration key.
pub struct JsonResultFile;

impl ResultFile for JsonResultFile {
    type Error = ResultFileError;

    fn read_from(reader: &mut impl Read) -> Result<ResultStore, Self::Error> {
        Ok(serde_json::from_reader(reader)?)
    }

    fn write_to(store: &ResultStore, writer: &mut impl Write) -> Result<(), Self::Error> {
        serde_json::to_writer_pretty(&mut *writer, store)?;
        writer.write_all(b"\n")?;
        Ok(())
    }

    fn write_to_path<P: AsRef<Path>>(store: &ResultStore, path: P) -> Result<(), Self::Error> {
        let path = path.as_ref();
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent)?;

        let mut temp = NamedTempFile::new_in(parent)?;
        {
            let mut writer = BufWriter::new(temp.as_file_mut());
            Self::write_to(store, &mut writer)?;
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| ResultFileError::Persist {
            path: path.to_path_buf(),
            source: e.error,
        })?;
        Ok(())
    }
}

/// Loads a checkpoint, starting from an empty store when there is none or it cannot
/// be read.
pub fn load_or_empty(path: &Path) -> ResultStore {
    if !path.exists() {
        info!("No checkpoint at {:?}; starting a fresh sweep.", path);
        return ResultStore::new();
    }
    match JsonResultFile::read_from_path(path) {
        Ok(store) => {
            info!("Loaded {} results from {:?}.", store.len(), path);
            store
        }
        Err(e) => {
            let backup = corrupt_copy_path(path);
            match std::fs::copy(path, &backup) {
                Ok(_) => warn!(
                    "Could not load checkpoint {:?} ({}); kept a copy at {:?} and starting with an empty store.",
                    path, e, backup
                ),
                Err(copy_error) => warn!(
                    "Could not load checkpoint {:?} ({}) nor copy it to {:?} ({}); starting with an empty store.",
                    path, e, backup, copy_error
                ),
            }
            ResultStore::new()
        }
    }
}

/// `intermediate_results.json` becomes `intermediate_results.json.corrupt`.
fn corrupt_copy_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".corrupt");
    PathBuf::from(name)
}
