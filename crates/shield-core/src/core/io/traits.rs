use crate::core::models::store::ResultStore;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::Path;

/// Defines the interface for reading and writing persisted result stores.
///
/// Implementors handle the on-disk encoding. Writing to a path replaces the target
/// atomically, so a reader never observes a half-written store.
pub trait ResultFile {
    /// The error type for I/O operations.
    type Error: Error + From<io::Error>;

    /// Reads a store from a reader.
    ///
    /// # Errors
    ///
    /// Returns an error if the content cannot be decoded.
    fn read_from(reader: &mut impl Read) -> Result<ResultStore, Self::Error>;

    /// Writes a store to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or writing fails.
    fn write_to(store: &ResultStore, writer: &mut impl Write) -> Result<(), Self::Error>;

    /// Reads a store from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or decoded.
    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<ResultStore, Self::Error> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }

    /// Writes a store to a file path, replacing any previous content atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary file cannot be written or moved into place.
    /// The previous content of `path` is left untouched in that case.
    fn write_to_path<P: AsRef<Path>>(store: &ResultStore, path: P) -> Result<(), Self::Error>;
}
