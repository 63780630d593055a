use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("CSV error for file '{path}': {source}", path = path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("I/O error for file '{path}': {source}", path = path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Serialize)]
struct SpectrumRow {
    energy_low_mev: f64,
    energy_high_mev: f64,
    flux: f64,
}

fn csv_error(path: &Path) -> impl FnOnce(csv::Error) -> TableError + '_ {
    move |source| TableError::Csv {
        path: path.to_path_buf(),
        source,
    }
}

/// Writes one CSV row per record, with a header taken from the record's field names.
pub fn write_records<T: Serialize>(path: &Path, records: &[T]) -> Result<(), TableError> {
    let mut writer = csv::Writer::from_path(path).map_err(csv_error(path))?;
    for record in records {
        writer.serialize(record).map_err(csv_error(path))?;
    }
    writer.flush().map_err(|source| TableError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes a detector spectrum with the edges of each energy bin.
///
/// `edges` must have one more entry than `spectrum`; extra values on either side are
/// ignored.
pub fn write_spectrum(path: &Path, edges: &[f64], spectrum: &[f64]) -> Result<(), TableError> {
    let rows: Vec<SpectrumRow> = edges
        .windows(2)
        .zip(spectrum)
        .map(|(bin, &flux)| SpectrumRow {
            energy_low_mev: bin[0],
            energy_high_mev: bin[1],
            flux,
        })
        .collect();
    write_records(path, &rows)
}

/// Writes a mesh flux field as a headerless matrix, one line per row.
pub fn write_matrix(path: &Path, rows: &[Vec<f64>]) -> Result<(), TableError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(csv_error(path))?;
    for row in rows {
        writer
            .write_record(row.iter().map(|v| v.to_string()))
            .map_err(csv_error(path))?;
    }
    writer.flush().map_err(|source| TableError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spectrum_rows_pair_each_bin_with_its_edges() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spectrum.csv");
        write_spectrum(&path, &[0.01, 0.1, 1.0], &[3.0, 4.5]).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "energy_low_mev,energy_high_mev,flux");
        assert_eq!(lines[1], "0.01,0.1,3.0");
        assert_eq!(lines[2], "0.1,1.0,4.5");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn matrix_has_no_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mesh_flux.csv");
        write_matrix(&path, &[vec![1.0, 2.0], vec![3.5, 0.0]]).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "1,2\n3.5,0\n");
    }

    #[test]
    fn unwritable_path_is_reported_with_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("table.csv");
        let err = write_matrix(&path, &[]).unwrap_err();
        assert!(err.to_string().contains("table.csv"));
    }
}
