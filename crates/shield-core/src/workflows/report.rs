use crate::core::geometry::FT_TO_CM;
use crate::core::io::tables::{self, TableError};
use crate::core::models::configuration::Configuration;
use crate::core::models::result::{DoseMethod, SimulationResult};
use crate::core::models::store::ResultStore;
use crate::engine::config::SweepConfig;
use crate::engine::ranking::{CRITICAL_COUNT, highest_doses};
use serde::Serialize;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, instrument, warn};

pub const REPORT_FILE: &str = "report.md";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Table(#[from] TableError),
    #[error("Failed to write '{path}': {source}", path = path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("No results to report")]
    Empty,
}

#[derive(Debug, Default)]
pub struct ReportSummary {
    pub written: Vec<PathBuf>,
    pub failed: usize,
}

#[derive(Debug, Serialize)]
struct DoseRow {
    energy_mev: f64,
    channel_diameter_cm: f64,
    detector_distance_cm: f64,
    detector_angle_deg: f64,
    dose_rem_per_hr: f64,
}

impl From<&SimulationResult> for DoseRow {
    fn from(result: &SimulationResult) -> Self {
        let c = &result.configuration;
        Self {
            energy_mev: c.energy_mev,
            channel_diameter_cm: c.channel_diameter_cm,
            detector_distance_cm: c.detector_distance_cm,
            detector_angle_deg: c.detector_angle_deg,
            dose_rem_per_hr: result.dose_rem_per_hr,
        }
    }
}

#[derive(Debug, Serialize)]
struct ResultRow {
    key: String,
    energy_mev: f64,
    channel_diameter_cm: f64,
    detector_distance_cm: f64,
    detector_angle_deg: f64,
    detector_x_cm: f64,
    detector_y_cm: f64,
    total_flux: Option<f64>,
    dose_rem_per_hr: f64,
    dose_method: &'static str,
}

impl From<&SimulationResult> for ResultRow {
    fn from(result: &SimulationResult) -> Self {
        let c = &result.configuration;
        Self {
            key: result.key(),
            energy_mev: c.energy_mev,
            channel_diameter_cm: c.channel_diameter_cm,
            detector_distance_cm: c.detector_distance_cm,
            detector_angle_deg: c.detector_angle_deg,
            detector_x_cm: result.detector_x,
            detector_y_cm: result.detector_y,
            total_flux: result.tallies().map(|t| t.total_flux),
            dose_rem_per_hr: result.dose_rem_per_hr,
            dose_method: method_label(result),
        }
    }
}

#[derive(Debug, Serialize)]
struct RankedRow {
    rank: usize,
    key: String,
    energy_mev: f64,
    channel_diameter_cm: f64,
    detector_distance_cm: f64,
    detector_angle_deg: f64,
    dose_rem_per_hr: f64,
    dose_method: &'static str,
}

impl RankedRow {
    fn new(rank: usize, result: &SimulationResult) -> Self {
        let c = &result.configuration;
        Self {
            rank,
            key: result.key(),
            energy_mev: c.energy_mev,
            channel_diameter_cm: c.channel_diameter_cm,
            detector_distance_cm: c.detector_distance_cm,
            detector_angle_deg: c.detector_angle_deg,
            dose_rem_per_hr: result.dose_rem_per_hr,
            dose_method: method_label(result),
        }
    }
}

pub fn method_label(result: &SimulationResult) -> &'static str {
    match (result.dose_method(), result.is_fallback()) {
        (DoseMethod::MonteCarlo, _) => "monte_carlo",
        (DoseMethod::Analytic, false) => "analytic",
        (DoseMethod::Analytic, true) => "analytic_fallback",
    }
}

/// Stored results for the configurations selected by `keep`, in sweep order.
fn select<'s>(
    store: &'s ResultStore,
    config: &SweepConfig,
    keep: impl Fn(&Configuration) -> bool,
) -> Vec<&'s SimulationResult> {
    config
        .grid
        .configurations()
        .filter(|c| keep(c))
        .filter_map(|c| store.get_config(&c))
        .collect()
}

fn write_doses(path: &Path, results: &[&SimulationResult]) -> Result<(), ReportError> {
    let rows: Vec<DoseRow> = results.iter().map(|r| DoseRow::from(*r)).collect();
    tables::write_records(path, &rows)?;
    Ok(())
}

fn first(values: &[f64]) -> f64 {
    values.first().copied().unwrap_or(f64::NAN)
}

fn last(values: &[f64]) -> f64 {
    values.last().copied().unwrap_or(f64::NAN)
}

/// Writes every post-sweep artifact into the results directory.
///
/// Each artifact is written independently: a failure is logged and counted, and the
/// remaining artifacts are still attempted.
#[instrument(skip_all, name = "report_generation")]
pub fn write_all(store: &ResultStore, config: &SweepConfig) -> ReportSummary {
    let dir = &config.results_dir;
    let grid = &config.grid;
    let mut summary = ReportSummary::default();

    let mut record = |path: PathBuf, result: Result<(), ReportError>| match result {
        Ok(()) => summary.written.push(path),
        Err(e) => {
            warn!("Failed to write {:?}: {}", path, e);
            summary.failed += 1;
        }
    };

    for &energy in &grid.energies_mev {
        let path = dir.join(format!("dose_vs_angle_E{energy}.csv"));
        let results = select(store, config, |c| c.energy_mev == energy);
        record(path.clone(), write_doses(&path, &results));
    }

    let widest = last(&grid.channel_diameters_cm);
    let nearest = first(&grid.detector_distances_cm);

    let path = dir.join("dose_vs_distance.csv");
    let results = select(store, config, |c| {
        c.channel_diameter_cm == widest && c.detector_angle_deg == 0.0
    });
    record(path.clone(), write_doses(&path, &results));

    let path = dir.join("dose_vs_diameter.csv");
    let results = select(store, config, |c| {
        c.detector_distance_cm == nearest && c.detector_angle_deg == 0.0
    });
    record(path.clone(), write_doses(&path, &results));

    // Same selection as above, ordered by diameter first for plotting per diameter.
    let path = dir.join("dose_vs_energy.csv");
    let mut by_diameter = results;
    by_diameter.sort_by(|a, b| {
        a.configuration
            .channel_diameter_cm
            .total_cmp(&b.configuration.channel_diameter_cm)
    });
    record(path.clone(), write_doses(&path, &by_diameter));

    let path = dir.join("results_table.csv");
    let rows: Vec<ResultRow> = select(store, config, |_| true)
        .into_iter()
        .map(ResultRow::from)
        .collect();
    record(
        path.clone(),
        tables::write_records(&path, &rows).map_err(ReportError::from),
    );

    let path = dir.join("critical_configurations.csv");
    let ranked: Vec<RankedRow> = highest_doses(store, CRITICAL_COUNT)
        .into_iter()
        .enumerate()
        .map(|(i, r)| RankedRow::new(i + 1, r))
        .collect();
    record(
        path.clone(),
        tables::write_records(&path, &ranked).map_err(ReportError::from),
    );

    let path = dir.join(REPORT_FILE);
    let report = render_markdown(store, config).and_then(|text| {
        fs::write(&path, text).map_err(|source| ReportError::Io {
            path: path.clone(),
            source,
        })
    });
    record(path.clone(), report);

    info!(
        "Wrote {} report artifacts ({} failed).",
        summary.written.len(),
        summary.failed
    );
    summary
}

fn list(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_markdown(store: &ResultStore, config: &SweepConfig) -> Result<String, ReportError> {
    let ranked = highest_doses(store, CRITICAL_COUNT);
    let Some(maximum) = ranked.first() else {
        return Err(ReportError::Empty);
    };

    let geometry = &config.geometry;
    let grid = &config.grid;
    let count = |label: &str| {
        store
            .results()
            .filter(|r| method_label(r) == label)
            .count()
    };

    // Writing into a String cannot fail.
    let mut out = String::new();
    let _ = writeln!(out, "# Gamma-ray channel streaming dose study\n");
    let _ = writeln!(out, "## Geometry\n");
    let _ = writeln!(
        out,
        "- Concrete wall thickness: {:.2} cm ({:.1} ft)",
        geometry.wall_thickness_cm,
        geometry.wall_thickness_cm / FT_TO_CM
    );
    let _ = writeln!(
        out,
        "- Source to wall distance: {:.2} cm ({:.1} ft)",
        geometry.source_to_wall_distance_cm,
        geometry.source_to_wall_distance_cm / FT_TO_CM
    );
    let _ = writeln!(
        out,
        "- Detector diameter: {:.1} cm\n",
        geometry.detector_diameter_cm
    );

    let _ = writeln!(out, "## Parameters\n");
    let _ = writeln!(out, "- Energies (MeV): {}", list(&grid.energies_mev));
    let _ = writeln!(
        out,
        "- Channel diameters (cm): {}",
        list(&grid.channel_diameters_cm)
    );
    let _ = writeln!(
        out,
        "- Detector distances (cm): {}",
        list(&grid.detector_distances_cm)
    );
    let _ = writeln!(
        out,
        "- Detector angles (deg): {}\n",
        list(&grid.detector_angles_deg)
    );

    let _ = writeln!(out, "## Results\n");
    let _ = writeln!(
        out,
        "- Configurations with results: {} of {}",
        store.len(),
        grid.len()
    );
    let _ = writeln!(out, "- Monte Carlo dose: {}", count("monte_carlo"));
    let _ = writeln!(
        out,
        "- Analytic dose after insufficient statistics: {}",
        count("analytic")
    );
    let _ = writeln!(
        out,
        "- Analytic dose after transport failure: {}",
        count("analytic_fallback")
    );
    let c = &maximum.configuration;
    let _ = writeln!(
        out,
        "- Maximum dose: {:.6e} rem/hr at {} MeV, {} cm channel, {} cm, {}°\n",
        maximum.dose_rem_per_hr,
        c.energy_mev,
        c.channel_diameter_cm,
        c.detector_distance_cm,
        c.detector_angle_deg
    );

    let _ = writeln!(out, "## Critical configurations\n");
    let _ = writeln!(
        out,
        "| Rank | Energy (MeV) | Channel diameter (cm) | Distance (cm) | Angle (deg) | Dose (rem/hr) | Method |"
    );
    let _ = writeln!(out, "|---|---|---|---|---|---|---|");
    for (i, result) in ranked.iter().enumerate() {
        let c = &result.configuration;
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} | {} | {:.6e} | {} |",
            i + 1,
            c.energy_mev,
            c.channel_diameter_cm,
            c.detector_distance_cm,
            c.detector_angle_deg,
            result.dose_rem_per_hr,
            method_label(result)
        );
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::ShieldingGeometry;
    use crate::core::models::result::{RunOutcome, TallySummary};
    use crate::engine::config::{SweepConfigBuilder, SweepGrid};
    use tempfile::TempDir;

    fn grid() -> SweepGrid {
        SweepGrid {
            energies_mev: vec![0.1, 1.0],
            channel_diameters_cm: vec![0.05, 0.5],
            detector_distances_cm: vec![30.0, 100.0],
            detector_angles_deg: vec![0.0, 45.0],
        }
    }

    fn config(dir: &TempDir) -> SweepConfig {
        SweepConfigBuilder::new()
            .geometry(ShieldingGeometry::default())
            .grid(grid())
            .results_dir(dir.path().to_path_buf())
            .build()
            .unwrap()
    }

    fn full_store() -> ResultStore {
        let mut store = ResultStore::new();
        for (i, c) in grid().configurations().enumerate() {
            let outcome = if i % 2 == 0 {
                RunOutcome::Fallback
            } else {
                RunOutcome::MonteCarlo {
                    tallies: TallySummary {
                        total_flux: 1.0,
                        spectrum: vec![1.0],
                        mesh: vec![vec![0.0]],
                    },
                    dose_method: DoseMethod::MonteCarlo,
                }
            };
            store
                .insert(SimulationResult {
                    configuration: c,
                    detector_x: 0.0,
                    detector_y: 0.0,
                    dose_rem_per_hr: (i + 1) as f64 * 1e-6,
                    outcome,
                })
                .unwrap();
        }
        store
    }

    #[test]
    fn writes_every_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let summary = write_all(&full_store(), &config(&dir));

        assert_eq!(summary.failed, 0);
        for name in [
            "dose_vs_angle_E0.1.csv",
            "dose_vs_angle_E1.csv",
            "dose_vs_distance.csv",
            "dose_vs_diameter.csv",
            "dose_vs_energy.csv",
            "results_table.csv",
            "critical_configurations.csv",
            REPORT_FILE,
        ] {
            assert!(dir.path().join(name).exists(), "missing {name}");
        }
    }

    #[test]
    fn distance_table_uses_the_widest_channel_on_axis() {
        let dir = tempfile::tempdir().unwrap();
        write_all(&full_store(), &config(&dir));

        let mut reader = csv::Reader::from_path(dir.path().join("dose_vs_distance.csv")).unwrap();
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        // One row per energy and distance.
        assert_eq!(rows.len(), 4);
        for row in &rows {
            assert_eq!(&row[1], "0.5");
            assert_eq!(&row[3], "0.0");
        }
    }

    #[test]
    fn critical_table_is_ranked() {
        let dir = tempfile::tempdir().unwrap();
        write_all(&full_store(), &config(&dir));

        let mut reader =
            csv::Reader::from_path(dir.path().join("critical_configurations.csv")).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(&headers[0], "rank");
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), CRITICAL_COUNT);
        assert_eq!(&rows[0][0], "1");
        assert_eq!(&rows[0][1], "E1_D0.5_dist100_ang45");
    }

    #[test]
    fn fallback_results_leave_the_flux_column_empty() {
        let dir = tempfile::tempdir().unwrap();
        write_all(&full_store(), &config(&dir));

        let content = fs::read_to_string(dir.path().join("results_table.csv")).unwrap();
        let first_row = content.lines().nth(1).unwrap();
        assert!(first_row.starts_with("E0.1_D0.05_dist30_ang0,"));
        assert!(first_row.contains(",,"));
        assert!(first_row.ends_with(",analytic_fallback"));
    }

    #[test]
    fn report_summarises_counts_and_maximum() {
        let dir = tempfile::tempdir().unwrap();
        write_all(&full_store(), &config(&dir));

        let report = fs::read_to_string(dir.path().join(REPORT_FILE)).unwrap();
        assert!(report.contains("Configurations with results: 16 of 16"));
        assert!(report.contains("Monte Carlo dose: 8"));
        assert!(report.contains("Analytic dose after transport failure: 8"));
        assert!(report.contains("| 1 | 1 | 0.5 | 100 | 45 |"));
    }

    #[test]
    fn empty_store_fails_only_the_markdown_report() {
        let dir = tempfile::tempdir().unwrap();
        let summary = write_all(&ResultStore::new(), &config(&dir));
        assert_eq!(summary.failed, 1);
        assert!(!dir.path().join(REPORT_FILE).exists());
    }

    #[test]
    fn unwritable_directory_is_logged_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(&dir);
        config.results_dir = dir.path().join("does-not-exist");
        let summary = write_all(&full_store(), &config);
        assert!(summary.written.is_empty());
        assert_eq!(summary.failed, 9);
    }
}
