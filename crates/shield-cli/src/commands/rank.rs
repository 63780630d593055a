use crate::cli::RankArgs;
use crate::error::{CliError, Result};
use gammashield::core::io::{results::JsonResultFile, traits::ResultFile};
use gammashield::core::models::store::ResultStore;
use gammashield::engine::ranking::highest_doses;
use gammashield::workflows::report::method_label;
use tracing::info;

pub async fn run(args: RankArgs) -> Result<()> {
    info!("Loading results from {:?}", &args.results);
    let store =
        JsonResultFile::read_from_path(&args.results).map_err(|e| CliError::FileParsing {
            path: args.results.clone(),
            source: e.into(),
        })?;

    if store.is_empty() {
        println!("No results found in {}.", args.results.display());
        return Ok(());
    }

    println!("{}", render_ranking(&store, args.top));
    Ok(())
}

fn render_ranking(store: &ResultStore, top: usize) -> String {
    let ranked = highest_doses(store, top);
    let mut lines = vec![format!(
        "Top {} of {} configurations by dose rate:",
        ranked.len(),
        store.len()
    )];
    for (i, result) in ranked.iter().enumerate() {
        let c = &result.configuration;
        lines.push(format!(
            "{:>3}. E={} MeV  D={} cm  dist={} cm  angle={}°  dose={:.6e} rem/hr  [{}]",
            i + 1,
            c.energy_mev,
            c.channel_diameter_cm,
            c.detector_distance_cm,
            c.detector_angle_deg,
            result.dose_rem_per_hr,
            method_label(result)
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use gammashield::core::models::configuration::Configuration;
    use gammashield::core::models::result::{RunOutcome, SimulationResult};
    use std::path::PathBuf;

    fn fallback(energy: f64, dose: f64) -> SimulationResult {
        SimulationResult {
            configuration: Configuration::new(energy, 0.5, 30.0, 0.0),
            detector_x: 0.0,
            detector_y: 0.0,
            dose_rem_per_hr: dose,
            outcome: RunOutcome::Fallback,
        }
    }

    #[test]
    fn ranking_lists_highest_doses_first() {
        let mut store = ResultStore::new();
        store.insert(fallback(0.1, 1e-5)).unwrap();
        store.insert(fallback(1.0, 3e-3)).unwrap();
        store.insert(fallback(5.0, 2e-4)).unwrap();

        let text = render_ranking(&store, 2);
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Top 2 of 3 configurations by dose rate:");
        assert!(lines[1].contains("E=1 MeV"));
        assert!(lines[1].ends_with("[analytic_fallback]"));
        assert!(lines[2].contains("E=5 MeV"));
    }

    #[tokio::test]
    async fn missing_results_file_is_reported_with_its_path() {
        let args = RankArgs {
            results: PathBuf::from("/nonexistent/final_results.json"),
            top: 5,
        };
        match run(args).await {
            Err(CliError::FileParsing { path, .. }) => {
                assert_eq!(path, PathBuf::from("/nonexistent/final_results.json"))
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
