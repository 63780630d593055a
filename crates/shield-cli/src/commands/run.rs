use crate::cli::RunArgs;
use crate::config::builder::build_config;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use gammashield::{
    core::transport::process::ProcessEngine, engine::progress::ProgressReporter, workflows,
};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use tracing::{info, warn};

pub async fn run(args: RunArgs, interrupt: Arc<AtomicBool>) -> Result<()> {
    info!("Merging configuration from file and CLI arguments...");
    let app_config = build_config(&args)?;
    let sweep_config = &app_config.sweep;

    let engine = ProcessEngine::new(&app_config.engine.program)
        .with_args(app_config.engine.args.clone())
        .with_cross_sections(app_config.engine.cross_sections.clone())
        .with_interrupt(interrupt.clone());
    info!("Using transport engine {:?}", engine.program());

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!(
        "Starting dose study over {} configurations...",
        sweep_config.grid.len()
    );
    info!("Invoking the core study workflow...");

    let study = tokio::task::block_in_place(|| {
        workflows::study::run(sweep_config, &engine, &reporter, Some(interrupt.as_ref()))
    })?;

    let summary = &study.sweep;
    println!(
        "Sweep complete: {} run, {} resumed from checkpoint, {} transport failures, {} failed.",
        summary.completed, summary.skipped, summary.transport_failures, summary.failed
    );
    println!(
        "Results saved to: {}",
        sweep_config.final_results_path().display()
    );

    match &study.report {
        Some(report) => {
            println!(
                "Report artifacts written to: {}",
                sweep_config.results_dir.display()
            );
            if report.failed > 0 {
                warn!("{} report artifact(s) could not be written.", report.failed);
                println!(
                    "Warning: {} report artifact(s) could not be written.",
                    report.failed
                );
            }
        }
        None => println!("Warning: no results were produced; the report was skipped."),
    }

    if !study.critical.is_empty() {
        println!("\nCritical configurations (highest dose rates):");
        for entry in &study.critical {
            let c = &entry.configuration;
            println!(
                "  {}. Energy: {} MeV, Channel Diameter: {} cm, Distance: {} cm, Angle: {}°, Dose: {:.6e} rem/hr",
                entry.rank,
                c.energy_mev,
                c.channel_diameter_cm,
                c.detector_distance_cm,
                c.detector_angle_deg,
                entry.dose_rem_per_hr
            );
        }
    }

    Ok(())
}
