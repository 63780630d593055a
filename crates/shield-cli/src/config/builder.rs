use super::defaults::DefaultsConfig;
use super::file::{
    FileConfig, FileFallbackConfig, FileGeometryConfig, FileGridConfig, FileTransportConfig,
};
use super::models::{AppConfig, EngineConfig};
use crate::cli::RunArgs;
use crate::error::{CliError, Result};
use crate::utils::parser::{self, ParseError};
use gammashield::core::geometry::ShieldingGeometry;
use gammashield::engine::config::{
    FallbackCriteria, SweepConfigBuilder, SweepGrid, TransportSettings,
};
use std::path::PathBuf;
use tracing::debug;

pub fn build_config(args: &RunArgs) -> Result<AppConfig> {
    let defaults = DefaultsConfig::default();

    let file_config = if let Some(config_path) = &args.config {
        FileConfig::from_file(config_path)?
    } else {
        FileConfig::default()
    };

    let mut file_config = apply_set_values(file_config, &args.set_values)?;

    let test_mode = match (args.sweep_size.test_mode, args.sweep_size.full_sweep) {
        (true, false) => true,
        (false, true) => false,
        _ => file_config.test_mode.unwrap_or(defaults.test_mode),
    };
    let results_dir = args
        .results_dir
        .clone()
        .or(file_config.results_dir.take())
        .unwrap_or(defaults.results_dir);

    let engine_file = file_config.engine.take().unwrap_or_default();
    let program = args.engine.clone().or(engine_file.program).ok_or_else(|| {
        CliError::Config(
            "No transport engine configured. Pass --engine or set [engine] program in the config file."
                .to_string(),
        )
    })?;
    let engine_args = if args.engine_args.is_empty() {
        engine_file.args.unwrap_or_default()
    } else {
        args.engine_args.clone()
    };
    let cross_sections = args
        .cross_sections
        .clone()
        .or(engine_file.cross_sections);

    let geometry = merge_geometry(file_config.geometry.take().unwrap_or_default());
    let grid = merge_grid(test_mode, file_config.grid.take().unwrap_or_default());
    let transport = merge_transport(file_config.transport.take().unwrap_or_default());
    let fallback = merge_fallback(file_config.fallback.take().unwrap_or_default());

    debug!(
        "Sweep grid has {} configurations (test mode: {}).",
        grid.len(),
        test_mode
    );

    let sweep = SweepConfigBuilder::new()
        .geometry(geometry)
        .grid(grid)
        .transport(transport)
        .fallback(fallback)
        .results_dir(results_dir)
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    Ok(AppConfig {
        engine: EngineConfig {
            program,
            args: engine_args,
            cross_sections,
        },
        sweep,
    })
}

fn merge_geometry(file: FileGeometryConfig) -> ShieldingGeometry {
    let defaults = ShieldingGeometry::default();
    ShieldingGeometry {
        wall_thickness_cm: file.wall_thickness_cm.unwrap_or(defaults.wall_thickness_cm),
        source_to_wall_distance_cm: file
            .source_to_wall_distance_cm
            .unwrap_or(defaults.source_to_wall_distance_cm),
        detector_diameter_cm: file
            .detector_diameter_cm
            .unwrap_or(defaults.detector_diameter_cm),
    }
}

fn merge_grid(test_mode: bool, file: FileGridConfig) -> SweepGrid {
    let base = if test_mode {
        SweepGrid::test_mode()
    } else {
        SweepGrid::full()
    };
    SweepGrid {
        energies_mev: file.energies.unwrap_or(base.energies_mev),
        channel_diameters_cm: file.channel_diameters.unwrap_or(base.channel_diameters_cm),
        detector_distances_cm: file.detector_distances.unwrap_or(base.detector_distances_cm),
        detector_angles_deg: file.detector_angles.unwrap_or(base.detector_angles_deg),
    }
}

fn merge_transport(file: FileTransportConfig) -> TransportSettings {
    let defaults = TransportSettings::default();
    TransportSettings {
        particles: file.particles.unwrap_or(defaults.particles),
        particles_hard_case: file
            .particles_hard_case
            .unwrap_or(defaults.particles_hard_case),
        batches: file.batches.unwrap_or(defaults.batches),
        hard_angle_above_deg: file
            .hard_angle_above_deg
            .unwrap_or(defaults.hard_angle_above_deg),
        hard_diameter_below_cm: file
            .hard_diameter_below_cm
            .unwrap_or(defaults.hard_diameter_below_cm),
    }
}

fn merge_fallback(file: FileFallbackConfig) -> FallbackCriteria {
    let defaults = FallbackCriteria::default();
    FallbackCriteria {
        min_total_flux: file.min_total_flux.unwrap_or(defaults.min_total_flux),
        min_dose_rem_per_hr: file.min_dose.unwrap_or(defaults.min_dose_rem_per_hr),
    }
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for assignment in set_values {
        let (key, value) = parser::parse_assignment(assignment).map_err(invalid)?;

        match key {
            "test-mode" => {
                config.test_mode = Some(parser::parse_bool(key, value).map_err(invalid)?);
            }
            "results-dir" => config.results_dir = Some(PathBuf::from(value)),
            "engine.program" => {
                config.engine.get_or_insert_with(Default::default).program =
                    Some(PathBuf::from(value));
            }
            "engine.args" => {
                config.engine.get_or_insert_with(Default::default).args =
                    Some(value.split_whitespace().map(str::to_string).collect());
            }
            "engine.cross-sections" => {
                config.engine.get_or_insert_with(Default::default).cross_sections =
                    Some(PathBuf::from(value));
            }
            "geometry.wall-thickness-cm" => {
                config
                    .geometry
                    .get_or_insert_with(Default::default)
                    .wall_thickness_cm = Some(parser::parse_number(key, value).map_err(invalid)?);
            }
            "geometry.source-to-wall-distance-cm" => {
                config
                    .geometry
                    .get_or_insert_with(Default::default)
                    .source_to_wall_distance_cm =
                    Some(parser::parse_number(key, value).map_err(invalid)?);
            }
            "geometry.detector-diameter-cm" => {
                config
                    .geometry
                    .get_or_insert_with(Default::default)
                    .detector_diameter_cm = Some(parser::parse_number(key, value).map_err(invalid)?);
            }
            "grid.energies" => {
                config.grid.get_or_insert_with(Default::default).energies =
                    Some(parser::parse_list(key, value).map_err(invalid)?);
            }
            "grid.channel-diameters" => {
                config.grid.get_or_insert_with(Default::default).channel_diameters =
                    Some(parser::parse_list(key, value).map_err(invalid)?);
            }
            "grid.detector-distances" => {
                config.grid.get_or_insert_with(Default::default).detector_distances =
                    Some(parser::parse_list(key, value).map_err(invalid)?);
            }
            "grid.detector-angles" => {
                config.grid.get_or_insert_with(Default::default).detector_angles =
                    Some(parser::parse_list(key, value).map_err(invalid)?);
            }
            "transport.particles" => {
                config.transport.get_or_insert_with(Default::default).particles =
                    Some(parser::parse_number(key, value).map_err(invalid)?);
            }
            "transport.particles-hard-case" => {
                config
                    .transport
                    .get_or_insert_with(Default::default)
                    .particles_hard_case = Some(parser::parse_number(key, value).map_err(invalid)?);
            }
            "transport.batches" => {
                config.transport.get_or_insert_with(Default::default).batches =
                    Some(parser::parse_number(key, value).map_err(invalid)?);
            }
            "transport.hard-angle-above-deg" => {
                config
                    .transport
                    .get_or_insert_with(Default::default)
                    .hard_angle_above_deg = Some(parser::parse_number(key, value).map_err(invalid)?);
            }
            "transport.hard-diameter-below-cm" => {
                config
                    .transport
                    .get_or_insert_with(Default::default)
                    .hard_diameter_below_cm =
                    Some(parser::parse_number(key, value).map_err(invalid)?);
            }
            "fallback.min-total-flux" => {
                config.fallback.get_or_insert_with(Default::default).min_total_flux =
                    Some(parser::parse_number(key, value).map_err(invalid)?);
            }
            "fallback.min-dose" => {
                config.fallback.get_or_insert_with(Default::default).min_dose =
                    Some(parser::parse_number(key, value).map_err(invalid)?);
            }
            _ => {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{}'",
                    key
                )));
            }
        }
    }
    Ok(config)
}

fn invalid(e: ParseError) -> CliError {
    CliError::Config(e.to_string())
}
