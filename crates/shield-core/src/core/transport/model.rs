use crate::core::geometry::ShieldingGeometry;
use crate::core::models::configuration::Configuration;
use serde::{Deserialize, Serialize};

pub const ENERGY_BIN_EDGE_COUNT: usize = 100;
pub const ENERGY_EDGE_MIN_LOG10: f64 = -2.0;
pub const ENERGY_EDGE_MAX_LOG10: f64 = 1.0;
pub const MESH_DIMENSION: [usize; 3] = [100, 100, 1];

const WORLD_HALF_WIDTH_CM: f64 = 200.0;
const WORLD_BACK_MARGIN_CM: f64 = 300.0;
const MESH_BACK_MARGIN_CM: f64 = 200.0;

const CONCRETE_ID: u32 = 1;
const AIR_ID: u32 = 2;
const TISSUE_ID: u32 = 3;
const DETECTOR_SURFACE_ID: u32 = 10;
const DETECTOR_CELL_ID: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunMode {
    FixedSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSettings {
    pub run_mode: RunMode,
    pub particles: u64,
    pub batches: u32,
    pub photon_transport: bool,
}

impl RunSettings {
    pub fn fixed_source(particles: u64, batches: u32) -> Self {
        Self {
            run_mode: RunMode::FixedSource,
            particles,
            batches,
            photon_transport: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementFraction {
    pub element: String,
    pub weight_fraction: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub id: u32,
    pub name: String,
    pub density_g_cm3: f64,
    pub elements: Vec<ElementFraction>,
}

impl Material {
    fn new(id: u32, name: &str, density_g_cm3: f64, elements: &[(&str, f64)]) -> Self {
        Self {
            id,
            name: name.to_string(),
            density_g_cm3,
            elements: elements
                .iter()
                .map(|&(element, weight_fraction)| ElementFraction {
                    element: element.to_string(),
                    weight_fraction,
                })
                .collect(),
        }
    }

    /// Ordinary (Portland) concrete.
    pub fn concrete() -> Self {
        Self::new(
            CONCRETE_ID,
            "concrete",
            2.3,
            &[
                ("H", 0.010),
                ("C", 0.001),
                ("O", 0.529),
                ("Na", 0.016),
                ("Mg", 0.002),
                ("Al", 0.034),
                ("Si", 0.337),
                ("K", 0.013),
                ("Ca", 0.044),
                ("Fe", 0.014),
            ],
        )
    }

    /// Dry air at sea level.
    pub fn air() -> Self {
        Self::new(
            AIR_ID,
            "air",
            0.001205,
            &[("C", 0.000124), ("N", 0.755268), ("O", 0.231781), ("Ar", 0.012827)],
        )
    }

    /// ICRU four-component soft tissue.
    pub fn tissue() -> Self {
        Self::new(
            TISSUE_ID,
            "tissue",
            1.0,
            &[("H", 0.101), ("C", 0.111), ("N", 0.026), ("O", 0.762)],
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Boundary {
    Transmission,
    Vacuum,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Surface {
    XPlane { id: u32, x0: f64, boundary: Boundary },
    YPlane { id: u32, y0: f64, boundary: Boundary },
    ZPlane { id: u32, z0: f64, boundary: Boundary },
    /// Infinite cylinder parallel to the x axis.
    XCylinder { id: u32, y0: f64, z0: f64, r: f64 },
    Sphere { id: u32, x0: f64, y0: f64, z0: f64, r: f64 },
}

/// A region of space filled with one material; `material = None` is void.
///
/// Regions use signed surface ids: `-n` is the inside (negative half-space) of
/// surface `n`, `+n` the outside, `~( … )` a complement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub id: u32,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material: Option<u32>,
    pub region: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Particle {
    Photon,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDefinition {
    pub particle: Particle,
    pub energy_mev: f64,
    pub position: [f64; 3],
    pub direction: [f64; 3],
    /// Half-angle, in radians, of the emission cone around `direction`.
    pub cone_half_angle: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorTally {
    pub name: String,
    pub cell: u32,
    pub particle: Particle,
    pub score: String,
    pub energy_edges_mev: Vec<f64>,
}

impl DetectorTally {
    pub fn bin_count(&self) -> usize {
        self.energy_edges_mev.len().saturating_sub(1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshTally {
    pub name: String,
    pub particle: Particle,
    pub score: String,
    pub dimension: [usize; 3],
    pub lower_left: [f64; 3],
    pub upper_right: [f64; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TallySpecification {
    pub detector: DetectorTally,
    pub mesh: MeshTally,
}

/// Everything the transport engine needs for one configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportModel {
    pub run_id: String,
    pub settings: RunSettings,
    pub source: SourceDefinition,
    pub tallies: TallySpecification,
    pub materials: Vec<Material>,
    pub surfaces: Vec<Surface>,
    pub cells: Vec<Cell>,
}

impl TransportModel {
    pub fn build(
        configuration: &Configuration,
        geometry: &ShieldingGeometry,
        settings: RunSettings,
    ) -> Self {
        let wall_front = geometry.wall_front_x();
        let wall_back = geometry.wall_back_x();
        let detector = geometry.detector_center(
            configuration.detector_distance_cm,
            configuration.detector_angle_deg,
        );

        let surfaces = vec![
            Surface::XPlane {
                id: 1,
                x0: -WORLD_HALF_WIDTH_CM,
                boundary: Boundary::Vacuum,
            },
            Surface::XPlane {
                id: 2,
                x0: wall_back + WORLD_BACK_MARGIN_CM,
                boundary: Boundary::Vacuum,
            },
            Surface::YPlane {
                id: 3,
                y0: -WORLD_HALF_WIDTH_CM,
                boundary: Boundary::Vacuum,
            },
            Surface::YPlane {
                id: 4,
                y0: WORLD_HALF_WIDTH_CM,
                boundary: Boundary::Vacuum,
            },
            Surface::ZPlane {
                id: 5,
                z0: -WORLD_HALF_WIDTH_CM,
                boundary: Boundary::Vacuum,
            },
            Surface::ZPlane {
                id: 6,
                z0: WORLD_HALF_WIDTH_CM,
                boundary: Boundary::Vacuum,
            },
            Surface::XPlane {
                id: 7,
                x0: wall_front,
                boundary: Boundary::Transmission,
            },
            Surface::XPlane {
                id: 8,
                x0: wall_back,
                boundary: Boundary::Transmission,
            },
            Surface::XCylinder {
                id: 9,
                y0: 0.0,
                z0: 0.0,
                r: configuration.channel_diameter_cm / 2.0,
            },
            Surface::Sphere {
                id: DETECTOR_SURFACE_ID,
                x0: detector.x,
                y0: detector.y,
                z0: detector.z,
                r: geometry.detector_radius_cm(),
            },
        ];

        let world = "+1 -2 +3 -4 +5 -6";
        let cells = vec![
            Cell {
                id: 1,
                name: "wall".to_string(),
                material: Some(CONCRETE_ID),
                region: "+7 -8 +9".to_string(),
            },
            Cell {
                id: 2,
                name: "channel".to_string(),
                material: Some(AIR_ID),
                region: "+7 -8 -9".to_string(),
            },
            Cell {
                id: DETECTOR_CELL_ID,
                name: "detector".to_string(),
                material: Some(TISSUE_ID),
                region: format!("-{DETECTOR_SURFACE_ID}"),
            },
            Cell {
                id: 4,
                name: "void".to_string(),
                material: None,
                region: format!("{world} ~(+7 -8) ~(-{DETECTOR_SURFACE_ID})"),
            },
        ];

        let axis = ShieldingGeometry::beam_axis();
        let source = SourceDefinition {
            particle: Particle::Photon,
            energy_mev: configuration.energy_mev,
            position: [0.0, 0.0, 0.0],
            direction: [axis.x, axis.y, axis.z],
            cone_half_angle: geometry.cone_half_angle(configuration.channel_diameter_cm),
        };

        let tallies = TallySpecification {
            detector: DetectorTally {
                name: "detector_tally".to_string(),
                cell: DETECTOR_CELL_ID,
                particle: Particle::Photon,
                score: "flux".to_string(),
                energy_edges_mev: log_spaced_edges(
                    ENERGY_EDGE_MIN_LOG10,
                    ENERGY_EDGE_MAX_LOG10,
                    ENERGY_BIN_EDGE_COUNT,
                ),
            },
            mesh: MeshTally {
                name: "mesh_tally".to_string(),
                particle: Particle::Photon,
                score: "flux".to_string(),
                dimension: MESH_DIMENSION,
                lower_left: [-10.0, -50.0, -1.0],
                upper_right: [wall_back + MESH_BACK_MARGIN_CM, 50.0, 1.0],
            },
        };

        Self {
            run_id: configuration.key(),
            settings,
            source,
            tallies,
            materials: vec![Material::concrete(), Material::air(), Material::tissue()],
            surfaces,
            cells,
        }
    }

    pub fn cell(&self, name: &str) -> Option<&Cell> {
        self.cells.iter().find(|c| c.name == name)
    }
}

/// `count` edges evenly spaced in log10 between `10^min_exp` and `10^max_exp`.
pub fn log_spaced_edges(min_exp: f64, max_exp: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![10f64.powf(min_exp)],
        _ => {
            let step = (max_exp - min_exp) / (count - 1) as f64;
            (0..count)
                .map(|i| 10f64.powf(min_exp + step * i as f64))
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(angle: f64) -> TransportModel {
        TransportModel::build(
            &Configuration::new(1.0, 0.5, 30.0, angle),
            &ShieldingGeometry::default(),
            RunSettings::fixed_source(100_000, 20),
        )
    }

    #[test]
    fn energy_edges_span_ten_kev_to_ten_mev() {
        let edges = log_spaced_edges(-2.0, 1.0, 100);
        assert_eq!(edges.len(), 100);
        assert!((edges[0] - 0.01).abs() < 1e-15);
        assert!((edges[99] - 10.0).abs() < 1e-12);
        assert!(edges.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn detector_tally_has_one_bin_fewer_than_edges() {
        assert_eq!(model(0.0).tallies.detector.bin_count(), 99);
    }

    #[test]
    fn detector_sphere_follows_the_detector_angle() {
        let m = model(45.0);
        let sphere = m
            .surfaces
            .iter()
            .find_map(|s| match s {
                Surface::Sphere { y0, r, .. } => Some((*y0, *r)),
                _ => None,
            })
            .unwrap();
        assert!((sphere.0 - 30.0 * 45f64.to_radians().sin()).abs() < 1e-9);
        assert_eq!(sphere.1, 15.0);
    }

    #[test]
    fn cells_fill_wall_channel_and_detector_with_their_materials() {
        let m = model(0.0);
        assert_eq!(m.cell("wall").unwrap().material, Some(Material::concrete().id));
        assert_eq!(m.cell("channel").unwrap().material, Some(Material::air().id));
        assert_eq!(m.cell("detector").unwrap().material, Some(Material::tissue().id));
        assert_eq!(m.cell("void").unwrap().material, None);
        assert_eq!(m.tallies.detector.cell, m.cell("detector").unwrap().id);
    }

    #[test]
    fn material_weight_fractions_sum_to_one() {
        for material in [Material::concrete(), Material::air(), Material::tissue()] {
            let total: f64 = material.elements.iter().map(|e| e.weight_fraction).sum();
            assert!((total - 1.0).abs() < 1e-3, "{} sums to {total}", material.name);
        }
    }

    #[test]
    fn source_cone_just_fills_the_channel() {
        let m = model(0.0);
        assert_eq!(m.source.direction, [1.0, 0.0, 0.0]);
        assert!((m.source.cone_half_angle - (0.25f64 / 182.88).atan()).abs() < 1e-15);
    }

    #[test]
    fn model_serialises_to_toml() {
        let text = toml::to_string(&model(15.0)).unwrap();
        assert!(text.contains("run_id = \"E1_D0.5_dist30_ang15\""));
        assert!(text.contains("kind = \"x-cylinder\""));
        assert!(text.contains("run_mode = \"fixed-source\""));
    }
}
