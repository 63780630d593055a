use super::conversion::DoseConverter;
use crate::core::geometry::ShieldingGeometry;

/// Source strength assumed by the analytic model, in photons/s.
pub const SOURCE_STRENGTH: f64 = 1e12;
/// Lower bound on the estimated detector flux.
pub const FLUX_FLOOR: f64 = 1e-5;
/// Detector angles beyond this are treated as this angle for the cosine term.
pub const ANGLE_CAP_DEG: f64 = 80.0;

/// Path lengths below this are raised to it, so a zero path cannot make the 1/L² term infinite.
const MIN_PATH_LENGTH_CM: f64 = 1e-6;

/// Energy-banded linear attenuation coefficient of air, in cm⁻¹.
pub fn air_attenuation_coefficient(energy_mev: f64) -> f64 {
    if energy_mev <= 0.1 {
        0.01
    } else if energy_mev <= 0.5 {
        0.005
    } else if energy_mev <= 1.0 {
        0.003
    } else {
        0.002
    }
}

/// Lowest dose rate the analytic model will report for a configuration.
pub fn dose_floor(energy_mev: f64, channel_diameter_cm: f64, detector_angle_deg: f64) -> f64 {
    1e-7 * energy_mev * (channel_diameter_cm / 0.05) / (1.0 + detector_angle_deg / 10.0)
}

/// Closed-form streaming estimate used when Monte Carlo statistics are inadequate.
///
/// The channel is treated as a collimator that admits the cone of source photons
/// subtended by its entrance; those photons are attenuated in air, spread by the
/// inverse square of the path length and intercepted by the detector cross-section.
#[derive(Debug, Clone, Copy)]
pub struct AnalyticDoseModel {
    geometry: ShieldingGeometry,
    converter: DoseConverter,
}

impl AnalyticDoseModel {
    pub fn new(geometry: ShieldingGeometry, converter: DoseConverter) -> Self {
        Self {
            geometry,
            converter,
        }
    }

    pub fn geometry(&self) -> &ShieldingGeometry {
        &self.geometry
    }

    /// Estimated detector flux, in photons/cm²·s, never below [`FLUX_FLOOR`].
    pub fn estimated_flux(
        &self,
        energy_mev: f64,
        channel_diameter_cm: f64,
        detector_angle_deg: f64,
        path_length_cm: f64,
    ) -> f64 {
        // A zero path length would divide by zero below.
        let path_length = path_length_cm.max(MIN_PATH_LENGTH_CM);

        let solid_angle = self.geometry.channel_solid_angle(channel_diameter_cm);
        let attenuation = (-air_attenuation_coefficient(energy_mev) * path_length).exp();
        let spreading = 1.0 / path_length.powi(2);
        let angle_effect = detector_angle_deg.min(ANGLE_CAP_DEG).to_radians().cos();
        let detector_area = self.geometry.detector_area_cm2();

        let flux =
            SOURCE_STRENGTH * solid_angle * attenuation * spreading * angle_effect * detector_area;
        flux.max(FLUX_FLOOR)
    }

    /// Estimated dose rate in rem/hr.
    ///
    /// The detector distance does not enter the formula directly; it is already
    /// folded into `path_length_cm`.
    pub fn estimate(
        &self,
        energy_mev: f64,
        channel_diameter_cm: f64,
        _detector_distance_cm: f64,
        detector_angle_deg: f64,
        path_length_cm: f64,
    ) -> f64 {
        let flux = self.estimated_flux(
            energy_mev,
            channel_diameter_cm,
            detector_angle_deg,
            path_length_cm,
        );
        let dose = flux * self.converter.factor_for_energy(energy_mev) * energy_mev.powi(2);
        dose.max(dose_floor(
            energy_mev,
            channel_diameter_cm,
            detector_angle_deg,
        ))
        // Zero energy or a zero diameter zeroes both the dose and its floor.
        .max(f64::MIN_POSITIVE)
    }
}
