use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

pub const FT_TO_CM: f64 = 30.48;

/// Fixed layout of the shielded room.
///
/// The source sits at the origin and emits along +x. The wall occupies
/// `x ∈ [source_to_wall_distance, source_to_wall_distance + wall_thickness]` and is
/// pierced by a cylindrical air channel on the x axis. All lengths are in cm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShieldingGeometry {
    pub wall_thickness_cm: f64,
    pub source_to_wall_distance_cm: f64,
    pub detector_diameter_cm: f64,
}

impl Default for ShieldingGeometry {
    fn default() -> Self {
        Self {
            wall_thickness_cm: 2.0 * FT_TO_CM,
            source_to_wall_distance_cm: 6.0 * FT_TO_CM,
            detector_diameter_cm: 30.0,
        }
    }
}

impl ShieldingGeometry {
    pub fn wall_front_x(&self) -> f64 {
        self.source_to_wall_distance_cm
    }

    pub fn wall_back_x(&self) -> f64 {
        self.source_to_wall_distance_cm + self.wall_thickness_cm
    }

    pub fn detector_radius_cm(&self) -> f64 {
        self.detector_diameter_cm / 2.0
    }

    /// Cross-sectional area of the detector sphere, in cm².
    pub fn detector_area_cm2(&self) -> f64 {
        PI * self.detector_radius_cm().powi(2)
    }

    /// Half-angle, in radians, of the cone from the source that just fills the
    /// channel entrance.
    pub fn cone_half_angle(&self, channel_diameter_cm: f64) -> f64 {
        (channel_diameter_cm / 2.0 / self.source_to_wall_distance_cm).atan()
    }

    /// Solid angle subtended by the channel entrance as seen from the source.
    pub fn channel_solid_angle(&self, channel_diameter_cm: f64) -> f64 {
        solid_angle(self.source_to_wall_distance_cm, channel_diameter_cm / 2.0)
    }

    /// Detector centre for a detector placed `distance_cm` behind the wall at
    /// `angle_deg` off the channel axis, in the z = 0 plane.
    pub fn detector_center(&self, distance_cm: f64, angle_deg: f64) -> Point3<f64> {
        let angle = angle_deg.to_radians();
        Point3::new(
            self.wall_back_x() + distance_cm * angle.cos(),
            distance_cm * angle.sin(),
            0.0,
        )
    }

    /// Straight-line path used by the analytic model: source to wall, through the
    /// wall, and on to the detector distance.
    pub fn path_length_cm(&self, detector_distance_cm: f64) -> f64 {
        self.source_to_wall_distance_cm + self.wall_thickness_cm + detector_distance_cm
    }

    pub fn beam_axis() -> Vector3<f64> {
        Vector3::x()
    }
}

/// Solid angle of a cone whose base is a disc of `radius` at `distance`.
pub fn solid_angle(distance: f64, radius: f64) -> f64 {
    let theta = (radius / distance).atan();
    2.0 * PI * (1.0 - theta.cos())
}
