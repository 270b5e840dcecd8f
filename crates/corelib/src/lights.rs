//! Spotlights and the rotating three-colour light rig.

use crate::{Mat4, Vec3, vec3};

/// Cone light with distance attenuation `1 / (c + l*d + q*d^2)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpotLight {
    pub position: Vec3,
    pub direction: Vec3,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    /// Cosine of the cone half-angle.
    pub cut_off: f32,
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

impl SpotLight {
    /// Light hanging at the rig position with the shared cone/attenuation.
    pub fn rig_light(direction: Vec3, diffuse: Vec3) -> Self {
        Self {
            position: vec3(0.0, 200.0, 0.0),
            direction,
            ambient: Vec3::splat(0.2),
            diffuse,
            cut_off: (std::f32::consts::PI / 6.0).cos(),
            constant: 1.0,
            linear: 0.000035,
            quadratic: 0.000044,
        }
    }

    /// Attenuation factor at distance `d`.
    pub fn attenuation(&self, d: f32) -> f32 {
        1.0 / (self.constant + self.linear * d + self.quadratic * d * d)
    }

    /// Whether `point` lies inside the cone.
    pub fn illuminates(&self, point: Vec3) -> bool {
        let to_point = (point - self.position).normalize_or_zero();
        to_point.dot(self.direction.normalize_or_zero()) > self.cut_off
    }
}

/// Degrees the rig turns per rendered frame.
pub const RIG_STEP_DEGREES: f32 = 0.05;

/// Red, green and blue spotlights sweeping around the +Y axis.
#[derive(Clone, Debug)]
pub struct LightRig {
    base: [SpotLight; 3],
    theta_deg: f32,
    step_deg: f32,
}

impl LightRig {
    pub fn new(base: [SpotLight; 3], step_deg: f32) -> Self {
        Self {
            base,
            theta_deg: 0.0,
            step_deg,
        }
    }

    pub fn disco() -> Self {
        Self::new(
            [
                SpotLight::rig_light(vec3(50.0, -200.0, -50.0), vec3(1.0, 0.0, 0.0)),
                SpotLight::rig_light(vec3(-50.0, -200.0, -50.0), vec3(0.0, 1.0, 0.0)),
                SpotLight::rig_light(vec3(0.0, -200.0, 50.0), vec3(0.0, 0.0, 1.0)),
            ],
            RIG_STEP_DEGREES,
        )
    }

    pub fn theta_degrees(&self) -> f32 {
        self.theta_deg
    }

    /// Lights with directions rotated by the current angle about +Y.
    pub fn lights(&self) -> [SpotLight; 3] {
        let rotation = Mat4::from_rotation_y(self.theta_deg.to_radians());
        self.base.map(|mut light| {
            light.direction = rotation.transform_vector3(light.direction);
            light
        })
    }

    /// Advance one frame.
    pub fn advance(&mut self) {
        self.theta_deg += self.step_deg;
    }
}

impl Default for LightRig {
    fn default() -> Self {
        Self::disco()
    }
}
