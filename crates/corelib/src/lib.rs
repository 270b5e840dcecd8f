//! Core types: math re-exports, Camera, spotlights.

pub use glam::{Mat4, Vec3, vec3};

pub mod camera;
pub mod lights;

#[cfg(test)]
mod tests {
    use super::*;
    use lights::{LightRig, SpotLight};

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 0.05
    }

    #[test]
    fn camera_pv_is_finite() {
        let cam = camera::Camera::disco(4.0 / 3.0);
        let pv = cam.proj_view();
        let a = pv.to_cols_array();
        assert!(a.iter().all(|f| f.is_finite()));
    }

    #[test]
    fn camera_target_projects_to_screen_centre() {
        let cam = camera::Camera::disco(4.0 / 3.0);
        let clip = cam.proj_view() * cam.target.extend(1.0);
        let ndc = clip / clip.w;
        assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4);
        assert!((0.0..=1.0).contains(&ndc.z));
    }

    #[test]
    fn rig_starts_unrotated() {
        let rig = LightRig::disco();
        let lights = rig.lights();
        assert_eq!(lights[0].direction, vec3(50.0, -200.0, -50.0));
        assert_eq!(lights[1].diffuse, vec3(0.0, 1.0, 0.0));
        assert!((lights[2].cut_off - 30f32.to_radians().cos()).abs() < 1e-6);
    }

    #[test]
    fn rig_rotates_about_y_by_step_per_frame() {
        let mut rig = LightRig::disco();
        for _ in 0..1800 {
            rig.advance();
        }
        // 1800 * 0.05 = 90 degrees.
        assert!((rig.theta_degrees() - 90.0).abs() < 1e-2);
        let lights = rig.lights();
        // Rotating (0, -200, 50) by +90 deg about Y gives (50, -200, 0).
        assert!(approx(lights[2].direction, vec3(50.0, -200.0, 0.0)));
        // Height and position are unaffected.
        assert_eq!(lights[0].direction.y, -200.0);
        assert_eq!(lights[0].position, vec3(0.0, 200.0, 0.0));
    }

    #[test]
    fn spotlight_cone_and_attenuation() {
        let light = SpotLight::rig_light(vec3(0.0, -1.0, 0.0), Vec3::ONE);
        assert!(light.illuminates(vec3(0.0, 0.0, 0.0)));
        assert!(!light.illuminates(vec3(500.0, 190.0, 0.0)));
        assert!((light.attenuation(0.0) - 1.0).abs() < 1e-6);
        assert!(light.attenuation(200.0) < 1.0);
    }
}
