//! Hemisphere and sphere sampling functions.

use crate::geometry::*;
use crate::pbrt::*;

/// Map two uniform values to a cosine weighted direction in the hemisphere
/// around `n`. `z1` selects the polar angle (`cos² θ = z1`), `z2` the azimuth.
///
/// * `n`  - Hemisphere axis.
/// * `ru` - First tangent.
/// * `rv` - Second tangent.
/// * `z1` - Uniform value in [0, 1].
/// * `z2` - Uniform value in [0, 1).
#[inline]
pub fn cosine_sample_hemisphere(n: &Vector3f, ru: &Vector3f, rv: &Vector3f, z1: Float, z2: Float) -> Vector3f {
    let z1 = min(z1, 1.0);
    let phi = z2 * TWO_PI;
    (*ru * phi.cos() + *rv * phi.sin()) * (1.0 - z1).sqrt() + *n * z1.sqrt()
}

/// Map two uniform values to a direction within a cone around `n` whose
/// half-angle has cosine `cos_angle`. A `cos_angle` close to zero spans
/// nearly the whole hemisphere.
///
/// * `n`         - Cone axis.
/// * `ru`        - First tangent.
/// * `rv`        - Second tangent.
/// * `cos_angle` - Cosine of the cone half-angle.
/// * `z1`        - Uniform value selecting the azimuth.
/// * `z2`        - Uniform value selecting the polar angle.
#[inline]
pub fn uniform_sample_cone(
    n: &Vector3f,
    ru: &Vector3f,
    rv: &Vector3f,
    cos_angle: Float,
    z1: Float,
    z2: Float,
) -> Vector3f {
    let phi = TWO_PI * z1;
    let cos_theta = 1.0 - (1.0 - cos_angle) * z2;
    let sin_theta = max(0.0, 1.0 - cos_theta * cos_theta).sqrt();
    (*ru * phi.cos() + *rv * phi.sin()) * sin_theta + *n * cos_theta
}

/// Uniformly sample a direction on the unit sphere.
///
/// * `u` - Two uniform values in [0, 1).
pub fn uniform_sample_sphere(u: &Point2f) -> Vector3f {
    let z = 1.0 - 2.0 * u.x;
    let r = max(0.0, 1.0 - z * z).sqrt();
    let phi = TWO_PI * u.y;
    Vector3f::new(r * phi.cos(), r * phi.sin(), z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn cosine_samples_stay_in_hemisphere(z1 in 0.0..1.0f32, z2 in 0.0..1.0f32) {
            let n = Vector3f::new(0.0, 0.0, 1.0);
            let (ru, rv) = coordinate_system(&n);
            let d = cosine_sample_hemisphere(&n, &ru, &rv, z1, z2);
            prop_assert!(d.dot(&n) >= 0.0);
            prop_assert!((d.length() - 1.0).abs() < 1e-4);
        }

        #[test]
        fn cone_samples_respect_angle(z1 in 0.0..1.0f32, z2 in 0.0..1.0f32) {
            let n = Vector3f::new(0.0, 1.0, 0.0);
            let (ru, rv) = coordinate_system(&n);
            let d = uniform_sample_cone(&n, &ru, &rv, 0.05, z1, z2);
            prop_assert!(d.dot(&n) >= 0.05 - 1e-5);
            prop_assert!((d.length() - 1.0).abs() < 1e-4);
        }

        #[test]
        fn sphere_samples_are_unit(u in 0.0..1.0f32, v in 0.0..1.0f32) {
            let d = uniform_sample_sphere(&Point2f::new(u, v));
            prop_assert!((d.length() - 1.0).abs() < 1e-4);
        }
    }
}
