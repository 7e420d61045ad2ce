//! Common geometry functions.

use super::{Cross, Dot, Vector3f};
use crate::pbrt::*;

/// Construct a local coordinate system given a unit vector. Returns the two
/// tangent vectors orthogonal to `v1` and to each other.
///
/// * `v1` - The unit vector.
pub fn coordinate_system(v1: &Vector3f) -> (Vector3f, Vector3f) {
    let v2 = if abs(v1.x) > abs(v1.y) {
        Vector3f::new(-v1.z, 0.0, v1.x) / (v1.x * v1.x + v1.z * v1.z).sqrt()
    } else {
        Vector3f::new(0.0, v1.z, -v1.y) / (v1.y * v1.y + v1.z * v1.z).sqrt()
    };
    let v3 = v1.cross(&v2);
    (v2, v3)
}

/// Returns `n` flipped so that it lies in the same hemisphere as `toward`,
/// using the geometric normal `ng` to decide.
///
/// * `ng`     - Geometric normal.
/// * `n`      - Vector to orient.
/// * `toward` - Reference direction.
#[inline(always)]
pub fn face_forward(ng: &Vector3f, n: &Vector3f, toward: &Vector3f) -> Vector3f {
    if ng.dot(toward) < 0.0 {
        -*n
    } else {
        *n
    }
}

/// Mirror `v` (pointing away from the surface) about the normal `n`.
///
/// * `n` - Surface normal.
/// * `v` - Outgoing direction.
#[inline(always)]
pub fn reflect(n: &Vector3f, v: &Vector3f) -> Vector3f {
    *n * (2.0 * v.dot(n)) - *v
}

/// Refract `v` (pointing away from the surface) through an interface with
/// relative index of refraction `ior`. Total internal reflection falls back
/// to mirror reflection.
///
/// * `n`   - Surface normal.
/// * `v`   - Outgoing direction.
/// * `ior` - Index of refraction.
pub fn refract(n: &Vector3f, v: &Vector3f, ior: Float) -> Vector3f {
    let (n, eta) = if v.dot(n) < 0.0 {
        (-*n, ior)
    } else {
        (*n, 1.0 / ior)
    };
    let cos_v_n = v.dot(&n);
    let k = 1.0 - eta * eta * (1.0 - cos_v_n * cos_v_n);
    if k <= 0.0 {
        return reflect(&n, v);
    }
    (-*v * eta + n * (eta * cos_v_n - k.sqrt())).normalize_or_zero()
}

/// Dielectric Fresnel reflectance and transmittance for the direction `i`
/// (pointing away from the surface). Returns `(kr, kt)`.
///
/// * `i`   - Outgoing direction.
/// * `n`   - Surface normal.
/// * `ior` - Index of refraction.
pub fn fresnel(i: &Vector3f, n: &Vector3f, ior: Float) -> (Float, Float) {
    let n = if i.dot(n) < 0.0 { -*n } else { *n };
    let c = i.dot(&n);
    let g = ior * ior + c * c - 1.0;
    let g = if g <= 0.0 { 0.0 } else { g.sqrt() };
    let gc = g + c;
    if gc == 0.0 {
        return (1.0, 0.0);
    }
    let aux = c * gc;
    let kr = ((0.5 * (g - c) * (g - c)) / (gc * gc)) * (1.0 + ((aux - 1.0) * (aux - 1.0)) / ((aux + 1.0) * (aux + 1.0)));
    if kr < 1.0 {
        (kr, 1.0 - kr)
    } else {
        (1.0, 0.0)
    }
}
