//! Small planar/angle helpers shared by the predictors and the simulator.

use crate::constants::DIST_EPS;
use crate::rotator::normalize_degrees;
use crate::sample::Vec3;

/// Project a vector onto the horizontal (XZ) plane.
#[inline]
pub fn planar(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Unsigned angle between two vectors in degrees.
///
/// Degenerate (near-zero) inputs yield zero rather than NaN.
#[inline]
pub fn angle_between_degrees(a: Vec3, b: Vec3) -> f32 {
    let a_len = a.norm();
    let b_len = b.norm();
    if a_len <= DIST_EPS || b_len <= DIST_EPS {
        return 0.0;
    }

    let cos = (a.dot(&b) / (a_len * b_len)).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}

/// Signed angle between the planar (XZ) projections of two vectors, in
/// degrees, normalized to (-180, 180]. The sign follows the +Y cross
/// component (counter-clockwise seen from above is positive).
#[inline]
pub fn signed_planar_angle_degrees(a: Vec3, b: Vec3) -> f32 {
    let a_xz = planar(a);
    let b_xz = planar(b);

    let mut angle = angle_between_degrees(a_xz, b_xz);
    let cross = a_xz.cross(&b_xz);
    if cross.y <= 0.0 {
        angle = -angle;
    }
    normalize_degrees(angle)
}

/// Clamp a vector's magnitude to at most `max_size`.
#[inline]
pub fn clamp_to_max_size(v: Vec3, max_size: f32) -> Vec3 {
    if max_size <= 0.0 {
        return Vec3::zeros();
    }

    let len_sq = v.norm_squared();
    if len_sq > max_size * max_size {
        v * (max_size / len_sq.sqrt())
    } else {
        v
    }
}
