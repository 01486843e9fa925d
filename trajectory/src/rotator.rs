/*!
Degrees-based Euler orientation bookkeeping.

Angular velocity between history samples, and the simulator's per-axis yaw
decay, operate on independent Euler axes, which a quaternion cannot express
directly. This module keeps that bookkeeping in one small value type and
bridges to `nalgebra` quaternions at the edges.

Convention (Y-up):
- yaw rotates about +Y
- pitch rotates about +X
- roll rotates about +Z
- composition order is yaw, then pitch, then roll
*/

use std::ops::{Add, Mul, Sub};

use nalgebra as na;

use crate::constants::DEG_EPS;
use crate::sample::{Quat, Vec3};

/// A pitch/yaw/roll triple in degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rotator {
    /// Rotation about +X, degrees.
    pub pitch: f32,
    /// Rotation about +Y, degrees.
    pub yaw: f32,
    /// Rotation about +Z, degrees.
    pub roll: f32,
}

/// Wrap a single angle into (-180, 180] degrees.
#[inline]
pub fn normalize_degrees(angle: f32) -> f32 {
    let wrapped = (angle + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped == -180.0 { 180.0 } else { wrapped }
}

impl Rotator {
    pub const ZERO: Rotator = Rotator {
        pitch: 0.0,
        yaw: 0.0,
        roll: 0.0,
    };

    #[inline]
    pub fn new(pitch: f32, yaw: f32, roll: f32) -> Self {
        Self { pitch, yaw, roll }
    }

    /// Each axis wrapped into (-180, 180] degrees.
    #[inline]
    pub fn normalized(self) -> Self {
        Self {
            pitch: normalize_degrees(self.pitch),
            yaw: normalize_degrees(self.yaw),
            roll: normalize_degrees(self.roll),
        }
    }

    /// True when every axis is within a small tolerance of zero.
    #[inline]
    pub fn is_nearly_zero(self) -> bool {
        self.pitch.abs() <= DEG_EPS && self.yaw.abs() <= DEG_EPS && self.roll.abs() <= DEG_EPS
    }

    /// The equivalent quaternion (yaw about +Y, then pitch about +X, then
    /// roll about +Z).
    #[inline]
    pub fn quat(self) -> Quat {
        let yaw = na::UnitQuaternion::from_axis_angle(&na::Vector3::y_axis(), self.yaw.to_radians());
        let pitch =
            na::UnitQuaternion::from_axis_angle(&na::Vector3::x_axis(), self.pitch.to_radians());
        let roll = na::UnitQuaternion::from_axis_angle(&na::Vector3::z_axis(), self.roll.to_radians());
        yaw * pitch * roll
    }

    /// Decompose a quaternion into this module's yaw/pitch/roll convention.
    #[inline]
    pub fn from_quat(rotation: Quat) -> Self {
        // With q = Ry(yaw) * Rx(pitch) * Rz(roll):
        //   q * e_z = (sin yaw * cos pitch, -sin pitch, cos yaw * cos pitch)
        //   (q * e_x).y = sin roll * cos pitch
        //   (q * e_y).y = cos roll * cos pitch
        let fwd = rotation * Vec3::z();
        let right = rotation * Vec3::x();
        let up = rotation * Vec3::y();

        let pitch = (-fwd.y).clamp(-1.0, 1.0).asin();
        let yaw = fwd.x.atan2(fwd.z);
        let roll = right.y.atan2(up.y);

        Self {
            pitch: pitch.to_degrees(),
            yaw: yaw.to_degrees(),
            roll: roll.to_degrees(),
        }
    }

    /// Rotate a vector by this rotator.
    #[inline]
    pub fn rotate_vector(self, v: Vec3) -> Vec3 {
        self.quat() * v
    }
}

impl Add for Rotator {
    type Output = Rotator;

    #[inline]
    fn add(self, rhs: Rotator) -> Rotator {
        Rotator::new(
            self.pitch + rhs.pitch,
            self.yaw + rhs.yaw,
            self.roll + rhs.roll,
        )
    }
}

impl Sub for Rotator {
    type Output = Rotator;

    #[inline]
    fn sub(self, rhs: Rotator) -> Rotator {
        Rotator::new(
            self.pitch - rhs.pitch,
            self.yaw - rhs.yaw,
            self.roll - rhs.roll,
        )
    }
}

impl Mul<f32> for Rotator {
    type Output = Rotator;

    #[inline]
    fn mul(self, rhs: f32) -> Rotator {
        Rotator::new(self.pitch * rhs, self.yaw * rhs, self.roll * rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_wraps_into_half_open_range() {
        assert!((normalize_degrees(190.0) - (-170.0)).abs() < 1.0e-4);
        assert!((normalize_degrees(-190.0) - 170.0).abs() < 1.0e-4);
        assert!((normalize_degrees(360.0) - 0.0).abs() < 1.0e-4);
        // -180 maps to the +180 end of the range.
        assert!((normalize_degrees(-180.0) - 180.0).abs() < 1.0e-4);
        assert!((normalize_degrees(540.0) - 180.0).abs() < 1.0e-4);
    }

    #[test]
    fn quat_round_trip_preserves_axes() {
        let samples = [
            Rotator::new(0.0, 0.0, 0.0),
            Rotator::new(0.0, 90.0, 0.0),
            Rotator::new(30.0, -45.0, 0.0),
            Rotator::new(-15.0, 120.0, 10.0),
        ];

        for r in samples {
            let back = Rotator::from_quat(r.quat());
            assert!((back.pitch - r.pitch).abs() < 1.0e-3, "pitch for {r:?}");
            assert!((back.yaw - r.yaw).abs() < 1.0e-3, "yaw for {r:?}");
            assert!((back.roll - r.roll).abs() < 1.0e-3, "roll for {r:?}");
        }
    }

    #[test]
    fn pure_yaw_rotates_planar_vector() {
        let r = Rotator::new(0.0, 90.0, 0.0);
        let v = r.rotate_vector(Vec3::new(0.0, 0.0, 1.0));
        // +Z swings to +X under a positive yaw about +Y.
        assert!((v.x - 1.0).abs() < 1.0e-5);
        assert!(v.y.abs() < 1.0e-5);
        assert!(v.z.abs() < 1.0e-5);
    }

    #[test]
    fn arithmetic_is_componentwise() {
        let a = Rotator::new(1.0, 2.0, 3.0);
        let b = Rotator::new(10.0, 20.0, 30.0);
        let sum = a + b;
        assert_eq!(sum, Rotator::new(11.0, 22.0, 33.0));
        let diff = b - a;
        assert_eq!(diff, Rotator::new(9.0, 18.0, 27.0));
        let scaled = a * 2.0;
        assert_eq!(scaled, Rotator::new(2.0, 4.0, 6.0));
    }

    #[test]
    fn nearly_zero_uses_tolerance_not_equality() {
        assert!(Rotator::new(0.0, 1.0e-5, 0.0).is_nearly_zero());
        assert!(!Rotator::new(0.0, 0.01, 0.0).is_nearly_zero());
    }
}
