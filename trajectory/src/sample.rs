/*!
Movement samples: point-in-time kinematic snapshots.

A sample stores the same pose/velocity twice:
- world-space, used for distance/velocity math between samples, and
- relative to a moving origin (the actor transform at query time), so the
  whole history can be re-expressed cheaply when the origin moves.

The invariant maintained by the history's rebasing pass is
`world_transform == anchor * relative_transform` for the current anchor
sample. A freshly constructed sample is its own anchor (relative identity).
*/

use nalgebra as na;

use crate::constants::{DIST_EPS, ROT_EPS, TIME_EPS};
use crate::rotator::Rotator;

/// Common math aliases for clarity and consistency.
pub type Vec3 = na::Vector3<f32>;
pub type Quat = na::UnitQuaternion<f32>;
pub type Iso = na::Isometry3<f32>;

/// A single timestamped kinematic snapshot, in both world and
/// origin-relative encodings.
#[derive(Clone, Copy, Debug)]
pub struct MovementSample {
    /// Time offset relative to the collection's anchor sample (seconds).
    /// Negative is the past, zero is "now", positive is simulated future.
    pub accumulated_seconds: f32,

    /// Pose relative to the reference origin transform.
    pub relative_transform: Iso,
    /// Linear velocity expressed in the reference origin's frame.
    pub relative_linear_velocity: Vec3,

    /// Pose in world space.
    pub world_transform: Iso,
    /// Linear velocity in world space.
    pub world_linear_velocity: Vec3,

    /// Actor orientation at sample time, for angular-velocity derivation.
    pub actor_world_rotation: Rotator,
    /// Orientation change since the previous sample.
    pub actor_delta_rotation: Rotator,
}

impl Default for MovementSample {
    fn default() -> Self {
        Self {
            accumulated_seconds: 0.0,
            relative_transform: Iso::identity(),
            relative_linear_velocity: Vec3::zeros(),
            world_transform: Iso::identity(),
            world_linear_velocity: Vec3::zeros(),
            actor_world_rotation: Rotator::ZERO,
            actor_delta_rotation: Rotator::ZERO,
        }
    }
}

impl MovementSample {
    /// Build a sample for "now" from a world pose and world velocity.
    /// The sample is its own reference origin, so the relative encoding
    /// starts at identity with the velocity rotated into the local frame.
    pub fn from_world(world_transform: Iso, world_velocity: Vec3) -> Self {
        Self {
            world_transform,
            world_linear_velocity: world_velocity,
            relative_transform: Iso::identity(),
            relative_linear_velocity: world_transform.rotation.inverse() * world_velocity,
            ..Self::default()
        }
    }

    /// True when relative translation, relative rotation, and relative
    /// velocity are all within tolerance of identity/zero: the character is
    /// motionless without relying on floating-point equality.
    #[inline]
    pub fn is_zero_sample(&self) -> bool {
        self.relative_linear_velocity.norm_squared() <= DIST_EPS * DIST_EPS
            && self.relative_transform.translation.vector.norm_squared() <= DIST_EPS * DIST_EPS
            && self.relative_transform.rotation.angle() <= ROT_EPS
    }

    /// Re-express this sample against a new reference origin.
    ///
    /// `delta` must be the transform taking the previous anchor's world pose
    /// into the new anchor's frame (`new_world⁻¹ ∘ previous_world`);
    /// `delta_seconds` is negative when the anchor moved forward in time.
    #[inline]
    pub fn apply_relative_offset(&mut self, delta: &Iso, delta_seconds: f32) {
        self.accumulated_seconds += delta_seconds;
        self.relative_transform = delta * self.relative_transform;
        self.relative_linear_velocity = delta.rotation * self.relative_linear_velocity;
    }

    /// Angular velocity between two samples, degrees per second per axis.
    /// Zero when the samples match kinematically or are not separated in
    /// time.
    pub fn rotation_velocity_from(&self, other: &MovementSample) -> Rotator {
        if self.kinematics_match(other) {
            return Rotator::ZERO;
        }

        let delta_seconds = self.accumulated_seconds - other.accumulated_seconds;
        if delta_seconds.abs() <= TIME_EPS {
            return Rotator::ZERO;
        }

        let delta = (self.actor_world_rotation - other.actor_world_rotation).normalized();
        delta * (1.0 / delta_seconds)
    }

    /// Linear acceleration between two samples, from the world velocity
    /// delta. Zero when the samples match kinematically or are not
    /// separated in time.
    pub fn acceleration_from(&self, other: &MovementSample) -> Vec3 {
        if self.kinematics_match(other) {
            return Vec3::zeros();
        }

        let delta_seconds = self.accumulated_seconds - other.accumulated_seconds;
        if delta_seconds.abs() <= TIME_EPS {
            return Vec3::zeros();
        }

        (self.world_linear_velocity - other.world_linear_velocity) / delta_seconds
    }

    /// World-space distance between two samples' positions.
    #[inline]
    pub fn distance_from(&self, other: &MovementSample) -> f32 {
        (self.world_transform.translation.vector - other.world_transform.translation.vector).norm()
    }

    /// Tolerance equality on the kinematic fields, ignoring time.
    pub fn kinematics_match(&self, other: &MovementSample) -> bool {
        transforms_match(&self.world_transform, &other.world_transform)
            && transforms_match(&self.relative_transform, &other.relative_transform)
            && (self.world_linear_velocity - other.world_linear_velocity).norm_squared()
                <= DIST_EPS * DIST_EPS
            && (self.relative_linear_velocity - other.relative_linear_velocity).norm_squared()
                <= DIST_EPS * DIST_EPS
    }
}

#[inline]
fn transforms_match(a: &Iso, b: &Iso) -> bool {
    (a.translation.vector - b.translation.vector).norm_squared() <= DIST_EPS * DIST_EPS
        && a.rotation.angle_to(&b.rotation) <= ROT_EPS
}

/// An ordered sequence of samples (ascending `accumulated_seconds`),
/// covering recorded history, simulated future, or both.
#[derive(Clone, Debug, Default)]
pub struct MovementSampleCollection {
    pub samples: Vec<MovementSample>,
}

impl MovementSampleCollection {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// The `(first, last)` accumulated-seconds covered, if any.
    pub fn time_range(&self) -> Option<(f32, f32)> {
        let first = self.samples.first()?;
        let last = self.samples.last()?;
        Some((first.accumulated_seconds, last.accumulated_seconds))
    }

    /// The sample at time `seconds`, interpolating between the bracketing
    /// entries when the time falls inside the covered range.
    ///
    /// Out-of-range queries return the nearest end sample when
    /// `extrapolate` is set, and `None` otherwise. An empty collection
    /// always returns `None`.
    pub fn sample_at_time(&self, seconds: f32, extrapolate: bool) -> Option<MovementSample> {
        let first = self.samples.first()?;
        let last = self.samples.last()?;

        if seconds <= first.accumulated_seconds {
            return if extrapolate || seconds == first.accumulated_seconds {
                Some(*first)
            } else {
                None
            };
        }
        if seconds >= last.accumulated_seconds {
            return if extrapolate || seconds == last.accumulated_seconds {
                Some(*last)
            } else {
                None
            };
        }

        let upper = self
            .samples
            .partition_point(|s| s.accumulated_seconds < seconds);
        let b = &self.samples[upper];
        let a = &self.samples[upper - 1];

        let span = b.accumulated_seconds - a.accumulated_seconds;
        if span <= TIME_EPS {
            return Some(*a);
        }

        let alpha = (seconds - a.accumulated_seconds) / span;
        Some(lerp_samples(a, b, alpha, seconds))
    }
}

/// Linear interpolation between two adjacent samples.
fn lerp_samples(a: &MovementSample, b: &MovementSample, alpha: f32, seconds: f32) -> MovementSample {
    MovementSample {
        accumulated_seconds: seconds,
        relative_transform: lerp_iso(&a.relative_transform, &b.relative_transform, alpha),
        relative_linear_velocity: a
            .relative_linear_velocity
            .lerp(&b.relative_linear_velocity, alpha),
        world_transform: lerp_iso(&a.world_transform, &b.world_transform, alpha),
        world_linear_velocity: a.world_linear_velocity.lerp(&b.world_linear_velocity, alpha),
        actor_world_rotation: a.actor_world_rotation
            + (b.actor_world_rotation - a.actor_world_rotation) * alpha,
        actor_delta_rotation: a.actor_delta_rotation
            + (b.actor_delta_rotation - a.actor_delta_rotation) * alpha,
    }
}

#[inline]
fn lerp_iso(a: &Iso, b: &Iso, alpha: f32) -> Iso {
    let translation = a.translation.vector.lerp(&b.translation.vector, alpha);
    let rotation = a
        .rotation
        .try_slerp(&b.rotation, alpha, 1.0e-6)
        .unwrap_or(if alpha < 0.5 { a.rotation } else { b.rotation });
    Iso::from_parts(na::Translation3::from(translation), rotation)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world_at(x: f32) -> Iso {
        Iso::translation(x, 0.0, 0.0)
    }

    fn sample_at(seconds: f32, x: f32, vx: f32) -> MovementSample {
        MovementSample {
            accumulated_seconds: seconds,
            world_transform: world_at(x),
            world_linear_velocity: Vec3::new(vx, 0.0, 0.0),
            ..MovementSample::default()
        }
    }

    #[test]
    fn fresh_stationary_sample_is_zero_sample() {
        let sample = MovementSample::from_world(world_at(500.0), Vec3::zeros());
        assert!(sample.is_zero_sample());
    }

    #[test]
    fn moving_or_rebased_sample_is_not_zero_sample() {
        let moving = MovementSample::from_world(world_at(0.0), Vec3::new(100.0, 0.0, 0.0));
        assert!(!moving.is_zero_sample());

        let mut rebased = MovementSample::from_world(world_at(0.0), Vec3::zeros());
        let delta = Iso::translation(-10.0, 0.0, 0.0);
        rebased.apply_relative_offset(&delta, -0.1);
        assert!(!rebased.is_zero_sample());
    }

    #[test]
    fn rebase_preserves_world_anchor_law() {
        // world == anchor * relative, for an arbitrary chain of rebases.
        let world = Iso::new(
            Vec3::new(3.0, 0.5, -2.0),
            Vec3::new(0.0, std::f32::consts::FRAC_PI_4, 0.0),
        );
        let mut sample = MovementSample::from_world(world, Vec3::new(1.0, 0.0, 2.0));

        let anchors = [
            Iso::new(Vec3::new(4.0, 0.5, -2.0), Vec3::new(0.0, 0.3, 0.0)),
            Iso::new(Vec3::new(5.5, 0.5, -1.0), Vec3::new(0.0, -0.8, 0.0)),
        ];

        let mut previous_anchor = world;
        for anchor in anchors {
            let delta = anchor.inv_mul(&previous_anchor);
            sample.apply_relative_offset(&delta, -0.1);
            previous_anchor = anchor;

            let reconstructed = anchor * sample.relative_transform;
            let dt = (reconstructed.translation.vector - world.translation.vector).norm();
            let dr = reconstructed.rotation.angle_to(&world.rotation);
            assert!(dt < 1.0e-4, "translation drift {dt}");
            assert!(dr < 1.0e-4, "rotation drift {dr}");
        }
    }

    #[test]
    fn rotation_velocity_from_uses_time_separation() {
        let mut newer = sample_at(0.0, 10.0, 100.0);
        let older = sample_at(-0.5, 0.0, 100.0);
        newer.actor_world_rotation = Rotator::new(0.0, 90.0, 0.0);

        let vel = newer.rotation_velocity_from(&older);
        assert!((vel.yaw - 180.0).abs() < 1.0e-3);
        assert!(vel.pitch.abs() < 1.0e-3);
    }

    #[test]
    fn acceleration_from_is_velocity_delta_over_time() {
        let newer = sample_at(0.0, 10.0, 300.0);
        let older = sample_at(-0.5, 0.0, 100.0);

        let accel = newer.acceleration_from(&older);
        assert!((accel.x - 400.0).abs() < 1.0e-3);
    }

    #[test]
    fn derivations_are_zero_for_matching_samples() {
        let a = sample_at(0.0, 5.0, 50.0);
        let b = sample_at(-0.2, 5.0, 50.0);
        assert_eq!(a.acceleration_from(&b), Vec3::zeros());
        assert_eq!(a.rotation_velocity_from(&b), Rotator::ZERO);
    }

    #[test]
    fn sample_at_time_interpolates_between_brackets() {
        let collection = MovementSampleCollection {
            samples: vec![sample_at(0.0, 0.0, 0.0), sample_at(1.0, 10.0, 20.0)],
        };

        let mid = collection.sample_at_time(0.25, false).unwrap();
        assert!((mid.accumulated_seconds - 0.25).abs() < 1.0e-5);
        assert!((mid.world_transform.translation.vector.x - 2.5).abs() < 1.0e-4);
        assert!((mid.world_linear_velocity.x - 5.0).abs() < 1.0e-4);
    }

    #[test]
    fn sample_at_time_out_of_range_clamps_or_misses() {
        let collection = MovementSampleCollection {
            samples: vec![sample_at(-1.0, 0.0, 0.0), sample_at(0.0, 10.0, 0.0)],
        };

        assert!(collection.sample_at_time(0.5, false).is_none());
        assert!(collection.sample_at_time(-2.0, false).is_none());

        let clamped_future = collection.sample_at_time(0.5, true).unwrap();
        assert!((clamped_future.world_transform.translation.vector.x - 10.0).abs() < 1.0e-4);

        let clamped_past = collection.sample_at_time(-2.0, true).unwrap();
        assert!(clamped_past.world_transform.translation.vector.x.abs() < 1.0e-4);
    }

    #[test]
    fn sample_at_time_on_empty_collection_is_none() {
        let collection = MovementSampleCollection::default();
        assert!(collection.sample_at_time(0.0, true).is_none());
    }
}
