/*!
Closed-form stop and pivot predictors.

Both are pure functions over the current kinematic state and the linear
braking model (braking deceleration scaled by ground friction). They return
actor-relative displacements; a zero result means "no meaningful
prediction". Degenerate inputs (zero velocity, no braking) short-circuit to
zero by policy rather than producing NaN.
*/

use crate::constants::DIST_EPS;
use crate::sample::Vec3;
use crate::utils::{planar, signed_planar_angle_degrees};

/// Predict where grounded braking will bring the character to rest,
/// relative to its current position.
///
/// Closed-form stopping distance under constant deceleration:
/// `|v_xz|² / (2 · braking · friction)` along the direction of travel.
/// Zero when there is no planar velocity or no effective braking (no
/// braking modeled means no finite stop).
#[inline]
pub fn predict_grounded_stop(velocity: Vec3, braking_deceleration: f32, friction: f32) -> Vec3 {
    let grounded_velocity = planar(velocity);
    let speed_sq = grounded_velocity.norm_squared();
    if speed_sq <= DIST_EPS * DIST_EPS {
        return Vec3::zeros();
    }

    let effective_deceleration = braking_deceleration * friction;
    if effective_deceleration <= 0.0 {
        return Vec3::zeros();
    }

    let direction = grounded_velocity / speed_sq.sqrt();
    direction * (speed_sq / (2.0 * effective_deceleration))
}

/// Predict where a sharp reversal of travel direction will happen, relative
/// to the character's current position.
///
/// Fires only when the planar angle between velocity and acceleration
/// exceeds `angle_threshold_deg` (the character is driven against its
/// travel) and the velocity component along the acceleration direction is
/// still negative (decelerating toward the reversal, not already past it).
/// The projection is a single-step kinematic solve for the instant velocity
/// crosses zero along the acceleration axis, which is why the gates are
/// strict: it is only valid near the reversal.
pub fn predict_grounded_pivot(
    acceleration: Vec3,
    velocity: Vec3,
    friction: f32,
    angle_threshold_deg: f32,
) -> Vec3 {
    let grounded_velocity = planar(velocity);
    let grounded_acceleration = planar(acceleration);

    let acceleration_size = grounded_acceleration.norm();
    if acceleration_size <= DIST_EPS {
        return Vec3::zeros();
    }
    let acceleration_dir = grounded_acceleration / acceleration_size;

    let velocity_along_acceleration = grounded_velocity.dot(&acceleration_dir);
    let angle_offset = signed_planar_angle_degrees(velocity, acceleration).abs();

    if angle_offset < angle_threshold_deg || velocity_along_acceleration >= 0.0 {
        return Vec3::zeros();
    }

    // Time until velocity crosses zero along the acceleration axis, under
    // the same linear braking model as the stop predictor.
    let speed_along_acceleration = -velocity_along_acceleration;
    let divisor = acceleration_size + 2.0 * speed_along_acceleration * friction;
    let time_to_direction_change = speed_along_acceleration / divisor;

    // Acceleration minus the friction-opposed residual of current velocity.
    let acceleration_force = acceleration
        - (grounded_velocity - acceleration_dir * grounded_velocity.norm()) * friction;

    grounded_velocity * time_to_direction_change
        + acceleration_force * (0.5 * time_to_direction_change * time_to_direction_change)
}
