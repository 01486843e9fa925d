/*!
Stepped future-trajectory simulation.

Projects the current kinematic state forward across a fixed horizon at a
fixed sample rate, seeded with an acceleration and rotation velocity derived
from the sample history. The result is a `MovementSampleCollection` whose
samples carry positive `accumulated_seconds`, optionally prefixed with the
rebased history so consumers get one continuous past-to-future sequence.

Determinism: the simulation reads only its explicit inputs. Given an
identical history snapshot and identical parameters, the output is
bit-for-bit reproducible, so it can run multiple times per tick under
different authority contexts against different snapshots of the same actor.
*/

use nalgebra as na;

use crate::constants::{DIST_EPS, MAX_SIM_SUBSTEP_SECONDS, SPEED_STOP_SQ, TIME_EPS};
use crate::history::SampleHistory;
use crate::rotator::Rotator;
use crate::sample::{Iso, MovementSample, MovementSampleCollection, Vec3};
use crate::utils::clamp_to_max_size;

/// Inputs for one future simulation, captured by value.
#[derive(Clone, Copy, Debug)]
pub struct FutureSimParams {
    /// Reference origin for the relative encoding of emitted samples.
    pub origin: Iso,
    /// Current world-space linear velocity.
    pub velocity: Vec3,
    /// Braking deceleration magnitude (world units per second²).
    pub braking_deceleration: f32,
    /// Ground friction scalar.
    pub ground_friction: f32,
    /// Speed clamp while accelerating (world units per second).
    pub max_speed: f32,
    /// Simulated samples per second.
    pub sample_rate: u32,
    /// Length of the simulated future (seconds).
    pub horizon_seconds: f32,
    /// Per-step divisor for the simulated yaw rate. Must be >= 1.
    pub rotation_decay: f32,
}

/// Simulate the future trajectory from `current` under `params`.
///
/// The emitted sequence is `[history…,] current, step 1, step 2, …` with
/// each simulated step `1 / sample_rate` seconds apart.
pub fn simulate_future(
    history: &SampleHistory,
    current: &MovementSample,
    params: &FutureSimParams,
    include_history: bool,
) -> MovementSampleCollection {
    let time_per_sample = 1.0 / params.sample_rate.max(1) as f32;
    let total_steps = (params.sample_rate as f32 * params.horizon_seconds)
        .trunc()
        .max(0.0) as usize;

    let capacity = total_steps + 1 + if include_history { history.len() } else { 0 };
    let mut predictions = MovementSampleCollection::with_capacity(capacity);

    if include_history {
        predictions
            .samples
            .extend(history.history(false).samples);
    }
    predictions.samples.push(*current);

    let (mut predicted_acceleration, rotation_velocity) =
        history.acceleration_and_rotation_velocity();
    let mut rotation_per_sample = rotation_velocity * time_per_sample;

    let zero_friction = params.ground_friction == 0.0;
    let no_brakes = params.braking_deceleration == 0.0;

    let mut current_location = params.origin.translation.vector;
    let mut current_rotation = Rotator::from_quat(params.origin.rotation);
    let mut current_velocity = params.velocity;

    for step in 0..total_steps {
        if !rotation_per_sample.is_nearly_zero() {
            predicted_acceleration = rotation_per_sample.rotate_vector(predicted_acceleration);
            current_rotation = current_rotation + rotation_per_sample;
            // The turn settles out rather than continuing forever.
            rotation_per_sample.yaw /= params.rotation_decay;
        }

        if predicted_acceleration.norm_squared() <= DIST_EPS * DIST_EPS {
            current_velocity = brake_velocity(
                current_velocity,
                params.braking_deceleration,
                params.ground_friction,
                no_brakes,
                zero_friction,
                time_per_sample,
            );
        } else {
            let acceleration_dir = predicted_acceleration.normalize();
            let speed = current_velocity.norm();

            current_velocity -= (current_velocity - acceleration_dir * speed)
                * (params.ground_friction * time_per_sample);
            current_velocity += predicted_acceleration * time_per_sample;
            current_velocity = clamp_to_max_size(current_velocity, params.max_speed);
        }

        current_location += current_velocity * time_per_sample;

        let world_transform = Iso::from_parts(
            na::Translation3::from(current_location),
            current_rotation.quat(),
        );
        let relative_transform = params.origin.inv_mul(&world_transform);

        predictions.samples.push(MovementSample {
            accumulated_seconds: time_per_sample * (step + 1) as f32,
            relative_transform,
            relative_linear_velocity: params.origin.rotation.inverse() * current_velocity,
            world_transform,
            world_linear_velocity: current_velocity,
            ..MovementSample::default()
        });
    }

    predictions
}

/// Integrate velocity toward zero under braking friction/deceleration.
///
/// Sub-steps adaptively while friction is non-zero: a single large step of
/// symplectic Euler under strong deceleration would overshoot and flip the
/// velocity sign, producing an oscillating tail. Each sub-step is bounded
/// and the velocity snaps to exactly zero the moment it crosses (dot
/// against the step's starting velocity goes negative).
fn brake_velocity(
    velocity: Vec3,
    braking_deceleration: f32,
    friction: f32,
    no_brakes: bool,
    zero_friction: bool,
    time_per_sample: f32,
) -> Vec3 {
    if velocity.norm_squared() <= DIST_EPS * DIST_EPS {
        return Vec3::zeros();
    }

    let deceleration = if no_brakes {
        Vec3::zeros()
    } else {
        -braking_deceleration * velocity.normalize()
    };

    let previous_velocity = velocity;
    let mut current_velocity = velocity;
    let mut remaining = time_per_sample;

    while remaining >= TIME_EPS && current_velocity != Vec3::zeros() {
        let dt = if remaining > MAX_SIM_SUBSTEP_SECONDS && !zero_friction {
            MAX_SIM_SUBSTEP_SECONDS.min(remaining * 0.5)
        } else {
            remaining
        };
        remaining -= dt;

        current_velocity += (-friction * current_velocity + deceleration) * dt;
        if current_velocity.dot(&previous_velocity) < 0.0 {
            current_velocity = Vec3::zeros();
            break;
        }
    }

    if current_velocity.norm_squared() < SPEED_STOP_SQ {
        current_velocity = Vec3::zeros();
    }
    current_velocity
}
