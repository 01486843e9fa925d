/*!
The per-actor trajectory engine.

Owns the sample history and the per-tick prediction cache, and is driven
once per simulation step by the surrounding movement framework. The engine
never reads actor state on its own: every tick and every query takes a
[`KinematicSource`], so the caller decides which state snapshot an
invocation operates on (local prediction, server replay, proxy smoothing —
each against its own snapshot of the same actor).

Stop/pivot predictions are only meaningful for grounded locomotion; while
the actor is not grounded they are cleared rather than left stale.
*/

use crate::constants::{
    DEFAULT_HISTORY_SECONDS, DEFAULT_MAX_HISTORY_SAMPLES, DEFAULT_PIVOT_ANGLE_THRESHOLD,
    DEFAULT_ROTATION_DECAY, DEFAULT_SIM_SAMPLE_RATE, DEFAULT_SIM_SECONDS, PIVOT_ANGLE_MAX,
    PIVOT_ANGLE_MIN, TIME_EPS,
};
use crate::history::SampleHistory;
use crate::predict::{predict_grounded_pivot, predict_grounded_stop};
use crate::rotator::Rotator;
use crate::sample::{Iso, MovementSample, MovementSampleCollection, Vec3};
use crate::simulate::{FutureSimParams, simulate_future};
use crate::utils::signed_planar_angle_degrees;

/// The kinematic state the engine needs from the movement driver each tick.
///
/// A narrow capability seam: the engine never couples to the driver's
/// component hierarchy, it only reads these values from whatever snapshot
/// the caller hands it.
pub trait KinematicSource {
    /// Current world pose of the actor.
    fn world_transform(&self) -> Iso;
    /// Current world-space linear velocity.
    fn linear_velocity(&self) -> Vec3;
    /// Current input-derived (processed) acceleration.
    fn effective_acceleration(&self) -> Vec3;
    /// Braking deceleration magnitude while grounded.
    fn braking_deceleration(&self) -> f32;
    /// Ground friction scalar.
    fn ground_friction(&self) -> f32;
    /// Maximum movement speed.
    fn max_speed(&self) -> f32;
    /// Whether the actor currently has walkable ground support.
    fn is_grounded(&self) -> bool;
    /// Whether directional input is currently present.
    fn has_input(&self) -> bool;
}

/// A plain by-value snapshot of the kinematic state, for callers that
/// assemble it per tick (and for tests).
#[derive(Clone, Copy, Debug)]
pub struct KinematicSnapshot {
    pub world_transform: Iso,
    pub linear_velocity: Vec3,
    pub effective_acceleration: Vec3,
    pub braking_deceleration: f32,
    pub ground_friction: f32,
    pub max_speed: f32,
    pub is_grounded: bool,
    pub has_input: bool,
}

impl Default for KinematicSnapshot {
    fn default() -> Self {
        Self {
            world_transform: Iso::identity(),
            linear_velocity: Vec3::zeros(),
            effective_acceleration: Vec3::zeros(),
            braking_deceleration: 0.0,
            ground_friction: 0.0,
            max_speed: 0.0,
            is_grounded: true,
            has_input: false,
        }
    }
}

impl KinematicSource for KinematicSnapshot {
    fn world_transform(&self) -> Iso {
        self.world_transform
    }
    fn linear_velocity(&self) -> Vec3 {
        self.linear_velocity
    }
    fn effective_acceleration(&self) -> Vec3 {
        self.effective_acceleration
    }
    fn braking_deceleration(&self) -> f32 {
        self.braking_deceleration
    }
    fn ground_friction(&self) -> f32 {
        self.ground_friction
    }
    fn max_speed(&self) -> f32 {
        self.max_speed
    }
    fn is_grounded(&self) -> bool {
        self.is_grounded
    }
    fn has_input(&self) -> bool {
        self.has_input
    }
}

/// Static per-actor tunables.
#[derive(Clone, Copy, Debug)]
pub struct TrajectoryConfig {
    /// Pre-calculate stop and pivot predictions every grounded tick.
    pub precalculate_distance_matches: bool,
    /// Record historical trajectory samples.
    pub trajectory_enabled: bool,
    /// Pre-calculate the future trajectory every grounded tick.
    pub precalculate_future_trajectory: bool,
    /// Angle (degrees) between velocity and acceleration which must be
    /// exceeded before a pivot can be predicted. Clamped to [90, 179].
    pub pivot_angle_threshold: f32,
    /// Maximum time-window of retained history (seconds).
    pub history_seconds: f32,
    /// Maximum number of retained history samples.
    pub max_history_samples: usize,
    /// Simulated samples per second of predicted future.
    pub sim_sample_rate: u32,
    /// Seconds of future to simulate.
    pub sim_seconds: f32,
    /// Per-step decay divisor for the simulated yaw rate.
    pub rotation_decay: f32,
}

impl Default for TrajectoryConfig {
    fn default() -> Self {
        Self {
            precalculate_distance_matches: true,
            trajectory_enabled: true,
            precalculate_future_trajectory: true,
            pivot_angle_threshold: DEFAULT_PIVOT_ANGLE_THRESHOLD,
            history_seconds: DEFAULT_HISTORY_SECONDS,
            max_history_samples: DEFAULT_MAX_HISTORY_SAMPLES,
            sim_sample_rate: DEFAULT_SIM_SAMPLE_RATE,
            sim_seconds: DEFAULT_SIM_SECONDS,
            rotation_decay: DEFAULT_ROTATION_DECAY,
        }
    }
}

/// Per-tick prediction cache. Recomputed wholesale each tick; never
/// partially updated.
#[derive(Clone, Debug, Default)]
pub struct TrajectoryState {
    /// Actor-relative point where braking is predicted to end.
    pub predicted_stop_point: Vec3,
    pub is_stopping: bool,
    /// Actor-relative point where a direction reversal is predicted.
    pub predicted_pivot_point: Vec3,
    pub is_pivoting: bool,
    /// The last predicted trajectory (history prefix plus simulated
    /// future). Only populated when future precalculation is enabled or
    /// the caller updates it manually.
    pub predicted_trajectory: MovementSampleCollection,
}

/// Orchestrates sampling, prediction, and simulation for one actor.
pub struct TrajectoryEngine {
    config: TrajectoryConfig,
    history: SampleHistory,
    state: TrajectoryState,
    clock_seconds: f32,
}

impl TrajectoryEngine {
    pub fn new(config: TrajectoryConfig) -> Self {
        Self {
            history: SampleHistory::new(config.history_seconds, config.max_history_samples),
            state: TrajectoryState::default(),
            clock_seconds: 0.0,
            config,
        }
    }

    /// Advance the engine by one simulation step.
    ///
    /// `delta_seconds` is the externally supplied step time; the engine
    /// never reads a wall clock, so unevenly spaced invocations (replay,
    /// catch-up ticks) behave exactly like real-time ones.
    pub fn tick(&mut self, source: &impl KinematicSource, delta_seconds: f32) {
        self.clock_seconds += delta_seconds.max(0.0);

        if !source.is_grounded() {
            // Predictions only apply to grounded locomotion.
            self.state.is_stopping = false;
            self.state.is_pivoting = false;
            self.state.predicted_stop_point = Vec3::zeros();
            self.state.predicted_pivot_point = Vec3::zeros();
            return;
        }

        if self.config.precalculate_distance_matches {
            self.update_stop_prediction(source);
            self.update_pivot_prediction(source);
        }

        if self.config.trajectory_enabled {
            if delta_seconds > TIME_EPS {
                self.add_new_movement_sample(source);
            }
            if self.config.precalculate_future_trajectory {
                self.state.predicted_trajectory =
                    self.predict_movement_future(source, source.world_transform(), true);
            }
        }
    }

    /// Refresh the cached stop prediction from the current state.
    pub fn update_stop_prediction(&mut self, source: &impl KinematicSource) {
        self.state.predicted_stop_point = predict_grounded_stop(
            source.linear_velocity(),
            source.braking_deceleration(),
            source.ground_friction(),
        );
        self.state.is_stopping =
            self.state.predicted_stop_point != Vec3::zeros() && !source.has_input();
    }

    /// Refresh the cached pivot prediction from the current state.
    pub fn update_pivot_prediction(&mut self, source: &impl KinematicSource) {
        let threshold = self
            .config
            .pivot_angle_threshold
            .clamp(PIVOT_ANGLE_MIN, PIVOT_ANGLE_MAX);

        self.state.predicted_pivot_point = predict_grounded_pivot(
            source.effective_acceleration(),
            source.linear_velocity(),
            source.ground_friction(),
            threshold,
        );
        self.state.is_pivoting = self.state.predicted_pivot_point != Vec3::zeros()
            && source.has_input()
            && input_and_velocity_differ(source, threshold);
    }

    /// Record a sample of the current state into the history.
    pub fn add_new_movement_sample(&mut self, source: &impl KinematicSource) {
        let sample = self.sample_from_current_state(source);
        self.history.add_sample(sample, self.clock_seconds);
    }

    /// Build (but do not record) a sample representing the current state.
    fn sample_from_current_state(&self, source: &impl KinematicSource) -> MovementSample {
        let world_transform = source.world_transform();
        let mut sample = MovementSample::from_world(world_transform, source.linear_velocity());
        sample.actor_world_rotation = Rotator::from_quat(world_transform.rotation);

        let previous = self.history.latest();
        if !previous.is_zero_sample() {
            sample.actor_delta_rotation =
                sample.actor_world_rotation - previous.actor_world_rotation;
        }

        sample
    }

    /// The recorded history, relative to the current anchor.
    pub fn movement_history(&self, omit_latest: bool) -> MovementSampleCollection {
        self.history.history(omit_latest)
    }

    /// Simulate the future trajectory from the supplied state snapshot,
    /// relative to `origin`. Reads no state beyond the snapshot, the owned
    /// history, and the configuration, so repeated calls with identical
    /// inputs are bit-for-bit reproducible.
    pub fn predict_movement_future(
        &self,
        source: &impl KinematicSource,
        origin: Iso,
        include_history: bool,
    ) -> MovementSampleCollection {
        let current = self.sample_from_current_state(source);
        let params = FutureSimParams {
            origin,
            velocity: source.linear_velocity(),
            braking_deceleration: source.braking_deceleration(),
            ground_friction: source.ground_friction(),
            max_speed: source.max_speed(),
            sample_rate: self.config.sim_sample_rate,
            horizon_seconds: self.config.sim_seconds,
            rotation_decay: self.config.rotation_decay,
        };

        simulate_future(&self.history, &current, &params, include_history)
    }

    /// The predicted stop point, when a stop is imminent.
    pub fn is_stop_predicted(&self) -> Option<Vec3> {
        self.state.is_stopping.then_some(self.state.predicted_stop_point)
    }

    /// The predicted pivot point, when a pivot is imminent.
    pub fn is_pivot_predicted(&self) -> Option<Vec3> {
        self.state.is_pivoting.then_some(self.state.predicted_pivot_point)
    }

    #[inline]
    pub fn state(&self) -> &TrajectoryState {
        &self.state
    }

    #[inline]
    pub fn config(&self) -> &TrajectoryConfig {
        &self.config
    }

    #[inline]
    pub fn clock_seconds(&self) -> f32 {
        self.clock_seconds
    }
}

/// Is the actor being driven away from its current travel direction?
fn input_and_velocity_differ(source: &impl KinematicSource, threshold_deg: f32) -> bool {
    signed_planar_angle_degrees(source.linear_velocity(), source.effective_acceleration()).abs()
        > threshold_deg
}
