/*!
Trajectory engine tolerances and default tunables.

These constants centralize the parameters used by the sample history, the
stop/pivot predictors, and the future-trajectory simulator. Keeping them
together makes tuning easier and helps ensure deterministic behavior across
platforms.

Notes
- The engine is unit-agnostic: "world units" below means whatever length
  unit the caller's kinematic state uses, as long as it is consistent.
- Angles are degrees, time is seconds.
- Favor practical world-space tolerances over machine epsilon for robust
  behavior.
- The `DEFAULT_*` values are per-actor defaults; override them through
  `TrajectoryConfig` from your game data.
*/

/// Practical small distance for comparisons (world units).
/// Used for zero-sample detection on translations and linear velocities.
pub const DIST_EPS: f32 = 1.0e-4;

/// Rotation tolerance for "is this an identity rotation" checks (radians).
pub const ROT_EPS: f32 = 1.0e-4;

/// Rotator-axis tolerance for "is this rotation rate meaningful" checks (degrees).
pub const DEG_EPS: f32 = 1.0e-4;

/// Minimum delta time considered a distinct tick (seconds).
/// Sampling is skipped entirely below this to avoid divide-by-near-zero
/// when deriving rates from adjacent samples.
pub const TIME_EPS: f32 = 1.0e-6;

/// Minimum time separation between two history samples used to derive
/// acceleration and rotation velocity (seconds). Entries closer together
/// than this are skipped.
pub const MIN_SAMPLE_SPACING_SECONDS: f32 = 0.01;

/// Upper bound on a single braking-integration sub-step (seconds).
/// Bounding the step prevents symplectic-Euler overshoot under strong
/// deceleration; the integrator also halves the remaining time per sub-step.
pub const MAX_SIM_SUBSTEP_SECONDS: f32 = 1.0 / 33.0;

/// Squared speed below which simulated velocity snaps to exactly zero
/// (world units² per second²).
pub const SPEED_STOP_SQ: f32 = 1.0e-4;

/// The maximum time-window of history samples that should be kept (seconds).
pub const DEFAULT_HISTORY_SECONDS: f32 = 2.0;

/// The maximum size of the trajectory sample history.
pub const DEFAULT_MAX_HISTORY_SAMPLES: usize = 200;

/// How many simulated samples are generated per second of predicted future.
pub const DEFAULT_SIM_SAMPLE_RATE: u32 = 30;

/// How many seconds of future are simulated per prediction.
pub const DEFAULT_SIM_SECONDS: f32 = 1.0;

/// The angle (degrees) between velocity and acceleration which must be
/// exceeded before a pivot can be predicted. Clamped to
/// [`PIVOT_ANGLE_MIN`], [`PIVOT_ANGLE_MAX`] at use. Values between 90 and
/// 135 suit normal use; lower can help motion matching.
pub const DEFAULT_PIVOT_ANGLE_THRESHOLD: f32 = 90.0;

/// Lower clamp for the pivot angle threshold (degrees).
pub const PIVOT_ANGLE_MIN: f32 = 90.0;

/// Upper clamp for the pivot angle threshold (degrees).
pub const PIVOT_ANGLE_MAX: f32 = 179.0;

/// Per-step divisor applied to the simulated yaw rate, modelling a turn
/// settling out rather than continuing forever. Must be >= 1.
pub const DEFAULT_ROTATION_DECAY: f32 = 1.1;
