/*!
Per-actor movement trajectory recording and prediction.

Maintains a rebased history of kinematic samples for a character, derives
stop/pivot predictions from its current state, and simulates its future
trajectory across a fixed horizon. Built for animation-side consumers
(distance matching, stride warping, trajectory-fed blending) that need
"where was I, where will I be" answers relative to the actor's current
transform.

The crate is driven entirely by the caller's simulation clock and never
reads wall time, so identical inputs produce bit-identical output across
repeated runs, replays, and per-authority re-simulation.

Coordinate convention is Y-up: ground-plane motion lives in XZ and yaw
rotates about +Y.
*/

pub mod constants;
pub mod engine;
pub mod history;
pub mod predict;
pub mod rotator;
pub mod sample;
pub mod simulate;
pub mod utils;

pub use engine::{
    KinematicSnapshot, KinematicSource, TrajectoryConfig, TrajectoryEngine, TrajectoryState,
};
pub use history::SampleHistory;
pub use predict::{predict_grounded_pivot, predict_grounded_stop};
pub use rotator::Rotator;
pub use sample::{Iso, MovementSample, MovementSampleCollection, Quat, Vec3};
pub use simulate::{FutureSimParams, simulate_future};
