/*!
The per-actor movement sample history: a bounded, ordered buffer of recent
motion, rebased against the newest sample every time one is added.

Rebasing re-expresses every retained entry relative to the new "now", which
is what lets consumers ask "where was I N seconds ago, relative to where I
am now" without re-deriving world deltas per query.

Culling is the correctness-critical part. Naive fixed-window aging would
either lose the pre-stop motion data a distance-matching consumer needs the
instant the character plants, or grow unbounded while idle. Instead:
- while motion continues, entries age out past `history_seconds`;
- when motion stops, a motionless horizon is pinned at the oldest retained
  entry and supersedes the fixed window, freezing the retained span for as
  long as the character stays put;
- repeated "still standing still" samples collapse into a single zero
  sample;
- when motion resumes, the horizon is cleared and the stale span is pruned
  all at once by normal aging.
*/

use std::collections::VecDeque;

use crate::constants::{DIST_EPS, MIN_SAMPLE_SPACING_SECONDS};
use crate::rotator::Rotator;
use crate::sample::{MovementSample, MovementSampleCollection, Vec3};

/// Ordered (oldest to newest) buffer of movement samples for one actor.
#[derive(Clone, Debug)]
pub struct SampleHistory {
    samples: VecDeque<MovementSample>,
    last_sample: MovementSample,
    last_sample_clock: Option<f32>,
    /// Pinned motionless time horizon, kept in the same rebased time frame
    /// as the samples. `None` while motion continues.
    motionless_horizon: Option<f32>,
    history_seconds: f32,
    max_samples: usize,
}

impl SampleHistory {
    pub fn new(history_seconds: f32, max_samples: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(max_samples.min(256)),
            last_sample: MovementSample::default(),
            last_sample_clock: None,
            motionless_horizon: None,
            history_seconds: history_seconds.max(0.0),
            max_samples: max_samples.max(1),
        }
    }

    /// Record a fresh sample for "now".
    ///
    /// `clock_seconds` is the caller-supplied simulation clock; deltas are
    /// derived from consecutive values and a wall clock is never consulted.
    /// Rebases the retained entries against the new sample, runs the cull
    /// pass, then appends.
    pub fn add_sample(&mut self, sample: MovementSample, clock_seconds: f32) {
        if let Some(last_clock) = self.last_sample_clock {
            let delta_seconds = clock_seconds - last_clock;
            let delta_distance = sample.distance_from(&self.last_sample);
            let delta = sample
                .world_transform
                .inv_mul(&self.last_sample.world_transform);

            for old in self.samples.iter_mut() {
                old.apply_relative_offset(&delta, -delta_seconds);
            }
            if let Some(horizon) = self.motionless_horizon.as_mut() {
                *horizon -= delta_seconds;
            }

            self.cull(delta_distance <= DIST_EPS, &sample);

            while self.samples.len() >= self.max_samples {
                log::debug!(
                    "sample history at capacity ({}); evicting oldest entry",
                    self.max_samples
                );
                self.samples.pop_front();
            }
        }

        self.samples.push_back(sample);
        self.last_sample = sample;
        self.last_sample_clock = Some(clock_seconds);
    }

    /// The cull pass over a freshly rebased history.
    fn cull(&mut self, motion_is_nearly_zero: bool, latest: &MovementSample) {
        let Some(first) = self.samples.front() else {
            return;
        };
        let first_is_zero = first.is_zero_sample();
        let first_seconds = first.accumulated_seconds;

        if motion_is_nearly_zero && !first_is_zero {
            // We were moving, and stopped. Pin the horizon so idling does
            // not age out the pre-stop motion data.
            if self.motionless_horizon.is_none() {
                log::trace!("pinning motionless horizon at {first_seconds:.3}s");
                self.motionless_horizon = Some(first_seconds);
            }
        } else if !motion_is_nearly_zero && self.motionless_horizon.take().is_some() {
            // Moving again; resume normal aging.
            log::trace!("clearing motionless horizon");
        }

        let latest_is_zero = latest.is_zero_sample();
        let history_seconds = self.history_seconds;
        let horizon = self.motionless_horizon;

        self.samples.retain(|entry| {
            if latest_is_zero && entry.is_zero_sample() {
                // Duplicate zero-motion entries just clutter the history.
                return false;
            }

            match horizon {
                // The pinned horizon ages along with the samples, freezing
                // the retained window while motionless.
                Some(horizon) => entry.accumulated_seconds >= horizon,
                None => entry.accumulated_seconds >= -history_seconds,
            }
        });
    }

    /// A copy of the retained sequence, optionally without the newest entry
    /// (for consumers that want only the settled past).
    pub fn history(&self, omit_latest: bool) -> MovementSampleCollection {
        let mut result = MovementSampleCollection::with_capacity(self.samples.len());

        let keep = if omit_latest {
            self.samples.len().saturating_sub(1)
        } else {
            self.samples.len()
        };
        result.samples.extend(self.samples.iter().take(keep).copied());

        result
    }

    /// Derive the simulator's seed acceleration and rotation velocity from
    /// the newest usable sample pair: scanning newest to oldest, the first
    /// entry separated from the newest sample by at least 10ms. Entries
    /// closer together are skipped to avoid divide-by-near-zero. Zeros when
    /// no usable pair exists.
    pub fn acceleration_and_rotation_velocity(&self) -> (Vec3, Rotator) {
        for entry in self.samples.iter().rev() {
            let separation = self.last_sample.accumulated_seconds - entry.accumulated_seconds;
            if separation >= MIN_SAMPLE_SPACING_SECONDS {
                return (
                    self.last_sample.acceleration_from(entry),
                    self.last_sample.rotation_velocity_from(entry),
                );
            }
        }

        (Vec3::zeros(), Rotator::ZERO)
    }

    /// The most recently added sample (a default sample before any add).
    #[inline]
    pub fn latest(&self) -> &MovementSample {
        &self.last_sample
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    #[inline]
    pub fn horizon_pinned(&self) -> bool {
        self.motionless_horizon.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::Iso;

    const TICK: f32 = 0.1;

    /// Drive the history like the engine would: constant velocity along +X
    /// for `moving_ticks`, then stationary for `idle_ticks`.
    fn run_move_then_idle(
        history: &mut SampleHistory,
        speed: f32,
        moving_ticks: usize,
        idle_ticks: usize,
    ) {
        let mut clock = 0.0;
        let mut x = 0.0;

        for _ in 0..moving_ticks {
            clock += TICK;
            x += speed * TICK;
            let sample = MovementSample::from_world(
                Iso::translation(x, 0.0, 0.0),
                Vec3::new(speed, 0.0, 0.0),
            );
            history.add_sample(sample, clock);
        }
        for _ in 0..idle_ticks {
            clock += TICK;
            let sample = MovementSample::from_world(Iso::translation(x, 0.0, 0.0), Vec3::zeros());
            history.add_sample(sample, clock);
        }
    }

    #[test]
    fn stationary_history_never_grows_past_one_zero_sample() {
        let mut history = SampleHistory::new(2.0, 200);
        run_move_then_idle(&mut history, 0.0, 0, 50);

        assert_eq!(history.len(), 1);
        assert!(history.latest().is_zero_sample());
    }

    #[test]
    fn idle_collapses_zero_samples_but_keeps_motion() {
        let mut history = SampleHistory::new(2.0, 200);
        run_move_then_idle(&mut history, 100.0, 5, 5);

        let zero_count = history
            .history(false)
            .samples
            .iter()
            .filter(|s| s.is_zero_sample())
            .count();
        assert_eq!(zero_count, 1);
        assert!(history.len() > 1, "pre-stop motion must be retained");
    }

    #[test]
    fn pinned_horizon_outlives_the_normal_window() {
        // Move for 1s, then idle for well over history_seconds. The
        // pre-stop motion samples must survive: idling freezes the window
        // instead of aging them out.
        let mut history = SampleHistory::new(2.0, 200);
        run_move_then_idle(&mut history, 100.0, 10, 40);

        assert!(history.horizon_pinned());
        let non_zero = history
            .history(false)
            .samples
            .iter()
            .filter(|s| !s.is_zero_sample())
            .count();
        assert!(non_zero > 0, "last pre-stop samples were aged out");
    }

    #[test]
    fn resuming_motion_unpins_and_prunes_the_stale_window() {
        let mut history = SampleHistory::new(2.0, 200);
        run_move_then_idle(&mut history, 100.0, 10, 40);
        assert!(history.horizon_pinned());

        // Move again: the horizon clears and everything older than the
        // window is pruned at once.
        let mut clock = 50.0 * TICK;
        let mut x = 100.0 * TICK * 10.0;
        for _ in 0..2 {
            clock += TICK;
            x += 100.0 * TICK;
            let sample = MovementSample::from_world(
                Iso::translation(x, 0.0, 0.0),
                Vec3::new(100.0, 0.0, 0.0),
            );
            history.add_sample(sample, clock);
        }

        assert!(!history.horizon_pinned());
        for entry in &history.history(false).samples {
            assert!(entry.accumulated_seconds >= -2.0 - 1.0e-3);
        }
    }

    #[test]
    fn moving_history_ages_out_past_the_window() {
        let mut history = SampleHistory::new(1.0, 200);
        // 3 seconds of continuous motion with a 1-second window.
        run_move_then_idle(&mut history, 100.0, 30, 0);

        let (first, last) = history.history(false).time_range().unwrap();
        assert!(first >= -1.0 - 1.0e-3);
        assert!((last - 0.0).abs() < 1.0e-5);
    }

    #[test]
    fn item_cap_evicts_oldest() {
        let mut history = SampleHistory::new(100.0, 8);
        run_move_then_idle(&mut history, 100.0, 30, 0);
        assert!(history.len() <= 8);
    }

    #[test]
    fn rebasing_keeps_entries_reconstructible_from_the_anchor() {
        let mut history = SampleHistory::new(5.0, 200);
        let mut clock = 0.0;

        // Arbitrary curvy deltas.
        let poses = [
            (Vec3::new(0.0, 0.0, 0.0), 0.0_f32),
            (Vec3::new(1.0, 0.0, 0.5), 0.4),
            (Vec3::new(2.5, 0.0, 0.2), 1.1),
            (Vec3::new(3.0, 0.0, -1.0), -0.6),
            (Vec3::new(4.2, 0.0, -1.4), 0.2),
        ];

        let mut worlds = Vec::new();
        for (translation, yaw) in poses {
            clock += TICK;
            let world = Iso::new(translation, Vec3::new(0.0, yaw, 0.0));
            worlds.push(world);
            let sample = MovementSample::from_world(world, Vec3::new(10.0, 0.0, 0.0));
            history.add_sample(sample, clock);
        }

        // The newest sample is the anchor; every retained entry's world
        // pose must be recoverable as anchor * relative.
        let anchor = *worlds.last().unwrap();
        let retained = history.history(false);
        assert_eq!(retained.len(), poses.len());

        for (entry, world) in retained.samples.iter().zip(worlds.iter()) {
            let reconstructed = anchor * entry.relative_transform;
            let drift =
                (reconstructed.translation.vector - world.translation.vector).norm();
            assert!(drift < 1.0e-3, "translation drift {drift}");
            assert!(reconstructed.rotation.angle_to(&world.rotation) < 1.0e-3);
        }
    }

    #[test]
    fn history_can_omit_the_newest_entry() {
        let mut history = SampleHistory::new(2.0, 200);
        run_move_then_idle(&mut history, 100.0, 4, 0);

        let full = history.history(false);
        let settled = history.history(true);
        assert_eq!(settled.len(), full.len() - 1);
        let newest = full.samples.last().unwrap().accumulated_seconds;
        assert!(
            settled
                .samples
                .iter()
                .all(|s| s.accumulated_seconds < newest)
        );
    }

    #[test]
    fn derivation_skips_entries_too_close_in_time() {
        let mut history = SampleHistory::new(2.0, 200);
        let mut clock = 0.0;

        // Two well-separated samples, then one only 1ms after.
        for (dt, x, vx) in [(0.5, 0.0, 100.0), (0.5, 100.0, 300.0), (0.001, 100.3, 300.0)] {
            clock += dt;
            let sample = MovementSample::from_world(
                Iso::translation(x, 0.0, 0.0),
                Vec3::new(vx, 0.0, 0.0),
            );
            history.add_sample(sample, clock);
        }

        let (accel, _) = history.acceleration_and_rotation_velocity();
        // The 1ms-old entry is skipped; the pair spans the newest sample
        // and the one 0.501s older: (300 - 300) / 0.501 = 0.
        assert!(accel.x.abs() < 1.0e-3);
    }

    #[test]
    fn empty_history_derives_zero_rates() {
        let history = SampleHistory::new(2.0, 200);
        let (accel, rot) = history.acceleration_and_rotation_velocity();
        assert_eq!(accel, Vec3::zeros());
        assert_eq!(rot, Rotator::ZERO);
    }
}
