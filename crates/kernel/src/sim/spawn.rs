//! Procedural spawning and time-based difficulty scaling.
//!
//! Difficulty parameters are pure functions of elapsed survival time,
//! recomputed every frame. Nothing here drifts as an independent counter.

use rand::seq::index::sample;
use rand::seq::IndexedRandom;
use rand::Rng;

/// Affine difficulty curve: `base + per_minute * (elapsed / 60)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Curve {
    pub base: f32,
    pub per_minute: f32,
}

impl Curve {
    pub const fn new(base: f32, per_minute: f32) -> Self {
        Self { base, per_minute }
    }

    pub fn at(&self, elapsed_secs: f32) -> f32 {
        self.base + self.per_minute * (elapsed_secs / 60.0)
    }

    /// For shrinking intervals: evaluated value never drops below `floor`.
    pub fn at_floored(&self, elapsed_secs: f32, floor: f32) -> f32 {
        self.at(elapsed_secs).max(floor)
    }
}

/// Accumulates frame time and fires when the (recomputed) interval elapses.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WaveClock {
    since_last: f32,
}

impl WaveClock {
    pub fn tick(&mut self, dt: f32, interval: f32) -> bool {
        self.since_last += dt;
        if self.since_last >= interval {
            self.since_last = 0.0;
            true
        } else {
            false
        }
    }
}

/// Picks `count` distinct lanes out of `lane_count`, without replacement.
pub fn pick_lanes<R: Rng>(rng: &mut R, lane_count: usize, count: usize) -> Vec<usize> {
    sample(rng, lane_count, count.min(lane_count)).into_vec()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HazardPhase {
    /// Warning marker; not yet hazardous. Always precedes `Falling`.
    Telegraph,
    Falling,
    /// Post-resolution display; removed after a fixed duration.
    Splash,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaneHazard {
    pub lane: usize,
    pub phase: HazardPhase,
    pub phase_secs: f32,
    /// Distance fallen so far, only meaningful while `Falling`.
    pub travel: f32,
}

impl LaneHazard {
    fn telegraph(lane: usize) -> Self {
        Self {
            lane,
            phase: HazardPhase::Telegraph,
            phase_secs: 0.0,
            travel: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaneTuning {
    pub lanes: usize,
    pub telegraph_secs: f32,
    pub splash_secs: f32,
    pub fall_speed: Curve,
    pub wave_interval: Curve,
    pub min_wave_interval: f32,
    /// Wave size is drawn uniformly from this list, so repeats weight it.
    pub wave_sizes: &'static [usize],
}

/// Lane-based hazard spawner: waves of telegraphed strikes that fall and
/// splash, with spawn rate and fall speed scaling over survival time.
#[derive(Debug, Clone, Default)]
pub struct LaneSpawner {
    elapsed: f32,
    clock: WaveClock,
    hazards: Vec<LaneHazard>,
}

impl LaneSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn hazards(&self) -> &[LaneHazard] {
        &self.hazards
    }

    pub fn fall_speed(&self, tuning: &LaneTuning) -> f32 {
        tuning.fall_speed.at(self.elapsed)
    }

    pub fn wave_interval(&self, tuning: &LaneTuning) -> f32 {
        tuning
            .wave_interval
            .at_floored(self.elapsed, tuning.min_wave_interval)
    }

    /// Advances all hazards by `dt` and returns the lanes whose strikes
    /// reached the ground this frame. `drop_height` is the fall distance
    /// from spawn to ground.
    pub fn step<R: Rng>(
        &mut self,
        dt: f32,
        drop_height: f32,
        tuning: &LaneTuning,
        rng: &mut R,
    ) -> Vec<usize> {
        self.elapsed += dt;

        let interval = self.wave_interval(tuning);
        if self.clock.tick(dt, interval) {
            let size = tuning.wave_sizes.choose(rng).copied().unwrap_or(1);
            for lane in pick_lanes(rng, tuning.lanes, size) {
                self.hazards.push(LaneHazard::telegraph(lane));
            }
        }

        let fall_speed = self.fall_speed(tuning);
        let mut landed = Vec::new();
        for hazard in &mut self.hazards {
            match hazard.phase {
                HazardPhase::Telegraph => {
                    hazard.phase_secs += dt;
                    if hazard.phase_secs >= tuning.telegraph_secs {
                        hazard.phase = HazardPhase::Falling;
                        hazard.phase_secs = 0.0;
                        hazard.travel = 0.0;
                    }
                }
                HazardPhase::Falling => {
                    hazard.travel += fall_speed * dt;
                    if hazard.travel >= drop_height {
                        landed.push(hazard.lane);
                        hazard.phase = HazardPhase::Splash;
                        hazard.phase_secs = 0.0;
                    }
                }
                HazardPhase::Splash => {
                    hazard.phase_secs += dt;
                }
            }
        }
        self.hazards.retain(|hazard| {
            hazard.phase != HazardPhase::Splash || hazard.phase_secs < tuning.splash_secs
        });

        landed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const TUNING: LaneTuning = LaneTuning {
        lanes: 6,
        telegraph_secs: 0.55,
        splash_secs: 0.22,
        fall_speed: Curve::new(720.0, 220.0),
        wave_interval: Curve::new(1.0, -0.25),
        min_wave_interval: 0.4,
        wave_sizes: &[1, 2, 2, 3],
    };

    #[test]
    fn speed_curve_is_monotonically_non_decreasing() {
        let curve = Curve::new(720.0, 220.0);
        let mut last = f32::MIN;
        for step in 0..600 {
            let value = curve.at(step as f32);
            assert!(value >= last);
            last = value;
        }
    }

    #[test]
    fn interval_curve_shrinks_monotonically_down_to_the_floor() {
        let curve = Curve::new(1.0, -0.25);
        let mut last = f32::MAX;
        for step in 0..900 {
            let value = curve.at_floored(step as f32, 0.4);
            assert!(value <= last);
            assert!(value >= 0.4);
            last = value;
        }
    }

    #[test]
    fn interval_floor_scenario_at_ten_minutes() {
        let curve = Curve::new(1.0, -0.25);
        // 1.0 - 0.25 * 10 = -1.5, floored.
        assert_eq!(curve.at_floored(600.0, 0.4), 0.4);
        // Still above the floor early on.
        assert!((curve.at_floored(60.0, 0.4) - 0.75).abs() < 1e-5);
    }

    #[test]
    fn wave_clock_fires_on_interval_and_resets() {
        let mut clock = WaveClock::default();
        assert!(!clock.tick(0.5, 1.0));
        assert!(clock.tick(0.5, 1.0));
        assert!(!clock.tick(0.5, 1.0));
    }

    #[test]
    fn picked_lanes_are_distinct_and_in_range() {
        let mut rng = Pcg32::seed_from_u64(42);
        for _ in 0..50 {
            let mut lanes = pick_lanes(&mut rng, 6, 3);
            lanes.sort_unstable();
            let before = lanes.len();
            lanes.dedup();
            assert_eq!(lanes.len(), before);
            assert!(lanes.iter().all(|lane| *lane < 6));
        }
    }

    #[test]
    fn pick_lanes_caps_at_lane_count() {
        let mut rng = Pcg32::seed_from_u64(1);
        assert_eq!(pick_lanes(&mut rng, 3, 10).len(), 3);
    }

    #[test]
    fn telegraph_always_precedes_a_landing() {
        let mut rng = Pcg32::seed_from_u64(9);
        let mut spawner = LaneSpawner::new();
        let dt = 1.0 / 60.0;
        let mut elapsed = 0.0;
        let mut first_landing_at = None;
        while elapsed < 5.0 {
            let landed = spawner.step(dt, 430.0, &TUNING, &mut rng);
            elapsed += dt;
            if !landed.is_empty() {
                first_landing_at = Some(elapsed);
                break;
            }
        }
        // A strike can never land before one spawn interval plus the full
        // telegraph window has passed.
        let earliest = TUNING.min_wave_interval + TUNING.telegraph_secs;
        assert!(first_landing_at.expect("a strike lands within 5s") > earliest);
    }

    #[test]
    fn splash_hazards_are_removed_after_their_display_window() {
        let mut rng = Pcg32::seed_from_u64(9);
        let mut spawner = LaneSpawner::new();
        let dt = 1.0 / 60.0;
        for _ in 0..(60 * 30) {
            spawner.step(dt, 430.0, &TUNING, &mut rng);
            for hazard in spawner.hazards() {
                if hazard.phase == HazardPhase::Splash {
                    assert!(hazard.phase_secs < TUNING.splash_secs);
                }
            }
        }
        // The population stays bounded because resolved strikes are purged.
        assert!(spawner.hazards().len() < 64);
    }

    #[test]
    fn spawner_difficulty_is_a_function_of_elapsed_time_only() {
        let mut rng_a = Pcg32::seed_from_u64(1);
        let mut rng_b = Pcg32::seed_from_u64(2);
        let mut spawner_a = LaneSpawner::new();
        let mut spawner_b = LaneSpawner::new();
        for _ in 0..120 {
            spawner_a.step(1.0 / 60.0, 430.0, &TUNING, &mut rng_a);
            spawner_b.step(1.0 / 60.0, 430.0, &TUNING, &mut rng_b);
        }
        // Different RNG streams, identical derived difficulty.
        assert_eq!(spawner_a.fall_speed(&TUNING), spawner_b.fall_speed(&TUNING));
        assert_eq!(
            spawner_a.wave_interval(&TUNING),
            spawner_b.wave_interval(&TUNING)
        );
    }
}
