//! Wander-and-pursue steering for autonomous obstacles.

use rand::Rng;

use super::{Rect, Vec2, DIR_FALLBACK};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WanderTuning {
    pub speed_min: f32,
    pub speed_max: f32,
    pub redirect_min_secs: f32,
    pub redirect_max_secs: f32,
    /// Pursuit kicks in when the target is closer than this.
    pub aggro_radius: f32,
    /// Magnitude of the per-second steering vector blended toward the target.
    pub pursuit_accel: f32,
    /// Pursuit never lets the speed drop below this.
    pub pursuit_speed_floor: f32,
}

/// An obstacle that drifts in random directions and curves toward a tracked
/// target inside its aggro radius. Velocity blending keeps the pursuit
/// smooth; boundaries bounce instead of stopping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wanderer {
    pub pos: Vec2,
    pub vel: Vec2,
    redirect_in: f32,
}

impl Wanderer {
    pub fn new(pos: Vec2, vel: Vec2, redirect_in: f32) -> Self {
        Self {
            pos,
            vel,
            redirect_in,
        }
    }

    pub fn spawn<R: Rng>(pos: Vec2, tuning: &WanderTuning, rng: &mut R) -> Self {
        let speed = rng.random_range(tuning.speed_min..=tuning.speed_max);
        let vel = random_dir(rng) * speed;
        let redirect_in = rng.random_range(tuning.redirect_min_secs..=tuning.redirect_max_secs);
        Self::new(pos, vel, redirect_in)
    }

    pub fn step<R: Rng>(
        &mut self,
        dt: f32,
        target: Option<Vec2>,
        bounds: Rect,
        tuning: &WanderTuning,
        rng: &mut R,
    ) {
        self.redirect_in -= dt;
        if self.redirect_in <= 0.0 {
            let speed = rng.random_range(tuning.speed_min..=tuning.speed_max);
            self.vel = random_dir(rng) * speed;
            self.redirect_in =
                rng.random_range(tuning.redirect_min_secs..=tuning.redirect_max_secs);
        }

        if let Some(target) = target {
            let to_target = target - self.pos;
            let dist_sq = to_target.length_squared();
            if dist_sq > 0.0 && dist_sq < tuning.aggro_radius * tuning.aggro_radius {
                let speed = self.vel.length().max(tuning.pursuit_speed_floor);
                let blended =
                    self.vel + to_target.normalized_or(DIR_FALLBACK) * tuning.pursuit_accel * dt;
                self.vel = blended.normalized_or(DIR_FALLBACK) * speed;
            }
        }

        self.pos += self.vel * dt;

        let mut bounced = false;
        if self.pos.x < bounds.left() || self.pos.x > bounds.right() {
            self.vel.x = -self.vel.x;
            bounced = true;
        }
        if self.pos.y < bounds.top() || self.pos.y > bounds.bottom() {
            self.vel.y = -self.vel.y;
            bounced = true;
        }
        if bounced {
            self.pos = self.pos.clamped_into(bounds, 0.0);
        }
    }
}

/// Uniform random unit direction; degenerate samples fall back to a fixed
/// direction rather than faulting.
pub fn random_dir<R: Rng>(rng: &mut R) -> Vec2 {
    Vec2::new(
        rng.random_range(-1.0..=1.0),
        rng.random_range(-1.0..=1.0),
    )
    .normalized_or_fallback()
}
