//! Four-direction frame animation for walking actors.
//!
//! Frames are image keys like `character/left_0.png`; the cache resolves
//! them lazily at draw time. A direction with no frames on disk borrows its
//! mirror so a half-shipped sprite set still animates.

use crate::frame::{Color, Frame};
use crate::resources::Resources;
use crate::sim::Vec2;

const PLACEHOLDER_COLOR: Color = [220, 220, 240, 255];
const PLACEHOLDER_HALF_SIZE: i32 = 12;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Facing {
    Left,
    Right,
    Up,
    #[default]
    Down,
}

impl Facing {
    /// Dominant-axis facing for a velocity; None when there is no motion to
    /// infer a direction from.
    pub fn from_velocity(vel: Vec2) -> Option<Facing> {
        if vel.length_squared() <= f32::EPSILON {
            return None;
        }
        if vel.x.abs() > vel.y.abs() {
            Some(if vel.x < 0.0 { Facing::Left } else { Facing::Right })
        } else {
            Some(if vel.y < 0.0 { Facing::Up } else { Facing::Down })
        }
    }

    pub fn token(self) -> &'static str {
        match self {
            Facing::Left => "left",
            Facing::Right => "right",
            Facing::Up => "up",
            Facing::Down => "down",
        }
    }

    pub fn mirror(self) -> Facing {
        match self {
            Facing::Left => Facing::Right,
            Facing::Right => Facing::Left,
            Facing::Up => Facing::Down,
            Facing::Down => Facing::Up,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FacingAnim {
    base: String,
    frames_per_dir: usize,
    fps: f32,
    facing: Facing,
    index: usize,
    timer: f32,
}

impl FacingAnim {
    pub fn new(base: impl Into<String>, frames_per_dir: usize, fps: f32) -> Self {
        Self {
            base: base.into(),
            frames_per_dir: frames_per_dir.max(1),
            fps,
            facing: Facing::default(),
            index: 0,
            timer: 0.0,
        }
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn set_facing(&mut self, facing: Facing) {
        if self.facing != facing {
            self.facing = facing;
            self.index = 0;
            self.timer = 0.0;
        }
    }

    /// Steps the frame counter while moving; idle snaps back to frame 0.
    pub fn advance(&mut self, dt: f32, moving: bool) {
        if !moving {
            self.index = 0;
            self.timer = 0.0;
            return;
        }
        self.timer += dt;
        let frame_time = 1.0 / self.fps.max(1.0);
        while self.timer >= frame_time {
            self.timer -= frame_time;
            self.index = (self.index + 1) % self.frames_per_dir;
        }
    }

    pub fn frame_key(&self, facing: Facing) -> String {
        format!("{}/{}_{}.png", self.base, facing.token(), self.index)
    }

    /// Draws the current frame centered on `pos`, trying the mirror
    /// direction when the primary set is missing and falling back to a
    /// placeholder block when neither resolves.
    pub fn draw(&self, frame: &mut Frame, resources: &mut Resources, pos: Vec2) {
        for facing in [self.facing, self.facing.mirror()] {
            let key = self.frame_key(facing);
            if let Some(image) = resources.image(&key) {
                frame.blit_rgba(
                    pos.x.round() as i32 - image.width as i32 / 2,
                    pos.y.round() as i32 - image.height as i32 / 2,
                    image.width,
                    image.height,
                    &image.rgba,
                    255,
                );
                return;
            }
        }
        frame.fill_rect(
            pos.x.round() as i32 - PLACEHOLDER_HALF_SIZE,
            pos.y.round() as i32 - PLACEHOLDER_HALF_SIZE,
            PLACEHOLDER_HALF_SIZE * 2,
            PLACEHOLDER_HALF_SIZE * 2,
            PLACEHOLDER_COLOR,
        );
    }
}
