//! Input events and the per-frame held-key snapshot.
//!
//! The host queues discrete events and delivers them at the start of a
//! frame. Event handling captures intent only; world mutation waits for the
//! update pass.

use crate::sim::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    W,
    A,
    S,
    D,
    Space,
    Enter,
    Escape,
}

const KEY_COUNT: usize = 11;

impl Key {
    const fn index(self) -> usize {
        match self {
            Key::Up => 0,
            Key::Down => 1,
            Key::Left => 2,
            Key::Right => 3,
            Key::W => 4,
            Key::A => 5,
            Key::S => 6,
            Key::D => 7,
            Key::Space => 8,
            Key::Enter => 9,
            Key::Escape => 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    KeyDown(Key),
    KeyUp(Key),
    PointerDown { x: f32, y: f32 },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InputState {
    down: [bool; KEY_COUNT],
}

impl InputState {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: &InputEvent) {
        match event {
            InputEvent::KeyDown(key) => self.set(*key, true),
            InputEvent::KeyUp(key) => self.set(*key, false),
            InputEvent::PointerDown { .. } => {}
        }
    }

    pub fn set(&mut self, key: Key, is_down: bool) {
        self.down[key.index()] = is_down;
    }

    pub fn is_down(&self, key: Key) -> bool {
        self.down[key.index()]
    }

    pub fn with_key_down(mut self, key: Key) -> Self {
        self.set(key, true);
        self
    }

    /// Raw directional intent from WASD/arrows, unnormalized; y grows
    /// downward like the screen.
    pub fn move_axes(&self) -> Vec2 {
        let right = (self.is_down(Key::D) || self.is_down(Key::Right)) as i32;
        let left = (self.is_down(Key::A) || self.is_down(Key::Left)) as i32;
        let down = (self.is_down(Key::S) || self.is_down(Key::Down)) as i32;
        let up = (self.is_down(Key::W) || self.is_down(Key::Up)) as i32;
        Vec2::new((right - left) as f32, (down - up) as f32)
    }

    pub fn horizontal_axis(&self) -> f32 {
        self.move_axes().x
    }
}
