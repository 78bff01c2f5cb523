//! Block stacking: a carriage sweeps across the top, space drops the block,
//! and only the part that lands on the previous layer survives. Miss badly
//! enough and the tower is unrecoverable.

use kernel::{
    Challenge, ChallengeId, Conclusion, Context, Frame, InputEvent, Key, Outcome, OutcomeCell,
    Rect, SceneCommand, SceneId, ToastSpec, TransitionRequest,
};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

const GRAVITY: f32 = 1200.0;
const BASE_WIDTH: f32 = 120.0;
const BASE_THICKNESS: f32 = 10.0;
const LAYER_THICKNESS_MIN: f32 = 16.0;
const LAYER_THICKNESS_MAX: f32 = 34.0;
const LAYER_GAP_MIN: f32 = 4.0;
const LAYER_GAP_MAX: f32 = 16.0;
const SWEEP_SPEED: f32 = 230.0;
const SWEEP_MARGIN: f32 = 40.0;
const SPAWN_Y: f32 = 80.0;
const GOAL_LAYERS: usize = 8;
const MIN_REMAINDER: f32 = 8.0;
const FRAGMENT_CULL_PAD: f32 = 200.0;

const ACHIEVEMENT: &str = "junk_sculptor";
const END_SCRIPT: &str = "stack_end.json";
const RETRY_SCRIPT: &str = "stack_retry.json";

const BG_COLOR: [u8; 4] = [18, 12, 20, 255];
const BASE_COLOR: [u8; 4] = [60, 60, 80, 255];
const LAYER_COLOR: [u8; 4] = [200, 160, 90, 255];
const ACTIVE_COLOR: [u8; 4] = [220, 190, 110, 255];
const FRAGMENT_COLOR: [u8; 4] = [150, 120, 70, 255];
const HUD_TEXT: [u8; 4] = [210, 210, 210, 255];

#[derive(Debug)]
pub struct Stack {
    size: (u32, u32),
    /// Target box the falling block is clipped against.
    slot: Rect,
    active: Rect,
    sweep_dir: f32,
    falling: bool,
    fall_speed: f32,
    layers: Vec<Rect>,
    fragments: Vec<(Rect, f32)>,
    outcome: OutcomeCell,
    rng: Pcg32,
}

impl Stack {
    pub fn new(size: (u32, u32), seed: u64) -> Self {
        let (w, h) = (size.0 as f32, size.1 as f32);
        let mut rng = Pcg32::seed_from_u64(seed);
        let base_top = h - 80.0;
        let slot = next_slot(
            Rect::new(w / 2.0 - BASE_WIDTH / 2.0, base_top, BASE_WIDTH, 0.0),
            &mut rng,
        );
        let active = spawn_active(&slot);
        Self {
            size,
            slot,
            active,
            sweep_dir: 1.0,
            falling: false,
            fall_speed: 0.0,
            layers: Vec::new(),
            fragments: Vec::new(),
            outcome: OutcomeCell::new(),
            rng,
        }
    }

    fn base_rect(&self) -> Rect {
        let (w, h) = (self.size.0 as f32, self.size.1 as f32);
        Rect::new(w / 2.0 - BASE_WIDTH / 2.0, h - 80.0, BASE_WIDTH, BASE_THICKNESS)
    }

    fn land(&mut self, ctx: &mut Context) -> SceneCommand {
        self.active.y = self.slot.bottom() - self.active.h;
        let placed = self.active.intersection(&self.slot);
        let min_width = MIN_REMAINDER.max(self.slot.h / 2.0);

        let placed = match placed {
            Some(rect) if rect.w >= min_width => rect,
            _ => {
                // Structural failure: nothing (or too little) landed on the
                // tower.
                self.fragments.push((self.active, self.fall_speed));
                self.falling = false;
                return self.outcome.conclude(
                    ctx,
                    Conclusion::lost(TransitionRequest::through_script(
                        RETRY_SCRIPT,
                        SceneId::Challenge(ChallengeId::Stack),
                    )),
                );
            }
        };

        if self.active.left() < placed.left() {
            self.fragments.push((
                Rect::new(
                    self.active.left(),
                    placed.top(),
                    placed.left() - self.active.left(),
                    placed.h,
                ),
                self.fall_speed,
            ));
        }
        if self.active.right() > placed.right() {
            self.fragments.push((
                Rect::new(
                    placed.right(),
                    placed.top(),
                    self.active.right() - placed.right(),
                    placed.h,
                ),
                self.fall_speed,
            ));
        }

        self.layers.push(placed);
        if self.layers.len() >= GOAL_LAYERS {
            return self.outcome.conclude(
                ctx,
                Conclusion::won(TransitionRequest::through_script(
                    END_SCRIPT,
                    SceneId::Challenge(ChallengeId::Maze),
                ))
                .with_achievement(ACHIEVEMENT)
                .with_chapter(2)
                .with_toast(
                    ToastSpec::new("Achievement: Junk Sculptor")
                        .with_icon("trophy.png")
                        .with_sound("chime.wav"),
                ),
            );
        }

        self.slot = next_slot(placed, &mut self.rng);
        self.active = spawn_active(&self.slot);
        self.falling = false;
        self.fall_speed = 0.0;
        self.sweep_dir = 1.0;
        SceneCommand::None
    }
}

/// Random thickness and gap for the layer above `below`, same width.
fn next_slot<R: Rng>(below: Rect, rng: &mut R) -> Rect {
    let thickness = rng.random_range(LAYER_THICKNESS_MIN..=LAYER_THICKNESS_MAX);
    let gap = rng.random_range(LAYER_GAP_MIN..=LAYER_GAP_MAX);
    Rect::new(below.x, below.top() - gap - thickness, below.w, thickness)
}

fn spawn_active(slot: &Rect) -> Rect {
    Rect::new(SWEEP_MARGIN, SPAWN_Y, slot.w, slot.h)
}

impl Challenge for Stack {
    fn handle_event(&mut self, event: &InputEvent, _ctx: &mut Context) {
        if let InputEvent::KeyDown(Key::Space) = event {
            if !self.falling && self.outcome.is_ongoing() {
                self.falling = true;
                self.fall_speed = 0.0;
            }
        }
    }

    fn update(&mut self, dt: f32, ctx: &mut Context) -> SceneCommand {
        if !self.outcome.is_ongoing() {
            return SceneCommand::None;
        }
        let (w, h) = (self.size.0 as f32, self.size.1 as f32);

        let mut command = SceneCommand::None;
        if !self.falling {
            let left = SWEEP_MARGIN;
            let right = w - SWEEP_MARGIN - self.active.w;
            self.active.x += SWEEP_SPEED * self.sweep_dir * dt;
            if self.active.x < left {
                self.active.x = left;
                self.sweep_dir = 1.0;
            }
            if self.active.x > right {
                self.active.x = right;
                self.sweep_dir = -1.0;
            }
        } else {
            self.fall_speed += GRAVITY * dt;
            self.active.y += self.fall_speed * dt;
            if self.active.bottom() >= self.slot.bottom() {
                command = self.land(ctx);
            }
        }

        for (rect, fall_speed) in &mut self.fragments {
            *fall_speed += GRAVITY * dt;
            rect.y += *fall_speed * dt;
        }
        self.fragments
            .retain(|(rect, _)| rect.top() < h + FRAGMENT_CULL_PAD);

        command
    }

    fn draw(&self, frame: &mut Frame, ctx: &mut Context) {
        frame.clear(BG_COLOR);
        frame.fill_rect_f(self.base_rect(), BASE_COLOR);
        for layer in &self.layers {
            frame.fill_rect_f(*layer, LAYER_COLOR);
        }
        if self.outcome.is_ongoing() {
            frame.fill_rect_f(self.active, ACTIVE_COLOR);
        }
        for (rect, _) in &self.fragments {
            frame.fill_rect_f(*rect, FRAGMENT_COLOR);
        }

        let font = ctx.resources.font("better-vcr.ttf", 14);
        font.draw(
            frame,
            16,
            12,
            &format!("SPACE to drop. {} / {GOAL_LAYERS} layers", self.layers.len()),
            HUD_TEXT,
        );
    }

    fn outcome(&self) -> Outcome {
        self.outcome.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_context;
    use kernel::InputEvent;

    const DT: f32 = 1.0 / 60.0;

    fn stack() -> Stack {
        Stack::new((960, 540), 21)
    }

    /// Drops the active block centered on the slot and runs until it lands.
    fn drop_centered(stack: &mut Stack, ctx: &mut Context) -> SceneCommand {
        stack.active.x = stack.slot.x;
        stack.handle_event(&InputEvent::KeyDown(Key::Space), ctx);
        for _ in 0..600 {
            let command = stack.update(DT, ctx);
            if !stack.falling || !stack.outcome.is_ongoing() {
                return command;
            }
        }
        panic!("block never landed");
    }

    #[test]
    fn carriage_sweeps_between_the_margins() {
        let (_dir, mut ctx) = test_context();
        let mut stack = stack();
        for _ in 0..1200 {
            stack.update(DT, &mut ctx);
            assert!(stack.active.left() >= SWEEP_MARGIN - 1e-3);
            assert!(stack.active.right() <= 960.0 - SWEEP_MARGIN + 1e-3);
        }
    }

    #[test]
    fn eight_clean_drops_win_exactly_once() {
        let (_dir, mut ctx) = test_context();
        let mut stack = stack();
        let mut transitions = Vec::new();
        for _ in 0..GOAL_LAYERS {
            if let SceneCommand::Transition(request) = drop_centered(&mut stack, &mut ctx) {
                transitions.push(request);
            }
        }
        assert_eq!(stack.outcome(), Outcome::Won);
        assert_eq!(transitions.len(), 1);
        assert_eq!(
            transitions[0].destination,
            SceneId::Challenge(ChallengeId::Maze)
        );
        assert!(ctx.progress.has(ACHIEVEMENT));
        assert_eq!(ctx.progress.chapter(), 2);
    }

    #[test]
    fn offset_drop_narrows_the_next_layer_and_sheds_a_fragment() {
        let (_dir, mut ctx) = test_context();
        let mut stack = stack();
        let offset = 30.0;
        stack.active.x = stack.slot.x + offset;
        stack.handle_event(&InputEvent::KeyDown(Key::Space), &mut ctx);
        while stack.falling {
            stack.update(DT, &mut ctx);
        }
        assert_eq!(stack.layers.len(), 1);
        assert!((stack.layers[0].w - (BASE_WIDTH - offset)).abs() < 1.0);
        assert_eq!(stack.slot.w, stack.layers[0].w);
        assert!(!stack.fragments.is_empty());
    }

    #[test]
    fn a_drop_missing_the_slot_is_a_structural_loss() {
        let (_dir, mut ctx) = test_context();
        let mut stack = stack();
        stack.active.x = stack.slot.right() + 50.0;
        stack.handle_event(&InputEvent::KeyDown(Key::Space), &mut ctx);
        let mut saw_transition = false;
        for _ in 0..600 {
            if let SceneCommand::Transition(request) = stack.update(DT, &mut ctx) {
                assert_eq!(request.destination, SceneId::Challenge(ChallengeId::Stack));
                assert_eq!(request.script.as_deref(), Some(RETRY_SCRIPT));
                saw_transition = true;
                break;
            }
        }
        assert!(saw_transition);
        assert_eq!(stack.outcome(), Outcome::Lost);
        assert!(stack.layers.is_empty());
    }

    #[test]
    fn a_sliver_below_the_structural_minimum_loses() {
        let (_dir, mut ctx) = test_context();
        let mut stack = stack();
        let min_width = MIN_REMAINDER.max(stack.slot.h / 2.0);
        stack.active.x = stack.slot.right() - (min_width - 1.0);
        stack.handle_event(&InputEvent::KeyDown(Key::Space), &mut ctx);
        for _ in 0..600 {
            stack.update(DT, &mut ctx);
            if !stack.outcome.is_ongoing() {
                break;
            }
        }
        assert_eq!(stack.outcome(), Outcome::Lost);
    }

    #[test]
    fn fragments_fall_off_screen_and_are_culled() {
        let (_dir, mut ctx) = test_context();
        let mut stack = stack();
        stack.fragments.push((Rect::new(10.0, 500.0, 20.0, 20.0), 0.0));
        for _ in 0..240 {
            stack.update(DT, &mut ctx);
        }
        assert!(stack.fragments.is_empty());
    }

    #[test]
    fn space_does_nothing_after_the_challenge_ends() {
        let (_dir, mut ctx) = test_context();
        let mut stack = stack();
        stack.active.x = stack.slot.right() + 50.0;
        stack.handle_event(&InputEvent::KeyDown(Key::Space), &mut ctx);
        for _ in 0..600 {
            stack.update(DT, &mut ctx);
        }
        stack.handle_event(&InputEvent::KeyDown(Key::Space), &mut ctx);
        assert!(!stack.falling);
    }
}
