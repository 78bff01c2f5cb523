//! Volley: a grid of hostiles marches across the field, bouncing off the
//! walls, descending a step and speeding up at every turn. Clear them all
//! before they reach your line.

use kernel::{
    Challenge, ChallengeId, Conclusion, Context, Frame, InputEvent, Key, Outcome, OutcomeCell,
    Rect, SceneCommand, SceneId, ToastSpec, TransitionRequest,
};
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

const PLAYER_SPEED: f32 = 280.0;
const FIRE_COOLDOWN: f32 = 0.28;
const STARTING_LIVES: u32 = 3;
const SHOT_SPEED: f32 = 520.0;
const ENEMY_SHOT_SPEED: f32 = 240.0;

const ENEMY_ROWS: usize = 5;
const ENEMY_COLS: usize = 10;
const MARCH_SPEED: f32 = 70.0;
const DESCEND_STEP: f32 = 20.0;
const TURN_SPEEDUP: f32 = 1.06;
const ENEMY_FIRE_DELAY_MIN: f32 = 0.7;
const ENEMY_FIRE_DELAY_MAX: f32 = 1.8;
const WALL_PAD: f32 = 8.0;
const BREACH_MARGIN: f32 = 10.0;
const SCORE_PER_KILL: u32 = 10;

const ACHIEVEMENT: &str = "sharpshooter";
const END_SCRIPT: &str = "invaders_end.json";
const RETRY_SCRIPT: &str = "invaders_retry.json";

const BG_COLOR: [u8; 4] = [8, 10, 18, 255];
const ENEMY_COLOR: [u8; 4] = [160, 200, 255, 255];
const SHOT_COLOR: [u8; 4] = [255, 245, 140, 255];
const ENEMY_SHOT_COLOR: [u8; 4] = [255, 120, 110, 255];
const PLAYER_COLOR: [u8; 4] = [110, 255, 160, 255];
const HUD_TEXT: [u8; 4] = [220, 220, 230, 255];

#[derive(Debug)]
pub struct Invaders {
    size: (u32, u32),
    player: Rect,
    cooldown: f32,
    lives: u32,
    score: u32,
    shots: Vec<Rect>,
    enemy_shots: Vec<Rect>,
    /// Row-major grid; downed hostiles become None.
    enemies: Vec<Option<Rect>>,
    march_dir: f32,
    march_speed: f32,
    fire_in: f32,
    outcome: OutcomeCell,
    rng: Pcg32,
}

impl Invaders {
    pub fn new(size: (u32, u32), seed: u64) -> Self {
        let (w, h) = (size.0 as f32, size.1 as f32);
        let mut rng = Pcg32::seed_from_u64(seed);

        let (margin_x, margin_y) = (80.0, 80.0);
        let (spacing_x, spacing_y) = (48.0, 36.0);
        let mut enemies = Vec::with_capacity(ENEMY_ROWS * ENEMY_COLS);
        for row in 0..ENEMY_ROWS {
            for col in 0..ENEMY_COLS {
                enemies.push(Some(Rect::new(
                    margin_x + col as f32 * spacing_x,
                    margin_y + row as f32 * spacing_y,
                    28.0,
                    18.0,
                )));
            }
        }

        let fire_in = rng.random_range(ENEMY_FIRE_DELAY_MIN..=ENEMY_FIRE_DELAY_MAX);
        Self {
            size,
            player: Rect::new(w / 2.0 - 18.0, h - 64.0, 36.0, 16.0),
            cooldown: 0.0,
            lives: STARTING_LIVES,
            score: 0,
            shots: Vec::new(),
            enemy_shots: Vec::new(),
            enemies,
            march_dir: 1.0,
            march_speed: MARCH_SPEED,
            fire_in,
            outcome: OutcomeCell::new(),
            rng,
        }
    }

    fn living(&self) -> impl Iterator<Item = &Rect> {
        self.enemies.iter().flatten()
    }

    fn living_bounds(&self) -> Option<Rect> {
        let mut iter = self.living();
        let first = *iter.next()?;
        let mut left = first.left();
        let mut right = first.right();
        let mut top = first.top();
        let mut bottom = first.bottom();
        for enemy in iter {
            left = left.min(enemy.left());
            right = right.max(enemy.right());
            top = top.min(enemy.top());
            bottom = bottom.max(enemy.bottom());
        }
        Some(Rect::new(left, top, right - left, bottom - top))
    }

    /// Bottom-most living hostile in the given column.
    fn column_gunner(&self, col: usize) -> Option<Rect> {
        (0..ENEMY_ROWS)
            .rev()
            .find_map(|row| self.enemies[row * ENEMY_COLS + col])
    }

    fn lose(&mut self, ctx: &mut Context) -> SceneCommand {
        self.outcome.conclude(
            ctx,
            Conclusion::lost(TransitionRequest::through_script(
                RETRY_SCRIPT,
                SceneId::Challenge(ChallengeId::Invaders),
            )),
        )
    }

    fn win(&mut self, ctx: &mut Context) -> SceneCommand {
        self.outcome.conclude(
            ctx,
            Conclusion::won(TransitionRequest::through_script(
                END_SCRIPT,
                SceneId::Challenge(ChallengeId::Breakout),
            ))
            .with_achievement(ACHIEVEMENT)
            .with_toast(
                ToastSpec::new("Achievement: Sharpshooter")
                    .with_icon("trophy.png")
                    .with_sound("chime.wav"),
            ),
        )
    }
}

impl Challenge for Invaders {
    fn handle_event(&mut self, event: &InputEvent, _ctx: &mut Context) {
        if let InputEvent::KeyDown(Key::Space) = event {
            if self.cooldown <= 0.0 && self.outcome.is_ongoing() {
                self.cooldown = FIRE_COOLDOWN;
                self.shots.push(Rect::new(
                    self.player.center().x - 2.0,
                    self.player.top() - 10.0,
                    4.0,
                    10.0,
                ));
            }
        }
    }

    fn update(&mut self, dt: f32, ctx: &mut Context) -> SceneCommand {
        if !self.outcome.is_ongoing() {
            return SceneCommand::None;
        }
        let (w, h) = (self.size.0 as f32, self.size.1 as f32);

        self.player.x += ctx.input.horizontal_axis() * PLAYER_SPEED * dt;
        self.player = self
            .player
            .clamped_into(Rect::new(WALL_PAD, 0.0, w - WALL_PAD * 2.0, h));

        if self.cooldown > 0.0 {
            self.cooldown -= dt;
        }

        for shot in &mut self.shots {
            shot.y -= SHOT_SPEED * dt;
        }
        self.shots.retain(|shot| shot.bottom() > 0.0);

        if let Some(bounds) = self.living_bounds() {
            let dx = self.march_speed * self.march_dir * dt;
            let turning = bounds.right() + dx > w - WALL_PAD || bounds.left() + dx < WALL_PAD;
            if turning {
                self.march_dir = -self.march_dir;
                self.march_speed *= TURN_SPEEDUP;
                for enemy in self.enemies.iter_mut().flatten() {
                    enemy.y += DESCEND_STEP;
                }
            } else {
                for enemy in self.enemies.iter_mut().flatten() {
                    enemy.x += dx;
                }
            }

            if let Some(bounds) = self.living_bounds() {
                if bounds.bottom() >= self.player.top() - BREACH_MARGIN {
                    return self.lose(ctx);
                }
            }
        }

        self.fire_in -= dt;
        if self.fire_in <= 0.0 {
            self.fire_in = self
                .rng
                .random_range(ENEMY_FIRE_DELAY_MIN..=ENEMY_FIRE_DELAY_MAX);
            let armed: Vec<usize> = (0..ENEMY_COLS)
                .filter(|col| self.column_gunner(*col).is_some())
                .collect();
            if let Some(col) = armed.choose(&mut self.rng) {
                if let Some(gunner) = self.column_gunner(*col) {
                    self.enemy_shots.push(Rect::new(
                        gunner.center().x - 2.0,
                        gunner.bottom() + 2.0,
                        4.0,
                        10.0,
                    ));
                }
            }
        }

        for shot in &mut self.enemy_shots {
            shot.y += ENEMY_SHOT_SPEED * dt;
        }
        self.enemy_shots.retain(|shot| shot.top() < h);

        let enemies = &mut self.enemies;
        let mut kills = 0u32;
        self.shots.retain(|shot| {
            for slot in enemies.iter_mut() {
                if let Some(enemy) = slot {
                    if shot.overlaps(enemy) {
                        *slot = None;
                        kills += 1;
                        return false;
                    }
                }
            }
            true
        });
        self.score += kills * SCORE_PER_KILL;

        let player = self.player;
        let mut player_hits = 0;
        self.enemy_shots.retain(|shot| {
            if shot.overlaps(&player) {
                player_hits += 1;
                false
            } else {
                true
            }
        });
        if player_hits > 0 {
            self.lives = self.lives.saturating_sub(player_hits);
            if self.lives == 0 {
                return self.lose(ctx);
            }
        }

        if self.living().next().is_none() {
            return self.win(ctx);
        }
        SceneCommand::None
    }

    fn draw(&self, frame: &mut Frame, ctx: &mut Context) {
        frame.clear(BG_COLOR);
        for enemy in self.living() {
            frame.fill_rect_f(*enemy, ENEMY_COLOR);
        }
        for shot in &self.shots {
            frame.fill_rect_f(*shot, SHOT_COLOR);
        }
        for shot in &self.enemy_shots {
            frame.fill_rect_f(*shot, ENEMY_SHOT_COLOR);
        }
        frame.fill_rect_f(self.player, PLAYER_COLOR);

        let font = ctx.resources.font("better-vcr.ttf", 14);
        font.draw(frame, 14, 10, &format!("Score: {}", self.score), HUD_TEXT);
        font.draw(frame, 14, 30, &format!("Lives: {}", self.lives), HUD_TEXT);
    }

    fn outcome(&self) -> Outcome {
        self.outcome.get()
    }
}
