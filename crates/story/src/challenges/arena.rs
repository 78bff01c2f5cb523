//! Crowd escape: cross the floor to the exit while wandering pursuers try
//! to corner you. Drinks heal, contact drains.

use kernel::{
    circles_touch, Challenge, ChallengeId, Conclusion, Context, Facing, FacingAnim, Frame,
    InputEvent, Outcome, OutcomeCell, Rect, SceneCommand, SceneId, ToastSpec, TransitionRequest,
    Vec2, WanderTuning, Wanderer,
};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

const HP_MAX: f32 = 100.0;
const PLAYER_SPEED: f32 = 200.0;
const PLAYER_RADIUS: f32 = 12.0;
const WALL_MARGIN: f32 = 20.0;

const PURSUER_COUNT: usize = 8;
const PURSUER_RADIUS: f32 = 14.0;
const DAMAGE_PER_SEC: f32 = 60.0;
const PURSUER_TUNING: WanderTuning = WanderTuning {
    speed_min: 50.0,
    speed_max: 210.0,
    redirect_min_secs: 0.8,
    redirect_max_secs: 5.0,
    aggro_radius: 400.0,
    pursuit_accel: 1500.0,
    pursuit_speed_floor: 60.0,
};

const DRINK_COUNT: usize = 8;
const DRINK_RADIUS: f32 = 8.0;
const HEAL_PER_DRINK: f32 = 25.0;

const ACHIEVEMENT: &str = "crowd_surfer";
const END_SCRIPT: &str = "arena_end.json";
const RETRY_SCRIPT: &str = "arena_retry.json";
const BG_IMAGE: &str = "arena_floor.png";

const BG_COLOR: [u8; 4] = [18, 16, 24, 255];
const EXIT_COLOR: [u8; 4] = [60, 180, 120, 255];
const PURSUER_COLOR: [u8; 4] = [180, 60, 60, 255];
const DRINK_COLOR: [u8; 4] = [200, 200, 80, 255];
const HUD_TEXT: [u8; 4] = [220, 220, 230, 255];

#[derive(Debug)]
pub struct Arena {
    bounds: Rect,
    hp: f32,
    player: Vec2,
    anim: FacingAnim,
    pursuers: Vec<Wanderer>,
    drinks: Vec<Vec2>,
    exit: Rect,
    outcome: OutcomeCell,
    rng: Pcg32,
}

impl Arena {
    pub fn new(size: (u32, u32), seed: u64) -> Self {
        let (w, h) = (size.0 as f32, size.1 as f32);
        let bounds = Rect::new(0.0, 0.0, w, h);
        let mut rng = Pcg32::seed_from_u64(seed);

        let pursuers = (0..PURSUER_COUNT)
            .map(|_| {
                let pos = Vec2::new(
                    rng.random_range(100.0..w - 100.0),
                    rng.random_range(100.0..h - 60.0),
                );
                Wanderer::spawn(pos, &PURSUER_TUNING, &mut rng)
            })
            .collect();
        let drinks = (0..DRINK_COUNT)
            .map(|_| {
                Vec2::new(
                    rng.random_range(80.0..w - 80.0),
                    rng.random_range(80.0..h - 40.0),
                )
            })
            .collect();

        Self {
            bounds,
            hp: HP_MAX,
            player: Vec2::new(100.0, 140.0),
            anim: FacingAnim::new("character", 4, 10.0),
            pursuers,
            drinks,
            exit: Rect::new(w - 140.0, h - 100.0, 100.0, 80.0),
            outcome: OutcomeCell::new(),
            rng,
        }
    }

    fn lose(&mut self, ctx: &mut Context) -> SceneCommand {
        self.outcome.conclude(
            ctx,
            Conclusion::lost(TransitionRequest::through_script(
                RETRY_SCRIPT,
                SceneId::Challenge(ChallengeId::Arena),
            )),
        )
    }

    fn win(&mut self, ctx: &mut Context) -> SceneCommand {
        self.outcome.conclude(
            ctx,
            Conclusion::won(TransitionRequest::through_script(
                END_SCRIPT,
                SceneId::Challenge(ChallengeId::Stack),
            ))
            .with_achievement(ACHIEVEMENT)
            .with_toast(
                ToastSpec::new("Achievement: Crowd Surfer")
                    .with_icon("trophy.png")
                    .with_sound("chime.wav"),
            ),
        )
    }
}

impl Challenge for Arena {
    fn handle_event(&mut self, _event: &InputEvent, _ctx: &mut Context) {}

    fn update(&mut self, dt: f32, ctx: &mut Context) -> SceneCommand {
        if !self.outcome.is_ongoing() {
            return SceneCommand::None;
        }

        let intent = ctx.input.move_axes();
        let moving = intent.length_squared() > 0.0;
        if moving {
            let step = intent.normalized_or_fallback() * PLAYER_SPEED * dt;
            if let Some(facing) = Facing::from_velocity(step) {
                self.anim.set_facing(facing);
            }
            self.player = (self.player + step).clamped_into(self.bounds, WALL_MARGIN);
        }
        self.anim.advance(dt, moving);

        let roam = self.bounds.inset(WALL_MARGIN);
        for pursuer in &mut self.pursuers {
            pursuer.step(dt, Some(self.player), roam, &PURSUER_TUNING, &mut self.rng);
        }

        let player = self.player;
        let hit = self
            .pursuers
            .iter()
            .any(|p| circles_touch(p.pos, PURSUER_RADIUS, player, PLAYER_RADIUS, 0.0));
        if hit {
            self.hp -= DAMAGE_PER_SEC * dt;
        }

        let reach = DRINK_RADIUS + PLAYER_RADIUS;
        let before = self.drinks.len();
        self.drinks.retain(|drink| drink.distance(player) >= reach);
        let picked = before - self.drinks.len();
        if picked > 0 {
            self.hp += HEAL_PER_DRINK * picked as f32;
        }

        self.hp = self.hp.clamp(0.0, HP_MAX);
        if self.hp <= 0.0 {
            return self.lose(ctx);
        }
        if self.exit.contains(self.player) {
            return self.win(ctx);
        }
        SceneCommand::None
    }

    fn draw(&self, frame: &mut Frame, ctx: &mut Context) {
        match ctx.resources.image(BG_IMAGE) {
            Some(bg) => frame.blit_rgba(0, 0, bg.width, bg.height, &bg.rgba, 255),
            None => frame.clear(BG_COLOR),
        }

        frame.fill_rect_f(self.exit, EXIT_COLOR);
        for drink in &self.drinks {
            frame.fill_circle(
                drink.x.round() as i32,
                drink.y.round() as i32,
                DRINK_RADIUS as i32,
                DRINK_COLOR,
            );
        }
        for pursuer in &self.pursuers {
            frame.fill_circle(
                pursuer.pos.x.round() as i32,
                pursuer.pos.y.round() as i32,
                PURSUER_RADIUS as i32,
                PURSUER_COLOR,
            );
        }
        self.anim.draw(frame, &mut ctx.resources, self.player);

        // HP bar.
        frame.fill_rect(30, 20, 300, 16, [60, 60, 60, 255]);
        let filled = (300.0 * (self.hp / HP_MAX)) as i32;
        frame.fill_rect(30, 20, filled, 16, [120, 220, 120, 255]);

        let font = ctx.resources.font("better-vcr.ttf", 14);
        font.draw(
            frame,
            30,
            frame.height() as i32 - 28,
            "WASD to move, dodge the crowd, grab drinks",
            HUD_TEXT,
        );
    }

    fn outcome(&self) -> Outcome {
        self.outcome.get()
    }
}
