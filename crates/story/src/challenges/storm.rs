//! Lane survival: telegraphed rain strikes hammer the columns while the
//! player times an umbrella with a cooldown. Outlast the storm.

use kernel::{
    Challenge, ChallengeId, Conclusion, Context, Curve, Frame, HazardPhase, InputEvent, Key,
    LaneSpawner, LaneTuning, Outcome, OutcomeCell, Rect, SceneCommand, SceneId, ToastSpec,
    TransitionRequest,
};
use rand::SeedableRng;
use rand_pcg::Pcg32;

const HP_MAX: i32 = 100;
const DAMAGE_PER_HIT: i32 = 30;
const SURVIVE_SECS: f32 = 25.0;

const LANES: usize = 6;
const LANE_MARGIN_X: f32 = 28.0;
const GROUND_HEIGHT: f32 = 110.0;

const TUNING: LaneTuning = LaneTuning {
    lanes: LANES,
    telegraph_secs: 0.55,
    splash_secs: 0.22,
    fall_speed: Curve::new(720.0, 220.0),
    wave_interval: Curve::new(1.15, -0.25),
    min_wave_interval: 0.42,
    wave_sizes: &[1, 2, 2, 3],
};

const UMBRELLA_ACTIVE_SECS: f32 = 0.95;
const UMBRELLA_COOLDOWN_SECS: f32 = 1.10;
const UMBRELLA_OPEN_SECS: f32 = 0.12;
const UMBRELLA_CLOSE_SECS: f32 = 0.10;

const SHAKE_SECS: f32 = 0.18;
const SHAKE_AMPLITUDE: f32 = 6.0;
const FLASH_HZ: f32 = 9.0;

const ACHIEVEMENT: &str = "storm_rider";
const END_SCRIPT: &str = "storm_end.json";
const RETRY_SCRIPT: &str = "storm_retry.json";

const SKY_COLOR: [u8; 4] = [22, 24, 36, 255];
const GROUND_COLOR: [u8; 4] = [26, 32, 32, 255];
const DIVIDER_COLOR: [u8; 4] = [30, 36, 52, 255];
const BEAM_CORE_COLOR: [u8; 4] = [130, 180, 255, 255];
const BEAM_EDGE_COLOR: [u8; 4] = [100, 150, 220, 255];
const SPLASH_COLOR: [u8; 4] = [160, 200, 255, 255];
const PLAYER_COLOR: [u8; 4] = [215, 215, 232, 255];
const UMBRELLA_COLOR: [u8; 4] = [120, 200, 160, 255];
const HUD_TEXT: [u8; 4] = [220, 220, 230, 255];

#[derive(Debug)]
pub struct Storm {
    size: (u32, u32),
    ground_y: f32,
    lane_w: f32,
    lane_x0: f32,
    player: Rect,
    hp: i32,
    umbrella_time: f32,
    umbrella_cooldown: f32,
    /// Open progress in 0..=1; full cover only when fully open.
    umbrella_open: f32,
    umbrella_closing: bool,
    spawner: LaneSpawner,
    shake_left: f32,
    outcome: OutcomeCell,
    rng: Pcg32,
}

impl Storm {
    pub fn new(size: (u32, u32), seed: u64) -> Self {
        let (w, h) = (size.0 as f32, size.1 as f32);
        let ground_y = h - GROUND_HEIGHT;
        let inner_w = w - LANE_MARGIN_X * 2.0;
        let lane_w = (inner_w / LANES as f32).floor();
        let lane_x0 = ((w - lane_w * LANES as f32) / 2.0).floor();
        Self {
            size,
            ground_y,
            lane_w,
            lane_x0,
            player: Rect::new(w / 2.0 - 20.0, ground_y - 42.0, 40.0, 40.0),
            hp: HP_MAX,
            umbrella_time: 0.0,
            umbrella_cooldown: 0.0,
            umbrella_open: 0.0,
            umbrella_closing: false,
            spawner: LaneSpawner::new(),
            shake_left: 0.0,
            outcome: OutcomeCell::new(),
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    fn try_open_umbrella(&mut self) {
        if self.umbrella_time <= 0.0 && self.umbrella_cooldown <= 0.0 {
            self.umbrella_time = UMBRELLA_ACTIVE_SECS;
            self.umbrella_closing = false;
            self.umbrella_open = f32::EPSILON;
        }
    }

    fn step_umbrella(&mut self, dt: f32) {
        if self.umbrella_time > 0.0 {
            if self.umbrella_open < 1.0 && !self.umbrella_closing {
                self.umbrella_open = (self.umbrella_open + dt / UMBRELLA_OPEN_SECS).min(1.0);
            }
            self.umbrella_time = (self.umbrella_time - dt).max(0.0);
            if self.umbrella_time == 0.0 {
                self.umbrella_closing = true;
            }
        } else if self.umbrella_closing {
            self.umbrella_open = (self.umbrella_open - dt / UMBRELLA_CLOSE_SECS).max(0.0);
            if self.umbrella_open == 0.0 {
                self.umbrella_closing = false;
                self.umbrella_cooldown = UMBRELLA_COOLDOWN_SECS;
            }
        } else if self.umbrella_cooldown > 0.0 {
            self.umbrella_cooldown = (self.umbrella_cooldown - dt).max(0.0);
        }
    }

    fn shielded(&self) -> bool {
        self.umbrella_open >= 0.999 && self.umbrella_time > 0.0
    }

    fn lane_hit_rect(&self, lane: usize) -> Rect {
        let x = self.lane_x0 + lane as f32 * self.lane_w;
        Rect::new(x, self.ground_y - 6.0, self.lane_w, 12.0)
    }

    /// Applies the strikes that reached the ground this frame.
    fn resolve_strikes(&mut self, lanes: &[usize], ctx: &mut Context) -> SceneCommand {
        for lane in lanes {
            let hit = self.lane_hit_rect(*lane);
            if hit.overlaps(&self.player) && !self.shielded() {
                self.hp = (self.hp - DAMAGE_PER_HIT).max(0);
                self.shake_left = SHAKE_SECS;
                if self.hp <= 0 {
                    return self.outcome.conclude(
                        ctx,
                        Conclusion::lost(TransitionRequest::through_script(
                            RETRY_SCRIPT,
                            SceneId::Challenge(ChallengeId::Storm),
                        )),
                    );
                }
            }
        }
        SceneCommand::None
    }

    fn win(&mut self, ctx: &mut Context) -> SceneCommand {
        self.outcome.conclude(
            ctx,
            Conclusion::won(TransitionRequest::through_script(
                END_SCRIPT,
                SceneId::Epilogue,
            ))
            .with_achievement(ACHIEVEMENT)
            .with_toast(
                ToastSpec::new("Achievement: Storm Rider")
                    .with_icon("trophy.png")
                    .with_sound("chime.wav"),
            ),
        )
    }
}

impl Challenge for Storm {
    fn handle_event(&mut self, event: &InputEvent, _ctx: &mut Context) {
        if let InputEvent::KeyDown(Key::Space) = event {
            if self.outcome.is_ongoing() {
                self.try_open_umbrella();
            }
        }
    }

    fn update(&mut self, dt: f32, ctx: &mut Context) -> SceneCommand {
        if !self.outcome.is_ongoing() {
            return SceneCommand::None;
        }

        self.step_umbrella(dt);

        let landed = self
            .spawner
            .step(dt, self.ground_y, &TUNING, &mut self.rng);
        let command = self.resolve_strikes(&landed, ctx);
        if command != SceneCommand::None {
            return command;
        }

        if self.shake_left > 0.0 {
            self.shake_left = (self.shake_left - dt).max(0.0);
        }

        if self.spawner.elapsed() >= SURVIVE_SECS {
            return self.win(ctx);
        }
        SceneCommand::None
    }

    fn draw(&self, frame: &mut Frame, ctx: &mut Context) {
        let (w, h) = (self.size.0 as f32, self.size.1 as f32);
        frame.clear(SKY_COLOR);
        frame.fill_rect(
            0,
            self.ground_y as i32,
            w as i32,
            (h - self.ground_y) as i32,
            GROUND_COLOR,
        );

        for lane in 1..LANES {
            let x = (self.lane_x0 + lane as f32 * self.lane_w) as i32;
            frame.vline(x, 0, self.ground_y as i32, DIVIDER_COLOR);
        }

        for hazard in self.spawner.hazards() {
            let x = self.lane_x0 + hazard.lane as f32 * self.lane_w;
            match hazard.phase {
                HazardPhase::Telegraph => {
                    let blink = 0.5
                        + 0.5
                            * (self.spawner.elapsed() * std::f32::consts::TAU * FLASH_HZ).sin();
                    let color = [
                        120 + (60.0 * blink) as u8,
                        170 + (50.0 * blink) as u8,
                        255,
                        255,
                    ];
                    frame.fill_rect(
                        (x + 6.0) as i32,
                        8,
                        (self.lane_w - 12.0) as i32,
                        10,
                        color,
                    );
                }
                HazardPhase::Falling => {
                    let bottom = hazard.travel.min(self.ground_y);
                    let cx = (x + self.lane_w / 2.0) as i32;
                    frame.fill_rect(cx - 3, 0, 6, bottom as i32, BEAM_CORE_COLOR);
                    frame.fill_rect(cx - 5, 0, 2, bottom as i32, BEAM_EDGE_COLOR);
                    frame.fill_rect(cx + 3, 0, 2, bottom as i32, BEAM_EDGE_COLOR);
                }
                HazardPhase::Splash => {
                    frame.hline(
                        (x + 10.0) as i32,
                        (x + self.lane_w - 10.0) as i32,
                        self.ground_y as i32,
                        SPLASH_COLOR,
                    );
                }
            }
        }

        frame.fill_rect_f(self.player, PLAYER_COLOR);

        // Umbrella dome: a circle with its lower half cut away.
        if self.umbrella_open > 0.0 {
            let cx = self.player.center().x as i32;
            let cy = (self.player.top() + 6.0) as i32;
            let radius = (42.0 * self.umbrella_open) as i32;
            frame.fill_circle(cx, cy, radius, UMBRELLA_COLOR);
            frame.fill_rect(cx - radius, cy, radius * 2 + 1, radius + 1, SKY_COLOR);
        }

        // HP bar and umbrella gauge.
        frame.fill_rect(20, 18, 300, 16, [50, 58, 66, 255]);
        let hp_w = (300.0 * self.hp as f32 / HP_MAX as f32) as i32;
        frame.fill_rect(20, 18, hp_w, 16, [120, 220, 140, 255]);

        frame.fill_rect(20, 40, 160, 8, [46, 50, 56, 255]);
        if self.umbrella_time > 0.0 {
            let k = self.umbrella_time / UMBRELLA_ACTIVE_SECS;
            frame.fill_rect(20, 40, (160.0 * k) as i32, 8, [140, 220, 200, 255]);
        } else if self.umbrella_cooldown > 0.0 {
            let k = 1.0 - self.umbrella_cooldown / UMBRELLA_COOLDOWN_SECS;
            frame.fill_rect(20, 40, (160.0 * k) as i32, 8, [90, 120, 110, 255]);
        }

        let remaining = (SURVIVE_SECS - self.spawner.elapsed()).max(0.0);
        let font = ctx.resources.font("better-vcr.ttf", 14);
        font.draw(
            frame,
            20,
            56,
            &format!("Hold out: {remaining:.1}s"),
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

    const DT: f32 = 1.0 / 60.0;

    fn storm() -> Storm {
        Storm::new((960, 540), 13)
    }

    fn player_lane(storm: &Storm) -> usize {
        let center = storm.player.center().x;
        ((center - storm.lane_x0) / storm.lane_w) as usize
    }

    #[test]
    fn four_unshielded_hits_lose_before_the_survival_timer() {
        let (_dir, mut ctx) = test_context();
        let mut storm = storm();
        let lane = player_lane(&storm);

        for expected_hp in [70, 40, 10] {
            let command = storm.resolve_strikes(&[lane], &mut ctx);
            assert_eq!(command, SceneCommand::None);
            assert_eq!(storm.hp, expected_hp);
            assert_eq!(storm.outcome(), Outcome::Ongoing);
        }

        let command = storm.resolve_strikes(&[lane], &mut ctx);
        match command {
            SceneCommand::Transition(request) => {
                assert_eq!(request.script.as_deref(), Some(RETRY_SCRIPT));
                assert_eq!(request.destination, SceneId::Challenge(ChallengeId::Storm));
            }
            other => panic!("expected transition, got {other:?}"),
        }
        assert_eq!(storm.hp, 0);
        assert_eq!(storm.outcome(), Outcome::Lost);
        assert!(storm.spawner.elapsed() < SURVIVE_SECS);

        // Terminal: further updates change nothing and issue nothing.
        assert_eq!(storm.update(DT, &mut ctx), SceneCommand::None);
        assert_eq!(storm.hp, 0);
    }

    #[test]
    fn strikes_in_other_lanes_miss() {
        let (_dir, mut ctx) = test_context();
        let mut storm = storm();
        let lane = player_lane(&storm);
        let other = (lane + 2) % LANES;
        storm.resolve_strikes(&[other], &mut ctx);
        assert_eq!(storm.hp, HP_MAX);
    }

    #[test]
    fn a_fully_open_umbrella_blocks_the_hit() {
        let (_dir, mut ctx) = test_context();
        let mut storm = storm();
        storm.umbrella_open = 1.0;
        storm.umbrella_time = 0.5;
        let lane = player_lane(&storm);
        storm.resolve_strikes(&[lane], &mut ctx);
        assert_eq!(storm.hp, HP_MAX);
    }

    #[test]
    fn a_half_open_umbrella_does_not_cover() {
        let (_dir, mut ctx) = test_context();
        let mut storm = storm();
        storm.umbrella_open = 0.5;
        storm.umbrella_time = 0.5;
        let lane = player_lane(&storm);
        storm.resolve_strikes(&[lane], &mut ctx);
        assert_eq!(storm.hp, HP_MAX - DAMAGE_PER_HIT);
    }

    #[test]
    fn umbrella_cycle_ends_in_cooldown_and_blocks_reopen() {
        let (_dir, mut ctx) = test_context();
        let mut storm = storm();
        storm.handle_event(&InputEvent::KeyDown(Key::Space), &mut ctx);
        assert!(storm.umbrella_time > 0.0);

        // Run through open, active and close phases.
        let mut guard = 0;
        while (storm.umbrella_time > 0.0 || storm.umbrella_closing) && guard < 600 {
            storm.step_umbrella(DT);
            guard += 1;
        }
        assert!(storm.umbrella_cooldown > 0.0);

        storm.try_open_umbrella();
        assert_eq!(storm.umbrella_time, 0.0);

        // After the cooldown drains the umbrella arms again.
        for _ in 0..600 {
            storm.step_umbrella(DT);
        }
        storm.try_open_umbrella();
        assert!(storm.umbrella_time > 0.0);
    }

    #[test]
    fn surviving_the_storm_wins_exactly_once() {
        let (_dir, mut ctx) = test_context();
        let mut storm = storm();
        // One long tick: the only wave spawned is still telegraphed, so
        // nothing can have landed when the timer expires.
        let command = storm.update(SURVIVE_SECS + 1.0, &mut ctx);
        match command {
            SceneCommand::Transition(request) => {
                assert_eq!(request.destination, SceneId::Epilogue);
                assert_eq!(request.script.as_deref(), Some(END_SCRIPT));
            }
            other => panic!("expected transition, got {other:?}"),
        }
        assert_eq!(storm.outcome(), Outcome::Won);
        assert_eq!(storm.hp, HP_MAX);
        assert!(ctx.progress.has(ACHIEVEMENT));
        assert_eq!(ctx.toasts.len(), 1);
        assert_eq!(storm.update(DT, &mut ctx), SceneCommand::None);
    }

    #[test]
    fn difficulty_interval_floors_deep_into_the_storm() {
        assert_eq!(TUNING.wave_interval.at_floored(600.0, TUNING.min_wave_interval), 0.42);
        assert!(TUNING.wave_interval.at_floored(0.0, TUNING.min_wave_interval) > 1.0);
    }
}
