//! Auto-runner: the track scrolls at an ever-increasing pace while crowd
//! streams cross it. Weave through the gaps and cover the distance.

use kernel::{
    Challenge, ChallengeId, Conclusion, Context, Curve, Frame, InputEvent, Outcome, OutcomeCell,
    Rect, SceneCommand, SceneId, ToastSpec, TransitionRequest, Vec2,
};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

const TRACK_PAD: f32 = 40.0;
const SIDE_SPEED: f32 = 280.0;
/// Forward pace accelerates with time on the track.
const RUN_SPEED: Curve = Curve::new(130.0, 60.0);
const GOAL_DISTANCE: f32 = 1800.0;

const ROW_SPACING: f32 = 58.0;
const ROWS_AHEAD: usize = 12;
const BODY_WIDTH_MIN: f32 = 36.0;
const BODY_WIDTH_MAX: f32 = 64.0;
const BODY_HEIGHT: f32 = 40.0;
const BODY_GAP_MIN: f32 = 18.0;
const BODY_GAP_MAX: f32 = 46.0;
const STREAM_SPEED_MIN: f32 = 120.0;
const STREAM_SPEED_MAX: f32 = 260.0;
const STREAM_WRAP_PAD: f32 = 120.0;
const STREAM_HEAD_START: f32 = 60.0;
const ROW_SCREEN_ANCHOR: f32 = 0.18;
/// Marginal touches this deep are forgiven.
const HIT_GRACE: f32 = 4.0;
/// Chance of a double (two-way) stream row, growing per minute on track.
const HARD_ROW_CHANCE: Curve = Curve::new(0.0, 0.25);
const HARD_ROW_CHANCE_MAX: f32 = 0.85;

const PLAYER_WIDTH: f32 = 40.0;
const PLAYER_HEIGHT: f32 = 52.0;

const ACHIEVEMENT: &str = "rush_hour";
const END_SCRIPT: &str = "rush_end.json";
const RETRY_SCRIPT: &str = "rush_retry.json";

const BG_COLOR: [u8; 4] = [18, 18, 24, 255];
const CURB_COLOR: [u8; 4] = [34, 34, 46, 255];
const STRIPE_COLOR: [u8; 4] = [22, 22, 30, 255];
const BODY_COLOR: [u8; 4] = [170, 70, 70, 255];
const PLAYER_COLOR: [u8; 4] = [220, 220, 240, 255];
const HUD_TEXT: [u8; 4] = [220, 220, 230, 255];

/// One horizontal crowd stream on a fixed track row (y in world units).
#[derive(Debug)]
struct Stream {
    row_y: f32,
    dir: f32,
    speed: f32,
    /// Body rectangles in stream-local coordinates.
    bodies: Vec<Rect>,
    span: f32,
}

#[derive(Debug)]
pub struct Rush {
    size: (u32, u32),
    player_x: f32,
    player_y: f32,
    distance: f32,
    elapsed: f32,
    next_row_y: f32,
    streams: Vec<Stream>,
    outcome: OutcomeCell,
    rng: Pcg32,
}

impl Rush {
    pub fn new(size: (u32, u32), seed: u64) -> Self {
        let (w, h) = (size.0 as f32, size.1 as f32);
        Self {
            size,
            player_x: w / 2.0,
            player_y: h - 120.0,
            distance: 0.0,
            elapsed: 0.0,
            next_row_y: -ROW_SPACING,
            streams: Vec::new(),
            outcome: OutcomeCell::new(),
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    fn track_left(&self) -> f32 {
        TRACK_PAD
    }

    fn track_right(&self) -> f32 {
        self.size.0 as f32 - TRACK_PAD
    }

    fn player_rect(&self) -> Rect {
        Rect::from_center(
            Vec2::new(self.player_x, self.player_y),
            PLAYER_WIDTH,
            PLAYER_HEIGHT,
        )
    }

    fn make_stream(&mut self, row_y: f32, dir: f32) -> Stream {
        let span = self.track_right() - self.track_left();
        let speed = self
            .rng
            .random_range(STREAM_SPEED_MIN..=STREAM_SPEED_MAX);
        let mut bodies = Vec::new();
        let mut x = 0.0;
        while x < span {
            let width = self.rng.random_range(BODY_WIDTH_MIN..=BODY_WIDTH_MAX);
            bodies.push(Rect::new(x, 0.0, width, BODY_HEIGHT));
            x += width + self.rng.random_range(BODY_GAP_MIN..=BODY_GAP_MAX);
        }
        Stream {
            row_y,
            dir,
            speed,
            bodies,
            span,
        }
    }

    fn spawn_row(&mut self, row_y: f32, hard: bool) {
        if hard {
            let forward = self.make_stream(row_y, 1.0);
            let backward = self.make_stream(row_y, -1.0);
            self.streams.push(forward);
            self.streams.push(backward);
        } else {
            let dir = if self.rng.random_range(0..2) == 0 { -1.0 } else { 1.0 };
            let stream = self.make_stream(row_y, dir);
            self.streams.push(stream);
        }
    }

    /// Keeps a pipe of rows spawned ahead of the player and drops rows that
    /// scrolled past the bottom of the screen.
    fn maintain_rows(&mut self) {
        let horizon = -(self.distance + ROW_SPACING * ROWS_AHEAD as f32);
        while self.next_row_y > horizon {
            let chance = HARD_ROW_CHANCE
                .at(self.elapsed)
                .clamp(0.0, HARD_ROW_CHANCE_MAX);
            let hard = self.rng.random_range(0.0..1.0) < chance;
            let row_y = self.next_row_y;
            self.spawn_row(row_y, hard);
            self.next_row_y -= ROW_SPACING;
        }

        let (_, h) = (self.size.0 as f32, self.size.1 as f32);
        let distance = self.distance;
        self.streams
            .retain(|stream| stream.row_y + distance < h);
    }

    fn stream_screen_y(&self, stream: &Stream) -> f32 {
        stream.row_y + self.distance + self.size.1 as f32 * ROW_SCREEN_ANCHOR
    }

    fn stream_base_x(&self, stream: &Stream) -> f32 {
        let shift = (self.elapsed * stream.speed) % (stream.span + STREAM_WRAP_PAD);
        self.track_left() - STREAM_HEAD_START + stream.dir * shift
    }

    fn body_rect(&self, stream: &Stream, body: &Rect) -> Rect {
        Rect::new(
            self.stream_base_x(stream) + body.x,
            self.stream_screen_y(stream) - BODY_HEIGHT / 2.0,
            body.w,
            body.h,
        )
    }

    fn collides(&self) -> bool {
        let player = self.player_rect();
        self.streams.iter().any(|stream| {
            stream
                .bodies
                .iter()
                .any(|body| self.body_rect(stream, body).inset(HIT_GRACE).overlaps(&player))
        })
    }
}

impl Challenge for Rush {
    fn handle_event(&mut self, _event: &InputEvent, _ctx: &mut Context) {}

    fn update(&mut self, dt: f32, ctx: &mut Context) -> SceneCommand {
        if !self.outcome.is_ongoing() {
            return SceneCommand::None;
        }

        self.player_x += ctx.input.horizontal_axis() * SIDE_SPEED * dt;
        self.player_x = self.player_x.clamp(
            self.track_left() + PLAYER_WIDTH / 2.0,
            self.track_right() - PLAYER_WIDTH / 2.0,
        );

        self.elapsed += dt;
        self.distance += RUN_SPEED.at(self.elapsed) * dt;
        self.maintain_rows();

        if self.collides() {
            return self.outcome.conclude(
                ctx,
                Conclusion::lost(TransitionRequest::through_script(
                    RETRY_SCRIPT,
                    SceneId::Challenge(ChallengeId::Rush),
                )),
            );
        }

        if self.distance >= GOAL_DISTANCE {
            return self.outcome.conclude(
                ctx,
                Conclusion::won(TransitionRequest::through_script(
                    END_SCRIPT,
                    SceneId::Challenge(ChallengeId::Storm),
                ))
                .with_achievement(ACHIEVEMENT)
                .with_chapter(4)
                .with_toast(
                    ToastSpec::new("Achievement: Rush Hour")
                        .with_icon("trophy.png")
                        .with_sound("chime.wav"),
                ),
            );
        }
        SceneCommand::None
    }

    fn draw(&self, frame: &mut Frame, ctx: &mut Context) {
        let (w, h) = (self.size.0 as f32, self.size.1 as f32);
        frame.clear(BG_COLOR);

        // Scrolling track stripes for a sense of pace.
        let scroll = (self.distance * 0.65) as i32 % 40;
        let mut y = -scroll;
        while y < h as i32 {
            frame.fill_rect(0, y, w as i32, 20, STRIPE_COLOR);
            y += 40;
        }

        frame.fill_rect(0, 0, self.track_left() as i32, h as i32, CURB_COLOR);
        frame.fill_rect(
            self.track_right() as i32,
            0,
            (w - self.track_right()) as i32,
            h as i32,
            CURB_COLOR,
        );

        for stream in &self.streams {
            for body in &stream.bodies {
                frame.fill_rect_f(self.body_rect(stream, body), BODY_COLOR);
            }
        }
        frame.fill_rect_f(self.player_rect(), PLAYER_COLOR);

        // Distance bar.
        let progress = (self.distance / GOAL_DISTANCE).clamp(0.0, 1.0);
        frame.fill_rect(20, 18, 360, 16, [50, 58, 66, 255]);
        frame.fill_rect(20, 18, (360.0 * progress) as i32, 16, [120, 220, 140, 255]);

        let font = ctx.resources.font("better-vcr.ttf", 14);
        font.draw(frame, 20, 40, "Keep running. Mind the crowd.", HUD_TEXT);
    }

    fn outcome(&self) -> Outcome {
        self.outcome.get()
    }
}
