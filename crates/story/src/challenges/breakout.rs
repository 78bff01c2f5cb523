//! Paddle, ball and a wall of blocks. The paddle steers the return angle by
//! where the ball lands on it.

use kernel::{
    Challenge, ChallengeId, Conclusion, Context, Frame, InputEvent, Outcome, OutcomeCell, Rect,
    SceneCommand, SceneId, ToastSpec, TransitionRequest, Vec2,
};

const PADDLE_WIDTH: f32 = 100.0;
const PADDLE_HEIGHT: f32 = 16.0;
const PADDLE_SPEED: f32 = 360.0;
const BALL_SIZE: f32 = 16.0;
const SERVE_VELOCITY: Vec2 = Vec2::new(200.0, -240.0);
const STEER_SPEED: f32 = 240.0;
const BLOCK_ROWS: usize = 5;
const BLOCK_COLS: usize = 10;
const STARTING_LIVES: u32 = 3;

const ACHIEVEMENT: &str = "demolition";
const END_SCRIPT: &str = "breakout_end.json";
const RETRY_SCRIPT: &str = "breakout_retry.json";

const BG_COLOR: [u8; 4] = [15, 10, 20, 255];
const BLOCK_COLOR: [u8; 4] = [200, 160, 100, 255];
const PADDLE_COLOR: [u8; 4] = [120, 220, 120, 255];
const BALL_COLOR: [u8; 4] = [255, 240, 150, 255];
const HUD_TEXT: [u8; 4] = [230, 230, 230, 255];

#[derive(Debug)]
pub struct Breakout {
    size: (u32, u32),
    paddle: Rect,
    ball: Rect,
    velocity: Vec2,
    blocks: Vec<Rect>,
    lives: u32,
    outcome: OutcomeCell,
}

impl Breakout {
    pub fn new(size: (u32, u32)) -> Self {
        let (w, h) = (size.0 as f32, size.1 as f32);

        let mut blocks = Vec::with_capacity(BLOCK_ROWS * BLOCK_COLS);
        let (margin_x, margin_y) = (60.0, 60.0);
        let (bw, bh) = (64.0, 24.0);
        for row in 0..BLOCK_ROWS {
            for col in 0..BLOCK_COLS {
                blocks.push(Rect::new(
                    margin_x + col as f32 * bw,
                    margin_y + row as f32 * bh,
                    bw - 4.0,
                    bh - 4.0,
                ));
            }
        }

        Self {
            size,
            paddle: Rect::new(w / 2.0 - PADDLE_WIDTH / 2.0, h - 40.0, PADDLE_WIDTH, PADDLE_HEIGHT),
            ball: Rect::new(w / 2.0 - BALL_SIZE / 2.0, h / 2.0, BALL_SIZE, BALL_SIZE),
            velocity: SERVE_VELOCITY,
            blocks,
            lives: STARTING_LIVES,
            outcome: OutcomeCell::new(),
        }
    }

    fn reset_serve(&mut self) {
        let (w, h) = (self.size.0 as f32, self.size.1 as f32);
        self.ball = Rect::new(w / 2.0 - BALL_SIZE / 2.0, h / 2.0, BALL_SIZE, BALL_SIZE);
        self.velocity = SERVE_VELOCITY;
    }
}

impl Challenge for Breakout {
    fn handle_event(&mut self, _event: &InputEvent, _ctx: &mut Context) {}

    fn update(&mut self, dt: f32, ctx: &mut Context) -> SceneCommand {
        if !self.outcome.is_ongoing() {
            return SceneCommand::None;
        }
        let (w, h) = (self.size.0 as f32, self.size.1 as f32);

        self.paddle.x += ctx.input.horizontal_axis() * PADDLE_SPEED * dt;
        self.paddle = self.paddle.clamped_into(Rect::new(0.0, 0.0, w, h));

        self.ball.x += self.velocity.x * dt;
        self.ball.y += self.velocity.y * dt;

        if self.ball.left() <= 0.0 || self.ball.right() >= w {
            self.velocity.x = -self.velocity.x;
            self.ball = self.ball.clamped_into(Rect::new(0.0, -h, w, h * 3.0));
        }
        if self.ball.top() <= 0.0 {
            self.velocity.y = self.velocity.y.abs();
        }

        if self.ball.top() >= h {
            self.lives = self.lives.saturating_sub(1);
            if self.lives == 0 {
                return self.outcome.conclude(
                    ctx,
                    Conclusion::lost(TransitionRequest::through_script(
                        RETRY_SCRIPT,
                        SceneId::Challenge(ChallengeId::Breakout),
                    )),
                );
            }
            self.reset_serve();
        }

        if self.ball.overlaps(&self.paddle) && self.velocity.y > 0.0 {
            let offset = (self.ball.center().x - self.paddle.center().x) / (self.paddle.w / 2.0);
            self.velocity = Vec2::new(offset * STEER_SPEED, -self.velocity.y.abs());
        }

        let ball = self.ball;
        if let Some(index) = self.blocks.iter().position(|block| ball.overlaps(block)) {
            self.blocks.swap_remove(index);
            self.velocity.y = -self.velocity.y;
        }

        if self.blocks.is_empty() {
            return self.outcome.conclude(
                ctx,
                Conclusion::won(TransitionRequest::through_script(
                    END_SCRIPT,
                    SceneId::Challenge(ChallengeId::Rush),
                ))
                .with_achievement(ACHIEVEMENT)
                .with_chapter(3)
                .with_toast(
                    ToastSpec::new("Achievement: Demolition")
                        .with_icon("trophy.png")
                        .with_sound("chime.wav"),
                ),
            );
        }
        SceneCommand::None
    }

    fn draw(&self, frame: &mut Frame, ctx: &mut Context) {
        frame.clear(BG_COLOR);
        for block in &self.blocks {
            frame.fill_rect_f(*block, BLOCK_COLOR);
        }
        frame.fill_rect_f(self.paddle, PADDLE_COLOR);
        frame.fill_circle(
            self.ball.center().x.round() as i32,
            self.ball.center().y.round() as i32,
            (BALL_SIZE / 2.0) as i32,
            BALL_COLOR,
        );

        let font = ctx.resources.font("better-vcr.ttf", 14);
        font.draw(frame, 16, 10, &format!("Lives: {}", self.lives), HUD_TEXT);
    }

    fn outcome(&self) -> Outcome {
        self.outcome.get()
    }
}
