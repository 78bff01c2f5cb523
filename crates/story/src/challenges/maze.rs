//! Grid walk: find the exit. Movement resolves one axis at a time against
//! the passability grid, so hugging a wall never stops the free axis.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use kernel::sim::grid::TILE_SIZE;
use kernel::{
    Challenge, ChallengeId, Conclusion, Context, Frame, InputEvent, LevelError, Outcome,
    OutcomeCell, PassGrid, SceneCommand, SceneId, Tile, ToastSpec, TransitionRequest, Vec2,
};
use rand::seq::IndexedRandom;
use rand::Rng;
use thiserror::Error;

const WALK_SPEED: f32 = 150.0;
const EXIT_RADIUS: f32 = 14.0;

const ACHIEVEMENT: &str = "wayfinder";
const END_SCRIPT: &str = "maze_end.json";

const BG_COLOR: [u8; 4] = [10, 10, 14, 255];
const WALL_COLOR: [u8; 4] = [40, 40, 60, 255];
const SLOW_COLOR: [u8; 4] = [30, 70, 70, 255];
const PLAYER_COLOR: [u8; 4] = [230, 230, 255, 255];
const EXIT_COLOR: [u8; 4] = [120, 200, 160, 255];

#[derive(Debug, Error)]
pub enum MazeLoadError {
    #[error("failed to list maze levels in {path}: {source}")]
    ListLevels {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("no maze levels found in {path}")]
    NoLevels { path: PathBuf },
    #[error("failed to read maze level {path}: {source}")]
    ReadLevel {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed maze level {path}: {source}")]
    Level {
        path: PathBuf,
        #[source]
        source: LevelError,
    },
}

#[derive(Debug)]
pub struct Maze {
    grid: PassGrid,
    player: Vec2,
    exit: Vec2,
    outcome: OutcomeCell,
}

impl Maze {
    pub fn from_grid(grid: PassGrid) -> Self {
        // PassGrid::parse guarantees both tiles exist.
        let player = grid.find(Tile::Start).unwrap_or(Vec2::new(
            TILE_SIZE / 2.0,
            TILE_SIZE / 2.0,
        ));
        let exit = grid.find(Tile::Exit).unwrap_or(player);
        Self {
            grid,
            player,
            exit,
            outcome: OutcomeCell::new(),
        }
    }

    /// Picks a random `maze*.txt` level from `<data_dir>/maze/`.
    pub fn load<R: Rng>(data_dir: &Path, rng: &mut R) -> Result<Self, MazeLoadError> {
        let levels_dir = data_dir.join("maze");
        let mut candidates = Vec::new();
        let entries = fs::read_dir(&levels_dir).map_err(|source| MazeLoadError::ListLevels {
            path: levels_dir.clone(),
            source,
        })?;
        for entry in entries {
            let entry = entry.map_err(|source| MazeLoadError::ListLevels {
                path: levels_dir.clone(),
                source,
            })?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with("maze") && name.ends_with(".txt") {
                candidates.push(entry.path());
            }
        }
        candidates.sort();
        let chosen = candidates
            .choose(rng)
            .ok_or_else(|| MazeLoadError::NoLevels {
                path: levels_dir.clone(),
            })?;

        let text = fs::read_to_string(chosen).map_err(|source| MazeLoadError::ReadLevel {
            path: chosen.clone(),
            source,
        })?;
        let grid = PassGrid::parse(&text).map_err(|source| MazeLoadError::Level {
            path: chosen.clone(),
            source,
        })?;
        Ok(Self::from_grid(grid))
    }
}

impl Challenge for Maze {
    fn handle_event(&mut self, _event: &InputEvent, _ctx: &mut Context) {}

    fn update(&mut self, dt: f32, ctx: &mut Context) -> SceneCommand {
        if !self.outcome.is_ongoing() {
            return SceneCommand::None;
        }

        let intent = ctx.input.move_axes();
        if intent.length_squared() > 0.0 {
            let speed = WALK_SPEED * self.grid.speed_factor(self.player.x, self.player.y);
            let step = intent.normalized_or_fallback() * speed * dt;
            self.player = self.grid.slide(self.player, step);
        }

        if self.player.distance(self.exit) < EXIT_RADIUS {
            return self.outcome.conclude(
                ctx,
                Conclusion::won(TransitionRequest::through_script(
                    END_SCRIPT,
                    SceneId::Challenge(ChallengeId::Invaders),
                ))
                .with_achievement(ACHIEVEMENT)
                .with_toast(
                    ToastSpec::new("Achievement: Wayfinder")
                        .with_icon("trophy.png")
                        .with_sound("chime.wav"),
                ),
            );
        }
        SceneCommand::None
    }

    fn draw(&self, frame: &mut Frame, _ctx: &mut Context) {
        frame.clear(BG_COLOR);
        for row in 0..self.grid.height() {
            for col in 0..self.grid.width() {
                let color = match self.grid.tile(col, row) {
                    Tile::Wall => WALL_COLOR,
                    Tile::Slow => SLOW_COLOR,
                    _ => continue,
                };
                frame.fill_rect(
                    (col as f32 * TILE_SIZE) as i32,
                    (row as f32 * TILE_SIZE) as i32,
                    TILE_SIZE as i32,
                    TILE_SIZE as i32,
                    color,
                );
            }
        }
        frame.fill_circle(
            self.exit.x.round() as i32,
            self.exit.y.round() as i32,
            10,
            EXIT_COLOR,
        );
        frame.fill_circle(
            self.player.x.round() as i32,
            self.player.y.round() as i32,
            10,
            PLAYER_COLOR,
        );
    }

    fn outcome(&self) -> Outcome {
        self.outcome.get()
    }
}
