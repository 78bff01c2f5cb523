//! Plain-text passability grids for grid-based levels.
//!
//! Levels are rows of characters: `#` wall, `~` slow ground, `S` player
//! start, `E` exit, anything else open floor. Short rows are padded with
//! walls so the grid is always rectangular, and any read outside the grid
//! is a wall.

use thiserror::Error;

use super::Vec2;

pub const TILE_SIZE: f32 = 32.0;

const SLOW_SPEED_FACTOR: f32 = 0.65;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tile {
    Wall,
    Floor,
    Slow,
    Start,
    Exit,
}

impl Tile {
    fn from_char(ch: char) -> Tile {
        match ch {
            '#' => Tile::Wall,
            '~' => Tile::Slow,
            'S' => Tile::Start,
            'E' => Tile::Exit,
            _ => Tile::Floor,
        }
    }

    pub fn passable(self) -> bool {
        !matches!(self, Tile::Wall)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LevelError {
    #[error("level data contains no rows")]
    Empty,
    #[error("level data has no start tile")]
    MissingStart,
    #[error("level data has no exit tile")]
    MissingExit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PassGrid {
    width: usize,
    height: usize,
    tiles: Vec<Tile>,
}

impl PassGrid {
    pub fn parse(text: &str) -> Result<Self, LevelError> {
        let rows: Vec<&str> = text
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.trim().is_empty())
            .collect();
        if rows.is_empty() {
            return Err(LevelError::Empty);
        }

        let width = rows.iter().map(|row| row.chars().count()).max().unwrap_or(0);
        let height = rows.len();
        let mut tiles = Vec::with_capacity(width * height);
        for row in &rows {
            let mut count = 0;
            for ch in row.chars() {
                tiles.push(Tile::from_char(ch));
                count += 1;
            }
            // Ragged rows read as wall past their last character.
            for _ in count..width {
                tiles.push(Tile::Wall);
            }
        }

        let grid = Self {
            width,
            height,
            tiles,
        };
        if grid.find(Tile::Start).is_none() {
            return Err(LevelError::MissingStart);
        }
        if grid.find(Tile::Exit).is_none() {
            return Err(LevelError::MissingExit);
        }
        Ok(grid)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn tile(&self, col: usize, row: usize) -> Tile {
        if col >= self.width || row >= self.height {
            return Tile::Wall;
        }
        self.tiles[row * self.width + col]
    }

    /// Tile under a world-space point. Anything outside the grid is a wall.
    pub fn tile_at(&self, x: f32, y: f32) -> Tile {
        if x < 0.0 || y < 0.0 {
            return Tile::Wall;
        }
        self.tile((x / TILE_SIZE) as usize, (y / TILE_SIZE) as usize)
    }

    pub fn passable(&self, x: f32, y: f32) -> bool {
        self.tile_at(x, y).passable()
    }

    /// Ground speed multiplier at a world-space point.
    pub fn speed_factor(&self, x: f32, y: f32) -> f32 {
        match self.tile_at(x, y) {
            Tile::Slow => SLOW_SPEED_FACTOR,
            _ => 1.0,
        }
    }

    /// Center of the first tile of the given kind, scanning row-major.
    pub fn find(&self, tile: Tile) -> Option<Vec2> {
        for row in 0..self.height {
            for col in 0..self.width {
                if self.tile(col, row) == tile {
                    return Some(Vec2::new(
                        col as f32 * TILE_SIZE + TILE_SIZE / 2.0,
                        row as f32 * TILE_SIZE + TILE_SIZE / 2.0,
                    ));
                }
            }
        }
        None
    }

    /// Resolves a displacement one axis at a time so an actor blocked on one
    /// axis still slides freely along the other.
    pub fn slide(&self, pos: Vec2, delta: Vec2) -> Vec2 {
        let mut out = pos;
        let next_x = out.x + delta.x;
        if self.passable(next_x, out.y) {
            out.x = next_x;
        }
        let next_y = out.y + delta.y;
        if self.passable(out.x, next_y) {
            out.y = next_y;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEVEL: &str = "#####\n\
                         #S..#\n\
                         #.#.#\n\
                         #~.E#\n\
                         #####";

    fn grid() -> PassGrid {
        PassGrid::parse(LEVEL).expect("level parses")
    }

    #[test]
    fn parse_rejects_degenerate_levels() {
        assert_eq!(PassGrid::parse("  \n  "), Err(LevelError::Empty));
        assert_eq!(PassGrid::parse("###\n#E#\n###"), Err(LevelError::MissingStart));
        assert_eq!(PassGrid::parse("###\n#S#\n###"), Err(LevelError::MissingExit));
    }

    #[test]
    fn short_rows_pad_with_walls() {
        let grid = PassGrid::parse("#####\n#S.E#\n###").expect("parses");
        assert_eq!(grid.width(), 5);
        assert_eq!(grid.tile(3, 2), Tile::Wall);
        assert_eq!(grid.tile(4, 2), Tile::Wall);
    }

    #[test]
    fn out_of_bounds_reads_as_wall() {
        let grid = grid();
        assert!(!grid.passable(-1.0, 40.0));
        assert!(!grid.passable(40.0, -1.0));
        assert!(!grid.passable(1000.0, 40.0));
    }

    #[test]
    fn start_and_exit_are_tile_centers() {
        let grid = grid();
        assert_eq!(grid.find(Tile::Start), Some(Vec2::new(48.0, 48.0)));
        assert_eq!(grid.find(Tile::Exit), Some(Vec2::new(112.0, 112.0)));
    }

    #[test]
    fn slow_tiles_reduce_speed() {
        let grid = grid();
        assert_eq!(grid.speed_factor(48.0, 112.0), 0.65);
        assert_eq!(grid.speed_factor(48.0, 48.0), 1.0);
    }

    #[test]
    fn slide_resolves_each_axis_independently() {
        let grid = grid();
        // Start tile center, wall directly below-right at (2,2).
        let pos = Vec2::new(48.0, 80.0);
        // Pushing into the wall on x while also moving down: x stays, y moves.
        let moved = grid.slide(pos, Vec2::new(32.0, 20.0));
        assert_eq!(moved.x, pos.x);
        assert_eq!(moved.y, pos.y + 20.0);
    }

    #[test]
    fn slide_moves_freely_in_open_space() {
        let grid = grid();
        let pos = Vec2::new(48.0, 48.0);
        let moved = grid.slide(pos, Vec2::new(10.0, 8.0));
        assert_eq!(moved, Vec2::new(58.0, 56.0));
    }
}
