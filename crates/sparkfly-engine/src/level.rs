//! Procedural level generation.
//!
//! A level starts life as a [`TileGrid`]: a rectangle of [`Tile`]s with a
//! ring of walls, scattered wall stamps, sparks and charge fields, and one
//! player start cell. [`build_level`] turns the grid into entities and then
//! discards it; only the entities persist.
//!
//! Generation is a per-cell decision tree driven by a caller-supplied RNG, so
//! the same seed always yields the same grid:
//!
//! ```
//! use sparkfly_engine::level::TileGrid;
//!
//! let a = TileGrid::generate_seeded(30, 30, 42).unwrap();
//! let b = TileGrid::generate_seeded(30, 30, 42).unwrap();
//! assert_eq!(a.digest(), b.digest());
//! ```

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;
use serde::{Deserialize, Serialize};
use tracing::debug;

use sparkfly_ecs::entity::Entity;
use sparkfly_ecs::geometry::Vec2;
use sparkfly_ecs::world::World;

use crate::prefab;
use crate::EngineError;

/// Chance that an interior cell anchors a wall stamp.
const WALL_CHANCE: f64 = 0.05;
/// Chance of a spark, rolled only when the wall roll failed.
const SPARK_CHANCE: f64 = 0.025;
/// Chance of a charge field, rolled only when both earlier rolls failed.
const CHARGE_CHANCE: f64 = 0.05;
/// Longest side of a wall stamp.
const MAX_STAMP: usize = 7;

// ---------------------------------------------------------------------------
// Tile
// ---------------------------------------------------------------------------

/// What occupies one grid cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tile {
    #[default]
    Empty,
    Wall,
    Spark,
    Minus,
    Plus,
    PlayerStart,
}

impl Tile {
    /// One-character form used by [`TileGrid::from_rows`] and `Display`.
    pub fn symbol(self) -> char {
        match self {
            Tile::Empty => '.',
            Tile::Wall => '#',
            Tile::Spark => '*',
            Tile::Minus => '-',
            Tile::Plus => '+',
            Tile::PlayerStart => '@',
        }
    }

    pub fn from_symbol(symbol: char) -> Option<Self> {
        Some(match symbol {
            '.' => Tile::Empty,
            '#' => Tile::Wall,
            '*' => Tile::Spark,
            '-' => Tile::Minus,
            '+' => Tile::Plus,
            '@' => Tile::PlayerStart,
            _ => return None,
        })
    }
}

// ---------------------------------------------------------------------------
// TileGrid
// ---------------------------------------------------------------------------

/// A row-major grid of tiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileGrid {
    width: usize,
    height: usize,
    tiles: Vec<Tile>,
}

impl TileGrid {
    /// An all-empty grid.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            tiles: vec![Tile::Empty; width * height],
        }
    }

    /// Generate a level layout.
    ///
    /// The RNG is consumed in a fixed order: the start column, the start
    /// row, then for each interior cell in row-major order one uniform draw
    /// per probability check until one succeeds (plus the stamp extents or
    /// the minus/plus coin flip). Border cells are walls and draw nothing.
    /// A stamp covers cells later in scan order, which are rolled again
    /// when the scan reaches them; the start cell is written last.
    pub fn generate<R: Rng + ?Sized>(
        width: usize,
        height: usize,
        rng: &mut R,
    ) -> Result<Self, EngineError> {
        if width < 3 || height < 3 {
            return Err(EngineError::GridTooSmall { width, height });
        }
        let mut grid = Self::new(width, height);
        let start_col = rng.gen_range(1..=width - 2);
        let start_row = rng.gen_range(1..=height - 2);

        for row in 0..height {
            for col in 0..width {
                if grid.is_border(col, row) {
                    grid.set(col, row, Tile::Wall);
                } else if rng.gen::<f64>() < WALL_CHANCE {
                    let stamp_w = rng.gen_range(1..=MAX_STAMP);
                    let stamp_h = if stamp_w == 1 {
                        rng.gen_range(2..=MAX_STAMP)
                    } else {
                        1
                    };
                    grid.stamp(col, row, stamp_w, stamp_h);
                } else if rng.gen::<f64>() < SPARK_CHANCE {
                    grid.set(col, row, Tile::Spark);
                } else if rng.gen::<f64>() < CHARGE_CHANCE {
                    let charge = if rng.gen::<f64>() < 0.5 {
                        Tile::Minus
                    } else {
                        Tile::Plus
                    };
                    grid.set(col, row, charge);
                } else {
                    grid.set(col, row, Tile::Empty);
                }
            }
        }
        grid.set(start_col, start_row, Tile::PlayerStart);
        Ok(grid)
    }

    /// [`generate`](Self::generate) with a PCG generator seeded from `seed`.
    pub fn generate_seeded(width: usize, height: usize, seed: u64) -> Result<Self, EngineError> {
        let mut rng = Pcg64Mcg::seed_from_u64(seed);
        Self::generate(width, height, &mut rng)
    }

    /// Parse a hand-written grid, one string per row, using the
    /// [`Tile::symbol`] characters.
    pub fn from_rows(rows: &[&str]) -> Result<Self, EngineError> {
        let height = rows.len();
        let width = rows.first().map_or(0, |r| r.chars().count());
        if width == 0 {
            return Err(EngineError::InvalidGrid("grid has no cells".to_owned()));
        }
        let mut tiles = Vec::with_capacity(width * height);
        for (row, line) in rows.iter().enumerate() {
            if line.chars().count() != width {
                return Err(EngineError::InvalidGrid(format!(
                    "row {row} has {} cells, expected {width}",
                    line.chars().count()
                )));
            }
            for symbol in line.chars() {
                let tile = Tile::from_symbol(symbol).ok_or_else(|| {
                    EngineError::InvalidGrid(format!("unknown tile symbol {symbol:?} in row {row}"))
                })?;
                tiles.push(tile);
            }
        }
        Ok(Self {
            width,
            height,
            tiles,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// The tile at `(col, row)`, or `None` outside the grid.
    pub fn get(&self, col: usize, row: usize) -> Option<Tile> {
        (col < self.width && row < self.height).then(|| self.tiles[row * self.width + col])
    }

    /// Overwrite one cell. Out-of-range writes are ignored.
    pub fn set(&mut self, col: usize, row: usize, tile: Tile) {
        if col < self.width && row < self.height {
            self.tiles[row * self.width + col] = tile;
        }
    }

    /// Cells in row-major order with their coordinates.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, Tile)> + '_ {
        self.tiles
            .iter()
            .enumerate()
            .map(|(i, t)| (i % self.width, i / self.width, *t))
    }

    /// Number of cells holding `tile`.
    pub fn count(&self, tile: Tile) -> usize {
        self.tiles.iter().filter(|t| **t == tile).count()
    }

    /// First player start cell in scan order.
    pub fn player_start(&self) -> Option<(usize, usize)> {
        self.cells()
            .find(|(_, _, t)| *t == Tile::PlayerStart)
            .map(|(c, r, _)| (c, r))
    }

    /// BLAKE3 hex digest of the dimensions and tile symbols.
    pub fn digest(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&(self.width as u64).to_le_bytes());
        hasher.update(&(self.height as u64).to_le_bytes());
        for tile in &self.tiles {
            hasher.update(&[tile.symbol() as u8]);
        }
        hasher.finalize().to_hex().to_string()
    }

    fn is_border(&self, col: usize, row: usize) -> bool {
        col == 0 || row == 0 || col == self.width - 1 || row == self.height - 1
    }

    /// Fill a `w`x`h` wall rectangle anchored at its top-left cell, clipped
    /// to the grid.
    fn stamp(&mut self, col: usize, row: usize, w: usize, h: usize) {
        for r in row..(row + h).min(self.height) {
            for c in col..(col + w).min(self.width) {
                self.set(c, r, Tile::Wall);
            }
        }
    }
}

impl std::fmt::Display for TileGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in self.tiles.chunks(self.width.max(1)) {
            let line: String = row.iter().map(|t| t.symbol()).collect();
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

/// Pixel centre of the tile at `(col, row)`.
pub fn tile_center(col: usize, row: usize, tile_size: f64) -> Vec2 {
    Vec2::new(
        col as f64 * tile_size + tile_size / 2.0,
        row as f64 * tile_size + tile_size / 2.0,
    )
}

// ---------------------------------------------------------------------------
// Level building
// ---------------------------------------------------------------------------

/// What [`build_level`] produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelSummary {
    /// Sparks the player must collect to finish the level.
    pub total_sparks: u32,
    /// Where the player starts and respawns.
    pub start: Vec2,
    /// Hazard entities spawned (sparks included).
    pub hazards: usize,
}

/// Instantiate `grid` into `world` and add `player` last.
///
/// Every non-empty tile becomes one entity at its tile centre. All of them
/// are made to ignore each other before the player is inserted, so hazards
/// react to the player only. The player is moved to the start cell, which
/// also becomes its respawn point, and its spark counter is reset.
pub fn build_level(
    world: &mut World,
    grid: &TileGrid,
    mut player: Entity,
    tile_size: f64,
) -> Result<LevelSummary, EngineError> {
    let (start_col, start_row) = grid
        .player_start()
        .ok_or_else(|| EngineError::InvalidGrid("no player start cell".to_owned()))?;

    let mut total_sparks = 0u32;
    let mut hazards = 0usize;
    for (col, row, tile) in grid.cells() {
        let at = tile_center(col, row, tile_size);
        let entity = match tile {
            Tile::Spark => {
                total_sparks += 1;
                prefab::spark(world, at)
            }
            Tile::Wall => prefab::insulator(world, at),
            Tile::Minus => prefab::minus(world, at),
            Tile::Plus => prefab::plus(world, at),
            Tile::PlayerStart | Tile::Empty => continue,
        };
        world.insert(entity)?;
        hazards += 1;
    }
    world.ignore_all_pairs();

    let start = tile_center(start_col, start_row, tile_size);
    player.set_position(start);
    player.start_position = start;
    player.stats.sparks = 0;
    world.insert(player)?;

    debug!(
        width = grid.width(),
        height = grid.height(),
        sparks = total_sparks,
        hazards,
        "level built"
    );
    Ok(LevelSummary {
        total_sparks,
        start,
        hazards,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
