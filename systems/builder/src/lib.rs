#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Floor orchestration: carves a connected maze, places the stairs, and
//! seeds the actors, producing a ready-to-simulate [`Level`].
//!
//! Every random decision flows through one seeded generator owned here, so
//! a fixed seed reproduces a floor exactly.

use deepdelve_core::{FloorHandoff, GenerationError, Point, Power, Rect, Stats, Tile};
use deepdelve_system_connectivity as connectivity;
use deepdelve_system_mazegen as mazegen;
use deepdelve_world::{Grid, Level};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

/// One monster is seeded for roughly this many open tiles.
const TILES_PER_MONSTER: f32 = 90.0;

/// Configuration for one floor build.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Index of the floor to build. Floors count down toward the surface.
    pub floor: i32,
    /// Index of the deepest (starting) floor; it gets plain ground at the
    /// entry instead of a downstairs tile.
    pub floor_start: i32,
    /// Number of grid columns.
    pub columns: i32,
    /// Number of grid rows.
    pub rows: i32,
    /// Kills required per player level, used to scale experience rewards.
    pub kills_per_level: i32,
}

impl Config {
    /// Creates a configuration for the provided floor and grid dimensions,
    /// with the default depth and experience tuning.
    #[must_use]
    pub const fn new(floor: i32, columns: i32, rows: i32) -> Self {
        Self {
            floor,
            floor_start: 25,
            columns,
            rows,
            kills_per_level: 10,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(25, 80, 30)
    }
}

/// Builds a fresh floor for a newly started run.
///
/// # Errors
///
/// Surfaces [`GenerationError`] when a generation invariant breaks; the
/// attempt must be aborted rather than producing a defective floor.
pub fn build(config: &Config, seed: u64) -> Result<Level, GenerationError> {
    build_with_handoff(config, seed, None)
}

/// Builds a floor, seeding the player from the previous floor's handoff
/// when one is provided.
///
/// # Errors
///
/// Surfaces [`GenerationError`] when a generation invariant breaks.
pub fn build_with_handoff(
    config: &Config,
    seed: u64,
    handoff: Option<&FloorHandoff>,
) -> Result<Level, GenerationError> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let bounds = Rect::new(
        Point::new(0, 0),
        Point::new(config.columns - 1, config.rows - 1),
    );

    let mut grid = Grid::new(config.columns, config.rows);
    grid.fill(Tile::Ground);
    grid.outline(bounds, Tile::Wall);

    // The entry is sampled from the interior before carving; the maze may
    // wall it over, so its tile is stamped afterwards.
    let entry = Point::new(
        rng.gen_range(1..config.columns - 1),
        rng.gen_range(1..config.rows - 1),
    );

    mazegen::carve(&mut grid, bounds, &mut rng);
    debug!(floor = config.floor, "maze carved:\n{}", grid.render());

    let entry_tile = if config.floor == config.floor_start {
        Tile::Ground
    } else {
        Tile::Downstairs
    };
    grid.set_tile(entry.x(), entry.y(), entry_tile);

    let report = connectivity::repair(&mut grid, bounds, entry, &mut rng)?;
    debug!(
        floor = config.floor,
        corridors = report.corridors_carved,
        connected = report.connected_cells,
        "floor reconnected:\n{}",
        grid.render()
    );

    let upstairs = place_upstairs(&mut grid, entry, config, &mut rng)?;

    let mut open_tiles = open_tile_census(&grid, entry, upstairs);
    let mut level = Level::new(
        grid,
        config.floor,
        config.floor_start,
        config.kills_per_level,
        entry,
        upstairs,
        entry,
    );

    seed_monsters(&mut level, &mut open_tiles, config, &mut rng)?;

    match handoff {
        Some(previous) => {
            let _ = level.spawn_player_from_handoff(previous)?;
        }
        None => {
            let _ = level.spawn_player(
                Stats::for_player(1, config.floor_start),
                Power::BasicMelee {
                    damage_modifier: 1.0,
                },
            )?;
        }
    }

    Ok(level)
}

/// Picks a walkable upstairs cell away from the entry: not coincident with
/// it and at least half the smaller grid dimension distant. The candidate
/// search is bounded; exhausting it means generation went wrong.
fn place_upstairs<R: Rng>(
    grid: &mut Grid,
    entry: Point,
    config: &Config,
    rng: &mut R,
) -> Result<Point, GenerationError> {
    let min_distance = f64::from(config.columns.min(config.rows) / 2);
    let max_attempts = (config.columns as usize)
        .saturating_mul(config.rows as usize)
        .saturating_mul(10)
        .max(1);

    for _ in 0..max_attempts {
        let candidate = Point::new(
            rng.gen_range(0..config.columns),
            rng.gen_range(0..config.rows),
        );
        if !grid.tile(candidate.x(), candidate.y()).walkable() {
            continue;
        }
        if candidate == entry || entry.distance(candidate) < min_distance {
            continue;
        }
        grid.set_tile(candidate.x(), candidate.y(), Tile::Upstairs);
        return Ok(candidate);
    }

    Err(GenerationError::NoStairsCandidate {
        floor: config.floor,
    })
}

/// Walkable cells available for monster placement: everything except the
/// two stairs cells.
fn open_tile_census(grid: &Grid, entry: Point, upstairs: Point) -> Vec<Point> {
    let mut open = Vec::new();
    for x in 0..grid.cols() {
        for y in 0..grid.rows() {
            let point = Point::new(x, y);
            if grid.tile(x, y).walkable() && point != entry && point != upstairs {
                open.push(point);
            }
        }
    }
    open
}

/// Seeds a sparse monster population: one per ~90 open tiles, scaled by a
/// ±10% roll, each with a random power and depth-scaled stats.
fn seed_monsters<R: Rng>(
    level: &mut Level,
    open_tiles: &mut Vec<Point>,
    config: &Config,
    rng: &mut R,
) -> Result<(), GenerationError> {
    let factor = rng.gen::<f32>() / 5.0 + 0.9;
    let count = (open_tiles.len() as f32 * factor / TILES_PER_MONSTER) as usize;
    let monster_level = (config.floor_start - config.floor) + 1;

    for _ in 0..count {
        if open_tiles.is_empty() {
            break;
        }
        let index = rng.gen_range(0..open_tiles.len());
        let at = open_tiles.swap_remove(index);
        let power = random_power(rng);
        let stats = Stats::for_monster(monster_level, config.floor_start, &power);
        let _ = level.spawn_monster(at, stats, power)?;
    }

    Ok(())
}

/// Uniform draw over the four monster powers with their standard tuning.
fn random_power<R: Rng>(rng: &mut R) -> Power {
    match rng.gen_range(0..4) {
        0 => Power::Poison {
            damage_modifier: 0.5,
            duration: 5,
        },
        1 => Power::BasicRanged {
            damage_modifier: 1.0,
            attack_range: 3,
        },
        2 => Power::BasicMelee {
            damage_modifier: 1.0,
        },
        _ => Power::BounceBack {
            damage_modifier: 1.0,
        },
    }
}
