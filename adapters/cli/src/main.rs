#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter: builds a Deepdelve floor, prints the diagnostic
//! dump, and optionally auto-plays rounds with a waiting player.

use anyhow::Result;
use clap::Parser;
use deepdelve_core::{ActorKind, PlayerAction, Point, RoundOutcome, TurnOutcome};
use deepdelve_system_ai::MonsterBrain;
use deepdelve_system_builder::{build, Config};
use deepdelve_world::{advance_round, query, resolve_player_action, Level};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Command-line arguments for one floor run.
#[derive(Debug, Parser)]
#[command(name = "deepdelve", about = "Generate and step Deepdelve floors")]
struct Args {
    /// Seed for floor generation and simulation.
    #[arg(long, default_value_t = 0x0DD5_EED)]
    seed: u64,
    /// Number of grid columns.
    #[arg(long, default_value_t = 80)]
    columns: i32,
    /// Number of grid rows.
    #[arg(long, default_value_t = 30)]
    rows: i32,
    /// Floor index to generate; floors count down toward the surface.
    #[arg(long, default_value_t = 25)]
    floor: i32,
    /// Index of the deepest floor of the run.
    #[arg(long, default_value_t = 25)]
    floor_start: i32,
    /// Rounds to auto-play with the player waiting each turn.
    #[arg(long, default_value_t = 0)]
    turns: u32,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = Config {
        floor: args.floor,
        floor_start: args.floor_start,
        columns: args.columns,
        rows: args.rows,
        kills_per_level: 10,
    };

    let mut level = build(&config, args.seed)?;
    print!("{}", level.render());
    summarize(&level);

    if args.turns > 0 {
        run(&mut level, args.seed, args.turns)?;
        summarize(&level);
    }

    Ok(())
}

fn summarize(level: &Level) {
    let monsters = query::actors(level)
        .filter(|(_, org)| org.kind() == ActorKind::Monster)
        .count();
    println!(
        "floor {} | entry {} | upstairs {} | {} monsters",
        query::floor(level),
        query::entry(level),
        query::upstairs(level),
        monsters,
    );
    if let Some(player) = query::player_id(level).and_then(|id| query::actor(level, id)) {
        println!(
            "player at {} | hp {}/{} | power {}",
            player.position(),
            player.stats().health(),
            player.stats().max_health(),
            player.power().name(),
        );
    }
}

fn run(level: &mut Level, seed: u64, turns: u32) -> Result<()> {
    // Sight geometry is static terrain, so the predicate works over a
    // snapshot instead of borrowing the level the loop mutates.
    let blockers = SightBlockers::of(level);
    let los = |from: Point, to: Point| blockers.clear_line(from, to);
    let mut brain = MonsterBrain::new();
    let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(1));

    for turn in 0..turns {
        match advance_round(level, &mut brain, &mut rng, &los)? {
            RoundOutcome::PlayerDied => {
                println!("the player died on turn {turn}");
                return Ok(());
            }
            RoundOutcome::AwaitingInput => {}
        }
        match resolve_player_action(level, PlayerAction::Wait, &mut rng, &los)? {
            TurnOutcome::PlayerDied => {
                println!("the player died on turn {turn}");
                return Ok(());
            }
            _ => {}
        }
    }

    Ok(())
}

/// Snapshot of which cells block sight, taken once per floor.
struct SightBlockers {
    cols: i32,
    rows: i32,
    blocked: Vec<bool>,
}

impl SightBlockers {
    fn of(level: &Level) -> Self {
        let size = query::grid_size(level);
        let mut blocked = Vec::with_capacity((size.x() * size.y()).max(0) as usize);
        for y in 0..size.y() {
            for x in 0..size.x() {
                blocked.push(query::tile(level, x, y).blocks_sight());
            }
        }
        Self {
            cols: size.x(),
            rows: size.y(),
            blocked,
        }
    }

    fn blocks(&self, x: i32, y: i32) -> bool {
        if x < 0 || x >= self.cols || y < 0 || y >= self.rows {
            return true;
        }
        self.blocked[(y * self.cols + x) as usize]
    }

    /// Walks the straight line between the two points and reports whether no
    /// intermediate cell blocks sight. Endpoints do not block their own
    /// line.
    fn clear_line(&self, from: Point, to: Point) -> bool {
        let mut x = from.x();
        let mut y = from.y();
        let dx = (to.x() - from.x()).abs();
        let dy = -(to.y() - from.y()).abs();
        let sx = (to.x() - from.x()).signum();
        let sy = (to.y() - from.y()).signum();
        let mut error = dx + dy;

        loop {
            if (x, y) != (from.x(), from.y()) && (x, y) != (to.x(), to.y()) && self.blocks(x, y) {
                return false;
            }
            if x == to.x() && y == to.y() {
                return true;
            }
            let doubled = 2 * error;
            if doubled >= dy {
                error += dy;
                x += sx;
            }
            if doubled <= dx {
                error += dx;
                y += sy;
            }
        }
    }
}
