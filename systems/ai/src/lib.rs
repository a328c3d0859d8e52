#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Monster turn-taking behavior.
//!
//! The brain is a pure decision system: it reads an immutable level view and
//! produces an intent the world resolves. Its only state is each monster's
//! memory of where the player was last seen; the authoritative world knows
//! nothing about it.

use std::collections::HashMap;

use deepdelve_core::{Action, ActorId, Point};
use deepdelve_world::{query, Brain, Level, LineOfSight};
use rand::{Rng, RngCore};

/// Chase-and-attack behavior for every monster on the floor.
///
/// A monster that can see the player attacks when its power reaches and
/// closes in otherwise, remembering the sighting. Out of sight it walks
/// toward the last remembered position, and wanders one random step when it
/// has nothing to go on.
#[derive(Debug, Default)]
pub struct MonsterBrain {
    last_seen: HashMap<ActorId, Point>,
}

impl MonsterBrain {
    /// Creates a brain with no sightings recorded.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Brain for MonsterBrain {
    fn choose(
        &mut self,
        level: &Level,
        actor: ActorId,
        rng: &mut dyn RngCore,
        los: LineOfSight<'_>,
    ) -> Action {
        let Some(me) = query::actor(level, actor) else {
            return Action::Wait;
        };

        // Standing where the player was last seen exhausts that memory.
        if self.last_seen.get(&actor) == Some(&me.position()) {
            let _ = self.last_seen.remove(&actor);
        }

        let (Some(player), Some(player_position)) =
            (query::player_id(level), query::player_position(level))
        else {
            return Action::Wait;
        };

        if query::is_visible(level, actor, player_position, los) {
            let _ = self.last_seen.insert(actor, player_position);
            // The world steps toward the player instead when the power
            // cannot reach.
            return Action::Attack(player);
        }

        match self.last_seen.get(&actor) {
            Some(&remembered) => Action::MoveToward(remembered),
            None => Action::Move {
                dx: rng.gen_range(-1..2),
                dy: rng.gen_range(-1..2),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deepdelve_core::{Power, Rect, Stats, Tile};
    use deepdelve_world::Grid;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const ALWAYS_CLEAR: fn(Point, Point) -> bool = |_, _| true;
    const NEVER_CLEAR: fn(Point, Point) -> bool = |_, _| false;

    fn melee() -> Power {
        Power::BasicMelee {
            damage_modifier: 1.0,
        }
    }

    fn open_level(cols: i32, rows: i32) -> Level {
        let mut grid = Grid::new(cols, rows);
        grid.fill(Tile::Ground);
        grid.outline(
            Rect::new(Point::new(0, 0), Point::new(cols - 1, rows - 1)),
            Tile::Wall,
        );
        Level::new(
            grid,
            10,
            25,
            10,
            Point::new(1, 1),
            Point::new(cols - 2, rows - 2),
            Point::new(1, 1),
        )
    }

    fn spawn(level: &mut Level, at: Point) -> ActorId {
        let stats = Stats::for_monster(1, 25, &melee());
        level.spawn_monster(at, stats, melee()).expect("spawn")
    }

    #[test]
    fn visible_player_draws_an_attack() {
        let mut level = open_level(10, 10);
        let player = level
            .spawn_player(Stats::for_player(1, 25), melee())
            .expect("player");
        let monster = spawn(&mut level, Point::new(4, 4));

        let mut brain = MonsterBrain::new();
        let mut rng = ChaCha8Rng::seed_from_u64(31);
        let action = brain.choose(&level, monster, &mut rng, &ALWAYS_CLEAR);

        assert_eq!(action, Action::Attack(player));
    }

    #[test]
    fn blocked_sight_falls_back_to_memory_then_wandering() {
        let mut level = open_level(10, 10);
        let _ = level
            .spawn_player(Stats::for_player(1, 25), melee())
            .expect("player");
        let monster = spawn(&mut level, Point::new(4, 4));

        let mut brain = MonsterBrain::new();
        let mut rng = ChaCha8Rng::seed_from_u64(32);

        // First sighting records the player's position.
        let action = brain.choose(&level, monster, &mut rng, &ALWAYS_CLEAR);
        assert!(matches!(action, Action::Attack(_)));

        // Sight lost: head for the remembered position.
        let action = brain.choose(&level, monster, &mut rng, &NEVER_CLEAR);
        assert_eq!(action, Action::MoveToward(Point::new(1, 1)));
    }

    #[test]
    fn wandering_steps_stay_single_cell() {
        let mut level = open_level(10, 10);
        let _ = level
            .spawn_player(Stats::for_player(1, 25), melee())
            .expect("player");
        let monster = spawn(&mut level, Point::new(4, 4));

        let mut brain = MonsterBrain::new();
        let mut rng = ChaCha8Rng::seed_from_u64(33);

        for _ in 0..50 {
            match brain.choose(&level, monster, &mut rng, &NEVER_CLEAR) {
                Action::Move { dx, dy } => {
                    assert!((-1..=1).contains(&dx));
                    assert!((-1..=1).contains(&dy));
                }
                other => panic!("expected a wander step, got {other:?}"),
            }
        }
    }

    #[test]
    fn memory_clears_once_the_spot_is_reached() {
        let mut level = open_level(10, 10);
        let _ = level
            .spawn_player(Stats::for_player(1, 25), melee())
            .expect("player");
        // The monster stands exactly where it will remember the player.
        let monster = spawn(&mut level, Point::new(1, 2));

        let mut brain = MonsterBrain::new();
        let _ = brain.last_seen.insert(monster, Point::new(1, 2));
        let mut rng = ChaCha8Rng::seed_from_u64(34);

        let action = brain.choose(&level, monster, &mut rng, &NEVER_CLEAR);
        assert!(
            matches!(action, Action::Move { .. }),
            "stale memory must clear and leave the monster wandering"
        );
        assert!(!brain.last_seen.contains_key(&monster));
    }

    #[test]
    fn player_beyond_view_distance_is_not_seen() {
        let mut level = open_level(30, 8);
        let _ = level
            .spawn_player(Stats::for_player(1, 25), melee())
            .expect("player");
        // 25 cells away, well past the 10-cell view distance, with a
        // permissive sight line.
        let monster = spawn(&mut level, Point::new(26, 1));

        let mut brain = MonsterBrain::new();
        let mut rng = ChaCha8Rng::seed_from_u64(35);
        let action = brain.choose(&level, monster, &mut rng, &ALWAYS_CLEAR);

        assert!(matches!(action, Action::Move { .. }));
    }
}
