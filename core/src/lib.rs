#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Deepdelve simulation kernel.
//!
//! This crate defines the value types that connect the authoritative world,
//! the pure generation and behavior systems, and the adapters: grid
//! coordinates and tiles, actor and item handles, stat blocks, the closed set
//! of attack powers, the action vocabulary consumed by the world, and the
//! error taxonomy surfaced by grid mutation and floor generation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Integer grid coordinate, also used as a lightweight vector for distance
/// queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    x: i32,
    y: i32,
}

impl Point {
    /// Creates a new point at the provided column and row.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Zero-based column component of the point.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Zero-based row component of the point.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Returns the point displaced by the provided deltas.
    #[must_use]
    pub const fn translate(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Euclidean distance between two points.
    #[must_use]
    pub fn distance(self, other: Point) -> f64 {
        let dx = f64::from(other.x - self.x);
        let dy = f64::from(other.y - self.y);
        (dx * dx + dy * dy).sqrt()
    }

    /// Ring distance between two points: the number of concentric square
    /// rings separating them. Attack ranges are measured in rings.
    #[must_use]
    pub fn range_to(self, other: Point) -> i32 {
        let dx = (other.x - self.x).abs();
        let dy = (other.y - self.y).abs();
        dx.max(dy)
    }

    /// Unit-step deltas that move one cell from this point toward the target,
    /// allowing diagonals. Returns `(0, 0)` when already at the target.
    #[must_use]
    pub fn delta_toward(self, target: Point) -> (i32, i32) {
        ((target.x - self.x).signum(), (target.y - self.y).signum())
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Axis-aligned rectangular region with inclusive corners, used to describe
/// generation bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    top_left: Point,
    bottom_right: Point,
}

impl Rect {
    /// Constructs a region from its inclusive top-left and bottom-right
    /// corners.
    #[must_use]
    pub const fn new(top_left: Point, bottom_right: Point) -> Self {
        Self {
            top_left,
            bottom_right,
        }
    }

    /// Inclusive upper-left corner of the region.
    #[must_use]
    pub const fn top_left(&self) -> Point {
        self.top_left
    }

    /// Inclusive lower-right corner of the region.
    #[must_use]
    pub const fn bottom_right(&self) -> Point {
        self.bottom_right
    }

    /// Reports whether the point lies inside the region, corners included.
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        point.x() >= self.top_left.x()
            && point.x() <= self.bottom_right.x()
            && point.y() >= self.top_left.y()
            && point.y() <= self.bottom_right.y()
    }
}

/// Terrain variant stored at each grid cell.
///
/// `Tile::None` denotes "outside the generated floor"; it is only ever
/// returned from out-of-bounds queries and never stored in a grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tile {
    /// Open floor that organisms may occupy and traverse.
    Ground,
    /// Solid wall blocking movement and line of sight.
    Wall,
    /// Stairs leading toward the surface; walkable.
    Upstairs,
    /// Stairs the player arrived from; walkable.
    Downstairs,
    /// Absence of terrain, reported for out-of-bounds queries.
    None,
}

impl Tile {
    /// Reports whether organisms may occupy and traverse the tile.
    #[must_use]
    pub const fn walkable(&self) -> bool {
        !matches!(self, Tile::Wall | Tile::None)
    }

    /// Reports whether the tile blocks line of sight.
    #[must_use]
    pub const fn blocks_sight(&self) -> bool {
        matches!(self, Tile::Wall)
    }

    /// Single-character diagnostic glyph used by the textual grid dump.
    #[must_use]
    pub const fn glyph(&self) -> char {
        match self {
            Tile::Ground => '.',
            Tile::Wall => '#',
            Tile::Upstairs => '<',
            Tile::Downstairs => '>',
            Tile::None => 'X',
        }
    }
}

/// Unique identifier assigned to an organism for one floor's lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(u32);

impl ActorId {
    /// Creates a new actor identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to an item for one floor's lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(u32);

impl ItemId {
    /// Creates a new item identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Distinguishes the player from automatically-stepped monsters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActorKind {
    /// The externally-driven player character.
    Player,
    /// A monster stepped by the turn loop.
    Monster,
}

/// Closed set of attack capabilities an organism can wield.
///
/// Each variant carries its tuning; dispatch happens in the world's combat
/// resolution rather than through an open class hierarchy.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Power {
    /// Adjacent-cell strike.
    BasicMelee {
        /// Fraction of the wielder's base damage dealt per hit.
        damage_modifier: f32,
    },
    /// Projectile strike with an extended reach.
    BasicRanged {
        /// Fraction of the wielder's base damage dealt per hit.
        damage_modifier: f32,
        /// Maximum ring distance at which the strike connects.
        attack_range: i32,
    },
    /// Adjacent-cell strike that poisons instead of dealing direct damage.
    Poison {
        /// Fraction of the wielder's base damage applied per poisoned turn.
        damage_modifier: f32,
        /// Number of victim turns the poison persists.
        duration: i32,
    },
    /// Adjacent-cell strike that knocks the victim away on contact.
    BounceBack {
        /// Fraction of the wielder's base damage dealt per hit.
        damage_modifier: f32,
    },
}

impl Power {
    /// Maximum ring distance at which the power can connect.
    #[must_use]
    pub const fn attack_range(&self) -> i32 {
        match self {
            Power::BasicRanged { attack_range, .. } => *attack_range,
            Power::BasicMelee { .. } | Power::Poison { .. } | Power::BounceBack { .. } => 1,
        }
    }

    /// Fraction of the wielder's base damage the power applies.
    #[must_use]
    pub const fn damage_modifier(&self) -> f32 {
        match self {
            Power::BasicMelee { damage_modifier }
            | Power::BasicRanged {
                damage_modifier, ..
            }
            | Power::Poison {
                damage_modifier, ..
            }
            | Power::BounceBack { damage_modifier } => *damage_modifier,
        }
    }

    /// Display name of the power.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Power::BasicMelee { .. } => "Claw",
            Power::BasicRanged { .. } => "Fireball",
            Power::Poison { .. } => "Poison",
            Power::BounceBack { .. } => "Bounce",
        }
    }
}

/// Stat block attached to every organism.
///
/// `health` and `max_health` stay private so the clamp invariant (health
/// never exceeds the maximum) holds across all mutation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    /// Experience level the stats were derived for.
    pub level: i32,
    /// Experience accumulated toward the next level.
    pub xp: i32,
    /// Experience required to reach the next level.
    pub xp_max: i32,
    /// Probability in `[0, 1]` that an attack roll connects.
    pub chance_to_hit: f32,
    /// Damage dealt per connecting hit before modifiers.
    pub base_damage: i32,
    /// Damage that penetrates the defender's armor.
    pub piercing: i32,
    /// Flat damage reduction applied to incoming hits.
    pub armor: i32,
    /// Maximum Euclidean distance at which other organisms can be seen.
    pub view_dist: i32,
    /// Initiative baseline: the countdown an organism resets to after
    /// acting. Always positive.
    pub speed: i32,
    /// Remaining countdown until the organism's next turn.
    pub time_till_turn: i32,
    max_health: i32,
    health: i32,
}

impl Stats {
    const BASE_CHANCE_TO_HIT: f32 = 0.75;
    const BASE_SPEED: i32 = 100;

    /// Derives the player's stat block for the provided experience level.
    #[must_use]
    pub fn for_player(level: i32, floor_start: i32) -> Self {
        let max_health = 100 + ((level - 1) as f32 * (100.0 / floor_start as f32)) as i32;
        Self {
            level,
            xp: 0,
            xp_max: 100,
            chance_to_hit: Self::BASE_CHANCE_TO_HIT + 0.01 * level as f32,
            base_damage: 5 + level * 2,
            piercing: 1 + level * 2,
            armor: 1 + level,
            view_dist: 10,
            speed: Self::BASE_SPEED,
            time_till_turn: Self::BASE_SPEED,
            max_health,
            health: max_health,
        }
    }

    /// Derives a monster's stat block for the provided level, adjusted by the
    /// power it wields.
    #[must_use]
    pub fn for_monster(level: i32, floor_start: i32, power: &Power) -> Self {
        let max_health = 30 + (level as f32 * (60.0 / floor_start as f32)) as i32;
        let mut piercing = 1 + level * 2;
        let mut armor = 1 + level * 2;

        match power {
            Power::BasicRanged { .. } => {
                piercing += 2;
                armor = (armor - 3).max(0);
            }
            Power::BasicMelee { .. } => {
                piercing = (piercing - 3).max(0);
                armor += 2;
            }
            Power::Poison { .. } | Power::BounceBack { .. } => {}
        }

        Self {
            level,
            xp: 0,
            xp_max: 100,
            chance_to_hit: Self::BASE_CHANCE_TO_HIT + 0.01 * level as f32,
            base_damage: 5 + level * 2,
            piercing,
            armor,
            view_dist: 10,
            speed: Self::BASE_SPEED,
            time_till_turn: Self::BASE_SPEED,
            max_health,
            health: max_health,
        }
    }

    /// Current health. May be zero or negative once the organism is dead.
    #[must_use]
    pub const fn health(&self) -> i32 {
        self.health
    }

    /// Maximum health the organism can recover to.
    #[must_use]
    pub const fn max_health(&self) -> i32 {
        self.max_health
    }

    /// Sets current health, clamping to the maximum. Values at or below zero
    /// are stored as-is so callers can detect death.
    pub fn set_health(&mut self, value: i32) {
        self.health = value.min(self.max_health);
    }

    /// Reports whether the organism still lives.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.health > 0
    }
}

/// Intent produced by a monster's turn-taking behavior.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// Spend the turn doing nothing.
    Wait,
    /// Step by the provided deltas, each in `-1..=1`.
    Move {
        /// Column delta of the attempted step.
        dx: i32,
        /// Row delta of the attempted step.
        dy: i32,
    },
    /// Step one cell toward the target point, allowing diagonals.
    MoveToward(Point),
    /// Strike the identified organism with the wielded power, stepping
    /// toward it instead when the strike cannot connect.
    Attack(ActorId),
}

/// Atomic action submitted for the player once per input event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerAction {
    /// Step by the provided deltas, attacking instead when the destination
    /// holds an organism.
    Move {
        /// Column delta of the attempted step.
        dx: i32,
        /// Row delta of the attempted step.
        dy: i32,
    },
    /// Targeted strike against whatever organism occupies the cell.
    AttackAt(Point),
    /// Consume the top item on the player's own cell.
    Interact,
    /// Ascend when standing on the upstairs tile.
    UseStairs,
    /// Spend the turn doing nothing.
    Wait,
}

/// Result of resolving a single player action.
#[derive(Clone, Debug, PartialEq)]
pub enum TurnOutcome {
    /// The action succeeded and the player's turn ended.
    Acted,
    /// The action consumed the turn but its effect was blocked (for
    /// example a step into a wall).
    Blocked,
    /// The action did not apply and no turn was consumed.
    Ignored,
    /// The player ascended the stairs; the handoff seeds the next floor.
    Descended(FloorHandoff),
    /// The player died resolving the action.
    PlayerDied,
}

/// Result of advancing the automatic portion of a round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoundOutcome {
    /// Every scheduled monster acted; the player is at the head of the
    /// initiative order awaiting input.
    AwaitingInput,
    /// The player died during a monster's turn.
    PlayerDied,
}

/// Value bag carried across a floor transition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FloorHandoff {
    /// Index of the floor the player is descending to.
    pub floor: i32,
    /// Player stat block at the moment of transition.
    pub stats: Stats,
    /// Power the player carries down.
    pub power: Power,
    /// Outstanding poison damage per turn, if any.
    pub poison_damage_per_turn: i32,
    /// Remaining poisoned turns.
    pub poison_duration: i32,
}

/// Failure conditions surfaced by grid mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum GridError {
    /// The coordinate lies outside the grid extents. Always a caller
    /// programming error; guard with `in_bounds` upstream.
    #[error("coordinate ({x}, {y}) is outside the grid")]
    OutOfBounds {
        /// Column of the rejected coordinate.
        x: i32,
        /// Row of the rejected coordinate.
        y: i32,
    },
    /// An organism already occupies the destination cell.
    #[error("cell ({x}, {y}) already holds an organism")]
    CellOccupied {
        /// Column of the occupied cell.
        x: i32,
        /// Row of the occupied cell.
        y: i32,
    },
    /// No organism or item was present to remove.
    #[error("nothing to remove at ({x}, {y})")]
    EmptyCell {
        /// Column of the empty cell.
        x: i32,
        /// Row of the empty cell.
        y: i32,
    },
}

/// Fatal failures aborting a floor generation attempt.
///
/// Both conditions are geometrically impossible when the generator upholds
/// its invariants, so surfacing one indicates a generation bug rather than a
/// recoverable state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// No walkable upstairs candidate satisfied the distance constraint.
    #[error("floor {floor}: no reachable upstairs candidate found")]
    NoStairsCandidate {
        /// Floor index of the failed attempt.
        floor: i32,
    },
    /// The spiral search for a connected cell exhausted the grid.
    #[error("spiral search from {origin} exhausted the grid without finding a connected cell")]
    SpiralExhausted {
        /// Unconnected cell the search started from.
        origin: Point,
    },
    /// Seeding tried to place an organism onto a cell that was not open.
    #[error("actor seeding failed: {source}")]
    Seeding {
        /// Underlying grid failure.
        #[from]
        source: GridError,
    },
}

#[cfg(test)]
mod tests {
    use super::{FloorHandoff, Point, Power, Rect, Stats, Tile};
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn range_counts_rings_not_steps() {
        let origin = Point::new(3, 3);
        assert_eq!(origin.range_to(Point::new(5, 4)), 2);
        assert_eq!(origin.range_to(Point::new(3, 3)), 0);
        assert_eq!(origin.range_to(Point::new(2, 2)), 1);
    }

    #[test]
    fn distance_is_euclidean() {
        let origin = Point::new(0, 0);
        assert!((origin.distance(Point::new(3, 4)) - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn delta_toward_steps_diagonally() {
        let origin = Point::new(4, 4);
        assert_eq!(origin.delta_toward(Point::new(9, 1)), (1, -1));
        assert_eq!(origin.delta_toward(Point::new(4, 4)), (0, 0));
    }

    #[test]
    fn rect_contains_its_corners() {
        let rect = Rect::new(Point::new(0, 0), Point::new(9, 9));
        assert!(rect.contains(Point::new(0, 0)));
        assert!(rect.contains(Point::new(9, 9)));
        assert!(!rect.contains(Point::new(10, 9)));
        assert!(!rect.contains(Point::new(-1, 0)));
    }

    #[test]
    fn only_walls_block_movement_and_sight() {
        assert!(Tile::Ground.walkable());
        assert!(Tile::Upstairs.walkable());
        assert!(Tile::Downstairs.walkable());
        assert!(!Tile::Wall.walkable());
        assert!(!Tile::None.walkable());

        assert!(Tile::Wall.blocks_sight());
        assert!(!Tile::Ground.blocks_sight());
        assert!(!Tile::Upstairs.blocks_sight());
    }

    #[test]
    fn glyphs_match_the_diagnostic_mapping() {
        assert_eq!(Tile::Ground.glyph(), '.');
        assert_eq!(Tile::Wall.glyph(), '#');
        assert_eq!(Tile::Upstairs.glyph(), '<');
        assert_eq!(Tile::Downstairs.glyph(), '>');
    }

    #[test]
    fn melee_power_adjusts_monster_armor() {
        let power = Power::BasicMelee {
            damage_modifier: 1.0,
        };
        let stats = Stats::for_monster(1, 25, &power);
        assert_eq!(stats.piercing, 0);
        assert_eq!(stats.armor, 5);
    }

    #[test]
    fn ranged_power_adjusts_monster_piercing() {
        let power = Power::BasicRanged {
            damage_modifier: 1.0,
            attack_range: 3,
        };
        let stats = Stats::for_monster(1, 25, &power);
        assert_eq!(stats.piercing, 5);
        assert_eq!(stats.armor, 0);
    }

    #[test]
    fn health_clamps_to_maximum() {
        let mut stats = Stats::for_player(1, 25);
        stats.set_health(stats.max_health() + 50);
        assert_eq!(stats.health(), stats.max_health());

        stats.set_health(-3);
        assert_eq!(stats.health(), -3);
        assert!(!stats.is_alive());
    }

    #[test]
    fn player_stats_scale_with_level() {
        let first = Stats::for_player(1, 25);
        let fifth = Stats::for_player(5, 25);
        assert!(fifth.max_health() > first.max_health());
        assert!(fifth.base_damage > first.base_damage);
        assert!(fifth.chance_to_hit > first.chance_to_hit);
    }

    #[test]
    fn stats_round_trip_through_bincode() {
        assert_round_trip(&Stats::for_player(3, 25));
    }

    #[test]
    fn power_round_trips_through_bincode() {
        assert_round_trip(&Power::BasicRanged {
            damage_modifier: 1.0,
            attack_range: 3,
        });
    }

    #[test]
    fn floor_handoff_round_trips_through_bincode() {
        let handoff = FloorHandoff {
            floor: 24,
            stats: Stats::for_player(2, 25),
            power: Power::Poison {
                damage_modifier: 0.5,
                duration: 5,
            },
            poison_damage_per_turn: 0,
            poison_duration: 0,
        };
        assert_round_trip(&handoff);
    }

    #[test]
    fn tile_and_point_round_trip_through_bincode() {
        assert_round_trip(&Tile::Upstairs);
        assert_round_trip(&Point::new(-4, 17));
    }
}
