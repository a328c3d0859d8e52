#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative floor state for the Deepdelve simulation kernel.
//!
//! A [`Level`] exclusively owns one floor's grid, organisms, items, and
//! initiative order for the floor's lifetime. Systems and adapters read
//! through the [`query`] module and mutate only through the operations
//! defined here; randomness is always threaded in explicitly so a fixed seed
//! replays a floor exactly.

mod actors;
mod combat;
mod grid;
mod items;
mod scheduler;

pub use actors::Organism;
pub use grid::Grid;
pub use items::Item;
pub use scheduler::TurnScheduler;

use actors::ActorArena;
use items::ItemArena;

use deepdelve_core::{
    Action, ActorId, ActorKind, FloorHandoff, GridError, ItemId, PlayerAction, Point, Power,
    RoundOutcome, Stats, TurnOutcome,
};
use rand::RngCore;

/// Line-of-sight predicate supplied by the presentation layer: reports
/// whether an unobstructed sight line connects the two points. The kernel
/// never prescribes how it is computed.
pub type LineOfSight<'a> = &'a dyn Fn(Point, Point) -> bool;

/// Turn-taking behavior collaborator invoked for each scheduled monster.
pub trait Brain {
    /// Decides the acting monster's intent from an immutable view of the
    /// level. The world resolves the returned action; deciding never mutates
    /// floor state.
    fn choose(
        &mut self,
        level: &Level,
        actor: ActorId,
        rng: &mut dyn RngCore,
        los: LineOfSight<'_>,
    ) -> Action;
}

/// One dungeon floor: grid, organisms, items, initiative order, and the
/// floor's stairs metadata.
#[derive(Debug)]
pub struct Level {
    pub(crate) grid: Grid,
    pub(crate) actors: ActorArena,
    pub(crate) items: ItemArena,
    pub(crate) scheduler: TurnScheduler,
    pub(crate) floor: i32,
    pub(crate) floor_start: i32,
    pub(crate) kills_per_level: i32,
    pub(crate) entry: Point,
    pub(crate) upstairs: Point,
    pub(crate) downstairs: Point,
    pub(crate) player: Option<ActorId>,
}

impl Level {
    /// Assembles a level around an already-generated grid. Organisms are
    /// placed afterwards through [`Level::spawn_player`] and
    /// [`Level::spawn_monster`].
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        grid: Grid,
        floor: i32,
        floor_start: i32,
        kills_per_level: i32,
        entry: Point,
        upstairs: Point,
        downstairs: Point,
    ) -> Self {
        Self {
            grid,
            actors: ActorArena::default(),
            items: ItemArena::default(),
            scheduler: TurnScheduler::new(),
            floor,
            floor_start,
            kills_per_level,
            entry,
            upstairs,
            downstairs,
            player: None,
        }
    }

    /// Read-only access to the floor's grid.
    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Read-only access to the initiative order.
    #[must_use]
    pub const fn scheduler(&self) -> &TurnScheduler {
        &self.scheduler
    }

    /// Places the player at the entry cell and inserts it at the head of the
    /// initiative order.
    ///
    /// # Errors
    ///
    /// Propagates grid placement failures (`CellOccupied` when something
    /// already claimed the entry).
    pub fn spawn_player(&mut self, stats: Stats, power: Power) -> Result<ActorId, GridError> {
        let organism = Organism::new(ActorKind::Player, self.entry, stats, power);
        let id = self.actors.insert(organism);
        if let Err(error) = self.grid.place_organism(id, self.entry.x(), self.entry.y()) {
            let _ = self.actors.remove(id);
            return Err(error);
        }
        self.scheduler.insert_at_front(id);
        self.player = Some(id);
        Ok(id)
    }

    /// Places the player at the entry cell using the stats, power, and
    /// poison state carried over from the previous floor.
    ///
    /// # Errors
    ///
    /// Propagates grid placement failures.
    pub fn spawn_player_from_handoff(
        &mut self,
        handoff: &FloorHandoff,
    ) -> Result<ActorId, GridError> {
        let id = self.spawn_player(handoff.stats.clone(), handoff.power)?;
        if let Some(org) = self.actors.get_mut(id) {
            org.set_poison(handoff.poison_damage_per_turn, handoff.poison_duration);
        }
        Ok(id)
    }

    /// Places a monster at the provided cell and appends it to the
    /// initiative order.
    ///
    /// # Errors
    ///
    /// Propagates grid placement failures.
    pub fn spawn_monster(
        &mut self,
        at: Point,
        stats: Stats,
        power: Power,
    ) -> Result<ActorId, GridError> {
        let organism = Organism::new(ActorKind::Monster, at, stats, power);
        let id = self.actors.insert(organism);
        if let Err(error) = self.grid.place_organism(id, at.x(), at.y()) {
            let _ = self.actors.remove(id);
            return Err(error);
        }
        self.scheduler.append(id);
        Ok(id)
    }

    /// Removes an organism from the floor entirely: the initiative order,
    /// its grid cell, and its record. Silently does nothing when the actor
    /// is already gone; removal is idempotent.
    pub fn despawn(&mut self, id: ActorId) {
        self.scheduler.remove(id);
        if let Some(org) = self.actors.remove(id) {
            let at = org.position();
            if self.grid.organism_at(at.x(), at.y()) == Some(id) {
                let _ = self.grid.remove_organism(at.x(), at.y());
            }
        }
        if self.player == Some(id) {
            self.player = None;
        }
    }

    /// Records the organism at the cell and synchronizes its stored
    /// position.
    ///
    /// # Errors
    ///
    /// `OutOfBounds` or `CellOccupied` per the grid contract.
    pub fn place_organism(&mut self, id: ActorId, x: i32, y: i32) -> Result<(), GridError> {
        self.grid.place_organism(id, x, y)?;
        if let Some(org) = self.actors.get_mut(id) {
            org.set_position(Point::new(x, y));
        }
        Ok(())
    }

    /// Clears the cell and returns the organism that occupied it. The
    /// organism's record stays alive; its stored position is left pointing at
    /// the vacated cell until it is placed again.
    ///
    /// # Errors
    ///
    /// `OutOfBounds` or `EmptyCell` per the grid contract.
    pub fn remove_organism(&mut self, x: i32, y: i32) -> Result<ActorId, GridError> {
        self.grid.remove_organism(x, y)
    }

    /// Drops an item onto the cell's stack and returns its handle.
    ///
    /// # Errors
    ///
    /// `OutOfBounds` per the grid contract.
    pub fn push_item(&mut self, item: Item, x: i32, y: i32) -> Result<ItemId, GridError> {
        let id = self.items.insert(item);
        self.grid.push_item(id, x, y)?;
        Ok(id)
    }

    /// Removes and returns the top item of the cell's stack.
    ///
    /// # Errors
    ///
    /// `OutOfBounds` or `EmptyCell` per the grid contract.
    pub fn pop_item(&mut self, x: i32, y: i32) -> Result<Item, GridError> {
        let id = self.grid.pop_item(x, y)?;
        self.items
            .remove(id)
            .ok_or(GridError::EmptyCell { x, y })
    }

    /// Textual dump of the floor's terrain for diagnostics and golden-file
    /// tests.
    #[must_use]
    pub fn render(&self) -> String {
        self.grid.render()
    }
}

/// Runs the automatic portion of a round: every monster ahead of the player
/// in the initiative order takes its turn, then control returns so the
/// caller can wait for player input. Calling this while the player is
/// already at the head is a no-op.
///
/// # Errors
///
/// Propagates grid contract violations, which indicate a kernel bug rather
/// than a recoverable state.
pub fn advance_round<B: Brain>(
    level: &mut Level,
    brain: &mut B,
    rng: &mut dyn RngCore,
    los: LineOfSight<'_>,
) -> Result<RoundOutcome, GridError> {
    loop {
        if !query::player_alive(level) {
            return Ok(RoundOutcome::PlayerDied);
        }
        let Some(head) = level.scheduler.head() else {
            return Ok(RoundOutcome::PlayerDied);
        };
        if Some(head) == level.player {
            return Ok(RoundOutcome::AwaitingInput);
        }

        if combat::tick_poison(level, head)? {
            // The poison killed the head; death handling already removed it
            // from the order.
            continue;
        }

        let action = brain.choose(level, head, rng, los);
        resolve_npc_action(level, head, action, rng, los)?;

        if level.scheduler.head() == Some(head) {
            level.scheduler.end_turn(&mut level.actors);
        }
    }
}

/// Resolves one atomic player action submitted for a single input event.
/// Turn-consuming actions tick the player's poison and re-sort the
/// initiative order before returning.
///
/// # Errors
///
/// Propagates grid contract violations, which indicate a kernel bug rather
/// than a recoverable state.
pub fn resolve_player_action(
    level: &mut Level,
    action: PlayerAction,
    rng: &mut dyn RngCore,
    los: LineOfSight<'_>,
) -> Result<TurnOutcome, GridError> {
    let Some(player) = level.player else {
        return Ok(TurnOutcome::Ignored);
    };
    if !query::player_alive(level) {
        return Ok(TurnOutcome::PlayerDied);
    }
    let Some(position) = level.actors.get(player).map(|org| org.position()) else {
        return Ok(TurnOutcome::PlayerDied);
    };

    match action {
        PlayerAction::Move { dx, dy } => {
            let destination = position.translate(dx, dy);
            let outcome = match level.grid.organism_at(destination.x(), destination.y()) {
                Some(victim) if victim != player => {
                    if combat::attempt_attack(level, player, victim, rng, los)? {
                        TurnOutcome::Acted
                    } else {
                        TurnOutcome::Blocked
                    }
                }
                _ => {
                    if try_step(level, player, dx, dy)? {
                        TurnOutcome::Acted
                    } else {
                        TurnOutcome::Blocked
                    }
                }
            };
            finish_player_turn(level, outcome)
        }
        PlayerAction::AttackAt(target_cell) => {
            match level.grid.organism_at(target_cell.x(), target_cell.y()) {
                Some(victim) if victim != player => {
                    if combat::attempt_attack(level, player, victim, rng, los)? {
                        finish_player_turn(level, TurnOutcome::Acted)
                    } else {
                        Ok(TurnOutcome::Ignored)
                    }
                }
                _ => Ok(TurnOutcome::Ignored),
            }
        }
        PlayerAction::Interact => {
            if level.grid.item_at(position.x(), position.y()).is_some() {
                let item = level.pop_item(position.x(), position.y())?;
                consume(level, player, item);
            }
            finish_player_turn(level, TurnOutcome::Acted)
        }
        PlayerAction::UseStairs => {
            if position == level.upstairs {
                if let Some(org) = level.actors.get(player) {
                    return Ok(TurnOutcome::Descended(FloorHandoff {
                        floor: level.floor - 1,
                        stats: org.stats().clone(),
                        power: org.power(),
                        poison_damage_per_turn: org.poison_damage_per_turn(),
                        poison_duration: org.poison_duration(),
                    }));
                }
            }
            Ok(TurnOutcome::Ignored)
        }
        PlayerAction::Wait => finish_player_turn(level, TurnOutcome::Acted),
    }
}

fn finish_player_turn(level: &mut Level, outcome: TurnOutcome) -> Result<TurnOutcome, GridError> {
    let Some(player) = level.player else {
        return Ok(outcome);
    };
    if combat::tick_poison(level, player)? {
        return Ok(TurnOutcome::PlayerDied);
    }
    level.scheduler.end_turn(&mut level.actors);
    Ok(outcome)
}

fn consume(level: &mut Level, player: ActorId, item: Item) {
    let Item::Corpse {
        power,
        health_bonus,
    } = item;
    if let Some(org) = level.actors.get_mut(player) {
        let health = org.stats().health();
        org.stats_mut().set_health(health + health_bonus);
        org.set_power(power);
    }
}

fn resolve_npc_action(
    level: &mut Level,
    actor: ActorId,
    action: Action,
    rng: &mut dyn RngCore,
    los: LineOfSight<'_>,
) -> Result<(), GridError> {
    match action {
        Action::Wait => Ok(()),
        Action::Move { dx, dy } => {
            let _ = try_step(level, actor, dx, dy)?;
            Ok(())
        }
        Action::MoveToward(target) => {
            let _ = step_toward(level, actor, target)?;
            Ok(())
        }
        Action::Attack(target) => {
            let attacked = combat::attempt_attack(level, actor, target, rng, los)?;
            if !attacked {
                // Out of reach after all; close the distance instead.
                if let Some(target_position) =
                    level.actors.get(target).map(|org| org.position())
                {
                    let _ = step_toward(level, actor, target_position)?;
                }
            }
            Ok(())
        }
    }
}

fn try_step(level: &mut Level, actor: ActorId, dx: i32, dy: i32) -> Result<bool, GridError> {
    let Some(from) = level.actors.get(actor).map(|org| org.position()) else {
        return Ok(false);
    };
    let destination = from.translate(dx, dy);
    if !level.grid.is_open(destination.x(), destination.y()) {
        return Ok(false);
    }
    relocate(level, actor, destination)?;
    Ok(true)
}

fn step_toward(level: &mut Level, actor: ActorId, target: Point) -> Result<bool, GridError> {
    let Some(from) = level.actors.get(actor).map(|org| org.position()) else {
        return Ok(false);
    };
    let (dx, dy) = from.delta_toward(target);
    try_step(level, actor, dx, dy)
}

pub(crate) fn relocate(
    level: &mut Level,
    actor: ActorId,
    destination: Point,
) -> Result<(), GridError> {
    let Some(from) = level.actors.get(actor).map(|org| org.position()) else {
        return Ok(());
    };
    let id = level.grid.remove_organism(from.x(), from.y())?;
    level.grid.place_organism(id, destination.x(), destination.y())?;
    if let Some(org) = level.actors.get_mut(actor) {
        org.set_position(destination);
    }
    Ok(())
}

/// Query functions providing read-only access to a level.
pub mod query {
    use super::{ActorId, Item, ItemId, Level, LineOfSight, Organism, Point};
    use deepdelve_core::Tile;

    /// Tile at the coordinate; [`Tile::None`] exactly when out of bounds.
    #[must_use]
    pub fn tile(level: &Level, x: i32, y: i32) -> Tile {
        level.grid.tile(x, y)
    }

    /// Reports whether the coordinate lies within the floor's extents.
    #[must_use]
    pub fn in_bounds(level: &Level, x: i32, y: i32) -> bool {
        level.grid.in_bounds(x, y)
    }

    /// Reports whether the cell is walkable and unoccupied.
    #[must_use]
    pub fn is_open(level: &Level, x: i32, y: i32) -> bool {
        level.grid.is_open(x, y)
    }

    /// Organism occupying the cell, if any.
    #[must_use]
    pub fn organism_at(level: &Level, x: i32, y: i32) -> Option<ActorId> {
        level.grid.organism_at(x, y)
    }

    /// Top item of the cell's stack, if any.
    #[must_use]
    pub fn item_at(level: &Level, x: i32, y: i32) -> Option<ItemId> {
        level.grid.item_at(x, y)
    }

    /// Item record behind a handle, if it still exists.
    #[must_use]
    pub fn item(level: &Level, id: ItemId) -> Option<&Item> {
        level.items.get(id)
    }

    /// Floor dimensions expressed as a point.
    #[must_use]
    pub fn grid_size(level: &Level) -> Point {
        level.grid.size()
    }

    /// Index of the floor this level represents.
    #[must_use]
    pub fn floor(level: &Level) -> i32 {
        level.floor
    }

    /// Cell the player entered the floor at.
    #[must_use]
    pub fn entry(level: &Level) -> Point {
        level.entry
    }

    /// Location of the upstairs tile.
    #[must_use]
    pub fn upstairs(level: &Level) -> Point {
        level.upstairs
    }

    /// Location of the downstairs tile (the entry cell).
    #[must_use]
    pub fn downstairs(level: &Level) -> Point {
        level.downstairs
    }

    /// Handle of the player, when one has been spawned.
    #[must_use]
    pub fn player_id(level: &Level) -> Option<ActorId> {
        level.player
    }

    /// Reports whether the player exists and still lives.
    #[must_use]
    pub fn player_alive(level: &Level) -> bool {
        level
            .player
            .and_then(|id| level.actors.get(id))
            .is_some_and(|org| org.stats().is_alive())
    }

    /// Cell the player currently occupies.
    #[must_use]
    pub fn player_position(level: &Level) -> Option<Point> {
        level
            .player
            .and_then(|id| level.actors.get(id))
            .map(Organism::position)
    }

    /// Organism record behind a handle, if it still lives.
    #[must_use]
    pub fn actor(level: &Level, id: ActorId) -> Option<&Organism> {
        level.actors.get(id)
    }

    /// Iterator over every live organism and its handle.
    pub fn actors(level: &Level) -> impl Iterator<Item = (ActorId, &Organism)> {
        level.actors.iter()
    }

    /// Number of live organisms on the floor.
    #[must_use]
    pub fn actor_count(level: &Level) -> usize {
        level.actors.live_count()
    }

    /// Current initiative order, soonest-to-act first.
    #[must_use]
    pub fn initiative(level: &Level) -> &[ActorId] {
        level.scheduler.order()
    }

    /// Reports whether the viewer can see the target point: the point must
    /// lie within the viewer's view distance and the supplied line-of-sight
    /// predicate must agree.
    #[must_use]
    pub fn is_visible(
        level: &Level,
        viewer: ActorId,
        target: Point,
        los: LineOfSight<'_>,
    ) -> bool {
        let Some(org) = level.actors.get(viewer) else {
            return false;
        };
        let from = org.position();
        if from.distance(target) > f64::from(org.stats().view_dist) {
            return false;
        }
        los(from, target)
    }

    /// Textual dump of the floor's terrain.
    #[must_use]
    pub fn render(level: &Level) -> String {
        level.grid.render()
    }
}
