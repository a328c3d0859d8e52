//! Live organism records and their slot storage.

use deepdelve_core::{ActorId, ActorKind, Point, Power, Stats};

/// A live organism on the current floor: the player or a monster.
#[derive(Clone, Debug)]
pub struct Organism {
    kind: ActorKind,
    position: Point,
    stats: Stats,
    power: Power,
    poison_damage_per_turn: i32,
    poison_duration: i32,
}

impl Organism {
    /// Creates a new organism record at the provided position.
    #[must_use]
    pub fn new(kind: ActorKind, position: Point, stats: Stats, power: Power) -> Self {
        Self {
            kind,
            position,
            stats,
            power,
            poison_damage_per_turn: 0,
            poison_duration: 0,
        }
    }

    /// Whether the organism is the player or a monster.
    #[must_use]
    pub const fn kind(&self) -> ActorKind {
        self.kind
    }

    /// Cell the organism currently occupies.
    #[must_use]
    pub const fn position(&self) -> Point {
        self.position
    }

    pub(crate) fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    /// Stat block of the organism.
    #[must_use]
    pub const fn stats(&self) -> &Stats {
        &self.stats
    }

    pub(crate) fn stats_mut(&mut self) -> &mut Stats {
        &mut self.stats
    }

    pub(crate) fn replace_stats(&mut self, stats: Stats) {
        self.stats = stats;
    }

    /// Power the organism attacks with.
    #[must_use]
    pub const fn power(&self) -> Power {
        self.power
    }

    pub(crate) fn set_power(&mut self, power: Power) {
        self.power = power;
    }

    /// Poison damage applied at the start of each of the organism's turns.
    #[must_use]
    pub const fn poison_damage_per_turn(&self) -> i32 {
        self.poison_damage_per_turn
    }

    /// Poisoned turns remaining.
    #[must_use]
    pub const fn poison_duration(&self) -> i32 {
        self.poison_duration
    }

    pub(crate) fn set_poison(&mut self, damage_per_turn: i32, duration: i32) {
        self.poison_damage_per_turn = damage_per_turn;
        self.poison_duration = duration;
    }

    pub(crate) fn tick_poison(&mut self) {
        if self.poison_duration > 0 {
            self.poison_duration -= 1;
            let health = self.stats.health();
            self.stats.set_health(health - self.poison_damage_per_turn);
        }
    }
}

/// Slot storage for organisms, indexed by [`ActorId`].
///
/// Removed organisms leave a vacant slot; handles are never reused within a
/// floor, so a stale id simply resolves to nothing.
#[derive(Clone, Debug, Default)]
pub(crate) struct ActorArena {
    slots: Vec<Option<Organism>>,
}

impl ActorArena {
    pub(crate) fn insert(&mut self, organism: Organism) -> ActorId {
        let id = ActorId::new(self.slots.len() as u32);
        self.slots.push(Some(organism));
        id
    }

    pub(crate) fn get(&self, id: ActorId) -> Option<&Organism> {
        self.slots.get(id.get() as usize).and_then(Option::as_ref)
    }

    pub(crate) fn get_mut(&mut self, id: ActorId) -> Option<&mut Organism> {
        self.slots
            .get_mut(id.get() as usize)
            .and_then(Option::as_mut)
    }

    pub(crate) fn remove(&mut self, id: ActorId) -> Option<Organism> {
        self.slots.get_mut(id.get() as usize).and_then(Option::take)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (ActorId, &Organism)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|org| (ActorId::new(index as u32), org)))
    }

    pub(crate) fn live_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }
}
