//! Initiative ordering for the turn loop.

use deepdelve_core::ActorId;

use crate::actors::ActorArena;

/// Ordered initiative list, ascending by each actor's `time_till_turn`.
///
/// The player is inserted at the front at placement time; every other actor
/// is appended, establishing an arbitrary but stable initial order that the
/// re-sorting in [`TurnScheduler::end_turn`] refines as actors act.
#[derive(Clone, Debug, Default)]
pub struct TurnScheduler {
    order: Vec<ActorId>,
}

impl TurnScheduler {
    /// Creates an empty initiative order.
    #[must_use]
    pub const fn new() -> Self {
        Self { order: Vec::new() }
    }

    /// Actor currently scheduled to act, if any.
    #[must_use]
    pub fn head(&self) -> Option<ActorId> {
        self.order.first().copied()
    }

    /// Current initiative order, soonest-to-act first.
    #[must_use]
    pub fn order(&self) -> &[ActorId] {
        &self.order
    }

    /// Number of scheduled actors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Reports whether no actor is scheduled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Reports whether the actor is scheduled.
    #[must_use]
    pub fn contains(&self, id: ActorId) -> bool {
        self.order.contains(&id)
    }

    /// Inserts the player at the head of the order. Placement-time only.
    pub fn insert_at_front(&mut self, id: ActorId) {
        self.order.insert(0, id);
    }

    /// Appends an actor to the order. Placement-time only.
    pub fn append(&mut self, id: ActorId) {
        self.order.push(id);
    }

    /// Removes the actor from the order. Silently does nothing when the
    /// actor is absent; removal is idempotent.
    pub fn remove(&mut self, id: ActorId) {
        if let Some(index) = self.order.iter().position(|entry| *entry == id) {
            let _ = self.order.remove(index);
        }
    }

    /// Ends the head actor's turn: the time it waited elapses for everyone
    /// else, its countdown resets to its speed, and it re-enters the order at
    /// the sorted position, after any entries with an equal countdown.
    pub(crate) fn end_turn(&mut self, actors: &mut ActorArena) {
        let Some(head) = self.head() else {
            return;
        };
        let Some(elapsed) = actors.get(head).map(|org| org.stats().time_till_turn) else {
            // Head died without being unscheduled; drop the stale handle.
            let _ = self.order.remove(0);
            return;
        };

        for &other in self.order.iter().skip(1) {
            if let Some(org) = actors.get_mut(other) {
                org.stats_mut().time_till_turn -= elapsed;
            }
        }

        if let Some(org) = actors.get_mut(head) {
            let speed = org.stats().speed;
            org.stats_mut().time_till_turn = speed;
        }

        let _ = self.order.remove(0);
        let countdown = actors
            .get(head)
            .map_or(i32::MAX, |org| org.stats().time_till_turn);

        let mut index = match self
            .order
            .binary_search_by_key(&countdown, |id| key_of(actors, *id))
        {
            Ok(found) | Err(found) => found,
        };
        // Equal countdowns keep their slots; the actor that just acted files
        // in behind them.
        while index < self.order.len() && key_of(actors, self.order[index]) == countdown {
            index += 1;
        }
        self.order.insert(index, head);
    }
}

fn key_of(actors: &ActorArena, id: ActorId) -> i32 {
    actors.get(id).map_or(i32::MAX, |org| org.stats().time_till_turn)
}
