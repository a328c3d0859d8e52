//! Item records and their slot storage.

use deepdelve_core::{ItemId, Power};

/// An item lying on the floor.
#[derive(Clone, Debug, PartialEq)]
pub enum Item {
    /// Remains of a slain monster. Consuming it heals the eater and swaps
    /// their power for the one the monster wielded.
    Corpse {
        /// Power the corpse's former owner attacked with.
        power: Power,
        /// Health restored when the corpse is consumed.
        health_bonus: i32,
    },
}

/// Slot storage for items, indexed by [`ItemId`].
#[derive(Clone, Debug, Default)]
pub(crate) struct ItemArena {
    slots: Vec<Option<Item>>,
}

impl ItemArena {
    pub(crate) fn insert(&mut self, item: Item) -> ItemId {
        let id = ItemId::new(self.slots.len() as u32);
        self.slots.push(Some(item));
        id
    }

    pub(crate) fn get(&self, id: ItemId) -> Option<&Item> {
        self.slots.get(id.get() as usize).and_then(Option::as_ref)
    }

    pub(crate) fn remove(&mut self, id: ItemId) -> Option<Item> {
        self.slots.get_mut(id.get() as usize).and_then(Option::take)
    }
}
