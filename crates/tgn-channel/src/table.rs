//! Index maps and the per-channel link table.

use tgn_model::SubcarrierLayout;

use crate::{LinkKey, LinkSlot};

#[cfg(feature = "fx-hash")]
pub(crate) type FastMap<K, V> = rustc_hash::FxHashMap<K, V>;
#[cfg(not(feature = "fx-hash"))]
pub(crate) type FastMap<K, V> = std::collections::HashMap<K, V>;

#[cfg(feature = "fx-hash")]
pub(crate) type FastSet<T> = rustc_hash::FxHashSet<T>;
#[cfg(not(feature = "fx-hash"))]
pub(crate) type FastSet<T> = std::collections::HashSet<T>;

/// Links of one channel: a slab of slots plus a key → slot index.
///
/// Slots are never removed, so an index handed out by [`LinkTable::slot_for`]
/// stays valid for the table's lifetime.
#[derive(Debug, Default)]
pub struct LinkTable {
    index: FastMap<LinkKey, usize>,
    slots: Vec<LinkSlot>,
}

impl LinkTable {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, key: &LinkKey) -> Option<&LinkSlot> {
        self.index.get(key).map(|&i| &self.slots[i])
    }

    /// Slot index for `key`, inserting an `Uninitialized` placeholder if the
    /// link is new.  The flag is `true` when a placeholder was inserted.
    pub fn slot_for(&mut self, key: LinkKey) -> (usize, bool) {
        if let Some(&i) = self.index.get(&key) {
            return (i, false);
        }
        let i = self.slots.len();
        self.slots.push(LinkSlot::Uninitialized);
        self.index.insert(key, i);
        (i, true)
    }

    #[inline]
    pub fn slot_mut(&mut self, index: usize) -> &mut LinkSlot {
        &mut self.slots[index]
    }

    pub(crate) fn slots_ptr(&mut self) -> *mut LinkSlot {
        self.slots.as_mut_ptr()
    }
}

/// One configured RF channel.
#[derive(Debug)]
pub struct ChannelData {
    pub layout: SubcarrierLayout,
    pub seed:   u64,
    pub links:  LinkTable,
}

impl ChannelData {
    pub fn new(layout: SubcarrierLayout, seed: u64) -> Self {
        Self { layout, seed, links: LinkTable::default() }
    }
}

