//! Arrival-ordered pending queue
//!
//! Each message reserves a slot when it arrives. Slots are filled as their
//! messages resolve, in any order, and only a resolved prefix is released.

use std::collections::BTreeMap;

/// Arrival index of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotIndex(u64);

impl SlotIndex {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

#[derive(Debug)]
enum Slot<T> {
    Pending,
    Ready(T),
}

#[derive(Debug)]
pub struct MessageQueue<T> {
    next_index: u64,
    slots: BTreeMap<u64, Slot<T>>,
}

impl<T> Default for MessageQueue<T> {
    fn default() -> Self {
        Self {
            next_index: 0,
            slots: BTreeMap::new(),
        }
    }
}

impl<T> MessageQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the next slot in arrival order.
    pub fn reserve(&mut self) -> SlotIndex {
        let index = self.next_index;
        self.next_index += 1;
        self.slots.insert(index, Slot::Pending);
        SlotIndex(index)
    }

    /// Mark a reserved slot as resolved. Unknown slots are ignored.
    pub fn fill(&mut self, index: SlotIndex, value: T) {
        if let Some(slot) = self.slots.get_mut(&index.0) {
            *slot = Slot::Ready(value);
        }
    }

    /// Drop a slot whose message will never resolve.
    pub fn discard(&mut self, index: SlotIndex) {
        self.slots.remove(&index.0);
    }

    /// Release resolved values from the head until the first pending slot.
    pub fn drain_ready(&mut self) -> Vec<T> {
        let mut ready = Vec::new();
        while let Some(entry) = self.slots.first_entry() {
            if matches!(entry.get(), Slot::Pending) {
                break;
            }
            if let Slot::Ready(value) = entry.remove() {
                ready.push(value);
            }
        }
        ready
    }

    /// Slots reserved but not yet released.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
