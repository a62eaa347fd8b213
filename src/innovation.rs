//! Innovation id allocation and the added-node history buffer.
//!
//! Node and genome ids are minted from shared atomic sequences. The
//! added-node buffer remembers which node id resulted from splitting a
//! given connection, so that the same structural mutation occurring in two
//! genomes of a run yields the same node id and the genomes remain
//! structurally comparable. The buffer is a bounded cache, not a ledger:
//! entries evicted by newer registrations simply cause a fresh id to be
//! minted on the next occurrence.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

/// A shared monotonic id sequence.
#[derive(Debug)]
pub struct IdSequence {
    next: AtomicU32,
}

impl IdSequence {
    /// Create a sequence whose first issued id is `start`.
    #[must_use]
    pub fn new(start: u32) -> Self {
        Self {
            next: AtomicU32::new(start),
        }
    }

    /// Issue the next id.
    #[must_use]
    pub fn next_id(&self) -> u32 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// The id the next call to [`Self::next_id`] will issue.
    #[must_use]
    pub fn peek(&self) -> u32 {
        self.next.load(Ordering::Relaxed)
    }

    /// Reposition the sequence so the next issued id is `next`, e.g. when
    /// restoring state from a checkpoint.
    pub fn set_next(&self, next: u32) {
        self.next.store(next, Ordering::Relaxed);
    }
}

/// A bounded history of added nodes, keyed by the connection that was
/// split to create them.
///
/// Fixed-capacity ring of (connection, node id) entries plus a key → slot
/// index; both are updated together on insert, and eviction overwrites the
/// oldest slot while dropping its key from the index.
#[derive(Debug)]
pub struct AddedNodeBuffer {
    slots: Vec<Option<((u32, u32), u32)>>,
    index: HashMap<(u32, u32), usize>,
    oldest_slot: usize,
}

impl AddedNodeBuffer {
    /// Create a buffer that retains at most `capacity` entries.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "buffer capacity must be >= 1");
        Self {
            slots: vec![None; capacity],
            index: HashMap::with_capacity(capacity),
            oldest_slot: 0,
        }
    }

    /// The maximum number of entries retained.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Record that splitting `connection` produced `node_id`.
    ///
    /// A repeat registration for the same connection overwrites the
    /// previous mapping in place; otherwise the oldest entry is evicted if
    /// the buffer is full.
    pub fn register(&mut self, connection: (u32, u32), node_id: u32) {
        if let Some(&slot) = self.index.get(&connection) {
            self.slots[slot] = Some((connection, node_id));
            return;
        }

        if let Some((old_key, _)) = self.slots[self.oldest_slot] {
            self.index.remove(&old_key);
        }
        self.slots[self.oldest_slot] = Some((connection, node_id));
        self.index.insert(connection, self.oldest_slot);
        self.oldest_slot = (self.oldest_slot + 1) % self.slots.len();
    }

    /// The node id most recently registered for `connection`, if still
    /// resident.
    #[must_use]
    pub fn try_lookup(&self, connection: (u32, u32)) -> Option<u32> {
        self.index
            .get(&connection)
            .and_then(|&slot| self.slots[slot])
            .map(|(_, node_id)| node_id)
    }
}
