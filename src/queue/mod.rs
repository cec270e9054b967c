//! Ordered queue of not-yet-settled actions.
//!
//! Entries are kept in ascending [`ActionId`] order, which is also
//! submission order. Settling removes exactly one entry and never
//! reorders its siblings, whatever order completions arrive in.

mod action;

pub use action::{Action, ActionId, Generation};

use serde::Serialize;

/// Lifecycle of a pending entry. Settled entries are removed, so there is
/// no settled variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    /// Waiting for the executor to start its operation.
    Queued,
    /// Operation has started and not yet reported back.
    InFlight,
}

/// Coarse state of the queue, exposed to callers as `is_pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueuePhase {
    Idle,
    Pending,
}

#[derive(Debug, Clone)]
pub struct PendingEntry<P> {
    pub action: Action<P>,
    pub status: EntryStatus,
}

/// Why a removal request did not remove anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveMiss {
    /// The action belongs to a generation discarded by `reset`.
    Stale,
    /// No pending entry carries this id (already settled).
    Unknown,
}

#[derive(Debug)]
pub struct ActionQueue<P> {
    entries: Vec<PendingEntry<P>>,
    next_id: ActionId,
    generation: Generation,
}

impl<P> Default for ActionQueue<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> ActionQueue<P> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: ActionId::FIRST,
            generation: Generation::default(),
        }
    }

    /// Allocate the next id, tag it with the current generation and append.
    pub fn enqueue(&mut self, payload: P) -> &Action<P> {
        let id = self.next_id;
        self.next_id = id.next();
        self.entries.push(PendingEntry {
            action: Action::new(id, self.generation, payload),
            status: EntryStatus::Queued,
        });
        let index = self.entries.len() - 1;
        &self.entries[index].action
    }

    /// Mark an entry as started. Returns false when the action is stale or
    /// no longer pending, in which case its operation must not run.
    pub fn mark_in_flight(&mut self, id: ActionId, generation: Generation) -> bool {
        if generation != self.generation {
            return false;
        }
        match self.position(id) {
            Some(index) => {
                self.entries[index].status = EntryStatus::InFlight;
                true
            }
            None => false,
        }
    }

    /// Remove the entry for `id` if it belongs to the current generation.
    pub fn remove(
        &mut self,
        id: ActionId,
        generation: Generation,
    ) -> Result<PendingEntry<P>, RemoveMiss> {
        if generation != self.generation {
            return Err(RemoveMiss::Stale);
        }
        let index = self.position(id).ok_or(RemoveMiss::Unknown)?;
        Ok(self.entries.remove(index))
    }

    /// Drop every entry and advance the generation. Returns how many
    /// entries were discarded.
    pub fn reset(&mut self) -> usize {
        let dropped = self.entries.len();
        self.entries.clear();
        self.generation = self.generation.next();
        dropped
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        self.generation == generation
    }

    pub fn phase(&self) -> QueuePhase {
        if self.entries.is_empty() {
            QueuePhase::Idle
        } else {
            QueuePhase::Pending
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pending entries in submission order.
    pub fn iter(&self) -> impl Iterator<Item = &PendingEntry<P>> {
        self.entries.iter()
    }

    fn position(&self, id: ActionId) -> Option<usize> {
        self.entries
            .binary_search_by_key(&id, |entry| entry.action.id())
            .ok()
    }
}
