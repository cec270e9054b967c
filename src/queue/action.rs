use std::fmt;

use serde::Serialize;

/// Sequence number of a dispatched action, strictly increasing per queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ActionId(u64);

impl ActionId {
    pub const FIRST: ActionId = ActionId(1);

    pub fn get(self) -> u64 {
        self.0
    }

    pub(crate) fn next(self) -> ActionId {
        ActionId(self.0.saturating_add(1))
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Queue epoch. Bumped by every reset so that callbacks captured earlier
/// can be recognized as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct Generation(u64);

impl Generation {
    pub fn get(self) -> u64 {
        self.0
    }

    pub(crate) fn next(self) -> Generation {
        Generation(self.0.wrapping_add(1))
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

/// An immutable record of a dispatched payload.
#[derive(Debug, Clone)]
pub struct Action<P> {
    id: ActionId,
    generation: Generation,
    payload: P,
}

impl<P> Action<P> {
    pub(crate) fn new(id: ActionId, generation: Generation, payload: P) -> Self {
        Self {
            id,
            generation,
            payload,
        }
    }

    pub fn id(&self) -> ActionId {
        self.id
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }
}
