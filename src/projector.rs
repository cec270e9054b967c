//! Derives the displayed state from the base state and the pending queue.

use crate::model::Reducer;
use crate::queue::ActionQueue;

/// Fold `base` through every pending payload in submission order.
pub fn project<R: Reducer>(
    reducer: &R,
    base: &R::State,
    queue: &ActionQueue<R::Payload>,
) -> R::State {
    queue.iter().fold(base.clone(), |state, entry| {
        reducer.reduce(state, entry.action.payload())
    })
}

/// Memoized projection.
///
/// Invalidated eagerly whenever the base state or the queue changes and
/// rebuilt lazily on the next read.
#[derive(Debug)]
pub struct Projector<S> {
    cache: Option<S>,
}

impl<S> Default for Projector<S> {
    fn default() -> Self {
        Self { cache: None }
    }
}

impl<S> Projector<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn invalidate(&mut self) {
        self.cache = None;
    }

    pub fn get<R>(&mut self, reducer: &R, base: &S, queue: &ActionQueue<R::Payload>) -> &S
    where
        R: Reducer<State = S>,
    {
        self.cache
            .get_or_insert_with(|| project(reducer, base, queue))
    }
}
