//! Bookkeeping behind the reconciliation core.
//!
//! Pure state transitions: no locking, no notification. Every method that
//! touches the base state or the queue invalidates the projection.

use crate::executor::Outcome;
use crate::model::Reducer;
use crate::projector::Projector;
use crate::queue::{Action, ActionId, ActionQueue, Generation, RemoveMiss};

use super::stats::StoreStats;

/// Result of delivering an outcome to the core. The outcome is handed back
/// so the executor can resolve the dispatcher's handle with it.
#[derive(Debug)]
pub enum Settlement<O> {
    /// The entry was removed; on success its output was confirmed into the base state.
    Applied(Outcome<O>),
    /// The action belongs to a generation discarded by a reset. Nothing changed.
    Stale(Outcome<O>),
    /// No pending entry had this id, usually because it already settled. Nothing changed.
    Unknown(Outcome<O>),
}

impl<O> Settlement<O> {
    pub fn is_applied(&self) -> bool {
        matches!(self, Settlement::Applied(_))
    }

    pub fn into_outcome(self) -> Outcome<O> {
        match self {
            Settlement::Applied(outcome)
            | Settlement::Stale(outcome)
            | Settlement::Unknown(outcome) => outcome,
        }
    }
}

pub(crate) struct CoreState<R: Reducer> {
    reducer: R,
    base: R::State,
    queue: ActionQueue<R::Payload>,
    projector: Projector<R::State>,
    stats: StoreStats,
}

impl<R: Reducer> CoreState<R> {
    pub(crate) fn new(reducer: R, base: R::State) -> Self {
        Self {
            reducer,
            base,
            queue: ActionQueue::new(),
            projector: Projector::new(),
            stats: StoreStats::default(),
        }
    }

    pub(crate) fn enqueue(&mut self, payload: R::Payload) -> Action<R::Payload> {
        let action = self.queue.enqueue(payload).clone();
        self.projector.invalidate();
        self.stats.dispatched += 1;

        tracing::debug!(
            action_id = %action.id(),
            generation = %action.generation(),
            pending = self.queue.len(),
            "Action enqueued"
        );
        action
    }

    pub(crate) fn begin(&mut self, id: ActionId, generation: Generation) -> bool {
        self.queue.mark_in_flight(id, generation)
    }

    pub(crate) fn settle(
        &mut self,
        id: ActionId,
        generation: Generation,
        outcome: Outcome<R::Output>,
    ) -> Settlement<R::Output> {
        let entry = match self.queue.remove(id, generation) {
            Ok(entry) => entry,
            Err(RemoveMiss::Stale) => {
                self.stats.stale += 1;
                tracing::trace!(
                    action_id = %id,
                    generation = %generation,
                    current = %self.queue.generation(),
                    "Stale settle ignored"
                );
                return Settlement::Stale(outcome);
            }
            Err(RemoveMiss::Unknown) => {
                tracing::trace!(action_id = %id, "Settle for unknown action ignored");
                return Settlement::Unknown(outcome);
            }
        };

        // Invalidate before confirming: the entry is gone even if `confirm` panics.
        self.projector.invalidate();

        match &outcome {
            Outcome::Success(output) => {
                let base = self.base.clone();
                self.base = self
                    .reducer
                    .confirm(base, entry.action.payload(), output);
                self.stats.confirmed += 1;
                tracing::debug!(
                    action_id = %id,
                    pending = self.queue.len(),
                    "Action confirmed"
                );
            }
            Outcome::Failure(err) => {
                self.stats.failed += 1;
                tracing::warn!(
                    action_id = %id,
                    pending = self.queue.len(),
                    error = %err,
                    "Action failed, speculative effect rolled back"
                );
            }
        }

        Settlement::Applied(outcome)
    }

    pub(crate) fn reset(&mut self) -> usize {
        let dropped = self.queue.reset();
        self.projector.invalidate();
        self.stats.resets += 1;
        self.stats.discarded += dropped as u64;

        tracing::info!(
            dropped,
            generation = %self.queue.generation(),
            "Pending actions reset"
        );
        dropped
    }

    pub(crate) fn projected(&mut self) -> &R::State {
        self.projector.get(&self.reducer, &self.base, &self.queue)
    }

    pub(crate) fn base(&self) -> &R::State {
        &self.base
    }

    pub(crate) fn queue(&self) -> &ActionQueue<R::Payload> {
        &self.queue
    }

    pub(crate) fn stats(&self) -> StoreStats {
        self.stats
    }
}
