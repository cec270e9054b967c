//! Reconciliation core: owns the base state and the pending queue.
//!
//! Every mutation (enqueue, settle, reset) runs as one atomic step under a
//! re-entrant lock, followed by notification of subscribers while the lock
//! is still held. Two mutations never interleave, and subscribers observe
//! projected states in the order the mutations happened.
//!
//! Subscriber callbacks may call back into the core from the same thread.
//! Notifications produced by such nested calls are queued and delivered
//! after the current one, so ordering is preserved.
//!
//! The lock is `parking_lot`'s and does not poison: a panicking reducer or
//! subscriber propagates to the caller of the mutation that triggered it,
//! and the core stays usable afterwards. Change detection compares against
//! the projection subscribers last saw, so an entry whose reduction panics
//! can still be settled or reset away.

mod state;
mod stats;

pub use state::Settlement;
pub use stats::StoreStats;

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::{Mutex, ReentrantMutex};
use tokio::sync::watch;

use crate::executor::Outcome;
use crate::model::Reducer;
use crate::queue::{Action, ActionId, EntryStatus, Generation, QueuePhase};
use crate::subscription::{Listener, SubscriberSet, Unsubscribe};

use state::CoreState;

struct CoreCell<R: Reducer> {
    state: RefCell<CoreState<R>>,
    /// Projection subscribers last saw. `None` while nobody listens.
    published: RefCell<Option<R::State>>,
    outbox: RefCell<VecDeque<R::State>>,
    publishing: Cell<bool>,
}

/// Thread-safe owner of the confirmed state and the optimistic queue.
///
/// Usable on its own by synchronous callers that drive settlement
/// themselves; [`OptimisticStore`](crate::store::OptimisticStore) pairs it
/// with an executor.
pub struct ReconciliationCore<R: Reducer> {
    cell: ReentrantMutex<CoreCell<R>>,
    subscribers: Arc<Mutex<SubscriberSet<R::State>>>,
}

impl<R: Reducer> ReconciliationCore<R> {
    pub fn new(reducer: R, base: R::State) -> Self {
        Self {
            cell: ReentrantMutex::new(CoreCell {
                state: RefCell::new(CoreState::new(reducer, base)),
                published: RefCell::new(None),
                outbox: RefCell::new(VecDeque::new()),
                publishing: Cell::new(false),
            }),
            subscribers: Arc::new(Mutex::new(SubscriberSet::new())),
        }
    }

    /// Append an action for `payload`. The speculative state is visible to
    /// subscribers before this returns.
    pub fn enqueue(&self, payload: R::Payload) -> Action<R::Payload> {
        self.mutate(|state| state.enqueue(payload))
    }

    /// Mark an action's operation as started.
    ///
    /// Returns false if the action was discarded by a reset or has already
    /// settled; its operation must then not run.
    pub fn begin(&self, id: ActionId, generation: Generation) -> bool {
        let guard = self.cell.lock();
        let started = guard.state.borrow_mut().begin(id, generation);
        started
    }

    /// Deliver the terminal outcome of an action.
    ///
    /// Success confirms the output into the base state; failure only drops
    /// the entry. Either way sibling entries stay pending in their original
    /// order. Settling a stale or already-settled action changes nothing and
    /// emits no notification.
    pub fn settle(
        &self,
        id: ActionId,
        generation: Generation,
        outcome: Outcome<R::Output>,
    ) -> Settlement<R::Output> {
        self.mutate(|state| state.settle(id, generation, outcome))
    }

    /// Drop every pending action and advance the generation so their
    /// eventual settles are ignored. Returns how many entries were dropped.
    pub fn reset(&self) -> usize {
        self.mutate(|state| state.reset())
    }

    /// Base state folded with every pending payload in submission order.
    pub fn projected_state(&self) -> R::State {
        let guard = self.cell.lock();
        let projected = guard.state.borrow_mut().projected().clone();
        projected
    }

    /// Last confirmed state.
    pub fn base_state(&self) -> R::State {
        let guard = self.cell.lock();
        let base = guard.state.borrow().base().clone();
        base
    }

    pub fn phase(&self) -> QueuePhase {
        let guard = self.cell.lock();
        let phase = guard.state.borrow().queue().phase();
        phase
    }

    pub fn is_pending(&self) -> bool {
        self.phase() == QueuePhase::Pending
    }

    pub fn generation(&self) -> Generation {
        let guard = self.cell.lock();
        let generation = guard.state.borrow().queue().generation();
        generation
    }

    /// Whether an action tagged with `generation` can still settle.
    pub fn is_current(&self, generation: Generation) -> bool {
        self.generation() == generation
    }

    /// Ids and statuses of pending actions, in submission order.
    pub fn pending_actions(&self) -> Vec<(ActionId, EntryStatus)> {
        let guard = self.cell.lock();
        let state = guard.state.borrow();
        state
            .queue()
            .iter()
            .map(|entry| (entry.action.id(), entry.status))
            .collect()
    }

    pub fn stats(&self) -> StoreStats {
        let guard = self.cell.lock();
        let stats = guard.state.borrow().stats();
        stats
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Register `callback` to receive the projected state after every
    /// mutation that changes it.
    pub fn subscribe<F>(&self, callback: F) -> Unsubscribe
    where
        F: Fn(&R::State) + Send + Sync + 'static,
    {
        let guard = self.cell.lock();
        Self::track(&guard);
        let id = self
            .subscribers
            .lock()
            .add(Listener::Callback(Arc::new(callback)));
        Unsubscribe::new(&self.subscribers, id)
    }

    /// Watch channel seeded with the current projected state.
    pub fn watch(&self) -> watch::Receiver<R::State> {
        let guard = self.cell.lock();
        let current = Self::track(&guard);
        let (sender, receiver) = watch::channel(current);
        self.subscribers
            .lock()
            .add(Listener::Watch(Arc::new(sender)));
        receiver
    }

    /// Start tracking what listeners have seen, if nobody was listening yet.
    fn track(cell: &CoreCell<R>) -> R::State {
        let current = cell.state.borrow_mut().projected().clone();
        cell.published
            .borrow_mut()
            .get_or_insert_with(|| current.clone());
        current
    }

    fn mutate<T>(&self, apply: impl FnOnce(&mut CoreState<R>) -> T) -> T {
        let guard = self.cell.lock();
        let listening = !self.subscribers.lock().is_empty();

        let (result, changed) = {
            let mut state = guard.state.borrow_mut();
            let result = apply(&mut state);
            let changed = if listening {
                let after = state.projected();
                let mut published = guard.published.borrow_mut();
                if published.as_ref() == Some(after) {
                    None
                } else {
                    *published = Some(after.clone());
                    Some(after.clone())
                }
            } else {
                guard.published.replace(None);
                None
            };
            (result, changed)
        };

        if let Some(projected) = changed {
            self.publish(&guard, projected);
        }
        result
    }

    fn publish(&self, cell: &CoreCell<R>, projected: R::State) {
        cell.outbox.borrow_mut().push_back(projected);
        if cell.publishing.replace(true) {
            // An outer publish on this thread delivers it after the current state.
            return;
        }

        let _done = scopeguard::guard((), |_| {
            cell.publishing.set(false);
            cell.outbox.borrow_mut().clear();
        });

        loop {
            let next = cell.outbox.borrow_mut().pop_front();
            let Some(state) = next else {
                break;
            };
            let listeners = self.subscribers.lock().snapshot();
            for listener in &listeners {
                listener.deliver(&state);
            }
        }
    }
}
