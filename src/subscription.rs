//! Observer registry for projected-state changes.
//!
//! Two kinds of listeners are supported: plain callbacks and Tokio watch
//! channels. Watch listeners whose receivers have all been dropped are
//! pruned on the next notification.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::watch;

pub type Callback<S> = Arc<dyn Fn(&S) + Send + Sync>;

pub(crate) enum Listener<S> {
    Callback(Callback<S>),
    Watch(Arc<watch::Sender<S>>),
}

impl<S: Clone> Listener<S> {
    pub(crate) fn deliver(&self, state: &S) {
        match self {
            Listener::Callback(callback) => callback(state),
            Listener::Watch(sender) => {
                sender.send_replace(state.clone());
            }
        }
    }

    fn is_closed(&self) -> bool {
        match self {
            Listener::Callback(_) => false,
            Listener::Watch(sender) => sender.is_closed(),
        }
    }
}

impl<S> Clone for Listener<S> {
    fn clone(&self) -> Self {
        match self {
            Listener::Callback(callback) => Listener::Callback(Arc::clone(callback)),
            Listener::Watch(sender) => Listener::Watch(Arc::clone(sender)),
        }
    }
}

pub(crate) struct SubscriberSet<S> {
    next_id: u64,
    listeners: Vec<(u64, Listener<S>)>,
}

impl<S: Clone> SubscriberSet<S> {
    pub(crate) fn new() -> Self {
        Self {
            next_id: 0,
            listeners: Vec::new(),
        }
    }

    pub(crate) fn add(&mut self, listener: Listener<S>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.listeners.push((id, listener));
        id
    }

    pub(crate) fn remove(&mut self, id: u64) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Listeners to notify, in registration order. Callers deliver outside
    /// the lock so that callbacks may subscribe or unsubscribe.
    pub(crate) fn snapshot(&mut self) -> Vec<Listener<S>> {
        self.listeners.retain(|(_, listener)| !listener.is_closed());
        self.listeners
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect()
    }
}

/// Removes a subscription when invoked. Dropping it without calling
/// [`Unsubscribe::unsubscribe`] leaves the subscription active.
pub struct Unsubscribe {
    remove: Box<dyn FnOnce() -> bool + Send + Sync>,
}

impl Unsubscribe {
    pub(crate) fn new<S>(set: &Arc<Mutex<SubscriberSet<S>>>, id: u64) -> Self
    where
        S: Clone + Send + Sync + 'static,
    {
        let set: Weak<Mutex<SubscriberSet<S>>> = Arc::downgrade(set);
        Self {
            remove: Box::new(move || match set.upgrade() {
                Some(set) => set.lock().remove(id),
                None => false,
            }),
        }
    }

    /// Stop receiving notifications. Returns false if the subscription was
    /// already gone.
    pub fn unsubscribe(self) -> bool {
        (self.remove)()
    }
}
