use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::error::DispatchError;
use crate::queue::{ActionId, Generation};

/// Resolves with the eventual outcome of a dispatched action.
///
/// Dropping the handle does not cancel the action; the speculative state
/// stays visible until the action settles or the store is reset.
#[must_use = "dropping the handle discards the action's outcome"]
#[derive(Debug)]
pub struct DispatchHandle<O> {
    id: ActionId,
    generation: Generation,
    receiver: oneshot::Receiver<Result<O, DispatchError>>,
}

impl<O> DispatchHandle<O> {
    pub(crate) fn new(
        id: ActionId,
        generation: Generation,
        receiver: oneshot::Receiver<Result<O, DispatchError>>,
    ) -> Self {
        Self {
            id,
            generation,
            receiver,
        }
    }

    pub fn id(&self) -> ActionId {
        self.id
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }
}

impl<O> Future for DispatchHandle<O> {
    type Output = Result<O, DispatchError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let id = self.id;
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(DispatchError::Closed { id })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolves_with_sent_value() {
        let (sender, receiver) = oneshot::channel();
        let handle = DispatchHandle::new(ActionId::FIRST, Generation::default(), receiver);
        sender.send(Ok(7)).unwrap();
        assert_eq!(handle.await.unwrap(), 7);
    }

    #[tokio::test]
    async fn dropped_sender_resolves_closed() {
        let (sender, receiver) = oneshot::channel::<Result<(), DispatchError>>();
        let handle = DispatchHandle::new(ActionId::FIRST, Generation::default(), receiver);
        drop(sender);
        assert!(matches!(
            handle.await,
            Err(DispatchError::Closed { id }) if id == ActionId::FIRST
        ));
    }
}
