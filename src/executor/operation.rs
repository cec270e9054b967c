use std::future::Future;
use std::pin::Pin;

use crate::error::ExecutionError;

/// Boxed future returned by an [`Operation`].
pub type OperationFuture<O> = Pin<Box<dyn Future<Output = anyhow::Result<O>> + Send + 'static>>;

/// The side-effecting work behind an action, typically a request to a
/// server. Supplied by the transport layer.
///
/// Implemented for any `Fn(P) -> impl Future<Output = anyhow::Result<O>>`.
pub trait Operation<P, O>: Send + Sync + 'static {
    fn call(&self, payload: P) -> OperationFuture<O>;
}

impl<P, O, F, Fut> Operation<P, O> for F
where
    F: Fn(P) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<O>> + Send + 'static,
{
    fn call(&self, payload: P) -> OperationFuture<O> {
        Box::pin(self(payload))
    }
}

/// Terminal result of an action's operation.
#[derive(Debug)]
pub enum Outcome<O> {
    Success(O),
    Failure(ExecutionError),
}

impl<O> From<anyhow::Result<O>> for Outcome<O> {
    fn from(result: anyhow::Result<O>) -> Self {
        match result {
            Ok(value) => Outcome::Success(value),
            Err(err) => Outcome::Failure(ExecutionError::Operation(err)),
        }
    }
}
