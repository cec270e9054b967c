//! Runs the operation behind each dispatched action exactly once and
//! reports its outcome back to the reconciliation core.
//!
//! # Policies
//!
//! ```text
//! concurrent:  dispatch ──→ spawn(op) ──┐
//!              dispatch ──→ spawn(op) ──┼──→ core.settle (arrival order)
//!              dispatch ──→ spawn(op) ──┘
//!
//! serialized:  dispatch ──→ [ mpsc FIFO ] ──→ worker: op, settle, next op ...
//! ```
//!
//! Operation errors, timeouts and panics all become a failed settle; none
//! of them escape into projection.

mod operation;
mod policy;

pub use operation::{Operation, OperationFuture, Outcome};
pub use policy::ExecutorPolicy;

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};

use crate::error::{DispatchError, ExecutionError};
use crate::model::Reducer;
use crate::queue::{Action, ActionId};
use crate::reconcile::{ReconciliationCore, Settlement};

/// Called with every failed action, after its entry was rolled back.
pub type ErrorHook = Arc<dyn Fn(ActionId, &ExecutionError) + Send + Sync>;

pub(crate) type Reply<O> = oneshot::Sender<Result<O, DispatchError>>;

pub(crate) struct ExecutorSettings<R: Reducer> {
    pub(crate) operation: Arc<dyn Operation<R::Payload, R::Output>>,
    pub(crate) timeout: Option<Duration>,
    pub(crate) on_error: Option<ErrorHook>,
}

/// One dispatched action travelling through the executor.
///
/// A job that is dropped before replying (executor stopped, runtime shut
/// down, task torn down) fails its entry so it never stays pending.
pub(crate) struct Job<R: Reducer> {
    action: Action<R::Payload>,
    core: Arc<ReconciliationCore<R>>,
    reply: Option<Reply<R::Output>>,
}

impl<R: Reducer> Job<R> {
    pub(crate) fn new(
        action: Action<R::Payload>,
        core: Arc<ReconciliationCore<R>>,
        reply: Reply<R::Output>,
    ) -> Self {
        Self {
            action,
            core,
            reply: Some(reply),
        }
    }

    fn start(&self) -> bool {
        self.core.begin(self.action.id(), self.action.generation())
    }

    fn finish(mut self, outcome: Outcome<R::Output>, settings: &ExecutorSettings<R>) {
        let id = self.action.id();
        let settlement = self.core.settle(id, self.action.generation(), outcome);

        let result = match settlement {
            Settlement::Applied(Outcome::Success(output)) => Ok(output),
            Settlement::Applied(Outcome::Failure(source)) => {
                if let Some(hook) = &settings.on_error {
                    hook(id, &source);
                }
                Err(DispatchError::Execution { id, source })
            }
            Settlement::Stale(_) | Settlement::Unknown(_) => Err(DispatchError::Discarded { id }),
        };
        self.respond(result);
    }

    /// Resolve the handle of an action that will never run.
    fn discard(mut self) {
        let id = self.action.id();
        self.respond(Err(DispatchError::Discarded { id }));
    }

    fn respond(&mut self, result: Result<R::Output, DispatchError>) {
        let Some(reply) = self.reply.take() else {
            return;
        };
        if reply.send(result).is_err() {
            tracing::trace!(action_id = %self.action.id(), "Dispatch handle dropped before settle");
        }
    }
}

impl<R: Reducer> Drop for Job<R> {
    fn drop(&mut self) {
        // Settling runs the reducer; never do that while already unwinding.
        if self.reply.is_none() || std::thread::panicking() {
            return;
        }

        let id = self.action.id();
        tracing::warn!(action_id = %id, "Action abandoned before settling, rolling back");
        let outcome = Outcome::Failure(ExecutionError::Operation(anyhow::anyhow!(
            "executor stopped"
        )));
        self.core.settle(id, self.action.generation(), outcome);
        self.respond(Err(DispatchError::Closed { id }));
    }
}

/// Schedules operations according to an [`ExecutorPolicy`].
pub(crate) struct ActionExecutor<R: Reducer> {
    policy: ExecutorPolicy,
    settings: Arc<ExecutorSettings<R>>,
    runtime: Handle,
    serial: Option<mpsc::UnboundedSender<Job<R>>>,
}

impl<R: Reducer> ActionExecutor<R> {
    pub(crate) fn new(
        policy: ExecutorPolicy,
        settings: ExecutorSettings<R>,
        runtime: Handle,
    ) -> Self {
        let settings = Arc::new(settings);
        let serial = match policy {
            ExecutorPolicy::Concurrent => None,
            ExecutorPolicy::Serialized => {
                let (sender, receiver) = mpsc::unbounded_channel();
                let worker = SerialWorker {
                    receiver,
                    settings: Arc::clone(&settings),
                };
                runtime.spawn(worker.run());
                Some(sender)
            }
        };

        Self {
            policy,
            settings,
            runtime,
            serial,
        }
    }

    pub(crate) fn policy(&self) -> ExecutorPolicy {
        self.policy
    }

    /// Hand a job to the executor. Never blocks.
    pub(crate) fn submit(&self, job: Job<R>) {
        tracing::debug!(
            action_id = %job.action.id(),
            policy = %self.policy,
            "Submitting action"
        );

        match &self.serial {
            Some(sender) => {
                if let Err(mpsc::error::SendError(job)) = sender.send(job) {
                    tracing::warn!(action_id = %job.action.id(), "Serialized executor stopped");
                    drop(job);
                }
            }
            None => {
                if !job.start() {
                    job.discard();
                    return;
                }
                let settings = Arc::clone(&self.settings);
                self.runtime.spawn(async move {
                    let outcome = execute(&settings, job.action.payload().clone()).await;
                    job.finish(outcome, &settings);
                });
            }
        }
    }
}

/// Drains serialized jobs strictly in submission order.
struct SerialWorker<R: Reducer> {
    receiver: mpsc::UnboundedReceiver<Job<R>>,
    settings: Arc<ExecutorSettings<R>>,
}

impl<R: Reducer> SerialWorker<R> {
    async fn run(mut self) {
        while let Some(job) = self.receiver.recv().await {
            if !job.start() {
                tracing::debug!(
                    action_id = %job.action.id(),
                    "Skipping action discarded before its turn"
                );
                job.discard();
                continue;
            }
            let outcome = execute(&self.settings, job.action.payload().clone()).await;
            job.finish(outcome, &self.settings);
        }
        tracing::debug!("Serialized executor stopped");
    }
}

/// Run one operation to completion on its own task, so that a panic inside
/// it (or inside its timer) is caught and reported as a failure.
async fn execute<R: Reducer>(
    settings: &ExecutorSettings<R>,
    payload: R::Payload,
) -> Outcome<R::Output> {
    let operation = Arc::clone(&settings.operation);
    let timeout = settings.timeout;
    let task = tokio::spawn(async move {
        let call = operation.call(payload);
        match timeout {
            Some(after) => tokio::time::timeout(after, call).await.map_err(|_| after),
            None => Ok(call.await),
        }
    });

    match task.await {
        Ok(Ok(result)) => Outcome::from(result),
        Ok(Err(after)) => Outcome::Failure(ExecutionError::TimedOut { after }),
        Err(err) if err.is_panic() => Outcome::Failure(ExecutionError::Panicked),
        Err(err) => Outcome::Failure(ExecutionError::Operation(
            anyhow::Error::new(err).context("operation task cancelled"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FnReducer;
    use std::sync::atomic::{AtomicUsize, Ordering};

    type Counter = FnReducer<i32, i32, i32, fn(i32, &i32) -> i32>;

    fn add(state: i32, payload: &i32) -> i32 {
        state + payload
    }

    fn settings<O>(operation: O, timeout: Option<Duration>) -> ExecutorSettings<Counter>
    where
        O: Operation<i32, i32>,
    {
        ExecutorSettings {
            operation: Arc::new(operation),
            timeout,
            on_error: None,
        }
    }

    #[tokio::test]
    async fn execute_maps_success() {
        let settings = settings(|n: i32| async move { anyhow::Ok(n * 2) }, None);
        assert!(matches!(execute(&settings, 21).await, Outcome::Success(42)));
    }

    #[tokio::test]
    async fn execute_maps_operation_error() {
        let settings = settings(
            |_: i32| async move { Err::<i32, _>(anyhow::anyhow!("nope")) },
            None,
        );
        assert!(matches!(
            execute(&settings, 1).await,
            Outcome::Failure(ExecutionError::Operation(_))
        ));
    }

    #[tokio::test]
    async fn execute_catches_panics() {
        let settings = settings(
            |n: i32| async move {
                if n > 0 {
                    panic!("operation blew up");
                }
                anyhow::Ok(n)
            },
            None,
        );
        assert!(matches!(
            execute(&settings, 1).await,
            Outcome::Failure(ExecutionError::Panicked)
        ));
    }

    #[tokio::test]
    async fn execute_times_out() {
        let settings = settings(
            |n: i32| async move {
                tokio::time::sleep(Duration::from_secs(30)).await;
                anyhow::Ok(n)
            },
            Some(Duration::from_millis(20)),
        );
        assert!(matches!(
            execute(&settings, 1).await,
            Outcome::Failure(ExecutionError::TimedOut { .. })
        ));
    }

    #[tokio::test]
    async fn failed_job_calls_error_hook() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let settings = ExecutorSettings::<Counter> {
            operation: Arc::new(|_: i32| async move {
                Err::<i32, _>(anyhow::anyhow!("rejected"))
            }),
            timeout: None,
            on_error: Some(Arc::new(move |_: ActionId, _: &ExecutionError| {
                counter.fetch_add(1, Ordering::SeqCst);
            })),
        };
        let executor = ActionExecutor::new(ExecutorPolicy::Concurrent, settings, Handle::current());
        let core = Arc::new(ReconciliationCore::new(
            Counter::new(add as fn(i32, &i32) -> i32),
            0,
        ));

        let action = core.enqueue(5);
        let (reply, receiver) = oneshot::channel();
        executor.submit(Job::new(action, Arc::clone(&core), reply));

        let result = receiver.await.unwrap();
        assert!(matches!(result, Err(DispatchError::Execution { .. })));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(core.projected_state(), 0);
        assert_eq!(executor.policy(), ExecutorPolicy::Concurrent);
    }

    #[tokio::test]
    async fn dropped_job_rolls_back_its_entry() {
        let core = Arc::new(ReconciliationCore::new(
            Counter::new(add as fn(i32, &i32) -> i32),
            0,
        ));
        let action = core.enqueue(3);
        let (reply, receiver) = oneshot::channel();
        let job = Job::new(action, Arc::clone(&core), reply);
        assert!(job.start());
        assert_eq!(core.projected_state(), 3);

        drop(job);

        assert!(!core.is_pending());
        assert_eq!(core.projected_state(), 0);
        assert!(matches!(receiver.await.unwrap(), Err(DispatchError::Closed { .. })));
    }

    #[tokio::test]
    async fn replied_job_drops_silently() {
        let core = Arc::new(ReconciliationCore::new(
            Counter::new(add as fn(i32, &i32) -> i32),
            0,
        ));
        let action = core.enqueue(3);
        let (reply, receiver) = oneshot::channel();
        Job::new(action, Arc::clone(&core), reply).discard();

        assert!(matches!(receiver.await.unwrap(), Err(DispatchError::Discarded { .. })));
        assert_eq!(core.stats().failed, 0);
        assert!(core.is_pending());
    }
}
