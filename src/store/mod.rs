//! Public entry point: an optimistic store that dispatches actions, runs
//! their operations and keeps the projected state reconciled.
//!
//! ```text
//! dispatch(payload)
//!   ├─→ core.enqueue ──→ subscribers see the speculative state
//!   └─→ executor.submit ──→ op(payload) ──→ core.settle ──→ subscribers
//!                                              └─→ DispatchHandle resolves
//! ```

mod handle;

pub use handle::DispatchHandle;

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::{oneshot, watch};

use crate::config::ExecutorConfig;
use crate::error::{ExecutionError, StoreError};
use crate::executor::{
    ActionExecutor, ErrorHook, ExecutorPolicy, ExecutorSettings, Job, Operation,
};
use crate::model::Reducer;
use crate::queue::{ActionId, EntryStatus, QueuePhase};
use crate::reconcile::{ReconciliationCore, StoreStats};
use crate::subscription::Unsubscribe;

/// Builder for [`OptimisticStore`].
pub struct StoreBuilder<R: Reducer> {
    reducer: R,
    base: R::State,
    operation: Arc<dyn Operation<R::Payload, R::Output>>,
    policy: ExecutorPolicy,
    timeout: Option<Duration>,
    on_error: Option<ErrorHook>,
    runtime: Option<Handle>,
}

impl<R: Reducer> StoreBuilder<R> {
    pub fn policy(mut self, policy: ExecutorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Fail operations that run longer than `timeout`.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Apply policy and timeout from a loaded configuration.
    pub fn config(mut self, config: &ExecutorConfig) -> Self {
        self.policy = config.policy;
        self.timeout = config.timeout();
        self
    }

    /// Observe failed actions in addition to their handles.
    pub fn on_error<F>(mut self, hook: F) -> Self
    where
        F: Fn(ActionId, &ExecutionError) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(hook));
        self
    }

    /// Runtime that operations are spawned on. Defaults to the runtime the
    /// store is built in.
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn build(self) -> Result<OptimisticStore<R>, StoreError> {
        let runtime = match self.runtime {
            Some(runtime) => runtime,
            None => Handle::try_current().map_err(StoreError::NoRuntime)?,
        };

        let settings = ExecutorSettings {
            operation: self.operation,
            timeout: self.timeout,
            on_error: self.on_error,
        };
        let executor = ActionExecutor::new(self.policy, settings, runtime);

        tracing::debug!(policy = %self.policy, timeout = ?self.timeout, "Store created");

        Ok(OptimisticStore {
            core: Arc::new(ReconciliationCore::new(self.reducer, self.base)),
            executor,
        })
    }
}

/// Optimistic action queue paired with an executor.
///
/// Readers only ever see the projected state; the base state changes only
/// when an action's operation succeeds.
pub struct OptimisticStore<R: Reducer> {
    core: Arc<ReconciliationCore<R>>,
    executor: ActionExecutor<R>,
}

impl<R: Reducer> OptimisticStore<R> {
    pub fn builder<O>(reducer: R, base: R::State, operation: O) -> StoreBuilder<R>
    where
        O: Operation<R::Payload, R::Output>,
    {
        StoreBuilder {
            reducer,
            base,
            operation: Arc::new(operation),
            policy: ExecutorPolicy::default(),
            timeout: None,
            on_error: None,
            runtime: None,
        }
    }

    /// Enqueue `payload`, show its speculative effect immediately and start
    /// (or queue) its operation. Never blocks.
    pub fn dispatch(&self, payload: R::Payload) -> DispatchHandle<R::Output> {
        let action = self.core.enqueue(payload);
        let (reply, receiver) = oneshot::channel();
        let handle = DispatchHandle::new(action.id(), action.generation(), receiver);
        self.executor
            .submit(Job::new(action, Arc::clone(&self.core), reply));
        handle
    }

    /// Discard every pending action. The projected state reverts to the base
    /// state at once; operations already running are not interrupted but
    /// their results are ignored.
    pub fn reset(&self) {
        self.core.reset();
    }

    pub fn projected_state(&self) -> R::State {
        self.core.projected_state()
    }

    pub fn base_state(&self) -> R::State {
        self.core.base_state()
    }

    pub fn is_pending(&self) -> bool {
        self.core.is_pending()
    }

    pub fn phase(&self) -> QueuePhase {
        self.core.phase()
    }

    pub fn pending_actions(&self) -> Vec<(ActionId, EntryStatus)> {
        self.core.pending_actions()
    }

    pub fn subscribe<F>(&self, callback: F) -> Unsubscribe
    where
        F: Fn(&R::State) + Send + Sync + 'static,
    {
        self.core.subscribe(callback)
    }

    pub fn watch(&self) -> watch::Receiver<R::State> {
        self.core.watch()
    }

    pub fn stats(&self) -> StoreStats {
        self.core.stats()
    }

    pub fn policy(&self) -> ExecutorPolicy {
        self.executor.policy()
    }
}
