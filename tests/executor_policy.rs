//! Scheduling behavior of the concurrent and serialized executor policies.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use common::{draft, saved, todo_store, Gate, Record, TodoList, WAIT};
use speculate::{DispatchError, ExecutionError, ExecutorPolicy, OptimisticStore};

#[tokio::test]
async fn test_concurrent_runs_actions_together() {
    let gate = Gate::new();
    let store = todo_store(&gate, ExecutorPolicy::Concurrent);

    let first = store.dispatch("a".to_string());
    let second = store.dispatch("b".to_string());
    assert!(gate.wait_started("a", WAIT).await);
    assert!(gate.wait_started("b", WAIT).await);

    // Second settles first; arrival order decides base-state order.
    gate.succeed("b", 2);
    second.await.unwrap();
    assert_eq!(store.projected_state(), vec![saved(2, "b"), draft("a")]);

    gate.succeed("a", 1);
    first.await.unwrap();
    assert_eq!(store.base_state(), vec![saved(2, "b"), saved(1, "a")]);
}

#[tokio::test]
async fn test_serialized_waits_for_previous_settle() {
    let gate = Gate::new();
    let store = todo_store(&gate, ExecutorPolicy::Serialized);
    assert_eq!(store.policy(), ExecutorPolicy::Serialized);

    let first = store.dispatch("a".to_string());
    let second = store.dispatch("b".to_string());
    assert!(gate.wait_started("a", WAIT).await);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!gate.is_waiting("b"));
    assert_eq!(
        store.projected_state(),
        vec![draft("a"), draft("b")],
        "queued action is still projected"
    );

    gate.fail("a");
    assert!(first.await.is_err());
    assert!(gate.wait_started("b", WAIT).await);

    gate.succeed("b", 2);
    second.await.unwrap();
    assert_eq!(gate.calls(), vec!["a".to_string(), "b".to_string()]);
    assert_eq!(store.projected_state(), vec![saved(2, "b")]);
}

#[tokio::test]
async fn test_serialized_skips_actions_discarded_by_reset() {
    let gate = Gate::new();
    let store = todo_store(&gate, ExecutorPolicy::Serialized);

    let first = store.dispatch("a".to_string());
    let second = store.dispatch("b".to_string());
    assert!(gate.wait_started("a", WAIT).await);

    store.reset();
    gate.succeed("a", 1);

    assert!(matches!(first.await, Err(DispatchError::Discarded { .. })));
    assert!(matches!(second.await, Err(DispatchError::Discarded { .. })));
    assert_eq!(gate.call_count("b"), 0);
    assert!(store.base_state().is_empty());

    // The worker keeps serving the next generation.
    let third = store.dispatch("c".to_string());
    assert!(gate.wait_started("c", WAIT).await);
    gate.succeed("c", 3);
    assert_eq!(
        third.await.unwrap(),
        Record {
            id: 3,
            text: "c".to_string()
        }
    );
}

#[tokio::test]
async fn test_operation_invoked_once_per_action() {
    for policy in [ExecutorPolicy::Concurrent, ExecutorPolicy::Serialized] {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let store = OptimisticStore::builder(TodoList, Vec::new(), move |text: String| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move { anyhow::Ok(Record { id: 0, text }) }
        })
        .policy(policy)
        .build()
        .unwrap();

        let handles: Vec<_> = (0..10).map(|n| store.dispatch(n.to_string())).collect();
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 10, "policy {policy}");
        assert_eq!(store.base_state().len(), 10);
        assert!(!store.is_pending());
    }
}

#[tokio::test]
async fn test_panicking_operation_rolls_back() {
    let store = OptimisticStore::builder(TodoList, Vec::new(), |text: String| async move {
        if text == "boom" {
            panic!("operation panicked");
        }
        anyhow::Ok(Record { id: 1, text })
    })
    .build()
    .unwrap();

    let boom = store.dispatch("boom".to_string());
    let fine = store.dispatch("fine".to_string());

    let err = boom.await.unwrap_err();
    assert_eq!(err.error_type(), "panic");
    fine.await.unwrap();
    assert_eq!(store.projected_state(), vec![saved(1, "fine")]);
}

#[tokio::test]
async fn test_timeout_fails_action_and_reports_hook() {
    let reported = Arc::new(AtomicUsize::new(0));
    let hook_count = Arc::clone(&reported);
    let store = OptimisticStore::builder(TodoList, Vec::new(), |text: String| async move {
        tokio::time::sleep(Duration::from_secs(30)).await;
        anyhow::Ok(Record { id: 1, text })
    })
    .timeout(Duration::from_millis(20))
    .on_error(move |_, err| {
        assert!(matches!(err, ExecutionError::TimedOut { .. }));
        hook_count.fetch_add(1, Ordering::SeqCst);
    })
    .build()
    .unwrap();

    let err = store.dispatch("slow".to_string()).await.unwrap_err();
    assert_eq!(err.error_type(), "timeout");
    assert_eq!(reported.load(Ordering::SeqCst), 1);
    assert!(store.projected_state().is_empty());
    assert_eq!(store.stats().failed, 1);
}

#[test]
fn test_timeout_on_runtime_without_timer_fails_action() {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    let store = OptimisticStore::builder(TodoList, Vec::new(), |text: String| async move {
        anyhow::Ok(Record { id: 1, text })
    })
    .runtime(runtime.handle().clone())
    .timeout(Duration::from_millis(50))
    .build()
    .unwrap();

    let handle = store.dispatch("x".to_string());
    assert_eq!(store.projected_state(), vec![draft("x")]);

    let err = runtime.block_on(handle).unwrap_err();
    assert_eq!(err.error_type(), "panic");
    assert!(!store.is_pending());
    assert!(store.projected_state().is_empty());
    assert_eq!(store.stats().failed, 1);
}

#[test]
fn test_runtime_shutdown_rolls_back_in_flight_actions() {
    for policy in [ExecutorPolicy::Concurrent, ExecutorPolicy::Serialized] {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        let gate = Gate::new();
        let store = OptimisticStore::builder(TodoList, Vec::new(), gate.operation())
            .policy(policy)
            .runtime(runtime.handle().clone())
            .build()
            .unwrap();

        let running = store.dispatch("running".to_string());
        let queued = store.dispatch("queued".to_string());
        runtime.block_on(async { assert!(gate.wait_started("running", WAIT).await) });
        assert!(store.is_pending());

        drop(runtime);

        assert!(!store.is_pending(), "policy {policy}");
        assert!(store.projected_state().is_empty(), "policy {policy}");
        assert!(store.base_state().is_empty());

        let waiter = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let running = waiter.block_on(running);
        assert!(matches!(running, Err(DispatchError::Closed { .. })), "policy {policy}");
        let queued = waiter.block_on(queued);
        assert!(queued.is_err(), "policy {policy}");
    }
}
