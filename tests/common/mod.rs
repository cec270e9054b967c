//! Shared test utilities: a todo-list reducer and an operation whose
//! results are released by the test.

#![allow(dead_code, unused_imports)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use speculate::{ExecutorPolicy, Operation, OptimisticStore, Reducer};
use tokio::sync::oneshot;

#[derive(Debug, Clone, PartialEq)]
pub enum Todo {
    Draft(String),
    Saved { id: u64, text: String },
}

pub fn draft(text: &str) -> Todo {
    Todo::Draft(text.to_string())
}

pub fn saved(id: u64, text: &str) -> Todo {
    Todo::Saved {
        id,
        text: text.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: u64,
    pub text: String,
}

/// `reduce(s, text) = s + [text]`; confirmation appends the saved record.
pub struct TodoList;

impl Reducer for TodoList {
    type State = Vec<Todo>;
    type Payload = String;
    type Output = Record;

    fn reduce(&self, mut state: Vec<Todo>, text: &String) -> Vec<Todo> {
        state.push(Todo::Draft(text.clone()));
        state
    }

    fn confirm(&self, mut state: Vec<Todo>, _text: &String, record: &Record) -> Vec<Todo> {
        state.push(Todo::Saved {
            id: record.id,
            text: record.text.clone(),
        });
        state
    }
}

type Release = oneshot::Sender<anyhow::Result<Record>>;

/// Operation that parks every call until the test releases it by payload.
#[derive(Clone, Default)]
pub struct Gate {
    waiting: Arc<Mutex<HashMap<String, Release>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl Gate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn operation(&self) -> impl Operation<String, Record> {
        let gate = self.clone();
        move |text: String| {
            let (release, parked) = oneshot::channel();
            gate.calls.lock().push(text.clone());
            gate.waiting.lock().insert(text, release);
            async move {
                parked
                    .await
                    .unwrap_or_else(|_| Err(anyhow::anyhow!("gate dropped")))
            }
        }
    }

    pub fn is_waiting(&self, text: &str) -> bool {
        self.waiting.lock().contains_key(text)
    }

    /// Wait until the operation for `text` has been called.
    pub async fn wait_started(&self, text: &str, timeout: Duration) -> bool {
        let start = std::time::Instant::now();
        while start.elapsed() < timeout {
            if self.is_waiting(text) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        false
    }

    pub fn succeed(&self, text: &str, id: u64) -> bool {
        self.release(
            text,
            Ok(Record {
                id,
                text: text.to_string(),
            }),
        )
    }

    pub fn fail(&self, text: &str) -> bool {
        self.release(text, Err(anyhow::anyhow!("server rejected {text}")))
    }

    fn release(&self, text: &str, result: anyhow::Result<Record>) -> bool {
        match self.waiting.lock().remove(text) {
            Some(release) => release.send(result).is_ok(),
            None => false,
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self, text: &str) -> usize {
        self.calls.lock().iter().filter(|call| call.as_str() == text).count()
    }
}

pub const WAIT: Duration = Duration::from_secs(2);

/// Store over [`TodoList`] starting from an empty list.
pub fn todo_store(gate: &Gate, policy: ExecutorPolicy) -> OptimisticStore<TodoList> {
    OptimisticStore::builder(TodoList, Vec::new(), gate.operation())
        .policy(policy)
        .build()
        .expect("store must build inside a tokio runtime")
}
