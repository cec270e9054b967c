//! Todo-list model used by the command-line demo.

use std::collections::HashSet;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use speculate::Reducer;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TodoItem {
    /// Shown optimistically, not yet saved.
    Draft { text: String },
    Saved { id: u64, text: String },
}

#[derive(Debug, Clone)]
pub struct NewTodo {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SavedTodo {
    pub id: u64,
    pub text: String,
}

pub struct TodoReducer;

impl Reducer for TodoReducer {
    type State = Vec<TodoItem>;
    type Payload = NewTodo;
    type Output = SavedTodo;

    fn reduce(&self, mut state: Self::State, payload: &NewTodo) -> Self::State {
        state.push(TodoItem::Draft {
            text: payload.text.clone(),
        });
        state
    }

    fn confirm(
        &self,
        mut state: Self::State,
        _payload: &NewTodo,
        saved: &SavedTodo,
    ) -> Self::State {
        state.push(TodoItem::Saved {
            id: saved.id,
            text: saved.text.clone(),
        });
        state
    }
}

/// Pretend server: waits, then assigns an id or rejects the item.
#[derive(Clone)]
pub struct TodoBackend {
    latency: Duration,
    rejected: Arc<HashSet<String>>,
    next_id: Arc<AtomicU64>,
}

impl TodoBackend {
    pub fn new(latency: Duration, rejected: impl IntoIterator<Item = String>) -> Self {
        Self {
            latency,
            rejected: Arc::new(rejected.into_iter().collect()),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn save(
        &self,
        todo: NewTodo,
    ) -> impl Future<Output = anyhow::Result<SavedTodo>> + Send + 'static {
        let backend = self.clone();
        async move {
            tokio::time::sleep(backend.latency).await;
            if backend.rejected.contains(&todo.text) {
                anyhow::bail!("server rejected '{}'", todo.text);
            }
            let id = backend.next_id.fetch_add(1, Ordering::SeqCst);
            Ok(SavedTodo { id, text: todo.text })
        }
    }
}
