//! Optimistic action queue and reconciliation engine.
//!
//! A store holds a confirmed *base state* and a queue of pending actions.
//! Readers see the *projected state*: the base state folded through every
//! pending payload in submission order. Each action's operation runs once;
//! success folds the confirmed output into the base state, failure just
//! drops the action, and `reset` discards everything still pending.
//!
//! ```no_run
//! use speculate::{FnReducer, OptimisticStore};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let reducer: FnReducer<Vec<String>, String, (), _> =
//!     FnReducer::new(|mut items: Vec<String>, text: &String| {
//!         items.push(text.clone());
//!         items
//!     });
//! let store = OptimisticStore::builder(reducer, Vec::new(), |_text: String| async {
//!     // talk to the server here
//!     anyhow::Ok(())
//! })
//! .build()?;
//!
//! let handle = store.dispatch("buy milk".to_string());
//! assert_eq!(store.projected_state(), vec!["buy milk".to_string()]);
//! handle.await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod executor;
pub mod logging;
pub mod model;
pub mod projector;
pub mod queue;
pub mod reconcile;
pub mod store;
pub mod subscription;

pub use crate::error::{DispatchError, ExecutionError, StoreError};
pub use crate::executor::{ExecutorPolicy, Operation, Outcome};
pub use crate::model::{FnReducer, Payload, Reducer, StoreState};
pub use crate::queue::{Action, ActionId, EntryStatus, Generation, QueuePhase};
pub use crate::reconcile::{ReconciliationCore, Settlement, StoreStats};
pub use crate::store::{DispatchHandle, OptimisticStore, StoreBuilder};
pub use crate::subscription::Unsubscribe;
