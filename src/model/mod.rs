//! State model primitives for the reconciliation engine.
//!
//! This module provides the caller-facing contract that every store is
//! parameterized over.
//!
//! # Architecture
//!
//! ```text
//! dispatch(Payload) ──→ Reducer::reduce ──→ ProjectedState ──→ subscribers
//!                            │
//!        Output ──→ Reducer::confirm ──→ BaseState
//! ```
//!
//! - **StoreState**: Immutable, comparable representation of the state
//! - **Payload**: Data carried by a dispatched action
//! - **Reducer**: Pure functions that fold payloads and confirmed outputs into state

mod fn_reducer;
mod payload;
mod reducer;
mod state;

pub use fn_reducer::FnReducer;
pub use payload::Payload;
pub use reducer::Reducer;
pub use state::StoreState;
