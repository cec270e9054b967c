//! Reducer trait for the reconciliation engine.

use super::payload::Payload;
use super::state::StoreState;

/// Reducer transforms state based on payloads.
///
/// The reducer is the only place where state transitions happen.
/// Both methods must be pure functions with no side effects: the engine
/// calls `reduce` again for every pending payload each time the projection
/// is rebuilt.
pub trait Reducer: Send + Sync + 'static {
    /// The state type this reducer operates on.
    type State: StoreState;

    /// The payload type carried by dispatched actions.
    type Payload: Payload;

    /// The confirmed value an action's operation produces on success.
    type Output: Send + 'static;

    /// Fold a pending payload into the state (speculative application).
    fn reduce(&self, state: Self::State, payload: &Self::Payload) -> Self::State;

    /// Fold a confirmed result into the base state once its action succeeds.
    ///
    /// Defaults to replaying the payload, which is right when the server
    /// echoes back exactly what was submitted.
    fn confirm(
        &self,
        state: Self::State,
        payload: &Self::Payload,
        _output: &Self::Output,
    ) -> Self::State {
        self.reduce(state, payload)
    }
}
