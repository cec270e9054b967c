use std::fmt;
use std::marker::PhantomData;

use super::payload::Payload;
use super::reducer::Reducer;
use super::state::StoreState;

/// Adapts a plain closure into a [`Reducer`].
///
/// Confirmation replays the payload, so the operation's output only reaches
/// the dispatcher through its handle.
pub struct FnReducer<S, P, O, F> {
    reduce: F,
    _marker: PhantomData<fn(S, P) -> O>,
}

impl<S, P, O, F> FnReducer<S, P, O, F>
where
    F: Fn(S, &P) -> S,
{
    pub fn new(reduce: F) -> Self {
        Self {
            reduce,
            _marker: PhantomData,
        }
    }
}

impl<S, P, O, F> Reducer for FnReducer<S, P, O, F>
where
    S: StoreState,
    P: Payload,
    O: Send + 'static,
    F: Fn(S, &P) -> S + Send + Sync + 'static,
{
    type State = S;
    type Payload = P;
    type Output = O;

    fn reduce(&self, state: S, payload: &P) -> S {
        (self.reduce)(state, payload)
    }
}

impl<S, P, O, F> fmt::Debug for FnReducer<S, P, O, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnReducer").finish_non_exhaustive()
    }
}
