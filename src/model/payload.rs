//! Base trait for action payloads.

/// Marker trait for payload objects.
///
/// Payloads represent:
/// - User actions (adding an item, toggling a flag)
/// - Form submissions
/// - Any request whose effect should be visible before the server confirms it
///
/// A payload is kept in the queue until its action settles and is re-folded
/// on every projection, so it must be cheap to clone and shareable.
pub trait Payload: Clone + Send + Sync + 'static {}

impl<T> Payload for T where T: Clone + Send + Sync + 'static {}
