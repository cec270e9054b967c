//! Base trait for store state.

/// Marker trait for state objects.
///
/// States should be:
/// - Immutable (Clone to create new states)
/// - Self-contained (all data needed to render a view)
/// - Comparable (PartialEq for detecting changes)
pub trait StoreState: Clone + PartialEq + Send + Sync + 'static {}

impl<T> StoreState for T where T: Clone + PartialEq + Send + Sync + 'static {}
