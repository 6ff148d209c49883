//! Store lifecycle and state traits.

/// Marker trait for store state snapshots.
///
/// States should be:
/// - Immutable (Clone to create new states)
/// - Self-contained (all data a view needs)
/// - Comparable (PartialEq for detecting changes)
pub trait StoreState: Clone + PartialEq + Default + Send + 'static {}

/// A store as seen by the bootstrap utility.
///
/// Stores own their state and mutation logic; the core only needs their
/// lifecycle hooks.
pub trait Store: Send + Sync {
    /// Human-readable name used in timing reports.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// One-time initialization hook, called before the first dispatch.
    fn init(&self);

    /// Force the initial state to be computed.
    ///
    /// Stores that build their state lazily on first read do it here so that
    /// the cost shows up in the bootstrap report instead of the first frame.
    fn prime_state(&self);

    /// Release store-held resources. No-op unless overridden.
    fn dispose(&self) {}
}
