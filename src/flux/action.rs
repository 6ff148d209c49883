//! Base traits for actions.

use std::fmt;

/// Marker trait for action payloads.
///
/// Actions represent:
/// - User actions (button taps, form submissions)
/// - System events (authentication results, timers)
///
/// They are moved into the dispatcher once and handed to every reducer by
/// reference. Applications usually model all of their actions as one enum.
pub trait Action: fmt::Debug + Send + 'static {}

/// An action that can name its own variant.
///
/// Used by [`ReducerTable`](crate::flux::ReducerTable) to route an action to
/// the handler registered for its variant.
pub trait TaggedAction: Action {
    /// Stable name of this action's variant, e.g. `"login"`.
    fn tag(&self) -> &'static str;
}
