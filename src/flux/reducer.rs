//! Reducers: how stores react to dispatched actions.

use std::collections::HashMap;
use std::fmt;

use super::action::TaggedAction;

/// A registered callback invoked for every dispatched action.
///
/// Each reducer decides on its own whether an action applies to it. Errors
/// are not caught by the dispatcher; they stop the fan-out and are returned
/// to the `dispatch` caller.
pub trait ActionReducer<A>: Send + Sync {
    fn reduce(&self, action: &A) -> anyhow::Result<()>;
}

impl<A, F> ActionReducer<A> for F
where
    F: Fn(&A) -> anyhow::Result<()> + Send + Sync,
{
    fn reduce(&self, action: &A) -> anyhow::Result<()> {
        self(action)
    }
}

/// Pure state transition for one action variant.
pub type Transition<S, A> = fn(S, &A) -> S;

/// Explicit routing table from action variant to state transition.
///
/// Built once at startup with [`ReducerTable::on`]; a store calls
/// [`ReducerTable::reduce`] from its [`ActionReducer`] impl.
pub struct ReducerTable<S, A> {
    handlers: HashMap<&'static str, Transition<S, A>>,
}

impl<S, A: TaggedAction> ReducerTable<S, A> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register the transition for `tag`. A later registration for the same
    /// tag replaces the earlier one.
    pub fn on(mut self, tag: &'static str, transition: Transition<S, A>) -> Self {
        self.handlers.insert(tag, transition);
        self
    }

    /// Whether a transition is registered for `tag`.
    pub fn handles(&self, tag: &str) -> bool {
        self.handlers.contains_key(tag)
    }

    /// Apply the transition registered for `action`'s variant.
    ///
    /// Returns the new state and whether a transition matched. Unmatched
    /// actions return `state` untouched.
    pub fn reduce(&self, state: S, action: &A) -> (S, bool) {
        match self.handlers.get(action.tag()) {
            Some(transition) => (transition(state, action), true),
            None => (state, false),
        }
    }
}

impl<S, A: TaggedAction> Default for ReducerTable<S, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, A> fmt::Debug for ReducerTable<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<_> = self.handlers.keys().collect();
        tags.sort();
        f.debug_struct("ReducerTable").field("tags", &tags).finish()
    }
}
