//! Unidirectional data flow primitives.
//!
//! # Architecture
//!
//! ```text
//! Action ──→ Dispatcher ──→ Interceptors ──→ Reducers ──→ Store state
//!    ↑                                                        │
//!    └──────────────────── View / Controller ←────────────────┘
//! ```
//!
//! - **Action**: immutable payload describing an intended state change
//! - **Interceptor**: middleware wrapping the dispatch pipeline
//! - **ActionReducer**: a store's reaction to every dispatched action
//! - **Store**: owner of a piece of state plus its lifecycle hooks

mod action;
mod interceptor;
mod reducer;
mod store;
mod watch;

pub use action::{Action, TaggedAction};
pub use interceptor::{Chain, Interceptor, LoggingInterceptor};
pub(crate) use interceptor::TerminalStep;
pub use reducer::{ActionReducer, ReducerTable, Transition};
pub use store::{Store, StoreState};
pub use watch::{on_next_terminal_state, StateSubject, Subscription, Terminal};
