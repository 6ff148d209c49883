//! # uniflow
//!
//! Unidirectional data flow for UI applications.
//!
//! ```text
//! Controller ──dispatch──► Dispatcher ──► Interceptors ──► Reducers ──► Stores
//!     ▲                                                                  │
//!     └───────────────────────── state snapshots ◄───────────────────────┘
//! ```
//!
//! - [`dispatcher::Dispatcher`] broadcasts every action to every registered
//!   reducer through an interceptor chain, one dispatch at a time, on a
//!   single designated [`dispatcher::UiLoop`].
//! - [`bootstrap::init_stores`] initializes stores in order at startup and
//!   reports what each one cost.
//! - [`flux`] holds the building blocks: actions, reducers, interceptors,
//!   stores and state subjects.
//! - [`login`] is a small example screen built on all of the above.

pub mod bootstrap;
pub mod config;
pub mod dispatcher;
pub mod flux;
pub mod logging;
pub mod login;

pub use bootstrap::{dispose_stores, init_stores, init_stores_with, InitReport, StoreTiming};
pub use dispatcher::{DispatchError, Dispatcher, UiHandle, UiLoop};
