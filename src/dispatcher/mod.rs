//! Action dispatch.
//!
//! The [`Dispatcher`] is the single broadcast point from actions to
//! reducers. It is created explicitly by the application's composition root
//! and handed to whoever needs to dispatch; there is no global instance.
//!
//! ```text
//! dispatch(action)
//!     │  verify thread affinity, claim in-flight flag
//!     ▼
//! Interceptor 1 ─► Interceptor 2 ─► … ─► fan-out ─► Reducer 1, Reducer 2, …
//!     ◄──────────────── results unwind in reverse order ◄────────┘
//! ```

mod error;
mod ui_loop;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::thread;

use parking_lot::Mutex;

use crate::config::DispatcherConfig;
use crate::flux::{Action, ActionReducer, Chain, Interceptor};

pub use error::DispatchError;
pub use ui_loop::{UiHandle, UiLoop};

/// Everything guarded by the registration lock.
struct Registrations<A> {
    reducers: Vec<Arc<dyn ActionReducer<A>>>,
    interceptors: Vec<Arc<dyn Interceptor<A>>>,
    chain: Arc<Chain<A>>,
}

struct DispatcherInner<A> {
    registrations: Arc<Mutex<Registrations<A>>>,
    dispatching: AtomicBool,
    ui: UiHandle,
    config: DispatcherConfig,
}

/// Routes actions through the interceptor chain to every registered reducer.
///
/// Cloning is cheap and yields another handle to the same dispatcher.
///
/// Reducers may be registered more than once; each registration is invoked
/// on every dispatch.
pub struct Dispatcher<A> {
    inner: Arc<DispatcherInner<A>>,
}

impl<A> Clone for Dispatcher<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A: Action> Dispatcher<A> {
    /// Create a dispatcher whose affinity context is the loop behind `ui`.
    pub fn new(ui: UiHandle, config: DispatcherConfig) -> Self {
        let registrations = Arc::new_cyclic(|weak| {
            Mutex::new(Registrations {
                reducers: Vec::new(),
                interceptors: Vec::new(),
                chain: Chain::build(&[], fan_out(weak.clone())),
            })
        });

        Self {
            inner: Arc::new(DispatcherInner {
                registrations,
                dispatching: AtomicBool::new(false),
                ui,
                config,
            }),
        }
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.inner.config
    }

    /// Register `reducer`. Takes effect from the next fan-out.
    pub fn add_action_reducer(&self, reducer: Arc<dyn ActionReducer<A>>) {
        let mut registrations = self.inner.registrations.lock();
        registrations.reducers.push(reducer);
        tracing::trace!(
            reducers = registrations.reducers.len(),
            "Action reducer added"
        );
    }

    /// Remove the first registration of `reducer` (matched by identity).
    ///
    /// Returns `false` if it was not registered.
    pub fn remove_action_reducer(&self, reducer: &Arc<dyn ActionReducer<A>>) -> bool {
        let mut registrations = self.inner.registrations.lock();
        let Some(index) = registrations
            .reducers
            .iter()
            .position(|other| same_allocation(other, reducer))
        else {
            return false;
        };
        registrations.reducers.remove(index);
        tracing::trace!(
            reducers = registrations.reducers.len(),
            "Action reducer removed"
        );
        true
    }

    /// Append `interceptor` as the innermost wrapper and rebuild the chain.
    pub fn add_interceptor(&self, interceptor: Arc<dyn Interceptor<A>>) {
        let mut registrations = self.inner.registrations.lock();
        registrations.interceptors.push(interceptor);
        self.rebuild_chain(&mut registrations);
    }

    /// Remove the first registration of `interceptor` (matched by identity)
    /// and rebuild the chain.
    ///
    /// Returns `false` if it was not registered.
    pub fn remove_interceptor(&self, interceptor: &Arc<dyn Interceptor<A>>) -> bool {
        let mut registrations = self.inner.registrations.lock();
        let Some(index) = registrations
            .interceptors
            .iter()
            .position(|other| same_allocation(other, interceptor))
        else {
            return false;
        };
        registrations.interceptors.remove(index);
        self.rebuild_chain(&mut registrations);
        true
    }

    pub fn reducer_count(&self) -> usize {
        self.inner.registrations.lock().reducers.len()
    }

    pub fn interceptor_count(&self) -> usize {
        self.inner.registrations.lock().interceptors.len()
    }

    /// Whether a dispatch is currently running.
    pub fn is_dispatching(&self) -> bool {
        self.inner.dispatching.load(Ordering::Acquire)
    }

    /// Drive `action` through the interceptor chain and every reducer.
    ///
    /// Returns the action as it left the chain. Fails with
    /// [`DispatchError::ThreadAffinity`] off the UI loop (unless
    /// `verify_threads` is off) and with [`DispatchError::Reentrant`] while
    /// another dispatch is in flight, whether nested or, without thread
    /// verification, running on another thread. Reducer and interceptor errors
    /// are returned unchanged; state already changed by earlier reducers is
    /// not rolled back.
    pub fn dispatch(&self, action: A) -> Result<A, DispatchError> {
        self.verify_thread("dispatch")?;

        if self
            .inner
            .dispatching
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::error!(action = ?action, "Nested dispatch rejected");
            return Err(DispatchError::Reentrant);
        }
        let _in_flight = scopeguard::guard((), |()| {
            self.inner.dispatching.store(false, Ordering::Release);
        });

        let chain = Arc::clone(&self.inner.registrations.lock().chain);
        chain.proceed(action)
    }

    /// Queue `action` for dispatch on the UI loop and return immediately.
    ///
    /// Actions posted this way are dispatched in submission order. Their
    /// errors have no caller to go back to and are logged instead.
    pub fn dispatch_on_ui(&self, action: A) -> Result<(), DispatchError> {
        let dispatcher = self.clone();
        self.inner.ui.post(move || {
            if let Err(err) = dispatcher.dispatch(action) {
                tracing::error!(error = %err, "Posted dispatch failed");
            }
        })
    }

    /// Dispatch `action` on the UI loop and block until it has finished.
    ///
    /// Must not be called from the UI loop itself.
    pub fn dispatch_on_ui_sync(&self, action: A) -> Result<A, DispatchError> {
        let dispatcher = self.clone();
        self.inner
            .ui
            .post_sync("dispatch_on_ui_sync", move || dispatcher.dispatch(action))
            .and_then(|result| result)
    }

    fn verify_thread(&self, operation: &'static str) -> Result<(), DispatchError> {
        if !self.inner.config.verify_threads || self.inner.ui.is_current() {
            return Ok(());
        }
        let current = thread::current();
        Err(DispatchError::ThreadAffinity {
            operation,
            thread: current.name().unwrap_or("<unnamed>").to_string(),
        })
    }

    fn rebuild_chain(&self, registrations: &mut Registrations<A>) {
        let terminal = fan_out(Arc::downgrade(&self.inner.registrations));
        registrations.chain = Chain::build(&registrations.interceptors, terminal);
        tracing::trace!(
            interceptors = registrations.interceptors.len(),
            "Dispatch chain rebuilt"
        );
    }
}

impl<A> fmt::Debug for Dispatcher<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registrations = self.inner.registrations.lock();
        f.debug_struct("Dispatcher")
            .field("reducers", &registrations.reducers.len())
            .field("interceptors", &registrations.interceptors.len())
            .field("dispatching", &self.inner.dispatching.load(Ordering::Relaxed))
            .field("config", &self.inner.config)
            .finish()
    }
}

/// Terminal chain step: snapshot the reducer list, release the lock, then
/// invoke every reducer in registration order. The first error stops the
/// fan-out.
fn fan_out<A: Action>(
    registrations: Weak<Mutex<Registrations<A>>>,
) -> crate::flux::TerminalStep<A> {
    Arc::new(move |action: A| -> Result<A, DispatchError> {
        let reducers = match registrations.upgrade() {
            Some(registrations) => registrations.lock().reducers.clone(),
            None => Vec::new(),
        };
        for reducer in &reducers {
            reducer.reduce(&action)?;
        }
        Ok(action)
    })
}

/// Identity comparison on the allocation, ignoring vtable pointers.
fn same_allocation<T: ?Sized>(a: &Arc<T>, b: &Arc<T>) -> bool {
    std::ptr::eq(Arc::as_ptr(a).cast::<()>(), Arc::as_ptr(b).cast::<()>())
}
