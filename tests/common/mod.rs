//! Shared test utilities.

#![allow(dead_code, unused_imports)]

use parking_lot::Mutex;
use std::sync::Arc;

use uniflow::config::DispatcherConfig;
use uniflow::dispatcher::{DispatchError, Dispatcher, UiLoop};
use uniflow::flux::{Action, ActionReducer, Chain, Interceptor};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestAction {
    Login(String, String),
    Ping(u32),
    /// Reducers built by `failing_reducer` reject this one.
    Boom,
}

impl Action for TestAction {}

pub type Log = Arc<Mutex<Vec<String>>>;

pub fn new_log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(log: &Log) -> Vec<String> {
    log.lock().clone()
}

pub fn spawn_ui() -> UiLoop {
    UiLoop::spawn("test-ui").expect("Failed to spawn UI loop")
}

/// Dispatcher that accepts `dispatch` from the test thread.
pub fn unverified(ui: &UiLoop) -> Dispatcher<TestAction> {
    Dispatcher::new(
        ui.handle(),
        DispatcherConfig {
            verify_threads: false,
        },
    )
}

/// Dispatcher that only accepts `dispatch` on the UI loop.
pub fn verified(ui: &UiLoop) -> Dispatcher<TestAction> {
    Dispatcher::new(ui.handle(), DispatcherConfig::default())
}

/// Reducer appending `"{name}"` (or `"{name}:{n}"` for pings) to `log`.
pub fn recording_reducer(name: &'static str, log: &Log) -> Arc<dyn ActionReducer<TestAction>> {
    let log = Arc::clone(log);
    Arc::new(move |action: &TestAction| -> anyhow::Result<()> {
        match action {
            TestAction::Ping(n) => log.lock().push(format!("{name}:{n}")),
            _ => log.lock().push(name.to_string()),
        }
        Ok(())
    })
}

/// Reducer that fails on `TestAction::Boom` and records everything else.
pub fn failing_reducer(name: &'static str, log: &Log) -> Arc<dyn ActionReducer<TestAction>> {
    let log = Arc::clone(log);
    Arc::new(move |action: &TestAction| -> anyhow::Result<()> {
        if *action == TestAction::Boom {
            anyhow::bail!("{name} rejected Boom");
        }
        log.lock().push(name.to_string());
        Ok(())
    })
}

/// Interceptor logging `"{name}-enter"` and `"{name}-exit"` around the rest
/// of the chain.
pub fn logging_interceptor(name: &'static str, log: &Log) -> Arc<dyn Interceptor<TestAction>> {
    let log = Arc::clone(log);
    Arc::new(
        move |action: TestAction, chain: &Chain<TestAction>| -> Result<TestAction, DispatchError> {
            log.lock().push(format!("{name}-enter"));
            let result = chain.proceed(action);
            log.lock().push(format!("{name}-exit"));
            result
        },
    )
}

/// Block until every job queued on `ui` so far has run.
pub fn flush(ui: &UiLoop) {
    ui.handle()
        .post_sync("flush", || ())
        .expect("UI loop closed");
}
