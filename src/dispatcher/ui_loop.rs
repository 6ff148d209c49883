//! The designated single-writer execution context.
//!
//! A `UiLoop` owns one named worker thread that runs posted jobs strictly in
//! submission order. Everything that mutates store state runs there.

use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};

use super::error::DispatchError;

type Job = Box<dyn FnOnce() + Send + 'static>;

enum Task {
    Run(Job),
    Stop,
}

/// Owner of the UI loop thread. Dropping it stops the loop.
pub struct UiLoop {
    handle: UiHandle,
    thread: Option<JoinHandle<()>>,
}

impl UiLoop {
    /// Start the loop on a new thread called `name`.
    pub fn spawn(name: &str) -> io::Result<Self> {
        let (tx, rx) = mpsc::channel();
        let thread = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || run_loop(rx))?;

        let handle = UiHandle {
            sender: tx,
            thread_id: thread.thread().id(),
            name: Arc::from(name),
        };
        tracing::debug!(thread = %name, "UI loop spawned");

        Ok(Self {
            handle,
            thread: Some(thread),
        })
    }

    /// Clonable handle for posting work and checking affinity.
    pub fn handle(&self) -> UiHandle {
        self.handle.clone()
    }

    /// Stop accepting work once the already queued jobs have run, then wait
    /// for the thread to exit.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };
        let _ = self.handle.sender.send(Task::Stop);

        // Joining from the loop itself would never return.
        if self.handle.is_current() {
            return;
        }
        if thread.join().is_err() {
            tracing::error!(thread = %self.handle.name, "UI loop thread panicked");
        }
        tracing::debug!(thread = %self.handle.name, "UI loop stopped");
    }
}

impl Drop for UiLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for UiLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiLoop")
            .field("name", &self.handle.name)
            .field("running", &self.thread.is_some())
            .finish()
    }
}

/// Cheap handle to a [`UiLoop`].
#[derive(Clone)]
pub struct UiHandle {
    sender: Sender<Task>,
    thread_id: ThreadId,
    name: Arc<str>,
}

impl UiHandle {
    /// Whether the calling thread is the loop thread.
    pub fn is_current(&self) -> bool {
        thread::current().id() == self.thread_id
    }

    /// Name of the loop thread.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queue `job` and return immediately.
    pub fn post<F>(&self, job: F) -> Result<(), DispatchError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.sender
            .send(Task::Run(Box::new(job)))
            .map_err(|_| DispatchError::LoopClosed)
    }

    /// Queue `job` and block until it has run on the loop, returning its
    /// result.
    ///
    /// Refuses to run from the loop thread itself, where waiting would
    /// deadlock. A panic inside `job` is re-raised on the calling thread.
    pub fn post_sync<F, R>(&self, operation: &'static str, job: F) -> Result<R, DispatchError>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        if self.is_current() {
            return Err(DispatchError::SyncOnUiThread { operation });
        }

        let (done_tx, done_rx) = mpsc::sync_channel(1);
        self.post(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(job));
            let _ = done_tx.send(outcome);
        })?;

        match done_rx.recv() {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(payload)) => panic::resume_unwind(payload),
            // Loop stopped before reaching the job.
            Err(_) => Err(DispatchError::LoopClosed),
        }
    }
}

impl std::fmt::Debug for UiHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiHandle")
            .field("name", &self.name)
            .field("thread_id", &self.thread_id)
            .finish()
    }
}

fn run_loop(rx: Receiver<Task>) {
    while let Ok(task) = rx.recv() {
        match task {
            Task::Run(job) => {
                if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(job)) {
                    tracing::error!(panic = %panic_message(&*payload), "UI loop job panicked");
                }
            }
            Task::Stop => break,
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}
