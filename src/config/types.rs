use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub dispatcher: DispatcherConfig,
    #[serde(default)]
    pub ui_loop: UiLoopConfig,
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
}

/// Dispatcher behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatcherConfig {
    /// Reject `dispatch` calls made outside the UI loop (default: true).
    /// Turning this off is meant for tests that dispatch from the test thread.
    #[serde(default = "default_verify_threads")]
    pub verify_threads: bool,
}

/// The single-writer execution context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiLoopConfig {
    /// Name given to the UI loop thread (default: "uniflow-ui").
    #[serde(default = "default_thread_name")]
    pub thread_name: String,
}

/// Store bootstrap reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// Stores whose initialization takes longer than this are logged at warn
    /// level (default: 16, about one frame at 60 Hz).
    #[serde(default = "default_slow_store_threshold_ms")]
    pub slow_store_threshold_ms: u64,
}

impl BootstrapConfig {
    pub fn slow_store_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_store_threshold_ms)
    }
}

fn default_verify_threads() -> bool {
    true
}

fn default_thread_name() -> String {
    "uniflow-ui".to_string()
}

fn default_slow_store_threshold_ms() -> u64 {
    16
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            verify_threads: default_verify_threads(),
        }
    }
}

impl Default for UiLoopConfig {
    fn default() -> Self {
        Self {
            thread_name: default_thread_name(),
        }
    }
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            slow_store_threshold_ms: default_slow_store_threshold_ms(),
        }
    }
}
