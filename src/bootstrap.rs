//! Store startup sequencing.
//!
//! Stores are initialized one after another in the order given, because a
//! store may read another store's state during its own `init()`.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::BootstrapConfig;
use crate::flux::Store;

/// Initialization cost of one store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreTiming {
    pub name: String,
    pub elapsed: Duration,
}

/// Result of [`init_stores`]: total time plus per-store breakdown, in
/// initialization order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitReport {
    pub total: Duration,
    pub stores: Vec<StoreTiming>,
}

impl InitReport {
    /// The most expensive store, if any were initialized.
    pub fn slowest(&self) -> Option<&StoreTiming> {
        self.stores.iter().max_by_key(|timing| timing.elapsed)
    }
}

impl fmt::Display for InitReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Initialized {} store(s) in {:.3} ms",
            self.stores.len(),
            as_millis(self.total)
        )?;
        for timing in &self.stores {
            writeln!(f, "  {:>9.3} ms  {}", as_millis(timing.elapsed), timing.name)?;
        }
        Ok(())
    }
}

fn as_millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

/// Initialize `stores` in order with the default [`BootstrapConfig`].
pub fn init_stores(stores: &[Arc<dyn Store>]) -> InitReport {
    init_stores_with(stores, &BootstrapConfig::default())
}

/// Initialize `stores` in order: `init()` then `prime_state()` for each,
/// timing both together.
///
/// Each store's cost is logged at `info` (`warn` above the slow threshold),
/// followed by the total. The same breakdown is returned as an [`InitReport`].
pub fn init_stores_with(stores: &[Arc<dyn Store>], config: &BootstrapConfig) -> InitReport {
    let threshold = config.slow_store_threshold();
    let started = Instant::now();
    let mut report = InitReport::default();

    for store in stores {
        let store_started = Instant::now();
        store.init();
        store.prime_state();
        let elapsed = store_started.elapsed();

        let elapsed_ms = as_millis(elapsed);
        if elapsed > threshold {
            tracing::warn!(store = %store.name(), elapsed_ms, "Slow store initialization");
        } else {
            tracing::info!(store = %store.name(), elapsed_ms, "Store initialized");
        }

        report.stores.push(StoreTiming {
            name: store.name().to_string(),
            elapsed,
        });
    }

    report.total = started.elapsed();
    tracing::info!(
        stores = report.stores.len(),
        total_ms = as_millis(report.total),
        "Stores initialized"
    );
    report
}

/// Dispose `stores` in reverse order.
///
/// Safe to call without a prior [`init_stores`]. A panicking `dispose()` is
/// logged and does not stop the remaining stores from being disposed.
pub fn dispose_stores(stores: &[Arc<dyn Store>]) {
    for store in stores.iter().rev() {
        if panic::catch_unwind(AssertUnwindSafe(|| store.dispose())).is_err() {
            tracing::error!(store = %store.name(), "Store dispose panicked");
        }
    }
}
