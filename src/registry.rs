//! Metric registries and the process-wide default.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock};

use tracing::error;

/// A self-describing metric that can render itself into a scrape buffer and
/// contribute to a telemetry snapshot.
///
/// Implementations are shared across threads behind [`Arc`] and must do
/// their own internal locking.
pub trait Metric: Send + Sync {
    /// Appends this metric's exposition lines to `buf`.
    ///
    /// `parent_labels` is a pre-rendered `key="value",...` string the
    /// caller wants attached to every sample, or `""` for none.
    fn write_metric(&self, buf: &mut String, parent_labels: &str);

    /// Merges this metric's current series into the snapshot `values`.
    fn add_metric(&self, values: &mut HashMap<String, f64>);
}

/// An ordered collection of metrics, scraped as a unit.
///
/// Registration keeps insertion order, and re-registering the same metric
/// adds a second entry; [`Registry::deregister`] removes every entry for
/// the given instance.
#[derive(Default)]
pub struct Registry {
    metrics: Mutex<Vec<Arc<dyn Metric>>>,
}

impl Registry {
    /// Creates an empty registry independent of the default one.
    pub fn new() -> Self {
        Registry::default()
    }

    /// Appends `metric` to this registry.
    pub fn register(&self, metric: Arc<dyn Metric>) {
        match self.metrics.lock() {
            Ok(mut metrics) => metrics.push(metric),
            Err(_) => error!("metrics registry lock poisoned; registration dropped"),
        }
    }

    /// Removes every entry holding the same instance as `metric`.
    ///
    /// Unknown metrics are ignored.
    pub fn deregister(&self, metric: Arc<dyn Metric>) {
        match self.metrics.lock() {
            Ok(mut metrics) => metrics.retain(|m| !Arc::ptr_eq(m, &metric)),
            Err(_) => error!("metrics registry lock poisoned; deregistration dropped"),
        }
    }

    /// Renders every registered metric into `buf`, in registration order.
    pub fn write_metrics(&self, buf: &mut String, parent_labels: &str) {
        match self.metrics.lock() {
            Ok(metrics) => {
                for metric in metrics.iter() {
                    metric.write_metric(buf, parent_labels);
                }
            }
            Err(_) => error!("metrics registry lock poisoned; scrape skipped"),
        }
    }

    /// Merges every registered metric into the snapshot `values`, in
    /// registration order.
    pub fn add_metrics(&self, values: &mut HashMap<String, f64>) {
        match self.metrics.lock() {
            Ok(metrics) => {
                for metric in metrics.iter() {
                    metric.add_metric(values);
                }
            }
            Err(_) => error!("metrics registry lock poisoned; snapshot skipped"),
        }
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.metrics.lock().map(|m| m.len()).unwrap_or(0);
        f.debug_struct("Registry").field("metrics", &count).finish()
    }
}

static DEFAULT_REGISTRY: OnceLock<Registry> = OnceLock::new();

/// Returns the process-wide default registry, creating it on first use.
///
/// Instruments constructed without an explicit registry end up here.
pub fn default_registry() -> &'static Registry {
    DEFAULT_REGISTRY.get_or_init(Registry::new)
}

/// Resolves an optional registry argument, falling back to the default.
pub(crate) fn registry_or_default(registry: Option<&Registry>) -> &Registry {
    registry.unwrap_or_else(|| default_registry())
}
