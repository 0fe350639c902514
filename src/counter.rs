//! The monotonically increasing counter instrument.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{error, warn};

use crate::common::{Label, MetricName};
use crate::exposition::{write_header, write_sample};
use crate::internal::{Series, ValueMap};
use crate::registry::{registry_or_default, Metric, Registry};
use crate::sanitize::sanitize_telemetry_name;

/// A value that only goes up, tracked per label combination.
///
/// Unlabeled increments are the common case on hot paths, so they bypass
/// the mutex entirely and accumulate in an atomic; labeled increments share
/// the locked series map with [`Gauge`](crate::Gauge). At render time the
/// atomic total is folded into the unlabeled sample line.
///
/// Creating a counter registers it with the default registry.
///
/// # Examples
///
/// ```
/// use pullmetrics::{Counter, MetricName};
///
/// let txs = Counter::new(MetricName::new("algod_tx", "transactions seen"));
/// txs.inc(&[]);
/// txs.add(2, &[]);
/// assert_eq!(txs.value(), 3);
///
/// txs.deregister(None);
/// ```
pub struct Counter {
    name: Cow<'static, str>,
    description: Cow<'static, str>,
    fast_value: AtomicU64,
    values: Mutex<ValueMap>,
}

impl Counter {
    /// Creates a counter and registers it with the default registry.
    pub fn new(metric: MetricName) -> Arc<Counter> {
        let counter = Arc::new(Counter {
            name: metric.name,
            description: metric.description,
            fast_value: AtomicU64::new(0),
            values: Mutex::new(ValueMap::default()),
        });
        counter.register(None);
        counter
    }

    /// Increments the value recorded for `labels` by one.
    pub fn inc(&self, labels: &[Label]) {
        self.add(1, labels);
    }

    /// Adds `x` to the value recorded for `labels`.
    pub fn add(&self, x: u64, labels: &[Label]) {
        if labels.is_empty() {
            self.fast_add(x);
        } else {
            self.update(labels, x as f64);
        }
    }

    /// The total accumulated by unlabeled increments.
    pub fn value(&self) -> u64 {
        self.fast_value.load(Ordering::Relaxed)
    }

    fn fast_add(&self, x: u64) {
        // The first real increment materializes the unlabeled series so a
        // scrape has a line to fold the atomic total into.
        if self.fast_value.fetch_add(x, Ordering::Relaxed) == 0 && x > 0 {
            self.update(&[], 0.0);
        }
    }

    fn update(&self, labels: &[Label], delta: f64) {
        match self.values.lock() {
            Ok(mut values) => {
                if !values.update(labels, |value| *value += delta) {
                    warn!(
                        metric = %self.name,
                        "label token limit reached; observation dropped"
                    );
                }
            }
            Err(_) => error!(metric = %self.name, "counter lock poisoned; observation dropped"),
        }
    }

    /// Adds this counter to `registry`, or to the default registry when
    /// `None` is given.
    pub fn register(self: &Arc<Self>, registry: Option<&Registry>) {
        let metric = Arc::clone(self);
        registry_or_default(registry).register(metric);
    }

    /// Removes this counter from `registry`, or from the default registry
    /// when `None` is given.
    pub fn deregister(self: &Arc<Self>, registry: Option<&Registry>) {
        let metric = Arc::clone(self);
        registry_or_default(registry).deregister(metric);
    }

    fn merged_value(&self, series: &Series) -> f64 {
        if series.has_labels() {
            series.value
        } else {
            series.value + self.value() as f64
        }
    }
}

impl Metric for Counter {
    fn write_metric(&self, buf: &mut String, parent_labels: &str) {
        let values = match self.values.lock() {
            Ok(values) => values,
            Err(_) => {
                error!(metric = %self.name, "counter lock poisoned; scrape skipped");
                return;
            }
        };
        if values.is_empty() {
            return;
        }

        write_header(buf, &self.name, &self.description, "counter");
        for series in values.iter() {
            write_sample(
                buf,
                &self.name,
                parent_labels,
                &series.formatted_labels,
                self.merged_value(series),
            );
        }
    }

    fn add_metric(&self, values: &mut HashMap<String, f64>) {
        let map = match self.values.lock() {
            Ok(map) => map,
            Err(_) => {
                error!(metric = %self.name, "counter lock poisoned; snapshot skipped");
                return;
            }
        };

        for series in map.iter() {
            let key = if series.has_labels() {
                format!("{}:{}", self.name, series.formatted_labels)
            } else {
                self.name.to_string()
            };
            values.insert(sanitize_telemetry_name(&key), self.merged_value(series));
        }
    }
}

impl fmt::Debug for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Counter")
            .field("name", &self.name)
            .field("total", &self.value())
            .finish()
    }
}
