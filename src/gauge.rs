//! The multi-dimensional gauge instrument.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::{error, warn};

use crate::common::{Label, MetricName};
use crate::exposition::{write_header, write_sample};
use crate::internal::ValueMap;
use crate::registry::{registry_or_default, Metric, Registry};
use crate::sanitize::sanitize_telemetry_name;

/// A value that can move up and down, tracked per label combination.
///
/// Creating a gauge registers it with the default registry, so a freshly
/// constructed instrument is already part of the next scrape. Updates never
/// fail from the caller's point of view; an observation that cannot be
/// recorded is logged and dropped.
///
/// # Examples
///
/// ```
/// use pullmetrics::{Gauge, Label, MetricName};
///
/// let peers = Gauge::new(MetricName::new("algod_peers", "connected peers"));
/// peers.add(1.0, &[Label::new("dir", "in")]);
///
/// let mut buf = String::new();
/// pullmetrics::default_registry().write_metrics(&mut buf, "");
/// assert!(buf.contains(r#"algod_peers{dir="in"} 1"#));
///
/// peers.deregister(None);
/// ```
pub struct Gauge {
    name: Cow<'static, str>,
    description: Cow<'static, str>,
    values: Mutex<ValueMap>,
}

impl Gauge {
    /// Creates a gauge and registers it with the default registry.
    pub fn new(metric: MetricName) -> Arc<Gauge> {
        let gauge = Arc::new(Gauge {
            name: metric.name,
            description: metric.description,
            values: Mutex::new(ValueMap::default()),
        });
        gauge.register(None);
        gauge
    }

    /// Adds `x` to the value recorded for `labels`.
    ///
    /// A label combination seen for the first time starts at `0.0`, so its
    /// first `add` records the delta itself.
    pub fn add(&self, x: f64, labels: &[Label]) {
        self.update(labels, |value| *value += x);
    }

    /// Overwrites the value recorded for `labels` with `x`.
    pub fn set(&self, x: f64, labels: &[Label]) {
        self.update(labels, |value| *value = x);
    }

    fn update(&self, labels: &[Label], apply: impl FnOnce(&mut f64)) {
        match self.values.lock() {
            Ok(mut values) => {
                if !values.update(labels, apply) {
                    warn!(
                        metric = %self.name,
                        "label token limit reached; observation dropped"
                    );
                }
            }
            Err(_) => error!(metric = %self.name, "gauge lock poisoned; observation dropped"),
        }
    }

    /// Adds this gauge to `registry`, or to the default registry when
    /// `None` is given.
    ///
    /// [`Gauge::new`] already registers with the default registry; calling
    /// this again there would make the gauge render twice per scrape.
    pub fn register(self: &Arc<Self>, registry: Option<&Registry>) {
        let metric = Arc::clone(self);
        registry_or_default(registry).register(metric);
    }

    /// Removes this gauge from `registry`, or from the default registry
    /// when `None` is given.
    pub fn deregister(self: &Arc<Self>, registry: Option<&Registry>) {
        let metric = Arc::clone(self);
        registry_or_default(registry).deregister(metric);
    }
}

impl Metric for Gauge {
    /// Renders `# HELP` / `# TYPE` and one sample line per recorded label
    /// combination. A gauge that has never been updated renders nothing.
    fn write_metric(&self, buf: &mut String, parent_labels: &str) {
        let values = match self.values.lock() {
            Ok(values) => values,
            Err(_) => {
                error!(metric = %self.name, "gauge lock poisoned; scrape skipped");
                return;
            }
        };
        if values.is_empty() {
            return;
        }

        write_header(buf, &self.name, &self.description, "gauge");
        for series in values.iter() {
            write_sample(
                buf,
                &self.name,
                parent_labels,
                &series.formatted_labels,
                series.value,
            );
        }
    }

    fn add_metric(&self, values: &mut HashMap<String, f64>) {
        let map = match self.values.lock() {
            Ok(map) => map,
            Err(_) => {
                error!(metric = %self.name, "gauge lock poisoned; snapshot skipped");
                return;
            }
        };

        for series in map.iter() {
            let key = if series.has_labels() {
                format!("{}:{}", self.name, series.formatted_labels)
            } else {
                self.name.to_string()
            };
            values.insert(sanitize_telemetry_name(&key), series.value);
        }
    }
}

impl fmt::Debug for Gauge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let series = self.values.lock().map(|v| v.iter().count()).unwrap_or(0);
        f.debug_struct("Gauge")
            .field("name", &self.name)
            .field("series", &series)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internal::MAX_LABEL_TOKENS;
    use crate::registry::default_registry;

    fn scrape(gauge: &Arc<Gauge>, parent_labels: &str) -> String {
        let mut buf = String::new();
        gauge.write_metric(&mut buf, parent_labels);
        buf
    }

    fn sorted_data_lines(exposition: &str) -> Vec<&str> {
        let mut lines: Vec<&str> = exposition
            .lines()
            .filter(|line| !line.starts_with('#'))
            .collect();
        lines.sort_unstable();
        lines
    }

    #[test]
    fn add_accumulates_per_label_combination() {
        let gauge = Gauge::new(MetricName::new("algod_peers", "connected peers"));
        gauge.deregister(None);

        gauge.add(1.0, &[Label::new("dir", "in")]);
        gauge.add(1.0, &[Label::new("dir", "in")]);
        gauge.add(1.0, &[Label::new("dir", "out")]);

        let out = scrape(&gauge, "");
        assert!(out.starts_with(
            "# HELP algod_peers connected peers\n# TYPE algod_peers gauge\n"
        ));
        assert_eq!(
            sorted_data_lines(&out),
            vec![
                r#"algod_peers{dir="in"} 2"#,
                r#"algod_peers{dir="out"} 1"#,
            ]
        );
    }

    #[test]
    fn set_overwrites_the_recorded_value() {
        let gauge = Gauge::new(MetricName::new("algod_peers", "connected peers"));
        gauge.deregister(None);

        gauge.set(3.0, &[]);
        gauge.set(7.0, &[]);

        assert_eq!(
            scrape(&gauge, ""),
            "# HELP algod_peers connected peers\n# TYPE algod_peers gauge\nalgod_peers 7\n"
        );
    }

    #[test]
    fn untouched_gauge_renders_nothing() {
        let gauge = Gauge::new(MetricName::new("algod_peers", "connected peers"));
        gauge.deregister(None);
        assert_eq!(scrape(&gauge, ""), "");

        let mut values = HashMap::new();
        gauge.add_metric(&mut values);
        assert!(values.is_empty());
    }

    #[test]
    fn parent_labels_precede_series_labels() {
        let gauge = Gauge::new(MetricName::new("algod_peers", "connected peers"));
        gauge.deregister(None);

        gauge.add(1.0, &[Label::new("dir", "in")]);
        gauge.set(7.0, &[]);

        let out = scrape(&gauge, r#"host="n1""#);
        assert_eq!(
            sorted_data_lines(&out),
            vec![
                r#"algod_peers{host="n1",dir="in"} 1"#,
                r#"algod_peers{host="n1"} 7"#,
            ]
        );
    }

    #[test]
    fn snapshot_keys_join_name_and_labels() {
        let gauge = Gauge::new(MetricName::new("algod_peers", "connected peers"));
        gauge.deregister(None);

        gauge.add(2.0, &[Label::new("dir", "in")]);
        gauge.set(7.0, &[]);

        let mut values = HashMap::new();
        gauge.add_metric(&mut values);
        assert_eq!(values.len(), 2);
        assert_eq!(values[r#"algod_peers:dir="in""#], 2.0);
        assert_eq!(values["algod_peers"], 7.0);
    }

    #[test]
    fn new_gauges_join_the_default_registry() {
        let gauge = Gauge::new(MetricName::new("gauge_default_probe", "probe"));
        gauge.set(1.0, &[]);

        let mut buf = String::new();
        default_registry().write_metrics(&mut buf, "");
        gauge.deregister(None);
        assert!(buf.contains("gauge_default_probe 1\n"));

        buf.clear();
        default_registry().write_metrics(&mut buf, "");
        assert!(!buf.contains("gauge_default_probe"));
    }

    #[test]
    fn explicit_registry_overrides_the_default() {
        let registry = Registry::new();
        let gauge = Gauge::new(MetricName::new("algod_peers", "connected peers"));
        gauge.deregister(None);
        gauge.register(Some(&registry));

        gauge.set(7.0, &[]);

        let mut buf = String::new();
        registry.write_metrics(&mut buf, "");
        assert!(buf.contains("algod_peers 7\n"));

        gauge.deregister(Some(&registry));
        buf.clear();
        registry.write_metrics(&mut buf, "");
        assert!(buf.is_empty());
    }

    #[test]
    fn observations_past_the_token_limit_are_dropped() {
        let gauge = Gauge::new(MetricName::new("gauge_limit_probe", "probe"));
        gauge.deregister(None);

        for i in 0..MAX_LABEL_TOKENS {
            gauge.set(1.0, &[Label::new("k", i.to_string())]);
        }
        gauge.set(1.0, &[Label::new("k", "overflow")]);
        gauge.add(1.0, &[Label::new("k", "0")]);

        let out = scrape(&gauge, "");
        assert!(!out.contains("overflow"));
        assert!(out.contains(r#"gauge_limit_probe{k="0"} 2"#));
    }
}
