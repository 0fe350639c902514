use std::borrow::Cow;

/// The name and help description identifying a metric.
///
/// The name is the metric's identity within a registry and the leading token
/// of every exposition line it emits; the description becomes the `# HELP`
/// comment. Both are opaque to this crate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetricName {
    /// Metric identity, e.g. `algod_peers`.
    pub name: Cow<'static, str>,
    /// Human-readable help text.
    pub description: Cow<'static, str>,
}

impl MetricName {
    /// Create a new `MetricName`.
    ///
    /// ```
    /// use pullmetrics::MetricName;
    ///
    /// let name = MetricName::new("algod_peers", "connected peers");
    /// assert_eq!(name.name, "algod_peers");
    /// ```
    pub fn new(
        name: impl Into<Cow<'static, str>>,
        description: impl Into<Cow<'static, str>>,
    ) -> Self {
        MetricName {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// A key/value pair that partitions a metric into separate series.
///
/// Static string literals are borrowed rather than copied, so building a
/// label slice at an instrumentation site allocates nothing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Label {
    /// The label key.
    pub key: Cow<'static, str>,
    /// The label value.
    pub value: Cow<'static, str>,
}

impl Label {
    /// Create a new label pair.
    ///
    /// ```
    /// use pullmetrics::Label;
    ///
    /// let by_direction = Label::new("dir", "in");
    /// let by_peer = Label::new("peer", format!("peer-{}", 7));
    /// # assert_eq!(by_direction.key, "dir");
    /// # assert_eq!(by_peer.value, "peer-7");
    /// ```
    pub fn new(key: impl Into<Cow<'static, str>>, value: impl Into<Cow<'static, str>>) -> Self {
        Label {
            key: key.into(),
            value: value.into(),
        }
    }
}
