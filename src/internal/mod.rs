//! Label-indexing internals shared by the multi-dimensional instruments.
//!
//! Every instrument owns one [`ValueMap`] behind its mutex. The map encodes
//! each label combination as a composite integer index so that updates do
//! not re-hash or sort the full label set: each distinct `"key:value"`
//! token is assigned a power-of-two weight the first time it is seen, and a
//! label set is identified by the sum of its token weights. The sum is
//! commutative, so the index is independent of label order, and because the
//! weights are distinct powers of two it is collision-free while the token
//! count stays within [`MAX_LABEL_TOKENS`].

use std::collections::HashMap;
use std::fmt::Write;

use crate::common::Label;

/// Maximum number of distinct `"key:value"` tokens one instrument can
/// observe over its lifetime.
///
/// Weights are `u128` bits, so up to 128 tokens sum without collision; an
/// observation that would introduce a token beyond the limit is dropped by
/// the owning instrument rather than risking two label sets sharing an
/// index.
pub(crate) const MAX_LABEL_TOKENS: usize = 128;

/// Assigns each distinct `"key:value"` token a power-of-two weight.
///
/// The n-th distinct token ever seen gets weight `1 << n`, assigned once
/// and never changed.
#[derive(Default)]
pub(crate) struct LabelIndex {
    weights: HashMap<String, u128>,
}

impl LabelIndex {
    /// Sums the weights of all tokens in `pairs`, assigning fresh weights
    /// to tokens seen for the first time.
    ///
    /// Returns `None`, without assigning any weight, when the new tokens in
    /// `pairs` would push this instrument past [`MAX_LABEL_TOKENS`].
    fn resolve(&mut self, pairs: &[(&str, &str)]) -> Option<u128> {
        let tokens: Vec<String> = pairs.iter().map(|(k, v)| format!("{k}:{v}")).collect();

        let unseen = tokens
            .iter()
            .filter(|t| !self.weights.contains_key(t.as_str()))
            .count();
        if self.weights.len() + unseen > MAX_LABEL_TOKENS {
            return None;
        }

        let mut index = 0u128;
        for token in tokens {
            // Shift only on insert: at full capacity a known token must
            // still resolve, and its weight is already in the map.
            let len = self.weights.len();
            index += *self.weights.entry(token).or_insert_with(|| 1u128 << len);
        }
        Some(index)
    }
}

/// One recorded series: the current value and the label rendering frozen
/// when the series was first created.
pub(crate) struct Series {
    pub(crate) value: f64,
    pub(crate) formatted_labels: String,
}

impl Series {
    /// Whether this series carries any labels.
    pub(crate) fn has_labels(&self) -> bool {
        !self.formatted_labels.is_empty()
    }
}

/// Maps composite label indices to their recorded series.
///
/// One instance per instrument, guarded by the instrument's mutex together
/// with its [`LabelIndex`]. Series are created lazily on first update and
/// never removed.
#[derive(Default)]
pub(crate) struct ValueMap {
    index: LabelIndex,
    series: HashMap<u128, Series>,
}

impl ValueMap {
    /// Applies `apply` to the value recorded for `labels`, creating the
    /// series with value `0.0` on first encounter.
    ///
    /// Duplicate keys within `labels` collapse to the last value given.
    /// Returns `false` when the observation was dropped because `labels`
    /// would exceed [`MAX_LABEL_TOKENS`].
    pub(crate) fn update(&mut self, labels: &[Label], apply: impl FnOnce(&mut f64)) -> bool {
        let pairs = dedup_labels(labels);
        let Some(index) = self.index.resolve(&pairs) else {
            return false;
        };
        let series = self.series.entry(index).or_insert_with(|| Series {
            value: 0.0,
            formatted_labels: format_labels(&pairs),
        });
        apply(&mut series.value);
        true
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Iterates the recorded series in the map's native, unordered way.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Series> {
        self.series.values()
    }
}

/// Collapses duplicate keys, keeping the last value for each.
fn dedup_labels(labels: &[Label]) -> Vec<(&str, &str)> {
    let mut pairs: Vec<(&str, &str)> = Vec::with_capacity(labels.len());
    for label in labels {
        match pairs.iter_mut().find(|(k, _)| *k == label.key) {
            Some(pair) => pair.1 = &label.value,
            None => pairs.push((&label.key, &label.value)),
        }
    }
    pairs
}

/// Renders `pairs` as `k1="v1",k2="v2"`, sorted by key.
///
/// Runs once per series, at creation; values are written verbatim.
fn format_labels(pairs: &[(&str, &str)]) -> String {
    let mut sorted = pairs.to_vec();
    sorted.sort_unstable_by(|a, b| a.0.cmp(b.0));

    let mut out = String::new();
    for (i, (key, value)) in sorted.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        let _ = write!(out, "{key}=\"{value}\"");
    }
    out
}
