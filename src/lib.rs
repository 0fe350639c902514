//! Self-registering, pull-based metrics with plain-text exposition.
//!
//! Instruments created here add themselves to a process-wide default
//! [`Registry`]; a scrape handler asks the registry to render every
//! registered metric into one text buffer whenever it is polled. There is
//! no background collection and no pipeline to configure: updating an
//! instrument is a mutation of in-process state, and reading it out is a
//! traversal of that state.
//!
//! Two instruments are provided. A [`Gauge`] holds a value per label
//! combination that can move freely via [`Gauge::add`] and [`Gauge::set`].
//! A [`Counter`] only accumulates, and keeps its unlabeled total in an
//! atomic so hot paths skip the lock.
//!
//! # Getting started
//!
//! ```
//! use pullmetrics::{Gauge, Label, MetricName};
//!
//! let peers = Gauge::new(MetricName::new("algod_peers", "connected peers"));
//! peers.add(1.0, &[Label::new("dir", "in")]);
//! peers.add(1.0, &[Label::new("dir", "out")]);
//! peers.add(1.0, &[Label::new("dir", "in")]);
//!
//! let mut exposition = String::new();
//! pullmetrics::default_registry().write_metrics(&mut exposition, "");
//! assert!(exposition.contains(r#"algod_peers{dir="in"} 2"#));
//!
//! peers.deregister(None);
//! ```
//!
//! # Labels
//!
//! Each distinct label combination becomes its own series with its own
//! value and its own exposition line. Label order does not matter, and
//! duplicate keys collapse to the last value given. Internally every
//! distinct `key:value` token is assigned a power-of-two weight on first
//! sight and a combination is identified by the sum of its weights, so an
//! instrument supports at most 128 distinct tokens over its lifetime;
//! observations beyond that are logged and dropped rather than risking two
//! combinations sharing a series.
//!
//! # Errors
//!
//! Instrumentation must never take the host process down, so nothing here
//! returns `Result` and nothing panics. An observation or scrape that
//! cannot proceed is logged through [`tracing`] and skipped.
#![warn(
    future_incompatible,
    missing_debug_implementations,
    missing_docs,
    nonstandard_style,
    rust_2018_idioms,
    unreachable_pub,
    unused
)]

mod common;
mod counter;
mod exposition;
mod gauge;
mod internal;
mod registry;
mod sanitize;

pub use common::{Label, MetricName};
pub use counter::Counter;
pub use gauge::Gauge;
pub use registry::{default_registry, Metric, Registry};
