//! Metrics recorded around STS calls.
//!
//! | Metric | Type | Description |
//! |--------|------|-------------|
//! | `aws.assumeRole` | Histogram (seconds) | Latency of each `AssumeRole` call |
//! | `stsAssumeRole.executingRequests` | Gauge | `AssumeRole` calls currently in flight |
//!
//! The gateway only talks to a [`MetricsSink`]. [`MetricsFacade`] forwards to
//! the `metrics` crate, so whichever recorder the process installs receives
//! the values; without one they are dropped.

use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use metrics::{describe_gauge, describe_histogram, gauge, histogram, Unit};

pub mod names {
    /// Histogram: `AssumeRole` latency in seconds.
    pub const ASSUME_ROLE_DURATION: &str = "aws.assumeRole";
    /// Gauge: `AssumeRole` calls in flight.
    pub const EXECUTING_REQUESTS: &str = "stsAssumeRole.executingRequests";
}

pub trait MetricsSink {
    fn record_duration(&self, name: &'static str, elapsed: Duration);
    fn increment(&self, name: &'static str);
    fn decrement(&self, name: &'static str);
}

impl<T: MetricsSink + ?Sized> MetricsSink for Arc<T> {
    fn record_duration(&self, name: &'static str, elapsed: Duration) {
        (**self).record_duration(name, elapsed)
    }

    fn increment(&self, name: &'static str) {
        (**self).increment(name)
    }

    fn decrement(&self, name: &'static str) {
        (**self).decrement(name)
    }
}

static METRICS_DESCRIBED: OnceLock<()> = OnceLock::new();

/// Registers metric descriptions with the installed recorder.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn describe_metrics() {
    METRICS_DESCRIBED.get_or_init(|| {
        describe_histogram!(
            names::ASSUME_ROLE_DURATION,
            Unit::Seconds,
            "Duration of STS AssumeRole calls"
        );
        describe_gauge!(
            names::EXECUTING_REQUESTS,
            "Number of STS AssumeRole calls in flight"
        );
    });
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MetricsFacade;

impl MetricsSink for MetricsFacade {
    fn record_duration(&self, name: &'static str, elapsed: Duration) {
        histogram!(name).record(elapsed.as_secs_f64());
    }

    fn increment(&self, name: &'static str) {
        gauge!(name).increment(1.0);
    }

    fn decrement(&self, name: &'static str) {
        gauge!(name).decrement(1.0);
    }
}

/// Marks one `AssumeRole` call as in flight until dropped.
///
/// Dropping the guard decrements the in-flight gauge and records the elapsed
/// time, whichever way the call ends.
pub struct InFlight<'a, M: MetricsSink + ?Sized> {
    sink: &'a M,
    started: Instant,
}

impl<'a, M: MetricsSink + ?Sized> InFlight<'a, M> {
    pub fn start(sink: &'a M) -> Self {
        let started = Instant::now();
        sink.increment(names::EXECUTING_REQUESTS);
        InFlight { sink, started }
    }
}

impl<M: MetricsSink + ?Sized> Drop for InFlight<'_, M> {
    fn drop(&mut self) {
        self.sink.decrement(names::EXECUTING_REQUESTS);
        self.sink
            .record_duration(names::ASSUME_ROLE_DURATION, self.started.elapsed());
    }
}
