//! Poll metrics tracking using OpenTelemetry.

use opentelemetry::KeyValue;
use opentelemetry::metrics::{Counter, Gauge, Histogram, Meter};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Metrics collector for poll and publish operations.
///
/// # Examples
///
/// ```rust,no_run
/// use hotswap_poll::metrics::PollMetrics;
/// use opentelemetry::global;
///
/// let metrics = PollMetrics::new(global::meter("hotswap-poll"));
///
/// let started = metrics.start_long_poll();
/// // ... wait for newer data ...
/// metrics.record_long_poll(started, true);
/// ```
#[derive(Clone)]
pub struct PollMetrics {
    peeks: Counter<u64>,
    long_polls: Counter<u64>,
    long_poll_timeouts: Counter<u64>,
    long_poll_wait: Histogram<f64>,
    publishes: Counter<u64>,
    producer_failures: Counter<u64>,
    waiting: Gauge<i64>,
    value_age_seconds: Gauge<i64>,
    last_publish: Arc<parking_lot::Mutex<Instant>>,
    last_waiting: Arc<AtomicUsize>,
}

impl PollMetrics {
    /// Create a new metrics collector with the provided meter.
    pub fn new(meter: Meter) -> Self {
        let peeks = meter
            .u64_counter("hotswap_poll.peek.requests")
            .with_description("Number of peek requests, labelled by result")
            .build();

        let long_polls = meter
            .u64_counter("hotswap_poll.long_poll.requests")
            .with_description("Number of completed long polls")
            .build();

        let long_poll_timeouts = meter
            .u64_counter("hotswap_poll.long_poll.timeouts")
            .with_description("Number of long polls that ended without newer data")
            .build();

        let long_poll_wait = meter
            .f64_histogram("hotswap_poll.long_poll.wait")
            .with_description("Time a long poll spent waiting in seconds")
            .with_unit("s")
            .build();

        let publishes = meter
            .u64_counter("hotswap_poll.publish.count")
            .with_description("Number of versions published")
            .build();

        let producer_failures = meter
            .u64_counter("hotswap_poll.publish.producer_failures")
            .with_description("Number of updater ticks skipped because the producer failed")
            .build();

        let waiting = meter
            .i64_gauge("hotswap_poll.waiters.active")
            .with_description("Number of suspended long polls")
            .build();

        let value_age_seconds = meter
            .i64_gauge("hotswap_poll.value.age")
            .with_description("Time since the last published version in seconds")
            .with_unit("s")
            .build();

        Self {
            peeks,
            long_polls,
            long_poll_timeouts,
            long_poll_wait,
            publishes,
            producer_failures,
            waiting,
            value_age_seconds,
            last_publish: Arc::new(parking_lot::Mutex::new(Instant::now())),
            last_waiting: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Record a peek and whether it found newer data.
    pub fn record_peek(&self, fresh: bool) {
        let result = if fresh { "update" } else { "no_update" };
        self.peeks.add(1, &[KeyValue::new("result", result)]);
    }

    /// Mark the start of a long poll.
    pub fn start_long_poll(&self) -> Instant {
        Instant::now()
    }

    /// Record a finished long poll started at `start`.
    pub fn record_long_poll(&self, start: Instant, fresh: bool) {
        self.long_polls.add(1, &[]);
        if !fresh {
            self.long_poll_timeouts.add(1, &[]);
        }
        self.long_poll_wait
            .record(start.elapsed().as_secs_f64(), &[KeyValue::new("fresh", fresh)]);
    }

    /// Record a published version.
    pub fn record_publish(&self) {
        self.publishes.add(1, &[]);
        *self.last_publish.lock() = Instant::now();
    }

    /// Record an updater tick skipped by a failing producer.
    pub fn record_producer_failure(&self) {
        self.producer_failures.add(1, &[]);
    }

    /// Update the number of suspended long polls.
    pub fn update_waiting(&self, count: usize) {
        self.last_waiting.store(count, Ordering::Relaxed);
        self.waiting.record(i64::try_from(count).unwrap_or(i64::MAX), &[]);
    }

    /// The waiter count last passed to [`update_waiting`](Self::update_waiting).
    pub fn waiting(&self) -> usize {
        self.last_waiting.load(Ordering::Relaxed)
    }

    /// Time since the last published version.
    pub fn value_age(&self) -> Duration {
        self.last_publish.lock().elapsed()
    }

    /// Update the age of the current value.
    ///
    /// Call periodically; the age resets on every publish.
    pub fn update_value_age(&self) {
        let age_secs = self.value_age().as_secs();
        self.value_age_seconds
            .record(i64::try_from(age_secs).unwrap_or(i64::MAX), &[]);
    }
}
