//! Crawl Metrics (C3): thread-safe counters for operator telemetry. Not on
//! the hot path of any crawl decision (spec §4.3).

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::models::FailureType;

#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub retried_requests: u64,
    pub permanent_failures: u64,
    pub circuit_breaker_triggered: u64,
    pub rate_limited_requests: u64,
    pub failure_type_counts: HashMap<String, u64>,
}

#[derive(Default)]
struct Counters {
    total_requests: AtomicU64,
    successful_requests: AtomicU64,
    failed_requests: AtomicU64,
    retried_requests: AtomicU64,
    permanent_failures: AtomicU64,
    circuit_breaker_triggered: AtomicU64,
    rate_limited_requests: AtomicU64,
}

pub struct CrawlMetrics {
    global: Counters,
    per_domain: Mutex<HashMap<String, Counters>>,
    failure_histogram: Mutex<HashMap<&'static str, u64>>,
}

impl Default for CrawlMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl CrawlMetrics {
    pub fn new() -> Self {
        Self {
            global: Counters::default(),
            per_domain: Mutex::new(HashMap::new()),
            failure_histogram: Mutex::new(HashMap::new()),
        }
    }

    pub fn record_request(&self, domain: &str) {
        self.global.total_requests.fetch_add(1, Ordering::Relaxed);
        self.with_domain(domain, |c| {
            c.total_requests.fetch_add(1, Ordering::Relaxed);
        });
    }

    pub fn record_success(&self, domain: &str) {
        self.global.successful_requests.fetch_add(1, Ordering::Relaxed);
        self.with_domain(domain, |c| {
            c.successful_requests.fetch_add(1, Ordering::Relaxed);
        });
    }

    pub fn record_failure(&self, domain: &str, failure_type: FailureType) {
        self.global.failed_requests.fetch_add(1, Ordering::Relaxed);
        self.with_domain(domain, |c| {
            c.failed_requests.fetch_add(1, Ordering::Relaxed);
        });
        if failure_type == FailureType::Permanent {
            self.global.permanent_failures.fetch_add(1, Ordering::Relaxed);
        }
        let key = crate::crawler::failure_classifier::description(failure_type);
        *self.failure_histogram.lock().unwrap().entry(key).or_insert(0) += 1;
    }

    pub fn record_retry(&self) {
        self.global.retried_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_circuit_breaker_triggered(&self) {
        self.global.circuit_breaker_triggered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rate_limited(&self, domain: &str) {
        self.global.rate_limited_requests.fetch_add(1, Ordering::Relaxed);
        self.with_domain(domain, |c| {
            c.rate_limited_requests.fetch_add(1, Ordering::Relaxed);
        });
    }

    fn with_domain(&self, domain: &str, f: impl FnOnce(&Counters)) {
        let mut guard = self.per_domain.lock().unwrap();
        let counters = guard.entry(domain.to_string()).or_insert_with(Counters::default);
        f(counters);
    }

    /// Immutable snapshot reader for the global counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_requests: self.global.total_requests.load(Ordering::Relaxed),
            successful_requests: self.global.successful_requests.load(Ordering::Relaxed),
            failed_requests: self.global.failed_requests.load(Ordering::Relaxed),
            retried_requests: self.global.retried_requests.load(Ordering::Relaxed),
            permanent_failures: self.global.permanent_failures.load(Ordering::Relaxed),
            circuit_breaker_triggered: self.global.circuit_breaker_triggered.load(Ordering::Relaxed),
            rate_limited_requests: self.global.rate_limited_requests.load(Ordering::Relaxed),
            failure_type_counts: self
                .failure_histogram
                .lock()
                .unwrap()
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
        }
    }

    pub fn domain_snapshot(&self, domain: &str) -> MetricsSnapshot {
        let guard = self.per_domain.lock().unwrap();
        match guard.get(domain) {
            Some(c) => MetricsSnapshot {
                total_requests: c.total_requests.load(Ordering::Relaxed),
                successful_requests: c.successful_requests.load(Ordering::Relaxed),
                failed_requests: c.failed_requests.load(Ordering::Relaxed),
                retried_requests: 0,
                permanent_failures: 0,
                circuit_breaker_triggered: 0,
                rate_limited_requests: c.rate_limited_requests.load(Ordering::Relaxed),
                failure_type_counts: HashMap::new(),
            },
            None => MetricsSnapshot::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_across_domains() {
        let m = CrawlMetrics::new();
        m.record_request("a.com");
        m.record_success("a.com");
        m.record_request("b.com");
        m.record_failure("b.com", FailureType::Permanent);

        let snap = m.snapshot();
        assert_eq!(snap.total_requests, 2);
        assert_eq!(snap.successful_requests, 1);
        assert_eq!(snap.failed_requests, 1);
        assert_eq!(snap.permanent_failures, 1);
    }
}
