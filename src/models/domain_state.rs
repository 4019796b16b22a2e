use std::time::{Duration, Instant};

use super::FailureType;

/// Three-state breaker gate (spec §3/§4.2).
///
/// Transitions: `Closed -> Open -> HalfOpen -> {Closed, Open}`. Invariant:
/// `circuit_state == Open` implies `circuit_opened_at.is_some()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

/// Per-domain state owned by the Domain Manager (C2), keyed by domain.
#[derive(Debug, Clone)]
pub struct DomainState {
    pub circuit_state: CircuitState,
    pub consecutive_failures: u32,
    pub total_requests: u64,
    pub successful_requests: u64,

    pub last_request: Option<Instant>,
    pub last_successful_request: Option<Instant>,
    pub circuit_opened_at: Option<Instant>,

    pub dynamic_crawl_delay: Duration,

    pub is_rate_limited: bool,
    pub rate_limit_reset_time: Option<Instant>,

    pub last_error: Option<String>,
    pub last_failure_type: Option<FailureType>,
}

impl DomainState {
    pub fn new(politeness_delay: Duration) -> Self {
        Self {
            circuit_state: CircuitState::Closed,
            consecutive_failures: 0,
            total_requests: 0,
            successful_requests: 0,
            last_request: None,
            last_successful_request: None,
            circuit_opened_at: None,
            dynamic_crawl_delay: politeness_delay,
            is_rate_limited: false,
            rate_limit_reset_time: None,
            last_error: None,
            last_failure_type: None,
        }
    }

    pub fn success_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.successful_requests as f64 / self.total_requests as f64
        }
    }

    pub fn can_crawl_now(&self, now: Instant) -> bool {
        match self.last_request {
            Some(last) => now >= last + self.dynamic_crawl_delay,
            None => true,
        }
    }
}
