//! Domain Manager (C2): per-domain circuit breaker, dynamic politeness
//! delay, and rate-limit window, all serialized behind one coarse mutex.
//! Grounded in `original_source/src/crawler/DomainManager.cpp`.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::models::{CircuitState, CrawlConfig, DomainState, FailureType};

pub struct DomainManager {
    config: Mutex<CrawlConfig>,
    states: Mutex<HashMap<String, DomainState>>,
}

impl DomainManager {
    pub fn new(config: CrawlConfig) -> Self {
        Self { config: Mutex::new(config), states: Mutex::new(HashMap::new()) }
    }

    pub fn update_config(&self, new_config: CrawlConfig) {
        *self.config.lock().unwrap() = new_config;
    }

    fn politeness_delay(&self) -> Duration {
        self.config.lock().unwrap().politeness_delay
    }

    fn failure_threshold(&self) -> u32 {
        self.config.lock().unwrap().circuit_breaker.failure_threshold
    }

    fn reset_time(&self) -> Duration {
        self.config.lock().unwrap().circuit_breaker.reset_time
    }

    /// `shouldDelay(domain) -> bool` (spec §4.2).
    pub fn should_delay(&self, domain: &str) -> bool {
        let mut states = self.states.lock().unwrap();
        let now = Instant::now();
        let reset_time = self.reset_time();
        let state = get_or_create(&mut states, domain, self.politeness_delay());
        advance_breaker(state, now, self.failure_threshold(), reset_time);

        if state.circuit_state == CircuitState::Open {
            return true;
        }

        if state.is_rate_limited {
            match state.rate_limit_reset_time {
                Some(reset) if now < reset => return true,
                _ => state.is_rate_limited = false,
            }
        }

        !state.can_crawl_now(now)
    }

    /// `getDelay(domain) -> duration` (spec §4.2).
    pub fn get_delay(&self, domain: &str) -> Duration {
        let mut states = self.states.lock().unwrap();
        let now = Instant::now();
        let reset_time = self.reset_time();
        let state = get_or_create(&mut states, domain, self.politeness_delay());

        if state.circuit_state == CircuitState::Open {
            if let Some(opened_at) = state.circuit_opened_at {
                let since_opened = now.saturating_duration_since(opened_at);
                if since_opened < reset_time {
                    return reset_time - since_opened;
                }
            }
        }

        if state.is_rate_limited {
            if let Some(reset) = state.rate_limit_reset_time {
                if now < reset {
                    return reset - now;
                }
            }
        }

        if !state.can_crawl_now(now) {
            if let Some(last) = state.last_request {
                return (last + state.dynamic_crawl_delay).saturating_duration_since(now);
            }
        }

        Duration::ZERO
    }

    /// `isCircuitBreakerOpen(domain) -> bool` (spec §4.2).
    pub fn is_circuit_breaker_open(&self, domain: &str) -> bool {
        let mut states = self.states.lock().unwrap();
        let now = Instant::now();
        let reset_time = self.reset_time();
        let threshold = self.failure_threshold();
        let state = get_or_create(&mut states, domain, self.politeness_delay());
        advance_breaker(state, now, threshold, reset_time);
        state.circuit_state == CircuitState::Open
    }

    /// `recordSuccess(domain)` (spec §4.2).
    pub fn record_success(&self, domain: &str) {
        let mut states = self.states.lock().unwrap();
        let now = Instant::now();
        let politeness = self.politeness_delay();
        let state = get_or_create(&mut states, domain, politeness);

        state.total_requests += 1;
        state.successful_requests += 1;
        state.consecutive_failures = 0;
        state.last_request = Some(now);
        state.last_successful_request = Some(now);

        if state.circuit_state == CircuitState::HalfOpen {
            state.circuit_state = CircuitState::Closed;
            state.circuit_opened_at = None;
            tracing::info!(domain, "circuit breaker closed after recovery success");
        }

        if state.dynamic_crawl_delay > politeness {
            let decayed = state.dynamic_crawl_delay.mul_f64(0.8);
            state.dynamic_crawl_delay = decayed.max(politeness);
        }
    }

    /// `recordFailure(domain, type, msg)` (spec §4.2).
    pub fn record_failure(&self, domain: &str, failure_type: FailureType, message: &str) {
        let mut states = self.states.lock().unwrap();
        let now = Instant::now();
        let politeness = self.politeness_delay();
        let threshold = self.failure_threshold();
        let state = get_or_create(&mut states, domain, politeness);

        state.total_requests += 1;
        state.consecutive_failures += 1;
        state.last_request = Some(now);
        state.last_error = Some(message.to_string());
        state.last_failure_type = Some(failure_type);

        let was_half_open = state.circuit_state == CircuitState::HalfOpen;
        if was_half_open || (state.circuit_state == CircuitState::Closed
            && state.consecutive_failures >= threshold)
        {
            state.circuit_state = CircuitState::Open;
            state.circuit_opened_at = Some(now);
            tracing::warn!(domain, failures = state.consecutive_failures, "circuit breaker opened");
        }

        let mut multiplier = 1.5_f64.powi(state.consecutive_failures.min(10) as i32);
        multiplier *= match failure_type {
            FailureType::RateLimited => 2.0,
            FailureType::Temporary => 1.5,
            _ => 1.0,
        };
        let raised = politeness.mul_f64(multiplier);
        state.dynamic_crawl_delay = raised.min(Duration::from_secs(5 * 60));
    }

    /// `recordRateLimit(domain, retryAfterSec)` (spec §4.2).
    pub fn record_rate_limit(&self, domain: &str, retry_after_secs: Option<u64>) {
        let mut states = self.states.lock().unwrap();
        let now = Instant::now();
        let politeness = self.politeness_delay();
        let config_delay = {
            let cfg = self.config.lock().unwrap();
            cfg.rate_limit_delay
        };
        let state = get_or_create(&mut states, domain, politeness);

        let window = match retry_after_secs {
            Some(secs) if secs > 0 => Duration::from_secs(secs).max(config_delay),
            _ => config_delay,
        };

        state.is_rate_limited = true;
        state.rate_limit_reset_time = Some(now + window);
        state.dynamic_crawl_delay = state.dynamic_crawl_delay.max(window);

        tracing::warn!(domain, window_secs = window.as_secs(), "rate limited");
    }

    /// Administrative override (spec §4.2: `resetCircuitBreaker`).
    pub fn reset_circuit_breaker(&self, domain: &str) {
        let mut states = self.states.lock().unwrap();
        let politeness = self.politeness_delay();
        let state = get_or_create(&mut states, domain, politeness);
        state.circuit_state = CircuitState::Closed;
        state.consecutive_failures = 0;
        state.circuit_opened_at = None;
        state.dynamic_crawl_delay = politeness;
        tracing::info!(domain, "circuit breaker manually reset");
    }

    /// Returns a copy of the current state for a domain (read path for operators/tests).
    pub fn domain_state(&self, domain: &str) -> DomainState {
        let mut states = self.states.lock().unwrap();
        let politeness = self.politeness_delay();
        get_or_create(&mut states, domain, politeness).clone()
    }
}

fn get_or_create<'a>(
    states: &'a mut HashMap<String, DomainState>,
    domain: &str,
    politeness_delay: Duration,
) -> &'a mut DomainState {
    states
        .entry(domain.to_string())
        .or_insert_with(|| DomainState::new(politeness_delay))
}

/// Breaker transition rules (spec §4.2 summary): advances Closed->Open on
/// threshold, Open->HalfOpen once `reset_time` has elapsed. HalfOpen exits
/// are handled by `record_success`/`record_failure` directly.
fn advance_breaker(state: &mut DomainState, now: Instant, threshold: u32, reset_time: Duration) {
    match state.circuit_state {
        CircuitState::Closed => {
            if state.consecutive_failures >= threshold {
                state.circuit_state = CircuitState::Open;
                state.circuit_opened_at = Some(now);
            }
        }
        CircuitState::Open => {
            if let Some(opened_at) = state.circuit_opened_at {
                if now >= opened_at + reset_time {
                    state.circuit_state = CircuitState::HalfOpen;
                }
            }
        }
        CircuitState::HalfOpen => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    fn test_config() -> CrawlConfig {
        let mut cfg = CrawlConfig::default();
        cfg.circuit_breaker.failure_threshold = 5;
        cfg.circuit_breaker.reset_time = Duration::from_millis(50);
        cfg.politeness_delay = Duration::from_millis(1);
        cfg
    }

    #[test]
    fn five_consecutive_failures_open_the_breaker() {
        let dm = DomainManager::new(test_config());
        for _ in 0..5 {
            dm.record_failure("d", FailureType::Temporary, "boom");
        }
        assert!(dm.is_circuit_breaker_open("d"));
    }

    #[test]
    fn breaker_recovers_after_reset_time_and_one_success() {
        let dm = DomainManager::new(test_config());
        for _ in 0..5 {
            dm.record_failure("d", FailureType::Temporary, "boom");
        }
        assert!(dm.is_circuit_breaker_open("d"));
        sleep(Duration::from_millis(60));
        // Breaker transitions to HalfOpen on the next check; one success then closes it.
        assert!(!dm.is_circuit_breaker_open("d"));
        dm.record_success("d");
        assert!(!dm.is_circuit_breaker_open("d"));
    }

    #[test]
    fn half_open_failure_reopens_the_breaker() {
        let dm = DomainManager::new(test_config());
        for _ in 0..5 {
            dm.record_failure("d", FailureType::Temporary, "boom");
        }
        sleep(Duration::from_millis(60));
        assert!(!dm.is_circuit_breaker_open("d")); // now half-open
        dm.record_failure("d", FailureType::Temporary, "boom again");
        assert!(dm.is_circuit_breaker_open("d"));
    }

    #[test]
    fn success_decays_dynamic_delay_toward_politeness() {
        let dm = DomainManager::new(test_config());
        dm.record_failure("d", FailureType::Temporary, "boom");
        let raised = dm.domain_state("d").dynamic_crawl_delay;
        assert!(raised > Duration::from_millis(1));
        dm.record_success("d");
        let decayed = dm.domain_state("d").dynamic_crawl_delay;
        assert!(decayed <= raised);
    }

    #[test]
    fn reset_circuit_breaker_clears_state() {
        let dm = DomainManager::new(test_config());
        for _ in 0..5 {
            dm.record_failure("d", FailureType::Temporary, "boom");
        }
        dm.reset_circuit_breaker("d");
        assert!(!dm.is_circuit_breaker_open("d"));
        assert_eq!(dm.domain_state("d").consecutive_failures, 0);
    }
}
