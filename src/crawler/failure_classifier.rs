//! Failure Classifier (C1): pure functions mapping a fetch outcome onto a
//! [`FailureType`] and a retry policy. Grounded in
//! `original_source/src/crawler/FailureClassifier.cpp`.

use std::time::Duration;

use crate::models::{CrawlConfig, FailureType};

const PERMANENT_HTTP_CODES: &[u16] = &[
    400, 401, 403, 404, 405, 406, 407, 409, 410, 411, 412, 413, 414, 415, 416, 417, 418, 421, 422,
    423, 424, 426, 428, 431, 451,
];

/// `classify(httpCode, transportCode, message, config) -> FailureType` (spec §4.1).
pub fn classify(
    http_code: Option<u16>,
    transport_code: Option<&str>,
    message: &str,
    config: &CrawlConfig,
) -> FailureType {
    if http_code == Some(429) {
        return FailureType::RateLimited;
    }

    if let Some(code) = http_code {
        if PERMANENT_HTTP_CODES.contains(&code) {
            return FailureType::Permanent;
        }
        if config.retry.retryable_http_codes.contains(&code) || (500..600).contains(&code) {
            return FailureType::Temporary;
        }
    }

    if let Some(code) = transport_code {
        if is_permanent_transport_code(code) {
            return FailureType::Permanent;
        }
        if config.retry.retryable_transport_codes.contains(code) {
            return FailureType::Temporary;
        }
    }

    let lower = message.to_lowercase();
    if lower.contains("name or service not known")
        || lower.contains("no such host is known")
        || lower.contains("nodename nor servname provided")
    {
        return FailureType::Permanent;
    }

    if lower.contains("timeout") || lower.contains("connection") || lower.contains("network") {
        return FailureType::Temporary;
    }

    FailureType::Unknown
}

fn is_permanent_transport_code(code: &str) -> bool {
    matches!(
        code,
        "unsupported_protocol"
            | "malformed_url"
            | "dns_resolution_failed"
            | "bad_argument"
            | "too_many_redirects"
    )
}

/// `shouldRetry(type, retryCount, maxRetries)` (spec §4.1).
pub fn should_retry(failure_type: FailureType, retry_count: u32, max_retries: u32) -> bool {
    if failure_type == FailureType::Permanent {
        return false;
    }
    if retry_count >= max_retries {
        return false;
    }
    match failure_type {
        FailureType::Temporary | FailureType::RateLimited => true,
        FailureType::Unknown => retry_count < max_retries / 2,
        FailureType::Permanent => false,
    }
}

/// `nextDelay(retryCount, config, type)` (spec §4.1).
///
/// `retry_count` is 1-based, matching the original's `calculateRetryDelay`.
pub fn next_delay(retry_count: u32, config: &CrawlConfig, failure_type: FailureType) -> Duration {
    let base = if failure_type == FailureType::RateLimited {
        config.rate_limit_delay
    } else {
        config.retry.base_retry_delay
    };

    let multiplier = config.retry.backoff_multiplier.powi(retry_count as i32 - 1);
    let scaled_millis = (base.as_millis() as f64 * multiplier).max(0.0);
    let delay = Duration::from_millis(scaled_millis as u64);

    delay.min(config.retry.max_retry_delay)
}

pub fn description(failure_type: FailureType) -> &'static str {
    match failure_type {
        FailureType::Temporary => "TEMPORARY",
        FailureType::RateLimited => "RATE_LIMITED",
        FailureType::Permanent => "PERMANENT",
        FailureType::Unknown => "UNKNOWN",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> CrawlConfig {
        CrawlConfig::default()
    }

    #[test]
    fn classifies_404_as_permanent() {
        assert_eq!(classify(Some(404), None, "", &config()), FailureType::Permanent);
    }

    #[test]
    fn classifies_503_as_temporary() {
        assert_eq!(classify(Some(503), None, "", &config()), FailureType::Temporary);
    }

    #[test]
    fn classifies_429_as_rate_limited() {
        assert_eq!(classify(Some(429), None, "", &config()), FailureType::RateLimited);
    }

    #[test]
    fn classifies_dns_failure_message_as_permanent() {
        assert_eq!(
            classify(None, None, "Name or service not known", &config()),
            FailureType::Permanent
        );
    }

    #[test]
    fn classifies_timeout_message_as_temporary() {
        assert_eq!(classify(None, None, "Connection timeout", &config()), FailureType::Temporary);
    }

    #[test]
    fn permanent_never_retries() {
        assert!(!should_retry(FailureType::Permanent, 0, 5));
    }

    #[test]
    fn unknown_retries_only_up_to_half_max() {
        assert!(should_retry(FailureType::Unknown, 1, 5));
        assert!(!should_retry(FailureType::Unknown, 2, 5));
    }

    #[test]
    fn retry_count_at_max_never_retries() {
        assert!(!should_retry(FailureType::Temporary, 5, 5));
    }

    #[test]
    fn next_delay_is_monotonic_non_decreasing_until_cap() {
        let cfg = config();
        let mut prev = Duration::from_millis(0);
        for n in 1..=10 {
            let d = next_delay(n, &cfg, FailureType::Temporary);
            assert!(d >= prev);
            assert!(d <= cfg.retry.max_retry_delay);
            prev = d;
        }
    }

    #[test]
    fn rate_limited_uses_rate_limit_base() {
        let cfg = config();
        let d = next_delay(1, &cfg, FailureType::RateLimited);
        assert_eq!(d, cfg.rate_limit_delay.min(cfg.retry.max_retry_delay));
    }
}
