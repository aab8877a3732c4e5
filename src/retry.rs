use std::thread;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{RequestBuilder, Response};

use crate::config::ScoutConfig;

/// Gateway/server failures worth a second try; everything else is final.
pub const RETRY_STATUSES: [u16; 4] = [500, 502, 503, 504];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub limit: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            limit: 2,
            base_delay: Duration::from_millis(400),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(cfg: &ScoutConfig) -> Self {
        Self {
            limit: cfg.retry_limit,
            base_delay: cfg.retry_delay,
        }
    }

    pub fn none() -> Self {
        Self {
            limit: 0,
            base_delay: Duration::ZERO,
        }
    }

    /// `retries_done` counts the retries already spent, not the attempts.
    pub fn should_retry(&self, status: StatusCode, retries_done: u32) -> bool {
        !status.is_success()
            && RETRY_STATUSES.contains(&status.as_u16())
            && retries_done < self.limit
    }

    /// Linear backoff: retry `n` (1-based) waits `base_delay * n`.
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay.saturating_mul(retry)
    }
}

/// Sends the request built by `build`, re-building it for every retry so
/// multipart bodies can be re-opened. Transport errors are returned as-is.
pub fn send_with_retry(
    policy: &RetryPolicy,
    build: impl FnMut() -> RequestBuilder,
) -> reqwest::Result<Response> {
    send_with_retry_using(policy, build, thread::sleep)
}

pub fn send_with_retry_using(
    policy: &RetryPolicy,
    mut build: impl FnMut() -> RequestBuilder,
    mut sleep: impl FnMut(Duration),
) -> reqwest::Result<Response> {
    let mut retries_done = 0u32;
    loop {
        let resp = build().send()?;
        if !policy.should_retry(resp.status(), retries_done) {
            return Ok(resp);
        }
        retries_done += 1;
        sleep(policy.delay_for(retries_done));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_whitelisted_statuses_retry() {
        let policy = RetryPolicy::default();
        for code in [500u16, 502, 503, 504] {
            let status = StatusCode::from_u16(code).expect("valid status");
            assert!(policy.should_retry(status, 0), "{code} should retry");
        }
        for code in [200u16, 304, 400, 401, 404, 413, 422, 501, 505] {
            let status = StatusCode::from_u16(code).expect("valid status");
            assert!(!policy.should_retry(status, 0), "{code} should not retry");
        }
    }

    #[test]
    fn budget_is_exhausted_after_limit() {
        let policy = RetryPolicy::default();
        let status = StatusCode::SERVICE_UNAVAILABLE;
        assert!(policy.should_retry(status, 0));
        assert!(policy.should_retry(status, 1));
        assert!(!policy.should_retry(status, 2));
        assert!(!RetryPolicy::none().should_retry(status, 0));
    }

    #[test]
    fn delay_grows_linearly() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_millis(400));
        assert_eq!(policy.delay_for(2), Duration::from_millis(800));
        assert_eq!(policy.delay_for(3), Duration::from_millis(1200));
    }
}
