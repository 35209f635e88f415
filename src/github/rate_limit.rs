use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use std::time::Duration;

pub const RATE_LIMIT_RESET_HEADER: &str = "x-ratelimit-reset";
pub const RATE_LIMIT_REMAINING_HEADER: &str = "x-ratelimit-remaining";
pub const RETRY_AFTER_HEADER: &str = "retry-after";

/// Wait policy for throttled GitHub responses.
///
/// The wait is `reset - now + margin`, clamped to `min..=cap`. A local clock
/// running ahead of GitHub's still waits `min` between attempts, and a
/// far-future reset never stalls the crawl longer than `cap`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitBackoff {
    pub margin: Duration,
    pub min: Duration,
    pub cap: Duration,
}

impl Default for RateLimitBackoff {
    fn default() -> Self {
        Self {
            margin: Duration::from_secs(5),
            min: Duration::from_secs(1),
            cap: Duration::from_secs(60),
        }
    }
}

impl RateLimitBackoff {
    /// Wait derived from a reset timestamp (seconds since epoch).
    pub fn wait_for_reset(&self, reset_epoch: i64, now_epoch: i64) -> Duration {
        let secs = reset_epoch
            .saturating_sub(now_epoch)
            .saturating_add(self.margin.as_secs() as i64)
            .clamp(0, self.cap.as_secs() as i64);
        self.bounded(Duration::from_secs(secs as u64))
    }

    fn bounded(&self, wait: Duration) -> Duration {
        wait.max(self.min).min(self.cap)
    }

    /// Returns the wait before retrying if the response signals throttling,
    /// `None` if it is anything else.
    ///
    /// Throttling is a 403 or 429 carrying a reset header whose remaining
    /// quota is exhausted (or not reported). A 403 with quota left is a
    /// real permission error and is not retried.
    pub fn retry_after(&self, status: StatusCode, headers: &HeaderMap, now_epoch: i64) -> Option<Duration> {
        if status != StatusCode::FORBIDDEN && status != StatusCode::TOO_MANY_REQUESTS {
            return None;
        }

        if let Some(seconds) = header_i64(headers, RETRY_AFTER_HEADER) {
            let seconds = seconds.clamp(0, self.cap.as_secs() as i64) as u64;
            return Some(self.bounded(Duration::from_secs(seconds)));
        }

        let reset = header_i64(headers, RATE_LIMIT_RESET_HEADER)?;
        match header_i64(headers, RATE_LIMIT_REMAINING_HEADER) {
            Some(remaining) if remaining > 0 => None,
            _ => Some(self.wait_for_reset(reset, now_epoch)),
        }
    }
}

fn header_i64(headers: &HeaderMap, name: &str) -> Option<i64> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_wait_adds_margin_to_reset() {
        let backoff = RateLimitBackoff::default();
        assert_eq!(backoff.wait_for_reset(1_000_010, 1_000_000), Duration::from_secs(15));
        assert_eq!(backoff.wait_for_reset(1_000_000, 1_000_000), Duration::from_secs(5));
    }

    #[test]
    fn test_wait_is_bounded() {
        let backoff = RateLimitBackoff::default();
        let now = 1_700_000_000;
        for reset in [i64::MIN, now - 3600, now - 6, now, now + 30, now + 55, now + 3600, i64::MAX] {
            let wait = backoff.wait_for_reset(reset, now);
            assert!(wait >= Duration::from_secs(1), "reset={} wait={:?}", reset, wait);
            assert!(wait <= Duration::from_secs(60), "reset={} wait={:?}", reset, wait);
        }
        assert_eq!(backoff.wait_for_reset(now + 3600, now), Duration::from_secs(60));
    }

    #[test]
    fn test_reset_in_the_past_waits_the_minimum() {
        let backoff = RateLimitBackoff::default();
        let now = 1_700_000_000;
        assert_eq!(backoff.wait_for_reset(now - 10, now), Duration::from_secs(1));
        assert_eq!(backoff.wait_for_reset(now - 3600, now), Duration::from_secs(1));
        assert_eq!(backoff.wait_for_reset(i64::MIN, now), Duration::from_secs(1));

        let h = headers(&[("retry-after", "0")]);
        assert_eq!(
            backoff.retry_after(StatusCode::TOO_MANY_REQUESTS, &h, now),
            Some(Duration::from_secs(1))
        );
    }

    #[test]
    fn test_throttled_forbidden_is_retryable() {
        let backoff = RateLimitBackoff::default();
        let h = headers(&[("x-ratelimit-reset", "1010"), ("x-ratelimit-remaining", "0")]);
        assert_eq!(
            backoff.retry_after(StatusCode::FORBIDDEN, &h, 1000),
            Some(Duration::from_secs(15))
        );

        let h = headers(&[("x-ratelimit-reset", "1010")]);
        assert_eq!(
            backoff.retry_after(StatusCode::TOO_MANY_REQUESTS, &h, 1000),
            Some(Duration::from_secs(15))
        );
    }

    #[test]
    fn test_forbidden_with_quota_left_is_not_throttling() {
        let backoff = RateLimitBackoff::default();
        let h = headers(&[("x-ratelimit-reset", "1010"), ("x-ratelimit-remaining", "4999")]);
        assert_eq!(backoff.retry_after(StatusCode::FORBIDDEN, &h, 1000), None);
    }

    #[test]
    fn test_forbidden_without_headers_is_not_throttling() {
        let backoff = RateLimitBackoff::default();
        assert_eq!(backoff.retry_after(StatusCode::FORBIDDEN, &HeaderMap::new(), 1000), None);
    }

    #[test]
    fn test_other_statuses_are_not_throttling() {
        let backoff = RateLimitBackoff::default();
        let h = headers(&[("x-ratelimit-reset", "1010"), ("x-ratelimit-remaining", "0")]);
        assert_eq!(backoff.retry_after(StatusCode::OK, &h, 1000), None);
        assert_eq!(backoff.retry_after(StatusCode::BAD_GATEWAY, &h, 1000), None);
    }

    #[test]
    fn test_retry_after_header_is_capped() {
        let backoff = RateLimitBackoff::default();
        let h = headers(&[("retry-after", "600")]);
        assert_eq!(
            backoff.retry_after(StatusCode::FORBIDDEN, &h, 1000),
            Some(Duration::from_secs(60))
        );
    }
}
