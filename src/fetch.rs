//! One GET with retry/backoff/rate-limit awareness over an injected
//! transport. Contract: max 6 attempts, initial backoff 5s, doubling up to
//! 60s, `Retry-After` honored on 429/5xx, 60s per-request timeout.

use crate::ports::{NotifierPort, RawResponse, RetryKind, TransportError, TransportPort};
use std::time::Duration;
use thiserror::Error;

const MAX_ATTEMPTS: u32 = 6;
const INITIAL_BACKOFF_SECS: u64 = 5;
const MAX_BACKOFF_SECS: u64 = 60;
const REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("Semantic Scholar a limité le débit des requêtes, réessayez plus tard")]
    RateLimited,
    #[error("service momentanément indisponible (HTTP {0})")]
    Unavailable(u16),
    #[error("la requête a expiré, vérifiez votre connexion")]
    Timeout,
    #[error("erreur HTTP {0}")]
    OtherHttp(u16),
    #[error("erreur réseau: {0}")]
    Transport(String),
    #[error("réponse JSON invalide: {0}")]
    Malformed(String),
}

/// Abstraction over `std::thread::sleep` so backoff waits are fast and
/// observable in tests.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

pub struct RealSleeper;

impl Sleeper for RealSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

pub struct HttpFetcher<'a> {
    transport: &'a dyn TransportPort,
    notifier: &'a dyn NotifierPort,
    sleeper: &'a dyn Sleeper,
}

impl<'a> HttpFetcher<'a> {
    pub fn new(
        transport: &'a dyn TransportPort,
        notifier: &'a dyn NotifierPort,
        sleeper: &'a dyn Sleeper,
    ) -> Self {
        HttpFetcher {
            transport,
            notifier,
            sleeper,
        }
    }

    pub fn fetch(
        &self,
        url: &str,
        params: &[(String, String)],
        headers: &[(String, String)],
    ) -> Result<serde_json::Value, FetchError> {
        let mut backoff = Duration::from_secs(INITIAL_BACKOFF_SECS);

        for attempt in 1..=MAX_ATTEMPTS {
            let outcome = self
                .transport
                .get(url, params, headers, Duration::from_secs(REQUEST_TIMEOUT_SECS));

            match outcome {
                Ok(response) => {
                    if let Some(result) = self.handle_response(response, attempt, &mut backoff)? {
                        return Ok(result);
                    }
                    // retryable status; loop continues after sleeping inside handle_response
                }
                Err(TransportError::Timeout) => {
                    if attempt == MAX_ATTEMPTS {
                        return Err(FetchError::Timeout);
                    }
                    self.retry_wait(RetryKind::Transient, backoff, attempt);
                    backoff = next_backoff(backoff);
                }
                Err(TransportError::Network(message)) => {
                    if attempt == MAX_ATTEMPTS {
                        return Err(FetchError::Transport(message));
                    }
                    self.retry_wait(RetryKind::Transient, backoff, attempt);
                    backoff = next_backoff(backoff);
                }
            }
        }

        unreachable!("loop always returns or errors by the final attempt")
    }

    /// Returns `Ok(Some(value))` on a decoded 2xx body, `Ok(None)` when the
    /// caller should retry (having already slept), or `Err` on a terminal
    /// failure.
    fn handle_response(
        &self,
        response: RawResponse,
        attempt: u32,
        backoff: &mut Duration,
    ) -> Result<Option<serde_json::Value>, FetchError> {
        if (200..300).contains(&response.status) {
            let value = serde_json::from_slice(&response.body)
                .map_err(|err| FetchError::Malformed(err.to_string()))?;
            return Ok(Some(value));
        }

        if response.status == 429 || response.status >= 500 {
            let kind = if response.status == 429 {
                RetryKind::RateLimit
            } else {
                RetryKind::Transient
            };
            let wait = retry_after(&response.headers, *backoff);

            if attempt == MAX_ATTEMPTS {
                return Err(if response.status == 429 {
                    FetchError::RateLimited
                } else {
                    FetchError::Unavailable(response.status)
                });
            }

            self.notifier.on_retry(kind, wait.as_secs(), attempt, MAX_ATTEMPTS);
            self.sleeper.sleep(wait);
            *backoff = next_backoff(*backoff);
            return Ok(None);
        }

        Err(FetchError::OtherHttp(response.status))
    }

    fn retry_wait(&self, kind: RetryKind, wait: Duration, attempt: u32) {
        self.notifier.on_retry(kind, wait.as_secs(), attempt, MAX_ATTEMPTS);
        self.sleeper.sleep(wait);
    }
}

fn next_backoff(current: Duration) -> Duration {
    (current * 2).min(Duration::from_secs(MAX_BACKOFF_SECS))
}

/// `Retry-After` as an integer number of seconds; a non-integer value is
/// treated as the current backoff.
fn retry_after(headers: &std::collections::HashMap<String, String>, current_backoff: Duration) -> Duration {
    headers
        .get("retry-after")
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(current_backoff)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::RawResponse;
    use std::cell::RefCell;
    use std::collections::HashMap;

    struct ScriptedTransport {
        responses: RefCell<Vec<Result<RawResponse, TransportError>>>,
    }

    impl TransportPort for ScriptedTransport {
        fn get(
            &self,
            _url: &str,
            _params: &[(String, String)],
            _headers: &[(String, String)],
            _timeout: Duration,
        ) -> Result<RawResponse, TransportError> {
            self.responses.borrow_mut().remove(0)
        }
    }

    struct RecordingNotifier {
        retries: RefCell<Vec<(RetryKind, u64)>>,
    }

    impl crate::ports::NotifierPort for RecordingNotifier {
        fn on_strategy_start(&self, _: &str, _: usize, _: usize) {}
        fn on_strategy_result(&self, _: &str, _: usize, _: usize) {}
        fn on_retry(&self, kind: RetryKind, wait_seconds: u64, _attempt: u32, _max: u32) {
            self.retries.borrow_mut().push((kind, wait_seconds));
        }
        fn on_success(&self, _: Duration, _: usize) {}
        fn on_failure(&self, _: &str) {}
        fn on_empty_export(&self, _: bool, _: &str) {}
    }

    struct NoopSleeper {
        slept: RefCell<Vec<Duration>>,
    }

    impl Sleeper for NoopSleeper {
        fn sleep(&self, duration: Duration) {
            self.slept.borrow_mut().push(duration);
        }
    }

    fn json_response(body: &str) -> RawResponse {
        RawResponse {
            status: 200,
            headers: HashMap::new(),
            body: body.as_bytes().to_vec(),
        }
    }

    fn rate_limited_response(retry_after: &str) -> RawResponse {
        let mut headers = HashMap::new();
        headers.insert("retry-after".to_string(), retry_after.to_string());
        RawResponse {
            status: 429,
            headers,
            body: Vec::new(),
        }
    }

    #[test]
    fn rate_limit_recovers_after_two_retries() {
        let transport = ScriptedTransport {
            responses: RefCell::new(vec![
                Ok(rate_limited_response("7")),
                Ok(rate_limited_response("7")),
                Ok(json_response(r#"{"data": []}"#)),
            ]),
        };
        let notifier = RecordingNotifier {
            retries: RefCell::new(Vec::new()),
        };
        let sleeper = NoopSleeper {
            slept: RefCell::new(Vec::new()),
        };
        let fetcher = HttpFetcher::new(&transport, &notifier, &sleeper);

        let result = fetcher.fetch("https://example.test", &[], &[]);
        assert!(result.is_ok());

        let retries = notifier.retries.borrow();
        assert_eq!(retries.len(), 2);
        assert!(retries.iter().all(|(kind, wait)| *kind == RetryKind::RateLimit && *wait == 7));

        let total_wait: Duration = sleeper.slept.borrow().iter().sum();
        assert_eq!(total_wait, Duration::from_secs(14));
    }

    #[test]
    fn non_integer_retry_after_uses_current_backoff() {
        let transport = ScriptedTransport {
            responses: RefCell::new(vec![
                Ok(rate_limited_response("abc")),
                Ok(json_response(r#"{"data": []}"#)),
            ]),
        };
        let notifier = RecordingNotifier {
            retries: RefCell::new(Vec::new()),
        };
        let sleeper = NoopSleeper {
            slept: RefCell::new(Vec::new()),
        };
        let fetcher = HttpFetcher::new(&transport, &notifier, &sleeper);

        fetcher.fetch("https://example.test", &[], &[]).unwrap();
        assert_eq!(sleeper.slept.borrow()[0], Duration::from_secs(INITIAL_BACKOFF_SECS));
    }

    #[test]
    fn other_http_error_surfaces_immediately_without_retry() {
        let transport = ScriptedTransport {
            responses: RefCell::new(vec![Ok(RawResponse {
                status: 404,
                headers: HashMap::new(),
                body: Vec::new(),
            })]),
        };
        let notifier = RecordingNotifier {
            retries: RefCell::new(Vec::new()),
        };
        let sleeper = NoopSleeper {
            slept: RefCell::new(Vec::new()),
        };
        let fetcher = HttpFetcher::new(&transport, &notifier, &sleeper);

        let result = fetcher.fetch("https://example.test", &[], &[]);
        assert!(matches!(result, Err(FetchError::OtherHttp(404))));
        assert!(notifier.retries.borrow().is_empty());
    }
}
