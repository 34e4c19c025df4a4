//! Remote source fetching with bounded retry.
//!
//! A [`Transport`] performs a single GET and streams the body into a sink.
//! [`RemoteFetcher`] wraps it with the retry policy: a fixed number of
//! attempts with a fixed pause between them. "Not found" and "forbidden"
//! responses are final and are never retried.

mod http;

use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use url::Url;

use crate::consts::{CANCEL_POLL_INTERVAL, DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY};

pub use http::UreqTransport;

/// Failure of a single fetch attempt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttemptError {
    #[error("not found (HTTP 404)")]
    NotFound,

    #[error("forbidden (HTTP 403)")]
    Forbidden,

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),
}

/// Failure of a fetch after the retry policy has been applied.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("{url}: not found")]
    NotFound { url: String },

    #[error("{url}: access forbidden")]
    Forbidden { url: String },

    #[error("{url}: giving up after {attempts} attempts, last error: {last}")]
    Exhausted {
        url: String,
        attempts: u32,
        last: AttemptError,
    },

    #[error("{url}: fetch cancelled")]
    Cancelled { url: String },

    #[error("{url}: failed to buffer response body: {source}")]
    Sink { url: String, source: io::Error },
}

/// Destination for a response body that can be rewound between attempts.
pub trait BodySink: Write {
    /// Discard everything written so far.
    fn reset(&mut self) -> io::Result<()>;
}

impl BodySink for Vec<u8> {
    fn reset(&mut self) -> io::Result<()> {
        self.clear();
        Ok(())
    }
}

impl BodySink for splice_cache::CacheWriter {
    fn reset(&mut self) -> io::Result<()> {
        splice_cache::CacheWriter::reset(self)
    }
}

/// A single-attempt GET.
pub trait Transport: Send + Sync {
    /// Fetch `url`, streaming the body into `sink`.
    fn get(&self, url: &Url, sink: &mut dyn Write) -> Result<(), AttemptError>;
}

/// Cooperative cancellation flag shared by a composition pass.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Attempts and pause between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

/// Fetches remote sources through a [`Transport`] with retry.
#[derive(Clone)]
pub struct RemoteFetcher {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
}

impl std::fmt::Debug for RemoteFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteFetcher")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl RemoteFetcher {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    /// Fetcher over HTTP with the given per-attempt timeout.
    #[must_use]
    pub fn http(timeout: Duration, policy: RetryPolicy) -> Self {
        Self::new(Arc::new(UreqTransport::new(timeout)), policy)
    }

    #[must_use]
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Fetch `url` into `sink`.
    ///
    /// The sink is reset before every retry, so on success it holds exactly
    /// one complete body.
    pub fn fetch(
        &self,
        url: &Url,
        sink: &mut dyn BodySink,
        cancel: &CancellationToken,
    ) -> Result<(), FetchError> {
        let attempts = self.policy.max_attempts.max(1);
        let mut last = None;

        for attempt in 1..=attempts {
            if attempt > 1 {
                wait(self.policy.delay, cancel);
                sink.reset().map_err(|source| FetchError::Sink {
                    url: url.to_string(),
                    source,
                })?;
            }
            if cancel.is_cancelled() {
                return Err(FetchError::Cancelled {
                    url: url.to_string(),
                });
            }

            tracing::debug!(url = %url, attempt, "fetching remote source");
            let mut writer = CancelAware {
                inner: &mut *sink,
                cancel,
            };
            let error = match self.transport.get(url, &mut writer) {
                Ok(()) => {
                    tracing::info!(url = %url, attempt, "fetched remote source");
                    return Ok(());
                }
                Err(_) if cancel.is_cancelled() => {
                    return Err(FetchError::Cancelled {
                        url: url.to_string(),
                    });
                }
                Err(AttemptError::NotFound) => {
                    return Err(FetchError::NotFound {
                        url: url.to_string(),
                    });
                }
                Err(AttemptError::Forbidden) => {
                    return Err(FetchError::Forbidden {
                        url: url.to_string(),
                    });
                }
                Err(e) => e,
            };

            tracing::warn!(url = %url, attempt, error = %error, "fetch attempt failed");
            last = Some(error);
        }

        Err(FetchError::Exhausted {
            url: url.to_string(),
            attempts,
            last: last.unwrap_or(AttemptError::Transport("no attempt made".to_owned())),
        })
    }
}

/// Sleep for `delay`, returning early once `cancel` fires.
fn wait(delay: Duration, cancel: &CancellationToken) {
    let deadline = Instant::now() + delay;
    loop {
        if cancel.is_cancelled() {
            return;
        }
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return;
        }
        thread::sleep(remaining.min(CANCEL_POLL_INTERVAL));
    }
}

/// Writer that aborts the body stream once the pass is cancelled.
struct CancelAware<'a, W: Write + ?Sized> {
    inner: &'a mut W,
    cancel: &'a CancellationToken,
}

impl<W: Write + ?Sized> Write for CancelAware<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.cancel.is_cancelled() {
            return Err(io::Error::other("fetch cancelled"));
        }
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockResponse, MockTransport};

    const URL: &str = "https://example.com/a.md";

    fn url() -> Url {
        Url::parse(URL).unwrap()
    }

    fn fetcher(transport: &Arc<MockTransport>) -> RemoteFetcher {
        RemoteFetcher::new(
            Arc::clone(transport) as Arc<dyn Transport>,
            RetryPolicy {
                max_attempts: 3,
                delay: Duration::from_millis(5),
            },
        )
    }

    #[test]
    fn test_success_first_attempt() {
        let transport = Arc::new(MockTransport::new().with_body(URL, "hello"));
        let mut body = Vec::new();

        fetcher(&transport)
            .fetch(&url(), &mut body, &CancellationToken::new())
            .unwrap();

        assert_eq!(body, b"hello");
        assert_eq!(transport.calls(), 1);
    }

    #[test]
    fn test_two_failures_then_success() {
        let transport = Arc::new(MockTransport::new().with_sequence(
            URL,
            vec![
                MockResponse::Fail(AttemptError::Status(503)),
                MockResponse::Fail(AttemptError::Timeout),
                MockResponse::Body(b"ok".to_vec()),
            ],
        ));
        let mut body = Vec::new();

        fetcher(&transport)
            .fetch(&url(), &mut body, &CancellationToken::new())
            .unwrap();

        assert_eq!(body, b"ok");
        assert_eq!(transport.calls(), 3);
    }

    #[test]
    fn test_three_failures_exhaust() {
        let transport = Arc::new(
            MockTransport::new().with_failure(URL, AttemptError::Transport("reset".to_owned())),
        );
        let mut body = Vec::new();

        let err = fetcher(&transport)
            .fetch(&url(), &mut body, &CancellationToken::new())
            .unwrap_err();

        assert!(matches!(
            err,
            FetchError::Exhausted {
                attempts: 3,
                last: AttemptError::Transport(_),
                ..
            }
        ));
        assert_eq!(transport.calls(), 3);
    }

    #[test]
    fn test_not_found_is_not_retried() {
        let transport = Arc::new(MockTransport::new());
        let mut body = Vec::new();

        let err = fetcher(&transport)
            .fetch(&url(), &mut body, &CancellationToken::new())
            .unwrap_err();

        assert!(matches!(err, FetchError::NotFound { .. }));
        assert_eq!(transport.calls(), 1);
    }

    #[test]
    fn test_forbidden_is_not_retried() {
        let transport = Arc::new(MockTransport::new().with_failure(URL, AttemptError::Forbidden));
        let mut body = Vec::new();

        let err = fetcher(&transport)
            .fetch(&url(), &mut body, &CancellationToken::new())
            .unwrap_err();

        assert!(matches!(err, FetchError::Forbidden { .. }));
        assert_eq!(transport.calls(), 1);
    }

    #[test]
    fn test_partial_body_discarded_on_retry() {
        let transport = Arc::new(MockTransport::new().with_sequence(
            URL,
            vec![
                MockResponse::Partial(b"trunc".to_vec(), AttemptError::Timeout),
                MockResponse::Body(b"complete".to_vec()),
            ],
        ));
        let mut body = Vec::new();

        fetcher(&transport)
            .fetch(&url(), &mut body, &CancellationToken::new())
            .unwrap();

        assert_eq!(body, b"complete");
    }

    #[test]
    fn test_cancelled_before_first_attempt() {
        let transport = Arc::new(MockTransport::new().with_body(URL, "x"));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut body = Vec::new();

        let err = fetcher(&transport)
            .fetch(&url(), &mut body, &cancel)
            .unwrap_err();

        assert!(matches!(err, FetchError::Cancelled { .. }));
        assert_eq!(transport.calls(), 0);
    }

    #[test]
    fn test_cancel_during_retry_wait() {
        let transport = Arc::new(MockTransport::new().with_failure(URL, AttemptError::Status(500)));
        let fetcher = RemoteFetcher::new(
            Arc::clone(&transport) as Arc<dyn Transport>,
            RetryPolicy {
                max_attempts: 3,
                delay: Duration::from_secs(30),
            },
        );
        let cancel = CancellationToken::new();

        let err = thread::scope(|s| {
            let handle = s.spawn(|| fetcher.fetch(&url(), &mut Vec::new(), &cancel));
            thread::sleep(Duration::from_millis(100));
            cancel.cancel();
            handle.join().unwrap()
        })
        .unwrap_err();

        assert!(matches!(err, FetchError::Cancelled { .. }));
        assert_eq!(transport.calls(), 1);
    }

    #[test]
    fn test_cancel_aware_writer_aborts() {
        let cancel = CancellationToken::new();
        let mut inner = Vec::new();
        let mut writer = CancelAware {
            inner: &mut inner,
            cancel: &cancel,
        };

        writer.write_all(b"a").unwrap();
        cancel.cancel();
        assert!(writer.write_all(b"b").is_err());
        assert_eq!(inner, b"a");
    }

    #[test]
    fn test_exhausted_message() {
        let err = FetchError::Exhausted {
            url: URL.to_owned(),
            attempts: 3,
            last: AttemptError::Status(502),
        };
        assert_eq!(
            err.to_string(),
            "https://example.com/a.md: giving up after 3 attempts, last error: unexpected HTTP status 502"
        );
    }
}
