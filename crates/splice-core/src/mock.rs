//! Scripted transport for testing.
//!
//! Provides [`MockTransport`] for exercising fetch and cache behavior
//! without network access.

use std::collections::{HashMap, VecDeque};
use std::io::Write;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use url::Url;

use crate::fetch::{AttemptError, Transport};

/// Outcome of one scripted attempt.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Complete body.
    Body(Vec<u8>),
    /// Failure before any body bytes.
    Fail(AttemptError),
    /// Some body bytes, then a failure.
    Partial(Vec<u8>, AttemptError),
}

/// In-memory transport that replays scripted responses per URL.
///
/// Each URL holds a queue of responses; the last one repeats once the
/// queue is drained. Unknown URLs answer "not found".
///
/// # Example
///
/// ```ignore
/// use splice_core::{AttemptError, MockResponse, MockTransport};
///
/// let transport = MockTransport::new()
///     .with_body("https://example.com/a.md", "# A")
///     .with_sequence(
///         "https://example.com/flaky.md",
///         vec![
///             MockResponse::Fail(AttemptError::Timeout),
///             MockResponse::Body(b"ok".to_vec()),
///         ],
///     );
/// ```
#[derive(Debug, Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<String, VecDeque<MockResponse>>>,
    calls: AtomicUsize,
    calls_by_url: Mutex<HashMap<String, usize>>,
    delay: Duration,
}

impl MockTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Always answer `url` with `body`.
    #[must_use]
    pub fn with_body(self, url: &str, body: impl Into<Vec<u8>>) -> Self {
        self.with_sequence(url, vec![MockResponse::Body(body.into())])
    }

    /// Always fail `url` with `error`.
    #[must_use]
    pub fn with_failure(self, url: &str, error: AttemptError) -> Self {
        self.with_sequence(url, vec![MockResponse::Fail(error)])
    }

    /// Answer `url` with `responses` in order.
    #[must_use]
    pub fn with_sequence(self, url: &str, responses: Vec<MockResponse>) -> Self {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_owned(), responses.into());
        self
    }

    /// Sleep this long inside every attempt.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Total attempts across all URLs.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Attempts made for `url`.
    #[must_use]
    pub fn calls_for(&self, url: &str) -> usize {
        self.calls_by_url
            .lock()
            .unwrap()
            .get(url)
            .copied()
            .unwrap_or(0)
    }

    fn next_response(&self, url: &str) -> Option<MockResponse> {
        let mut routes = self.routes.lock().unwrap();
        let queue = routes.get_mut(url)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

impl Transport for MockTransport {
    fn get(&self, url: &Url, sink: &mut dyn Write) -> Result<(), AttemptError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self
            .calls_by_url
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default() += 1;

        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }

        let write = |sink: &mut dyn Write, body: &[u8]| {
            sink.write_all(body)
                .map_err(|e| AttemptError::Transport(e.to_string()))
        };

        match self.next_response(url.as_str()) {
            Some(MockResponse::Body(body)) => write(sink, &body),
            Some(MockResponse::Fail(error)) => Err(error),
            Some(MockResponse::Partial(body, error)) => {
                write(sink, &body)?;
                Err(error)
            }
            None => Err(AttemptError::NotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get(transport: &MockTransport, url: &str) -> Result<Vec<u8>, AttemptError> {
        let mut body = Vec::new();
        transport.get(&Url::parse(url).unwrap(), &mut body)?;
        Ok(body)
    }

    #[test]
    fn test_sequence_then_repeat_last() {
        let url = "https://example.com/a";
        let transport = MockTransport::new().with_sequence(
            url,
            vec![
                MockResponse::Fail(AttemptError::Timeout),
                MockResponse::Body(b"x".to_vec()),
            ],
        );

        assert_eq!(get(&transport, url), Err(AttemptError::Timeout));
        assert_eq!(get(&transport, url), Ok(b"x".to_vec()));
        assert_eq!(get(&transport, url), Ok(b"x".to_vec()));
        assert_eq!(transport.calls_for(url), 3);
    }

    #[test]
    fn test_unknown_url_not_found() {
        let transport = MockTransport::new();
        assert_eq!(
            get(&transport, "https://example.com/missing"),
            Err(AttemptError::NotFound)
        );
        assert_eq!(transport.calls(), 1);
    }
}
