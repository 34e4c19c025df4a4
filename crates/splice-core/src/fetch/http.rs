//! HTTP transport backed by `ureq`.

use std::io::{self, Write};
use std::time::Duration;

use ureq::Agent;
use url::Url;

use super::{AttemptError, Transport};

/// Blocking HTTP GET with a per-attempt timeout.
///
/// Holds one agent for connection pooling across fetches.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn get(&self, url: &Url, sink: &mut dyn Write) -> Result<(), AttemptError> {
        let response = self.agent.get(url.as_str()).call().map_err(|e| match e {
            ureq::Error::Timeout(_) => AttemptError::Timeout,
            other => AttemptError::Transport(other.to_string()),
        })?;

        let status = response.status().as_u16();
        match status {
            404 => return Err(AttemptError::NotFound),
            403 => return Err(AttemptError::Forbidden),
            200..=299 => {}
            _ => return Err(AttemptError::Status(status)),
        }

        let mut body = response.into_body();
        io::copy(&mut body.as_reader(), sink).map_err(|e| match e.kind() {
            io::ErrorKind::TimedOut => AttemptError::Timeout,
            _ => AttemptError::Transport(e.to_string()),
        })?;
        Ok(())
    }
}
