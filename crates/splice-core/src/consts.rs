//! Defaults and limits for fetching and clipping.

use std::time::Duration;

/// Total attempts per remote fetch.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Fixed pause between remote fetch attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Default HTTP timeout for a single attempt (30 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Largest `indent` a clipping may request.
pub const MAX_INDENT: usize = 1024;

/// Granularity of cancellation checks while waiting between attempts.
pub(crate) const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(50);
