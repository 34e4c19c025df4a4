//! Content-inclusion engine.
//!
//! Resolves inclusion directives embedded in documents: locating the source,
//! fetching it from disk or over HTTP, caching it, clipping line ranges out of
//! it, and recursively expanding directives inside it while guarding against
//! cycles.
//!
//! # Architecture
//!
//! - [`SourceLocator`] turns directive source strings into canonical
//!   [`SourceAddress`]es.
//! - [`ContentCache`] holds resolved content per address, populating each
//!   address at most once even under concurrent requests. Remote content can
//!   additionally persist in a [`DiskCache`](splice_cache::DiskCache).
//! - [`RemoteFetcher`] fetches over a [`Transport`] with bounded retry.
//! - [`clipping`] selects and reshapes line ranges.
//! - [`Includer`] drives a directive through all of the above and records the
//!   result in an [`InclusionForest`].
//!
//! The document grammar is supplied by the caller as a [`Composer`].
//!
//! # Example
//!
//! ```ignore
//! use splice_core::{
//!     CompositionPass, Composer, Directive, IncludeError, Includer, RemoteFetcher,
//!     RetryPolicy, Scope, SourceLocator,
//! };
//!
//! struct Plain(Vec<String>);
//!
//! impl Composer for Plain {
//!     fn reparse(&mut self, lines: &[String], _scope: &mut Scope<'_>) -> Result<(), IncludeError> {
//!         self.0.extend_from_slice(lines);
//!         Ok(())
//!     }
//! }
//!
//! let includer = Includer::new(
//!     SourceLocator::from_base("/srv/docs")?,
//!     RemoteFetcher::http(std::time::Duration::from_secs(30), RetryPolicy::default()),
//! );
//! let mut pass = CompositionPass::new();
//! let directive = Directive::from_json(r#"{"source": "intro.md", "type": "reparse"}"#)?;
//! let site = splice_core::Site::new(None, 1);
//! includer.process(&directive, site, &mut pass, &mut Plain(Vec::new()))?;
//! ```

mod address;
pub mod clipping;
mod consts;
mod content;
mod cycle;
mod directive;
mod error;
mod fetch;
mod include;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod tree;
mod whitespace;

pub use address::{LocateError, Scheme, SourceAddress, SourceLocator};
pub use clipping::{Boundary, Clipping, ClippingError};
pub use consts::{DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY, DEFAULT_TIMEOUT, MAX_INDENT};
pub use content::{ContentCache, ContentError, ResolvedContent, split_lines};
pub use cycle::{CycleDetector, CycleError, Site};
pub use directive::{Directive, DirectiveError, IncludeMode};
pub use error::{IncludeError, IncludeErrorKind};
pub use fetch::{
    AttemptError, BodySink, CancellationToken, FetchError, RemoteFetcher, RetryPolicy,
    Transport, UreqTransport,
};
pub use include::{Composer, CompositionPass, Includer, Scope};
#[cfg(any(test, feature = "mock"))]
pub use mock::{MockResponse, MockTransport};
pub use tree::{InclusionForest, InclusionNode};
pub use whitespace::WhitespaceTransform;
