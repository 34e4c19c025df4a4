//! Errors raised while processing a directive.
//!
//! An [`IncludeError`] names the directive that failed and where it sits.
//! Failures inside nested content are wrapped once per level, so the
//! rendered message reads as a breadcrumb trail from the outermost directive
//! down to the root cause.

use std::path::PathBuf;
use std::sync::Arc;

use crate::address::{LocateError, SourceAddress};
use crate::clipping::ClippingError;
use crate::content::ContentError;
use crate::cycle::{CycleError, Site};
use crate::directive::DirectiveError;

/// Failure of one directive.
#[derive(Debug, thiserror::Error)]
#[error("{site}: failed to include \"{target}\": {kind}")]
pub struct IncludeError {
    /// Source string as written in the directive.
    pub target: String,
    pub site: Site,
    #[source]
    pub kind: IncludeErrorKind,
}

/// What went wrong.
#[derive(Debug, thiserror::Error)]
pub enum IncludeErrorKind {
    #[error("{0}")]
    Directive(#[from] DirectiveError),

    #[error("{0}")]
    Locate(#[from] LocateError),

    #[error("cache directory does not exist: {}", .0.display())]
    InvalidCacheDirectory(PathBuf),

    #[error("source unavailable: {cause}")]
    SourceUnavailable {
        address: SourceAddress,
        #[source]
        cause: Arc<ContentError>,
    },

    #[error("{0}")]
    Clipping(#[from] ClippingError),

    #[error("{0}")]
    Cycle(#[from] CycleError),

    #[error("composition cancelled")]
    Cancelled,

    /// A directive inside the included content failed.
    #[error("\n  {0}")]
    Nested(Box<IncludeError>),
}

impl IncludeError {
    #[must_use]
    pub fn new(target: impl Into<String>, site: Site, kind: IncludeErrorKind) -> Self {
        Self {
            target: target.into(),
            site,
            kind,
        }
    }

    /// Innermost error, past every level of nesting.
    #[must_use]
    pub fn root_cause(&self) -> &IncludeErrorKind {
        let mut kind = &self.kind;
        while let IncludeErrorKind::Nested(inner) = kind {
            kind = &inner.kind;
        }
        kind
    }

    /// Errors from the outermost directive down to the one that failed.
    #[must_use]
    pub fn trail(&self) -> Vec<&IncludeError> {
        let mut trail = vec![self];
        let mut current = self;
        while let IncludeErrorKind::Nested(inner) = &current.kind {
            current = &**inner;
            trail.push(current);
        }
        trail
    }

    #[must_use]
    pub fn is_cycle(&self) -> bool {
        matches!(self.root_cause(), IncludeErrorKind::Cycle(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipping::Boundary;

    fn site(address: &str, line: usize) -> Site {
        Site::new(Some(SourceAddress::parse(address).unwrap()), line)
    }

    fn nested() -> IncludeError {
        let inner = IncludeError::new(
            "c.md",
            site("file:///b.md", 4),
            IncludeErrorKind::Clipping(ClippingError::DemarcationNotFound {
                index: 0,
                boundary: Boundary::StartString,
                needle: "BEGIN".to_owned(),
            }),
        );
        let middle = IncludeError::new(
            "b.md",
            site("file:///a.md", 2),
            IncludeErrorKind::Nested(Box::new(inner)),
        );
        IncludeError::new(
            "a.md",
            Site::new(None, 1),
            IncludeErrorKind::Nested(Box::new(middle)),
        )
    }

    #[test]
    fn test_trail_outermost_first() {
        let error = nested();
        let targets: Vec<_> = error
            .trail()
            .into_iter()
            .map(|e| e.target.as_str())
            .collect();
        assert_eq!(targets, vec!["a.md", "b.md", "c.md"]);
    }

    #[test]
    fn test_root_cause() {
        let error = nested();
        assert!(matches!(
            error.root_cause(),
            IncludeErrorKind::Clipping(ClippingError::DemarcationNotFound { .. })
        ));
        assert!(!error.is_cycle());
    }

    #[test]
    fn test_breadcrumb_message() {
        let message = nested().to_string();
        let lines: Vec<_> = message.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("<document>, line 1: failed to include \"a.md\""));
        assert!(lines[1].contains("file:///a.md, line 2: failed to include \"b.md\""));
        assert!(lines[2].contains("no line contains start string \"BEGIN\""));
    }
}
