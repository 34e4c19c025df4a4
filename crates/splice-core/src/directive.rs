//! Inclusion directives.
//!
//! Directives are written as JSON objects:
//!
//! ```json
//! {
//!   "source": "../shared/setup.md",
//!   "type": "reparse",
//!   "cache": true,
//!   "clippings": [{ "region": "install", "dedent": 4 }]
//! }
//! ```

use std::path::PathBuf;

use serde::Deserialize;

use crate::clipping::Clipping;
use crate::consts::MAX_INDENT;

/// How included content is treated by the outer document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncludeMode {
    /// Emitted as a literal block; nested directives are not expanded.
    Opaque,
    /// Fed back through the document grammar; nested directives are expanded.
    Reparse,
}

/// A request to include content from a source.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Directive {
    pub source: String,
    /// Base for relative sources in a top-level document.
    #[serde(default)]
    pub base_uri: Option<String>,
    #[serde(rename = "type")]
    pub mode: IncludeMode,
    /// Whether remote content may be read from and written to the disk tier.
    #[serde(default = "default_cache")]
    pub cache: bool,
    /// Disk tier location for this directive; must already exist.
    #[serde(default)]
    pub cache_directory: Option<PathBuf>,
    #[serde(default)]
    pub clippings: Vec<Clipping>,
}

fn default_cache() -> bool {
    true
}

/// Malformed directive.
#[derive(Debug, thiserror::Error)]
pub enum DirectiveError {
    #[error("invalid directive JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("directive source is empty")]
    EmptySource,

    #[error("clipping #{}: {field} must not be 0", .index + 1)]
    ZeroLine { index: usize, field: &'static str },

    #[error("clipping #{}: collapse must be between 0 and 1, got {value}", .index + 1)]
    CollapseOutOfRange { index: usize, value: f64 },

    #[error("clipping #{}: indent must be at most {}, got {value}", .index + 1, MAX_INDENT)]
    IndentTooLarge { index: usize, value: usize },
}

impl Directive {
    #[must_use]
    pub fn new(source: impl Into<String>, mode: IncludeMode) -> Self {
        Self {
            source: source.into(),
            base_uri: None,
            mode,
            cache: true,
            cache_directory: None,
            clippings: Vec::new(),
        }
    }

    /// Parse and validate a directive.
    pub fn from_json(json: &str) -> Result<Self, DirectiveError> {
        let directive: Self = serde_json::from_str(json)?;
        directive.validate()?;
        Ok(directive)
    }

    /// Check constraints the schema alone does not express.
    pub fn validate(&self) -> Result<(), DirectiveError> {
        if self.source.trim().is_empty() {
            return Err(DirectiveError::EmptySource);
        }
        for (index, clipping) in self.clippings.iter().enumerate() {
            if clipping.start_line == 0 {
                return Err(DirectiveError::ZeroLine {
                    index,
                    field: "startLine",
                });
            }
            if clipping.end_line == 0 {
                return Err(DirectiveError::ZeroLine {
                    index,
                    field: "endLine",
                });
            }
            if !(0.0..=1.0).contains(&clipping.collapse) {
                return Err(DirectiveError::CollapseOutOfRange {
                    index,
                    value: clipping.collapse,
                });
            }
            if clipping.indent > MAX_INDENT {
                return Err(DirectiveError::IndentTooLarge {
                    index,
                    value: clipping.indent,
                });
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn with_base_uri(mut self, base_uri: impl Into<String>) -> Self {
        self.base_uri = Some(base_uri.into());
        self
    }

    #[must_use]
    pub fn with_cache(mut self, cache: bool) -> Self {
        self.cache = cache;
        self
    }

    #[must_use]
    pub fn with_cache_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_directory = Some(dir.into());
        self
    }

    #[must_use]
    pub fn with_clipping(mut self, clipping: Clipping) -> Self {
        self.clippings.push(clipping);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_minimal_directive() {
        let directive = Directive::from_json(r#"{"source": "a.md", "type": "opaque"}"#).unwrap();
        assert_eq!(directive, Directive::new("a.md", IncludeMode::Opaque));
        assert!(directive.cache);
    }

    #[test]
    fn test_full_directive() {
        let directive = Directive::from_json(
            r#"{
                "source": "https://example.com/a.md",
                "baseUri": "https://example.com/",
                "type": "reparse",
                "cache": false,
                "cacheDirectory": "/tmp/splice",
                "clippings": [{"startLine": 2}, {"region": "r"}]
            }"#,
        )
        .unwrap();

        let expected = Directive::new("https://example.com/a.md", IncludeMode::Reparse)
            .with_base_uri("https://example.com/")
            .with_cache(false)
            .with_cache_directory("/tmp/splice")
            .with_clipping(Clipping::lines(2, -1))
            .with_clipping(Clipping::region("r"));
        assert_eq!(directive, expected);
    }

    #[test]
    fn test_unknown_mode_rejected() {
        let err = Directive::from_json(r#"{"source": "a.md", "type": "markdown"}"#).unwrap_err();
        assert!(matches!(err, DirectiveError::Json(_)));
    }

    #[test]
    fn test_missing_mode_rejected() {
        assert!(Directive::from_json(r#"{"source": "a.md"}"#).is_err());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err =
            Directive::from_json(r#"{"source": "a.md", "type": "opaque", "src": "b"}"#).unwrap_err();
        assert!(err.to_string().contains("src"));
    }

    #[test]
    fn test_empty_source_rejected() {
        let err = Directive::from_json(r#"{"source": " ", "type": "opaque"}"#).unwrap_err();
        assert!(matches!(err, DirectiveError::EmptySource));
    }

    #[test]
    fn test_zero_line_rejected() {
        let err = Directive::from_json(
            r#"{"source": "a.md", "type": "opaque", "clippings": [{}, {"endLine": 0}]}"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            DirectiveError::ZeroLine {
                index: 1,
                field: "endLine"
            }
        ));
        assert_eq!(err.to_string(), "clipping #2: endLine must not be 0");
    }

    #[test]
    fn test_collapse_out_of_range_rejected() {
        let directive = Directive::new("a.md", IncludeMode::Opaque)
            .with_clipping(Clipping::default().with_collapse(1.5));
        assert!(matches!(
            directive.validate(),
            Err(DirectiveError::CollapseOutOfRange { index: 0, .. })
        ));
    }

    #[test]
    fn test_huge_indent_rejected() {
        let json = format!(
            r#"{{"source": "a.md", "type": "opaque", "clippings": [{{"indent": {}}}]}}"#,
            usize::MAX
        );
        let err = Directive::from_json(&json).unwrap_err();
        assert!(matches!(
            err,
            DirectiveError::IndentTooLarge { index: 0, value: usize::MAX }
        ));

        let directive = Directive::new("a.md", IncludeMode::Opaque)
            .with_clipping(Clipping::default().with_indent(MAX_INDENT));
        assert!(directive.validate().is_ok());
    }
}
