//! Source addresses and the locator that produces them.
//!
//! A directive names its source with a string that may be an absolute URI,
//! an absolute local path, or a reference relative to some base. The locator
//! turns that string into a canonical [`SourceAddress`], which doubles as the
//! identity key for caching and cycle detection.
//!
//! Relative references resolve in this order:
//!
//! 1. against the address of the enclosing included content, if any;
//! 2. against the directive's own base, if it names one;
//! 3. against the root base configured on the locator.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use url::Url;

/// Address schemes a source may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    File,
    Http,
    Https,
}

impl Scheme {
    fn from_url(url: &Url) -> Option<Self> {
        match url.scheme() {
            "file" => Some(Self::File),
            "http" => Some(Self::Http),
            "https" => Some(Self::Https),
            _ => None,
        }
    }

    /// Scheme name as it appears in addresses.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Http => "http",
            Self::Https => "https",
        }
    }

    /// Whether content at this scheme is fetched over the network.
    #[must_use]
    pub fn is_remote(self) -> bool {
        matches!(self, Self::Http | Self::Https)
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error produced while locating a source.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocateError {
    /// The string is empty, malformed, or cannot be resolved to an address.
    #[error("invalid source \"{input}\": {reason}")]
    InvalidSource { input: String, reason: String },

    /// The string is a well-formed URI with a scheme other than file/http/https.
    #[error("unsupported scheme \"{scheme}\" in \"{input}\" (expected file, http or https)")]
    UnsupportedScheme { input: String, scheme: String },
}

impl LocateError {
    fn invalid(input: &str, reason: impl Into<String>) -> Self {
        Self::InvalidSource {
            input: input.to_owned(),
            reason: reason.into(),
        }
    }
}

/// Canonical, absolute address of a source.
///
/// Equality and hashing follow the canonical URI text, so the same file
/// reached through different relative spellings compares equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceAddress {
    url: Url,
    scheme: Scheme,
}

impl SourceAddress {
    fn from_url(url: Url, input: &str) -> Result<Self, LocateError> {
        let Some(scheme) = Scheme::from_url(&url) else {
            return Err(LocateError::UnsupportedScheme {
                input: input.to_owned(),
                scheme: url.scheme().to_owned(),
            });
        };
        if scheme.is_remote() && url.host_str().is_none_or(str::is_empty) {
            return Err(LocateError::invalid(input, "missing host"));
        }
        Ok(Self { url, scheme })
    }

    /// Parse an absolute URI or absolute local path.
    ///
    /// Relative references are rejected; use [`SourceLocator::locate`] for
    /// those.
    pub fn parse(input: &str) -> Result<Self, LocateError> {
        match parse_absolute(input)? {
            Some(address) => Ok(address),
            None => Err(LocateError::invalid(input, "not an absolute address")),
        }
    }

    /// Address of a local file.
    pub fn from_path(path: &Path) -> Result<Self, LocateError> {
        let display = path.display().to_string();
        let url = Url::from_file_path(normalize(path))
            .map_err(|()| LocateError::invalid(&display, "path must be absolute"))?;
        Self::from_url(url, &display)
    }

    /// Address of a local directory, suitable as a base for relative
    /// references.
    pub fn from_directory(path: &Path) -> Result<Self, LocateError> {
        let display = path.display().to_string();
        let url = Url::from_directory_path(normalize(path))
            .map_err(|()| LocateError::invalid(&display, "path must be absolute"))?;
        Self::from_url(url, &display)
    }

    /// Parse a base address.
    ///
    /// Accepts the same forms as [`SourceAddress::parse`]; a local path that
    /// names an existing directory is treated as a directory base so that
    /// relative references resolve inside it.
    pub fn parse_base(input: &str) -> Result<Self, LocateError> {
        let path = Path::new(input);
        if path.is_absolute() && path.is_dir() {
            return Self::from_directory(path);
        }
        Self::parse(input)
    }

    /// Resolve `reference` against this address.
    pub fn join(&self, reference: &str) -> Result<Self, LocateError> {
        let url = self
            .url
            .join(reference)
            .map_err(|e| LocateError::invalid(reference, e.to_string()))?;
        Self::from_url(url, reference)
    }

    #[must_use]
    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Canonical URI text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    /// Local path for `file` addresses.
    #[must_use]
    pub fn to_file_path(&self) -> Option<PathBuf> {
        match self.scheme {
            Scheme::File => self.url.to_file_path().ok(),
            Scheme::Http | Scheme::Https => None,
        }
    }
}

impl fmt::Display for SourceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

/// Collapse `.` and `..` components without touching the filesystem.
///
/// `..` at the root stays at the root, as in URL reference resolution.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Parse `input` if it is already absolute.
///
/// Returns `Ok(None)` for relative references.
fn parse_absolute(input: &str) -> Result<Option<SourceAddress>, LocateError> {
    if input.trim().is_empty() {
        return Err(LocateError::invalid(input, "empty source"));
    }

    // Windows drive letters parse as one-letter URI schemes
    let path = Path::new(input);
    if path.is_absolute() {
        return SourceAddress::from_path(path).map(Some);
    }

    match Url::parse(input) {
        Ok(url) if url.scheme().len() > 1 => SourceAddress::from_url(url, input).map(Some),
        Ok(_) | Err(url::ParseError::RelativeUrlWithoutBase) => Ok(None),
        Err(e) => Err(LocateError::invalid(input, e.to_string())),
    }
}

/// Resolves directive source strings to canonical addresses.
#[derive(Debug, Clone, Default)]
pub struct SourceLocator {
    root: Option<SourceAddress>,
}

impl SourceLocator {
    /// Create a locator with an optional root base.
    #[must_use]
    pub fn new(root: Option<SourceAddress>) -> Self {
        Self { root }
    }

    /// Create a locator whose root base is parsed from `base`.
    pub fn from_base(base: &str) -> Result<Self, LocateError> {
        SourceAddress::parse_base(base).map(|root| Self { root: Some(root) })
    }

    #[must_use]
    pub fn root(&self) -> Option<&SourceAddress> {
        self.root.as_ref()
    }

    /// Resolve `source` to an absolute address.
    ///
    /// `parent` is the address of the included content the directive was
    /// found in (absent for directives in a top-level document). `base` is
    /// the directive's own base, used only when there is no parent.
    pub fn locate(
        &self,
        source: &str,
        parent: Option<&SourceAddress>,
        base: Option<&SourceAddress>,
    ) -> Result<SourceAddress, LocateError> {
        if let Some(address) = parse_absolute(source)? {
            return Ok(address);
        }

        let Some(base) = parent.or(base).or(self.root.as_ref()) else {
            return Err(LocateError::invalid(
                source,
                "relative source with no base address",
            ));
        };

        let address = base.join(source)?;
        tracing::debug!(source, base = %base, address = %address, "located source");
        Ok(address)
    }
}
