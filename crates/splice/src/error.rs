//! CLI error types.

use splice_config::ConfigError;
use splice_core::{DirectiveError, IncludeError, LocateError};

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Include(#[from] IncludeError),

    #[error("{0}")]
    Directive(#[from] DirectiveError),

    #[error("{0}")]
    Locate(#[from] LocateError),

    #[error("{0}")]
    Validation(String),
}
