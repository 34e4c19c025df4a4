//! Environment variable expansion for configuration strings.
//!
//! Supports:
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default

use crate::ConfigError;

/// Expand environment variable references in a string.
///
/// Returns the original string unchanged if no `${}` patterns are present.
/// Bare `$VAR` syntax is left alone when the string has no braced reference.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    // Fast path: no expansion needed
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    if let Some(missing) = required_vars(value)
        .into_iter()
        .find(|var| std::env::var(var).is_err())
    {
        return Err(ConfigError::EnvVar {
            field: field.to_owned(),
            message: format!("${{{missing}}} not set"),
        });
    }

    shellexpand::env_with_context(value, |var| -> Result<Option<String>, std::env::VarError> {
        Ok(std::env::var(var).ok())
    })
    .map(std::borrow::Cow::into_owned)
    .map_err(|e| ConfigError::EnvVar {
        field: field.to_owned(),
        message: format!("${{{0}}}: {1}", e.var_name, e.cause),
    })
}

/// Names referenced as `${VAR}` without a `:-default` fallback.
fn required_vars(value: &str) -> Vec<&str> {
    let mut vars = Vec::new();
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            break;
        };
        let inner = &after[..end];
        if !inner.contains(":-") {
            vars.push(inner);
        }
        rest = &after[end + 1..];
    }

    vars
}
