//! Line model for resolved content.

use std::sync::Arc;

/// Normalized content of a source, as a sequence of lines.
///
/// Cheap to clone: the lines are shared behind an [`Arc`] so every requester
/// of the same address sees the same buffer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolvedContent {
    lines: Arc<[String]>,
}

impl ResolvedContent {
    /// Decode and split raw source bytes.
    ///
    /// Invalid UTF-8 is replaced lossily and NUL characters become
    /// U+FFFD. Line terminators (`\r\n`, `\n`, `\r`) are stripped; a final
    /// terminator does not produce a trailing empty line.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let text = String::from_utf8_lossy(bytes);
        let text = if text.contains('\0') {
            text.replace('\0', "\u{FFFD}")
        } else {
            text.into_owned()
        };
        Self::from(split_lines(&text))
    }

    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Join the lines with `\n`, without a trailing terminator.
    #[must_use]
    pub fn to_text(&self) -> String {
        self.lines.join("\n")
    }
}

impl From<Vec<String>> for ResolvedContent {
    fn from(lines: Vec<String>) -> Self {
        Self {
            lines: lines.into(),
        }
    }
}

/// Split `text` on `\r\n`, `\n` and lone `\r`.
#[must_use]
pub fn split_lines(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut rest = text;

    while let Some(pos) = rest.find(['\r', '\n']) {
        lines.push(rest[..pos].to_owned());
        let skip = if rest[pos..].starts_with("\r\n") { 2 } else { 1 };
        rest = &rest[pos + skip..];
    }

    if !rest.is_empty() {
        lines.push(rest.to_owned());
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_split_mixed_terminators() {
        assert_eq!(split_lines("a\r\nb\nc\rd"), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_split_no_trailing_empty_line() {
        assert_eq!(split_lines("a\nb\n"), vec!["a", "b"]);
        assert_eq!(split_lines("a\r\n"), vec!["a"]);
    }

    #[test]
    fn test_split_keeps_inner_empty_lines() {
        assert_eq!(split_lines("a\n\n\nb"), vec!["a", "", "", "b"]);
        assert_eq!(split_lines("\n"), vec![""]);
    }

    #[test]
    fn test_split_empty() {
        assert!(split_lines("").is_empty());
    }

    #[test]
    fn test_from_bytes_replaces_invalid_utf8_and_nul() {
        let content = ResolvedContent::from_bytes(b"ok\nbad\xFF\nnul\0here");
        assert_eq!(
            content.lines(),
            &["ok", "bad\u{FFFD}", "nul\u{FFFD}here"].map(String::from)
        );
    }

    #[test]
    fn test_to_text() {
        let content = ResolvedContent::from_bytes(b"a\r\nb\r\n");
        assert_eq!(content.to_text(), "a\nb");
        assert_eq!(content.len(), 2);
    }
}
