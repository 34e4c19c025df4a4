//! Per-line leading whitespace adjustments.
//!
//! Applied to every line of a clip in a fixed order: dedent, then collapse,
//! then indent.

/// Leading whitespace adjustments for a single clip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WhitespaceTransform {
    /// Leading whitespace characters to remove (at most).
    pub dedent: usize,
    /// Fraction of the remaining leading whitespace to keep, in `[0, 1]`.
    pub collapse: f64,
    /// Spaces to prepend.
    pub indent: usize,
}

impl Default for WhitespaceTransform {
    fn default() -> Self {
        Self {
            dedent: 0,
            collapse: 1.0,
            indent: 0,
        }
    }
}

impl WhitespaceTransform {
    /// Whether applying this transform leaves every line unchanged.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.dedent == 0 && self.collapse >= 1.0 && self.indent == 0
    }

    /// Transform one line.
    #[must_use]
    pub fn apply(&self, line: &str) -> String {
        let line = strip_leading(line, self.dedent);
        let line = collapse(line, self.collapse);
        let mut out = String::with_capacity(self.indent.saturating_add(line.len()));
        out.extend(std::iter::repeat_n(' ', self.indent));
        out.push_str(line);
        out
    }
}

/// Number of leading whitespace characters.
fn leading_whitespace(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}

/// Remove up to `count` leading whitespace characters.
fn strip_leading(line: &str, count: usize) -> &str {
    let cut = line
        .char_indices()
        .take_while(|(_, c)| c.is_whitespace())
        .take(count)
        .last()
        .map_or(0, |(i, c)| i + c.len_utf8());
    &line[cut..]
}

/// Keep `floor(n * ratio)` of the `n` leading whitespace characters.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn collapse(line: &str, ratio: f64) -> &str {
    if ratio >= 1.0 {
        return line;
    }
    let n = leading_whitespace(line);
    let keep = ((n as f64) * ratio.max(0.0)).floor() as usize;
    strip_leading(line, n - keep.min(n))
}
