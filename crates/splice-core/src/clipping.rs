//! Clipping: selecting and reshaping line ranges of resolved content.
//!
//! Each boundary of a clip is chosen independently, most specific first:
//!
//! | Boundary | 1st            | 2nd                       | 3rd        |
//! |----------|----------------|---------------------------|------------|
//! | start    | `startString`  | `ANCHOR: {region}` line   | `startLine`|
//! | end      | `endString`    | `ANCHOR_END: {region}`    | `endLine`  |
//!
//! Demarcation lines (the lines containing a start/end string or a region
//! marker) are never part of the clip. Line numbers are 1-based and
//! inclusive; negative numbers count from the end, so `-1` is the last line.

use std::fmt;

use serde::Deserialize;

use crate::whitespace::WhitespaceTransform;

/// Prefix of the line that opens a named region.
pub const REGION_START_MARKER: &str = "ANCHOR:";

/// Prefix of the line that closes a named region.
pub const REGION_END_MARKER: &str = "ANCHOR_END:";

/// One clip of a source.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct Clipping {
    pub start_line: i64,
    pub end_line: i64,
    pub start_string: Option<String>,
    pub end_string: Option<String>,
    pub region: Option<String>,
    pub dedent: usize,
    pub indent: usize,
    pub collapse: f64,
    /// Text emitted before the clip, outside the whitespace transform.
    pub before: Option<String>,
    /// Text emitted after the clip, outside the whitespace transform.
    pub after: Option<String>,
}

impl Default for Clipping {
    fn default() -> Self {
        Self {
            start_line: 1,
            end_line: -1,
            start_string: None,
            end_string: None,
            region: None,
            dedent: 0,
            indent: 0,
            collapse: 1.0,
            before: None,
            after: None,
        }
    }
}

impl Clipping {
    /// Clip spanning `start..=end`.
    #[must_use]
    pub fn lines(start: i64, end: i64) -> Self {
        Self {
            start_line: start,
            end_line: end,
            ..Self::default()
        }
    }

    /// Clip covering a named region.
    #[must_use]
    pub fn region(name: impl Into<String>) -> Self {
        Self {
            region: Some(name.into()),
            ..Self::default()
        }
    }

    /// Clip between two demarcation strings.
    #[must_use]
    pub fn between(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start_string: Some(start.into()),
            end_string: Some(end.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_dedent(mut self, dedent: usize) -> Self {
        self.dedent = dedent;
        self
    }

    #[must_use]
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    #[must_use]
    pub fn with_collapse(mut self, collapse: f64) -> Self {
        self.collapse = collapse;
        self
    }

    #[must_use]
    pub fn with_before(mut self, before: impl Into<String>) -> Self {
        self.before = Some(before.into());
        self
    }

    #[must_use]
    pub fn with_after(mut self, after: impl Into<String>) -> Self {
        self.after = Some(after.into());
        self
    }

    #[must_use]
    pub fn whitespace(&self) -> WhitespaceTransform {
        WhitespaceTransform {
            dedent: self.dedent,
            collapse: self.collapse,
            indent: self.indent,
        }
    }
}

/// Which demarcation a failed search was looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    StartString,
    EndString,
    RegionStart,
    RegionEnd,
}

impl fmt::Display for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::StartString => "start string",
            Self::EndString => "end string",
            Self::RegionStart => "region start",
            Self::RegionEnd => "region end",
        })
    }
}

/// Error resolving a clip against content.
///
/// `index` is the zero-based position of the clip in the directive.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClippingError {
    #[error("clipping #{}: no line contains {boundary} \"{needle}\"", .index + 1)]
    DemarcationNotFound {
        index: usize,
        boundary: Boundary,
        needle: String,
    },

    #[error(
        "clipping #{}: line range {start}..{end} is invalid for content with {line_count} lines",
        .index + 1
    )]
    InvalidLineRange {
        index: usize,
        start: i64,
        end: i64,
        line_count: usize,
    },
}

/// Apply `clippings` to `lines`, concatenating the clips in order.
///
/// No clippings means the whole content, unchanged.
pub fn resolve(lines: &[String], clippings: &[Clipping]) -> Result<Vec<String>, ClippingError> {
    if clippings.is_empty() {
        return Ok(lines.to_vec());
    }

    let mut out = Vec::new();
    for (index, clipping) in clippings.iter().enumerate() {
        let range = line_range(lines, clipping, index)?;
        tracing::debug!(
            index,
            start = range.start + 1,
            end = range.end,
            "resolved clipping"
        );
        emit(&mut out, lines, range, clipping);
    }
    Ok(out)
}

fn emit(
    out: &mut Vec<String>,
    lines: &[String],
    range: std::ops::Range<usize>,
    clipping: &Clipping,
) {
    if let Some(before) = &clipping.before {
        out.extend(crate::content::split_lines(before));
    }

    let transform = clipping.whitespace();
    if transform.is_identity() {
        out.extend_from_slice(&lines[range]);
    } else {
        out.extend(lines[range].iter().map(|line| transform.apply(line)));
    }

    if let Some(after) = &clipping.after {
        out.extend(crate::content::split_lines(after));
    }
}

/// Zero-based, half-open line range selected by `clipping`.
fn line_range(
    lines: &[String],
    clipping: &Clipping,
    index: usize,
) -> Result<std::ops::Range<usize>, ClippingError> {
    let line_count = lines.len();
    let not_found = |boundary, needle: &str| ClippingError::DemarcationNotFound {
        index,
        boundary,
        needle: needle.to_owned(),
    };

    let region_start = match (&clipping.region, &clipping.start_string, &clipping.end_string) {
        (Some(name), None, _) | (Some(name), _, None) => {
            let marker = format!("{REGION_START_MARKER} {name}");
            Some(find(lines, 0, &marker).ok_or_else(|| not_found(Boundary::RegionStart, &marker))?)
        }
        _ => None,
    };

    // 1-based inclusive bounds from here on
    let start: i64 = if let Some(needle) = &clipping.start_string {
        let found = find(lines, 0, needle).ok_or_else(|| not_found(Boundary::StartString, needle))?;
        to_line(found) + 1
    } else if let Some(marker) = region_start {
        to_line(marker) + 1
    } else {
        normalize(clipping.start_line, line_count)
    };

    let search_from = usize::try_from(start - 1).unwrap_or(0);
    let end: i64 = if let Some(needle) = &clipping.end_string {
        let found = find(lines, search_from, needle)
            .ok_or_else(|| not_found(Boundary::EndString, needle))?;
        to_line(found) - 1
    } else if let (Some(name), Some(marker)) = (&clipping.region, region_start) {
        let end_marker = format!("{REGION_END_MARKER} {name}");
        let found = find(lines, marker + 1, &end_marker)
            .ok_or_else(|| not_found(Boundary::RegionEnd, &end_marker))?;
        to_line(found) - 1
    } else {
        normalize(clipping.end_line, line_count)
    };

    let valid = start >= 1 && end <= as_i64(line_count) && start <= end + 1;
    if !valid {
        return Err(ClippingError::InvalidLineRange {
            index,
            start,
            end,
            line_count,
        });
    }

    let first = usize::try_from(start - 1).unwrap_or_default();
    let last = usize::try_from(end).unwrap_or_default();
    Ok(first..last.max(first))
}

/// Index of the first line at or after `from` containing `needle`.
fn find(lines: &[String], from: usize, needle: &str) -> Option<usize> {
    lines
        .get(from..)?
        .iter()
        .position(|line| line.contains(needle))
        .map(|i| from + i)
}

fn as_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// 1-based line number of a zero-based index.
fn to_line(index: usize) -> i64 {
    as_i64(index) + 1
}

/// Map a possibly negative line number onto `1..=line_count`.
fn normalize(line: i64, line_count: usize) -> i64 {
    if line < 0 {
        as_i64(line_count) + line + 1
    } else {
        line
    }
}
