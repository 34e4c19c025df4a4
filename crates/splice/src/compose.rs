//! Line-oriented document grammar.
//!
//! A line whose first non-blank text is `::include` followed by a JSON object
//! is a directive; every other line is copied through. Opaque results are
//! copied verbatim, re-parse results are expanded in place.

use splice_core::{Composer, Directive, IncludeError, IncludeMode, Scope};

const DIRECTIVE_PREFIX: &str = "::include";

/// JSON body of a directive line, if `line` is one.
fn directive_json(line: &str) -> Option<&str> {
    let rest = line.trim_start().strip_prefix(DIRECTIVE_PREFIX)?;
    let json = rest.trim();
    (rest.starts_with(char::is_whitespace) && json.starts_with('{')).then_some(json)
}

/// Composer that flattens a document into output lines.
#[derive(Debug, Default)]
pub(crate) struct LineComposer {
    out: Vec<String>,
}

impl LineComposer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn into_lines(self) -> Vec<String> {
        self.out
    }
}

impl Composer for LineComposer {
    fn reparse(&mut self, lines: &[String], scope: &mut Scope<'_>) -> Result<(), IncludeError> {
        for (index, line) in lines.iter().enumerate() {
            let Some(json) = directive_json(line) else {
                self.out.push(line.clone());
                continue;
            };

            let line_number = index + 1;
            let directive = Directive::from_json(json)
                .map_err(|e| scope.invalid_directive(json, line_number, e))?;
            let content = scope.include(&directive, line_number, self)?;

            if directive.mode == IncludeMode::Opaque {
                self.out.extend_from_slice(content.lines());
            }
        }
        Ok(())
    }
}
