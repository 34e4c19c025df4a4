//! `splice include` command implementation.

use std::io::{self, Write};

use clap::Args;
use splice_core::{CompositionPass, Directive, Site};

use super::{CommonArgs, build_includer, report};
use crate::compose::LineComposer;
use crate::error::CliError;

/// Arguments for the include command.
#[derive(Args)]
pub(crate) struct IncludeArgs {
    /// Directive as a JSON object, e.g. '{"source": "a.md", "type": "opaque"}'.
    directive: String,

    #[command(flatten)]
    pub common: CommonArgs,
}

impl IncludeArgs {
    /// Execute the include command.
    ///
    /// # Errors
    ///
    /// Returns an error if the directive is malformed or cannot be resolved.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let directive = Directive::from_json(&self.directive)?;
        let config = self.common.load_config()?;
        let includer = build_includer(&config)?;

        let mut pass = CompositionPass::new();
        let mut composer = LineComposer::new();
        let content = includer.process(&directive, Site::new(None, 1), &mut pass, &mut composer)?;

        // Re-parse output is the composer's, opaque output is the raw clip
        let lines = match directive.mode {
            splice_core::IncludeMode::Reparse => composer.into_lines(),
            splice_core::IncludeMode::Opaque => content.lines().to_vec(),
        };

        let mut out = io::stdout().lock();
        for line in &lines {
            writeln!(out, "{line}")?;
        }

        report(&self.common, pass.forest())?;
        Ok(())
    }
}
