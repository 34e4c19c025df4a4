//! `splice expand` command implementation.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::Args;
use rayon::prelude::*;
use splice_core::{CompositionPass, InclusionForest, Includer, ResolvedContent, SourceAddress};

use super::{CommonArgs, build_includer, report};
use crate::compose::LineComposer;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the expand command.
#[derive(Args)]
pub(crate) struct ExpandArgs {
    /// Documents to expand.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Write expanded documents into this directory instead of stdout.
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// One expanded document.
#[derive(Debug)]
struct Expanded {
    path: PathBuf,
    lines: Vec<String>,
    forest: InclusionForest,
}

impl ExpandArgs {
    /// Execute the expand command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or any document fails to expand.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = self.common.load_config()?;
        let includer = build_includer(&config)?;

        if let Some(dir) = &self.output_dir {
            fs::create_dir_all(dir)?;
        }

        let results: Vec<_> = self
            .files
            .par_iter()
            .map(|path| expand_file(&includer, path))
            .collect();

        let mut failed = 0;
        for (path, result) in self.files.iter().zip(results) {
            match result {
                Ok(expanded) => self.emit(&output, &expanded)?,
                Err(e) => {
                    failed += 1;
                    output.error(&format!("{}: {e}", path.display()));
                }
            }
        }

        if failed > 0 {
            return Err(CliError::Validation(format!(
                "{failed} of {} documents failed to expand",
                self.files.len()
            )));
        }
        Ok(())
    }

    fn emit(&self, output: &Output, expanded: &Expanded) -> Result<(), CliError> {
        let mut text = expanded.lines.join("\n");
        text.push('\n');

        match &self.output_dir {
            Some(dir) => {
                let name = expanded.path.file_name().ok_or_else(|| {
                    CliError::Validation(format!("not a file: {}", expanded.path.display()))
                })?;
                let target = dir.join(name);
                fs::write(&target, text)?;
                output.success(&format!(
                    "Expanded {} -> {} ({} inclusions)",
                    expanded.path.display(),
                    target.display(),
                    expanded.forest.len()
                ));
            }
            None => io::stdout().lock().write_all(text.as_bytes())?,
        }

        if self.common.tree || self.common.deps {
            output.detail(&format!("{}:", expanded.path.display()));
            report(&self.common, &expanded.forest)?;
        }
        Ok(())
    }
}

/// Expand one document in its own composition pass.
fn expand_file(includer: &Includer, path: &Path) -> Result<Expanded, CliError> {
    let absolute = std::path::absolute(path)?;
    let document = SourceAddress::from_path(&absolute)?;
    let content = ResolvedContent::from_bytes(&fs::read(path)?);

    let mut pass = CompositionPass::new();
    let mut composer = LineComposer::new();
    includer.compose(Some(document), content.lines(), &mut pass, &mut composer)?;
    tracing::info!(path = %path.display(), inclusions = pass.forest().len(), "expanded document");

    Ok(Expanded {
        path: path.to_path_buf(),
        lines: composer.into_lines(),
        forest: pass.into_forest(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use splice_core::{IncludeErrorKind, RemoteFetcher, RetryPolicy, SourceLocator};
    use std::time::Duration;
    use tempfile::TempDir;

    fn includer(root: &Path) -> Includer {
        Includer::new(
            SourceLocator::from_base(root.to_str().unwrap()).unwrap(),
            RemoteFetcher::http(Duration::from_secs(1), RetryPolicy::default()),
        )
    }

    #[test]
    fn test_expand_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("part.md"), "part line\n").unwrap();
        let doc = tmp.path().join("doc.md");
        fs::write(
            &doc,
            "head\r\n::include {\"source\": \"part.md\", \"type\": \"reparse\"}\r\ntail\r\n",
        )
        .unwrap();

        let expanded = expand_file(&includer(tmp.path()), &doc).unwrap();

        assert_eq!(expanded.lines, vec!["head", "part line", "tail"]);
        assert_eq!(expanded.forest.len(), 1);
    }

    #[test]
    fn test_expand_file_error_names_document() {
        let tmp = TempDir::new().unwrap();
        let doc = tmp.path().join("doc.md");
        fs::write(&doc, "::include {\"source\": \"missing.md\", \"type\": \"opaque\"}").unwrap();

        let err = expand_file(&includer(tmp.path()), &doc).unwrap_err();

        let err = match err {
            CliError::Include(err) => err,
            other => panic!("expected include error, got {other}"),
        };
        assert!(matches!(err.kind, IncludeErrorKind::SourceUnavailable { .. }));
        assert!(err.to_string().contains("doc.md, line 1"));
    }

    #[test]
    fn test_documents_expand_in_parallel_with_separate_passes() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("shared.md"), "shared").unwrap();
        let docs: Vec<_> = (0..4)
            .map(|i| {
                let doc = tmp.path().join(format!("doc{i}.md"));
                fs::write(
                    &doc,
                    format!("doc {i}\n::include {{\"source\": \"shared.md\", \"type\": \"reparse\"}}"),
                )
                .unwrap();
                doc
            })
            .collect();
        let includer = includer(tmp.path());

        let results: Vec<_> = docs
            .par_iter()
            .map(|doc| expand_file(&includer, doc).unwrap())
            .collect();

        for (i, expanded) in results.iter().enumerate() {
            assert_eq!(expanded.lines, vec![format!("doc {i}"), "shared".to_owned()]);
            assert_eq!(expanded.forest.len(), 1);
        }
        assert_eq!(includer.cache().len(), 1);
    }
}
