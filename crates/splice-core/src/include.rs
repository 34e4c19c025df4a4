//! Directive processing.
//!
//! [`Includer`] is the long-lived part: the locator, the content cache and
//! the disk tier settings, shared by every document. [`CompositionPass`] is
//! the per-document part: the active inclusion chain, the forest under
//! construction and the cancellation flag.
//!
//! The document grammar itself lives outside this crate, behind the
//! [`Composer`] trait. When re-parse content is included, the includer hands
//! the clipped lines back to the composer together with a [`Scope`], and the
//! composer calls [`Scope::include`] for every directive it finds. Recursion
//! therefore runs through the composer, while the includer keeps the chain
//! and the forest consistent across levels.

use splice_cache::DiskCache;

use crate::address::{SourceAddress, SourceLocator};
use crate::clipping;
use crate::content::{ContentCache, ResolvedContent};
use crate::cycle::{CycleDetector, Site};
use crate::directive::{Directive, DirectiveError, IncludeMode};
use crate::error::{IncludeError, IncludeErrorKind};
use crate::fetch::{CancellationToken, RemoteFetcher};
use crate::tree::{InclusionForest, InclusionNode, TreeBuilder};

/// Document grammar that directives are embedded in.
pub trait Composer {
    /// Process `lines` as document content.
    ///
    /// Directives found in the lines are passed to [`Scope::include`] with
    /// their 1-based line number.
    fn reparse(&mut self, lines: &[String], scope: &mut Scope<'_>) -> Result<(), IncludeError>;
}

/// State of composing one top-level document.
#[derive(Debug, Default)]
pub struct CompositionPass {
    cycles: CycleDetector,
    tree: TreeBuilder,
    cancel: CancellationToken,
}

impl CompositionPass {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `cancel` to abort this pass from another thread.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    #[must_use]
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Inclusions recorded so far.
    #[must_use]
    pub fn forest(&self) -> &InclusionForest {
        self.tree.forest()
    }

    #[must_use]
    pub fn into_forest(self) -> InclusionForest {
        self.tree.into_forest()
    }
}

/// Position of a composer inside the inclusion chain.
pub struct Scope<'a> {
    includer: &'a Includer,
    pass: &'a mut CompositionPass,
    address: Option<SourceAddress>,
}

impl Scope<'_> {
    /// Address of the content being composed, if it has one.
    #[must_use]
    pub fn address(&self) -> Option<&SourceAddress> {
        self.address.as_ref()
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.pass.cancel.is_cancelled()
    }

    /// Process the directive found at `line` of the current content.
    pub fn include(
        &mut self,
        directive: &Directive,
        line: usize,
        composer: &mut dyn Composer,
    ) -> Result<ResolvedContent, IncludeError> {
        let site = Site::new(self.address.clone(), line);
        self.includer.process(directive, site, self.pass, composer)
    }

    /// Error for a directive at `line` that could not be parsed.
    #[must_use]
    pub fn invalid_directive(&self, raw: &str, line: usize, error: DirectiveError) -> IncludeError {
        IncludeError::new(
            raw,
            Site::new(self.address.clone(), line),
            IncludeErrorKind::Directive(error),
        )
    }
}

/// Resolves directives against sources.
///
/// Safe to share across threads; each thread composes its own documents with
/// its own [`CompositionPass`].
#[derive(Debug)]
pub struct Includer {
    locator: SourceLocator,
    cache: ContentCache,
    disk: Option<DiskCache>,
    disk_enabled: bool,
}

impl Includer {
    #[must_use]
    pub fn new(locator: SourceLocator, fetcher: RemoteFetcher) -> Self {
        Self {
            locator,
            cache: ContentCache::new(fetcher),
            disk: None,
            disk_enabled: true,
        }
    }

    /// Default disk tier for remote sources.
    #[must_use]
    pub fn with_disk_cache(mut self, disk: DiskCache) -> Self {
        self.disk = Some(disk);
        self
    }

    /// Turn the disk tier off for every directive.
    #[must_use]
    pub fn with_disk_enabled(mut self, enabled: bool) -> Self {
        self.disk_enabled = enabled;
        self
    }

    #[must_use]
    pub fn locator(&self) -> &SourceLocator {
        &self.locator
    }

    #[must_use]
    pub fn cache(&self) -> &ContentCache {
        &self.cache
    }

    /// Compose a top-level document.
    ///
    /// `document` is the document's own address, used to label error sites.
    /// Relative sources in the document resolve against the directive's base
    /// or the locator's root, never against `document`.
    pub fn compose(
        &self,
        document: Option<SourceAddress>,
        lines: &[String],
        pass: &mut CompositionPass,
        composer: &mut dyn Composer,
    ) -> Result<(), IncludeError> {
        let mut scope = Scope {
            includer: self,
            pass,
            address: document,
        };
        composer.reparse(lines, &mut scope)
    }

    /// Process one directive found at `site`.
    ///
    /// Returns the clipped lines. For re-parse directives the composer has
    /// already seen them, with nested directives expanded, by the time this
    /// returns.
    ///
    /// Content is resolved once per address for the life of the includer.
    /// The disk tier named by the first directive to reach an address is the
    /// one populated; later directives for that address are served from
    /// memory and leave their own `cacheDirectory` untouched.
    pub fn process(
        &self,
        directive: &Directive,
        site: Site,
        pass: &mut CompositionPass,
        composer: &mut dyn Composer,
    ) -> Result<ResolvedContent, IncludeError> {
        let fail = |kind: IncludeErrorKind| IncludeError::new(&directive.source, site.clone(), kind);

        if pass.cancel.is_cancelled() {
            return Err(fail(IncludeErrorKind::Cancelled));
        }
        directive.validate().map_err(|e| fail(e.into()))?;

        let address = self.locate(directive, pass).map_err(&fail)?;
        let disk = self.disk_for(directive).map_err(&fail)?;
        tracing::debug!(
            source = %directive.source,
            address = %address,
            line = site.line,
            mode = ?directive.mode,
            "processing directive"
        );

        let content = self
            .cache
            .get(&address, disk.as_ref(), &pass.cancel)
            .map_err(|cause| {
                fail(IncludeErrorKind::SourceUnavailable {
                    address: address.clone(),
                    cause,
                })
            })?;

        pass.cycles.push(site.clone()).map_err(|e| fail(e.into()))?;
        pass.tree
            .open(InclusionNode::new(address.clone(), directive, site.clone()));

        let result = self.expand(directive, address, &content, pass, composer);

        pass.cycles.pop();
        match result {
            Ok(lines) => {
                pass.tree.close();
                Ok(lines)
            }
            Err(kind) => {
                pass.tree.abandon();
                Err(fail(kind))
            }
        }
    }

    fn locate(
        &self,
        directive: &Directive,
        pass: &CompositionPass,
    ) -> Result<SourceAddress, IncludeErrorKind> {
        let base = directive
            .base_uri
            .as_deref()
            .map(SourceAddress::parse_base)
            .transpose()?;
        let address =
            self.locator
                .locate(&directive.source, pass.tree.current_address(), base.as_ref())?;
        Ok(address)
    }

    /// Disk tier for `directive`, if it applies.
    ///
    /// An explicit cache directory is validated even when caching is off.
    fn disk_for(&self, directive: &Directive) -> Result<Option<DiskCache>, IncludeErrorKind> {
        let disk = match &directive.cache_directory {
            Some(dir) => Some(
                DiskCache::existing(dir.clone())
                    .map_err(|_| IncludeErrorKind::InvalidCacheDirectory(dir.clone()))?,
            ),
            None => self.disk.clone(),
        };
        Ok(disk.filter(|_| directive.cache && self.disk_enabled))
    }

    fn expand(
        &self,
        directive: &Directive,
        address: SourceAddress,
        content: &ResolvedContent,
        pass: &mut CompositionPass,
        composer: &mut dyn Composer,
    ) -> Result<ResolvedContent, IncludeErrorKind> {
        let lines = clipping::resolve(content.lines(), &directive.clippings)?;

        if directive.mode == IncludeMode::Reparse {
            let mut scope = Scope {
                includer: self,
                pass,
                address: Some(address),
            };
            composer
                .reparse(&lines, &mut scope)
                .map_err(|e| IncludeErrorKind::Nested(Box::new(e)))?;
        }

        Ok(ResolvedContent::from(lines))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipping::Clipping;
    use crate::content::ContentError;
    use crate::fetch::{AttemptError, FetchError, RetryPolicy, Transport};
    use crate::mock::MockTransport;
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::path::Path;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;
    use tempfile::TempDir;

    const DIRECTIVE_PREFIX: &str = "::include ";

    /// Line-oriented grammar: `::include {json}` lines are directives.
    #[derive(Default)]
    struct Flatten {
        out: Vec<String>,
    }

    impl Composer for Flatten {
        fn reparse(&mut self, lines: &[String], scope: &mut Scope<'_>) -> Result<(), IncludeError> {
            for (index, line) in lines.iter().enumerate() {
                let Some(json) = line.trim_start().strip_prefix(DIRECTIVE_PREFIX) else {
                    self.out.push(line.clone());
                    continue;
                };
                let directive = Directive::from_json(json)
                    .map_err(|e| scope.invalid_directive(json, index + 1, e))?;
                let content = scope.include(&directive, index + 1, self)?;
                if directive.mode == IncludeMode::Opaque {
                    self.out.extend_from_slice(content.lines());
                }
            }
            Ok(())
        }
    }

    fn write(dir: &Path, name: &str, content: &str) {
        let path = dir.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn directive(source: &str, mode: &str) -> String {
        format!(r#"::include {{"source": "{source}", "type": "{mode}"}}"#)
    }

    fn includer(root: &Path, transport: &Arc<MockTransport>) -> Includer {
        Includer::new(
            SourceLocator::from_base(root.to_str().unwrap()).unwrap(),
            RemoteFetcher::new(
                Arc::clone(transport) as Arc<dyn Transport>,
                RetryPolicy {
                    max_attempts: 3,
                    delay: Duration::from_millis(1),
                },
            ),
        )
    }

    fn compose(includer: &Includer, document: &str) -> Result<(Vec<String>, InclusionForest), IncludeError> {
        let mut pass = CompositionPass::new();
        let mut composer = Flatten::default();
        let lines = crate::content::split_lines(document);
        includer.compose(None, &lines, &mut pass, &mut composer)?;
        Ok((composer.out, pass.into_forest()))
    }

    fn setup() -> (TempDir, Arc<MockTransport>) {
        (TempDir::new().unwrap(), Arc::new(MockTransport::new()))
    }

    #[test]
    fn test_opaque_include_with_clipping() {
        let (tmp, transport) = setup();
        write(tmp.path(), "code.rs", "fn a() {}\n    // start\n    body();\n    // end\n");
        let includer = includer(tmp.path(), &transport);

        let document = format!(
            "before\n::include {}\nafter",
            r#"{"source": "code.rs", "type": "opaque", "clippings": [{"startString": "start", "endString": "end", "dedent": 4}]}"#
        );
        let (out, forest) = compose(&includer, &document).unwrap();

        assert_eq!(out, vec!["before", "body();", "after"]);
        assert_eq!(forest.len(), 1);
        assert_eq!(forest.roots()[0].site, Site::new(None, 2));
    }

    #[test]
    fn test_opaque_content_not_expanded() {
        let (tmp, transport) = setup();
        write(tmp.path(), "a.md", &directive("b.md", "reparse"));
        let includer = includer(tmp.path(), &transport);

        let (out, forest) = compose(&includer, &directive("a.md", "opaque")).unwrap();

        assert_eq!(out, vec![directive("b.md", "reparse")]);
        assert_eq!(forest.len(), 1);
    }

    #[test]
    fn test_nested_reparse_builds_tree() {
        let (tmp, transport) = setup();
        write(tmp.path(), "a.md", &format!("A1\n{}\nA3", directive("b.md", "reparse")));
        write(tmp.path(), "b.md", "B1\nB2");
        let includer = includer(tmp.path(), &transport);

        let (out, forest) = compose(&includer, &directive("a.md", "reparse")).unwrap();

        assert_eq!(out, vec!["A1", "B1", "B2", "A3"]);
        let a = &forest.roots()[0];
        assert!(a.address.as_str().ends_with("/a.md"));
        assert_eq!(a.children.len(), 1);
        assert!(a.children[0].address.as_str().ends_with("/b.md"));
        assert_eq!(a.children[0].site.line, 2);
        assert_eq!(a.children[0].site.address.as_ref(), Some(&a.address));
    }

    #[test]
    fn test_nested_relative_to_parent() {
        let (tmp, transport) = setup();
        write(tmp.path(), "guide/a.md", &directive("parts/b.md", "reparse"));
        write(tmp.path(), "guide/parts/b.md", "nested");
        write(tmp.path(), "parts/b.md", "wrong");
        let includer = includer(tmp.path(), &transport);

        let (out, _) = compose(&includer, &directive("guide/a.md", "reparse")).unwrap();

        assert_eq!(out, vec!["nested"]);
    }

    #[test]
    fn test_directive_base_uri_for_root() {
        let (tmp, transport) = setup();
        write(tmp.path(), "other/a.md", "from other");
        let includer = includer(&tmp.path().join("elsewhere"), &transport);
        let base = tmp.path().join("other");

        let document = format!(
            r#"::include {{"source": "a.md", "type": "opaque", "baseUri": "{}"}}"#,
            base.display()
        );
        let (out, _) = compose(&includer, &document).unwrap();

        assert_eq!(out, vec!["from other"]);
    }

    #[test]
    fn test_cycle_reports_chain() {
        let (tmp, transport) = setup();
        write(tmp.path(), "a.md", &format!("A\n{}", directive("b.md", "reparse")));
        write(
            tmp.path(),
            "b.md",
            &format!("1\n2\n3\n4\n{}", directive("a.md", "reparse")),
        );
        let includer = includer(tmp.path(), &transport);

        let err = compose(&includer, &directive("a.md", "reparse")).unwrap_err();

        assert!(err.is_cycle());
        let IncludeErrorKind::Cycle(cycle) = err.root_cause() else {
            panic!("expected cycle, got {err}");
        };
        let chain: Vec<_> = cycle
            .chain
            .iter()
            .map(|site| {
                let name = site.address.as_ref().unwrap().as_str().rsplit('/').next().unwrap();
                (name.to_owned(), site.line)
            })
            .collect();
        assert_eq!(
            chain,
            vec![
                ("a.md".to_owned(), 2),
                ("b.md".to_owned(), 5),
                ("a.md".to_owned(), 2)
            ]
        );
    }

    #[test]
    fn test_self_include_is_cycle() {
        let (tmp, transport) = setup();
        write(tmp.path(), "a.md", &directive("a.md", "reparse"));
        let includer = includer(tmp.path(), &transport);

        let err = compose(&includer, &directive("a.md", "reparse")).unwrap_err();

        assert!(err.is_cycle());
    }

    #[test]
    fn test_sibling_repeats_are_not_cycles() {
        let (tmp, transport) = setup();
        write(tmp.path(), "c.md", "C");
        write(
            tmp.path(),
            "b.md",
            &format!("{}\n{}", directive("c.md", "reparse"), directive("c.md", "reparse")),
        );
        let includer = includer(tmp.path(), &transport);
        let document = format!(
            "{}\n{}\n{}",
            directive("b.md", "reparse"),
            directive("c.md", "opaque"),
            directive("b.md", "reparse")
        );

        let (out, forest) = compose(&includer, &document).unwrap();

        assert_eq!(out, vec!["C", "C", "C", "C", "C"]);
        assert_eq!(forest.len(), 7);
        assert_eq!(forest.addresses().len(), 2);
    }

    #[test]
    fn test_missing_local_source() {
        let (tmp, transport) = setup();
        let includer = includer(tmp.path(), &transport);

        let err = compose(&includer, &directive("missing.md", "opaque")).unwrap_err();

        let IncludeErrorKind::SourceUnavailable { address, cause } = &err.kind else {
            panic!("expected unavailable source, got {err}");
        };
        assert!(address.as_str().ends_with("/missing.md"));
        assert!(matches!(**cause, ContentError::LocalRead { .. }));
    }

    #[test]
    fn test_nested_failure_keeps_trail() {
        let (tmp, transport) = setup();
        write(tmp.path(), "a.md", &format!("x\n{}", directive("b.md", "reparse")));
        write(tmp.path(), "b.md", &directive("gone.md", "opaque"));
        let includer = includer(tmp.path(), &transport);

        let err = compose(&includer, &directive("a.md", "reparse")).unwrap_err();

        let targets: Vec<_> = err.trail().into_iter().map(|e| e.target.as_str()).collect();
        assert_eq!(targets, vec!["a.md", "b.md", "gone.md"]);
        assert!(matches!(
            err.root_cause(),
            IncludeErrorKind::SourceUnavailable { .. }
        ));
    }

    #[test]
    fn test_failed_nested_directive_not_recorded() {
        let (tmp, transport) = setup();
        write(tmp.path(), "a.md", &directive("gone.md", "opaque"));
        let includer = includer(tmp.path(), &transport);
        let mut pass = CompositionPass::new();
        let lines = vec![directive("a.md", "reparse")];

        assert!(includer
            .compose(None, &lines, &mut pass, &mut Flatten::default())
            .is_err());
        assert!(pass.forest().is_empty());
    }

    #[test]
    fn test_malformed_directive() {
        let (tmp, transport) = setup();
        let includer = includer(tmp.path(), &transport);

        let err = compose(&includer, "text\n::include {not json}").unwrap_err();

        assert!(matches!(err.kind, IncludeErrorKind::Directive(_)));
        assert_eq!(err.site.line, 2);
    }

    #[test]
    fn test_clipping_failure() {
        let (tmp, transport) = setup();
        write(tmp.path(), "a.md", "one\ntwo");
        let includer = includer(tmp.path(), &transport);
        let document = directive("a.md", "opaque");
        let directive = Directive::from_json(document.strip_prefix(DIRECTIVE_PREFIX).unwrap())
            .unwrap()
            .with_clipping(Clipping::lines(1, 5));

        let err = includer
            .process(
                &directive,
                Site::new(None, 1),
                &mut CompositionPass::new(),
                &mut Flatten::default(),
            )
            .unwrap_err();

        assert!(matches!(err.kind, IncludeErrorKind::Clipping(_)));
    }

    #[test]
    fn test_unsupported_scheme() {
        let (tmp, transport) = setup();
        let includer = includer(tmp.path(), &transport);

        let err = compose(&includer, &directive("ftp://example.com/a.md", "opaque")).unwrap_err();

        assert!(matches!(err.kind, IncludeErrorKind::Locate(_)));
    }

    #[test]
    fn test_missing_cache_directory() {
        let (tmp, transport) = setup();
        let includer = includer(tmp.path(), &transport);
        let missing = tmp.path().join("no-such-dir");
        let document = format!(
            r#"::include {{"source": "https://example.com/a.md", "type": "opaque", "cacheDirectory": "{}"}}"#,
            missing.display()
        );

        let err = compose(&includer, &document).unwrap_err();

        assert!(matches!(
            err.kind,
            IncludeErrorKind::InvalidCacheDirectory(ref dir) if *dir == missing
        ));
        assert_eq!(transport.calls(), 0);
    }

    #[test]
    fn test_remote_source_with_disk_tier() {
        let url = "https://example.com/docs/a.md";
        let tmp = TempDir::new().unwrap();
        let disk = DiskCache::open(tmp.path().join("cache")).unwrap();
        let transport = Arc::new(MockTransport::new().with_body(url, "remote\n"));
        let includer = includer(tmp.path(), &transport).with_disk_cache(disk.clone());

        let (out, _) = compose(&includer, &directive(url, "opaque")).unwrap();

        assert_eq!(out, vec!["remote"]);
        assert!(disk.path_for(url).is_file());
    }

    #[test]
    fn test_cache_false_skips_disk_tier() {
        let url = "https://example.com/docs/a.md";
        let tmp = TempDir::new().unwrap();
        let disk = DiskCache::open(tmp.path().join("cache")).unwrap();
        let transport = Arc::new(MockTransport::new().with_body(url, "remote"));
        let includer = includer(tmp.path(), &transport).with_disk_cache(disk.clone());

        let document = format!(r#"::include {{"source": "{url}", "type": "opaque", "cache": false}}"#);
        compose(&includer, &document).unwrap();

        assert!(!disk.path_for(url).exists());
    }

    #[test]
    fn test_first_requester_chooses_disk_tier() {
        let url = "https://example.com/docs/a.md";
        let tmp = TempDir::new().unwrap();
        let first = DiskCache::open(tmp.path().join("first")).unwrap();
        let second = DiskCache::open(tmp.path().join("second")).unwrap();
        let transport = Arc::new(MockTransport::new().with_body(url, "remote"));
        let includer = includer(tmp.path(), &transport);
        let mut pass = CompositionPass::new();

        for disk in [&first, &second] {
            let directive = Directive::new(url, IncludeMode::Opaque)
                .with_cache_directory(disk.dir().to_path_buf());
            let content = includer
                .process(&directive, Site::new(None, 1), &mut pass, &mut Flatten::default())
                .unwrap();
            assert_eq!(content.to_text(), "remote");
        }

        assert!(first.path_for(url).is_file());
        assert!(!second.path_for(url).exists());
        assert_eq!(transport.calls(), 1);
    }

    #[test]
    fn test_remote_relative_to_remote_parent() {
        let transport = Arc::new(
            MockTransport::new()
                .with_body(
                    "https://example.com/docs/index.md",
                    directive("parts/intro.md", "reparse"),
                )
                .with_body("https://example.com/docs/parts/intro.md", "intro"),
        );
        let tmp = TempDir::new().unwrap();
        let includer = includer(tmp.path(), &transport);

        let (out, forest) =
            compose(&includer, &directive("https://example.com/docs/index.md", "reparse")).unwrap();

        assert_eq!(out, vec!["intro"]);
        assert_eq!(forest.len(), 2);
    }

    #[test]
    fn test_remote_not_found() {
        let url = "https://example.com/missing.md";
        let (tmp, transport) = setup();
        let includer = includer(tmp.path(), &transport);

        let err = compose(&includer, &directive(url, "opaque")).unwrap_err();

        let IncludeErrorKind::SourceUnavailable { cause, .. } = &err.kind else {
            panic!("expected unavailable source, got {err}");
        };
        assert!(matches!(**cause, ContentError::Fetch(FetchError::NotFound { .. })));
        assert_eq!(transport.calls(), 1);
    }

    #[test]
    fn test_parallel_passes_share_single_fetch() {
        let url = "https://example.com/shared.md";
        let transport = Arc::new(
            MockTransport::new()
                .with_body(url, "shared")
                .with_delay(Duration::from_millis(50)),
        );
        let tmp = TempDir::new().unwrap();
        let includer = includer(tmp.path(), &transport);
        let document = directive(url, "reparse");

        thread::scope(|s| {
            for _ in 0..6 {
                s.spawn(|| {
                    let (out, _) = compose(&includer, &document).unwrap();
                    assert_eq!(out, vec!["shared"]);
                });
            }
        });

        assert_eq!(transport.calls_for(url), 1);
    }

    #[test]
    fn test_cancelled_pass() {
        let (tmp, transport) = setup();
        write(tmp.path(), "a.md", "a");
        let includer = includer(tmp.path(), &transport);
        let cancel = CancellationToken::new();
        let mut pass = CompositionPass::new().with_cancellation(cancel.clone());
        cancel.cancel();

        let err = includer
            .compose(
                None,
                &[directive("a.md", "opaque")],
                &mut pass,
                &mut Flatten::default(),
            )
            .unwrap_err();

        assert!(matches!(err.kind, IncludeErrorKind::Cancelled));
    }

    #[test]
    fn test_transient_failures_recovered() {
        let url = "https://example.com/flaky.md";
        let transport = Arc::new(MockTransport::new().with_sequence(
            url,
            vec![
                crate::mock::MockResponse::Fail(AttemptError::Status(503)),
                crate::mock::MockResponse::Fail(AttemptError::Timeout),
                crate::mock::MockResponse::Body(b"ok".to_vec()),
            ],
        ));
        let tmp = TempDir::new().unwrap();
        let includer = includer(tmp.path(), &transport);

        let (out, _) = compose(&includer, &directive(url, "opaque")).unwrap();

        assert_eq!(out, vec!["ok"]);
        assert_eq!(transport.calls(), 3);
    }
}
