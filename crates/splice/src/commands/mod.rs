//! CLI command implementations.

pub(crate) mod expand;
pub(crate) mod include;

pub(crate) use expand::ExpandArgs;
pub(crate) use include::IncludeArgs;

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::Args;
use splice_cache::DiskCache;
use splice_config::{CliSettings, Config};
use splice_core::{InclusionForest, InclusionNode, Includer, RemoteFetcher, RetryPolicy, SourceLocator};

use crate::error::CliError;

/// Options shared by every command.
#[derive(Args)]
pub(crate) struct CommonArgs {
    /// Path to configuration file (default: auto-discover splice.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Base address for relative sources (overrides config).
    #[arg(long, env = "SPLICE_BASE_URI")]
    base_uri: Option<String>,

    /// Disk cache directory for remote sources (overrides config).
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Disable the disk cache.
    #[arg(long)]
    no_cache: bool,

    /// Print the inclusion tree to stderr.
    #[arg(long)]
    pub tree: bool,

    /// Print every included address to stderr.
    #[arg(long)]
    pub deps: bool,

    /// Enable verbose output (fetch and cache logs).
    #[arg(short, long)]
    pub verbose: bool,
}

impl CommonArgs {
    /// Load configuration with command-line overrides applied.
    pub(crate) fn load_config(&self) -> Result<Config, CliError> {
        let cli_settings = CliSettings {
            base_uri: self.base_uri.as_deref().map(absolute_base).transpose()?,
            cache_dir: self.cache_dir.clone(),
            cache_enabled: self.no_cache.then_some(false),
        };
        Ok(Config::load(self.config.as_deref(), Some(&cli_settings))?)
    }
}

/// Make a local base path absolute; URIs pass through unchanged.
fn absolute_base(base: &str) -> Result<String, CliError> {
    if base.contains("://") {
        return Ok(base.to_owned());
    }
    Ok(std::path::absolute(Path::new(base))?.display().to_string())
}

/// Build the includer described by `config`.
pub(crate) fn build_includer(config: &Config) -> Result<Includer, CliError> {
    let include = &config.include_resolved;
    let locator = SourceLocator::from_base(&absolute_base(&include.base_uri)?)?;
    let fetcher = RemoteFetcher::http(
        config.fetch.timeout(),
        RetryPolicy {
            max_attempts: config.fetch.max_attempts,
            delay: config.fetch.retry_delay(),
        },
    );

    let mut includer = Includer::new(locator, fetcher).with_disk_enabled(include.cache_enabled);
    if include.cache_enabled {
        let dir = std::path::absolute(&include.cache_dir)?;
        tracing::info!(dir = %dir.display(), "using disk cache");
        includer = includer.with_disk_cache(DiskCache::open(dir)?);
    }
    Ok(includer)
}

/// Write the forest as an indented tree.
pub(crate) fn write_tree(out: &mut impl Write, forest: &InclusionForest) -> io::Result<()> {
    fn write_node(out: &mut impl Write, node: &InclusionNode, depth: usize) -> io::Result<()> {
        writeln!(
            out,
            "{:indent$}{} ({:?}, line {})",
            "",
            node.address,
            node.mode,
            node.site.line,
            indent = depth * 2
        )?;
        for child in &node.children {
            write_node(out, child, depth + 1)?;
        }
        Ok(())
    }

    for root in forest.roots() {
        write_node(out, root, 0)?;
    }
    Ok(())
}

/// Write every included address, one per line.
pub(crate) fn write_deps(out: &mut impl Write, forest: &InclusionForest) -> io::Result<()> {
    for address in forest.addresses() {
        writeln!(out, "{address}")?;
    }
    Ok(())
}

/// Write the inclusion reports requested by `args` to stderr.
pub(crate) fn report(args: &CommonArgs, forest: &InclusionForest) -> io::Result<()> {
    let mut err = io::stderr().lock();
    if args.tree {
        write_tree(&mut err, forest)?;
    }
    if args.deps {
        write_deps(&mut err, forest)?;
    }
    Ok(())
}
