//! On-disk tier of the splice content cache.
//!
//! Remote inclusion sources are persisted as one file per canonical address,
//! so later process runs can skip the network entirely. The crate exposes:
//!
//! - [`cache_key`]: Fixed-length hex identifier derived from an address
//! - [`DiskCache`]: Directory of raw fetched bytes keyed by [`cache_key`]
//! - [`CacheWriter`]: Streaming writer that publishes an entry atomically
//!
//! Entries hold the bytes exactly as fetched. Consumers must apply the same
//! line normalization they would apply to a fresh fetch.
//!
//! # Example
//!
//! ```
//! use std::io::Write;
//! use splice_cache::DiskCache;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let cache = DiskCache::open(dir.path().to_path_buf()).unwrap();
//!
//! let mut writer = cache.writer("https://example.com/a.md").unwrap();
//! writer.write_all(b"hello\n").unwrap();
//! writer.commit().unwrap();
//!
//! let bytes = cache.read("https://example.com/a.md").unwrap();
//! assert_eq!(bytes, Some(b"hello\n".to_vec()));
//! ```

mod disk;
mod key;

pub use disk::{CacheWriter, DiskCache};
pub use key::cache_key;
