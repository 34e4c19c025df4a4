//! File-based cache tier.
//!
//! [`DiskCache`] stores one file per cached address inside a single directory:
//!
//! ```text
//! {dir}/
//! +-- 3f1c...e9     # raw bytes fetched from https://example.com/a.md
//! +-- 9b07...12     # raw bytes fetched from https://example.com/b.md
//! ```
//!
//! Writes go to a temporary file in the same directory and are renamed into
//! place on [`CacheWriter::commit`], so a concurrent reader (in this or another
//! process) sees either nothing or a complete entry. Reads retry a few times
//! on I/O errors other than "not found" to ride out the window where another
//! process holds the file.

use std::fs;
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use tempfile::NamedTempFile;

use crate::key::cache_key;

/// Total attempts when opening a cache file for reading.
const READ_ATTEMPTS: u32 = 3;

/// Pause between read attempts.
const READ_RETRY_DELAY: Duration = Duration::from_millis(50);

/// Directory of cached remote sources.
#[derive(Debug, Clone)]
pub struct DiskCache {
    dir: PathBuf,
}

impl DiskCache {
    /// Open a cache rooted at `dir`, creating the directory if needed.
    pub fn open(dir: PathBuf) -> io::Result<Self> {
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Open a cache at a directory that must already exist.
    ///
    /// Used for user-specified directories, which are never created
    /// implicitly.
    pub fn existing(dir: PathBuf) -> io::Result<Self> {
        if dir.is_dir() {
            Ok(Self { dir })
        } else {
            Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("cache directory does not exist: {}", dir.display()),
            ))
        }
    }

    /// Cache root directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Location of the entry for `address`.
    #[must_use]
    pub fn path_for(&self, address: &str) -> PathBuf {
        self.dir.join(cache_key(address))
    }

    /// Read the cached bytes for `address`.
    ///
    /// Returns `Ok(None)` on a miss. Any other I/O failure is retried up to
    /// [`READ_ATTEMPTS`] times before it is surfaced.
    pub fn read(&self, address: &str) -> io::Result<Option<Vec<u8>>> {
        let path = self.path_for(address);
        let mut attempt = 1;

        loop {
            match fs::read(&path) {
                Ok(bytes) => {
                    tracing::debug!(address, path = %path.display(), "disk cache hit");
                    return Ok(Some(bytes));
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    tracing::debug!(address, "disk cache miss");
                    return Ok(None);
                }
                Err(e) if attempt < READ_ATTEMPTS => {
                    tracing::debug!(
                        address,
                        attempt,
                        error = %e,
                        "disk cache entry busy, retrying"
                    );
                    thread::sleep(READ_RETRY_DELAY);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Start writing a new entry for `address`.
    ///
    /// Nothing becomes visible to readers until [`CacheWriter::commit`].
    pub fn writer(&self, address: &str) -> io::Result<CacheWriter> {
        let file = tempfile::Builder::new()
            .prefix(".partial-")
            .tempfile_in(&self.dir)?;
        Ok(CacheWriter {
            file,
            target: self.path_for(address),
        })
    }
}

/// Streaming writer for a single cache entry.
///
/// Dropping the writer without committing discards the partial file.
#[derive(Debug)]
pub struct CacheWriter {
    file: NamedTempFile,
    target: PathBuf,
}

impl CacheWriter {
    /// Discard everything written so far.
    ///
    /// Used when a download attempt fails part-way and is retried.
    pub fn reset(&mut self) -> io::Result<()> {
        self.file.as_file().set_len(0)?;
        self.file.seek(SeekFrom::Start(0))?;
        Ok(())
    }

    /// Publish the entry and return its bytes.
    ///
    /// A failed rename (e.g. the target is held open by another process) is
    /// logged and the bytes are still returned: the entry is an optimization
    /// for later runs, not part of this one.
    pub fn commit(mut self) -> io::Result<Vec<u8>> {
        self.file.flush()?;
        let bytes = fs::read(self.file.path())?;

        if let Err(e) = self.file.persist(&self.target) {
            tracing::warn!(
                path = %self.target.display(),
                error = %e.error,
                "failed to publish disk cache entry"
            );
        }

        Ok(bytes)
    }
}

impl Write for CacheWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}
