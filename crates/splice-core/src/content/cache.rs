//! Two-tier content cache with single-flight population.
//!
//! The memory tier maps each [`SourceAddress`] to a once-cell holding the
//! resolved content or the error that prevented it. The map lock is held
//! only to find or insert the cell; population runs inside the cell, so
//! concurrent requests for one address block on that address alone while
//! requests for other addresses proceed.
//!
//! Remote content additionally goes through the optional disk tier
//! ([`DiskCache`]), which persists raw bytes across runs. Local files are
//! always read directly.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use splice_cache::DiskCache;

use super::ResolvedContent;
use crate::address::{Scheme, SourceAddress};
use crate::fetch::{CancellationToken, FetchError, RemoteFetcher};

/// Why content for an address could not be produced.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("failed to read {}: {source}", path.display())]
    LocalRead { path: PathBuf, source: io::Error },

    #[error("{0} does not name a local file")]
    NotAFile(String),

    #[error("disk cache error for {address} in {}: {source}", dir.display())]
    DiskCache {
        address: String,
        dir: PathBuf,
        source: io::Error,
    },
}

impl ContentError {
    /// Whether population stopped because its pass was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Fetch(FetchError::Cancelled { .. }))
    }
}

type Slot = Arc<OnceLock<Result<ResolvedContent, Arc<ContentError>>>>;

/// Process-wide cache of resolved content keyed by address.
///
/// Entries live as long as the cache; failures are cached too, so every
/// requester of a failed address sees the same error. A cancelled
/// population is the exception: its cell is dropped, and waiters whose own
/// token is still live populate the address again.
#[derive(Debug)]
pub struct ContentCache {
    fetcher: RemoteFetcher,
    slots: Mutex<HashMap<SourceAddress, Slot>>,
}

impl ContentCache {
    #[must_use]
    pub fn new(fetcher: RemoteFetcher) -> Self {
        Self {
            fetcher,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Content for `address`, populating it on first request.
    ///
    /// `disk` enables the disk tier for remote addresses. At most one
    /// population runs per address; concurrent callers wait for it and share
    /// its result. The disk tier of the first requester is the one used;
    /// later requesters are served from memory whatever tier they name.
    pub fn get(
        &self,
        address: &SourceAddress,
        disk: Option<&DiskCache>,
        cancel: &CancellationToken,
    ) -> Result<ResolvedContent, Arc<ContentError>> {
        loop {
            let slot = {
                let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
                Arc::clone(slots.entry(address.clone()).or_default())
            };

            let result = slot
                .get_or_init(|| {
                    self.populate(address, disk, cancel).map_err(|e| {
                        tracing::warn!(address = %address, error = %e, "failed to resolve source");
                        Arc::new(e)
                    })
                })
                .clone();

            match result {
                Err(e) if e.is_cancelled() => {
                    self.evict(address, &slot);
                    if cancel.is_cancelled() {
                        return Err(e);
                    }
                    tracing::debug!(address = %address, "population was cancelled, retrying");
                }
                result => return result,
            }
        }
    }

    /// Drop `slot` unless another requester already replaced it.
    fn evict(&self, address: &SourceAddress, slot: &Slot) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if slots.get(address).is_some_and(|current| Arc::ptr_eq(current, slot)) {
            slots.remove(address);
        }
    }

    /// Number of addresses with a cached outcome.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|slot| slot.get().is_some())
            .count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn populate(
        &self,
        address: &SourceAddress,
        disk: Option<&DiskCache>,
        cancel: &CancellationToken,
    ) -> Result<ResolvedContent, ContentError> {
        match address.scheme() {
            Scheme::File => {
                let path = address
                    .to_file_path()
                    .ok_or_else(|| ContentError::NotAFile(address.to_string()))?;
                let bytes = fs::read(&path).map_err(|source| ContentError::LocalRead {
                    path: path.clone(),
                    source,
                })?;
                tracing::debug!(path = %path.display(), bytes = bytes.len(), "read local source");
                Ok(ResolvedContent::from_bytes(&bytes))
            }
            Scheme::Http | Scheme::Https => match disk {
                Some(disk) => self.fetch_through_disk(address, disk, cancel),
                None => {
                    let mut body = Vec::new();
                    self.fetcher.fetch(address.url(), &mut body, cancel)?;
                    Ok(ResolvedContent::from_bytes(&body))
                }
            },
        }
    }

    fn fetch_through_disk(
        &self,
        address: &SourceAddress,
        disk: &DiskCache,
        cancel: &CancellationToken,
    ) -> Result<ResolvedContent, ContentError> {
        let disk_error = |source| ContentError::DiskCache {
            address: address.to_string(),
            dir: disk.dir().to_path_buf(),
            source,
        };

        if let Some(bytes) = disk.read(address.as_str()).map_err(disk_error)? {
            return Ok(ResolvedContent::from_bytes(&bytes));
        }

        let mut writer = disk.writer(address.as_str()).map_err(disk_error)?;
        self.fetcher.fetch(address.url(), &mut writer, cancel)?;
        let bytes = writer.commit().map_err(disk_error)?;
        tracing::debug!(address = %address, dir = %disk.dir().display(), "stored remote source on disk");
        Ok(ResolvedContent::from_bytes(&bytes))
    }
}
