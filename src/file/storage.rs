//! Blob storage for NetFS.
//!
//! Each blob is one file in a flat directory, named by its decimal identifier
//! with no extension:
//! ```text
//! {base_path}/
//! ├── 4821937
//! ├── 60017352
//! └── ...
//! ```
//! Identifiers are drawn at random and claimed with an exclusive create, so
//! two concurrent allocations can never end up owning the same blob.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use rand::Rng;
use tracing::debug;

use crate::{NetfsError, Result};

/// Upper bound (exclusive) of the blob identifier keyspace.
pub const BLOB_ID_SPACE: i64 = 100_000_000;

/// Consecutive identifier collisions tolerated before allocation gives up.
const MAX_ALLOCATION_ATTEMPTS: usize = 64;

/// Flat-directory store of opaque byte payloads.
#[derive(Debug, Clone)]
pub struct BlobStore {
    /// Directory holding the blob files.
    base_path: PathBuf,
}

impl BlobStore {
    /// Create a BlobStore rooted at `base_path`, creating the directory if needed.
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path)?;

        Ok(Self { base_path })
    }

    /// Get the base path of this store.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Write `content` under a fresh random identifier and return it.
    pub fn allocate(&self, content: &[u8]) -> Result<i64> {
        let mut rng = rand::rng();
        self.allocate_with(content, || rng.random_range(0..BLOB_ID_SPACE))
    }

    /// Allocation loop with an injectable identifier source.
    ///
    /// An occupied candidate is skipped and a new one drawn; any other
    /// failure to create or write the file is returned without retrying.
    pub(crate) fn allocate_with(
        &self,
        content: &[u8],
        mut next_id: impl FnMut() -> i64,
    ) -> Result<i64> {
        for _ in 0..MAX_ALLOCATION_ATTEMPTS {
            let blob_id = next_id();
            let path = self.blob_path(blob_id);

            let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => file,
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    debug!(blob_id, "Blob identifier taken, drawing another");
                    continue;
                }
                Err(e) => {
                    return Err(NetfsError::Storage(format!("cannot create blob: {e}")));
                }
            };

            if let Err(e) = file.write_all(content) {
                drop(file);
                let _ = fs::remove_file(&path);
                return Err(NetfsError::Storage(format!("cannot write blob: {e}")));
            }

            return Ok(blob_id);
        }

        Err(NetfsError::Storage(format!(
            "no free blob identifier after {MAX_ALLOCATION_ATTEMPTS} attempts"
        )))
    }

    /// Replace the content of an existing blob, truncating what was there.
    pub fn overwrite(&self, blob_id: i64, content: &[u8]) -> Result<()> {
        let path = self.blob_path(blob_id);

        let mut file = OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&path)
            .map_err(|e| NetfsError::Storage(format!("cannot open blob {blob_id}: {e}")))?;

        file.write_all(content)
            .map_err(|e| NetfsError::Storage(format!("cannot write blob {blob_id}: {e}")))
    }

    /// Read the full content of a blob.
    pub fn read(&self, blob_id: i64) -> Result<Vec<u8>> {
        match fs::read(self.blob_path(blob_id)) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(NetfsError::NotFound(format!("blob {blob_id}")))
            }
            Err(e) => Err(NetfsError::Storage(format!("cannot read blob {blob_id}: {e}"))),
        }
    }

    /// Delete a blob. A blob that is already gone is not an error.
    ///
    /// Returns `true` if a file was removed.
    pub fn remove(&self, blob_id: i64) -> Result<bool> {
        match fs::remove_file(self.blob_path(blob_id)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(NetfsError::Storage(format!(
                "cannot remove blob {blob_id}: {e}"
            ))),
        }
    }

    /// Check whether a blob exists.
    pub fn exists(&self, blob_id: i64) -> bool {
        self.blob_path(blob_id).is_file()
    }

    /// Size of a blob in bytes.
    pub fn size(&self, blob_id: i64) -> Result<u64> {
        match fs::metadata(self.blob_path(blob_id)) {
            Ok(m) => Ok(m.len()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(NetfsError::NotFound(format!("blob {blob_id}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Full path of a blob file.
    pub fn blob_path(&self, blob_id: i64) -> PathBuf {
        self.base_path.join(blob_id.to_string())
    }
}
