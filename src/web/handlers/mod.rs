//! API handlers for NetFS.

pub mod node;
pub mod ops;
pub mod upload;

pub use node::*;
pub use ops::*;
pub use upload::*;

use std::sync::Arc;
use std::time::Duration;

use crate::file::{BlobStore, FileService};
use crate::progress::ProgressNotifier;
use crate::Database;

/// Default keepalive interval for progress streams.
pub const DEFAULT_PROGRESS_KEEPALIVE: Duration = Duration::from_secs(30);

/// Default request body limit (1 GiB).
pub const DEFAULT_MAX_UPLOAD_SIZE: u64 = 1024 * 1024 * 1024;

/// Application state shared across handlers.
pub struct AppState {
    /// Node metadata database.
    pub db: Arc<Database>,
    /// Blob storage.
    pub blobs: Arc<BlobStore>,
    /// Upload progress registry.
    pub progress: Arc<ProgressNotifier>,
    /// Idle time before a progress stream sends a keepalive.
    pub progress_keepalive: Duration,
    /// Maximum request body size in bytes.
    pub max_upload_size: u64,
}

impl AppState {
    /// Create a new application state.
    pub fn new(db: Arc<Database>, blobs: Arc<BlobStore>) -> Self {
        Self {
            db,
            blobs,
            progress: Arc::new(ProgressNotifier::default()),
            progress_keepalive: DEFAULT_PROGRESS_KEEPALIVE,
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
        }
    }

    /// Set the progress registry and keepalive interval.
    pub fn with_progress(mut self, progress: Arc<ProgressNotifier>, keepalive: Duration) -> Self {
        self.progress = progress;
        self.progress_keepalive = keepalive;
        self
    }

    /// Set the maximum request body size in bytes.
    pub fn with_max_upload_size(mut self, bytes: u64) -> Self {
        self.max_upload_size = bytes;
        self
    }

    /// File service over this state's database and blob store.
    pub fn files(&self) -> FileService<'_> {
        FileService::new(&self.db, &self.blobs)
    }
}
