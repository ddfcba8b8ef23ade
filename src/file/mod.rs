//! File tree module for NetFS.
//!
//! This module provides the hierarchical store:
//! - Node metadata records and their repository
//! - Blob storage for file content
//! - Tree mutation algorithms (ingest, copy, move, rename, delete)
//! - Caller-facing operations with validation and overwrite handling

mod node;
mod service;
mod storage;
mod tree;

pub use node::{NewNode, Node, NodeRepository, NodeUpdate};
pub use service::{Download, FileService, NodeEntry, NodeListing};
pub use storage::{BlobStore, BLOB_ID_SPACE};
pub use tree::TreeEngine;

use crate::{NetfsError, Result};

/// Maximum length for a node name (in characters).
pub const MAX_NAME_LENGTH: usize = 255;

/// Separator used when materializing node paths.
pub const PATH_SEPARATOR: &str = "/";

/// Validate a node name and return it trimmed.
///
/// Names must be non-blank, at most [`MAX_NAME_LENGTH`] characters and free
/// of path separators and NUL.
pub fn validate_name(name: &str) -> Result<&str> {
    let name = name.trim();

    if name.is_empty() {
        return Err(NetfsError::BadRequest("name is required".to_string()));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(NetfsError::BadRequest(format!(
            "name must be at most {MAX_NAME_LENGTH} characters"
        )));
    }
    if name.contains(PATH_SEPARATOR) || name.contains('\0') {
        return Err(NetfsError::BadRequest(
            "name must not contain '/' or NUL".to_string(),
        ));
    }
    if name == "." || name == ".." {
        return Err(NetfsError::BadRequest(format!("'{name}' is reserved")));
    }

    Ok(name)
}
