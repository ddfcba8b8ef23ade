//! Request DTOs for the NetFS API.

use serde::Deserialize;

/// JSON upload request (alternative to multipart).
#[derive(Debug, Deserialize)]
pub struct JsonUploadRequest {
    /// Node name.
    #[serde(default)]
    pub filename: String,
    /// Create a directory instead of a file.
    #[serde(default)]
    pub is_dir: bool,
    /// Parent directory ID (defaults to the root).
    #[serde(default)]
    pub parent_id: Option<i64>,
    /// Base64-encoded file content.
    #[serde(default)]
    pub data_base64: Option<String>,
}

/// Copy or move request.
#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    /// Node to copy or move.
    pub src_id: i64,
    /// Destination directory.
    pub dst_id: i64,
    /// Replace a same-named entry in the destination.
    #[serde(default)]
    pub overwrite: bool,
}

/// Rename request.
#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    /// Node to rename.
    pub src_id: i64,
    /// New name.
    pub new_name: String,
}

/// Delete request.
#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    /// Node to delete along with its subtree.
    pub src_id: i64,
}

/// Query parameters for file content.
#[derive(Debug, Default, Deserialize)]
pub struct DownloadQuery {
    /// `1` or `true` to display in the browser instead of downloading.
    #[serde(default)]
    pub inline: Option<String>,
}

impl DownloadQuery {
    /// Whether inline disposition was requested.
    pub fn is_inline(&self) -> bool {
        matches!(self.inline.as_deref(), Some("1") | Some("true"))
    }
}

/// Query parameters for the progress stream.
#[derive(Debug, Deserialize)]
pub struct ProgressQuery {
    /// Upload token to observe.
    #[serde(default)]
    pub upload_id: Option<String>,
}
