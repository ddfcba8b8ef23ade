//! Response DTOs for the NetFS API.

use serde::Serialize;

use crate::datetime::to_rfc3339;
use crate::file::{Node, NodeEntry, NodeListing};

/// Generic API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a new API response.
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Node in responses.
#[derive(Debug, Serialize)]
pub struct NodeResponse {
    /// Node ID.
    pub id: i64,
    /// Node name.
    pub name: String,
    /// Whether the node is a directory.
    pub is_dir: bool,
    /// Parent directory ID (absent for the root).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
    /// Last modification timestamp.
    pub updated_at: String,
    /// Content size in bytes (files only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl NodeResponse {
    fn from_node(node: Node, size: Option<u64>) -> Self {
        Self {
            id: node.id,
            name: node.name,
            is_dir: node.is_dir,
            parent_id: node.parent_id,
            updated_at: to_rfc3339(&node.updated_at),
            size,
        }
    }
}

impl From<NodeEntry> for NodeResponse {
    fn from(entry: NodeEntry) -> Self {
        Self::from_node(entry.node, entry.size)
    }
}

/// Node listing with path and children.
#[derive(Debug, Serialize)]
pub struct NodeListingResponse {
    /// The node itself.
    #[serde(flatten)]
    pub node: NodeResponse,
    /// Absolute path from the root.
    pub path: String,
    /// Immediate children.
    pub children: Vec<NodeResponse>,
}

impl From<NodeListing> for NodeListingResponse {
    fn from(listing: NodeListing) -> Self {
        Self {
            node: NodeResponse::from_node(listing.node, listing.size),
            path: listing.path,
            children: listing.children.into_iter().map(Into::into).collect(),
        }
    }
}

/// Response for upload and copy.
#[derive(Debug, Serialize)]
pub struct NodeCreatedResponse {
    /// ID of the created or merged node.
    pub node_id: i64,
}

/// Acknowledgment for move, rename and delete.
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    /// Always true.
    pub success: bool,
}

impl SuccessResponse {
    /// Create a successful acknowledgment.
    pub fn ok() -> Self {
        Self { success: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: i64, name: &str, is_dir: bool, parent_id: Option<i64>) -> Node {
        Node {
            id,
            name: name.to_string(),
            is_dir,
            parent_id,
            blob_id: if is_dir { None } else { Some(9) },
            updated_at: "2024-01-15 10:30:00".to_string(),
        }
    }

    #[test]
    fn test_listing_response_shape() {
        let listing = NodeListing {
            node: node(1, "/", true, None),
            path: "/".to_string(),
            size: None,
            children: vec![NodeEntry {
                node: node(2, "a.txt", false, Some(1)),
                size: Some(2),
            }],
        };

        let json = serde_json::to_value(NodeListingResponse::from(listing)).unwrap();

        assert_eq!(json["id"], 1);
        assert_eq!(json["name"], "/");
        assert_eq!(json["path"], "/");
        assert!(json.get("parent_id").is_none());
        assert!(json.get("size").is_none());
        assert_eq!(json["updated_at"], "2024-01-15T10:30:00Z");

        let child = &json["children"][0];
        assert_eq!(child["id"], 2);
        assert_eq!(child["parent_id"], 1);
        assert_eq!(child["size"], 2);
        assert_eq!(child["is_dir"], false);
        assert!(child.get("blob_id").is_none());
    }

    #[test]
    fn test_api_response_wrapper() {
        let json = serde_json::to_value(ApiResponse::new(SuccessResponse::ok())).unwrap();
        assert_eq!(json, serde_json::json!({"data": {"success": true}}));
    }
}
