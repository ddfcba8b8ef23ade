//! Tree mutation engine for NetFS.
//!
//! The repository only offers single-record operations, so every composite
//! operation here (copy, recursive delete, directory-over-file replacement)
//! is a sequence of independent steps. A failure part way through can leave
//! a partially copied subtree or an orphaned blob; copy and recursive delete
//! log failed descendants and carry on with the rest of the subtree.

use std::collections::HashSet;

use futures::future::{BoxFuture, FutureExt};
use tracing::{debug, warn};

use super::node::{NewNode, Node, NodeRepository, NodeUpdate};
use super::storage::BlobStore;
use super::PATH_SEPARATOR;
use crate::db::Database;
use crate::{NetfsError, Result};

/// Conflict message returned when a file is ingested over a directory.
pub const FOLDER_EXISTS: &str = "folder_exists";

/// Mutation algorithms over the node repository and blob store.
pub struct TreeEngine<'a> {
    db: &'a Database,
    blobs: &'a BlobStore,
}

impl<'a> TreeEngine<'a> {
    /// Create a new TreeEngine.
    pub fn new(db: &'a Database, blobs: &'a BlobStore) -> Self {
        Self { db, blobs }
    }

    fn nodes(&self) -> NodeRepository<'a> {
        NodeRepository::new(self.db.pool())
    }

    /// Get a node by ID.
    pub async fn get(&self, id: i64) -> Result<Option<Node>> {
        self.nodes().get_by_id(id).await
    }

    /// Get the root directory.
    pub async fn root(&self) -> Result<Node> {
        self.nodes()
            .get_root()
            .await?
            .ok_or_else(|| NetfsError::NotFound("root node".to_string()))
    }

    /// Create or merge `name` under `parent_id`.
    ///
    /// Against an existing sibling of the same name:
    /// - directory over directory returns the existing ID unchanged
    /// - file over directory fails with `Conflict("folder_exists")`
    /// - directory over file deletes the file and creates a fresh directory
    /// - file over file overwrites the blob in place and keeps the node ID
    pub async fn ingest(
        &self,
        name: &str,
        content: &[u8],
        is_dir: bool,
        parent_id: i64,
    ) -> Result<i64> {
        let nodes = self.nodes();

        let Some(existing) = nodes.child_by_name(parent_id, name).await? else {
            let node = if is_dir {
                nodes.create(&NewNode::directory(name, parent_id)).await?
            } else {
                self.create_file(name, content, parent_id).await?
            };
            debug!(node_id = node.id, parent_id, is_dir, "Created node");
            return Ok(node.id);
        };

        match (existing.is_dir, is_dir) {
            (true, true) => Ok(existing.id),
            (true, false) => Err(NetfsError::Conflict(FOLDER_EXISTS.to_string())),
            (false, true) => {
                self.delete_recursive(existing.id).await?;
                let node = nodes.create(&NewNode::directory(name, parent_id)).await?;
                debug!(
                    replaced = existing.id,
                    node_id = node.id,
                    "Replaced file with directory"
                );
                Ok(node.id)
            }
            (false, false) => {
                let blob_id = file_blob(&existing)?;
                self.blobs.overwrite(blob_id, content)?;
                nodes.touch(existing.id).await?;
                debug!(node_id = existing.id, blob_id, "Overwrote file content");
                Ok(existing.id)
            }
        }
    }

    /// Allocate a blob for `content` and create a file node referencing it.
    ///
    /// The blob is removed again if the node record cannot be written.
    async fn create_file(&self, name: &str, content: &[u8], parent_id: i64) -> Result<Node> {
        let blob_id = self.blobs.allocate(content)?;

        match self
            .nodes()
            .create(&NewNode::file(name, parent_id, blob_id))
            .await
        {
            Ok(node) => Ok(node),
            Err(e) => {
                let _ = self.blobs.remove(blob_id);
                Err(e)
            }
        }
    }

    /// Deep-copy `source` under `dest_parent` and return the new node's ID.
    ///
    /// File content is duplicated into new blobs. A descendant that fails to
    /// copy is logged and skipped; only failure to create the top-level copy
    /// is returned as an error.
    pub fn copy<'b>(&'b self, source: &'b Node, dest_parent: i64) -> BoxFuture<'b, Result<i64>> {
        async move {
            if !source.is_dir {
                let content = self.blobs.read(file_blob(source)?)?;
                let node = self.create_file(&source.name, &content, dest_parent).await?;
                return Ok(node.id);
            }

            let nodes = self.nodes();
            // Listed before the copy exists, so copying into the source itself
            // cannot pick up its own output.
            let children = nodes.children(source.id).await?;
            let copy = nodes
                .create(&NewNode::directory(&source.name, dest_parent))
                .await?;

            for child in &children {
                if let Err(e) = self.copy(child, copy.id).await {
                    warn!(
                        source_id = child.id,
                        dest_parent = copy.id,
                        error = %e,
                        "Failed to copy descendant, continuing"
                    );
                }
            }

            Ok(copy.id)
        }
        .boxed()
    }

    /// Re-parent `node` under `dest_parent`. Metadata only; no blob is touched.
    ///
    /// Cycle and conflict checks are the caller's job.
    pub async fn move_node(&self, node: &Node, dest_parent: i64) -> Result<()> {
        self.nodes()
            .update(node.id, &NodeUpdate::new().parent_id(dest_parent))
            .await?
            .ok_or_else(|| NetfsError::NotFound(format!("node {}", node.id)))?;
        debug!(node_id = node.id, dest_parent, "Moved node");
        Ok(())
    }

    /// Rename `node` in place. Sibling name collisions are not checked.
    pub async fn rename(&self, node: &Node, new_name: &str) -> Result<()> {
        self.nodes()
            .update(node.id, &NodeUpdate::new().name(new_name))
            .await?
            .ok_or_else(|| NetfsError::NotFound(format!("node {}", node.id)))?;
        debug!(node_id = node.id, new_name, "Renamed node");
        Ok(())
    }

    /// Delete a node, its whole subtree and every blob they own.
    ///
    /// Children go first. A child that fails to delete is logged and the rest
    /// of the subtree is still processed.
    pub fn delete_recursive(&self, id: i64) -> BoxFuture<'_, Result<()>> {
        async move {
            let nodes = self.nodes();
            let node = nodes
                .get_by_id(id)
                .await?
                .ok_or_else(|| NetfsError::NotFound(format!("node {id}")))?;

            for child in nodes.children(id).await? {
                if let Err(e) = self.delete_recursive(child.id).await {
                    warn!(node_id = child.id, error = %e, "Failed to delete descendant, continuing");
                }
            }

            if let Some(blob_id) = node.blob_id {
                if let Err(e) = self.blobs.remove(blob_id) {
                    warn!(node_id = id, blob_id, error = %e, "Failed to remove blob");
                }
            }

            nodes.delete(id).await?;
            debug!(node_id = id, "Deleted node");
            Ok(())
        }
        .boxed()
    }

    /// Delete a single leaf node and its blob.
    ///
    /// Fails with `NotFound` when no record was deleted and with `BadRequest`
    /// for a directory that still has children.
    pub async fn delete(&self, node: &Node) -> Result<()> {
        let nodes = self.nodes();

        if node.is_dir && !nodes.children(node.id).await?.is_empty() {
            return Err(NetfsError::BadRequest(format!(
                "directory {} is not empty",
                node.id
            )));
        }

        if !nodes.delete(node.id).await? {
            return Err(NetfsError::NotFound(format!("node {}", node.id)));
        }

        if let Some(blob_id) = node.blob_id {
            if let Err(e) = self.blobs.remove(blob_id) {
                warn!(node_id = node.id, blob_id, error = %e, "Failed to remove blob");
            }
        }

        Ok(())
    }

    /// Whether `ancestor_id` lies on the parent chain of `node_id`.
    ///
    /// A node is not its own ancestor. The walk stops at the root, at a
    /// missing parent, or if a node repeats.
    pub async fn is_ancestor(&self, ancestor_id: i64, node_id: i64) -> Result<bool> {
        let nodes = self.nodes();
        let mut seen = HashSet::new();
        let mut current = nodes.get_by_id(node_id).await?;

        while let Some(node) = current {
            let Some(parent_id) = node.parent_id else {
                break;
            };
            if parent_id == ancestor_id {
                return Ok(true);
            }
            if !seen.insert(parent_id) {
                warn!(node_id = parent_id, "Cycle detected in parent chain");
                break;
            }
            current = nodes.get_by_id(parent_id).await?;
        }

        Ok(false)
    }

    /// Materialize the path of `node` from the root, e.g. `/docs/a.txt`.
    ///
    /// The root resolves to `/`.
    pub async fn resolve_path(&self, node: &Node) -> Result<String> {
        let nodes = self.nodes();
        let mut segments = Vec::new();
        let mut seen = HashSet::new();
        let mut current = Some(node.clone());

        while let Some(n) = current {
            let Some(parent_id) = n.parent_id else {
                break;
            };
            if !seen.insert(n.id) {
                break;
            }
            segments.push(n.name);
            current = nodes.get_by_id(parent_id).await?;
        }

        segments.reverse();
        Ok(format!(
            "{PATH_SEPARATOR}{}",
            segments.join(PATH_SEPARATOR)
        ))
    }

    /// Byte length of a file's content; None for directories or a missing blob.
    pub fn size_of(&self, node: &Node) -> Option<u64> {
        node.blob_id.and_then(|blob_id| self.blobs.size(blob_id).ok())
    }

    /// Read a file's content.
    pub fn read_content(&self, node: &Node) -> Result<Vec<u8>> {
        match node.blob_id {
            Some(blob_id) => self.blobs.read(blob_id),
            None => Err(NetfsError::NotFound(format!(
                "content of directory {}",
                node.id
            ))),
        }
    }
}

/// Blob reference of a file node.
fn file_blob(node: &Node) -> Result<i64> {
    node.blob_id
        .ok_or_else(|| NetfsError::Storage(format!("file node {} has no blob", node.id)))
}
