//! File service for NetFS.
//!
//! This module provides the caller-facing operations including:
//! - Upload (create-or-merge) with name and parent validation
//! - Listings and downloads
//! - Copy, move, rename and delete with overwrite gating and cycle checks

use tracing::info;

use crate::db::Database;
use crate::{NetfsError, Result};

use super::node::{Node, NodeRepository};
use super::storage::BlobStore;
use super::tree::TreeEngine;
use super::validate_name;

/// A node together with its computed size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeEntry {
    /// Node metadata.
    pub node: Node,
    /// Content size in bytes; None for directories.
    pub size: Option<u64>,
}

/// A node with its path and immediate children.
#[derive(Debug, Clone)]
pub struct NodeListing {
    /// The listed node.
    pub node: Node,
    /// Absolute path from the root.
    pub path: String,
    /// Content size in bytes; None for directories.
    pub size: Option<u64>,
    /// Immediate children, directories first then by name.
    pub children: Vec<NodeEntry>,
}

/// Result of a file download.
#[derive(Debug)]
pub struct Download {
    /// File metadata.
    pub node: Node,
    /// File content.
    pub content: Vec<u8>,
}

/// File service for tree operations.
pub struct FileService<'a> {
    db: &'a Database,
    tree: TreeEngine<'a>,
}

impl<'a> FileService<'a> {
    /// Create a new FileService.
    pub fn new(db: &'a Database, blobs: &'a BlobStore) -> Self {
        Self {
            db,
            tree: TreeEngine::new(db, blobs),
        }
    }

    /// Create or merge a node and return its ID.
    ///
    /// # Validation
    /// - Name: trimmed, non-blank, at most 255 characters, no '/' or NUL
    /// - Parent: defaults to the root and must be an existing directory
    pub async fn upload(
        &self,
        name: &str,
        content: &[u8],
        is_dir: bool,
        parent_id: Option<i64>,
    ) -> Result<i64> {
        let name = validate_name(name)?;

        let parent = match parent_id {
            Some(id) => self.require(id).await?,
            None => self.tree.root().await?,
        };
        if !parent.is_dir {
            return Err(NetfsError::BadRequest(format!(
                "parent {} is not a directory",
                parent.id
            )));
        }

        let id = self.tree.ingest(name, content, is_dir, parent.id).await?;
        info!(node_id = id, parent_id = parent.id, is_dir, size = content.len(), "Upload stored");
        Ok(id)
    }

    /// List a node and its immediate children.
    ///
    /// `None` or a non-positive ID lists the root.
    pub async fn listing(&self, id: Option<i64>) -> Result<NodeListing> {
        let node = match id.filter(|id| *id > 0) {
            Some(id) => self.require(id).await?,
            None => self.tree.root().await?,
        };

        let path = self.tree.resolve_path(&node).await?;
        let size = self.tree.size_of(&node);

        let children = if node.is_dir {
            self.nodes()
                .children(node.id)
                .await?
                .into_iter()
                .map(|child| NodeEntry {
                    size: self.tree.size_of(&child),
                    node: child,
                })
                .collect()
        } else {
            Vec::new()
        };

        Ok(NodeListing {
            node,
            path,
            size,
            children,
        })
    }

    /// Fetch a file node and its content.
    pub async fn download(&self, id: i64) -> Result<Download> {
        let node = self.require(id).await?;
        let content = self.tree.read_content(&node)?;
        Ok(Download { node, content })
    }

    /// Deep-copy `src_id` into the directory `dst_id` and return the new ID.
    ///
    /// A same-named entry in the destination is a conflict unless
    /// `overwrite` is set, in which case it is deleted first.
    pub async fn copy(&self, src_id: i64, dst_id: i64, overwrite: bool) -> Result<i64> {
        let (source, dest) = self.transfer_endpoints(src_id, dst_id).await?;

        if let Some(existing) = self.nodes().child_by_name(dest.id, &source.name).await? {
            if existing.id == source.id {
                // Copying next to itself would need the source as overwrite target.
                return Err(if overwrite {
                    NetfsError::BadRequest("cannot overwrite the source with itself".to_string())
                } else {
                    NetfsError::Conflict(format!("'{}' already exists", source.name))
                });
            }
            self.clear_target(&existing, &source, overwrite).await?;
        }

        let id = self.tree.copy(&source, dest.id).await?;
        info!(src_id, dst_id, new_id = id, "Copied node");
        Ok(id)
    }

    /// Move `src_id` into the directory `dst_id`.
    ///
    /// Moving a node into its current parent does nothing.
    pub async fn move_node(&self, src_id: i64, dst_id: i64, overwrite: bool) -> Result<()> {
        let (source, dest) = self.transfer_endpoints(src_id, dst_id).await?;

        if source.parent_id == Some(dest.id) {
            return Ok(());
        }

        if let Some(existing) = self.nodes().child_by_name(dest.id, &source.name).await? {
            self.clear_target(&existing, &source, overwrite).await?;
        }

        self.tree.move_node(&source, dest.id).await?;
        info!(src_id, dst_id, "Moved node");
        Ok(())
    }

    /// Rename a node. The root cannot be renamed.
    pub async fn rename(&self, src_id: i64, new_name: &str) -> Result<()> {
        let new_name = validate_name(new_name)?;
        let node = self.require(src_id).await?;

        if node.is_root() {
            return Err(NetfsError::BadRequest("cannot rename the root".to_string()));
        }

        self.tree.rename(&node, new_name).await?;
        info!(src_id, new_name, "Renamed node");
        Ok(())
    }

    /// Delete a node and its whole subtree. The root cannot be deleted.
    pub async fn delete(&self, src_id: i64) -> Result<()> {
        let node = self.require(src_id).await?;

        if node.is_root() {
            return Err(NetfsError::BadRequest("cannot delete the root".to_string()));
        }

        self.tree.delete_recursive(node.id).await?;
        info!(src_id, "Deleted node");
        Ok(())
    }

    async fn require(&self, id: i64) -> Result<Node> {
        self.tree
            .get(id)
            .await?
            .ok_or_else(|| NetfsError::NotFound(format!("node {id}")))
    }

    fn nodes(&self) -> NodeRepository<'a> {
        NodeRepository::new(self.db.pool())
    }

    /// Load and check the source and destination of a copy or move.
    async fn transfer_endpoints(&self, src_id: i64, dst_id: i64) -> Result<(Node, Node)> {
        let source = self.require(src_id).await?;
        let dest = self.require(dst_id).await?;

        if source.is_root() {
            return Err(NetfsError::BadRequest("cannot transfer the root".to_string()));
        }
        if !dest.is_dir {
            return Err(NetfsError::BadRequest(format!(
                "destination {dst_id} is not a directory"
            )));
        }
        if dest.id == source.id || self.tree.is_ancestor(source.id, dest.id).await? {
            return Err(NetfsError::BadRequest(
                "destination is the source or inside it".to_string(),
            ));
        }

        Ok((source, dest))
    }

    /// Resolve a name clash in the destination.
    ///
    /// The clashing entry is never deleted when it holds `source`.
    async fn clear_target(&self, existing: &Node, source: &Node, overwrite: bool) -> Result<()> {
        if !overwrite {
            return Err(NetfsError::Conflict(format!(
                "'{}' already exists",
                existing.name
            )));
        }
        if existing.id == source.id || self.tree.is_ancestor(existing.id, source.id).await? {
            return Err(NetfsError::BadRequest(format!(
                "cannot overwrite '{}': it contains the source",
                existing.name
            )));
        }
        self.tree.delete_recursive(existing.id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn setup() -> (TempDir, Database, BlobStore) {
        let temp_dir = TempDir::new().unwrap();
        let blobs = BlobStore::new(temp_dir.path().join("blobs")).unwrap();
        let db = Database::open_in_memory().await.unwrap();
        (temp_dir, db, blobs)
    }

    #[tokio::test]
    async fn test_upload_scenario_round_trip() {
        let (_temp_dir, db, blobs) = setup().await;
        let service = FileService::new(&db, &blobs);

        let id = service.upload("a.txt", b"hi", false, None).await.unwrap();
        assert_eq!(id, 2);
        assert_eq!(service.download(2).await.unwrap().content, b"hi");

        let again = service.upload("a.txt", b"bye", false, None).await.unwrap();
        assert_eq!(again, 2);
        assert_eq!(service.download(2).await.unwrap().content, b"bye");
    }

    #[tokio::test]
    async fn test_upload_validation() {
        let (_temp_dir, db, blobs) = setup().await;
        let service = FileService::new(&db, &blobs);

        let blank = service.upload("  ", b"x", false, None).await;
        assert!(matches!(blank, Err(NetfsError::BadRequest(_))));

        let missing_parent = service.upload("a", b"x", false, Some(77)).await;
        assert!(matches!(missing_parent, Err(NetfsError::NotFound(_))));

        let file = service.upload("f", b"x", false, None).await.unwrap();
        let under_file = service.upload("a", b"x", false, Some(file)).await;
        assert!(matches!(under_file, Err(NetfsError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_upload_trims_name() {
        let (_temp_dir, db, blobs) = setup().await;
        let service = FileService::new(&db, &blobs);

        let id = service.upload(" docs ", b"", true, None).await.unwrap();

        let listing = service.listing(Some(id)).await.unwrap();
        assert_eq!(listing.node.name, "docs");
        assert_eq!(listing.path, "/docs");
    }

    #[tokio::test]
    async fn test_listing_root_and_fallback() {
        let (_temp_dir, db, blobs) = setup().await;
        let service = FileService::new(&db, &blobs);
        service.upload("b.txt", b"bbb", false, None).await.unwrap();
        service.upload("a.txt", b"a", false, None).await.unwrap();
        service.upload("zdir", b"", true, None).await.unwrap();

        let listing = service.listing(None).await.unwrap();
        assert!(listing.node.is_root());
        assert_eq!(listing.path, "/");
        assert_eq!(listing.size, None);

        let names: Vec<_> = listing.children.iter().map(|c| c.node.name.as_str()).collect();
        assert_eq!(names, vec!["zdir", "a.txt", "b.txt"]);
        assert_eq!(listing.children[0].size, None);
        assert_eq!(listing.children[2].size, Some(3));

        let fallback = service.listing(Some(0)).await.unwrap();
        assert!(fallback.node.is_root());
        let negative = service.listing(Some(-5)).await.unwrap();
        assert!(negative.node.is_root());
    }

    #[tokio::test]
    async fn test_listing_missing_and_file() {
        let (_temp_dir, db, blobs) = setup().await;
        let service = FileService::new(&db, &blobs);

        assert!(matches!(
            service.listing(Some(404)).await,
            Err(NetfsError::NotFound(_))
        ));

        let id = service.upload("a.txt", b"abc", false, None).await.unwrap();
        let listing = service.listing(Some(id)).await.unwrap();
        assert_eq!(listing.size, Some(3));
        assert!(listing.children.is_empty());
    }

    #[tokio::test]
    async fn test_download_directory_not_found() {
        let (_temp_dir, db, blobs) = setup().await;
        let service = FileService::new(&db, &blobs);

        assert!(matches!(
            service.download(1).await,
            Err(NetfsError::NotFound(_))
        ));
        assert!(matches!(
            service.download(99).await,
            Err(NetfsError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_move_into_own_descendant_rejected() {
        let (_temp_dir, db, blobs) = setup().await;
        let service = FileService::new(&db, &blobs);

        let docs = service.upload("docs", b"", true, None).await.unwrap();
        let d = service.upload("d", b"", true, Some(docs)).await.unwrap();
        let f = service.upload("f.txt", b"f", false, Some(d)).await.unwrap();
        assert_eq!((d, f), (3, 4));
        let inner = service.upload("inner", b"", true, Some(d)).await.unwrap();

        assert!(matches!(
            service.move_node(d, inner, false).await,
            Err(NetfsError::BadRequest(_))
        ));
        assert!(matches!(
            service.move_node(d, d, false).await,
            Err(NetfsError::BadRequest(_))
        ));
        // A file is never a valid destination.
        assert!(matches!(
            service.move_node(d, f, false).await,
            Err(NetfsError::BadRequest(_))
        ));

        // Moving into the current parent is allowed and changes nothing.
        service.move_node(f, d, false).await.unwrap();
        assert_eq!(service.listing(Some(f)).await.unwrap().path, "/docs/d/f.txt");

        service.move_node(d, 1, false).await.unwrap();
        assert_eq!(service.listing(Some(f)).await.unwrap().path, "/d/f.txt");
    }

    #[tokio::test]
    async fn test_move_conflict_and_overwrite() {
        let (_temp_dir, db, blobs) = setup().await;
        let service = FileService::new(&db, &blobs);

        let a = service.upload("a", b"", true, None).await.unwrap();
        let b = service.upload("b", b"", true, None).await.unwrap();
        let src = service.upload("x.txt", b"new", false, Some(a)).await.unwrap();
        let old = service.upload("x.txt", b"old", false, Some(b)).await.unwrap();

        assert!(matches!(
            service.move_node(src, b, false).await,
            Err(NetfsError::Conflict(_))
        ));

        service.move_node(src, b, true).await.unwrap();

        assert!(matches!(
            service.listing(Some(old)).await,
            Err(NetfsError::NotFound(_))
        ));
        assert_eq!(service.download(src).await.unwrap().content, b"new");
        assert_eq!(service.listing(Some(src)).await.unwrap().path, "/b/x.txt");
    }

    #[tokio::test]
    async fn test_copy_conflict_and_overwrite() {
        let (_temp_dir, db, blobs) = setup().await;
        let service = FileService::new(&db, &blobs);

        let a = service.upload("a", b"", true, None).await.unwrap();
        let b = service.upload("b", b"", true, None).await.unwrap();
        let src = service.upload("x.txt", b"new", false, Some(a)).await.unwrap();
        service.upload("x.txt", b"old", false, Some(b)).await.unwrap();

        assert!(matches!(
            service.copy(src, b, false).await,
            Err(NetfsError::Conflict(_))
        ));

        let copy = service.copy(src, b, true).await.unwrap();
        assert_eq!(service.download(copy).await.unwrap().content, b"new");
        assert_eq!(service.download(src).await.unwrap().content, b"new");

        let listing = service.listing(Some(b)).await.unwrap();
        assert_eq!(listing.children.len(), 1);
    }

    #[tokio::test]
    async fn test_copy_next_to_itself() {
        let (_temp_dir, db, blobs) = setup().await;
        let service = FileService::new(&db, &blobs);
        let src = service.upload("x.txt", b"data", false, None).await.unwrap();

        assert!(matches!(
            service.copy(src, 1, false).await,
            Err(NetfsError::Conflict(_))
        ));
        assert!(matches!(
            service.copy(src, 1, true).await,
            Err(NetfsError::BadRequest(_))
        ));
        assert_eq!(service.download(src).await.unwrap().content, b"data");
    }

    #[tokio::test]
    async fn test_overwrite_of_source_ancestor_rejected() {
        let (_temp_dir, db, blobs) = setup().await;
        let service = FileService::new(&db, &blobs);
        let outer = service.upload("d", b"", true, None).await.unwrap();
        let inner = service.upload("d", b"", true, Some(outer)).await.unwrap();
        let keep = service
            .upload("keep.txt", b"keep", false, Some(inner))
            .await
            .unwrap();

        assert!(matches!(
            service.copy(inner, 1, true).await,
            Err(NetfsError::BadRequest(_))
        ));
        assert!(matches!(
            service.move_node(inner, 1, true).await,
            Err(NetfsError::BadRequest(_))
        ));

        assert_eq!(service.download(keep).await.unwrap().content, b"keep");
        assert_eq!(service.listing(Some(keep)).await.unwrap().path, "/d/d/keep.txt");
        let root = service.listing(None).await.unwrap();
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].node.id, outer);
    }

    #[tokio::test]
    async fn test_copy_into_own_subtree_rejected() {
        let (_temp_dir, db, blobs) = setup().await;
        let service = FileService::new(&db, &blobs);
        let d = service.upload("d", b"", true, None).await.unwrap();
        let inner = service.upload("inner", b"", true, Some(d)).await.unwrap();

        assert!(matches!(
            service.copy(d, d, false).await,
            Err(NetfsError::BadRequest(_))
        ));
        assert!(matches!(
            service.copy(d, inner, false).await,
            Err(NetfsError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_rename() {
        let (_temp_dir, db, blobs) = setup().await;
        let service = FileService::new(&db, &blobs);
        let id = service.upload("old.txt", b"x", false, None).await.unwrap();

        service.rename(id, "new.txt").await.unwrap();
        assert_eq!(service.listing(Some(id)).await.unwrap().path, "/new.txt");

        assert!(matches!(
            service.rename(id, "").await,
            Err(NetfsError::BadRequest(_))
        ));
        assert!(matches!(
            service.rename(999, "x").await,
            Err(NetfsError::NotFound(_))
        ));
        assert!(matches!(
            service.rename(1, "x").await,
            Err(NetfsError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_delete() {
        let (_temp_dir, db, blobs) = setup().await;
        let service = FileService::new(&db, &blobs);
        let d = service.upload("d", b"", true, None).await.unwrap();
        let f = service.upload("f", b"x", false, Some(d)).await.unwrap();

        service.delete(d).await.unwrap();

        assert!(matches!(
            service.download(f).await,
            Err(NetfsError::NotFound(_))
        ));
        assert!(matches!(service.delete(d).await, Err(NetfsError::NotFound(_))));
        assert!(matches!(service.delete(1).await, Err(NetfsError::BadRequest(_))));
    }
}
