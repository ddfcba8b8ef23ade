//! Node types and repository for the NetFS tree.

use sqlx::{QueryBuilder, SqlitePool};

use crate::{NetfsError, Result};

const NODE_COLUMNS: &str = "id, name, is_dir, parent_id, blob_id, updated_at";

/// A directory or file in the tree.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Node {
    /// Unique node ID, assigned at creation.
    pub id: i64,
    /// Name relative to the parent.
    pub name: String,
    /// Whether this node is a directory.
    pub is_dir: bool,
    /// Parent node ID (None only for the root).
    pub parent_id: Option<i64>,
    /// Blob holding file content (None for directories).
    pub blob_id: Option<i64>,
    /// Last content or metadata change, SQLite UTC format.
    pub updated_at: String,
}

impl Node {
    /// Whether this node is the tree root.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Data for inserting a node.
///
/// The constructors are the only way to build one, so a directory never
/// carries a blob and a file always does.
#[derive(Debug, Clone)]
pub struct NewNode {
    name: String,
    parent_id: Option<i64>,
    blob_id: Option<i64>,
}

impl NewNode {
    /// A directory under `parent_id`.
    pub fn directory(name: impl Into<String>, parent_id: i64) -> Self {
        Self {
            name: name.into(),
            parent_id: Some(parent_id),
            blob_id: None,
        }
    }

    /// A file under `parent_id` whose content lives in `blob_id`.
    pub fn file(name: impl Into<String>, parent_id: i64, blob_id: i64) -> Self {
        Self {
            name: name.into(),
            parent_id: Some(parent_id),
            blob_id: Some(blob_id),
        }
    }

    /// Whether this is a directory.
    pub fn is_dir(&self) -> bool {
        self.blob_id.is_none()
    }
}

/// Metadata changes for an existing node.
///
/// Kind and blob reference are fixed for a node's lifetime and cannot be
/// changed here. Every applied update refreshes `updated_at`.
#[derive(Debug, Clone, Default)]
pub struct NodeUpdate {
    /// New name.
    pub name: Option<String>,
    /// New parent.
    pub parent_id: Option<i64>,
}

impl NodeUpdate {
    /// Create an empty update; applying it only refreshes `updated_at`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the parent.
    pub fn parent_id(mut self, parent_id: i64) -> Self {
        self.parent_id = Some(parent_id);
        self
    }
}

/// Repository for single-record node operations.
pub struct NodeRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> NodeRepository<'a> {
    /// Create a new NodeRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a node and return it with its assigned ID.
    pub async fn create(&self, node: &NewNode) -> Result<Node> {
        let result =
            sqlx::query("INSERT INTO nodes (name, is_dir, parent_id, blob_id) VALUES (?, ?, ?, ?)")
                .bind(&node.name)
                .bind(node.is_dir())
                .bind(node.parent_id)
                .bind(node.blob_id)
                .execute(self.pool)
                .await?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| NetfsError::NotFound(format!("node {id}")))
    }

    /// Get a node by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Node>> {
        let node = sqlx::query_as::<_, Node>(&format!(
            "SELECT {NODE_COLUMNS} FROM nodes WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(node)
    }

    /// Get the parentless root node.
    pub async fn get_root(&self) -> Result<Option<Node>> {
        let node = sqlx::query_as::<_, Node>(&format!(
            "SELECT {NODE_COLUMNS} FROM nodes WHERE parent_id IS NULL ORDER BY id LIMIT 1"
        ))
        .fetch_optional(self.pool)
        .await?;
        Ok(node)
    }

    /// Get the first child of `parent_id` named `name`.
    pub async fn child_by_name(&self, parent_id: i64, name: &str) -> Result<Option<Node>> {
        let node = sqlx::query_as::<_, Node>(&format!(
            "SELECT {NODE_COLUMNS} FROM nodes WHERE parent_id = ? AND name = ? ORDER BY id LIMIT 1"
        ))
        .bind(parent_id)
        .bind(name)
        .fetch_optional(self.pool)
        .await?;
        Ok(node)
    }

    /// List the immediate children of a node, directories first, then by name.
    pub async fn children(&self, parent_id: i64) -> Result<Vec<Node>> {
        let nodes = sqlx::query_as::<_, Node>(&format!(
            "SELECT {NODE_COLUMNS} FROM nodes WHERE parent_id = ?
             ORDER BY is_dir DESC, name, id"
        ))
        .bind(parent_id)
        .fetch_all(self.pool)
        .await?;
        Ok(nodes)
    }

    /// Apply an update to a node.
    ///
    /// Returns the updated node, or None if not found.
    pub async fn update(&self, id: i64, update: &NodeUpdate) -> Result<Option<Node>> {
        let mut query: QueryBuilder<sqlx::Sqlite> =
            QueryBuilder::new("UPDATE nodes SET updated_at = datetime('now')");

        if let Some(ref name) = update.name {
            query.push(", name = ");
            query.push_bind(name);
        }
        if let Some(parent_id) = update.parent_id {
            query.push(", parent_id = ");
            query.push_bind(parent_id);
        }

        query.push(" WHERE id = ");
        query.push_bind(id);

        let result = query.build().execute(self.pool).await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_by_id(id).await
    }

    /// Refresh a node's `updated_at`. Returns false if the node does not exist.
    pub async fn touch(&self, id: i64) -> Result<bool> {
        Ok(self.update(id, &NodeUpdate::new()).await?.is_some())
    }

    /// Delete a node record.
    ///
    /// Returns true if a row was deleted, false if not found.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM nodes WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Count all nodes, including the root.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM nodes")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}
