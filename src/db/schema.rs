//! Database schema and migrations for NetFS.
//!
//! Migrations are applied in order when the database is opened. The
//! `schema_version` table records which ones have run.

/// Database migrations.
pub const MIGRATIONS: &[&str] = &[
    // v1: node tree with the root directory
    r#"
-- A directory never references a blob; a file always references exactly one.
CREATE TABLE nodes (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL,
    is_dir      BOOLEAN NOT NULL,
    parent_id   INTEGER REFERENCES nodes(id) ON DELETE CASCADE,
    blob_id     INTEGER UNIQUE,
    updated_at  TEXT NOT NULL DEFAULT (datetime('now')),
    CHECK ((is_dir = 1 AND blob_id IS NULL) OR (is_dir = 0 AND blob_id IS NOT NULL))
);

CREATE INDEX idx_nodes_parent ON nodes(parent_id);
CREATE INDEX idx_nodes_parent_name ON nodes(parent_id, name);

INSERT INTO nodes (name, is_dir, parent_id) VALUES ('/', 1, NULL);
"#,
];
