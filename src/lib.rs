//! NetFS - a networked hierarchical file store.
//!
//! Directories and files live as nodes in SQLite; file content is kept as
//! opaque blobs in a flat directory. The tree is served over HTTP with
//! upload progress streaming.

pub mod config;
pub mod datetime;
pub mod db;
pub mod error;
pub mod file;
pub mod logging;
pub mod progress;
pub mod web;

pub use config::Config;
pub use db::Database;
pub use error::{NetfsError, Result};
pub use file::{BlobStore, FileService, Node, TreeEngine};
pub use progress::ProgressNotifier;
pub use web::WebServer;
