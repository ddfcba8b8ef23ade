//! Web API module for NetFS.
//!
//! This module exposes the file tree over HTTP: listings, downloads,
//! uploads with progress streaming, and copy/move/rename/delete.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use handlers::AppState;
pub use router::{create_health_router, create_router};
pub use server::WebServer;
