//! Middleware for the NetFS API.

pub mod cors;

pub use cors::create_cors_layer;
