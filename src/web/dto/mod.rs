//! Data Transfer Objects for the NetFS API.

pub mod request;
pub mod response;

pub use request::*;
pub use response::*;
