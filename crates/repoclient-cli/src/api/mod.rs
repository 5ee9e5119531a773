//! Repository Service API module
//!
//! HTTP client, endpoint URL builders and wire types for the remote
//! metadata and staging APIs.

pub mod client;
pub mod endpoints;
pub mod types;

pub use client::RepositoryClient;
pub use types::*;
