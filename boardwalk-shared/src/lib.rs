//! # Boardwalk Shared Library
//!
//! This crate contains the domain core of Boardwalk, a project/issue tracker
//! built around a kanban board engine. It is shared between the API server
//! and any future tooling.
//!
//! ## Module Organization
//!
//! - `models`: Database models and data structures
//! - `board`: Board ordering engine and subtask aggregation
//! - `auth`: Identity resolution and the access policy
//! - `notify`: Fire-and-forget notification sink (redis pub/sub)
//! - `db`: Connection pool management
//! - `error`: Domain error taxonomy

pub mod auth;
pub mod board;
pub mod db;
pub mod error;
pub mod models;
pub mod notify;

/// Current version of the Boardwalk shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
