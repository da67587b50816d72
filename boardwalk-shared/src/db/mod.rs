/// Database layer for Boardwalk
///
/// Provides PostgreSQL connection pool management. Schema lives in the
/// workspace-level `migrations/` directory and is applied with
/// `sqlx::migrate!`.
pub mod pool;

pub use pool::{create_pool, health_check, DatabaseConfig};
