/// Database models for Boardwalk
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: User reference records (authentication itself is external)
/// - `project`: Projects with lifecycle status and single-owner invariant
/// - `membership`: The membership directory — per-project (user, role) pairs
/// - `issue`: Issues with status columns, positions, and subtask links
/// - `label`: Project-scoped labels attachable to issues
///
/// # Example
///
/// ```no_run
/// use boardwalk_shared::models::project::{CreateProject, Project};
/// use boardwalk_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example(owner_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let project = Project::create_with_owner(&pool, CreateProject {
///     name: "Boardwalk".to_string(),
///     key: "bw".to_string(),
///     description: None,
///     owner_id,
///     is_public: false,
///     start_date: None,
///     end_date: None,
/// }).await?;
/// # Ok(())
/// # }
/// ```
pub mod issue;
pub mod label;
pub mod membership;
pub mod project;
pub mod user;
