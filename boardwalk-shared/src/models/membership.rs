/// Membership directory: per-project (user, role) pairs
///
/// Implements the membership directory for role-based access control inside
/// a project. Every membership is scoped to exactly one project; no
/// operation here has cross-project effects.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE member_role AS ENUM ('owner', 'admin', 'developer', 'viewer');
///
/// CREATE TABLE memberships (
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     role member_role NOT NULL DEFAULT 'developer',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (project_id, user_id)
/// );
/// ```
///
/// # Roles
///
/// - **owner**: Full control; exactly one per project, granted at project
///   creation and never removable or demotable
/// - **admin**: Manage members, archive the project, delete any issue
/// - **developer**: Work the board
/// - **viewer**: Read-only membership
///
/// # Example
///
/// ```no_run
/// use boardwalk_shared::models::membership::{MemberRole, Membership};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, project_id: Uuid, user_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// Membership::add(&pool, project_id, user_id, MemberRole::Developer).await?;
///
/// let role = Membership::role_of(&pool, project_id, user_id).await?;
/// assert_eq!(role, Some(MemberRole::Developer));
/// # Ok(())
/// # }
/// ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{constraint_of, DomainError, DomainResult};

/// Roles a user can hold within a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "member_role", rename_all = "lowercase")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberRole {
    /// Full control, including project deletion
    Owner,

    /// Can manage members and archive the project
    Admin,

    /// Can work the board: create, update, reorder issues
    Developer,

    /// Read-only access
    Viewer,
}

impl MemberRole {
    /// Converts role to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Owner => "owner",
            MemberRole::Admin => "admin",
            MemberRole::Developer => "developer",
            MemberRole::Viewer => "viewer",
        }
    }

    /// Checks if this role meets the permission level of the required role
    ///
    /// Hierarchy: Owner > Admin > Developer > Viewer
    pub fn has_permission(&self, required: &MemberRole) -> bool {
        self.permission_level() >= required.permission_level()
    }

    /// Returns numeric permission level for comparison
    fn permission_level(&self) -> u8 {
        match self {
            MemberRole::Owner => 4,
            MemberRole::Admin => 3,
            MemberRole::Developer => 2,
            MemberRole::Viewer => 1,
        }
    }
}

/// Membership record: a user's role within a project
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Membership {
    /// Project ID
    pub project_id: Uuid,

    /// User ID
    pub user_id: Uuid,

    /// Role within the project
    pub role: MemberRole,

    /// When the membership was created
    pub created_at: DateTime<Utc>,
}

/// Membership joined with user details, for listing project members
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MemberInfo {
    /// User ID
    pub user_id: Uuid,

    /// Email address
    pub email: String,

    /// Display name
    pub name: Option<String>,

    /// Role within the project
    pub role: MemberRole,

    /// When the membership was created
    pub created_at: DateTime<Utc>,
}

impl Membership {
    /// Adds a member to a project
    ///
    /// The OWNER role cannot be granted here: the only owner membership is
    /// created together with the project (`Project::create_with_owner`).
    ///
    /// # Errors
    ///
    /// - `DomainError::InvalidOperation` when `role` is OWNER
    /// - `DomainError::Conflict` when the (project, user) pair already exists
    /// - `DomainError::NotFound` when the project or user does not resolve
    pub async fn add(
        pool: &PgPool,
        project_id: Uuid,
        user_id: Uuid,
        role: MemberRole,
    ) -> DomainResult<Self> {
        if role == MemberRole::Owner {
            return Err(DomainError::InvalidOperation(
                "the owner membership is created with the project".to_string(),
            ));
        }

        let membership = sqlx::query_as::<_, Membership>(
            r#"
            INSERT INTO memberships (project_id, user_id, role)
            VALUES ($1, $2, $3)
            RETURNING project_id, user_id, role, created_at
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .bind(role)
        .fetch_one(pool)
        .await
        .map_err(|e| match constraint_of(&e) {
            Some(c) if c.contains("pkey") => DomainError::Conflict(format!(
                "user {} is already a member of project {}",
                user_id, project_id
            )),
            Some(c) if c.contains("user_id") => DomainError::not_found("user", user_id),
            Some(c) if c.contains("project_id") => DomainError::not_found("project", project_id),
            _ => e.into(),
        })?;

        Ok(membership)
    }

    /// Finds a specific membership
    pub async fn find(
        pool: &PgPool,
        project_id: Uuid,
        user_id: Uuid,
    ) -> DomainResult<Option<Self>> {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            SELECT project_id, user_id, role, created_at
            FROM memberships
            WHERE project_id = $1 AND user_id = $2
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(membership)
    }

    /// Gets a user's role in a project, or None if not a member
    pub async fn role_of(
        pool: &PgPool,
        project_id: Uuid,
        user_id: Uuid,
    ) -> DomainResult<Option<MemberRole>> {
        let role: Option<MemberRole> = sqlx::query_scalar(
            "SELECT role FROM memberships WHERE project_id = $1 AND user_id = $2",
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(role)
    }

    /// Pure membership test
    pub async fn is_member(pool: &PgPool, project_id: Uuid, user_id: Uuid) -> DomainResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM memberships
                WHERE project_id = $1 AND user_id = $2
            )
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }

    /// Changes a member's role
    ///
    /// # Errors
    ///
    /// - `DomainError::InvalidOperation` when the target holds the OWNER
    ///   role, or when the new role is OWNER (promotion to owner is never
    ///   allowed)
    /// - `DomainError::NotFound` when no such membership exists
    pub async fn set_role(
        pool: &PgPool,
        project_id: Uuid,
        user_id: Uuid,
        role: MemberRole,
    ) -> DomainResult<Self> {
        if role == MemberRole::Owner {
            return Err(DomainError::InvalidOperation(
                "cannot promote a member to owner".to_string(),
            ));
        }

        let current = Self::find(pool, project_id, user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("membership", user_id))?;

        if current.role == MemberRole::Owner {
            return Err(DomainError::InvalidOperation(
                "cannot change the owner's role".to_string(),
            ));
        }

        let membership = sqlx::query_as::<_, Membership>(
            r#"
            UPDATE memberships
            SET role = $3
            WHERE project_id = $1 AND user_id = $2
            RETURNING project_id, user_id, role, created_at
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .bind(role)
        .fetch_one(pool)
        .await?;

        Ok(membership)
    }

    /// Removes a member from a project
    ///
    /// # Errors
    ///
    /// - `DomainError::InvalidOperation` when the target holds the OWNER role
    /// - `DomainError::NotFound` when no such membership exists
    pub async fn remove(pool: &PgPool, project_id: Uuid, user_id: Uuid) -> DomainResult<()> {
        let current = Self::find(pool, project_id, user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("membership", user_id))?;

        if current.role == MemberRole::Owner {
            return Err(DomainError::InvalidOperation(
                "cannot remove the project owner".to_string(),
            ));
        }

        sqlx::query("DELETE FROM memberships WHERE project_id = $1 AND user_id = $2")
            .bind(project_id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Lists all members of a project with their user details
    pub async fn list_by_project(pool: &PgPool, project_id: Uuid) -> DomainResult<Vec<MemberInfo>> {
        let members = sqlx::query_as::<_, MemberInfo>(
            r#"
            SELECT m.user_id, u.email, u.name, m.role, m.created_at
            FROM memberships m
            JOIN users u ON u.id = m.user_id
            WHERE m.project_id = $1
            ORDER BY m.created_at ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(pool)
        .await?;

        Ok(members)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_role_as_str() {
        assert_eq!(MemberRole::Owner.as_str(), "owner");
        assert_eq!(MemberRole::Admin.as_str(), "admin");
        assert_eq!(MemberRole::Developer.as_str(), "developer");
        assert_eq!(MemberRole::Viewer.as_str(), "viewer");
    }

    #[test]
    fn test_role_hierarchy() {
        // Owner outranks everyone
        assert!(MemberRole::Owner.has_permission(&MemberRole::Admin));
        assert!(MemberRole::Owner.has_permission(&MemberRole::Developer));
        assert!(MemberRole::Owner.has_permission(&MemberRole::Viewer));

        // Admin outranks developer and viewer, not owner
        assert!(MemberRole::Admin.has_permission(&MemberRole::Developer));
        assert!(MemberRole::Admin.has_permission(&MemberRole::Viewer));
        assert!(!MemberRole::Admin.has_permission(&MemberRole::Owner));

        // Developer outranks viewer only
        assert!(MemberRole::Developer.has_permission(&MemberRole::Viewer));
        assert!(!MemberRole::Developer.has_permission(&MemberRole::Admin));

        // Viewer outranks nobody
        assert!(!MemberRole::Viewer.has_permission(&MemberRole::Developer));
        assert!(MemberRole::Viewer.has_permission(&MemberRole::Viewer));
    }

    #[test]
    fn test_role_serde_names() {
        let json = serde_json::to_string(&MemberRole::Developer).unwrap();
        assert_eq!(json, "\"DEVELOPER\"");

        let role: MemberRole = serde_json::from_str("\"OWNER\"").unwrap();
        assert_eq!(role, MemberRole::Owner);
    }

    // Database-backed directory tests live in tests/membership_tests.rs
}
