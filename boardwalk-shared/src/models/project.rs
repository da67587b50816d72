/// Project model and lifecycle operations
///
/// Projects own memberships and issues. A project is created together with
/// its OWNER membership in a single transaction: there is never a project
/// without an owner, nor an owner membership without a project. Archiving
/// and deleting are status changes on the project record only; issues and
/// memberships are left untouched.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE project_status AS ENUM ('active', 'archived', 'deleted');
///
/// CREATE TABLE projects (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     key VARCHAR(10) NOT NULL,
///     description TEXT,
///     status project_status NOT NULL DEFAULT 'active',
///     owner_id UUID NOT NULL REFERENCES users(id),
///     is_public BOOLEAN NOT NULL DEFAULT FALSE,
///     start_date DATE,
///     end_date DATE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// CREATE UNIQUE INDEX uk_projects_key ON projects (UPPER(key));
/// ```
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{constraint_of, DomainError, DomainResult};
use crate::models::membership::MemberRole;

/// Project lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "project_status", rename_all = "lowercase")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
    /// Project is in use
    Active,

    /// Project has been archived (read-mostly, not deleted)
    Archived,

    /// Project has been soft-deleted
    Deleted,
}

impl ProjectStatus {
    /// Converts status to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Active => "active",
            ProjectStatus::Archived => "archived",
            ProjectStatus::Deleted => "deleted",
        }
    }
}

/// Project record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    /// Unique project ID
    pub id: Uuid,

    /// Human-readable project name
    pub name: String,

    /// Short unique key (stored upper-cased, e.g. "BW")
    pub key: String,

    /// Free-text description
    pub description: Option<String>,

    /// Lifecycle status
    pub status: ProjectStatus,

    /// Owner user ID (immutable once set)
    pub owner_id: Uuid,

    /// Whether the project is visible to non-members
    pub is_public: bool,

    /// Planned start date
    pub start_date: Option<NaiveDate>,

    /// Planned end date
    pub end_date: Option<NaiveDate>,

    /// When the project was created
    pub created_at: DateTime<Utc>,

    /// When the project was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProject {
    /// Project name
    pub name: String,

    /// Short key; stored upper-cased, unique case-insensitively
    pub key: String,

    /// Free-text description
    pub description: Option<String>,

    /// Creating user; becomes the OWNER member
    pub owner_id: Uuid,

    /// Public visibility flag
    #[serde(default)]
    pub is_public: bool,

    /// Planned start date
    pub start_date: Option<NaiveDate>,

    /// Planned end date
    pub end_date: Option<NaiveDate>,
}

/// Partial update for a project; None fields are left unchanged.
///
/// The key and the owner are immutable and deliberately absent here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProject {
    /// New name
    pub name: Option<String>,

    /// New description
    pub description: Option<String>,

    /// New start date
    pub start_date: Option<NaiveDate>,

    /// New end date
    pub end_date: Option<NaiveDate>,

    /// New visibility
    pub is_public: Option<bool>,
}

const PROJECT_COLUMNS: &str = "id, name, key, description, status, owner_id, is_public, \
                               start_date, end_date, created_at, updated_at";

impl Project {
    /// Creates a project and grants the creator the OWNER membership
    ///
    /// Both writes happen in one transaction: either the project exists with
    /// its owner membership, or neither is visible.
    ///
    /// # Errors
    ///
    /// - `DomainError::Conflict` when the key already exists (matched
    ///   case-insensitively)
    /// - `DomainError::NotFound` when the owner user does not resolve
    pub async fn create_with_owner(pool: &PgPool, data: CreateProject) -> DomainResult<Self> {
        let key = data.key.to_uppercase();

        let mut tx = pool.begin().await?;

        let project = sqlx::query_as::<_, Project>(&format!(
            r#"
            INSERT INTO projects (name, key, description, owner_id, is_public, start_date, end_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {PROJECT_COLUMNS}
            "#
        ))
        .bind(&data.name)
        .bind(&key)
        .bind(&data.description)
        .bind(data.owner_id)
        .bind(data.is_public)
        .bind(data.start_date)
        .bind(data.end_date)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match constraint_of(&e) {
            Some(c) if c.contains("key") => {
                DomainError::Conflict(format!("project key {} already exists", key))
            }
            Some(c) if c.contains("owner_id") => DomainError::not_found("user", data.owner_id),
            _ => e.into(),
        })?;

        sqlx::query(
            r#"
            INSERT INTO memberships (project_id, user_id, role)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(project.id)
        .bind(data.owner_id)
        .bind(MemberRole::Owner)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(project_id = %project.id, key = %project.key, owner_id = %data.owner_id, "Project created");

        Ok(project)
    }

    /// Finds a project by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> DomainResult<Option<Self>> {
        let project = sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(project)
    }

    /// Finds a project by key, matched case-insensitively
    pub async fn find_by_key(pool: &PgPool, key: &str) -> DomainResult<Option<Self>> {
        let project = sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE UPPER(key) = UPPER($1)"
        ))
        .bind(key)
        .fetch_optional(pool)
        .await?;

        Ok(project)
    }

    /// Lists active projects the user is a member of, newest first
    ///
    /// An optional search term matches name or key as a substring.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: Uuid,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> DomainResult<Vec<Self>> {
        let projects = sqlx::query_as::<_, Project>(&format!(
            r#"
            SELECT {PROJECT_COLUMNS}
            FROM projects p
            JOIN memberships m ON m.project_id = p.id
            WHERE m.user_id = $1
              AND p.status = 'active'
              AND ($2::text IS NULL OR p.name ILIKE '%' || $2 || '%' OR p.key ILIKE '%' || $2 || '%')
            ORDER BY p.created_at DESC
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(user_id)
        .bind(search)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(projects)
    }

    /// Counts active projects the user is a member of (same filter as `list_for_user`)
    pub async fn count_for_user(
        pool: &PgPool,
        user_id: Uuid,
        search: Option<&str>,
    ) -> DomainResult<i64> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM projects p
            JOIN memberships m ON m.project_id = p.id
            WHERE m.user_id = $1
              AND p.status = 'active'
              AND ($2::text IS NULL OR p.name ILIKE '%' || $2 || '%' OR p.key ILIKE '%' || $2 || '%')
            "#,
        )
        .bind(user_id)
        .bind(search)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }

    /// Lists public, active projects, newest first
    pub async fn list_public(pool: &PgPool, limit: i64, offset: i64) -> DomainResult<Vec<Self>> {
        let projects = sqlx::query_as::<_, Project>(&format!(
            r#"
            SELECT {PROJECT_COLUMNS}
            FROM projects
            WHERE is_public = TRUE AND status = 'active'
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(projects)
    }

    /// Counts public, active projects
    pub async fn count_public(pool: &PgPool) -> DomainResult<i64> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM projects WHERE is_public = TRUE AND status = 'active'",
        )
        .fetch_one(pool)
        .await?;

        Ok(count)
    }

    /// Applies a partial update; the key and owner are immutable
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` when the project does not resolve.
    pub async fn update(pool: &PgPool, id: Uuid, data: UpdateProject) -> DomainResult<Self> {
        let project = sqlx::query_as::<_, Project>(&format!(
            r#"
            UPDATE projects
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                start_date = COALESCE($4, start_date),
                end_date = COALESCE($5, end_date),
                is_public = COALESCE($6, is_public),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PROJECT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.start_date)
        .bind(data.end_date)
        .bind(data.is_public)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DomainError::not_found("project", id))?;

        Ok(project)
    }

    /// Archives the project (status change only; issues and memberships stay)
    pub async fn archive(pool: &PgPool, id: Uuid) -> DomainResult<Self> {
        Self::set_status(pool, id, ProjectStatus::Archived).await
    }

    /// Soft-deletes the project (status change only)
    pub async fn soft_delete(pool: &PgPool, id: Uuid) -> DomainResult<Self> {
        Self::set_status(pool, id, ProjectStatus::Deleted).await
    }

    async fn set_status(pool: &PgPool, id: Uuid, status: ProjectStatus) -> DomainResult<Self> {
        let project = sqlx::query_as::<_, Project>(&format!(
            r#"
            UPDATE projects
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {PROJECT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DomainError::not_found("project", id))?;

        tracing::info!(project_id = %id, status = %project.status.as_str(), "Project status changed");

        Ok(project)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_status_as_str() {
        assert_eq!(ProjectStatus::Active.as_str(), "active");
        assert_eq!(ProjectStatus::Archived.as_str(), "archived");
        assert_eq!(ProjectStatus::Deleted.as_str(), "deleted");
    }

    #[test]
    fn test_status_serde_names() {
        let json = serde_json::to_string(&ProjectStatus::Archived).unwrap();
        assert_eq!(json, "\"ARCHIVED\"");
    }

    // Atomic create-with-owner tests live in tests/project_tests.rs
}
