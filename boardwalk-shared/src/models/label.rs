/// Project-scoped labels
///
/// Labels are small keyed records owned by a project and attached to issues
/// through the `issue_labels` join table. Names are unique per project.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{constraint_of, DomainError, DomainResult};

/// Label record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Label {
    /// Unique label ID
    pub id: Uuid,

    /// Project this label belongs to
    pub project_id: Uuid,

    /// Label name (unique per project)
    pub name: String,

    /// Display color, e.g. "#ff5500"
    pub color: Option<String>,

    /// When the label was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new label
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLabel {
    /// Project the label belongs to
    pub project_id: Uuid,

    /// Label name
    pub name: String,

    /// Display color
    pub color: Option<String>,
}

impl Label {
    /// Creates a new label
    ///
    /// # Errors
    ///
    /// - `DomainError::Conflict` when the name already exists in the project
    /// - `DomainError::NotFound` when the project does not resolve
    pub async fn create(pool: &PgPool, data: CreateLabel) -> DomainResult<Self> {
        let label = sqlx::query_as::<_, Label>(
            r#"
            INSERT INTO labels (project_id, name, color)
            VALUES ($1, $2, $3)
            RETURNING id, project_id, name, color, created_at
            "#,
        )
        .bind(data.project_id)
        .bind(&data.name)
        .bind(&data.color)
        .fetch_one(pool)
        .await
        .map_err(|e| match constraint_of(&e) {
            Some(c) if c.contains("project_id_name") || c.contains("name") => {
                DomainError::Conflict(format!("label {} already exists", data.name))
            }
            Some(c) if c.contains("project_id") => {
                DomainError::not_found("project", data.project_id)
            }
            _ => e.into(),
        })?;

        Ok(label)
    }

    /// Finds a label by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> DomainResult<Option<Self>> {
        let label = sqlx::query_as::<_, Label>(
            "SELECT id, project_id, name, color, created_at FROM labels WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(label)
    }

    /// Lists labels of a project, alphabetically
    pub async fn list_by_project(pool: &PgPool, project_id: Uuid) -> DomainResult<Vec<Self>> {
        let labels = sqlx::query_as::<_, Label>(
            r#"
            SELECT id, project_id, name, color, created_at
            FROM labels
            WHERE project_id = $1
            ORDER BY name ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(pool)
        .await?;

        Ok(labels)
    }
}
