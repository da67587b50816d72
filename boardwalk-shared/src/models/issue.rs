/// Issue model and store queries
///
/// Issues are the unit of work on the board. Each issue belongs to exactly
/// one project, sits in one status column at an integer position, and may
/// carry an optional parent reference (one level: subtasks cannot nest).
///
/// Position semantics: top-level issues are positioned within their
/// (project, status) column; subtasks are positioned within the set of
/// children of their parent. Both spaces are append-at-count and tolerate
/// gaps after removals — read paths sort by position and never rely on
/// absolute values. All position-assigning writes live in `crate::board`,
/// not here.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE issue_status AS ENUM ('todo', 'in_progress', 'in_review', 'testing', 'done', 'closed');
/// CREATE TYPE issue_priority AS ENUM ('lowest', 'low', 'medium', 'high', 'highest');
/// CREATE TYPE issue_type AS ENUM ('story', 'bug', 'task', 'epic', 'subtask');
///
/// CREATE TABLE issues (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project_id UUID NOT NULL REFERENCES projects(id),
///     reporter_id UUID NOT NULL REFERENCES users(id),
///     assignee_id UUID REFERENCES users(id),
///     parent_id UUID REFERENCES issues(id),
///     title VARCHAR(500) NOT NULL,
///     description TEXT,
///     status issue_status NOT NULL DEFAULT 'todo',
///     priority issue_priority NOT NULL DEFAULT 'medium',
///     issue_type issue_type NOT NULL DEFAULT 'task',
///     position INTEGER NOT NULL DEFAULT 0,
///     due_date TIMESTAMPTZ,
///     story_points DOUBLE PRECISION,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};
use crate::models::label::Label;

/// Issue workflow status
///
/// No transition graph is enforced: any status can be set from any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "issue_status", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueStatus {
    Todo,
    InProgress,
    InReview,
    Testing,
    Done,
    Closed,
}

impl IssueStatus {
    /// Converts status to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueStatus::Todo => "todo",
            IssueStatus::InProgress => "in_progress",
            IssueStatus::InReview => "in_review",
            IssueStatus::Testing => "testing",
            IssueStatus::Done => "done",
            IssueStatus::Closed => "closed",
        }
    }

    /// Whether this status counts as completed for subtask roll-up
    pub fn is_completed(&self) -> bool {
        matches!(self, IssueStatus::Done | IssueStatus::Closed)
    }
}

/// Issue priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "issue_priority", rename_all = "lowercase")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssuePriority {
    Lowest,
    Low,
    Medium,
    High,
    Highest,
}

/// Issue type
///
/// `Subtask` is special: subtasks carry a parent reference, inherit project,
/// reporter, and priority from the parent, and are positioned among their
/// siblings instead of in a board column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "issue_type", rename_all = "lowercase")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueType {
    Story,
    Bug,
    Task,
    Epic,
    Subtask,
}

/// Issue record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Issue {
    /// Unique issue ID
    pub id: Uuid,

    /// Project this issue belongs to
    pub project_id: Uuid,

    /// User who created the issue (immutable)
    pub reporter_id: Uuid,

    /// Assigned user, if any
    pub assignee_id: Option<Uuid>,

    /// Parent issue for subtasks
    pub parent_id: Option<Uuid>,

    /// Issue title
    pub title: String,

    /// Free-text description
    pub description: Option<String>,

    /// Workflow status (the board column)
    pub status: IssueStatus,

    /// Priority
    pub priority: IssuePriority,

    /// Issue type
    #[serde(rename = "type")]
    pub issue_type: IssueType,

    /// Order within the column (top-level) or sibling set (subtasks)
    pub position: i32,

    /// Optional due timestamp
    pub due_date: Option<DateTime<Utc>>,

    /// Optional story-point estimate
    pub story_points: Option<f64>,

    /// When the issue was created
    pub created_at: DateTime<Utc>,

    /// When the issue was last updated
    pub updated_at: DateTime<Utc>,
}

/// Partial field update; None fields are left unchanged.
///
/// Status is deliberately absent: status changes go through
/// `board::ordering::change_status` so the destination column position is
/// assigned correctly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateIssue {
    /// New title
    pub title: Option<String>,

    /// New description
    pub description: Option<String>,

    /// New type
    #[serde(rename = "type")]
    pub issue_type: Option<IssueType>,

    /// New priority
    pub priority: Option<IssuePriority>,

    /// New due timestamp
    pub due_date: Option<DateTime<Utc>>,

    /// New story-point estimate
    pub story_points: Option<f64>,
}

pub(crate) const ISSUE_COLUMNS: &str =
    "id, project_id, reporter_id, assignee_id, parent_id, title, description, status, \
     priority, issue_type, position, due_date, story_points, created_at, updated_at";

impl Issue {
    /// Finds an issue by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> DomainResult<Option<Self>> {
        let issue = sqlx::query_as::<_, Issue>(&format!(
            "SELECT {ISSUE_COLUMNS} FROM issues WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(issue)
    }

    /// Lists issues of a project, newest first, with optional status filter
    /// and optional substring search over title and description
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: Uuid,
        status: Option<IssueStatus>,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> DomainResult<Vec<Self>> {
        let issues = sqlx::query_as::<_, Issue>(&format!(
            r#"
            SELECT {ISSUE_COLUMNS}
            FROM issues
            WHERE project_id = $1
              AND ($2::issue_status IS NULL OR status = $2)
              AND ($3::text IS NULL OR title ILIKE '%' || $3 || '%' OR description ILIKE '%' || $3 || '%')
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            "#
        ))
        .bind(project_id)
        .bind(status)
        .bind(search)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(issues)
    }

    /// Counts issues of a project under the same filters as `list_by_project`
    pub async fn count_by_project(
        pool: &PgPool,
        project_id: Uuid,
        status: Option<IssueStatus>,
        search: Option<&str>,
    ) -> DomainResult<i64> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM issues
            WHERE project_id = $1
              AND ($2::issue_status IS NULL OR status = $2)
              AND ($3::text IS NULL OR title ILIKE '%' || $3 || '%' OR description ILIKE '%' || $3 || '%')
            "#,
        )
        .bind(project_id)
        .bind(status)
        .bind(search)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }

    /// Lists all top-level issues of a project for the kanban board,
    /// ordered by position within each column
    ///
    /// Subtasks are excluded: they are positioned among siblings, not in
    /// board columns, and render inside their parent's card.
    pub async fn kanban(pool: &PgPool, project_id: Uuid) -> DomainResult<Vec<Self>> {
        let issues = sqlx::query_as::<_, Issue>(&format!(
            r#"
            SELECT {ISSUE_COLUMNS}
            FROM issues
            WHERE project_id = $1 AND parent_id IS NULL
            ORDER BY status ASC, position ASC, created_at ASC
            "#
        ))
        .bind(project_id)
        .fetch_all(pool)
        .await?;

        Ok(issues)
    }

    /// Lists one board column: top-level issues of (project, status) in order
    pub async fn column(
        pool: &PgPool,
        project_id: Uuid,
        status: IssueStatus,
    ) -> DomainResult<Vec<Self>> {
        let issues = sqlx::query_as::<_, Issue>(&format!(
            r#"
            SELECT {ISSUE_COLUMNS}
            FROM issues
            WHERE project_id = $1 AND status = $2 AND parent_id IS NULL
            ORDER BY position ASC, created_at ASC
            "#
        ))
        .bind(project_id)
        .bind(status)
        .fetch_all(pool)
        .await?;

        Ok(issues)
    }

    /// Lists issues assigned to a user, newest first
    pub async fn list_by_assignee(
        pool: &PgPool,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> DomainResult<Vec<Self>> {
        let issues = sqlx::query_as::<_, Issue>(&format!(
            r#"
            SELECT {ISSUE_COLUMNS}
            FROM issues
            WHERE assignee_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(issues)
    }

    /// Lists issues reported by a user, newest first
    pub async fn list_by_reporter(
        pool: &PgPool,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> DomainResult<Vec<Self>> {
        let issues = sqlx::query_as::<_, Issue>(&format!(
            r#"
            SELECT {ISSUE_COLUMNS}
            FROM issues
            WHERE reporter_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(issues)
    }

    /// Lists the user's open assigned issues due on or before the deadline
    pub async fn due_before(
        pool: &PgPool,
        user_id: Uuid,
        deadline: DateTime<Utc>,
    ) -> DomainResult<Vec<Self>> {
        let issues = sqlx::query_as::<_, Issue>(&format!(
            r#"
            SELECT {ISSUE_COLUMNS}
            FROM issues
            WHERE assignee_id = $1
              AND due_date IS NOT NULL
              AND due_date <= $2
              AND status NOT IN ('done', 'closed')
            ORDER BY due_date ASC
            "#
        ))
        .bind(user_id)
        .bind(deadline)
        .fetch_all(pool)
        .await?;

        Ok(issues)
    }

    /// Lists children of a parent issue, ordered by their sibling position
    pub async fn subtasks_of(pool: &PgPool, parent_id: Uuid) -> DomainResult<Vec<Self>> {
        let issues = sqlx::query_as::<_, Issue>(&format!(
            r#"
            SELECT {ISSUE_COLUMNS}
            FROM issues
            WHERE parent_id = $1
            ORDER BY position ASC, created_at ASC
            "#
        ))
        .bind(parent_id)
        .fetch_all(pool)
        .await?;

        Ok(issues)
    }

    /// Applies a partial field update (no status or ordering side effects)
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` when the issue does not resolve.
    pub async fn update(pool: &PgPool, id: Uuid, data: UpdateIssue) -> DomainResult<Self> {
        let issue = sqlx::query_as::<_, Issue>(&format!(
            r#"
            UPDATE issues
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                issue_type = COALESCE($4, issue_type),
                priority = COALESCE($5, priority),
                due_date = COALESCE($6, due_date),
                story_points = COALESCE($7, story_points),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {ISSUE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.issue_type)
        .bind(data.priority)
        .bind(data.due_date)
        .bind(data.story_points)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DomainError::not_found("issue", id))?;

        Ok(issue)
    }

    /// Replaces the issue's label set
    ///
    /// Every label must belong to the issue's project.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` when a label id does not resolve
    /// within the project.
    pub async fn set_labels(pool: &PgPool, issue: &Issue, label_ids: &[Uuid]) -> DomainResult<()> {
        let mut tx = pool.begin().await?;

        let known: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM labels WHERE project_id = $1 AND id = ANY($2)",
        )
        .bind(issue.project_id)
        .bind(label_ids)
        .fetch_one(&mut *tx)
        .await?;

        if known as usize != label_ids.len() {
            return Err(DomainError::NotFound(
                "one or more labels not found in this project".to_string(),
            ));
        }

        sqlx::query("DELETE FROM issue_labels WHERE issue_id = $1")
            .bind(issue.id)
            .execute(&mut *tx)
            .await?;

        for label_id in label_ids {
            sqlx::query("INSERT INTO issue_labels (issue_id, label_id) VALUES ($1, $2)")
                .bind(issue.id)
                .bind(label_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(())
    }

    /// Reads the issue's labels
    pub async fn labels_of(pool: &PgPool, issue_id: Uuid) -> DomainResult<Vec<Label>> {
        let labels = sqlx::query_as::<_, Label>(
            r#"
            SELECT l.id, l.project_id, l.name, l.color, l.created_at
            FROM labels l
            JOIN issue_labels il ON il.label_id = l.id
            WHERE il.issue_id = $1
            ORDER BY l.name ASC
            "#,
        )
        .bind(issue_id)
        .fetch_all(pool)
        .await?;

        Ok(labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_status_as_str() {
        assert_eq!(IssueStatus::Todo.as_str(), "todo");
        assert_eq!(IssueStatus::InProgress.as_str(), "in_progress");
        assert_eq!(IssueStatus::InReview.as_str(), "in_review");
        assert_eq!(IssueStatus::Testing.as_str(), "testing");
        assert_eq!(IssueStatus::Done.as_str(), "done");
        assert_eq!(IssueStatus::Closed.as_str(), "closed");
    }

    #[test]
    fn test_issue_status_is_completed() {
        assert!(IssueStatus::Done.is_completed());
        assert!(IssueStatus::Closed.is_completed());
        assert!(!IssueStatus::Todo.is_completed());
        assert!(!IssueStatus::InProgress.is_completed());
        assert!(!IssueStatus::InReview.is_completed());
        assert!(!IssueStatus::Testing.is_completed());
    }

    #[test]
    fn test_status_serde_names() {
        let json = serde_json::to_string(&IssueStatus::InProgress).unwrap();
        assert_eq!(json, "\"IN_PROGRESS\"");

        let status: IssueStatus = serde_json::from_str("\"TODO\"").unwrap();
        assert_eq!(status, IssueStatus::Todo);
    }

    #[test]
    fn test_issue_type_serde_rename() {
        let json = serde_json::to_string(&IssueType::Subtask).unwrap();
        assert_eq!(json, "\"SUBTASK\"");
    }
}
