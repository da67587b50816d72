/// Subtask aggregation and hierarchy rules
///
/// Subtasks are issues of type SUBTASK hanging one level below a parent:
/// they inherit project, reporter, and priority from the parent, start in
/// TODO, and are positioned within the set of their siblings — a position
/// space independent of the board columns. The parent's progress is rolled
/// up from child statuses, where DONE and CLOSED count as completed.
///
/// # Example
///
/// ```no_run
/// use boardwalk_shared::board::subtasks::{self, NewSubtask};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, parent_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// subtasks::create_subtask(&pool, NewSubtask {
///     parent_id,
///     title: "Write migration".to_string(),
///     description: None,
///     assignee_id: None,
/// }).await?;
///
/// let rollup = subtasks::rollup(&pool, parent_id).await?;
/// println!("{}% done", rollup.progress);
/// # Ok(())
/// # }
/// ```
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{constraint_of, DomainError, DomainResult};
use crate::models::issue::{Issue, IssueStatus, ISSUE_COLUMNS};

/// Input for creating a subtask under a parent issue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSubtask {
    /// Parent issue; must not itself be a subtask
    pub parent_id: Uuid,

    /// Subtask title
    pub title: String,

    /// Free-text description
    pub description: Option<String>,

    /// Initial assignee
    pub assignee_id: Option<Uuid>,
}

/// Parent-level aggregate over child issue statuses
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SubtaskRollup {
    /// Number of children
    pub total: i64,

    /// Children with a completed status (DONE or CLOSED)
    pub completed: i64,

    /// Completion percentage, 0.0 when there are no children
    pub progress: f64,
}

/// Creates a subtask at the end of the parent's child list
///
/// Project, reporter, and priority are inherited from the parent; the
/// subtask starts in TODO at position = current child count.
///
/// # Errors
///
/// - `DomainError::NotFound` when the parent or assignee does not resolve
/// - `DomainError::InvalidOperation` when the parent is itself a subtask
///   (the hierarchy is one level deep)
pub async fn create_subtask(pool: &PgPool, data: NewSubtask) -> DomainResult<Issue> {
    let mut tx = pool.begin().await?;

    // The parent row lock serializes sibling position assignment.
    let parent = sqlx::query_as::<_, Issue>(&format!(
        "SELECT {ISSUE_COLUMNS} FROM issues WHERE id = $1 FOR UPDATE"
    ))
    .bind(data.parent_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| DomainError::not_found("issue", data.parent_id))?;

    if parent.parent_id.is_some() {
        return Err(DomainError::InvalidOperation(
            "subtasks cannot be nested".to_string(),
        ));
    }

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM issues WHERE parent_id = $1")
        .bind(parent.id)
        .fetch_one(&mut *tx)
        .await?;

    let subtask = sqlx::query_as::<_, Issue>(&format!(
        r#"
        INSERT INTO issues (project_id, reporter_id, assignee_id, parent_id, title,
                            description, status, priority, issue_type, position)
        VALUES ($1, $2, $3, $4, $5, $6, 'todo', $7, 'subtask', $8)
        RETURNING {ISSUE_COLUMNS}
        "#
    ))
    .bind(parent.project_id)
    .bind(parent.reporter_id)
    .bind(data.assignee_id)
    .bind(parent.id)
    .bind(&data.title)
    .bind(&data.description)
    .bind(parent.priority)
    .bind(count as i32)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| match constraint_of(&e) {
        Some(c) if c.contains("assignee_id") => DomainError::NotFound("assignee".to_string()),
        _ => e.into(),
    })?;

    tx.commit().await?;

    tracing::info!(
        issue_id = %subtask.id,
        parent_id = %parent.id,
        position = subtask.position,
        "Subtask created"
    );

    Ok(subtask)
}

/// Lists the children of a parent issue, ordered by sibling position
///
/// # Errors
///
/// Returns `DomainError::NotFound` when the parent does not resolve.
pub async fn list(pool: &PgPool, parent_id: Uuid) -> DomainResult<Vec<Issue>> {
    let parent = Issue::find_by_id(pool, parent_id)
        .await?
        .ok_or_else(|| DomainError::not_found("issue", parent_id))?;

    Issue::subtasks_of(pool, parent.id).await
}

/// Counts the completed statuses in a child set
pub fn completed_count(statuses: &[IssueStatus]) -> usize {
    statuses.iter().filter(|s| s.is_completed()).count()
}

/// Completion percentage for a child set: 0.0 when empty, else
/// 100 * completed / total
pub fn progress(statuses: &[IssueStatus]) -> f64 {
    percent(completed_count(statuses) as i64, statuses.len() as i64)
}

fn percent(completed: i64, total: i64) -> f64 {
    if total == 0 {
        0.0
    } else {
        completed as f64 / total as f64 * 100.0
    }
}

/// Computes the roll-up for a parent from the store
///
/// Does not fail on unknown ids: a parent with no children (or no such row)
/// simply rolls up to zero. Callers that need existence checks resolve the
/// parent first.
pub async fn rollup(pool: &PgPool, parent_id: Uuid) -> DomainResult<SubtaskRollup> {
    let (total, completed): (i64, i64) = sqlx::query_as(
        r#"
        SELECT COUNT(*),
               COUNT(*) FILTER (WHERE status IN ('done', 'closed'))
        FROM issues
        WHERE parent_id = $1
        "#,
    )
    .bind(parent_id)
    .fetch_one(pool)
    .await?;

    Ok(SubtaskRollup {
        total,
        completed,
        progress: percent(completed, total),
    })
}

/// Deletes an issue, cascading to its subtasks first
///
/// Children are removed before the parent in one transaction. No column
/// renumbering is performed afterwards — vacated positions stay as gaps,
/// consistent with the rest of the board.
///
/// # Errors
///
/// Returns `DomainError::NotFound` when the issue does not resolve.
pub async fn delete_issue(pool: &PgPool, issue_id: Uuid) -> DomainResult<()> {
    let mut tx = pool.begin().await?;

    let existing: Option<Uuid> =
        sqlx::query_scalar("SELECT id FROM issues WHERE id = $1 FOR UPDATE")
            .bind(issue_id)
            .fetch_optional(&mut *tx)
            .await?;

    if existing.is_none() {
        return Err(DomainError::not_found("issue", issue_id));
    }

    let children = sqlx::query("DELETE FROM issues WHERE parent_id = $1")
        .bind(issue_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM issues WHERE id = $1")
        .bind(issue_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(
        issue_id = %issue_id,
        subtasks_deleted = children.rows_affected(),
        "Issue deleted"
    );

    Ok(())
}
