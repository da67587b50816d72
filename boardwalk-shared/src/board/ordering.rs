/// Board ordering engine
///
/// Maintains the position invariant within each (project, status) column:
/// positions are assigned append-at-count on create and on column change,
/// and rewritten to 0..n-1 by `reorder`. Columns are gap-tolerant — when an
/// issue leaves a column the remaining positions are not compacted, and read
/// paths sort by position rather than relying on absolute values. `reorder`
/// is the one operation that restores contiguity, for the column it rewrites.
///
/// Every mutation here runs inside a single transaction that first takes a
/// row lock on the project record. That lock is the serialization point for
/// all board writes in a project: concurrent reorders of the same column
/// queue up behind each other instead of interleaving, and a failed
/// validation rolls the whole transaction back with the column untouched.
///
/// # Example
///
/// ```no_run
/// use boardwalk_shared::board::ordering::{self, NewIssue};
/// use boardwalk_shared::models::issue::IssueStatus;
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, project_id: Uuid, reporter_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let issue = ordering::create_issue(&pool, NewIssue {
///     project_id,
///     reporter_id,
///     title: "Fix login redirect".to_string(),
///     ..NewIssue::new(project_id, reporter_id, "")
/// }).await?;
///
/// // Drag to the in-progress column
/// ordering::change_status(&pool, issue.id, IssueStatus::InProgress).await?;
/// # Ok(())
/// # }
/// ```
use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{constraint_of, DomainError, DomainResult};
use crate::models::issue::{Issue, IssuePriority, IssueStatus, IssueType, ISSUE_COLUMNS};

/// Input for creating a new top-level issue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewIssue {
    /// Project the issue belongs to
    pub project_id: Uuid,

    /// Creating user (becomes the immutable reporter)
    pub reporter_id: Uuid,

    /// Issue title
    pub title: String,

    /// Free-text description
    pub description: Option<String>,

    /// Issue type (defaults to Task)
    #[serde(rename = "type")]
    pub issue_type: Option<IssueType>,

    /// Priority (defaults to Medium)
    pub priority: Option<IssuePriority>,

    /// Initial assignee
    pub assignee_id: Option<Uuid>,

    /// Due timestamp
    pub due_date: Option<DateTime<Utc>>,

    /// Story-point estimate
    pub story_points: Option<f64>,

    /// Labels to attach; all must belong to the project
    #[serde(default)]
    pub label_ids: Vec<Uuid>,
}

impl NewIssue {
    /// Creates a minimal input with defaults for the optional fields
    pub fn new(project_id: Uuid, reporter_id: Uuid, title: &str) -> Self {
        Self {
            project_id,
            reporter_id,
            title: title.to_string(),
            description: None,
            issue_type: None,
            priority: None,
            assignee_id: None,
            due_date: None,
            story_points: None,
            label_ids: Vec::new(),
        }
    }
}

/// Creates an issue, appending it to the end of the project's TODO column
///
/// The new position is the current count of top-level issues in
/// (project, TODO). Labels are attached in the same transaction.
///
/// # Errors
///
/// - `DomainError::NotFound` when the project, reporter, assignee, or a
///   label does not resolve
pub async fn create_issue(pool: &PgPool, data: NewIssue) -> DomainResult<Issue> {
    let mut tx = pool.begin().await?;

    lock_project(&mut tx, data.project_id).await?;

    let position = column_count(&mut tx, data.project_id, IssueStatus::Todo).await?;

    let issue = sqlx::query_as::<_, Issue>(&format!(
        r#"
        INSERT INTO issues (project_id, reporter_id, assignee_id, title, description,
                            status, priority, issue_type, position, due_date, story_points)
        VALUES ($1, $2, $3, $4, $5, 'todo', $6, $7, $8, $9, $10)
        RETURNING {ISSUE_COLUMNS}
        "#
    ))
    .bind(data.project_id)
    .bind(data.reporter_id)
    .bind(data.assignee_id)
    .bind(&data.title)
    .bind(&data.description)
    .bind(data.priority.unwrap_or(IssuePriority::Medium))
    .bind(data.issue_type.unwrap_or(IssueType::Task))
    .bind(position)
    .bind(data.due_date)
    .bind(data.story_points)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| match constraint_of(&e) {
        Some(c) if c.contains("reporter_id") => DomainError::not_found("user", data.reporter_id),
        Some(c) if c.contains("assignee_id") => DomainError::NotFound("assignee".to_string()),
        _ => e.into(),
    })?;

    if !data.label_ids.is_empty() {
        attach_labels(&mut tx, &issue, &data.label_ids).await?;
    }

    tx.commit().await?;

    tracing::info!(
        issue_id = %issue.id,
        project_id = %issue.project_id,
        position = issue.position,
        "Issue created"
    );

    Ok(issue)
}

/// Moves an issue to another status column
///
/// Same-status calls are a no-op. Otherwise the issue is appended to the end
/// of the destination column (position = current count there); the vacated
/// column is left with a gap by design. Subtasks keep their sibling-scoped
/// position and only have their status updated.
///
/// # Errors
///
/// Returns `DomainError::NotFound` when the issue does not resolve.
pub async fn change_status(
    pool: &PgPool,
    issue_id: Uuid,
    new_status: IssueStatus,
) -> DomainResult<Issue> {
    let issue = Issue::find_by_id(pool, issue_id)
        .await?
        .ok_or_else(|| DomainError::not_found("issue", issue_id))?;

    if issue.status == new_status {
        return Ok(issue);
    }

    let mut tx = pool.begin().await?;

    lock_project(&mut tx, issue.project_id).await?;

    // Re-read under the project lock; a concurrent writer may have moved or
    // deleted the issue before we acquired it.
    let issue = sqlx::query_as::<_, Issue>(&format!(
        "SELECT {ISSUE_COLUMNS} FROM issues WHERE id = $1 FOR UPDATE"
    ))
    .bind(issue_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| DomainError::not_found("issue", issue_id))?;

    let old_status = issue.status;

    let updated = if issue.status == new_status {
        issue
    } else if issue.parent_id.is_some() {
        // Subtasks are positioned among siblings, not in board columns.
        sqlx::query_as::<_, Issue>(&format!(
            r#"
            UPDATE issues
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {ISSUE_COLUMNS}
            "#
        ))
        .bind(issue_id)
        .bind(new_status)
        .fetch_one(&mut *tx)
        .await?
    } else {
        let position = column_count(&mut tx, issue.project_id, new_status).await?;

        sqlx::query_as::<_, Issue>(&format!(
            r#"
            UPDATE issues
            SET status = $2, position = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {ISSUE_COLUMNS}
            "#
        ))
        .bind(issue_id)
        .bind(new_status)
        .bind(position)
        .fetch_one(&mut *tx)
        .await?
    };

    tx.commit().await?;

    tracing::info!(
        issue_id = %issue_id,
        from = old_status.as_str(),
        to = new_status.as_str(),
        "Issue status changed"
    );

    Ok(updated)
}

/// Applies a caller-supplied full ordering to one column
///
/// Every id in `ordered_ids` receives `status` and `position = index`. Ids
/// currently in other columns are accepted — that is how drag-and-drop
/// across columns arrives from the UI. The operation is atomic: either the
/// whole list is applied or the column is left exactly as it was.
///
/// # Errors
///
/// - `DomainError::NotFound` when the project does not resolve
/// - `DomainError::InvalidOperation` when the list contains duplicates, ids
///   outside the project's top-level issues, or omits an issue currently in
///   the column
pub async fn reorder(
    pool: &PgPool,
    project_id: Uuid,
    status: IssueStatus,
    ordered_ids: &[Uuid],
) -> DomainResult<Vec<Issue>> {
    let mut tx = pool.begin().await?;

    lock_project(&mut tx, project_id).await?;

    let rows: Vec<(Uuid, IssueStatus)> = sqlx::query_as(
        "SELECT id, status FROM issues WHERE project_id = $1 AND parent_id IS NULL",
    )
    .bind(project_id)
    .fetch_all(&mut *tx)
    .await?;

    let board: HashSet<Uuid> = rows.iter().map(|(id, _)| *id).collect();
    let column: HashSet<Uuid> = rows
        .iter()
        .filter(|(_, s)| *s == status)
        .map(|(id, _)| *id)
        .collect();

    validate_reorder(&column, &board, ordered_ids)?;

    for (index, issue_id) in ordered_ids.iter().enumerate() {
        sqlx::query(
            r#"
            UPDATE issues
            SET status = $2, position = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(issue_id)
        .bind(status)
        .bind(index as i32)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    tracing::info!(
        project_id = %project_id,
        status = status.as_str(),
        count = ordered_ids.len(),
        "Column reordered"
    );

    Issue::column(pool, project_id, status).await
}

/// Sets or clears the assignee; no ordering side effect
///
/// # Errors
///
/// Returns `DomainError::NotFound` when the issue or the assignee user does
/// not resolve.
pub async fn assign(
    pool: &PgPool,
    issue_id: Uuid,
    assignee_id: Option<Uuid>,
) -> DomainResult<Issue> {
    let issue = sqlx::query_as::<_, Issue>(&format!(
        r#"
        UPDATE issues
        SET assignee_id = $2, updated_at = NOW()
        WHERE id = $1
        RETURNING {ISSUE_COLUMNS}
        "#
    ))
    .bind(issue_id)
    .bind(assignee_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| match constraint_of(&e) {
        Some(c) if c.contains("assignee_id") => DomainError::NotFound("assignee".to_string()),
        _ => DomainError::from(e),
    })?
    .ok_or_else(|| DomainError::not_found("issue", issue_id))?;

    Ok(issue)
}

/// Takes the per-project write lock: a row lock on the project record.
///
/// All board writers acquire this first, which serializes position
/// assignment within a project while leaving other projects untouched.
async fn lock_project(tx: &mut Transaction<'_, Postgres>, project_id: Uuid) -> DomainResult<()> {
    let locked: Option<Uuid> = sqlx::query_scalar("SELECT id FROM projects WHERE id = $1 FOR UPDATE")
        .bind(project_id)
        .fetch_optional(&mut **tx)
        .await?;

    locked
        .map(|_| ())
        .ok_or_else(|| DomainError::not_found("project", project_id))
}

/// Counts top-level issues currently in a column (the next append position)
async fn column_count(
    tx: &mut Transaction<'_, Postgres>,
    project_id: Uuid,
    status: IssueStatus,
) -> DomainResult<i32> {
    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM issues WHERE project_id = $1 AND status = $2 AND parent_id IS NULL",
    )
    .bind(project_id)
    .bind(status)
    .fetch_one(&mut **tx)
    .await?;

    Ok(count as i32)
}

/// Attaches labels to an issue, verifying they belong to its project
async fn attach_labels(
    tx: &mut Transaction<'_, Postgres>,
    issue: &Issue,
    label_ids: &[Uuid],
) -> DomainResult<()> {
    let known: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM labels WHERE project_id = $1 AND id = ANY($2)",
    )
    .bind(issue.project_id)
    .bind(label_ids)
    .fetch_one(&mut **tx)
    .await?;

    if known as usize != label_ids.len() {
        return Err(DomainError::NotFound(
            "one or more labels not found in this project".to_string(),
        ));
    }

    for label_id in label_ids {
        sqlx::query("INSERT INTO issue_labels (issue_id, label_id) VALUES ($1, $2)")
            .bind(issue.id)
            .bind(label_id)
            .execute(&mut **tx)
            .await?;
    }

    Ok(())
}

/// Validates a reorder list against the current board state.
///
/// Rejects duplicates, ids that are not top-level issues of the project, and
/// lists that omit an issue currently in the target column. Ids arriving
/// from other columns are accepted (cross-column drag).
fn validate_reorder(
    column: &HashSet<Uuid>,
    board: &HashSet<Uuid>,
    requested: &[Uuid],
) -> DomainResult<()> {
    let mut seen = HashSet::with_capacity(requested.len());
    for id in requested {
        if !seen.insert(*id) {
            return Err(DomainError::InvalidOperation(format!(
                "issue {} appears more than once in the reorder list",
                id
            )));
        }
        if !board.contains(id) {
            return Err(DomainError::InvalidOperation(format!(
                "issue {} is not a board issue of this project",
                id
            )));
        }
    }

    for id in column {
        if !seen.contains(id) {
            return Err(DomainError::InvalidOperation(format!(
                "reorder list does not include issue {} currently in the column",
                id
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    #[test]
    fn test_validate_reorder_accepts_permutation() {
        let v = ids(3);
        let column: HashSet<Uuid> = v.iter().copied().collect();
        let board = column.clone();

        let requested = vec![v[2], v[0], v[1]];
        assert!(validate_reorder(&column, &board, &requested).is_ok());
    }

    #[test]
    fn test_validate_reorder_accepts_cross_column_drag() {
        let v = ids(3);
        let column: HashSet<Uuid> = v[..2].iter().copied().collect();
        let board: HashSet<Uuid> = v.iter().copied().collect();

        // v[2] lives in another column and is being dragged in
        let requested = vec![v[0], v[2], v[1]];
        assert!(validate_reorder(&column, &board, &requested).is_ok());
    }

    #[test]
    fn test_validate_reorder_rejects_duplicates() {
        let v = ids(2);
        let column: HashSet<Uuid> = v.iter().copied().collect();
        let board = column.clone();

        let requested = vec![v[0], v[1], v[0]];
        let err = validate_reorder(&column, &board, &requested).unwrap_err();
        assert!(matches!(err, DomainError::InvalidOperation(_)));
    }

    #[test]
    fn test_validate_reorder_rejects_foreign_id() {
        let v = ids(2);
        let column: HashSet<Uuid> = v.iter().copied().collect();
        let board = column.clone();

        let requested = vec![v[0], v[1], Uuid::new_v4()];
        let err = validate_reorder(&column, &board, &requested).unwrap_err();
        assert!(matches!(err, DomainError::InvalidOperation(_)));
    }

    #[test]
    fn test_validate_reorder_rejects_omitted_column_member() {
        let v = ids(3);
        let column: HashSet<Uuid> = v.iter().copied().collect();
        let board = column.clone();

        // v[2] is in the column but missing from the list
        let requested = vec![v[0], v[1]];
        let err = validate_reorder(&column, &board, &requested).unwrap_err();
        assert!(matches!(err, DomainError::InvalidOperation(_)));
    }

    #[test]
    fn test_validate_reorder_empty_column_empty_list() {
        let column = HashSet::new();
        let board = HashSet::new();
        assert!(validate_reorder(&column, &board, &[]).is_ok());
    }
}
