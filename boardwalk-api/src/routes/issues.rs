/// Issue board endpoints
///
/// The REST surface of the board engine: create, read, update, move,
/// reorder, subtasks, and delete. Every handler authorizes the caller
/// against the issue's project before touching state; status changes and
/// assignments additionally publish a fire-and-forget board event.
use crate::app::AppState;
use crate::error::{ApiError, ApiResult};
use crate::routes::projects::{authorize_for, load_project};
use crate::routes::{Page, PageParams};
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use boardwalk_shared::auth::identity::AuthUser;
use boardwalk_shared::auth::policy::Action;
use boardwalk_shared::board::{ordering, subtasks};
use boardwalk_shared::models::issue::{Issue, IssuePriority, IssueStatus, IssueType, UpdateIssue};
use boardwalk_shared::models::label::Label;
use boardwalk_shared::notify::BoardEvent;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

/// Issue response: the record plus labels and the subtask roll-up
#[derive(Debug, Serialize)]
pub struct IssueResponse {
    /// The issue record
    #[serde(flatten)]
    pub issue: Issue,

    /// Attached labels
    pub labels: Vec<Label>,

    /// Number of subtasks
    pub subtask_count: i64,

    /// Subtasks with a completed status
    pub completed_subtask_count: i64,

    /// Completion percentage over subtasks, 0.0 when there are none
    pub progress: f64,
}

impl IssueResponse {
    /// Assembles the response for one issue
    pub async fn load(pool: &PgPool, issue: Issue) -> ApiResult<Self> {
        let labels = Issue::labels_of(pool, issue.id).await?;
        let rollup = subtasks::rollup(pool, issue.id).await?;

        Ok(Self {
            issue,
            labels,
            subtask_count: rollup.total,
            completed_subtask_count: rollup.completed,
            progress: rollup.progress,
        })
    }

    /// Assembles responses for a batch of issues
    pub async fn load_all(pool: &PgPool, issues: Vec<Issue>) -> ApiResult<Vec<Self>> {
        let mut responses = Vec::with_capacity(issues.len());
        for issue in issues {
            responses.push(Self::load(pool, issue).await?);
        }
        Ok(responses)
    }
}

/// Loads an issue or fails with NotFound
async fn load_issue(state: &AppState, id: Uuid) -> Result<Issue, ApiError> {
    Issue::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("issue {}", id)))
}

/// Publishes a board event when the sink is configured
async fn notify(state: &AppState, event: BoardEvent) {
    if let Some(notifier) = &state.notifier {
        notifier.publish(event).await;
    }
}

/// Create issue request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateIssueRequest {
    /// Project the issue belongs to
    pub project_id: Uuid,

    /// Issue title
    #[validate(length(min = 1, max = 500))]
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
    #[validate(range(min = 0.0, max = 99.9))]
    pub story_points: Option<f64>,

    /// Labels to attach
    #[serde(default)]
    pub label_ids: Vec<Uuid>,
}

/// Create issue endpoint handler
///
/// The caller becomes the reporter; the issue is appended to the end of the
/// project's TODO column.
pub async fn create_issue(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(request): Json<CreateIssueRequest>,
) -> ApiResult<Json<IssueResponse>> {
    request.validate()?;

    let project = load_project(&state, request.project_id).await?;
    authorize_for(&state, project.id, auth.user_id, Action::CreateIssue).await?;

    tracing::info!(
        project_id = %project.id,
        user_id = %auth.user_id,
        title = %request.title,
        "Creating issue"
    );

    let issue = ordering::create_issue(
        &state.db,
        ordering::NewIssue {
            project_id: project.id,
            reporter_id: auth.user_id,
            title: request.title,
            description: request.description,
            issue_type: request.issue_type,
            priority: request.priority,
            assignee_id: request.assignee_id,
            due_date: request.due_date,
            story_points: request.story_points,
            label_ids: request.label_ids,
        },
    )
    .await?;

    Ok(Json(IssueResponse::load(&state.db, issue).await?))
}

/// Gets an issue by ID
pub async fn get_issue(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<IssueResponse>> {
    let issue = load_issue(&state, id).await?;
    authorize_for(&state, issue.project_id, auth.user_id, Action::ViewIssues).await?;

    Ok(Json(IssueResponse::load(&state.db, issue).await?))
}

/// Query parameters for the project issue listing
#[derive(Debug, Clone, Deserialize)]
pub struct IssueListParams {
    /// Zero-based page index
    pub page: Option<i64>,

    /// Page size
    pub per_page: Option<i64>,

    /// Filter by status column
    pub status: Option<IssueStatus>,

    /// Substring match on title or description
    pub search: Option<String>,
}

/// Lists issues of a project, paged, with optional status filter and search
pub async fn list_project_issues(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(project_id): Path<Uuid>,
    Query(params): Query<IssueListParams>,
) -> ApiResult<Json<Page<IssueResponse>>> {
    let project = load_project(&state, project_id).await?;
    authorize_for(&state, project.id, auth.user_id, Action::ViewIssues).await?;

    let paging = PageParams {
        page: params.page,
        per_page: params.per_page,
    };
    let (limit, offset) = paging.limit_offset();
    let search = params.search.as_deref();

    let issues =
        Issue::list_by_project(&state.db, project.id, params.status, search, limit, offset)
            .await?;
    let total = Issue::count_by_project(&state.db, project.id, params.status, search).await?;

    Ok(Json(Page {
        items: IssueResponse::load_all(&state.db, issues).await?,
        page: paging.page(),
        per_page: paging.per_page(),
        total,
    }))
}

/// Lists all board issues of a project ordered by position, for the kanban view
pub async fn kanban(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Vec<IssueResponse>>> {
    let project = load_project(&state, project_id).await?;
    authorize_for(&state, project.id, auth.user_id, Action::ViewIssues).await?;

    let issues = Issue::kanban(&state.db, project.id).await?;

    Ok(Json(IssueResponse::load_all(&state.db, issues).await?))
}

/// Update issue request; omitted fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateIssueRequest {
    /// New title
    #[validate(length(min = 1, max = 500))]
    pub title: Option<String>,

    /// New description
    pub description: Option<String>,

    /// New type
    #[serde(rename = "type")]
    pub issue_type: Option<IssueType>,

    /// New priority
    pub priority: Option<IssuePriority>,

    /// New status; moves the issue to the end of the destination column
    pub status: Option<IssueStatus>,

    /// New assignee
    pub assignee_id: Option<Uuid>,

    /// New due timestamp
    pub due_date: Option<DateTime<Utc>>,

    /// New story-point estimate
    #[validate(range(min = 0.0, max = 99.9))]
    pub story_points: Option<f64>,

    /// Replacement label set
    pub label_ids: Option<Vec<Uuid>>,
}

/// Updates issue fields
///
/// A status change in the body goes through the board engine, so the issue
/// lands at the end of the destination column like any other move.
pub async fn update_issue(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateIssueRequest>,
) -> ApiResult<Json<IssueResponse>> {
    request.validate()?;

    let issue = load_issue(&state, id).await?;
    authorize_for(&state, issue.project_id, auth.user_id, Action::UpdateIssue).await?;

    let mut updated = Issue::update(
        &state.db,
        issue.id,
        UpdateIssue {
            title: request.title,
            description: request.description,
            issue_type: request.issue_type,
            priority: request.priority,
            due_date: request.due_date,
            story_points: request.story_points,
        },
    )
    .await?;

    if let Some(label_ids) = &request.label_ids {
        Issue::set_labels(&state.db, &updated, label_ids).await?;
    }

    if let Some(assignee_id) = request.assignee_id {
        updated = ordering::assign(&state.db, updated.id, Some(assignee_id)).await?;
        notify(
            &state,
            BoardEvent::IssueAssigned {
                issue_id: updated.id,
                project_id: updated.project_id,
                assignee_id: updated.assignee_id,
            },
        )
        .await;
    }

    if let Some(status) = request.status {
        let from = updated.status;
        updated = ordering::change_status(&state.db, updated.id, status).await?;
        if from != updated.status {
            notify(
                &state,
                BoardEvent::IssueStatusChanged {
                    issue_id: updated.id,
                    project_id: updated.project_id,
                    from,
                    to: updated.status,
                },
            )
            .await;
        }
    }

    Ok(Json(IssueResponse::load(&state.db, updated).await?))
}

/// Update status request
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusRequest {
    /// Destination column
    pub status: IssueStatus,
}

/// Moves an issue to another status column
///
/// The issue is appended to the end of the destination column; a same-status
/// call is a no-op.
pub async fn update_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> ApiResult<Json<IssueResponse>> {
    let issue = load_issue(&state, id).await?;
    authorize_for(&state, issue.project_id, auth.user_id, Action::ChangeStatus).await?;

    let from = issue.status;
    let updated = ordering::change_status(&state.db, issue.id, request.status).await?;

    if from != updated.status {
        notify(
            &state,
            BoardEvent::IssueStatusChanged {
                issue_id: updated.id,
                project_id: updated.project_id,
                from,
                to: updated.status,
            },
        )
        .await;
    }

    Ok(Json(IssueResponse::load(&state.db, updated).await?))
}

/// Assign issue request; a null assignee unassigns
#[derive(Debug, Clone, Deserialize)]
pub struct AssignIssueRequest {
    /// New assignee, or None to unassign
    pub assignee_id: Option<Uuid>,
}

/// Sets or clears the assignee; no ordering side effect
pub async fn assign_issue(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<AssignIssueRequest>,
) -> ApiResult<Json<IssueResponse>> {
    let issue = load_issue(&state, id).await?;
    authorize_for(&state, issue.project_id, auth.user_id, Action::AssignIssue).await?;

    let updated = ordering::assign(&state.db, issue.id, request.assignee_id).await?;

    notify(
        &state,
        BoardEvent::IssueAssigned {
            issue_id: updated.id,
            project_id: updated.project_id,
            assignee_id: updated.assignee_id,
        },
    )
    .await;

    Ok(Json(IssueResponse::load(&state.db, updated).await?))
}

/// Reorder request: the full ordering for one column
#[derive(Debug, Clone, Deserialize)]
pub struct ReorderRequest {
    /// Target column
    pub status: IssueStatus,

    /// Full id list of the column after the drag; ids from other columns
    /// are moved in
    pub issue_ids: Vec<Uuid>,
}

/// Applies a caller-supplied full ordering to one column
///
/// Atomic: either every listed issue receives its new position and status,
/// or the column is left unchanged and the request fails.
pub async fn reorder_issues(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(project_id): Path<Uuid>,
    Json(request): Json<ReorderRequest>,
) -> ApiResult<Json<Vec<Issue>>> {
    let project = load_project(&state, project_id).await?;
    authorize_for(&state, project.id, auth.user_id, Action::ReorderIssues).await?;

    let column =
        ordering::reorder(&state.db, project.id, request.status, &request.issue_ids).await?;

    Ok(Json(column))
}

/// Create subtask request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSubtaskRequest {
    /// Subtask title
    #[validate(length(min = 1, max = 500))]
    pub title: String,

    /// Free-text description
    pub description: Option<String>,

    /// Initial assignee
    pub assignee_id: Option<Uuid>,
}

/// Creates a subtask under a parent issue
pub async fn create_subtask(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<CreateSubtaskRequest>,
) -> ApiResult<Json<IssueResponse>> {
    request.validate()?;

    let parent = load_issue(&state, id).await?;
    authorize_for(&state, parent.project_id, auth.user_id, Action::CreateSubtask).await?;

    let subtask = subtasks::create_subtask(
        &state.db,
        subtasks::NewSubtask {
            parent_id: parent.id,
            title: request.title,
            description: request.description,
            assignee_id: request.assignee_id,
        },
    )
    .await?;

    Ok(Json(IssueResponse::load(&state.db, subtask).await?))
}

/// Lists the subtasks of an issue, ordered by sibling position
pub async fn list_subtasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<Issue>>> {
    let parent = load_issue(&state, id).await?;
    authorize_for(&state, parent.project_id, auth.user_id, Action::ViewIssues).await?;

    let children = subtasks::list(&state.db, parent.id).await?;

    Ok(Json(children))
}

/// Deletes an issue and its subtasks
///
/// Allowed for the issue's reporter, or for admins and the owner.
pub async fn delete_issue(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let issue = load_issue(&state, id).await?;

    authorize_for(
        &state,
        issue.project_id,
        auth.user_id,
        Action::DeleteIssue {
            caller_is_reporter: issue.reporter_id == auth.user_id,
        },
    )
    .await?;

    subtasks::delete_issue(&state.db, issue.id).await?;

    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// Lists issues assigned to the caller, newest first
pub async fn list_assigned(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<Vec<Issue>>> {
    let (limit, offset) = params.limit_offset();
    let issues = Issue::list_by_assignee(&state.db, auth.user_id, limit, offset).await?;

    Ok(Json(issues))
}

/// Lists issues reported by the caller, newest first
pub async fn list_reported(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<Vec<Issue>>> {
    let (limit, offset) = params.limit_offset();
    let issues = Issue::list_by_reporter(&state.db, auth.user_id, limit, offset).await?;

    Ok(Json(issues))
}

/// Query parameters for the due-soon listing
#[derive(Debug, Clone, Deserialize)]
pub struct DueSoonParams {
    /// Horizon in days (default 7)
    pub days: Option<i64>,
}

/// Lists the caller's open assigned issues due within the horizon
pub async fn list_due_soon(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Query(params): Query<DueSoonParams>,
) -> ApiResult<Json<Vec<Issue>>> {
    let days = params.days.unwrap_or(7).clamp(0, 365);
    let deadline = Utc::now() + Duration::days(days);

    let issues = Issue::due_before(&state.db, auth.user_id, deadline).await?;

    Ok(Json(issues))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_issue_request_validation() {
        let valid = CreateIssueRequest {
            project_id: Uuid::new_v4(),
            title: "Fix login redirect".to_string(),
            description: None,
            issue_type: None,
            priority: None,
            assignee_id: None,
            due_date: None,
            story_points: Some(3.0),
            label_ids: vec![],
        };
        assert!(valid.validate().is_ok());

        let empty_title = CreateIssueRequest {
            title: "".to_string(),
            ..valid.clone()
        };
        assert!(empty_title.validate().is_err());

        let long_title = CreateIssueRequest {
            title: "a".repeat(501),
            ..valid.clone()
        };
        assert!(long_title.validate().is_err());

        let negative_points = CreateIssueRequest {
            story_points: Some(-1.0),
            ..valid
        };
        assert!(negative_points.validate().is_err());
    }

    #[test]
    fn test_update_issue_request_empty_is_valid() {
        let request = UpdateIssueRequest::default();
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_reorder_request_deserialization() {
        let json = r#"{"status": "IN_PROGRESS", "issue_ids": []}"#;
        let request: ReorderRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.status, IssueStatus::InProgress);
        assert!(request.issue_ids.is_empty());
    }
}
