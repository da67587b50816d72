/// Project endpoints: lifecycle, membership directory, labels
///
/// Every handler resolves the caller from request extensions, loads the
/// project, and passes the caller's role through the access policy before
/// touching state. Policy denials surface as 403 and are never downgraded.
use crate::app::AppState;
use crate::error::{ApiError, ApiResult};
use crate::routes::{Page, PageParams};
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use boardwalk_shared::auth::identity::AuthUser;
use boardwalk_shared::auth::policy::{self, Action};
use boardwalk_shared::models::label::{CreateLabel, Label};
use boardwalk_shared::models::membership::{MemberInfo, MemberRole, Membership};
use boardwalk_shared::models::project::{CreateProject, Project, UpdateProject};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Loads a project or fails with NotFound
pub(crate) async fn load_project(state: &AppState, id: Uuid) -> Result<Project, ApiError> {
    Project::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("project {}", id)))
}

/// Looks up the caller's role and runs the action through the access policy
pub(crate) async fn authorize_for(
    state: &AppState,
    project_id: Uuid,
    user_id: Uuid,
    action: Action,
) -> Result<Option<MemberRole>, ApiError> {
    let role = Membership::role_of(&state.db, project_id, user_id).await?;
    policy::authorize(action, role)?;
    Ok(role)
}

/// Create project request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProjectRequest {
    /// Project name
    #[validate(length(min = 1, max = 255))]
    pub name: String,

    /// Short unique key, e.g. "BW"
    #[validate(length(min = 1, max = 10))]
    pub key: String,

    /// Free-text description
    pub description: Option<String>,

    /// Public visibility flag
    #[serde(default)]
    pub is_public: bool,

    /// Planned start date
    pub start_date: Option<NaiveDate>,

    /// Planned end date
    pub end_date: Option<NaiveDate>,
}

/// Create project endpoint handler
///
/// Creates the project and grants the caller the OWNER membership in one
/// atomic step.
pub async fn create_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(request): Json<CreateProjectRequest>,
) -> ApiResult<Json<Project>> {
    request.validate()?;

    tracing::info!(user_id = %auth.user_id, key = %request.key, "Creating project");

    let project = Project::create_with_owner(
        &state.db,
        CreateProject {
            name: request.name,
            key: request.key,
            description: request.description,
            owner_id: auth.user_id,
            is_public: request.is_public,
            start_date: request.start_date,
            end_date: request.end_date,
        },
    )
    .await?;

    Ok(Json(project))
}

/// Query parameters for the caller's project listing
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectListParams {
    /// Zero-based page index
    pub page: Option<i64>,

    /// Page size
    pub per_page: Option<i64>,

    /// Substring match on name or key
    pub search: Option<String>,
}

/// Lists active projects the caller is a member of
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Query(params): Query<ProjectListParams>,
) -> ApiResult<Json<Page<Project>>> {
    let paging = PageParams {
        page: params.page,
        per_page: params.per_page,
    };
    let (limit, offset) = paging.limit_offset();
    let search = params.search.as_deref();

    let items = Project::list_for_user(&state.db, auth.user_id, search, limit, offset).await?;
    let total = Project::count_for_user(&state.db, auth.user_id, search).await?;

    Ok(Json(Page {
        items,
        page: paging.page(),
        per_page: paging.per_page(),
        total,
    }))
}

/// Lists public projects
pub async fn list_public_projects(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<Page<Project>>> {
    let (limit, offset) = params.limit_offset();

    let items = Project::list_public(&state.db, limit, offset).await?;
    let total = Project::count_public(&state.db).await?;

    Ok(Json(Page {
        items,
        page: params.page(),
        per_page: params.per_page(),
        total,
    }))
}

/// Gets a project by ID
///
/// Public projects are readable by any authenticated caller; private ones
/// require membership.
pub async fn get_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Project>> {
    let project = load_project(&state, id).await?;

    authorize_for(
        &state,
        project.id,
        auth.user_id,
        Action::ViewProject {
            public_project: project.is_public,
        },
    )
    .await?;

    Ok(Json(project))
}

/// Update project request; omitted fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProjectRequest {
    /// New name
    #[validate(length(min = 1, max = 255))]
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

/// Updates project fields (admin or owner)
pub async fn update_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateProjectRequest>,
) -> ApiResult<Json<Project>> {
    request.validate()?;

    let project = load_project(&state, id).await?;
    authorize_for(&state, project.id, auth.user_id, Action::UpdateProject).await?;

    let updated = Project::update(
        &state.db,
        project.id,
        UpdateProject {
            name: request.name,
            description: request.description,
            start_date: request.start_date,
            end_date: request.end_date,
            is_public: request.is_public,
        },
    )
    .await?;

    Ok(Json(updated))
}

/// Archives a project (admin or owner); status change only
pub async fn archive_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Project>> {
    let project = load_project(&state, id).await?;
    authorize_for(&state, project.id, auth.user_id, Action::ArchiveProject).await?;

    let archived = Project::archive(&state.db, project.id).await?;

    Ok(Json(archived))
}

/// Soft-deletes a project (owner only); status change only
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Project>> {
    let project = load_project(&state, id).await?;
    authorize_for(&state, project.id, auth.user_id, Action::DeleteProject).await?;

    let deleted = Project::soft_delete(&state.db, project.id).await?;

    Ok(Json(deleted))
}

/// Add member request
#[derive(Debug, Clone, Deserialize)]
pub struct AddMemberRequest {
    /// User to add
    pub user_id: Uuid,

    /// Role to grant (OWNER is rejected)
    pub role: MemberRole,
}

/// Adds a member to the project (admin or owner)
pub async fn add_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<AddMemberRequest>,
) -> ApiResult<Json<Membership>> {
    let project = load_project(&state, id).await?;
    authorize_for(&state, project.id, auth.user_id, Action::ManageMembers).await?;

    let membership =
        Membership::add(&state.db, project.id, request.user_id, request.role).await?;

    tracing::info!(
        project_id = %project.id,
        user_id = %request.user_id,
        role = request.role.as_str(),
        "Member added"
    );

    Ok(Json(membership))
}

/// Lists project members with user details
pub async fn list_members(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<MemberInfo>>> {
    let project = load_project(&state, id).await?;

    authorize_for(
        &state,
        project.id,
        auth.user_id,
        Action::ViewProject {
            public_project: project.is_public,
        },
    )
    .await?;

    let members = Membership::list_by_project(&state.db, project.id).await?;

    Ok(Json(members))
}

/// Removes a member (admin or owner; the project owner cannot be removed)
pub async fn remove_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<serde_json::Value>> {
    let project = load_project(&state, id).await?;
    authorize_for(&state, project.id, auth.user_id, Action::ManageMembers).await?;

    Membership::remove(&state.db, project.id, user_id).await?;

    tracing::info!(project_id = %project.id, user_id = %user_id, "Member removed");

    Ok(Json(serde_json::json!({ "removed": true })))
}

/// Update member role request
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateMemberRoleRequest {
    /// New role (OWNER is rejected)
    pub role: MemberRole,
}

/// Changes a member's role (admin or owner; the owner cannot be demoted)
pub async fn update_member_role(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<UpdateMemberRoleRequest>,
) -> ApiResult<Json<Membership>> {
    let project = load_project(&state, id).await?;
    authorize_for(&state, project.id, auth.user_id, Action::ManageMembers).await?;

    let membership = Membership::set_role(&state.db, project.id, user_id, request.role).await?;

    Ok(Json(membership))
}

/// Create label request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateLabelRequest {
    /// Label name
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    /// Display color, e.g. "#ff5500"
    #[validate(length(max = 7))]
    pub color: Option<String>,
}

/// Creates a label in the project (admin or owner)
pub async fn create_label(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<CreateLabelRequest>,
) -> ApiResult<Json<Label>> {
    request.validate()?;

    let project = load_project(&state, id).await?;
    authorize_for(&state, project.id, auth.user_id, Action::ManageMembers).await?;

    let label = Label::create(
        &state.db,
        CreateLabel {
            project_id: project.id,
            name: request.name,
            color: request.color,
        },
    )
    .await?;

    Ok(Json(label))
}

/// Lists labels of the project
pub async fn list_labels(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<Label>>> {
    let project = load_project(&state, id).await?;

    authorize_for(
        &state,
        project.id,
        auth.user_id,
        Action::ViewProject {
            public_project: project.is_public,
        },
    )
    .await?;

    let labels = Label::list_by_project(&state.db, project.id).await?;

    Ok(Json(labels))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_project_request_validation() {
        let valid = CreateProjectRequest {
            name: "Boardwalk".to_string(),
            key: "BW".to_string(),
            description: None,
            is_public: false,
            start_date: None,
            end_date: None,
        };
        assert!(valid.validate().is_ok());

        let empty_name = CreateProjectRequest {
            name: "".to_string(),
            key: "BW".to_string(),
            description: None,
            is_public: false,
            start_date: None,
            end_date: None,
        };
        assert!(empty_name.validate().is_err());

        let long_key = CreateProjectRequest {
            name: "Boardwalk".to_string(),
            key: "TOOLONGKEYX".to_string(),
            description: None,
            is_public: false,
            start_date: None,
            end_date: None,
        };
        assert!(long_key.validate().is_err());
    }

    #[test]
    fn test_update_project_request_optional_name_validated() {
        let request = UpdateProjectRequest {
            name: Some("".to_string()),
            ..Default::default()
        };
        assert!(request.validate().is_err());

        let request = UpdateProjectRequest::default();
        assert!(request.validate().is_ok());
    }
}
