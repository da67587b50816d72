/// Integration tests for project lifecycle
///
/// These tests require a running PostgreSQL database.
/// Run with: cargo test --test project_tests
mod common;

use boardwalk_shared::board::ordering;
use boardwalk_shared::error::DomainError;
use boardwalk_shared::models::issue::Issue;
use boardwalk_shared::models::project::{CreateProject, Project, ProjectStatus, UpdateProject};
use common::{create_project, create_user, random_key, setup_pool};

#[tokio::test]
async fn test_create_stores_upper_cased_key() {
    let pool = setup_pool().await;
    let owner = create_user(&pool).await;
    let key = random_key();

    let project = Project::create_with_owner(
        &pool,
        CreateProject {
            name: "Lowercase key".to_string(),
            key: key.to_lowercase(),
            description: None,
            owner_id: owner.id,
            is_public: false,
            start_date: None,
            end_date: None,
        },
    )
    .await
    .unwrap();

    assert_eq!(project.key, key.to_uppercase());
    assert_eq!(project.status, ProjectStatus::Active);
    assert_eq!(project.owner_id, owner.id);
}

#[tokio::test]
async fn test_duplicate_key_conflicts_case_insensitively_and_leaves_nothing() {
    let pool = setup_pool().await;
    let first_owner = create_user(&pool).await;
    let second_owner = create_user(&pool).await;
    let key = random_key();

    Project::create_with_owner(
        &pool,
        CreateProject {
            name: "First".to_string(),
            key: key.clone(),
            description: None,
            owner_id: first_owner.id,
            is_public: false,
            start_date: None,
            end_date: None,
        },
    )
    .await
    .unwrap();

    let result = Project::create_with_owner(
        &pool,
        CreateProject {
            name: "Second".to_string(),
            key: key.to_lowercase(),
            description: None,
            owner_id: second_owner.id,
            is_public: false,
            start_date: None,
            end_date: None,
        },
    )
    .await;

    assert!(matches!(result, Err(DomainError::Conflict(_))));

    // Neither a second project nor an orphan membership is visible
    let projects = Project::list_for_user(&pool, second_owner.id, None, 10, 0)
        .await
        .unwrap();
    assert!(projects.is_empty());
}

#[tokio::test]
async fn test_find_by_key_is_case_insensitive() {
    let pool = setup_pool().await;
    let owner = create_user(&pool).await;
    let project = create_project(&pool, &owner).await;

    let found = Project::find_by_key(&pool, &project.key.to_lowercase())
        .await
        .unwrap();
    assert_eq!(found.map(|p| p.id), Some(project.id));
}

#[tokio::test]
async fn test_archive_and_delete_are_status_changes_only() {
    let pool = setup_pool().await;
    let owner = create_user(&pool).await;
    let project = create_project(&pool, &owner).await;

    let issue = ordering::create_issue(
        &pool,
        ordering::NewIssue::new(project.id, owner.id, "survives"),
    )
    .await
    .unwrap();

    let archived = Project::archive(&pool, project.id).await.unwrap();
    assert_eq!(archived.status, ProjectStatus::Archived);

    let deleted = Project::soft_delete(&pool, project.id).await.unwrap();
    assert_eq!(deleted.status, ProjectStatus::Deleted);

    // No cascade: the issue is still there
    assert!(Issue::find_by_id(&pool, issue.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_update_changes_fields_but_not_key() {
    let pool = setup_pool().await;
    let owner = create_user(&pool).await;
    let project = create_project(&pool, &owner).await;

    let updated = Project::update(
        &pool,
        project.id,
        UpdateProject {
            name: Some("Renamed".to_string()),
            description: Some("now with a description".to_string()),
            is_public: Some(true),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(updated.name, "Renamed");
    assert_eq!(updated.key, project.key);
    assert!(updated.is_public);
}

#[tokio::test]
async fn test_archived_projects_leave_user_listing() {
    let pool = setup_pool().await;
    let owner = create_user(&pool).await;
    let project = create_project(&pool, &owner).await;

    let before = Project::list_for_user(&pool, owner.id, None, 10, 0).await.unwrap();
    assert!(before.iter().any(|p| p.id == project.id));

    Project::archive(&pool, project.id).await.unwrap();

    let after = Project::list_for_user(&pool, owner.id, None, 10, 0).await.unwrap();
    assert!(!after.iter().any(|p| p.id == project.id));
}

#[tokio::test]
async fn test_search_matches_name_substring() {
    let pool = setup_pool().await;
    let owner = create_user(&pool).await;
    let needle = format!("Needle-{}", random_key());

    Project::create_with_owner(
        &pool,
        CreateProject {
            name: needle.clone(),
            key: random_key(),
            description: None,
            owner_id: owner.id,
            is_public: false,
            start_date: None,
            end_date: None,
        },
    )
    .await
    .unwrap();

    let hits = Project::list_for_user(&pool, owner.id, Some(&needle.to_lowercase()), 10, 0)
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name, needle);

    let misses = Project::list_for_user(&pool, owner.id, Some("no-such-project"), 10, 0)
        .await
        .unwrap();
    assert!(misses.is_empty());
}
