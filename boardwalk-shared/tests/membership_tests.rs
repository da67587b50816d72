/// Integration tests for the membership directory
///
/// These tests require a running PostgreSQL database.
/// Run with: cargo test --test membership_tests
mod common;

use boardwalk_shared::error::DomainError;
use boardwalk_shared::models::membership::{MemberRole, Membership};
use common::{create_project, create_user, setup_pool};

#[tokio::test]
async fn test_owner_membership_created_with_project() {
    let pool = setup_pool().await;
    let owner = create_user(&pool).await;
    let project = create_project(&pool, &owner).await;

    let role = Membership::role_of(&pool, project.id, owner.id).await.unwrap();
    assert_eq!(role, Some(MemberRole::Owner));
    assert!(Membership::is_member(&pool, project.id, owner.id).await.unwrap());
}

#[tokio::test]
async fn test_add_and_remove_developer() {
    let pool = setup_pool().await;
    let owner = create_user(&pool).await;
    let dev = create_user(&pool).await;
    let project = create_project(&pool, &owner).await;

    Membership::add(&pool, project.id, dev.id, MemberRole::Developer)
        .await
        .unwrap();
    assert!(Membership::is_member(&pool, project.id, dev.id).await.unwrap());

    Membership::remove(&pool, project.id, dev.id).await.unwrap();
    assert!(!Membership::is_member(&pool, project.id, dev.id).await.unwrap());
    assert_eq!(
        Membership::role_of(&pool, project.id, dev.id).await.unwrap(),
        None
    );
}

#[tokio::test]
async fn test_remove_owner_always_fails() {
    let pool = setup_pool().await;
    let owner = create_user(&pool).await;
    let project = create_project(&pool, &owner).await;

    let result = Membership::remove(&pool, project.id, owner.id).await;
    assert!(matches!(result, Err(DomainError::InvalidOperation(_))));

    // The owner is still there
    assert!(Membership::is_member(&pool, project.id, owner.id).await.unwrap());
}

#[tokio::test]
async fn test_add_duplicate_membership_conflicts() {
    let pool = setup_pool().await;
    let owner = create_user(&pool).await;
    let dev = create_user(&pool).await;
    let project = create_project(&pool, &owner).await;

    Membership::add(&pool, project.id, dev.id, MemberRole::Developer)
        .await
        .unwrap();

    let result = Membership::add(&pool, project.id, dev.id, MemberRole::Viewer).await;
    assert!(matches!(result, Err(DomainError::Conflict(_))));

    // The original role is untouched
    assert_eq!(
        Membership::role_of(&pool, project.id, dev.id).await.unwrap(),
        Some(MemberRole::Developer)
    );
}

#[tokio::test]
async fn test_add_with_owner_role_rejected() {
    let pool = setup_pool().await;
    let owner = create_user(&pool).await;
    let other = create_user(&pool).await;
    let project = create_project(&pool, &owner).await;

    let result = Membership::add(&pool, project.id, other.id, MemberRole::Owner).await;
    assert!(matches!(result, Err(DomainError::InvalidOperation(_))));
}

#[tokio::test]
async fn test_set_role_on_owner_fails() {
    let pool = setup_pool().await;
    let owner = create_user(&pool).await;
    let project = create_project(&pool, &owner).await;

    let result = Membership::set_role(&pool, project.id, owner.id, MemberRole::Admin).await;
    assert!(matches!(result, Err(DomainError::InvalidOperation(_))));
}

#[tokio::test]
async fn test_promote_to_owner_fails() {
    let pool = setup_pool().await;
    let owner = create_user(&pool).await;
    let dev = create_user(&pool).await;
    let project = create_project(&pool, &owner).await;

    Membership::add(&pool, project.id, dev.id, MemberRole::Developer)
        .await
        .unwrap();

    let result = Membership::set_role(&pool, project.id, dev.id, MemberRole::Owner).await;
    assert!(matches!(result, Err(DomainError::InvalidOperation(_))));
}

#[tokio::test]
async fn test_set_role_developer_to_admin() {
    let pool = setup_pool().await;
    let owner = create_user(&pool).await;
    let dev = create_user(&pool).await;
    let project = create_project(&pool, &owner).await;

    Membership::add(&pool, project.id, dev.id, MemberRole::Developer)
        .await
        .unwrap();

    let updated = Membership::set_role(&pool, project.id, dev.id, MemberRole::Admin)
        .await
        .unwrap();
    assert_eq!(updated.role, MemberRole::Admin);
}

#[tokio::test]
async fn test_remove_unknown_membership() {
    let pool = setup_pool().await;
    let owner = create_user(&pool).await;
    let stranger = create_user(&pool).await;
    let project = create_project(&pool, &owner).await;

    let result = Membership::remove(&pool, project.id, stranger.id).await;
    assert!(matches!(result, Err(DomainError::NotFound(_))));
}

#[tokio::test]
async fn test_list_by_project_includes_user_details() {
    let pool = setup_pool().await;
    let owner = create_user(&pool).await;
    let dev = create_user(&pool).await;
    let project = create_project(&pool, &owner).await;

    Membership::add(&pool, project.id, dev.id, MemberRole::Viewer)
        .await
        .unwrap();

    let members = Membership::list_by_project(&pool, project.id).await.unwrap();
    assert_eq!(members.len(), 2);
    assert_eq!(members[0].user_id, owner.id);
    assert_eq!(members[0].role, MemberRole::Owner);
    assert_eq!(members[1].user_id, dev.id);
    assert_eq!(members[1].email, dev.email);
}
