/// Access policy: the pure decision function
///
/// Maps (requested action, caller's role, ownership facts) to allow/deny.
/// Deny is the default: every arm that allows an action names the roles it
/// allows, and anything else falls through to a `PolicyError`.
///
/// # Decision table
///
/// | Action | Requirement |
/// |---|---|
/// | View public project | any authenticated caller |
/// | View private project, read/list issues | membership (any role) |
/// | Create/update/assign issue, change status, reorder, create subtask | membership (any role) |
/// | Delete issue | reporter, or role ∈ {OWNER, ADMIN} |
/// | Update project, manage members, archive project | role ∈ {OWNER, ADMIN} |
/// | Delete project | role = OWNER |
///
/// Promotion to OWNER and operations on the OWNER membership are rejected
/// in the membership directory itself (`InvalidOperation`); this table only
/// decides who may attempt membership changes at all.
///
/// # Example
///
/// ```
/// use boardwalk_shared::auth::policy::{authorize, Action};
/// use boardwalk_shared::models::membership::MemberRole;
///
/// // A developer may reorder the board...
/// assert!(authorize(Action::ReorderIssues, Some(MemberRole::Developer)).is_ok());
///
/// // ...but may not delete the project.
/// assert!(authorize(Action::DeleteProject, Some(MemberRole::Developer)).is_err());
/// ```
use crate::models::membership::MemberRole;

/// Error type for policy denials
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    /// Caller is not a member of the project
    #[error("not a member of this project")]
    NotMember,

    /// Caller's role is insufficient for the action
    #[error("insufficient permissions: requires {required:?}, has {actual:?}")]
    InsufficientRole {
        required: MemberRole,
        actual: MemberRole,
    },
}

/// An action a caller requests against a project, with the ownership facts
/// the decision needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Read the project record; public projects are readable by any caller
    ViewProject { public_project: bool },

    /// Read or list issues (including the kanban view and subtask listings)
    ViewIssues,

    /// Create a top-level issue
    CreateIssue,

    /// Update issue fields
    UpdateIssue,

    /// Set or clear the assignee
    AssignIssue,

    /// Move an issue between status columns
    ChangeStatus,

    /// Apply a full-column reorder
    ReorderIssues,

    /// Create a subtask under a parent issue
    CreateSubtask,

    /// Delete an issue; reporters may delete their own
    DeleteIssue { caller_is_reporter: bool },

    /// Update project fields
    UpdateProject,

    /// Add/remove members or change their roles; also create labels
    ManageMembers,

    /// Archive the project
    ArchiveProject,

    /// Delete the project
    DeleteProject,
}

/// Decides whether a caller with the given role may perform the action
///
/// `role` is None when the caller is not a member of the project. Violations
/// are reported as `PolicyError` and must be surfaced as Forbidden, never
/// downgraded to a generic failure.
pub fn authorize(action: Action, role: Option<MemberRole>) -> Result<(), PolicyError> {
    match action {
        Action::ViewProject { public_project: true } => Ok(()),

        Action::ViewProject { public_project: false }
        | Action::ViewIssues
        | Action::CreateIssue
        | Action::UpdateIssue
        | Action::AssignIssue
        | Action::ChangeStatus
        | Action::ReorderIssues
        | Action::CreateSubtask => {
            role.map(|_| ()).ok_or(PolicyError::NotMember)
        }

        Action::DeleteIssue { caller_is_reporter } => {
            let actual = role.ok_or(PolicyError::NotMember)?;
            if caller_is_reporter || actual.has_permission(&MemberRole::Admin) {
                Ok(())
            } else {
                Err(PolicyError::InsufficientRole {
                    required: MemberRole::Admin,
                    actual,
                })
            }
        }

        Action::UpdateProject | Action::ManageMembers | Action::ArchiveProject => {
            require_role(role, MemberRole::Admin)
        }

        Action::DeleteProject => require_role(role, MemberRole::Owner),
    }
}

fn require_role(role: Option<MemberRole>, required: MemberRole) -> Result<(), PolicyError> {
    let actual = role.ok_or(PolicyError::NotMember)?;

    if actual.has_permission(&required) {
        Ok(())
    } else {
        Err(PolicyError::InsufficientRole { required, actual })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_ROLES: [MemberRole; 4] = [
        MemberRole::Owner,
        MemberRole::Admin,
        MemberRole::Developer,
        MemberRole::Viewer,
    ];

    #[test]
    fn test_membership_gated_actions_allow_any_role() {
        let actions = [
            Action::ViewProject { public_project: false },
            Action::ViewIssues,
            Action::CreateIssue,
            Action::UpdateIssue,
            Action::AssignIssue,
            Action::ChangeStatus,
            Action::ReorderIssues,
            Action::CreateSubtask,
        ];

        for action in actions {
            for role in ALL_ROLES {
                assert!(authorize(action, Some(role)).is_ok(), "{:?} as {:?}", action, role);
            }
            assert!(matches!(authorize(action, None), Err(PolicyError::NotMember)));
        }
    }

    #[test]
    fn test_public_project_readable_without_membership() {
        assert!(authorize(Action::ViewProject { public_project: true }, None).is_ok());
    }

    #[test]
    fn test_private_project_not_readable_without_membership() {
        assert!(matches!(
            authorize(Action::ViewProject { public_project: false }, None),
            Err(PolicyError::NotMember)
        ));
    }

    #[test]
    fn test_admin_gated_actions() {
        let actions = [Action::UpdateProject, Action::ManageMembers, Action::ArchiveProject];

        for action in actions {
            assert!(authorize(action, Some(MemberRole::Owner)).is_ok());
            assert!(authorize(action, Some(MemberRole::Admin)).is_ok());
            assert!(matches!(
                authorize(action, Some(MemberRole::Developer)),
                Err(PolicyError::InsufficientRole { .. })
            ));
            assert!(matches!(
                authorize(action, Some(MemberRole::Viewer)),
                Err(PolicyError::InsufficientRole { .. })
            ));
            assert!(matches!(authorize(action, None), Err(PolicyError::NotMember)));
        }
    }

    #[test]
    fn test_delete_project_requires_owner() {
        assert!(authorize(Action::DeleteProject, Some(MemberRole::Owner)).is_ok());

        for role in [MemberRole::Admin, MemberRole::Developer, MemberRole::Viewer] {
            assert!(matches!(
                authorize(Action::DeleteProject, Some(role)),
                Err(PolicyError::InsufficientRole { .. })
            ));
        }
    }

    #[test]
    fn test_delete_issue_reporter_or_admin() {
        // Reporter may delete their own issue regardless of role
        for role in ALL_ROLES {
            assert!(authorize(
                Action::DeleteIssue { caller_is_reporter: true },
                Some(role)
            )
            .is_ok());
        }

        // Non-reporters need admin or better
        assert!(authorize(Action::DeleteIssue { caller_is_reporter: false }, Some(MemberRole::Owner)).is_ok());
        assert!(authorize(Action::DeleteIssue { caller_is_reporter: false }, Some(MemberRole::Admin)).is_ok());
        assert!(matches!(
            authorize(Action::DeleteIssue { caller_is_reporter: false }, Some(MemberRole::Developer)),
            Err(PolicyError::InsufficientRole { .. })
        ));
        assert!(matches!(
            authorize(Action::DeleteIssue { caller_is_reporter: false }, Some(MemberRole::Viewer)),
            Err(PolicyError::InsufficientRole { .. })
        ));

        // A reporter who is no longer a member is still denied
        assert!(matches!(
            authorize(Action::DeleteIssue { caller_is_reporter: true }, None),
            Err(PolicyError::NotMember)
        ));
    }

    #[test]
    fn test_policy_error_display() {
        let err = PolicyError::NotMember;
        assert!(err.to_string().contains("not a member"));

        let err = PolicyError::InsufficientRole {
            required: MemberRole::Admin,
            actual: MemberRole::Viewer,
        };
        assert!(err.to_string().contains("requires"));
    }
}
