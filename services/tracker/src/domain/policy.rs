//! Authorization rules. Pure functions over roles and ownership so the
//! use cases stay thin and the rules are testable on their own.

use uuid::Uuid;

use tracker_domain::role::{TeamRole, WorkspaceRole};

use crate::domain::types::{Issue, Project};

/// Changing a member's role. Owners and admins may change roles, but only the
/// owner may grant or revoke `admin`, and the owner's own role never changes
/// here (ownership moves through transfer).
pub fn can_change_member_role(
    actor: WorkspaceRole,
    target_current: WorkspaceRole,
    target_new: WorkspaceRole,
) -> bool {
    if !actor.can_manage() || target_current.is_owner() || target_new.is_owner() {
        return false;
    }
    let touches_admin = target_current == WorkspaceRole::Admin || target_new == WorkspaceRole::Admin;
    !touches_admin || actor.is_owner()
}

/// Inviting with a given role. Only the owner may add admins.
pub fn can_add_member(actor: WorkspaceRole, role: WorkspaceRole) -> bool {
    match role {
        WorkspaceRole::Owner => false,
        WorkspaceRole::Admin => actor.is_owner(),
        WorkspaceRole::Member => actor.can_manage(),
    }
}

/// Removing a member. The owner can never be removed; anyone may leave;
/// admins can only be removed by the owner.
pub fn can_remove_member(
    actor_id: Uuid,
    actor: WorkspaceRole,
    target_id: Uuid,
    target: WorkspaceRole,
) -> bool {
    if target.is_owner() {
        return false;
    }
    if actor_id == target_id {
        return true;
    }
    match target {
        WorkspaceRole::Admin => actor.is_owner(),
        _ => actor.can_manage(),
    }
}

/// Workspace owner/admin or the team's lead.
pub fn can_manage_team(actor: WorkspaceRole, team_role: Option<TeamRole>) -> bool {
    actor.can_manage() || team_role == Some(TeamRole::Lead)
}

/// Workspace owner/admin, the project lead, the project creator, or the lead
/// of a team linked to the project.
pub fn can_manage_project(
    actor_id: Uuid,
    actor: WorkspaceRole,
    project: &Project,
    leads_linked_team: bool,
) -> bool {
    actor.can_manage()
        || project.lead_id == Some(actor_id)
        || project.creator_id == actor_id
        || leads_linked_team
}

/// The issue's creator, or anyone who can manage its project.
pub fn can_delete_issue(actor_id: Uuid, issue: &Issue, can_manage_project: bool) -> bool {
    issue.creator_id == actor_id || can_manage_project
}
