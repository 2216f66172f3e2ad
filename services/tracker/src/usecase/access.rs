use uuid::Uuid;

use tracker_domain::role::WorkspaceRole;

use crate::domain::repository::{MemberRepository, WorkspaceRepository};
use crate::domain::types::Workspace;
use crate::error::TrackerError;

/// A workspace together with the caller's role in it.
#[derive(Debug, Clone)]
pub struct WorkspaceAccess {
    pub workspace: Workspace,
    pub role: WorkspaceRole,
}

impl WorkspaceAccess {
    pub fn require_manage(&self) -> Result<(), TrackerError> {
        if !self.role.can_manage() {
            return Err(TrackerError::Forbidden);
        }
        Ok(())
    }

    pub fn require_owner(&self) -> Result<(), TrackerError> {
        if !self.role.is_owner() {
            return Err(TrackerError::Forbidden);
        }
        Ok(())
    }
}

/// Tenant resolution shared by every workspace-scoped operation:
/// unknown slug → 404, non-member → 403.
pub async fn resolve_workspace<W, M>(
    workspaces: &W,
    members: &M,
    slug: &str,
    user_id: Uuid,
) -> Result<WorkspaceAccess, TrackerError>
where
    W: WorkspaceRepository,
    M: MemberRepository,
{
    let workspace = workspaces
        .find_by_slug(slug.trim())
        .await?
        .ok_or(TrackerError::WorkspaceNotFound)?;
    let role = members
        .find_role(workspace.id, user_id)
        .await?
        .ok_or(TrackerError::Forbidden)?;
    Ok(WorkspaceAccess { workspace, role })
}
