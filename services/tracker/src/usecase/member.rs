use chrono::Utc;
use uuid::Uuid;

use tracker_domain::role::WorkspaceRole;
use tracker_domain::validate::{normalize_email, normalize_username};

use crate::domain::policy::{can_add_member, can_change_member_role, can_remove_member};
use crate::domain::repository::{MemberRepository, UserRepository, WorkspaceRepository};
use crate::domain::types::{MemberProfile, WorkspaceMember};
use crate::error::TrackerError;
use crate::usecase::access::resolve_workspace;

// ── List ──────────────────────────────────────────────────────────────────────

pub struct ListMembersUseCase<W, M>
where
    W: WorkspaceRepository,
    M: MemberRepository,
{
    pub workspaces: W,
    pub members: M,
}

impl<W, M> ListMembersUseCase<W, M>
where
    W: WorkspaceRepository,
    M: MemberRepository,
{
    pub async fn execute(
        &self,
        slug: &str,
        user_id: Uuid,
    ) -> Result<Vec<MemberProfile>, TrackerError> {
        let access = resolve_workspace(&self.workspaces, &self.members, slug, user_id).await?;
        self.members.list(access.workspace.id).await
    }
}

// ── Add ───────────────────────────────────────────────────────────────────────

/// Who to invite: exactly one of `email` or `username`.
pub struct AddMemberInput {
    pub email: Option<String>,
    pub username: Option<String>,
    pub role: WorkspaceRole,
}

pub struct AddMemberUseCase<W, M, U>
where
    W: WorkspaceRepository,
    M: MemberRepository,
    U: UserRepository,
{
    pub workspaces: W,
    pub members: M,
    pub users: U,
}

impl<W, M, U> AddMemberUseCase<W, M, U>
where
    W: WorkspaceRepository,
    M: MemberRepository,
    U: UserRepository,
{
    pub async fn execute(
        &self,
        slug: &str,
        user_id: Uuid,
        input: AddMemberInput,
    ) -> Result<WorkspaceMember, TrackerError> {
        let access = resolve_workspace(&self.workspaces, &self.members, slug, user_id).await?;
        if input.role.is_owner() {
            return Err(TrackerError::Validation(
                "role must be admin or member".to_owned(),
            ));
        }
        if !can_add_member(access.role, input.role) {
            return Err(TrackerError::Forbidden);
        }

        let user = match (input.email.as_deref(), input.username.as_deref()) {
            (Some(email), None) => self.users.find_by_email(&normalize_email(email)?).await?,
            (None, Some(username)) => {
                let username = normalize_username(username)?;
                self.users.find_by_username(&username.normalized).await?
            }
            _ => {
                return Err(TrackerError::Validation(
                    "provide either email or username".to_owned(),
                ));
            }
        }
        .ok_or(TrackerError::UserNotFound)?;

        if self
            .members
            .find_role(access.workspace.id, user.id)
            .await?
            .is_some()
        {
            return Err(TrackerError::AlreadyMember);
        }

        let member = WorkspaceMember {
            workspace_id: access.workspace.id,
            user_id: user.id,
            role: input.role,
            joined_at: Utc::now(),
        };
        self.members.add(&member).await?;
        Ok(member)
    }
}

// ── Change role ───────────────────────────────────────────────────────────────

pub struct UpdateMemberRoleUseCase<W, M>
where
    W: WorkspaceRepository,
    M: MemberRepository,
{
    pub workspaces: W,
    pub members: M,
}

impl<W, M> UpdateMemberRoleUseCase<W, M>
where
    W: WorkspaceRepository,
    M: MemberRepository,
{
    pub async fn execute(
        &self,
        slug: &str,
        user_id: Uuid,
        target_id: Uuid,
        role: WorkspaceRole,
    ) -> Result<(), TrackerError> {
        let access = resolve_workspace(&self.workspaces, &self.members, slug, user_id).await?;
        access.require_manage()?;
        let current = self
            .members
            .find_role(access.workspace.id, target_id)
            .await?
            .ok_or(TrackerError::MemberNotFound)?;
        if !can_change_member_role(access.role, current, role) {
            return Err(TrackerError::Forbidden);
        }
        if current == role {
            return Ok(());
        }
        self.members
            .update_role(access.workspace.id, target_id, role)
            .await
    }
}

// ── Remove / leave ────────────────────────────────────────────────────────────

pub struct RemoveMemberUseCase<W, M>
where
    W: WorkspaceRepository,
    M: MemberRepository,
{
    pub workspaces: W,
    pub members: M,
}

impl<W, M> RemoveMemberUseCase<W, M>
where
    W: WorkspaceRepository,
    M: MemberRepository,
{
    /// Also drops the member from every team in the workspace.
    pub async fn execute(
        &self,
        slug: &str,
        user_id: Uuid,
        target_id: Uuid,
    ) -> Result<(), TrackerError> {
        let access = resolve_workspace(&self.workspaces, &self.members, slug, user_id).await?;
        let target = self
            .members
            .find_role(access.workspace.id, target_id)
            .await?
            .ok_or(TrackerError::MemberNotFound)?;
        if !can_remove_member(user_id, access.role, target_id, target) {
            return Err(TrackerError::Forbidden);
        }
        self.members.remove(access.workspace.id, target_id).await
    }
}
