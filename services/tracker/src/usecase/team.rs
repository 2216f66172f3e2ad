use chrono::Utc;
use uuid::Uuid;

use tracker_domain::role::TeamRole;
use tracker_domain::validate::{
    DESCRIPTION_MAX_LEN, TEAM_NAME_MAX_LEN, normalize_identifier, optional_text, required_text,
};

use crate::domain::policy::can_manage_team;
use crate::domain::repository::{MemberRepository, TeamRepository, WorkspaceRepository};
use crate::domain::types::{Team, TeamMember, TeamMemberProfile, TeamPatch};
use crate::error::TrackerError;
use crate::usecase::access::{WorkspaceAccess, resolve_workspace};

/// A team resolved inside its workspace, with the caller's permission on it.
struct TeamScope {
    access: WorkspaceAccess,
    team: Team,
    can_manage: bool,
}

async fn load_team<W, M, T>(
    workspaces: &W,
    members: &M,
    teams: &T,
    slug: &str,
    identifier: &str,
    user_id: Uuid,
) -> Result<TeamScope, TrackerError>
where
    W: WorkspaceRepository,
    M: MemberRepository,
    T: TeamRepository,
{
    let access = resolve_workspace(workspaces, members, slug, user_id).await?;
    let identifier = normalize_identifier(identifier).map_err(|_| TrackerError::TeamNotFound)?;
    let team = teams
        .find_by_identifier(access.workspace.id, &identifier)
        .await?
        .ok_or(TrackerError::TeamNotFound)?;
    let team_role = teams.member_role(team.id, user_id).await?;
    let can_manage = can_manage_team(access.role, team_role);
    Ok(TeamScope {
        access,
        team,
        can_manage,
    })
}

// ── Create ────────────────────────────────────────────────────────────────────

pub struct CreateTeamInput {
    pub name: String,
    pub identifier: String,
    pub description: Option<String>,
}

pub struct CreateTeamUseCase<W, M, T>
where
    W: WorkspaceRepository,
    M: MemberRepository,
    T: TeamRepository,
{
    pub workspaces: W,
    pub members: M,
    pub teams: T,
}

impl<W, M, T> CreateTeamUseCase<W, M, T>
where
    W: WorkspaceRepository,
    M: MemberRepository,
    T: TeamRepository,
{
    /// Any member may create a team and becomes its lead.
    pub async fn execute(
        &self,
        slug: &str,
        user_id: Uuid,
        input: CreateTeamInput,
    ) -> Result<Team, TrackerError> {
        let access = resolve_workspace(&self.workspaces, &self.members, slug, user_id).await?;
        let name = required_text("name", &input.name, TEAM_NAME_MAX_LEN)?;
        let identifier = normalize_identifier(&input.identifier)?;
        let description =
            optional_text("description", input.description.as_deref(), DESCRIPTION_MAX_LEN)?;

        if self
            .teams
            .identifier_exists(access.workspace.id, &identifier)
            .await?
        {
            return Err(TrackerError::IdentifierTaken);
        }

        let now = Utc::now();
        let team = Team {
            id: Uuid::now_v7(),
            workspace_id: access.workspace.id,
            name,
            identifier,
            description,
            created_at: now,
            updated_at: now,
        };
        self.teams.create_with_lead(&team, user_id).await?;
        Ok(team)
    }
}

// ── Identifier availability ───────────────────────────────────────────────────

pub struct CheckTeamIdentifierUseCase<W, M, T>
where
    W: WorkspaceRepository,
    M: MemberRepository,
    T: TeamRepository,
{
    pub workspaces: W,
    pub members: M,
    pub teams: T,
}

impl<W, M, T> CheckTeamIdentifierUseCase<W, M, T>
where
    W: WorkspaceRepository,
    M: MemberRepository,
    T: TeamRepository,
{
    pub async fn execute(
        &self,
        slug: &str,
        user_id: Uuid,
        identifier: &str,
    ) -> Result<bool, TrackerError> {
        let access = resolve_workspace(&self.workspaces, &self.members, slug, user_id).await?;
        let identifier = normalize_identifier(identifier)?;
        Ok(!self
            .teams
            .identifier_exists(access.workspace.id, &identifier)
            .await?)
    }
}

// ── List / get ────────────────────────────────────────────────────────────────

pub struct ListTeamsUseCase<W, M, T>
where
    W: WorkspaceRepository,
    M: MemberRepository,
    T: TeamRepository,
{
    pub workspaces: W,
    pub members: M,
    pub teams: T,
}

impl<W, M, T> ListTeamsUseCase<W, M, T>
where
    W: WorkspaceRepository,
    M: MemberRepository,
    T: TeamRepository,
{
    pub async fn execute(&self, slug: &str, user_id: Uuid) -> Result<Vec<Team>, TrackerError> {
        let access = resolve_workspace(&self.workspaces, &self.members, slug, user_id).await?;
        self.teams.list(access.workspace.id).await
    }
}

pub struct TeamDetail {
    pub team: Team,
    pub members: Vec<TeamMemberProfile>,
}

pub struct GetTeamUseCase<W, M, T>
where
    W: WorkspaceRepository,
    M: MemberRepository,
    T: TeamRepository,
{
    pub workspaces: W,
    pub members: M,
    pub teams: T,
}

impl<W, M, T> GetTeamUseCase<W, M, T>
where
    W: WorkspaceRepository,
    M: MemberRepository,
    T: TeamRepository,
{
    pub async fn execute(
        &self,
        slug: &str,
        user_id: Uuid,
        identifier: &str,
    ) -> Result<TeamDetail, TrackerError> {
        let scope = load_team(
            &self.workspaces,
            &self.members,
            &self.teams,
            slug,
            identifier,
            user_id,
        )
        .await?;
        let members = self.teams.list_members(scope.team.id).await?;
        Ok(TeamDetail {
            team: scope.team,
            members,
        })
    }
}

// ── Update / delete ───────────────────────────────────────────────────────────

#[derive(Default)]
pub struct UpdateTeamInput {
    pub name: Option<String>,
    pub identifier: Option<String>,
    pub description: Option<Option<String>>,
}

pub struct UpdateTeamUseCase<W, M, T>
where
    W: WorkspaceRepository,
    M: MemberRepository,
    T: TeamRepository,
{
    pub workspaces: W,
    pub members: M,
    pub teams: T,
}

impl<W, M, T> UpdateTeamUseCase<W, M, T>
where
    W: WorkspaceRepository,
    M: MemberRepository,
    T: TeamRepository,
{
    pub async fn execute(
        &self,
        slug: &str,
        user_id: Uuid,
        identifier: &str,
        input: UpdateTeamInput,
    ) -> Result<Team, TrackerError> {
        let scope = load_team(
            &self.workspaces,
            &self.members,
            &self.teams,
            slug,
            identifier,
            user_id,
        )
        .await?;
        if !scope.can_manage {
            return Err(TrackerError::Forbidden);
        }

        let mut patch = TeamPatch::default();
        if let Some(name) = &input.name {
            patch.name = Some(required_text("name", name, TEAM_NAME_MAX_LEN)?);
        }
        if let Some(raw) = &input.identifier {
            let new_identifier = normalize_identifier(raw)?;
            if new_identifier != scope.team.identifier {
                if self
                    .teams
                    .identifier_exists(scope.access.workspace.id, &new_identifier)
                    .await?
                {
                    return Err(TrackerError::IdentifierTaken);
                }
                patch.identifier = Some(new_identifier);
            }
        }
        if let Some(description) = &input.description {
            patch.description = Some(optional_text(
                "description",
                description.as_deref(),
                DESCRIPTION_MAX_LEN,
            )?);
        }

        if patch.is_empty() {
            if input.identifier.is_some() {
                return Ok(scope.team);
            }
            return Err(TrackerError::Validation("no fields to update".to_owned()));
        }
        self.teams.update(scope.team.id, &patch).await
    }
}

pub struct DeleteTeamUseCase<W, M, T>
where
    W: WorkspaceRepository,
    M: MemberRepository,
    T: TeamRepository,
{
    pub workspaces: W,
    pub members: M,
    pub teams: T,
}

impl<W, M, T> DeleteTeamUseCase<W, M, T>
where
    W: WorkspaceRepository,
    M: MemberRepository,
    T: TeamRepository,
{
    pub async fn execute(
        &self,
        slug: &str,
        user_id: Uuid,
        identifier: &str,
    ) -> Result<(), TrackerError> {
        let scope = load_team(
            &self.workspaces,
            &self.members,
            &self.teams,
            slug,
            identifier,
            user_id,
        )
        .await?;
        if !scope.can_manage {
            return Err(TrackerError::Forbidden);
        }
        self.teams.delete(scope.team.id).await
    }
}

// ── Team members ──────────────────────────────────────────────────────────────

pub struct AddTeamMemberUseCase<W, M, T>
where
    W: WorkspaceRepository,
    M: MemberRepository,
    T: TeamRepository,
{
    pub workspaces: W,
    pub members: M,
    pub teams: T,
}

impl<W, M, T> AddTeamMemberUseCase<W, M, T>
where
    W: WorkspaceRepository,
    M: MemberRepository,
    T: TeamRepository,
{
    /// The new team member must already belong to the workspace.
    pub async fn execute(
        &self,
        slug: &str,
        user_id: Uuid,
        identifier: &str,
        target_id: Uuid,
        role: TeamRole,
    ) -> Result<TeamMember, TrackerError> {
        let scope = load_team(
            &self.workspaces,
            &self.members,
            &self.teams,
            slug,
            identifier,
            user_id,
        )
        .await?;
        if !scope.can_manage {
            return Err(TrackerError::Forbidden);
        }
        if self
            .members
            .find_role(scope.access.workspace.id, target_id)
            .await?
            .is_none()
        {
            return Err(TrackerError::MemberNotFound);
        }

        let member = TeamMember {
            team_id: scope.team.id,
            user_id: target_id,
            role,
            joined_at: Utc::now(),
        };
        self.teams.add_member(&member).await?;
        Ok(member)
    }
}

pub struct UpdateTeamMemberRoleUseCase<W, M, T>
where
    W: WorkspaceRepository,
    M: MemberRepository,
    T: TeamRepository,
{
    pub workspaces: W,
    pub members: M,
    pub teams: T,
}

impl<W, M, T> UpdateTeamMemberRoleUseCase<W, M, T>
where
    W: WorkspaceRepository,
    M: MemberRepository,
    T: TeamRepository,
{
    pub async fn execute(
        &self,
        slug: &str,
        user_id: Uuid,
        identifier: &str,
        target_id: Uuid,
        role: TeamRole,
    ) -> Result<(), TrackerError> {
        let scope = load_team(
            &self.workspaces,
            &self.members,
            &self.teams,
            slug,
            identifier,
            user_id,
        )
        .await?;
        if !scope.can_manage {
            return Err(TrackerError::Forbidden);
        }
        if !self
            .teams
            .update_member_role(scope.team.id, target_id, role)
            .await?
        {
            return Err(TrackerError::MemberNotFound);
        }
        Ok(())
    }
}

pub struct RemoveTeamMemberUseCase<W, M, T>
where
    W: WorkspaceRepository,
    M: MemberRepository,
    T: TeamRepository,
{
    pub workspaces: W,
    pub members: M,
    pub teams: T,
}

impl<W, M, T> RemoveTeamMemberUseCase<W, M, T>
where
    W: WorkspaceRepository,
    M: MemberRepository,
    T: TeamRepository,
{
    /// Managers remove anyone; members may remove themselves.
    pub async fn execute(
        &self,
        slug: &str,
        user_id: Uuid,
        identifier: &str,
        target_id: Uuid,
    ) -> Result<(), TrackerError> {
        let scope = load_team(
            &self.workspaces,
            &self.members,
            &self.teams,
            slug,
            identifier,
            user_id,
        )
        .await?;
        if !scope.can_manage && target_id != user_id {
            return Err(TrackerError::Forbidden);
        }
        if !self.teams.remove_member(scope.team.id, target_id).await? {
            return Err(TrackerError::MemberNotFound);
        }
        Ok(())
    }
}
