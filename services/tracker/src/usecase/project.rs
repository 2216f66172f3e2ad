use chrono::Utc;
use uuid::Uuid;

use tracker_domain::status::ProjectStatus;
use tracker_domain::validate::{
    DESCRIPTION_MAX_LEN, PROJECT_NAME_MAX_LEN, normalize_identifier, optional_text, required_text,
};

use crate::domain::policy::can_manage_project;
use crate::domain::repository::{
    MemberRepository, ProjectRepository, TeamRepository, WorkspaceRepository,
};
use crate::domain::types::{Project, ProjectPatch, Team};
use crate::error::TrackerError;
use crate::usecase::access::{WorkspaceAccess, resolve_workspace};

pub(crate) struct ProjectScope {
    pub access: WorkspaceAccess,
    pub project: Project,
}

pub(crate) async fn load_project<W, M, P>(
    workspaces: &W,
    members: &M,
    projects: &P,
    slug: &str,
    identifier: &str,
    user_id: Uuid,
) -> Result<ProjectScope, TrackerError>
where
    W: WorkspaceRepository,
    M: MemberRepository,
    P: ProjectRepository,
{
    let access = resolve_workspace(workspaces, members, slug, user_id).await?;
    let identifier =
        normalize_identifier(identifier).map_err(|_| TrackerError::ProjectNotFound)?;
    let project = projects
        .find_by_identifier(access.workspace.id, &identifier)
        .await?
        .ok_or(TrackerError::ProjectNotFound)?;
    Ok(ProjectScope { access, project })
}

/// Manage permission. Linked-team leadership is only looked up when the
/// cheaper checks fail.
pub(crate) async fn has_project_manage<P, T>(
    projects: &P,
    teams: &T,
    scope: &ProjectScope,
    user_id: Uuid,
) -> Result<bool, TrackerError>
where
    P: ProjectRepository,
    T: TeamRepository,
{
    if can_manage_project(user_id, scope.access.role, &scope.project, false) {
        return Ok(true);
    }
    let linked: Vec<Uuid> = projects
        .teams(scope.project.id)
        .await?
        .into_iter()
        .map(|t| t.id)
        .collect();
    let leads_linked_team = teams.leads_any(&linked, user_id).await?;
    Ok(can_manage_project(
        user_id,
        scope.access.role,
        &scope.project,
        leads_linked_team,
    ))
}

pub struct ProjectDetail {
    pub project: Project,
    pub teams: Vec<Team>,
}

// ── Create ────────────────────────────────────────────────────────────────────

pub struct CreateProjectInput {
    pub name: String,
    pub identifier: String,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
    pub lead_id: Option<Uuid>,
    pub team_identifiers: Vec<String>,
}

pub struct CreateProjectUseCase<W, M, T, P>
where
    W: WorkspaceRepository,
    M: MemberRepository,
    T: TeamRepository,
    P: ProjectRepository,
{
    pub workspaces: W,
    pub members: M,
    pub teams: T,
    pub projects: P,
}

impl<W, M, T, P> CreateProjectUseCase<W, M, T, P>
where
    W: WorkspaceRepository,
    M: MemberRepository,
    T: TeamRepository,
    P: ProjectRepository,
{
    pub async fn execute(
        &self,
        slug: &str,
        user_id: Uuid,
        input: CreateProjectInput,
    ) -> Result<ProjectDetail, TrackerError> {
        let access = resolve_workspace(&self.workspaces, &self.members, slug, user_id).await?;
        let workspace_id = access.workspace.id;

        let name = required_text("name", &input.name, PROJECT_NAME_MAX_LEN)?;
        let identifier = normalize_identifier(&input.identifier)?;
        let description =
            optional_text("description", input.description.as_deref(), DESCRIPTION_MAX_LEN)?;

        if let Some(lead_id) = input.lead_id {
            if self.members.find_role(workspace_id, lead_id).await?.is_none() {
                return Err(TrackerError::Validation(
                    "lead must be a workspace member".to_owned(),
                ));
            }
        }

        let mut teams: Vec<Team> = Vec::new();
        for raw in &input.team_identifiers {
            let team_identifier =
                normalize_identifier(raw).map_err(|_| TrackerError::TeamNotFound)?;
            let team = self
                .teams
                .find_by_identifier(workspace_id, &team_identifier)
                .await?
                .ok_or(TrackerError::TeamNotFound)?;
            if !teams.iter().any(|t| t.id == team.id) {
                teams.push(team);
            }
        }

        if self
            .projects
            .identifier_exists(workspace_id, &identifier)
            .await?
        {
            return Err(TrackerError::IdentifierTaken);
        }

        let now = Utc::now();
        let project = Project {
            id: Uuid::now_v7(),
            workspace_id,
            name,
            identifier,
            description,
            status: input.status.unwrap_or_default(),
            lead_id: input.lead_id,
            creator_id: user_id,
            issue_counter: 0,
            created_at: now,
            updated_at: now,
        };
        let team_ids: Vec<Uuid> = teams.iter().map(|t| t.id).collect();
        self.projects.create_with_teams(&project, &team_ids).await?;

        teams.sort_by(|a, b| a.identifier.cmp(&b.identifier));
        Ok(ProjectDetail { project, teams })
    }
}

// ── Identifier availability ───────────────────────────────────────────────────

pub struct CheckProjectIdentifierUseCase<W, M, P>
where
    W: WorkspaceRepository,
    M: MemberRepository,
    P: ProjectRepository,
{
    pub workspaces: W,
    pub members: M,
    pub projects: P,
}

impl<W, M, P> CheckProjectIdentifierUseCase<W, M, P>
where
    W: WorkspaceRepository,
    M: MemberRepository,
    P: ProjectRepository,
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
            .projects
            .identifier_exists(access.workspace.id, &identifier)
            .await?)
    }
}

// ── List / get ────────────────────────────────────────────────────────────────

pub struct ListProjectsUseCase<W, M, P>
where
    W: WorkspaceRepository,
    M: MemberRepository,
    P: ProjectRepository,
{
    pub workspaces: W,
    pub members: M,
    pub projects: P,
}

impl<W, M, P> ListProjectsUseCase<W, M, P>
where
    W: WorkspaceRepository,
    M: MemberRepository,
    P: ProjectRepository,
{
    pub async fn execute(
        &self,
        slug: &str,
        user_id: Uuid,
        status: Option<ProjectStatus>,
    ) -> Result<Vec<Project>, TrackerError> {
        let access = resolve_workspace(&self.workspaces, &self.members, slug, user_id).await?;
        self.projects.list(access.workspace.id, status).await
    }
}

pub struct GetProjectUseCase<W, M, P>
where
    W: WorkspaceRepository,
    M: MemberRepository,
    P: ProjectRepository,
{
    pub workspaces: W,
    pub members: M,
    pub projects: P,
}

impl<W, M, P> GetProjectUseCase<W, M, P>
where
    W: WorkspaceRepository,
    M: MemberRepository,
    P: ProjectRepository,
{
    pub async fn execute(
        &self,
        slug: &str,
        user_id: Uuid,
        identifier: &str,
    ) -> Result<ProjectDetail, TrackerError> {
        let scope = load_project(
            &self.workspaces,
            &self.members,
            &self.projects,
            slug,
            identifier,
            user_id,
        )
        .await?;
        let teams = self.projects.teams(scope.project.id).await?;
        Ok(ProjectDetail {
            project: scope.project,
            teams,
        })
    }
}

// ── Update / delete ───────────────────────────────────────────────────────────

#[derive(Default)]
pub struct UpdateProjectInput {
    pub name: Option<String>,
    pub identifier: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<ProjectStatus>,
    pub lead_id: Option<Option<Uuid>>,
}

pub struct UpdateProjectUseCase<W, M, T, P>
where
    W: WorkspaceRepository,
    M: MemberRepository,
    T: TeamRepository,
    P: ProjectRepository,
{
    pub workspaces: W,
    pub members: M,
    pub teams: T,
    pub projects: P,
}

impl<W, M, T, P> UpdateProjectUseCase<W, M, T, P>
where
    W: WorkspaceRepository,
    M: MemberRepository,
    T: TeamRepository,
    P: ProjectRepository,
{
    pub async fn execute(
        &self,
        slug: &str,
        user_id: Uuid,
        identifier: &str,
        input: UpdateProjectInput,
    ) -> Result<Project, TrackerError> {
        let scope = load_project(
            &self.workspaces,
            &self.members,
            &self.projects,
            slug,
            identifier,
            user_id,
        )
        .await?;
        if !has_project_manage(&self.projects, &self.teams, &scope, user_id).await? {
            return Err(TrackerError::Forbidden);
        }
        let workspace_id = scope.access.workspace.id;

        let mut patch = ProjectPatch::default();
        if let Some(name) = &input.name {
            patch.name = Some(required_text("name", name, PROJECT_NAME_MAX_LEN)?);
        }
        if let Some(raw) = &input.identifier {
            let new_identifier = normalize_identifier(raw)?;
            if new_identifier != scope.project.identifier {
                if self
                    .projects
                    .identifier_exists(workspace_id, &new_identifier)
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
        patch.status = input.status;
        if let Some(lead_id) = input.lead_id {
            if let Some(lead_id) = lead_id {
                if self.members.find_role(workspace_id, lead_id).await?.is_none() {
                    return Err(TrackerError::Validation(
                        "lead must be a workspace member".to_owned(),
                    ));
                }
            }
            patch.lead_id = Some(lead_id);
        }

        if patch.is_empty() {
            if input.identifier.is_some() {
                return Ok(scope.project);
            }
            return Err(TrackerError::Validation("no fields to update".to_owned()));
        }
        self.projects.update(scope.project.id, &patch).await
    }
}

pub struct DeleteProjectUseCase<W, M, T, P>
where
    W: WorkspaceRepository,
    M: MemberRepository,
    T: TeamRepository,
    P: ProjectRepository,
{
    pub workspaces: W,
    pub members: M,
    pub teams: T,
    pub projects: P,
}

impl<W, M, T, P> DeleteProjectUseCase<W, M, T, P>
where
    W: WorkspaceRepository,
    M: MemberRepository,
    T: TeamRepository,
    P: ProjectRepository,
{
    /// Issues and team links cascade.
    pub async fn execute(
        &self,
        slug: &str,
        user_id: Uuid,
        identifier: &str,
    ) -> Result<(), TrackerError> {
        let scope = load_project(
            &self.workspaces,
            &self.members,
            &self.projects,
            slug,
            identifier,
            user_id,
        )
        .await?;
        if !has_project_manage(&self.projects, &self.teams, &scope, user_id).await? {
            return Err(TrackerError::Forbidden);
        }
        self.projects.delete(scope.project.id).await?;
        tracing::info!(project_id = %scope.project.id, "project deleted");
        Ok(())
    }
}

// ── Team links ────────────────────────────────────────────────────────────────

pub struct LinkProjectTeamUseCase<W, M, T, P>
where
    W: WorkspaceRepository,
    M: MemberRepository,
    T: TeamRepository,
    P: ProjectRepository,
{
    pub workspaces: W,
    pub members: M,
    pub teams: T,
    pub projects: P,
}

impl<W, M, T, P> LinkProjectTeamUseCase<W, M, T, P>
where
    W: WorkspaceRepository,
    M: MemberRepository,
    T: TeamRepository,
    P: ProjectRepository,
{
    pub async fn execute(
        &self,
        slug: &str,
        user_id: Uuid,
        identifier: &str,
        team_identifier: &str,
    ) -> Result<Team, TrackerError> {
        let scope = load_project(
            &self.workspaces,
            &self.members,
            &self.projects,
            slug,
            identifier,
            user_id,
        )
        .await?;
        if !has_project_manage(&self.projects, &self.teams, &scope, user_id).await? {
            return Err(TrackerError::Forbidden);
        }
        let team_identifier =
            normalize_identifier(team_identifier).map_err(|_| TrackerError::TeamNotFound)?;
        let team = self
            .teams
            .find_by_identifier(scope.access.workspace.id, &team_identifier)
            .await?
            .ok_or(TrackerError::TeamNotFound)?;
        self.projects.link_team(scope.project.id, team.id).await?;
        Ok(team)
    }
}

pub struct UnlinkProjectTeamUseCase<W, M, T, P>
where
    W: WorkspaceRepository,
    M: MemberRepository,
    T: TeamRepository,
    P: ProjectRepository,
{
    pub workspaces: W,
    pub members: M,
    pub teams: T,
    pub projects: P,
}

impl<W, M, T, P> UnlinkProjectTeamUseCase<W, M, T, P>
where
    W: WorkspaceRepository,
    M: MemberRepository,
    T: TeamRepository,
    P: ProjectRepository,
{
    pub async fn execute(
        &self,
        slug: &str,
        user_id: Uuid,
        identifier: &str,
        team_identifier: &str,
    ) -> Result<(), TrackerError> {
        let scope = load_project(
            &self.workspaces,
            &self.members,
            &self.projects,
            slug,
            identifier,
            user_id,
        )
        .await?;
        if !has_project_manage(&self.projects, &self.teams, &scope, user_id).await? {
            return Err(TrackerError::Forbidden);
        }
        let team_identifier =
            normalize_identifier(team_identifier).map_err(|_| TrackerError::TeamNotFound)?;
        let team = self
            .teams
            .find_by_identifier(scope.access.workspace.id, &team_identifier)
            .await?
            .ok_or(TrackerError::TeamNotFound)?;
        if !self.projects.unlink_team(scope.project.id, team.id).await? {
            return Err(TrackerError::TeamNotFound);
        }
        Ok(())
    }
}
