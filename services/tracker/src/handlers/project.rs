use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tracker_core::serde::deserialize_some;
use tracker_domain::status::ProjectStatus;

use crate::domain::types::Project;
use crate::error::TrackerError;
use crate::extract::{CurrentUser, JsonBody, QueryParams};
use crate::handlers::team::TeamResponse;
use crate::handlers::{AvailabilityResponse, WorkspaceQuery};
use crate::state::AppState;
use crate::usecase::project::{
    CheckProjectIdentifierUseCase, CreateProjectInput, CreateProjectUseCase, DeleteProjectUseCase,
    GetProjectUseCase, LinkProjectTeamUseCase, ListProjectsUseCase, ProjectDetail,
    UnlinkProjectTeamUseCase, UpdateProjectInput, UpdateProjectUseCase,
};

// ── Response types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectResponse {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub name: String,
    pub identifier: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub lead_id: Option<Uuid>,
    pub creator_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_identifiers: Option<Vec<String>>,
    #[serde(serialize_with = "tracker_core::serde::to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "tracker_core::serde::to_rfc3339_ms")]
    pub updated_at: DateTime<Utc>,
}

impl From<Project> for ProjectResponse {
    fn from(project: Project) -> Self {
        Self {
            id: project.id,
            workspace_id: project.workspace_id,
            name: project.name,
            identifier: project.identifier,
            description: project.description,
            status: project.status,
            lead_id: project.lead_id,
            creator_id: project.creator_id,
            team_identifiers: None,
            created_at: project.created_at,
            updated_at: project.updated_at,
        }
    }
}

impl From<ProjectDetail> for ProjectResponse {
    fn from(detail: ProjectDetail) -> Self {
        let team_identifiers = detail.teams.into_iter().map(|t| t.identifier).collect();
        Self {
            team_identifiers: Some(team_identifiers),
            ..Self::from(detail.project)
        }
    }
}

// ── POST /api/project/create ─────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    pub workspace: String,
    pub name: String,
    pub identifier: String,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
    pub lead_id: Option<Uuid>,
    #[serde(default)]
    pub team_identifiers: Vec<String>,
}

pub async fn create_project(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    JsonBody(body): JsonBody<CreateProjectRequest>,
) -> Result<(StatusCode, Json<ProjectResponse>), TrackerError> {
    let usecase = CreateProjectUseCase {
        workspaces: state.workspace_repo(),
        members: state.member_repo(),
        teams: state.team_repo(),
        projects: state.project_repo(),
    };
    let detail = usecase
        .execute(
            &body.workspace,
            ctx.user.id,
            CreateProjectInput {
                name: body.name,
                identifier: body.identifier,
                description: body.description,
                status: body.status,
                lead_id: body.lead_id,
                team_identifiers: body.team_identifiers,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(detail.into())))
}

// ── GET /api/project/check-identifier?workspace=&identifier= ─────────────────

#[derive(Deserialize)]
pub struct CheckIdentifierQuery {
    pub workspace: String,
    pub identifier: String,
}

pub async fn check_identifier(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    QueryParams(query): QueryParams<CheckIdentifierQuery>,
) -> Result<Json<AvailabilityResponse>, TrackerError> {
    let usecase = CheckProjectIdentifierUseCase {
        workspaces: state.workspace_repo(),
        members: state.member_repo(),
        projects: state.project_repo(),
    };
    let available = usecase
        .execute(&query.workspace, ctx.user.id, &query.identifier)
        .await?;
    Ok(Json(AvailabilityResponse { available }))
}

// ── GET /api/project?workspace=&status= ──────────────────────────────────────

#[derive(Deserialize)]
pub struct ProjectListQuery {
    pub workspace: String,
    pub status: Option<ProjectStatus>,
}

pub async fn list_projects(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    QueryParams(query): QueryParams<ProjectListQuery>,
) -> Result<Json<Vec<ProjectResponse>>, TrackerError> {
    let usecase = ListProjectsUseCase {
        workspaces: state.workspace_repo(),
        members: state.member_repo(),
        projects: state.project_repo(),
    };
    let projects = usecase
        .execute(&query.workspace, ctx.user.id, query.status)
        .await?;
    Ok(Json(projects.into_iter().map(ProjectResponse::from).collect()))
}

// ── GET /api/project/{identifier}?workspace= ─────────────────────────────────

pub async fn get_project(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(identifier): Path<String>,
    QueryParams(query): QueryParams<WorkspaceQuery>,
) -> Result<Json<ProjectResponse>, TrackerError> {
    let usecase = GetProjectUseCase {
        workspaces: state.workspace_repo(),
        members: state.member_repo(),
        projects: state.project_repo(),
    };
    let detail = usecase
        .execute(&query.workspace, ctx.user.id, &identifier)
        .await?;
    Ok(Json(detail.into()))
}

// ── PATCH /api/project/{identifier}?workspace= ───────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
    pub identifier: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub description: Option<Option<String>>,
    pub status: Option<ProjectStatus>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub lead_id: Option<Option<Uuid>>,
}

pub async fn update_project(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(identifier): Path<String>,
    QueryParams(query): QueryParams<WorkspaceQuery>,
    JsonBody(body): JsonBody<UpdateProjectRequest>,
) -> Result<Json<ProjectResponse>, TrackerError> {
    let usecase = UpdateProjectUseCase {
        workspaces: state.workspace_repo(),
        members: state.member_repo(),
        teams: state.team_repo(),
        projects: state.project_repo(),
    };
    let project = usecase
        .execute(
            &query.workspace,
            ctx.user.id,
            &identifier,
            UpdateProjectInput {
                name: body.name,
                identifier: body.identifier,
                description: body.description,
                status: body.status,
                lead_id: body.lead_id,
            },
        )
        .await?;
    Ok(Json(project.into()))
}

// ── DELETE /api/project/{identifier}?workspace= ──────────────────────────────

pub async fn delete_project(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(identifier): Path<String>,
    QueryParams(query): QueryParams<WorkspaceQuery>,
) -> Result<StatusCode, TrackerError> {
    let usecase = DeleteProjectUseCase {
        workspaces: state.workspace_repo(),
        members: state.member_repo(),
        teams: state.team_repo(),
        projects: state.project_repo(),
    };
    usecase
        .execute(&query.workspace, ctx.user.id, &identifier)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── /api/project/{identifier}/teams ──────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkTeamRequest {
    pub team_identifier: String,
}

pub async fn link_team(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(identifier): Path<String>,
    QueryParams(query): QueryParams<WorkspaceQuery>,
    JsonBody(body): JsonBody<LinkTeamRequest>,
) -> Result<Json<TeamResponse>, TrackerError> {
    let usecase = LinkProjectTeamUseCase {
        workspaces: state.workspace_repo(),
        members: state.member_repo(),
        teams: state.team_repo(),
        projects: state.project_repo(),
    };
    let team = usecase
        .execute(
            &query.workspace,
            ctx.user.id,
            &identifier,
            &body.team_identifier,
        )
        .await?;
    Ok(Json(team.into()))
}

pub async fn unlink_team(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path((identifier, team_identifier)): Path<(String, String)>,
    QueryParams(query): QueryParams<WorkspaceQuery>,
) -> Result<StatusCode, TrackerError> {
    let usecase = UnlinkProjectTeamUseCase {
        workspaces: state.workspace_repo(),
        members: state.member_repo(),
        teams: state.team_repo(),
        projects: state.project_repo(),
    };
    usecase
        .execute(&query.workspace, ctx.user.id, &identifier, &team_identifier)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
