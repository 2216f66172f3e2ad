use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tracker_core::serde::deserialize_some;
use tracker_domain::role::TeamRole;

use crate::domain::types::{Team, TeamMember, TeamMemberProfile};
use crate::error::TrackerError;
use crate::extract::{CurrentUser, JsonBody, QueryParams};
use crate::handlers::{AvailabilityResponse, WorkspaceQuery};
use crate::state::AppState;
use crate::usecase::team::{
    AddTeamMemberUseCase, CheckTeamIdentifierUseCase, CreateTeamInput, CreateTeamUseCase,
    DeleteTeamUseCase, GetTeamUseCase, ListTeamsUseCase, RemoveTeamMemberUseCase,
    UpdateTeamInput, UpdateTeamMemberRoleUseCase, UpdateTeamUseCase,
};

// ── Response types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamResponse {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub name: String,
    pub identifier: String,
    pub description: Option<String>,
    #[serde(serialize_with = "tracker_core::serde::to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "tracker_core::serde::to_rfc3339_ms")]
    pub updated_at: DateTime<Utc>,
}

impl From<Team> for TeamResponse {
    fn from(team: Team) -> Self {
        Self {
            id: team.id,
            workspace_id: team.workspace_id,
            name: team.name,
            identifier: team.identifier,
            description: team.description,
            created_at: team.created_at,
            updated_at: team.updated_at,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMemberResponse {
    pub user_id: Uuid,
    pub name: String,
    pub username: Option<String>,
    pub image: Option<String>,
    pub role: TeamRole,
    #[serde(serialize_with = "tracker_core::serde::to_rfc3339_ms")]
    pub joined_at: DateTime<Utc>,
}

impl From<TeamMemberProfile> for TeamMemberResponse {
    fn from(member: TeamMemberProfile) -> Self {
        Self {
            user_id: member.user.id,
            name: member.user.name,
            username: member.user.display_username,
            image: member.user.image,
            role: member.role,
            joined_at: member.joined_at,
        }
    }
}

#[derive(Serialize)]
pub struct TeamDetailResponse {
    #[serde(flatten)]
    pub team: TeamResponse,
    pub members: Vec<TeamMemberResponse>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMembershipResponse {
    pub team_id: Uuid,
    pub user_id: Uuid,
    pub role: TeamRole,
    #[serde(serialize_with = "tracker_core::serde::to_rfc3339_ms")]
    pub joined_at: DateTime<Utc>,
}

impl From<TeamMember> for TeamMembershipResponse {
    fn from(member: TeamMember) -> Self {
        Self {
            team_id: member.team_id,
            user_id: member.user_id,
            role: member.role,
            joined_at: member.joined_at,
        }
    }
}

// ── POST /api/team/create ────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateTeamRequest {
    pub workspace: String,
    pub name: String,
    pub identifier: String,
    pub description: Option<String>,
}

pub async fn create_team(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    JsonBody(body): JsonBody<CreateTeamRequest>,
) -> Result<(StatusCode, Json<TeamResponse>), TrackerError> {
    let usecase = CreateTeamUseCase {
        workspaces: state.workspace_repo(),
        members: state.member_repo(),
        teams: state.team_repo(),
    };
    let team = usecase
        .execute(
            &body.workspace,
            ctx.user.id,
            CreateTeamInput {
                name: body.name,
                identifier: body.identifier,
                description: body.description,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(team.into())))
}

// ── GET /api/team/check-identifier?workspace=&identifier= ────────────────────

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
    let usecase = CheckTeamIdentifierUseCase {
        workspaces: state.workspace_repo(),
        members: state.member_repo(),
        teams: state.team_repo(),
    };
    let available = usecase
        .execute(&query.workspace, ctx.user.id, &query.identifier)
        .await?;
    Ok(Json(AvailabilityResponse { available }))
}

// ── GET /api/team?workspace= ─────────────────────────────────────────────────

pub async fn list_teams(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    QueryParams(query): QueryParams<WorkspaceQuery>,
) -> Result<Json<Vec<TeamResponse>>, TrackerError> {
    let usecase = ListTeamsUseCase {
        workspaces: state.workspace_repo(),
        members: state.member_repo(),
        teams: state.team_repo(),
    };
    let teams = usecase.execute(&query.workspace, ctx.user.id).await?;
    Ok(Json(teams.into_iter().map(TeamResponse::from).collect()))
}

// ── GET /api/team/{identifier}?workspace= ────────────────────────────────────

pub async fn get_team(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(identifier): Path<String>,
    QueryParams(query): QueryParams<WorkspaceQuery>,
) -> Result<Json<TeamDetailResponse>, TrackerError> {
    let usecase = GetTeamUseCase {
        workspaces: state.workspace_repo(),
        members: state.member_repo(),
        teams: state.team_repo(),
    };
    let detail = usecase
        .execute(&query.workspace, ctx.user.id, &identifier)
        .await?;
    Ok(Json(TeamDetailResponse {
        team: detail.team.into(),
        members: detail
            .members
            .into_iter()
            .map(TeamMemberResponse::from)
            .collect(),
    }))
}

// ── PATCH /api/team/{identifier}?workspace= ──────────────────────────────────

#[derive(Deserialize)]
pub struct UpdateTeamRequest {
    pub name: Option<String>,
    pub identifier: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub description: Option<Option<String>>,
}

pub async fn update_team(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(identifier): Path<String>,
    QueryParams(query): QueryParams<WorkspaceQuery>,
    JsonBody(body): JsonBody<UpdateTeamRequest>,
) -> Result<Json<TeamResponse>, TrackerError> {
    let usecase = UpdateTeamUseCase {
        workspaces: state.workspace_repo(),
        members: state.member_repo(),
        teams: state.team_repo(),
    };
    let team = usecase
        .execute(
            &query.workspace,
            ctx.user.id,
            &identifier,
            UpdateTeamInput {
                name: body.name,
                identifier: body.identifier,
                description: body.description,
            },
        )
        .await?;
    Ok(Json(team.into()))
}

// ── DELETE /api/team/{identifier}?workspace= ─────────────────────────────────

pub async fn delete_team(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(identifier): Path<String>,
    QueryParams(query): QueryParams<WorkspaceQuery>,
) -> Result<StatusCode, TrackerError> {
    let usecase = DeleteTeamUseCase {
        workspaces: state.workspace_repo(),
        members: state.member_repo(),
        teams: state.team_repo(),
    };
    usecase
        .execute(&query.workspace, ctx.user.id, &identifier)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── /api/team/{identifier}/members ───────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddTeamMemberRequest {
    pub user_id: Uuid,
    #[serde(default)]
    pub role: TeamRole,
}

pub async fn add_team_member(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(identifier): Path<String>,
    QueryParams(query): QueryParams<WorkspaceQuery>,
    JsonBody(body): JsonBody<AddTeamMemberRequest>,
) -> Result<(StatusCode, Json<TeamMembershipResponse>), TrackerError> {
    let usecase = AddTeamMemberUseCase {
        workspaces: state.workspace_repo(),
        members: state.member_repo(),
        teams: state.team_repo(),
    };
    let member = usecase
        .execute(
            &query.workspace,
            ctx.user.id,
            &identifier,
            body.user_id,
            body.role,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(member.into())))
}

#[derive(Deserialize)]
pub struct UpdateTeamMemberRequest {
    pub role: TeamRole,
}

pub async fn update_team_member(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path((identifier, user_id)): Path<(String, Uuid)>,
    QueryParams(query): QueryParams<WorkspaceQuery>,
    JsonBody(body): JsonBody<UpdateTeamMemberRequest>,
) -> Result<StatusCode, TrackerError> {
    let usecase = UpdateTeamMemberRoleUseCase {
        workspaces: state.workspace_repo(),
        members: state.member_repo(),
        teams: state.team_repo(),
    };
    usecase
        .execute(&query.workspace, ctx.user.id, &identifier, user_id, body.role)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove_team_member(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path((identifier, user_id)): Path<(String, Uuid)>,
    QueryParams(query): QueryParams<WorkspaceQuery>,
) -> Result<StatusCode, TrackerError> {
    let usecase = RemoveTeamMemberUseCase {
        workspaces: state.workspace_repo(),
        members: state.member_repo(),
        teams: state.team_repo(),
    };
    usecase
        .execute(&query.workspace, ctx.user.id, &identifier, user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
