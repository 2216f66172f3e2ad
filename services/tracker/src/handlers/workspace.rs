use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tracker_core::serde::deserialize_some;
use tracker_domain::role::WorkspaceRole;

use crate::domain::types::{MemberProfile, Workspace, WorkspaceMember};
use crate::error::TrackerError;
use crate::extract::{CurrentUser, JsonBody, QueryParams};
use crate::handlers::AvailabilityResponse;
use crate::state::AppState;
use crate::usecase::member::{
    AddMemberInput, AddMemberUseCase, ListMembersUseCase, RemoveMemberUseCase,
    UpdateMemberRoleUseCase,
};
use crate::usecase::workspace::{
    CheckSlugUseCase, CreateWorkspaceInput, CreateWorkspaceUseCase, DeleteWorkspaceUseCase,
    GetWorkspaceUseCase, TransferOwnershipUseCase, UpdateWorkspaceInput, UpdateWorkspaceUseCase,
};

// ── Response types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceResponse {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub logo: Option<String>,
    pub owner_id: Uuid,
    /// The caller's role, where known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<WorkspaceRole>,
    #[serde(serialize_with = "tracker_core::serde::to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "tracker_core::serde::to_rfc3339_ms")]
    pub updated_at: DateTime<Utc>,
}

impl From<Workspace> for WorkspaceResponse {
    fn from(workspace: Workspace) -> Self {
        Self {
            id: workspace.id,
            name: workspace.name,
            slug: workspace.slug,
            description: workspace.description,
            logo: workspace.logo,
            owner_id: workspace.owner_id,
            role: None,
            created_at: workspace.created_at,
            updated_at: workspace.updated_at,
        }
    }
}

impl WorkspaceResponse {
    pub fn with_role(workspace: Workspace, role: WorkspaceRole) -> Self {
        Self {
            role: Some(role),
            ..Self::from(workspace)
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberResponse {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub username: Option<String>,
    pub image: Option<String>,
    pub role: WorkspaceRole,
    #[serde(serialize_with = "tracker_core::serde::to_rfc3339_ms")]
    pub joined_at: DateTime<Utc>,
}

impl From<MemberProfile> for MemberResponse {
    fn from(member: MemberProfile) -> Self {
        Self {
            user_id: member.user.id,
            name: member.user.name,
            email: member.user.email,
            username: member.user.display_username,
            image: member.user.image,
            role: member.role,
            joined_at: member.joined_at,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipResponse {
    pub workspace_id: Uuid,
    pub user_id: Uuid,
    pub role: WorkspaceRole,
    #[serde(serialize_with = "tracker_core::serde::to_rfc3339_ms")]
    pub joined_at: DateTime<Utc>,
}

impl From<WorkspaceMember> for MembershipResponse {
    fn from(member: WorkspaceMember) -> Self {
        Self {
            workspace_id: member.workspace_id,
            user_id: member.user_id,
            role: member.role,
            joined_at: member.joined_at,
        }
    }
}

// ── POST /api/workspace/create ───────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateWorkspaceRequest {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
}

pub async fn create_workspace(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    JsonBody(body): JsonBody<CreateWorkspaceRequest>,
) -> Result<(StatusCode, Json<WorkspaceResponse>), TrackerError> {
    let usecase = CreateWorkspaceUseCase {
        workspaces: state.workspace_repo(),
    };
    let workspace = usecase
        .execute(
            ctx.user.id,
            CreateWorkspaceInput {
                name: body.name,
                slug: body.slug,
                description: body.description,
            },
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(WorkspaceResponse::with_role(workspace, WorkspaceRole::Owner)),
    ))
}

// ── GET /api/workspace/check-slug?slug= ──────────────────────────────────────

#[derive(Deserialize)]
pub struct CheckSlugQuery {
    pub slug: String,
}

pub async fn check_slug(
    State(state): State<AppState>,
    _user: CurrentUser,
    QueryParams(query): QueryParams<CheckSlugQuery>,
) -> Result<Json<AvailabilityResponse>, TrackerError> {
    let usecase = CheckSlugUseCase {
        workspaces: state.workspace_repo(),
    };
    let available = usecase.execute(&query.slug).await?;
    Ok(Json(AvailabilityResponse { available }))
}

// ── GET /api/workspace/{slug} ────────────────────────────────────────────────

pub async fn get_workspace(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(slug): Path<String>,
) -> Result<Json<WorkspaceResponse>, TrackerError> {
    let usecase = GetWorkspaceUseCase {
        workspaces: state.workspace_repo(),
        members: state.member_repo(),
    };
    let access = usecase.execute(&slug, ctx.user.id).await?;
    Ok(Json(WorkspaceResponse::with_role(
        access.workspace,
        access.role,
    )))
}

// ── PATCH /api/workspace/{slug} ──────────────────────────────────────────────

#[derive(Deserialize)]
pub struct UpdateWorkspaceRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub logo: Option<Option<String>>,
}

pub async fn update_workspace(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(slug): Path<String>,
    JsonBody(body): JsonBody<UpdateWorkspaceRequest>,
) -> Result<Json<WorkspaceResponse>, TrackerError> {
    let usecase = UpdateWorkspaceUseCase {
        workspaces: state.workspace_repo(),
        members: state.member_repo(),
    };
    let access = usecase
        .execute(
            &slug,
            ctx.user.id,
            UpdateWorkspaceInput {
                name: body.name,
                slug: body.slug,
                description: body.description,
                logo: body.logo,
            },
        )
        .await?;
    Ok(Json(WorkspaceResponse::with_role(
        access.workspace,
        access.role,
    )))
}

// ── DELETE /api/workspace/{slug} ─────────────────────────────────────────────

pub async fn delete_workspace(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(slug): Path<String>,
) -> Result<StatusCode, TrackerError> {
    let usecase = DeleteWorkspaceUseCase {
        workspaces: state.workspace_repo(),
        members: state.member_repo(),
    };
    usecase.execute(&slug, ctx.user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── POST /api/workspace/{slug}/transfer-ownership ────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferOwnershipRequest {
    pub user_id: Uuid,
}

pub async fn transfer_ownership(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(slug): Path<String>,
    JsonBody(body): JsonBody<TransferOwnershipRequest>,
) -> Result<StatusCode, TrackerError> {
    let usecase = TransferOwnershipUseCase {
        workspaces: state.workspace_repo(),
        members: state.member_repo(),
    };
    usecase.execute(&slug, ctx.user.id, body.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── /api/workspace/{slug}/members ────────────────────────────────────────────

pub async fn list_members(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(slug): Path<String>,
) -> Result<Json<Vec<MemberResponse>>, TrackerError> {
    let usecase = ListMembersUseCase {
        workspaces: state.workspace_repo(),
        members: state.member_repo(),
    };
    let members = usecase.execute(&slug, ctx.user.id).await?;
    Ok(Json(members.into_iter().map(MemberResponse::from).collect()))
}

#[derive(Deserialize)]
pub struct AddMemberRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub role: WorkspaceRole,
}

pub async fn add_member(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(slug): Path<String>,
    JsonBody(body): JsonBody<AddMemberRequest>,
) -> Result<(StatusCode, Json<MembershipResponse>), TrackerError> {
    let usecase = AddMemberUseCase {
        workspaces: state.workspace_repo(),
        members: state.member_repo(),
        users: state.user_repo(),
    };
    let member = usecase
        .execute(
            &slug,
            ctx.user.id,
            AddMemberInput {
                email: body.email,
                username: body.username,
                role: body.role,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(member.into())))
}

#[derive(Deserialize)]
pub struct UpdateMemberRoleRequest {
    pub role: WorkspaceRole,
}

pub async fn update_member_role(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path((slug, user_id)): Path<(String, Uuid)>,
    JsonBody(body): JsonBody<UpdateMemberRoleRequest>,
) -> Result<StatusCode, TrackerError> {
    let usecase = UpdateMemberRoleUseCase {
        workspaces: state.workspace_repo(),
        members: state.member_repo(),
    };
    usecase
        .execute(&slug, ctx.user.id, user_id, body.role)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove_member(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path((slug, user_id)): Path<(String, Uuid)>,
) -> Result<StatusCode, TrackerError> {
    let usecase = RemoveMemberUseCase {
        workspaces: state.workspace_repo(),
        members: state.member_repo(),
    };
    usecase.execute(&slug, ctx.user.id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
