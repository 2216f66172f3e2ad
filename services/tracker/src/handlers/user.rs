use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use axum_extra::extract::CookieJar;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tracker_auth_types::cookie::clear_session_cookie;
use tracker_core::serde::deserialize_some;

use crate::domain::types::User;
use crate::error::TrackerError;
use crate::extract::{CurrentUser, JsonBody, QueryParams};
use crate::handlers::AvailabilityResponse;
use crate::handlers::workspace::WorkspaceResponse;
use crate::state::AppState;
use crate::usecase::auth::CheckUsernameUseCase;
use crate::usecase::user::{
    DeleteAccountUseCase, ListMyWorkspacesUseCase, UpdateProfileInput, UpdateProfileUseCase,
};

// ── Response types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub email_verified: bool,
    pub username: Option<String>,
    pub display_username: Option<String>,
    pub image: Option<String>,
    pub two_factor_enabled: bool,
    #[serde(serialize_with = "tracker_core::serde::to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "tracker_core::serde::to_rfc3339_ms")]
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            email_verified: user.email_verified,
            username: user.username,
            display_username: user.display_username,
            image: user.image,
            two_factor_enabled: user.two_factor_enabled,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// `{ "user": ... }` envelope used by the sign-in style endpoints.
#[derive(Serialize)]
pub struct UserEnvelope {
    pub user: UserResponse,
}

// ── GET /api/user/me ─────────────────────────────────────────────────────────

pub async fn get_me(CurrentUser(ctx): CurrentUser) -> Json<UserResponse> {
    Json(ctx.user.into())
}

// ── PATCH /api/user/me ───────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct UpdateMeRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub username: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub image: Option<Option<String>>,
}

pub async fn update_me(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    JsonBody(body): JsonBody<UpdateMeRequest>,
) -> Result<Json<UserResponse>, TrackerError> {
    let usecase = UpdateProfileUseCase {
        users: state.user_repo(),
    };
    let user = usecase
        .execute(
            ctx.user.id,
            UpdateProfileInput {
                name: body.name,
                username: body.username,
                image: body.image,
            },
        )
        .await?;
    Ok(Json(user.into()))
}

// ── GET /api/user/check-username?username= ───────────────────────────────────

#[derive(Deserialize)]
pub struct CheckUsernameQuery {
    pub username: String,
}

pub async fn check_username(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    QueryParams(query): QueryParams<CheckUsernameQuery>,
) -> Result<Json<AvailabilityResponse>, TrackerError> {
    let usecase = CheckUsernameUseCase {
        users: state.user_repo(),
    };
    let available = usecase.execute(&query.username, Some(ctx.user.id)).await?;
    Ok(Json(AvailabilityResponse { available }))
}

// ── GET /api/user/workspaces ─────────────────────────────────────────────────

pub async fn list_my_workspaces(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
) -> Result<Json<Vec<WorkspaceResponse>>, TrackerError> {
    let usecase = ListMyWorkspacesUseCase {
        workspaces: state.workspace_repo(),
    };
    let list = usecase.execute(ctx.user.id).await?;
    let body = list
        .into_iter()
        .map(|(workspace, role)| WorkspaceResponse::with_role(workspace, role))
        .collect();
    Ok(Json(body))
}

// ── DELETE /api/user/me ──────────────────────────────────────────────────────

pub async fn delete_me(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    jar: CookieJar,
) -> Result<(StatusCode, CookieJar), TrackerError> {
    let usecase = DeleteAccountUseCase {
        users: state.user_repo(),
    };
    usecase.execute(ctx.user.id).await?;
    let jar = clear_session_cookie(jar, state.cookie_domain.clone());
    Ok((StatusCode::NO_CONTENT, jar))
}
