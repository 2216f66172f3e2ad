use axum::{
    Json,
    extract::{Path, RawQuery, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tracker_core::serde::deserialize_some;
use tracker_domain::id::IssueKey;
use tracker_domain::pagination::PageRequest;
use tracker_domain::status::{IssuePriority, IssueStatus};

use crate::domain::types::{IssueSortBy, IssueWithKey};
use crate::error::TrackerError;
use crate::extract::{CurrentUser, JsonBody, QueryParams};
use crate::handlers::WorkspaceQuery;
use crate::state::AppState;
use crate::usecase::issue::{
    CreateIssueInput, CreateIssueUseCase, DeleteIssueUseCase, GetIssueUseCase, ListIssuesInput,
    ListIssuesUseCase, UpdateIssueInput, UpdateIssueUseCase,
};

// ── Response types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueResponse {
    pub id: Uuid,
    pub key: IssueKey,
    pub project_id: Uuid,
    pub number: i32,
    pub title: String,
    pub description: Option<String>,
    pub status: IssueStatus,
    pub priority: IssuePriority,
    pub assignee_id: Option<Uuid>,
    pub creator_id: Uuid,
    #[serde(serialize_with = "tracker_core::serde::to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "tracker_core::serde::to_rfc3339_ms")]
    pub updated_at: DateTime<Utc>,
}

impl From<IssueWithKey> for IssueResponse {
    fn from(item: IssueWithKey) -> Self {
        let key = item.key();
        let issue = item.issue;
        Self {
            id: issue.id,
            key,
            project_id: issue.project_id,
            number: issue.number,
            title: issue.title,
            description: issue.description,
            status: issue.status,
            priority: issue.priority,
            assignee_id: issue.assignee_id,
            creator_id: issue.creator_id,
            created_at: issue.created_at,
            updated_at: issue.updated_at,
        }
    }
}

// ── POST /api/issue/create ───────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIssueRequest {
    pub workspace: String,
    pub project: String,
    pub title: String,
    pub description: Option<String>,
    pub status: Option<IssueStatus>,
    pub priority: Option<IssuePriority>,
    pub assignee_id: Option<Uuid>,
}

pub async fn create_issue(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    JsonBody(body): JsonBody<CreateIssueRequest>,
) -> Result<(StatusCode, Json<IssueResponse>), TrackerError> {
    let usecase = CreateIssueUseCase {
        workspaces: state.workspace_repo(),
        members: state.member_repo(),
        projects: state.project_repo(),
        issues: state.issue_repo(),
    };
    let issue = usecase
        .execute(
            &body.workspace,
            ctx.user.id,
            CreateIssueInput {
                project: body.project,
                title: body.title,
                description: body.description,
                status: body.status,
                priority: body.priority,
                assignee_id: body.assignee_id,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(issue.into())))
}

// ── GET /api/issue?workspace=&project=&status[]=&... ─────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct IssueListQuery {
    pub workspace: String,
    pub project: Option<String>,
    #[serde(default)]
    pub status: Vec<IssueStatus>,
    pub assignee: Option<Uuid>,
    pub priority: Option<IssuePriority>,
    pub sort_by: Option<String>,
    pub per_page: Option<u32>,
    pub page: Option<u32>,
}

/// Form encoding decodes `status%5B%5D=` as sent by `URLSearchParams`.
const LIST_QUERY_CONFIG: serde_qs::Config = serde_qs::Config::new().use_form_encoding(true);

fn parse_list_query(raw: &str) -> Result<IssueListQuery, TrackerError> {
    LIST_QUERY_CONFIG
        .deserialize_str(raw)
        .map_err(|e| TrackerError::Validation(format!("invalid query: {e}")))
}

pub async fn list_issues(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    RawQuery(raw_query): RawQuery,
) -> Result<Json<Vec<IssueResponse>>, TrackerError> {
    let query = parse_list_query(raw_query.as_deref().unwrap_or(""))?;

    let sort_by = match query.sort_by.as_deref() {
        None => IssueSortBy::default(),
        Some(raw) => IssueSortBy::from_kebab_case(raw)
            .ok_or_else(|| TrackerError::Validation(format!("unknown sort-by: {raw}")))?,
    };
    let page = PageRequest::from_query(query.per_page, query.page);

    let usecase = ListIssuesUseCase {
        workspaces: state.workspace_repo(),
        members: state.member_repo(),
        projects: state.project_repo(),
        issues: state.issue_repo(),
    };
    let issues = usecase
        .execute(
            &query.workspace,
            ctx.user.id,
            ListIssuesInput {
                project: query.project,
                statuses: query.status,
                assignee_id: query.assignee,
                priority: query.priority,
                sort_by,
                page,
            },
        )
        .await?;
    Ok(Json(issues.into_iter().map(IssueResponse::from).collect()))
}

// ── GET /api/issue/{key}?workspace= ──────────────────────────────────────────

pub async fn get_issue(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(key): Path<String>,
    QueryParams(query): QueryParams<WorkspaceQuery>,
) -> Result<Json<IssueResponse>, TrackerError> {
    let usecase = GetIssueUseCase {
        workspaces: state.workspace_repo(),
        members: state.member_repo(),
        projects: state.project_repo(),
        issues: state.issue_repo(),
    };
    let issue = usecase.execute(&query.workspace, ctx.user.id, &key).await?;
    Ok(Json(issue.into()))
}

// ── PATCH /api/issue/{key}?workspace= ────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateIssueRequest {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub description: Option<Option<String>>,
    pub status: Option<IssueStatus>,
    pub priority: Option<IssuePriority>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub assignee_id: Option<Option<Uuid>>,
}

pub async fn update_issue(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(key): Path<String>,
    QueryParams(query): QueryParams<WorkspaceQuery>,
    JsonBody(body): JsonBody<UpdateIssueRequest>,
) -> Result<Json<IssueResponse>, TrackerError> {
    let usecase = UpdateIssueUseCase {
        workspaces: state.workspace_repo(),
        members: state.member_repo(),
        projects: state.project_repo(),
        issues: state.issue_repo(),
    };
    let issue = usecase
        .execute(
            &query.workspace,
            ctx.user.id,
            &key,
            UpdateIssueInput {
                title: body.title,
                description: body.description,
                status: body.status,
                priority: body.priority,
                assignee_id: body.assignee_id,
            },
        )
        .await?;
    Ok(Json(issue.into()))
}

// ── DELETE /api/issue/{key}?workspace= ───────────────────────────────────────

pub async fn delete_issue(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(key): Path<String>,
    QueryParams(query): QueryParams<WorkspaceQuery>,
) -> Result<StatusCode, TrackerError> {
    let usecase = DeleteIssueUseCase {
        workspaces: state.workspace_repo(),
        members: state.member_repo(),
        teams: state.team_repo(),
        projects: state.project_repo(),
        issues: state.issue_repo(),
    };
    usecase.execute(&query.workspace, ctx.user.id, &key).await?;
    Ok(StatusCode::NO_CONTENT)
}
