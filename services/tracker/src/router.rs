use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{delete, get, patch, post},
};
use tower_http::trace::TraceLayer;

use tracker_core::health::{check_database, healthz};
use tracker_core::middleware::{propagate_request_id_layer, request_id_layer};

use crate::handlers::{
    auth::{
        change_password, forget_password, get_session, is_username_available, list_sessions,
        reset_password, revoke_other_sessions, revoke_session, sign_in_email, sign_in_username,
        sign_out, sign_up_email,
    },
    issue::{create_issue, delete_issue, get_issue, list_issues, update_issue},
    passkey::{
        delete_passkey, finish_authentication, finish_registration, list_passkeys,
        rename_passkey, start_authentication, start_registration,
    },
    project::{
        self as project_handlers, create_project, delete_project, get_project, link_team,
        list_projects, unlink_team, update_project,
    },
    team::{
        self as team_handlers, add_team_member, create_team, delete_team, get_team, list_teams,
        remove_team_member, update_team, update_team_member,
    },
    two_factor,
    user::{check_username, delete_me, get_me, list_my_workspaces, update_me},
    workspace::{
        add_member, check_slug, create_workspace, delete_workspace, get_workspace, list_members,
        remove_member, transfer_ownership, update_member_role, update_workspace,
    },
};
use crate::state::AppState;

async fn readyz(State(state): State<AppState>) -> StatusCode {
    check_database(&state.db).await
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Auth
        .route("/api/auth/sign-up/email", post(sign_up_email))
        .route("/api/auth/sign-in/email", post(sign_in_email))
        .route("/api/auth/sign-in/username", post(sign_in_username))
        .route("/api/auth/sign-out", post(sign_out))
        .route("/api/auth/get-session", get(get_session))
        .route("/api/auth/list-sessions", get(list_sessions))
        .route("/api/auth/revoke-session", post(revoke_session))
        .route("/api/auth/revoke-other-sessions", post(revoke_other_sessions))
        .route("/api/auth/change-password", post(change_password))
        .route("/api/auth/is-username-available", post(is_username_available))
        .route("/api/auth/forget-password", post(forget_password))
        .route("/api/auth/reset-password", post(reset_password))
        // Two-factor
        .route("/api/auth/two-factor/enable", post(two_factor::enable))
        .route("/api/auth/two-factor/verify-totp", post(two_factor::verify_totp))
        .route(
            "/api/auth/two-factor/verify-backup-code",
            post(two_factor::verify_backup_code),
        )
        .route(
            "/api/auth/two-factor/generate-backup-codes",
            post(two_factor::generate_backup_codes),
        )
        .route("/api/auth/two-factor/disable", post(two_factor::disable))
        // Passkeys
        .route("/api/auth/passkeys", get(list_passkeys))
        .route("/api/auth/passkeys/{id}", patch(rename_passkey))
        .route("/api/auth/passkeys/{id}", delete(delete_passkey))
        .route("/api/auth/passkey/registration", post(start_registration))
        .route("/api/auth/passkey/registration", patch(finish_registration))
        .route("/api/auth/passkey/authentication", post(start_authentication))
        .route("/api/auth/passkey/authentication", patch(finish_authentication))
        // User
        .route("/api/user/me", get(get_me))
        .route("/api/user/me", patch(update_me))
        .route("/api/user/me", delete(delete_me))
        .route("/api/user/check-username", get(check_username))
        .route("/api/user/workspaces", get(list_my_workspaces))
        // Workspaces
        .route("/api/workspace/create", post(create_workspace))
        .route("/api/workspace/check-slug", get(check_slug))
        .route("/api/workspace/{slug}", get(get_workspace))
        .route("/api/workspace/{slug}", patch(update_workspace))
        .route("/api/workspace/{slug}", delete(delete_workspace))
        .route(
            "/api/workspace/{slug}/transfer-ownership",
            post(transfer_ownership),
        )
        .route("/api/workspace/{slug}/members", get(list_members))
        .route("/api/workspace/{slug}/members", post(add_member))
        .route(
            "/api/workspace/{slug}/members/{user_id}",
            patch(update_member_role),
        )
        .route(
            "/api/workspace/{slug}/members/{user_id}",
            delete(remove_member),
        )
        // Teams
        .route("/api/team", get(list_teams))
        .route("/api/team/create", post(create_team))
        .route(
            "/api/team/check-identifier",
            get(team_handlers::check_identifier),
        )
        .route("/api/team/{identifier}", get(get_team))
        .route("/api/team/{identifier}", patch(update_team))
        .route("/api/team/{identifier}", delete(delete_team))
        .route("/api/team/{identifier}/members", post(add_team_member))
        .route(
            "/api/team/{identifier}/members/{user_id}",
            patch(update_team_member),
        )
        .route(
            "/api/team/{identifier}/members/{user_id}",
            delete(remove_team_member),
        )
        // Projects
        .route("/api/project", get(list_projects))
        .route("/api/project/create", post(create_project))
        .route(
            "/api/project/check-identifier",
            get(project_handlers::check_identifier),
        )
        .route("/api/project/{identifier}", get(get_project))
        .route("/api/project/{identifier}", patch(update_project))
        .route("/api/project/{identifier}", delete(delete_project))
        .route("/api/project/{identifier}/teams", post(link_team))
        .route(
            "/api/project/{identifier}/teams/{team_identifier}",
            delete(unlink_team),
        )
        // Issues
        .route("/api/issue", get(list_issues))
        .route("/api/issue/create", post(create_issue))
        .route("/api/issue/{key}", get(get_issue))
        .route("/api/issue/{key}", patch(update_issue))
        .route("/api/issue/{key}", delete(delete_issue))
        .layer(propagate_request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(request_id_layer())
        .with_state(state)
}
