use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracker_core::error::{AppError, error_response};
use tracker_domain::id::InvalidIssueKey;
use tracker_domain::validate::{
    EmailError, FieldError, IdentifierError, PasswordError, SlugError, UsernameError,
};

/// Tracker service error variants.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("invalid two-factor code")]
    InvalidTwoFactorCode,
    #[error("two-factor verification expired, sign in again")]
    InvalidTwoFactorTicket,
    #[error("forbidden")]
    Forbidden,
    #[error("user not found")]
    UserNotFound,
    #[error("session not found")]
    SessionNotFound,
    #[error("passkey not found")]
    PasskeyNotFound,
    #[error("workspace not found")]
    WorkspaceNotFound,
    #[error("member not found")]
    MemberNotFound,
    #[error("team not found")]
    TeamNotFound,
    #[error("project not found")]
    ProjectNotFound,
    #[error("issue not found")]
    IssueNotFound,
    #[error("{0}")]
    Validation(String),
    #[error("email is already registered")]
    EmailTaken,
    #[error("username is already taken")]
    UsernameTaken,
    #[error("slug is already taken")]
    SlugTaken,
    #[error("identifier is already taken")]
    IdentifierTaken,
    #[error("user is already a member")]
    AlreadyMember,
    #[error("invalid or expired token")]
    InvalidToken,
    #[error("passkey challenge expired")]
    PasskeyChallengeExpired,
    #[error("invalid credential")]
    InvalidCredential,
    #[error("two-factor authentication is not enabled")]
    TwoFactorNotEnabled,
    #[error("transfer or delete your workspaces first")]
    OwnsWorkspaces,
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl TrackerError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::InvalidTwoFactorCode => "INVALID_TWO_FACTOR_CODE",
            Self::InvalidTwoFactorTicket => "INVALID_TWO_FACTOR_TICKET",
            Self::Forbidden => "FORBIDDEN",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::SessionNotFound => "SESSION_NOT_FOUND",
            Self::PasskeyNotFound => "PASSKEY_NOT_FOUND",
            Self::WorkspaceNotFound => "WORKSPACE_NOT_FOUND",
            Self::MemberNotFound => "MEMBER_NOT_FOUND",
            Self::TeamNotFound => "TEAM_NOT_FOUND",
            Self::ProjectNotFound => "PROJECT_NOT_FOUND",
            Self::IssueNotFound => "ISSUE_NOT_FOUND",
            Self::Validation(_) => "VALIDATION",
            Self::EmailTaken => "EMAIL_TAKEN",
            Self::UsernameTaken => "USERNAME_TAKEN",
            Self::SlugTaken => "SLUG_TAKEN",
            Self::IdentifierTaken => "IDENTIFIER_TAKEN",
            Self::AlreadyMember => "ALREADY_MEMBER",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::PasskeyChallengeExpired => "PASSKEY_CHALLENGE_EXPIRED",
            Self::InvalidCredential => "INVALID_CREDENTIAL",
            Self::TwoFactorNotEnabled => "TWO_FACTOR_NOT_ENABLED",
            Self::OwnsWorkspaces => "OWNS_WORKSPACES",
            Self::Internal(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized
            | Self::InvalidCredentials
            | Self::InvalidTwoFactorCode
            | Self::InvalidTwoFactorTicket => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::UserNotFound
            | Self::SessionNotFound
            | Self::PasskeyNotFound
            | Self::WorkspaceNotFound
            | Self::MemberNotFound
            | Self::TeamNotFound
            | Self::ProjectNotFound
            | Self::IssueNotFound => StatusCode::NOT_FOUND,
            Self::Validation(_)
            | Self::EmailTaken
            | Self::UsernameTaken
            | Self::SlugTaken
            | Self::IdentifierTaken
            | Self::AlreadyMember
            | Self::InvalidToken
            | Self::PasskeyChallengeExpired
            | Self::InvalidCredential
            | Self::TwoFactorNotEnabled
            | Self::OwnsWorkspaces => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for TrackerError {
    fn into_response(self) -> Response {
        // TraceLayer records method/uri/status for every request; 4xx are
        // expected client errors. Internal errors need the anyhow chain.
        if let Self::Internal(ref e) = self {
            tracing::error!(error = %format!("{e:#}"), kind = "INTERNAL", "internal error");
        }
        error_response(self.status(), self.kind(), self.to_string())
    }
}

impl From<AppError> for TrackerError {
    fn from(e: AppError) -> Self {
        match e {
            AppError::Unauthorized => Self::Unauthorized,
            AppError::Forbidden => Self::Forbidden,
            AppError::BadRequest(message) => Self::Validation(message),
            AppError::Internal(e) => Self::Internal(e),
        }
    }
}

macro_rules! validation_from {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl From<$ty> for TrackerError {
                fn from(e: $ty) -> Self {
                    Self::Validation(e.to_string())
                }
            }
        )+
    };
}

validation_from!(
    JsonRejection,
    QueryRejection,
    SlugError,
    IdentifierError,
    UsernameError,
    FieldError,
    EmailError,
    PasswordError,
    InvalidIssueKey,
);
