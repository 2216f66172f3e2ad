//! Request extractors for the signed-in caller and client details.

use axum::extract::{FromRequest, FromRequestParts, Query};
use axum::http::HeaderMap;
use axum::http::header::USER_AGENT;
use axum::http::request::Parts;

use tracker_auth_types::session::SessionToken;

use crate::domain::types::ClientMeta;
use crate::error::TrackerError;
use crate::state::AppState;
use crate::usecase::session::{AuthContext, ResolveSessionUseCase};

/// `Json` body extractor whose rejections render as `VALIDATION` errors.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(TrackerError))]
pub struct JsonBody<T>(pub T);

/// `Query` extractor whose rejections render as `VALIDATION` errors.
#[derive(FromRequestParts)]
#[from_request(via(Query), rejection(TrackerError))]
pub struct QueryParams<T>(pub T);

/// The caller's session, resolved against the database.
///
/// Rejects with 401 when the token is missing, unknown or expired.
pub struct CurrentUser(pub AuthContext);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = TrackerError;

    fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let token = SessionToken::from_request_parts(parts, state);
        let usecase = ResolveSessionUseCase {
            sessions: state.session_repo(),
            users: state.user_repo(),
        };
        async move {
            let SessionToken(token) = token.await?;
            let ctx = usecase.execute(&token).await?;
            Ok(Self(ctx))
        }
    }
}

/// User agent and client address recorded on new sessions.
pub struct ClientInfo(pub ClientMeta);

impl ClientInfo {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let user_agent = headers
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        // First hop of x-forwarded-for is the original client.
        let ip_address = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .or_else(|| {
                headers
                    .get("x-real-ip")
                    .and_then(|v| v.to_str().ok())
                    .map(str::trim)
            })
            .map(str::to_owned);
        Self(ClientMeta {
            ip_address,
            user_agent,
        })
    }
}

impl<S> FromRequestParts<S> for ClientInfo
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let info = Self::from_headers(&parts.headers);
        async move { Ok(info) }
    }
}
