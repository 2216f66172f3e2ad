//! Extractor for the raw session token.

use axum::extract::FromRequestParts;
use axum_extra::extract::cookie::CookieJar;
use http::HeaderMap;
use http::header::AUTHORIZATION;
use http::request::Parts;
use tracker_core::error::AppError;

use crate::cookie::TRACKER_SESSION;

/// Raw session token taken from the `tracker_session` cookie, or from an
/// `Authorization: Bearer <token>` header when no cookie is present.
///
/// Rejects with 401 when neither is present. Looking the token up is the
/// service's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken(pub String);

impl SessionToken {
    /// Read the token without rejecting, for routes where a session is optional.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let jar = CookieJar::from_headers(headers);
        if let Some(cookie) = jar.get(TRACKER_SESSION).filter(|c| !c.value().is_empty()) {
            return Some(Self(cookie.value().to_owned()));
        }
        headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| Self(t.to_owned()))
    }
}

impl<S> FromRequestParts<S> for SessionToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    // Extract synchronously and hand back a 'static future so the borrow of
    // `parts` does not leak into the returned future.
    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let token = Self::from_headers(&parts.headers);
        async move { token.ok_or(AppError::Unauthorized) }
    }
}
