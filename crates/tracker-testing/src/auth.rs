//! Mock session credentials for router tests.
//!
//! The service resolves a session from the `tracker_session` cookie or a
//! bearer header. Tests seed a session row for a known raw token and send it
//! with one of these helpers.

use axum::http::{HeaderName, HeaderValue};
use uuid::Uuid;

use tracker_auth_types::cookie::{TRACKER_SESSION, TRACKER_TWO_FACTOR};

/// A raw session token a test has registered with its session store.
#[derive(Debug, Clone)]
pub struct MockSession {
    pub token: String,
}

impl MockSession {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// A fresh random token.
    pub fn random() -> Self {
        Self::new(format!("test-{}", Uuid::new_v4().simple()))
    }

    /// `cookie: tracker_session=<token>`.
    pub fn cookie_header(&self) -> (HeaderName, HeaderValue) {
        (
            http::header::COOKIE,
            HeaderValue::from_str(&format!("{TRACKER_SESSION}={}", self.token)).unwrap(),
        )
    }

    /// `authorization: Bearer <token>`.
    pub fn bearer_header(&self) -> (HeaderName, HeaderValue) {
        (
            http::header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.token)).unwrap(),
        )
    }
}

/// `cookie: tracker_two_factor=<ticket>`.
pub fn two_factor_cookie(ticket: &str) -> (HeaderName, HeaderValue) {
    (
        http::header::COOKIE,
        HeaderValue::from_str(&format!("{TRACKER_TWO_FACTOR}={ticket}")).unwrap(),
    )
}
