pub mod auth;
pub mod issue;
pub mod passkey;
pub mod project;
pub mod team;
pub mod two_factor;
pub mod user;
pub mod workspace;

use axum::http::{HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::error::TrackerError;

/// `?workspace=<slug>` carried by every team, project and issue route.
#[derive(Deserialize)]
pub struct WorkspaceQuery {
    pub workspace: String,
}

#[derive(Serialize)]
pub struct AvailabilityResponse {
    pub available: bool,
}

/// Build a `(name, value)` response header without panicking on odd input.
pub(crate) fn header(
    name: &'static str,
    value: &str,
) -> Result<(HeaderName, HeaderValue), TrackerError> {
    let value = HeaderValue::from_str(value)
        .map_err(|e| TrackerError::Internal(anyhow::Error::new(e).context("header value")))?;
    Ok((HeaderName::from_static(name), value))
}
