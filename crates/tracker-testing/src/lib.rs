//! Test utilities for tracker services.
//!
//! Session headers for authenticated requests and small JSON assertions.
//! Import from tests only, never from production code.

pub mod auth;
pub mod json;
