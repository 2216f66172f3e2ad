//! sea-orm entities for the tracker database.
//!
//! Enum-like columns (`role`, `status`, `priority`) are stored as text and
//! converted through the `tracker-domain` enums at the repository boundary.

pub mod accounts;
pub mod issues;
pub mod outbox_events;
pub mod passkeys;
pub mod project_teams;
pub mod projects;
pub mod sessions;
pub mod team_members;
pub mod teams;
pub mod two_factors;
pub mod users;
pub mod verifications;
pub mod workspace_members;
pub mod workspaces;
