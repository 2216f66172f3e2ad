//! sea-orm implementations of the repository traits.

mod issue;
mod passkey;
mod project;
mod session;
mod team;
mod two_factor;
mod user;
mod verification;
mod workspace;

use std::str::FromStr;

use anyhow::Context as _;

pub use issue::DbIssueRepository;
pub use passkey::DbPasskeyRepository;
pub use project::DbProjectRepository;
pub use session::DbSessionRepository;
pub use team::DbTeamRepository;
pub use two_factor::DbTwoFactorRepository;
pub use user::DbUserRepository;
pub use verification::DbVerificationRepository;
pub use workspace::{DbMemberRepository, DbWorkspaceRepository};

/// Parse an enum stored as text. A bad value means the row was written
/// outside the service, so it surfaces as an internal error.
fn parse_stored<T>(value: &str, column: &'static str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .parse()
        .with_context(|| format!("unexpected {column} value in database"))
}
