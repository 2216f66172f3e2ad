use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tracker_domain::id::IssueKey;
use tracker_domain::pagination::{PageRequest, Sort};
use tracker_domain::role::{TeamRole, WorkspaceRole};
use tracker_domain::status::{IssuePriority, IssueStatus, ProjectStatus};

/// Session lifetime.
pub const SESSION_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// A session is extended once it is older than this.
pub const SESSION_UPDATE_AGE_SECS: i64 = 24 * 60 * 60;

/// Two-factor ticket lifetime.
pub const TWO_FACTOR_TICKET_TTL_SECS: i64 = 5 * 60;

/// Password reset token lifetime.
pub const RESET_TOKEN_TTL_SECS: i64 = 60 * 60;

/// WebAuthn ceremony state TTL in seconds.
pub const PASSKEY_STATE_TTL_SECS: u64 = 120;

pub const CREDENTIAL_PROVIDER: &str = "credential";
pub const PASSWORD_RESET_REQUESTED: &str = "password_reset_requested";

// ── Identity ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub email_verified: bool,
    pub username: Option<String>,
    pub display_username: Option<String>,
    pub image: Option<String>,
    pub two_factor_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial profile update. Outer `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub name: Option<String>,
    /// `(normalized, display)`; inner `None` clears the username.
    pub username: Option<Option<(String, String)>>,
    pub image: Option<Option<String>>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.username.is_none() && self.image.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(user_id: Uuid, token_hash: String, meta: ClientMeta, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id,
            token_hash,
            expires_at: now + Duration::seconds(SESSION_TTL_SECS),
            ip_address: meta.ip_address,
            user_agent: meta.user_agent,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Sliding expiry: refresh once the last refresh is older than a day.
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        now - self.updated_at >= Duration::seconds(SESSION_UPDATE_AGE_SECS)
    }
}

/// Client details recorded on a new session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientMeta {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TwoFactorRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Encrypted TOTP secret.
    pub secret: String,
    /// Hashes of the unused backup codes.
    pub backup_codes: Vec<String>,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
}

/// Stored WebAuthn passkey credential.
#[derive(Debug, Clone)]
pub struct PasskeyRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: Option<String>,
    pub credential_id: Vec<u8>,
    pub aaguid: Uuid,
    /// JSON-serialized `webauthn_rs::Passkey` (with counter).
    pub credential: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

/// One-time token row.
#[derive(Debug, Clone)]
pub struct Verification {
    pub id: Uuid,
    pub identifier: String,
    pub value_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Verification {
    pub fn reset_password_identifier(user_id: Uuid) -> String {
        format!("reset-password:{user_id}")
    }

    /// The user a password reset token was issued for.
    pub fn reset_password_user(&self) -> Option<Uuid> {
        self.identifier
            .strip_prefix("reset-password:")
            .and_then(|id| id.parse().ok())
    }
}

/// Outbox event for async delivery (e.g. password reset mail).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboxEvent {
    pub id: Uuid,
    pub kind: String,
    pub payload: serde_json::Value,
    pub idempotency_key: String,
}

// ── Tenancy ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub logo: Option<String>,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct WorkspacePatch {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<Option<String>>,
    pub logo: Option<Option<String>>,
}

impl WorkspacePatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.slug.is_none()
            && self.description.is_none()
            && self.logo.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceMember {
    pub workspace_id: Uuid,
    pub user_id: Uuid,
    pub role: WorkspaceRole,
    pub joined_at: DateTime<Utc>,
}

/// Member row joined with the user's public profile.
#[derive(Debug, Clone)]
pub struct MemberProfile {
    pub user: User,
    pub role: WorkspaceRole,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub name: String,
    pub identifier: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct TeamPatch {
    pub name: Option<String>,
    pub identifier: Option<String>,
    pub description: Option<Option<String>>,
}

impl TeamPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.identifier.is_none() && self.description.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamMember {
    pub team_id: Uuid,
    pub user_id: Uuid,
    pub role: TeamRole,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct TeamMemberProfile {
    pub user: User,
    pub role: TeamRole,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub name: String,
    pub identifier: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub lead_id: Option<Uuid>,
    pub creator_id: Uuid,
    pub issue_counter: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub identifier: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<ProjectStatus>,
    pub lead_id: Option<Option<Uuid>>,
}

impl ProjectPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.identifier.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.lead_id.is_none()
    }
}

// ── Issues ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub project_id: Uuid,
    pub number: i32,
    pub title: String,
    pub description: Option<String>,
    pub status: IssueStatus,
    pub priority: IssuePriority,
    pub assignee_id: Option<Uuid>,
    pub creator_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Issue joined with the identifier of its project, enough to render the key.
#[derive(Debug, Clone)]
pub struct IssueWithKey {
    pub issue: Issue,
    pub project_identifier: String,
}

impl IssueWithKey {
    pub fn key(&self) -> IssueKey {
        IssueKey::new(self.project_identifier.clone(), self.issue.number)
    }
}

/// Issue fields before a number is allocated.
#[derive(Debug, Clone)]
pub struct NewIssue {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: IssueStatus,
    pub priority: IssuePriority,
    pub assignee_id: Option<Uuid>,
    pub creator_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct IssuePatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<IssueStatus>,
    pub priority: Option<IssuePriority>,
    pub assignee_id: Option<Option<Uuid>>,
}

impl IssuePatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.assignee_id.is_none()
    }
}

/// Sort options for issue list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueSortBy {
    CreatedAt(Sort),
    UpdatedAt(Sort),
    Number(Sort),
    Priority(Sort),
}

impl Default for IssueSortBy {
    fn default() -> Self {
        Self::CreatedAt(Sort::Desc)
    }
}

impl IssueSortBy {
    pub fn from_kebab_case(s: &str) -> Option<Self> {
        let (field, sort) = Sort::split_suffix(s)?;
        match field {
            "created-at" => Some(Self::CreatedAt(sort)),
            "updated-at" => Some(Self::UpdatedAt(sort)),
            "number" => Some(Self::Number(sort)),
            "priority" => Some(Self::Priority(sort)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct IssueFilter {
    pub workspace_id: Uuid,
    pub project_id: Option<Uuid>,
    pub statuses: Vec<IssueStatus>,
    pub priority: Option<IssuePriority>,
    pub assignee_id: Option<Uuid>,
    pub sort_by: IssueSortBy,
    pub page: PageRequest,
}
