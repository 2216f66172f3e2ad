#![allow(async_fn_in_trait)]

use chrono::{DateTime, Utc};
use uuid::Uuid;

use tracker_domain::role::{TeamRole, WorkspaceRole};
use tracker_domain::status::ProjectStatus;

use crate::domain::types::{
    Issue, IssueFilter, IssuePatch, IssueWithKey, MemberProfile, NewIssue, OutboxEvent,
    PasskeyRecord, Project, ProjectPatch, Session, Team, TeamMember, TeamMemberProfile,
    TeamPatch, TwoFactorRecord, User, UserPatch, Verification, Workspace, WorkspaceMember,
    WorkspacePatch,
};
use crate::error::TrackerError;

// ── Identity ──────────────────────────────────────────────────────────────────

pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, TrackerError>;

    /// `email` must already be normalized.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, TrackerError>;

    /// `username` must already be normalized (lower-cased).
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, TrackerError>;

    /// Password hash of the user's credential account, if any.
    async fn find_password_hash(&self, user_id: Uuid) -> Result<Option<String>, TrackerError>;

    /// Insert a user and its credential account in one transaction.
    /// Unique violations surface as `EmailTaken` / `UsernameTaken`.
    async fn create_with_account(
        &self,
        user: &User,
        password_hash: &str,
    ) -> Result<(), TrackerError>;

    async fn update_profile(&self, id: Uuid, patch: &UserPatch) -> Result<User, TrackerError>;

    async fn update_password_hash(
        &self,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<(), TrackerError>;

    async fn delete(&self, id: Uuid) -> Result<(), TrackerError>;

    async fn count_owned_workspaces(&self, user_id: Uuid) -> Result<u64, TrackerError>;
}

pub trait SessionRepository: Send + Sync {
    async fn create(&self, session: &Session) -> Result<(), TrackerError>;

    async fn find_by_token_hash(&self, token_hash: &str)
    -> Result<Option<Session>, TrackerError>;

    /// Slide the session window.
    async fn extend(
        &self,
        id: Uuid,
        expires_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<(), TrackerError>;

    /// Unexpired sessions of a user, newest first.
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Session>, TrackerError>;

    async fn delete(&self, id: Uuid) -> Result<(), TrackerError>;

    /// Delete a session only if it belongs to `user_id`. Returns `false` if nothing matched.
    async fn delete_for_user(&self, id: Uuid, user_id: Uuid) -> Result<bool, TrackerError>;

    /// Delete every session of a user except `keep`.
    async fn delete_by_user_except(
        &self,
        user_id: Uuid,
        keep: Option<Uuid>,
    ) -> Result<(), TrackerError>;
}

pub trait TwoFactorRepository: Send + Sync {
    async fn find_by_user(&self, user_id: Uuid) -> Result<Option<TwoFactorRecord>, TrackerError>;

    /// Insert or replace the user's (unverified) enrolment.
    async fn upsert(&self, record: &TwoFactorRecord) -> Result<(), TrackerError>;

    /// Mark the enrolment verified and set `users.two_factor_enabled`, atomically.
    async fn mark_verified(&self, user_id: Uuid) -> Result<(), TrackerError>;

    async fn replace_backup_codes(
        &self,
        user_id: Uuid,
        backup_codes: &[String],
    ) -> Result<(), TrackerError>;

    /// Remove one backup-code hash under a row lock. `false` when the hash
    /// was not (or is no longer) present.
    async fn consume_backup_code(
        &self,
        user_id: Uuid,
        code_hash: &str,
    ) -> Result<bool, TrackerError>;

    /// Delete the enrolment and clear `users.two_factor_enabled`, atomically.
    async fn delete_by_user(&self, user_id: Uuid) -> Result<(), TrackerError>;
}

/// Repository for WebAuthn passkey credentials.
pub trait PasskeyRepository: Send + Sync {
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<PasskeyRecord>, TrackerError>;

    async fn create(&self, record: &PasskeyRecord) -> Result<(), TrackerError>;

    /// Returns `false` if the passkey does not exist or belongs to someone else.
    async fn rename(
        &self,
        id: Uuid,
        user_id: Uuid,
        name: Option<String>,
    ) -> Result<bool, TrackerError>;

    /// Returns `false` if the passkey does not exist or belongs to someone else.
    async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<bool, TrackerError>;

    /// Replace a stored credential (signature counter update after authentication).
    async fn update_credential(&self, id: Uuid, credential: &[u8]) -> Result<(), TrackerError>;
}

/// Cache for WebAuthn ceremony states (Redis, short TTL).
pub trait PasskeyCache: Send + Sync {
    async fn set_registration_state(
        &self,
        user_id: Uuid,
        reg_id: &str,
        state_json: &[u8],
    ) -> Result<(), TrackerError>;

    async fn take_registration_state(
        &self,
        user_id: Uuid,
        reg_id: &str,
    ) -> Result<Option<Vec<u8>>, TrackerError>;

    async fn set_authentication_state(
        &self,
        auth_id: &str,
        state_json: &[u8],
    ) -> Result<(), TrackerError>;

    async fn take_authentication_state(
        &self,
        auth_id: &str,
    ) -> Result<Option<Vec<u8>>, TrackerError>;
}

pub trait VerificationRepository: Send + Sync {
    /// Insert the verification and its outbox event in one transaction.
    async fn create_with_outbox(
        &self,
        verification: &Verification,
        event: &OutboxEvent,
    ) -> Result<(), TrackerError>;

    /// Delete and return the verification with this hash. Single use.
    async fn take_by_hash(&self, value_hash: &str) -> Result<Option<Verification>, TrackerError>;
}

// ── Tenancy ───────────────────────────────────────────────────────────────────

pub trait WorkspaceRepository: Send + Sync {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Workspace>, TrackerError>;

    async fn slug_exists(&self, slug: &str) -> Result<bool, TrackerError>;

    /// Insert the workspace and the owner's membership in one transaction.
    async fn create_with_owner(&self, workspace: &Workspace) -> Result<(), TrackerError>;

    async fn update(&self, id: Uuid, patch: &WorkspacePatch) -> Result<Workspace, TrackerError>;

    async fn delete(&self, id: Uuid) -> Result<(), TrackerError>;

    /// Workspaces the user belongs to, with the user's role in each.
    async fn list_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<(Workspace, WorkspaceRole)>, TrackerError>;

    /// Move ownership to `to`; the previous owner becomes an admin.
    async fn transfer_ownership(
        &self,
        workspace_id: Uuid,
        from: Uuid,
        to: Uuid,
    ) -> Result<(), TrackerError>;
}

pub trait MemberRepository: Send + Sync {
    async fn find_role(
        &self,
        workspace_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<WorkspaceRole>, TrackerError>;

    async fn list(&self, workspace_id: Uuid) -> Result<Vec<MemberProfile>, TrackerError>;

    /// Fails with `AlreadyMember` on a duplicate membership.
    async fn add(&self, member: &WorkspaceMember) -> Result<(), TrackerError>;

    async fn update_role(
        &self,
        workspace_id: Uuid,
        user_id: Uuid,
        role: WorkspaceRole,
    ) -> Result<(), TrackerError>;

    /// Remove the membership and the user's team memberships in the workspace.
    async fn remove(&self, workspace_id: Uuid, user_id: Uuid) -> Result<(), TrackerError>;
}

pub trait TeamRepository: Send + Sync {
    async fn find_by_identifier(
        &self,
        workspace_id: Uuid,
        identifier: &str,
    ) -> Result<Option<Team>, TrackerError>;

    async fn identifier_exists(
        &self,
        workspace_id: Uuid,
        identifier: &str,
    ) -> Result<bool, TrackerError>;

    async fn list(&self, workspace_id: Uuid) -> Result<Vec<Team>, TrackerError>;

    /// Insert the team and its first lead in one transaction.
    async fn create_with_lead(&self, team: &Team, lead_id: Uuid) -> Result<(), TrackerError>;

    async fn update(&self, id: Uuid, patch: &TeamPatch) -> Result<Team, TrackerError>;

    async fn delete(&self, id: Uuid) -> Result<(), TrackerError>;

    async fn member_role(
        &self,
        team_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<TeamRole>, TrackerError>;

    async fn list_members(&self, team_id: Uuid) -> Result<Vec<TeamMemberProfile>, TrackerError>;

    /// Fails with `AlreadyMember` on a duplicate membership.
    async fn add_member(&self, member: &TeamMember) -> Result<(), TrackerError>;

    /// Returns `false` if the user is not in the team.
    async fn update_member_role(
        &self,
        team_id: Uuid,
        user_id: Uuid,
        role: TeamRole,
    ) -> Result<bool, TrackerError>;

    /// Returns `false` if the user is not in the team.
    async fn remove_member(&self, team_id: Uuid, user_id: Uuid) -> Result<bool, TrackerError>;

    /// Whether the user leads any of the given teams.
    async fn leads_any(&self, team_ids: &[Uuid], user_id: Uuid) -> Result<bool, TrackerError>;
}

pub trait ProjectRepository: Send + Sync {
    async fn find_by_identifier(
        &self,
        workspace_id: Uuid,
        identifier: &str,
    ) -> Result<Option<Project>, TrackerError>;

    async fn identifier_exists(
        &self,
        workspace_id: Uuid,
        identifier: &str,
    ) -> Result<bool, TrackerError>;

    async fn list(
        &self,
        workspace_id: Uuid,
        status: Option<ProjectStatus>,
    ) -> Result<Vec<Project>, TrackerError>;

    /// Insert the project and its team links in one transaction.
    async fn create_with_teams(
        &self,
        project: &Project,
        team_ids: &[Uuid],
    ) -> Result<(), TrackerError>;

    async fn update(&self, id: Uuid, patch: &ProjectPatch) -> Result<Project, TrackerError>;

    async fn delete(&self, id: Uuid) -> Result<(), TrackerError>;

    /// Teams linked to the project, ordered by identifier.
    async fn teams(&self, project_id: Uuid) -> Result<Vec<Team>, TrackerError>;

    /// Idempotent.
    async fn link_team(&self, project_id: Uuid, team_id: Uuid) -> Result<(), TrackerError>;

    /// Returns `false` if the link did not exist.
    async fn unlink_team(&self, project_id: Uuid, team_id: Uuid) -> Result<bool, TrackerError>;
}

pub trait IssueRepository: Send + Sync {
    /// Allocate the next number of the project under a row lock and insert
    /// the issue, in one transaction.
    async fn create_next(&self, issue: &NewIssue) -> Result<Issue, TrackerError>;

    async fn find_by_number(
        &self,
        project_id: Uuid,
        number: i32,
    ) -> Result<Option<Issue>, TrackerError>;

    async fn list(&self, filter: &IssueFilter) -> Result<Vec<IssueWithKey>, TrackerError>;

    async fn update(&self, id: Uuid, patch: &IssuePatch) -> Result<Issue, TrackerError>;

    async fn delete(&self, id: Uuid) -> Result<(), TrackerError>;
}
