use std::sync::Arc;

use deadpool_redis::Pool as RedisPool;
use sea_orm::DatabaseConnection;
use webauthn_rs::Webauthn;

use crate::infra::cache::RedisPasskeyCache;
use crate::infra::db::{
    DbIssueRepository, DbMemberRepository, DbPasskeyRepository, DbProjectRepository,
    DbSessionRepository, DbTeamRepository, DbTwoFactorRepository, DbUserRepository,
    DbVerificationRepository, DbWorkspaceRepository,
};
use crate::usecase::two_factor::TotpSettings;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub redis: RedisPool,
    pub webauthn: Arc<Webauthn>,
    /// Signs two-factor tickets.
    pub auth_secret: String,
    /// AES-256 key for TOTP secrets at rest, derived from `auth_secret`.
    pub encryption_key: [u8; 32],
    pub cookie_domain: String,
    pub app_name: String,
}

impl AppState {
    pub fn user_repo(&self) -> DbUserRepository {
        DbUserRepository {
            db: self.db.clone(),
        }
    }

    pub fn session_repo(&self) -> DbSessionRepository {
        DbSessionRepository {
            db: self.db.clone(),
        }
    }

    pub fn two_factor_repo(&self) -> DbTwoFactorRepository {
        DbTwoFactorRepository {
            db: self.db.clone(),
        }
    }

    pub fn passkey_repo(&self) -> DbPasskeyRepository {
        DbPasskeyRepository {
            db: self.db.clone(),
        }
    }

    pub fn passkey_cache(&self) -> RedisPasskeyCache {
        RedisPasskeyCache {
            pool: self.redis.clone(),
        }
    }

    pub fn verification_repo(&self) -> DbVerificationRepository {
        DbVerificationRepository {
            db: self.db.clone(),
        }
    }

    pub fn workspace_repo(&self) -> DbWorkspaceRepository {
        DbWorkspaceRepository {
            db: self.db.clone(),
        }
    }

    pub fn member_repo(&self) -> DbMemberRepository {
        DbMemberRepository {
            db: self.db.clone(),
        }
    }

    pub fn team_repo(&self) -> DbTeamRepository {
        DbTeamRepository {
            db: self.db.clone(),
        }
    }

    pub fn project_repo(&self) -> DbProjectRepository {
        DbProjectRepository {
            db: self.db.clone(),
        }
    }

    pub fn issue_repo(&self) -> DbIssueRepository {
        DbIssueRepository {
            db: self.db.clone(),
        }
    }

    pub fn totp_settings(&self) -> TotpSettings {
        TotpSettings {
            encryption_key: self.encryption_key,
            issuer: self.app_name.clone(),
        }
    }
}
