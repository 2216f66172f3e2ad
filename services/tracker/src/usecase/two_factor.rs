use chrono::Utc;
use uuid::Uuid;

use tracker_auth_types::token::{hash_token, validate_two_factor_ticket};

use crate::crypto::{
    decrypt_secret, encrypt_secret, generate_backup_codes, generate_totp, normalize_backup_code,
    verify_totp,
};
use crate::domain::repository::{SessionRepository, TwoFactorRepository, UserRepository};
use crate::domain::types::{ClientMeta, TwoFactorRecord, User};
use crate::error::TrackerError;
use crate::usecase::auth::check_password;
use crate::usecase::session::{SignedIn, open_session};

fn hash_backup_codes(codes: &[String]) -> Vec<String> {
    codes
        .iter()
        .map(|code| hash_token(&normalize_backup_code(code)))
        .collect()
}

/// TOTP settings shared by every use case that checks a code.
#[derive(Clone)]
pub struct TotpSettings {
    pub encryption_key: [u8; 32],
    /// Issuer shown in authenticator apps.
    pub issuer: String,
}

impl TotpSettings {
    fn verify(&self, record: &TwoFactorRecord, user: &User, code: &str) -> Result<bool, TrackerError> {
        let secret = decrypt_secret(&self.encryption_key, &record.secret)?;
        Ok(verify_totp(&secret, code, &self.issuer, &user.email)?)
    }
}

// ── Enable ────────────────────────────────────────────────────────────────────

pub struct EnableTwoFactorOutput {
    pub totp_uri: String,
    pub backup_codes: Vec<String>,
}

pub struct EnableTwoFactorUseCase<U, T>
where
    U: UserRepository,
    T: TwoFactorRepository,
{
    pub users: U,
    pub two_factors: T,
    pub totp: TotpSettings,
}

impl<U, T> EnableTwoFactorUseCase<U, T>
where
    U: UserRepository,
    T: TwoFactorRepository,
{
    /// Starts a fresh enrolment. It only takes effect once a code is confirmed.
    pub async fn execute(
        &self,
        user: &User,
        password: &str,
    ) -> Result<EnableTwoFactorOutput, TrackerError> {
        check_password(&self.users, user.id, password).await?;

        let (secret, totp_uri) = generate_totp(&self.totp.issuer, &user.email)?;
        let backup_codes = generate_backup_codes();
        let record = TwoFactorRecord {
            id: Uuid::now_v7(),
            user_id: user.id,
            secret: encrypt_secret(&self.totp.encryption_key, &secret)?,
            backup_codes: hash_backup_codes(&backup_codes),
            verified: false,
            created_at: Utc::now(),
        };
        self.two_factors.upsert(&record).await?;

        Ok(EnableTwoFactorOutput {
            totp_uri,
            backup_codes,
        })
    }
}

// ── Confirm enrolment ─────────────────────────────────────────────────────────

pub struct ConfirmTwoFactorUseCase<T>
where
    T: TwoFactorRepository,
{
    pub two_factors: T,
    pub totp: TotpSettings,
}

impl<T> ConfirmTwoFactorUseCase<T>
where
    T: TwoFactorRepository,
{
    pub async fn execute(&self, user: &User, code: &str) -> Result<(), TrackerError> {
        let record = self
            .two_factors
            .find_by_user(user.id)
            .await?
            .ok_or(TrackerError::TwoFactorNotEnabled)?;
        if !self.totp.verify(&record, user, code)? {
            return Err(TrackerError::InvalidTwoFactorCode);
        }
        self.two_factors.mark_verified(user.id).await?;
        tracing::info!(user_id = %user.id, "two-factor enabled");
        Ok(())
    }
}

// ── Complete sign-in ──────────────────────────────────────────────────────────

pub enum SecondFactor {
    Totp(String),
    BackupCode(String),
}

pub struct CompleteTwoFactorSignInUseCase<U, T, S>
where
    U: UserRepository,
    T: TwoFactorRepository,
    S: SessionRepository,
{
    pub users: U,
    pub two_factors: T,
    pub sessions: S,
    pub totp: TotpSettings,
    pub auth_secret: String,
}

impl<U, T, S> CompleteTwoFactorSignInUseCase<U, T, S>
where
    U: UserRepository,
    T: TwoFactorRepository,
    S: SessionRepository,
{
    pub async fn execute(
        &self,
        ticket: &str,
        factor: SecondFactor,
        meta: ClientMeta,
    ) -> Result<SignedIn, TrackerError> {
        let user_id = validate_two_factor_ticket(ticket, &self.auth_secret)
            .map_err(|_| TrackerError::InvalidTwoFactorTicket)?;
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(TrackerError::InvalidTwoFactorTicket)?;
        let record = match self.two_factors.find_by_user(user.id).await? {
            Some(record) if user.two_factor_enabled => record,
            _ => return Err(TrackerError::TwoFactorNotEnabled),
        };

        match factor {
            SecondFactor::Totp(code) => {
                if !self.totp.verify(&record, &user, &code)? {
                    return Err(TrackerError::InvalidTwoFactorCode);
                }
            }
            SecondFactor::BackupCode(code) => {
                let hash = hash_token(&normalize_backup_code(&code));
                if !self.two_factors.consume_backup_code(user.id, &hash).await? {
                    return Err(TrackerError::InvalidTwoFactorCode);
                }
            }
        }

        open_session(&self.sessions, user, meta).await
    }
}

// ── Backup codes ──────────────────────────────────────────────────────────────

pub struct GenerateBackupCodesUseCase<U, T>
where
    U: UserRepository,
    T: TwoFactorRepository,
{
    pub users: U,
    pub two_factors: T,
}

impl<U, T> GenerateBackupCodesUseCase<U, T>
where
    U: UserRepository,
    T: TwoFactorRepository,
{
    /// Replaces every previous backup code.
    pub async fn execute(&self, user_id: Uuid, password: &str) -> Result<Vec<String>, TrackerError> {
        check_password(&self.users, user_id, password).await?;
        if self.two_factors.find_by_user(user_id).await?.is_none() {
            return Err(TrackerError::TwoFactorNotEnabled);
        }
        let codes = generate_backup_codes();
        self.two_factors
            .replace_backup_codes(user_id, &hash_backup_codes(&codes))
            .await?;
        Ok(codes)
    }
}

// ── Disable ───────────────────────────────────────────────────────────────────

pub struct DisableTwoFactorUseCase<U, T>
where
    U: UserRepository,
    T: TwoFactorRepository,
{
    pub users: U,
    pub two_factors: T,
}

impl<U, T> DisableTwoFactorUseCase<U, T>
where
    U: UserRepository,
    T: TwoFactorRepository,
{
    pub async fn execute(&self, user_id: Uuid, password: &str) -> Result<(), TrackerError> {
        check_password(&self.users, user_id, password).await?;
        self.two_factors.delete_by_user(user_id).await?;
        tracing::info!(user_id = %user_id, "two-factor disabled");
        Ok(())
    }
}
