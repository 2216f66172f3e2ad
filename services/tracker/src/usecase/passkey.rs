use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use webauthn_rs::prelude::*;

use tracker_domain::validate::{normalize_email, normalize_username, optional_text};

use crate::domain::repository::{
    PasskeyCache, PasskeyRepository, SessionRepository, UserRepository,
};
use crate::domain::types::{ClientMeta, PasskeyRecord};
use crate::error::TrackerError;
use crate::usecase::session::{SignedIn, open_session};

const PASSKEY_NAME_MAX_LEN: usize = 100;

fn decode_passkeys(records: &[PasskeyRecord]) -> Vec<Passkey> {
    records
        .iter()
        .filter_map(|r| serde_json::from_slice(&r.credential).ok())
        .collect()
}

// ── List passkeys ─────────────────────────────────────────────────────────────

pub struct PasskeyInfo {
    pub id: Uuid,
    pub name: Option<String>,
    pub aaguid: Uuid,
    pub created_at: DateTime<Utc>,
}

pub struct ListPasskeysUseCase<P>
where
    P: PasskeyRepository,
{
    pub passkeys: P,
}

impl<P> ListPasskeysUseCase<P>
where
    P: PasskeyRepository,
{
    pub async fn execute(&self, user_id: Uuid) -> Result<Vec<PasskeyInfo>, TrackerError> {
        let records = self.passkeys.list_by_user(user_id).await?;
        Ok(records
            .into_iter()
            .map(|r| PasskeyInfo {
                id: r.id,
                name: r.name,
                aaguid: r.aaguid,
                created_at: r.created_at,
            })
            .collect())
    }
}

// ── Rename / delete ───────────────────────────────────────────────────────────

pub struct RenamePasskeyUseCase<P>
where
    P: PasskeyRepository,
{
    pub passkeys: P,
}

impl<P> RenamePasskeyUseCase<P>
where
    P: PasskeyRepository,
{
    pub async fn execute(
        &self,
        id: Uuid,
        user_id: Uuid,
        name: Option<&str>,
    ) -> Result<(), TrackerError> {
        let name = optional_text("name", name, PASSKEY_NAME_MAX_LEN)?;
        if !self.passkeys.rename(id, user_id, name).await? {
            return Err(TrackerError::PasskeyNotFound);
        }
        Ok(())
    }
}

pub struct DeletePasskeyUseCase<P>
where
    P: PasskeyRepository,
{
    pub passkeys: P,
}

impl<P> DeletePasskeyUseCase<P>
where
    P: PasskeyRepository,
{
    /// Returns 404 if not found or belongs to a different user.
    pub async fn execute(&self, id: Uuid, user_id: Uuid) -> Result<(), TrackerError> {
        if !self.passkeys.delete(id, user_id).await? {
            return Err(TrackerError::PasskeyNotFound);
        }
        Ok(())
    }
}

// ── Start registration ────────────────────────────────────────────────────────

pub struct StartRegistrationOutput {
    pub registration_id: String,
    pub challenge: CreationChallengeResponse,
}

pub struct StartRegistrationUseCase<U, P, C>
where
    U: UserRepository,
    P: PasskeyRepository,
    C: PasskeyCache,
{
    pub users: U,
    pub passkeys: P,
    pub cache: C,
    pub webauthn: Arc<Webauthn>,
}

impl<U, P, C> StartRegistrationUseCase<U, P, C>
where
    U: UserRepository,
    P: PasskeyRepository,
    C: PasskeyCache,
{
    pub async fn execute(&self, user_id: Uuid) -> Result<StartRegistrationOutput, TrackerError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(TrackerError::UserNotFound)?;

        let existing = self.passkeys.list_by_user(user_id).await?;
        let exclude: Option<Vec<CredentialID>> = if existing.is_empty() {
            None
        } else {
            Some(
                existing
                    .iter()
                    .map(|r| CredentialID::from(r.credential_id.clone()))
                    .collect(),
            )
        };

        let (ccr, reg_state) = self
            .webauthn
            .start_passkey_registration(user_id, &user.email, &user.name, exclude)
            .map_err(|e| TrackerError::Internal(anyhow::anyhow!("{e}")))?;

        let reg_id = Uuid::new_v4().to_string();
        let state_json =
            serde_json::to_vec(&reg_state).map_err(|e| TrackerError::Internal(e.into()))?;
        self.cache
            .set_registration_state(user_id, &reg_id, &state_json)
            .await?;

        Ok(StartRegistrationOutput {
            registration_id: reg_id,
            challenge: ccr,
        })
    }
}

// ── Finish registration ───────────────────────────────────────────────────────

pub struct FinishRegistrationUseCase<P, C>
where
    P: PasskeyRepository,
    C: PasskeyCache,
{
    pub passkeys: P,
    pub cache: C,
    pub webauthn: Arc<Webauthn>,
}

impl<P, C> FinishRegistrationUseCase<P, C>
where
    P: PasskeyRepository,
    C: PasskeyCache,
{
    pub async fn execute(
        &self,
        user_id: Uuid,
        registration_id: &str,
        name: Option<&str>,
        credential: RegisterPublicKeyCredential,
    ) -> Result<PasskeyInfo, TrackerError> {
        let name = optional_text("name", name, PASSKEY_NAME_MAX_LEN)?;
        let state_json = self
            .cache
            .take_registration_state(user_id, registration_id)
            .await?
            .ok_or(TrackerError::PasskeyChallengeExpired)?;

        let reg_state: PasskeyRegistration = serde_json::from_slice(&state_json)
            .map_err(|_| TrackerError::PasskeyChallengeExpired)?;

        let passkey = self
            .webauthn
            .finish_passkey_registration(&credential, &reg_state)
            .map_err(|_| TrackerError::InvalidCredential)?;

        let aaguid = parse_aaguid_from_credential(&credential).unwrap_or(Uuid::nil());
        let credential_bytes =
            serde_json::to_vec(&passkey).map_err(|e| TrackerError::Internal(e.into()))?;

        let record = PasskeyRecord {
            id: Uuid::now_v7(),
            user_id,
            name,
            credential_id: passkey.cred_id().to_vec(),
            aaguid,
            credential: credential_bytes,
            created_at: Utc::now(),
        };
        self.passkeys.create(&record).await?;

        Ok(PasskeyInfo {
            id: record.id,
            name: record.name,
            aaguid: record.aaguid,
            created_at: record.created_at,
        })
    }
}

// ── Start authentication ──────────────────────────────────────────────────────

/// What is parked in the cache between the two authentication steps.
#[derive(Serialize, Deserialize)]
struct PendingAuthentication {
    user_id: Uuid,
    state: PasskeyAuthentication,
}

pub struct StartAuthenticationOutput {
    pub authentication_id: String,
    pub challenge: RequestChallengeResponse,
}

pub struct StartAuthenticationUseCase<U, P, C>
where
    U: UserRepository,
    P: PasskeyRepository,
    C: PasskeyCache,
{
    pub users: U,
    pub passkeys: P,
    pub cache: C,
    pub webauthn: Arc<Webauthn>,
}

impl<U, P, C> StartAuthenticationUseCase<U, P, C>
where
    U: UserRepository,
    P: PasskeyRepository,
    C: PasskeyCache,
{
    /// `identifier` is an email address or a username.
    pub async fn execute(
        &self,
        identifier: &str,
    ) -> Result<StartAuthenticationOutput, TrackerError> {
        let user = if identifier.contains('@') {
            let email = normalize_email(identifier)?;
            self.users.find_by_email(&email).await?
        } else {
            let username = normalize_username(identifier)?;
            self.users.find_by_username(&username.normalized).await?
        }
        .ok_or(TrackerError::UserNotFound)?;

        let stored = self.passkeys.list_by_user(user.id).await?;
        let passkey_list = decode_passkeys(&stored);
        if passkey_list.is_empty() {
            return Err(TrackerError::PasskeyNotFound);
        }

        let (rcr, auth_state) = self
            .webauthn
            .start_passkey_authentication(&passkey_list)
            .map_err(|e| TrackerError::Internal(anyhow::anyhow!("{e}")))?;

        let auth_id = Uuid::new_v4().to_string();
        let pending = PendingAuthentication {
            user_id: user.id,
            state: auth_state,
        };
        let state_json =
            serde_json::to_vec(&pending).map_err(|e| TrackerError::Internal(e.into()))?;
        self.cache
            .set_authentication_state(&auth_id, &state_json)
            .await?;

        Ok(StartAuthenticationOutput {
            authentication_id: auth_id,
            challenge: rcr,
        })
    }
}

// ── Finish authentication ─────────────────────────────────────────────────────

pub struct FinishAuthenticationUseCase<U, P, C, S>
where
    U: UserRepository,
    P: PasskeyRepository,
    C: PasskeyCache,
    S: SessionRepository,
{
    pub users: U,
    pub passkeys: P,
    pub cache: C,
    pub sessions: S,
    pub webauthn: Arc<Webauthn>,
}

impl<U, P, C, S> FinishAuthenticationUseCase<U, P, C, S>
where
    U: UserRepository,
    P: PasskeyRepository,
    C: PasskeyCache,
    S: SessionRepository,
{
    pub async fn execute(
        &self,
        authentication_id: &str,
        credential: PublicKeyCredential,
        meta: ClientMeta,
    ) -> Result<SignedIn, TrackerError> {
        let state_json = self
            .cache
            .take_authentication_state(authentication_id)
            .await?
            .ok_or(TrackerError::PasskeyChallengeExpired)?;

        let pending: PendingAuthentication = serde_json::from_slice(&state_json)
            .map_err(|_| TrackerError::PasskeyChallengeExpired)?;

        let user = self
            .users
            .find_by_id(pending.user_id)
            .await?
            .ok_or(TrackerError::UserNotFound)?;

        let auth_result = self
            .webauthn
            .finish_passkey_authentication(&credential, &pending.state)
            .map_err(|_| TrackerError::InvalidCredential)?;

        // Persist counter updates for any passkey that changed.
        let stored = self.passkeys.list_by_user(user.id).await?;
        for record in &stored {
            let Ok(mut passkey) = serde_json::from_slice::<Passkey>(&record.credential) else {
                continue;
            };
            if passkey.update_credential(&auth_result) == Some(true) {
                let updated_bytes =
                    serde_json::to_vec(&passkey).map_err(|e| TrackerError::Internal(e.into()))?;
                self.passkeys
                    .update_credential(record.id, &updated_bytes)
                    .await?;
            }
        }

        open_session(&self.sessions, user, meta).await
    }
}

// ── AAGUID extraction ─────────────────────────────────────────────────────────

/// Extract the AAGUID from a `RegisterPublicKeyCredential` by parsing its
/// raw attestation object (CBOR). The AAGUID occupies bytes 37..53 of the
/// `authData` field inside the attestation object.
fn parse_aaguid_from_credential(credential: &RegisterPublicKeyCredential) -> Option<Uuid> {
    let mut decoder = minicbor::Decoder::new(&credential.response.attestation_object);
    decoder.map().ok()?;

    // fmt
    decoder.skip().ok()?;
    decoder.skip().ok()?;

    // attStmt
    decoder.skip().ok()?;
    decoder.skip().ok()?;

    let key = decoder.str().ok()?;
    if key != "authData" {
        return None;
    }
    let auth_data = decoder.bytes().ok()?;
    if auth_data.len() < 53 {
        return None;
    }

    let mut aaguid = [0u8; 16];
    aaguid.copy_from_slice(&auth_data[37..53]);
    Some(Uuid::from_bytes(aaguid))
}
