use deadpool_redis::Pool;
use deadpool_redis::redis::{AsyncCommands, RedisError};
use uuid::Uuid;

use crate::domain::repository::PasskeyCache;
use crate::domain::types::PASSKEY_STATE_TTL_SECS;
use crate::error::TrackerError;

#[derive(Clone)]
pub struct RedisPasskeyCache {
    pub pool: Pool,
}

fn reg_state_key(user_id: Uuid, reg_id: &str) -> String {
    format!("tracker:passkey_reg:{user_id}:{reg_id}")
}

fn auth_state_key(auth_id: &str) -> String {
    format!("tracker:passkey_auth:{auth_id}")
}

impl RedisPasskeyCache {
    async fn set(&self, key: &str, value: &[u8]) -> Result<(), TrackerError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| TrackerError::Internal(e.into()))?;
        let (): () = conn
            .set_ex(key, value.to_vec(), PASSKEY_STATE_TTL_SECS)
            .await
            .map_err(|e: RedisError| TrackerError::Internal(e.into()))?;
        Ok(())
    }

    /// GETDEL: a ceremony state can be consumed once.
    async fn take(&self, key: &str) -> Result<Option<Vec<u8>>, TrackerError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| TrackerError::Internal(e.into()))?;
        let value: Option<Vec<u8>> = conn
            .get_del(key)
            .await
            .map_err(|e: RedisError| TrackerError::Internal(e.into()))?;
        Ok(value)
    }
}

impl PasskeyCache for RedisPasskeyCache {
    async fn set_registration_state(
        &self,
        user_id: Uuid,
        reg_id: &str,
        state_json: &[u8],
    ) -> Result<(), TrackerError> {
        self.set(&reg_state_key(user_id, reg_id), state_json).await
    }

    async fn take_registration_state(
        &self,
        user_id: Uuid,
        reg_id: &str,
    ) -> Result<Option<Vec<u8>>, TrackerError> {
        self.take(&reg_state_key(user_id, reg_id)).await
    }

    async fn set_authentication_state(
        &self,
        auth_id: &str,
        state_json: &[u8],
    ) -> Result<(), TrackerError> {
        self.set(&auth_state_key(auth_id), state_json).await
    }

    async fn take_authentication_state(
        &self,
        auth_id: &str,
    ) -> Result<Option<Vec<u8>>, TrackerError> {
        self.take(&auth_state_key(auth_id)).await
    }
}
