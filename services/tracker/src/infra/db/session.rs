use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder,
};
use uuid::Uuid;

use tracker_schema::sessions;

use crate::domain::repository::SessionRepository;
use crate::domain::types::Session;
use crate::error::TrackerError;

#[derive(Clone)]
pub struct DbSessionRepository {
    pub db: DatabaseConnection,
}

impl SessionRepository for DbSessionRepository {
    async fn create(&self, session: &Session) -> Result<(), TrackerError> {
        sessions::ActiveModel {
            id: Set(session.id),
            user_id: Set(session.user_id),
            token_hash: Set(session.token_hash.clone()),
            expires_at: Set(session.expires_at),
            ip_address: Set(session.ip_address.clone()),
            user_agent: Set(session.user_agent.clone()),
            created_at: Set(session.created_at),
            updated_at: Set(session.updated_at),
        }
        .insert(&self.db)
        .await
        .context("create session")?;
        Ok(())
    }

    async fn find_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<Session>, TrackerError> {
        let model = sessions::Entity::find()
            .filter(sessions::Column::TokenHash.eq(token_hash))
            .one(&self.db)
            .await
            .context("find session by token hash")?;
        Ok(model.map(session_from_model))
    }

    async fn extend(
        &self,
        id: Uuid,
        expires_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<(), TrackerError> {
        sessions::ActiveModel {
            id: Set(id),
            expires_at: Set(expires_at),
            updated_at: Set(updated_at),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("extend session")?;
        Ok(())
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Session>, TrackerError> {
        let models = sessions::Entity::find()
            .filter(sessions::Column::UserId.eq(user_id))
            .filter(sessions::Column::ExpiresAt.gt(Utc::now()))
            .order_by_desc(sessions::Column::CreatedAt)
            .all(&self.db)
            .await
            .context("list sessions by user")?;
        Ok(models.into_iter().map(session_from_model).collect())
    }

    async fn delete(&self, id: Uuid) -> Result<(), TrackerError> {
        sessions::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .context("delete session")?;
        Ok(())
    }

    async fn delete_for_user(&self, id: Uuid, user_id: Uuid) -> Result<bool, TrackerError> {
        let result = sessions::Entity::delete_many()
            .filter(sessions::Column::Id.eq(id))
            .filter(sessions::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await
            .context("delete session for user")?;
        Ok(result.rows_affected > 0)
    }

    async fn delete_by_user_except(
        &self,
        user_id: Uuid,
        keep: Option<Uuid>,
    ) -> Result<(), TrackerError> {
        let mut query =
            sessions::Entity::delete_many().filter(sessions::Column::UserId.eq(user_id));
        if let Some(keep) = keep {
            query = query.filter(sessions::Column::Id.ne(keep));
        }
        query
            .exec(&self.db)
            .await
            .context("delete sessions by user")?;
        Ok(())
    }
}

fn session_from_model(model: sessions::Model) -> Session {
    Session {
        id: model.id,
        user_id: model.user_id,
        token_hash: model.token_hash,
        expires_at: model.expires_at,
        ip_address: model.ip_address,
        user_agent: model.user_agent,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}
