use anyhow::Context as _;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder,
};
use uuid::Uuid;

use tracker_schema::passkeys;

use crate::domain::repository::PasskeyRepository;
use crate::domain::types::PasskeyRecord;
use crate::error::TrackerError;

#[derive(Clone)]
pub struct DbPasskeyRepository {
    pub db: DatabaseConnection,
}

impl PasskeyRepository for DbPasskeyRepository {
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<PasskeyRecord>, TrackerError> {
        let models = passkeys::Entity::find()
            .filter(passkeys::Column::UserId.eq(user_id))
            .order_by_asc(passkeys::Column::CreatedAt)
            .all(&self.db)
            .await
            .context("list passkeys by user")?;
        Ok(models.into_iter().map(passkey_from_model).collect())
    }

    async fn create(&self, record: &PasskeyRecord) -> Result<(), TrackerError> {
        passkeys::ActiveModel {
            id: Set(record.id),
            user_id: Set(record.user_id),
            name: Set(record.name.clone()),
            credential_id: Set(record.credential_id.clone()),
            aaguid: Set(record.aaguid),
            credential: Set(record.credential.clone()),
            created_at: Set(record.created_at),
        }
        .insert(&self.db)
        .await
        .context("create passkey")?;
        Ok(())
    }

    async fn rename(
        &self,
        id: Uuid,
        user_id: Uuid,
        name: Option<String>,
    ) -> Result<bool, TrackerError> {
        let result = passkeys::Entity::update_many()
            .col_expr(passkeys::Column::Name, Expr::value(name))
            .filter(passkeys::Column::Id.eq(id))
            .filter(passkeys::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await
            .context("rename passkey")?;
        Ok(result.rows_affected > 0)
    }

    async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<bool, TrackerError> {
        let result = passkeys::Entity::delete_many()
            .filter(passkeys::Column::Id.eq(id))
            .filter(passkeys::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await
            .context("delete passkey")?;
        Ok(result.rows_affected > 0)
    }

    async fn update_credential(&self, id: Uuid, credential: &[u8]) -> Result<(), TrackerError> {
        passkeys::ActiveModel {
            id: Set(id),
            credential: Set(credential.to_vec()),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("update passkey credential")?;
        Ok(())
    }
}

fn passkey_from_model(model: passkeys::Model) -> PasskeyRecord {
    PasskeyRecord {
        id: model.id,
        user_id: model.user_id,
        name: model.name,
        credential_id: model.credential_id,
        aaguid: model.aaguid,
        credential: model.credential,
        created_at: model.created_at,
    }
}
