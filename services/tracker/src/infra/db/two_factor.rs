use anyhow::Context as _;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QuerySelect, TransactionTrait,
};
use uuid::Uuid;

use tracker_schema::{two_factors, users};

use crate::domain::repository::TwoFactorRepository;
use crate::domain::types::TwoFactorRecord;
use crate::error::TrackerError;

#[derive(Clone)]
pub struct DbTwoFactorRepository {
    pub db: DatabaseConnection,
}

impl TwoFactorRepository for DbTwoFactorRepository {
    async fn find_by_user(&self, user_id: Uuid) -> Result<Option<TwoFactorRecord>, TrackerError> {
        let model = two_factors::Entity::find()
            .filter(two_factors::Column::UserId.eq(user_id))
            .one(&self.db)
            .await
            .context("find two-factor by user")?;
        model.map(two_factor_from_model).transpose()
    }

    async fn upsert(&self, record: &TwoFactorRecord) -> Result<(), TrackerError> {
        let model = two_factors::ActiveModel {
            id: Set(record.id),
            user_id: Set(record.user_id),
            secret: Set(record.secret.clone()),
            backup_codes: Set(serde_json::json!(record.backup_codes)),
            verified: Set(record.verified),
            created_at: Set(record.created_at),
        };
        two_factors::Entity::insert(model)
            .on_conflict(
                OnConflict::column(two_factors::Column::UserId)
                    .update_columns([
                        two_factors::Column::Secret,
                        two_factors::Column::BackupCodes,
                        two_factors::Column::Verified,
                        two_factors::Column::CreatedAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await
            .context("upsert two-factor")?;
        Ok(())
    }

    async fn mark_verified(&self, user_id: Uuid) -> Result<(), TrackerError> {
        self.db
            .transaction::<_, (), DbErr>(|txn| {
                Box::pin(async move {
                    two_factors::Entity::update_many()
                        .col_expr(two_factors::Column::Verified, Expr::value(true))
                        .filter(two_factors::Column::UserId.eq(user_id))
                        .exec(txn)
                        .await?;
                    set_two_factor_flag(txn, user_id, true).await
                })
            })
            .await
            .context("mark two-factor verified")?;
        Ok(())
    }

    async fn replace_backup_codes(
        &self,
        user_id: Uuid,
        backup_codes: &[String],
    ) -> Result<(), TrackerError> {
        two_factors::Entity::update_many()
            .col_expr(
                two_factors::Column::BackupCodes,
                Expr::value(serde_json::json!(backup_codes)),
            )
            .filter(two_factors::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await
            .context("replace backup codes")?;
        Ok(())
    }

    async fn consume_backup_code(
        &self,
        user_id: Uuid,
        code_hash: &str,
    ) -> Result<bool, TrackerError> {
        let code_hash = code_hash.to_owned();
        let consumed = self
            .db
            .transaction::<_, bool, DbErr>(|txn| {
                Box::pin(async move {
                    // FOR UPDATE serializes concurrent sign-ins spending the same code.
                    let Some(model) = two_factors::Entity::find()
                        .filter(two_factors::Column::UserId.eq(user_id))
                        .lock_exclusive()
                        .one(txn)
                        .await?
                    else {
                        return Ok(false);
                    };
                    let mut codes: Vec<String> = serde_json::from_value(model.backup_codes)
                        .map_err(|e| DbErr::Json(e.to_string()))?;
                    let Some(index) = codes.iter().position(|c| *c == code_hash) else {
                        return Ok(false);
                    };
                    codes.remove(index);
                    two_factors::Entity::update_many()
                        .col_expr(
                            two_factors::Column::BackupCodes,
                            Expr::value(serde_json::json!(codes)),
                        )
                        .filter(two_factors::Column::Id.eq(model.id))
                        .exec(txn)
                        .await?;
                    Ok(true)
                })
            })
            .await
            .context("consume backup code")?;
        Ok(consumed)
    }

    async fn delete_by_user(&self, user_id: Uuid) -> Result<(), TrackerError> {
        self.db
            .transaction::<_, (), DbErr>(|txn| {
                Box::pin(async move {
                    two_factors::Entity::delete_many()
                        .filter(two_factors::Column::UserId.eq(user_id))
                        .exec(txn)
                        .await?;
                    set_two_factor_flag(txn, user_id, false).await
                })
            })
            .await
            .context("delete two-factor")?;
        Ok(())
    }
}

async fn set_two_factor_flag<C>(conn: &C, user_id: Uuid, enabled: bool) -> Result<(), DbErr>
where
    C: sea_orm::ConnectionTrait,
{
    users::Entity::update_many()
        .col_expr(users::Column::TwoFactorEnabled, Expr::value(enabled))
        .col_expr(users::Column::UpdatedAt, Expr::value(chrono::Utc::now()))
        .filter(users::Column::Id.eq(user_id))
        .exec(conn)
        .await?;
    Ok(())
}

fn two_factor_from_model(model: two_factors::Model) -> Result<TwoFactorRecord, TrackerError> {
    let backup_codes: Vec<String> =
        serde_json::from_value(model.backup_codes).context("decode backup codes")?;
    Ok(TwoFactorRecord {
        id: model.id,
        user_id: model.user_id,
        secret: model.secret,
        backup_codes,
        verified: model.verified,
        created_at: model.created_at,
    })
}
