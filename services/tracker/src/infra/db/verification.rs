use anyhow::Context as _;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DatabaseTransaction,
    DbErr, EntityTrait, QueryFilter, TransactionTrait,
};

use tracker_schema::{outbox_events, verifications};

use crate::domain::repository::VerificationRepository;
use crate::domain::types::{OutboxEvent, Verification};
use crate::error::TrackerError;

#[derive(Clone)]
pub struct DbVerificationRepository {
    pub db: DatabaseConnection,
}

impl VerificationRepository for DbVerificationRepository {
    async fn create_with_outbox(
        &self,
        verification: &Verification,
        event: &OutboxEvent,
    ) -> Result<(), TrackerError> {
        self.db
            .transaction::<_, (), DbErr>(|txn| {
                let verification = verification.clone();
                let event = event.clone();
                Box::pin(async move {
                    insert_verification(txn, &verification).await?;
                    insert_outbox_event(txn, &event).await?;
                    Ok(())
                })
            })
            .await
            .context("create verification with outbox")?;
        Ok(())
    }

    async fn take_by_hash(&self, value_hash: &str) -> Result<Option<Verification>, TrackerError> {
        let value_hash = value_hash.to_owned();
        let model = self
            .db
            .transaction::<_, Option<verifications::Model>, DbErr>(|txn| {
                Box::pin(async move {
                    let model = verifications::Entity::find()
                        .filter(verifications::Column::ValueHash.eq(value_hash))
                        .one(txn)
                        .await?;
                    if let Some(model) = &model {
                        verifications::Entity::delete_by_id(model.id)
                            .exec(txn)
                            .await?;
                    }
                    Ok(model)
                })
            })
            .await
            .context("take verification")?;
        Ok(model.map(verification_from_model))
    }
}

async fn insert_verification(
    txn: &DatabaseTransaction,
    verification: &Verification,
) -> Result<(), DbErr> {
    verifications::ActiveModel {
        id: Set(verification.id),
        identifier: Set(verification.identifier.clone()),
        value_hash: Set(verification.value_hash.clone()),
        expires_at: Set(verification.expires_at),
        created_at: Set(verification.created_at),
    }
    .insert(txn)
    .await?;
    Ok(())
}

async fn insert_outbox_event(
    txn: &DatabaseTransaction,
    event: &OutboxEvent,
) -> Result<(), DbErr> {
    let now = Utc::now();
    outbox_events::ActiveModel {
        id: Set(event.id),
        kind: Set(event.kind.clone()),
        payload: Set(event.payload.clone()),
        idempotency_key: Set(event.idempotency_key.clone()),
        attempts: Set(0),
        last_error: Set(None),
        created_at: Set(now),
        next_attempt_at: Set(now),
        processed_at: Set(None),
    }
    .insert(txn)
    .await?;
    Ok(())
}

fn verification_from_model(model: verifications::Model) -> Verification {
    Verification {
        id: model.id,
        identifier: model.identifier,
        value_hash: model.value_hash,
        expires_at: model.expires_at,
        created_at: model.created_at,
    }
}
