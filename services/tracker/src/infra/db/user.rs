use anyhow::Context as _;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DatabaseTransaction,
    DbErr, EntityTrait, PaginatorTrait, QueryFilter, TransactionTrait,
};
use uuid::Uuid;

use tracker_core::sea_ext::UniqueViolation;
use tracker_schema::{accounts, users, workspaces};

use crate::domain::repository::UserRepository;
use crate::domain::types::{CREDENTIAL_PROVIDER, User, UserPatch};
use crate::error::TrackerError;

#[derive(Clone)]
pub struct DbUserRepository {
    pub db: DatabaseConnection,
}

impl UserRepository for DbUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, TrackerError> {
        let model = users::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find user by id")?;
        Ok(model.map(user_from_model))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, TrackerError> {
        let model = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
            .context("find user by email")?;
        Ok(model.map(user_from_model))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, TrackerError> {
        let model = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.db)
            .await
            .context("find user by username")?;
        Ok(model.map(user_from_model))
    }

    async fn find_password_hash(&self, user_id: Uuid) -> Result<Option<String>, TrackerError> {
        let model = accounts::Entity::find()
            .filter(accounts::Column::UserId.eq(user_id))
            .filter(accounts::Column::ProviderId.eq(CREDENTIAL_PROVIDER))
            .one(&self.db)
            .await
            .context("find credential account")?;
        Ok(model.and_then(|m| m.password_hash))
    }

    async fn create_with_account(
        &self,
        user: &User,
        password_hash: &str,
    ) -> Result<(), TrackerError> {
        let result = self
            .db
            .transaction::<_, (), DbErr>(|txn| {
                let user = user.clone();
                let password_hash = password_hash.to_owned();
                Box::pin(async move {
                    insert_user(txn, &user).await?;
                    insert_credential_account(txn, &user, password_hash).await?;
                    Ok(())
                })
            })
            .await;

        match result {
            Ok(()) => Ok(()),
            Err(e) => match e.unique_violation() {
                Some(constraint) if constraint.contains("username") => {
                    Err(TrackerError::UsernameTaken)
                }
                Some(_) => Err(TrackerError::EmailTaken),
                None => Err(anyhow::Error::new(e)
                    .context("create user with account")
                    .into()),
            },
        }
    }

    async fn update_profile(&self, id: Uuid, patch: &UserPatch) -> Result<User, TrackerError> {
        let mut model = users::ActiveModel {
            id: Set(id),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };
        if let Some(name) = &patch.name {
            model.name = Set(name.clone());
        }
        if let Some(username) = &patch.username {
            let (normalized, display) = match username {
                Some((normalized, display)) => (Some(normalized.clone()), Some(display.clone())),
                None => (None, None),
            };
            model.username = Set(normalized);
            model.display_username = Set(display);
        }
        if let Some(image) = &patch.image {
            model.image = Set(image.clone());
        }

        match model.update(&self.db).await {
            Ok(model) => Ok(user_from_model(model)),
            Err(DbErr::RecordNotUpdated) => Err(TrackerError::UserNotFound),
            Err(e) if e.is_unique_violation() => Err(TrackerError::UsernameTaken),
            Err(e) => Err(anyhow::Error::new(e).context("update user profile").into()),
        }
    }

    async fn update_password_hash(
        &self,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<(), TrackerError> {
        accounts::Entity::update_many()
            .col_expr(accounts::Column::PasswordHash, Expr::value(password_hash))
            .col_expr(accounts::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(accounts::Column::UserId.eq(user_id))
            .filter(accounts::Column::ProviderId.eq(CREDENTIAL_PROVIDER))
            .exec(&self.db)
            .await
            .context("update password hash")?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), TrackerError> {
        users::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .context("delete user")?;
        Ok(())
    }

    async fn count_owned_workspaces(&self, user_id: Uuid) -> Result<u64, TrackerError> {
        let count = workspaces::Entity::find()
            .filter(workspaces::Column::OwnerId.eq(user_id))
            .count(&self.db)
            .await
            .context("count owned workspaces")?;
        Ok(count)
    }
}

async fn insert_user(txn: &DatabaseTransaction, user: &User) -> Result<(), DbErr> {
    users::ActiveModel {
        id: Set(user.id),
        name: Set(user.name.clone()),
        email: Set(user.email.clone()),
        email_verified: Set(user.email_verified),
        username: Set(user.username.clone()),
        display_username: Set(user.display_username.clone()),
        image: Set(user.image.clone()),
        two_factor_enabled: Set(user.two_factor_enabled),
        created_at: Set(user.created_at),
        updated_at: Set(user.updated_at),
    }
    .insert(txn)
    .await?;
    Ok(())
}

async fn insert_credential_account(
    txn: &DatabaseTransaction,
    user: &User,
    password_hash: String,
) -> Result<(), DbErr> {
    accounts::ActiveModel {
        id: Set(Uuid::now_v7()),
        user_id: Set(user.id),
        provider_id: Set(CREDENTIAL_PROVIDER.to_owned()),
        account_id: Set(user.id.to_string()),
        password_hash: Set(Some(password_hash)),
        created_at: Set(user.created_at),
        updated_at: Set(user.created_at),
    }
    .insert(txn)
    .await?;
    Ok(())
}

pub(super) fn user_from_model(model: users::Model) -> User {
    User {
        id: model.id,
        name: model.name,
        email: model.email,
        email_verified: model.email_verified,
        username: model.username,
        display_username: model.display_username,
        image: model.image,
        two_factor_enabled: model.two_factor_enabled,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}
