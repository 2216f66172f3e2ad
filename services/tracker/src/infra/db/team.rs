use anyhow::Context as _;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use uuid::Uuid;

use tracker_core::sea_ext::UniqueViolation;
use tracker_domain::role::TeamRole;
use tracker_schema::{team_members, teams, users};

use super::parse_stored;
use super::user::user_from_model;
use crate::domain::repository::TeamRepository;
use crate::domain::types::{Team, TeamMember, TeamMemberProfile, TeamPatch};
use crate::error::TrackerError;

#[derive(Clone)]
pub struct DbTeamRepository {
    pub db: DatabaseConnection,
}

impl TeamRepository for DbTeamRepository {
    async fn find_by_identifier(
        &self,
        workspace_id: Uuid,
        identifier: &str,
    ) -> Result<Option<Team>, TrackerError> {
        let model = teams::Entity::find()
            .filter(teams::Column::WorkspaceId.eq(workspace_id))
            .filter(teams::Column::Identifier.eq(identifier))
            .one(&self.db)
            .await
            .context("find team by identifier")?;
        Ok(model.map(team_from_model))
    }

    async fn identifier_exists(
        &self,
        workspace_id: Uuid,
        identifier: &str,
    ) -> Result<bool, TrackerError> {
        Ok(self
            .find_by_identifier(workspace_id, identifier)
            .await?
            .is_some())
    }

    async fn list(&self, workspace_id: Uuid) -> Result<Vec<Team>, TrackerError> {
        let models = teams::Entity::find()
            .filter(teams::Column::WorkspaceId.eq(workspace_id))
            .order_by_asc(teams::Column::Name)
            .all(&self.db)
            .await
            .context("list teams")?;
        Ok(models.into_iter().map(team_from_model).collect())
    }

    async fn create_with_lead(&self, team: &Team, lead_id: Uuid) -> Result<(), TrackerError> {
        let result = self
            .db
            .transaction::<_, (), DbErr>(|txn| {
                let team = team.clone();
                Box::pin(async move {
                    teams::ActiveModel {
                        id: Set(team.id),
                        workspace_id: Set(team.workspace_id),
                        name: Set(team.name),
                        identifier: Set(team.identifier),
                        description: Set(team.description),
                        created_at: Set(team.created_at),
                        updated_at: Set(team.updated_at),
                    }
                    .insert(txn)
                    .await?;
                    team_members::ActiveModel {
                        team_id: Set(team.id),
                        user_id: Set(lead_id),
                        role: Set(TeamRole::Lead.as_str().to_owned()),
                        joined_at: Set(team.created_at),
                    }
                    .insert(txn)
                    .await?;
                    Ok(())
                })
            })
            .await;

        match result {
            Ok(()) => Ok(()),
            Err(e) if e.is_unique_violation() => Err(TrackerError::IdentifierTaken),
            Err(e) => Err(anyhow::Error::new(e).context("create team with lead").into()),
        }
    }

    async fn update(&self, id: Uuid, patch: &TeamPatch) -> Result<Team, TrackerError> {
        let mut model = teams::ActiveModel {
            id: Set(id),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };
        if let Some(name) = &patch.name {
            model.name = Set(name.clone());
        }
        if let Some(identifier) = &patch.identifier {
            model.identifier = Set(identifier.clone());
        }
        if let Some(description) = &patch.description {
            model.description = Set(description.clone());
        }

        match model.update(&self.db).await {
            Ok(model) => Ok(team_from_model(model)),
            Err(DbErr::RecordNotUpdated) => Err(TrackerError::TeamNotFound),
            Err(e) if e.is_unique_violation() => Err(TrackerError::IdentifierTaken),
            Err(e) => Err(anyhow::Error::new(e).context("update team").into()),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<(), TrackerError> {
        teams::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .context("delete team")?;
        Ok(())
    }

    async fn member_role(
        &self,
        team_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<TeamRole>, TrackerError> {
        let model = team_members::Entity::find_by_id((team_id, user_id))
            .one(&self.db)
            .await
            .context("find team member")?;
        match model {
            Some(model) => Ok(Some(parse_stored(&model.role, "team_members.role")?)),
            None => Ok(None),
        }
    }

    async fn list_members(&self, team_id: Uuid) -> Result<Vec<TeamMemberProfile>, TrackerError> {
        let rows = team_members::Entity::find()
            .filter(team_members::Column::TeamId.eq(team_id))
            .find_also_related(users::Entity)
            .order_by_asc(team_members::Column::JoinedAt)
            .all(&self.db)
            .await
            .context("list team members")?;

        let mut out = Vec::with_capacity(rows.len());
        for (member, user) in rows {
            let Some(user) = user else { continue };
            out.push(TeamMemberProfile {
                user: user_from_model(user),
                role: parse_stored(&member.role, "team_members.role")?,
                joined_at: member.joined_at,
            });
        }
        Ok(out)
    }

    async fn add_member(&self, member: &TeamMember) -> Result<(), TrackerError> {
        let result = team_members::ActiveModel {
            team_id: Set(member.team_id),
            user_id: Set(member.user_id),
            role: Set(member.role.as_str().to_owned()),
            joined_at: Set(member.joined_at),
        }
        .insert(&self.db)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if e.is_unique_violation() => Err(TrackerError::AlreadyMember),
            Err(e) => Err(anyhow::Error::new(e).context("add team member").into()),
        }
    }

    async fn update_member_role(
        &self,
        team_id: Uuid,
        user_id: Uuid,
        role: TeamRole,
    ) -> Result<bool, TrackerError> {
        let result = team_members::Entity::update_many()
            .col_expr(team_members::Column::Role, Expr::value(role.as_str()))
            .filter(team_members::Column::TeamId.eq(team_id))
            .filter(team_members::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await
            .context("update team member role")?;
        Ok(result.rows_affected > 0)
    }

    async fn remove_member(&self, team_id: Uuid, user_id: Uuid) -> Result<bool, TrackerError> {
        let result = team_members::Entity::delete_by_id((team_id, user_id))
            .exec(&self.db)
            .await
            .context("remove team member")?;
        Ok(result.rows_affected > 0)
    }

    async fn leads_any(&self, team_ids: &[Uuid], user_id: Uuid) -> Result<bool, TrackerError> {
        if team_ids.is_empty() {
            return Ok(false);
        }
        let count = team_members::Entity::find()
            .filter(team_members::Column::TeamId.is_in(team_ids.iter().copied()))
            .filter(team_members::Column::UserId.eq(user_id))
            .filter(team_members::Column::Role.eq(TeamRole::Lead.as_str()))
            .count(&self.db)
            .await
            .context("check team lead")?;
        Ok(count > 0)
    }
}

pub(super) fn team_from_model(model: teams::Model) -> Team {
    Team {
        id: model.id,
        workspace_id: model.workspace_id,
        name: model.name,
        identifier: model.identifier,
        description: model.description,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}
