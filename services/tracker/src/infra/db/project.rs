use anyhow::Context as _;
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, QueryTrait, TransactionTrait,
};
use uuid::Uuid;

use tracker_core::sea_ext::UniqueViolation;
use tracker_domain::status::ProjectStatus;
use tracker_schema::{project_teams, projects, teams};

use super::parse_stored;
use super::team::team_from_model;
use crate::domain::repository::ProjectRepository;
use crate::domain::types::{Project, ProjectPatch, Team};
use crate::error::TrackerError;

#[derive(Clone)]
pub struct DbProjectRepository {
    pub db: DatabaseConnection,
}

impl ProjectRepository for DbProjectRepository {
    async fn find_by_identifier(
        &self,
        workspace_id: Uuid,
        identifier: &str,
    ) -> Result<Option<Project>, TrackerError> {
        let model = projects::Entity::find()
            .filter(projects::Column::WorkspaceId.eq(workspace_id))
            .filter(projects::Column::Identifier.eq(identifier))
            .one(&self.db)
            .await
            .context("find project by identifier")?;
        model.map(project_from_model).transpose()
    }

    async fn identifier_exists(
        &self,
        workspace_id: Uuid,
        identifier: &str,
    ) -> Result<bool, TrackerError> {
        let model = projects::Entity::find()
            .filter(projects::Column::WorkspaceId.eq(workspace_id))
            .filter(projects::Column::Identifier.eq(identifier))
            .one(&self.db)
            .await
            .context("check project identifier")?;
        Ok(model.is_some())
    }

    async fn list(
        &self,
        workspace_id: Uuid,
        status: Option<ProjectStatus>,
    ) -> Result<Vec<Project>, TrackerError> {
        let mut query =
            projects::Entity::find().filter(projects::Column::WorkspaceId.eq(workspace_id));
        if let Some(status) = status {
            query = query.filter(projects::Column::Status.eq(status.as_str()));
        }
        let models = query
            .order_by_desc(projects::Column::CreatedAt)
            .all(&self.db)
            .await
            .context("list projects")?;
        models.into_iter().map(project_from_model).collect()
    }

    async fn create_with_teams(
        &self,
        project: &Project,
        team_ids: &[Uuid],
    ) -> Result<(), TrackerError> {
        let result = self
            .db
            .transaction::<_, (), DbErr>(|txn| {
                let project = project.clone();
                let team_ids = team_ids.to_vec();
                Box::pin(async move {
                    projects::ActiveModel {
                        id: Set(project.id),
                        workspace_id: Set(project.workspace_id),
                        name: Set(project.name),
                        identifier: Set(project.identifier),
                        description: Set(project.description),
                        status: Set(project.status.as_str().to_owned()),
                        lead_id: Set(project.lead_id),
                        creator_id: Set(project.creator_id),
                        issue_counter: Set(project.issue_counter),
                        created_at: Set(project.created_at),
                        updated_at: Set(project.updated_at),
                    }
                    .insert(txn)
                    .await?;
                    if !team_ids.is_empty() {
                        let links = team_ids.into_iter().map(|team_id| project_teams::ActiveModel {
                            project_id: Set(project.id),
                            team_id: Set(team_id),
                        });
                        project_teams::Entity::insert_many(links).exec(txn).await?;
                    }
                    Ok(())
                })
            })
            .await;

        match result {
            Ok(()) => Ok(()),
            Err(e) if e.is_unique_violation() => Err(TrackerError::IdentifierTaken),
            Err(e) => Err(anyhow::Error::new(e)
                .context("create project with teams")
                .into()),
        }
    }

    async fn update(&self, id: Uuid, patch: &ProjectPatch) -> Result<Project, TrackerError> {
        let mut model = projects::ActiveModel {
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
        if let Some(status) = patch.status {
            model.status = Set(status.as_str().to_owned());
        }
        if let Some(lead_id) = patch.lead_id {
            model.lead_id = Set(lead_id);
        }

        match model.update(&self.db).await {
            Ok(model) => project_from_model(model),
            Err(DbErr::RecordNotUpdated) => Err(TrackerError::ProjectNotFound),
            Err(e) if e.is_unique_violation() => Err(TrackerError::IdentifierTaken),
            Err(e) => Err(anyhow::Error::new(e).context("update project").into()),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<(), TrackerError> {
        projects::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .context("delete project")?;
        Ok(())
    }

    async fn teams(&self, project_id: Uuid) -> Result<Vec<Team>, TrackerError> {
        let linked = project_teams::Entity::find()
            .select_only()
            .column(project_teams::Column::TeamId)
            .filter(project_teams::Column::ProjectId.eq(project_id))
            .into_query();
        let models = teams::Entity::find()
            .filter(teams::Column::Id.in_subquery(linked))
            .order_by_asc(teams::Column::Identifier)
            .all(&self.db)
            .await
            .context("list project teams")?;
        Ok(models.into_iter().map(team_from_model).collect())
    }

    async fn link_team(&self, project_id: Uuid, team_id: Uuid) -> Result<(), TrackerError> {
        let link = project_teams::ActiveModel {
            project_id: Set(project_id),
            team_id: Set(team_id),
        };
        let result = project_teams::Entity::insert(link)
            .on_conflict(
                OnConflict::columns([
                    project_teams::Column::ProjectId,
                    project_teams::Column::TeamId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec(&self.db)
            .await;

        match result {
            Ok(_) | Err(DbErr::RecordNotInserted) => Ok(()),
            Err(e) => Err(anyhow::Error::new(e).context("link project team").into()),
        }
    }

    async fn unlink_team(&self, project_id: Uuid, team_id: Uuid) -> Result<bool, TrackerError> {
        let result = project_teams::Entity::delete_by_id((project_id, team_id))
            .exec(&self.db)
            .await
            .context("unlink project team")?;
        Ok(result.rows_affected > 0)
    }
}

pub(super) fn project_from_model(model: projects::Model) -> Result<Project, TrackerError> {
    Ok(Project {
        id: model.id,
        workspace_id: model.workspace_id,
        status: parse_stored(&model.status, "projects.status")?,
        name: model.name,
        identifier: model.identifier,
        description: model.description,
        lead_id: model.lead_id,
        creator_id: model.creator_id,
        issue_counter: model.issue_counter,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}
