use anyhow::Context as _;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, QueryTrait, TransactionTrait,
};
use uuid::Uuid;

use tracker_core::sea_ext::UniqueViolation;
use tracker_domain::role::WorkspaceRole;
use tracker_schema::{team_members, teams, users, workspace_members, workspaces};

use super::parse_stored;
use super::user::user_from_model;
use crate::domain::repository::{MemberRepository, WorkspaceRepository};
use crate::domain::types::{MemberProfile, Workspace, WorkspaceMember, WorkspacePatch};
use crate::error::TrackerError;

// ── Workspace repository ──────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbWorkspaceRepository {
    pub db: DatabaseConnection,
}

impl WorkspaceRepository for DbWorkspaceRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Workspace>, TrackerError> {
        let model = workspaces::Entity::find()
            .filter(workspaces::Column::Slug.eq(slug))
            .one(&self.db)
            .await
            .context("find workspace by slug")?;
        Ok(model.map(workspace_from_model))
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool, TrackerError> {
        Ok(self.find_by_slug(slug).await?.is_some())
    }

    async fn create_with_owner(&self, workspace: &Workspace) -> Result<(), TrackerError> {
        let result = self
            .db
            .transaction::<_, (), DbErr>(|txn| {
                let workspace = workspace.clone();
                Box::pin(async move {
                    workspaces::ActiveModel {
                        id: Set(workspace.id),
                        name: Set(workspace.name),
                        slug: Set(workspace.slug),
                        description: Set(workspace.description),
                        logo: Set(workspace.logo),
                        owner_id: Set(workspace.owner_id),
                        created_at: Set(workspace.created_at),
                        updated_at: Set(workspace.updated_at),
                    }
                    .insert(txn)
                    .await?;
                    workspace_members::ActiveModel {
                        workspace_id: Set(workspace.id),
                        user_id: Set(workspace.owner_id),
                        role: Set(WorkspaceRole::Owner.as_str().to_owned()),
                        joined_at: Set(workspace.created_at),
                    }
                    .insert(txn)
                    .await?;
                    Ok(())
                })
            })
            .await;

        match result {
            Ok(()) => Ok(()),
            Err(e) if e.is_unique_violation() => Err(TrackerError::SlugTaken),
            Err(e) => Err(anyhow::Error::new(e)
                .context("create workspace with owner")
                .into()),
        }
    }

    async fn update(&self, id: Uuid, patch: &WorkspacePatch) -> Result<Workspace, TrackerError> {
        let mut model = workspaces::ActiveModel {
            id: Set(id),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };
        if let Some(name) = &patch.name {
            model.name = Set(name.clone());
        }
        if let Some(slug) = &patch.slug {
            model.slug = Set(slug.clone());
        }
        if let Some(description) = &patch.description {
            model.description = Set(description.clone());
        }
        if let Some(logo) = &patch.logo {
            model.logo = Set(logo.clone());
        }

        match model.update(&self.db).await {
            Ok(model) => Ok(workspace_from_model(model)),
            Err(DbErr::RecordNotUpdated) => Err(TrackerError::WorkspaceNotFound),
            Err(e) if e.is_unique_violation() => Err(TrackerError::SlugTaken),
            Err(e) => Err(anyhow::Error::new(e).context("update workspace").into()),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<(), TrackerError> {
        workspaces::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .context("delete workspace")?;
        Ok(())
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<(Workspace, WorkspaceRole)>, TrackerError> {
        let rows = workspace_members::Entity::find()
            .filter(workspace_members::Column::UserId.eq(user_id))
            .find_also_related(workspaces::Entity)
            .order_by_asc(workspaces::Column::Name)
            .all(&self.db)
            .await
            .context("list workspaces for user")?;

        let mut out = Vec::with_capacity(rows.len());
        for (member, workspace) in rows {
            let Some(workspace) = workspace else { continue };
            let role = parse_stored(&member.role, "workspace_members.role")?;
            out.push((workspace_from_model(workspace), role));
        }
        Ok(out)
    }

    async fn transfer_ownership(
        &self,
        workspace_id: Uuid,
        from: Uuid,
        to: Uuid,
    ) -> Result<(), TrackerError> {
        self.db
            .transaction::<_, (), DbErr>(|txn| {
                Box::pin(async move {
                    workspaces::ActiveModel {
                        id: Set(workspace_id),
                        owner_id: Set(to),
                        updated_at: Set(Utc::now()),
                        ..Default::default()
                    }
                    .update(txn)
                    .await?;
                    set_role(txn, workspace_id, to, WorkspaceRole::Owner).await?;
                    set_role(txn, workspace_id, from, WorkspaceRole::Admin).await?;
                    Ok(())
                })
            })
            .await
            .context("transfer workspace ownership")?;
        Ok(())
    }
}

async fn set_role<C>(
    conn: &C,
    workspace_id: Uuid,
    user_id: Uuid,
    role: WorkspaceRole,
) -> Result<(), DbErr>
where
    C: sea_orm::ConnectionTrait,
{
    workspace_members::Entity::update_many()
        .col_expr(workspace_members::Column::Role, Expr::value(role.as_str()))
        .filter(workspace_members::Column::WorkspaceId.eq(workspace_id))
        .filter(workspace_members::Column::UserId.eq(user_id))
        .exec(conn)
        .await?;
    Ok(())
}

fn workspace_from_model(model: workspaces::Model) -> Workspace {
    Workspace {
        id: model.id,
        name: model.name,
        slug: model.slug,
        description: model.description,
        logo: model.logo,
        owner_id: model.owner_id,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

// ── Member repository ─────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbMemberRepository {
    pub db: DatabaseConnection,
}

impl MemberRepository for DbMemberRepository {
    async fn find_role(
        &self,
        workspace_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<WorkspaceRole>, TrackerError> {
        let model = workspace_members::Entity::find_by_id((workspace_id, user_id))
            .one(&self.db)
            .await
            .context("find workspace member")?;
        match model {
            Some(model) => Ok(Some(parse_stored(&model.role, "workspace_members.role")?)),
            None => Ok(None),
        }
    }

    async fn list(&self, workspace_id: Uuid) -> Result<Vec<MemberProfile>, TrackerError> {
        let rows = workspace_members::Entity::find()
            .filter(workspace_members::Column::WorkspaceId.eq(workspace_id))
            .find_also_related(users::Entity)
            .order_by_asc(workspace_members::Column::JoinedAt)
            .all(&self.db)
            .await
            .context("list workspace members")?;

        let mut out = Vec::with_capacity(rows.len());
        for (member, user) in rows {
            let Some(user) = user else { continue };
            out.push(MemberProfile {
                user: user_from_model(user),
                role: parse_stored(&member.role, "workspace_members.role")?,
                joined_at: member.joined_at,
            });
        }
        Ok(out)
    }

    async fn add(&self, member: &WorkspaceMember) -> Result<(), TrackerError> {
        let result = workspace_members::ActiveModel {
            workspace_id: Set(member.workspace_id),
            user_id: Set(member.user_id),
            role: Set(member.role.as_str().to_owned()),
            joined_at: Set(member.joined_at),
        }
        .insert(&self.db)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if e.is_unique_violation() => Err(TrackerError::AlreadyMember),
            Err(e) => Err(anyhow::Error::new(e).context("add workspace member").into()),
        }
    }

    async fn update_role(
        &self,
        workspace_id: Uuid,
        user_id: Uuid,
        role: WorkspaceRole,
    ) -> Result<(), TrackerError> {
        set_role(&self.db, workspace_id, user_id, role)
            .await
            .context("update member role")?;
        Ok(())
    }

    async fn remove(&self, workspace_id: Uuid, user_id: Uuid) -> Result<(), TrackerError> {
        self.db
            .transaction::<_, (), DbErr>(|txn| {
                Box::pin(async move {
                    let workspace_teams = teams::Entity::find()
                        .select_only()
                        .column(teams::Column::Id)
                        .filter(teams::Column::WorkspaceId.eq(workspace_id))
                        .into_query();
                    team_members::Entity::delete_many()
                        .filter(team_members::Column::UserId.eq(user_id))
                        .filter(team_members::Column::TeamId.in_subquery(workspace_teams))
                        .exec(txn)
                        .await?;
                    workspace_members::Entity::delete_by_id((workspace_id, user_id))
                        .exec(txn)
                        .await?;
                    Ok(())
                })
            })
            .await
            .context("remove workspace member")?;
        Ok(())
    }
}
