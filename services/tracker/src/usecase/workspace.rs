use chrono::Utc;
use uuid::Uuid;

use tracker_domain::validate::{
    DESCRIPTION_MAX_LEN, WORKSPACE_NAME_MAX_LEN, optional_text, required_text, validate_slug,
};

use crate::domain::repository::{MemberRepository, WorkspaceRepository};
use crate::domain::types::{Workspace, WorkspacePatch};
use crate::error::TrackerError;
use crate::usecase::access::{WorkspaceAccess, resolve_workspace};

const LOGO_URL_MAX_LEN: usize = 2048;

// ── Create ────────────────────────────────────────────────────────────────────

pub struct CreateWorkspaceInput {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
}

pub struct CreateWorkspaceUseCase<W>
where
    W: WorkspaceRepository,
{
    pub workspaces: W,
}

impl<W> CreateWorkspaceUseCase<W>
where
    W: WorkspaceRepository,
{
    /// The creator becomes owner and first member in one transaction.
    pub async fn execute(
        &self,
        owner_id: Uuid,
        input: CreateWorkspaceInput,
    ) -> Result<Workspace, TrackerError> {
        let name = required_text("name", &input.name, WORKSPACE_NAME_MAX_LEN)?;
        let slug = input.slug.trim().to_owned();
        validate_slug(&slug)?;
        let description =
            optional_text("description", input.description.as_deref(), DESCRIPTION_MAX_LEN)?;

        if self.workspaces.slug_exists(&slug).await? {
            return Err(TrackerError::SlugTaken);
        }

        let now = Utc::now();
        let workspace = Workspace {
            id: Uuid::now_v7(),
            name,
            slug,
            description,
            logo: None,
            owner_id,
            created_at: now,
            updated_at: now,
        };
        self.workspaces.create_with_owner(&workspace).await?;

        tracing::info!(workspace_id = %workspace.id, slug = %workspace.slug, "workspace created");
        Ok(workspace)
    }
}

// ── Slug availability ─────────────────────────────────────────────────────────

pub struct CheckSlugUseCase<W>
where
    W: WorkspaceRepository,
{
    pub workspaces: W,
}

impl<W> CheckSlugUseCase<W>
where
    W: WorkspaceRepository,
{
    /// Invalid slugs are a validation error, not "unavailable".
    pub async fn execute(&self, slug: &str) -> Result<bool, TrackerError> {
        let slug = slug.trim();
        validate_slug(slug)?;
        Ok(!self.workspaces.slug_exists(slug).await?)
    }
}

// ── Get ───────────────────────────────────────────────────────────────────────

pub struct GetWorkspaceUseCase<W, M>
where
    W: WorkspaceRepository,
    M: MemberRepository,
{
    pub workspaces: W,
    pub members: M,
}

impl<W, M> GetWorkspaceUseCase<W, M>
where
    W: WorkspaceRepository,
    M: MemberRepository,
{
    pub async fn execute(&self, slug: &str, user_id: Uuid) -> Result<WorkspaceAccess, TrackerError> {
        resolve_workspace(&self.workspaces, &self.members, slug, user_id).await
    }
}

// ── Update ────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct UpdateWorkspaceInput {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<Option<String>>,
    pub logo: Option<Option<String>>,
}

pub struct UpdateWorkspaceUseCase<W, M>
where
    W: WorkspaceRepository,
    M: MemberRepository,
{
    pub workspaces: W,
    pub members: M,
}

impl<W, M> UpdateWorkspaceUseCase<W, M>
where
    W: WorkspaceRepository,
    M: MemberRepository,
{
    pub async fn execute(
        &self,
        slug: &str,
        user_id: Uuid,
        input: UpdateWorkspaceInput,
    ) -> Result<WorkspaceAccess, TrackerError> {
        let access = resolve_workspace(&self.workspaces, &self.members, slug, user_id).await?;
        access.require_manage()?;

        let mut patch = WorkspacePatch::default();
        if let Some(name) = &input.name {
            patch.name = Some(required_text("name", name, WORKSPACE_NAME_MAX_LEN)?);
        }
        if let Some(new_slug) = &input.slug {
            let new_slug = new_slug.trim();
            if new_slug != access.workspace.slug {
                validate_slug(new_slug)?;
                if self.workspaces.slug_exists(new_slug).await? {
                    return Err(TrackerError::SlugTaken);
                }
                patch.slug = Some(new_slug.to_owned());
            }
        }
        if let Some(description) = &input.description {
            patch.description = Some(optional_text(
                "description",
                description.as_deref(),
                DESCRIPTION_MAX_LEN,
            )?);
        }
        if let Some(logo) = &input.logo {
            patch.logo = Some(optional_text("logo", logo.as_deref(), LOGO_URL_MAX_LEN)?);
        }

        if patch.is_empty() {
            if input.slug.is_some() {
                // Only the unchanged slug was sent.
                return Ok(access);
            }
            return Err(TrackerError::Validation("no fields to update".to_owned()));
        }

        let workspace = self.workspaces.update(access.workspace.id, &patch).await?;
        Ok(WorkspaceAccess {
            workspace,
            role: access.role,
        })
    }
}

// ── Delete ────────────────────────────────────────────────────────────────────

pub struct DeleteWorkspaceUseCase<W, M>
where
    W: WorkspaceRepository,
    M: MemberRepository,
{
    pub workspaces: W,
    pub members: M,
}

impl<W, M> DeleteWorkspaceUseCase<W, M>
where
    W: WorkspaceRepository,
    M: MemberRepository,
{
    /// Owner only. Teams, projects, issues and memberships cascade.
    pub async fn execute(&self, slug: &str, user_id: Uuid) -> Result<(), TrackerError> {
        let access = resolve_workspace(&self.workspaces, &self.members, slug, user_id).await?;
        access.require_owner()?;
        self.workspaces.delete(access.workspace.id).await?;
        tracing::info!(workspace_id = %access.workspace.id, "workspace deleted");
        Ok(())
    }
}

// ── Transfer ownership ────────────────────────────────────────────────────────

pub struct TransferOwnershipUseCase<W, M>
where
    W: WorkspaceRepository,
    M: MemberRepository,
{
    pub workspaces: W,
    pub members: M,
}

impl<W, M> TransferOwnershipUseCase<W, M>
where
    W: WorkspaceRepository,
    M: MemberRepository,
{
    /// The previous owner stays on as an admin.
    pub async fn execute(
        &self,
        slug: &str,
        user_id: Uuid,
        new_owner_id: Uuid,
    ) -> Result<(), TrackerError> {
        let access = resolve_workspace(&self.workspaces, &self.members, slug, user_id).await?;
        access.require_owner()?;
        if new_owner_id == user_id {
            return Err(TrackerError::Validation(
                "you already own this workspace".to_owned(),
            ));
        }
        if self
            .members
            .find_role(access.workspace.id, new_owner_id)
            .await?
            .is_none()
        {
            return Err(TrackerError::MemberNotFound);
        }

        self.workspaces
            .transfer_ownership(access.workspace.id, user_id, new_owner_id)
            .await?;
        tracing::info!(
            workspace_id = %access.workspace.id,
            from = %user_id,
            to = %new_owner_id,
            "workspace ownership transferred"
        );
        Ok(())
    }
}
