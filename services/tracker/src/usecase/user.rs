use uuid::Uuid;

use tracker_domain::role::WorkspaceRole;
use tracker_domain::validate::{USER_NAME_MAX_LEN, normalize_username, required_text};

use crate::domain::repository::{UserRepository, WorkspaceRepository};
use crate::domain::types::{User, UserPatch, Workspace};
use crate::error::TrackerError;

const IMAGE_URL_MAX_LEN: usize = 2048;

// ── Update profile ────────────────────────────────────────────────────────────

/// Outer `None`: field absent. `Some(None)`: explicit `null`.
#[derive(Default)]
pub struct UpdateProfileInput {
    pub name: Option<String>,
    pub username: Option<Option<String>>,
    pub image: Option<Option<String>>,
}

pub struct UpdateProfileUseCase<U>
where
    U: UserRepository,
{
    pub users: U,
}

impl<U> UpdateProfileUseCase<U>
where
    U: UserRepository,
{
    pub async fn execute(
        &self,
        user_id: Uuid,
        input: UpdateProfileInput,
    ) -> Result<User, TrackerError> {
        let mut patch = UserPatch::default();

        if let Some(name) = &input.name {
            patch.name = Some(required_text("name", name, USER_NAME_MAX_LEN)?);
        }

        match input.username.as_ref().map(|u| u.as_deref().map(str::trim)) {
            None => {}
            Some(None) | Some(Some("")) => patch.username = Some(None),
            Some(Some(raw)) => {
                let username = normalize_username(raw)?;
                if let Some(owner) = self.users.find_by_username(&username.normalized).await? {
                    if owner.id != user_id {
                        return Err(TrackerError::UsernameTaken);
                    }
                }
                patch.username = Some(Some((username.normalized, username.display)));
            }
        }

        if let Some(image) = input.image {
            let image = image.map(|i| i.trim().to_owned()).filter(|i| !i.is_empty());
            if image.as_ref().is_some_and(|i| i.len() > IMAGE_URL_MAX_LEN) {
                return Err(TrackerError::Validation(format!(
                    "image must be at most {IMAGE_URL_MAX_LEN} characters"
                )));
            }
            patch.image = Some(image);
        }

        if patch.is_empty() {
            return Err(TrackerError::Validation("no fields to update".to_owned()));
        }
        self.users.update_profile(user_id, &patch).await
    }
}

// ── My workspaces ─────────────────────────────────────────────────────────────

pub struct ListMyWorkspacesUseCase<W>
where
    W: WorkspaceRepository,
{
    pub workspaces: W,
}

impl<W> ListMyWorkspacesUseCase<W>
where
    W: WorkspaceRepository,
{
    pub async fn execute(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<(Workspace, WorkspaceRole)>, TrackerError> {
        self.workspaces.list_for_user(user_id).await
    }
}

// ── Delete account ────────────────────────────────────────────────────────────

pub struct DeleteAccountUseCase<U>
where
    U: UserRepository,
{
    pub users: U,
}

impl<U> DeleteAccountUseCase<U>
where
    U: UserRepository,
{
    /// Refused while the user owns a workspace; memberships, sessions and
    /// credentials cascade.
    pub async fn execute(&self, user_id: Uuid) -> Result<(), TrackerError> {
        if self.users.count_owned_workspaces(user_id).await? > 0 {
            return Err(TrackerError::OwnsWorkspaces);
        }
        self.users.delete(user_id).await?;
        tracing::info!(user_id = %user_id, "account deleted");
        Ok(())
    }
}
