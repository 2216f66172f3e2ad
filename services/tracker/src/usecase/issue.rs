use chrono::Utc;
use uuid::Uuid;

use tracker_domain::id::IssueKey;
use tracker_domain::pagination::PageRequest;
use tracker_domain::status::{IssuePriority, IssueStatus};
use tracker_domain::validate::{
    DESCRIPTION_MAX_LEN, ISSUE_TITLE_MAX_LEN, normalize_identifier, optional_text, required_text,
};

use crate::domain::policy::can_delete_issue;
use crate::domain::repository::{
    IssueRepository, MemberRepository, ProjectRepository, TeamRepository, WorkspaceRepository,
};
use crate::domain::types::{IssueFilter, IssuePatch, IssueSortBy, IssueWithKey, NewIssue};
use crate::error::TrackerError;
use crate::usecase::access::{WorkspaceAccess, resolve_workspace};
use crate::usecase::project::{ProjectScope, has_project_manage, load_project};

async fn require_member<M: MemberRepository>(
    members: &M,
    workspace_id: Uuid,
    assignee_id: Uuid,
) -> Result<(), TrackerError> {
    match members.find_role(workspace_id, assignee_id).await? {
        Some(_) => Ok(()),
        None => Err(TrackerError::Validation(
            "assignee must be a workspace member".to_owned(),
        )),
    }
}

struct IssueScope {
    project: ProjectScope,
    issue: IssueWithKey,
}

async fn load_issue<W, M, P, I>(
    workspaces: &W,
    members: &M,
    projects: &P,
    issues: &I,
    slug: &str,
    key: &str,
    user_id: Uuid,
) -> Result<IssueScope, TrackerError>
where
    W: WorkspaceRepository,
    M: MemberRepository,
    P: ProjectRepository,
    I: IssueRepository,
{
    let access = resolve_workspace(workspaces, members, slug, user_id).await?;
    let key: IssueKey = key.parse().map_err(|_| TrackerError::IssueNotFound)?;
    let project = projects
        .find_by_identifier(access.workspace.id, &key.identifier)
        .await?
        .ok_or(TrackerError::IssueNotFound)?;
    let issue = issues
        .find_by_number(project.id, key.number)
        .await?
        .ok_or(TrackerError::IssueNotFound)?;
    let project_identifier = project.identifier.clone();
    Ok(IssueScope {
        project: ProjectScope { access, project },
        issue: IssueWithKey {
            issue,
            project_identifier,
        },
    })
}

// ── Create ────────────────────────────────────────────────────────────────────

pub struct CreateIssueInput {
    /// Project identifier.
    pub project: String,
    pub title: String,
    pub description: Option<String>,
    pub status: Option<IssueStatus>,
    pub priority: Option<IssuePriority>,
    pub assignee_id: Option<Uuid>,
}

pub struct CreateIssueUseCase<W, M, P, I>
where
    W: WorkspaceRepository,
    M: MemberRepository,
    P: ProjectRepository,
    I: IssueRepository,
{
    pub workspaces: W,
    pub members: M,
    pub projects: P,
    pub issues: I,
}

impl<W, M, P, I> CreateIssueUseCase<W, M, P, I>
where
    W: WorkspaceRepository,
    M: MemberRepository,
    P: ProjectRepository,
    I: IssueRepository,
{
    pub async fn execute(
        &self,
        slug: &str,
        user_id: Uuid,
        input: CreateIssueInput,
    ) -> Result<IssueWithKey, TrackerError> {
        let scope = load_project(
            &self.workspaces,
            &self.members,
            &self.projects,
            slug,
            &input.project,
            user_id,
        )
        .await?;
        let workspace_id = scope.access.workspace.id;

        let title = required_text("title", &input.title, ISSUE_TITLE_MAX_LEN)?;
        let description =
            optional_text("description", input.description.as_deref(), DESCRIPTION_MAX_LEN)?;
        if let Some(assignee_id) = input.assignee_id {
            require_member(&self.members, workspace_id, assignee_id).await?;
        }

        let new_issue = NewIssue {
            id: Uuid::now_v7(),
            workspace_id,
            project_id: scope.project.id,
            title,
            description,
            status: input.status.unwrap_or_default(),
            priority: input.priority.unwrap_or_default(),
            assignee_id: input.assignee_id,
            creator_id: user_id,
            created_at: Utc::now(),
        };
        let issue = self.issues.create_next(&new_issue).await?;
        tracing::debug!(
            project_id = %scope.project.id,
            number = issue.number,
            "issue created"
        );
        Ok(IssueWithKey {
            issue,
            project_identifier: scope.project.identifier,
        })
    }
}

// ── List ──────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct ListIssuesInput {
    /// Project identifier.
    pub project: Option<String>,
    pub statuses: Vec<IssueStatus>,
    pub assignee_id: Option<Uuid>,
    pub priority: Option<IssuePriority>,
    pub sort_by: IssueSortBy,
    pub page: PageRequest,
}

pub struct ListIssuesUseCase<W, M, P, I>
where
    W: WorkspaceRepository,
    M: MemberRepository,
    P: ProjectRepository,
    I: IssueRepository,
{
    pub workspaces: W,
    pub members: M,
    pub projects: P,
    pub issues: I,
}

impl<W, M, P, I> ListIssuesUseCase<W, M, P, I>
where
    W: WorkspaceRepository,
    M: MemberRepository,
    P: ProjectRepository,
    I: IssueRepository,
{
    pub async fn execute(
        &self,
        slug: &str,
        user_id: Uuid,
        input: ListIssuesInput,
    ) -> Result<Vec<IssueWithKey>, TrackerError> {
        let access: WorkspaceAccess =
            resolve_workspace(&self.workspaces, &self.members, slug, user_id).await?;

        let project_id = match input.project.as_deref() {
            Some(raw) => {
                let identifier =
                    normalize_identifier(raw).map_err(|_| TrackerError::ProjectNotFound)?;
                let project = self
                    .projects
                    .find_by_identifier(access.workspace.id, &identifier)
                    .await?
                    .ok_or(TrackerError::ProjectNotFound)?;
                Some(project.id)
            }
            None => None,
        };

        let mut statuses = input.statuses;
        statuses.sort_by_key(|s| s.as_str());
        statuses.dedup();

        let filter = IssueFilter {
            workspace_id: access.workspace.id,
            project_id,
            statuses,
            priority: input.priority,
            assignee_id: input.assignee_id,
            sort_by: input.sort_by,
            page: input.page.clamped(),
        };
        self.issues.list(&filter).await
    }
}

// ── Get ───────────────────────────────────────────────────────────────────────

pub struct GetIssueUseCase<W, M, P, I>
where
    W: WorkspaceRepository,
    M: MemberRepository,
    P: ProjectRepository,
    I: IssueRepository,
{
    pub workspaces: W,
    pub members: M,
    pub projects: P,
    pub issues: I,
}

impl<W, M, P, I> GetIssueUseCase<W, M, P, I>
where
    W: WorkspaceRepository,
    M: MemberRepository,
    P: ProjectRepository,
    I: IssueRepository,
{
    pub async fn execute(
        &self,
        slug: &str,
        user_id: Uuid,
        key: &str,
    ) -> Result<IssueWithKey, TrackerError> {
        let scope = load_issue(
            &self.workspaces,
            &self.members,
            &self.projects,
            &self.issues,
            slug,
            key,
            user_id,
        )
        .await?;
        Ok(scope.issue)
    }
}

// ── Update ────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct UpdateIssueInput {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<IssueStatus>,
    pub priority: Option<IssuePriority>,
    pub assignee_id: Option<Option<Uuid>>,
}

pub struct UpdateIssueUseCase<W, M, P, I>
where
    W: WorkspaceRepository,
    M: MemberRepository,
    P: ProjectRepository,
    I: IssueRepository,
{
    pub workspaces: W,
    pub members: M,
    pub projects: P,
    pub issues: I,
}

impl<W, M, P, I> UpdateIssueUseCase<W, M, P, I>
where
    W: WorkspaceRepository,
    M: MemberRepository,
    P: ProjectRepository,
    I: IssueRepository,
{
    /// Any workspace member may edit an issue.
    pub async fn execute(
        &self,
        slug: &str,
        user_id: Uuid,
        key: &str,
        input: UpdateIssueInput,
    ) -> Result<IssueWithKey, TrackerError> {
        let scope = load_issue(
            &self.workspaces,
            &self.members,
            &self.projects,
            &self.issues,
            slug,
            key,
            user_id,
        )
        .await?;

        let mut patch = IssuePatch::default();
        if let Some(title) = &input.title {
            patch.title = Some(required_text("title", title, ISSUE_TITLE_MAX_LEN)?);
        }
        if let Some(description) = &input.description {
            patch.description = Some(optional_text(
                "description",
                description.as_deref(),
                DESCRIPTION_MAX_LEN,
            )?);
        }
        patch.status = input.status;
        patch.priority = input.priority;
        if let Some(assignee_id) = input.assignee_id {
            if let Some(assignee_id) = assignee_id {
                require_member(
                    &self.members,
                    scope.project.access.workspace.id,
                    assignee_id,
                )
                .await?;
            }
            patch.assignee_id = Some(assignee_id);
        }
        if patch.is_empty() {
            return Err(TrackerError::Validation("no fields to update".to_owned()));
        }

        let issue = self.issues.update(scope.issue.issue.id, &patch).await?;
        Ok(IssueWithKey {
            issue,
            project_identifier: scope.issue.project_identifier,
        })
    }
}

// ── Delete ────────────────────────────────────────────────────────────────────

pub struct DeleteIssueUseCase<W, M, T, P, I>
where
    W: WorkspaceRepository,
    M: MemberRepository,
    T: TeamRepository,
    P: ProjectRepository,
    I: IssueRepository,
{
    pub workspaces: W,
    pub members: M,
    pub teams: T,
    pub projects: P,
    pub issues: I,
}

impl<W, M, T, P, I> DeleteIssueUseCase<W, M, T, P, I>
where
    W: WorkspaceRepository,
    M: MemberRepository,
    T: TeamRepository,
    P: ProjectRepository,
    I: IssueRepository,
{
    pub async fn execute(&self, slug: &str, user_id: Uuid, key: &str) -> Result<(), TrackerError> {
        let scope = load_issue(
            &self.workspaces,
            &self.members,
            &self.projects,
            &self.issues,
            slug,
            key,
            user_id,
        )
        .await?;
        let issue = &scope.issue.issue;
        // The creator needs no team lookup.
        let can_manage = issue.creator_id != user_id
            && has_project_manage(&self.projects, &self.teams, &scope.project, user_id).await?;
        if !can_delete_issue(user_id, issue, can_manage) {
            return Err(TrackerError::Forbidden);
        }
        self.issues.delete(issue.id).await?;
        tracing::info!(issue_key = %scope.issue.key(), "issue deleted");
        Ok(())
    }
}
