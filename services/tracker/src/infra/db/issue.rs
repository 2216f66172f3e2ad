use anyhow::Context as _;
use chrono::Utc;
use sea_orm::sea_query::{Expr, Order, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, TransactionError, TransactionTrait,
};
use uuid::Uuid;

use tracker_domain::pagination::Sort;
use tracker_domain::status::IssuePriority;
use tracker_schema::{issues, projects};

use super::parse_stored;
use crate::domain::repository::IssueRepository;
use crate::domain::types::{
    Issue, IssueFilter, IssuePatch, IssueSortBy, IssueWithKey, NewIssue,
};
use crate::error::TrackerError;

#[derive(Clone)]
pub struct DbIssueRepository {
    pub db: DatabaseConnection,
}

impl IssueRepository for DbIssueRepository {
    async fn create_next(&self, issue: &NewIssue) -> Result<Issue, TrackerError> {
        let result = self
            .db
            .transaction::<_, issues::Model, DbErr>(|txn| {
                let issue = issue.clone();
                Box::pin(async move {
                    // SELECT … FOR UPDATE serializes number allocation per project.
                    let project = projects::Entity::find_by_id(issue.project_id)
                        .lock_exclusive()
                        .one(txn)
                        .await?
                        .ok_or_else(|| DbErr::RecordNotFound("project".to_owned()))?;
                    let number = project.issue_counter + 1;
                    projects::ActiveModel {
                        id: Set(project.id),
                        issue_counter: Set(number),
                        ..Default::default()
                    }
                    .update(txn)
                    .await?;

                    issues::ActiveModel {
                        id: Set(issue.id),
                        workspace_id: Set(issue.workspace_id),
                        project_id: Set(issue.project_id),
                        number: Set(number),
                        title: Set(issue.title),
                        description: Set(issue.description),
                        status: Set(issue.status.as_str().to_owned()),
                        priority: Set(issue.priority.as_str().to_owned()),
                        assignee_id: Set(issue.assignee_id),
                        creator_id: Set(issue.creator_id),
                        created_at: Set(issue.created_at),
                        updated_at: Set(issue.created_at),
                    }
                    .insert(txn)
                    .await
                })
            })
            .await;

        match result {
            Ok(model) => issue_from_model(model),
            Err(TransactionError::Transaction(DbErr::RecordNotFound(_))) => {
                Err(TrackerError::ProjectNotFound)
            }
            Err(e) => Err(anyhow::Error::new(e).context("create issue").into()),
        }
    }

    async fn find_by_number(
        &self,
        project_id: Uuid,
        number: i32,
    ) -> Result<Option<Issue>, TrackerError> {
        let model = issues::Entity::find()
            .filter(issues::Column::ProjectId.eq(project_id))
            .filter(issues::Column::Number.eq(number))
            .one(&self.db)
            .await
            .context("find issue by number")?;
        model.map(issue_from_model).transpose()
    }

    async fn list(&self, filter: &IssueFilter) -> Result<Vec<IssueWithKey>, TrackerError> {
        let mut query =
            issues::Entity::find().filter(issues::Column::WorkspaceId.eq(filter.workspace_id));
        if let Some(project_id) = filter.project_id {
            query = query.filter(issues::Column::ProjectId.eq(project_id));
        }
        if !filter.statuses.is_empty() {
            query = query.filter(
                issues::Column::Status.is_in(filter.statuses.iter().map(|s| s.as_str())),
            );
        }
        if let Some(priority) = filter.priority {
            query = query.filter(issues::Column::Priority.eq(priority.as_str()));
        }
        if let Some(assignee_id) = filter.assignee_id {
            query = query.filter(issues::Column::AssigneeId.eq(assignee_id));
        }

        query = match filter.sort_by {
            IssueSortBy::CreatedAt(sort) => query.order_by(issues::Column::CreatedAt, order(sort)),
            IssueSortBy::UpdatedAt(sort) => query.order_by(issues::Column::UpdatedAt, order(sort)),
            IssueSortBy::Number(sort) => query.order_by(issues::Column::Number, order(sort)),
            IssueSortBy::Priority(sort) => query.order_by(priority_rank(), order(sort)),
        };

        let page = filter.page.clamped();
        let rows = query
            .order_by_desc(issues::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .find_also_related(projects::Entity)
            .all(&self.db)
            .await
            .context("list issues")?;

        let mut out = Vec::with_capacity(rows.len());
        for (issue, project) in rows {
            let Some(project) = project else { continue };
            out.push(IssueWithKey {
                issue: issue_from_model(issue)?,
                project_identifier: project.identifier,
            });
        }
        Ok(out)
    }

    async fn update(&self, id: Uuid, patch: &IssuePatch) -> Result<Issue, TrackerError> {
        let mut model = issues::ActiveModel {
            id: Set(id),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };
        if let Some(title) = &patch.title {
            model.title = Set(title.clone());
        }
        if let Some(description) = &patch.description {
            model.description = Set(description.clone());
        }
        if let Some(status) = patch.status {
            model.status = Set(status.as_str().to_owned());
        }
        if let Some(priority) = patch.priority {
            model.priority = Set(priority.as_str().to_owned());
        }
        if let Some(assignee_id) = patch.assignee_id {
            model.assignee_id = Set(assignee_id);
        }

        match model.update(&self.db).await {
            Ok(model) => issue_from_model(model),
            Err(DbErr::RecordNotUpdated) => Err(TrackerError::IssueNotFound),
            Err(e) => Err(anyhow::Error::new(e).context("update issue").into()),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<(), TrackerError> {
        issues::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .context("delete issue")?;
        Ok(())
    }
}

fn order(sort: Sort) -> Order {
    match sort {
        Sort::Desc => Order::Desc,
        Sort::Asc => Order::Asc,
    }
}

/// Urgency rank so that `priority-desc` lists urgent issues first and
/// unprioritized ones last.
fn priority_rank() -> SimpleExpr {
    let arms: String = IssuePriority::ALL
        .iter()
        .map(|p| format!(" WHEN '{}' THEN {}", p.as_str(), p.rank()))
        .collect();
    Expr::cust(format!("CASE \"issues\".\"priority\"{arms} ELSE 0 END"))
}

fn issue_from_model(model: issues::Model) -> Result<Issue, TrackerError> {
    Ok(Issue {
        id: model.id,
        workspace_id: model.workspace_id,
        project_id: model.project_id,
        number: model.number,
        title: model.title,
        description: model.description,
        status: parse_stored(&model.status, "issues.status")?,
        priority: parse_stored(&model.priority, "issues.priority")?,
        assignee_id: model.assignee_id,
        creator_id: model.creator_id,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}
