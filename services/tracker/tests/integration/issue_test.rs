use uuid::Uuid;

use tracker_api::domain::types::IssueSortBy;
use tracker_api::error::TrackerError;
use tracker_api::usecase::issue::{
    CreateIssueInput, CreateIssueUseCase, DeleteIssueUseCase, GetIssueUseCase, ListIssuesInput,
    ListIssuesUseCase, UpdateIssueInput, UpdateIssueUseCase,
};
use tracker_domain::id::IssueKey;
use tracker_domain::pagination::{PageRequest, Sort};
use tracker_domain::role::WorkspaceRole;
use tracker_domain::status::{IssuePriority, IssueStatus};

use crate::helpers::{MemStore, expect_err};

/// Workspace `acme` owned by Ada with Grace as a member, and projects WEB and APP.
fn setup() -> (MemStore, Uuid, Uuid) {
    let store = MemStore::new();
    let owner = store.seed_user("Ada", "ada@example.com", None);
    let member = store.seed_user("Grace", "grace@example.com", None);
    let workspace = store.seed_workspace("acme", owner.id);
    store.seed_member(workspace.id, member.id, WorkspaceRole::Member);
    store.seed_project(workspace.id, "WEB", owner.id);
    store.seed_project(workspace.id, "APP", owner.id);
    (store, owner.id, member.id)
}

fn create_uc(store: &MemStore) -> CreateIssueUseCase<MemStore, MemStore, MemStore, MemStore> {
    CreateIssueUseCase {
        workspaces: store.clone(),
        members: store.clone(),
        projects: store.clone(),
        issues: store.clone(),
    }
}

fn list_uc(store: &MemStore) -> ListIssuesUseCase<MemStore, MemStore, MemStore, MemStore> {
    ListIssuesUseCase {
        workspaces: store.clone(),
        members: store.clone(),
        projects: store.clone(),
        issues: store.clone(),
    }
}

fn delete_uc(
    store: &MemStore,
) -> DeleteIssueUseCase<MemStore, MemStore, MemStore, MemStore, MemStore> {
    DeleteIssueUseCase {
        workspaces: store.clone(),
        members: store.clone(),
        teams: store.clone(),
        projects: store.clone(),
        issues: store.clone(),
    }
}

fn input(project: &str, title: &str) -> CreateIssueInput {
    CreateIssueInput {
        project: project.to_owned(),
        title: title.to_owned(),
        description: None,
        status: None,
        priority: None,
        assignee_id: None,
    }
}

async fn create(store: &MemStore, user_id: Uuid, input: CreateIssueInput) -> IssueKey {
    create_uc(store)
        .execute("acme", user_id, input)
        .await
        .unwrap()
        .key()
}

// ── Create ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_number_issues_per_project() {
    let (store, owner, member) = setup();

    let first = create(&store, owner, input("web", "First")).await;
    let second = create(&store, member, input("WEB", "Second")).await;
    let other = create(&store, owner, input("APP", "Elsewhere")).await;

    assert_eq!(first.to_string(), "WEB-1");
    assert_eq!(second.to_string(), "WEB-2");
    assert_eq!(other.to_string(), "APP-1");
    assert_eq!(store.tables().projects[0].issue_counter, 2);
}

#[tokio::test]
async fn should_default_new_issue_to_backlog_without_priority() {
    let (store, owner, _) = setup();

    let created = create_uc(&store)
        .execute("acme", owner, input("WEB", "  Fix login  "))
        .await
        .unwrap();

    assert_eq!(created.issue.title, "Fix login");
    assert_eq!(created.issue.status, IssueStatus::Backlog);
    assert_eq!(created.issue.priority, IssuePriority::NoPriority);
    assert_eq!(created.issue.creator_id, owner);
    assert!(created.issue.assignee_id.is_none());
}

#[tokio::test]
async fn should_reject_assignee_outside_workspace() {
    let (store, owner, _) = setup();
    let stranger = store.seed_user("Eve", "eve@example.com", None);
    let mut bad = input("WEB", "Fix login");
    bad.assignee_id = Some(stranger.id);

    let err = expect_err(create_uc(&store).execute("acme", owner, bad).await);

    assert!(matches!(err, TrackerError::Validation(_)), "got {err:?}");
    assert!(store.tables().issues.is_empty());
    assert_eq!(store.tables().projects[0].issue_counter, 0);
}

#[tokio::test]
async fn should_reject_issue_in_unknown_project() {
    let (store, owner, _) = setup();

    let err = expect_err(create_uc(&store).execute("acme", owner, input("NOPE", "x")).await);
    assert!(matches!(err, TrackerError::ProjectNotFound), "got {err:?}");
}

// ── List ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_filter_by_project_status_and_assignee() {
    let (store, owner, member) = setup();
    let mut assigned = input("WEB", "Assigned");
    assigned.assignee_id = Some(member);
    assigned.status = Some(IssueStatus::InProgress);
    create(&store, owner, assigned).await;
    create(&store, owner, input("WEB", "Backlog")).await;
    let mut done = input("APP", "Done");
    done.status = Some(IssueStatus::Done);
    create(&store, owner, done).await;

    let web_only = list_uc(&store)
        .execute(
            "acme",
            member,
            ListIssuesInput {
                project: Some("web".to_owned()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let open = list_uc(&store)
        .execute(
            "acme",
            member,
            ListIssuesInput {
                statuses: vec![
                    IssueStatus::InProgress,
                    IssueStatus::Backlog,
                    IssueStatus::InProgress,
                ],
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let mine = list_uc(&store)
        .execute(
            "acme",
            member,
            ListIssuesInput {
                assignee_id: Some(member),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(web_only.len(), 2);
    assert!(web_only.iter().all(|i| i.project_identifier == "WEB"));
    assert_eq!(open.len(), 2);
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].key().to_string(), "WEB-1");
}

#[tokio::test]
async fn should_sort_by_priority_rank() {
    let (store, owner, _) = setup();
    for (title, priority) in [
        ("low", IssuePriority::Low),
        ("urgent", IssuePriority::Urgent),
        ("none", IssuePriority::NoPriority),
        ("medium", IssuePriority::Medium),
    ] {
        let mut i = input("WEB", title);
        i.priority = Some(priority);
        create(&store, owner, i).await;
    }

    let list = list_uc(&store)
        .execute(
            "acme",
            owner,
            ListIssuesInput {
                sort_by: IssueSortBy::Priority(Sort::Desc),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let titles: Vec<&str> = list.iter().map(|i| i.issue.title.as_str()).collect();
    assert_eq!(titles, vec!["urgent", "medium", "low", "none"]);
}

#[tokio::test]
async fn should_paginate_by_number() {
    let (store, owner, _) = setup();
    for n in 1..=5 {
        create(&store, owner, input("WEB", &format!("Issue {n}"))).await;
    }

    let page = list_uc(&store)
        .execute(
            "acme",
            owner,
            ListIssuesInput {
                sort_by: IssueSortBy::Number(Sort::Asc),
                page: PageRequest {
                    per_page: 2,
                    page: 2,
                },
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let numbers: Vec<i32> = page.iter().map(|i| i.issue.number).collect();
    assert_eq!(numbers, vec![3, 4]);
}

#[tokio::test]
async fn should_reject_unknown_project_filter() {
    let (store, owner, _) = setup();

    let err = expect_err(
        list_uc(&store)
            .execute(
                "acme",
                owner,
                ListIssuesInput {
                    project: Some("NOPE".to_owned()),
                    ..Default::default()
                },
            )
            .await,
    );
    assert!(matches!(err, TrackerError::ProjectNotFound), "got {err:?}");
}

#[tokio::test]
async fn should_not_list_issues_to_outsiders() {
    let (store, owner, _) = setup();
    let stranger = store.seed_user("Eve", "eve@example.com", None);
    create(&store, owner, input("WEB", "Secret")).await;

    let err = expect_err(
        list_uc(&store)
            .execute("acme", stranger.id, ListIssuesInput::default())
            .await,
    );
    assert!(matches!(err, TrackerError::Forbidden), "got {err:?}");
}

// ── Get / update ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_get_issue_by_key_case_insensitively() {
    let (store, owner, member) = setup();
    create(&store, owner, input("WEB", "First")).await;
    let uc = GetIssueUseCase {
        workspaces: store.clone(),
        members: store.clone(),
        projects: store.clone(),
        issues: store.clone(),
    };

    let issue = uc.execute("acme", member, "web-1").await.unwrap();
    assert_eq!(issue.issue.title, "First");

    let missing = expect_err(uc.execute("acme", member, "WEB-2").await);
    let malformed = expect_err(uc.execute("acme", member, "WEB").await);
    assert!(matches!(missing, TrackerError::IssueNotFound), "got {missing:?}");
    assert!(matches!(malformed, TrackerError::IssueNotFound), "got {malformed:?}");
}

#[tokio::test]
async fn should_let_any_member_update_issue() {
    let (store, owner, member) = setup();
    create(&store, owner, input("WEB", "First")).await;
    let uc = UpdateIssueUseCase {
        workspaces: store.clone(),
        members: store.clone(),
        projects: store.clone(),
        issues: store.clone(),
    };

    let updated = uc
        .execute(
            "acme",
            member,
            "WEB-1",
            UpdateIssueInput {
                status: Some(IssueStatus::Todo),
                priority: Some(IssuePriority::High),
                assignee_id: Some(Some(member)),
                description: Some(Some("Steps to reproduce".to_owned())),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.key().to_string(), "WEB-1");
    assert_eq!(updated.issue.status, IssueStatus::Todo);
    assert_eq!(updated.issue.priority, IssuePriority::High);
    assert_eq!(updated.issue.assignee_id, Some(member));
    assert_eq!(updated.issue.description.as_deref(), Some("Steps to reproduce"));

    let unassigned = uc
        .execute(
            "acme",
            member,
            "WEB-1",
            UpdateIssueInput {
                assignee_id: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(unassigned.issue.assignee_id.is_none());

    let empty = expect_err(
        uc.execute("acme", member, "WEB-1", UpdateIssueInput::default())
            .await,
    );
    assert!(matches!(empty, TrackerError::Validation(_)), "got {empty:?}");
}

// ── Delete ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_let_creator_delete_own_issue() {
    let (store, _, member) = setup();
    create(&store, member, input("WEB", "Mine")).await;

    delete_uc(&store).execute("acme", member, "WEB-1").await.unwrap();

    assert!(store.tables().issues.is_empty());
}

#[tokio::test]
async fn should_forbid_member_from_deleting_others_issue() {
    let (store, owner, member) = setup();
    create(&store, owner, input("WEB", "Theirs")).await;

    let result = delete_uc(&store).execute("acme", member, "WEB-1").await;

    assert!(matches!(result, Err(TrackerError::Forbidden)), "got {result:?}");
    assert_eq!(store.tables().issues.len(), 1);
}

#[tokio::test]
async fn should_let_project_manager_delete_any_issue() {
    let (store, owner, member) = setup();
    create(&store, member, input("WEB", "Theirs")).await;

    delete_uc(&store).execute("acme", owner, "WEB-1").await.unwrap();

    assert!(store.tables().issues.is_empty());
}

#[tokio::test]
async fn should_not_reuse_numbers_after_delete() {
    let (store, owner, _) = setup();
    create(&store, owner, input("WEB", "First")).await;
    delete_uc(&store).execute("acme", owner, "WEB-1").await.unwrap();

    let next = create(&store, owner, input("WEB", "Second")).await;
    assert_eq!(next.to_string(), "WEB-2");
}
