use uuid::Uuid;

use tracker_api::error::TrackerError;
use tracker_api::usecase::project::{
    CheckProjectIdentifierUseCase, CreateProjectInput, CreateProjectUseCase,
    DeleteProjectUseCase, GetProjectUseCase, LinkProjectTeamUseCase, ListProjectsUseCase,
    UnlinkProjectTeamUseCase, UpdateProjectInput, UpdateProjectUseCase,
};
use tracker_domain::role::{TeamRole, WorkspaceRole};
use tracker_domain::status::ProjectStatus;

use crate::helpers::{MemStore, expect_err, new_issue};

/// Workspace `acme` owned by Ada, with Grace as a plain member.
fn setup() -> (MemStore, Uuid, Uuid, Uuid) {
    let store = MemStore::new();
    let owner = store.seed_user("Ada", "ada@example.com", None);
    let member = store.seed_user("Grace", "grace@example.com", None);
    let workspace = store.seed_workspace("acme", owner.id);
    store.seed_member(workspace.id, member.id, WorkspaceRole::Member);
    (store, workspace.id, owner.id, member.id)
}

fn create_input(identifier: &str, teams: &[&str]) -> CreateProjectInput {
    CreateProjectInput {
        name: "Website".to_owned(),
        identifier: identifier.to_owned(),
        description: None,
        status: None,
        lead_id: None,
        team_identifiers: teams.iter().map(|t| (*t).to_owned()).collect(),
    }
}

fn create(store: &MemStore) -> CreateProjectUseCase<MemStore, MemStore, MemStore, MemStore> {
    CreateProjectUseCase {
        workspaces: store.clone(),
        members: store.clone(),
        teams: store.clone(),
        projects: store.clone(),
    }
}

fn update(store: &MemStore) -> UpdateProjectUseCase<MemStore, MemStore, MemStore, MemStore> {
    UpdateProjectUseCase {
        workspaces: store.clone(),
        members: store.clone(),
        teams: store.clone(),
        projects: store.clone(),
    }
}

// ── Create ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_create_project_linked_to_deduplicated_teams() {
    let (store, workspace, owner, member) = setup();
    store.seed_team(workspace, "WEB", Some(owner));
    store.seed_team(workspace, "DES", None);

    let detail = create(&store)
        .execute("acme", member, create_input("site", &["web", "DES", "Web"]))
        .await
        .unwrap();

    assert_eq!(detail.project.identifier, "SITE");
    assert_eq!(detail.project.status, ProjectStatus::Active);
    assert_eq!(detail.project.creator_id, member);
    assert_eq!(detail.project.issue_counter, 0);
    let teams: Vec<&str> = detail.teams.iter().map(|t| t.identifier.as_str()).collect();
    assert_eq!(teams, vec!["DES", "WEB"]);
    assert_eq!(store.tables().project_teams.len(), 2);
}

#[tokio::test]
async fn should_reject_unknown_team_and_foreign_lead() {
    let (store, _, owner, _) = setup();
    let stranger = store.seed_user("Eve", "eve@example.com", None);

    let unknown_team = expect_err(
        create(&store)
            .execute("acme", owner, create_input("SITE", &["NOPE"]))
            .await,
    );
    let mut input = create_input("SITE", &[]);
    input.lead_id = Some(stranger.id);
    let foreign_lead = expect_err(create(&store).execute("acme", owner, input).await);

    assert!(matches!(unknown_team, TrackerError::TeamNotFound), "got {unknown_team:?}");
    assert!(matches!(foreign_lead, TrackerError::Validation(_)), "got {foreign_lead:?}");
    assert!(store.tables().projects.is_empty());
}

#[tokio::test]
async fn should_reject_taken_project_identifier() {
    let (store, workspace, owner, _) = setup();
    store.seed_project(workspace, "SITE", owner);

    let err = expect_err(
        create(&store)
            .execute("acme", owner, create_input("site", &[]))
            .await,
    );
    assert!(matches!(err, TrackerError::IdentifierTaken), "got {err:?}");
}

#[tokio::test]
async fn should_check_project_identifier() {
    let (store, workspace, owner, _) = setup();
    store.seed_project(workspace, "SITE", owner);
    let uc = CheckProjectIdentifierUseCase {
        workspaces: store.clone(),
        members: store.clone(),
        projects: store.clone(),
    };

    assert!(!uc.execute("acme", owner, "site").await.unwrap());
    assert!(uc.execute("acme", owner, "APP").await.unwrap());
}

// ── List / get ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_filter_projects_by_status() {
    let (store, workspace, owner, member) = setup();
    store.seed_project(workspace, "SITE", owner);
    let archived = store.seed_project(workspace, "OLD", owner);
    store.tables().projects[1].status = ProjectStatus::Archived;
    let uc = ListProjectsUseCase {
        workspaces: store.clone(),
        members: store.clone(),
        projects: store.clone(),
    };

    let all = uc.execute("acme", member, None).await.unwrap();
    let only_archived = uc
        .execute("acme", member, Some(ProjectStatus::Archived))
        .await
        .unwrap();

    assert_eq!(all.len(), 2);
    assert_eq!(only_archived.len(), 1);
    assert_eq!(only_archived[0].id, archived.id);
}

#[tokio::test]
async fn should_get_project_with_linked_teams() {
    let (store, workspace, owner, member) = setup();
    let project = store.seed_project(workspace, "SITE", owner);
    let team = store.seed_team(workspace, "WEB", None);
    store.link(project.id, team.id);

    let detail = GetProjectUseCase {
        workspaces: store.clone(),
        members: store.clone(),
        projects: store.clone(),
    }
    .execute("acme", member, "site")
    .await
    .unwrap();

    assert_eq!(detail.project.id, project.id);
    assert_eq!(detail.teams.len(), 1);
    assert_eq!(detail.teams[0].id, team.id);
}

// ── Update ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_let_linked_team_lead_update_project() {
    let (store, workspace, owner, member) = setup();
    let project = store.seed_project(workspace, "SITE", owner);
    let team = store.seed_team(workspace, "WEB", Some(member));
    store.link(project.id, team.id);

    let updated = update(&store)
        .execute(
            "acme",
            member,
            "SITE",
            UpdateProjectInput {
                status: Some(ProjectStatus::Completed),
                lead_id: Some(Some(member)),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.status, ProjectStatus::Completed);
    assert_eq!(updated.lead_id, Some(member));
}

#[tokio::test]
async fn should_forbid_plain_member_from_updating_project() {
    let (store, workspace, owner, member) = setup();
    let project = store.seed_project(workspace, "SITE", owner);
    let team = store.seed_team(workspace, "WEB", Some(owner));
    store.seed_team_member(team.id, member, TeamRole::Member);
    store.link(project.id, team.id);

    let result = update(&store)
        .execute(
            "acme",
            member,
            "SITE",
            UpdateProjectInput {
                name: Some("Mine".to_owned()),
                ..Default::default()
            },
        )
        .await;

    assert!(matches!(result, Err(TrackerError::Forbidden)), "got {result:?}");
}

#[tokio::test]
async fn should_rename_identifier_and_clear_lead() {
    let (store, workspace, owner, _) = setup();
    store.seed_project(workspace, "SITE", owner);
    store.tables().projects[0].lead_id = Some(owner);
    store.seed_project(workspace, "APP", owner);

    let taken = update(&store)
        .execute(
            "acme",
            owner,
            "SITE",
            UpdateProjectInput {
                identifier: Some("app".to_owned()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(taken, Err(TrackerError::IdentifierTaken)), "got {taken:?}");

    let updated = update(&store)
        .execute(
            "acme",
            owner,
            "SITE",
            UpdateProjectInput {
                identifier: Some("www".to_owned()),
                lead_id: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.identifier, "WWW");
    assert!(updated.lead_id.is_none());
}

#[tokio::test]
async fn should_reject_empty_project_update() {
    let (store, workspace, owner, _) = setup();
    store.seed_project(workspace, "SITE", owner);

    let unchanged = update(&store)
        .execute(
            "acme",
            owner,
            "SITE",
            UpdateProjectInput {
                identifier: Some("site".to_owned()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(unchanged.identifier, "SITE");

    let empty = update(&store)
        .execute("acme", owner, "SITE", UpdateProjectInput::default())
        .await;
    assert!(matches!(empty, Err(TrackerError::Validation(_))), "got {empty:?}");
}

// ── Delete ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_delete_project_with_issues_and_links() {
    let (store, workspace, owner, member) = setup();
    let project = store.seed_project(workspace, "SITE", member);
    let team = store.seed_team(workspace, "WEB", Some(owner));
    store.link(project.id, team.id);
    {
        use tracker_api::domain::repository::IssueRepository;
        store
            .create_next(&new_issue(&project, member, "First"))
            .await
            .unwrap();
    }

    // The project creator may delete it.
    DeleteProjectUseCase {
        workspaces: store.clone(),
        members: store.clone(),
        teams: store.clone(),
        projects: store.clone(),
    }
    .execute("acme", member, "SITE")
    .await
    .unwrap();

    let t = store.tables();
    assert!(t.projects.is_empty());
    assert!(t.issues.is_empty());
    assert!(t.project_teams.is_empty());
    assert_eq!(t.teams.len(), 1);
}

// ── Team links ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_link_idempotently_and_unlink_once() {
    let (store, workspace, owner, _) = setup();
    store.seed_project(workspace, "SITE", owner);
    let team = store.seed_team(workspace, "WEB", None);
    let link = LinkProjectTeamUseCase {
        workspaces: store.clone(),
        members: store.clone(),
        teams: store.clone(),
        projects: store.clone(),
    };
    let unlink = UnlinkProjectTeamUseCase {
        workspaces: store.clone(),
        members: store.clone(),
        teams: store.clone(),
        projects: store.clone(),
    };

    let linked = link.execute("acme", owner, "SITE", "web").await.unwrap();
    link.execute("acme", owner, "SITE", "WEB").await.unwrap();
    assert_eq!(linked.id, team.id);
    assert_eq!(store.tables().project_teams.len(), 1);

    unlink.execute("acme", owner, "SITE", "WEB").await.unwrap();
    let again = unlink.execute("acme", owner, "SITE", "WEB").await;
    assert!(matches!(again, Err(TrackerError::TeamNotFound)), "got {again:?}");
    assert!(store.tables().project_teams.is_empty());
}
