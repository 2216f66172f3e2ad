use uuid::Uuid;

use tracker_api::error::TrackerError;
use tracker_api::usecase::team::{
    AddTeamMemberUseCase, CheckTeamIdentifierUseCase, CreateTeamInput, CreateTeamUseCase,
    DeleteTeamUseCase, GetTeamUseCase, ListTeamsUseCase, RemoveTeamMemberUseCase,
    UpdateTeamInput, UpdateTeamMemberRoleUseCase, UpdateTeamUseCase,
};
use tracker_domain::role::{TeamRole, WorkspaceRole};

use crate::helpers::{MemStore, expect_err};

/// Workspace `acme` owned by Ada, with Grace as a plain member.
fn setup() -> (MemStore, Uuid, Uuid, Uuid) {
    let store = MemStore::new();
    let owner = store.seed_user("Ada", "ada@example.com", None);
    let member = store.seed_user("Grace", "grace@example.com", None);
    let workspace = store.seed_workspace("acme", owner.id);
    store.seed_member(workspace.id, member.id, WorkspaceRole::Member);
    (store, workspace.id, owner.id, member.id)
}

// ── Create / identifier ──────────────────────────────────────────────────────

#[tokio::test]
async fn should_create_team_with_creator_as_lead() {
    let (store, _, _, member) = setup();

    let team = CreateTeamUseCase {
        workspaces: store.clone(),
        members: store.clone(),
        teams: store.clone(),
    }
    .execute(
        "acme",
        member,
        CreateTeamInput {
            name: "Engineering".to_owned(),
            identifier: " eng ".to_owned(),
            description: None,
        },
    )
    .await
    .unwrap();

    assert_eq!(team.identifier, "ENG");
    let t = store.tables();
    assert_eq!(t.team_members.len(), 1);
    assert_eq!(t.team_members[0].user_id, member);
    assert_eq!(t.team_members[0].role, TeamRole::Lead);
}

#[tokio::test]
async fn should_reject_duplicate_team_identifier() {
    let (store, workspace, owner, _) = setup();
    store.seed_team(workspace, "ENG", Some(owner));

    let err = expect_err(
        CreateTeamUseCase {
            workspaces: store.clone(),
            members: store.clone(),
            teams: store.clone(),
        }
        .execute(
            "acme",
            owner,
            CreateTeamInput {
                name: "Engineering".to_owned(),
                identifier: "eng".to_owned(),
                description: None,
            },
        )
        .await,
    );
    assert!(matches!(err, TrackerError::IdentifierTaken), "got {err:?}");
}

#[tokio::test]
async fn should_check_team_identifier_per_workspace() {
    let (store, workspace, owner, _) = setup();
    store.seed_team(workspace, "ENG", Some(owner));
    let globex = store.seed_workspace("globex", owner);
    store.seed_team(globex.id, "OPS", None);
    let uc = CheckTeamIdentifierUseCase {
        workspaces: store.clone(),
        members: store.clone(),
        teams: store.clone(),
    };

    assert!(!uc.execute("acme", owner, "eng").await.unwrap());
    assert!(uc.execute("acme", owner, "OPS").await.unwrap());
    assert!(matches!(
        uc.execute("acme", owner, "1X").await,
        Err(TrackerError::Validation(_))
    ));
}

// ── List / get ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_list_teams_and_show_members() {
    let (store, workspace, owner, member) = setup();
    let eng = store.seed_team(workspace, "ENG", Some(owner));
    store.seed_team_member(eng.id, member, TeamRole::Member);
    store.seed_team(workspace, "DES", None);

    let teams = ListTeamsUseCase {
        workspaces: store.clone(),
        members: store.clone(),
        teams: store.clone(),
    }
    .execute("acme", member)
    .await
    .unwrap();
    let names: Vec<&str> = teams.iter().map(|t| t.identifier.as_str()).collect();
    assert_eq!(names, vec!["DES", "ENG"]);

    let detail = GetTeamUseCase {
        workspaces: store.clone(),
        members: store.clone(),
        teams: store.clone(),
    }
    .execute("acme", member, "eng")
    .await
    .unwrap();
    assert_eq!(detail.team.id, eng.id);
    let roles: Vec<_> = detail.members.iter().map(|m| (m.user.id, m.role)).collect();
    assert_eq!(roles, vec![(owner, TeamRole::Lead), (member, TeamRole::Member)]);
}

#[tokio::test]
async fn should_return_not_found_for_unknown_or_invalid_team() {
    let (store, _, owner, _) = setup();
    let uc = GetTeamUseCase {
        workspaces: store.clone(),
        members: store.clone(),
        teams: store.clone(),
    };

    let unknown = expect_err(uc.execute("acme", owner, "NOPE").await);
    let invalid = expect_err(uc.execute("acme", owner, "not valid").await);
    assert!(matches!(unknown, TrackerError::TeamNotFound), "got {unknown:?}");
    assert!(matches!(invalid, TrackerError::TeamNotFound), "got {invalid:?}");
}

// ── Update / delete ──────────────────────────────────────────────────────────

#[tokio::test]
async fn should_let_team_lead_update_team() {
    let (store, workspace, _, member) = setup();
    store.seed_team(workspace, "ENG", Some(member));

    let team = UpdateTeamUseCase {
        workspaces: store.clone(),
        members: store.clone(),
        teams: store.clone(),
    }
    .execute(
        "acme",
        member,
        "ENG",
        UpdateTeamInput {
            name: Some("Platform".to_owned()),
            identifier: Some("plat".to_owned()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(team.name, "Platform");
    assert_eq!(team.identifier, "PLAT");
}

#[tokio::test]
async fn should_forbid_non_lead_member_from_managing_team() {
    let (store, workspace, owner, member) = setup();
    let team = store.seed_team(workspace, "ENG", Some(owner));
    store.seed_team_member(team.id, member, TeamRole::Member);

    let update = UpdateTeamUseCase {
        workspaces: store.clone(),
        members: store.clone(),
        teams: store.clone(),
    }
    .execute(
        "acme",
        member,
        "ENG",
        UpdateTeamInput {
            name: Some("Mine".to_owned()),
            ..Default::default()
        },
    )
    .await;
    let delete = DeleteTeamUseCase {
        workspaces: store.clone(),
        members: store.clone(),
        teams: store.clone(),
    }
    .execute("acme", member, "ENG")
    .await;

    assert!(matches!(update, Err(TrackerError::Forbidden)), "got {update:?}");
    assert!(matches!(delete, Err(TrackerError::Forbidden)), "got {delete:?}");
}

#[tokio::test]
async fn should_delete_team_and_unlink_projects() {
    let (store, workspace, owner, _) = setup();
    let team = store.seed_team(workspace, "ENG", Some(owner));
    let project = store.seed_project(workspace, "WEB", owner);
    store.link(project.id, team.id);

    DeleteTeamUseCase {
        workspaces: store.clone(),
        members: store.clone(),
        teams: store.clone(),
    }
    .execute("acme", owner, "ENG")
    .await
    .unwrap();

    let t = store.tables();
    assert!(t.teams.is_empty());
    assert!(t.team_members.is_empty());
    assert!(t.project_teams.is_empty());
    assert_eq!(t.projects.len(), 1);
}

// ── Team members ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_add_only_workspace_members_to_team() {
    let (store, workspace, owner, member) = setup();
    let stranger = store.seed_user("Eve", "eve@example.com", None);
    store.seed_team(workspace, "ENG", Some(owner));
    let uc = AddTeamMemberUseCase {
        workspaces: store.clone(),
        members: store.clone(),
        teams: store.clone(),
    };

    let added = uc
        .execute("acme", owner, "ENG", member, TeamRole::Member)
        .await
        .unwrap();
    assert_eq!(added.user_id, member);

    let again = expect_err(
        uc.execute("acme", owner, "ENG", member, TeamRole::Member)
            .await,
    );
    let outsider = expect_err(
        uc.execute("acme", owner, "ENG", stranger.id, TeamRole::Member)
            .await,
    );
    assert!(matches!(again, TrackerError::AlreadyMember), "got {again:?}");
    assert!(matches!(outsider, TrackerError::MemberNotFound), "got {outsider:?}");
}

#[tokio::test]
async fn should_change_team_member_role() {
    let (store, workspace, owner, member) = setup();
    let team = store.seed_team(workspace, "ENG", Some(owner));
    store.seed_team_member(team.id, member, TeamRole::Member);
    let uc = UpdateTeamMemberRoleUseCase {
        workspaces: store.clone(),
        members: store.clone(),
        teams: store.clone(),
    };

    uc.execute("acme", owner, "ENG", member, TeamRole::Lead)
        .await
        .unwrap();
    let missing = uc
        .execute("acme", owner, "ENG", Uuid::now_v7(), TeamRole::Lead)
        .await;

    assert!(store
        .tables()
        .team_members
        .iter()
        .any(|m| m.user_id == member && m.role == TeamRole::Lead));
    assert!(matches!(missing, Err(TrackerError::MemberNotFound)), "got {missing:?}");
}

#[tokio::test]
async fn should_let_member_leave_team_but_not_remove_others() {
    let (store, workspace, owner, member) = setup();
    let alan = store.seed_user("Alan", "alan@example.com", None);
    store.seed_member(workspace, alan.id, WorkspaceRole::Member);
    let team = store.seed_team(workspace, "ENG", Some(owner));
    store.seed_team_member(team.id, member, TeamRole::Member);
    store.seed_team_member(team.id, alan.id, TeamRole::Member);
    let uc = RemoveTeamMemberUseCase {
        workspaces: store.clone(),
        members: store.clone(),
        teams: store.clone(),
    };

    let kick = uc.execute("acme", member, "ENG", alan.id).await;
    assert!(matches!(kick, Err(TrackerError::Forbidden)), "got {kick:?}");

    uc.execute("acme", member, "ENG", member).await.unwrap();
    let t = store.tables();
    assert!(t.team_members.iter().all(|m| m.user_id != member));
    assert_eq!(t.team_members.len(), 2);
}
