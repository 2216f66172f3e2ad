use tracker_api::error::TrackerError;
use tracker_api::usecase::member::{
    AddMemberInput, AddMemberUseCase, ListMembersUseCase, RemoveMemberUseCase,
    UpdateMemberRoleUseCase,
};
use tracker_domain::role::{TeamRole, WorkspaceRole};

use crate::helpers::{MemStore, expect_err};

fn add_member(store: &MemStore) -> AddMemberUseCase<MemStore, MemStore, MemStore> {
    AddMemberUseCase {
        workspaces: store.clone(),
        members: store.clone(),
        users: store.clone(),
    }
}

// ── List ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_list_members_in_join_order() {
    let store = MemStore::new();
    let owner = store.seed_user("Ada", "ada@example.com", None);
    let member = store.seed_user("Grace", "grace@example.com", None);
    let workspace = store.seed_workspace("acme", owner.id);
    store.seed_member(workspace.id, member.id, WorkspaceRole::Member);

    let list = ListMembersUseCase {
        workspaces: store.clone(),
        members: store.clone(),
    }
    .execute("acme", member.id)
    .await
    .unwrap();

    let ids: Vec<_> = list.iter().map(|m| (m.user.id, m.role)).collect();
    assert_eq!(
        ids,
        vec![(owner.id, WorkspaceRole::Owner), (member.id, WorkspaceRole::Member)]
    );
}

// ── Add ──────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_add_member_by_email_or_username() {
    let store = MemStore::new();
    let owner = store.seed_user("Ada", "ada@example.com", None);
    let grace = store.seed_user("Grace", "grace@example.com", None);
    let alan = store.seed_user("Alan", "alan@example.com", Some("turing"));
    let workspace = store.seed_workspace("acme", owner.id);

    add_member(&store)
        .execute(
            "acme",
            owner.id,
            AddMemberInput {
                email: Some("GRACE@example.com".to_owned()),
                username: None,
                role: WorkspaceRole::Admin,
            },
        )
        .await
        .unwrap();
    let added = add_member(&store)
        .execute(
            "acme",
            owner.id,
            AddMemberInput {
                email: None,
                username: Some("Turing".to_owned()),
                role: WorkspaceRole::Member,
            },
        )
        .await
        .unwrap();

    assert_eq!(added.user_id, alan.id);
    assert_eq!(store.role_of(workspace.id, grace.id), Some(WorkspaceRole::Admin));
    assert_eq!(store.role_of(workspace.id, alan.id), Some(WorkspaceRole::Member));
}

#[tokio::test]
async fn should_only_let_owner_add_admins() {
    let store = MemStore::new();
    let owner = store.seed_user("Ada", "ada@example.com", None);
    let admin = store.seed_user("Grace", "grace@example.com", None);
    store.seed_user("Alan", "alan@example.com", None);
    let workspace = store.seed_workspace("acme", owner.id);
    store.seed_member(workspace.id, admin.id, WorkspaceRole::Admin);

    let err = expect_err(
        add_member(&store)
            .execute(
                "acme",
                admin.id,
                AddMemberInput {
                    email: Some("alan@example.com".to_owned()),
                    username: None,
                    role: WorkspaceRole::Admin,
                },
            )
            .await,
    );
    assert!(matches!(err, TrackerError::Forbidden), "got {err:?}");
}

#[tokio::test]
async fn should_reject_ambiguous_or_duplicate_invites() {
    let store = MemStore::new();
    let owner = store.seed_user("Ada", "ada@example.com", None);
    store.seed_workspace("acme", owner.id);

    let both = expect_err(
        add_member(&store)
            .execute(
                "acme",
                owner.id,
                AddMemberInput {
                    email: Some("ada@example.com".to_owned()),
                    username: Some("ada".to_owned()),
                    role: WorkspaceRole::Member,
                },
            )
            .await,
    );
    let already = expect_err(
        add_member(&store)
            .execute(
                "acme",
                owner.id,
                AddMemberInput {
                    email: Some("ada@example.com".to_owned()),
                    username: None,
                    role: WorkspaceRole::Member,
                },
            )
            .await,
    );
    let unknown = expect_err(
        add_member(&store)
            .execute(
                "acme",
                owner.id,
                AddMemberInput {
                    email: Some("nobody@example.com".to_owned()),
                    username: None,
                    role: WorkspaceRole::Member,
                },
            )
            .await,
    );

    assert!(matches!(both, TrackerError::Validation(_)), "got {both:?}");
    assert!(matches!(already, TrackerError::AlreadyMember), "got {already:?}");
    assert!(matches!(unknown, TrackerError::UserNotFound), "got {unknown:?}");
}

// ── Change role ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_let_admin_manage_members_but_not_admins() {
    let store = MemStore::new();
    let owner = store.seed_user("Ada", "ada@example.com", None);
    let admin = store.seed_user("Grace", "grace@example.com", None);
    let other_admin = store.seed_user("Alan", "alan@example.com", None);
    let member = store.seed_user("Linus", "linus@example.com", None);
    let workspace = store.seed_workspace("acme", owner.id);
    store.seed_member(workspace.id, admin.id, WorkspaceRole::Admin);
    store.seed_member(workspace.id, other_admin.id, WorkspaceRole::Admin);
    store.seed_member(workspace.id, member.id, WorkspaceRole::Member);
    let uc = UpdateMemberRoleUseCase {
        workspaces: store.clone(),
        members: store.clone(),
    };

    let promote = uc
        .execute("acme", admin.id, member.id, WorkspaceRole::Admin)
        .await;
    let demote = uc
        .execute("acme", admin.id, other_admin.id, WorkspaceRole::Member)
        .await;
    let owner_promotes = uc
        .execute("acme", owner.id, member.id, WorkspaceRole::Admin)
        .await;

    assert!(matches!(promote, Err(TrackerError::Forbidden)), "got {promote:?}");
    assert!(matches!(demote, Err(TrackerError::Forbidden)), "got {demote:?}");
    assert!(owner_promotes.is_ok(), "got {owner_promotes:?}");
    assert_eq!(store.role_of(workspace.id, member.id), Some(WorkspaceRole::Admin));
}

#[tokio::test]
async fn should_never_change_owner_role() {
    let store = MemStore::new();
    let owner = store.seed_user("Ada", "ada@example.com", None);
    let workspace = store.seed_workspace("acme", owner.id);

    let uc = UpdateMemberRoleUseCase {
        workspaces: store.clone(),
        members: store.clone(),
    };

    let demote = uc
        .execute("acme", owner.id, owner.id, WorkspaceRole::Member)
        .await;
    // Re-asserting the current role is still a role change on the owner.
    let unchanged = uc
        .execute("acme", owner.id, owner.id, WorkspaceRole::Owner)
        .await;

    assert!(matches!(demote, Err(TrackerError::Forbidden)), "got {demote:?}");
    assert!(matches!(unchanged, Err(TrackerError::Forbidden)), "got {unchanged:?}");
    assert_eq!(store.role_of(workspace.id, owner.id), Some(WorkspaceRole::Owner));
}

#[tokio::test]
async fn should_check_permission_before_treating_same_role_as_no_op() {
    let store = MemStore::new();
    let owner = store.seed_user("Ada", "ada@example.com", None);
    let admin = store.seed_user("Grace", "grace@example.com", None);
    let other_admin = store.seed_user("Alan", "alan@example.com", None);
    let member = store.seed_user("Linus", "linus@example.com", None);
    let workspace = store.seed_workspace("acme", owner.id);
    store.seed_member(workspace.id, admin.id, WorkspaceRole::Admin);
    store.seed_member(workspace.id, other_admin.id, WorkspaceRole::Admin);
    store.seed_member(workspace.id, member.id, WorkspaceRole::Member);
    let uc = UpdateMemberRoleUseCase {
        workspaces: store.clone(),
        members: store.clone(),
    };

    let admin_on_admin = uc
        .execute("acme", admin.id, other_admin.id, WorkspaceRole::Admin)
        .await;
    let admin_on_member = uc
        .execute("acme", admin.id, member.id, WorkspaceRole::Member)
        .await;

    assert!(
        matches!(admin_on_admin, Err(TrackerError::Forbidden)),
        "got {admin_on_admin:?}"
    );
    assert!(admin_on_member.is_ok(), "got {admin_on_member:?}");
}

// ── Remove / leave ───────────────────────────────────────────────────────────

#[tokio::test]
async fn should_remove_member_and_their_team_memberships() {
    let store = MemStore::new();
    let owner = store.seed_user("Ada", "ada@example.com", None);
    let member = store.seed_user("Grace", "grace@example.com", None);
    let workspace = store.seed_workspace("acme", owner.id);
    store.seed_member(workspace.id, member.id, WorkspaceRole::Member);
    let team = store.seed_team(workspace.id, "ENG", Some(owner.id));
    store.seed_team_member(team.id, member.id, TeamRole::Member);

    RemoveMemberUseCase {
        workspaces: store.clone(),
        members: store.clone(),
    }
    .execute("acme", owner.id, member.id)
    .await
    .unwrap();

    let t = store.tables();
    assert!(t.members.iter().all(|m| m.user_id != member.id));
    assert!(t.team_members.iter().all(|m| m.user_id != member.id));
    assert_eq!(t.team_members.len(), 1);
}

#[tokio::test]
async fn should_let_member_leave_but_not_kick_others() {
    let store = MemStore::new();
    let owner = store.seed_user("Ada", "ada@example.com", None);
    let grace = store.seed_user("Grace", "grace@example.com", None);
    let alan = store.seed_user("Alan", "alan@example.com", None);
    let workspace = store.seed_workspace("acme", owner.id);
    store.seed_member(workspace.id, grace.id, WorkspaceRole::Member);
    store.seed_member(workspace.id, alan.id, WorkspaceRole::Member);
    let uc = RemoveMemberUseCase {
        workspaces: store.clone(),
        members: store.clone(),
    };

    let kick = uc.execute("acme", grace.id, alan.id).await;
    assert!(matches!(kick, Err(TrackerError::Forbidden)), "got {kick:?}");

    uc.execute("acme", grace.id, grace.id).await.unwrap();
    assert!(store.role_of(workspace.id, grace.id).is_none());
}

#[tokio::test]
async fn should_never_remove_owner() {
    let store = MemStore::new();
    let owner = store.seed_user("Ada", "ada@example.com", None);
    store.seed_workspace("acme", owner.id);

    let result = RemoveMemberUseCase {
        workspaces: store.clone(),
        members: store.clone(),
    }
    .execute("acme", owner.id, owner.id)
    .await;

    assert!(matches!(result, Err(TrackerError::Forbidden)), "got {result:?}");
}
