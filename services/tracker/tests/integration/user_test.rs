use tracker_api::error::TrackerError;
use tracker_api::usecase::user::{
    DeleteAccountUseCase, ListMyWorkspacesUseCase, UpdateProfileInput, UpdateProfileUseCase,
};
use tracker_domain::role::WorkspaceRole;

use crate::helpers::{MemStore, passkey_record};

// ── Profile ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_update_name_and_username() {
    let store = MemStore::new();
    let user = store.seed_user("Ada", "ada@example.com", None);

    let updated = UpdateProfileUseCase {
        users: store.clone(),
    }
    .execute(
        user.id,
        UpdateProfileInput {
            name: Some("  Ada King ".to_owned()),
            username: Some(Some("Countess".to_owned())),
            image: None,
        },
    )
    .await
    .unwrap();

    assert_eq!(updated.name, "Ada King");
    assert_eq!(updated.username.as_deref(), Some("countess"));
    assert_eq!(updated.display_username.as_deref(), Some("Countess"));
}

#[tokio::test]
async fn should_clear_username_and_image() {
    let store = MemStore::new();
    let user = store.seed_user("Ada", "ada@example.com", Some("ada"));
    store.tables().users[0].image = Some("https://example.com/ada.png".to_owned());

    let updated = UpdateProfileUseCase {
        users: store.clone(),
    }
    .execute(
        user.id,
        UpdateProfileInput {
            username: Some(None),
            image: Some(Some("   ".to_owned())),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert!(updated.username.is_none());
    assert!(updated.display_username.is_none());
    assert!(updated.image.is_none());
}

#[tokio::test]
async fn should_reject_username_taken_by_someone_else() {
    let store = MemStore::new();
    let user = store.seed_user("Ada", "ada@example.com", Some("ada"));
    store.seed_user("Grace", "grace@example.com", Some("grace"));

    let result = UpdateProfileUseCase {
        users: store.clone(),
    }
    .execute(
        user.id,
        UpdateProfileInput {
            username: Some(Some("GRACE".to_owned())),
            ..Default::default()
        },
    )
    .await;

    assert!(
        matches!(result, Err(TrackerError::UsernameTaken)),
        "got {result:?}"
    );
}

#[tokio::test]
async fn should_allow_recasing_own_username() {
    let store = MemStore::new();
    let user = store.seed_user("Ada", "ada@example.com", Some("ada"));

    let updated = UpdateProfileUseCase {
        users: store.clone(),
    }
    .execute(
        user.id,
        UpdateProfileInput {
            username: Some(Some("ADA".to_owned())),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(updated.username.as_deref(), Some("ada"));
    assert_eq!(updated.display_username.as_deref(), Some("ADA"));
}

#[tokio::test]
async fn should_reject_empty_profile_update() {
    let store = MemStore::new();
    let user = store.seed_user("Ada", "ada@example.com", None);

    let result = UpdateProfileUseCase {
        users: store.clone(),
    }
    .execute(user.id, UpdateProfileInput::default())
    .await;

    assert!(
        matches!(result, Err(TrackerError::Validation(_))),
        "got {result:?}"
    );
}

// ── Workspaces of the caller ─────────────────────────────────────────────────

#[tokio::test]
async fn should_list_my_workspaces_by_name_with_role() {
    let store = MemStore::new();
    let ada = store.seed_user("Ada", "ada@example.com", None);
    let grace = store.seed_user("Grace", "grace@example.com", None);
    store.seed_workspace("zeta", ada.id);
    let alpha = store.seed_workspace("alpha", grace.id);
    store.seed_member(alpha.id, ada.id, WorkspaceRole::Member);
    store.seed_workspace("hidden", grace.id);

    let list = ListMyWorkspacesUseCase {
        workspaces: store.clone(),
    }
    .execute(ada.id)
    .await
    .unwrap();

    let slugs: Vec<(&str, WorkspaceRole)> =
        list.iter().map(|(w, role)| (w.slug.as_str(), *role)).collect();
    assert_eq!(
        slugs,
        vec![("alpha", WorkspaceRole::Member), ("zeta", WorkspaceRole::Owner)]
    );
}

// ── Delete account ───────────────────────────────────────────────────────────

#[tokio::test]
async fn should_refuse_to_delete_workspace_owner() {
    let store = MemStore::new();
    let user = store.seed_user("Ada", "ada@example.com", None);
    store.seed_workspace("acme", user.id);

    let result = DeleteAccountUseCase {
        users: store.clone(),
    }
    .execute(user.id)
    .await;

    assert!(
        matches!(result, Err(TrackerError::OwnsWorkspaces)),
        "got {result:?}"
    );
    assert_eq!(store.tables().users.len(), 1);
}

#[tokio::test]
async fn should_delete_account_with_sessions_and_memberships() {
    let store = MemStore::new();
    let owner = store.seed_user("Grace", "grace@example.com", None);
    let user = store.seed_user("Ada", "ada@example.com", None);
    let workspace = store.seed_workspace("acme", owner.id);
    store.seed_member(workspace.id, user.id, WorkspaceRole::Member);
    store.seed_session(user.id);
    store.tables().passkeys.push(passkey_record(user.id, None));

    DeleteAccountUseCase {
        users: store.clone(),
    }
    .execute(user.id)
    .await
    .unwrap();

    let t = store.tables();
    assert!(t.users.iter().all(|u| u.id != user.id));
    assert!(t.sessions.is_empty());
    assert!(t.passkeys.is_empty());
    assert!(t.members.iter().all(|m| m.user_id != user.id));
}
