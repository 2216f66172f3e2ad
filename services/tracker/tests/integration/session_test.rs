use chrono::{Duration, Utc};

use tracker_api::error::TrackerError;
use tracker_api::usecase::session::{
    ListSessionsUseCase, ResolveSessionUseCase, RevokeOtherSessionsUseCase, RevokeSessionUseCase,
    SignOutUseCase,
};

use crate::helpers::{MemStore, expect_err};

fn resolver(store: &MemStore) -> ResolveSessionUseCase<MemStore, MemStore> {
    ResolveSessionUseCase {
        sessions: store.clone(),
        users: store.clone(),
    }
}

// ── Resolve ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_resolve_fresh_session_without_refresh() {
    let store = MemStore::new();
    let user = store.seed_user("Ada", "ada@example.com", None);
    let (session, token) = store.seed_session(user.id);

    let ctx = resolver(&store).execute(&token).await.unwrap();

    assert_eq!(ctx.user.id, user.id);
    assert_eq!(ctx.session.id, session.id);
    assert!(!ctx.refreshed);
    assert_eq!(store.tables().sessions[0].expires_at, session.expires_at);
}

#[tokio::test]
async fn should_slide_expiry_once_session_is_a_day_old() {
    let store = MemStore::new();
    let user = store.seed_user("Ada", "ada@example.com", None);
    let (session, token) = store.seed_session_aged(user.id, Duration::hours(30));

    let ctx = resolver(&store).execute(&token).await.unwrap();

    assert!(ctx.refreshed);
    assert!(ctx.session.expires_at > session.expires_at);
    let stored = store.tables().sessions[0].clone();
    assert_eq!(stored.expires_at, ctx.session.expires_at);
    assert!(stored.expires_at > Utc::now() + Duration::days(6));
}

#[tokio::test]
async fn should_reject_and_delete_expired_session() {
    let store = MemStore::new();
    let user = store.seed_user("Ada", "ada@example.com", None);
    let (_, token) = store.seed_session_aged(user.id, Duration::days(8));

    let err = expect_err(resolver(&store).execute(&token).await);

    assert!(matches!(err, TrackerError::Unauthorized), "got {err:?}");
    assert!(store.tables().sessions.is_empty());
}

#[tokio::test]
async fn should_reject_unknown_token() {
    let store = MemStore::new();
    store.seed_user("Ada", "ada@example.com", None);

    let err = expect_err(resolver(&store).execute("not-a-token").await);
    assert!(matches!(err, TrackerError::Unauthorized), "got {err:?}");
}

// ── Sign out / list / revoke ─────────────────────────────────────────────────

#[tokio::test]
async fn should_sign_out_current_session_only() {
    let store = MemStore::new();
    let user = store.seed_user("Ada", "ada@example.com", None);
    let (current, _) = store.seed_session(user.id);
    let (other, _) = store.seed_session(user.id);

    SignOutUseCase {
        sessions: store.clone(),
    }
    .execute(current.id)
    .await
    .unwrap();

    let t = store.tables();
    assert_eq!(t.sessions.len(), 1);
    assert_eq!(t.sessions[0].id, other.id);
}

#[tokio::test]
async fn should_list_sessions_newest_first_and_flag_current() {
    let store = MemStore::new();
    let user = store.seed_user("Ada", "ada@example.com", None);
    let (old, _) = store.seed_session_aged(user.id, Duration::hours(2));
    let (current, _) = store.seed_session(user.id);
    // Expired sessions are not listed.
    store.seed_session_aged(user.id, Duration::days(10));

    let list = ListSessionsUseCase {
        sessions: store.clone(),
    }
    .execute(user.id, current.id)
    .await
    .unwrap();

    assert_eq!(list.len(), 2);
    assert_eq!(list[0].session.id, current.id);
    assert!(list[0].current);
    assert_eq!(list[1].session.id, old.id);
    assert!(!list[1].current);
}

#[tokio::test]
async fn should_not_revoke_someone_elses_session() {
    let store = MemStore::new();
    let ada = store.seed_user("Ada", "ada@example.com", None);
    let grace = store.seed_user("Grace", "grace@example.com", None);
    let (theirs, _) = store.seed_session(grace.id);

    let result = RevokeSessionUseCase {
        sessions: store.clone(),
    }
    .execute(ada.id, theirs.id)
    .await;

    assert!(
        matches!(result, Err(TrackerError::SessionNotFound)),
        "got {result:?}"
    );
    assert_eq!(store.tables().sessions.len(), 1);
}

#[tokio::test]
async fn should_revoke_own_session() {
    let store = MemStore::new();
    let user = store.seed_user("Ada", "ada@example.com", None);
    let (session, _) = store.seed_session(user.id);

    RevokeSessionUseCase {
        sessions: store.clone(),
    }
    .execute(user.id, session.id)
    .await
    .unwrap();

    assert!(store.tables().sessions.is_empty());
}

#[tokio::test]
async fn should_revoke_every_other_session() {
    let store = MemStore::new();
    let ada = store.seed_user("Ada", "ada@example.com", None);
    let grace = store.seed_user("Grace", "grace@example.com", None);
    let (current, _) = store.seed_session(ada.id);
    store.seed_session(ada.id);
    store.seed_session(ada.id);
    store.seed_session(grace.id);

    RevokeOtherSessionsUseCase {
        sessions: store.clone(),
    }
    .execute(ada.id, current.id)
    .await
    .unwrap();

    let t = store.tables();
    assert_eq!(t.sessions.len(), 2);
    assert!(t.sessions.iter().any(|s| s.id == current.id));
    assert!(t.sessions.iter().any(|s| s.user_id == grace.id));
}
