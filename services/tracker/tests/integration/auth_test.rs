use tracker_api::domain::types::ClientMeta;
use tracker_api::error::TrackerError;
use tracker_api::usecase::auth::{
    ChangePasswordInput, ChangePasswordUseCase, CheckUsernameUseCase, SignInIdentifier,
    SignInOutcome, SignInUseCase, SignUpInput, SignUpUseCase,
};
use tracker_auth_types::token::{hash_token, validate_two_factor_ticket};

use crate::helpers::{MemStore, TEST_AUTH_SECRET, TEST_PASSWORD, expect_err};

fn sign_up_input(email: &str, username: Option<&str>) -> SignUpInput {
    SignUpInput {
        name: "Ada Lovelace".to_owned(),
        email: email.to_owned(),
        password: TEST_PASSWORD.to_owned(),
        username: username.map(str::to_owned),
    }
}

fn sign_in(store: &MemStore) -> SignInUseCase<MemStore, MemStore> {
    SignInUseCase {
        users: store.clone(),
        sessions: store.clone(),
        auth_secret: TEST_AUTH_SECRET.to_owned(),
    }
}

// ── Sign up ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_sign_up_and_open_session() {
    let store = MemStore::new();
    let uc = SignUpUseCase {
        users: store.clone(),
        sessions: store.clone(),
    };

    let signed_in = uc
        .execute(
            sign_up_input("  Ada@Example.COM ", Some("Ada_L")),
            ClientMeta {
                ip_address: Some("203.0.113.7".to_owned()),
                user_agent: Some("curl/8.0".to_owned()),
            },
        )
        .await
        .unwrap();

    assert_eq!(signed_in.user.email, "ada@example.com");
    assert_eq!(signed_in.user.username.as_deref(), Some("ada_l"));
    assert_eq!(signed_in.user.display_username.as_deref(), Some("Ada_L"));
    assert!(!signed_in.user.two_factor_enabled);

    let t = store.tables();
    assert_eq!(t.sessions.len(), 1);
    let session = &t.sessions[0];
    assert_eq!(session.user_id, signed_in.user.id);
    assert_eq!(session.token_hash, hash_token(&signed_in.token));
    assert_eq!(session.ip_address.as_deref(), Some("203.0.113.7"));
    assert!(t.passwords[&signed_in.user.id].starts_with("$argon2id$"));
}

#[tokio::test]
async fn should_reject_duplicate_email_on_sign_up() {
    let store = MemStore::new();
    store.seed_user("Ada", "ada@example.com", None);
    let uc = SignUpUseCase {
        users: store.clone(),
        sessions: store.clone(),
    };

    let err = expect_err(
        uc.execute(sign_up_input("ADA@example.com", None), ClientMeta::default())
            .await,
    );
    assert!(matches!(err, TrackerError::EmailTaken), "got {err:?}");
}

#[tokio::test]
async fn should_reject_duplicate_username_case_insensitively() {
    let store = MemStore::new();
    store.seed_user("Ada", "ada@example.com", Some("ada"));
    let uc = SignUpUseCase {
        users: store.clone(),
        sessions: store.clone(),
    };

    let err = expect_err(
        uc.execute(sign_up_input("other@example.com", Some("ADA")), ClientMeta::default())
            .await,
    );
    assert!(matches!(err, TrackerError::UsernameTaken), "got {err:?}");
}

#[tokio::test]
async fn should_reject_short_password_on_sign_up() {
    let store = MemStore::new();
    let uc = SignUpUseCase {
        users: store.clone(),
        sessions: store.clone(),
    };
    let mut input = sign_up_input("ada@example.com", None);
    input.password = "short".to_owned();

    let err = expect_err(uc.execute(input, ClientMeta::default()).await);
    assert!(matches!(err, TrackerError::Validation(_)), "got {err:?}");
    assert!(store.tables().users.is_empty());
}

#[tokio::test]
async fn should_reject_email_that_cannot_label_a_totp_account() {
    let store = MemStore::new();
    let uc = SignUpUseCase {
        users: store.clone(),
        sessions: store.clone(),
    };

    let err = expect_err(
        uc.execute(sign_up_input("a:b@example.com", None), ClientMeta::default())
            .await,
    );
    assert!(matches!(err, TrackerError::Validation(_)), "got {err:?}");
    assert!(store.tables().users.is_empty());
}

// ── Sign in ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_sign_in_with_email() {
    let store = MemStore::new();
    let user = store.seed_user("Ada", "ada@example.com", None);

    let outcome = sign_in(&store)
        .execute(
            SignInIdentifier::Email("ADA@example.com".to_owned()),
            TEST_PASSWORD,
            ClientMeta::default(),
        )
        .await
        .unwrap();

    match outcome {
        SignInOutcome::SignedIn(signed_in) => assert_eq!(signed_in.user.id, user.id),
        SignInOutcome::TwoFactorRequired { .. } => panic!("two-factor is not enabled"),
    }
    assert_eq!(store.tables().sessions.len(), 1);
}

#[tokio::test]
async fn should_sign_in_with_username() {
    let store = MemStore::new();
    let user = store.seed_user("Ada", "ada@example.com", Some("ada"));

    let outcome = sign_in(&store)
        .execute(
            SignInIdentifier::Username("Ada".to_owned()),
            TEST_PASSWORD,
            ClientMeta::default(),
        )
        .await
        .unwrap();

    assert!(matches!(outcome, SignInOutcome::SignedIn(s) if s.user.id == user.id));
}

#[tokio::test]
async fn should_reject_wrong_password_and_unknown_user_alike() {
    let store = MemStore::new();
    store.seed_user("Ada", "ada@example.com", None);

    let wrong_password = expect_err(
        sign_in(&store)
            .execute(
                SignInIdentifier::Email("ada@example.com".to_owned()),
                "not the password",
                ClientMeta::default(),
            )
            .await,
    );
    let unknown = expect_err(
        sign_in(&store)
            .execute(
                SignInIdentifier::Email("nobody@example.com".to_owned()),
                TEST_PASSWORD,
                ClientMeta::default(),
            )
            .await,
    );
    let malformed = expect_err(
        sign_in(&store)
            .execute(
                SignInIdentifier::Username("!!".to_owned()),
                TEST_PASSWORD,
                ClientMeta::default(),
            )
            .await,
    );

    assert!(matches!(wrong_password, TrackerError::InvalidCredentials));
    assert!(matches!(unknown, TrackerError::InvalidCredentials));
    assert!(matches!(malformed, TrackerError::InvalidCredentials));
    assert!(store.tables().sessions.is_empty());
}

#[tokio::test]
async fn should_issue_ticket_instead_of_session_when_two_factor_enabled() {
    let store = MemStore::new();
    let user = store.seed_user("Ada", "ada@example.com", None);
    store.tables().users[0].two_factor_enabled = true;

    let outcome = sign_in(&store)
        .execute(
            SignInIdentifier::Email("ada@example.com".to_owned()),
            TEST_PASSWORD,
            ClientMeta::default(),
        )
        .await
        .unwrap();

    let SignInOutcome::TwoFactorRequired { ticket } = outcome else {
        panic!("expected a two-factor ticket");
    };
    assert_eq!(
        validate_two_factor_ticket(&ticket, TEST_AUTH_SECRET).unwrap(),
        user.id
    );
    assert!(store.tables().sessions.is_empty());
}

// ── Change password ──────────────────────────────────────────────────────────

#[tokio::test]
async fn should_change_password_and_revoke_other_sessions() {
    let store = MemStore::new();
    let user = store.seed_user("Ada", "ada@example.com", None);
    let (current, _) = store.seed_session(user.id);
    store.seed_session(user.id);
    let old_hash = store.tables().passwords[&user.id].clone();

    let uc = ChangePasswordUseCase {
        users: store.clone(),
        sessions: store.clone(),
    };
    uc.execute(
        user.id,
        current.id,
        ChangePasswordInput {
            current_password: TEST_PASSWORD.to_owned(),
            new_password: "a brand new password".to_owned(),
            revoke_other_sessions: true,
        },
    )
    .await
    .unwrap();

    let t = store.tables();
    assert_ne!(t.passwords[&user.id], old_hash);
    assert_eq!(t.sessions.len(), 1);
    assert_eq!(t.sessions[0].id, current.id);
}

#[tokio::test]
async fn should_keep_sessions_when_not_asked_to_revoke() {
    let store = MemStore::new();
    let user = store.seed_user("Ada", "ada@example.com", None);
    let (current, _) = store.seed_session(user.id);
    store.seed_session(user.id);

    let uc = ChangePasswordUseCase {
        users: store.clone(),
        sessions: store.clone(),
    };
    uc.execute(
        user.id,
        current.id,
        ChangePasswordInput {
            current_password: TEST_PASSWORD.to_owned(),
            new_password: "a brand new password".to_owned(),
            revoke_other_sessions: false,
        },
    )
    .await
    .unwrap();

    assert_eq!(store.tables().sessions.len(), 2);
}

#[tokio::test]
async fn should_reject_password_change_with_wrong_current_password() {
    let store = MemStore::new();
    let user = store.seed_user("Ada", "ada@example.com", None);
    let (current, _) = store.seed_session(user.id);

    let uc = ChangePasswordUseCase {
        users: store.clone(),
        sessions: store.clone(),
    };
    let result = uc
        .execute(
            user.id,
            current.id,
            ChangePasswordInput {
                current_password: "wrong password".to_owned(),
                new_password: "a brand new password".to_owned(),
                revoke_other_sessions: true,
            },
        )
        .await;

    assert!(
        matches!(result, Err(TrackerError::InvalidCredentials)),
        "got {result:?}"
    );
}

// ── Username availability ────────────────────────────────────────────────────

#[tokio::test]
async fn should_report_username_availability() {
    let store = MemStore::new();
    let user = store.seed_user("Ada", "ada@example.com", Some("ada"));
    let uc = CheckUsernameUseCase {
        users: store.clone(),
    };

    assert!(uc.execute("grace", None).await.unwrap());
    assert!(!uc.execute("ADA", None).await.unwrap());
    // A user's own name counts as available to them.
    assert!(uc.execute("ada", Some(user.id)).await.unwrap());
    assert!(matches!(
        uc.execute("a", None).await,
        Err(TrackerError::Validation(_))
    ));
}
