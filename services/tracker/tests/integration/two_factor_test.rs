use chrono::Utc;
use totp_rs::{Algorithm, TOTP};

use tracker_api::crypto::{decrypt_secret, derive_key};
use tracker_api::domain::types::{ClientMeta, User};
use tracker_api::error::TrackerError;
use tracker_api::usecase::two_factor::{
    CompleteTwoFactorSignInUseCase, ConfirmTwoFactorUseCase, DisableTwoFactorUseCase,
    EnableTwoFactorUseCase, GenerateBackupCodesUseCase, SecondFactor, TotpSettings,
};
use tracker_auth_types::token::issue_two_factor_ticket;

use crate::helpers::{MemStore, TEST_AUTH_SECRET, TEST_PASSWORD, expect_err};

const ISSUER: &str = "Tracker";

fn settings() -> TotpSettings {
    TotpSettings {
        encryption_key: derive_key(TEST_AUTH_SECRET),
        issuer: ISSUER.to_owned(),
    }
}

/// The code an authenticator app would show right now for the stored secret.
fn current_code(store: &MemStore, user: &User) -> String {
    let encrypted = store.tables().two_factors[0].secret.clone();
    let secret = decrypt_secret(&derive_key(TEST_AUTH_SECRET), &encrypted).unwrap();
    TOTP::new(
        Algorithm::SHA1,
        6,
        1,
        30,
        secret,
        Some(ISSUER.to_owned()),
        user.email.clone(),
    )
    .unwrap()
    .generate_current()
    .unwrap()
}

fn ticket_for(user: &User) -> String {
    let exp = Utc::now().timestamp() as u64 + 300;
    issue_two_factor_ticket(user.id, exp, TEST_AUTH_SECRET).unwrap()
}

fn complete(store: &MemStore) -> CompleteTwoFactorSignInUseCase<MemStore, MemStore, MemStore> {
    CompleteTwoFactorSignInUseCase {
        users: store.clone(),
        two_factors: store.clone(),
        sessions: store.clone(),
        totp: settings(),
        auth_secret: TEST_AUTH_SECRET.to_owned(),
    }
}

/// Enable and confirm two-factor for `user`; returns the plain backup codes.
async fn enroll(store: &MemStore, user: &User) -> Vec<String> {
    let output = EnableTwoFactorUseCase {
        users: store.clone(),
        two_factors: store.clone(),
        totp: settings(),
    }
    .execute(user, TEST_PASSWORD)
    .await
    .unwrap();
    let code = current_code(store, user);
    ConfirmTwoFactorUseCase {
        two_factors: store.clone(),
        totp: settings(),
    }
    .execute(user, &code)
    .await
    .unwrap();
    output.backup_codes
}

// ── Enrolment ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_stage_unverified_enrolment_on_enable() {
    let store = MemStore::new();
    let user = store.seed_user("Ada", "ada@example.com", None);

    let output = EnableTwoFactorUseCase {
        users: store.clone(),
        two_factors: store.clone(),
        totp: settings(),
    }
    .execute(&user, TEST_PASSWORD)
    .await
    .unwrap();

    assert!(output.totp_uri.starts_with("otpauth://totp/"));
    assert_eq!(output.backup_codes.len(), 10);
    let t = store.tables();
    assert_eq!(t.two_factors.len(), 1);
    assert!(!t.two_factors[0].verified);
    // Only hashes are stored.
    assert!(!t.two_factors[0].backup_codes.contains(&output.backup_codes[0]));
    assert!(!t.users[0].two_factor_enabled);
}

#[tokio::test]
async fn should_require_password_to_enable() {
    let store = MemStore::new();
    let user = store.seed_user("Ada", "ada@example.com", None);

    let err = expect_err(
        EnableTwoFactorUseCase {
            users: store.clone(),
            two_factors: store.clone(),
            totp: settings(),
        }
        .execute(&user, "wrong password")
        .await,
    );

    assert!(matches!(err, TrackerError::InvalidCredentials), "got {err:?}");
    assert!(store.tables().two_factors.is_empty());
}

#[tokio::test]
async fn should_turn_on_two_factor_after_confirming_code() {
    let store = MemStore::new();
    let user = store.seed_user("Ada", "ada@example.com", None);

    enroll(&store, &user).await;

    assert!(store.tables().two_factors[0].verified);
    assert!(store.user(user.id).two_factor_enabled);
}

#[tokio::test]
async fn should_reject_wrong_confirmation_code() {
    let store = MemStore::new();
    let user = store.seed_user("Ada", "ada@example.com", None);
    EnableTwoFactorUseCase {
        users: store.clone(),
        two_factors: store.clone(),
        totp: settings(),
    }
    .execute(&user, TEST_PASSWORD)
    .await
    .unwrap();

    let result = ConfirmTwoFactorUseCase {
        two_factors: store.clone(),
        totp: settings(),
    }
    .execute(&user, "abcdef")
    .await;

    assert!(
        matches!(result, Err(TrackerError::InvalidTwoFactorCode)),
        "got {result:?}"
    );
    assert!(!store.user(user.id).two_factor_enabled);
}

#[tokio::test]
async fn should_not_confirm_without_enrolment() {
    let store = MemStore::new();
    let user = store.seed_user("Ada", "ada@example.com", None);

    let result = ConfirmTwoFactorUseCase {
        two_factors: store.clone(),
        totp: settings(),
    }
    .execute(&user, "123456")
    .await;

    assert!(
        matches!(result, Err(TrackerError::TwoFactorNotEnabled)),
        "got {result:?}"
    );
}

// ── Sign-in completion ───────────────────────────────────────────────────────

#[tokio::test]
async fn should_complete_sign_in_with_totp() {
    let store = MemStore::new();
    let user = store.seed_user("Ada", "ada@example.com", None);
    enroll(&store, &user).await;
    let user = store.user(user.id);

    let code = current_code(&store, &user);
    let signed_in = complete(&store)
        .execute(&ticket_for(&user), SecondFactor::Totp(code), ClientMeta::default())
        .await
        .unwrap();

    assert_eq!(signed_in.user.id, user.id);
    assert_eq!(store.tables().sessions.len(), 1);
}

#[tokio::test]
async fn should_consume_backup_code_once() {
    let store = MemStore::new();
    let user = store.seed_user("Ada", "ada@example.com", None);
    let codes = enroll(&store, &user).await;
    let user = store.user(user.id);

    // Codes are accepted case-insensitively.
    let code = format!("  {}  ", codes[3].to_uppercase());
    complete(&store)
        .execute(
            &ticket_for(&user),
            SecondFactor::BackupCode(code.clone()),
            ClientMeta::default(),
        )
        .await
        .unwrap();
    assert_eq!(store.tables().two_factors[0].backup_codes.len(), 9);

    let err = expect_err(
        complete(&store)
            .execute(&ticket_for(&user), SecondFactor::BackupCode(code), ClientMeta::default())
            .await,
    );
    assert!(matches!(err, TrackerError::InvalidTwoFactorCode), "got {err:?}");
}

#[tokio::test]
async fn should_accept_backup_code_for_only_one_of_two_concurrent_sign_ins() {
    let store = MemStore::new();
    let user = store.seed_user("Ada", "ada@example.com", None);
    let codes = enroll(&store, &user).await;
    let user = store.user(user.id);
    let (first, second) = (complete(&store), complete(&store));
    let ticket = ticket_for(&user);

    let (a, b) = tokio::join!(
        first.execute(
            &ticket,
            SecondFactor::BackupCode(codes[0].clone()),
            ClientMeta::default()
        ),
        second.execute(
            &ticket,
            SecondFactor::BackupCode(codes[0].clone()),
            ClientMeta::default()
        ),
    );

    let accepted = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(accepted, 1);
    let rejected = if a.is_ok() { expect_err(b) } else { expect_err(a) };
    assert!(matches!(rejected, TrackerError::InvalidTwoFactorCode), "got {rejected:?}");
    assert_eq!(store.tables().sessions.len(), 1);
    assert_eq!(store.tables().two_factors[0].backup_codes.len(), 9);
}

#[tokio::test]
async fn should_reject_forged_ticket() {
    let store = MemStore::new();
    let user = store.seed_user("Ada", "ada@example.com", None);
    enroll(&store, &user).await;
    let exp = Utc::now().timestamp() as u64 + 300;
    let forged = issue_two_factor_ticket(user.id, exp, "some-other-secret").unwrap();

    let err = expect_err(
        complete(&store)
            .execute(&forged, SecondFactor::Totp("000000".to_owned()), ClientMeta::default())
            .await,
    );

    assert!(matches!(err, TrackerError::InvalidTwoFactorTicket), "got {err:?}");
    assert!(store.tables().sessions.is_empty());
}

#[tokio::test]
async fn should_reject_ticket_when_two_factor_was_never_confirmed() {
    let store = MemStore::new();
    let user = store.seed_user("Ada", "ada@example.com", None);
    EnableTwoFactorUseCase {
        users: store.clone(),
        two_factors: store.clone(),
        totp: settings(),
    }
    .execute(&user, TEST_PASSWORD)
    .await
    .unwrap();

    let code = current_code(&store, &user);
    let err = expect_err(
        complete(&store)
            .execute(&ticket_for(&user), SecondFactor::Totp(code), ClientMeta::default())
            .await,
    );
    assert!(matches!(err, TrackerError::TwoFactorNotEnabled), "got {err:?}");
}

// ── Backup codes / disable ───────────────────────────────────────────────────

#[tokio::test]
async fn should_replace_backup_codes() {
    let store = MemStore::new();
    let user = store.seed_user("Ada", "ada@example.com", None);
    let old = enroll(&store, &user).await;
    let old_hashes = store.tables().two_factors[0].backup_codes.clone();

    let fresh = GenerateBackupCodesUseCase {
        users: store.clone(),
        two_factors: store.clone(),
    }
    .execute(user.id, TEST_PASSWORD)
    .await
    .unwrap();

    assert_eq!(fresh.len(), 10);
    assert_ne!(fresh, old);
    assert_ne!(store.tables().two_factors[0].backup_codes, old_hashes);
}

#[tokio::test]
async fn should_not_generate_backup_codes_without_enrolment() {
    let store = MemStore::new();
    let user = store.seed_user("Ada", "ada@example.com", None);

    let err = expect_err(
        GenerateBackupCodesUseCase {
            users: store.clone(),
            two_factors: store.clone(),
        }
        .execute(user.id, TEST_PASSWORD)
        .await,
    );
    assert!(matches!(err, TrackerError::TwoFactorNotEnabled), "got {err:?}");
}

#[tokio::test]
async fn should_disable_two_factor_with_password() {
    let store = MemStore::new();
    let user = store.seed_user("Ada", "ada@example.com", None);
    enroll(&store, &user).await;

    DisableTwoFactorUseCase {
        users: store.clone(),
        two_factors: store.clone(),
    }
    .execute(user.id, TEST_PASSWORD)
    .await
    .unwrap();

    assert!(store.tables().two_factors.is_empty());
    assert!(!store.user(user.id).two_factor_enabled);
}
