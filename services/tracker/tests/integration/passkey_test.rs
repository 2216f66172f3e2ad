use tracker_api::error::TrackerError;
use tracker_api::usecase::passkey::{
    DeletePasskeyUseCase, ListPasskeysUseCase, RenamePasskeyUseCase, StartAuthenticationUseCase,
    StartRegistrationUseCase,
};
use uuid::Uuid;

use crate::helpers::{MemStore, expect_err, passkey_record, test_webauthn};

// ── ListPasskeysUseCase ──────────────────────────────────────────────────────

#[tokio::test]
async fn should_list_only_own_passkeys() {
    let store = MemStore::new();
    let ada = store.seed_user("Ada", "ada@example.com", None);
    let grace = store.seed_user("Grace", "grace@example.com", None);
    let mine = passkey_record(ada.id, Some("Laptop"));
    {
        let mut t = store.tables();
        t.passkeys.push(mine.clone());
        t.passkeys.push(passkey_record(grace.id, None));
    }

    let list = ListPasskeysUseCase {
        passkeys: store.clone(),
    }
    .execute(ada.id)
    .await
    .unwrap();

    assert_eq!(list.len(), 1);
    assert_eq!(list[0].id, mine.id);
    assert_eq!(list[0].name.as_deref(), Some("Laptop"));
}

// ── Rename / delete ──────────────────────────────────────────────────────────

#[tokio::test]
async fn should_rename_and_clear_passkey_name() {
    let store = MemStore::new();
    let user = store.seed_user("Ada", "ada@example.com", None);
    let record = passkey_record(user.id, None);
    store.tables().passkeys.push(record.clone());
    let uc = RenamePasskeyUseCase {
        passkeys: store.clone(),
    };

    uc.execute(record.id, user.id, Some("  YubiKey  ")).await.unwrap();
    assert_eq!(store.tables().passkeys[0].name.as_deref(), Some("YubiKey"));

    uc.execute(record.id, user.id, Some("")).await.unwrap();
    assert!(store.tables().passkeys[0].name.is_none());
}

#[tokio::test]
async fn should_not_rename_someone_elses_passkey() {
    let store = MemStore::new();
    let ada = store.seed_user("Ada", "ada@example.com", None);
    let grace = store.seed_user("Grace", "grace@example.com", None);
    let record = passkey_record(grace.id, Some("Phone"));
    store.tables().passkeys.push(record.clone());

    let result = RenamePasskeyUseCase {
        passkeys: store.clone(),
    }
    .execute(record.id, ada.id, Some("Mine now"))
    .await;

    assert!(
        matches!(result, Err(TrackerError::PasskeyNotFound)),
        "got {result:?}"
    );
    assert_eq!(store.tables().passkeys[0].name.as_deref(), Some("Phone"));
}

#[tokio::test]
async fn should_delete_own_passkey() {
    let store = MemStore::new();
    let user = store.seed_user("Ada", "ada@example.com", None);
    let record = passkey_record(user.id, None);
    store.tables().passkeys.push(record.clone());

    DeletePasskeyUseCase {
        passkeys: store.clone(),
    }
    .execute(record.id, user.id)
    .await
    .unwrap();

    assert!(store.tables().passkeys.is_empty());
}

#[tokio::test]
async fn should_return_not_found_when_deleting_unknown_passkey() {
    let store = MemStore::new();
    let user = store.seed_user("Ada", "ada@example.com", None);

    let result = DeletePasskeyUseCase {
        passkeys: store.clone(),
    }
    .execute(Uuid::now_v7(), user.id)
    .await;

    assert!(
        matches!(result, Err(TrackerError::PasskeyNotFound)),
        "got {result:?}"
    );
}

// ── Ceremonies ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_park_registration_state_under_returned_id() {
    let store = MemStore::new();
    let user = store.seed_user("Ada", "ada@example.com", None);

    let output = StartRegistrationUseCase {
        users: store.clone(),
        passkeys: store.clone(),
        cache: store.clone(),
        webauthn: test_webauthn(),
    }
    .execute(user.id)
    .await
    .unwrap();

    let key = format!("reg:{}:{}", user.id, output.registration_id);
    assert!(store.tables().passkey_states.contains_key(&key));
}

#[tokio::test]
async fn should_refuse_passkey_sign_in_for_user_without_passkeys() {
    let store = MemStore::new();
    store.seed_user("Ada", "ada@example.com", Some("ada"));

    let err = expect_err(
        StartAuthenticationUseCase {
            users: store.clone(),
            passkeys: store.clone(),
            cache: store.clone(),
            webauthn: test_webauthn(),
        }
        .execute("ada")
        .await,
    );

    assert!(matches!(err, TrackerError::PasskeyNotFound), "got {err:?}");
    assert!(store.tables().passkey_states.is_empty());
}

#[tokio::test]
async fn should_refuse_passkey_sign_in_for_unknown_user() {
    let store = MemStore::new();

    let err = expect_err(
        StartAuthenticationUseCase {
            users: store.clone(),
            passkeys: store.clone(),
            cache: store.clone(),
            webauthn: test_webauthn(),
        }
        .execute("nobody@example.com")
        .await,
    );

    assert!(matches!(err, TrackerError::UserNotFound), "got {err:?}");
}
