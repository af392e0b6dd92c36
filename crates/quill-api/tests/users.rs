mod common;

use common::*;

use quill_api::{password, token};
use quill_types::api::{LoginPayload, UploadedFile};

#[tokio::test]
async fn register_without_avatar_yields_null_avatar_and_a_valid_token() {
    let (state, _dir) = state().await;

    let created = state
        .users
        .create(user_payload("validUser", "12345678", "test@test.com"), None)
        .await
        .unwrap();

    assert_eq!(created.user.username, "validUser");
    assert_eq!(created.user.avatar, None);
    // Stored as a salted hash, never the plaintext.
    assert_ne!(created.user.password, "12345678");
    assert!(password::verify_password("12345678", &created.user.password).unwrap());

    let claims = token::verify(&created.token, SECRET).unwrap();
    assert_eq!(claims.id, created.user.id);
}

#[tokio::test]
async fn register_with_non_image_upload_is_rejected_before_insert() {
    let (state, _dir) = state().await;

    let upload = UploadedFile {
        name: "resume.pdf".to_string(),
        mimetype: "application/pdf".to_string(),
        data: bytes::Bytes::from_static(b"%PDF"),
    };
    let err = state
        .users
        .create(user_payload("validUser", "12345678", "test@test.com"), Some(upload))
        .await
        .unwrap_err();
    assert_eq!(domain_message(err), "invalid image type");

    // No row was inserted.
    assert!(state.users.get_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn register_with_avatar_stores_the_file() {
    let (state, dir) = state().await;

    let created = state
        .users
        .create(
            user_payload("validUser", "12345678", "test@test.com"),
            Some(png_upload()),
        )
        .await
        .unwrap();

    let avatar = created.user.avatar.expect("avatar filename persisted");
    assert!(avatar.ends_with(".png"));
    assert!(exists(dir.path(), "avatars", &avatar));
}

#[tokio::test]
async fn login_flows() {
    let (state, _dir) = state().await;
    let created = state
        .users
        .create(user_payload("validUser", "12345678", "test@test.com"), None)
        .await
        .unwrap();

    let unknown = state
        .users
        .login(LoginPayload {
            email: "stranger@test.com".to_string(),
            password: "12345678".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(domain_message(unknown), "no user with this email");

    let wrong = state
        .users
        .login(LoginPayload {
            email: "test@test.com".to_string(),
            password: "87654321".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(domain_message(wrong), "wrong password");

    let token = state
        .users
        .login(LoginPayload {
            email: "test@test.com".to_string(),
            password: "12345678".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(token::verify(&token, SECRET).unwrap().id, created.user.id);
}

#[tokio::test]
async fn login_skips_username_validation_only() {
    let (state, _dir) = state().await;

    let err = state
        .users
        .login(LoginPayload {
            email: String::new(),
            password: "12345678".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(domain_message(err), "email is missing");
}

#[tokio::test]
async fn get_one_rejects_a_zero_id_and_tolerates_unknown_ids() {
    let (state, _dir) = state().await;

    let err = state.users.get_one(0).await.unwrap_err();
    assert_eq!(domain_message(err), "id is missing");

    assert!(state.users.get_one(999).await.unwrap().is_none());
}

#[tokio::test]
async fn current_without_a_claim_is_not_found() {
    let (state, _dir) = state().await;
    assert!(state.users.current(None).await.unwrap().is_none());
}

#[tokio::test]
async fn update_replaces_fields_and_rehashes_the_password() {
    let (state, _dir) = state().await;
    let created = state
        .users
        .create(user_payload("validUser", "12345678", "test@test.com"), None)
        .await
        .unwrap();

    let updated = state
        .users
        .update(
            user_payload("renamedUser", "newpassword", "new@test.com"),
            &claims(created.user.id),
            None,
        )
        .await
        .unwrap();

    assert_eq!(updated.username, "renamedUser");
    assert_eq!(updated.email, "new@test.com");
    assert!(password::verify_password("newpassword", &updated.password).unwrap());
}

#[tokio::test]
async fn update_still_requires_every_field() {
    // Known strictness gap, reproduced deliberately: a partial update
    // payload does not pass validation.
    let (state, _dir) = state().await;
    let created = state
        .users
        .create(user_payload("validUser", "12345678", "test@test.com"), None)
        .await
        .unwrap();

    let err = state
        .users
        .update(
            user_payload("renamedUser", "", "test@test.com"),
            &claims(created.user.id),
            None,
        )
        .await
        .unwrap_err();
    assert_eq!(domain_message(err), "password is missing");
}

#[tokio::test]
async fn update_swaps_the_avatar_file() {
    let (state, dir) = state().await;
    let created = state
        .users
        .create(
            user_payload("validUser", "12345678", "test@test.com"),
            Some(png_upload()),
        )
        .await
        .unwrap();
    let old_avatar = created.user.avatar.clone().unwrap();

    let updated = state
        .users
        .update(
            user_payload("validUser", "12345678", "test@test.com"),
            &claims(created.user.id),
            Some(png_upload()),
        )
        .await
        .unwrap();

    let new_avatar = updated.avatar.expect("new avatar persisted");
    assert_ne!(new_avatar, old_avatar);
    assert!(exists(dir.path(), "avatars", &new_avatar));
    // The stale blob removal is detached; give it a moment.
    assert!(wait_until(|| !exists(dir.path(), "avatars", &old_avatar)).await);
}

#[tokio::test]
async fn delete_removes_the_row_and_the_avatar_file() {
    let (state, dir) = state().await;
    let created = state
        .users
        .create(
            user_payload("validUser", "12345678", "test@test.com"),
            Some(png_upload()),
        )
        .await
        .unwrap();
    let avatar = created.user.avatar.clone().unwrap();
    assert!(exists(dir.path(), "avatars", &avatar));

    let deleted = state.users.delete(&claims(created.user.id)).await.unwrap();
    assert_eq!(deleted.id, created.user.id);

    // Awaited removal: the blob is gone by the time delete returns.
    assert!(!exists(dir.path(), "avatars", &avatar));
    assert!(state.users.get_one(created.user.id).await.unwrap().is_none());
}

#[tokio::test]
async fn delete_of_a_missing_user_is_a_domain_error() {
    let (state, _dir) = state().await;
    let err = state.users.delete(&claims(999)).await.unwrap_err();
    assert_eq!(domain_message(err), "user not found");
}
