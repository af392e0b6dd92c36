#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use quill_api::error::ApiError;
use quill_api::{AppState, AppStateInner};
use quill_db::Database;
use quill_store::FileStore;
use quill_types::api::{ArticlePayload, Claims, UploadedFile, UserPayload};

pub const SECRET: &str = "test-secret";

/// Fresh services over an in-memory database and a throwaway store
/// directory.
pub async fn state() -> (AppState, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let db = Arc::new(Database::open_in_memory().unwrap());
    let files = Arc::new(FileStore::new(dir.path()).await.unwrap());
    let state = Arc::new(AppStateInner::new(db, files, SECRET.to_string()));
    (state, dir)
}

pub fn claims(id: i64) -> Claims {
    Claims { id, exp: 0 }
}

pub fn user_payload(username: &str, password: &str, email: &str) -> UserPayload {
    UserPayload {
        username: username.to_string(),
        password: password.to_string(),
        email: email.to_string(),
    }
}

pub fn article_payload(title: &str, body: &str, description: &str) -> ArticlePayload {
    ArticlePayload {
        title: title.to_string(),
        description: description.to_string(),
        body: body.to_string(),
        tag_list: vec![],
    }
}

/// A 1x1 PNG, close enough for upload purposes.
pub fn png_upload() -> UploadedFile {
    UploadedFile {
        name: "mock.png".to_string(),
        mimetype: "image/png".to_string(),
        data: bytes::Bytes::from_static(b"\x89PNG\r\n\x1a\n"),
    }
}

pub fn domain_message(err: ApiError) -> String {
    match err {
        ApiError::Domain(e) => e.message,
        other => panic!("expected a domain error, got {other:?}"),
    }
}

/// Poll for a detached file operation to land.
pub async fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

pub fn exists(dir: &Path, area: &str, name: &str) -> bool {
    dir.join(area).join(name).exists()
}
