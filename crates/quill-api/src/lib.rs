pub mod articles;
pub mod error;
pub mod middleware;
pub mod password;
pub mod token;
pub mod users;
pub mod validation;

use std::sync::Arc;

use quill_db::Database;
use quill_store::FileStore;

use crate::articles::ArticleService;
use crate::users::UserService;

pub type AppState = Arc<AppStateInner>;

/// One instance of each domain service, built once at startup and shared
/// by reference with the HTTP layer. No state beyond the injected
/// database and file-store handles.
pub struct AppStateInner {
    pub users: UserService,
    pub articles: ArticleService,
    pub jwt_secret: String,
}

impl AppStateInner {
    pub fn new(db: Arc<Database>, files: Arc<FileStore>, jwt_secret: String) -> Self {
        Self {
            users: UserService::new(db.clone(), files.clone(), jwt_secret.clone()),
            articles: ArticleService::new(db, files),
            jwt_secret,
        }
    }
}
