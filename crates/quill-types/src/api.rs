use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::models::{Article, User};

// -- Token claim --

/// Decoded bearer-token payload. Canonical definition lives here so the
/// middleware and the domain services agree on a single shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub id: i64,
    pub exp: usize,
}

/// An uploaded file as handed over by the HTTP layer.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub mimetype: String,
    pub data: Bytes,
}

// -- Users --

/// Create/update payload. Absent fields deserialize to empty strings;
/// validation decides whether that is an error or a "keep previous
/// value" marker.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPayload {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginPayload {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

// -- Articles --

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArticlePayload {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub tag_list: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ListQuery {
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

/// List entry: the row minus `user_id`/`favorite_list`, annotated for
/// the viewing user. `body` is still the filename; content is only
/// hydrated on a single-article fetch.
#[derive(Debug, Serialize)]
pub struct ArticleListItem {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub body: String,
    pub tag_list: Vec<String>,
    pub update_time: String,
    pub favorited: bool,
    #[serde(rename = "favoritesCount")]
    pub favorites_count: usize,
    pub author: Option<User>,
}

/// `articles_count` is the pre-pagination total, not the page size.
#[derive(Debug, Serialize)]
pub struct ArticleList {
    pub articles: Vec<ArticleListItem>,
    #[serde(rename = "articlesCount")]
    pub articles_count: usize,
}

/// Single-article view: the full row with `body` replaced by the file
/// content (null when the file is unreadable), plus viewer annotations
/// and the inlined author row.
#[derive(Debug, Serialize)]
pub struct ArticleDetail {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub body: Option<String>,
    pub tag_list: Vec<String>,
    pub favorite_list: Vec<i64>,
    pub update_time: String,
    pub user_id: Option<i64>,
    pub favorited: bool,
    #[serde(rename = "favoritesCount")]
    pub favorites_count: usize,
    pub author: Option<User>,
}
