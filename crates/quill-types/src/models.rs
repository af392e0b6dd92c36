//! Persisted entities as stored in the database. Distinct from the
//! request/response shapes in `api` to keep the wire format decoupled
//! from storage.

use serde::{Deserialize, Serialize};

/// A user row. Services return the row whole, stored password hash
/// included; the boundary decides what to redact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password: String,
    pub email: String,
    pub avatar: Option<String>,
}

/// An article row. `body` holds the generated filename of the Markdown
/// file under the "articles" area, never the content itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub body: String,
    pub tag_list: Vec<String>,
    pub favorite_list: Vec<i64>,
    pub update_time: String,
    pub user_id: Option<i64>,
}
