use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};

use quill_types::models::{Article, User};

use crate::Database;

/// Outcome of a conditional favorite-list mutation. The membership check
/// and the write happen under one connection lock, so two concurrent
/// calls for the same user cannot both pass the check.
#[derive(Debug)]
pub enum FavoriteOutcome {
    Applied(Article),
    Unchanged,
    NotFound,
}

impl Database {
    // -- Users --

    pub fn insert_user(
        &self,
        username: &str,
        password_hash: &str,
        email: &str,
        avatar: Option<&str>,
    ) -> Result<User> {
        self.with_conn(|conn| {
            let user = conn.query_row(
                "INSERT INTO users (username, password, email, avatar)
                 VALUES (?1, ?2, ?3, ?4)
                 RETURNING id, username, password, email, avatar",
                params![username, password_hash, email, avatar],
                map_user,
            )?;
            Ok(user)
        })
    }

    pub fn find_user(&self, id: i64) -> Result<Option<User>> {
        self.with_conn(|conn| query_user_by_id(conn, id))
    }

    pub fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.with_conn(|conn| {
            let user = conn
                .query_row(
                    "SELECT id, username, password, email, avatar FROM users WHERE email = ?1",
                    [email],
                    map_user,
                )
                .optional()?;
            Ok(user)
        })
    }

    pub fn all_users(&self) -> Result<Vec<User>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, username, password, email, avatar FROM users")?;
            let users = stmt
                .query_map([], map_user)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(users)
        })
    }

    pub fn update_user(
        &self,
        id: i64,
        username: &str,
        password_hash: &str,
        email: &str,
    ) -> Result<Option<User>> {
        self.with_conn(|conn| {
            let user = conn
                .query_row(
                    "UPDATE users SET username = ?1, password = ?2, email = ?3
                     WHERE id = ?4
                     RETURNING id, username, password, email, avatar",
                    params![username, password_hash, email, id],
                    map_user,
                )
                .optional()?;
            Ok(user)
        })
    }

    pub fn update_user_with_avatar(
        &self,
        id: i64,
        username: &str,
        password_hash: &str,
        email: &str,
        avatar: Option<&str>,
    ) -> Result<Option<User>> {
        self.with_conn(|conn| {
            let user = conn
                .query_row(
                    "UPDATE users SET username = ?1, password = ?2, email = ?3, avatar = ?4
                     WHERE id = ?5
                     RETURNING id, username, password, email, avatar",
                    params![username, password_hash, email, avatar, id],
                    map_user,
                )
                .optional()?;
            Ok(user)
        })
    }

    pub fn delete_user(&self, id: i64) -> Result<Option<User>> {
        self.with_conn(|conn| {
            let user = conn
                .query_row(
                    "DELETE FROM users WHERE id = ?1
                     RETURNING id, username, password, email, avatar",
                    [id],
                    map_user,
                )
                .optional()?;
            Ok(user)
        })
    }

    // -- Articles --

    pub fn insert_article(
        &self,
        title: &str,
        description: &str,
        body_file: &str,
        tag_list: &[String],
        update_time: &str,
        user_id: Option<i64>,
    ) -> Result<Article> {
        self.with_conn(|conn| {
            let tags = serde_json::to_string(tag_list)?;
            let article = conn.query_row(
                "INSERT INTO articles (title, description, body, tag_list, favorite_list, update_time, user_id)
                 VALUES (?1, ?2, ?3, ?4, '[]', ?5, ?6)
                 RETURNING id, title, description, body, tag_list, favorite_list, update_time, user_id",
                params![title, description, body_file, tags, update_time, user_id],
                map_article,
            )?;
            Ok(article)
        })
    }

    /// All rows in natural id-ascending order; the display sort belongs
    /// to the caller.
    pub fn all_articles(&self) -> Result<Vec<Article>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, title, description, body, tag_list, favorite_list, update_time, user_id
                 FROM articles ORDER BY id ASC",
            )?;
            let articles = stmt
                .query_map([], map_article)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(articles)
        })
    }

    pub fn find_article(&self, id: i64) -> Result<Option<Article>> {
        self.with_conn(|conn| query_article_by_id(conn, id))
    }

    pub fn update_article(
        &self,
        id: i64,
        title: &str,
        description: &str,
        body_file: &str,
        tag_list: &[String],
        update_time: &str,
    ) -> Result<Option<Article>> {
        self.with_conn(|conn| {
            let tags = serde_json::to_string(tag_list)?;
            let article = conn
                .query_row(
                    "UPDATE articles
                     SET title = ?1, description = ?2, body = ?3, tag_list = ?4, update_time = ?5
                     WHERE id = ?6
                     RETURNING id, title, description, body, tag_list, favorite_list, update_time, user_id",
                    params![title, description, body_file, tags, update_time, id],
                    map_article,
                )
                .optional()?;
            Ok(article)
        })
    }

    pub fn delete_article(&self, id: i64) -> Result<Option<Article>> {
        self.with_conn(|conn| {
            let article = conn
                .query_row(
                    "DELETE FROM articles WHERE id = ?1
                     RETURNING id, title, description, body, tag_list, favorite_list, update_time, user_id",
                    [id],
                    map_article,
                )
                .optional()?;
            Ok(article)
        })
    }

    pub fn add_favorite(&self, id: i64, user_id: i64) -> Result<FavoriteOutcome> {
        self.with_conn(|conn| {
            let Some(article) = query_article_by_id(conn, id)? else {
                return Ok(FavoriteOutcome::NotFound);
            };
            if article.favorite_list.contains(&user_id) {
                return Ok(FavoriteOutcome::Unchanged);
            }
            let mut list = article.favorite_list;
            list.push(user_id);
            Ok(FavoriteOutcome::Applied(write_favorite_list(conn, id, &list)?))
        })
    }

    pub fn remove_favorite(&self, id: i64, user_id: i64) -> Result<FavoriteOutcome> {
        self.with_conn(|conn| {
            let Some(article) = query_article_by_id(conn, id)? else {
                return Ok(FavoriteOutcome::NotFound);
            };
            if !article.favorite_list.contains(&user_id) {
                return Ok(FavoriteOutcome::Unchanged);
            }
            let list: Vec<i64> = article
                .favorite_list
                .into_iter()
                .filter(|&uid| uid != user_id)
                .collect();
            Ok(FavoriteOutcome::Applied(write_favorite_list(conn, id, &list)?))
        })
    }
}

fn query_user_by_id(conn: &Connection, id: i64) -> Result<Option<User>> {
    let user = conn
        .query_row(
            "SELECT id, username, password, email, avatar FROM users WHERE id = ?1",
            [id],
            map_user,
        )
        .optional()?;
    Ok(user)
}

fn query_article_by_id(conn: &Connection, id: i64) -> Result<Option<Article>> {
    let article = conn
        .query_row(
            "SELECT id, title, description, body, tag_list, favorite_list, update_time, user_id
             FROM articles WHERE id = ?1",
            [id],
            map_article,
        )
        .optional()?;
    Ok(article)
}

fn write_favorite_list(conn: &Connection, id: i64, list: &[i64]) -> Result<Article> {
    let encoded = serde_json::to_string(list)?;
    let article = conn.query_row(
        "UPDATE articles SET favorite_list = ?1 WHERE id = ?2
         RETURNING id, title, description, body, tag_list, favorite_list, update_time, user_id",
        params![encoded, id],
        map_article,
    )?;
    Ok(article)
}

fn map_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        password: row.get(2)?,
        email: row.get(3)?,
        avatar: row.get(4)?,
    })
}

fn map_article(row: &Row<'_>) -> rusqlite::Result<Article> {
    Ok(Article {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        body: row.get(3)?,
        tag_list: decode_list(4, row.get(4)?)?,
        favorite_list: decode_list(5, row.get(5)?)?,
        update_time: row.get(6)?,
        user_id: row.get(7)?,
    })
}

/// Array columns are stored as JSON text; corrupt content surfaces as a
/// conversion failure rather than a silently empty list.
fn decode_list<T: serde::de::DeserializeOwned>(idx: usize, raw: String) -> rusqlite::Result<Vec<T>> {
    serde_json::from_str(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn user_roundtrip() {
        let db = db();
        let user = db.insert_user("ferris", "hash", "ferris@crab.io", None).unwrap();
        assert_eq!(user.id, 1);
        assert_eq!(user.avatar, None);

        let found = db.find_user_by_email("ferris@crab.io").unwrap().unwrap();
        assert_eq!(found.username, "ferris");

        let updated = db
            .update_user(user.id, "crab", "hash2", "crab@crab.io")
            .unwrap()
            .unwrap();
        assert_eq!(updated.username, "crab");
        assert_eq!(updated.avatar, None);

        let deleted = db.delete_user(user.id).unwrap().unwrap();
        assert_eq!(deleted.username, "crab");
        assert!(db.find_user(user.id).unwrap().is_none());
    }

    #[test]
    fn missing_rows_come_back_as_none() {
        let db = db();
        assert!(db.find_user(42).unwrap().is_none());
        assert!(db.delete_user(42).unwrap().is_none());
        assert!(db.update_user(42, "a", "b", "c").unwrap().is_none());
        assert!(db.find_article(42).unwrap().is_none());
    }

    #[test]
    fn article_lists_survive_the_json_column() {
        let db = db();
        let tags = vec!["rust".to_string(), "sqlite".to_string()];
        let article = db
            .insert_article("title", "desc", "file.md", &tags, "20260101T000000Z", None)
            .unwrap();
        assert_eq!(article.tag_list, tags);
        assert!(article.favorite_list.is_empty());
        assert_eq!(article.user_id, None);
    }

    #[test]
    fn favorites_are_conditional() {
        let db = db();
        let article = db
            .insert_article("title", "desc", "file.md", &[], "20260101T000000Z", None)
            .unwrap();

        let applied = db.add_favorite(article.id, 7).unwrap();
        assert!(matches!(applied, FavoriteOutcome::Applied(ref a) if a.favorite_list == vec![7]));

        assert!(matches!(db.add_favorite(article.id, 7).unwrap(), FavoriteOutcome::Unchanged));
        assert!(matches!(db.add_favorite(999, 7).unwrap(), FavoriteOutcome::NotFound));

        let removed = db.remove_favorite(article.id, 7).unwrap();
        assert!(matches!(removed, FavoriteOutcome::Applied(ref a) if a.favorite_list.is_empty()));
        assert!(matches!(db.remove_favorite(article.id, 7).unwrap(), FavoriteOutcome::Unchanged));
    }
}
