use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};

use quill_db::{Database, FavoriteOutcome};
use quill_store::{Area, FileStore};
use quill_types::api::{ArticleDetail, ArticleList, ArticleListItem, ArticlePayload, Claims, ListQuery};
use quill_types::models::Article;

use crate::error::{ApiError, DomainError};
use crate::middleware::MaybeClaims;
use crate::validation;
use crate::AppState;

/// Article lifecycle. Bodies live in the file store; rows only carry
/// the generated filename.
pub struct ArticleService {
    db: Arc<Database>,
    files: Arc<FileStore>,
}

impl ArticleService {
    pub fn new(db: Arc<Database>, files: Arc<FileStore>) -> Self {
        Self { db, files }
    }

    /// The body write is detached: the row is inserted with the
    /// generated filename while the bytes are still on their way to
    /// disk.
    pub async fn create(
        &self,
        payload: ArticlePayload,
        claims: Option<&Claims>,
    ) -> Result<Article, ApiError> {
        validation::validate_article(&payload.title, &payload.body, &payload.description)?;

        let ArticlePayload {
            title,
            description,
            body,
            tag_list,
        } = payload;

        let file_name = self.files.save_text(Area::Articles, body);
        let update_time = now_basic();
        let user_id = claims.map(|c| c.id);

        let article = self
            .db
            .call(move |db| {
                db.insert_article(&title, &description, &file_name, &tag_list, &update_time, user_id)
            })
            .await?;
        Ok(article)
    }

    /// Pagination slices the natural id-ascending order; the descending
    /// display sort happens afterwards, so a page is not a window of
    /// the final ordering. `articlesCount` is the pre-pagination total.
    pub async fn get_all(
        &self,
        query: ListQuery,
        claims: Option<&Claims>,
    ) -> Result<ArticleList, ApiError> {
        let viewer = claims.map(|c| c.id).unwrap_or(0);

        let rows = self.db.call(|db| db.all_articles()).await?;
        let total = rows.len();

        let mut page: Vec<Article> = rows
            .into_iter()
            .skip(query.offset.unwrap_or(0))
            .collect();
        // A zero limit means "no cap", like an absent one.
        if let Some(limit) = query.limit.filter(|&l| l > 0) {
            page.truncate(limit);
        }

        let pairs = self
            .db
            .call(move |db| {
                page.into_iter()
                    .map(|article| {
                        let author = match article.user_id {
                            Some(uid) => db.find_user(uid)?,
                            None => None,
                        };
                        Ok((article, author))
                    })
                    .collect::<anyhow::Result<Vec<_>>>()
            })
            .await?;

        let mut articles: Vec<ArticleListItem> = pairs
            .into_iter()
            .map(|(article, author)| ArticleListItem {
                id: article.id,
                title: article.title,
                description: article.description,
                body: article.body,
                tag_list: article.tag_list,
                update_time: article.update_time,
                favorited: article.favorite_list.contains(&viewer),
                favorites_count: article.favorite_list.len(),
                author,
            })
            .collect();
        articles.sort_by(|a, b| b.id.cmp(&a.id));

        Ok(ArticleList {
            articles,
            articles_count: total,
        })
    }

    /// Hydrates the body from the file store; an unreadable file shows
    /// up as a null body, not an error.
    pub async fn get_one(&self, id: i64, claims: Option<&Claims>) -> Result<ArticleDetail, ApiError> {
        if id == 0 {
            return Err(DomainError::new("id is missing").into());
        }
        let viewer = claims.map(|c| c.id).unwrap_or(0);

        let (article, author) = self
            .db
            .call(move |db| {
                let Some(article) = db.find_article(id)? else {
                    return Ok(None);
                };
                let author = match article.user_id {
                    Some(uid) => db.find_user(uid)?,
                    None => None,
                };
                Ok(Some((article, author)))
            })
            .await?
            .ok_or_else(|| DomainError::new("article not found"))?;

        let body = self.files.read_text(&article.body, Area::Articles).await;

        Ok(ArticleDetail {
            id: article.id,
            title: article.title,
            description: article.description,
            body,
            tag_list: article.tag_list,
            favorited: article.favorite_list.contains(&viewer),
            favorites_count: article.favorite_list.len(),
            favorite_list: article.favorite_list,
            update_time: article.update_time,
            user_id: article.user_id,
            author,
        })
    }

    pub async fn update(
        &self,
        payload: ArticlePayload,
        id: i64,
        claims: Option<&Claims>,
    ) -> Result<Article, ApiError> {
        validation::validate_article(&payload.title, &payload.body, &payload.description)?;

        let existing = self
            .db
            .call(move |db| db.find_article(id))
            .await?
            .ok_or_else(|| DomainError::new("article not found"))?;
        check_owner(&existing, claims)?;

        let ArticlePayload {
            title,
            description,
            body,
            tag_list,
        } = payload;

        let file_name = self.files.save_text(Area::Articles, body);
        self.files.delete_detached(existing.body, Area::Articles);
        let update_time = now_basic();

        let updated = self
            .db
            .call(move |db| {
                db.update_article(id, &title, &description, &file_name, &tag_list, &update_time)
            })
            .await?
            .ok_or_else(|| DomainError::new("article not found"))?;
        Ok(updated)
    }

    pub async fn favorite(&self, id: i64, claims: Option<&Claims>) -> Result<Article, ApiError> {
        let user_id = claims.map(|c| c.id).unwrap_or(0);
        match self.db.call(move |db| db.add_favorite(id, user_id)).await? {
            FavoriteOutcome::Applied(article) => Ok(article),
            FavoriteOutcome::Unchanged => {
                Err(DomainError::new("article is already favorited").into())
            }
            FavoriteOutcome::NotFound => Err(DomainError::new("article not found").into()),
        }
    }

    pub async fn unfavorite(&self, id: i64, claims: Option<&Claims>) -> Result<Article, ApiError> {
        let user_id = claims.map(|c| c.id).unwrap_or(0);
        match self.db.call(move |db| db.remove_favorite(id, user_id)).await? {
            FavoriteOutcome::Applied(article) => Ok(article),
            FavoriteOutcome::Unchanged => Err(DomainError::new("article is not favorited").into()),
            FavoriteOutcome::NotFound => Err(DomainError::new("article not found").into()),
        }
    }

    pub async fn delete(&self, id: i64, claims: Option<&Claims>) -> Result<Article, ApiError> {
        if id == 0 {
            return Err(DomainError::new("id is missing").into());
        }
        let existing = self
            .db
            .call(move |db| db.find_article(id))
            .await?
            .ok_or_else(|| DomainError::new("article not found"))?;
        check_owner(&existing, claims)?;

        let deleted = self
            .db
            .call(move |db| db.delete_article(id))
            .await?
            .ok_or_else(|| DomainError::new("article not found"))?;
        self.files.delete_detached(deleted.body.clone(), Area::Articles);
        Ok(deleted)
    }
}

/// Only the owning user may touch an article. An absent claim or an
/// anonymously-created row never passes.
fn check_owner(article: &Article, claims: Option<&Claims>) -> Result<(), DomainError> {
    match (article.user_id, claims) {
        (Some(owner), Some(claims)) if owner == claims.id => Ok(()),
        _ => Err(DomainError::new("no access to other users' posts")),
    }
}

/// ISO-basic timestamp, e.g. `20260806T101530Z`.
fn now_basic() -> String {
    chrono::Utc::now().format("%Y%m%dT%H%M%SZ").to_string()
}

// -- HTTP handlers --

pub async fn create(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<ArticlePayload>,
) -> Result<Json<Article>, ApiError> {
    Ok(Json(state.articles.create(payload, Some(&claims)).await?))
}

pub async fn get_all(
    State(state): State<AppState>,
    MaybeClaims(claims): MaybeClaims,
    Query(query): Query<ListQuery>,
) -> Result<Json<ArticleList>, ApiError> {
    Ok(Json(state.articles.get_all(query, claims.as_ref()).await?))
}

pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    MaybeClaims(claims): MaybeClaims,
) -> Result<Json<ArticleDetail>, ApiError> {
    Ok(Json(state.articles.get_one(id, claims.as_ref()).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<ArticlePayload>,
) -> Result<Json<Article>, ApiError> {
    Ok(Json(state.articles.update(payload, id, Some(&claims)).await?))
}

pub async fn favorite(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Article>, ApiError> {
    Ok(Json(state.articles.favorite(id, Some(&claims)).await?))
}

pub async fn unfavorite(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Article>, ApiError> {
    Ok(Json(state.articles.unfavorite(id, Some(&claims)).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Article>, ApiError> {
    Ok(Json(state.articles.delete(id, Some(&claims)).await?))
}
