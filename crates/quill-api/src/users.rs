use std::sync::Arc;

use axum::extract::{FromRequest, Multipart, Path, Request, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::{Extension, Json};

use quill_db::Database;
use quill_store::{Area, FileStore};
use quill_types::api::{AuthResponse, Claims, LoginPayload, TokenResponse, UploadedFile, UserPayload};
use quill_types::models::User;

use crate::error::{ApiError, DomainError};
use crate::validation::{self, UserField};
use crate::{AppState, password, token};

/// User lifecycle: registration, login, reads, partial update, delete.
/// Stateless beyond the injected database and file-store handles.
pub struct UserService {
    db: Arc<Database>,
    files: Arc<FileStore>,
    jwt_secret: String,
}

impl UserService {
    pub fn new(db: Arc<Database>, files: Arc<FileStore>, jwt_secret: String) -> Self {
        Self {
            db,
            files,
            jwt_secret,
        }
    }

    pub async fn create(
        &self,
        payload: UserPayload,
        avatar: Option<UploadedFile>,
    ) -> Result<AuthResponse, ApiError> {
        validation::validate_user(&payload.username, &payload.password, &payload.email, &[])?;
        let hash = password::hash_password(&payload.password)?;

        // The avatar is stored before the row exists; if the store
        // swallows a failure the row is created with a null avatar.
        let avatar_name = match avatar {
            None => None,
            Some(file) => {
                require_image(&file)?;
                self.files
                    .save_binary(Area::Avatars, &file.name, &file.data)
                    .await
            }
        };

        let UserPayload {
            username, email, ..
        } = payload;
        let user = self
            .db
            .call(move |db| db.insert_user(&username, &hash, &email, avatar_name.as_deref()))
            .await?;
        let token = token::issue(user.id, &self.jwt_secret)?;
        Ok(AuthResponse { user, token })
    }

    pub async fn login(&self, creds: LoginPayload) -> Result<String, ApiError> {
        validation::validate_user("", &creds.password, &creds.email, &[UserField::Username])?;

        let LoginPayload { email, password } = creds;
        let user = self
            .db
            .call(move |db| db.find_user_by_email(&email))
            .await?
            .ok_or_else(|| DomainError::new("no user with this email"))?;

        if !password::verify_password(&password, &user.password)? {
            return Err(DomainError::new("wrong password").into());
        }

        Ok(token::issue(user.id, &self.jwt_secret)?)
    }

    pub async fn get_all(&self) -> Result<Vec<User>, ApiError> {
        Ok(self.db.call(|db| db.all_users()).await?)
    }

    /// Single row, or `None`; an unknown id is not an error.
    pub async fn get_one(&self, id: i64) -> Result<Option<User>, ApiError> {
        if id == 0 {
            return Err(DomainError::new("id is missing").into());
        }
        Ok(self.db.call(move |db| db.find_user(id)).await?)
    }

    /// Same lookup keyed by the caller's own claim; an absent claim is
    /// treated as not-found.
    pub async fn current(&self, claims: Option<&Claims>) -> Result<Option<User>, ApiError> {
        let Some(claims) = claims else {
            return Ok(None);
        };
        let id = claims.id;
        Ok(self.db.call(move |db| db.find_user(id)).await?)
    }

    /// Partial update: empty fields keep their stored value, the
    /// password is re-hashed only when a new one arrives. The whole
    /// payload is still validated as if every field were required,
    /// matching legacy strictness on purpose.
    pub async fn update(
        &self,
        payload: UserPayload,
        claims: &Claims,
        avatar: Option<UploadedFile>,
    ) -> Result<User, ApiError> {
        validation::validate_user(&payload.username, &payload.password, &payload.email, &[])?;

        let id = claims.id;
        let prev = self
            .db
            .call(move |db| db.find_user(id))
            .await?
            .ok_or_else(|| DomainError::new("user not found"))?;

        let hash = if payload.password.is_empty() {
            String::new()
        } else {
            password::hash_password(&payload.password)?
        };

        let username = if payload.username.is_empty() {
            prev.username.clone()
        } else {
            payload.username
        };
        let password = if hash.is_empty() { prev.password.clone() } else { hash };
        let email = if payload.email.is_empty() {
            prev.email.clone()
        } else {
            payload.email
        };

        let updated = match avatar {
            None => {
                self.db
                    .call(move |db| db.update_user(id, &username, &password, &email))
                    .await?
            }
            Some(file) => {
                require_image(&file)?;
                if let Some(old) = prev.avatar {
                    self.files.delete_detached(old, Area::Avatars);
                }
                let avatar_name = self
                    .files
                    .save_binary(Area::Avatars, &file.name, &file.data)
                    .await;
                self.db
                    .call(move |db| {
                        db.update_user_with_avatar(
                            id,
                            &username,
                            &password,
                            &email,
                            avatar_name.as_deref(),
                        )
                    })
                    .await?
            }
        };

        Ok(updated.ok_or_else(|| DomainError::new("user not found"))?)
    }

    /// Row deletion is authoritative; the avatar blob is removed after
    /// the row, awaited before the call returns.
    pub async fn delete(&self, claims: &Claims) -> Result<User, ApiError> {
        let id = claims.id;
        let user = self
            .db
            .call(move |db| db.delete_user(id))
            .await?
            .ok_or_else(|| DomainError::new("user not found"))?;

        if let Some(avatar) = &user.avatar {
            self.files.delete(avatar, Area::Avatars).await;
        }

        Ok(user)
    }
}

fn require_image(file: &UploadedFile) -> Result<(), DomainError> {
    if file.mimetype.split('/').next() != Some("image") {
        return Err(DomainError::new("invalid image type"));
    }
    Ok(())
}

// -- HTTP handlers --

pub async fn create(
    State(state): State<AppState>,
    req: Request,
) -> Result<impl IntoResponse, ApiError> {
    let (payload, avatar) = extract_user_form(req).await?;
    let created = state.users.create(payload, avatar).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(creds): Json<LoginPayload>,
) -> Result<Json<TokenResponse>, ApiError> {
    let token = state.users.login(creds).await?;
    Ok(Json(TokenResponse { token }))
}

pub async fn get_all(State(state): State<AppState>) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(state.users.get_all().await?))
}

pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Option<User>>, ApiError> {
    Ok(Json(state.users.get_one(id).await?))
}

pub async fn current(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Option<User>>, ApiError> {
    Ok(Json(state.users.current(Some(&claims)).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    req: Request,
) -> Result<Json<User>, ApiError> {
    let (payload, avatar) = extract_user_form(req).await?;
    Ok(Json(state.users.update(payload, &claims, avatar).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(state.users.delete(&claims).await?))
}

/// Registration and profile update accept either a JSON body or a
/// multipart form carrying the same fields plus an `avatar` file.
async fn extract_user_form(
    req: Request,
) -> Result<(UserPayload, Option<UploadedFile>), ApiError> {
    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if !content_type.starts_with("multipart/form-data") {
        let Json(payload) = Json::<UserPayload>::from_request(req, &())
            .await
            .map_err(malformed)?;
        return Ok((payload, None));
    }

    let mut multipart = Multipart::from_request(req, &()).await.map_err(malformed)?;
    let mut payload = UserPayload::default();
    let mut avatar = None;

    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "username" => payload.username = field.text().await.map_err(malformed)?,
            "password" => payload.password = field.text().await.map_err(malformed)?,
            "email" => payload.email = field.text().await.map_err(malformed)?,
            "avatar" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let mimetype = field.content_type().unwrap_or_default().to_string();
                let data = field.bytes().await.map_err(malformed)?;
                avatar = Some(UploadedFile {
                    name: file_name,
                    mimetype,
                    data,
                });
            }
            _ => {}
        }
    }

    Ok((payload, avatar))
}

fn malformed(e: impl std::fmt::Display) -> DomainError {
    DomainError::new(format!("malformed request: {}", e))
}
