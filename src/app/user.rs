//! User use cases: registration, profile, password, avatar.

use super::auth::AuthUser;
use super::page::{Page, PageReq};
use crate::domain::decode_image;
use crate::domain::limits::{EMAIL_MAX_LEN, MAX_AVATAR_BYTES, USER_FIELD_MAX_LEN};
use crate::domain::password::{hash_password, validate_password, verify_password};
use crate::domain::ImageFormat;
use crate::error::AppError;
use crate::infra::media::AVATARS_DIR;
use crate::infra::{get_connection, DbPool, MediaStore};
use regex::Regex;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Public user columns. `?1` must be bound to the viewer id (or NULL).
pub(crate) const USER_COLUMNS: &str = "u.id, u.email, u.username, u.first_name, u.last_name, u.avatar, \
     EXISTS(SELECT 1 FROM follows f WHERE f.subscriber_id = ?1 AND f.author_id = u.id)";

#[derive(Debug, Deserialize)]
pub struct UserRegisterReq {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserCreatedDto {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserDto {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar: Option<String>,
    pub is_subscribed: bool,
}

#[derive(Debug, Deserialize)]
pub struct SetPasswordReq {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct AvatarReq {
    pub avatar: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AvatarDto {
    pub avatar: Option<String>,
}

fn username_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[\w.@+-]+$").expect("username regex"))
}

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex"))
}

pub(crate) fn user_from_row(r: &Row<'_>) -> rusqlite::Result<UserDto> {
    Ok(UserDto {
        id: r.get(0)?,
        email: r.get(1)?,
        username: r.get(2)?,
        first_name: r.get(3)?,
        last_name: r.get(4)?,
        avatar: r.get(5)?,
        is_subscribed: r.get(6)?,
    })
}

pub(crate) fn load_user(
    conn: &Connection,
    id: i64,
    viewer: Option<i64>,
) -> Result<UserDto, AppError> {
    conn.query_row(
        &format!("SELECT {} FROM users u WHERE u.id = ?2", USER_COLUMNS),
        params![viewer, id],
        user_from_row,
    )
    .optional()?
    .ok_or_else(|| AppError::NotFound(format!("user {}", id)))
}

fn validated_registration(req: &UserRegisterReq) -> Result<UserRegisterReq, AppError> {
    let email = req.email.trim().to_string();
    if email.is_empty() {
        return Err(AppError::Validation("email is required".into()));
    }
    if email.len() > EMAIL_MAX_LEN || !email_re().is_match(&email) {
        return Err(AppError::Validation("email is not a valid address".into()));
    }
    let username = req.username.trim().to_string();
    if username.is_empty() {
        return Err(AppError::Validation("username is required".into()));
    }
    if username.chars().count() > USER_FIELD_MAX_LEN || !username_re().is_match(&username) {
        return Err(AppError::Validation(
            "username may contain only letters, digits and @/./+/-/_".into(),
        ));
    }
    let first_name = crate::domain::limits::check_required(
        "first_name",
        &req.first_name,
        USER_FIELD_MAX_LEN,
    )?;
    let last_name =
        crate::domain::limits::check_required("last_name", &req.last_name, USER_FIELD_MAX_LEN)?;
    validate_password(&req.password, &username, &email)?;
    Ok(UserRegisterReq {
        email,
        username,
        first_name,
        last_name,
        password: req.password.clone(),
    })
}

fn insert_user(
    pool: &DbPool,
    req: UserRegisterReq,
    is_superuser: bool,
) -> Result<UserCreatedDto, AppError> {
    let req = validated_registration(&req)?;
    let conn = get_connection(pool);

    let email_taken: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1)",
        [&req.email],
        |r| r.get(0),
    )?;
    if email_taken {
        return Err(AppError::Validation(
            "a user with that email already exists".into(),
        ));
    }
    let username_taken: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1)",
        [&req.username],
        |r| r.get(0),
    )?;
    if username_taken {
        return Err(AppError::Validation(
            "a user with that username already exists".into(),
        ));
    }

    conn.execute(
        "INSERT INTO users (email, username, first_name, last_name, password_hash, avatar, is_superuser, created_at) VALUES (?1, ?2, ?3, ?4, ?5, NULL, ?6, ?7)",
        params![
            &req.email,
            &req.username,
            &req.first_name,
            &req.last_name,
            hash_password(&req.password),
            is_superuser as i32,
            super::now_ts(),
        ],
    )?;
    let id = conn.last_insert_rowid();
    log::info!("registered user {} ({})", id, req.username);

    Ok(UserCreatedDto {
        id,
        email: req.email,
        username: req.username,
        first_name: req.first_name,
        last_name: req.last_name,
    })
}

pub fn user_register(pool: &DbPool, req: UserRegisterReq) -> Result<UserCreatedDto, AppError> {
    insert_user(pool, req, false)
}

/// Operator-only path (CLI): same validation, superuser flag set.
pub fn user_create_superuser(
    pool: &DbPool,
    req: UserRegisterReq,
) -> Result<UserCreatedDto, AppError> {
    insert_user(pool, req, true)
}

pub fn user_get(pool: &DbPool, id: i64, viewer: Option<i64>) -> Result<UserDto, AppError> {
    let conn = get_connection(pool);
    load_user(&conn, id, viewer)
}

pub fn user_me(pool: &DbPool, actor: AuthUser) -> Result<UserDto, AppError> {
    user_get(pool, actor.id, Some(actor.id))
}

pub fn user_list(
    pool: &DbPool,
    page: PageReq,
    search: Option<&str>,
    viewer: Option<i64>,
) -> Result<Page<UserDto>, AppError> {
    let conn = get_connection(pool);

    let mut condition = String::new();
    let mut bind_values: Vec<Value> = Vec::new();
    if let Some(term) = search.map(str::trim).filter(|s| !s.is_empty()) {
        condition = "WHERE u.username LIKE ?1 ESCAPE '\\' OR u.email LIKE ?1 ESCAPE '\\' \
                     OR u.first_name LIKE ?1 ESCAPE '\\' OR u.last_name LIKE ?1 ESCAPE '\\'"
            .to_string();
        bind_values.push(Value::Text(format!("%{}%", super::escape_like(term))));
    }

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM users u {}", condition),
        params_from_iter(bind_values.iter()),
        |r| r.get(0),
    )?;
    page.ensure_in_range(total)?;

    let sql = format!(
        "SELECT u.id FROM users u {} ORDER BY u.id LIMIT ?{} OFFSET ?{}",
        condition,
        bind_values.len() + 1,
        bind_values.len() + 2
    );
    bind_values.push(Value::Integer(i64::from(page.limit)));
    bind_values.push(Value::Integer(page.offset()));
    let ids = super::query_ids(&conn, &sql, &bind_values)?;

    let items = ids
        .into_iter()
        .map(|id| load_user(&conn, id, viewer))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Page {
        items,
        total,
        page: page.page,
        limit: page.limit,
    })
}

pub fn user_set_password(
    pool: &DbPool,
    actor: AuthUser,
    req: SetPasswordReq,
) -> Result<(), AppError> {
    let conn = get_connection(pool);
    let (hash, username, email): (String, String, String) = conn.query_row(
        "SELECT password_hash, username, email FROM users WHERE id = ?1",
        [actor.id],
        |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
    )?;
    if !verify_password(req.current_password.trim(), &hash) {
        return Err(AppError::Validation("current_password is incorrect".into()));
    }
    let new_password = req.new_password.trim();
    validate_password(new_password, &username, &email)?;
    conn.execute(
        "UPDATE users SET password_hash = ?1 WHERE id = ?2",
        params![hash_password(new_password), actor.id],
    )?;
    log::info!("user {} changed password", actor.id);
    Ok(())
}

pub fn user_set_avatar(
    pool: &DbPool,
    media: &MediaStore,
    actor: AuthUser,
    req: AvatarReq,
) -> Result<AvatarDto, AppError> {
    let data = req
        .avatar
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| AppError::Validation("avatar is required".into()))?;
    let image = decode_image("avatar", &data)?;
    if !matches!(image.format, ImageFormat::Jpeg | ImageFormat::Png) {
        return Err(AppError::Validation("avatar must be a JPG or PNG image".into()));
    }
    if image.bytes.len() > MAX_AVATAR_BYTES {
        return Err(AppError::Validation("avatar is too large (max 5 MB)".into()));
    }

    let url = media.save(AVATARS_DIR, &image)?;
    let stored = {
        let conn = get_connection(pool);
        let stored = conn
            .query_row("SELECT avatar FROM users WHERE id = ?1", [actor.id], |r| {
                r.get::<_, Option<String>>(0)
            })
            .and_then(|previous| {
                conn.execute(
                    "UPDATE users SET avatar = ?1 WHERE id = ?2",
                    params![&url, actor.id],
                )?;
                Ok(previous)
            });
        stored
    };
    let previous = match stored {
        Ok(previous) => previous,
        Err(e) => {
            media.remove(&url);
            return Err(e.into());
        }
    };
    if let Some(old) = previous {
        media.remove(&old);
    }
    Ok(AvatarDto { avatar: Some(url) })
}

pub fn user_delete_avatar(
    pool: &DbPool,
    media: &MediaStore,
    actor: AuthUser,
) -> Result<(), AppError> {
    let previous = {
        let conn = get_connection(pool);
        let previous: Option<String> =
            conn.query_row("SELECT avatar FROM users WHERE id = ?1", [actor.id], |r| {
                r.get(0)
            })?;
        conn.execute("UPDATE users SET avatar = NULL WHERE id = ?1", [actor.id])?;
        previous
    };
    if let Some(old) = previous {
        media.remove(&old);
    }
    Ok(())
}
