//! Token authentication: login, logout, token lookup.

use crate::domain::password::verify_password;
use crate::error::AppError;
use crate::infra::{get_connection, DbPool};
use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The user behind a valid token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
    pub is_superuser: bool,
}

impl AuthUser {
    /// Authors may change their own objects; superusers may change anything.
    pub fn can_modify(&self, owner_id: i64) -> bool {
        self.is_superuser || self.id == owner_id
    }
}

#[derive(Debug, Deserialize)]
pub struct TokenLoginReq {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenDto {
    pub auth_token: String,
}

pub fn token_login(pool: &DbPool, req: TokenLoginReq) -> Result<TokenDto, AppError> {
    let conn = get_connection(pool);
    let user: Option<(i64, String)> = conn
        .query_row(
            "SELECT id, password_hash FROM users WHERE email = ?1",
            [req.email.trim()],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .optional()?;
    let user_id = match user {
        Some((id, hash)) if verify_password(&req.password, &hash) => id,
        _ => return Err(AppError::InvalidCredentials),
    };

    let existing: Option<String> = conn
        .query_row(
            "SELECT key FROM auth_tokens WHERE user_id = ?1",
            [user_id],
            |r| r.get(0),
        )
        .optional()?;
    if let Some(key) = existing {
        return Ok(TokenDto { auth_token: key });
    }

    let key = Uuid::new_v4().simple().to_string();
    conn.execute(
        "INSERT INTO auth_tokens (key, user_id, created_at) VALUES (?1, ?2, ?3)",
        params![&key, user_id, super::now_ts()],
    )?;
    log::info!("issued token for user {}", user_id);
    Ok(TokenDto { auth_token: key })
}

pub fn token_logout(pool: &DbPool, actor: AuthUser) -> Result<(), AppError> {
    let conn = get_connection(pool);
    conn.execute("DELETE FROM auth_tokens WHERE user_id = ?1", [actor.id])?;
    Ok(())
}

pub fn token_resolve(pool: &DbPool, key: &str) -> Result<AuthUser, AppError> {
    let conn = get_connection(pool);
    conn.query_row(
        "SELECT u.id, u.is_superuser FROM auth_tokens t JOIN users u ON u.id = t.user_id WHERE t.key = ?1",
        [key],
        |r| {
            Ok(AuthUser {
                id: r.get(0)?,
                is_superuser: r.get::<_, i32>(1)? != 0,
            })
        },
    )
    .optional()?
    .ok_or(AppError::NotAuthenticated)
}
