//! Follow relationships between users and authors.

use super::auth::AuthUser;
use super::page::{Page, PageReq};
use super::recipe::{short_by_author, RecipeShortDto};
use super::user::{load_user, UserDto};
use crate::error::AppError;
use crate::infra::{get_connection, DbPool};
use rusqlite::types::Value;
use rusqlite::{params, Connection};
use serde::Serialize;

/// An author as seen from the subscriptions page.
#[derive(Debug, Serialize)]
pub struct SubscriptionDto {
    #[serde(flatten)]
    pub author: UserDto,
    pub recipes: Vec<RecipeShortDto>,
    pub recipes_count: i64,
}

fn load_subscription(
    conn: &Connection,
    author_id: i64,
    viewer: i64,
    recipes_limit: Option<i64>,
) -> Result<SubscriptionDto, AppError> {
    let author = load_user(conn, author_id, Some(viewer))?;
    let recipes = short_by_author(conn, author_id, recipes_limit.filter(|n| *n >= 0))?;
    let recipes_count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM recipes WHERE author_id = ?1",
        [author_id],
        |r| r.get(0),
    )?;
    Ok(SubscriptionDto {
        author,
        recipes,
        recipes_count,
    })
}

pub fn subscribe(
    pool: &DbPool,
    actor: AuthUser,
    author_id: i64,
    recipes_limit: Option<i64>,
) -> Result<SubscriptionDto, AppError> {
    let conn = get_connection(pool);
    // 404 before any other check
    load_user(&conn, author_id, None)?;
    if author_id == actor.id {
        return Err(AppError::Validation("you cannot subscribe to yourself".into()));
    }
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO follows (subscriber_id, author_id, created_at) VALUES (?1, ?2, ?3)",
        params![actor.id, author_id, super::now_ts()],
    )?;
    if inserted == 0 {
        return Err(AppError::Conflict(
            "you are already subscribed to this author".into(),
        ));
    }
    log::info!("user {} subscribed to {}", actor.id, author_id);
    load_subscription(&conn, author_id, actor.id, recipes_limit)
}

pub fn unsubscribe(pool: &DbPool, actor: AuthUser, author_id: i64) -> Result<(), AppError> {
    let conn = get_connection(pool);
    load_user(&conn, author_id, None)?;
    let rows = conn.execute(
        "DELETE FROM follows WHERE subscriber_id = ?1 AND author_id = ?2",
        params![actor.id, author_id],
    )?;
    if rows == 0 {
        return Err(AppError::Validation(
            "you are not subscribed to this author".into(),
        ));
    }
    log::info!("user {} unsubscribed from {}", actor.id, author_id);
    Ok(())
}

pub fn subscriptions(
    pool: &DbPool,
    actor: AuthUser,
    page: PageReq,
    recipes_limit: Option<i64>,
) -> Result<Page<SubscriptionDto>, AppError> {
    let conn = get_connection(pool);
    let total: i64 = conn.query_row(
        "SELECT COUNT(*) FROM follows WHERE subscriber_id = ?1",
        [actor.id],
        |r| r.get(0),
    )?;
    page.ensure_in_range(total)?;

    let ids = super::query_ids(
        &conn,
        "SELECT author_id FROM follows WHERE subscriber_id = ?1 ORDER BY author_id LIMIT ?2 OFFSET ?3",
        &[
            Value::Integer(actor.id),
            Value::Integer(i64::from(page.limit)),
            Value::Integer(page.offset()),
        ],
    )?;
    let items = ids
        .into_iter()
        .map(|author_id| load_subscription(&conn, author_id, actor.id, recipes_limit))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Page {
        items,
        total,
        page: page.page,
        limit: page.limit,
    })
}
