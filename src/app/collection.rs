//! Favorites and shopping cart: per-user sets of recipes.

use super::auth::AuthUser;
use super::recipe::{load_short, RecipeShortDto};
use crate::domain::RecipeCollection;
use crate::error::AppError;
use crate::infra::{get_connection, DbPool};
use rusqlite::params;

pub fn collection_add(
    pool: &DbPool,
    kind: RecipeCollection,
    actor: AuthUser,
    recipe_id: i64,
) -> Result<RecipeShortDto, AppError> {
    let conn = get_connection(pool);
    let recipe = load_short(&conn, recipe_id)?;
    let inserted = conn.execute(
        &format!(
            "INSERT OR IGNORE INTO {} (user_id, recipe_id, created_at) VALUES (?1, ?2, ?3)",
            kind.table()
        ),
        params![actor.id, recipe_id, super::now_ts()],
    )?;
    if inserted == 0 {
        return Err(AppError::Conflict(kind.already_present_message().into()));
    }
    log::debug!("user {} added recipe {} to {:?}", actor.id, recipe_id, kind);
    Ok(recipe)
}

pub fn collection_remove(
    pool: &DbPool,
    kind: RecipeCollection,
    actor: AuthUser,
    recipe_id: i64,
) -> Result<(), AppError> {
    let conn = get_connection(pool);
    load_short(&conn, recipe_id)?;
    let rows = conn.execute(
        &format!(
            "DELETE FROM {} WHERE user_id = ?1 AND recipe_id = ?2",
            kind.table()
        ),
        params![actor.id, recipe_id],
    )?;
    if rows == 0 {
        return Err(AppError::Validation(kind.absent_message().into()));
    }
    log::debug!("user {} removed recipe {} from {:?}", actor.id, recipe_id, kind);
    Ok(())
}
