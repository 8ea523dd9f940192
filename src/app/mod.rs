//! Application use cases and transactions.

mod auth;
mod collection;
mod data_transfer;
mod ingredient;
mod page;
mod recipe;
mod shopping_list;
mod subscription;
mod tag;
mod user;

use crate::error::AppError;
use chrono::{SecondsFormat, Utc};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};

pub use auth::{token_login, token_logout, token_resolve, AuthUser, TokenDto, TokenLoginReq};
pub use collection::{collection_add, collection_remove};
pub use data_transfer::{
    import_ingredients, import_tags, IngredientImportResult, TagImportResult,
};
pub use ingredient::{
    ingredient_create, ingredient_get, ingredient_list, IngredientCreateReq, IngredientDto,
};
pub use page::{Page, PageReq};
pub use recipe::{
    recipe_create, recipe_delete, recipe_get, recipe_list, recipe_short_link, recipe_update,
    RecipeCreateReq, RecipeDto, RecipeIngredientDto, RecipeIngredientReq, RecipeListReq,
    RecipeShortDto, RecipeUpdateReq, ShortLinkDto,
};
pub use shopping_list::{shopping_list_lines, shopping_list_text};
pub use subscription::{subscribe, subscriptions, unsubscribe, SubscriptionDto};
pub use tag::{tag_create, tag_get, tag_list, TagCreateReq, TagDto};
pub use user::{
    user_create_superuser, user_delete_avatar, user_get, user_list, user_me, user_register,
    user_set_avatar, user_set_password, AvatarDto, AvatarReq, SetPasswordReq, UserCreatedDto,
    UserDto, UserRegisterReq,
};

/// Fixed-width UTC timestamp, so text ordering matches time ordering.
pub(crate) fn now_ts() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Escape `%`, `_` and `\` for a LIKE pattern using `ESCAPE '\'`.
pub(crate) fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

pub(crate) fn query_ids(
    conn: &Connection,
    sql: &str,
    bind_values: &[Value],
) -> Result<Vec<i64>, AppError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params_from_iter(bind_values.iter()), |r| r.get(0))?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}
