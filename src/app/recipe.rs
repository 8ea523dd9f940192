//! Recipe use cases: create, get, list, update, delete, short link.

use super::auth::AuthUser;
use super::page::{Page, PageReq};
use super::tag::TagDto;
use super::user::{load_user, UserDto};
use crate::domain::limits::{check_amount, check_cooking_time, check_required, NAME_MAX_LEN};
use crate::domain::decode_image;
use crate::error::AppError;
use crate::infra::media::RECIPE_IMAGES_DIR;
use crate::infra::{get_connection, DbPool, MediaStore};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Transaction};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Deserialize)]
pub struct RecipeIngredientReq {
    pub id: i64,
    pub amount: i64,
}

#[derive(Debug, Deserialize)]
pub struct RecipeCreateReq {
    pub name: String,
    pub text: String,
    pub cooking_time: i64,
    pub image: String,
    pub ingredients: Vec<RecipeIngredientReq>,
    pub tags: Vec<i64>,
}

/// Partial update. `ingredients` and `tags` are nonetheless mandatory: they
/// are replaced wholesale on every update.
#[derive(Debug, Default, Deserialize)]
pub struct RecipeUpdateReq {
    pub name: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i64>,
    /// Omitted keeps the current image; an explicit `null` is rejected.
    #[serde(default, deserialize_with = "present")]
    pub image: Option<Option<String>>,
    pub ingredients: Option<Vec<RecipeIngredientReq>>,
    pub tags: Option<Vec<i64>>,
}

/// Marks a field as present even when its value is `null`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Serialize)]
pub struct RecipeIngredientDto {
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i64,
}

#[derive(Debug, Serialize)]
pub struct RecipeDto {
    pub id: i64,
    pub name: String,
    pub author: UserDto,
    pub ingredients: Vec<RecipeIngredientDto>,
    pub tags: Vec<TagDto>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub text: String,
    pub image: String,
    pub cooking_time: i64,
}

/// Compact card used in favorites, cart and subscription views.
#[derive(Debug, Clone, Serialize)]
pub struct RecipeShortDto {
    pub id: i64,
    pub name: String,
    pub image: String,
    pub cooking_time: i64,
}

#[derive(Debug, Default, Clone)]
pub struct RecipeListReq {
    pub author: Option<i64>,
    /// Tag slugs; a recipe matches if it carries any of them.
    pub tags: Vec<String>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

#[derive(Debug, Serialize)]
pub struct ShortLinkDto {
    #[serde(rename = "short-link")]
    pub short_link: String,
}

/// Type alias to reduce complexity of the raw recipe query tuple.
type RecipeRawRow = (
    i64,    // id
    i64,    // author_id
    String, // name
    String, // text
    String, // image
    i64,    // cooking_time
);

fn validate_ingredients(
    conn: &Connection,
    items: &[RecipeIngredientReq],
) -> Result<(), AppError> {
    if items.is_empty() {
        return Err(AppError::Validation("at least one ingredient is required".into()));
    }
    let mut seen = HashSet::new();
    for item in items {
        if !seen.insert(item.id) {
            return Err(AppError::Validation("ingredients must be unique".into()));
        }
        check_amount(item.amount)?;
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM ingredients WHERE id = ?1)",
            [item.id],
            |r| r.get(0),
        )?;
        if !exists {
            return Err(AppError::Validation(format!(
                "ingredient {} does not exist",
                item.id
            )));
        }
    }
    Ok(())
}

fn validate_tags(conn: &Connection, tags: &[i64]) -> Result<(), AppError> {
    if tags.is_empty() {
        return Err(AppError::Validation("at least one tag is required".into()));
    }
    let mut seen = HashSet::new();
    for tag in tags {
        if !seen.insert(*tag) {
            return Err(AppError::Validation("tags must be unique".into()));
        }
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM tags WHERE id = ?1)",
            [tag],
            |r| r.get(0),
        )?;
        if !exists {
            return Err(AppError::Validation(format!("tag {} does not exist", tag)));
        }
    }
    Ok(())
}

fn replace_tags_and_ingredients(
    conn: &Connection,
    recipe_id: i64,
    tags: &[i64],
    ingredients: &[RecipeIngredientReq],
) -> Result<(), AppError> {
    conn.execute("DELETE FROM recipe_tags WHERE recipe_id = ?1", [recipe_id])?;
    for tag in tags {
        conn.execute(
            "INSERT INTO recipe_tags (recipe_id, tag_id) VALUES (?1, ?2)",
            params![recipe_id, tag],
        )?;
    }
    conn.execute(
        "DELETE FROM recipe_ingredients WHERE recipe_id = ?1",
        [recipe_id],
    )?;
    for item in ingredients {
        conn.execute(
            "INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) VALUES (?1, ?2, ?3)",
            params![recipe_id, item.id, item.amount],
        )?;
    }
    Ok(())
}

pub(crate) fn load_short(conn: &Connection, id: i64) -> Result<RecipeShortDto, AppError> {
    conn.query_row(
        "SELECT id, name, image, cooking_time FROM recipes WHERE id = ?1",
        [id],
        |r| {
            Ok(RecipeShortDto {
                id: r.get(0)?,
                name: r.get(1)?,
                image: r.get(2)?,
                cooking_time: r.get(3)?,
            })
        },
    )
    .optional()?
    .ok_or_else(|| AppError::NotFound(format!("recipe {}", id)))
}

/// Author's recipes, newest first, optionally truncated.
pub(crate) fn short_by_author(
    conn: &Connection,
    author_id: i64,
    limit: Option<i64>,
) -> Result<Vec<RecipeShortDto>, AppError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, image, cooking_time FROM recipes WHERE author_id = ?1
         ORDER BY created_at DESC, id DESC LIMIT ?2",
    )?;
    // SQLite treats a negative LIMIT as "no limit"
    let rows = stmt.query_map(params![author_id, limit.unwrap_or(-1)], |r| {
        Ok(RecipeShortDto {
            id: r.get(0)?,
            name: r.get(1)?,
            image: r.get(2)?,
            cooking_time: r.get(3)?,
        })
    })?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

pub(crate) fn recipe_author(conn: &Connection, id: i64) -> Result<i64, AppError> {
    conn.query_row("SELECT author_id FROM recipes WHERE id = ?1", [id], |r| {
        r.get(0)
    })
    .optional()?
    .ok_or_else(|| AppError::NotFound(format!("recipe {}", id)))
}

fn load_recipe(conn: &Connection, id: i64, viewer: Option<i64>) -> Result<RecipeDto, AppError> {
    let raw: RecipeRawRow = conn
        .query_row(
            "SELECT id, author_id, name, text, image, cooking_time FROM recipes WHERE id = ?1",
            [id],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?, r.get(5)?)),
        )
        .optional()?
        .ok_or_else(|| AppError::NotFound(format!("recipe {}", id)))?;

    let author = load_user(conn, raw.1, viewer)?;

    let mut ingredients = Vec::new();
    let mut stmt = conn.prepare(
        "SELECT i.id, i.name, i.measurement_unit, ri.amount
         FROM recipe_ingredients ri JOIN ingredients i ON i.id = ri.ingredient_id
         WHERE ri.recipe_id = ?1 ORDER BY i.name, i.id",
    )?;
    let rows = stmt.query_map([id], |r| {
        Ok(RecipeIngredientDto {
            id: r.get(0)?,
            name: r.get(1)?,
            measurement_unit: r.get(2)?,
            amount: r.get(3)?,
        })
    })?;
    for r in rows {
        ingredients.push(r?);
    }

    let mut tags = Vec::new();
    let mut stmt = conn.prepare(
        "SELECT t.id, t.name, t.slug FROM recipe_tags rt JOIN tags t ON t.id = rt.tag_id
         WHERE rt.recipe_id = ?1 ORDER BY t.id",
    )?;
    let rows = stmt.query_map([id], |r| {
        Ok(TagDto {
            id: r.get(0)?,
            name: r.get(1)?,
            slug: r.get(2)?,
        })
    })?;
    for r in rows {
        tags.push(r?);
    }

    let (is_favorited, is_in_shopping_cart): (bool, bool) = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM favorites WHERE user_id = ?1 AND recipe_id = ?2),
                EXISTS(SELECT 1 FROM cart_items WHERE user_id = ?1 AND recipe_id = ?2)",
        params![viewer, id],
        |r| Ok((r.get(0)?, r.get(1)?)),
    )?;

    Ok(RecipeDto {
        id: raw.0,
        name: raw.2,
        author,
        ingredients,
        tags,
        is_favorited,
        is_in_shopping_cart,
        text: raw.3,
        image: raw.4,
        cooking_time: raw.5,
    })
}

/// Run `write` in one transaction. If it or the commit fails, the image
/// stored for this write is deleted again.
fn write_with_image<T>(
    conn: &Connection,
    media: &MediaStore,
    new_image: Option<&str>,
    write: impl FnOnce(&Transaction<'_>) -> Result<T, AppError>,
) -> Result<T, AppError> {
    let result = conn
        .unchecked_transaction()
        .map_err(AppError::from)
        .and_then(|tx| {
            let value = write(&tx)?;
            tx.commit()?;
            Ok(value)
        });
    if let (Err(e), Some(url)) = (&result, new_image) {
        log::warn!("recipe write failed, dropping {}: {}", url, e);
        media.remove(url);
    }
    result
}

pub fn recipe_create(
    pool: &DbPool,
    media: &MediaStore,
    actor: AuthUser,
    req: RecipeCreateReq,
) -> Result<RecipeDto, AppError> {
    let name = check_required("name", &req.name, NAME_MAX_LEN)?;
    let text = req.text.trim();
    if text.is_empty() {
        return Err(AppError::Validation("text is required".into()));
    }
    check_cooking_time(req.cooking_time)?;
    let image = decode_image("image", &req.image)?;

    let id = {
        let conn = get_connection(pool);
        validate_ingredients(&conn, &req.ingredients)?;
        validate_tags(&conn, &req.tags)?;

        let image_url = media.save(RECIPE_IMAGES_DIR, &image)?;
        write_with_image(&conn, media, Some(image_url.as_str()), |tx| {
            tx.execute(
                "INSERT INTO recipes (author_id, name, text, image, cooking_time, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![actor.id, &name, text, &image_url, req.cooking_time, super::now_ts()],
            )?;
            let id = tx.last_insert_rowid();
            replace_tags_and_ingredients(tx, id, &req.tags, &req.ingredients)?;
            Ok(id)
        })?
    }; // release conn before loading the full view

    log::info!("user {} created recipe {}", actor.id, id);
    recipe_get(pool, id, Some(actor.id))
}

pub fn recipe_get(pool: &DbPool, id: i64, viewer: Option<i64>) -> Result<RecipeDto, AppError> {
    let conn = get_connection(pool);
    load_recipe(&conn, id, viewer)
}

pub fn recipe_list(
    pool: &DbPool,
    req: RecipeListReq,
    page: PageReq,
    viewer: Option<i64>,
) -> Result<Page<RecipeDto>, AppError> {
    let conn = get_connection(pool);

    // --- build dynamic WHERE clauses ---
    let mut conditions: Vec<String> = Vec::new();
    let mut bind_values: Vec<Value> = Vec::new();

    if let Some(author) = req.author {
        conditions.push("r.author_id = ?".to_string());
        bind_values.push(Value::Integer(author));
    }

    let slugs: Vec<&String> = req.tags.iter().filter(|s| !s.is_empty()).collect();
    if !slugs.is_empty() {
        let ph: Vec<&str> = slugs.iter().map(|_| "?").collect();
        conditions.push(format!(
            "r.id IN (SELECT rt.recipe_id FROM recipe_tags rt JOIN tags t ON t.id = rt.tag_id WHERE t.slug IN ({}))",
            ph.join(",")
        ));
        for s in slugs {
            bind_values.push(Value::Text(s.clone()));
        }
    }

    // favorites/cart filters only narrow results for an authenticated viewer
    if let Some(viewer_id) = viewer {
        if req.is_favorited {
            conditions.push("r.id IN (SELECT recipe_id FROM favorites WHERE user_id = ?)".into());
            bind_values.push(Value::Integer(viewer_id));
        }
        if req.is_in_shopping_cart {
            conditions.push("r.id IN (SELECT recipe_id FROM cart_items WHERE user_id = ?)".into());
            bind_values.push(Value::Integer(viewer_id));
        }
    }

    let where_sql = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM recipes r {}", where_sql),
        params_from_iter(bind_values.iter()),
        |r| r.get(0),
    )?;
    page.ensure_in_range(total)?;

    let sql = format!(
        "SELECT r.id FROM recipes r {} ORDER BY r.created_at DESC, r.id DESC LIMIT ? OFFSET ?",
        where_sql
    );
    bind_values.push(Value::Integer(i64::from(page.limit)));
    bind_values.push(Value::Integer(page.offset()));
    let ids = super::query_ids(&conn, &sql, &bind_values)?;

    let items = ids
        .into_iter()
        .map(|id| load_recipe(&conn, id, viewer))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Page {
        items,
        total,
        page: page.page,
        limit: page.limit,
    })
}

pub fn recipe_update(
    pool: &DbPool,
    media: &MediaStore,
    actor: AuthUser,
    id: i64,
    req: RecipeUpdateReq,
) -> Result<RecipeDto, AppError> {
    let old_image = {
        let conn = get_connection(pool);
        let (author_id, name, text, cooking_time, old_image): (i64, String, String, i64, String) =
            conn.query_row(
                "SELECT author_id, name, text, cooking_time, image FROM recipes WHERE id = ?1",
                [id],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?)),
            )
            .optional()?
            .ok_or_else(|| AppError::NotFound(format!("recipe {}", id)))?;
        if !actor.can_modify(author_id) {
            return Err(AppError::PermissionDenied);
        }

        let ingredients = req
            .ingredients
            .as_deref()
            .ok_or_else(|| AppError::Validation("ingredients are required".into()))?;
        let tags = req
            .tags
            .as_deref()
            .ok_or_else(|| AppError::Validation("tags are required".into()))?;
        validate_ingredients(&conn, ingredients)?;
        validate_tags(&conn, tags)?;

        let name = match req.name.as_deref() {
            Some(n) => check_required("name", n, NAME_MAX_LEN)?,
            None => name,
        };
        let text = match req.text.as_deref().map(str::trim) {
            Some("") => return Err(AppError::Validation("text is required".into())),
            Some(t) => t.to_string(),
            None => text,
        };
        let cooking_time = req.cooking_time.unwrap_or(cooking_time);
        check_cooking_time(cooking_time)?;
        let new_image = match &req.image {
            Some(Some(data)) => Some(decode_image("image", data)?),
            Some(None) => return Err(AppError::Validation("image must not be null".into())),
            None => None,
        };

        let new_url = new_image
            .as_ref()
            .map(|img| media.save(RECIPE_IMAGES_DIR, img))
            .transpose()?;
        let image_url = new_url.clone().unwrap_or_else(|| old_image.clone());

        write_with_image(&conn, media, new_url.as_deref(), |tx| {
            tx.execute(
                "UPDATE recipes SET name = ?1, text = ?2, cooking_time = ?3, image = ?4 WHERE id = ?5",
                params![&name, &text, cooking_time, &image_url, id],
            )?;
            replace_tags_and_ingredients(tx, id, tags, ingredients)
        })?;
        new_url.map(|_| old_image)
    };

    if let Some(old) = old_image {
        media.remove(&old);
    }
    log::info!("user {} updated recipe {}", actor.id, id);
    recipe_get(pool, id, Some(actor.id))
}

pub fn recipe_delete(
    pool: &DbPool,
    media: &MediaStore,
    actor: AuthUser,
    id: i64,
) -> Result<(), AppError> {
    let image = {
        let conn = get_connection(pool);
        let (author_id, image): (i64, String) = conn
            .query_row(
                "SELECT author_id, image FROM recipes WHERE id = ?1",
                [id],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()?
            .ok_or_else(|| AppError::NotFound(format!("recipe {}", id)))?;
        if !actor.can_modify(author_id) {
            return Err(AppError::PermissionDenied);
        }
        conn.execute("DELETE FROM recipes WHERE id = ?1", [id])?;
        image
    };
    media.remove(&image);
    log::info!("user {} deleted recipe {}", actor.id, id);
    Ok(())
}

/// Frontend link to the recipe page. `base` is the site origin.
pub fn recipe_short_link(pool: &DbPool, id: i64, base: &str) -> Result<ShortLinkDto, AppError> {
    let conn = get_connection(pool);
    recipe_author(&conn, id)?;
    Ok(ShortLinkDto {
        short_link: format!("{}/recipes/{}", base.trim_end_matches('/'), id),
    })
}
