//! Ingredient catalogue: prefix search and lookup.

use crate::domain::limits::{check_required, INGREDIENT_SEARCH_LIMIT, NAME_MAX_LEN, UNIT_MAX_LEN};
use crate::error::AppError;
use crate::infra::{get_connection, DbPool};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngredientDto {
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
}

#[derive(Debug, Deserialize)]
pub struct IngredientCreateReq {
    pub name: String,
    pub measurement_unit: String,
}

fn ingredient_from_row(r: &Row<'_>) -> rusqlite::Result<IngredientDto> {
    Ok(IngredientDto {
        id: r.get(0)?,
        name: r.get(1)?,
        measurement_unit: r.get(2)?,
    })
}

/// Search key stored alongside the name. SQLite's own case folding only
/// covers ASCII, so folding happens here.
pub(crate) fn search_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Without a prefix: every ingredient by name. With one: case-insensitive
/// starts-with match, first ten by name.
pub fn ingredient_list(pool: &DbPool, name: Option<&str>) -> Result<Vec<IngredientDto>, AppError> {
    let conn = get_connection(pool);
    let prefix = name.map(search_key).filter(|s| !s.is_empty());

    let mut out = Vec::new();
    match prefix {
        None => {
            let mut stmt = conn
                .prepare("SELECT id, name, measurement_unit FROM ingredients ORDER BY name, id")?;
            let rows = stmt.query_map([], ingredient_from_row)?;
            for r in rows {
                out.push(r?);
            }
        }
        Some(prefix) => {
            let mut stmt = conn.prepare(
                "SELECT id, name, measurement_unit FROM ingredients
                 WHERE search_name LIKE ?1 ESCAPE '\\'
                 ORDER BY name, id LIMIT ?2",
            )?;
            let pattern = format!("{}%", super::escape_like(&prefix));
            let rows = stmt.query_map(params![pattern, INGREDIENT_SEARCH_LIMIT], ingredient_from_row)?;
            for r in rows {
                out.push(r?);
            }
        }
    }
    Ok(out)
}

pub fn ingredient_get(pool: &DbPool, id: i64) -> Result<IngredientDto, AppError> {
    let conn = get_connection(pool);
    conn.query_row(
        "SELECT id, name, measurement_unit FROM ingredients WHERE id = ?1",
        [id],
        ingredient_from_row,
    )
    .optional()?
    .ok_or_else(|| AppError::NotFound(format!("ingredient {}", id)))
}

pub fn ingredient_create(pool: &DbPool, req: IngredientCreateReq) -> Result<IngredientDto, AppError> {
    let conn = get_connection(pool);
    insert_ingredient(&conn, &req.name, &req.measurement_unit)
}

pub(crate) fn insert_ingredient(
    conn: &Connection,
    name: &str,
    measurement_unit: &str,
) -> Result<IngredientDto, AppError> {
    let name = check_required("name", name, NAME_MAX_LEN)?;
    let measurement_unit = check_required("measurement_unit", measurement_unit, UNIT_MAX_LEN)?;
    conn.execute(
        "INSERT INTO ingredients (name, measurement_unit, search_name) VALUES (?1, ?2, ?3)",
        params![&name, &measurement_unit, search_key(&name)],
    )?;
    Ok(IngredientDto {
        id: conn.last_insert_rowid(),
        name,
        measurement_unit,
    })
}
