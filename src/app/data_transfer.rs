//! Catalogue import: ingredients and tags from JSON arrays.

use super::ingredient::insert_ingredient;
use super::tag::{insert_tag, TagCreateReq};
use crate::error::AppError;
use crate::infra::{get_connection, DbPool};
use rusqlite::{params, OptionalExtension};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;

#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct IngredientImportResult {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
}

#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct TagImportResult {
    pub created: usize,
    pub skipped: usize,
}

fn parse_array(json: &str) -> Result<Vec<Value>, AppError> {
    let json = json.trim_start_matches('\u{feff}');
    let value: Value = serde_json::from_str(json)
        .map_err(|e| AppError::Validation(format!("invalid JSON: {}", e)))?;
    match value {
        Value::Array(items) => Ok(items),
        _ => Err(AppError::Validation("expected a JSON array of objects".into())),
    }
}

fn str_field<'a>(item: &'a Value, key: &str) -> &'a str {
    item.get(key).and_then(Value::as_str).unwrap_or_default().trim()
}

/// Import `[{"name": ..., "measurement_unit": ...}]`.
///
/// Entries with a blank name or unit are skipped, as are repeats of a name
/// already seen in the same file (compared case-insensitively). An existing
/// ingredient keeps its unit unless `update` is set.
pub fn import_ingredients(
    pool: &DbPool,
    json: &str,
    update: bool,
) -> Result<IngredientImportResult, AppError> {
    let items = parse_array(json)?;
    let mut result = IngredientImportResult::default();
    let mut seen = HashSet::new();

    let conn = get_connection(pool);
    let tx = conn.unchecked_transaction()?;
    for item in &items {
        let name = str_field(item, "name");
        let unit = str_field(item, "measurement_unit");
        if name.is_empty() || unit.is_empty() {
            result.skipped += 1;
            continue;
        }
        if !seen.insert(name.to_lowercase()) {
            result.skipped += 1;
            continue;
        }

        let existing: Option<(i64, String)> = tx
            .query_row(
                "SELECT id, measurement_unit FROM ingredients WHERE name = ?1",
                [name],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()?;
        match existing {
            None => {
                insert_ingredient(&tx, name, unit)?;
                result.created += 1;
            }
            Some((id, current)) if update && current != unit => {
                tx.execute(
                    "UPDATE ingredients SET measurement_unit = ?1 WHERE id = ?2",
                    params![unit, id],
                )?;
                result.updated += 1;
            }
            Some(_) => result.skipped += 1,
        }
    }
    tx.commit()?;

    log::info!(
        "ingredient import: created {}, updated {}, skipped {}",
        result.created,
        result.updated,
        result.skipped
    );
    Ok(result)
}

/// Import `[{"name": ..., "slug": ...}]`; tags whose name or slug already
/// exists are skipped.
pub fn import_tags(pool: &DbPool, json: &str) -> Result<TagImportResult, AppError> {
    let items = parse_array(json)?;
    let mut result = TagImportResult::default();

    let conn = get_connection(pool);
    let tx = conn.unchecked_transaction()?;
    for item in &items {
        let req = TagCreateReq {
            name: str_field(item, "name").to_string(),
            slug: str_field(item, "slug").to_string(),
        };
        match insert_tag(&tx, req) {
            Ok(_) => result.created += 1,
            Err(AppError::Conflict(_)) | Err(AppError::Validation(_)) => result.skipped += 1,
            Err(e) => return Err(e),
        }
    }
    tx.commit()?;

    log::info!(
        "tag import: created {}, skipped {}",
        result.created,
        result.skipped
    );
    Ok(result)
}
