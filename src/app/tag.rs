//! Tag catalogue (read-only over HTTP; created from the CLI).

use crate::domain::limits::{check_required, NAME_MAX_LEN};
use crate::error::AppError;
use crate::infra::{get_connection, DbPool};
use regex::Regex;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagDto {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Deserialize)]
pub struct TagCreateReq {
    pub name: String,
    pub slug: String,
}

fn slug_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[-a-zA-Z0-9_]+$").expect("slug regex"))
}

pub fn tag_list(pool: &DbPool) -> Result<Vec<TagDto>, AppError> {
    let conn = get_connection(pool);
    let mut stmt = conn.prepare("SELECT id, name, slug FROM tags ORDER BY id")?;
    let rows = stmt.query_map([], |r| {
        Ok(TagDto {
            id: r.get(0)?,
            name: r.get(1)?,
            slug: r.get(2)?,
        })
    })?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

pub fn tag_get(pool: &DbPool, id: i64) -> Result<TagDto, AppError> {
    let conn = get_connection(pool);
    conn.query_row(
        "SELECT id, name, slug FROM tags WHERE id = ?1",
        [id],
        |r| {
            Ok(TagDto {
                id: r.get(0)?,
                name: r.get(1)?,
                slug: r.get(2)?,
            })
        },
    )
    .optional()?
    .ok_or_else(|| AppError::NotFound(format!("tag {}", id)))
}

pub fn tag_create(pool: &DbPool, req: TagCreateReq) -> Result<TagDto, AppError> {
    let conn = get_connection(pool);
    insert_tag(&conn, req)
}

pub(crate) fn insert_tag(conn: &Connection, req: TagCreateReq) -> Result<TagDto, AppError> {
    let name = check_required("name", &req.name, NAME_MAX_LEN)?;
    let slug = check_required("slug", &req.slug, NAME_MAX_LEN)?;
    if !slug_re().is_match(&slug) {
        return Err(AppError::Validation(
            "slug may contain only latin letters, digits, '-' and '_'".into(),
        ));
    }
    let taken: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM tags WHERE name = ?1 OR slug = ?2)",
        params![&name, &slug],
        |r| r.get(0),
    )?;
    if taken {
        return Err(AppError::Conflict(format!("tag {} already exists", slug)));
    }
    conn.execute(
        "INSERT INTO tags (name, slug) VALUES (?1, ?2)",
        params![&name, &slug],
    )?;
    Ok(TagDto {
        id: conn.last_insert_rowid(),
        name,
        slug,
    })
}
