//! Tags and ingredients: public, unpaginated, read-only.

use super::extract::ObjectId;
use super::query::QueryParams;
use super::{blocking, AppState};
use crate::app::{self, IngredientDto, TagDto};
use crate::error::AppError;
use axum::extract::{RawQuery, State};
use axum::Json;

pub async fn tag_list(State(state): State<AppState>) -> Result<Json<Vec<TagDto>>, AppError> {
    let tags = blocking(&state, |pool, _| app::tag_list(pool)).await?;
    Ok(Json(tags))
}

pub async fn tag_get(
    State(state): State<AppState>,
    ObjectId(id): ObjectId,
) -> Result<Json<TagDto>, AppError> {
    let tag = blocking(&state, move |pool, _| app::tag_get(pool, id)).await?;
    Ok(Json(tag))
}

pub async fn ingredient_list(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<Json<Vec<IngredientDto>>, AppError> {
    let name = QueryParams::parse(raw.as_deref())
        .get("name")
        .map(str::to_string);
    let items = blocking(&state, move |pool, _| {
        app::ingredient_list(pool, name.as_deref())
    })
    .await?;
    Ok(Json(items))
}

pub async fn ingredient_get(
    State(state): State<AppState>,
    ObjectId(id): ObjectId,
) -> Result<Json<IngredientDto>, AppError> {
    let item = blocking(&state, move |pool, _| app::ingredient_get(pool, id)).await?;
    Ok(Json(item))
}
