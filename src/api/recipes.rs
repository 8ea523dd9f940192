use super::extract::{CurrentUser, MaybeUser, ObjectId};
use super::query::{page_dto, PageDto, QueryParams};
use super::{blocking, json_body, AppState};
use crate::app::{
    self, RecipeCreateReq, RecipeDto, RecipeListReq, RecipeShortDto, RecipeUpdateReq,
    ShortLinkDto,
};
use crate::domain::shopping::SHOPPING_LIST_FILENAME;
use crate::domain::RecipeCollection;
use crate::error::AppError;
use axum::extract::rejection::JsonRejection;
use axum::extract::{RawQuery, State};
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::IntoResponse;
use axum::Json;

pub async fn list(
    State(state): State<AppState>,
    viewer: MaybeUser,
    uri: Uri,
    headers: HeaderMap,
    RawQuery(raw): RawQuery,
) -> Result<Json<PageDto<RecipeDto>>, AppError> {
    let query = QueryParams::parse(raw.as_deref());
    let page_req = query.page_req();
    let filter = RecipeListReq {
        author: query.parse_strict("author")?,
        tags: query.get_all("tags"),
        is_favorited: query.flag("is_favorited"),
        is_in_shopping_cart: query.flag("is_in_shopping_cart"),
    };
    let viewer = viewer.id();
    let page = blocking(&state, move |pool, _| {
        app::recipe_list(pool, filter, page_req, viewer)
    })
    .await?;
    Ok(Json(page_dto(page, &uri, &headers, &query)))
}

pub async fn create(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    payload: Result<Json<RecipeCreateReq>, JsonRejection>,
) -> Result<(StatusCode, Json<RecipeDto>), AppError> {
    let req = json_body(payload)?;
    let recipe = blocking(&state, move |pool, media| {
        app::recipe_create(pool, media, actor, req)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(recipe)))
}

pub async fn retrieve(
    State(state): State<AppState>,
    viewer: MaybeUser,
    ObjectId(id): ObjectId,
) -> Result<Json<RecipeDto>, AppError> {
    let viewer = viewer.id();
    let recipe = blocking(&state, move |pool, _| app::recipe_get(pool, id, viewer)).await?;
    Ok(Json(recipe))
}

pub async fn update(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    ObjectId(id): ObjectId,
    payload: Result<Json<RecipeUpdateReq>, JsonRejection>,
) -> Result<Json<RecipeDto>, AppError> {
    let req = json_body(payload)?;
    let recipe = blocking(&state, move |pool, media| {
        app::recipe_update(pool, media, actor, id, req)
    })
    .await?;
    Ok(Json(recipe))
}

pub async fn destroy(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    ObjectId(id): ObjectId,
) -> Result<StatusCode, AppError> {
    blocking(&state, move |pool, media| {
        app::recipe_delete(pool, media, actor, id)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_link(
    State(state): State<AppState>,
    headers: HeaderMap,
    ObjectId(id): ObjectId,
) -> Result<Json<ShortLinkDto>, AppError> {
    let base = match &state.frontend_url {
        Some(url) => url.to_string(),
        None => {
            let host = headers
                .get(header::HOST)
                .and_then(|h| h.to_str().ok())
                .unwrap_or("localhost");
            format!("http://{}", host)
        }
    };
    let link = blocking(&state, move |pool, _| {
        app::recipe_short_link(pool, id, &base)
    })
    .await?;
    Ok(Json(link))
}

async fn collection_add(
    state: &AppState,
    kind: RecipeCollection,
    actor: app::AuthUser,
    id: i64,
) -> Result<(StatusCode, Json<RecipeShortDto>), AppError> {
    let recipe = blocking(state, move |pool, _| {
        app::collection_add(pool, kind, actor, id)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(recipe)))
}

async fn collection_remove(
    state: &AppState,
    kind: RecipeCollection,
    actor: app::AuthUser,
    id: i64,
) -> Result<StatusCode, AppError> {
    blocking(state, move |pool, _| {
        app::collection_remove(pool, kind, actor, id)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn favorite_add(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    ObjectId(id): ObjectId,
) -> Result<(StatusCode, Json<RecipeShortDto>), AppError> {
    collection_add(&state, RecipeCollection::Favorites, actor, id).await
}

pub async fn favorite_remove(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    ObjectId(id): ObjectId,
) -> Result<StatusCode, AppError> {
    collection_remove(&state, RecipeCollection::Favorites, actor, id).await
}

pub async fn cart_add(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    ObjectId(id): ObjectId,
) -> Result<(StatusCode, Json<RecipeShortDto>), AppError> {
    collection_add(&state, RecipeCollection::ShoppingCart, actor, id).await
}

pub async fn cart_remove(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    ObjectId(id): ObjectId,
) -> Result<StatusCode, AppError> {
    collection_remove(&state, RecipeCollection::ShoppingCart, actor, id).await
}

pub async fn download_shopping_cart(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let text = blocking(&state, move |pool, _| app::shopping_list_text(pool, actor)).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", SHOPPING_LIST_FILENAME),
            ),
        ],
        text,
    ))
}
