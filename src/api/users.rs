use super::extract::{CurrentUser, MaybeUser, ObjectId};
use super::query::{page_dto, PageDto, QueryParams};
use super::{blocking, json_body, AppState};
use crate::app::{
    self, AvatarDto, AvatarReq, SetPasswordReq, SubscriptionDto, TokenDto, TokenLoginReq,
    UserCreatedDto, UserDto, UserRegisterReq,
};
use crate::error::AppError;
use axum::extract::rejection::JsonRejection;
use axum::extract::{RawQuery, State};
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::Json;

fn recipes_limit(query: &QueryParams) -> Option<i64> {
    query.parse_opt::<i64>("recipes_limit").filter(|n| *n >= 0)
}

pub async fn token_login(
    State(state): State<AppState>,
    payload: Result<Json<TokenLoginReq>, JsonRejection>,
) -> Result<Json<TokenDto>, AppError> {
    let req = json_body(payload)?;
    let token = blocking(&state, move |pool, _| app::token_login(pool, req)).await?;
    Ok(Json(token))
}

pub async fn token_logout(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
) -> Result<StatusCode, AppError> {
    blocking(&state, move |pool, _| app::token_logout(pool, actor)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<UserRegisterReq>, JsonRejection>,
) -> Result<(StatusCode, Json<UserCreatedDto>), AppError> {
    let req = json_body(payload)?;
    let user = blocking(&state, move |pool, _| app::user_register(pool, req)).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn list(
    State(state): State<AppState>,
    viewer: MaybeUser,
    uri: Uri,
    headers: HeaderMap,
    RawQuery(raw): RawQuery,
) -> Result<Json<PageDto<UserDto>>, AppError> {
    let query = QueryParams::parse(raw.as_deref());
    let page_req = query.page_req();
    let search = query.get("search").map(str::to_string);
    let viewer = viewer.id();
    let page = blocking(&state, move |pool, _| {
        app::user_list(pool, page_req, search.as_deref(), viewer)
    })
    .await?;
    Ok(Json(page_dto(page, &uri, &headers, &query)))
}

pub async fn retrieve(
    State(state): State<AppState>,
    viewer: MaybeUser,
    ObjectId(id): ObjectId,
) -> Result<Json<UserDto>, AppError> {
    let viewer = viewer.id();
    let user = blocking(&state, move |pool, _| app::user_get(pool, id, viewer)).await?;
    Ok(Json(user))
}

pub async fn me(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
) -> Result<Json<UserDto>, AppError> {
    let user = blocking(&state, move |pool, _| app::user_me(pool, actor)).await?;
    Ok(Json(user))
}

pub async fn set_password(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    payload: Result<Json<SetPasswordReq>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let req = json_body(payload)?;
    blocking(&state, move |pool, _| app::user_set_password(pool, actor, req)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_avatar(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    payload: Result<Json<AvatarReq>, JsonRejection>,
) -> Result<Json<AvatarDto>, AppError> {
    let req = json_body(payload)?;
    let avatar = blocking(&state, move |pool, media| {
        app::user_set_avatar(pool, media, actor, req)
    })
    .await?;
    Ok(Json(avatar))
}

pub async fn delete_avatar(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
) -> Result<StatusCode, AppError> {
    blocking(&state, move |pool, media| {
        app::user_delete_avatar(pool, media, actor)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn subscribe(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    ObjectId(author_id): ObjectId,
    RawQuery(raw): RawQuery,
) -> Result<(StatusCode, Json<SubscriptionDto>), AppError> {
    let limit = recipes_limit(&QueryParams::parse(raw.as_deref()));
    let sub = blocking(&state, move |pool, _| {
        app::subscribe(pool, actor, author_id, limit)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(sub)))
}

pub async fn unsubscribe(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    ObjectId(author_id): ObjectId,
) -> Result<StatusCode, AppError> {
    blocking(&state, move |pool, _| app::unsubscribe(pool, actor, author_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn subscriptions(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    uri: Uri,
    headers: HeaderMap,
    RawQuery(raw): RawQuery,
) -> Result<Json<PageDto<SubscriptionDto>>, AppError> {
    let query = QueryParams::parse(raw.as_deref());
    let page_req = query.page_req();
    let limit = recipes_limit(&query);
    let page = blocking(&state, move |pool, _| {
        app::subscriptions(pool, actor, page_req, limit)
    })
    .await?;
    Ok(Json(page_dto(page, &uri, &headers, &query)))
}
