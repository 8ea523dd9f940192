//! Request extractors resolving `Authorization: Token <key>`.

use super::AppState;
use crate::app::{token_resolve, AuthUser};
use crate::error::AppError;
use axum::extract::{FromRequestParts, Path, Request, State};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::Response;

/// Authenticated user, or 401.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub AuthUser);

/// Authenticated user if a token was sent. An invalid token is still a 401.
#[derive(Debug, Clone, Copy)]
pub struct MaybeUser(pub Option<AuthUser>);

impl MaybeUser {
    pub fn id(&self) -> Option<i64> {
        self.0.map(|u| u.id)
    }
}

/// Numeric object id from the path. Anything unparsable is a 404.
#[derive(Debug, Clone, Copy)]
pub struct ObjectId(pub i64);

/// Extract the token from the Authorization header. Other schemes are ignored.
fn token_from_headers(headers: &HeaderMap) -> Result<Option<String>, AppError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value.to_str().map_err(|_| AppError::NotAuthenticated)?;
    match value.split_once(' ') {
        Some((scheme, key)) if scheme.eq_ignore_ascii_case("token") => {
            let key = key.trim();
            if key.is_empty() {
                return Err(AppError::NotAuthenticated);
            }
            Ok(Some(key.to_string()))
        }
        _ if value.trim().eq_ignore_ascii_case("token") => Err(AppError::NotAuthenticated),
        _ => Ok(None),
    }
}

async fn resolve(headers: &HeaderMap, state: &AppState) -> Result<MaybeUser, AppError> {
    let Some(key) = token_from_headers(headers)? else {
        return Ok(MaybeUser(None));
    };
    let user = super::blocking(state, move |pool, _| token_resolve(pool, &key)).await?;
    Ok(MaybeUser(Some(user)))
}

/// Router layer: resolves the token once per request and stores the result
/// for the extractors. An unknown token fails every route, public ones too.
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let viewer = resolve(req.headers(), &state).await?;
    req.extensions_mut().insert(viewer);
    Ok(next.run(req).await)
}

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<MaybeUser>() {
            Some(viewer) => Ok(*viewer),
            None => resolve(&parts.headers, state).await,
        }
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match MaybeUser::from_request_parts(parts, state).await? {
            MaybeUser(Some(user)) => Ok(CurrentUser(user)),
            MaybeUser(None) => Err(AppError::NotAuthenticated),
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for ObjectId {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<i64>::from_request_parts(parts, state).await {
            Ok(Path(id)) => Ok(ObjectId(id)),
            Err(rejection) => {
                log::debug!("unmatched object id: {}", rejection.body_text());
                Err(AppError::NotFound(format!("no object at {}", parts.uri.path())))
            }
        }
    }
}
