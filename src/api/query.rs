//! Query-string parsing and paginated response envelopes.

use crate::app::{Page, PageReq};
use crate::error::AppError;
use axum::http::{header, HeaderMap, Uri};
use serde::Serialize;
use std::str::FromStr;
use url::form_urlencoded;

/// Decoded query pairs in request order. Keys may repeat (`tags=a&tags=b`).
#[derive(Debug, Default, Clone)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    pub fn parse(raw: Option<&str>) -> Self {
        Self(
            raw.map(|q| form_urlencoded::parse(q.as_bytes()).into_owned().collect())
                .unwrap_or_default(),
        )
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_all(&self, key: &str) -> Vec<String> {
        self.0
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .collect()
    }

    /// Unparsable values are treated as absent.
    pub fn parse_opt<T: FromStr>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|v| v.trim().parse().ok())
    }

    /// Like [`QueryParams::parse_opt`], but an unparsable value is an error.
    pub fn parse_strict<T: FromStr>(&self, key: &str) -> Result<Option<T>, AppError> {
        match self.get(key) {
            None => Ok(None),
            Some(v) => v
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| AppError::Validation(format!("{} must be a number", key))),
        }
    }

    pub fn flag(&self, key: &str) -> bool {
        matches!(
            self.get(key).map(str::trim),
            Some("1") | Some("true") | Some("True")
        )
    }

    pub fn page_req(&self) -> PageReq {
        PageReq::new(self.parse_opt("page"), self.parse_opt("limit"))
    }

    /// Re-encode with `page` replaced; page 1 drops the parameter.
    fn with_page(&self, page: u32) -> String {
        let mut out = form_urlencoded::Serializer::new(String::new());
        for (k, v) in self.0.iter().filter(|(k, _)| k != "page") {
            out.append_pair(k, v);
        }
        if page > 1 {
            out.append_pair("page", &page.to_string());
        }
        out.finish()
    }
}

#[derive(Debug, Serialize)]
pub struct PageDto<T> {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

fn page_url(base: &str, query: &QueryParams, page: u32) -> String {
    let qs = query.with_page(page);
    if qs.is_empty() {
        base.to_string()
    } else {
        format!("{}?{}", base, qs)
    }
}

/// Build the `{count, next, previous, results}` envelope with absolute links.
pub fn page_dto<T>(page: Page<T>, uri: &Uri, headers: &HeaderMap, query: &QueryParams) -> PageDto<T> {
    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .or_else(|| uri.authority().map(|a| a.as_str()))
        .unwrap_or("localhost");
    let base = format!("http://{}{}", host, uri.path());

    let next = page
        .has_next()
        .then(|| page_url(&base, query, page.page + 1));
    let previous = page
        .has_previous()
        .then(|| page_url(&base, query, page.page - 1));
    PageDto {
        count: page.total,
        next,
        previous,
        results: page.items,
    }
}
