//! Page-number pagination shared by every list endpoint.
//!
//! Responses use the `{count, next, previous, results}` envelope; links are
//! relative and keep every other query parameter of the original request.

use axum::http::Uri;
use serde::Serialize;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub number: i64,
    pub size: i64,
}

impl PageRequest {
    /// Reads the `page` parameter; anything that is not a positive integer means page 1.
    pub fn from_param(page: Option<&str>, size: i64) -> Self {
        let number = page
            .and_then(|p| p.trim().parse::<i64>().ok())
            .filter(|n| *n >= 1)
            .unwrap_or(1);
        PageRequest { number, size }
    }

    pub fn limit(&self) -> i64 {
        self.size
    }

    pub fn offset(&self) -> i64 {
        (self.number - 1).saturating_mul(self.size)
    }

    pub fn last_page(&self, count: i64) -> i64 {
        if count <= 0 {
            1
        } else {
            (count + self.size - 1) / self.size
        }
    }

    /// Page 1 always exists, even for an empty result set.
    pub fn ensure_exists(&self, count: i64) -> Result<(), AppError> {
        if self.number > self.last_page(count) {
            return Err(AppError::NotFound("Invalid page.".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(results: Vec<T>, count: i64, request: &PageRequest, uri: &Uri) -> Self {
        let next = (request.number < request.last_page(count))
            .then(|| page_link(uri, request.number + 1));
        let previous = (request.number > 1).then(|| page_link(uri, request.number - 1));

        Page {
            count,
            next,
            previous,
            results,
        }
    }
}

fn page_link(uri: &Uri, page: i64) -> String {
    let mut params: Vec<(String, String)> =
        serde_urlencoded::from_str(uri.query().unwrap_or_default()).unwrap_or_default();
    params.retain(|(key, _)| key != "page");
    if page > 1 {
        params.push(("page".to_string(), page.to_string()));
    }

    let query = serde_urlencoded::to_string(&params).unwrap_or_default();
    if query.is_empty() {
        uri.path().to_string()
    } else {
        format!("{}?{}", uri.path(), query)
    }
}
