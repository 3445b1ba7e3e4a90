//! Per-request language activation for axum.

use crate::i18n::{ActiveLanguage, LanguageRequest, LocaleResolver};
use axum::{
    body::Body,
    extract::State,
    http::{
        header::{ACCEPT_LANGUAGE, CONTENT_LANGUAGE, COOKIE},
        HeaderMap, HeaderValue, Request,
    },
    middleware::Next,
    response::Response,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Language-relevant view of an HTTP request.
#[derive(Debug)]
pub struct HttpLanguageRequest<'a> {
    path: &'a str,
    cookies: HashMap<&'a str, &'a str>,
    accept_language: &'a str,
}

impl<'a> HttpLanguageRequest<'a> {
    pub fn new(path: &'a str, headers: &'a HeaderMap) -> Self {
        let mut cookies = HashMap::new();
        for header in headers.get_all(COOKIE) {
            let Ok(header) = header.to_str() else {
                continue;
            };
            for pair in header.split(';') {
                if let Some((name, value)) = pair.trim().split_once('=') {
                    cookies.entry(name.trim()).or_insert(value.trim().trim_matches('"'));
                }
            }
        }

        let accept_language = headers
            .get(ACCEPT_LANGUAGE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();

        Self {
            path,
            cookies,
            accept_language,
        }
    }
}

impl LanguageRequest for HttpLanguageRequest<'_> {
    fn path(&self) -> &str {
        self.path
    }

    fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).copied()
    }

    fn accept_language(&self) -> &str {
        self.accept_language
    }
}

/// Select the request language, store it as an `ActiveLanguage` request
/// extension, and report it in the `Content-Language` response header.
pub async fn with_active_language(
    State(resolver): State<Arc<LocaleResolver>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let active = {
        let request = HttpLanguageRequest::new(req.uri().path(), req.headers());
        resolver.activate_language(&request)
    };
    debug!(path = %req.uri().path(), language = %active.code(), "Activated language");

    req.extensions_mut().insert(active.clone());
    let mut response = next.run(req).await;

    if let Ok(value) = HeaderValue::from_str(active.code()) {
        response.headers_mut().insert(CONTENT_LANGUAGE, value);
    }
    response
}
