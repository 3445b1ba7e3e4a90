//! HTTP routes exposing language negotiation.

use crate::i18n::{ActiveLanguage, LanguageEntry, LocaleResolver, MetricsReport};
use crate::middleware::with_active_language;
use axum::{
    extract::State,
    http::Uri,
    middleware,
    routing::get,
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Locale negotiated for a request.
#[derive(Debug, Serialize)]
pub struct LocaleResponse {
    pub locale: String,
    pub name: Option<String>,
    pub path: String,
}

/// Build the application router.
///
/// Every route runs behind language activation, so any path (e.g.
/// `/fr/docs/Web`) reports the locale it would be served in.
pub fn router(resolver: Arc<LocaleResolver>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/languages", get(languages))
        .route("/api/v1/locale", get(locale))
        .route("/api/v1/locale/metrics", get(metrics))
        .fallback(locale)
        .layer(middleware::from_fn_with_state(
            Arc::clone(&resolver),
            with_active_language,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(resolver)
}

async fn health() -> &'static str {
    "OK"
}

async fn languages(State(resolver): State<Arc<LocaleResolver>>) -> Json<Vec<LanguageEntry>> {
    Json(resolver.supported_locales_external().to_vec())
}

async fn locale(
    State(resolver): State<Arc<LocaleResolver>>,
    Extension(active): Extension<ActiveLanguage>,
    uri: Uri,
) -> Json<LocaleResponse> {
    let name = resolver
        .supported_locales_internal()
        .name(&resolver.to_internal(active.code()))
        .map(String::from);

    Json(LocaleResponse {
        locale: active.0,
        name,
        path: uri.path().to_string(),
    })
}

async fn metrics(State(resolver): State<Arc<LocaleResolver>>) -> Json<MetricsReport> {
    Json(resolver.metrics_report())
}
