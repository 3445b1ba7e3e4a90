use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;
use wiki_locale::config::Config;
use wiki_locale::i18n::{LocaleResolver, LocaleSettings};
use wiki_locale::server;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("wiki_locale=info".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .init();

    info!("Starting wiki locale service");

    // Load configuration from environment
    let config = Config::from_env()?;

    // One resolver for the process lifetime, shared by all handlers
    let settings = LocaleSettings::from_config(&config);
    let resolver = Arc::new(LocaleResolver::new(settings)?);
    info!(
        "Loaded {} supported locales (default {}, cache size {})",
        resolver.supported_locales_external().len(),
        config.language_code,
        resolver.cache_capacity()
    );

    let app = server::router(resolver);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context(format!("Failed to bind {}", addr))?;
    info!("✓ Listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
