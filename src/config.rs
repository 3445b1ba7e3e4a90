use anyhow::{bail, Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub port: u16,

    // Locale negotiation
    pub language_code: String,
    pub language_cookie_name: String,
    pub locale_cache_size: usize,

    // Export
    pub site_url: String,
    pub export_outdir: String,
    pub export_min_age_secs: u64,
    pub export_catalog: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let locale_cache_size = match std::env::var("LOCALE_CACHE_SIZE") {
            Ok(v) => v
                .parse()
                .context(format!("LOCALE_CACHE_SIZE is not a number: {}", v))?,
            Err(_) => 1000,
        };
        // The resolution cache must stay bounded
        if locale_cache_size == 0 {
            bail!("LOCALE_CACHE_SIZE must be greater than zero");
        }

        Ok(Self {
            // Server
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),

            // Locale negotiation
            language_code: std::env::var("LANGUAGE_CODE")
                .unwrap_or_else(|_| "en-US".to_string()),
            language_cookie_name: std::env::var("LANGUAGE_COOKIE_NAME")
                .unwrap_or_else(|_| "preferredlocale".to_string()),
            locale_cache_size,

            // Export
            site_url: std::env::var("SITE_URL")
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),
            export_outdir: std::env::var("EXPORT_OUTDIR")
                .unwrap_or_else(|_| "wiki-stumptown-export".to_string()),
            export_min_age_secs: std::env::var("EXPORT_MIN_AGE_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(600),
            export_catalog: std::env::var("EXPORT_CATALOG")
                .unwrap_or_else(|_| "data/documents.json".to_string()),
        })
    }
}
