//! Request language selection.
//!
//! Picks the locale a request should be served in, looking at (in order)
//! the URL path prefix, the language cookie and the `Accept-Language`
//! header, and falling back to the configured default.

use crate::i18n::accept::parse_accept_language;
use crate::i18n::language::{is_valid_language_code, path_prefix};
use crate::i18n::resolver::LocaleResolver;
use std::collections::HashMap;
use tracing::{debug, warn};

/// The parts of an HTTP request that language selection reads.
pub trait LanguageRequest {
    /// Request path (e.g., "/en-US/docs/Web")
    fn path(&self) -> &str;

    /// Value of the named cookie, if sent
    fn cookie(&self, name: &str) -> Option<&str>;

    /// Raw `Accept-Language` header text, empty when absent
    fn accept_language(&self) -> &str;
}

/// Plain request data, for callers outside an HTTP framework.
#[derive(Debug, Clone, Default)]
pub struct RequestInfo {
    pub path: String,
    pub cookies: HashMap<String, String>,
    pub accept_language: String,
}

impl RequestInfo {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            ..Self::default()
        }
    }

    pub fn with_cookie(mut self, name: &str, value: &str) -> Self {
        self.cookies.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_accept_language(mut self, header: &str) -> Self {
        self.accept_language = header.to_string();
        self
    }
}

impl LanguageRequest for RequestInfo {
    fn path(&self) -> &str {
        &self.path
    }

    fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    fn accept_language(&self) -> &str {
        &self.accept_language
    }
}

/// The locale selected for the request being handled.
///
/// Set once near the start of request handling and read by downstream
/// rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveLanguage(pub String);

impl ActiveLanguage {
    pub fn code(&self) -> &str {
        &self.0
    }
}

impl LocaleResolver {
    /// Resolve the locale prefix of a URL path.
    ///
    /// Returns `None` when the path has no prefix segment, or when the
    /// segment does not resolve to a supported locale. In both cases the
    /// caller moves on to the cookie and header.
    pub fn language_from_path(&self, path: &str) -> Option<String> {
        let prefix = path_prefix(path)?;
        self.resolve_variant(prefix).ok()
    }

    /// Select the locale for a request. Never fails.
    pub fn select_language<R: LanguageRequest + ?Sized>(&self, request: &R) -> String {
        if let Some(code) = self.language_from_path(request.path()) {
            debug!("Language '{}' selected from path", code);
            return code;
        }

        if let Some(cookie) = request.cookie(&self.settings().cookie_name) {
            if let Ok(code) = self.resolve_variant(cookie) {
                debug!("Language '{}' selected from cookie", code);
                return code;
            }
        }

        for accept in parse_accept_language(request.accept_language()) {
            if accept.tag == "*" {
                break;
            }

            let valid = is_valid_language_code(&accept.tag);
            debug_assert!(valid, "Accept-Language parser produced invalid tag '{}'", accept.tag);
            if !valid {
                warn!("Skipping malformed Accept-Language tag '{}'", accept.tag);
                continue;
            }

            if let Ok(code) = self.resolve_variant(&accept.tag) {
                debug!("Language '{}' selected from Accept-Language", code);
                return code;
            }
        }

        self.settings().default_language.clone()
    }

    /// Select the locale for a request and wrap it as the active language.
    pub fn activate_language<R: LanguageRequest + ?Sized>(&self, request: &R) -> ActiveLanguage {
        ActiveLanguage(self.select_language(request))
    }
}
