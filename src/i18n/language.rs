//! Language codes: casing translation and tag syntax.
//!
//! Two representations of a locale tag exist:
//!
//! - the *internal* form, always lower case (`en-us`), used for lookups
//! - the *external* form, mixed case (`en-US`), shown in URLs and responses
//!
//! The external form is table-driven. Only codes present in the URL map get
//! a different casing, everything else is passed through unchanged.

use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

static LANGUAGE_CODE_REGEX: OnceLock<Regex> = OnceLock::new();
static PATH_PREFIX_REGEX: OnceLock<Regex> = OnceLock::new();

/// Bidirectional translator between internal and external locale codes.
#[derive(Debug, Clone, Default)]
pub struct CodeCasing {
    /// Internal form -> external form overrides
    url_map: HashMap<String, String>,
}

impl CodeCasing {
    /// Create a translator from an internal -> external override map.
    pub fn new(url_map: HashMap<String, String>) -> Self {
        Self { url_map }
    }

    /// Convert an internal code to the external form.
    ///
    /// Returns the override from the URL map, or `code` unchanged.
    pub fn to_external(&self, code: &str) -> String {
        self.url_map
            .get(code)
            .cloned()
            .unwrap_or_else(|| code.to_string())
    }

    /// Convert any code to the internal (lower case) form.
    pub fn to_internal(code: &str) -> String {
        code.to_lowercase()
    }
}

/// Check that `code` is a syntactically valid language code.
///
/// Letters, digits and hyphens only, with an optional `@variant` suffix
/// (`en`, `en-us`, `es-419`, `sr-latn@latin`). Case-insensitive.
pub fn is_valid_language_code(code: &str) -> bool {
    language_code_regex().is_match(code)
}

/// Extract the locale-looking first segment of a URL path.
///
/// The segment is one word, optionally joined to a second by `-` or `@`.
/// `/en-US/docs/Web` yields `en-US`, `/sr@latin/` yields `sr@latin` and
/// `/docs` yields `docs` (the resolver decides whether it is a locale).
/// Returns `None` for anything else, including `/zh-hant-tw/` and `/en-/`.
pub fn path_prefix(path: &str) -> Option<&str> {
    path_prefix_regex()
        .captures(path)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// The language-only portion of a tag, before the first hyphen.
pub fn generic_prefix(code: &str) -> &str {
    code.split('-').next().unwrap_or(code)
}

fn language_code_regex() -> &'static Regex {
    LANGUAGE_CODE_REGEX.get_or_init(|| {
        Regex::new(r"(?i)^[a-z]{1,8}(?:-[a-z0-9]{1,8})*(?:@[a-z0-9]{1,20})?$")
            .expect("language code regex is valid")
    })
}

fn path_prefix_regex() -> &'static Regex {
    PATH_PREFIX_REGEX.get_or_init(|| {
        Regex::new(r"^/(\w+(?:[@-]\w+)?)(?:/|$)").expect("path prefix regex is valid")
    })
}
