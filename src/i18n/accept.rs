//! `Accept-Language` header parsing (RFC 2616, section 14.4).

use regex::Regex;
use std::sync::OnceLock;

static ACCEPT_LANGUAGE_REGEX: OnceLock<Regex> = OnceLock::new();

/// A language range from an `Accept-Language` header with its quality.
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptLanguage {
    /// Lower-cased language range (e.g., "en-us", "*")
    pub tag: String,

    /// Quality value between 0.0 and 1.0
    pub quality: f32,
}

/// Parse an `Accept-Language` header.
///
/// Returns the language ranges ordered by quality, highest first. Ranges
/// with equal quality keep the order in which the client declared them.
/// A zero quality counts as a missing one (1.0).
///
/// The whole header must match the grammar. Any stray text (an invalid
/// range, a malformed `q=` value, garbage between entries) makes the result
/// empty, so callers never see partially parsed input.
pub fn parse_accept_language(header: &str) -> Vec<AcceptLanguage> {
    let header = header.to_lowercase();
    let mut parsed = Vec::new();
    let mut consumed = 0;

    for caps in accept_language_regex().captures_iter(&header) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        // The next entry must begin exactly where the previous one ended
        if whole.start() != consumed {
            return Vec::new();
        }
        consumed = whole.end();

        let tag = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let quality = match caps.get(2) {
            Some(q) => match q.as_str().parse::<f32>() {
                Ok(q) if q == 0.0 => 1.0,
                Ok(q) => q,
                Err(_) => return Vec::new(),
            },
            None => 1.0,
        };

        parsed.push(AcceptLanguage {
            tag: tag.to_string(),
            quality,
        });

        if consumed == header.len() {
            break;
        }
    }

    if consumed != header.len() {
        return Vec::new();
    }

    // Stable sort keeps declaration order for equal qualities
    parsed.sort_by(|a, b| b.quality.total_cmp(&a.quality));
    parsed
}

fn accept_language_regex() -> &'static Regex {
    ACCEPT_LANGUAGE_REGEX.get_or_init(|| {
        Regex::new(
            r"(?x)
            ([A-Za-z]{1,8}(?:-[A-Za-z0-9]{1,8})*|\*)       # en, en-au, x-y-z, es-419, *
            (?:\s*;\s*q=(0(?:\.\d{0,3})?|1(?:\.0{0,3})?))?  # optional q=1.00, q=0.8
            (?:\s*,\s*|$)                                   # entry separator
            ",
        )
        .expect("accept-language regex is valid")
    })
}
