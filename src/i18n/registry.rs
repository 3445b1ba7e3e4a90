//! Locale registry: static locale configuration and the supported-locale table.
//!
//! `LocaleSettings` is loaded once at startup and never reloaded. The
//! supported list is kept in configured order, since regional widening picks
//! the first matching sibling.

use crate::config::Config;
use crate::i18n::language::CodeCasing;
use serde::Serialize;
use std::collections::HashMap;

/// Default maximum number of cached resolutions.
pub const DEFAULT_CACHE_CAPACITY: usize = 1000;

/// A supported locale in external form with its display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageEntry {
    /// External locale code (e.g., "en-US", "fr")
    pub code: String,

    /// Native display name (e.g., "English (US)", "Français")
    pub name: String,
}

/// Static locale configuration.
#[derive(Debug, Clone)]
pub struct LocaleSettings {
    /// Default locale in external form, returned when negotiation finds nothing
    pub default_language: String,

    /// Cookie holding the user's preferred locale
    pub cookie_name: String,

    /// Supported locales in external form, in configured order
    pub languages: Vec<LanguageEntry>,

    /// Internal -> external casing overrides
    pub url_map: HashMap<String, String>,

    /// Internal -> internal overrides for legacy or over-specific codes
    pub aliases: HashMap<String, String>,

    /// Internal -> ordered internal alternates
    pub fallbacks: HashMap<String, Vec<String>>,

    /// Maximum number of cached resolutions
    pub cache_capacity: usize,
}

impl LocaleSettings {
    /// Build settings from a supported list, deriving the URL map from it.
    ///
    /// Every supported external code whose lower-case form differs gets a
    /// URL map entry, so `to_external(to_internal(code)) == code` holds for
    /// all supported codes.
    pub fn with_languages<I, C, N>(default_language: &str, languages: I) -> Self
    where
        I: IntoIterator<Item = (C, N)>,
        C: Into<String>,
        N: Into<String>,
    {
        let languages: Vec<LanguageEntry> = languages
            .into_iter()
            .map(|(code, name)| LanguageEntry {
                code: code.into(),
                name: name.into(),
            })
            .collect();

        let url_map = languages
            .iter()
            .filter(|lang| CodeCasing::to_internal(&lang.code) != lang.code)
            .map(|lang| (CodeCasing::to_internal(&lang.code), lang.code.clone()))
            .collect();

        Self {
            default_language: default_language.to_string(),
            cookie_name: "preferredlocale".to_string(),
            languages,
            url_map,
            aliases: HashMap::new(),
            fallbacks: HashMap::new(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }

    /// Add an alias `from -> to`, both stored in internal form.
    pub fn with_alias(mut self, from: &str, to: &str) -> Self {
        self.aliases
            .insert(CodeCasing::to_internal(from), CodeCasing::to_internal(to));
        self
    }

    /// Add an ordered fallback list for `code`, stored in internal form.
    pub fn with_fallback(mut self, code: &str, alternates: &[&str]) -> Self {
        self.fallbacks.insert(
            CodeCasing::to_internal(code),
            alternates.iter().map(|c| CodeCasing::to_internal(c)).collect(),
        );
        self
    }

    /// Set the cookie name.
    pub fn with_cookie_name(mut self, name: &str) -> Self {
        self.cookie_name = name.to_string();
        self
    }

    /// Set the resolution cache capacity.
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// The wiki's default locale table.
    pub fn wiki_defaults() -> Self {
        let mut settings = Self::with_languages("en-US", default_languages())
            .with_alias("cn", "zh-CN")
            .with_alias("zh-hans", "zh-CN")
            .with_alias("zh-hant", "zh-TW")
            .with_alias("zh_cn", "zh-CN")
            .with_alias("zh_tw", "zh-TW");

        for (code, alternates) in DEFAULT_FALLBACKS {
            settings = settings.with_fallback(code, alternates);
        }
        settings
    }

    /// The default table with the negotiation knobs taken from `config`.
    pub fn from_config(config: &Config) -> Self {
        let mut settings = Self::wiki_defaults()
            .with_cookie_name(&config.language_cookie_name)
            .with_cache_capacity(config.locale_cache_size);
        settings.default_language = config.language_code.clone();
        settings
    }
}

/// Ordered mapping of supported internal codes to display names.
#[derive(Debug, Clone, Default)]
pub struct SupportedLocales {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl SupportedLocales {
    /// Build the internal view of a configured language list.
    pub fn from_languages(languages: &[LanguageEntry]) -> Self {
        let mut table = Self::default();
        for lang in languages {
            let code = CodeCasing::to_internal(&lang.code);
            if table.index.contains_key(&code) {
                continue;
            }
            table.index.insert(code.clone(), table.entries.len());
            table.entries.push((code, lang.name.clone()));
        }
        table
    }

    /// Check whether `code` (internal form) is supported.
    pub fn contains(&self, code: &str) -> bool {
        self.index.contains_key(code)
    }

    /// Display name of a supported internal code.
    pub fn name(&self, code: &str) -> Option<&str> {
        self.index
            .get(code)
            .map(|&i| self.entries[i].1.as_str())
    }

    /// Internal codes in configured order.
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(code, _)| code.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn default_languages() -> Vec<(&'static str, &'static str)> {
    vec![
        ("en-US", "English (US)"),
        ("ar", "عربي"),
        ("bg", "Български"),
        ("bm", "Bamanankan"),
        ("bn", "বাংলা"),
        ("ca", "Català"),
        ("de", "Deutsch"),
        ("el", "Ελληνικά"),
        ("es", "Español"),
        ("fa", "فارسی"),
        ("fi", "suomi"),
        ("fr", "Français"),
        ("he", "עברית"),
        ("hi-IN", "हिन्दी (भारत)"),
        ("hu", "magyar"),
        ("id", "Bahasa Indonesia"),
        ("it", "Italiano"),
        ("ja", "日本語"),
        ("kab", "Taqbaylit"),
        ("ko", "한국어"),
        ("ms", "Melayu"),
        ("my", "မြန်မာဘာသာ"),
        ("nl", "Nederlands"),
        ("pl", "Polski"),
        ("pt-PT", "Português (Europeu)"),
        ("pt-BR", "Português (do Brasil)"),
        ("ru", "Русский"),
        ("sv-SE", "Svenska"),
        ("th", "ไทย"),
        ("tr", "Türkçe"),
        ("uk", "Українська"),
        ("vi", "Tiếng Việt"),
        ("zh-CN", "中文 (简体)"),
        ("zh-TW", "正體中文 (繁體)"),
    ]
}

const DEFAULT_FALLBACKS: &[(&str, &[&str])] = &[
    ("zh-chs", &["zh-cn"]),
    ("zh-cht", &["zh-tw"]),
    ("zh-hk", &["zh-tw"]),
    ("zh-mo", &["zh-tw"]),
    ("zh-sg", &["zh-cn"]),
    ("zh-my", &["zh-cn"]),
];
