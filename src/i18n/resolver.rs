//! Locale variant resolution.
//!
//! `LocaleResolver` maps an arbitrary, possibly attacker-supplied language
//! tag to one of the supported locales. Results are kept in a bounded LRU
//! cache keyed by the raw tag. The bound is a memory limit against
//! high-cardinality header values and always exists.

use crate::i18n::language::{generic_prefix, is_valid_language_code, CodeCasing};
use crate::i18n::metrics::{MetricsReport, ResolverMetrics};
use crate::i18n::registry::{LanguageEntry, LocaleSettings, SupportedLocales};
use anyhow::{bail, Context, Result};
use lru::LruCache;
use std::collections::HashSet;
use std::iter;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, OnceLock};
use thiserror::Error;
use tracing::debug;

/// Errors returned by variant resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocaleError {
    /// No supported locale matches the requested tag
    #[error("Language code not supported: '{0}'")]
    NotSupported(String),
}

/// Predicate telling whether locale data for a code is installed and active.
pub trait LanguageAvailability: Send + Sync {
    /// `code` is always in internal (lower case) form.
    fn is_available(&self, code: &str) -> bool;
}

/// Availability backed by an installed-locale set.
///
/// A code is available when it is a syntactically valid language code and,
/// if a set was given, a member of it.
#[derive(Debug, Clone, Default)]
pub struct InstalledLocales {
    installed: Option<HashSet<String>>,
}

impl InstalledLocales {
    /// Every syntactically valid code counts as installed.
    pub fn all() -> Self {
        Self { installed: None }
    }

    /// Only the given codes count as installed.
    pub fn only<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            installed: Some(
                codes
                    .into_iter()
                    .map(|c| CodeCasing::to_internal(c.as_ref()))
                    .collect(),
            ),
        }
    }
}

impl LanguageAvailability for InstalledLocales {
    fn is_available(&self, code: &str) -> bool {
        is_valid_language_code(code)
            && self
                .installed
                .as_ref()
                .map_or(true, |installed| installed.contains(code))
    }
}

/// Long-lived resolver, constructed once at startup and shared by handlers.
pub struct LocaleResolver {
    settings: LocaleSettings,
    casing: CodeCasing,
    availability: Box<dyn LanguageAvailability>,
    supported: OnceLock<SupportedLocales>,
    cache: Mutex<LruCache<String, Option<String>>>,
    cache_capacity: NonZeroUsize,
    metrics: ResolverMetrics,
}

impl LocaleResolver {
    /// Create a resolver treating every supported locale as installed.
    pub fn new(settings: LocaleSettings) -> Result<Self> {
        Self::with_availability(settings, Box::new(InstalledLocales::all()))
    }

    /// Create a resolver with a custom availability check.
    ///
    /// Fails when the supported list is empty, the default language is not
    /// supported, or the cache capacity is zero.
    pub fn with_availability(
        mut settings: LocaleSettings,
        availability: Box<dyn LanguageAvailability>,
    ) -> Result<Self> {
        if settings.languages.is_empty() {
            bail!("No supported languages configured");
        }

        let default_code = CodeCasing::to_internal(&settings.default_language);
        if !settings
            .languages
            .iter()
            .any(|lang| CodeCasing::to_internal(&lang.code) == default_code)
        {
            bail!(
                "Default language '{}' is not a supported language",
                settings.default_language
            );
        }

        let cache_capacity = NonZeroUsize::new(settings.cache_capacity)
            .context("Locale cache capacity must be greater than zero")?;

        let casing = CodeCasing::new(settings.url_map.clone());
        settings.default_language = casing.to_external(&default_code);

        Ok(Self {
            casing,
            settings,
            availability,
            supported: OnceLock::new(),
            cache: Mutex::new(LruCache::new(cache_capacity)),
            cache_capacity,
            metrics: ResolverMetrics::new(),
        })
    }

    /// Static settings this resolver was built from.
    pub fn settings(&self) -> &LocaleSettings {
        &self.settings
    }

    /// Convert an internal code to the external form.
    pub fn to_external(&self, code: &str) -> String {
        self.casing.to_external(code)
    }

    /// Convert any code to the internal form.
    pub fn to_internal(&self, code: &str) -> String {
        CodeCasing::to_internal(code)
    }

    /// Supported locales keyed by internal code, computed on first use.
    pub fn supported_locales_internal(&self) -> &SupportedLocales {
        self.supported
            .get_or_init(|| SupportedLocales::from_languages(&self.settings.languages))
    }

    /// Supported locales in external form, exactly as configured.
    pub fn supported_locales_external(&self) -> &[LanguageEntry] {
        &self.settings.languages
    }

    /// Resolve a raw language tag to a supported locale in external form.
    ///
    /// Lookup order: alias, exact code, configured fallbacks, generic
    /// language, then the first supported sibling region. Results (including
    /// misses) are cached by the raw tag.
    pub fn resolve_variant(&self, raw: &str) -> Result<String, LocaleError> {
        if raw.is_empty() {
            self.metrics.record_not_supported();
            return Err(LocaleError::NotSupported(String::new()));
        }

        let cached = self.lock_cache().get(raw).cloned();
        let resolved = match cached {
            Some(resolved) => {
                self.metrics.record_cache_hit();
                resolved
            }
            None => {
                self.metrics.record_cache_miss();
                let resolved = self.lookup(raw);
                let mut cache = self.lock_cache();
                if cache.len() == cache.cap().get() && !cache.contains(raw) {
                    debug!("Locale cache full ({} entries), evicting oldest", cache.len());
                }
                cache.put(raw.to_string(), resolved.clone());
                resolved
            }
        };

        resolved.ok_or_else(|| {
            self.metrics.record_not_supported();
            LocaleError::NotSupported(raw.to_string())
        })
    }

    /// Number of entries currently cached.
    pub fn cache_len(&self) -> usize {
        self.lock_cache().len()
    }

    /// Maximum number of cached entries.
    pub fn cache_capacity(&self) -> usize {
        self.cache_capacity.get()
    }

    /// Snapshot of the resolution counters.
    pub fn metrics_report(&self) -> MetricsReport {
        self.metrics.report(self.cache_len(), self.cache_capacity())
    }

    fn lookup(&self, raw: &str) -> Option<String> {
        let code = CodeCasing::to_internal(raw);

        if let Some(alias) = self.settings.aliases.get(&code) {
            debug!("Locale '{}' resolved through alias '{}'", raw, alias);
            return Some(self.casing.to_external(alias));
        }

        let generic = generic_prefix(&code);
        let fallbacks = self
            .settings
            .fallbacks
            .get(&code)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let supported = self.supported_locales_internal();

        let candidates = iter::once(code.as_str())
            .chain(fallbacks.iter().map(String::as_str))
            .chain(iter::once(generic));
        for candidate in candidates {
            if supported.contains(candidate) && self.availability.is_available(candidate) {
                return Some(self.casing.to_external(candidate));
            }
        }

        // Regional widening: fr-fr is not supported, but fr-ca is
        let sibling_prefix = format!("{}-", generic);
        let sibling = supported
            .codes()
            .find(|supported_code| supported_code.starts_with(&sibling_prefix))
            .map(|supported_code| self.casing.to_external(supported_code));

        if sibling.is_none() {
            debug!("No supported locale for '{}'", raw);
        }
        sibling
    }

    fn lock_cache(&self) -> MutexGuard<'_, LruCache<String, Option<String>>> {
        // A panic elsewhere cannot leave the LRU half-updated
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn settings() -> LocaleSettings {
        LocaleSettings::with_languages(
            "en-US",
            [
                ("en-US", "English (US)"),
                ("fr-CA", "Français (Canada)"),
                ("de", "Deutsch"),
                ("pt-PT", "Português (Europeu)"),
                ("pt-BR", "Português (do Brasil)"),
                ("zh-CN", "中文 (简体)"),
                ("zh-TW", "正體中文 (繁體)"),
            ],
        )
        .with_alias("cn", "zh-CN")
        .with_alias("de", "zh-TW")
        .with_fallback("zh-hk", &["zh-tw"])
    }

    fn resolver() -> LocaleResolver {
        LocaleResolver::new(settings()).expect("settings are valid")
    }

    // ==================== Construction Tests ====================

    #[test]
    fn test_new_rejects_empty_languages() {
        let settings = LocaleSettings::with_languages("en-US", Vec::<(String, String)>::new());
        assert!(LocaleResolver::new(settings).is_err());
    }

    #[test]
    fn test_new_rejects_unsupported_default() {
        let settings = LocaleSettings::with_languages("es", [("en-US", "English")]);
        let err = LocaleResolver::new(settings).err().expect("should fail");
        assert!(err.to_string().contains("not a supported language"));
    }

    #[test]
    fn test_new_rejects_zero_capacity() {
        let settings = settings().with_cache_capacity(0);
        assert!(LocaleResolver::new(settings).is_err());
    }

    // ==================== Supported Locale Tests ====================

    #[test]
    fn test_supported_locales_internal_is_memoized() {
        let resolver = resolver();
        let first = resolver.supported_locales_internal();
        let second = resolver.supported_locales_internal();
        assert!(std::ptr::eq(first, second));
        assert!(first.contains("en-us"));
    }

    #[test]
    fn test_supported_locales_external_matches_configuration() {
        let resolver = resolver();
        let codes: Vec<&str> = resolver
            .supported_locales_external()
            .iter()
            .map(|lang| lang.code.as_str())
            .collect();
        assert_eq!(
            codes,
            vec!["en-US", "fr-CA", "de", "pt-PT", "pt-BR", "zh-CN", "zh-TW"]
        );
    }

    // ==================== Resolution Tests ====================

    #[test]
    fn test_exact_match_any_case() {
        let resolver = resolver();
        assert_eq!(resolver.resolve_variant("en-US").unwrap(), "en-US");
        assert_eq!(resolver.resolve_variant("en-us").unwrap(), "en-US");
        assert_eq!(resolver.resolve_variant("PT-br").unwrap(), "pt-BR");
    }

    #[test]
    fn test_every_supported_code_resolves_to_itself() {
        let resolver = resolver();
        let codes: Vec<String> = resolver
            .supported_locales_internal()
            .codes()
            .map(String::from)
            .collect();
        for code in codes {
            if code == "de" {
                continue; // aliased away in this fixture
            }
            assert_eq!(resolver.resolve_variant(&code).unwrap(), resolver.to_external(&code));
        }
    }

    #[test]
    fn test_empty_input_not_supported() {
        let resolver = resolver();
        assert_eq!(
            resolver.resolve_variant(""),
            Err(LocaleError::NotSupported(String::new()))
        );
        assert_eq!(resolver.cache_len(), 0);
    }

    #[test]
    fn test_alias_match() {
        let resolver = resolver();
        assert_eq!(resolver.resolve_variant("cn").unwrap(), "zh-CN");
        assert_eq!(resolver.resolve_variant("CN").unwrap(), "zh-CN");
    }

    #[test]
    fn test_alias_short_circuits_supported_code() {
        let resolver = resolver();
        assert_eq!(resolver.resolve_variant("de").unwrap(), "zh-TW");
    }

    #[test]
    fn test_fallback_table_consulted_before_generic() {
        let resolver = resolver();
        // zh-hk -> zh-tw via fallback; widening alone would pick zh-CN
        assert_eq!(resolver.resolve_variant("zh-HK").unwrap(), "zh-TW");
    }

    #[test]
    fn test_generic_prefix_match() {
        let settings = LocaleSettings::with_languages("en-US", [("en-US", "English"), ("fr", "Français")]);
        let resolver = LocaleResolver::new(settings).unwrap();
        assert_eq!(resolver.resolve_variant("fr-BE").unwrap(), "fr");
    }

    #[test]
    fn test_regional_widening() {
        let resolver = resolver();
        assert_eq!(resolver.resolve_variant("fr-FR").unwrap(), "fr-CA");
        assert_eq!(resolver.resolve_variant("fr").unwrap(), "fr-CA");
    }

    #[test]
    fn test_regional_widening_uses_configured_order() {
        let resolver = resolver();
        assert_eq!(resolver.resolve_variant("pt-AO").unwrap(), "pt-PT");
    }

    #[test]
    fn test_unknown_language_not_supported() {
        let resolver = resolver();
        assert_eq!(
            resolver.resolve_variant("xx-YY"),
            Err(LocaleError::NotSupported("xx-YY".to_string()))
        );
        assert!(resolver.resolve_variant("klingon").is_err());
    }

    #[test]
    fn test_availability_check_skips_uninstalled_candidates() {
        let settings = LocaleSettings::with_languages(
            "en-US",
            [("en-US", "English"), ("es-MX", "Español (MX)"), ("es", "Español")],
        );
        let resolver = LocaleResolver::with_availability(
            settings,
            Box::new(InstalledLocales::only(["en-US", "es"])),
        )
        .unwrap();

        // es-mx is supported but not installed, so the generic candidate wins
        assert_eq!(resolver.resolve_variant("es-MX").unwrap(), "es");
    }

    #[test]
    fn test_availability_rejects_invalid_syntax() {
        let available = InstalledLocales::all();
        assert!(available.is_available("en-us"));
        assert!(!available.is_available("en_us"));
        assert!(!available.is_available(""));
    }

    // ==================== Cache Tests ====================

    #[test]
    fn test_cache_records_hits_and_misses() {
        let resolver = resolver();
        resolver.resolve_variant("fr-FR").unwrap();
        resolver.resolve_variant("fr-FR").unwrap();
        let _ = resolver.resolve_variant("xx");
        let _ = resolver.resolve_variant("xx");

        let report = resolver.metrics_report();
        assert_eq!(report.cache_misses, 2);
        assert_eq!(report.cache_hits, 2);
        assert_eq!(report.not_supported, 2);
        assert_eq!(report.cache_len, 2);
    }

    #[test]
    fn test_cache_is_keyed_by_raw_input() {
        let resolver = resolver();
        resolver.resolve_variant("en-US").unwrap();
        resolver.resolve_variant("en-us").unwrap();
        assert_eq!(resolver.cache_len(), 2);
    }

    #[test]
    fn test_cache_never_exceeds_capacity() {
        let resolver = LocaleResolver::new(settings().with_cache_capacity(8)).unwrap();
        for i in 0..100 {
            let _ = resolver.resolve_variant(&format!("x{}-tag", i));
            assert!(resolver.cache_len() <= 8);
        }
        assert_eq!(resolver.cache_len(), 8);
        assert_eq!(resolver.cache_capacity(), 8);
    }

    #[test]
    fn test_resolution_stable_after_eviction() {
        let resolver = LocaleResolver::new(settings().with_cache_capacity(2)).unwrap();
        let first = resolver.resolve_variant("fr-FR");
        for tag in ["a", "b", "c"] {
            let _ = resolver.resolve_variant(tag);
        }
        assert_eq!(resolver.resolve_variant("fr-FR"), first);
    }

    #[test]
    fn test_concurrent_resolution() {
        let resolver = Arc::new(LocaleResolver::new(settings().with_cache_capacity(16)).unwrap());

        std::thread::scope(|scope| {
            for worker in 0..8 {
                let resolver = Arc::clone(&resolver);
                scope.spawn(move || {
                    for i in 0..200 {
                        let _ = resolver.resolve_variant(&format!("w{}-{}", worker, i));
                        assert_eq!(resolver.resolve_variant("pt-BR").unwrap(), "pt-BR");
                    }
                });
            }
        });

        assert!(resolver.cache_len() <= 16);
    }
}
