//! Internationalization (i18n) module: request-language negotiation.
//!
//! All locale resolution for the wiki lives here. A single `LocaleResolver`
//! is built at startup from static `LocaleSettings` and shared with request
//! handlers.
//!
//! # Architecture
//!
//! - `language`: Internal/external code casing and tag syntax
//! - `registry`: Locale settings and the ordered supported-locale table
//! - `accept`: `Accept-Language` header parsing
//! - `resolver`: Variant resolution behind a bounded LRU cache
//! - `request`: Path, cookie and header based language selection
//! - `metrics`: Resolution counters
//!
//! # Example
//!
//! ```rust,ignore
//! use wiki_locale::i18n::{LocaleResolver, LocaleSettings, RequestInfo};
//!
//! let resolver = LocaleResolver::new(LocaleSettings::wiki_defaults())?;
//!
//! // fr-FR is not supported, the generic fr is
//! assert_eq!(resolver.resolve_variant("fr-FR")?, "fr");
//!
//! let request = RequestInfo::new("/docs/Web").with_accept_language("de;q=0.8");
//! assert_eq!(resolver.select_language(&request), "de");
//! ```

mod accept;
mod language;
mod metrics;
mod registry;
mod request;
mod resolver;

pub use accept::{parse_accept_language, AcceptLanguage};
pub use language::{generic_prefix, is_valid_language_code, path_prefix, CodeCasing};
pub use metrics::{MetricsReport, ResolverMetrics};
pub use registry::{LanguageEntry, LocaleSettings, SupportedLocales, DEFAULT_CACHE_CAPACITY};
pub use request::{ActiveLanguage, LanguageRequest, RequestInfo};
pub use resolver::{InstalledLocales, LanguageAvailability, LocaleError, LocaleResolver};
