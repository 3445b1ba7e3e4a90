//! Integration tests for the wiki locale library
//!
//! These tests exercise the public API end to end: locale resolution with
//! the default wiki table, request language selection, and the export
//! command writing to a temporary directory.

use proptest::prelude::*;
use std::sync::Arc;
use tempfile::TempDir;

use wiki_locale::export::{run_export, CatalogStore, DocumentStore, ExportOptions, ExportSelection};
use wiki_locale::i18n::{LocaleError, LocaleResolver, LocaleSettings, RequestInfo};

// ==================== Test Helpers ====================

fn wiki_resolver() -> LocaleResolver {
    LocaleResolver::new(LocaleSettings::wiki_defaults()).expect("defaults are valid")
}

fn regional_resolver(capacity: usize) -> LocaleResolver {
    let settings = LocaleSettings::with_languages(
        "en-US",
        [
            ("en-US", "English (US)"),
            ("fr-CA", "Français (Canada)"),
            ("es", "Español"),
            ("zh-CN", "中文 (简体)"),
        ],
    )
    .with_alias("es", "zh-CN")
    .with_cache_capacity(capacity);
    LocaleResolver::new(settings).expect("settings are valid")
}

// ==================== Resolution Tests ====================

#[test]
fn test_every_default_locale_resolves_to_itself() {
    let resolver = wiki_resolver();
    for lang in resolver.supported_locales_external().to_vec() {
        let internal = resolver.to_internal(&lang.code);
        assert_eq!(resolver.resolve_variant(&internal).unwrap(), lang.code);
        assert_eq!(resolver.resolve_variant(&lang.code).unwrap(), lang.code);
    }
}

#[test]
fn test_default_aliases() {
    let resolver = wiki_resolver();
    assert_eq!(resolver.resolve_variant("cn").unwrap(), "zh-CN");
    assert_eq!(resolver.resolve_variant("zh-Hant").unwrap(), "zh-TW");
    assert_eq!(resolver.resolve_variant("zh_CN").unwrap(), "zh-CN");
}

#[test]
fn test_default_fallbacks() {
    let resolver = wiki_resolver();
    assert_eq!(resolver.resolve_variant("zh-CHS").unwrap(), "zh-CN");
    assert_eq!(resolver.resolve_variant("zh-HK").unwrap(), "zh-TW");
}

#[test]
fn test_default_generic_and_widening() {
    let resolver = wiki_resolver();
    assert_eq!(resolver.resolve_variant("de-AT").unwrap(), "de");
    assert_eq!(resolver.resolve_variant("en").unwrap(), "en-US");
    assert_eq!(resolver.resolve_variant("en-GB").unwrap(), "en-US");
    assert_eq!(resolver.resolve_variant("sv").unwrap(), "sv-SE");
}

#[test]
fn test_alias_wins_over_supported_code() {
    let resolver = regional_resolver(1000);
    assert_eq!(resolver.resolve_variant("es").unwrap(), "zh-CN");
}

#[test]
fn test_regional_widening_case_insensitive() {
    let resolver = regional_resolver(1000);
    assert_eq!(resolver.resolve_variant("fr-FR").unwrap(), "fr-CA");
    assert_eq!(resolver.resolve_variant("FR-fr").unwrap(), "fr-CA");
}

#[test]
fn test_empty_and_unknown_not_supported() {
    let resolver = regional_resolver(1000);
    assert_eq!(
        resolver.resolve_variant(""),
        Err(LocaleError::NotSupported(String::new()))
    );
    assert!(matches!(
        resolver.resolve_variant("tlh"),
        Err(LocaleError::NotSupported(tag)) if tag == "tlh"
    ));
}

// ==================== Selection Tests ====================

#[test]
fn test_path_locale_beats_cookie_locale() {
    let resolver = wiki_resolver();
    let request = RequestInfo::new("/ja/docs/Web/API")
        .with_cookie("preferredlocale", "fr")
        .with_accept_language("de");
    assert_eq!(resolver.select_language(&request), "ja");
}

#[test]
fn test_three_segment_path_yields_to_cookie() {
    let resolver = wiki_resolver();
    assert_eq!(wiki_locale::i18n::path_prefix("/zh-hant-tw/docs"), None);

    let request = RequestInfo::new("/zh-hant-tw/docs/Web").with_cookie("preferredlocale", "de");
    assert_eq!(resolver.select_language(&request), "de");
}

#[test]
fn test_variant_path_prefix_extracted() {
    assert_eq!(wiki_locale::i18n::path_prefix("/sr@latin/docs"), Some("sr@latin"));

    let request = RequestInfo::new("/sr@latin/docs").with_cookie("preferredlocale", "de");
    assert_eq!(wiki_resolver().select_language(&request), "de");
}

#[test]
fn test_wildcard_header_falls_back_to_default() {
    let resolver = wiki_resolver();
    let request = RequestInfo::new("/docs/Web").with_accept_language("*");
    assert_eq!(resolver.select_language(&request), "en-US");
}

#[test]
fn test_bare_request_returns_default() {
    let resolver = wiki_resolver();
    assert_eq!(resolver.select_language(&RequestInfo::new("/")), "en-US");
}

#[test]
fn test_configured_default_and_cookie_name() {
    let mut settings = LocaleSettings::wiki_defaults().with_cookie_name("lang");
    settings.default_language = "fr".to_string();
    let resolver = LocaleResolver::new(settings).unwrap();

    let request = RequestInfo::new("/docs").with_cookie("lang", "ko");
    assert_eq!(resolver.select_language(&request), "ko");

    let request = RequestInfo::new("/docs").with_cookie("preferredlocale", "ko");
    assert_eq!(resolver.select_language(&request), "fr");
}

#[test]
fn test_header_picks_best_supported_language() {
    let resolver = wiki_resolver();
    let request = RequestInfo::new("/docs")
        .with_accept_language("tlh;q=1.0, pt-AO;q=0.9, ru;q=0.8");
    assert_eq!(resolver.select_language(&request), "pt-PT");
}

// ==================== Property Tests ====================

proptest! {
    #[test]
    fn prop_cache_never_exceeds_capacity(tags in prop::collection::vec("[a-z]{1,8}(-[a-z0-9]{1,8}){0,2}", 1..200)) {
        let resolver = regional_resolver(16);
        for tag in &tags {
            let _ = resolver.resolve_variant(tag);
            prop_assert!(resolver.cache_len() <= 16);
        }
    }

    #[test]
    fn prop_resolution_is_idempotent(tag in "[A-Za-z]{1,8}(-[A-Za-z0-9]{1,8}){0,2}") {
        let resolver = regional_resolver(4);
        let first = resolver.resolve_variant(&tag);
        let second = resolver.resolve_variant(&tag);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_selection_always_returns_supported_locale(
        path in "/[a-zA-Z-]{0,12}/.{0,10}",
        cookie in ".{0,16}",
        header in ".{0,40}",
    ) {
        let resolver = wiki_resolver();
        let request = RequestInfo::new(&path)
            .with_cookie("preferredlocale", &cookie)
            .with_accept_language(&header);
        let selected = resolver.select_language(&request);
        prop_assert!(resolver
            .supported_locales_external()
            .iter()
            .any(|lang| lang.code == selected));
    }
}

// ==================== Export Tests ====================

#[tokio::test]
async fn test_export_catalog_end_to_end() {
    let dir = TempDir::new().unwrap();
    let catalog = dir.path().join("documents.json");
    std::fs::write(
        &catalog,
        r#"[
            {"id": 1, "locale": "en-US", "slug": "Web/CSS", "title": "CSS",
             "body_html": "<p>CSS</p>", "quick_links_html": "<ol></ol>",
             "modified": "2019-06-01T00:00:00Z",
             "contributors": ["alice"]},
            {"id": 2, "locale": "de", "slug": "Web/HTML", "title": "HTML",
             "modified": "2019-06-02T00:00:00Z"}
        ]"#,
    )
    .unwrap();

    let store: Arc<dyn DocumentStore> = Arc::new(CatalogStore::load(&catalog).unwrap());
    let outdir = dir.path().join("out");
    let options = ExportOptions {
        outdir: outdir.clone(),
        base_url: "https://developer.example.org".to_string(),
        force: false,
        ensure_contributors: false,
    };

    let summary = run_export(
        Arc::clone(&store),
        ExportSelection::Paths(vec!["/en-US/docs/Web/CSS".to_string()]),
        options.clone(),
    )
    .await
    .unwrap();
    assert_eq!(summary.created, 1);

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(outdir.join("Web/CSS.json")).unwrap())
            .unwrap();
    assert_eq!(written["legacy"], true);
    assert_eq!(written["title"], "CSS");
    assert_eq!(written["mdn_url"], "https://developer.example.org/en-US/docs/Web/CSS");
    assert_eq!(written["contributors"], serde_json::json!(["alice"]));

    // Second bulk run skips the file already written and exports the other one
    let summary = run_export(
        store,
        ExportSelection::All {
            min_age: chrono::Duration::seconds(600),
        },
        options,
    )
    .await
    .unwrap();
    assert_eq!(summary.created, 1);
    assert_eq!(summary.skipped, 1);
    assert!(outdir.join("Web/HTML.json").is_file());
}
