//! Export binary - dumps rendered wiki documents to JSON files
//!
//! Usage:
//!   cargo run --bin export -- /en-US/docs/Web en-US/CSS   # Export documents by path
//!   cargo run --bin export -- --all                       # Export every stale document
//!
//! Options:
//!   --all              Export all documents not rendered within --min-age
//!   --min-age SECS     Skip documents rendered less than SECS ago (defaults to EXPORT_MIN_AGE_SECS)
//!   --baseurl URL      Base URL for document links (defaults to SITE_URL)
//!   --outdir DIR       Output directory (defaults to EXPORT_OUTDIR)
//!   --force            Overwrite documents that were already exported
//!
//! Environment variables:
//! - EXPORT_CATALOG (defaults to data/documents.json)

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use wiki_locale::config::Config;
use wiki_locale::export::{run_export, CatalogStore, DocumentStore, ExportOptions, ExportSelection};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("wiki_locale=info".parse()?),
        )
        .init();

    let config = Config::from_env()?;

    let mut all = false;
    let mut force = false;
    let mut min_age_secs = config.export_min_age_secs;
    let mut base_url = config.site_url.clone();
    let mut outdir = PathBuf::from(&config.export_outdir);
    let mut paths = Vec::new();

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--all" => all = true,
            "--force" => force = true,
            "--min-age" => {
                let value = args.next().context("--min-age needs a value")?;
                min_age_secs = value
                    .parse()
                    .context(format!("--min-age is not a number: {}", value))?;
            }
            "--baseurl" => base_url = args.next().context("--baseurl needs a value")?,
            "--outdir" => outdir = PathBuf::from(args.next().context("--outdir needs a value")?),
            flag if flag.starts_with("--") => bail!("Unknown option: {}", flag),
            _ => paths.push(arg.clone()),
        }
    }

    let store = CatalogStore::load(Path::new(&config.export_catalog))?;
    info!("Loaded {} documents from {}", store.len(), config.export_catalog);
    let store: Arc<dyn DocumentStore> = Arc::new(store);

    let selection = if all {
        let min_age = i64::try_from(min_age_secs).context("--min-age is too large")?;
        ExportSelection::All {
            min_age: chrono::Duration::seconds(min_age),
        }
    } else {
        ExportSelection::Paths(paths)
    };

    let options = ExportOptions {
        outdir,
        base_url,
        force,
        ensure_contributors: false,
    };

    let summary = run_export(store, selection, options).await?;
    info!(
        "✓ Export finished: {} created, {} skipped, {} failed",
        summary.created, summary.skipped, summary.failed
    );

    Ok(())
}
