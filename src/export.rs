//! Export rendered wiki documents to JSON files.
//!
//! Each document becomes `<outdir>/<slug>.json` holding the rendered body,
//! quick links, title, absolute URL and contributor names. Bulk exports
//! split the document ids into chunks that run one after another in a
//! background task.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fs;
use std::ops::AddAssign;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Number of chunks a bulk export is split into.
pub const EXPORT_CHUNKS: usize = 5;

/// A wiki document as stored in the catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct Document {
    pub id: i64,
    pub locale: String,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub body_html: String,
    #[serde(default)]
    pub quick_links_html: String,
    #[serde(default)]
    pub is_template: bool,
    #[serde(default)]
    pub is_redirect: bool,
    #[serde(default)]
    pub deleted: bool,
    pub modified: DateTime<Utc>,
    #[serde(default)]
    pub last_rendered_at: Option<DateTime<Utc>>,
    /// Cached contributor usernames, `None` when not computed yet
    #[serde(default)]
    pub contributors: Option<Vec<String>>,
    /// Revision authors, newest revision first
    #[serde(default)]
    pub revision_creators: Vec<String>,
}

impl Document {
    /// Site-relative URL of the document (e.g., "/en-US/docs/Web/CSS").
    pub fn absolute_url(&self) -> String {
        format!("/{}/docs/{}", self.locale, self.slug)
    }
}

/// JSON written for each exported document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedDocument {
    pub legacy: bool,
    pub related_content: String,
    pub title: String,
    pub mdn_url: String,
    pub body: String,
    pub contributors: Vec<String>,
}

/// Read access to documents.
pub trait DocumentStore: Send + Sync {
    /// Look up a document by locale and slug.
    fn get(&self, locale: &str, slug: &str) -> Result<Document>;

    /// Look up a document by id.
    fn get_by_id(&self, id: i64) -> Result<Document>;

    /// Ids of documents never rendered or rendered before `cutoff`, most
    /// recently modified first.
    fn stale_ids(&self, cutoff: DateTime<Utc>) -> Result<Vec<i64>>;

    /// Contributor usernames of a document.
    ///
    /// Returns the cached list when present. On a miss the list is computed
    /// only if `fetch_on_miss` is set, otherwise it is empty.
    fn contributors(&self, id: i64, fetch_on_miss: bool) -> Result<Vec<String>>;
}

/// Document store backed by a JSON catalog file.
#[derive(Debug, Clone, Default)]
pub struct CatalogStore {
    documents: Vec<Document>,
}

impl CatalogStore {
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    /// Load a catalog file holding a JSON array of documents.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .context(format!("Failed to read document catalog {}", path.display()))?;
        let documents: Vec<Document> = serde_json::from_str(&content)
            .context(format!("Failed to parse document catalog {}", path.display()))?;
        Ok(Self::new(documents))
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl DocumentStore for CatalogStore {
    fn get(&self, locale: &str, slug: &str) -> Result<Document> {
        self.documents
            .iter()
            .find(|doc| doc.locale == locale && doc.slug == slug)
            .cloned()
            .context(format!("Document not found: {}/{}", locale, slug))
    }

    fn get_by_id(&self, id: i64) -> Result<Document> {
        self.documents
            .iter()
            .find(|doc| doc.id == id)
            .cloned()
            .context(format!("Document not found: id {}", id))
    }

    fn stale_ids(&self, cutoff: DateTime<Utc>) -> Result<Vec<i64>> {
        let mut stale: Vec<&Document> = self
            .documents
            .iter()
            .filter(|doc| doc.last_rendered_at.map_or(true, |rendered| rendered < cutoff))
            .collect();
        stale.sort_by(|a, b| b.modified.cmp(&a.modified));
        Ok(stale.into_iter().map(|doc| doc.id).collect())
    }

    fn contributors(&self, id: i64, fetch_on_miss: bool) -> Result<Vec<String>> {
        let doc = self.get_by_id(id)?;
        if let Some(contributors) = doc.contributors {
            return Ok(contributors);
        }
        if !fetch_on_miss {
            return Ok(Vec::new());
        }

        let mut contributors: Vec<String> = Vec::new();
        for creator in doc.revision_creators {
            if !contributors.contains(&creator) {
                contributors.push(creator);
            }
        }
        Ok(contributors)
    }
}

/// Settings shared by every document in an export run.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub outdir: PathBuf,
    pub base_url: String,
    pub force: bool,
    pub ensure_contributors: bool,
}

/// What `export_document` did with a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Created(PathBuf),
    Skipped(PathBuf),
}

/// Counters for an export run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub created: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl ExportSummary {
    fn record(&mut self, outcome: &ExportOutcome) {
        match outcome {
            ExportOutcome::Created(_) => self.created += 1,
            ExportOutcome::Skipped(_) => self.skipped += 1,
        }
    }
}

impl AddAssign for ExportSummary {
    fn add_assign(&mut self, other: Self) {
        self.created += other.created;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

/// Which documents an export run covers.
#[derive(Debug, Clone)]
pub enum ExportSelection {
    /// Every document not rendered within `min_age`
    All { min_age: Duration },
    /// Documents given by path, like `/en-US/docs/Web`
    Paths(Vec<String>),
}

/// Write one document to `<outdir>/<slug>.json`.
///
/// An existing file is kept unless `options.force` is set. Templates,
/// redirects and deleted documents are refused.
pub fn export_document(
    store: &dyn DocumentStore,
    doc: &Document,
    options: &ExportOptions,
) -> Result<ExportOutcome> {
    let destination = destination_path(&options.outdir, &doc.slug)?;
    if destination.is_file() && !options.force {
        info!("Already created {}", destination.display());
        return Ok(ExportOutcome::Skipped(destination));
    }

    if doc.is_template {
        bail!("Refusing to export template {}", doc.absolute_url());
    }
    if doc.is_redirect {
        bail!("Refusing to export redirect {}", doc.absolute_url());
    }
    if doc.deleted {
        bail!("Refusing to export deleted document {}", doc.absolute_url());
    }

    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)
            .context(format!("Failed to create directory {}", parent.display()))?;
    }

    let contributors = store.contributors(doc.id, options.ensure_contributors)?;
    let mdn_url = Url::parse(&options.base_url)
        .context(format!("Invalid base URL: {}", options.base_url))?
        .join(&doc.absolute_url())
        .context(format!("Failed to build URL for {}", doc.absolute_url()))?;

    let exported = ExportedDocument {
        legacy: true,
        related_content: doc.quick_links_html.clone(),
        title: doc.title.clone(),
        mdn_url: mdn_url.to_string(),
        body: doc.body_html.clone(),
        contributors,
    };

    let json = serde_json::to_string_pretty(&exported)
        .context("Failed to serialize exported document")?;
    fs::write(&destination, json)
        .context(format!("Failed to write {}", destination.display()))?;

    info!("Created {}", destination.display());
    Ok(ExportOutcome::Created(destination))
}

/// Export the documents of one chunk, logging and counting failures.
pub fn export_document_chunk(
    store: &dyn DocumentStore,
    ids: &[i64],
    options: &ExportOptions,
) -> ExportSummary {
    let mut summary = ExportSummary::default();
    for &id in ids {
        let result = store
            .get_by_id(id)
            .and_then(|doc| export_document(store, &doc, options));
        match result {
            Ok(outcome) => summary.record(&outcome),
            Err(e) => {
                warn!("Failed to export document {}: {:#}", id, e);
                summary.failed += 1;
            }
        }
    }
    summary
}

/// Split ids into `parts` chunks of equal size (the last may be shorter).
pub fn chunk_ids(ids: &[i64], parts: usize) -> Vec<Vec<i64>> {
    if ids.is_empty() || parts == 0 {
        return Vec::new();
    }
    let size = ids.len().div_ceil(parts);
    ids.chunks(size).map(<[i64]>::to_vec).collect()
}

/// Run chunks one after another in a background task.
///
/// A chunk that panics stops the chain; the remaining chunks are not run.
pub fn spawn_export_chain(
    store: Arc<dyn DocumentStore>,
    chunks: Vec<Vec<i64>>,
    options: ExportOptions,
) -> JoinHandle<ExportSummary> {
    tokio::spawn(async move {
        let total = chunks.len();
        let mut summary = ExportSummary::default();

        for (index, chunk) in chunks.into_iter().enumerate() {
            let store = Arc::clone(&store);
            let options = options.clone();
            let result = tokio::task::spawn_blocking(move || {
                export_document_chunk(store.as_ref(), &chunk, &options)
            })
            .await;

            match result {
                Ok(chunk_summary) => {
                    info!(
                        "Export chunk {}/{} done: {} created, {} skipped, {} failed",
                        index + 1,
                        total,
                        chunk_summary.created,
                        chunk_summary.skipped,
                        chunk_summary.failed
                    );
                    summary += chunk_summary;
                }
                Err(e) => {
                    error!("Export chunk {}/{} aborted, stopping chain: {}", index + 1, total, e);
                    break;
                }
            }
        }

        summary
    })
}

/// Split a document path into `(locale, slug)`.
///
/// Accepts `/en-US/docs/CSS`, `/en-US/CSS` and `en-US/CSS`.
pub fn parse_document_path(path: &str) -> Result<(String, String)> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let (locale, rest) = trimmed.split_once('/').unwrap_or((trimmed, ""));
    let slug = match rest.split_once('/') {
        Some(("docs", tail)) => tail,
        None if rest == "docs" => "",
        _ => rest,
    };

    if locale.is_empty() || slug.is_empty() {
        bail!("Invalid document path: {}", path);
    }
    Ok((locale.to_string(), slug.to_string()))
}

/// Export the selected documents.
pub async fn run_export(
    store: Arc<dyn DocumentStore>,
    selection: ExportSelection,
    options: ExportOptions,
) -> Result<ExportSummary> {
    match selection {
        ExportSelection::All { min_age } => {
            let cutoff = Utc::now() - min_age;
            let ids = store.stale_ids(cutoff)?;
            info!("Exporting {} documents not rendered since {}", ids.len(), cutoff);

            let chunks = chunk_ids(&ids, EXPORT_CHUNKS);
            let summary = spawn_export_chain(store, chunks, options)
                .await
                .context("Export chain task failed")?;
            Ok(summary)
        }
        ExportSelection::Paths(paths) => {
            if paths.is_empty() {
                bail!("Need at least one document path to export");
            }

            let mut summary = ExportSummary::default();
            for path in &paths {
                let (locale, slug) = parse_document_path(path)?;
                let doc = store.get(&locale, &slug)?;
                info!("Exporting {} ({})", doc.title, doc.absolute_url());
                let outcome = export_document(store.as_ref(), &doc, &options)?;
                summary.record(&outcome);
            }
            Ok(summary)
        }
    }
}

fn destination_path(outdir: &Path, slug: &str) -> Result<PathBuf> {
    let relative = PathBuf::from(format!("{}.json", slug));
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        bail!("Refusing to export slug outside the output directory: {}", slug);
    }
    Ok(outdir.join(relative))
}
