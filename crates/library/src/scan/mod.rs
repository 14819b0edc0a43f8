//! Directory scanning and single-file import.
//!
//! A scan discovers every candidate file under a root first (so progress can
//! report a total), then handles the files one at a time in path order:
//!
//! 1. **Known path**: already catalogued, counted as skipped.
//! 2. **Unreadable**: the renderer cannot open it, counted as failed.
//! 3. **New**: metadata is extracted, a cover thumbnail rendered, and the
//!    document inserted together with its implied tags and series.
//!
//! Each document commits on its own, in one transaction with its tags and
//! series link. A failed or cancelled scan keeps what it already imported,
//! and running it again picks up where it left off.

mod walk;

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use pagekeep_catalog::error::ErrorKind as CatalogErrorKind;
use pagekeep_catalog::{Catalog, Document, NewDocument};
use pagekeep_extract::{Metadata, extract_from, fallback};
use pagekeep_render::{RendererHandle, ThumbnailCache};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio_util::sync::CancellationToken;
use tracing::instrument;

/// Reported after every file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanProgress {
    /// 0 to 100.
    pub percent: u8,
    pub message: String,
    pub total: usize,
    /// One-based index of the file just handled.
    pub current: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub added: usize,
    pub skipped: usize,
    pub failed: usize,
    /// The scan stopped early because its cancellation token fired.
    pub cancelled: bool,
}

impl ScanReport {
    pub fn merge(&mut self, other: ScanReport) {
        self.added += other.added;
        self.skipped += other.skipped;
        self.failed += other.failed;
        self.cancelled |= other.cancelled;
    }
}

#[derive(Default)]
pub struct ScanOptions<'a> {
    pub progress: Option<&'a mut (dyn FnMut(&ScanProgress) + Send)>,
    pub cancel: Option<CancellationToken>,
}

impl ScanOptions<'_> {
    fn report(&mut self, progress: ScanProgress) {
        tracing::debug!(current = progress.current, total = progress.total, "{}", progress.message);
        if let Some(callback) = self.progress.as_deref_mut() {
            callback(&progress);
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
    }
}

enum Outcome {
    Added(Document),
    Skipped(Document),
}

/// Everything read from the file itself, before touching the catalog.
struct Prepared {
    metadata: Metadata,
    thumbnail: Option<PathBuf>,
}

/// Releases the busy flag on every exit path.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).ok().map(|_| Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Imports documents into a catalog. At most one scan runs at a time per
/// scanner; single-file imports are not restricted.
pub struct Scanner {
    catalog: Catalog,
    renderer: RendererHandle,
    thumbnails: Option<Arc<ThumbnailCache>>,
    extensions: Vec<String>,
    busy: AtomicBool,
}

impl Scanner {
    pub fn new(catalog: Catalog, renderer: RendererHandle) -> Self {
        Self {
            catalog,
            renderer,
            thumbnails: None,
            extensions: vec!["pdf".to_string()],
            busy: AtomicBool::new(false),
        }
    }

    pub fn with_thumbnails(mut self, thumbnails: Arc<ThumbnailCache>) -> Self {
        self.thumbnails = Some(thumbnails);
        self
    }

    /// Extensions are matched case-insensitively, without the leading dot.
    pub fn with_extensions(mut self, extensions: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.extensions = extensions
            .into_iter()
            .map(Into::into)
            .map(|ext| ext.trim().trim_start_matches('.').to_string())
            .filter(|ext| !ext.is_empty())
            .collect();
        self
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Scan one root directory.
    ///
    /// If another scan is running, returns an all-zero report immediately.
    #[instrument(skip_all, fields(root = %root.display()))]
    pub async fn scan_root(&self, root: &Path, mut options: ScanOptions<'_>) -> Result<ScanReport> {
        let Some(_guard) = BusyGuard::acquire(&self.busy) else {
            tracing::warn!("A scan is already running; request ignored");
            return Ok(ScanReport::default());
        };
        self.scan_root_inner(root, &mut options).await
    }

    /// Scan each root in turn and sum the reports. Roots that do not exist
    /// are skipped with a warning.
    #[instrument(skip_all, fields(roots = roots.len()))]
    pub async fn scan_all(&self, roots: &[PathBuf], mut options: ScanOptions<'_>) -> Result<ScanReport> {
        let Some(_guard) = BusyGuard::acquire(&self.busy) else {
            tracing::warn!("A scan is already running; request ignored");
            return Ok(ScanReport::default());
        };
        let mut report = ScanReport::default();
        for root in roots {
            if !tokio::fs::metadata(root).await.is_ok_and(|m| m.is_dir()) {
                tracing::warn!(root = %root.display(), "Scan root does not exist; skipping");
                continue;
            }
            report.merge(self.scan_root_inner(root, &mut options).await?);
            if report.cancelled {
                break;
            }
        }
        tracing::info!(added = report.added, skipped = report.skipped, failed = report.failed, "All roots scanned");
        Ok(report)
    }

    async fn scan_root_inner(&self, root: &Path, options: &mut ScanOptions<'_>) -> Result<ScanReport> {
        let root = tokio::fs::canonicalize(root).await.or_raise(|| ErrorKind::RootNotFound(root.to_path_buf()))?;
        if !root.is_dir() {
            exn::bail!(ErrorKind::RootNotFound(root));
        }
        tracing::info!(root = %root.display(), "Scan started");
        let files = walk::discover(&root, &self.extensions).await;
        let total = files.len();
        tracing::info!(total, "Discovery complete");

        let mut report = ScanReport::default();
        for (index, path) in files.iter().enumerate() {
            if options.is_cancelled() {
                tracing::info!(processed = index, total, "Scan cancelled");
                report.cancelled = true;
                break;
            }
            let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
            let message = match self.import_new(path).await {
                Ok(Outcome::Added(_)) => {
                    report.added += 1;
                    format!("Added {name}")
                },
                Ok(Outcome::Skipped(_)) => {
                    report.skipped += 1;
                    format!("Skipped {name}")
                },
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = ?e, "Import failed");
                    report.failed += 1;
                    format!("Failed {name}")
                },
            };
            let current = index + 1;
            let percent = u8::try_from(current * 100 / total).unwrap_or(100);
            options.report(ScanProgress { percent, message, total, current });
        }
        tracing::info!(
            added = report.added,
            skipped = report.skipped,
            failed = report.failed,
            cancelled = report.cancelled,
            "Scan finished"
        );
        Ok(report)
    }

    /// Import one file and return its document, whether it was just created
    /// or already catalogued. Files the renderer cannot read are still
    /// imported, with a title taken from the filename.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub async fn import_file(&self, path: &Path) -> Result<Document> {
        let path = tokio::fs::canonicalize(path).await.or_raise(|| ErrorKind::Extract(path.to_path_buf()))?;
        if let Some(existing) = self.lookup(&path).await? {
            return Ok(existing);
        }
        let prepared = match self.prepare(&path).await {
            Ok(prepared) => prepared,
            Err(e) => {
                tracing::warn!(error = ?e, "Could not read document; importing with minimal metadata");
                Prepared { metadata: fallback(&path), thumbnail: None }
            },
        };
        match self.insert(&path, prepared).await? {
            Outcome::Added(document) | Outcome::Skipped(document) => Ok(document),
        }
    }

    async fn import_new(&self, path: &Path) -> Result<Outcome> {
        if let Some(existing) = self.lookup(path).await? {
            return Ok(Outcome::Skipped(existing));
        }
        let prepared = self.prepare(path).await?;
        self.insert(path, prepared).await
    }

    async fn lookup(&self, path: &Path) -> Result<Option<Document>> {
        self.catalog.get_document_by_path(path).await.or_raise(|| ErrorKind::Catalog)
    }

    /// Open the file once on a blocking thread for both metadata and cover.
    async fn prepare(&self, path: &Path) -> Result<Prepared> {
        let renderer = Arc::clone(&self.renderer);
        let thumbnails = self.thumbnails.clone();
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || {
            let handle = renderer.open(&path).or_raise(|| ErrorKind::Extract(path.clone()))?;
            let metadata = extract_from(&*handle);
            let thumbnail = thumbnails.and_then(|cache| cache.get_or_create_with(&*handle, Some(0), None));
            Ok(Prepared { metadata, thumbnail })
        })
        .await
        .or_raise(|| ErrorKind::Task)?
    }

    async fn insert(&self, path: &Path, prepared: Prepared) -> Result<Outcome> {
        let Prepared { metadata, thumbnail } = prepared;
        let new = NewDocument {
            title: metadata.title,
            author: metadata.author,
            file_path: path.to_path_buf(),
            thumbnail,
            page_count: metadata.page_count,
            volume_number: metadata.series.as_ref().map(|hint| hint.volume),
            published_on: metadata.published,
            ..Default::default()
        };
        let series = metadata.series.as_ref().map(|hint| (hint.name.as_str(), Some(f64::from(hint.volume))));
        let document = match self.catalog.insert_document_with_links(&new, &metadata.tags, series).await {
            Ok(document) => document,
            // Lost a race with a concurrent import of the same file.
            Err(e) if matches!(&*e, CatalogErrorKind::DuplicateSource(_)) => {
                return match self.lookup(path).await? {
                    Some(existing) => Ok(Outcome::Skipped(existing)),
                    None => Err(e).or_raise(|| ErrorKind::Catalog),
                };
            },
            Err(e) => return Err(e).or_raise(|| ErrorKind::Catalog),
        };
        tracing::debug!(id = document.id, title = %document.title, "Document added");
        Ok(Outcome::Added(document))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagekeep_catalog::{Database, ReadingStatus};
    use pagekeep_render::DocumentInfo;
    use pagekeep_render::mock::{MockDocument, MockRenderer, write_fake_pdf};

    struct Fixture {
        _dir: tempfile::TempDir,
        root: PathBuf,
        catalog: Catalog,
        renderer: MockRenderer,
        scanner: Scanner,
    }

    async fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("books");
        std::fs::create_dir(&root).unwrap();
        let root = std::fs::canonicalize(root).unwrap();
        let db = Database::connect_in_memory().await.unwrap();
        let catalog = Catalog::from(&db);
        let renderer = MockRenderer::new();
        let thumbnails = Arc::new(ThumbnailCache::new(dir.path().join("thumbs"), Arc::new(renderer.clone())));
        let scanner = Scanner::new(catalog.clone(), Arc::new(renderer.clone())).with_thumbnails(thumbnails);
        Fixture { _dir: dir, root, catalog, renderer, scanner }
    }

    fn corrupt(path: &Path) {
        std::fs::write(path, b"definitely not a pdf").unwrap();
    }

    #[tokio::test]
    async fn test_scan_is_idempotent_and_counts_failures() {
        let f = fixture().await;
        for name in ["a.pdf", "b.pdf", "c.PDF"] {
            write_fake_pdf(&f.root.join(name)).unwrap();
        }
        corrupt(&f.root.join("broken.pdf"));
        std::fs::write(f.root.join("readme.txt"), b"ignored").unwrap();

        let first = f.scanner.scan_root(&f.root, ScanOptions::default()).await.unwrap();
        assert_eq!(first, ScanReport { added: 3, skipped: 0, failed: 1, cancelled: false });

        let second = f.scanner.scan_root(&f.root, ScanOptions::default()).await.unwrap();
        assert_eq!(second, ScanReport { added: 0, skipped: 3, failed: 1, cancelled: false });
        assert_eq!(f.catalog.statistics().await.unwrap().total_books, 3);
    }

    #[tokio::test]
    async fn test_scan_records_metadata_tags_series_and_thumbnail() {
        let f = fixture().await;
        let tagged = f.root.join("Dune.pdf");
        write_fake_pdf(&tagged).unwrap();
        f.renderer.register(
            &tagged,
            MockDocument {
                page_count: 412,
                info: DocumentInfo {
                    title: Some("Dune".to_string()),
                    author: Some("Frank Herbert".to_string()),
                    keywords: Some("SciFi; Classic".to_string()),
                    creation_date: Some("D:19650801".to_string()),
                },
            },
        );
        write_fake_pdf(&f.root.join("Saga 02.pdf")).unwrap();

        f.scanner.scan_root(&f.root, ScanOptions::default()).await.unwrap();

        let dune = f.catalog.get_document_by_path(&tagged).await.unwrap().unwrap();
        assert_eq!(dune.author.as_deref(), Some("Frank Herbert"));
        assert_eq!(dune.page_count, 412);
        assert_eq!(dune.status, ReadingStatus::Unread);
        assert!(dune.thumbnail.as_deref().is_some_and(Path::is_file));
        let tags: Vec<_> = f.catalog.tags_for_document(dune.id).await.unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(tags, vec!["Classic", "SciFi"]);
        assert!(f.catalog.series_for_document(dune.id).await.unwrap().is_empty());

        let saga = f.catalog.get_document_by_path(f.root.join("Saga 02.pdf")).await.unwrap().unwrap();
        assert_eq!(saga.title, "Saga 02");
        assert_eq!(saga.volume_number, Some(2));
        let links = f.catalog.series_for_document(saga.id).await.unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].series.name, "Saga");
        assert_eq!(links[0].order, Some(2.0));
    }

    #[tokio::test]
    async fn test_progress_callback() {
        let f = fixture().await;
        for name in ["1.pdf", "2.pdf", "3.pdf", "4.pdf"] {
            write_fake_pdf(&f.root.join(name)).unwrap();
        }
        let mut seen = Vec::new();
        let mut callback = |progress: &ScanProgress| seen.push(progress.clone());
        let options = ScanOptions { progress: Some(&mut callback), cancel: None };
        f.scanner.scan_root(&f.root, options).await.unwrap();

        let percents: Vec<_> = seen.iter().map(|p| p.percent).collect();
        assert_eq!(percents, vec![25, 50, 75, 100]);
        assert!(seen.iter().all(|p| p.total == 4));
        assert_eq!(seen.iter().map(|p| p.current).collect::<Vec<_>>(), vec![1, 2, 3, 4]);
        assert_eq!(seen[0].message, "Added 1.pdf");
    }

    #[tokio::test]
    async fn test_cancellation_keeps_partial_progress() {
        let f = fixture().await;
        for name in ["1.pdf", "2.pdf", "3.pdf"] {
            write_fake_pdf(&f.root.join(name)).unwrap();
        }
        let token = CancellationToken::new();
        let cancel = token.clone();
        let mut callback = move |progress: &ScanProgress| {
            if progress.current == 1 {
                cancel.cancel();
            }
        };
        let options = ScanOptions { progress: Some(&mut callback), cancel: Some(token) };
        let report = f.scanner.scan_root(&f.root, options).await.unwrap();
        assert_eq!(report, ScanReport { added: 1, skipped: 0, failed: 0, cancelled: true });

        let resumed = f.scanner.scan_root(&f.root, ScanOptions::default()).await.unwrap();
        assert_eq!(resumed, ScanReport { added: 2, skipped: 1, failed: 0, cancelled: false });
    }

    #[tokio::test]
    async fn test_concurrent_scan_is_rejected() {
        let f = fixture().await;
        write_fake_pdf(&f.root.join("1.pdf")).unwrap();
        let _held = BusyGuard::acquire(&f.scanner.busy).unwrap();
        assert!(f.scanner.is_busy());
        let report = f.scanner.scan_root(&f.root, ScanOptions::default()).await.unwrap();
        assert_eq!(report, ScanReport::default());
        let report = f.scanner.scan_all(&[f.root.clone()], ScanOptions::default()).await.unwrap();
        assert_eq!(report, ScanReport::default());
        drop(_held);
        assert!(!f.scanner.is_busy());
        assert_eq!(f.scanner.scan_root(&f.root, ScanOptions::default()).await.unwrap().added, 1);
    }

    #[tokio::test]
    async fn test_busy_flag_released_on_error() {
        let f = fixture().await;
        assert!(f.scanner.scan_root(&f.root.join("missing"), ScanOptions::default()).await.is_err());
        assert!(!f.scanner.is_busy());
    }

    #[tokio::test]
    async fn test_scan_all_skips_missing_roots() {
        let f = fixture().await;
        let other = f.root.parent().unwrap().join("more");
        std::fs::create_dir(&other).unwrap();
        write_fake_pdf(&f.root.join("1.pdf")).unwrap();
        write_fake_pdf(&other.join("2.pdf")).unwrap();
        let roots = vec![f.root.clone(), f.root.join("nope"), other];
        let report = f.scanner.scan_all(&roots, ScanOptions::default()).await.unwrap();
        assert_eq!(report, ScanReport { added: 2, skipped: 0, failed: 0, cancelled: false });
    }

    #[tokio::test]
    async fn test_import_file_falls_back_and_returns_existing() {
        let f = fixture().await;
        let broken = f.root.join("Unreadable Thing.pdf");
        corrupt(&broken);
        let document = f.scanner.import_file(&broken).await.unwrap();
        assert_eq!(document.title, "Unreadable Thing");
        assert_eq!(document.page_count, 0);
        assert_eq!(document.thumbnail, None);

        let again = f.scanner.import_file(&broken).await.unwrap();
        assert_eq!(again.id, document.id);
        assert_eq!(f.catalog.statistics().await.unwrap().total_books, 1);
    }

    #[tokio::test]
    async fn test_custom_extensions() {
        let f = fixture().await;
        let scanner = Scanner::new(f.catalog.clone(), Arc::new(f.renderer.clone())).with_extensions([".PDF", "ai"]);
        write_fake_pdf(&f.root.join("poster.ai")).unwrap();
        write_fake_pdf(&f.root.join("book.pdf")).unwrap();
        write_fake_pdf(&f.root.join("book.epub")).unwrap();
        let report = scanner.scan_root(&f.root, ScanOptions::default()).await.unwrap();
        assert_eq!(report.added, 2);
    }
}
