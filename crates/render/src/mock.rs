//! In-memory renderer for tests.
//!
//! Any file starting with `%PDF-` opens successfully; anything else is
//! reported as corrupt. Page counts and metadata default to ten pages and no
//! embedded info, and can be overridden per path with [`MockRenderer::register`].

use crate::error::{ErrorKind, Result};
use crate::{DocumentHandle, DocumentInfo, DocumentRenderer, RawPage};
use exn::ResultExt;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const DEFAULT_PAGE_COUNT: u32 = 10;
pub const PDF_MAGIC: &[u8] = b"%PDF-";

#[derive(Debug, Clone)]
pub struct MockDocument {
    pub page_count: u32,
    pub info: DocumentInfo,
}

impl Default for MockDocument {
    fn default() -> Self {
        Self { page_count: DEFAULT_PAGE_COUNT, info: DocumentInfo::default() }
    }
}

#[derive(Debug, Default)]
struct Counters {
    renders: AtomicUsize,
    opens: AtomicUsize,
    open_handles: AtomicUsize,
}

#[derive(Debug, Default, Clone)]
pub struct MockRenderer {
    documents: Arc<Mutex<HashMap<PathBuf, MockDocument>>>,
    counters: Arc<Counters>,
}

impl MockRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, path: impl Into<PathBuf>, document: MockDocument) {
        if let Ok(mut documents) = self.documents.lock() {
            documents.insert(path.into(), document);
        }
    }

    /// Number of pages rendered so far, across all handles.
    pub fn render_count(&self) -> usize {
        self.counters.renders.load(Ordering::SeqCst)
    }

    pub fn open_count(&self) -> usize {
        self.counters.opens.load(Ordering::SeqCst)
    }

    /// Number of handles currently alive.
    pub fn open_handles(&self) -> usize {
        self.counters.open_handles.load(Ordering::SeqCst)
    }
}

impl DocumentRenderer for MockRenderer {
    fn open(&self, path: &Path) -> Result<Box<dyn DocumentHandle>> {
        let bytes = std::fs::read(path).or_raise(|| ErrorKind::Open(path.to_path_buf()))?;
        if !bytes.starts_with(PDF_MAGIC) {
            exn::bail!(ErrorKind::Corrupt(path.to_path_buf()));
        }
        let document = self
            .documents
            .lock()
            .ok()
            .and_then(|documents| documents.get(path).cloned())
            .unwrap_or_default();
        self.counters.opens.fetch_add(1, Ordering::SeqCst);
        self.counters.open_handles.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockHandle { path: path.to_path_buf(), document, counters: Arc::clone(&self.counters) }))
    }
}

struct MockHandle {
    path: PathBuf,
    document: MockDocument,
    counters: Arc<Counters>,
}

impl DocumentHandle for MockHandle {
    fn path(&self) -> &Path {
        &self.path
    }

    fn page_count(&self) -> u32 {
        self.document.page_count
    }

    fn render_page(&self, index: u32, scale: f32) -> Result<RawPage> {
        if index >= self.document.page_count {
            exn::bail!(ErrorKind::PageOutOfRange { index, count: self.document.page_count });
        }
        self.counters.renders.fetch_add(1, Ordering::SeqCst);
        let width = ((100.0 * scale).round() as u32).max(1);
        let height = ((150.0 * scale).round() as u32).max(1);
        let shade = (index % 256) as u8;
        let pixels = [shade, 128, 255 - shade, 255].repeat((width * height) as usize);
        Ok(RawPage { width, height, pixels })
    }

    fn metadata(&self) -> DocumentInfo {
        self.document.info.clone()
    }
}

impl Drop for MockHandle {
    fn drop(&mut self) {
        self.counters.open_handles.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Write a minimal file the mock renderer accepts.
pub fn write_fake_pdf(path: &Path) -> std::io::Result<()> {
    std::fs::write(path, b"%PDF-1.7\n%mock\n")
}
