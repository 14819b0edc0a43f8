//! PDFium-backed renderer.
//!
//! PDFium documents borrow the library bindings and are not `Send`, so a
//! handle only keeps what it learned at open time (page count, metadata)
//! and re-binds for each render.

use crate::error::{ErrorKind, Result};
use crate::{DocumentHandle, DocumentInfo, DocumentRenderer, RawPage};
use exn::ResultExt;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default)]
pub struct PdfiumRenderer {
    /// Directory holding the PDFium shared library. Falls back to the
    /// system library search path when unset or when binding there fails.
    library_dir: Option<PathBuf>,
}

impl PdfiumRenderer {
    pub fn new(library_dir: Option<PathBuf>) -> Self {
        Self { library_dir }
    }

    fn bind(&self) -> Result<Pdfium> {
        if let Some(dir) = &self.library_dir {
            let library = Pdfium::pdfium_platform_library_name_at_path(dir);
            match Pdfium::bind_to_library(&library) {
                Ok(bindings) => return Ok(Pdfium::new(bindings)),
                Err(e) => tracing::debug!(library = %library.display(), error = %e, "Falling back to system PDFium"),
            }
        }
        let bindings = Pdfium::bind_to_system_library().or_raise(|| ErrorKind::LibraryUnavailable)?;
        Ok(Pdfium::new(bindings))
    }
}

impl DocumentRenderer for PdfiumRenderer {
    fn open(&self, path: &Path) -> Result<Box<dyn DocumentHandle>> {
        if !path.is_file() {
            exn::bail!(ErrorKind::Open(path.to_path_buf()));
        }
        let pdfium = self.bind()?;
        let document = pdfium
            .load_pdf_from_file(path, None)
            .or_raise(|| ErrorKind::Corrupt(path.to_path_buf()))?;
        let page_count = document.pages().len() as u32;
        let info = read_info(&document);
        Ok(Box::new(PdfiumHandle { renderer: self.clone(), path: path.to_path_buf(), page_count, info }))
    }
}

fn read_info(document: &PdfDocument<'_>) -> DocumentInfo {
    let metadata = document.metadata();
    let tag = |kind: PdfDocumentMetadataTagType| {
        metadata
            .get(kind)
            .map(|tag| tag.value().trim().to_string())
            .filter(|value| !value.is_empty())
    };
    DocumentInfo {
        title: tag(PdfDocumentMetadataTagType::Title),
        author: tag(PdfDocumentMetadataTagType::Author),
        keywords: tag(PdfDocumentMetadataTagType::Keywords),
        creation_date: tag(PdfDocumentMetadataTagType::CreationDate),
    }
}

struct PdfiumHandle {
    renderer: PdfiumRenderer,
    path: PathBuf,
    page_count: u32,
    info: DocumentInfo,
}

impl DocumentHandle for PdfiumHandle {
    fn path(&self) -> &Path {
        &self.path
    }

    fn page_count(&self) -> u32 {
        self.page_count
    }

    fn render_page(&self, index: u32, scale: f32) -> Result<RawPage> {
        if index >= self.page_count {
            exn::bail!(ErrorKind::PageOutOfRange { index, count: self.page_count });
        }
        let pdfium = self.renderer.bind()?;
        let document = pdfium
            .load_pdf_from_file(&self.path, None)
            .or_raise(|| ErrorKind::Corrupt(self.path.clone()))?;
        let page = document.pages().get(index as u16).or_raise(|| ErrorKind::Render(index))?;
        let width = (page.width().value * scale).round().max(1.0) as i32;
        let config = PdfRenderConfig::new().set_target_width(width);
        let bitmap = page.render_with_config(&config).or_raise(|| ErrorKind::Render(index))?;
        Ok(RawPage { width: bitmap.width() as u32, height: bitmap.height() as u32, pixels: bitmap.as_rgba_bytes() })
    }

    fn metadata(&self) -> DocumentInfo {
        self.info.clone()
    }
}
