//! Page rendering and thumbnails.
//!
//! The rest of the workspace only ever talks to the [`DocumentRenderer`] and
//! [`DocumentHandle`] traits; the concrete backend (PDFium, or the in-memory
//! mock used by tests) is chosen at construction time.

pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
#[cfg(feature = "pdfium")]
pub mod pdfium;
mod slot;
mod thumbnail;

use crate::error::Result;
use std::path::Path;
use std::sync::Arc;

pub use crate::slot::HandleSlot;
pub use crate::thumbnail::{BoundingBox, ThumbnailCache};

/// A rendered page as a tightly packed RGBA8 buffer.
#[derive(Debug, Clone)]
pub struct RawPage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Document-level information embedded in the file, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentInfo {
    pub title: Option<String>,
    pub author: Option<String>,
    pub keywords: Option<String>,
    /// Raw creation date string, usually in PDF `D:YYYYMMDDHHmmSS` form.
    pub creation_date: Option<String>,
}

/// An open document. Dropping the handle releases it.
pub trait DocumentHandle: Send {
    fn path(&self) -> &Path;
    fn page_count(&self) -> u32;
    fn render_page(&self, index: u32, scale: f32) -> Result<RawPage>;
    fn metadata(&self) -> DocumentInfo;
}

pub trait DocumentRenderer: Send + Sync {
    fn open(&self, path: &Path) -> Result<Box<dyn DocumentHandle>>;
}

pub type RendererHandle = Arc<dyn DocumentRenderer>;
