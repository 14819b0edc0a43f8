use crate::error::{ErrorKind, Result};
use crate::{DocumentHandle, RawPage, RendererHandle};
use exn::{OptionExt, ResultExt};
use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, DynamicImage, RgbaImage};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Pages are rasterised at this multiple of their natural size before being
/// shrunk into the bounding box, to keep small text legible.
pub const UPSCALE: f32 = 2.0;
pub const JPEG_QUALITY: u8 = 90;
pub const EXTENSION: &str = "jpg";

/// Maximum thumbnail dimensions; the aspect ratio of the page is preserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub width: u32,
    pub height: u32,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self { width: 200, height: 300 }
    }
}

/// On-disk cover cache keyed by a hash of the source *path*.
///
/// The key ignores file contents, page index and size: replacing a file in
/// place keeps serving the old cover until [`ThumbnailCache::invalidate`] is
/// called for it.
pub struct ThumbnailCache {
    dir: PathBuf,
    renderer: RendererHandle,
    size: BoundingBox,
}

impl ThumbnailCache {
    pub fn new(dir: impl Into<PathBuf>, renderer: RendererHandle) -> Self {
        Self { dir: dir.into(), renderer, size: BoundingBox::default() }
    }

    pub fn with_size(mut self, size: BoundingBox) -> Self {
        self.size = size;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn renderer(&self) -> &RendererHandle {
        &self.renderer
    }

    pub fn key(source: &Path) -> String {
        blake3::hash(source.to_string_lossy().as_bytes()).to_hex().to_string()
    }

    pub fn path_for(&self, source: &Path) -> PathBuf {
        self.dir.join(format!("{}.{EXTENSION}", Self::key(source)))
    }

    /// Return the cached cover for `source`, rendering it first if absent.
    ///
    /// Failures are logged and reported as `None`.
    pub fn get_or_create(&self, source: &Path, page: Option<u32>, size: Option<BoundingBox>) -> Option<PathBuf> {
        let target = self.path_for(source);
        if target.is_file() {
            return Some(target);
        }
        let result = self
            .renderer
            .open(source)
            .and_then(|handle| self.render_to(&*handle, page.unwrap_or(0), size, &target));
        self.finish(source, target, result)
    }

    /// Same as [`ThumbnailCache::get_or_create`], using an already open handle.
    pub fn get_or_create_with(
        &self,
        handle: &dyn DocumentHandle,
        page: Option<u32>,
        size: Option<BoundingBox>,
    ) -> Option<PathBuf> {
        let target = self.path_for(handle.path());
        if target.is_file() {
            return Some(target);
        }
        let result = self.render_to(handle, page.unwrap_or(0), size, &target);
        self.finish(handle.path(), target, result)
    }

    /// Remove the cached cover for `source`. Returns whether one existed.
    pub fn invalidate(&self, source: &Path) -> Result<bool> {
        match std::fs::remove_file(self.path_for(source)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).or_raise(|| ErrorKind::Io),
        }
    }

    fn finish(&self, source: &Path, target: PathBuf, result: Result<()>) -> Option<PathBuf> {
        match result {
            Ok(()) => {
                tracing::debug!(source = %source.display(), thumbnail = %target.display(), "Thumbnail created");
                Some(target)
            },
            Err(e) => {
                tracing::warn!(source = %source.display(), error = ?e, "Failed to create thumbnail");
                None
            },
        }
    }

    fn render_to(
        &self,
        handle: &dyn DocumentHandle,
        page: u32,
        size: Option<BoundingBox>,
        target: &Path,
    ) -> Result<()> {
        let size = size.unwrap_or(self.size);
        let raw = handle.render_page(page, UPSCALE)?;
        let jpeg = encode(raw, size)?;
        std::fs::create_dir_all(&self.dir).or_raise(|| ErrorKind::Io)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir).or_raise(|| ErrorKind::Io)?;
        tmp.write_all(&jpeg).or_raise(|| ErrorKind::Io)?;
        tmp.persist(target).or_raise(|| ErrorKind::Io)?;
        Ok(())
    }
}

fn encode(raw: RawPage, size: BoundingBox) -> Result<Vec<u8>> {
    let rgba = RgbaImage::from_raw(raw.width, raw.height, raw.pixels).ok_or_raise(|| ErrorKind::Encode)?;
    let rgb = DynamicImage::ImageRgba8(rgba).thumbnail(size.width, size.height).to_rgb8();
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY)
        .encode(rgb.as_raw(), rgb.width(), rgb.height(), ColorType::Rgb8)
        .or_raise(|| ErrorKind::Encode)?;
    Ok(buffer)
}
