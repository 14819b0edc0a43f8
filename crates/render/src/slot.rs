use crate::error::{ErrorKind, Result};
use crate::{DocumentHandle, RendererHandle};
use exn::OptionExt;
use std::path::Path;

/// Holds at most one open document at a time.
///
/// Acquiring a different path closes the previously held handle *before*
/// opening the new one, so a reader flipping between books never keeps two
/// documents resident.
pub struct HandleSlot {
    renderer: RendererHandle,
    current: Option<Box<dyn DocumentHandle>>,
}

impl HandleSlot {
    pub fn new(renderer: RendererHandle) -> Self {
        Self { renderer, current: None }
    }

    pub fn acquire(&mut self, path: &Path) -> Result<&dyn DocumentHandle> {
        let reuse = self.current.as_ref().is_some_and(|handle| handle.path() == path);
        if !reuse {
            if let Some(previous) = self.current.take() {
                tracing::debug!(path = %previous.path().display(), "Closing previously held document");
            }
            self.current = Some(self.renderer.open(path)?);
        }
        self.current.as_deref().ok_or_raise(|| ErrorKind::Open(path.to_path_buf()))
    }

    pub fn current(&self) -> Option<&dyn DocumentHandle> {
        self.current.as_deref()
    }

    pub fn release(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockRenderer, write_fake_pdf};
    use std::sync::Arc;

    #[test]
    fn test_acquire_closes_previous_handle() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.pdf");
        let b = dir.path().join("b.pdf");
        write_fake_pdf(&a).unwrap();
        write_fake_pdf(&b).unwrap();
        let renderer = MockRenderer::new();
        let mut slot = HandleSlot::new(Arc::new(renderer.clone()));

        slot.acquire(&a).unwrap();
        assert_eq!(renderer.open_handles(), 1);
        slot.acquire(&b).unwrap();
        assert_eq!(renderer.open_handles(), 1);
        assert_eq!(slot.current().map(|h| h.path().to_path_buf()), Some(b.clone()));

        slot.release();
        assert_eq!(renderer.open_handles(), 0);
    }

    #[test]
    fn test_acquire_same_path_reuses_handle() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.pdf");
        write_fake_pdf(&a).unwrap();
        let renderer = MockRenderer::new();
        let mut slot = HandleSlot::new(Arc::new(renderer.clone()));
        slot.acquire(&a).unwrap();
        slot.acquire(&a).unwrap();
        assert_eq!(renderer.open_count(), 1);
    }

    #[test]
    fn test_failed_acquire_leaves_slot_empty() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.pdf");
        write_fake_pdf(&a).unwrap();
        let renderer = MockRenderer::new();
        let mut slot = HandleSlot::new(Arc::new(renderer.clone()));
        slot.acquire(&a).unwrap();
        assert!(slot.acquire(&dir.path().join("missing.pdf")).is_err());
        assert!(slot.current().is_none());
        assert_eq!(renderer.open_handles(), 0);
    }
}
