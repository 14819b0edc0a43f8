use crate::error::{ErrorKind, Result};
use crate::progress::{Transition, record_progress};
use exn::{OptionExt, ResultExt};
use pagekeep_catalog::{Catalog, Document};
use pagekeep_render::{HandleSlot, RawPage, RendererHandle};

/// One open book, as seen by a viewer.
///
/// Holds a single document handle; opening another document closes the
/// previous one first. Every page move is persisted immediately.
pub struct ReadingSession {
    catalog: Catalog,
    slot: HandleSlot,
    document: Option<Document>,
}

impl ReadingSession {
    pub fn new(catalog: Catalog, renderer: RendererHandle) -> Self {
        Self { catalog, slot: HandleSlot::new(renderer), document: None }
    }

    /// Open document `id` at its saved position.
    ///
    /// If the catalog never learned the page count (the import fell back to
    /// a minimal record), it is filled in from the open handle.
    pub async fn open(&mut self, id: i64) -> Result<&Document> {
        let mut document = self.catalog.require_document(id).await.or_raise(|| ErrorKind::Catalog)?;
        let handle = self.slot.acquire(&document.file_path).or_raise(|| ErrorKind::Render)?;
        let page_count = handle.page_count();
        if document.page_count == 0 && page_count > 0 {
            document.page_count = page_count;
            document.current_page = document.current_page.min(page_count - 1);
            self.catalog.update_document(&document).await.or_raise(|| ErrorKind::Catalog)?;
        }
        tracing::info!(id, title = %document.title, page = document.current_page, "Opened document");
        Ok(self.document.insert(document))
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    /// Jump to `page`, clamped to the document's pages.
    pub async fn goto(&mut self, page: u32) -> Result<Transition> {
        let document = self.document.as_mut().ok_or_raise(|| ErrorKind::NotOpen)?;
        let transition = record_progress(&self.catalog, document.id, page).await?;
        document.current_page = transition.page;
        document.status = transition.status;
        Ok(transition)
    }

    pub async fn next_page(&mut self) -> Result<Transition> {
        let page = self.current_page()?.saturating_add(1);
        self.goto(page).await
    }

    pub async fn previous_page(&mut self) -> Result<Transition> {
        let page = self.current_page()?.saturating_sub(1);
        self.goto(page).await
    }

    /// Render the current page.
    pub fn render(&self, scale: f32) -> Result<RawPage> {
        let document = self.document.as_ref().ok_or_raise(|| ErrorKind::NotOpen)?;
        let handle = self.slot.current().ok_or_raise(|| ErrorKind::NotOpen)?;
        handle.render_page(document.current_page, scale).or_raise(|| ErrorKind::Render)
    }

    pub fn close(&mut self) {
        self.slot.release();
        self.document = None;
    }

    fn current_page(&self) -> Result<u32> {
        Ok(self.document.as_ref().ok_or_raise(|| ErrorKind::NotOpen)?.current_page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagekeep_catalog::{Database, NewDocument, ReadingStatus};
    use pagekeep_render::mock::{MockDocument, MockRenderer, write_fake_pdf};
    use std::path::Path;
    use std::sync::Arc;

    async fn setup(dir: &Path, titles: &[&str]) -> (Catalog, MockRenderer, Vec<i64>) {
        let db = Database::connect_in_memory().await.unwrap();
        let catalog = Catalog::from(&db);
        let renderer = MockRenderer::new();
        let mut ids = Vec::new();
        for title in titles {
            let path = dir.join(format!("{title}.pdf"));
            write_fake_pdf(&path).unwrap();
            renderer.register(&path, MockDocument { page_count: 5, ..Default::default() });
            ids.push(catalog.insert_document(&NewDocument::new(*title, path)).await.unwrap().id);
        }
        (catalog, renderer, ids)
    }

    #[tokio::test]
    async fn test_navigation_persists_and_clamps() {
        let dir = tempfile::tempdir().unwrap();
        let (catalog, renderer, ids) = setup(dir.path(), &["Book"]).await;
        let mut session = ReadingSession::new(catalog.clone(), Arc::new(renderer));

        let opened = session.open(ids[0]).await.unwrap();
        assert_eq!(opened.page_count, 5);
        assert_eq!(session.previous_page().await.unwrap().page, 0);
        assert_eq!(session.next_page().await.unwrap().status, ReadingStatus::Reading);
        assert_eq!(session.goto(100).await.unwrap().page, 4);
        assert_eq!(session.document().map(|d| d.status), Some(ReadingStatus::Completed));

        let stored = catalog.require_document(ids[0]).await.unwrap();
        assert_eq!((stored.current_page, stored.page_count), (4, 5));
        assert_eq!(stored.status, ReadingStatus::Completed);
    }

    #[tokio::test]
    async fn test_render_current_page() {
        let dir = tempfile::tempdir().unwrap();
        let (catalog, renderer, ids) = setup(dir.path(), &["Book"]).await;
        let mut session = ReadingSession::new(catalog, Arc::new(renderer.clone()));
        session.open(ids[0]).await.unwrap();
        let page = session.render(1.0).unwrap();
        assert_eq!((page.width, page.height), (100, 150));
        assert_eq!(renderer.render_count(), 1);
    }

    #[tokio::test]
    async fn test_single_open_handle() {
        let dir = tempfile::tempdir().unwrap();
        let (catalog, renderer, ids) = setup(dir.path(), &["One", "Two"]).await;
        let mut session = ReadingSession::new(catalog, Arc::new(renderer.clone()));
        session.open(ids[0]).await.unwrap();
        session.open(ids[1]).await.unwrap();
        assert_eq!(renderer.open_handles(), 1);
        session.close();
        assert_eq!(renderer.open_handles(), 0);
        assert!(matches!(&*session.next_page().await.unwrap_err(), ErrorKind::NotOpen));
        assert!(session.render(1.0).is_err());
    }
}
