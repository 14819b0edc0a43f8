//! Metadata extraction for imported documents.
//!
//! Embedded document info wins; the filename fills the gaps. A series hint
//! is only derived from the filename when the document has no embedded
//! title, since a real title rarely ends in a volume number by accident.

mod consts;
pub mod error;
mod models;
mod parse;

use crate::error::{ErrorKind, Result};
pub use crate::models::{Metadata, SeriesHint};
pub use crate::parse::{parse_keywords, parse_pdf_date, parse_series};
use exn::ResultExt;
use pagekeep_render::{DocumentHandle, DocumentRenderer};
use std::path::Path;
use tracing::instrument;

/// Open `path` and extract its metadata.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn extract(renderer: &dyn DocumentRenderer, path: &Path) -> Result<Metadata> {
    let handle = renderer.open(path).or_raise(|| ErrorKind::Unreadable(path.to_path_buf()))?;
    Ok(extract_from(&*handle))
}

/// Extract metadata from an already open document.
pub fn extract_from(handle: &dyn DocumentHandle) -> Metadata {
    let info = handle.metadata();
    let stem = file_stem(handle.path());
    let embedded_title = info.title.as_deref().map(str::trim).filter(|title| !title.is_empty());
    let series = match embedded_title {
        Some(_) => None,
        None => parse_series(&stem),
    };
    Metadata {
        title: embedded_title.map(String::from).unwrap_or(stem),
        author: info.author.map(|author| author.trim().to_string()).filter(|author| !author.is_empty()),
        published: info.creation_date.as_deref().and_then(parse_pdf_date),
        page_count: handle.page_count(),
        tags: info.keywords.as_deref().map(parse_keywords).unwrap_or_default(),
        series,
    }
}

/// The minimal record used when a document cannot be read at all.
pub fn fallback(path: &Path) -> Metadata {
    Metadata {
        title: file_stem(path),
        author: None,
        published: None,
        page_count: 0,
        tags: Vec::new(),
        series: None,
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem().map(|stem| stem.to_string_lossy().into_owned()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagekeep_render::DocumentInfo;
    use pagekeep_render::mock::{MockDocument, MockRenderer, write_fake_pdf};
    use time::macros::date;

    #[test]
    fn test_embedded_info_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Saga 3.pdf");
        write_fake_pdf(&path).unwrap();
        let renderer = MockRenderer::new();
        renderer.register(
            &path,
            MockDocument {
                page_count: 42,
                info: DocumentInfo {
                    title: Some("  The Real Title ".to_string()),
                    author: Some("A. Writer".to_string()),
                    keywords: Some("sci-fi; space".to_string()),
                    creation_date: Some("D:20200102".to_string()),
                },
            },
        );
        let metadata = extract(&renderer, &path).unwrap();
        assert_eq!(metadata.title, "The Real Title");
        assert_eq!(metadata.author.as_deref(), Some("A. Writer"));
        assert_eq!(metadata.page_count, 42);
        assert_eq!(metadata.tags, vec!["sci-fi", "space"]);
        assert_eq!(metadata.published, Some(date!(2020 - 01 - 02)));
        assert_eq!(metadata.series, None);
    }

    #[test]
    fn test_filename_series_without_title() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Saga_07.pdf");
        write_fake_pdf(&path).unwrap();
        let renderer = MockRenderer::new();
        renderer.register(
            &path,
            MockDocument { info: DocumentInfo { title: Some("   ".to_string()), ..Default::default() }, ..Default::default() },
        );
        let metadata = extract(&renderer, &path).unwrap();
        assert_eq!(metadata.title, "Saga_07");
        assert_eq!(metadata.series, Some(SeriesHint { name: "Saga".to_string(), volume: 7 }));
    }

    #[test]
    fn test_unreadable_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"nope").unwrap();
        let err = extract(&MockRenderer::new(), &path).unwrap_err();
        assert_eq!(&*err, &ErrorKind::Unreadable(path.clone()));

        let minimal = fallback(&path);
        assert_eq!(minimal.title, "broken");
        assert_eq!(minimal.page_count, 0);
    }
}
