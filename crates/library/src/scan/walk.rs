use async_stream::stream;
use futures::{Stream, StreamExt};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::{self, DirEntry};

enum WalkEntry {
    File(PathBuf),
    Descend(PathBuf),
    Skip,
}

pub(crate) fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|wanted| wanted.eq_ignore_ascii_case(ext)))
}

// `file_type()` does not follow symlinks, so linked directories are never
// descended into (no cycles). Linked files are followed.
async fn process_entry(entry: DirEntry, extensions: &[String]) -> io::Result<WalkEntry> {
    let path = entry.path();
    let file_type = entry.file_type().await?;
    if file_type.is_dir() {
        return Ok(WalkEntry::Descend(path));
    }
    if !has_extension(&path, extensions) {
        return Ok(WalkEntry::Skip);
    }
    if file_type.is_file() {
        return Ok(WalkEntry::File(path));
    }
    if file_type.is_symlink() {
        return match fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => Ok(WalkEntry::File(path)),
            // Broken link, or a link to something that isn't a file.
            _ => Ok(WalkEntry::Skip),
        };
    }
    Ok(WalkEntry::Skip)
}

/// Every file below `root` whose extension is in `extensions`, in no
/// particular order. Unreadable directories are reported and skipped.
pub(crate) fn walk<'a>(root: &'a Path, extensions: &'a [String]) -> impl Stream<Item = io::Result<PathBuf>> + 'a {
    let mut stack = vec![root.to_path_buf()];
    stream!({
        'dirs: while let Some(current) = stack.pop() {
            let mut entries = match fs::read_dir(&current).await {
                Ok(entries) => entries,
                Err(e) => {
                    yield Err(e);
                    continue 'dirs;
                },
            };
            'entries: loop {
                let entry = match entries.next_entry().await {
                    Ok(Some(entry)) => entry,
                    Ok(None) => break 'entries,
                    Err(e) => {
                        yield Err(e);
                        continue 'entries;
                    },
                };
                match process_entry(entry, extensions).await {
                    Ok(WalkEntry::File(path)) => yield Ok(path),
                    Ok(WalkEntry::Descend(dir)) => stack.push(dir),
                    Ok(WalkEntry::Skip) => {},
                    Err(e) => yield Err(e),
                }
            }
        }
    })
}

/// Collect [`walk`] into a sorted list so the total is known up front.
pub(crate) async fn discover(root: &Path, extensions: &[String]) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walk(root, extensions)
        .filter_map(|item| async move {
            item.inspect_err(|e| tracing::warn!(error = %e, "Skipping unreadable entry during discovery")).ok()
        })
        .collect()
        .await;
    files.sort();
    files
}
