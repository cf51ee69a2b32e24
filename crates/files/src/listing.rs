//! Directory enumeration and folder creation.

use crate::error::{FilesError, Result};
use crate::extensions::Extensions;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// List files under `root` whose extension is accepted, descending into
/// subdirectories.
///
/// Returned paths are relative to `root` and sorted, so the same tree always
/// produces the same task order.
pub async fn list_files(root: impl AsRef<Path>, extensions: &Extensions) -> Result<Vec<PathBuf>> {
    let root = root.as_ref();
    let mut files = Vec::new();
    let mut pending = vec![PathBuf::new()];

    while let Some(rel_dir) = pending.pop() {
        let dir = root.join(&rel_dir);
        let mut entries = fs::read_dir(&dir).await.map_err(FilesError::io(&dir))?;

        while let Some(entry) = entries.next_entry().await.map_err(FilesError::io(&dir))? {
            let rel = rel_dir.join(entry.file_name());
            let path = entry.path();
            // Follows symlinks, like a plain is-dir check would.
            let meta = fs::metadata(&path).await.map_err(FilesError::io(&path))?;

            if meta.is_dir() {
                pending.push(rel);
            } else if extensions.matches(&entry.file_name().to_string_lossy()) {
                files.push(rel);
            }
        }
    }

    files.sort();
    debug!(root = %root.display(), count = files.len(), "Listed files");
    Ok(files)
}

/// Create every folder in `folders`, including missing parents.
///
/// Folders that already exist are left alone.
pub async fn make_folders<I, P>(folders: I) -> Result<()>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    for folder in folders {
        let folder = folder.as_ref();
        if folder.as_os_str().is_empty() {
            continue;
        }
        fs::create_dir_all(folder)
            .await
            .map_err(FilesError::io(folder))?;
    }
    Ok(())
}
