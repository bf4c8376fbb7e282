//! # Atomic File Replacement
//!
//! The key store, the ledger, and the file revocation store each keep one
//! JSON document on disk and rewrite it whole on every change. A reader must
//! see either the old document or the new one, never a truncated mix, so the
//! write goes to a sibling temp file that is flushed and then renamed over
//! the target.
//!
//! Several processes may share one data directory (the node and the operator
//! CLI). A writer takes [`lock_exclusive`] on a sibling `.lock` file, re-reads
//! the document, applies its change, and only then replaces it. The lock file
//! is separate because the rename swaps the document's inode.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use fs4::fs_std::FileExt;

/// Write `contents` to `path` by rename-over-temp.
///
/// With `owner_only` set the file is created with mode `0600` on Unix.
/// Parent directories are created if missing.
pub fn write_atomic(path: &Path, contents: &[u8], owner_only: bool) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp = temp_sibling(path);
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    if owner_only {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    #[cfg(not(unix))]
    let _ = owner_only;

    let mut file = options.open(&tmp)?;
    file.write_all(contents)?;
    file.sync_all()?;
    drop(file);

    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(())
}

/// Exclusive advisory lock on `<path>.lock`. Released on drop.
#[derive(Debug)]
pub struct FileLock {
    _file: File,
}

/// Block until this process holds the write lock for `path`.
pub fn lock_exclusive(path: &Path) -> std::io::Result<FileLock> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(sibling(path, ".lock"))?;
    FileExt::lock_exclusive(&file)?;
    Ok(FileLock { _file: file })
}

/// Size and modification time of a file, used to notice rewrites by
/// another handle. `None` if the file is missing or unreadable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStamp {
    len: u64,
    modified: SystemTime,
}

impl FileStamp {
    pub fn of(path: &Path) -> Option<Self> {
        let meta = fs::metadata(path).ok()?;
        Some(Self {
            len: meta.len(),
            modified: meta.modified().ok()?,
        })
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    sibling(path, ".tmp")
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}
