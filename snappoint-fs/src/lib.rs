//! Capability-style filesystem helpers for snappoint's database files.
//!
//! Every helper resolves its target through an ambient `cap-std` directory
//! handle and accepts UTF-8 paths from `camino`.
#![forbid(unsafe_code)]

use std::io;
use std::path::Component;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};

/// Create every missing ancestor directory of `path`.
///
/// Paths without a parent, or whose parent is the filesystem root, need no
/// work.
pub fn ensure_parent_dir(path: &Utf8Path) -> io::Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_str().is_empty() || parent == Utf8Path::new("/") {
        return Ok(());
    }

    let (root, remainder) = split_anchor(parent)?;
    if remainder.as_str().is_empty() {
        return Ok(());
    }
    root.create_dir_all(&remainder)
}

/// Whether `path` names an existing regular file.
///
/// A missing file or missing parent directory yields `Ok(false)`; other I/O
/// failures are returned.
pub fn is_regular_file(path: &Utf8Path) -> io::Result<bool> {
    let Some(name) = path.file_name() else {
        return Ok(false);
    };
    let parent = match path.parent() {
        Some(p) if !p.as_str().is_empty() => p,
        _ => Utf8Path::new("."),
    };
    let dir = match fs_utf8::Dir::open_ambient_dir(parent, ambient_authority()) {
        Ok(dir) => dir,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err),
    };
    match dir.metadata(name) {
        Ok(meta) => Ok(meta.is_file()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}

/// Split `dir` into an opened anchor directory and the path beneath it.
///
/// Absolute paths anchor at the root (or the drive prefix on Windows);
/// relative paths anchor at the working directory.
fn split_anchor(dir: &Utf8Path) -> io::Result<(fs_utf8::Dir, Utf8PathBuf)> {
    let std_dir = dir.as_std_path();
    let (anchor, remainder) = match std_dir.components().next() {
        Some(Component::Prefix(prefix)) => {
            let prefix = prefix
                .as_os_str()
                .to_str()
                .ok_or_else(|| io::Error::other("non-UTF-8 path prefix"))?;
            let anchor = Utf8PathBuf::from(prefix).join(std::path::MAIN_SEPARATOR_STR);
            let remainder = dir
                .strip_prefix(&anchor)
                .or_else(|_| dir.strip_prefix(prefix))
                .map_err(|_| io::Error::other("failed to strip drive prefix"))?
                .to_path_buf();
            (anchor, remainder)
        }
        Some(Component::RootDir) => {
            let anchor = Utf8PathBuf::from(std::path::MAIN_SEPARATOR_STR);
            let remainder = dir
                .strip_prefix(&anchor)
                .map_err(|_| io::Error::other("failed to strip filesystem root"))?
                .to_path_buf();
            (anchor, remainder)
        }
        _ => (Utf8PathBuf::from("."), dir.to_path_buf()),
    };

    let root = fs_utf8::Dir::open_ambient_dir(&anchor, ambient_authority())?;
    Ok((root, remainder))
}
