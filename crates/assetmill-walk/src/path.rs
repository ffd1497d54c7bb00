//! Lexical path helpers.
//!
//! Destination paths are compared against source paths and against the
//! output root, so both sides must be spelled the same way. Nothing here
//! touches the filesystem except [`absolute`], which reads the current
//! working directory.

use std::io;
use std::path::{Component, Path, PathBuf};

/// Normalize a path lexically: drop `.` components and fold `..` into the
/// preceding component. `..` directly below the root is discarded.
pub fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// Resolve a path against the current directory and clean it.
pub fn absolute(path: &Path) -> io::Result<PathBuf> {
    Ok(clean(&std::path::absolute(path)?))
}

/// Returns `true` if `path` lies at or below `root`. Both are cleaned first.
pub fn is_within(root: &Path, path: &Path) -> bool {
    clean(path).starts_with(clean(root))
}

/// File extension including the leading dot, or an empty string.
pub fn dotted_extension(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}
