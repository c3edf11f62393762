//! Single-file and whole-tree deletion.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::spec::ShellToolsError;

/// Delete one file (or symlink). Directories are refused.
pub fn delete<P>(path_file: P) -> Result<(), ShellToolsError>
where
    P: AsRef<Path>,
{
    let path_file = path_file.as_ref();
    let meta_file =
        fs::symlink_metadata(path_file).map_err(|e| ShellToolsError::from_io(path_file, e))?;
    if meta_file.is_dir() {
        return Err(ShellToolsError::IsADirectory(path_file.to_path_buf()));
    }
    fs::remove_file(path_file).map_err(|e| ShellToolsError::from_io(path_file, e))?;
    debug!(path = %path_file.display(), "Deleted file");
    Ok(())
}

/// Delete a directory and everything below it.
///
/// The root must be a real directory; a symlink root is refused instead of
/// followed.
pub fn remtree<P>(dir_root: P) -> Result<(), ShellToolsError>
where
    P: AsRef<Path>,
{
    let path_root = dir_root.as_ref();
    let meta_root =
        fs::symlink_metadata(path_root).map_err(|e| ShellToolsError::from_io(path_root, e))?;
    if !meta_root.is_dir() {
        return Err(ShellToolsError::NotADirectory(path_root.to_path_buf()));
    }
    fs::remove_dir_all(path_root).map_err(|e| ShellToolsError::from_io(path_root, e))?;
    debug!(path = %path_root.display(), "Deleted tree");
    Ok(())
}
