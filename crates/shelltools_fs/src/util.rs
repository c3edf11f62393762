use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobMatcher};
use regex::Regex;

use crate::spec::{EnumPatternMode, ShellToolsError, SpecFsError};

////////////////////////////////////////////////////////////////////////////////
// #region PatternMatching

/// Compiled basename filters. Matching is a logical OR across patterns.
#[derive(Debug, Clone)]
pub(crate) enum TypePatternSeq {
    Literal(Vec<String>),
    Glob(Vec<GlobMatcher>),
    Regex(Vec<Regex>),
}

impl TypePatternSeq {
    pub(crate) fn compile(
        patterns: &[String],
        rule_pattern: EnumPatternMode,
    ) -> Result<Self, ShellToolsError> {
        match rule_pattern {
            EnumPatternMode::Literal => Ok(Self::Literal(patterns.to_vec())),
            EnumPatternMode::Glob => {
                let mut l_glob = Vec::with_capacity(patterns.len());
                for pattern in patterns {
                    let matcher = Glob::new(pattern)
                        .map_err(|e| {
                            ShellToolsError::InvalidPattern(format!("Invalid glob pattern: {e}"))
                        })?
                        .compile_matcher();
                    l_glob.push(matcher);
                }
                Ok(Self::Glob(l_glob))
            }
            EnumPatternMode::Regex => {
                let mut l_regex = Vec::with_capacity(patterns.len());
                for pattern in patterns {
                    let regex = Regex::new(pattern).map_err(|e| {
                        ShellToolsError::InvalidPattern(format!("Invalid regex pattern: {e}"))
                    })?;
                    l_regex.push(regex);
                }
                Ok(Self::Regex(l_regex))
            }
        }
    }

    pub(crate) fn is_match(&self, value: &str) -> bool {
        match self {
            Self::Literal(v) => v.iter().any(|p| value.contains(p.as_str())),
            Self::Glob(v) => v.iter().any(|p| p.is_match(value)),
            Self::Regex(v) => v.iter().any(|p| p.is_match(value)),
        }
    }
}

pub(crate) fn derive_basename(path: &Path) -> String {
    path.file_name()
        .map(|v| v.to_string_lossy().to_string())
        .unwrap_or_default()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region PathUtilities

fn _absolutize_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(path)
}

/// Canonicalize the deepest existing ancestor and re-append the missing tail.
fn _normalize_path(path: &Path) -> PathBuf {
    let path_abs = _absolutize_path(path);
    let mut path_cursor = path_abs.as_path();
    let mut l_tail: Vec<OsString> = Vec::new();
    loop {
        if let Ok(mut resolved) = fs::canonicalize(path_cursor) {
            for part in l_tail.iter().rev() {
                resolved.push(part);
            }
            return resolved;
        }
        match (path_cursor.parent(), path_cursor.file_name()) {
            (Some(parent), Some(name)) => {
                l_tail.push(name.to_os_string());
                path_cursor = parent;
            }
            _ => return path_abs,
        }
    }
}

pub(crate) fn is_overlap(src: &Path, dst: &Path) -> bool {
    let src_resolved = _normalize_path(src);
    let dst_resolved = _normalize_path(dst);
    dst_resolved.starts_with(&src_resolved) || src_resolved.starts_with(&dst_resolved)
}

/// Map `path_item` under `path_dir_src` onto the same relative location under
/// `path_dir_dst`.
///
/// The relative part is computed component-wise, so a root that merely shares
/// a textual prefix with the item (`/data/src` vs `/data/src2/a`) yields `None`
/// instead of a corrupted path.
///
/// # Examples
/// ```ignore
/// use std::path::Path;
/// let path_dst = derive_destination_path(
///     Path::new("/data/src/x/src/y.txt"),
///     Path::new("/data/src"),
///     Path::new("/backup"),
/// );
/// assert_eq!(path_dst.as_deref(), Some(Path::new("/backup/x/src/y.txt")));
/// ```
pub(crate) fn derive_destination_path(
    path_item: &Path,
    path_dir_src: &Path,
    path_dir_dst: &Path,
) -> Option<PathBuf> {
    path_item
        .strip_prefix(path_dir_src)
        .ok()
        .map(|path_rel| path_dir_dst.join(path_rel))
}

/// `true` when something (file, directory, or dangling symlink) occupies `path`.
pub(crate) fn is_occupied(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Traversal

/// Sorted immediate children of `path_dir`.
///
/// Fails only when the directory itself cannot be opened; unreadable entries
/// are pushed to `l_errors`.
pub(crate) fn list_children(
    path_dir: &Path,
    l_errors: &mut Vec<SpecFsError>,
) -> io::Result<Vec<fs::DirEntry>> {
    let mut l_entries = Vec::new();
    for entry_res in fs::read_dir(path_dir)? {
        match entry_res {
            Ok(entry) => l_entries.push(entry),
            Err(e) => l_errors.push(SpecFsError::from_io(path_dir, &e)),
        }
    }
    l_entries.sort_by_key(|entry| entry.file_name());
    Ok(l_entries)
}

/// Collect every non-directory descendant of `path_root`, depth-first.
///
/// Symlinked directories are reported neither as files nor descended into.
pub(crate) fn walk_files(
    path_root: &Path,
    l_paths: &mut Vec<PathBuf>,
    l_errors: &mut Vec<SpecFsError>,
) {
    let l_entries = match list_children(path_root, l_errors) {
        Ok(v) => v,
        Err(e) => {
            l_errors.push(SpecFsError::from_io(path_root, &e));
            return;
        }
    };

    let mut l_dirs = Vec::new();
    for entry in l_entries {
        let path_entry = entry.path();
        let cfg_file_type = match entry.file_type() {
            Ok(v) => v,
            Err(e) => {
                l_errors.push(SpecFsError::from_io(&path_entry, &e));
                continue;
            }
        };
        if cfg_file_type.is_dir() {
            l_dirs.push(path_entry);
        } else if cfg_file_type.is_symlink() && path_entry.is_dir() {
            continue;
        } else {
            l_paths.push(path_entry);
        }
    }

    for path_dir in l_dirs {
        walk_files(&path_dir, l_paths, l_errors);
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Transfer

fn is_cross_device(error: &io::Error) -> bool {
    if error.kind() == io::ErrorKind::CrossesDevices {
        return true;
    }
    #[cfg(unix)]
    {
        // EXDEV
        if error.raw_os_error() == Some(18) {
            return true;
        }
    }
    false
}

/// Hard links cannot be created here, but a plain rename may still work.
fn is_link_unsupported(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::Unsupported | io::ErrorKind::PermissionDenied
    )
}

/// Relocate one file or symlink without ever replacing `path_dst`.
///
/// The new name is created first (hard link, recreated symlink, or
/// `create_new` copy across devices), so an occupied destination fails with
/// [`io::ErrorKind::AlreadyExists`]. The source is unlinked afterwards; if that
/// fails the new name is removed again and the error returned.
pub(crate) fn move_entry(path_src: &Path, path_dst: &Path) -> io::Result<()> {
    let meta_src = fs::symlink_metadata(path_src)?;
    let res_link = if meta_src.file_type().is_symlink() {
        create_symbolic_link(path_src, path_dst)
    } else {
        fs::hard_link(path_src, path_dst)
    };
    match res_link {
        Ok(()) => {}
        Err(e) if is_cross_device(&e) => copy_entry(path_src, path_dst)?,
        // rename replaces an existing target, so only reach it when the name is free
        Err(e) if is_link_unsupported(&e) && !is_occupied(path_dst) => {
            return fs::rename(path_src, path_dst);
        }
        Err(e) => return Err(e),
    }

    if let Err(e) = fs::remove_file(path_src) {
        let _ = fs::remove_file(path_dst);
        return Err(e);
    }
    Ok(())
}

/// Copy one file (with metadata) or recreate one symlink. Never clobbers.
pub(crate) fn copy_entry(path_src: &Path, path_dst: &Path) -> io::Result<()> {
    let meta_src = fs::symlink_metadata(path_src)?;
    if meta_src.file_type().is_symlink() {
        return create_symbolic_link(path_src, path_dst);
    }
    copy_file_with_metadata(path_src, path_dst)
}

fn create_symbolic_link(path_src: &Path, path_dst: &Path) -> io::Result<()> {
    let target = fs::read_link(path_src)?;

    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(&target, path_dst)
    }
    #[cfg(windows)]
    {
        use std::os::windows::fs::{symlink_dir, symlink_file};
        if path_src.is_dir() {
            symlink_dir(&target, path_dst)
        } else {
            symlink_file(&target, path_dst)
        }
    }
    #[cfg(not(any(unix, windows)))]
    {
        let _ = (target, path_dst);
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "Symbolic links are unsupported on this platform",
        ))
    }
}

fn copy_file_with_metadata(path_file_src: &Path, path_file_dst: &Path) -> io::Result<()> {
    let mut file_src = fs::File::open(path_file_src)?;
    let mut file_dst = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path_file_dst)?;
    if let Err(e) = io::copy(&mut file_src, &mut file_dst) {
        drop(file_dst);
        let _ = fs::remove_file(path_file_dst);
        return Err(e);
    }
    drop(file_dst);
    apply_metadata(path_file_src, path_file_dst)
}

fn apply_metadata(path_file_src: &Path, path_file_dst: &Path) -> io::Result<()> {
    use filetime::{FileTime, set_file_times};

    let stat_src = fs::metadata(path_file_src)?;
    fs::set_permissions(path_file_dst, stat_src.permissions())?;

    let file_time_access = FileTime::from_last_access_time(&stat_src);
    let file_time_modify = FileTime::from_last_modification_time(&stat_src);
    set_file_times(path_file_dst, file_time_access, file_time_modify)?;

    #[cfg(target_os = "linux")]
    copy_xattrs_linux(path_file_src, path_file_dst);
    Ok(())
}

#[cfg(target_os = "linux")]
fn copy_xattrs_linux(path_file_src: &Path, path_file_dst: &Path) {
    let Ok(iter_xattr_names) = xattr::list(path_file_src) else {
        return;
    };

    for name in iter_xattr_names {
        let Some(raw_value) = xattr::get(path_file_src, &name).ok().flatten() else {
            continue;
        };
        let _ = xattr::set(path_file_dst, &name, &raw_value);
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
