//! Option models, per-item error records and top-level error types.

use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use thiserror::Error;

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// How `merge_tree` transfers a file whose destination is free.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumMergeTransferMode {
    /// Relocate the file; it no longer exists at the source afterwards.
    Move,
    /// Copy the file and leave the source in place.
    Copy,
}

/// Pattern matching mode for name filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumPatternMode {
    /// Shell-like wildcards (`*`, `?`, character classes).
    Glob,
    /// Regular expression pattern.
    Regex,
    /// Substring match.
    Literal,
}

/// Cross-platform classification of one per-item failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumFsErrorKind {
    /// Target path is absent.
    NotFound,
    /// Access refused by the OS.
    PermissionDenied,
    /// Target is locked or in use by another process.
    ResourceBusy,
    /// Destination already occupied.
    AlreadyExists,
    /// Anything else.
    Other,
}

impl EnumFsErrorKind {
    /// Classify a raw IO error.
    pub fn from_io(error: &io::Error) -> Self {
        #[cfg(windows)]
        {
            // ERROR_SHARING_VIOLATION / ERROR_LOCK_VIOLATION
            if matches!(error.raw_os_error(), Some(32) | Some(33)) {
                return Self::ResourceBusy;
            }
        }
        match error.kind() {
            io::ErrorKind::NotFound => Self::NotFound,
            io::ErrorKind::PermissionDenied => Self::PermissionDenied,
            io::ErrorKind::AlreadyExists => Self::AlreadyExists,
            io::ErrorKind::ResourceBusy | io::ErrorKind::ExecutableFileBusy => Self::ResourceBusy,
            _ => Self::Other,
        }
    }

    /// Stable snake_case label used in reports and bridges.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::PermissionDenied => "permission_denied",
            Self::ResourceBusy => "resource_busy",
            Self::AlreadyExists => "already_exists",
            Self::Other => "other",
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Options

/// Input options for `merge_tree`.
#[derive(Debug, Clone)]
pub struct SpecMergeOptions {
    /// Transfer behavior for files whose destination is free.
    pub rule_transfer: EnumMergeTransferMode,
    /// Do not mutate filesystem; record what would happen.
    pub if_dry_run: bool,
}

impl Default for SpecMergeOptions {
    fn default() -> Self {
        Self {
            rule_transfer: EnumMergeTransferMode::Move,
            if_dry_run: false,
        }
    }
}

/// Input options for `prune_older`.
#[derive(Debug, Clone, Default)]
pub struct SpecPruneOptions {
    /// Reference calendar date. `None` means the local date at call time.
    pub date_today: Option<NaiveDate>,
    /// Count eligible files without deleting them.
    pub if_dry_run: bool,
}

/// Input options for `find`.
#[derive(Debug, Clone)]
pub struct SpecFindOptions {
    /// Pattern interpretation mode.
    pub rule_pattern: EnumPatternMode,
    /// Descend into subdirectories (files only) instead of listing direct children.
    pub if_recursive: bool,
}

impl Default for SpecFindOptions {
    fn default() -> Self {
        Self {
            rule_pattern: EnumPatternMode::Glob,
            if_recursive: false,
        }
    }
}

/// Input options for `findstr`.
#[derive(Debug, Clone)]
pub struct SpecSearchOptions {
    /// Only scan files whose basename matches one of these patterns.
    pub patterns_include_files: Option<Vec<String>>,
    /// Pattern interpretation mode for `patterns_include_files`.
    pub rule_pattern: EnumPatternMode,
}

impl Default for SpecSearchOptions {
    fn default() -> Self {
        Self {
            patterns_include_files: None,
            rule_pattern: EnumPatternMode::Glob,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StructsAndErrors

/// One per-item failure with path, kind and error text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecFsError {
    /// Failed path.
    pub path: PathBuf,
    /// Classified failure kind.
    pub kind: EnumFsErrorKind,
    /// User-facing error text.
    pub exception: String,
}

impl SpecFsError {
    /// Build a record from an IO error raised while operating on `path`.
    pub fn from_io(path: &Path, error: &io::Error) -> Self {
        Self {
            path: path.to_path_buf(),
            kind: EnumFsErrorKind::from_io(error),
            exception: error.to_string(),
        }
    }
}

/// "Top-level call failed" errors.
#[derive(Debug, Error)]
pub enum ShellToolsError {
    /// Target path is absent.
    #[error("Path not found: {}", .0.display())]
    NotFound(PathBuf),
    /// Access refused.
    #[error("Permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),
    /// Target in use by another process.
    #[error("Resource busy: {}", .0.display())]
    ResourceBusy(PathBuf),
    /// Target already exists.
    #[error("Already exists: {}", .0.display())]
    AlreadyExists(PathBuf),
    /// Expected a directory.
    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
    /// Expected a file.
    #[error("Is a directory: {}", .0.display())]
    IsADirectory(PathBuf),
    /// Merge source is not a directory.
    #[error("Source is not a directory: {}", .0.display())]
    SourceNotDirectory(PathBuf),
    /// Source and destination overlap (`src` contains `dst` or vice versa).
    #[error(
        "Source and destination directories overlap: {} <-> {}",
        .path_source.display(),
        .path_destination.display()
    )]
    SourceDestinationOverlap {
        /// Normalized source directory.
        path_source: PathBuf,
        /// Normalized destination directory.
        path_destination: PathBuf,
    },
    /// Destination root initialization failed.
    #[error("Failed to initialize destination {}: {message}", .path.display())]
    DestinationInitFailed {
        /// Destination path that failed initialization.
        path: PathBuf,
        /// Underlying IO error text.
        message: String,
    },
    /// Invalid name pattern.
    #[error("{0}")]
    InvalidPattern(String),
    /// Unclassified IO failure.
    #[error("IO error on {}: {error}", .path.display())]
    Io {
        /// Path being operated on.
        path: PathBuf,
        /// Underlying error.
        #[source]
        error: io::Error,
    },
}

impl ShellToolsError {
    /// Classify an IO error raised while operating on `path`.
    pub fn from_io(path: &Path, error: io::Error) -> Self {
        let path = path.to_path_buf();
        match EnumFsErrorKind::from_io(&error) {
            EnumFsErrorKind::NotFound => Self::NotFound(path),
            EnumFsErrorKind::PermissionDenied => Self::PermissionDenied(path),
            EnumFsErrorKind::ResourceBusy => Self::ResourceBusy(path),
            EnumFsErrorKind::AlreadyExists => Self::AlreadyExists(path),
            EnumFsErrorKind::Other => Self::Io { path, error },
        }
    }

    /// Project onto the per-item kind taxonomy.
    pub fn kind(&self) -> EnumFsErrorKind {
        match self {
            Self::NotFound(_) => EnumFsErrorKind::NotFound,
            Self::PermissionDenied(_) => EnumFsErrorKind::PermissionDenied,
            Self::ResourceBusy(_) => EnumFsErrorKind::ResourceBusy,
            Self::AlreadyExists(_) => EnumFsErrorKind::AlreadyExists,
            Self::Io { error, .. } => EnumFsErrorKind::from_io(error),
            _ => EnumFsErrorKind::Other,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
