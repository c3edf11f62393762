//! Directory-tree reconciliation: mirror directories, relocate non-conflicting files.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::report::{ReportMerge, ReportMergeBuilder};
use crate::spec::{
    EnumFsErrorKind, EnumMergeTransferMode, ShellToolsError, SpecFsError, SpecMergeOptions,
};
use crate::util::{
    copy_entry, derive_destination_path, is_occupied, is_overlap, list_children, move_entry,
};

#[derive(Debug)]
struct SpecMergeContext {
    path_dir_src: PathBuf,
    path_dir_dst: PathBuf,
    spec_merge_options: SpecMergeOptions,
    builder_merge_report: ReportMergeBuilder,
}

/// Merge `dir_source` into `dir_destination` with default options (move mode).
///
/// See [`merge_tree`].
pub fn merge<P, Q>(dir_source: P, dir_destination: Q) -> Result<ReportMerge, ShellToolsError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    merge_tree(dir_source, dir_destination, SpecMergeOptions::default())
}

/// Reconcile the tree under `dir_source` into `dir_destination`.
///
/// - Every source directory gets a destination counterpart (created if absent).
/// - Every source file whose destination counterpart is absent is moved there
///   (or copied, with [`EnumMergeTransferMode::Copy`]).
/// - Every source file whose counterpart already exists stays where it is and
///   is listed in [`ReportMerge::skips`]. The destination file is never touched.
///
/// Per-entry failures (file in use, permission denied, destination appearing
/// between check and transfer) are collected in the report and never stop the
/// traversal. Returns [`ShellToolsError`] only for setup failures: a source
/// that is not a directory, overlapping roots, or an unusable destination root.
pub fn merge_tree<P, Q>(
    dir_source: P,
    dir_destination: Q,
    spec_merge_options: SpecMergeOptions,
) -> Result<ReportMerge, ShellToolsError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let path_dir_src = dir_source.as_ref().to_path_buf();
    let path_dir_dst = dir_destination.as_ref().to_path_buf();

    if !path_dir_src.is_dir() {
        return Err(ShellToolsError::SourceNotDirectory(path_dir_src));
    }
    if is_overlap(&path_dir_src, &path_dir_dst) {
        return Err(ShellToolsError::SourceDestinationOverlap {
            path_source: path_dir_src,
            path_destination: path_dir_dst,
        });
    }
    if path_dir_dst.exists() && !path_dir_dst.is_dir() {
        return Err(ShellToolsError::DestinationInitFailed {
            path: path_dir_dst,
            message: "Destination root exists and is not a directory.".to_string(),
        });
    }
    if !spec_merge_options.if_dry_run {
        fs::create_dir_all(&path_dir_dst).map_err(|e| ShellToolsError::DestinationInitFailed {
            path: path_dir_dst.clone(),
            message: e.to_string(),
        })?;
    }

    let mut spec_merge_ctx = SpecMergeContext {
        path_dir_src: path_dir_src.clone(),
        path_dir_dst,
        spec_merge_options,
        builder_merge_report: ReportMergeBuilder::default(),
    };

    walk_directory(&path_dir_src, &mut spec_merge_ctx);

    let report_merge = spec_merge_ctx.builder_merge_report.build();
    if !report_merge.skips.is_empty() {
        warn!(
            skips = ?report_merge.skips,
            "Files not merged; destination already exists"
        );
    }
    info!(
        source = %spec_merge_ctx.path_dir_src.display(),
        destination = %spec_merge_ctx.path_dir_dst.display(),
        "{report_merge}"
    );
    Ok(report_merge)
}

fn walk_directory(path_root: &Path, spec_merge_ctx: &mut SpecMergeContext) {
    let mut l_errors = Vec::new();
    let l_entries = list_children(path_root, &mut l_errors);
    for spec_error in l_errors {
        spec_merge_ctx.builder_merge_report.add_warning(format!(
            "Failed to read directory entry under {} ({})",
            path_root.display(),
            spec_error.exception
        ));
    }
    let l_entries = match l_entries {
        Ok(v) => v,
        Err(e) => {
            spec_merge_ctx.builder_merge_report.add_warning(format!(
                "Failed to read directory {} ({e})",
                path_root.display()
            ));
            return;
        }
    };

    let mut l_dirs: Vec<PathBuf> = Vec::new();
    let mut l_files: Vec<PathBuf> = Vec::new();
    for entry in l_entries {
        let path_entry = entry.path();
        match entry.file_type() {
            // symlinks (to directories too) are relocated as links, never followed
            Ok(cfg_file_type) if cfg_file_type.is_dir() => l_dirs.push(path_entry),
            Ok(cfg_file_type) if cfg_file_type.is_file() || cfg_file_type.is_symlink() => {
                l_files.push(path_entry)
            }
            Ok(_) => spec_merge_ctx
                .builder_merge_report
                .add_warning(format!("Special file skipped: {}", path_entry.display())),
            Err(e) => spec_merge_ctx
                .builder_merge_report
                .add_warning(format!("Failed to inspect {} ({e})", path_entry.display())),
        }
    }

    for path_dir_src_sub in l_dirs {
        handle_dir_entry(&path_dir_src_sub, spec_merge_ctx);
        walk_directory(&path_dir_src_sub, spec_merge_ctx);
    }

    for path_file_src in l_files {
        handle_file_entry(&path_file_src, spec_merge_ctx);
    }
}

fn resolve_destination(
    path_src: &Path,
    spec_merge_ctx: &mut SpecMergeContext,
) -> Option<PathBuf> {
    let path_dst = derive_destination_path(
        path_src,
        &spec_merge_ctx.path_dir_src,
        &spec_merge_ctx.path_dir_dst,
    );
    if path_dst.is_none() {
        spec_merge_ctx.builder_merge_report.add_error(SpecFsError {
            path: path_src.to_path_buf(),
            kind: EnumFsErrorKind::Other,
            exception: format!(
                "Path is not under source root {}",
                spec_merge_ctx.path_dir_src.display()
            ),
        });
    }
    path_dst
}

fn handle_dir_entry(path_dir_src_sub: &Path, spec_merge_ctx: &mut SpecMergeContext) {
    spec_merge_ctx.builder_merge_report.add_scanned();
    let Some(path_dir_dst_sub) = resolve_destination(path_dir_src_sub, spec_merge_ctx) else {
        return;
    };
    if path_dir_dst_sub.is_dir() {
        return;
    }

    if spec_merge_ctx.spec_merge_options.if_dry_run {
        spec_merge_ctx.builder_merge_report.add_dir_created();
        return;
    }
    match fs::create_dir_all(&path_dir_dst_sub) {
        Ok(()) => {
            debug!(path = %path_dir_dst_sub.display(), "Created directory");
            spec_merge_ctx.builder_merge_report.add_dir_created();
        }
        Err(e) => {
            warn!(path = %path_dir_dst_sub.display(), error = %e, "Failed to create directory");
            spec_merge_ctx
                .builder_merge_report
                .add_error(SpecFsError::from_io(&path_dir_dst_sub, &e));
        }
    }
}

fn handle_file_entry(path_file_src: &Path, spec_merge_ctx: &mut SpecMergeContext) {
    spec_merge_ctx.builder_merge_report.add_scanned();
    let Some(path_file_dst) = resolve_destination(path_file_src, spec_merge_ctx) else {
        return;
    };

    if is_occupied(&path_file_dst) {
        spec_merge_ctx
            .builder_merge_report
            .add_skip(path_file_src.to_path_buf());
        return;
    }

    if spec_merge_ctx.spec_merge_options.if_dry_run {
        spec_merge_ctx.builder_merge_report.add_transferred();
        return;
    }

    // the directory pass normally created it already
    if let Some(path_parent_dst) = path_file_dst.parent()
        && let Err(e) = fs::create_dir_all(path_parent_dst)
    {
        spec_merge_ctx
            .builder_merge_report
            .add_error(SpecFsError::from_io(path_parent_dst, &e));
        return;
    }

    let res_transfer = match spec_merge_ctx.spec_merge_options.rule_transfer {
        EnumMergeTransferMode::Move => move_entry(path_file_src, &path_file_dst),
        EnumMergeTransferMode::Copy => copy_entry(path_file_src, &path_file_dst),
    };
    record_transfer(path_file_src, &path_file_dst, res_transfer, spec_merge_ctx);
}

/// A destination that appeared after the occupancy check counts as a skip.
fn record_transfer(
    path_file_src: &Path,
    path_file_dst: &Path,
    res_transfer: io::Result<()>,
    spec_merge_ctx: &mut SpecMergeContext,
) {
    match res_transfer {
        Ok(()) => {
            debug!(
                source = %path_file_src.display(),
                destination = %path_file_dst.display(),
                "Merged file"
            );
            spec_merge_ctx.builder_merge_report.add_transferred();
        }
        Err(e) => {
            let spec_error = SpecFsError::from_io(path_file_src, &e);
            if spec_error.kind == EnumFsErrorKind::AlreadyExists {
                spec_merge_ctx
                    .builder_merge_report
                    .add_skip(path_file_src.to_path_buf());
                return;
            }
            warn!(
                path = %path_file_src.display(),
                kind = spec_error.kind.as_str(),
                error = %e,
                "Could not merge file"
            );
            spec_merge_ctx.builder_merge_report.add_error(spec_error);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use tempfile::TempDir;

    use super::{SpecMergeContext, merge, merge_tree, record_transfer};
    use crate::report::ReportMergeBuilder;
    use crate::spec::{EnumFsErrorKind, EnumMergeTransferMode, ShellToolsError, SpecMergeOptions};

    fn write_text(path: &Path, txt: &str) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent");
        }
        std::fs::write(path, txt).expect("write text");
    }

    fn read_text(path: &Path) -> String {
        std::fs::read_to_string(path).expect("read text")
    }

    fn make_context(tmp: &TempDir) -> SpecMergeContext {
        SpecMergeContext {
            path_dir_src: tmp.path().join("src"),
            path_dir_dst: tmp.path().join("dst"),
            spec_merge_options: SpecMergeOptions::default(),
            builder_merge_report: ReportMergeBuilder::default(),
        }
    }

    #[test]
    fn merge_moves_files_into_empty_destination() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        write_text(&src.join("a/x.txt"), "x");
        write_text(&src.join("a/b/y.txt"), "y");

        let report = merge(&src, &dst).expect("merge");

        assert!(report.skips.is_empty());
        assert_eq!(report.error_count(), 0);
        assert_eq!(report.cnt_transferred, 2);
        assert_eq!(report.cnt_dirs_created, 2);
        assert_eq!(read_text(&dst.join("a/x.txt")), "x");
        assert_eq!(read_text(&dst.join("a/b/y.txt")), "y");
        assert!(!src.join("a/x.txt").exists());
        assert!(!src.join("a/b/y.txt").exists());
        // source directories stay behind, emptied
        assert!(src.join("a/b").is_dir());
    }

    #[test]
    fn merge_skips_existing_destination_file() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        write_text(&src.join("a/x.txt"), "new");
        write_text(&src.join("a/z.txt"), "z");
        write_text(&dst.join("a/x.txt"), "old");

        let report = merge(&src, &dst).expect("merge");

        assert_eq!(report.skips, vec![src.join("a/x.txt")]);
        assert_eq!(read_text(&dst.join("a/x.txt")), "old");
        assert_eq!(read_text(&src.join("a/x.txt")), "new");
        assert_eq!(read_text(&dst.join("a/z.txt")), "z");
        assert!(!src.join("a/z.txt").exists());
        assert_eq!(report.cnt_transferred, 1);
    }

    #[test]
    fn merge_creates_empty_directories() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        std::fs::create_dir_all(src.join("p/q/r")).expect("mkdir");
        std::fs::create_dir_all(src.join("s")).expect("mkdir");
        std::fs::create_dir_all(dst.join("p")).expect("mkdir");

        let report = merge(&src, &dst).expect("merge");

        assert!(dst.join("p/q/r").is_dir());
        assert!(dst.join("s").is_dir());
        assert_eq!(report.cnt_dirs_created, 3);
        assert_eq!(report.error_count(), 0);
    }

    #[test]
    fn merge_empty_source_is_noop() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        std::fs::create_dir_all(&src).expect("mkdir");

        let report = merge(&src, &dst).expect("merge");
        assert_eq!(report.cnt_scanned, 0);
        assert!(report.skips.is_empty());
        assert!(dst.is_dir());
    }

    #[test]
    fn merge_twice_is_idempotent() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        write_text(&src.join("a/x.txt"), "x");
        write_text(&src.join("b/c/y.txt"), "y");

        let report_first = merge(&src, &dst).expect("first merge");
        assert_eq!(report_first.cnt_transferred, 2);

        let report_second = merge(&src, &dst).expect("second merge");
        assert!(report_second.skips.is_empty());
        assert_eq!(report_second.error_count(), 0);
        assert_eq!(report_second.cnt_transferred, 0);
        assert_eq!(report_second.cnt_dirs_created, 0);
    }

    #[test]
    fn merge_copy_mode_keeps_source() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        write_text(&src.join("a/x.txt"), "x");

        let spec_merge_options = SpecMergeOptions {
            rule_transfer: EnumMergeTransferMode::Copy,
            ..SpecMergeOptions::default()
        };
        let report = merge_tree(&src, &dst, spec_merge_options).expect("merge");

        assert_eq!(report.cnt_transferred, 1);
        assert_eq!(read_text(&src.join("a/x.txt")), "x");
        assert_eq!(read_text(&dst.join("a/x.txt")), "x");
    }

    #[test]
    fn merge_default_mode_is_move() {
        assert_eq!(
            SpecMergeOptions::default().rule_transfer,
            EnumMergeTransferMode::Move
        );
    }

    #[test]
    fn merge_dry_run_does_not_mutate() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        write_text(&src.join("a/x.txt"), "x");

        let spec_merge_options = SpecMergeOptions {
            if_dry_run: true,
            ..SpecMergeOptions::default()
        };
        let report = merge_tree(&src, &dst, spec_merge_options).expect("merge");

        assert_eq!(report.cnt_transferred, 1);
        assert_eq!(report.cnt_dirs_created, 1);
        assert!(src.join("a/x.txt").exists());
        assert!(!dst.exists());
    }

    #[test]
    fn merge_root_that_shares_text_prefix_with_destination() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("data");
        let dst = tmp.path().join("data_backup");
        write_text(&src.join("data/data.txt"), "d");

        let report = merge(&src, &dst).expect("merge");

        assert_eq!(report.error_count(), 0);
        assert_eq!(read_text(&dst.join("data/data.txt")), "d");
    }

    #[test]
    fn merge_overlap_rejected() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        std::fs::create_dir_all(&src).expect("mkdir src");

        let err = merge(&src, src.join("nested")).expect_err("must fail");
        assert!(matches!(
            err,
            ShellToolsError::SourceDestinationOverlap { .. }
        ));
    }

    #[test]
    fn merge_missing_source_rejected() {
        let tmp = TempDir::new().expect("tempdir");
        let err =
            merge(tmp.path().join("missing"), tmp.path().join("dst")).expect_err("must fail");
        assert!(matches!(err, ShellToolsError::SourceNotDirectory(_)));
    }

    #[test]
    fn merge_records_directory_creation_failure_and_continues() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        write_text(&src.join("blocked/inner.txt"), "i");
        write_text(&src.join("ok/fine.txt"), "f");
        // a file sits where the directory should go
        write_text(&dst.join("blocked"), "file");

        let report = merge(&src, &dst).expect("merge");

        assert!(report.error_count() >= 1);
        assert!(src.join("blocked/inner.txt").exists());
        assert_eq!(read_text(&dst.join("ok/fine.txt")), "f");
    }

    #[cfg(unix)]
    #[test]
    fn merge_moves_symlink_as_link() {
        use std::os::unix::fs::symlink;

        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        write_text(&src.join("target.txt"), "t");
        symlink("target.txt", src.join("link.txt")).expect("symlink");

        let report = merge(&src, &dst).expect("merge");

        assert_eq!(report.error_count(), 0);
        assert!(dst.join("link.txt").is_symlink());
        assert_eq!(
            std::fs::read_link(dst.join("link.txt")).expect("read link"),
            Path::new("target.txt")
        );
    }

    #[test]
    fn transfer_into_appeared_destination_is_skip() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src/x.txt");
        let dst = tmp.path().join("dst/x.txt");
        let mut spec_merge_ctx = make_context(&tmp);

        let res_transfer = Err(std::io::Error::from(std::io::ErrorKind::AlreadyExists));
        record_transfer(&src, &dst, res_transfer, &mut spec_merge_ctx);
        let res_transfer = Err(std::io::Error::from(std::io::ErrorKind::PermissionDenied));
        record_transfer(&src, &dst, res_transfer, &mut spec_merge_ctx);
        record_transfer(&src, &dst, Ok(()), &mut spec_merge_ctx);

        let report = spec_merge_ctx.builder_merge_report.build();
        assert_eq!(report.skips, vec![src.clone()]);
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.errors[0].kind, EnumFsErrorKind::PermissionDenied);
        assert_eq!(report.errors[0].path, src);
        assert_eq!(report.cnt_transferred, 1);
    }

    #[cfg(unix)]
    #[test]
    fn merge_records_transfer_failure_and_continues() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        write_text(&src.join("a_locked/x.txt"), "x");
        write_text(&src.join("b_open/y.txt"), "y");
        let path_locked = src.join("a_locked");
        std::fs::set_permissions(&path_locked, std::fs::Permissions::from_mode(0o555))
            .expect("lock dir");
        // privileged users ignore directory permissions
        if std::fs::write(path_locked.join("check"), "c").is_ok() {
            std::fs::set_permissions(&path_locked, std::fs::Permissions::from_mode(0o755))
                .expect("unlock dir");
            return;
        }

        let report = merge(&src, &dst);
        std::fs::set_permissions(&path_locked, std::fs::Permissions::from_mode(0o755))
            .expect("unlock dir");
        let report = report.expect("merge");

        assert_eq!(report.error_count(), 1);
        assert_eq!(report.errors[0].path, path_locked.join("x.txt"));
        assert_eq!(report.errors[0].kind, EnumFsErrorKind::PermissionDenied);
        assert!(report.skips.is_empty());
        assert_eq!(read_text(&path_locked.join("x.txt")), "x");
        assert!(!dst.join("a_locked/x.txt").exists());
        assert_eq!(read_text(&dst.join("b_open/y.txt")), "y");
        assert!(!src.join("b_open/y.txt").exists());
        assert_eq!(report.cnt_transferred, 1);
    }
}
