//! Age-based pruning of the direct child files of one directory.

use std::fs;
use std::io;
use std::path::Path;

use chrono::{DateTime, Local, NaiveDate};
use tracing::{debug, info, warn};

use crate::report::{EnumPruneStatus, ReportPrune};
use crate::spec::{ShellToolsError, SpecFsError, SpecPruneOptions};
use crate::util::list_children;

/// Delete direct child files of `dir_target` older than `max_age_days` days.
///
/// See [`prune_older`].
pub fn delolder<P>(dir_target: P, max_age_days: u32) -> Result<ReportPrune, ShellToolsError>
where
    P: AsRef<Path>,
{
    prune_older(dir_target, max_age_days, SpecPruneOptions::default())
}

/// Delete every direct child regular file of `dir_target` whose modification
/// date lies more than `max_age_days` calendar days before today.
///
/// Ages are whole days between calendar dates, so a file modified exactly
/// `max_age_days` days ago is kept. Subdirectories (and anything inside them)
/// and symlinks are never inspected or removed. "Today" is captured once per
/// call.
///
/// A missing `dir_target` is not an error: the report has
/// [`ReportPrune::if_path_missing`] set. Per-file failures land in
/// [`ReportPrune::errors`].
pub fn prune_older<P>(
    dir_target: P,
    max_age_days: u32,
    spec_prune_options: SpecPruneOptions,
) -> Result<ReportPrune, ShellToolsError>
where
    P: AsRef<Path>,
{
    let path_dir = dir_target.as_ref();
    let mut report_prune = ReportPrune::default();

    match fs::metadata(path_dir) {
        Ok(meta_dir) if meta_dir.is_dir() => {}
        Ok(_) => return Err(ShellToolsError::NotADirectory(path_dir.to_path_buf())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            report_prune.if_path_missing = true;
            info!(path = %path_dir.display(), "Nothing to prune; path does not exist");
            return Ok(report_prune);
        }
        Err(e) => return Err(ShellToolsError::from_io(path_dir, e)),
    }

    let date_today = spec_prune_options
        .date_today
        .unwrap_or_else(|| Local::now().date_naive());

    let l_entries = list_children(path_dir, &mut report_prune.errors)
        .map_err(|e| ShellToolsError::from_io(path_dir, e))?;

    for entry in l_entries {
        let path_entry = entry.path();
        let stat_entry = match fs::symlink_metadata(&path_entry) {
            Ok(v) => v,
            Err(e) => {
                report_prune
                    .errors
                    .push(SpecFsError::from_io(&path_entry, &e));
                continue;
            }
        };
        if !stat_entry.file_type().is_file() {
            continue;
        }
        report_prune.cnt_examined += 1;

        let date_modified = match stat_entry.modified() {
            Ok(time_modified) => DateTime::<Local>::from(time_modified).date_naive(),
            Err(e) => {
                report_prune
                    .errors
                    .push(SpecFsError::from_io(&path_entry, &e));
                continue;
            }
        };
        if !is_older_than(date_modified, date_today, max_age_days) {
            continue;
        }

        if spec_prune_options.if_dry_run {
            report_prune.cnt_deleted += 1;
            report_prune.bytes_reclaimed += stat_entry.len();
            continue;
        }
        match fs::remove_file(&path_entry) {
            Ok(()) => {
                debug!(path = %path_entry.display(), modified = %date_modified, "Deleted file");
                report_prune.cnt_deleted += 1;
                report_prune.bytes_reclaimed += stat_entry.len();
            }
            Err(e) => {
                warn!(path = %path_entry.display(), error = %e, "Could not delete file");
                report_prune
                    .errors
                    .push(SpecFsError::from_io(&path_entry, &e));
            }
        }
    }

    match report_prune.status() {
        EnumPruneStatus::NothingPruned => {
            info!(path = %path_dir.display(), "No files deleted")
        }
        _ => info!(path = %path_dir.display(), "{report_prune}"),
    }
    Ok(report_prune)
}

/// Strict day-count comparison; future-dated files are never old.
pub(crate) fn is_older_than(
    date_modified: NaiveDate,
    date_today: NaiveDate,
    max_age_days: u32,
) -> bool {
    (date_today - date_modified).num_days() > i64::from(max_age_days)
}
