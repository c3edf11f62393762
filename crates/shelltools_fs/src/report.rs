//! Run-time report models and mutable report builders.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::spec::SpecFsError;

////////////////////////////////////////////////////////////////////////////////
// #region Merge

/// Aggregate counters and diagnostics for one `merge_tree` run.
#[derive(Debug, Default, Clone)]
pub struct ReportMerge {
    /// Total scanned directory/file entries.
    pub cnt_scanned: u64,
    /// Destination directories created.
    pub cnt_dirs_created: u64,
    /// Files moved or copied into the destination (would-be transfers in a dry run).
    pub cnt_transferred: u64,
    /// Source paths left in place because the destination already existed.
    pub skips: Vec<PathBuf>,
    /// Non-fatal warnings collected during traversal.
    pub warnings: Vec<String>,
    /// Per-entry failures.
    pub errors: Vec<SpecFsError>,
}

impl ReportMerge {
    /// Number of skipped source files.
    pub fn skip_count(&self) -> usize {
        self.skips.len()
    }

    /// Number of collected hard errors.
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Number of collected warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_scanned".to_string(), self.cnt_scanned);
        dict_counts.insert("cnt_dirs_created".to_string(), self.cnt_dirs_created);
        dict_counts.insert("cnt_transferred".to_string(), self.cnt_transferred);
        dict_counts.insert("cnt_skipped".to_string(), self.skip_count() as u64);
        dict_counts.insert("cnt_errors".to_string(), self.error_count() as u64);
        dict_counts.insert("cnt_warnings".to_string(), self.warning_count() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        format!(
            "{prefix} scanned={} dirs_created={} transferred={} skipped={} errors={} warnings={}",
            self.cnt_scanned,
            self.cnt_dirs_created,
            self.cnt_transferred,
            self.skip_count(),
            self.error_count(),
            self.warning_count()
        )
    }
}

impl fmt::Display for ReportMerge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[MERGE]"))
    }
}

/// Mutable accumulator for merge statistics.
#[derive(Debug, Default, Clone)]
pub struct ReportMergeBuilder {
    /// See [`ReportMerge::cnt_scanned`].
    pub cnt_scanned: u64,
    /// See [`ReportMerge::cnt_dirs_created`].
    pub cnt_dirs_created: u64,
    /// See [`ReportMerge::cnt_transferred`].
    pub cnt_transferred: u64,
    /// See [`ReportMerge::skips`].
    pub skips: Vec<PathBuf>,
    /// See [`ReportMerge::warnings`].
    pub warnings: Vec<String>,
    /// See [`ReportMerge::errors`].
    pub errors: Vec<SpecFsError>,
}

impl ReportMergeBuilder {
    pub fn add_scanned(&mut self) {
        self.cnt_scanned += 1;
    }

    pub fn add_dir_created(&mut self) {
        self.cnt_dirs_created += 1;
    }

    pub fn add_transferred(&mut self) {
        self.cnt_transferred += 1;
    }

    /// Record one source path left in place.
    pub fn add_skip(&mut self, path: PathBuf) {
        self.skips.push(path);
    }

    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    /// Add one path-scoped error.
    pub fn add_error(&mut self, error: SpecFsError) {
        self.errors.push(error);
    }

    /// Finalize builder into immutable report.
    pub fn build(self) -> ReportMerge {
        ReportMerge {
            cnt_scanned: self.cnt_scanned,
            cnt_dirs_created: self.cnt_dirs_created,
            cnt_transferred: self.cnt_transferred,
            skips: self.skips,
            warnings: self.warnings,
            errors: self.errors,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Prune

/// Outcome class of one prune call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumPruneStatus {
    /// Target directory did not exist.
    PathMissing,
    /// Directory listed, no file was old enough (or every delete failed).
    NothingPruned,
    /// Number of files deleted.
    Pruned(u64),
}

/// Counters for one `prune_older` run.
#[derive(Debug, Default, Clone)]
pub struct ReportPrune {
    /// Direct-child regular files inspected.
    pub cnt_examined: u64,
    /// Files deleted (or eligible, in dry-run mode).
    pub cnt_deleted: u64,
    /// Sum of deleted file sizes in bytes.
    pub bytes_reclaimed: u64,
    /// Target directory was absent.
    pub if_path_missing: bool,
    /// Per-file stat/delete failures.
    pub errors: Vec<SpecFsError>,
}

impl ReportPrune {
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Distinguish "nothing pruned" from "deleted N files".
    pub fn status(&self) -> EnumPruneStatus {
        if self.if_path_missing {
            EnumPruneStatus::PathMissing
        } else if self.cnt_deleted == 0 {
            EnumPruneStatus::NothingPruned
        } else {
            EnumPruneStatus::Pruned(self.cnt_deleted)
        }
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_examined".to_string(), self.cnt_examined);
        dict_counts.insert("cnt_deleted".to_string(), self.cnt_deleted);
        dict_counts.insert("bytes_reclaimed".to_string(), self.bytes_reclaimed);
        dict_counts.insert("cnt_errors".to_string(), self.error_count() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        match self.status() {
            EnumPruneStatus::PathMissing => format!("{prefix} path missing"),
            EnumPruneStatus::NothingPruned => format!(
                "{prefix} nothing pruned examined={} errors={}",
                self.cnt_examined,
                self.error_count()
            ),
            EnumPruneStatus::Pruned(n) => format!(
                "{prefix} examined={} deleted={n} bytes_reclaimed={} errors={}",
                self.cnt_examined,
                self.bytes_reclaimed,
                self.error_count()
            ),
        }
    }
}

impl fmt::Display for ReportPrune {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[PRUNE]"))
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ListingSearchSize

/// Paths produced by `list_directory` / `find`.
#[derive(Debug, Default, Clone)]
pub struct ReportListing {
    /// Matched paths in traversal order.
    pub paths: Vec<PathBuf>,
    /// Locations or entries that could not be read.
    pub errors: Vec<SpecFsError>,
}

impl ReportListing {
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }
}

/// One file containing the searched text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSearchMatch {
    /// File basename.
    pub name_file: String,
    /// Directory holding the file.
    pub path_dir: PathBuf,
}

impl SpecSearchMatch {
    /// Full path of the matched file.
    pub fn path(&self) -> PathBuf {
        self.path_dir.join(&self.name_file)
    }
}

/// Result of one `findstr` run.
#[derive(Debug, Default, Clone)]
pub struct ReportSearch {
    /// First-match-per-file hits.
    pub matches: Vec<SpecSearchMatch>,
    /// Files scanned for the needle.
    pub cnt_scanned: u64,
    /// Unreadable files/directories.
    pub errors: Vec<SpecFsError>,
}

impl ReportSearch {
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// `(filename, directory)` pairs.
    pub fn to_pairs(&self) -> Vec<(String, PathBuf)> {
        self.matches
            .iter()
            .map(|m| (m.name_file.clone(), m.path_dir.clone()))
            .collect()
    }
}

/// Result of one `get_size_report` run.
#[derive(Debug, Default, Clone)]
pub struct ReportSize {
    /// Total regular-file bytes.
    pub bytes: u64,
    /// Regular files summed.
    pub cnt_files: u64,
    /// Files whose size could not be read.
    pub errors: Vec<SpecFsError>,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{EnumPruneStatus, ReportMerge, ReportMergeBuilder, ReportPrune};

    #[test]
    fn report_merge_to_dict_and_format() {
        let mut builder = ReportMergeBuilder::default();
        builder.add_scanned();
        builder.add_scanned();
        builder.add_scanned();
        builder.add_dir_created();
        builder.add_transferred();
        builder.add_skip(PathBuf::from("src/a.txt"));
        builder.add_warning("w".to_string());
        let report: ReportMerge = builder.build();

        let dict_counts = report.to_dict();
        assert_eq!(dict_counts["cnt_scanned"], 3);
        assert_eq!(dict_counts["cnt_dirs_created"], 1);
        assert_eq!(dict_counts["cnt_transferred"], 1);
        assert_eq!(dict_counts["cnt_skipped"], 1);
        assert_eq!(dict_counts["cnt_errors"], 0);
        assert_eq!(dict_counts["cnt_warnings"], 1);

        let txt = report.format("[MERGE]");
        assert_eq!(
            txt,
            "[MERGE] scanned=3 dirs_created=1 transferred=1 skipped=1 errors=0 warnings=1"
        );
        assert_eq!(report.to_string(), txt);
    }

    #[test]
    fn report_prune_status_distinguishes_outcomes() {
        let report = ReportPrune {
            if_path_missing: true,
            ..ReportPrune::default()
        };
        assert_eq!(report.status(), EnumPruneStatus::PathMissing);

        let report = ReportPrune {
            cnt_examined: 4,
            ..ReportPrune::default()
        };
        assert_eq!(report.status(), EnumPruneStatus::NothingPruned);
        assert_eq!(report.to_string(), "[PRUNE] nothing pruned examined=4 errors=0");

        let report = ReportPrune {
            cnt_examined: 3,
            cnt_deleted: 1,
            bytes_reclaimed: 12,
            ..ReportPrune::default()
        };
        assert_eq!(report.status(), EnumPruneStatus::Pruned(1));
        assert_eq!(
            report.to_string(),
            "[PRUNE] examined=3 deleted=1 bytes_reclaimed=12 errors=0"
        );
    }
}
