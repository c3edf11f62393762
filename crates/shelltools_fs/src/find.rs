//! Directory listing and basename-pattern search.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::report::ReportListing;
use crate::spec::{ShellToolsError, SpecFindOptions, SpecFsError};
use crate::util::{TypePatternSeq, derive_basename, list_children, walk_files};

/// List `dir_target`.
///
/// - `recursive = false`: immediate children, files and directories alike.
/// - `recursive = true`: every descendant that is not a directory.
///
/// Fails when `dir_target` itself cannot be read. Unreadable nested entries
/// are reported in [`ReportListing::errors`].
pub fn list_directory<P>(dir_target: P, recursive: bool) -> Result<ReportListing, ShellToolsError>
where
    P: AsRef<Path>,
{
    let path_dir = dir_target.as_ref();
    let mut report_listing = ReportListing::default();

    if recursive {
        let meta_dir = fs::metadata(path_dir).map_err(|e| ShellToolsError::from_io(path_dir, e))?;
        if !meta_dir.is_dir() {
            return Err(ShellToolsError::NotADirectory(path_dir.to_path_buf()));
        }
        walk_files(
            path_dir,
            &mut report_listing.paths,
            &mut report_listing.errors,
        );
        return Ok(report_listing);
    }

    let l_entries = list_children(path_dir, &mut report_listing.errors)
        .map_err(|e| ShellToolsError::from_io(path_dir, e))?;
    report_listing.paths = l_entries.into_iter().map(|entry| entry.path()).collect();
    Ok(report_listing)
}

/// Collect paths under `locations` whose basename matches any of `filters`.
///
/// Each location is listed with [`list_directory`] (`if_recursive` selects the
/// mode). A location that cannot be listed is recorded in
/// [`ReportListing::errors`] and the next one is processed. A path matching
/// several filters is reported once. An empty filter list matches nothing.
pub fn find<P, S>(
    locations: &[P],
    filters: &[S],
    spec_find_options: SpecFindOptions,
) -> Result<ReportListing, ShellToolsError>
where
    P: AsRef<Path>,
    S: AsRef<str>,
{
    let l_filters: Vec<String> = filters.iter().map(|s| s.as_ref().to_string()).collect();
    let spec_patterns = TypePatternSeq::compile(&l_filters, spec_find_options.rule_pattern)?;

    let mut report_find = ReportListing::default();
    let mut set_seen: HashSet<PathBuf> = HashSet::new();
    for location in locations {
        let path_location = location.as_ref();
        let report_listing = match list_directory(path_location, spec_find_options.if_recursive) {
            Ok(v) => v,
            Err(e) => {
                warn!(path = %path_location.display(), error = %e, "Could not list location");
                report_find.errors.push(SpecFsError {
                    path: path_location.to_path_buf(),
                    kind: e.kind(),
                    exception: e.to_string(),
                });
                continue;
            }
        };
        report_find.errors.extend(report_listing.errors);

        for path_item in report_listing.paths {
            if !spec_patterns.is_match(&derive_basename(&path_item)) {
                continue;
            }
            if set_seen.insert(path_item.clone()) {
                report_find.paths.push(path_item);
            }
        }
    }
    Ok(report_find)
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use tempfile::TempDir;

    use super::{find, list_directory};
    use crate::spec::{EnumFsErrorKind, EnumPatternMode, ShellToolsError, SpecFindOptions};

    fn write_text(path: &Path, txt: &str) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent");
        }
        std::fs::write(path, txt).expect("write text");
    }

    fn make_tree(tmp: &TempDir) {
        write_text(&tmp.path().join("a.txt"), "a");
        write_text(&tmp.path().join("b.md"), "b");
        write_text(&tmp.path().join("sub/c.txt"), "c");
        write_text(&tmp.path().join("sub/deep/d.txt"), "d");
    }

    #[test]
    fn list_directory_flat_includes_directories() {
        let tmp = TempDir::new().expect("tempdir");
        make_tree(&tmp);

        let report = list_directory(tmp.path(), false).expect("list");
        assert_eq!(
            report.paths,
            vec![
                tmp.path().join("a.txt"),
                tmp.path().join("b.md"),
                tmp.path().join("sub"),
            ]
        );
    }

    #[test]
    fn list_directory_recursive_returns_files_only() {
        let tmp = TempDir::new().expect("tempdir");
        make_tree(&tmp);

        let report = list_directory(tmp.path(), true).expect("list");
        assert_eq!(report.paths.len(), 4);
        assert!(report.paths.contains(&tmp.path().join("sub/deep/d.txt")));
        assert!(!report.paths.contains(&tmp.path().join("sub")));
    }

    #[test]
    fn list_directory_missing_root_fails() {
        let tmp = TempDir::new().expect("tempdir");
        let err = list_directory(tmp.path().join("missing"), false).expect_err("missing");
        assert!(matches!(err, ShellToolsError::NotFound(_)));
    }

    #[test]
    fn list_directory_recursive_rejects_bad_root() {
        let tmp = TempDir::new().expect("tempdir");
        write_text(&tmp.path().join("a.txt"), "a");

        let err = list_directory(tmp.path().join("missing"), true).expect_err("missing");
        assert!(matches!(err, ShellToolsError::NotFound(_)));
        let err = list_directory(tmp.path().join("a.txt"), true).expect_err("file root");
        assert!(matches!(err, ShellToolsError::NotADirectory(_)));
    }

    #[test]
    fn find_glob_non_recursive() {
        let tmp = TempDir::new().expect("tempdir");
        make_tree(&tmp);

        let report = find(&[tmp.path()], &["*.txt"], SpecFindOptions::default()).expect("find");
        assert_eq!(report.paths, vec![tmp.path().join("a.txt")]);
    }

    #[test]
    fn find_glob_recursive_or_across_patterns_without_duplicates() {
        let tmp = TempDir::new().expect("tempdir");
        make_tree(&tmp);

        let spec_find_options = SpecFindOptions {
            if_recursive: true,
            ..SpecFindOptions::default()
        };
        let report = find(&[tmp.path()], &["*.txt", "*.md", "?.txt"], spec_find_options)
            .expect("find");

        let mut l_paths: Vec<PathBuf> = report.paths.clone();
        l_paths.sort();
        let mut l_expected = vec![
            tmp.path().join("a.txt"),
            tmp.path().join("b.md"),
            tmp.path().join("sub/c.txt"),
            tmp.path().join("sub/deep/d.txt"),
        ];
        l_expected.sort();
        assert_eq!(l_paths, l_expected);
    }

    #[test]
    fn find_regex_mode() {
        let tmp = TempDir::new().expect("tempdir");
        make_tree(&tmp);

        let spec_find_options = SpecFindOptions {
            rule_pattern: EnumPatternMode::Regex,
            if_recursive: true,
        };
        let report = find(&[tmp.path()], &[r"^[cd]\.txt$"], spec_find_options).expect("find");
        assert_eq!(report.paths.len(), 2);
    }

    #[test]
    fn find_empty_filters_match_nothing() {
        let tmp = TempDir::new().expect("tempdir");
        make_tree(&tmp);

        let l_filters: [&str; 0] = [];
        let report = find(&[tmp.path()], &l_filters, SpecFindOptions::default()).expect("find");
        assert!(report.paths.is_empty());
    }

    #[test]
    fn find_continues_past_missing_location() {
        let tmp = TempDir::new().expect("tempdir");
        make_tree(&tmp);
        let path_missing = tmp.path().join("missing");

        let report = find(
            &[path_missing.as_path(), tmp.path()],
            &["a.txt"],
            SpecFindOptions::default(),
        )
        .expect("find");
        assert_eq!(report.paths, vec![tmp.path().join("a.txt")]);
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.errors[0].kind, EnumFsErrorKind::NotFound);
    }

    #[test]
    fn find_invalid_pattern_rejected() {
        let tmp = TempDir::new().expect("tempdir");
        let err = find(&[tmp.path()], &["["], SpecFindOptions::default()).expect_err("invalid");
        assert!(matches!(err, ShellToolsError::InvalidPattern(_)));
    }
}
