//! Substring search across the files of a tree.

use std::fs;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use tracing::{debug, warn};

use crate::report::{ReportSearch, SpecSearchMatch};
use crate::spec::{ShellToolsError, SpecFsError, SpecSearchOptions};
use crate::util::{TypePatternSeq, derive_basename, walk_files};

/// Find files under `dir_root` containing `needle` on some line.
///
/// Each file is scanned line by line and scanning stops at the first matching
/// line, so every file appears at most once. Lines are decoded lossily; binary
/// content never aborts the scan. `patterns_include_files` restricts which
/// basenames are scanned.
pub fn findstr<P>(
    needle: &str,
    dir_root: P,
    spec_search_options: SpecSearchOptions,
) -> Result<ReportSearch, ShellToolsError>
where
    P: AsRef<Path>,
{
    let path_root = dir_root.as_ref();
    if !path_root.is_dir() {
        return Err(ShellToolsError::NotADirectory(path_root.to_path_buf()));
    }
    let spec_patterns = spec_search_options
        .patterns_include_files
        .as_deref()
        .map(|patterns| TypePatternSeq::compile(patterns, spec_search_options.rule_pattern))
        .transpose()?;

    let mut report_search = ReportSearch::default();
    let mut l_paths = Vec::new();
    walk_files(path_root, &mut l_paths, &mut report_search.errors);

    for path_file in l_paths {
        let name_file = derive_basename(&path_file);
        if let Some(spec_patterns) = &spec_patterns
            && !spec_patterns.is_match(&name_file)
        {
            continue;
        }

        report_search.cnt_scanned += 1;
        match contains_line(&path_file, needle) {
            Ok(true) => {
                debug!(path = %path_file.display(), "Match found");
                let path_dir = path_file
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_default();
                report_search.matches.push(SpecSearchMatch {
                    name_file,
                    path_dir,
                });
            }
            Ok(false) => {}
            Err(e) => {
                warn!(path = %path_file.display(), error = %e, "Could not scan file");
                report_search
                    .errors
                    .push(SpecFsError::from_io(&path_file, &e));
            }
        }
    }
    Ok(report_search)
}

fn contains_line(path_file: &Path, needle: &str) -> io::Result<bool> {
    let mut reader = BufReader::new(fs::File::open(path_file)?);
    let mut raw_line = Vec::new();
    loop {
        raw_line.clear();
        if reader.read_until(b'\n', &mut raw_line)? == 0 {
            return Ok(false);
        }
        if String::from_utf8_lossy(&raw_line).contains(needle) {
            return Ok(true);
        }
    }
}
