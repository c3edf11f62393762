//! Byte size of a file or directory tree.

use std::fs;
use std::path::Path;

use crate::report::ReportSize;
use crate::spec::SpecFsError;
use crate::util::walk_files;

/// Size in bytes of `path`: file length, sum of descendant file lengths for a
/// directory, `0` when missing. Unreadable entries are skipped.
pub fn get_size<P>(path: P) -> u64
where
    P: AsRef<Path>,
{
    get_size_report(path).bytes
}

/// Like [`get_size`], with counts and the entries that could not be measured.
pub fn get_size_report<P>(path: P) -> ReportSize
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let mut report_size = ReportSize::default();

    if path.is_file() {
        match fs::metadata(path) {
            Ok(meta_file) => {
                report_size.bytes = meta_file.len();
                report_size.cnt_files = 1;
            }
            Err(e) => report_size.errors.push(SpecFsError::from_io(path, &e)),
        }
        return report_size;
    }
    if !path.is_dir() {
        return report_size;
    }

    let mut l_paths = Vec::new();
    walk_files(path, &mut l_paths, &mut report_size.errors);
    for path_file in l_paths {
        match fs::metadata(&path_file) {
            Ok(meta_file) if meta_file.is_file() => {
                report_size.bytes += meta_file.len();
                report_size.cnt_files += 1;
            }
            Ok(_) => {}
            Err(e) => report_size
                .errors
                .push(SpecFsError::from_io(&path_file, &e)),
        }
    }
    report_size
}
