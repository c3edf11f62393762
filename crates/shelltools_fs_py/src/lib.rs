use std::collections::BTreeMap;

use pyo3::exceptions::{
    PyFileExistsError, PyFileNotFoundError, PyIsADirectoryError, PyNotADirectoryError, PyOSError,
    PyPermissionError, PyValueError,
};
use pyo3::prelude::*;
use shelltools_fs::{
    EnumMergeTransferMode, EnumPatternMode, ReportListing, ReportMerge, ReportPrune, ReportSearch,
    ShellToolsError, SpecFindOptions, SpecFsError, SpecMergeOptions, SpecPruneOptions,
    SpecSearchOptions,
};

const N_BRIDGE_ABI_VERSION: u64 = 1;
const C_BRIDGE_CONTRACT_VERSION: &str = "shelltools.fs.v1";
const C_BRIDGE_TRANSPORT: &str = "rust_native";

fn path_to_string(path: &std::path::Path) -> String {
    path.to_string_lossy().to_string()
}

#[pyclass(name = "SpecFsError")]
#[derive(Debug, Clone)]
struct PySpecFsError {
    #[pyo3(get)]
    path: String,
    #[pyo3(get)]
    kind: String,
    #[pyo3(get)]
    exception: String,
}

impl From<SpecFsError> for PySpecFsError {
    fn from(spec_error: SpecFsError) -> Self {
        Self {
            path: path_to_string(&spec_error.path),
            kind: spec_error.kind.as_str().to_string(),
            exception: spec_error.exception,
        }
    }
}

fn convert_errors(l_errors: Vec<SpecFsError>) -> Vec<PySpecFsError> {
    l_errors.into_iter().map(PySpecFsError::from).collect()
}

#[pyclass(name = "ReportMerge")]
#[derive(Debug, Clone)]
struct PyReportMerge {
    #[pyo3(get)]
    cnt_scanned: u64,
    #[pyo3(get)]
    cnt_dirs_created: u64,
    #[pyo3(get)]
    cnt_transferred: u64,
    #[pyo3(get)]
    skips: Vec<String>,
    #[pyo3(get)]
    warnings: Vec<String>,
    #[pyo3(get)]
    errors: Vec<PySpecFsError>,
    c_summary: String,
    dict_counts: BTreeMap<String, u64>,
}

impl From<ReportMerge> for PyReportMerge {
    fn from(report_merge: ReportMerge) -> Self {
        let c_summary = report_merge.to_string();
        let dict_counts = report_merge.to_dict();
        Self {
            cnt_scanned: report_merge.cnt_scanned,
            cnt_dirs_created: report_merge.cnt_dirs_created,
            cnt_transferred: report_merge.cnt_transferred,
            skips: report_merge
                .skips
                .iter()
                .map(|p| path_to_string(p))
                .collect(),
            warnings: report_merge.warnings,
            errors: convert_errors(report_merge.errors),
            c_summary,
            dict_counts,
        }
    }
}

#[pymethods]
impl PyReportMerge {
    #[getter]
    fn error_count(&self) -> usize {
        self.errors.len()
    }

    #[getter]
    fn skip_count(&self) -> usize {
        self.skips.len()
    }

    fn to_dict(&self) -> BTreeMap<String, u64> {
        self.dict_counts.clone()
    }

    fn __str__(&self) -> String {
        self.c_summary.clone()
    }
}

#[pyclass(name = "ReportPrune")]
#[derive(Debug, Clone)]
struct PyReportPrune {
    #[pyo3(get)]
    cnt_examined: u64,
    #[pyo3(get)]
    cnt_deleted: u64,
    #[pyo3(get)]
    bytes_reclaimed: u64,
    #[pyo3(get)]
    if_path_missing: bool,
    #[pyo3(get)]
    errors: Vec<PySpecFsError>,
    c_summary: String,
    dict_counts: BTreeMap<String, u64>,
}

impl From<ReportPrune> for PyReportPrune {
    fn from(report_prune: ReportPrune) -> Self {
        let c_summary = report_prune.to_string();
        let dict_counts = report_prune.to_dict();
        Self {
            cnt_examined: report_prune.cnt_examined,
            cnt_deleted: report_prune.cnt_deleted,
            bytes_reclaimed: report_prune.bytes_reclaimed,
            if_path_missing: report_prune.if_path_missing,
            errors: convert_errors(report_prune.errors),
            c_summary,
            dict_counts,
        }
    }
}

#[pymethods]
impl PyReportPrune {
    #[getter]
    fn error_count(&self) -> usize {
        self.errors.len()
    }

    fn to_dict(&self) -> BTreeMap<String, u64> {
        self.dict_counts.clone()
    }

    fn __str__(&self) -> String {
        self.c_summary.clone()
    }
}

#[pyclass(name = "ReportListing")]
#[derive(Debug, Clone)]
struct PyReportListing {
    #[pyo3(get)]
    paths: Vec<String>,
    #[pyo3(get)]
    errors: Vec<PySpecFsError>,
}

impl From<ReportListing> for PyReportListing {
    fn from(report_listing: ReportListing) -> Self {
        Self {
            paths: report_listing
                .paths
                .iter()
                .map(|p| path_to_string(p))
                .collect(),
            errors: convert_errors(report_listing.errors),
        }
    }
}

#[pymethods]
impl PyReportListing {
    #[getter]
    fn error_count(&self) -> usize {
        self.errors.len()
    }

    fn __len__(&self) -> usize {
        self.paths.len()
    }
}

#[pyclass(name = "ReportSearch")]
#[derive(Debug, Clone)]
struct PyReportSearch {
    #[pyo3(get)]
    matches: Vec<(String, String)>,
    #[pyo3(get)]
    cnt_scanned: u64,
    #[pyo3(get)]
    errors: Vec<PySpecFsError>,
}

impl From<ReportSearch> for PyReportSearch {
    fn from(report_search: ReportSearch) -> Self {
        Self {
            matches: report_search
                .to_pairs()
                .into_iter()
                .map(|(name_file, path_dir)| (name_file, path_to_string(&path_dir)))
                .collect(),
            cnt_scanned: report_search.cnt_scanned,
            errors: convert_errors(report_search.errors),
        }
    }
}

#[pymethods]
impl PyReportSearch {
    #[getter]
    fn error_count(&self) -> usize {
        self.errors.len()
    }
}

fn parse_rule_pattern(value: &str) -> PyResult<EnumPatternMode> {
    match value {
        "glob" => Ok(EnumPatternMode::Glob),
        "regex" => Ok(EnumPatternMode::Regex),
        "literal" => Ok(EnumPatternMode::Literal),
        _ => Err(PyValueError::new_err(format!(
            "Invalid pattern strategy: `{value}`. Expected one of: ['glob', 'regex', 'literal']"
        ))),
    }
}

fn parse_rule_transfer(value: &str) -> PyResult<EnumMergeTransferMode> {
    match value {
        "move" => Ok(EnumMergeTransferMode::Move),
        "copy" => Ok(EnumMergeTransferMode::Copy),
        _ => Err(PyValueError::new_err(format!(
            "Invalid transfer mode: `{value}`. Expected one of: ['move', 'copy']"
        ))),
    }
}

fn map_shell_tools_error(exception: ShellToolsError) -> PyErr {
    let message = exception.to_string();
    match exception {
        ShellToolsError::NotFound(_) => PyFileNotFoundError::new_err(message),
        ShellToolsError::PermissionDenied(_) => PyPermissionError::new_err(message),
        ShellToolsError::AlreadyExists(_) => PyFileExistsError::new_err(message),
        ShellToolsError::IsADirectory(_) => PyIsADirectoryError::new_err(message),
        ShellToolsError::NotADirectory(_) | ShellToolsError::SourceNotDirectory(_) => {
            PyNotADirectoryError::new_err(message)
        }
        ShellToolsError::InvalidPattern(_) | ShellToolsError::SourceDestinationOverlap { .. } => {
            PyValueError::new_err(message)
        }
        ShellToolsError::ResourceBusy(_)
        | ShellToolsError::DestinationInitFailed { .. }
        | ShellToolsError::Io { .. } => PyOSError::new_err(message),
    }
}

#[pyfunction(name = "merge")]
#[pyo3(signature = (dir_source, dir_destination, rule_transfer = "move", if_dry_run = false))]
fn merge_py(
    py: Python<'_>,
    dir_source: String,
    dir_destination: String,
    rule_transfer: &str,
    if_dry_run: bool,
) -> PyResult<PyReportMerge> {
    let spec_merge_options = SpecMergeOptions {
        rule_transfer: parse_rule_transfer(rule_transfer)?,
        if_dry_run,
    };
    let report_merge = py.allow_threads(|| {
        shelltools_fs::merge_tree(dir_source, dir_destination, spec_merge_options)
    });
    let report_merge = report_merge.map_err(map_shell_tools_error)?;
    Ok(PyReportMerge::from(report_merge))
}

#[pyfunction(name = "delolder")]
#[pyo3(signature = (path, ndays, if_dry_run = false))]
fn delolder_py(
    py: Python<'_>,
    path: String,
    ndays: u32,
    if_dry_run: bool,
) -> PyResult<PyReportPrune> {
    let spec_prune_options = SpecPruneOptions {
        date_today: None,
        if_dry_run,
    };
    let report_prune =
        py.allow_threads(|| shelltools_fs::prune_older(path, ndays, spec_prune_options));
    let report_prune = report_prune.map_err(map_shell_tools_error)?;
    Ok(PyReportPrune::from(report_prune))
}

#[pyfunction(name = "find")]
#[pyo3(signature = (locations, filters, recursive = false, rule_pattern = "glob"))]
fn find_py(
    py: Python<'_>,
    locations: Vec<String>,
    filters: Vec<String>,
    recursive: bool,
    rule_pattern: &str,
) -> PyResult<PyReportListing> {
    let spec_find_options = SpecFindOptions {
        rule_pattern: parse_rule_pattern(rule_pattern)?,
        if_recursive: recursive,
    };
    let report_find =
        py.allow_threads(|| shelltools_fs::find(&locations, &filters, spec_find_options));
    let report_find = report_find.map_err(map_shell_tools_error)?;
    Ok(PyReportListing::from(report_find))
}

#[pyfunction(name = "list_directory")]
#[pyo3(signature = (path, recursive = false))]
fn list_directory_py(py: Python<'_>, path: String, recursive: bool) -> PyResult<PyReportListing> {
    let report_listing = py.allow_threads(|| shelltools_fs::list_directory(path, recursive));
    let report_listing = report_listing.map_err(map_shell_tools_error)?;
    Ok(PyReportListing::from(report_listing))
}

#[pyfunction(name = "get_size")]
fn get_size_py(py: Python<'_>, path: String) -> u64 {
    py.allow_threads(|| shelltools_fs::get_size(path))
}

#[pyfunction(name = "delete")]
fn delete_py(py: Python<'_>, filename: String) -> PyResult<()> {
    py.allow_threads(|| shelltools_fs::delete(filename))
        .map_err(map_shell_tools_error)
}

#[pyfunction(name = "remtree")]
fn remtree_py(py: Python<'_>, root: String) -> PyResult<()> {
    py.allow_threads(|| shelltools_fs::remtree(root))
        .map_err(map_shell_tools_error)
}

#[pyfunction(name = "findstr")]
#[pyo3(signature = (string, path, patterns_include_files = None, rule_pattern = "glob"))]
fn findstr_py(
    py: Python<'_>,
    string: String,
    path: String,
    patterns_include_files: Option<Vec<String>>,
    rule_pattern: &str,
) -> PyResult<PyReportSearch> {
    let spec_search_options = SpecSearchOptions {
        patterns_include_files,
        rule_pattern: parse_rule_pattern(rule_pattern)?,
    };
    let report_search =
        py.allow_threads(|| shelltools_fs::findstr(&string, path, spec_search_options));
    let report_search = report_search.map_err(map_shell_tools_error)?;
    Ok(PyReportSearch::from(report_search))
}

#[pymodule]
fn _shelltools_fs_rs(module: &Bound<'_, PyModule>) -> PyResult<()> {
    module.add_class::<PySpecFsError>()?;
    module.add_class::<PyReportMerge>()?;
    module.add_class::<PyReportPrune>()?;
    module.add_class::<PyReportListing>()?;
    module.add_class::<PyReportSearch>()?;
    module.add_function(wrap_pyfunction!(merge_py, module)?)?;
    module.add_function(wrap_pyfunction!(delolder_py, module)?)?;
    module.add_function(wrap_pyfunction!(find_py, module)?)?;
    module.add_function(wrap_pyfunction!(list_directory_py, module)?)?;
    module.add_function(wrap_pyfunction!(get_size_py, module)?)?;
    module.add_function(wrap_pyfunction!(delete_py, module)?)?;
    module.add_function(wrap_pyfunction!(remtree_py, module)?)?;
    module.add_function(wrap_pyfunction!(findstr_py, module)?)?;
    module.add("__bridge_abi__", N_BRIDGE_ABI_VERSION)?;
    module.add("__bridge_contract__", C_BRIDGE_CONTRACT_VERSION)?;
    module.add("__bridge_transport__", C_BRIDGE_TRANSPORT)?;
    Ok(())
}
