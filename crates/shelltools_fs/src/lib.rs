//! `shelltools_fs` v1:
//! Rust-side shell-style filesystem tools.
//!
//! Architecture mirrors the Python `shelltools` API:
//! - `merge`  : tree reconciliation (move non-conflicting files)
//! - `prune`  : age-based deletion of direct child files
//! - `find`   : directory listing and basename-pattern search
//! - `search` : substring search in file contents
//! - `remove` : file and tree deletion
//! - `size`   : file/tree byte size
//! - `spec`   : enums/options/errors
//! - `report` : run-time report models
//! - `util`   : shared helper functions

pub mod find;
pub mod merge;
pub mod prune;
pub mod remove;
pub mod report;
pub mod search;
pub mod size;
pub mod spec;
mod util;

pub use find::{find, list_directory};
pub use merge::{merge, merge_tree};
pub use prune::{delolder, prune_older};
pub use remove::{delete, remtree};
pub use report::{
    EnumPruneStatus, ReportListing, ReportMerge, ReportMergeBuilder, ReportPrune, ReportSearch,
    ReportSize, SpecSearchMatch,
};
pub use search::findstr;
pub use size::{get_size, get_size_report};
pub use spec::{
    EnumFsErrorKind, EnumMergeTransferMode, EnumPatternMode, ShellToolsError, SpecFindOptions,
    SpecFsError, SpecMergeOptions, SpecPruneOptions, SpecSearchOptions,
};
