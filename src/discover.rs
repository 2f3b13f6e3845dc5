//! Discovery of policy files below a directory.
//!
//! Matching is case-insensitive on the file name. Results come back in glob
//! order (sorted per directory), which is stable for a given tree.

use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};

use crate::error::RepositoryError;
use crate::types::TemplateFamily;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Every `.xml` file below `dir`, recursively.
pub(crate) fn xml_files(dir: &Path) -> Result<Vec<PathBuf>, RepositoryError> {
    files_matching(dir, "*.xml")
}

/// Every `.xml` file below `dir` whose name starts with `"<family>-"`.
pub(crate) fn family_templates(
    dir: &Path,
    family: TemplateFamily,
) -> Result<Vec<PathBuf>, RepositoryError> {
    files_matching(dir, &format!("{}*.xml", family.prefix()))
}

fn files_matching(dir: &Path, file_pattern: &str) -> Result<Vec<PathBuf>, RepositoryError> {
    if !dir.is_dir() {
        return Err(RepositoryError::MissingDirectory {
            path: dir.to_path_buf(),
        });
    }

    let root = dir.to_str().ok_or_else(|| RepositoryError::NonUtf8Path {
        path: dir.to_path_buf(),
    })?;
    let pattern = format!("{}/**/{file_pattern}", Pattern::escape(root));

    let mut paths = Vec::new();
    for entry in glob::glob_with(&pattern, MATCH_OPTIONS)? {
        let path = entry.map_err(|e| RepositoryError::Read {
            path: e.path().to_path_buf(),
            source: e.into_error(),
        })?;
        // Case-insensitive matching also applies to escaped components of
        // `dir`, which can pull in siblings differing only in case.
        if path.starts_with(dir) && path.is_file() {
            paths.push(path);
        }
    }
    Ok(paths)
}
