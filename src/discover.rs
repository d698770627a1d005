use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Set by Quarto for `post-render` scripts.
pub const QUARTO_OUTPUT_DIR_ENV: &str = "QUARTO_PROJECT_OUTPUT_DIR";
pub const OUTPUT_DIR_ENV: &str = "OUTPUT_DIR";
pub const DEFAULT_OUTPUT_DIR: &str = "output";

const EXTENSION: &str = "docx";
const LOCK_PREFIX: char = '~';
const TEMP_SUFFIX: &str = ".tmp";

/// The output directory named by the environment: `QUARTO_PROJECT_OUTPUT_DIR`,
/// then `OUTPUT_DIR`, then `output`. Empty values are ignored.
pub fn output_dir_from_env() -> PathBuf {
    [QUARTO_OUTPUT_DIR_ENV, OUTPUT_DIR_ENV]
        .into_iter()
        .filter_map(std::env::var_os)
        .find(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR))
}

/// Word lock files (`~$name.docx`) and in-progress saves are never touched.
pub fn is_excluded(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return true;
    };
    name.starts_with(LOCK_PREFIX) || name.ends_with(TEMP_SUFFIX)
}

fn has_docx_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(EXTENSION))
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}

fn walk_root(root: &Path, out: &mut Vec<PathBuf>) {
    if !root.exists() {
        log::debug!("search root {} does not exist", root.display());
        return;
    }
    let walker = walkdir::WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| !is_hidden(e));
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                log::warn!("skipping unreadable entry under {}: {err}", root.display());
                continue;
            }
        };
        if entry.file_type().is_file() && has_docx_extension(entry.path()) {
            out.push(entry.into_path());
        }
    }
}

/// Find `.docx` files under every root, recursively, then filter them like
/// [`select`].
pub fn discover(roots: &[&Path]) -> Vec<PathBuf> {
    let mut found = Vec::new();
    for root in roots {
        walk_root(root, &mut found);
    }
    select(found)
}

/// Drop excluded names, deduplicate by canonical path, and sort.
pub fn select(paths: impl IntoIterator<Item = PathBuf>) -> Vec<PathBuf> {
    paths
        .into_iter()
        .filter(|p| !is_excluded(p))
        .map(|p| std::fs::canonicalize(&p).unwrap_or(p))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
