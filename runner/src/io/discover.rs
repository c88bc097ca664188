//! Account config discovery.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// Fallback search directory when the configured root does not exist.
pub const DEFAULT_CONFIG_DIR: &str = "config";

/// Recognized config file extensions (matched case-insensitively).
const CONFIG_EXTENSIONS: [&str; 2] = [".yml", ".yaml"];

/// Fixed base-name prefix required under the Qinglong panel convention.
const QINGLONG_PREFIX: &str = "mhy_";

/// Filters applied to directory walks. A root that names a regular file
/// bypasses them.
#[derive(Debug, Clone, Default)]
pub struct DiscoverOptions {
    pub prefix: Option<String>,
    pub qinglong: bool,
}

/// Locate account config files under `root`, sorted lexicographically by
/// full path.
///
/// - regular file: singleton result, no extension or prefix checks;
/// - directory: recursive walk for `.yml`/`.yaml` files matching `opts`;
/// - otherwise: one fallback pass over [`DEFAULT_CONFIG_DIR`], then a
///   warning and an empty result. The caller decides whether an empty
///   result is fatal.
pub fn locate(root: &Path, opts: &DiscoverOptions) -> Vec<PathBuf> {
    locate_with_default(root, Path::new(DEFAULT_CONFIG_DIR), opts)
}

pub(crate) fn locate_with_default(
    root: &Path,
    default_dir: &Path,
    opts: &DiscoverOptions,
) -> Vec<PathBuf> {
    if root.is_file() {
        return vec![root.to_path_buf()];
    }
    if root.is_dir() {
        return walk_sorted(root, opts);
    }
    if default_dir.is_dir() {
        debug!(
            root = %root.display(),
            fallback = %default_dir.display(),
            "search root missing, using fallback directory"
        );
        return walk_sorted(default_dir, opts);
    }
    warn!(root = %root.display(), "config search path does not exist");
    Vec::new()
}

fn walk_sorted(dir: &Path, opts: &DiscoverOptions) -> Vec<PathBuf> {
    let mut found = Vec::new();
    collect(dir, opts, &mut found);
    found.sort();
    found
}

fn collect(dir: &Path, opts: &DiscoverOptions, found: &mut Vec<PathBuf>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(dir = %dir.display(), error = %err, "skipping unreadable directory");
            return;
        }
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        // Symlinked directories are not followed; a cycle under the search
        // root must not recurse forever.
        if file_type.is_dir() {
            collect(&path, opts, found);
        } else if matches_filters(&path, opts) {
            found.push(path);
        }
    }
}

fn matches_filters(path: &Path, opts: &DiscoverOptions) -> bool {
    let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
        return false;
    };
    let lower = name.to_lowercase();
    if !CONFIG_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
        return false;
    }
    if let Some(prefix) = &opts.prefix {
        if !name.starts_with(prefix.as_str()) {
            return false;
        }
    }
    if opts.qinglong && !name.starts_with(QINGLONG_PREFIX) {
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::write_config_file;

    #[test]
    fn missing_root_falls_back_to_default_dir() {
        let temp = tempfile::tempdir().expect("tempdir");
        let default_dir = temp.path().join("config");
        write_config_file(&default_dir, "a.yml");
        write_config_file(&default_dir, "b.yaml");

        let found = locate_with_default(
            &temp.path().join("nonexistent"),
            &default_dir,
            &DiscoverOptions::default(),
        );
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["a.yml", "b.yaml"]);
    }

    #[test]
    fn missing_root_and_fallback_yield_empty() {
        let temp = tempfile::tempdir().expect("tempdir");
        let found = locate_with_default(
            &temp.path().join("nope"),
            &temp.path().join("also-nope"),
            &DiscoverOptions::default(),
        );
        assert!(found.is_empty());
    }

    #[test]
    fn extension_match_is_case_insensitive() {
        let temp = tempfile::tempdir().expect("tempdir");
        write_config_file(temp.path(), "upper.YML");
        write_config_file(temp.path(), "mixed.YaMl");
        write_config_file(temp.path(), "other.txt");

        let found = locate(temp.path(), &DiscoverOptions::default());
        assert_eq!(found.len(), 2);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_directories_are_not_followed() {
        let temp = tempfile::tempdir().expect("tempdir");
        let nested = temp.path().join("nested");
        write_config_file(&nested, "a.yml");
        std::os::unix::fs::symlink(temp.path(), nested.join("loop")).expect("symlink");

        let found = locate(temp.path(), &DiscoverOptions::default());
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["a.yml"]);
    }

    #[test]
    fn filters_do_not_apply_to_single_file_root() {
        let temp = tempfile::tempdir().expect("tempdir");
        let file = write_config_file(temp.path(), "account.conf");

        let opts = DiscoverOptions {
            prefix: Some("mhy_".to_string()),
            qinglong: true,
        };
        assert_eq!(locate(&file, &opts), vec![file]);
    }
}
