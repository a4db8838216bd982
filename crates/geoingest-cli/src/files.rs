//! Payload discovery and loading

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde_json::Value;
use walkdir::WalkDir;

/// Given a path that is a JSON file, a one-element list; given a directory,
/// every `.json` file under it, recursively, in sorted order.
pub fn collect_json_files(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.exists() {
        bail!("'{}' is not a file or directory", path.display());
    }

    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|p| {
            p.extension()
                .map(|ext| ext.eq_ignore_ascii_case("json"))
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Load one JSON payload
pub fn open_json(path: &Path) -> Result<Value> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read '{}'", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("'{}' is not valid JSON", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_file_yields_one_entry() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("record.json");
        std::fs::write(&file, "{}").unwrap();

        let files = collect_json_files(&file).unwrap();
        assert_eq!(files, vec![file]);
    }

    #[test]
    fn directory_is_walked_recursively() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("b.json"), "{}").unwrap();
        std::fs::write(dir.path().join("nested/a.json"), "{}").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "skip me").unwrap();

        let files = collect_json_files(dir.path()).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|p| p.extension().unwrap() == "json"));
    }

    #[test]
    fn missing_path_is_an_error() {
        assert!(collect_json_files(Path::new("/no/such/path")).is_err());
    }

    #[test]
    fn invalid_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("bad.json");
        std::fs::write(&file, "not json").unwrap();
        assert!(open_json(&file).is_err());
    }
}
