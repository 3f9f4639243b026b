use crate::error::{ContextError, LoadCause, Result};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const DOCUMENT_EXTENSION: &str = ".json";

/// Expand the given locations into the list of documents to load.
///
/// Directories contribute the `.json` files directly inside them, sorted by
/// file name. Files are taken as they are. Anything else is skipped.
pub fn resolve_sources<I, P>(locations: I) -> Vec<PathBuf>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut files: Vec<PathBuf> = Vec::new();
    for location in locations {
        let path = location.as_ref();
        if path.is_dir() {
            files.extend(documents_in_dir(path));
        } else if path.is_file() {
            files.push(path.to_path_buf());
        } else {
            tracing::debug!(path = %path.display(), "skipping location that is neither file nor directory");
        }
    }
    files
}

fn documents_in_dir(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| match e {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::debug!(dir = %dir.display(), error = %err, "skipping unreadable directory entry");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.file_name()
                .to_str()
                .map_or(false, |name| name.ends_with(DOCUMENT_EXTENSION))
        })
        .map(|e| e.into_path())
        .collect()
}

/// Read one document as UTF-8 text and parse it as JSON.
pub fn read_document(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path).map_err(|e| load_error(path, e.into()))?;
    serde_json::from_str(&text).map_err(|e| load_error(path, e.into()))
}

fn load_error(path: &Path, source: LoadCause) -> ContextError {
    ContextError::Load { path: path.to_path_buf(), source }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn directory_listing_is_sorted_and_filtered() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.json"), "{}").unwrap();
        fs::write(dir.path().join("a.json"), "{}").unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();
        fs::create_dir(dir.path().join("nested.json")).unwrap();

        let files = resolve_sources([dir.path()]);
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.json", "b.json"]);
    }

    #[test]
    fn missing_locations_are_skipped() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("one.json");
        fs::write(&file, "{}").unwrap();

        let files = resolve_sources([dir.path().join("nope"), file.clone()]);
        assert_eq!(files, vec![file]);
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_is_skipped() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.json"), "{}").unwrap();
        std::os::unix::fs::symlink(dir.path().join("gone.json"), dir.path().join("b.json")).unwrap();

        let files = resolve_sources([dir.path()]);
        assert_eq!(files, vec![dir.path().join("a.json")]);
    }
}
