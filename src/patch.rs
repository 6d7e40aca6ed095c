use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;
use crate::error::{Result, ToolError};
use crate::shell::run_batch;

/// Returns the `*.patch` files directly inside `patch_dir`, sorted by file name.
/// A missing directory yields an empty list.
pub fn patch_files(patch_dir: &Path) -> Result<Vec<PathBuf>> {
    if !patch_dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut patches = Vec::new();
    for entry in WalkDir::new(patch_dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(std::io::Error::from)?;
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "patch") {
            patches.push(path.to_path_buf());
        }
    }
    Ok(patches)
}

/// Applies every patch in `patch_dir` to the tree in `package_dir`, in file name order.
///
/// Returns the number of patches applied; a missing `patch_dir` is not an error.
///
/// # Errors
/// Stops at the first patch that doesn't apply and returns [`ToolError::PatchFailed`].
pub fn apply_patches(patch_program: &str, patch_dir: &Path, package_dir: &Path) -> Result<usize> {
    let patches = patch_files(patch_dir)?;
    if patches.is_empty() {
        debug!(dir = %patch_dir.display(), "no patches");
        return Ok(0);
    }
    for patch in &patches {
        info!("Applying {}", patch.display());
        let input = patch.to_string_lossy();
        run_batch(patch_program, &["-i", input.as_ref()], package_dir).map_err(|e| match e {
            ToolError::SubprocessFailed { status, .. } => ToolError::PatchFailed {
                patch: patch.clone(),
                status,
            },
            other => other,
        })?;
    }
    Ok(patches.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn patch_dir_with(names: &[&str]) -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        for name in names {
            fs::write(dir.path().join(name), "").unwrap();
        }
        dir
    }

    #[test]
    fn test_patch_files_sorted_and_filtered() {
        let dir = patch_dir_with(&["02-b.patch", "01-a.patch", "README", "notes.diff"]);
        fs::create_dir(dir.path().join("sub.patch")).unwrap();
        let names: Vec<_> = patch_files(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["01-a.patch", "02-b.patch"]);
    }

    #[test]
    fn test_missing_patch_dir_is_noop() {
        let dir = tempdir().unwrap();
        let applied = apply_patches("false", &dir.path().join("none"), dir.path()).unwrap();
        assert_eq!(applied, 0);
    }

    #[test]
    fn test_apply_all() {
        let patches = patch_dir_with(&["a.patch", "b.patch"]);
        let tree = tempdir().unwrap();
        assert_eq!(apply_patches("true", patches.path(), tree.path()).unwrap(), 2);
    }

    #[test]
    fn test_failing_patch_stops() {
        let patches = patch_dir_with(&["a.patch", "b.patch"]);
        let tree = tempdir().unwrap();
        let err = apply_patches("false", patches.path(), tree.path()).unwrap_err();
        match err {
            ToolError::PatchFailed { patch, .. } => assert!(patch.ends_with("a.patch")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
