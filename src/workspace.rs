use std::path::{Path, PathBuf};
use tracing::debug;
use crate::config::Paths;
use crate::error::{Result, ToolError};
use crate::registry::PackageDescriptor;

/// Resolved on-disk layout for one invocation.
///
/// All paths are absolute so that subprocesses can be started in any directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    tools_dir: PathBuf,
    bin_dir: PathBuf,
    patches_dir: PathBuf,
}

impl Workspace {
    /// Resolves `paths` against the invocation `root`.
    pub fn new<P: AsRef<Path>>(root: P, paths: &Paths) -> Result<Workspace> {
        let root = std::path::absolute(root.as_ref())?;
        let patches_dir = match &paths.patches {
            Some(patches) => root.join(patches),
            None => program_dir()?.join("patches"),
        };
        Ok(Workspace {
            tools_dir: root.join(&paths.tools),
            bin_dir: root.join(&paths.bin),
            patches_dir,
        })
    }

    /// Creates the tools and binary directories if they don't exist yet.
    /// Existing content is left alone.
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [&self.tools_dir, &self.bin_dir] {
            if !dir.exists() {
                debug!(dir = %dir.display(), "creating directory");
                std::fs::create_dir_all(dir)?;
            }
        }
        Ok(())
    }

    pub fn tools_dir(&self) -> &Path {
        &self.tools_dir
    }

    pub fn bin_dir(&self) -> &Path {
        &self.bin_dir
    }

    /// Working directory of a package, whether or not it exists.
    pub fn package_dir(&self, package: &PackageDescriptor) -> PathBuf {
        self.tools_dir.join(&package.subdir)
    }

    /// Working directory of a package that must already have been fetched.
    ///
    /// # Errors
    /// Returns [`ToolError::MissingWorkdir`] if the directory is absent.
    pub fn existing_package_dir(&self, package: &PackageDescriptor) -> Result<PathBuf> {
        let dir = self.package_dir(package);
        if !dir.is_dir() {
            return Err(ToolError::MissingWorkdir(dir));
        }
        Ok(dir)
    }

    /// Removes the working directory of a package. Returns whether anything was removed.
    pub fn remove_package_dir(&self, package: &PackageDescriptor) -> Result<bool> {
        let dir = self.package_dir(package);
        if !dir.exists() {
            return Ok(false);
        }
        debug!(dir = %dir.display(), "removing previous checkout");
        std::fs::remove_dir_all(&dir)?;
        Ok(true)
    }

    /// Directory holding the `*.patch` files of a package.
    pub fn patch_dir(&self, package: &PackageDescriptor) -> PathBuf {
        self.patches_dir.join(&package.name)
    }
}

/// Directory containing the running executable.
pub fn program_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe()?;
    let dir = exe
        .parent()
        .ok_or_else(|| std::io::Error::other("executable has no parent directory"))?;
    Ok(dir.to_path_buf())
}
