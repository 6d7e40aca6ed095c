use std::path::{Path, PathBuf};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;
use crate::error::{Result, ToolError};
use crate::registry::{PackageEntry, Registry, Vcs};

/// Name of the config file looked up in the invocation directory.
pub const LOCAL_CONFIG: &str = "toolpkg.toml";

/// Represents the contents of a `toolpkg.toml` file.
///
/// Every section is optional; a missing file behaves like an empty one.
#[derive(Deserialize, Serialize, Debug, Default, Clone)]
#[serde(default)]
pub struct Config {
    /// Workspace locations.
    pub paths: Paths,
    /// External programs invoked by the fetch and patch steps.
    pub programs: Programs,
    /// Extra packages, registered after the built-in ones.
    #[serde(rename = "package", skip_serializing_if = "Vec::is_empty")]
    pub packages: Vec<PackageEntry>,
}

/// Directory layout. Relative paths are resolved against the invocation root.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct Paths {
    /// Per-package working directories.
    pub tools: PathBuf,
    /// Destination substituted for `%s` in install steps.
    pub bin: PathBuf,
    /// Patch root; defaults to `patches/` next to the executable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patches: Option<PathBuf>,
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            tools: PathBuf::from("build").join("tools"),
            bin: PathBuf::from("ext").join("bin"),
            patches: None,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct Programs {
    pub hg: String,
    pub git: String,
    pub patch: String,
    /// Shell used to run build and install steps (`<shell> -c <step>`).
    pub shell: String,
}

impl Default for Programs {
    fn default() -> Self {
        Self {
            hg: Vcs::Mercurial.program().to_string(),
            git: Vcs::Git.program().to_string(),
            patch: "patch".to_string(),
            shell: "sh".to_string(),
        }
    }
}

impl Programs {
    pub fn vcs(&self, vcs: Vcs) -> &str {
        match vcs {
            Vcs::Mercurial => &self.hg,
            Vcs::Git => &self.git,
        }
    }
}

impl Config {
    /// Loads a `Config` from a file path.
    ///
    /// # Errors
    /// Returns an error if the file can't be read or deserialized.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Config> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| ToolError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Finds and loads the config for an invocation rooted at `root`.
    ///
    /// Order: `explicit` (must exist), `<root>/toolpkg.toml`, the per-user config file
    /// (skipped unless `user_config` is set), then built-in defaults. Returns the config
    /// and the file it came from.
    pub fn discover(
        root: &Path,
        explicit: Option<&Path>,
        user_config: bool,
    ) -> Result<(Config, Option<PathBuf>)> {
        if let Some(path) = explicit {
            return Ok((Config::load(path)?, Some(path.to_path_buf())));
        }
        let user = if user_config { global_config_file() } else { None };
        let candidates = [Some(root.join(LOCAL_CONFIG)), user];
        for path in candidates.into_iter().flatten() {
            if path.is_file() {
                debug!(path = %path.display(), "loading config");
                return Ok((Config::load(&path)?, Some(path)));
            }
        }
        Ok((Config::default(), None))
    }

    /// The built-in packages plus the ones declared in this config.
    pub fn registry(&self) -> Result<Registry> {
        Registry::with_extra(self.packages.iter().cloned())
    }
}

/// `config.toml` in the platform's per-user config directory, if one can be determined.
pub fn global_config_file() -> Option<PathBuf> {
    ProjectDirs::from("org", "toolpkg", "toolpkg")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}
