use std::fmt;
use std::path::Path;
use colored::Colorize;
use tracing::{info, warn};
use crate::config::Programs;
use crate::error::{Result, ToolError};
use crate::fetch;
use crate::patch::apply_patches;
use crate::registry::{FetchKind, PackageDescriptor};
use crate::shell::{run_shell, substitute_dest};
use crate::workspace::Workspace;

/// Step of a package flow, reported when the flow fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Preparing,
    Fetching,
    Patching,
    Updating,
    Building,
    Installing,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Preparing => "preparing",
            Stage::Fetching => "fetching",
            Stage::Patching => "patching",
            Stage::Updating => "updating",
            Stage::Building => "building",
            Stage::Installing => "installing",
        };
        f.write_str(name)
    }
}

/// Runs the build steps of `package` in order inside `package_dir`.
///
/// # Errors
/// Stops at the first step that exits unsuccessfully.
pub fn build(shell: &str, package: &PackageDescriptor, package_dir: &Path) -> Result<()> {
    for step in &package.build_steps {
        run_shell(shell, step, package_dir)?;
    }
    Ok(())
}

/// Runs the install steps of `package` in order inside `package_dir`,
/// replacing the `%s` placeholder with `dest_dir`.
///
/// # Errors
/// Stops at the first step that exits unsuccessfully.
pub fn install(
    shell: &str,
    package: &PackageDescriptor,
    package_dir: &Path,
    dest_dir: &Path,
) -> Result<()> {
    for step in &package.install_steps {
        run_shell(shell, &substitute_dest(step, dest_dir), package_dir)?;
    }
    Ok(())
}

/// Tracks the current stage of one verb applied to one package, so that a failure
/// names the step it happened in.
struct Flow<'a> {
    verb: &'a str,
    package: &'a PackageDescriptor,
}

impl Flow<'_> {
    fn step<T>(&self, stage: Stage, run: impl FnOnce() -> Result<T>) -> Result<T> {
        println!("{} {} {}", "==>".cyan().bold(), capitalize(stage), self.package.name.bold());
        info!(verb = self.verb, package = %self.package.name, %stage, "entering stage");
        run().map_err(|source| {
            warn!(verb = self.verb, package = %self.package.name, %stage, "stage failed");
            ToolError::Stage {
                verb: self.verb.to_string(),
                package: self.package.name.clone(),
                stage,
                source: Box::new(source),
            }
        })
    }
}

fn capitalize(stage: Stage) -> String {
    let name = stage.to_string();
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => name,
    }
}

/// Drives install, update and rebuild for packages inside one workspace.
pub struct Installer<'a> {
    workspace: &'a Workspace,
    programs: &'a Programs,
}

impl<'a> Installer<'a> {
    pub fn new(workspace: &'a Workspace, programs: &'a Programs) -> Self {
        Self { workspace, programs }
    }

    /// Removes any previous checkout, then fetches, patches, builds and installs.
    pub fn install(&self, package: &PackageDescriptor) -> Result<()> {
        let flow = Flow { verb: "install", package };
        let ws = self.workspace;
        flow.step(Stage::Preparing, || {
            ws.ensure_dirs()?;
            ws.remove_package_dir(package)?;
            Ok(())
        })?;
        flow.step(Stage::Fetching, || fetch::fetch(package, ws.tools_dir(), self.programs))?;
        let dir = ws.package_dir(package);
        flow.step(Stage::Patching, || {
            apply_patches(&self.programs.patch, &ws.patch_dir(package), &dir)
        })?;
        self.build_and_install(&flow, &dir)
    }

    /// Pulls new changes into an existing checkout, then builds and installs.
    ///
    /// # Errors
    /// Packages that weren't fetched from version control fail in the preparing stage
    /// with [`ToolError::UnsupportedOperation`], before any command runs.
    pub fn update(&self, package: &PackageDescriptor) -> Result<()> {
        let flow = Flow { verb: "update", package };
        let (vcs, dir) = flow.step(Stage::Preparing, || {
            let FetchKind::Checkout(vcs) = package.fetch_kind else {
                return Err(ToolError::UnsupportedOperation {
                    verb: "update".to_string(),
                    package: package.name.clone(),
                    reason: format!("fetch format '{}' has no remote to pull from", package.fetch_kind),
                });
            };
            Ok((vcs, self.workspace.existing_package_dir(package)?))
        })?;
        flow.step(Stage::Updating, || fetch::update(vcs, &dir, self.programs))?;
        self.build_and_install(&flow, &dir)
    }

    /// Builds and installs an existing checkout without fetching or patching.
    pub fn rebuild(&self, package: &PackageDescriptor) -> Result<()> {
        let flow = Flow { verb: "rebuild", package };
        let dir = flow.step(Stage::Preparing, || self.workspace.existing_package_dir(package))?;
        self.build_and_install(&flow, &dir)
    }

    fn build_and_install(&self, flow: &Flow<'_>, dir: &Path) -> Result<()> {
        let shell = &self.programs.shell;
        let package = flow.package;
        flow.step(Stage::Building, || build(shell, package, dir))?;
        flow.step(Stage::Installing, || {
            self.workspace.ensure_dirs()?;
            install(shell, package, dir, self.workspace.bin_dir())
        })?;
        println!("{} {} {}", "==>".green().bold(), "Installed".green(), package.name.bold());
        Ok(())
    }
}
