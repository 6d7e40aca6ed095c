//! Maps a verb (and optional package name) to the flow that handles it.

use colored::Colorize;
use serde::Serialize;
use tracing::debug;
use crate::config::Programs;
use crate::error::{Result, ToolError};
use crate::installer::Installer;
use crate::registry::{FetchKind, PackageDescriptor, Registry};
use crate::workspace::Workspace;

/// Everything a handler needs for one invocation.
#[derive(Debug)]
pub struct Context {
    pub registry: Registry,
    pub workspace: Workspace,
    pub programs: Programs,
    /// Print listings as JSON instead of text.
    pub json: bool,
}

impl Context {
    pub fn new(registry: Registry, workspace: Workspace, programs: Programs) -> Self {
        Self { registry, workspace, programs, json: false }
    }

    fn installer(&self) -> Installer<'_> {
        Installer::new(&self.workspace, &self.programs)
    }
}

/// What a verb expects on the command line.
#[derive(Clone, Copy)]
pub enum Handler {
    NoArgs(fn(&Context) -> Result<()>),
    WithPackage(fn(&Context, &PackageDescriptor) -> Result<()>),
}

/// One entry of the verb table.
#[derive(Clone, Copy)]
pub struct Verb {
    pub name: &'static str,
    pub help: &'static str,
    pub handler: Handler,
}

impl Verb {
    pub fn takes_package(&self) -> bool {
        matches!(self.handler, Handler::WithPackage(_))
    }

    /// How the verb is shown in `commands`, e.g. `install package`.
    pub fn usage(&self) -> String {
        if self.takes_package() {
            format!("{} package", self.name)
        } else {
            self.name.to_string()
        }
    }
}

pub const VERBS: &[Verb] = &[
    Verb {
        name: "install",
        help: "Installs a package",
        handler: Handler::WithPackage(cmd_install),
    },
    Verb {
        name: "update",
        help: "Updates a package",
        handler: Handler::WithPackage(cmd_update),
    },
    Verb {
        name: "rebuild",
        help: "Rebuilds a package",
        handler: Handler::WithPackage(cmd_rebuild),
    },
    Verb {
        name: "commands",
        help: "Shows list of commands",
        handler: Handler::NoArgs(cmd_commands),
    },
    Verb {
        name: "list",
        help: "Lists all available packages",
        handler: Handler::NoArgs(cmd_list),
    },
];

/// Looks a verb up in [`VERBS`].
pub fn find_verb(name: &str) -> Result<&'static Verb> {
    VERBS
        .iter()
        .find(|verb| verb.name == name)
        .ok_or_else(|| ToolError::UnknownCommand(name.to_string()))
}

/// Runs exactly one verb.
///
/// # Errors
/// [`ToolError::UnknownCommand`] for an unrecognized verb,
/// [`ToolError::MissingArgument`] when a package verb gets no package,
/// [`ToolError::UnknownPackage`] when the package isn't registered, and whatever
/// the selected flow fails with.
pub fn dispatch(ctx: &Context, verb: &str, package: Option<&str>) -> Result<()> {
    let entry = find_verb(verb)?;
    debug!(verb, package, "dispatching");
    match (entry.handler, package) {
        (Handler::NoArgs(run), None) => run(ctx),
        (Handler::NoArgs(_), Some(argument)) => Err(ToolError::UnexpectedArgument {
            verb: verb.to_string(),
            argument: argument.to_string(),
        }),
        (Handler::WithPackage(_), None) => Err(ToolError::MissingArgument(verb.to_string())),
        (Handler::WithPackage(run), Some(name)) => {
            let package = ctx.registry.lookup(name)?;
            run(ctx, package)
        }
    }
}

fn cmd_install(ctx: &Context, package: &PackageDescriptor) -> Result<()> {
    ctx.installer().install(package)
}

fn cmd_update(ctx: &Context, package: &PackageDescriptor) -> Result<()> {
    ctx.installer().update(package)
}

fn cmd_rebuild(ctx: &Context, package: &PackageDescriptor) -> Result<()> {
    ctx.installer().rebuild(package)
}

fn cmd_commands(_ctx: &Context) -> Result<()> {
    print!("{}", format_commands());
    Ok(())
}

fn cmd_list(ctx: &Context) -> Result<()> {
    if ctx.json {
        let listing = json_packages(&ctx.registry)?;
        println!("{listing}");
    } else {
        print!("{}", format_packages(&ctx.registry));
    }
    Ok(())
}

/// The text printed by `commands`.
pub fn format_commands() -> String {
    let mut out = format!("{}\n", "Available commands:".bold());
    for verb in VERBS {
        out.push_str(&format!("  {:28} {}\n", verb.usage(), verb.help));
    }
    out
}

/// The text printed by `list`.
pub fn format_packages(registry: &Registry) -> String {
    let mut out = format!("{}\n", "Available packages:".bold());
    for (name, description) in registry.list_all() {
        out.push_str(&format!("  {name:28} {description}\n"));
    }
    out
}

#[derive(Serialize)]
struct PackageListing<'a> {
    name: &'a str,
    description: &'a str,
    subdir: &'a str,
    fetch: FetchKind,
    urls: Vec<&'a str>,
}

/// The JSON printed by `list --json`.
pub fn json_packages(registry: &Registry) -> Result<String> {
    let listing: Vec<_> = registry
        .packages()
        .iter()
        .map(|p| PackageListing {
            name: &p.name,
            description: &p.description,
            subdir: &p.subdir,
            fetch: p.fetch_kind,
            urls: p.urls(),
        })
        .collect();
    Ok(serde_json::to_string_pretty(&listing)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Paths;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn context(root: &std::path::Path) -> Context {
        let paths = Paths {
            patches: Some(PathBuf::from("patches")),
            ..Paths::default()
        };
        let workspace = Workspace::new(root, &paths).unwrap();
        Context::new(Registry::builtin().unwrap(), workspace, Programs::default())
    }

    #[test]
    fn test_verb_table_is_unique() {
        for (i, verb) in VERBS.iter().enumerate() {
            assert!(VERBS[i + 1..].iter().all(|other| other.name != verb.name));
            assert!(!verb.help.is_empty());
        }
    }

    #[test]
    fn test_listing_verbs_need_no_package() {
        let dir = tempdir().unwrap();
        let ctx = context(dir.path());
        dispatch(&ctx, "commands", None).unwrap();
        dispatch(&ctx, "list", None).unwrap();
        assert!(!dir.path().join("build").exists());
        assert!(!dir.path().join("ext").exists());
    }

    #[test]
    fn test_unknown_command() {
        let dir = tempdir().unwrap();
        let ctx = context(dir.path());
        let err = dispatch(&ctx, "foo", None).unwrap_err();
        assert!(matches!(err, ToolError::UnknownCommand(v) if v == "foo"));
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[test]
    fn test_package_verbs_need_package() {
        let dir = tempdir().unwrap();
        let ctx = context(dir.path());
        for verb in ["install", "update", "rebuild"] {
            let err = dispatch(&ctx, verb, None).unwrap_err();
            assert!(matches!(err, ToolError::MissingArgument(v) if v == verb));
            let err = dispatch(&ctx, verb, Some("nope")).unwrap_err();
            assert!(matches!(err, ToolError::UnknownPackage(p) if p == "nope"));
        }
    }

    #[test]
    fn test_listing_verbs_reject_argument() {
        let dir = tempdir().unwrap();
        let ctx = context(dir.path());
        let err = dispatch(&ctx, "list", Some("abc")).unwrap_err();
        assert!(matches!(err, ToolError::UnexpectedArgument { .. }));
    }

    #[test]
    fn test_update_archive_package_unsupported() {
        let dir = tempdir().unwrap();
        let ctx = context(dir.path());
        let err = dispatch(&ctx, "update", Some("minisat")).unwrap_err();
        assert!(matches!(err, ToolError::Stage { stage: crate::installer::Stage::Preparing, .. }));
        assert!(matches!(err.root(), ToolError::UnsupportedOperation { .. }));
        assert!(!dir.path().join("ext").exists());
    }

    #[test]
    fn test_format_commands() {
        colored::control::set_override(false);
        let text = format_commands();
        assert!(text.starts_with("Available commands:"));
        assert!(text.contains(&format!("  {:28} Installs a package", "install package")));
        assert!(text.contains(&format!("  {:28} Shows list of commands", "commands")));
    }

    #[test]
    fn test_format_packages() {
        colored::control::set_override(false);
        let registry = Registry::builtin().unwrap();
        let text = format_packages(&registry);
        assert_eq!(text.lines().count(), registry.len() + 1);
        assert!(text.contains("Knuth's CDCL SAT solver"));
    }

    #[test]
    fn test_json_packages() {
        let registry = Registry::builtin().unwrap();
        let json = json_packages(&registry).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let items = value.as_array().unwrap();
        assert_eq!(items.len(), registry.len());
        assert_eq!(items[0]["name"], "abc");
        assert_eq!(items[0]["urls"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_format_packages_one_line_each() {
        colored::control::set_override(false);
        let registry = Registry::builtin().unwrap();
        let text = format_packages(&registry);
        assert!(text.ends_with('\n'));
        for (line, (name, _)) in text.lines().skip(1).zip(registry.list_all()) {
            assert!(line.starts_with(&format!("  {name}")));
        }
    }
}
