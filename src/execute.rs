use std::process::ExitCode;
use anyhow::{Context as _, Result};
use colored::Colorize;
use toolpkg::config::Config;
use toolpkg::dispatch::{Context, dispatch, find_verb};
use toolpkg::workspace::Workspace;
use tracing::debug;
use crate::cli::CLI;

const USAGE_EXIT: u8 = 2;

pub fn execute(cli: CLI) -> Result<ExitCode> {
    if cli.no_color {
        colored::control::set_override(false);
    }
    let (verb, package) = match cli.args.as_slice() {
        [verb] => (verb.as_str(), None),
        [verb, package] => (verb.as_str(), Some(package.as_str())),
        _ => {
            print_usage();
            return Ok(ExitCode::from(USAGE_EXIT));
        }
    };
    if let Err(e) = find_verb(verb) {
        return Ok(usage_error(&e));
    }

    let root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir()?,
    };
    let user_config = !cli.no_user_config;
    let (config, source) = Config::discover(&root, cli.config.as_deref(), user_config)
        .context("failed to load configuration")?;
    if let Some(source) = &source {
        debug!(config = %source.display(), "using config file");
    }
    let registry = config.registry().context("invalid package definitions")?;
    let workspace = Workspace::new(&root, &config.paths)?;
    let mut ctx = Context::new(registry, workspace, config.programs);
    ctx.json = cli.json;

    match dispatch(&ctx, verb, package) {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) if e.is_usage() => Ok(usage_error(&e)),
        Err(e) => Err(e.into()),
    }
}

fn usage_error(e: &toolpkg::ToolError) -> ExitCode {
    eprintln!("{} {}", "error:".red().bold(), e);
    print_usage();
    ExitCode::from(USAGE_EXIT)
}

fn print_usage() {
    let prog = env!("CARGO_PKG_NAME");
    eprintln!("usage: {prog} command [package_name]");
    eprintln!();
    eprintln!("type '{prog} commands' to get a list of all commands");
}
