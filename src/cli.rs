use std::path::PathBuf;
use clap::{ArgAction, Parser};

#[derive(Debug, Parser, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct CLI {
    /// `<command> [package]`; run `toolpkg commands` for the list of commands
    #[clap(num_args = 0.., value_name = "COMMAND [PACKAGE]")]
    pub args: Vec<String>,
    /// Increase log output (-v, -vv, -vvv). `RUST_LOG` takes precedence
    #[clap(short, long, action = ArgAction::Count)]
    pub verbose: u8,
    /// Use this config file instead of looking for `toolpkg.toml`
    #[clap(long)]
    pub config: Option<PathBuf>,
    /// Skip the per-user config file when no `toolpkg.toml` is found
    #[clap(long)]
    pub no_user_config: bool,
    /// Directory that `build/tools` and `ext/bin` are relative to. Defaults to the current directory
    #[clap(long)]
    pub root: Option<PathBuf>,
    /// Print `list` output as JSON
    #[clap(long)]
    pub json: bool,
    /// Disable colored output
    #[clap(long)]
    pub no_color: bool,
}
