//! Running external programs.
//!
//! Every call blocks until the child exits and turns a non-zero exit status into an
//! error, so callers can stop a flow with `?`. The working directory is always passed
//! explicitly; the process itself never changes directory.

use std::borrow::Cow;
use std::io::ErrorKind;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use tracing::{debug, info};
use crate::error::{Result, ToolError};

/// Placeholder in install steps that is replaced with the binary directory.
pub const DEST_PLACEHOLDER: &str = "%s";

/// Runs `program args...` in `cwd`.
///
/// # Errors
/// [`ToolError::ToolNotFound`] if the program can't be found,
/// [`ToolError::SubprocessFailed`] if it exits unsuccessfully.
pub fn run_program(program: &str, args: &[&str], cwd: &Path) -> Result<()> {
    let shown = describe(program, args);
    let status = spawn(Command::new(program).args(args).current_dir(cwd), program, &shown, cwd)?;
    check(status, shown, cwd)
}

/// Like [`run_program`], but with stdin closed so the child can't stop to prompt.
pub fn run_batch(program: &str, args: &[&str], cwd: &Path) -> Result<()> {
    let shown = describe(program, args);
    let mut command = Command::new(program);
    command.args(args).current_dir(cwd).stdin(Stdio::null());
    let status = spawn(&mut command, program, &shown, cwd)?;
    check(status, shown, cwd)
}

/// Runs one build or install step through `<shell> -c`.
pub fn run_shell(shell: &str, step: &str, cwd: &Path) -> Result<()> {
    let status = spawn(
        Command::new(shell).arg("-c").arg(step).current_dir(cwd),
        shell,
        step,
        cwd,
    )?;
    check(status, step.to_string(), cwd)
}

fn describe(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}

fn spawn(command: &mut Command, program: &str, shown: &str, cwd: &Path) -> Result<ExitStatus> {
    info!(cwd = %cwd.display(), "$ {shown}");
    match command.status() {
        Ok(status) => Ok(status),
        Err(e) if e.kind() == ErrorKind::NotFound && cwd.is_dir() => {
            Err(ToolError::ToolNotFound(program.to_string()))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            Err(ToolError::MissingWorkdir(cwd.to_path_buf()))
        }
        Err(e) => Err(e.into()),
    }
}

fn check(status: ExitStatus, command: String, cwd: &Path) -> Result<()> {
    debug!(%status, "`{command}` finished");
    if status.success() {
        Ok(())
    } else {
        Err(ToolError::SubprocessFailed {
            command,
            cwd: cwd.to_path_buf(),
            status,
        })
    }
}

/// Replaces the first destination placeholder in `step` with `dest`.
/// Steps without a placeholder are returned unchanged.
pub fn substitute_dest<'a>(step: &'a str, dest: &Path) -> Cow<'a, str> {
    if !step.contains(DEST_PLACEHOLDER) {
        return Cow::Borrowed(step);
    }
    let dest = dest.to_string_lossy();
    Cow::Owned(step.replacen(DEST_PLACEHOLDER, &quote(&dest), 1))
}

/// Single-quotes `value` for `sh` if it contains anything the shell would interpret.
pub fn quote(value: &str) -> Cow<'_, str> {
    let plain = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "/._-+:=@%,".contains(c));
    if plain {
        Cow::Borrowed(value)
    } else {
        Cow::Owned(format!("'{}'", value.replace('\'', r"'\''")))
    }
}
