//! Error type shared by every `toolpkg` operation.

use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

use crate::installer::Stage;

pub type Result<T, E = ToolError> = std::result::Result<T, E>;

/// Everything that can stop an invocation.
///
/// All errors are fatal: the dispatcher never retries and never continues past one.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("unknown package '{0}'")]
    UnknownPackage(String),

    #[error("command '{0}' requires a package name")]
    MissingArgument(String),

    #[error("command '{verb}' does not take an argument (got '{argument}')")]
    UnexpectedArgument { verb: String, argument: String },

    #[error("unknown fetch format '{format}' for package '{package}'")]
    UnknownFetchFormat { package: String, format: String },

    #[error("invalid package '{package}': {reason}")]
    InvalidDescriptor { package: String, reason: String },

    #[error("package '{0}' is registered more than once")]
    DuplicatePackage(String),

    #[error("directory already exists: {}", .0.display())]
    DirectoryExists(PathBuf),

    #[error("'{verb}' is not supported for package '{package}' ({reason})")]
    UnsupportedOperation {
        verb: String,
        package: String,
        reason: String,
    },

    #[error("command `{command}` failed in {} ({status})", .cwd.display())]
    SubprocessFailed {
        command: String,
        cwd: PathBuf,
        status: ExitStatus,
    },

    #[error("program '{0}' was not found on PATH")]
    ToolNotFound(String),

    #[error("patch {} failed ({status})", .patch.display())]
    PatchFailed { patch: PathBuf, status: ExitStatus },

    #[error("working directory {} does not exist; run `install` first", .0.display())]
    MissingWorkdir(PathBuf),

    #[error("fetching did not produce the expected directory {}", .0.display())]
    MissingSubdir(PathBuf),

    #[error("unsupported archive type: {0}")]
    UnsupportedArchive(String),

    #[error("archive error: {0}")]
    Archive(String),

    #[error("download of {url} failed: {reason}")]
    Download { url: String, reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("config error in {}: {message}", .path.display())]
    Config { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{verb} {package} failed while {stage}")]
    Stage {
        verb: String,
        package: String,
        stage: Stage,
        #[source]
        source: Box<ToolError>,
    },
}

impl ToolError {
    /// The underlying error with any [`ToolError::Stage`] wrapping removed.
    pub fn root(&self) -> &ToolError {
        match self {
            ToolError::Stage { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether this error stems from bad command line usage rather than a failed operation.
    pub fn is_usage(&self) -> bool {
        matches!(
            self.root(),
            ToolError::UnknownCommand(_)
                | ToolError::MissingArgument(_)
                | ToolError::UnexpectedArgument { .. }
        )
    }
}

impl From<zip::result::ZipError> for ToolError {
    fn from(err: zip::result::ZipError) -> Self {
        ToolError::Archive(err.to_string())
    }
}
