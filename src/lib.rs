//! # toolpkg core library
//!
//! A very small package manager for the side tools a project needs but does not build
//! itself: solvers, converters and the like. Each package is fetched into
//! `build/tools/<subdir>`, patched with any `patches/<name>/*.patch`, built with its own
//! commands and installed into `ext/bin`.
//!
//! This library is built for the `toolpkg` CLI, but the flows can be driven directly.
//!
//! ## Modules Overview
//! - [`registry`] – Package descriptors and the table of known packages
//! - [`config`] – Parsing of the optional `toolpkg.toml`
//! - [`workspace`] – Tools, binary and patch directory layout
//! - [`fetch`] – VCS checkouts, archive downloads and file-list downloads
//! - [`patch`] – Applying local patches to a fetched tree
//! - [`installer`] – Build and install steps, and the install/update/rebuild flows
//! - [`dispatch`] – The verb table behind the command line
//! - [`shell`] – Running external programs
//! - [`error`] – The shared error type

pub mod config;
pub mod dispatch;
pub mod error;
pub mod fetch;
pub mod installer;
pub mod patch;
pub mod registry;
pub mod shell;
pub mod workspace;

pub use config::*;
pub use dispatch::{Context, dispatch};
pub use error::{Result, ToolError};
pub use installer::*;
pub use registry::*;
pub use workspace::*;
