//! Retrieving package sources into the tools workspace.

use std::collections::HashSet;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;
use flate2::read::GzDecoder;
use tar::Archive;
use tracing::{debug, info};
use crate::config::Programs;
use crate::error::{Result, ToolError};
use crate::registry::{FetchKind, PackageDescriptor, Vcs};
use crate::shell::run_program;

/// Fetches the sources of `package` into `tools_dir`.
///
/// On success `tools_dir/<subdir>` exists. The caller is responsible for removing a
/// previous checkout first.
///
/// # Errors
/// Any failing download, extraction or VCS command aborts the whole fetch.
pub fn fetch(package: &PackageDescriptor, tools_dir: &Path, programs: &Programs) -> Result<()> {
    let target = tools_dir.join(&package.subdir);
    match package.fetch_kind {
        FetchKind::Checkout(vcs) => {
            let url = single_url(package)?;
            run_program(programs.vcs(vcs), &["clone", url, package.subdir.as_str()], tools_dir)?;
        }
        FetchKind::Archive => {
            let url = single_url(package)?;
            download_archive(url, tools_dir, &target)?;
        }
        FetchKind::FileList => {
            if target.exists() {
                return Err(ToolError::DirectoryExists(target));
            }
            fs::create_dir(&target)?;
            for url in package.urls() {
                let name = url_basename(url)?;
                download(url, &target.join(name))?;
            }
        }
    }
    if !target.is_dir() {
        return Err(ToolError::MissingSubdir(target));
    }
    Ok(())
}

/// Pulls and updates an existing `vcs` checkout in `package_dir`.
///
/// Mercurial needs a separate `update` after `pull`; git fast-forwards in one step.
pub fn update(vcs: Vcs, package_dir: &Path, programs: &Programs) -> Result<()> {
    let program = programs.vcs(vcs);
    match vcs {
        Vcs::Mercurial => {
            run_program(program, &["pull"], package_dir)?;
            run_program(program, &["update"], package_dir)
        }
        Vcs::Git => run_program(program, &["pull", "--ff-only"], package_dir),
    }
}

fn single_url(package: &PackageDescriptor) -> Result<&str> {
    package.url().ok_or_else(|| ToolError::InvalidDescriptor {
        package: package.name.clone(),
        reason: "expected a single URL".to_string(),
    })
}

/// Downloads `url` next to `tools_dir`, extracts it there and removes the archive.
///
/// If the archive doesn't contain `target`, whatever it unpacked is removed again and
/// [`ToolError::MissingSubdir`] is returned.
fn download_archive(url: &str, tools_dir: &Path, target: &Path) -> Result<()> {
    let name = url_basename(url)?;
    let format = ArchiveFormat::from_name(name)?;
    let before = dir_entries(tools_dir)?;
    let archive = tempfile::Builder::new()
        .prefix(".toolpkg-")
        .suffix(&format!("-{name}"))
        .tempfile_in(tools_dir)?;
    download(url, archive.path())?;
    extract(format, archive.path(), tools_dir)?;
    archive.close()?;
    if !target.is_dir() {
        for entry in dir_entries(tools_dir)?.difference(&before) {
            let path = tools_dir.join(entry);
            debug!(path = %path.display(), "removing unexpected archive content");
            if fs::symlink_metadata(&path)?.is_dir() {
                fs::remove_dir_all(&path)?;
            } else {
                fs::remove_file(&path)?;
            }
        }
        return Err(ToolError::MissingSubdir(target.to_path_buf()));
    }
    Ok(())
}

fn dir_entries(dir: &Path) -> Result<HashSet<OsString>> {
    let mut names = HashSet::new();
    for entry in fs::read_dir(dir)? {
        names.insert(entry?.file_name());
    }
    Ok(names)
}

/// Last path segment of a URL, ignoring query and fragment.
pub fn url_basename(url: &str) -> Result<&str> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
        .ok_or_else(|| ToolError::Download {
            url: url.to_string(),
            reason: "could not determine a file name".to_string(),
        })
}

/// Copies `url` to `dest`.
///
/// `http://` and `https://` URLs are downloaded; `file://` URLs and bare paths are
/// copied from the local filesystem.
pub fn download(url: &str, dest: &Path) -> Result<()> {
    info!("Fetching {}", url);
    if url.starts_with("http://") || url.starts_with("https://") {
        let mut response = reqwest::blocking::get(url)?.error_for_status()?;
        let mut file = File::create(dest)?;
        response.copy_to(&mut file)?;
    } else if let Some(path) = local_path(url) {
        fs::copy(path, dest).map_err(|e| ToolError::Download {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
    } else {
        return Err(ToolError::Download {
            url: url.to_string(),
            reason: "unsupported URL scheme".to_string(),
        });
    }
    debug!("Downloaded to {}", dest.display());
    Ok(())
}

fn local_path(url: &str) -> Option<&Path> {
    match url.strip_prefix("file://") {
        Some(path) => Some(Path::new(path)),
        None if !url.contains("://") => Some(Path::new(url)),
        None => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    TarGz,
    Tar,
    Zip,
}

impl ArchiveFormat {
    /// Picks the format from a file name's extension.
    pub fn from_name(name: &str) -> Result<ArchiveFormat> {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".tar.gz") || lower.ends_with(".tgz") {
            Ok(ArchiveFormat::TarGz)
        } else if lower.ends_with(".tar") {
            Ok(ArchiveFormat::Tar)
        } else if lower.ends_with(".zip") {
            Ok(ArchiveFormat::Zip)
        } else {
            Err(ToolError::UnsupportedArchive(name.to_string()))
        }
    }
}

/// Unpacks an archive into `dest`, keeping its top-level directory.
/// Entries that would land outside `dest` are skipped.
pub fn extract(format: ArchiveFormat, archive: &Path, dest: &Path) -> Result<()> {
    let file = BufReader::new(File::open(archive)?);
    match format {
        ArchiveFormat::TarGz => Archive::new(GzDecoder::new(file)).unpack(dest)?,
        ArchiveFormat::Tar => Archive::new(file).unpack(dest)?,
        ArchiveFormat::Zip => zip::ZipArchive::new(file)?.extract(dest)?,
    }
    info!("Unpacked to {}", dest.display());
    Ok(())
}
