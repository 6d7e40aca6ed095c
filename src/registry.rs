use std::collections::HashSet;
use std::fmt;
use std::path::{Component, Path};
use std::sync::LazyLock;
use regex::Regex;
use serde::{Deserialize, Serialize};
use crate::error::{Result, ToolError};

static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.+-]*$").expect("package name pattern is valid")
});

/// Version control clients a package can be checked out with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Vcs {
    Mercurial,
    Git,
}

impl Vcs {
    /// The client binary invoked for this VCS unless overridden in the config.
    pub fn program(&self) -> &'static str {
        match self {
            Vcs::Mercurial => "hg",
            Vcs::Git => "git",
        }
    }
}

/// How the sources of a package are obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FetchKind {
    /// Clone a repository; the only kind that supports `update`.
    Checkout(Vcs),
    /// Download one archive and extract it into the tools workspace.
    Archive,
    /// Download every listed file into a freshly created subdirectory.
    FileList,
}

impl FetchKind {
    /// Parses the `fmt` field of a package entry.
    pub fn parse(package: &str, format: &str) -> Result<FetchKind> {
        match format {
            "hg" => Ok(FetchKind::Checkout(Vcs::Mercurial)),
            "git" => Ok(FetchKind::Checkout(Vcs::Git)),
            "tar-gz" | "tgz" | "zip" | "archive" => Ok(FetchKind::Archive),
            "wget-list" | "file-list" => Ok(FetchKind::FileList),
            _ => Err(ToolError::UnknownFetchFormat {
                package: package.to_string(),
                format: format.to_string(),
            }),
        }
    }
}

impl fmt::Display for FetchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchKind::Checkout(vcs) => write!(f, "{}", vcs.program()),
            FetchKind::Archive => write!(f, "archive"),
            FetchKind::FileList => write!(f, "file-list"),
        }
    }
}

/// Where the sources of a package live: one URL, or an ordered list of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Source {
    Url(String),
    List(Vec<String>),
}

/// A package as written in a config file, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageEntry {
    pub name: String,
    pub description: String,
    pub subdir: String,
    pub url: Source,
    pub fmt: String,
    #[serde(default)]
    pub build: Vec<String>,
    #[serde(default)]
    pub install: Vec<String>,
}

/// Validated, immutable description of how to fetch, build and install one package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageDescriptor {
    pub name: String,
    pub description: String,
    /// Directory under the tools workspace; always a single plain path component.
    pub subdir: String,
    pub source: Source,
    pub fetch_kind: FetchKind,
    pub build_steps: Vec<String>,
    /// Install commands; a `%s` is replaced with the binary directory.
    pub install_steps: Vec<String>,
}

impl PackageDescriptor {
    /// Validates a raw entry and turns it into a descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::UnknownFetchFormat`] for an unrecognized `fmt` and
    /// [`ToolError::InvalidDescriptor`] when the name, subdir or source shape is wrong.
    pub fn from_entry(entry: PackageEntry) -> Result<PackageDescriptor> {
        let invalid = |reason: &str| ToolError::InvalidDescriptor {
            package: entry.name.clone(),
            reason: reason.to_string(),
        };
        if !NAME_RE.is_match(&entry.name) {
            return Err(invalid("name must be alphanumeric (plus '_', '.', '+', '-')"));
        }
        if entry.description.trim().is_empty() {
            return Err(invalid("description must not be empty"));
        }
        if !is_plain_subdir(&entry.subdir) {
            return Err(invalid("subdir must be a single directory name inside the workspace"));
        }
        let fetch_kind = FetchKind::parse(&entry.name, &entry.fmt)?;
        match (&fetch_kind, &entry.url) {
            (FetchKind::FileList, Source::List(urls)) if !urls.is_empty() => {}
            (FetchKind::FileList, _) => {
                return Err(invalid("a file list needs a non-empty list of URLs"));
            }
            (_, Source::Url(url)) if !url.is_empty() => {}
            (_, _) => return Err(invalid("expected a single URL")),
        }
        Ok(PackageDescriptor {
            name: entry.name,
            description: entry.description,
            subdir: entry.subdir,
            source: entry.url,
            fetch_kind,
            build_steps: entry.build,
            install_steps: entry.install,
        })
    }

    /// The single source URL, for kinds that have one.
    pub fn url(&self) -> Option<&str> {
        match &self.source {
            Source::Url(url) => Some(url),
            Source::List(_) => None,
        }
    }

    /// All source URLs in order.
    pub fn urls(&self) -> Vec<&str> {
        match &self.source {
            Source::Url(url) => vec![url.as_str()],
            Source::List(urls) => urls.iter().map(String::as_str).collect(),
        }
    }
}

fn is_plain_subdir(subdir: &str) -> bool {
    let mut components = Path::new(subdir).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

enum BuiltinSource {
    Url(&'static str),
    List(&'static [&'static str]),
}

struct BuiltinPackage {
    name: &'static str,
    description: &'static str,
    subdir: &'static str,
    url: BuiltinSource,
    fmt: &'static str,
    build: &'static [&'static str],
    install: &'static [&'static str],
}

const BUILTIN: &[BuiltinPackage] = &[
    BuiltinPackage {
        name: "abc",
        description: "ABC: System for Sequential Logic Synthesis and Formal Verification",
        subdir: "abc",
        url: BuiltinSource::Url("https://bitbucket.org/alanmi/abc"),
        fmt: "hg",
        build: &["make -j5"],
        install: &["cp -v abc %s"],
    },
    BuiltinPackage {
        name: "minisat",
        description: "Minimalistic, open-source SAT solver",
        subdir: "minisat",
        url: BuiltinSource::Url("http://minisat.se/downloads/minisat-2.2.0.tar.gz"),
        fmt: "tar-gz",
        build: &["MROOT=`pwd` make -C core rs"],
        install: &["cp -v core/minisat_static %s/minisat"],
    },
    BuiltinPackage {
        name: "picosat",
        description: "PicoSAT SAT solver",
        subdir: "picosat-959",
        url: BuiltinSource::Url("http://fmv.jku.at/picosat/picosat-959.tar.gz"),
        fmt: "tar-gz",
        build: &["./configure", "make"],
        install: &["cp -v picogcnf picomcs picomus picosat %s"],
    },
    BuiltinPackage {
        name: "sat13",
        description: "Knuth's CDCL SAT solver",
        subdir: "sat13",
        url: BuiltinSource::List(&[
            "http://www-cs-faculty.stanford.edu/~uno/programs/sat13.w",
            "http://tug.ctan.org/support/graphbase/gb_flip.w",
            "http://tug.ctan.org/support/graphbase/boilerplate.w",
        ]),
        fmt: "wget-list",
        build: &["ctangle gb_flip.w", "ctangle sat13.w", "gcc -o sat13 gb_flip.c sat13.c"],
        install: &["cp -v sat13 %s"],
    },
    BuiltinPackage {
        name: "dimacs2sat",
        description: "Convert DIMACS to SAT for Knuth's SAT solvers",
        subdir: "dimacs2sat",
        url: BuiltinSource::List(&["http://www-cs-faculty.stanford.edu/~uno/programs/dimacs-to-sat.w"]),
        fmt: "wget-list",
        build: &["ctangle dimacs-to-sat.w", "gcc -o dimacs-to-sat dimacs-to-sat.c"],
        install: &["cp -v dimacs-to-sat %s"],
    },
    BuiltinPackage {
        name: "espresso",
        description: "Espresso is a multi-valued PLA minimization (adjusted version)",
        subdir: "espresso-ab-1.0",
        url: BuiltinSource::Url("https://eqntott.googlecode.com/files/espresso-ab-1.0.tar.gz"),
        fmt: "tar-gz",
        build: &["./configure", "make"],
        install: &["cp -v src/espresso %s"],
    },
    BuiltinPackage {
        name: "directed_lad",
        description: "LAD is a program (in C) for solving the subgraph isomorphism problem (for directed and labelled graphs)",
        subdir: "directedLAD",
        url: BuiltinSource::Url("http://liris.cnrs.fr/csolnon/directedLAD.tgz"),
        fmt: "tgz",
        build: &["make"],
        install: &["cp -v main %s/directed_lad"],
    },
    BuiltinPackage {
        name: "lad",
        description: "LAD is a program (in C) for solving the subgraph isomorphism problem",
        subdir: "LAD",
        url: BuiltinSource::Url("http://liris.cnrs.fr/csolnon/LAD.tgz"),
        fmt: "tgz",
        build: &["make"],
        install: &["cp -v main %s/lad"],
    },
];

impl BuiltinPackage {
    fn to_entry(&self) -> PackageEntry {
        let to_vec = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        PackageEntry {
            name: self.name.to_string(),
            description: self.description.to_string(),
            subdir: self.subdir.to_string(),
            url: match self.url {
                BuiltinSource::Url(url) => Source::Url(url.to_string()),
                BuiltinSource::List(urls) => Source::List(to_vec(urls)),
            },
            fmt: self.fmt.to_string(),
            build: to_vec(self.build),
            install: to_vec(self.install),
        }
    }
}

/// The table of known packages, in registration order.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    packages: Vec<PackageDescriptor>,
}

impl Registry {
    /// Builds a registry from already validated descriptors.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::DuplicatePackage`] if two descriptors share a name.
    pub fn new(packages: Vec<PackageDescriptor>) -> Result<Registry> {
        let mut seen = HashSet::new();
        for package in &packages {
            if !seen.insert(package.name.as_str()) {
                return Err(ToolError::DuplicatePackage(package.name.clone()));
            }
        }
        Ok(Registry { packages })
    }

    /// The packages shipped with the tool.
    pub fn builtin() -> Result<Registry> {
        Registry::from_entries(BUILTIN.iter().map(BuiltinPackage::to_entry))
    }

    /// Validates raw entries and builds a registry from them.
    pub fn from_entries<I>(entries: I) -> Result<Registry>
    where
        I: IntoIterator<Item = PackageEntry>,
    {
        let packages = entries
            .into_iter()
            .map(PackageDescriptor::from_entry)
            .collect::<Result<Vec<_>>>()?;
        Registry::new(packages)
    }

    /// Built-in packages followed by `extra` entries (e.g. from a config file).
    pub fn with_extra<I>(extra: I) -> Result<Registry>
    where
        I: IntoIterator<Item = PackageEntry>,
    {
        Registry::from_entries(BUILTIN.iter().map(BuiltinPackage::to_entry).chain(extra))
    }

    /// Looks a package up by name.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::UnknownPackage`] if nothing is registered under `name`.
    pub fn lookup(&self, name: &str) -> Result<&PackageDescriptor> {
        self.packages
            .iter()
            .find(|package| package.name == name)
            .ok_or_else(|| ToolError::UnknownPackage(name.to_string()))
    }

    /// `(name, description)` of every package, in registration order.
    pub fn list_all(&self) -> Vec<(&str, &str)> {
        self.packages
            .iter()
            .map(|p| (p.name.as_str(), p.description.as_str()))
            .collect()
    }

    pub fn packages(&self) -> &[PackageDescriptor] {
        &self.packages
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}
