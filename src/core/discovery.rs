//! Federation manifest discovery.
//!
//! A package tree may hold its manifest anywhere below the working
//! directory. Discovery walks the tree in a fixed order (files before
//! subdirectories, each lexically sorted) and never descends into vendored
//! dependency directories. The search policies are thin strategies over that
//! single traversal.

use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

use crate::util::diagnostic::{suggestions, Diagnostic};

/// Directory names that are never searched by default.
pub const DEFAULT_EXCLUDES: &[&str] = &["node_modules", ".git"];

/// Errors locating or loading a federation manifest.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum ManifestError {
    #[error("could not find `{name}` in `{}` or any subdirectory", .root.display())]
    #[diagnostic(
        code(fedtypes::manifest::not_found),
        help("pass `--config <path>` or add a federation.config.json to the package")
    )]
    NotFound { root: PathBuf, name: String },

    #[error("found {count} federation manifests, expected exactly one")]
    #[diagnostic(
        code(fedtypes::manifest::ambiguous),
        help("pass `--config <path>` to choose one, or use `--discovery first-match`")
    )]
    Ambiguous { count: usize, paths: Vec<PathBuf> },

    #[error("manifest `{}` does not exist", .path.display())]
    #[diagnostic(code(fedtypes::manifest::explicit_missing))]
    ExplicitMissing { path: PathBuf },

    #[error("invalid manifest `{}`: {reason}", .path.display())]
    #[diagnostic(code(fedtypes::manifest::invalid))]
    Invalid { path: PathBuf, reason: String },

    #[error("exposed module `{key}` points to a missing file: {}", .path.display())]
    #[diagnostic(
        code(fedtypes::manifest::missing_source),
        help("paths in `exposes` are resolved relative to the manifest's directory")
    )]
    MissingSource { key: String, path: PathBuf },
}

impl ManifestError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut diag = Diagnostic::error(self.to_string());

        match self {
            ManifestError::NotFound { .. } => {
                diag = diag.with_suggestion(suggestions::NO_MANIFEST);
            }
            ManifestError::Ambiguous { paths, .. } => {
                for path in paths {
                    diag = diag.with_context(format!("candidate: {}", path.display()));
                }
            }
            ManifestError::ExplicitMissing { path } | ManifestError::Invalid { path, .. } => {
                diag = diag.with_location(path.clone());
            }
            ManifestError::MissingSource { path, .. } => {
                diag = diag.with_location(path.clone());
            }
        }

        if let Some(help) = MietteDiagnostic::help(self) {
            diag = diag.with_suggestion(help.to_string());
        }

        diag
    }
}

/// How to choose among manifests found by searching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchPolicy {
    /// Take the first manifest in traversal order.
    #[default]
    FirstMatch,
    /// Require exactly one manifest in the whole tree.
    Unique,
}

impl FromStr for SearchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "first-match" | "first" => Ok(SearchPolicy::FirstMatch),
            "unique" | "exhaustive" => Ok(SearchPolicy::Unique),
            _ => Err(format!(
                "invalid discovery policy '{}'; expected 'first-match' or 'unique'",
                s
            )),
        }
    }
}

impl fmt::Display for SearchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchPolicy::FirstMatch => write!(f, "first-match"),
            SearchPolicy::Unique => write!(f, "unique"),
        }
    }
}

/// Where the manifest comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryPolicy {
    /// A caller-supplied manifest path.
    Explicit(PathBuf),
    /// Search the tree under the root.
    Search(SearchPolicy),
}

impl Default for DiscoveryPolicy {
    fn default() -> Self {
        DiscoveryPolicy::Search(SearchPolicy::default())
    }
}

/// Manifest finder over a directory tree.
#[derive(Debug, Clone)]
pub struct Discovery {
    manifest_name: String,
    excludes: Vec<String>,
}

impl Default for Discovery {
    fn default() -> Self {
        Discovery::new(crate::core::manifest::MANIFEST_NAME)
    }
}

impl Discovery {
    /// Create a finder for manifests named `manifest_name`.
    pub fn new(manifest_name: impl Into<String>) -> Self {
        Discovery {
            manifest_name: manifest_name.into(),
            excludes: DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Replace the excluded directory names.
    pub fn with_excludes(mut self, excludes: Vec<String>) -> Self {
        self.excludes = excludes;
        self
    }

    /// The manifest file name searched for.
    pub fn manifest_name(&self) -> &str {
        &self.manifest_name
    }

    fn is_excluded(&self, entry: &DirEntry) -> bool {
        // The root itself is always searched, whatever its name.
        entry.depth() > 0
            && entry.file_type().is_dir()
            && self
                .excludes
                .iter()
                .any(|name| entry.file_name() == OsStr::new(name))
    }

    /// Every manifest under `root`, lazily, in traversal order.
    ///
    /// Depth-first; within a directory, files come before subdirectories and
    /// each group is sorted by name. Symlinks are not followed.
    pub fn candidates<'a>(&'a self, root: &Path) -> impl Iterator<Item = PathBuf> + 'a {
        WalkDir::new(root)
            .follow_links(false)
            .sort_by(|a, b| {
                a.file_type()
                    .is_dir()
                    .cmp(&b.file_type().is_dir())
                    .then_with(|| a.file_name().cmp(b.file_name()))
            })
            .into_iter()
            .filter_entry(move |entry| !self.is_excluded(entry))
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!("skipping unreadable entry: {}", e);
                    None
                }
            })
            .filter(move |entry| {
                entry.file_type().is_file()
                    && entry.file_name() == OsStr::new(&self.manifest_name)
            })
            .map(DirEntry::into_path)
    }

    /// Return the first manifest in traversal order.
    pub fn find_first(&self, root: &Path) -> Result<PathBuf, ManifestError> {
        self.candidates(root)
            .next()
            .ok_or_else(|| self.not_found(root))
    }

    /// Return every manifest under `root`.
    pub fn find_all(&self, root: &Path) -> Vec<PathBuf> {
        self.candidates(root).collect()
    }

    /// Return the only manifest under `root`, failing if there are several.
    pub fn find_unique(&self, root: &Path) -> Result<PathBuf, ManifestError> {
        let mut paths = self.find_all(root);
        match paths.len() {
            0 => Err(self.not_found(root)),
            1 => Ok(paths.remove(0)),
            count => Err(ManifestError::Ambiguous { count, paths }),
        }
    }

    /// Locate the manifest according to `policy`.
    ///
    /// Explicit paths are checked as given; callers resolve relative paths.
    pub fn locate(&self, root: &Path, policy: &DiscoveryPolicy) -> Result<PathBuf, ManifestError> {
        let found = match policy {
            DiscoveryPolicy::Explicit(path) => {
                if !path.is_file() {
                    return Err(ManifestError::ExplicitMissing { path: path.clone() });
                }
                path.clone()
            }
            DiscoveryPolicy::Search(SearchPolicy::FirstMatch) => self.find_first(root)?,
            DiscoveryPolicy::Search(SearchPolicy::Unique) => self.find_unique(root)?,
        };

        tracing::debug!("located manifest {}", found.display());
        Ok(found)
    }

    fn not_found(&self, root: &Path) -> ManifestError {
        ManifestError::NotFound {
            root: root.to_path_buf(),
            name: self.manifest_name.clone(),
        }
    }
}
