//! Merging a package's declarations into the shared types directory.
//!
//! Layout of the shared directory:
//!
//! ```text
//! <outputDir>/
//!   <name>.d.ts     one per federated package, replaced on every run
//!   index.d.ts      `export * from './<name>';` per package, append-only
//!   package.json    created once, only below node_modules/@types
//! ```
//!
//! Every step is safe to repeat. The index is updated last, after the
//! package file is in place.

use std::ffi::OsStr;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use fs2::FileExt;
use serde::Serialize;

use crate::util::fs::{ensure_dir, write_atomic, write_new};

/// Shared index file name.
pub const INDEX_FILE: &str = "index.d.ts";

/// Package descriptor created in a types root.
pub const STUB_FILE: &str = "package.json";

/// Contents of a freshly created package descriptor.
pub const STUB_TEMPLATE: &str = include_str!("../../templates/typings.package.json");

/// What happened to the shared index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IndexUpdate {
    /// The index did not exist and was created with this package's line.
    Created,
    /// The line was added to an existing index.
    Appended,
    /// The line was already present.
    Unchanged,
}

/// What happened to the package descriptor stub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StubUpdate {
    Created,
    AlreadyPresent,
    /// The output directory is not a types root.
    NotApplicable,
}

/// Result of merging one package.
#[derive(Debug, Clone, Serialize)]
pub struct MergeReport {
    /// `<outputDir>/<name>.d.ts`
    pub declaration_file: PathBuf,
    /// `<outputDir>/index.d.ts`
    pub index_file: PathBuf,
    pub index: IndexUpdate,
    /// `<outputDir>/package.json`
    pub stub_file: PathBuf,
    pub stub: StubUpdate,
}

/// The forwarding line `index.d.ts` holds for package `name`.
pub fn forward_statement(name: &str) -> String {
    format!("export * from './{}';", name)
}

/// Whether `dir` lies in a `node_modules/@types` tree.
pub fn is_types_root(dir: &Path) -> bool {
    let components: Vec<&OsStr> = dir.components().map(|c| c.as_os_str()).collect();
    components
        .windows(2)
        .any(|pair| pair[0] == "node_modules" && pair[1] == "@types")
}

/// Persist `text` for package `name` and register it in the shared index.
pub fn merge(out_dir: &Path, name: &str, text: &str) -> Result<MergeReport> {
    if format!("{}.d.ts", name).eq_ignore_ascii_case(INDEX_FILE) {
        bail!(
            "package `{}` would overwrite the shared {} in {}",
            name,
            INDEX_FILE,
            out_dir.display()
        );
    }

    let declaration_file = write_declarations(out_dir, name, text)?;

    let stub_file = out_dir.join(STUB_FILE);
    let stub = if is_types_root(out_dir) {
        ensure_package_stub(out_dir)?
    } else {
        tracing::debug!("{} is not a types root, no package.json needed", out_dir.display());
        StubUpdate::NotApplicable
    };

    let index = register_in_index(out_dir, name)?;

    Ok(MergeReport {
        declaration_file,
        index_file: out_dir.join(INDEX_FILE),
        index,
        stub_file,
        stub,
    })
}

/// Write `<out_dir>/<name>.d.ts`, replacing this package's previous version.
pub fn write_declarations(out_dir: &Path, name: &str, text: &str) -> Result<PathBuf> {
    let path = out_dir.join(format!("{}.d.ts", name));
    write_atomic(&path, text)?;
    tracing::info!("wrote {}", path.display());
    Ok(path)
}

/// Create `<out_dir>/package.json` from the template unless it exists.
pub fn ensure_package_stub(out_dir: &Path) -> Result<StubUpdate> {
    ensure_dir(out_dir)?;
    let path = out_dir.join(STUB_FILE);

    if write_new(&path, STUB_TEMPLATE.as_bytes())? {
        tracing::info!("wrote {}", path.display());
        Ok(StubUpdate::Created)
    } else {
        tracing::debug!("{} already exists", path.display());
        Ok(StubUpdate::AlreadyPresent)
    }
}

/// Make sure `<out_dir>/index.d.ts` forwards to package `name`.
///
/// Other packages' lines are never touched. The read-check-append runs
/// under an exclusive lock on the index file.
pub fn register_in_index(out_dir: &Path, name: &str) -> Result<IndexUpdate> {
    ensure_dir(out_dir)?;
    let path = out_dir.join(INDEX_FILE);
    let statement = forward_statement(name);
    let existed = path.exists();

    let mut index = LockedIndex::open(&path)?;
    let contents = index.read()?;

    if contents.contains(&statement) {
        tracing::debug!("{} already forwards to `{}`", path.display(), name);
        return Ok(IndexUpdate::Unchanged);
    }

    let separator = if contents.is_empty() || contents.ends_with('\n') {
        ""
    } else {
        "\n"
    };
    index.append(&format!("{}{}\n", separator, statement))?;

    if existed {
        tracing::info!("updated {}", path.display());
        Ok(IndexUpdate::Appended)
    } else {
        tracing::info!("created {}", path.display());
        Ok(IndexUpdate::Created)
    }
}

/// The index file opened for append, exclusively locked until dropped.
struct LockedIndex {
    file: File,
    path: PathBuf,
}

impl LockedIndex {
    fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(path)
            .with_context(|| format!("failed to open {}", path.display()))?;

        file.lock_exclusive()
            .with_context(|| format!("failed to lock {}", path.display()))?;

        Ok(LockedIndex {
            file,
            path: path.to_path_buf(),
        })
    }

    fn read(&mut self) -> Result<String> {
        let mut contents = String::new();
        self.file
            .read_to_string(&mut contents)
            .with_context(|| format!("failed to read file: {}", self.path.display()))?;
        Ok(contents)
    }

    fn append(&mut self, text: &str) -> Result<()> {
        self.file
            .write_all(text.as_bytes())
            .and_then(|()| self.file.sync_all())
            .with_context(|| format!("failed to write file: {}", self.path.display()))
    }
}

impl Drop for LockedIndex {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}
