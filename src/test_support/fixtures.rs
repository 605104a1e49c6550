//! Test fixtures for federated packages.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::core::manifest::MANIFEST_NAME;

/// A federated package to lay out on disk.
#[derive(Debug, Clone)]
pub struct FederationFixture {
    /// Federation name
    pub name: String,
    /// `(key, path)` in manifest order
    pub exposes: Vec<(String, String)>,
    /// Directory of the manifest, relative to the fixture root
    pub package_dir: PathBuf,
}

impl FederationFixture {
    /// An empty package named `name` at the fixture root.
    pub fn new(name: impl Into<String>) -> Self {
        FederationFixture {
            name: name.into(),
            exposes: Vec::new(),
            package_dir: PathBuf::new(),
        }
    }

    /// Expose `path` as `key`; a small source file is created for it.
    pub fn expose(mut self, key: impl Into<String>, path: impl Into<String>) -> Self {
        self.exposes.push((key.into(), path.into()));
        self
    }

    /// Place the manifest in `dir` below the root.
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.package_dir = dir.into();
        self
    }

    /// The manifest as JSON.
    pub fn manifest_json(&self) -> String {
        let mut exposes = serde_json::Map::new();
        for (key, path) in &self.exposes {
            exposes.insert(key.clone(), serde_json::Value::String(path.clone()));
        }
        let manifest = serde_json::json!({
            "name": self.name,
            "exposes": exposes,
        });
        serde_json::to_string_pretty(&manifest).unwrap()
    }

    /// Write the package into `root`, returning the manifest path.
    pub fn write_to(&self, root: &Path) -> std::io::Result<PathBuf> {
        let dir = root.join(&self.package_dir);
        std::fs::create_dir_all(&dir)?;

        let manifest_path = dir.join(MANIFEST_NAME);
        std::fs::write(&manifest_path, self.manifest_json())?;

        for (key, path) in &self.exposes {
            let source = dir.join(path);
            if let Some(parent) = source.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&source, format!("export const {} = 1;\n", key.replace(['.', '/'], "_")))?;
        }

        Ok(manifest_path)
    }

    /// Write the package into a fresh temporary directory.
    pub fn create(self) -> CreatedFixture {
        let dir = TempDir::new().unwrap();
        let manifest_path = self.write_to(dir.path()).unwrap();
        CreatedFixture { dir, manifest_path }
    }
}

/// A fixture written to disk; removed when dropped.
#[derive(Debug)]
pub struct CreatedFixture {
    dir: TempDir,
    manifest_path: PathBuf,
}

impl CreatedFixture {
    /// Fixture root directory.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Path of the written manifest.
    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }
}
