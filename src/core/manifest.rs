//! Federation manifest (`federation.config.json`) parsing.
//!
//! ```json
//! {
//!   "name": "checkout",
//!   "exposes": {
//!     "Cart": "./src/Cart.tsx",
//!     "Summary": "./src/Summary.tsx"
//!   }
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::core::discovery::ManifestError;

/// Default manifest file name.
pub const MANIFEST_NAME: &str = "federation.config.json";

/// Characters that may not appear in a federation name.
const FORBIDDEN_NAME_CHARS: &[char] = &['/', '\\', '<', '>', ':', '"', '\'', '`', '|', '?', '*'];

/// Names whose `<name>.d.ts` would collide with a shared file.
const RESERVED_NAMES: &[&str] = &["index"];

/// A single exposed entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exposure {
    /// Public key consumers import (`<name>/<key>`)
    pub key: String,
    /// Source path, relative to the manifest directory
    pub path: String,
}

/// A parsed federation manifest.
#[derive(Debug, Clone)]
pub struct FederationManifest {
    name: String,
    exposes: Vec<Exposure>,
    manifest_path: PathBuf,
}

/// Raw manifest as deserialized from JSON.
///
/// `serde_json` is built with `preserve_order`, so `exposes` iterates in
/// document order.
#[derive(Debug, Deserialize)]
struct RawManifest {
    name: String,
    #[serde(default)]
    exposes: serde_json::Map<String, serde_json::Value>,
}

impl FederationManifest {
    /// Load a manifest from a file path.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path).map_err(|e| ManifestError::Invalid {
            path: path.to_path_buf(),
            reason: format!("failed to read manifest: {}", e),
        })?;

        Self::parse(&content, path)
    }

    /// Parse manifest content.
    pub fn parse(content: &str, path: &Path) -> Result<Self, ManifestError> {
        let invalid = |reason: String| ManifestError::Invalid {
            path: path.to_path_buf(),
            reason,
        };

        let raw: RawManifest =
            serde_json::from_str(content).map_err(|e| invalid(format!("invalid JSON: {}", e)))?;

        validate_name(&raw.name).map_err(invalid)?;

        let mut exposes = Vec::with_capacity(raw.exposes.len());
        for (key, value) in raw.exposes {
            if key.is_empty() {
                return Err(invalid("expose keys must not be empty".to_string()));
            }
            let source = match value {
                serde_json::Value::String(s) if !s.is_empty() => s,
                serde_json::Value::String(_) => {
                    return Err(invalid(format!("expose `{}` has an empty path", key)))
                }
                other => {
                    return Err(invalid(format!(
                        "expose `{}` must be a string path, found {}",
                        key, other
                    )))
                }
            };
            exposes.push(Exposure { key, path: source });
        }

        Ok(FederationManifest {
            name: raw.name,
            exposes,
            manifest_path: path.to_path_buf(),
        })
    }

    /// Federation name, used as the public module namespace.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Exposed entries in manifest order.
    pub fn exposes(&self) -> &[Exposure] {
        &self.exposes
    }

    /// Path of the manifest file this was loaded from.
    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    /// Directory exposed paths are relative to.
    pub fn root(&self) -> &Path {
        match self.manifest_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    /// Resolve an exposed path against the manifest directory.
    pub fn resolve(&self, exposure: &Exposure) -> PathBuf {
        let relative = exposure.path.strip_prefix("./").unwrap_or(&exposure.path);
        self.root().join(relative)
    }
}

/// Check that a federation name is usable both as a file name and as the
/// first segment of a module identifier.
fn validate_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("`name` must not be empty".to_string());
    }
    if name == "." || name == ".." {
        return Err(format!("`name` may not be `{}`", name));
    }
    if RESERVED_NAMES.iter().any(|r| r.eq_ignore_ascii_case(name)) {
        return Err(format!("`name` may not be `{}`, it is reserved for the shared index", name));
    }
    if let Some(c) = name
        .chars()
        .find(|c| c.is_control() || FORBIDDEN_NAME_CHARS.contains(c))
    {
        return Err(format!("`name` contains forbidden character {:?}: {}", c, name));
    }
    if name.trim() != name {
        return Err(format!("`name` has leading or trailing whitespace: {:?}", name));
    }
    Ok(())
}
