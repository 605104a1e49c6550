//! Internal-to-public module identifier mapping and substitution.

use anyhow::{Context, Result};
use regex::{Captures, Regex};

use crate::core::manifest::FederationManifest;

/// Extensions stripped before comparing module paths, longest first.
const SOURCE_EXTENSIONS: &[&str] = &[
    ".d.mts", ".d.cts", ".d.ts", ".tsx", ".mts", ".cts", ".ts", ".jsx", ".mjs", ".cjs", ".js",
];

/// Ordered mapping from internal module identifiers to public ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleIdentifierMap {
    entries: Vec<(String, String)>,
}

impl ModuleIdentifierMap {
    /// Map every identifier in `identifiers` to `<name>/<key>`.
    ///
    /// The key is the matching `exposes` key, or the identifier itself when
    /// no exposed file corresponds to it.
    pub fn build(manifest: &FederationManifest, identifiers: &[&str]) -> Self {
        let mut entries: Vec<(String, String)> = Vec::with_capacity(identifiers.len());

        for &identifier in identifiers {
            if entries.iter().any(|(internal, _)| internal == identifier) {
                continue;
            }

            let public = match expose_key_for(manifest, identifier) {
                Some(key) => public_identifier(manifest.name(), &normalize_expose_key(key)),
                None => {
                    tracing::debug!("`{}` is not exposed directly, keeping its path", identifier);
                    public_identifier(manifest.name(), identifier)
                }
            };
            entries.push((identifier.to_string(), public));
        }

        ModuleIdentifierMap { entries }
    }

    /// Public identifier for `internal`.
    pub fn get(&self, internal: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(from, _)| from == internal)
            .map(|(_, to)| to.as_str())
    }

    /// `(internal, public)` pairs in first-appearance order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(a, b)| (a.as_str(), b.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replace every quoted occurrence of a mapped identifier in `text`.
    ///
    /// Only whole string literals match: `"a/b"` is rewritten, `"a/bc"` is
    /// not. The original quote character is kept.
    pub fn apply(&self, text: &str) -> Result<String> {
        if self.entries.is_empty() {
            return Ok(text.to_string());
        }

        let mut identifiers: Vec<&str> = self.entries.iter().map(|(from, _)| from.as_str()).collect();
        identifiers.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        let alternation = identifiers
            .iter()
            .map(|id| regex::escape(id))
            .collect::<Vec<_>>()
            .join("|");

        let pattern = format!(r#""(?:{alternation})"|'(?:{alternation})'"#);
        let re = Regex::new(&pattern).context("failed to build module identifier pattern")?;

        let rewritten = re.replace_all(text, |caps: &Captures<'_>| {
            let literal = &caps[0];
            let quote = &literal[..1];
            let inner = &literal[1..literal.len() - 1];
            match self.get(inner) {
                Some(public) => format!("{quote}{public}{quote}"),
                None => literal.to_string(),
            }
        });

        Ok(rewritten.into_owned())
    }
}

/// Find the `exposes` key whose resolved source path ends with `identifier`.
///
/// Matching works on whole path segments after normalisation (separators,
/// a leading `./` and source extensions), so `bar` never matches `foobar`.
/// An exposed `dir/index.ts` also answers to `dir`. The first entry in
/// manifest order wins.
pub fn expose_key_for<'m>(manifest: &'m FederationManifest, identifier: &str) -> Option<&'m str> {
    let wanted = normalize_module_path(identifier);
    if wanted.is_empty() {
        return None;
    }

    manifest
        .exposes()
        .iter()
        .find(|exposure| {
            let resolved = manifest.resolve(exposure);
            let path = normalize_module_path(&resolved.to_string_lossy());
            if ends_with_segments(&path, &wanted) {
                return true;
            }
            match path.strip_suffix("/index") {
                Some(dir) => ends_with_segments(dir, &wanted),
                None => false,
            }
        })
        .map(|exposure| exposure.key.as_str())
}

/// `<name>/<key>`, always `/`-separated.
pub fn public_identifier(name: &str, key: &str) -> String {
    format!("{}/{}", name, key)
}

/// Expose keys are often written `./Button`; consumers import `name/Button`.
fn normalize_expose_key(key: &str) -> String {
    let key = key.replace('\\', "/");
    match key.strip_prefix("./") {
        Some(rest) if !rest.is_empty() => rest.to_string(),
        _ => key,
    }
}

fn normalize_module_path(path: &str) -> String {
    let mut path = path.replace('\\', "/");
    while let Some(rest) = path.strip_prefix("./") {
        path = rest.to_string();
    }
    for ext in SOURCE_EXTENSIONS {
        if let Some(stem) = path.strip_suffix(ext) {
            if !stem.is_empty() && !stem.ends_with('/') {
                path = stem.to_string();
                break;
            }
        }
    }
    path.trim_end_matches('/').to_string()
}

fn ends_with_segments(path: &str, suffix: &str) -> bool {
    path == suffix
        || (path.ends_with(suffix) && path[..path.len() - suffix.len()].ends_with('/'))
}
