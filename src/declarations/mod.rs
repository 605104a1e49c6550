//! Declaration bundle rewriting.
//!
//! The compiler names each ambient module after its source path
//! (`declare module "src/components/Button"`). Consumers import modules as
//! `<federationName>/<exposeKey>`, so every such identifier is rewritten:
//!
//! 1. [`scanner`] finds the module headers and their identifiers.
//! 2. [`rewriter`] maps each identifier to its public name and replaces
//!    every whole quoted occurrence in the bundle.

pub mod rewriter;
pub mod scanner;

use anyhow::Result;

use crate::core::manifest::FederationManifest;

pub use rewriter::{expose_key_for, public_identifier, ModuleIdentifierMap};
pub use scanner::{distinct_identifiers, scan_module_headers, ModuleHeader};

/// A rewritten declaration bundle.
#[derive(Debug, Clone)]
pub struct RewrittenBundle {
    /// Bundle text with public module identifiers
    pub text: String,
    /// The mapping that was applied
    pub map: ModuleIdentifierMap,
}

/// Rewrite the internal module identifiers in `bundle` for `manifest`.
pub fn rewrite(bundle: &str, manifest: &FederationManifest) -> Result<RewrittenBundle> {
    let headers = scan_module_headers(bundle);
    let identifiers = distinct_identifiers(&headers);
    let map = ModuleIdentifierMap::build(manifest, &identifiers);

    for (internal, public) in map.iter() {
        tracing::debug!("module \"{}\" -> \"{}\"", internal, public);
    }

    let text = map.apply(bundle)?;
    Ok(RewrittenBundle { text, map })
}
