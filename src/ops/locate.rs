//! Implementation of `fedtypes locate`.

use std::path::PathBuf;

use anyhow::Result;

use crate::core::discovery::DiscoveryPolicy;
use crate::ops::emit_types::EmitOptions;

/// Which manifests to report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LocateMode {
    /// The manifest a build would use
    #[default]
    Selected,
    /// Every candidate in traversal order
    All,
}

/// Manifest paths under the configured root.
///
/// `All` ignores the search policy but still honours an explicit path.
pub fn locate_manifests(opts: &EmitOptions, mode: LocateMode) -> Result<Vec<PathBuf>> {
    match (mode, &opts.policy) {
        (LocateMode::All, DiscoveryPolicy::Search(_)) => {
            Ok(opts.discovery.find_all(&opts.root))
        }
        _ => Ok(vec![opts.discovery.locate(&opts.root, &opts.policy)?]),
    }
}
