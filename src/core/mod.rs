//! Core data structures for fedtypes.
//!
//! - The federation manifest and its `exposes` table
//! - Manifest discovery in a package tree

pub mod discovery;
pub mod manifest;

pub use discovery::{Discovery, DiscoveryPolicy, ManifestError, SearchPolicy};
pub use manifest::{Exposure, FederationManifest, MANIFEST_NAME};
