//! fedtypes - Type declaration bundler for federated TypeScript packages
//!
//! This crate compiles the modules a package exposes to a single `.d.ts`
//! bundle, renames its ambient modules to the names consumers import, and
//! merges the result into a types directory shared by every package.

pub mod compiler;
pub mod core;
pub mod declarations;
pub mod ops;
pub mod util;

/// Test utilities and mocks for fedtypes unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests.
#[cfg(test)]
pub mod test_support;

pub use crate::compiler::{DeclarationCompiler, TscCompiler};
pub use crate::core::{FederationManifest, ManifestError};
pub use crate::ops::{emit_types, EmitOptions, EmitReport};
pub use crate::util::context::GlobalContext;
