//! High-level operations.
//!
//! This module contains the implementation of fedtypes commands.

pub mod emit_types;
pub mod locate;
pub mod merge;

pub use emit_types::{emit_types, EmitError, EmitOptions, EmitOutcome, EmitReport};
pub use locate::{locate_manifests, LocateMode};
pub use merge::{merge, IndexUpdate, MergeReport, StubUpdate};
