//! Test utilities for fedtypes unit tests.
//!
//! Provides a [`MockCompiler`] standing in for the external declaration
//! compiler, and fixtures that lay out federated packages on disk.
//!
//! # Example
//!
//! ```rust,ignore
//! use fedtypes::test_support::{FederationFixture, MockCompiler};
//!
//! #[test]
//! fn test_example() {
//!     let fixture = FederationFixture::new("checkout")
//!         .expose("Cart", "./Cart.tsx")
//!         .create();
//!     let compiler = MockCompiler::emitting("declare module \"Cart\" {}\n");
//!
//!     // Run the pipeline against fixture.root()...
//! }
//! ```

pub mod fixtures;

use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Result;

use crate::compiler::{
    CompileDiagnostic, CompileOutput, CompileRequest, DeclarationCompiler, DiagnosticSeverity,
};
use crate::util::fs::{ensure_dir, remove_file_if_exists};

// Re-export fixtures for convenience
pub use fixtures::*;

/// Mock declaration compiler.
///
/// Behaves like the real adapter towards the filesystem: the stale output
/// file is removed, and a preset bundle (if any) is written to
/// `request.out_file`. Every request is recorded.
#[derive(Debug, Default)]
pub struct MockCompiler {
    bundle: Option<String>,
    diagnostics: Vec<CompileDiagnostic>,
    requests: Mutex<Vec<CompileRequest>>,
}

impl MockCompiler {
    /// A compiler that emits `bundle`.
    pub fn emitting(bundle: impl Into<String>) -> Self {
        MockCompiler {
            bundle: Some(bundle.into()),
            ..Default::default()
        }
    }

    /// A compiler that declines to emit and reports `diagnostics`.
    pub fn skipping(diagnostics: Vec<CompileDiagnostic>) -> Self {
        MockCompiler {
            diagnostics,
            ..Default::default()
        }
    }

    /// Report `diagnostics` alongside the bundle.
    pub fn with_diagnostics(mut self, diagnostics: Vec<CompileDiagnostic>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// An error diagnostic at line 1 of `file`.
    pub fn error_diagnostic(file: &str, message: &str) -> CompileDiagnostic {
        CompileDiagnostic {
            file: Some(PathBuf::from(file)),
            line: Some(1),
            column: Some(1),
            code: 1005,
            severity: DiagnosticSeverity::Error,
            message: message.to_string(),
        }
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<CompileRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl DeclarationCompiler for MockCompiler {
    fn compile(&self, request: &CompileRequest) -> Result<CompileOutput> {
        self.requests.lock().unwrap().push(request.clone());
        remove_file_if_exists(&request.out_file)?;

        if let Some(ref bundle) = self.bundle {
            if let Some(parent) = request.out_file.parent() {
                ensure_dir(parent)?;
            }
            std::fs::write(&request.out_file, bundle)?;
        }

        Ok(CompileOutput {
            succeeded: self.bundle.is_some(),
            diagnostics: self.diagnostics.clone(),
            bundle_text: self.bundle.clone(),
        })
    }

    fn describe(&self) -> String {
        "mock".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_mock_compiler_writes_bundle() {
        let tmp = TempDir::new().unwrap();
        let request = CompileRequest {
            sources: vec![],
            working_dir: tmp.path().to_path_buf(),
            out_file: tmp.path().join("out/x.d.ts"),
            options: Default::default(),
        };

        let output = MockCompiler::emitting("declare module \"a\" {}")
            .compile(&request)
            .unwrap();
        assert!(output.succeeded);
        assert_eq!(
            std::fs::read_to_string(&request.out_file).unwrap(),
            "declare module \"a\" {}"
        );

        let skipped = MockCompiler::skipping(vec![]);
        let output = skipped.compile(&request).unwrap();
        assert!(output.bundle_text.is_none());
        assert!(!request.out_file.exists());
        assert_eq!(skipped.requests().len(), 1);
    }
}
