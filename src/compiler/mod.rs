//! Declaration compiler abstraction.
//!
//! Turning exposed sources into `.d.ts` text is delegated to an external
//! compiler. This module defines what is asked of it ([`CompileRequest`]),
//! what comes back ([`CompileOutput`]), and the [`DeclarationCompiler`]
//! seam the pipeline drives. [`TscCompiler`] is the process-backed
//! implementation.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Serialize;

use crate::core::discovery::ManifestError;
use crate::core::manifest::FederationManifest;
use crate::util::diagnostic::Diagnostic;

mod tsc;

pub use tsc::{parse_diagnostics, TscCompiler};

/// Fixed compiler options.
///
/// These are not configurable: every federated package must produce
/// declarations the same way for the shared index to be consistent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Emit `.d.ts` only, no JavaScript
    pub emit_declaration_only: bool,
    /// Skip type checking of library and `.d.ts` inputs
    pub skip_lib_check: bool,
    /// JSX emit mode
    pub jsx: &'static str,
    /// Allow default imports of CommonJS modules
    pub es_module_interop: bool,
    /// Module format; combining inputs into one file requires `amd` or `system`
    pub module: &'static str,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            emit_declaration_only: true,
            skip_lib_check: true,
            jsx: "react",
            es_module_interop: true,
            module: "amd",
        }
    }
}

/// Everything the compiler needs for one run.
#[derive(Debug, Clone)]
pub struct CompileRequest {
    /// Exposed source files, resolved against the manifest directory
    pub sources: Vec<PathBuf>,
    /// Directory the compiler runs in
    pub working_dir: PathBuf,
    /// Single combined declaration file to emit
    pub out_file: PathBuf,
    /// Fixed options
    pub options: CompileOptions,
}

impl CompileRequest {
    /// Build a request for every file `manifest` exposes.
    ///
    /// Fails if an exposed file does not exist.
    pub fn from_manifest(
        manifest: &FederationManifest,
        out_file: impl Into<PathBuf>,
    ) -> Result<Self, ManifestError> {
        let mut sources = Vec::with_capacity(manifest.exposes().len());
        for exposure in manifest.exposes() {
            let path = manifest.resolve(exposure);
            if !path.is_file() {
                return Err(ManifestError::MissingSource {
                    key: exposure.key.clone(),
                    path,
                });
            }
            if !sources.contains(&path) {
                sources.push(path);
            }
        }

        Ok(CompileRequest {
            sources,
            working_dir: manifest.root().to_path_buf(),
            out_file: out_file.into(),
            options: CompileOptions::default(),
        })
    }
}

/// Diagnostic category reported by the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Error,
    Warning,
    Message,
}

impl fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticSeverity::Error => write!(f, "error"),
            DiagnosticSeverity::Warning => write!(f, "warning"),
            DiagnosticSeverity::Message => write!(f, "message"),
        }
    }
}

/// A single message from the compiler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompileDiagnostic {
    /// File the message refers to, if any
    pub file: Option<PathBuf>,
    pub line: Option<u32>,
    pub column: Option<u32>,
    /// Compiler message code (`TS2322` is `2322`)
    pub code: u32,
    pub severity: DiagnosticSeverity,
    pub message: String,
}

impl CompileDiagnostic {
    /// Whether this diagnostic has error severity.
    pub fn is_error(&self) -> bool {
        self.severity == DiagnosticSeverity::Error
    }

    /// `file:line:column`, as far as known.
    pub fn location(&self) -> Option<String> {
        let file = self.file.as_ref()?;
        Some(match (self.line, self.column) {
            (Some(line), Some(column)) => format!("{}:{}:{}", file.display(), line, column),
            (Some(line), None) => format!("{}:{}", file.display(), line),
            _ => file.display().to_string(),
        })
    }

    /// Render as a terminal diagnostic.
    ///
    /// Compiler errors are reported as warnings: they do not stop the
    /// pipeline unless strict mode is on.
    pub fn to_diagnostic(&self, strict: bool) -> Diagnostic {
        let message = if self.code > 0 {
            format!("{} [TS{}]", self.message, self.code)
        } else {
            self.message.clone()
        };

        let mut diag = match self.severity {
            DiagnosticSeverity::Error if strict => Diagnostic::error(message),
            DiagnosticSeverity::Error | DiagnosticSeverity::Warning => Diagnostic::warning(message),
            DiagnosticSeverity::Message => Diagnostic::note(message),
        };
        if let Some(location) = self.location() {
            diag = diag.with_location(location);
        }
        diag
    }
}

/// Result of one compiler run.
#[derive(Debug, Clone, Default)]
pub struct CompileOutput {
    /// Whether a declaration bundle was emitted
    pub succeeded: bool,
    /// Messages in the order the compiler reported them
    pub diagnostics: Vec<CompileDiagnostic>,
    /// Emitted bundle text; `None` when emission was skipped
    pub bundle_text: Option<String>,
}

impl CompileOutput {
    /// Number of error-severity diagnostics.
    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }
}

/// External compiler producing one combined declaration bundle.
pub trait DeclarationCompiler {
    /// Compile `request`.
    ///
    /// Any file already at `request.out_file` must be removed first, so an
    /// emitted bundle is always this run's output. Declining to emit is
    /// reported through [`CompileOutput::bundle_text`], not as an error.
    fn compile(&self, request: &CompileRequest) -> Result<CompileOutput>;

    /// Human-readable name for status output.
    fn describe(&self) -> String;
}

/// Resolve a compiler-reported path against the directory it ran in.
fn resolve_reported_path(working_dir: &Path, reported: &str) -> PathBuf {
    let path = Path::new(reported);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        working_dir.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_request_resolves_against_manifest_dir() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("src")).unwrap();
        fs::write(tmp.path().join("src/Cart.tsx"), "export const Cart = 1;").unwrap();
        let manifest_path = tmp.path().join("federation.config.json");
        let manifest = FederationManifest::parse(
            r#"{"name": "checkout", "exposes": {"Cart": "./src/Cart.tsx", "Again": "src/Cart.tsx"}}"#,
            &manifest_path,
        )
        .unwrap();

        let request = CompileRequest::from_manifest(&manifest, tmp.path().join("out/checkout.d.ts"))
            .unwrap();
        assert_eq!(request.sources, vec![tmp.path().join("src/Cart.tsx")]);
        assert_eq!(request.working_dir, tmp.path());
        assert_eq!(request.options, CompileOptions::default());
    }

    #[test]
    fn test_request_rejects_missing_source() {
        let tmp = TempDir::new().unwrap();
        let manifest = FederationManifest::parse(
            r#"{"name": "checkout", "exposes": {"Cart": "./Cart.tsx"}}"#,
            &tmp.path().join("federation.config.json"),
        )
        .unwrap();

        let err = CompileRequest::from_manifest(&manifest, tmp.path().join("out.d.ts")).unwrap_err();
        assert!(matches!(err, ManifestError::MissingSource { ref key, .. } if key == "Cart"));
    }

    #[test]
    fn test_diagnostic_rendering() {
        let diag = CompileDiagnostic {
            file: Some(PathBuf::from("src/Cart.tsx")),
            line: Some(3),
            column: Some(7),
            code: 2322,
            severity: DiagnosticSeverity::Error,
            message: "Type 'string' is not assignable to type 'number'.".to_string(),
        };

        assert_eq!(diag.location().as_deref(), Some("src/Cart.tsx:3:7"));
        let lenient = diag.to_diagnostic(false).format(false);
        assert!(lenient.starts_with("warning: Type 'string'"));
        assert!(lenient.contains("[TS2322]"));
        let strict = diag.to_diagnostic(true).format(false);
        assert!(strict.starts_with("error: "));
    }
}
