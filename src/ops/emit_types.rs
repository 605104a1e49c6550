//! Implementation of `fedtypes build`.
//!
//! locate manifest -> compile exposed files -> rewrite module identifiers
//! -> merge into the shared types directory.

use std::path::{Path, PathBuf};

use anyhow::Result;
use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::compiler::{CompileDiagnostic, CompileOutput, CompileRequest, DeclarationCompiler};
use crate::core::discovery::{Discovery, DiscoveryPolicy};
use crate::core::manifest::FederationManifest;
use crate::declarations::{self, ModuleIdentifierMap};
use crate::ops::merge::{self, MergeReport};
use crate::util::config::Config;
use crate::util::diagnostic::{suggestions, Diagnostic};
use crate::util::fs::{absolutize, remove_file_if_exists};

/// Fatal pipeline errors that are not manifest or filesystem problems.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum EmitError {
    #[error("declaration compiler reported {count} error(s) and strict mode is on")]
    #[diagnostic(
        code(fedtypes::compile::strict),
        help("fix the reported type errors or drop `--strict`")
    )]
    DiagnosticsFatal {
        count: usize,
        diagnostics: Vec<CompileDiagnostic>,
    },
}

impl EmitError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            EmitError::DiagnosticsFatal { diagnostics, .. } => {
                let mut diag = Diagnostic::error(self.to_string());
                for d in diagnostics.iter().filter(|d| d.is_error()) {
                    let location = d.location().unwrap_or_else(|| "<global>".to_string());
                    diag = diag.with_context(format!("{}: TS{}: {}", location, d.code, d.message));
                }
                diag.with_suggestion(suggestions::STRICT_DIAGNOSTICS)
            }
        }
    }
}

/// Options for the build pipeline.
#[derive(Debug, Clone)]
pub struct EmitOptions {
    /// Directory searched for the manifest
    pub root: PathBuf,
    /// Manifest finder
    pub discovery: Discovery,
    /// Which manifest to use
    pub policy: DiscoveryPolicy,
    /// Shared type-declarations directory (absolute)
    pub out_dir: PathBuf,
    /// Treat compiler errors as fatal
    pub strict: bool,
}

impl EmitOptions {
    /// Options for `root` with every setting at its default.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::from_config(root, &Config::default())
    }

    /// Options for `root` as configured; relative paths resolve against `root`.
    pub fn from_config(root: impl Into<PathBuf>, config: &Config) -> Self {
        let root = root.into();
        let out_dir = absolutize(&root, &config.output_dir());
        let policy = match config.search_policy() {
            Ok(search) => DiscoveryPolicy::Search(search),
            Err(e) => {
                tracing::warn!("{:#}, using the default", e);
                DiscoveryPolicy::default()
            }
        };

        EmitOptions {
            discovery: Discovery::new(config.manifest_name()).with_excludes(config.excludes()),
            policy,
            out_dir,
            strict: config.strict(),
            root,
        }
    }

    /// Use the manifest at `path` (relative to the root).
    pub fn with_manifest(mut self, path: &Path) -> Self {
        self.policy = DiscoveryPolicy::Explicit(absolutize(&self.root, path));
        self
    }

    /// Write into `dir` (relative to the root).
    pub fn with_out_dir(mut self, dir: &Path) -> Self {
        self.out_dir = absolutize(&self.root, dir);
        self
    }

    /// Per-package declaration file for federation `name`.
    pub fn declaration_file(&self, name: &str) -> PathBuf {
        self.out_dir.join(format!("{}.d.ts", name))
    }
}

/// What a pipeline run produced.
#[derive(Debug, Clone)]
pub enum EmitOutcome {
    /// Declarations were rewritten and merged.
    Emitted {
        merge: MergeReport,
        /// `(internal, public)` module identifiers
        modules: Vec<(String, String)>,
    },
    /// The compiler produced no output; nothing was written.
    Skipped,
}

/// Summary of a pipeline run.
#[derive(Debug, Clone)]
pub struct EmitReport {
    pub manifest_path: PathBuf,
    pub name: String,
    pub diagnostics: Vec<CompileDiagnostic>,
    pub outcome: EmitOutcome,
}

/// Run the whole pipeline.
pub fn emit_types(opts: &EmitOptions, compiler: &dyn DeclarationCompiler) -> Result<EmitReport> {
    let manifest = load_manifest(opts)?;
    let output = compile_manifest(&manifest, opts, compiler)?;

    let outcome = match output.bundle_text {
        Some(ref bundle) => {
            let (map, merge) = publish(&manifest, bundle, opts)?;
            EmitOutcome::Emitted {
                merge,
                modules: map
                    .iter()
                    .map(|(a, b)| (a.to_string(), b.to_string()))
                    .collect(),
            }
        }
        None => EmitOutcome::Skipped,
    };

    Ok(EmitReport {
        manifest_path: manifest.manifest_path().to_path_buf(),
        name: manifest.name().to_string(),
        diagnostics: output.diagnostics,
        outcome,
    })
}

/// Locate and parse the manifest.
pub fn load_manifest(opts: &EmitOptions) -> Result<FederationManifest> {
    let path = opts.discovery.locate(&opts.root, &opts.policy)?;
    let manifest = FederationManifest::load(&path)?;
    tracing::info!(
        "using {} (`{}`, {} exposed)",
        path.display(),
        manifest.name(),
        manifest.exposes().len()
    );
    Ok(manifest)
}

/// Compile the exposed files of `manifest` into `<out_dir>/<name>.d.ts`.
///
/// In strict mode, error diagnostics fail the run and the raw bundle is
/// removed again.
pub fn compile_manifest(
    manifest: &FederationManifest,
    opts: &EmitOptions,
    compiler: &dyn DeclarationCompiler,
) -> Result<CompileOutput> {
    let request = CompileRequest::from_manifest(manifest, opts.declaration_file(manifest.name()))?;
    let output = compiler.compile(&request)?;

    for diagnostic in &output.diagnostics {
        tracing::debug!(
            "{}: {} TS{}: {}",
            diagnostic.location().unwrap_or_default(),
            diagnostic.severity,
            diagnostic.code,
            diagnostic.message
        );
    }

    let errors = output.error_count();
    if opts.strict && errors > 0 {
        remove_file_if_exists(&request.out_file)?;
        return Err(EmitError::DiagnosticsFatal {
            count: errors,
            diagnostics: output.diagnostics,
        }
        .into());
    }

    if output.bundle_text.is_none() {
        tracing::info!("compiler skipped emission for `{}`", manifest.name());
    }

    Ok(output)
}

/// Rewrite `bundle` and merge it into the shared directory.
pub fn publish(
    manifest: &FederationManifest,
    bundle: &str,
    opts: &EmitOptions,
) -> Result<(ModuleIdentifierMap, MergeReport)> {
    let rewritten = declarations::rewrite(bundle, manifest)?;
    let report = merge::merge(&opts.out_dir, manifest.name(), &rewritten.text)?;
    Ok((rewritten.map, report))
}
