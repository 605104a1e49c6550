//! TypeScript compiler (`tsc`) backend.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;

use super::{
    resolve_reported_path, CompileDiagnostic, CompileOutput, CompileRequest, DeclarationCompiler,
    DiagnosticSeverity,
};
use crate::util::diagnostic::suggestions;
use crate::util::fs::{read_to_string, remove_file_if_exists};
use crate::util::process::{find_tsc, ProcessBuilder};

/// `file(line,col): error TS1234: message`
static LOCATED_DIAGNOSTIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<file>.+?)\((?P<line>\d+),(?P<col>\d+)\): (?P<sev>error|warning|message) TS(?P<code>\d+): (?P<msg>.*)$",
    )
    .expect("diagnostic pattern is valid")
});

/// `error TS1234: message`
static GLOBAL_DIAGNOSTIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<sev>error|warning|message) TS(?P<code>\d+): (?P<msg>.*)$")
        .expect("diagnostic pattern is valid")
});

/// Declaration compiler backed by a `tsc` executable.
#[derive(Debug, Clone)]
pub struct TscCompiler {
    program: PathBuf,
    leading_args: Vec<String>,
}

impl TscCompiler {
    /// Use `program` as the compiler.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        TscCompiler {
            program: program.into(),
            leading_args: Vec::new(),
        }
    }

    /// Arguments placed before the compiler flags (`npx --no-install tsc ...`).
    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.leading_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Find `tsc` for the project in `project_dir`.
    pub fn detect(project_dir: &Path) -> Result<Self> {
        match find_tsc(project_dir) {
            Some(program) => Ok(TscCompiler::new(program)),
            None => anyhow::bail!(
                "could not find the TypeScript compiler `tsc`\n{}",
                suggestions::NO_COMPILER
            ),
        }
    }

    /// Build the command line for `request`.
    pub fn command(&self, request: &CompileRequest) -> ProcessBuilder {
        let options = &request.options;
        let mut cmd = ProcessBuilder::new(&self.program)
            .args(&self.leading_args)
            .cwd(&request.working_dir);

        if options.emit_declaration_only {
            cmd = cmd.args(["--declaration", "--emitDeclarationOnly"]);
        }
        if options.skip_lib_check {
            cmd = cmd.arg("--skipLibCheck");
        }
        if options.es_module_interop {
            cmd = cmd.arg("--esModuleInterop");
        }

        cmd.args(["--jsx", options.jsx])
            .args(["--module", options.module])
            .args(["--pretty", "false"])
            .arg("--outFile")
            .arg(&request.out_file)
            .args(&request.sources)
    }
}

impl DeclarationCompiler for TscCompiler {
    fn compile(&self, request: &CompileRequest) -> Result<CompileOutput> {
        if remove_file_if_exists(&request.out_file)? {
            tracing::debug!("removed stale {}", request.out_file.display());
        }

        let cmd = self.command(request);
        let output = cmd.exec().context(suggestions::NO_COMPILER)?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        let mut diagnostics = parse_diagnostics(&stdout, &request.working_dir);
        diagnostics.extend(parse_diagnostics(&stderr, &request.working_dir));

        tracing::debug!(
            "`{}` exited with {:?}, {} diagnostic(s)",
            cmd.get_program().display(),
            output.status.code(),
            diagnostics.len()
        );

        // A crash without any parseable message still needs to be visible.
        if !output.status.success() && diagnostics.is_empty() {
            let raw = if stderr.trim().is_empty() { &stdout } else { &stderr };
            if !raw.trim().is_empty() {
                diagnostics.push(CompileDiagnostic {
                    file: None,
                    line: None,
                    column: None,
                    code: 0,
                    severity: DiagnosticSeverity::Error,
                    message: raw.trim().to_string(),
                });
            }
        }

        let bundle_text = if request.out_file.is_file() {
            Some(read_to_string(&request.out_file)?)
        } else {
            None
        };

        Ok(CompileOutput {
            succeeded: bundle_text.is_some(),
            diagnostics,
            bundle_text,
        })
    }

    fn describe(&self) -> String {
        if self.leading_args.is_empty() {
            self.program.display().to_string()
        } else {
            format!("{} {}", self.program.display(), self.leading_args.join(" "))
        }
    }
}

/// Parse `tsc --pretty false` output into diagnostics.
///
/// Indented lines continue the previous message; anything else is ignored.
pub fn parse_diagnostics(text: &str, working_dir: &Path) -> Vec<CompileDiagnostic> {
    let mut diagnostics: Vec<CompileDiagnostic> = Vec::new();

    for line in text.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }

        if let Some(caps) = LOCATED_DIAGNOSTIC.captures(line) {
            diagnostics.push(CompileDiagnostic {
                file: Some(resolve_reported_path(working_dir, &caps["file"])),
                line: caps["line"].parse().ok(),
                column: caps["col"].parse().ok(),
                code: caps["code"].parse().unwrap_or_default(),
                severity: parse_severity(&caps["sev"]),
                message: caps["msg"].to_string(),
            });
        } else if let Some(caps) = GLOBAL_DIAGNOSTIC.captures(line) {
            diagnostics.push(CompileDiagnostic {
                file: None,
                line: None,
                column: None,
                code: caps["code"].parse().unwrap_or_default(),
                severity: parse_severity(&caps["sev"]),
                message: caps["msg"].to_string(),
            });
        } else if line.starts_with(char::is_whitespace) {
            if let Some(last) = diagnostics.last_mut() {
                last.message.push('\n');
                last.message.push_str(line.trim_start());
            }
        }
    }

    diagnostics
}

fn parse_severity(s: &str) -> DiagnosticSeverity {
    match s {
        "error" => DiagnosticSeverity::Error,
        "warning" => DiagnosticSeverity::Warning,
        _ => DiagnosticSeverity::Message,
    }
}
