//! `fedtypes build` command

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Result;

use crate::cli::BuildArgs;
use crate::GlobalOptions;
use fedtypes::compiler::{CompileDiagnostic, DeclarationCompiler, TscCompiler};
use fedtypes::ops::emit_types::{compile_manifest, load_manifest, publish};
use fedtypes::ops::{IndexUpdate, StubUpdate};
use fedtypes::util::fs::{absolutize, display_path};
use fedtypes::util::shell::{format_duration, Shell, Status};
use fedtypes::util::{Config, GlobalContext};

pub fn execute(args: BuildArgs, global_opts: &GlobalOptions) -> Result<()> {
    let shell = &global_opts.shell;
    let start = Instant::now();

    let ctx = GlobalContext::new()?;
    let cwd = ctx.cwd();

    // Load configuration (global + project)
    let config = ctx.load_config();

    // CLI overrides config
    let mut opts = super::emit_options(&ctx, &config, &args.discovery);
    if let Some(ref dir) = args.output_dir {
        opts = opts.with_out_dir(dir);
    }
    opts.strict = opts.strict || args.strict;

    let compiler = select_compiler(&args, &config, cwd)?;

    let manifest = load_manifest(&opts)?;
    shell.status(
        Status::Using,
        format!(
            "{} ({})",
            display_path(cwd, manifest.manifest_path()),
            manifest.name()
        ),
    );
    shell.json_event(&serde_json::json!({
        "reason": "manifest",
        "path": manifest.manifest_path(),
        "name": manifest.name(),
        "exposes": manifest.exposes().len(),
    }));

    let spinner = shell.spinner(
        Status::Compiling,
        format!(
            "{} exposed module(s) with `{}`",
            manifest.exposes().len(),
            compiler.describe()
        ),
    );
    let compiled = compile_manifest(&manifest, &opts, &compiler);
    spinner.finish();
    let output = compiled?;

    report_diagnostics(shell, &output.diagnostics, cwd);

    let Some(bundle) = output.bundle_text else {
        shell.status(
            Status::Skipped,
            format!("the compiler emitted no declarations for `{}`", manifest.name()),
        );
        shell.json_event(&serde_json::json!({
            "reason": "skipped",
            "name": manifest.name(),
            "diagnostics": output.diagnostics.len(),
        }));
        return Ok(());
    };

    shell.status(
        Status::Rewriting,
        format!("module identifiers under `{}/`", manifest.name()),
    );
    let (map, report) = publish(&manifest, &bundle, &opts)?;

    if shell.is_verbose() {
        for (internal, public) in map.iter() {
            shell.status(Status::Rewriting, format!("\"{}\" -> \"{}\"", internal, public));
        }
    }

    shell.status(Status::Updated, display_path(cwd, &report.declaration_file));
    match report.stub {
        StubUpdate::Created => shell.status(Status::Created, display_path(cwd, &report.stub_file)),
        StubUpdate::AlreadyPresent | StubUpdate::NotApplicable => {}
    }
    let index_status = match report.index {
        IndexUpdate::Created => Status::Created,
        IndexUpdate::Appended => Status::Updated,
        IndexUpdate::Unchanged => Status::Fresh,
    };
    shell.status(index_status, display_path(cwd, &report.index_file));

    shell.json_event(&serde_json::json!({
        "reason": "emitted",
        "name": manifest.name(),
        "merge": report,
        "modules": map
            .iter()
            .map(|(internal, public)| serde_json::json!({ "internal": internal, "public": public }))
            .collect::<Vec<_>>(),
        "diagnostics": output.diagnostics.len(),
    }));

    shell.status(
        Status::Finished,
        format!(
            "`{}` types in {}",
            manifest.name(),
            format_duration(start.elapsed())
        ),
    );

    Ok(())
}

/// `--tsc` > configured program > `tsc` found for the project.
fn select_compiler(args: &BuildArgs, config: &Config, cwd: &Path) -> Result<TscCompiler> {
    if let Some(ref program) = args.tsc {
        return Ok(TscCompiler::new(resolve_program(cwd, program)));
    }

    if let Some(ref program) = config.compiler.program {
        return Ok(
            TscCompiler::new(resolve_program(cwd, program)).with_args(config.compiler.args.clone())
        );
    }

    TscCompiler::detect(cwd)
}

/// Bare names are looked up on PATH; anything with a directory part is
/// taken relative to the working directory.
fn resolve_program(cwd: &Path, program: &Path) -> PathBuf {
    if program.components().count() > 1 {
        absolutize(cwd, program)
    } else {
        program.to_path_buf()
    }
}

fn report_diagnostics(shell: &Shell, diagnostics: &[CompileDiagnostic], cwd: &Path) {
    for diagnostic in diagnostics {
        if shell.is_json() {
            shell.json_event(&serde_json::json!({
                "reason": "compiler-diagnostic",
                "diagnostic": diagnostic,
            }));
            continue;
        }
        if shell.is_quiet() {
            continue;
        }

        let mut shown = diagnostic.clone();
        if let Some(ref file) = diagnostic.file {
            shown.file = Some(PathBuf::from(display_path(cwd, file)));
        }
        shell.print_block(shown.to_diagnostic(false).format(shell.use_color()));
    }
}
