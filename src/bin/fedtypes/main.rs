//! fedtypes CLI - Type declaration bundler for federated packages

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands, MessageFormat};
use fedtypes::ops::EmitError;
use fedtypes::util::shell::Shell;
use fedtypes::ManifestError;

/// Options shared by every command.
pub struct GlobalOptions {
    pub shell: Shell,
}

fn main() {
    let cli = Cli::parse();

    let global_opts = GlobalOptions {
        shell: Shell::from_flags(
            cli.quiet,
            cli.verbose,
            cli.color,
            cli.message_format == MessageFormat::Json,
        ),
    };

    init_logging(&cli);

    if let Err(e) = run(cli, &global_opts) {
        report_error(&e, &global_opts.shell);
        std::process::exit(1);
    }
}

fn init_logging(cli: &Cli) {
    // The shell carries normal progress output; logs are for --verbose and RUST_LOG.
    let filter = match std::env::var("RUST_LOG") {
        Ok(directives) if !directives.is_empty() => EnvFilter::new(directives),
        _ if cli.verbose => EnvFilter::new("fedtypes=debug"),
        _ => EnvFilter::new("fedtypes=warn"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn run(cli: Cli, global_opts: &GlobalOptions) -> Result<()> {
    match cli.command {
        None => commands::build::execute(cli.build, global_opts),
        Some(Commands::Build(args)) => commands::build::execute(args, global_opts),
        Some(Commands::Locate(args)) => commands::locate::execute(args, global_opts),
        Some(Commands::Completions(args)) => commands::completions::execute(args),
    }
}

fn report_error(e: &anyhow::Error, shell: &Shell) {
    let diagnostic = if let Some(err) = e.downcast_ref::<ManifestError>() {
        Some(err.to_diagnostic())
    } else {
        e.downcast_ref::<EmitError>().map(EmitError::to_diagnostic)
    };

    if shell.is_json() {
        shell.error(format!("{:#}", e));
        return;
    }

    match diagnostic {
        Some(diag) => shell.print_block(diag.format(shell.use_color())),
        None => eprintln!("error: {:#}", e),
    }
}
