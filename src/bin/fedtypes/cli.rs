//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell as CompletionShell;

use fedtypes::core::SearchPolicy;
use fedtypes::util::shell::ColorChoice;

/// fedtypes - Bundle and merge type declarations for federated packages
///
/// Without a subcommand, runs `build`.
#[derive(Parser)]
#[command(name = "fedtypes")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Coloring: auto, always, never
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    pub color: ColorChoice,

    /// Output format for messages
    #[arg(long, global = true, value_enum, default_value_t = MessageFormat::Human)]
    pub message_format: MessageFormat,

    #[command(flatten)]
    pub build: BuildArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile, rewrite and merge the package's declarations (the default)
    Build(BuildArgs),

    /// Show the manifest a build would use
    Locate(LocateArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum MessageFormat {
    Human,
    Json,
}

/// How the manifest is found.
#[derive(Args, Clone, Debug, Default)]
pub struct DiscoveryArgs {
    /// Use this manifest instead of searching for one
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Search policy: first-match or unique
    #[arg(long, value_name = "POLICY")]
    pub discovery: Option<SearchPolicy>,
}

#[derive(Args, Clone, Debug, Default)]
pub struct BuildArgs {
    #[command(flatten)]
    pub discovery: DiscoveryArgs,

    /// Shared type-declarations directory
    #[arg(long, value_name = "DIR", visible_alias = "outputDir")]
    pub output_dir: Option<PathBuf>,

    /// Declaration compiler to run
    #[arg(long, value_name = "PROGRAM")]
    pub tsc: Option<PathBuf>,

    /// Fail when the compiler reports errors
    #[arg(long)]
    pub strict: bool,
}

#[derive(Args)]
pub struct LocateArgs {
    #[command(flatten)]
    pub discovery: DiscoveryArgs,

    /// List every candidate instead of the selected manifest
    #[arg(long)]
    pub all: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: CompletionShell,
}
