//! Command implementations

pub mod build;
pub mod completions;
pub mod locate;

use crate::cli::DiscoveryArgs;
use fedtypes::core::DiscoveryPolicy;
use fedtypes::ops::EmitOptions;
use fedtypes::util::{Config, GlobalContext};

/// Pipeline options from configuration, with command-line overrides applied.
pub fn emit_options(ctx: &GlobalContext, config: &Config, discovery: &DiscoveryArgs) -> EmitOptions {
    let mut opts = EmitOptions::from_config(ctx.cwd(), config);

    if let Some(policy) = discovery.discovery {
        opts.policy = DiscoveryPolicy::Search(policy);
    }
    if let Some(ref path) = discovery.config {
        opts = opts.with_manifest(path);
    }

    opts
}
