//! `fedtypes locate` command

use anyhow::Result;

use crate::cli::LocateArgs;
use crate::GlobalOptions;
use fedtypes::ops::{locate_manifests, LocateMode};
use fedtypes::util::fs::display_path;
use fedtypes::util::shell::Status;
use fedtypes::util::GlobalContext;

pub fn execute(args: LocateArgs, global_opts: &GlobalOptions) -> Result<()> {
    let shell = &global_opts.shell;
    let ctx = GlobalContext::new()?;
    let config = ctx.load_config();
    let opts = super::emit_options(&ctx, &config, &args.discovery);

    let mode = if args.all { LocateMode::All } else { LocateMode::Selected };
    let paths = locate_manifests(&opts, mode)?;

    if shell.is_json() {
        shell.json_event(&serde_json::json!({
            "reason": "manifests",
            "paths": paths,
        }));
        return Ok(());
    }

    if paths.is_empty() {
        shell.warn(format!(
            "no `{}` under {}",
            opts.discovery.manifest_name(),
            ctx.cwd().display()
        ));
        return Ok(());
    }

    // Paths go to stdout so they can be piped.
    for path in &paths {
        println!("{}", display_path(ctx.cwd(), path));
    }
    if args.all {
        shell.status(Status::Found, format!("{} manifest(s)", paths.len()));
    }

    Ok(())
}
