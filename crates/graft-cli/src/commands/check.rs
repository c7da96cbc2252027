//! `graft check` command - Validate the repository pair.

use std::path::Path;

use anyhow::{Result, bail};
use colored::Colorize;
use graft_core::Side;

use super::utils;
use crate::output;

/// Run the check command.
pub fn run(config_path: &Path) -> Result<()> {
    let config = utils::load_config(config_path)?;

    let ctx = match utils::open_pair(&config) {
        Ok(ctx) => ctx,
        Err(err) => {
            if let Some(graft_core::Error::Configuration { violations }) =
                err.downcast_ref::<graft_core::Error>()
            {
                for violation in violations {
                    eprintln!("  {} {violation}", "✗".red());
                }
                bail!("Found {} problem(s) with the repository pair", violations.len());
            }
            return Err(err);
        }
    };

    for side in [Side::Source, Side::Destination] {
        let root = ctx
            .repo(side)
            .workdir()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        output::detail(&format!(
            "  {:<12} {} {}",
            format!("{side}:"),
            ctx.branch(side).cyan(),
            root.dimmed()
        ));
    }
    for rule in ctx.paths().rules() {
        output::detail(&format!("  {} > {}", rule.source, rule.destination));
    }

    output::success("Repository pair is valid");
    Ok(())
}
