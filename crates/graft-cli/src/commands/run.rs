//! `graft run` command - Replay missing source commits into the destination.

use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Local};
use colored::Colorize;
use graft_core::{GraftRun, Report, RunOptions};
use tracing::info;

use super::utils;
use crate::output;

/// Run the graft command.
pub fn run(config_path: &Path, dry_run: bool, lookback_days: Option<u32>, json: bool) -> Result<()> {
    let config = utils::load_config(config_path)?;
    let ctx = utils::open_pair(&config)?;

    let mut options = RunOptions::from_config(&config.graft, dry_run);
    if let Some(days) = lookback_days {
        options.lookback_days = Some(days);
    }
    info!(
        lookback_days = ?options.lookback_days,
        dry_run,
        "starting graft run"
    );

    let report = GraftRun::new(ctx, options).execute()?;

    if json {
        output::essential(&serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &Report) {
    output::detail("");
    output::detail(&format!(
        "  {} in both, {} destination only, {} source only",
        report.in_both, report.destination_only, report.source_only
    ));
    output::hr();

    if report.grafted.is_empty() {
        output::info("Nothing to graft, destination is up to date");
    }

    let verb = if report.dry_run { "Would graft" } else { "Grafted" };
    for graft in &report.grafted {
        let created = graft
            .created
            .as_deref()
            .map(|id| format!(" -> {}", &id[..id.len().min(8)]))
            .unwrap_or_default();
        output::info(&format!(
            "{verb} {} {} {}{}",
            graft.source.id.yellow(),
            commit_date(graft.source.time).dimmed(),
            graft.source.summary,
            created.dimmed()
        ));
        for file in &graft.files {
            output::detail(&format!("      {}", file.dimmed()));
        }
    }

    for skipped in &report.skipped {
        output::warn(&format!(
            "Skipped {} {} (nothing to apply in the destination)",
            skipped.id, skipped.summary
        ));
    }

    if !report.unmatched_paths.is_empty() {
        output::warn(&format!(
            "{} source path(s) could not be mapped:",
            report.unmatched_paths.len()
        ));
        for path in report.unmatched_paths.iter() {
            eprintln!("    {path}");
        }
    }

    match (&report.branch, report.dry_run) {
        (_, true) => output::success(&format!(
            "Dry run: {} commit(s) would be grafted",
            report.graft_count()
        )),
        (Some(branch), false) => {
            output::success(&format!(
                "Grafted {} commit(s) onto {}",
                report.graft_count(),
                branch.cyan()
            ));
            output::essential(branch);
        }
        (None, false) => {}
    }
}

fn commit_date(time: i64) -> String {
    DateTime::from_timestamp(time, 0)
        .map(|utc| utc.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}
