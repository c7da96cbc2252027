//! Graft CLI - replay commits between repositories that share no history.

use clap::Parser;

mod commands;
mod logging;
mod output;

use commands::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    output::set_quiet(cli.quiet);
    logging::init(cli.verbose);

    let result = match cli.command {
        Commands::Run {
            config,
            dry_run,
            lookback_days,
            json,
        } => commands::run::run(&config, dry_run, lookback_days, json),
        Commands::Check { config } => commands::check::run(&config),
        Commands::Completions { shell } => commands::completions::run(shell),
    };

    if let Err(e) = result {
        output::error(&format!("{e:#}"));
        std::process::exit(1);
    }
}
