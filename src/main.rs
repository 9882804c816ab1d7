//! poetry2rye - Poetry to Rye migration CLI tool
//!
//! Subcommands:
//! - `migrate`: back up the project, then rewrite `pyproject.toml` for Rye
//! - `restore-backup`: put a backup back in place of the project

use clap::{CommandFactory, Parser};
use poetry2rye::cli::{Cli, Commands};
use poetry2rye::error::AppError;
use poetry2rye::logging;
use poetry2rye::migration::{prompt_restore, restore, Migrator};
use poetry2rye::output::{create_formatter, OutputConfig};
use poetry2rye::progress::Progress;
use std::io::{self, Write};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let Some(command) = cli.command.clone() else {
        // Printing help cannot meaningfully fail here
        let _ = Cli::command().print_help();
        return ExitCode::FAILURE;
    };

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("failed to initialise logging: {}", e);
        return ExitCode::FAILURE;
    }

    match run(&cli, &command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => match AppError::from_anyhow(err) {
            Ok(e) => {
                eprintln!("error: {}", e);
                ExitCode::FAILURE
            }
            Err(fault) => {
                eprintln!("unexpected error occurred!");
                eprintln!("{:?}", fault);
                ExitCode::FAILURE
            }
        },
    }
}

/// Main application logic
fn run(cli: &Cli, command: &Commands) -> anyhow::Result<()> {
    let output_config = OutputConfig::from_cli(command.json(), cli.verbose, cli.quiet);
    let mut progress = Progress::new(output_config.shows_progress());
    let formatter = create_formatter(output_config);

    if let Some(options) = command.migrate_options() {
        tracing::debug!(path = %options.path.display(), "migrating");
        let migrator = Migrator::new(options)?;
        let backup = migrator.backup(&mut progress)?;
        {
            let mut stdout = io::stdout().lock();
            formatter.format_backup(&backup, &mut stdout)?;
            stdout.flush()?;
        }

        let report = migrator.run(backup)?;
        let mut stdout = io::stdout().lock();
        formatter.format_report(&report, &mut stdout)?;
        stdout.flush()?;
    }

    if let Some(options) = command.restore_options() {
        tracing::debug!(path = %options.path.display(), "restoring");
        let outcome = restore(&options, &mut progress, prompt_restore)?;
        let mut stdout = io::stdout().lock();
        formatter.format_restore(&outcome, &mut stdout)?;
        stdout.flush()?;
    }

    Ok(())
}
