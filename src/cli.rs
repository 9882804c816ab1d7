//! CLI argument parsing module for poetry2rye

use crate::migration::{MigrateOptions, RestoreOptions};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Migrate a Poetry project to Rye
#[derive(Parser, Debug, Clone)]
#[command(
    name = "poetry2rye",
    version,
    about = "Migrate a Poetry-managed pyproject.toml to Rye"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable debug logging on stderr
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Enable quiet mode - no spinners, no text report
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Convert the project in place after backing it up
    #[command(visible_alias = "mig")]
    Migrate {
        /// Project directory
        path: PathBuf,

        /// Neither look for nor move the module source tree
        #[arg(long)]
        ignore_src: bool,

        /// Emit a virtual Rye project (no build system)
        #[arg(long = "virtual")]
        virtual_project: bool,

        /// Output the migration report in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Restore the project from one of its backups
    #[command(visible_alias = "get-backup")]
    RestoreBackup {
        /// Project directory
        path: PathBuf,

        /// Backup index (default: the latest one)
        #[arg(short = 'n', long)]
        backup_number: Option<u64>,

        /// Restore without asking for confirmation
        #[arg(short = 'y', long = "yes")]
        yes: bool,
    },
}

impl Commands {
    /// Whether the report should be rendered as JSON
    pub fn json(&self) -> bool {
        matches!(self, Commands::Migrate { json: true, .. })
    }

    /// Options for the library when this is `migrate`
    pub fn migrate_options(&self) -> Option<MigrateOptions> {
        match self {
            Commands::Migrate {
                path,
                ignore_src,
                virtual_project,
                ..
            } => Some(MigrateOptions {
                path: path.clone(),
                ignore_src: *ignore_src,
                virtual_project: *virtual_project,
            }),
            Commands::RestoreBackup { .. } => None,
        }
    }

    /// Options for the library when this is `restore-backup`
    pub fn restore_options(&self) -> Option<RestoreOptions> {
        match self {
            Commands::RestoreBackup {
                path,
                backup_number,
                yes,
            } => Some(RestoreOptions {
                path: path.clone(),
                backup_number: *backup_number,
                assume_yes: *yes,
            }),
            Commands::Migrate { .. } => None,
        }
    }
}
