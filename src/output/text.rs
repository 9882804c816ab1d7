//! Text output formatter for human-readable display
//!
//! This module provides:
//! - The backup announcement printed before anything is modified
//! - Leftover `poetry` mentions that need a manual look
//! - Post-migration actions (lockfile removal, module relocation)
//! - Rendered dependencies in verbose mode

use crate::migration::{MigrationReport, RestoreOutcome};
use crate::output::{OutputFormatter, Verbosity};
use colored::Colorize;
use std::io::Write;
use std::path::Path;

/// Text formatter for human-readable output
pub struct TextFormatter {
    /// Verbosity level
    verbosity: Verbosity,
    /// Whether to use colors
    color: bool,
}

impl TextFormatter {
    /// Create a new text formatter
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            color: true,
        }
    }

    /// Create a new text formatter with color option
    pub fn with_color(verbosity: Verbosity, color: bool) -> Self {
        Self { verbosity, color }
    }

    fn done(&self, writer: &mut dyn Write) -> std::io::Result<()> {
        if self.color {
            writeln!(writer, "{}", "done".green().bold())
        } else {
            writeln!(writer, "done")
        }
    }

    /// Rendered dependencies, one per line
    fn format_dependencies(
        &self,
        title: &str,
        specifiers: &[String],
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        if specifiers.is_empty() {
            return Ok(());
        }
        if self.color {
            writeln!(writer, "{}", title.bold())?;
        } else {
            writeln!(writer, "{}", title)?;
        }
        for specifier in specifiers {
            writeln!(writer, "  {}", specifier)?;
        }
        Ok(())
    }
}

impl OutputFormatter for TextFormatter {
    fn format_backup(&self, backup: &Path, writer: &mut dyn Write) -> std::io::Result<()> {
        if self.verbosity == Verbosity::Quiet {
            return Ok(());
        }
        let path = backup.display().to_string();
        if self.color {
            writeln!(writer, "created backup: {}", path.cyan())
        } else {
            writeln!(writer, "created backup: {}", path)
        }
    }

    fn format_report(
        &self,
        report: &MigrationReport,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        if self.verbosity == Verbosity::Quiet {
            return Ok(());
        }

        for mention in &report.poetry_mentions {
            let label = format!("Found 'poetry' in line {}:", mention.line);
            if self.color {
                writeln!(writer, "{} {}", label.yellow(), mention.content)?;
            } else {
                writeln!(writer, "{} {}", label, mention.content)?;
            }
        }

        if self.verbosity == Verbosity::Verbose {
            if let Some(requires_python) = &report.rendered.requires_python {
                writeln!(writer, "requires-python: {}", requires_python)?;
            }
            self.format_dependencies("dependencies:", &report.rendered.dependencies, writer)?;
            self.format_dependencies(
                "dev-dependencies:",
                &report.rendered.dev_dependencies,
                writer,
            )?;
        }

        if report.lockfile_removed {
            writeln!(writer, "removed poetry.lock")?;
        }
        if let Some(target) = &report.module_relocated_to {
            writeln!(writer, "moved module to {}", target.display())?;
        }

        self.done(writer)
    }

    fn format_restore(
        &self,
        outcome: &RestoreOutcome,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        match outcome {
            RestoreOutcome::Aborted { .. } => writeln!(writer, "aborting..."),
            RestoreOutcome::Restored { backup } => {
                if self.verbosity == Verbosity::Quiet {
                    return Ok(());
                }
                writeln!(writer, "restored backup from {}", backup.display())?;
                self.done(writer)
            }
        }
    }
}
