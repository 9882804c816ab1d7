//! Rendering of migration and restore results
//!
//! Text is meant for a terminal (optionally colored); JSON mirrors the
//! serialized [`MigrationReport`] for scripts.

mod json;
mod text;

pub use json::JsonFormatter;
pub use text::TextFormatter;

use crate::migration::{MigrationReport, RestoreOutcome};
use std::io::{IsTerminal, Write};
use std::path::Path;

/// How results are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// How much is printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Only the `aborting...` notice of a declined restore
    Quiet,
    #[default]
    Normal,
    /// Also list the rendered dependencies
    Verbose,
}

/// Output settings derived from the command line
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub verbosity: Verbosity,
    /// Colored text, only when stdout is a terminal
    pub color: bool,
}

impl OutputConfig {
    /// `--json` wins over text; `--quiet` wins over `--verbose`
    pub fn from_cli(json: bool, verbose: bool, quiet: bool) -> Self {
        let format = if json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        };
        let verbosity = match (quiet, verbose) {
            (true, _) => Verbosity::Quiet,
            (false, true) => Verbosity::Verbose,
            (false, false) => Verbosity::Normal,
        };

        Self {
            format,
            verbosity,
            color: format == OutputFormat::Text && std::io::stdout().is_terminal(),
        }
    }

    /// Whether spinners may be drawn alongside this output
    pub fn shows_progress(&self) -> bool {
        self.format == OutputFormat::Text && self.verbosity != Verbosity::Quiet
    }
}

/// Writes results in one [`OutputFormat`]
pub trait OutputFormatter {
    /// Announce the backup taken before the migration starts
    fn format_backup(&self, backup: &Path, writer: &mut dyn Write) -> std::io::Result<()>;

    /// Format and write a migration report
    fn format_report(&self, report: &MigrationReport, writer: &mut dyn Write)
        -> std::io::Result<()>;

    /// Format and write the outcome of a restore
    fn format_restore(
        &self,
        outcome: &RestoreOutcome,
        writer: &mut dyn Write,
    ) -> std::io::Result<()>;
}

pub fn create_formatter(config: OutputConfig) -> Box<dyn OutputFormatter> {
    match config.format {
        OutputFormat::Text => Box::new(TextFormatter::with_color(config.verbosity, config.color)),
        OutputFormat::Json => Box::new(JsonFormatter::new(config.verbosity)),
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::convert::RenderedDependencies;
    use crate::manifest::LeftoverLine;
    use crate::migration::MigrationReport;
    use std::path::PathBuf;

    pub fn sample_report() -> MigrationReport {
        MigrationReport {
            project: "demo".to_string(),
            project_path: PathBuf::from("/work/demo"),
            backup_path: PathBuf::from("/work/.__p2r_backup_demo_0"),
            rendered: RenderedDependencies {
                requires_python: Some(">=3.10,<4.0".to_string()),
                dependencies: vec!["requests>=2.0,<3.0".to_string()],
                dev_dependencies: vec!["pytest>=7.0,<8.0".to_string()],
            },
            virtual_project: false,
            lockfile_removed: true,
            module_relocated_to: Some(PathBuf::from("/work/demo/src/demo")),
            poetry_mentions: vec![LeftoverLine {
                line: 12,
                content: "[tool.poetry-dynamic-versioning]".to_string(),
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cli_defaults_to_text() {
        let config = OutputConfig::from_cli(false, false, false);
        assert_eq!(config.format, OutputFormat::Text);
        assert_eq!(config.verbosity, Verbosity::Normal);
        assert!(config.shows_progress());
    }

    #[test]
    fn test_from_cli_json_hides_progress() {
        let config = OutputConfig::from_cli(true, false, false);
        assert_eq!(config.format, OutputFormat::Json);
        assert!(!config.color);
        assert!(!config.shows_progress());
    }

    #[test]
    fn test_quiet_wins_over_verbose() {
        let config = OutputConfig::from_cli(false, true, true);
        assert_eq!(config.verbosity, Verbosity::Quiet);
        assert!(!config.shows_progress());

        let config = OutputConfig::from_cli(false, true, false);
        assert_eq!(config.verbosity, Verbosity::Verbose);
    }

    #[test]
    fn test_create_formatter_json() {
        let formatter = create_formatter(OutputConfig::from_cli(true, false, false));
        let mut output = Vec::new();
        formatter
            .format_report(&fixtures::sample_report(), &mut output)
            .unwrap();
        assert!(String::from_utf8(output).unwrap().trim_start().starts_with('{'));
    }

    #[test]
    fn test_create_formatter_text_quiet() {
        let formatter = create_formatter(OutputConfig::from_cli(false, false, true));
        let mut output = Vec::new();
        formatter
            .format_report(&fixtures::sample_report(), &mut output)
            .unwrap();
        assert!(output.is_empty());
    }
}
