//! JSON output formatter for machine processing
//!
//! The migration report is serialized as is; restore outcomes become a small
//! `{ "restored": bool, "backup": path }` object.

use crate::migration::{MigrationReport, RestoreOutcome};
use crate::output::{OutputFormatter, Verbosity};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// JSON formatter for machine-readable output
pub struct JsonFormatter {
    /// Verbosity level; quiet drops the leftover line list
    verbosity: Verbosity,
}

impl JsonFormatter {
    /// Create a new JSON formatter
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }
}

/// JSON representation of a restore outcome
#[derive(Serialize)]
struct JsonRestore<'a> {
    restored: bool,
    backup: &'a Path,
}

fn write_json<T: Serialize>(value: &T, writer: &mut dyn Write) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(std::io::Error::other)?;
    writeln!(writer, "{}", json)
}

impl OutputFormatter for JsonFormatter {
    fn format_backup(&self, _backup: &Path, _writer: &mut dyn Write) -> std::io::Result<()> {
        // the backup path is part of the report
        Ok(())
    }

    fn format_report(
        &self,
        report: &MigrationReport,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        if self.verbosity == Verbosity::Quiet && !report.poetry_mentions.is_empty() {
            let mut report = report.clone();
            report.poetry_mentions.clear();
            return write_json(&report, writer);
        }
        write_json(report, writer)
    }

    fn format_restore(
        &self,
        outcome: &RestoreOutcome,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let output = match outcome {
            RestoreOutcome::Restored { backup } => JsonRestore {
                restored: true,
                backup,
            },
            RestoreOutcome::Aborted { backup } => JsonRestore {
                restored: false,
                backup,
            },
        };
        write_json(&output, writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::fixtures::sample_report;
    use std::path::PathBuf;

    fn to_json(formatter: &JsonFormatter) -> serde_json::Value {
        let mut output = Vec::new();
        formatter.format_report(&sample_report(), &mut output).unwrap();
        serde_json::from_slice(&output).unwrap()
    }

    #[test]
    fn test_format_report() {
        let json = to_json(&JsonFormatter::new(Verbosity::Normal));
        assert_eq!(json["project"], "demo");
        assert_eq!(json["backup_path"], "/work/.__p2r_backup_demo_0");
        assert_eq!(json["requires_python"], ">=3.10,<4.0");
        assert_eq!(json["dependencies"][0], "requests>=2.0,<3.0");
        assert_eq!(json["dev_dependencies"][0], "pytest>=7.0,<8.0");
        assert_eq!(json["lockfile_removed"], true);
        assert_eq!(json["poetry_mentions"][0]["line"], 12);
    }

    #[test]
    fn test_format_report_quiet_drops_mentions() {
        let json = to_json(&JsonFormatter::new(Verbosity::Quiet));
        assert_eq!(json["poetry_mentions"].as_array().unwrap().len(), 0);
        assert_eq!(json["project"], "demo");
    }

    #[test]
    fn test_format_backup_is_silent() {
        let mut output = Vec::new();
        JsonFormatter::new(Verbosity::Normal)
            .format_backup(Path::new("/work/backup"), &mut output)
            .unwrap();
        assert!(output.is_empty());
    }

    #[test]
    fn test_format_restore() {
        let mut output = Vec::new();
        JsonFormatter::new(Verbosity::Normal)
            .format_restore(
                &RestoreOutcome::Aborted {
                    backup: PathBuf::from("/work/.__p2r_backup_demo_0"),
                },
                &mut output,
            )
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(json["restored"], false);
        assert_eq!(json["backup"], "/work/.__p2r_backup_demo_0");
    }
}
