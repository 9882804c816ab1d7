//! Migration workflow
//!
//! Coordinates the whole conversion of a project directory:
//! 1. Snapshot the project into the next backup slot
//! 2. Load and validate the Poetry manifest, locate the module
//! 3. Parse and render the dependencies
//! 4. Reassemble and overwrite `pyproject.toml`
//! 5. Report leftover `poetry` mentions, drop `poetry.lock`, move the module under `src/`
//!
//! Restoring a snapshot is the inverse operation and lives here as well.

use crate::backup;
use crate::convert::{convert_manifest, ConvertOptions, RenderedDependencies};
use crate::error::IoError;
use crate::manifest::{
    find_mentions, write_manifest, LeftoverLine, PoetryProject, POETRY_LOCK_FILENAME, SRC_DIR,
};
use crate::progress::Progress;
use anyhow::{bail, ensure, Result};
use serde::Serialize;
use std::fs;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};

/// Text searched for in the rewritten manifest
const LEGACY_TOOL_NAME: &str = "poetry";

/// Options of the `migrate` command
#[derive(Debug, Clone, Default)]
pub struct MigrateOptions {
    /// Project directory
    pub path: PathBuf,
    /// Skip module discovery and relocation under `src/`
    pub ignore_src: bool,
    /// Emit a virtual Rye project
    pub virtual_project: bool,
}

/// Options of the `restore-backup` command
#[derive(Debug, Clone, Default)]
pub struct RestoreOptions {
    /// Project directory
    pub path: PathBuf,
    /// Backup index, the latest one when absent
    pub backup_number: Option<u64>,
    /// Skip the confirmation prompt
    pub assume_yes: bool,
}

/// Outcome of a successful migration
#[derive(Debug, Clone, Serialize)]
pub struct MigrationReport {
    /// `tool.poetry.name`
    pub project: String,
    pub project_path: PathBuf,
    pub backup_path: PathBuf,
    #[serde(flatten)]
    pub rendered: RenderedDependencies,
    pub virtual_project: bool,
    /// Whether `poetry.lock` was deleted
    pub lockfile_removed: bool,
    /// New module location when it was moved under `src/`
    pub module_relocated_to: Option<PathBuf>,
    /// Lines of the new manifest still mentioning poetry
    pub poetry_mentions: Vec<LeftoverLine>,
}

/// Outcome of a restore request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    Restored { backup: PathBuf },
    Aborted { backup: PathBuf },
}

/// Runs the migration of one project directory
pub struct Migrator {
    options: MigrateOptions,
    root: PathBuf,
}

impl Migrator {
    /// Create a migrator, resolving the project path to an absolute path
    pub fn new(options: MigrateOptions) -> Result<Self> {
        let root = absolute(&options.path)?;
        Ok(Self { options, root })
    }

    /// Absolute project directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Copy the project into its next backup slot
    pub fn backup(&self, progress: &mut Progress) -> Result<PathBuf> {
        let backup = progress.while_running("creating backup...", || {
            backup::create_backup(&self.root)
        })?;
        Ok(backup)
    }

    /// Convert the project in place; `backup` must already exist
    pub fn run(&self, backup_path: PathBuf) -> Result<MigrationReport> {
        let project = PoetryProject::load(&self.root, !self.options.ignore_src)?;

        let dependencies = project.dependencies()?;
        let rendered = RenderedDependencies::from_dependencies(&dependencies);
        tracing::debug!(
            dependencies = rendered.dependencies.len(),
            dev_dependencies = rendered.dev_dependencies.len(),
            requires_python = ?rendered.requires_python,
            "rendered dependencies"
        );

        let output = convert_manifest(
            &project,
            &rendered,
            ConvertOptions {
                virtual_project: self.options.virtual_project,
            },
        )?;
        write_manifest(project.manifest_path(), &output)?;
        tracing::debug!(path = %project.manifest_path().display(), "wrote manifest");

        let poetry_mentions = find_mentions(&output, LEGACY_TOOL_NAME);
        let lockfile_removed = self.remove_lockfile()?;
        let module_relocated_to = self.relocate_module(&project)?;

        Ok(MigrationReport {
            project: project.name().to_string(),
            project_path: self.root.clone(),
            backup_path,
            rendered,
            virtual_project: self.options.virtual_project,
            lockfile_removed,
            module_relocated_to,
            poetry_mentions,
        })
    }

    fn remove_lockfile(&self) -> Result<bool, IoError> {
        let lockfile = self.root.join(POETRY_LOCK_FILENAME);
        if !lockfile.is_file() {
            return Ok(false);
        }
        fs::remove_file(&lockfile).map_err(|e| IoError::generic(&lockfile, e))?;
        tracing::debug!(path = %lockfile.display(), "removed lockfile");
        Ok(true)
    }

    /// Moves a root-level module to `src/<module>`
    fn relocate_module(&self, project: &PoetryProject) -> Result<Option<PathBuf>, IoError> {
        let Some(layout) = project.layout() else {
            return Ok(None);
        };
        if layout.in_src {
            return Ok(None);
        }

        let src = self.root.join(SRC_DIR);
        fs::create_dir_all(&src).map_err(|e| IoError::generic(&src, e))?;
        let target = layout.target_path(&self.root);
        fs::rename(&layout.module_path, &target)
            .map_err(|e| IoError::generic(&layout.module_path, e))?;
        tracing::debug!(
            from = %layout.module_path.display(),
            to = %target.display(),
            "moved module"
        );
        Ok(Some(target))
    }
}

/// Backup, then migrate
pub fn migrate(options: MigrateOptions, progress: &mut Progress) -> Result<MigrationReport> {
    let migrator = Migrator::new(options)?;
    let backup = migrator.backup(progress)?;
    migrator.run(backup)
}

/// Restore a project from one of its backups.
///
/// `confirm` is asked before anything is touched unless `assume_yes` is set.
/// A missing backup is a fault, not a reportable error.
pub fn restore(
    options: &RestoreOptions,
    progress: &mut Progress,
    confirm: impl FnOnce(&Path) -> Result<bool>,
) -> Result<RestoreOutcome> {
    let root = absolute(&options.path)?;

    let index = match options.backup_number {
        Some(index) => index,
        None => match backup::latest_slot(&root)? {
            Some(index) => index,
            None => bail!("no backup found for {}", root.display()),
        },
    };
    let backup = backup::backup_path(&root, index)?;
    ensure!(backup.is_dir(), "backup not found: {}", backup.display());

    if !options.assume_yes && !confirm(&backup)? {
        return Ok(RestoreOutcome::Aborted { backup });
    }

    progress.while_running("restoring backup...", || {
        backup::restore_backup(&root, &backup)
    })?;

    Ok(RestoreOutcome::Restored { backup })
}

/// `[y/N]` confirmation for a restore.
///
/// Without a terminal the answer is read as a line from stdin.
pub fn prompt_restore(backup: &Path) -> Result<bool> {
    let prompt = format!("really restore backup from {}?", backup.display());
    if !(io::stdin().is_terminal() && io::stderr().is_terminal()) {
        return confirm_from_line(&prompt, io::stdin().lock(), &mut io::stderr());
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()?;
    Ok(confirmed)
}

/// Only `y` confirms; end of input declines
fn confirm_from_line(
    prompt: &str,
    mut input: impl BufRead,
    output: &mut impl Write,
) -> Result<bool> {
    write!(output, "{prompt} [y/N] ")?;
    output.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}

fn absolute(path: &Path) -> Result<PathBuf, IoError> {
    std::path::absolute(path).map_err(|e| IoError::generic(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::MANIFEST_FILENAME;
    use tempfile::TempDir;

    const MANIFEST: &str = r#"[tool.poetry]
name = "demo"
version = "0.1.0"
description = "A demo project"

[tool.poetry.dependencies]
python = "^3.10"
requests = "^2.0"
"#;

    fn project(dir: &TempDir) -> PathBuf {
        let root = dir.path().join("demo");
        fs::create_dir_all(root.join("demo")).unwrap();
        fs::write(root.join(MANIFEST_FILENAME), MANIFEST).unwrap();
        fs::write(root.join("demo/__init__.py"), "").unwrap();
        root
    }

    fn options(root: &Path) -> MigrateOptions {
        MigrateOptions {
            path: root.to_path_buf(),
            ..Default::default()
        }
    }

    #[test]
    fn test_migrate_creates_backup_first() {
        let dir = TempDir::new().unwrap();
        let root = project(&dir);

        let report = migrate(options(&root), &mut Progress::disabled()).unwrap();
        assert_eq!(report.backup_path, dir.path().join(".__p2r_backup_demo_0"));
        assert_eq!(
            fs::read_to_string(report.backup_path.join(MANIFEST_FILENAME)).unwrap(),
            MANIFEST
        );
    }

    #[test]
    fn test_migrate_report() {
        let dir = TempDir::new().unwrap();
        let root = project(&dir);

        let report = migrate(options(&root), &mut Progress::disabled()).unwrap();
        assert_eq!(report.project, "demo");
        assert_eq!(report.rendered.requires_python.as_deref(), Some(">=3.10,<4.0"));
        assert_eq!(report.rendered.dependencies, vec!["requests>=2.0,<3.0"]);
        assert!(!report.lockfile_removed);
        assert!(report.poetry_mentions.is_empty());
    }

    #[test]
    fn test_migrate_moves_module_under_src() {
        let dir = TempDir::new().unwrap();
        let root = project(&dir);

        let report = migrate(options(&root), &mut Progress::disabled()).unwrap();
        assert_eq!(report.module_relocated_to, Some(root.join("src/demo")));
        assert!(root.join("src/demo/__init__.py").exists());
        assert!(!root.join("demo").exists());
    }

    #[test]
    fn test_migrate_ignore_src() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("demo");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join(MANIFEST_FILENAME), MANIFEST).unwrap();

        let report = migrate(
            MigrateOptions {
                path: root.clone(),
                ignore_src: true,
                ..Default::default()
            },
            &mut Progress::disabled(),
        )
        .unwrap();
        assert_eq!(report.module_relocated_to, None);
        assert!(!root.join("src").exists());
    }

    #[test]
    fn test_migrate_removes_lockfile() {
        let dir = TempDir::new().unwrap();
        let root = project(&dir);
        fs::write(root.join(POETRY_LOCK_FILENAME), "# lock").unwrap();

        let report = migrate(options(&root), &mut Progress::disabled()).unwrap();
        assert!(report.lockfile_removed);
        assert!(!root.join(POETRY_LOCK_FILENAME).exists());
    }

    #[test]
    fn test_migrate_reports_poetry_mentions() {
        let dir = TempDir::new().unwrap();
        let root = project(&dir);
        let manifest = format!("{MANIFEST}\n[tool.poetry-dynamic-versioning]\nenable = true\n");
        fs::write(root.join(MANIFEST_FILENAME), manifest).unwrap();

        let report = migrate(options(&root), &mut Progress::disabled()).unwrap();
        assert_eq!(report.poetry_mentions.len(), 1);
        assert!(report.poetry_mentions[0]
            .content
            .contains("poetry-dynamic-versioning"));
    }

    #[test]
    fn test_migrate_error_keeps_backup() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("demo");
        fs::create_dir_all(&root).unwrap();

        let err = migrate(options(&root), &mut Progress::disabled()).unwrap_err();
        assert!(crate::error::AppError::from_anyhow(err).is_ok());
        assert!(dir.path().join(".__p2r_backup_demo_0").exists());
    }

    #[test]
    fn test_restore_latest_backup() {
        let dir = TempDir::new().unwrap();
        let root = project(&dir);
        migrate(options(&root), &mut Progress::disabled()).unwrap();

        let outcome = restore(
            &RestoreOptions {
                path: root.clone(),
                assume_yes: true,
                ..Default::default()
            },
            &mut Progress::disabled(),
            |_| panic!("confirmation must not be asked"),
        )
        .unwrap();
        assert_eq!(
            outcome,
            RestoreOutcome::Restored {
                backup: dir.path().join(".__p2r_backup_demo_0")
            }
        );
        assert_eq!(
            fs::read_to_string(root.join(MANIFEST_FILENAME)).unwrap(),
            MANIFEST
        );
        assert!(root.join("demo/__init__.py").exists());
    }

    #[test]
    fn test_restore_declined() {
        let dir = TempDir::new().unwrap();
        let root = project(&dir);
        migrate(options(&root), &mut Progress::disabled()).unwrap();

        let outcome = restore(
            &RestoreOptions {
                path: root.clone(),
                ..Default::default()
            },
            &mut Progress::disabled(),
            |_| Ok(false),
        )
        .unwrap();
        assert!(matches!(outcome, RestoreOutcome::Aborted { .. }));
        assert!(root.join("src/demo").exists());
    }

    #[test]
    fn test_confirm_from_line() {
        let mut prompt = Vec::new();
        assert!(confirm_from_line("restore?", "y\n".as_bytes(), &mut prompt).unwrap());
        assert_eq!(String::from_utf8(prompt).unwrap(), "restore? [y/N] ");

        let mut sink = Vec::new();
        assert!(confirm_from_line("restore?", " Y \n".as_bytes(), &mut sink).unwrap());
        assert!(!confirm_from_line("restore?", "yes\n".as_bytes(), &mut sink).unwrap());
        assert!(!confirm_from_line("restore?", "\n".as_bytes(), &mut sink).unwrap());
        assert!(!confirm_from_line("restore?", "".as_bytes(), &mut sink).unwrap());
    }

    #[test]
    fn test_restore_without_backup_is_a_fault() {
        let dir = TempDir::new().unwrap();
        let root = project(&dir);

        let err = restore(
            &RestoreOptions {
                path: root,
                assume_yes: true,
                ..Default::default()
            },
            &mut Progress::disabled(),
            |_| Ok(true),
        )
        .unwrap_err();
        assert!(err.to_string().contains("no backup found"));
        assert!(crate::error::AppError::from_anyhow(err).is_err());
    }

    #[test]
    fn test_restore_unknown_number_is_a_fault() {
        let dir = TempDir::new().unwrap();
        let root = project(&dir);
        migrate(options(&root), &mut Progress::disabled()).unwrap();

        let err = restore(
            &RestoreOptions {
                path: root,
                backup_number: Some(5),
                assume_yes: true,
            },
            &mut Progress::disabled(),
            |_| Ok(true),
        )
        .unwrap_err();
        assert!(err.to_string().contains("backup not found"));
    }
}
