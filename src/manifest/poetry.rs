//! Poetry manifest reader
//!
//! Loads `pyproject.toml`, checks that it is a Poetry manifest that has not
//! been migrated yet and exposes:
//! - the `[tool.poetry]` metadata (name, version, authors, urls, ...)
//! - the raw dependency tables (main and dev)
//! - the location of the project's module

use super::layout::{locate_module, ModuleLayout};
use super::writer::read_manifest;
use crate::domain::{Dependency, DependencyGroup};
use crate::error::{AppError, DependencyError, ManifestError};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use toml::{Table, Value};

/// File name of the manifest
pub const MANIFEST_FILENAME: &str = "pyproject.toml";

/// Metadata fields of `[tool.poetry]` carried over to `[project]`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PoetryMetadata {
    pub name: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub maintainers: Vec<String>,
    pub homepage: Option<String>,
    pub repository: Option<String>,
    pub documentation: Option<String>,
}

/// A loaded and validated Poetry project
#[derive(Debug, Clone)]
pub struct PoetryProject {
    root: PathBuf,
    manifest_path: PathBuf,
    content: String,
    poetry: Table,
    metadata: PoetryMetadata,
    layout: Option<ModuleLayout>,
}

impl PoetryProject {
    /// Load the project rooted at `root`.
    ///
    /// The module layout is only looked up when `locate_src` is set.
    pub fn load(root: &Path, locate_src: bool) -> Result<Self, AppError> {
        let manifest_path = root.join(MANIFEST_FILENAME);
        if !manifest_path.is_file() {
            return Err(ManifestError::not_found(&manifest_path).into());
        }

        let content = read_manifest(&manifest_path)?;
        let document: Table = toml::from_str(&content)
            .map_err(|e| ManifestError::toml_parse_error(&manifest_path, e.to_string()))?;

        if document.contains_key("project") {
            return Err(ManifestError::unsupported_schema(
                &manifest_path,
                "a [project] section already exists; only manifests written with [tool.poetry] are supported",
            )
            .into());
        }
        let poetry = document
            .get("tool")
            .and_then(|tool| tool.get("poetry"))
            .and_then(Value::as_table)
            .cloned()
            .ok_or_else(|| {
                ManifestError::unsupported_schema(&manifest_path, "no [tool.poetry] section found")
            })?;

        let metadata: PoetryMetadata = Value::Table(poetry.clone())
            .try_into()
            .map_err(|e: toml::de::Error| {
                ManifestError::toml_parse_error(&manifest_path, e.to_string())
            })?;

        let missing = [
            ("name", metadata.name.is_none()),
            ("version", metadata.version.is_none()),
            ("description", metadata.description.is_none()),
        ];
        if let Some((field, _)) = missing.iter().find(|(_, is_missing)| *is_missing) {
            return Err(ManifestError::missing_field(&manifest_path, *field).into());
        }

        let layout = if locate_src {
            let name = metadata.name.as_deref().unwrap_or_default();
            Some(locate_module(root, name)?)
        } else {
            None
        };

        tracing::debug!(
            path = %manifest_path.display(),
            layout = ?layout,
            "loaded poetry manifest"
        );

        Ok(Self {
            root: root.to_path_buf(),
            manifest_path,
            content,
            poetry,
            metadata,
            layout,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    /// Raw manifest text as read from disk
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn metadata(&self) -> &PoetryMetadata {
        &self.metadata
    }

    /// `tool.poetry.name`
    pub fn name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or_default()
    }

    /// Module location, `None` when source discovery was skipped
    pub fn layout(&self) -> Option<&ModuleLayout> {
        self.layout.as_ref()
    }

    /// The raw declaration table of a dependency group.
    ///
    /// Dev dependencies are looked up in `dev-dependencies` first and then in
    /// `group.dev.dependencies`. A missing table is empty.
    pub fn dependency_declarations(&self, group: DependencyGroup) -> Table {
        let table = match group {
            DependencyGroup::Main => self.poetry.get("dependencies"),
            DependencyGroup::Dev => self.poetry.get("dev-dependencies").or_else(|| {
                self.poetry
                    .get("group")
                    .and_then(|g| g.get("dev"))
                    .and_then(|dev| dev.get("dependencies"))
            }),
        };
        table.and_then(Value::as_table).cloned().unwrap_or_default()
    }

    /// Parsed dependencies of both groups, main first
    pub fn dependencies(&self) -> Result<Vec<Dependency>, DependencyError> {
        let mut dependencies = super::parse_dependency_table(
            &self.dependency_declarations(DependencyGroup::Main),
            DependencyGroup::Main,
        )?;
        dependencies.extend(super::parse_dependency_table(
            &self.dependency_declarations(DependencyGroup::Dev),
            DependencyGroup::Dev,
        )?);
        Ok(dependencies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const MINIMAL: &str = r#"
[tool.poetry]
name = "demo"
version = "0.1.0"
description = "A demo project"
authors = ["Jane <jane@example.com>"]

[tool.poetry.dependencies]
python = "^3.10"
requests = "^2.0"

[tool.poetry.group.dev.dependencies]
pytest = "^7.0"
"#;

    fn project_dir(manifest: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(MANIFEST_FILENAME), manifest).unwrap();
        fs::create_dir_all(dir.path().join("demo")).unwrap();
        dir
    }

    #[test]
    fn test_load_minimal() {
        let dir = project_dir(MINIMAL);
        let project = PoetryProject::load(dir.path(), true).unwrap();
        assert_eq!(project.name(), "demo");
        assert_eq!(project.metadata().authors, vec!["Jane <jane@example.com>"]);
        assert_eq!(project.layout().unwrap().module_name, "demo");
    }

    #[test]
    fn test_load_without_src_lookup() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(MANIFEST_FILENAME), MINIMAL).unwrap();
        let project = PoetryProject::load(dir.path(), false).unwrap();
        assert!(project.layout().is_none());
    }

    #[test]
    fn test_load_not_found() {
        let dir = TempDir::new().unwrap();
        let err = PoetryProject::load(dir.path(), false).unwrap_err();
        assert!(matches!(
            err,
            AppError::Manifest(ManifestError::NotFound { .. })
        ));
    }

    #[test]
    fn test_load_already_migrated() {
        let dir = project_dir("[project]\nname = \"demo\"\n\n[tool.poetry]\nname = \"demo\"\n");
        let err = PoetryProject::load(dir.path(), false).unwrap_err();
        assert!(matches!(
            err,
            AppError::Manifest(ManifestError::UnsupportedSchema { .. })
        ));
    }

    #[test]
    fn test_load_without_poetry_section() {
        let dir = project_dir("[tool.black]\nline-length = 88\n");
        let err = PoetryProject::load(dir.path(), false).unwrap_err();
        assert!(err.to_string().contains("no [tool.poetry] section"));
    }

    #[test]
    fn test_load_missing_field() {
        let dir = project_dir("[tool.poetry]\nname = \"demo\"\nversion = \"0.1.0\"\n");
        let err = PoetryProject::load(dir.path(), false).unwrap_err();
        assert!(err.to_string().contains("tool.poetry.description"));
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = project_dir("[tool.poetry\nname = ");
        let err = PoetryProject::load(dir.path(), false).unwrap_err();
        assert!(matches!(
            err,
            AppError::Manifest(ManifestError::TomlParseError { .. })
        ));
    }

    #[test]
    fn test_dev_declarations_fallback() {
        let dir = project_dir(MINIMAL);
        let project = PoetryProject::load(dir.path(), false).unwrap();
        let dev = project.dependency_declarations(DependencyGroup::Dev);
        assert!(dev.contains_key("pytest"));
    }

    #[test]
    fn test_dev_declarations_prefers_legacy_table() {
        let manifest = format!("{MINIMAL}\n[tool.poetry.dev-dependencies]\nblack = \"^23.0\"\n");
        let dir = project_dir(&manifest);
        let project = PoetryProject::load(dir.path(), false).unwrap();
        let dev = project.dependency_declarations(DependencyGroup::Dev);
        assert!(dev.contains_key("black"));
        assert!(!dev.contains_key("pytest"));
    }

    #[test]
    fn test_dev_declarations_absent() {
        let dir = project_dir(
            "[tool.poetry]\nname = \"demo\"\nversion = \"0.1.0\"\ndescription = \"\"\n",
        );
        let project = PoetryProject::load(dir.path(), false).unwrap();
        assert!(project.dependency_declarations(DependencyGroup::Dev).is_empty());
        assert!(project.dependencies().unwrap().is_empty());
    }

    #[test]
    fn test_dependencies_main_then_dev() {
        let dir = project_dir(MINIMAL);
        let project = PoetryProject::load(dir.path(), false).unwrap();
        let deps = project.dependencies().unwrap();
        let names: Vec<&str> = deps.iter().map(Dependency::name).collect();
        assert_eq!(names, vec!["python", "requests", "pytest"]);
        assert!(deps[2].is_dev());
    }
}
