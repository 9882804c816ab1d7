//! Document reassembly
//!
//! Builds the Rye flavoured `pyproject.toml` from a loaded Poetry project:
//! - `[project]` from the `[tool.poetry]` metadata and rendered dependencies
//! - `[project.urls]` from `homepage` / `repository` / `documentation`
//! - every other section copied with its comments and formatting, except
//!   `[tool.poetry]` (dropped) and `[build-system]` (switched to hatchling)
//! - `[tool.rye]` and `[tool.hatch.metadata]` appended under `[tool]`

use crate::domain::Dependency;
use crate::error::ManifestError;
use crate::manifest::PoetryProject;
use anyhow::{ensure, Result};
use serde::Serialize;
use toml_edit::{value, Array, ArrayOfTables, DocumentMut, InlineTable, Item, Table, TableLike};

/// Substring identifying the legacy build backend in `build-system.requires`
const LEGACY_BUILD_REQUIREMENT: &str = "poetry";
const HATCHLING_REQUIREMENT: &str = "hatchling";
const HATCHLING_BUILD_BACKEND: &str = "hatchling.build";

/// `[tool.poetry]` keys copied into `[project]` untouched
const COPIED_METADATA: &[&str] = &["readme", "keywords", "classifiers"];

/// `[tool.poetry]` url keys and their `[project.urls]` labels
const URL_LABELS: &[(&str, &str)] = &[
    ("homepage", "Homepage"),
    ("repository", "Repository"),
    ("documentation", "Documentation"),
];

/// Options affecting the generated document
#[derive(Debug, Clone, Copy, Default)]
pub struct ConvertOptions {
    /// Emit a virtual (never built or installed) Rye project
    pub virtual_project: bool,
}

/// An author or maintainer entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    pub name: String,
    pub email: String,
}

/// Split a Poetry `"Name <email>"` entry.
///
/// The entry must consist of exactly two whitespace separated tokens; any
/// other shape is a fault rather than a reportable error.
pub fn parse_person(raw: &str) -> Result<Person> {
    let tokens: Vec<&str> = raw.split_whitespace().collect();
    ensure!(
        tokens.len() == 2,
        "malformed author/maintainer entry '{raw}': expected exactly 'Name <email>'"
    );
    let email = tokens[1];
    let email = email
        .strip_prefix('<')
        .and_then(|e| e.strip_suffix('>'))
        .unwrap_or(email);
    Ok(Person {
        name: tokens[0].to_string(),
        email: email.to_string(),
    })
}

/// Dependencies rendered to specifier strings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderedDependencies {
    /// `requires-python`, from the `python` entry
    pub requires_python: Option<String>,
    pub dependencies: Vec<String>,
    pub dev_dependencies: Vec<String>,
}

impl RenderedDependencies {
    /// Render parsed dependencies, splitting out the interpreter requirement
    pub fn from_dependencies(dependencies: &[Dependency]) -> Self {
        let mut rendered = Self::default();
        for dependency in dependencies {
            match dependency {
                Dependency::Plain(python) if dependency.is_python() => {
                    // python = "*" constrains nothing, so requires-python is omitted
                    if !python.constraint.is_any() {
                        rendered.requires_python = Some(python.constraint.render_python());
                    }
                }
                _ if dependency.is_dev() => {
                    rendered.dev_dependencies.push(dependency.to_specifier());
                }
                _ => rendered.dependencies.push(dependency.to_specifier()),
            }
        }
        rendered
    }
}

/// Assemble the migrated manifest text
pub fn convert_manifest(
    project: &PoetryProject,
    rendered: &RenderedDependencies,
    options: ConvertOptions,
) -> Result<String> {
    let source: DocumentMut = project.content().parse().map_err(|e: toml_edit::TomlError| {
        ManifestError::toml_parse_error(project.manifest_path(), e.to_string())
    })?;
    let poetry = source
        .get("tool")
        .and_then(|tool| tool.get("poetry"))
        .and_then(Item::as_table_like)
        .ok_or_else(|| {
            ManifestError::unsupported_schema(
                project.manifest_path(),
                "no [tool.poetry] section found",
            )
        })?;

    let mut document = DocumentMut::new();
    document.insert("project", Item::Table(project_table(project, poetry, rendered)?));

    let mut tool_written = false;
    for (key, item) in source.iter() {
        let copied = match (key, item) {
            ("project", _) => continue,
            ("tool", Item::Table(tool)) => {
                tool_written = true;
                Item::Table(tool_table(Some(tool), rendered, options))
            }
            ("build-system", _) if options.virtual_project => continue,
            ("build-system", Item::Table(build)) => Item::Table(build_system_table(build)),
            _ => copy_item(item),
        };
        document.insert(key, separated(copied));
    }
    if !tool_written {
        document.insert("tool", Item::Table(tool_table(None, rendered, options)));
    }
    document.set_trailing(source.trailing().clone());

    Ok(document.to_string())
}

fn project_table(
    project: &PoetryProject,
    poetry: &dyn TableLike,
    rendered: &RenderedDependencies,
) -> Result<Table> {
    let metadata = project.metadata();
    let mut table = Table::new();

    table.insert("name", value(project.name()));
    table.insert("version", value(metadata.version.as_deref().unwrap_or_default()));
    table.insert(
        "description",
        value(metadata.description.as_deref().unwrap_or_default()),
    );
    if !metadata.authors.is_empty() {
        table.insert("authors", value(people_array(&metadata.authors)?));
    }
    if !metadata.maintainers.is_empty() {
        table.insert("maintainers", value(people_array(&metadata.maintainers)?));
    }
    for key in COPIED_METADATA {
        if let Some(original) = poetry.get(key).and_then(Item::as_value) {
            let mut copied = original.clone();
            copied.decor_mut().clear();
            table.insert(key, Item::Value(copied));
        }
    }
    table.insert("dependencies", value(specifier_array(&rendered.dependencies)));
    if let Some(requires_python) = &rendered.requires_python {
        table.insert("requires-python", value(requires_python.as_str()));
    }

    let urls = [
        metadata.homepage.as_deref(),
        metadata.repository.as_deref(),
        metadata.documentation.as_deref(),
    ];
    let mut urls_table = Table::new();
    for ((_, label), url) in URL_LABELS.iter().zip(urls) {
        if let Some(url) = url {
            urls_table.insert(label, value(url));
        }
    }
    if !urls_table.is_empty() {
        table.insert("urls", Item::Table(urls_table));
    }

    Ok(table)
}

/// Array of `{ name = ..., email = ... }` inline tables
fn people_array(entries: &[String]) -> Result<Array> {
    let mut array = Array::new();
    for entry in entries {
        let person = parse_person(entry)?;
        let mut inline = InlineTable::new();
        inline.insert("name", person.name.into());
        inline.insert("email", person.email.into());
        array.push(inline);
    }
    Ok(array)
}

/// One specifier per line
fn specifier_array(specifiers: &[String]) -> Array {
    let mut array: Array = specifiers.iter().map(String::as_str).collect();
    for specifier in array.iter_mut() {
        specifier.decor_mut().set_prefix("\n    ");
    }
    if !array.is_empty() {
        array.set_trailing_comma(true);
        array.set_trailing("\n");
    }
    array
}

fn tool_table(
    original: Option<&Table>,
    rendered: &RenderedDependencies,
    options: ConvertOptions,
) -> Table {
    let mut tool = match original {
        Some(original) => copy_table(original, &["poetry"]),
        None => {
            let mut tool = Table::new();
            tool.set_implicit(true);
            tool
        }
    };

    let mut rye = Table::new();
    rye.insert("managed", value(true));
    if options.virtual_project {
        rye.insert("virtual", value(true));
    }
    if !rendered.dev_dependencies.is_empty() {
        rye.insert(
            "dev-dependencies",
            value(specifier_array(&rendered.dev_dependencies)),
        );
    }
    tool.insert("rye", Item::Table(rye));

    if !options.virtual_project {
        let mut metadata = Table::new();
        metadata.insert("allow-direct-references", value(true));
        let mut hatch = Table::new();
        hatch.set_implicit(true);
        hatch.insert("metadata", Item::Table(metadata));
        tool.insert("hatch", Item::Table(hatch));
    }

    tool
}

fn build_system_table(original: &Table) -> Table {
    let mut build = copy_table(original, &[]);

    let mut requires: Array = original
        .get("requires")
        .and_then(Item::as_array)
        .map(|requires| {
            requires
                .iter()
                .filter(|r| !r.as_str().is_some_and(|s| s.contains(LEGACY_BUILD_REQUIREMENT)))
                .map(|r| {
                    let mut r = r.clone();
                    r.decor_mut().clear();
                    r
                })
                .collect()
        })
        .unwrap_or_default();
    requires.push(HATCHLING_REQUIREMENT);

    build.insert("requires", value(requires));
    build.insert("build-backend", value(HATCHLING_BUILD_BACKEND));
    build
}

/// Deep copy of an item; tables are rebuilt so they render in insertion order
fn copy_item(item: &Item) -> Item {
    match item {
        Item::Table(table) => Item::Table(copy_table(table, &[])),
        Item::ArrayOfTables(tables) => {
            let mut copy = ArrayOfTables::new();
            for table in tables.iter() {
                copy.push(copy_table(table, &[]));
            }
            Item::ArrayOfTables(copy)
        }
        other => other.clone(),
    }
}

/// Copy a table with its decor and key formatting, leaving out `skip`
fn copy_table(table: &Table, skip: &[&str]) -> Table {
    let mut copy = Table::new();
    copy.set_implicit(table.is_implicit());
    copy.set_dotted(table.is_dotted());
    *copy.decor_mut() = table.decor().clone();

    for (key, item) in table.iter() {
        if skip.contains(&key) {
            continue;
        }
        if let Some((formatted_key, _)) = table.get_key_value(key) {
            copy.insert_formatted(formatted_key, copy_item(item));
        }
    }
    copy
}

/// Top-level tables that used to open the file get a blank line before them
fn separated(item: Item) -> Item {
    match item {
        Item::Table(mut table) if !table.is_implicit() => {
            let has_prefix = table
                .decor()
                .prefix()
                .and_then(|prefix| prefix.as_str())
                .is_some_and(|prefix| !prefix.is_empty());
            if !has_prefix {
                table.decor_mut().set_prefix("\n");
            }
            Item::Table(table)
        }
        other => other,
    }
}
