//! Poetry dependency table parser
//!
//! Handles the declaration shapes found under `tool.poetry.dependencies`:
//! - String: `requests = "^2.0"` or `tomli = ">=1.1; python_version < '3.11'"`
//! - Version table: `httpx = { version = "^0.24", extras = ["http2"], python = ">=3.8" }`
//! - Git table: `foo = { git = "https://example.com/x.git", tag = "v1" }`
//! - Array of tables: one entry per platform / interpreter variant

use crate::domain::{Dependency, DependencyGroup};
use crate::error::DependencyError;
use crate::parser::{extract_python_marker, parse_constraint, split_marker};
use toml::{Table, Value};

/// Keys allowed next to `git`
const GIT_KEYS: &[&str] = &["git", "tag", "extras"];

/// Keys allowed next to `version`
const VERSION_KEYS: &[&str] = &["version", "extras", "python"];

/// Parse every declaration of a Poetry dependency table, in declaration order
pub fn parse_dependency_table(
    table: &Table,
    group: DependencyGroup,
) -> Result<Vec<Dependency>, DependencyError> {
    let mut dependencies = Vec::new();
    for (name, value) in table {
        dependencies.extend(parse_poetry_dependency(name, value, group.is_dev())?);
    }
    Ok(dependencies)
}

/// Parse a single declaration, which may expand into several dependencies
pub fn parse_poetry_dependency(
    name: &str,
    value: &Value,
    is_dev: bool,
) -> Result<Vec<Dependency>, DependencyError> {
    match value {
        Value::String(declaration) => Ok(vec![parse_string_declaration(
            name,
            declaration,
            is_dev,
        )?]),
        Value::Array(variants) => variants
            .iter()
            .map(|variant| match variant {
                Value::Table(table) => parse_table_declaration(name, table, is_dev),
                _ => Err(DependencyError::unsupported_shape(name)),
            })
            .collect(),
        Value::Table(table) => Ok(vec![parse_table_declaration(name, table, is_dev)?]),
        _ => Err(DependencyError::unsupported_shape(name)),
    }
}

fn parse_string_declaration(
    name: &str,
    declaration: &str,
    is_dev: bool,
) -> Result<Dependency, DependencyError> {
    let (range, marker) = split_marker(declaration);
    let constraint = parse_constraint(range)
        .map_err(|e| DependencyError::invalid_constraint(name, range, e.message))?;

    let dependency = Dependency::plain(name, constraint, is_dev);
    Ok(match marker.and_then(extract_python_marker) {
        Some(python) => dependency.with_python_marker(python),
        None => dependency,
    })
}

fn parse_table_declaration(
    name: &str,
    table: &Table,
    is_dev: bool,
) -> Result<Dependency, DependencyError> {
    if let Some(git) = table.get("git") {
        check_keys(name, table, GIT_KEYS)?;
        let git_link = git
            .as_str()
            .ok_or_else(|| DependencyError::unsupported_shape(name))?;
        let mut dependency =
            Dependency::git(name, git_link, is_dev).with_extras(extras(name, table)?);
        if let Some(tag) = table.get("tag") {
            let tag = tag
                .as_str()
                .ok_or_else(|| DependencyError::unsupported_shape(name))?;
            dependency = dependency.with_tag(tag);
        }
        return Ok(dependency);
    }

    if let Some(version) = table.get("version") {
        check_keys(name, table, VERSION_KEYS)?;
        let version = version
            .as_str()
            .ok_or_else(|| DependencyError::unsupported_shape(name))?;
        let constraint = parse_constraint(version)
            .map_err(|e| DependencyError::invalid_constraint(name, version, e.message))?;
        let mut dependency =
            Dependency::plain(name, constraint, is_dev).with_extras(extras(name, table)?);
        if let Some(python) = table.get("python") {
            let python = python
                .as_str()
                .ok_or_else(|| DependencyError::unsupported_shape(name))?;
            dependency = dependency.with_python_marker(python.trim());
        }
        return Ok(dependency);
    }

    Err(DependencyError::unsupported_shape(name))
}

/// Fails on the first key outside `allowed`
fn check_keys(name: &str, table: &Table, allowed: &[&str]) -> Result<(), DependencyError> {
    match table.keys().find(|key| !allowed.contains(&key.as_str())) {
        Some(key) => Err(DependencyError::unsupported_key(name, key)),
        None => Ok(()),
    }
}

fn extras(name: &str, table: &Table) -> Result<Vec<String>, DependencyError> {
    let Some(extras) = table.get("extras") else {
        return Ok(Vec::new());
    };
    extras
        .as_array()
        .ok_or_else(|| DependencyError::unsupported_shape(name))?
        .iter()
        .map(|extra| {
            extra
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| DependencyError::unsupported_shape(name))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str, group: DependencyGroup) -> Result<Vec<Dependency>, DependencyError> {
        let table: Table = toml::from_str(content).unwrap();
        parse_dependency_table(&table, group)
    }

    fn specifiers(content: &str) -> Vec<String> {
        parse(content, DependencyGroup::Main)
            .unwrap()
            .iter()
            .map(Dependency::to_specifier)
            .collect()
    }

    #[test]
    fn test_parse_string_declarations() {
        let specs = specifiers(
            r#"
requests = "^2.0"
click = "*"
"#,
        );
        assert_eq!(specs, vec!["requests>=2.0,<3.0", "click"]);
    }

    #[test]
    fn test_parse_string_with_marker() {
        let specs = specifiers(r#"tomli = ">=1.1; python_version < '3.11'""#);
        assert_eq!(specs, vec!["tomli>=1.1; python_version < '3.11'"]);
    }

    #[test]
    fn test_parse_string_with_unrelated_marker() {
        let specs = specifiers(r#"pywin32 = ">=300; sys_platform == 'win32'""#);
        assert_eq!(specs, vec!["pywin32>=300"]);
    }

    #[test]
    fn test_parse_version_table() {
        let specs = specifiers(
            r#"
httpx = { version = "^0.24", extras = ["http2", "brotli"] }
numpy = { version = "^1.24", python = "3.10" }
"#,
        );
        assert_eq!(
            specs,
            vec![
                "httpx[http2,brotli]>=0.24,<0.25",
                "numpy>=1.24,<2.0; python_version '3.10'",
            ]
        );
    }

    #[test]
    fn test_parse_git_table() {
        let specs = specifiers(
            r#"
foo = { git = "https://example.com/x.git", tag = "v1" }
bar = { git = "https://example.com/bar.git", extras = ["cli"] }
"#,
        );
        assert_eq!(
            specs,
            vec![
                "foo @ git+https://example.com/x.git@v1",
                "bar[cli] @ git+https://example.com/bar.git",
            ]
        );
    }

    #[test]
    fn test_parse_array_of_tables() {
        let specs = specifiers(
            r#"
numpy = [
    { version = "^1.21", python = "<3.11" },
    { version = "^1.24", python = ">=3.11" },
]
"#,
        );
        assert_eq!(
            specs,
            vec![
                "numpy>=1.21,<2.0; python_version <'3.11'",
                "numpy>=1.24,<2.0; python_version >='3.11'",
            ]
        );
    }

    #[test]
    fn test_parse_preserves_order() {
        let deps = parse(
            r#"
zeta = "^1.0"
alpha = "^1.0"
mid = "^1.0"
"#,
            DependencyGroup::Main,
        )
        .unwrap();
        let names: Vec<&str> = deps.iter().map(Dependency::name).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_parse_threads_dev_flag() {
        let deps = parse(r#"pytest = "^7.0""#, DependencyGroup::Dev).unwrap();
        assert!(deps[0].is_dev());

        let deps = parse(r#"pytest = "^7.0""#, DependencyGroup::Main).unwrap();
        assert!(!deps[0].is_dev());
    }

    #[test]
    fn test_parse_python_entry() {
        let deps = parse(r#"python = "^3.10""#, DependencyGroup::Main).unwrap();
        assert!(deps[0].is_python());
    }

    #[test]
    fn test_unsupported_key_in_version_table() {
        let err = parse(
            r#"requests = { version = "^2.0", optional = true }"#,
            DependencyGroup::Main,
        )
        .unwrap_err();
        assert_eq!(err, DependencyError::unsupported_key("requests", "optional"));
    }

    #[test]
    fn test_unsupported_key_in_git_table() {
        let err = parse(
            r#"foo = { git = "https://example.com/x.git", branch = "main" }"#,
            DependencyGroup::Main,
        )
        .unwrap_err();
        assert_eq!(err, DependencyError::unsupported_key("foo", "branch"));
    }

    #[test]
    fn test_git_and_version_together() {
        let err = parse(
            r#"foo = { git = "https://example.com/x.git", version = "^1.0" }"#,
            DependencyGroup::Main,
        )
        .unwrap_err();
        assert_eq!(err, DependencyError::unsupported_key("foo", "version"));
    }

    #[test]
    fn test_unsupported_shape() {
        let err = parse(r#"foo = { path = "../foo" }"#, DependencyGroup::Main).unwrap_err();
        assert_eq!(err, DependencyError::unsupported_shape("foo"));

        let err = parse("foo = 1", DependencyGroup::Main).unwrap_err();
        assert_eq!(err, DependencyError::unsupported_shape("foo"));

        let err = parse(r#"foo = ["^1.0"]"#, DependencyGroup::Main).unwrap_err();
        assert_eq!(err, DependencyError::unsupported_shape("foo"));
    }

    #[test]
    fn test_invalid_constraint() {
        let err = parse(r#"foo = "not a version""#, DependencyGroup::Main).unwrap_err();
        assert!(matches!(err, DependencyError::InvalidConstraint { .. }));

        let err = parse(r#"foo = ">=2.0,<1.0""#, DependencyGroup::Main).unwrap_err();
        assert!(err.to_string().contains("matches no version"));
    }

    #[test]
    fn test_constraint_at_segment_limit() {
        let err = parse(r#"foo = "^18446744073709551615""#, DependencyGroup::Main).unwrap_err();
        assert!(matches!(err, DependencyError::InvalidConstraint { .. }));
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_union_specifiers_keep_exclusions() {
        let specs = specifiers(
            r#"
foo = "!=1.2.*"
bar = "<2.0 || >=3.0"
baz = "^1.2,!=1.5"
qux = "^1.0 || ^3.0"
"#,
        );
        assert_eq!(
            specs,
            vec![
                "foo!=1.2.*",
                "bar!=2.*",
                "baz>=1.2,<2.0,!=1.5",
                "qux>=1.0,<4.0,!=2.*",
            ]
        );
    }

    #[test]
    fn test_empty_table() {
        assert!(parse("", DependencyGroup::Dev).unwrap().is_empty());
    }
}
