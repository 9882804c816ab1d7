//! Dependency information structures
//!
//! A Poetry declaration becomes either a [`PlainDependency`] (a version
//! constraint, possibly restricted to some interpreter versions) or a
//! [`GitDependency`]. Both render to a single PEP 508 specifier string.

use super::VersionConstraint;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Name of the pseudo-dependency that carries the interpreter requirement
pub const PYTHON_DEPENDENCY: &str = "python";

static MARKER_VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(\.\d+)?").unwrap());

/// Which dependency table a declaration comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyGroup {
    /// `tool.poetry.dependencies`
    Main,
    /// `tool.poetry.dev-dependencies` or `tool.poetry.group.dev.dependencies`
    Dev,
}

impl DependencyGroup {
    pub fn is_dev(&self) -> bool {
        matches!(self, DependencyGroup::Dev)
    }
}

impl fmt::Display for DependencyGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DependencyGroup::Main => write!(f, "main"),
            DependencyGroup::Dev => write!(f, "dev"),
        }
    }
}

/// A registry dependency with a version constraint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlainDependency {
    pub name: String,
    pub extras: Vec<String>,
    pub is_dev: bool,
    pub constraint: VersionConstraint,
    /// Interpreter-version predicate, e.g. `>=3.8` or `3.10`
    pub python_marker: Option<String>,
}

/// A dependency fetched from a git repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitDependency {
    pub name: String,
    pub extras: Vec<String>,
    pub is_dev: bool,
    pub git_link: String,
    pub tag: Option<String>,
}

/// A parsed Poetry dependency declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dependency {
    Plain(PlainDependency),
    Git(GitDependency),
}

impl Dependency {
    /// Creates a plain dependency without extras or marker
    pub fn plain(name: impl Into<String>, constraint: VersionConstraint, is_dev: bool) -> Self {
        Dependency::Plain(PlainDependency {
            name: name.into(),
            extras: Vec::new(),
            is_dev,
            constraint,
            python_marker: None,
        })
    }

    /// Creates a git dependency without extras or tag
    pub fn git(name: impl Into<String>, git_link: impl Into<String>, is_dev: bool) -> Self {
        Dependency::Git(GitDependency {
            name: name.into(),
            extras: Vec::new(),
            is_dev,
            git_link: git_link.into(),
            tag: None,
        })
    }

    /// Sets the extras (builder pattern)
    pub fn with_extras(mut self, extras: Vec<String>) -> Self {
        match &mut self {
            Dependency::Plain(dep) => dep.extras = extras,
            Dependency::Git(dep) => dep.extras = extras,
        }
        self
    }

    /// Sets the interpreter marker; ignored for git dependencies
    pub fn with_python_marker(mut self, marker: impl Into<String>) -> Self {
        if let Dependency::Plain(dep) = &mut self {
            dep.python_marker = Some(marker.into());
        }
        self
    }

    /// Sets the git tag; ignored for plain dependencies
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        if let Dependency::Git(dep) = &mut self {
            dep.tag = Some(tag.into());
        }
        self
    }

    pub fn name(&self) -> &str {
        match self {
            Dependency::Plain(dep) => &dep.name,
            Dependency::Git(dep) => &dep.name,
        }
    }

    pub fn extras(&self) -> &[String] {
        match self {
            Dependency::Plain(dep) => &dep.extras,
            Dependency::Git(dep) => &dep.extras,
        }
    }

    pub fn is_dev(&self) -> bool {
        match self {
            Dependency::Plain(dep) => dep.is_dev,
            Dependency::Git(dep) => dep.is_dev,
        }
    }

    /// True for the `python` entry, which is the interpreter requirement
    pub fn is_python(&self) -> bool {
        matches!(self, Dependency::Plain(dep) if dep.name == PYTHON_DEPENDENCY)
    }

    /// Renders the PEP 508 specifier, e.g. `httpx[http2]>=0.24,<0.25; python_version >='3.8'`
    pub fn to_specifier(&self) -> String {
        let mut specifier = base_name(self.name(), self.extras());
        match self {
            Dependency::Plain(dep) => {
                if dep.constraint.is_any() {
                    return specifier;
                }
                let (range, widened) = dep.constraint.render();
                if widened {
                    tracing::warn!(
                        dependency = %dep.name,
                        constraint = %dep.constraint,
                        rendered = %range,
                        "union constraint widened, a gap has no specifier spelling"
                    );
                }
                if range != "*" {
                    specifier.push_str(&range);
                }
                if let Some(marker) = &dep.python_marker {
                    specifier.push_str("; python_version ");
                    specifier.push_str(&quote_marker_versions(marker));
                }
            }
            Dependency::Git(dep) => {
                specifier.push_str(" @ git+");
                specifier.push_str(&dep.git_link);
                if let Some(tag) = &dep.tag {
                    specifier.push('@');
                    specifier.push_str(tag);
                }
            }
        }
        specifier
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_specifier())
    }
}

/// `name` or `name[e1,e2]`
fn base_name(name: &str, extras: &[String]) -> String {
    if extras.is_empty() {
        name.to_string()
    } else {
        format!("{}[{}]", name, extras.join(","))
    }
}

/// Wraps every `X` / `X.Y` version token of a marker in single quotes
pub fn quote_marker_versions(marker: &str) -> String {
    MARKER_VERSION_RE
        .replace_all(marker, |caps: &regex::Captures<'_>| format!("'{}'", &caps[0]))
        .into_owned()
}
