//! Poetry manifest loading and parsing
//!
//! This module provides functionality to:
//! - Load and validate a Poetry `pyproject.toml`
//! - Locate the project's module source tree
//! - Parse Poetry dependency tables into [`Dependency`](crate::domain::Dependency) values
//! - Read / write the manifest file

mod dependencies;
mod layout;
mod poetry;
mod writer;

pub use dependencies::{parse_dependency_table, parse_poetry_dependency};
pub use layout::{locate_module, ModuleLayout, SRC_DIR};
pub use poetry::{PoetryMetadata, PoetryProject, MANIFEST_FILENAME};
pub use writer::{find_mentions, read_manifest, write_manifest, LeftoverLine};

/// Lock file written by Poetry, removed after migration
pub const POETRY_LOCK_FILENAME: &str = "poetry.lock";
