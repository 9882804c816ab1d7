//! poetry2rye - Poetry to Rye project migration library
//!
//! This library rewrites a Poetry-managed `pyproject.toml` into the
//! PEP 621 layout used by Rye:
//! - `[tool.poetry]` metadata becomes `[project]`
//! - Poetry version constraints become PEP 440 specifiers
//! - dev dependencies move to `[tool.rye]`
//! - the build backend switches to hatchling
//!
//! Every migration is preceded by a full backup of the project directory.

pub mod backup;
pub mod cli;
pub mod convert;
pub mod domain;
pub mod error;
pub mod logging;
pub mod manifest;
pub mod migration;
pub mod output;
pub mod parser;
pub mod progress;
