//! Core domain models for poetry2rye
//!
//! This module contains the fundamental types used throughout the application:
//! - Versions and version constraints (union of ranges)
//! - Dependency declarations and their PEP 508 rendering
//! - Project / module name canonicalization

mod constraint;
mod dependency;
mod naming;
mod version;

pub use constraint::{VersionConstraint, VersionRange, PYTHON_SERIES};
pub use dependency::{
    quote_marker_versions, Dependency, DependencyGroup, GitDependency, PlainDependency,
    PYTHON_DEPENDENCY,
};
pub use naming::{canonicalize_name, module_name};
pub use version::{PreRelease, Version};
