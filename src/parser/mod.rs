//! Parsers for the strings found inside Poetry dependency declarations
//!
//! This module provides:
//! - Constraint expressions (`^1.2`, `~1.2.3`, `>=1,<2`, `1.*`, `^1 || ^2`)
//! - Environment markers trailing a constraint (`; python_version < '3.11'`)

mod constraint;
mod marker;

pub use constraint::{parse_constraint, ConstraintError};
pub use marker::{extract_python_marker, split_marker, PYTHON_VERSION_MARKER};
