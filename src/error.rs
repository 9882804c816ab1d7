//! Application error types using thiserror
//!
//! Error hierarchy:
//! - ManifestError: Issues with reading or validating pyproject.toml
//! - StructureError: The module source tree does not have the expected layout
//! - DependencyError: A Poetry dependency declaration cannot be translated
//! - IoError: File system operation failures (backup, restore, relocation)
//!
//! Everything in [`AppError`] is a *controlled* error: known bad input that is
//! reported as `error: <message>`. Anything else reaching `main` is a fault.

use std::path::PathBuf;
use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Manifest file related errors
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// Project layout related errors
    #[error(transparent)]
    Structure(#[from] StructureError),

    /// Dependency declaration related errors
    #[error(transparent)]
    Dependency(#[from] DependencyError),

    /// IO related errors
    #[error(transparent)]
    Io(#[from] IoError),
}

/// Errors related to manifest file operations
#[derive(Error, Debug)]
pub enum ManifestError {
    /// Manifest file not found
    #[error("pyproject.toml not found: {path}")]
    NotFound { path: PathBuf },

    /// Failed to read manifest file
    #[error("failed to read manifest file {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write manifest file
    #[error("failed to write manifest file {path}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error
    #[error("failed to parse TOML in {path}: {message}")]
    TomlParseError { path: PathBuf, message: String },

    /// The manifest is already migrated or is not a Poetry manifest
    #[error("unsupported pyproject.toml in {path}: {reason}")]
    UnsupportedSchema { path: PathBuf, reason: String },

    /// A required `[tool.poetry]` field is absent
    #[error("required field 'tool.poetry.{field}' is missing in {path}")]
    MissingField { path: PathBuf, field: String },
}

/// Errors related to the layout of the project's module source tree
#[derive(Error, Debug)]
pub enum StructureError {
    /// `src/` exists but holds no module directory
    #[error("no module directory found in {src}")]
    NoModule { src: PathBuf },

    /// `src/` holds more than one candidate module directory
    #[error("expected exactly one module directory in {src}, found: {}", .found.join(", "))]
    MultipleModules { src: PathBuf, found: Vec<String> },

    /// The module directory derived from the project name does not exist
    #[error("module not found: {path}")]
    ModuleNotFound { path: PathBuf },
}

/// Errors related to Poetry dependency declarations
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DependencyError {
    /// A dependency table contains a key outside its shape's allow-list
    #[error("unsupported key '{key}' in dependency '{dependency}'")]
    UnsupportedKey { dependency: String, key: String },

    /// A dependency declaration matches none of the recognized shapes
    #[error("unsupported declaration for dependency '{dependency}': expected a version string, or a table with 'version' or 'git'")]
    UnsupportedShape { dependency: String },

    /// The version constraint could not be parsed or allows no version
    #[error("invalid version constraint '{constraint}' for dependency '{dependency}': {message}")]
    InvalidConstraint {
        dependency: String,
        constraint: String,
        message: String,
    },
}

/// Errors related to IO operations
#[derive(Error, Debug)]
pub enum IoError {
    /// Directory not found
    #[error("directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// Generic IO error
    #[error("IO error at {path}: {source}")]
    Generic {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AppError {
    /// Recovers a controlled error from an `anyhow` error.
    ///
    /// Returns the original error untouched when it is a fault.
    pub fn from_anyhow(err: anyhow::Error) -> Result<AppError, anyhow::Error> {
        let err = match err.downcast::<AppError>() {
            Ok(e) => return Ok(e),
            Err(err) => err,
        };
        let err = match err.downcast::<ManifestError>() {
            Ok(e) => return Ok(e.into()),
            Err(err) => err,
        };
        let err = match err.downcast::<StructureError>() {
            Ok(e) => return Ok(e.into()),
            Err(err) => err,
        };
        let err = match err.downcast::<DependencyError>() {
            Ok(e) => return Ok(e.into()),
            Err(err) => err,
        };
        match err.downcast::<IoError>() {
            Ok(e) => Ok(e.into()),
            Err(err) => Err(err),
        }
    }
}

impl ManifestError {
    /// Creates a new NotFound error
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        ManifestError::NotFound { path: path.into() }
    }

    /// Creates a new ReadError
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ManifestError::ReadError {
            path: path.into(),
            source,
        }
    }

    /// Creates a new WriteError
    pub fn write_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ManifestError::WriteError {
            path: path.into(),
            source,
        }
    }

    /// Creates a new TomlParseError
    pub fn toml_parse_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ManifestError::TomlParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new UnsupportedSchema error
    pub fn unsupported_schema(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        ManifestError::UnsupportedSchema {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new MissingField error
    pub fn missing_field(path: impl Into<PathBuf>, field: impl Into<String>) -> Self {
        ManifestError::MissingField {
            path: path.into(),
            field: field.into(),
        }
    }
}

impl DependencyError {
    /// Creates a new UnsupportedKey error
    pub fn unsupported_key(dependency: impl Into<String>, key: impl Into<String>) -> Self {
        DependencyError::UnsupportedKey {
            dependency: dependency.into(),
            key: key.into(),
        }
    }

    /// Creates a new UnsupportedShape error
    pub fn unsupported_shape(dependency: impl Into<String>) -> Self {
        DependencyError::UnsupportedShape {
            dependency: dependency.into(),
        }
    }

    /// Creates a new InvalidConstraint error
    pub fn invalid_constraint(
        dependency: impl Into<String>,
        constraint: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        DependencyError::InvalidConstraint {
            dependency: dependency.into(),
            constraint: constraint.into(),
            message: message.into(),
        }
    }
}

impl IoError {
    /// Creates a new DirectoryNotFound error
    pub fn directory_not_found(path: impl Into<PathBuf>) -> Self {
        IoError::DirectoryNotFound { path: path.into() }
    }

    /// Creates a new Generic IO error
    pub fn generic(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        IoError::Generic {
            path: path.into(),
            source,
        }
    }
}
