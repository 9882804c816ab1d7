//! Manifest file reading and writing
//!
//! This module provides:
//! - Whole-file read / write with manifest-specific errors
//! - A scan of the rewritten manifest for leftover mentions of a tool

use crate::error::ManifestError;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// A line of the rewritten manifest that still mentions the legacy tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeftoverLine {
    /// 1-based line number
    pub line: usize,
    /// Line content without the line terminator
    pub content: String,
}

/// Read a manifest file content safely
pub fn read_manifest(path: &Path) -> Result<String, ManifestError> {
    fs::read_to_string(path).map_err(|e| ManifestError::read_error(path, e))
}

/// Write content to a manifest file, replacing it
pub fn write_manifest(path: &Path, content: &str) -> Result<(), ManifestError> {
    fs::write(path, content).map_err(|e| ManifestError::write_error(path, e))
}

/// Lines of `content` containing `needle`
pub fn find_mentions(content: &str, needle: &str) -> Vec<LeftoverLine> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| line.contains(needle))
        .map(|(index, line)| LeftoverLine {
            line: index + 1,
            content: line.to_string(),
        })
        .collect()
}
