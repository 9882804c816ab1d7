//! Environment marker extraction
//!
//! Poetry allows a marker after the constraint in the string shape:
//! `tomli = ">=1.1; python_version < '3.11'"`. Only the interpreter-version
//! predicate is carried over to the rendered specifier.

/// Marker variable holding the interpreter version
pub const PYTHON_VERSION_MARKER: &str = "python_version";

/// Splits `"<range>; <marker>"` into the range and the optional marker text
pub fn split_marker(declaration: &str) -> (&str, Option<&str>) {
    match declaration.split_once(';') {
        Some((range, marker)) => (range.trim(), Some(marker.trim())),
        None => (declaration.trim(), None),
    }
}

/// Extracts the predicate that follows `python_version` in a marker segment.
///
/// Quotes are stripped and surrounding whitespace trimmed, so
/// `python_version < '3.11'` yields `< 3.11`. Returns `None` when the segment
/// does not mention the interpreter version or nothing follows it.
pub fn extract_python_marker(segment: &str) -> Option<String> {
    let (_, predicate) = segment.split_once(PYTHON_VERSION_MARKER)?;
    let predicate: String = predicate
        .chars()
        .filter(|c| *c != '\'' && *c != '"')
        .collect();
    let predicate = predicate.trim();
    (!predicate.is_empty()).then(|| predicate.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_marker() {
        assert_eq!(split_marker("^2.0"), ("^2.0", None));
        assert_eq!(
            split_marker(">=1.1 ; python_version < '3.11'"),
            (">=1.1", Some("python_version < '3.11'"))
        );
    }

    #[test]
    fn test_extract_python_marker() {
        assert_eq!(
            extract_python_marker("python_version < '3.11'"),
            Some("< 3.11".to_string())
        );
        assert_eq!(
            extract_python_marker("python_version >= \"3.8\""),
            Some(">= 3.8".to_string())
        );
    }

    #[test]
    fn test_extract_python_marker_other_markers() {
        assert_eq!(extract_python_marker("sys_platform == 'win32'"), None);
        assert_eq!(extract_python_marker("python_version"), None);
    }
}
