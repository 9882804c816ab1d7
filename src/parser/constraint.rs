//! Poetry version constraint parser
//!
//! Handles constraint formats:
//! - Wildcard: `*`, `x`, `1.*`, `1.2.*`, `!=1.2.*`
//! - Caret: `^1.2.3` (next breaking version is excluded)
//! - Tilde: `~1.2.3` (Poetry) and `~=1.2.3` (PEP 440 compatible release)
//! - Comparison: `>=1.2.3`, `>1.2.3`, `<=1.2.3`, `<1.2.3`, `!=1.2.3`, `==1.2.3`, `1.2.3`
//! - Intersection: `>=1.0,<2.0` or `>=1.0 <2.0`
//! - Union: `^1.0 || ^2.0` (a single `|` is accepted too)

use crate::domain::{Version, VersionConstraint, VersionRange};
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

static OR_SPLIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*\|\|?\s*").unwrap());
static ANY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^v?[x*](\.[x*])*$").unwrap());
static TILDE_PEP440_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^~=\s*(?P<version>\S+)$").unwrap());
static TILDE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^~\s*(?P<version>\S+)$").unwrap());
static CARET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\^\s*(?P<version>\S+)$").unwrap());
static X_RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<op>!=|==)?\s*v?(?P<major>\d+)(?:\.(?P<minor>\d+))?(?:\.\d+)?(?:\.[xX*])+$")
        .unwrap()
});
static BASIC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<op><>|!=|>=?|<=?|==?)?\s*(?P<version>[^\s<>=!~^]\S*)$").unwrap()
});

/// A constraint string that cannot be translated
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ConstraintError {
    pub message: String,
}

impl ConstraintError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Parse a Poetry constraint expression
///
/// Fails when the expression is not understood or when it allows no
/// version at all (e.g. `>=2,<1`).
pub fn parse_constraint(input: &str) -> Result<VersionConstraint, ConstraintError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ConstraintError::new("empty constraint"));
    }
    if trimmed == "*" {
        return Ok(VersionConstraint::any());
    }

    let mut result = VersionConstraint::empty();
    for group in OR_SPLIT_RE.split(trimmed) {
        let group = group.trim_end_matches(',').trim_end();
        let mut intersection = VersionConstraint::any();
        for part in split_and(group) {
            intersection = intersection.intersect(&parse_single(&part)?);
        }
        result = result.union(&intersection);
    }

    if result.is_empty() {
        return Err(ConstraintError::new("constraint matches no version"));
    }
    Ok(result)
}

/// Splits `>=1.0, <2.0` or `>= 1.0 <2.0` into single constraints,
/// keeping a detached operator together with its version
fn split_and(group: &str) -> Vec<String> {
    let mut parts: Vec<String> = Vec::new();
    let mut pending_operator = String::new();

    for token in group
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
    {
        if token.chars().all(|c| "<>=!~^".contains(c)) {
            pending_operator.push_str(token);
            continue;
        }
        parts.push(format!("{}{}", std::mem::take(&mut pending_operator), token));
    }
    if !pending_operator.is_empty() {
        parts.push(pending_operator);
    }
    parts
}

fn parse_version(text: &str) -> Result<Version, ConstraintError> {
    Version::parse(text).ok_or_else(|| ConstraintError::new(format!("invalid version '{text}'")))
}

/// Upper bound of a bumped range; segments at `u64::MAX` cannot be bumped
fn upper_bound(version: &Version, next: Option<Version>) -> Result<Version, ConstraintError> {
    next.ok_or_else(|| ConstraintError::new(format!("version '{version}' is out of range")))
}

fn single(range: VersionRange) -> VersionConstraint {
    VersionConstraint::from_ranges([range])
}

fn parse_single(constraint: &str) -> Result<VersionConstraint, ConstraintError> {
    if ANY_RE.is_match(constraint) {
        return Ok(VersionConstraint::any());
    }

    // ~= must be tried before ~
    if let Some(caps) = TILDE_PEP440_RE.captures(constraint) {
        let version = parse_version(&caps["version"])?;
        let high = if version.precision() <= 2 {
            version.stable().next_major()
        } else {
            version.stable().next_minor()
        };
        let high = upper_bound(&version, high)?;
        return Ok(single(VersionRange::half_open(version, high)));
    }

    if let Some(caps) = TILDE_RE.captures(constraint) {
        let version = parse_version(&caps["version"])?;
        let high = if version.precision() == 1 {
            version.stable().next_major()
        } else {
            version.stable().next_minor()
        };
        let high = upper_bound(&version, high)?;
        return Ok(single(VersionRange::half_open(version, high)));
    }

    if let Some(caps) = CARET_RE.captures(constraint) {
        let version = parse_version(&caps["version"])?;
        let high = upper_bound(&version, version.next_breaking())?;
        return Ok(single(VersionRange::half_open(version, high)));
    }

    if let Some(caps) = X_RANGE_RE.captures(constraint) {
        let number = |name: &str| caps.name(name).and_then(|m| m.as_str().parse::<u64>().ok());
        let major = number("major").ok_or_else(|| ConstraintError::new("invalid wildcard"))?;
        let range = match number("minor") {
            Some(minor) => {
                let low = Version::from_parts(&[major, minor, 0]);
                let high = upper_bound(&low, low.next_minor())?;
                VersionRange::half_open(low, high)
            }
            None if major == 0 => VersionRange::below(Version::from_parts(&[1, 0, 0]), false),
            None => {
                let low = Version::from_parts(&[major, 0, 0]);
                let high = upper_bound(&low, low.next_major())?;
                VersionRange::half_open(low, high)
            }
        };
        let result = single(range);
        return Ok(match caps.name("op").map(|m| m.as_str()) {
            Some("!=") => result.complement(),
            _ => result,
        });
    }

    if let Some(caps) = BASIC_RE.captures(constraint) {
        let version = parse_version(&caps["version"])?;
        let op = caps.name("op").map(|m| m.as_str()).unwrap_or("==");
        let range = match op {
            "<" => VersionRange::below(version, false),
            "<=" => VersionRange::below(version, true),
            ">" => VersionRange::at_least(version, false),
            ">=" => VersionRange::at_least(version, true),
            "!=" | "<>" => return Ok(single(VersionRange::exact(version)).complement()),
            _ => VersionRange::exact(version),
        };
        return Ok(single(range));
    }

    Err(ConstraintError::new(format!(
        "unrecognized constraint '{constraint}'"
    )))
}
