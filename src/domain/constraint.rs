//! Version constraints as a normalized union of ranges
//!
//! Every Poetry constraint (`^1.2`, `~1.2.3`, `>=1,<2`, `1.*`, `^1 || ^2`, ...)
//! reduces to a sorted list of disjoint [`VersionRange`]s:
//! - no range at all matches nothing
//! - a single unbounded range matches anything (`*`)
//! - a single range with equal inclusive bounds is an exact version

use super::Version;
use std::cmp::Ordering;
use std::fmt;

/// Interpreter series enumerated when a `requires-python` union is rendered
pub const PYTHON_SERIES: &[&str] = &[
    "2.7", "3.0", "3.1", "3.2", "3.3", "3.4", "3.5", "3.6", "3.7", "3.8", "3.9", "3.10", "3.11",
    "3.12", "3.13",
];

/// A contiguous range of versions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
    pub min: Option<Version>,
    pub max: Option<Version>,
    pub include_min: bool,
    pub include_max: bool,
}

impl VersionRange {
    /// The range matching every version
    pub fn any() -> Self {
        Self {
            min: None,
            max: None,
            include_min: false,
            include_max: false,
        }
    }

    /// `>=min,<max`
    pub fn half_open(min: Version, max: Version) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
            include_min: true,
            include_max: false,
        }
    }

    /// Exactly one version
    pub fn exact(version: Version) -> Self {
        Self {
            min: Some(version.clone()),
            max: Some(version),
            include_min: true,
            include_max: true,
        }
    }

    pub fn at_least(min: Version, inclusive: bool) -> Self {
        Self {
            min: Some(min),
            max: None,
            include_min: inclusive,
            include_max: false,
        }
    }

    pub fn below(max: Version, inclusive: bool) -> Self {
        Self {
            min: None,
            max: Some(max),
            include_min: false,
            include_max: inclusive,
        }
    }

    /// True when both bounds are absent
    pub fn is_any(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    /// Returns the exact version when this range pins one
    pub fn as_exact(&self) -> Option<&Version> {
        match (&self.min, &self.max) {
            (Some(min), Some(max)) if self.include_min && self.include_max && min == max => {
                Some(min)
            }
            _ => None,
        }
    }

    /// True when no version can satisfy the range
    pub fn is_empty(&self) -> bool {
        match (&self.min, &self.max) {
            (Some(min), Some(max)) => match min.cmp(max) {
                Ordering::Greater => true,
                Ordering::Equal => !(self.include_min && self.include_max),
                Ordering::Less => false,
            },
            _ => false,
        }
    }

    /// Intersection of two ranges, `None` when they do not overlap
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        let (min, include_min) = match (&self.min, &other.min) {
            (None, None) => (None, false),
            (Some(a), None) => (Some(a.clone()), self.include_min),
            (None, Some(b)) => (Some(b.clone()), other.include_min),
            (Some(a), Some(b)) => match a.cmp(b) {
                Ordering::Greater => (Some(a.clone()), self.include_min),
                Ordering::Less => (Some(b.clone()), other.include_min),
                Ordering::Equal => (Some(a.clone()), self.include_min && other.include_min),
            },
        };
        let (max, include_max) = match (&self.max, &other.max) {
            (None, None) => (None, false),
            (Some(a), None) => (Some(a.clone()), self.include_max),
            (None, Some(b)) => (Some(b.clone()), other.include_max),
            (Some(a), Some(b)) => match a.cmp(b) {
                Ordering::Less => (Some(a.clone()), self.include_max),
                Ordering::Greater => (Some(b.clone()), other.include_max),
                Ordering::Equal => (Some(a.clone()), self.include_max && other.include_max),
            },
        };
        let range = Self {
            min,
            max,
            include_min,
            include_max,
        };
        (!range.is_empty()).then_some(range)
    }

    /// True when `next` starts inside or right at the end of `self`
    fn touches(&self, next: &Self) -> bool {
        match (&self.max, &next.min) {
            (None, _) | (_, None) => true,
            (Some(max), Some(min)) => match max.cmp(min) {
                Ordering::Greater => true,
                Ordering::Equal => self.include_max || next.include_min,
                Ordering::Less => false,
            },
        }
    }

    /// Compares lower bounds, an absent bound being the smallest
    fn cmp_min(&self, other: &Self) -> Ordering {
        match (&self.min, &other.min) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(a), Some(b)) => a
                .cmp(b)
                .then_with(|| other.include_min.cmp(&self.include_min)),
        }
    }

    /// Compares upper bounds, an absent bound being the largest
    fn cmp_max(&self, other: &Self) -> Ordering {
        match (&self.max, &other.max) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(a), Some(b)) => a.cmp(b).then_with(|| self.include_max.cmp(&other.include_max)),
        }
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_any() {
            return write!(f, "*");
        }
        if let Some(min) = &self.min {
            let op = if self.include_min { ">=" } else { ">" };
            write!(f, "{op}{min}")?;
        }
        if let Some(max) = &self.max {
            if self.min.is_some() {
                write!(f, ",")?;
            }
            let op = if self.include_max { "<=" } else { "<" };
            write!(f, "{op}{max}")?;
        }
        Ok(())
    }
}

/// A version constraint: a sorted union of disjoint ranges
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionConstraint {
    ranges: Vec<VersionRange>,
}

impl VersionConstraint {
    /// Matches every version
    pub fn any() -> Self {
        Self {
            ranges: vec![VersionRange::any()],
        }
    }

    /// Matches nothing
    pub fn empty() -> Self {
        Self { ranges: Vec::new() }
    }

    /// Union of the given ranges, normalized
    pub fn from_ranges(ranges: impl IntoIterator<Item = VersionRange>) -> Self {
        let mut ranges: Vec<_> = ranges.into_iter().filter(|r| !r.is_empty()).collect();
        ranges.sort_by(|a, b| a.cmp_min(b));

        let mut merged: Vec<VersionRange> = Vec::with_capacity(ranges.len());
        for range in ranges {
            match merged.last_mut() {
                Some(last) if last.touches(&range) => {
                    if range.cmp_max(last) == Ordering::Greater {
                        last.max = range.max;
                        last.include_max = range.include_max;
                    }
                }
                _ => merged.push(range),
            }
        }
        Self { ranges: merged }
    }

    pub fn ranges(&self) -> &[VersionRange] {
        &self.ranges
    }

    pub fn is_any(&self) -> bool {
        matches!(self.ranges.as_slice(), [only] if only.is_any())
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// The pinned version, when this constraint is a single exact version
    pub fn as_exact(&self) -> Option<&Version> {
        match self.ranges.as_slice() {
            [only] => only.as_exact(),
            _ => None,
        }
    }

    pub fn intersect(&self, other: &Self) -> Self {
        let mut ranges = Vec::new();
        for a in &self.ranges {
            for b in &other.ranges {
                if let Some(range) = a.intersect(b) {
                    ranges.push(range);
                }
            }
        }
        Self::from_ranges(ranges)
    }

    pub fn union(&self, other: &Self) -> Self {
        Self::from_ranges(self.ranges.iter().chain(other.ranges.iter()).cloned())
    }

    /// True when at least one version satisfies both constraints
    pub fn allows_any(&self, other: &Self) -> bool {
        !self.intersect(other).is_empty()
    }

    /// Everything this constraint does not match
    pub fn complement(&self) -> Self {
        let mut gaps = Vec::new();
        // end of the previous range, and whether the gap after it includes it
        let mut cursor: Option<(Version, bool)> = None;
        for range in &self.ranges {
            if let Some(min) = &range.min {
                gaps.push(VersionRange {
                    min: cursor.as_ref().map(|(v, _)| v.clone()),
                    max: Some(min.clone()),
                    include_min: cursor.as_ref().is_some_and(|(_, inc)| *inc),
                    include_max: !range.include_min,
                });
            }
            match &range.max {
                Some(max) => cursor = Some((max.clone(), !range.include_max)),
                None => return Self::from_ranges(gaps),
            }
        }
        match cursor {
            Some((max, inclusive)) => gaps.push(VersionRange::at_least(max, inclusive)),
            None if self.ranges.is_empty() => gaps.push(VersionRange::any()),
            None => {}
        }
        Self::from_ranges(gaps)
    }

    /// The smallest single range covering this whole constraint
    pub fn hull(&self) -> VersionRange {
        match (self.ranges.first(), self.ranges.last()) {
            (Some(first), Some(last)) => VersionRange {
                min: first.min.clone(),
                max: last.max.clone(),
                include_min: first.include_min,
                include_max: last.include_max,
            },
            _ => VersionRange::any(),
        }
    }

    /// Renders a dependency range in the target schema.
    ///
    /// Exact versions follow their precision (`1.2.3` → `==1.2.3`,
    /// `1.2` → `>=1.2,<1.3`, `1` → `>=1.0,<2.0`). Unions render as their
    /// hull followed by one exclusion per gap (`>=1.0,<4.0,!=2.*`); an
    /// unbounded union keeps only the exclusions. The second value is
    /// `true` when a gap has no spelling and the rendering allows more than
    /// the constraint does.
    pub fn render(&self) -> (String, bool) {
        if let Some(version) = self.as_exact() {
            return (render_exact(version), false);
        }
        match self.ranges.as_slice() {
            [] => ("<empty>".to_string(), false),
            [only] => (only.to_string(), false),
            ranges => {
                let hull = self.hull();
                let mut clauses = Vec::new();
                if !hull.is_any() {
                    clauses.push(hull.to_string());
                }
                let mut widened = false;
                for pair in ranges.windows(2) {
                    match gap_exclusion(&pair[0], &pair[1]) {
                        Some(clause) => clauses.push(clause),
                        None => widened = true,
                    }
                }
                if clauses.is_empty() {
                    ("*".to_string(), true)
                } else {
                    (clauses.join(","), widened)
                }
            }
        }
    }

    /// Renders an interpreter requirement for `requires-python`.
    ///
    /// Unions are spelled out against the known interpreter series:
    /// `>=2.7, !=3.0.*, !=3.1.*`.
    pub fn render_python(&self) -> String {
        if self.ranges.len() < 2 {
            return self.render().0;
        }

        let mut accepted = Vec::new();
        let mut excluded = Vec::new();
        for series in PYTHON_SERIES {
            let Some(version) = Version::parse(series) else {
                continue;
            };
            let Some(next) = version.next_minor() else {
                continue;
            };
            let span = VersionConstraint::from_ranges([VersionRange::half_open(version, next)]);
            if self.allows_any(&span) {
                accepted.push(*series);
            } else {
                excluded.push(format!("!={series}.*"));
            }
        }

        match accepted.first() {
            Some(low) => {
                let mut parts = vec![format!(">={low}")];
                parts.extend(excluded);
                parts.join(", ")
            }
            None => self.hull().to_string(),
        }
    }
}

/// Exact pins only survive with full precision, shorter ones become ranges
fn render_exact(version: &Version) -> String {
    let range = match version.precision() {
        n if n >= 3 => None,
        2 => {
            let floor = Version::from_parts(version.release());
            floor
                .next_minor()
                .map(|next| VersionRange::half_open(floor, next))
        }
        _ => {
            let floor = Version::from_parts(&[version.major(), 0]);
            floor
                .next_breaking()
                .map(|next| VersionRange::half_open(floor, next))
        }
    };
    match range {
        Some(range) => range.to_string(),
        None => format!("=={version}"),
    }
}

/// The exclusion clause for the gap between two consecutive ranges.
///
/// A single missing version becomes `!=v` and a missing `X.*` or `X.Y.*`
/// series becomes that wildcard. Any other gap has no spelling.
fn gap_exclusion(low: &VersionRange, high: &VersionRange) -> Option<String> {
    let start = low.max.as_ref()?;
    let end = high.min.as_ref()?;
    if start == end && !low.include_max && !high.include_min {
        return Some(format!("!={start}"));
    }
    // a series gap spans [floor, next floor)
    if low.include_max || !high.include_min || !start.is_stable() {
        return None;
    }

    let release = start.release();
    let zeros_from = |index: usize| release.iter().skip(index).all(|segment| *segment == 0);
    if zeros_from(1) && start.next_major().as_ref() == Some(end) {
        return Some(format!("!={}.*", start.major()));
    }
    match start.minor() {
        Some(minor) if zeros_from(2) && start.next_minor().as_ref() == Some(end) => {
            Some(format!("!={}.{}.*", start.major(), minor))
        }
        _ => None,
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ranges.is_empty() {
            return write!(f, "<empty>");
        }
        let parts: Vec<String> = self.ranges.iter().map(ToString::to_string).collect();
        write!(f, "{}", parts.join(" || "))
    }
}
