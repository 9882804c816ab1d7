//! PEP 440 style version numbers
//!
//! Only the parts Poetry constraints actually use are modelled:
//! - Release segments: `1`, `1.2`, `1.2.3`, `1.2.3.4`
//! - Pre-releases: `1.0a1`, `1.0b2`, `1.0rc1` (with the usual spelling aliases)
//! - Post and dev releases: `1.0.post1`, `1.0.dev0`

use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)^
        v?
        (?P<release>\d+(?:\.\d+)*)
        (?:[-_.]?(?P<pre_l>alpha|beta|preview|pre|rc|a|b|c)[-_.]?(?P<pre_n>\d+)?)?
        (?:[-_.]?(?P<post_l>post|rev|r)[-_.]?(?P<post_n>\d+)?)?
        (?:[-_.]?(?P<dev_l>dev)[-_.]?(?P<dev_n>\d+)?)?
        $",
    )
    .unwrap()
});

/// Pre-release phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PreRelease {
    Alpha,
    Beta,
    ReleaseCandidate,
}

impl PreRelease {
    fn from_label(label: &str) -> Self {
        match label.to_ascii_lowercase().as_str() {
            "a" | "alpha" => PreRelease::Alpha,
            "b" | "beta" => PreRelease::Beta,
            _ => PreRelease::ReleaseCandidate,
        }
    }
}

/// A version number as written in a constraint
#[derive(Debug, Clone)]
pub struct Version {
    /// Release segments, never empty
    release: Vec<u64>,
    pre: Option<(PreRelease, u64)>,
    post: Option<u64>,
    dev: Option<u64>,
    /// The text this version renders as
    text: String,
}

impl Version {
    /// Parses a version string, returning `None` when it is not a version
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        let caps = VERSION_RE.captures(trimmed)?;

        let release = caps
            .name("release")?
            .as_str()
            .split('.')
            .map(|segment| segment.parse::<u64>().ok())
            .collect::<Option<Vec<_>>>()?;

        let number = |name: &str| {
            caps.name(name)
                .map(|m| m.as_str().parse::<u64>().unwrap_or(0))
                .unwrap_or(0)
        };

        let pre = caps
            .name("pre_l")
            .map(|label| (PreRelease::from_label(label.as_str()), number("pre_n")));
        let post = caps.name("post_l").map(|_| number("post_n"));
        let dev = caps.name("dev_l").map(|_| number("dev_n"));

        Some(Self {
            release,
            pre,
            post,
            dev,
            text: trimmed.trim_start_matches(['v', 'V']).to_string(),
        })
    }

    /// Builds a final release from its segments
    pub fn from_parts(release: &[u64]) -> Self {
        let release = if release.is_empty() {
            vec![0]
        } else {
            release.to_vec()
        };
        let text = release
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(".");
        Self {
            release,
            pre: None,
            post: None,
            dev: None,
            text,
        }
    }

    /// Number of release segments (`3.10` has precision 2)
    pub fn precision(&self) -> usize {
        self.release.len()
    }

    pub fn major(&self) -> u64 {
        self.release[0]
    }

    pub fn minor(&self) -> Option<u64> {
        self.release.get(1).copied()
    }

    pub fn patch(&self) -> Option<u64> {
        self.release.get(2).copied()
    }

    /// Release segments of this version
    pub fn release(&self) -> &[u64] {
        &self.release
    }

    /// The text this version renders as
    pub fn text(&self) -> &str {
        &self.text
    }

    /// True for final releases (post releases count as stable)
    pub fn is_stable(&self) -> bool {
        self.pre.is_none() && self.dev.is_none()
    }

    /// The final release this version belongs to
    pub fn stable(&self) -> Self {
        if self.is_stable() {
            self.clone()
        } else {
            Self::from_parts(&self.release)
        }
    }

    /// First version of the next major series, keeping this version's precision.
    ///
    /// `None` when a release segment would overflow.
    pub fn next_major(&self) -> Option<Self> {
        let boundary = self.with_release(&[self.major()]);
        if self.is_stable() || boundary < *self {
            self.bump(0)
        } else {
            Some(Self::from_parts(&self.release))
        }
    }

    /// First version of the next minor series, keeping this version's precision
    pub fn next_minor(&self) -> Option<Self> {
        if self.minor().is_none() {
            return self.next_major();
        }
        let boundary = self.with_release(&self.release[..2]);
        if self.is_stable() || boundary < *self {
            self.bump(1)
        } else {
            Some(Self::from_parts(&self.release))
        }
    }

    /// Next patch release
    pub fn next_patch(&self) -> Option<Self> {
        if !self.is_stable() {
            return Some(Self::from_parts(&self.release));
        }
        let mut release = self.release.clone();
        release.resize(release.len().max(3), 0);
        release[2] = release[2].checked_add(1)?;
        release.truncate(3);
        Some(Self::from_parts(&release))
    }

    /// The smallest version that breaks compatibility with this one (caret semantics)
    pub fn next_breaking(&self) -> Option<Self> {
        if self.major() > 0 || self.minor().is_none() {
            return self.next_major();
        }
        if self.minor().unwrap_or(0) > 0 || self.patch().is_none() {
            return self.next_minor();
        }
        self.next_patch()
    }

    /// Increments the segment at `index`, zeroing every later segment
    fn bump(&self, index: usize) -> Option<Self> {
        let mut release = self.release.clone();
        release[index] = release[index].checked_add(1)?;
        for segment in release.iter_mut().skip(index + 1) {
            *segment = 0;
        }
        Some(Self::from_parts(&release))
    }

    fn with_release(&self, release: &[u64]) -> Self {
        Self::from_parts(release)
    }

    /// Sort key for the pre/post/dev suffixes
    fn suffix_key(&self) -> (u8, u64, u64, u64) {
        // dev-only releases sort before any pre-release of the same release
        let phase = match (self.pre, self.dev, self.post) {
            (None, Some(_), None) => 0,
            (Some(_), _, _) => 1,
            (None, _, None) => 2,
            (None, _, Some(_)) => 3,
        };
        let pre_rank = self.pre.map(|(p, n)| ((p as u64) << 32) | n).unwrap_or(0);
        let post = self.post.unwrap_or(0);
        let dev = self.dev.map(|d| d + 1).unwrap_or(u64::MAX);
        (phase, pre_rank, post, dev)
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.release.len().max(other.release.len());
        for i in 0..len {
            let a = self.release.get(i).copied().unwrap_or(0);
            let b = other.release.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        self.suffix_key().cmp(&other.suffix_key())
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}
