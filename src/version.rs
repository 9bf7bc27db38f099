//! Version identifiers.
//!
//! # Format
//! ```text
//! <release>[-<pre-release>]
//! release      = digits ("." digits)*        e.g. 9.10, 10.0.1
//! pre-release  = identifiers split on '.'/'-' e.g. SNAPSHOT, rc-1, milestone-2
//! ```
//!
//! # Ordering
//! - Release parts compare numerically, missing parts count as zero (`9.0 == 9.0.0`)
//! - A pre-release sorts immediately before its release (`10.0-rc-1 < 10.0`)
//! - Pre-release identifiers: numeric < alphanumeric, numeric by value, others by ASCII

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A version string that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid version '{input}': {reason}")]
pub struct VersionParseError {
    pub input: String,
    pub reason: &'static str,
}

impl VersionParseError {
    fn new(input: &str, reason: &'static str) -> Self {
        Self {
            input: input.to_string(),
            reason,
        }
    }
}

/// One dot/dash separated piece of a pre-release tag.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Identifier {
    Numeric(u64),
    Alpha(String),
}

impl Ord for Identifier {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Identifier::Numeric(a), Identifier::Numeric(b)) => a.cmp(b),
            (Identifier::Numeric(_), Identifier::Alpha(_)) => Ordering::Less,
            (Identifier::Alpha(_), Identifier::Numeric(_)) => Ordering::Greater,
            (Identifier::Alpha(a), Identifier::Alpha(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for Identifier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A parsed version identifier such as `9.10`, `10.0.1` or `11.2-SNAPSHOT`.
#[derive(Debug, Clone)]
pub struct Version {
    release: Vec<u64>,
    pre: Vec<Identifier>,
    raw: String,
}

impl Version {
    pub fn parse(input: &str) -> Result<Self, VersionParseError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(VersionParseError::new(input, "empty version"));
        }

        let (release_part, pre_part) = match trimmed.split_once('-') {
            Some((release, pre)) => (release, Some(pre)),
            None => (trimmed, None),
        };

        let release = release_part
            .split('.')
            .map(|part| {
                if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(VersionParseError::new(input, "release parts must be numeric"));
                }
                part.parse::<u64>()
                    .map_err(|_| VersionParseError::new(input, "release part out of range"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let pre = match pre_part {
            None => Vec::new(),
            Some(tag) => tag
                .split(['.', '-'])
                .map(|ident| {
                    if ident.is_empty() {
                        return Err(VersionParseError::new(input, "empty pre-release identifier"));
                    }
                    if !ident.bytes().all(|b| b.is_ascii_alphanumeric()) {
                        return Err(VersionParseError::new(
                            input,
                            "pre-release identifiers must be alphanumeric",
                        ));
                    }
                    Ok(match ident.parse::<u64>() {
                        Ok(n) if ident.bytes().all(|b| b.is_ascii_digit()) => Identifier::Numeric(n),
                        _ => Identifier::Alpha(ident.to_string()),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
        };

        Ok(Self {
            release,
            pre,
            raw: trimmed.to_string(),
        })
    }

    /// Numeric release components, as written.
    pub fn release(&self) -> &[u64] {
        &self.release
    }

    pub fn is_prerelease(&self) -> bool {
        !self.pre.is_empty()
    }

    /// Compare only the release components, ignoring any pre-release tag.
    pub fn cmp_release(&self, other: &Self) -> Ordering {
        let len = self.release.len().max(other.release.len());
        (0..len)
            .map(|i| {
                let a = self.release.get(i).copied().unwrap_or(0);
                let b = other.release.get(i).copied().unwrap_or(0);
                a.cmp(&b)
            })
            .find(|ord| ord.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp_release(other).then_with(|| {
            match (self.pre.is_empty(), other.pre.is_empty()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => self.pre.cmp(&other.pre),
            }
        })
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl FromStr for Version {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
