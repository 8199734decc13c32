//! Framework version parsing and ordering.
//!
//! Rails versions are dotted numeric segments (`6.1.4`, sometimes four like
//! `6.1.4.1`). Comparison zero-fills the shorter side, so `6.1` == `6.1.0`
//! and `6.0.3` < `6.0.4` < `6.1`.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use anyhow::{Result, anyhow};

/// Declared version of the host framework being scaffolded against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameworkVersion {
    segments: Vec<u64>,
}

impl FrameworkVersion {
    /// Render with dots replaced by dashes, for use in file names
    /// (`6.1.4` -> `6-1-4`).
    pub fn dashed(&self) -> String {
        self.segments
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join("-")
    }
}

impl FromStr for FrameworkVersion {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(anyhow!("empty framework version"));
        }
        let segments = trimmed
            .split('.')
            .map(|seg| {
                seg.parse::<u64>()
                    .map_err(|_| anyhow!("invalid framework version '{trimmed}'"))
            })
            .collect::<Result<Vec<u64>>>()?;
        Ok(Self { segments })
    }
}

impl fmt::Display for FrameworkVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self
            .segments
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(".");
        write!(f, "{rendered}")
    }
}

impl Ord for FrameworkVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.segments.len().max(other.segments.len());
        for i in 0..len {
            let a = self.segments.get(i).copied().unwrap_or(0);
            let b = other.segments.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for FrameworkVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
