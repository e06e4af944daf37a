use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::core::error::{UniverseError, UniverseResult};

/// Dewey-decimal specification version (`1.2.10`).
///
/// Missing trailing components compare as zero, so `1.0 == 1`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SpecVersion {
    parts: Vec<u32>,
}

impl SpecVersion {
    pub fn parse(raw: &str) -> UniverseResult<Self> {
        let raw = raw.trim();
        let parts = raw
            .split('.')
            .map(|segment| {
                if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                segment.parse::<u32>().ok()
            })
            .collect::<Option<Vec<u32>>>()
            .ok_or_else(|| {
                UniverseError::Manifest(format!("Invalid specification version '{}'", raw))
            })?;
        Ok(Self { parts })
    }

    pub fn parts(&self) -> &[u32] {
        &self.parts
    }
}

impl Ord for SpecVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let max_len = self.parts.len().max(other.parts.len());
        for idx in 0..max_len {
            let a = self.parts.get(idx).copied().unwrap_or(0);
            let b = other.parts.get(idx).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => continue,
                non_eq => return non_eq,
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for SpecVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for SpecVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SpecVersion {}

impl fmt::Display for SpecVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text: Vec<String> = self.parts.iter().map(u32::to_string).collect();
        f.write_str(&text.join("."))
    }
}

impl TryFrom<String> for SpecVersion {
    type Error = UniverseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SpecVersion> for String {
    fn from(value: SpecVersion) -> Self {
        value.to_string()
    }
}

/// Major release version or an inclusive range of them (`1`, `1-2`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReleaseRange {
    pub low: u32,
    pub high: u32,
}

impl ReleaseRange {
    pub fn single(release: u32) -> Self {
        Self {
            low: release,
            high: release,
        }
    }

    pub fn parse(raw: &str) -> UniverseResult<Self> {
        let raw = raw.trim();
        let invalid = || UniverseError::Manifest(format!("Invalid release version '{}'", raw));
        let (low, high) = match raw.split_once('-') {
            Some((low, high)) => (
                low.trim().parse::<u32>().map_err(|_| invalid())?,
                high.trim().parse::<u32>().map_err(|_| invalid())?,
            ),
            None => {
                let single = raw.parse::<u32>().map_err(|_| invalid())?;
                (single, single)
            }
        };
        if low > high {
            return Err(invalid());
        }
        Ok(Self { low, high })
    }

    pub fn contains(&self, release: u32) -> bool {
        (self.low..=self.high).contains(&release)
    }

    pub fn overlaps(&self, other: &ReleaseRange) -> bool {
        self.low <= other.high && other.low <= self.high
    }
}

impl fmt::Display for ReleaseRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.low == self.high {
            write!(f, "{}", self.low)
        } else {
            write!(f, "{}-{}", self.low, self.high)
        }
    }
}
