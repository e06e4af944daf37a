use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::entry::ModuleEntry;
use super::version::{ReleaseRange, SpecVersion};
use crate::core::error::{UniverseError, UniverseResult};

/// Version constraint attached to a module dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "version", rename_all = "snake_case")]
pub enum VersionRequirement {
    Any,
    /// `> 1.2`: specification version at least this.
    AtLeast(SpecVersion),
    /// `= 201001`: exact implementation version.
    Exact(String),
}

/// One clause of `OpenIDE-Module-Module-Dependencies`:
/// `cnb[/release] [> spec | = impl]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub code_name_base: String,
    pub release: Option<ReleaseRange>,
    pub requirement: VersionRequirement,
}

impl Dependency {
    pub fn parse(clause: &str) -> UniverseResult<Self> {
        let clause = clause.trim();
        let (head, requirement) = if let Some((head, version)) = clause.split_once('>') {
            let version = SpecVersion::parse(version)
                .map_err(|_| UniverseError::InvalidDependency(clause.to_string()))?;
            (head, VersionRequirement::AtLeast(version))
        } else if let Some((head, version)) = clause.split_once('=') {
            let version = version.trim();
            if version.is_empty() {
                return Err(UniverseError::InvalidDependency(clause.to_string()));
            }
            (head, VersionRequirement::Exact(version.to_string()))
        } else {
            (clause, VersionRequirement::Any)
        };

        let head = head.trim();
        let (code_name_base, release) = match head.rsplit_once('/') {
            Some((cnb, release)) => {
                let range = ReleaseRange::parse(release)
                    .map_err(|_| UniverseError::InvalidDependency(clause.to_string()))?;
                (cnb, Some(range))
            }
            None => (head, None),
        };

        if !is_code_name_base(code_name_base) {
            return Err(UniverseError::InvalidDependency(clause.to_string()));
        }

        Ok(Self {
            code_name_base: code_name_base.to_string(),
            release,
            requirement,
        })
    }

    /// Parse a comma-separated dependency list.
    pub fn parse_list(value: &str) -> UniverseResult<Vec<Self>> {
        value
            .split(',')
            .map(str::trim)
            .filter(|clause| !clause.is_empty())
            .map(Self::parse)
            .collect()
    }

    /// The versioned specifier, `cnb` or `cnb/release`.
    pub fn specifier(&self) -> String {
        match &self.release {
            Some(range) => format!("{}/{}", self.code_name_base, range),
            None => self.code_name_base.clone(),
        }
    }

    /// Whether `entry` fulfils this dependency.
    ///
    /// Release versions must correspond: the requested range has to
    /// overlap the module's declared range, and a dependency without a
    /// release only matches a module without one.
    pub fn is_satisfied_by(&self, entry: &ModuleEntry) -> bool {
        if entry.code_name_base() != self.code_name_base {
            return false;
        }

        let release_ok = match (&self.release, entry.release()) {
            (Some(wanted), Some(declared)) => wanted.overlaps(&declared),
            (None, None) => true,
            _ => false,
        };
        if !release_ok {
            return false;
        }

        match &self.requirement {
            VersionRequirement::Any => true,
            VersionRequirement::AtLeast(min) => entry
                .specification_version()
                .is_some_and(|spec| spec >= min),
            VersionRequirement::Exact(version) => {
                entry.implementation_version() == Some(version.as_str())
            }
        }
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.requirement {
            VersionRequirement::Any => write!(f, "{}", self.specifier()),
            VersionRequirement::AtLeast(v) => write!(f, "{} > {}", self.specifier(), v),
            VersionRequirement::Exact(v) => write!(f, "{} = {}", self.specifier(), v),
        }
    }
}

fn is_code_name_base(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|segment| {
            !segment.is_empty()
                && !segment.starts_with(|c: char| c.is_ascii_digit())
                && segment.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '$')
        })
}

/// Reduce versioned specifiers (`cnb` or `cnb/release`) to their sorted,
/// deduplicated code-name-bases.
///
/// The text before the last `/` is the base; strings without one pass
/// through unchanged.
pub fn reduce_to_bases<I, S>(specifiers: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    specifiers
        .into_iter()
        .map(|specifier| {
            let specifier = specifier.as_ref();
            match specifier.rfind('/') {
                Some(idx) => specifier[..idx].to_string(),
                None => specifier.to_string(),
            }
        })
        .collect()
}
