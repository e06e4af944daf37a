use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::core::error::{UniverseError, UniverseResult};
use crate::core::module::{Dependency, ModuleEntry};

/// Modules of one cluster or platform, keyed by code-name-base.
#[derive(Debug, Clone)]
pub struct ModuleList {
    entries: BTreeMap<String, Arc<ModuleEntry>>,
    /// Originally scanned top-level directory.
    home: Option<PathBuf>,
    /// Entries that lost a code-name-base conflict during the scan.
    shadowed: Vec<Arc<ModuleEntry>>,
    scanned_at: DateTime<Utc>,
}

impl ModuleList {
    pub fn new(entries: BTreeMap<String, Arc<ModuleEntry>>, home: Option<PathBuf>) -> Self {
        Self {
            entries,
            home,
            shadowed: Vec::new(),
            scanned_at: Utc::now(),
        }
    }

    pub fn empty(home: Option<PathBuf>) -> Self {
        Self::new(BTreeMap::new(), home)
    }

    /// Merge lists into one. On a code-name-base conflict the earlier list
    /// wins.
    pub fn merge<'a, I>(lists: I, home: Option<PathBuf>) -> Self
    where
        I: IntoIterator<Item = &'a ModuleList>,
    {
        let mut entries = BTreeMap::new();
        for list in lists {
            for (cnb, entry) in &list.entries {
                entries
                    .entry(cnb.clone())
                    .or_insert_with(|| Arc::clone(entry));
            }
        }
        Self::new(entries, home)
    }

    pub fn with_shadowed(mut self, shadowed: Vec<Arc<ModuleEntry>>) -> Self {
        self.shadowed = shadowed;
        self
    }

    /// Duplicates dropped in favour of an earlier entry with the same
    /// code-name-base. They are not part of [`ModuleList::all_entries`].
    pub fn shadowed_entries(&self) -> &[Arc<ModuleEntry>] {
        &self.shadowed
    }

    /// Add `entry` unless its code-name-base is already known.
    pub fn insert_if_absent(&mut self, entry: ModuleEntry) -> bool {
        if self.entries.contains_key(entry.code_name_base()) {
            return false;
        }
        self.entries
            .insert(entry.code_name_base().to_string(), Arc::new(entry));
        true
    }

    pub fn entry(&self, cnb: &str) -> Option<&Arc<ModuleEntry>> {
        self.entries.get(cnb)
    }

    fn require(&self, cnb: &str) -> UniverseResult<&Arc<ModuleEntry>> {
        self.entry(cnb)
            .ok_or_else(|| UniverseError::ModuleNotFound(cnb.to_string()))
    }

    /// All entries, ordered by code-name-base.
    pub fn all_entries(&self) -> impl Iterator<Item = &Arc<ModuleEntry>> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn home(&self) -> Option<&Path> {
        self.home.as_deref()
    }

    pub fn scanned_at(&self) -> DateTime<Utc> {
        self.scanned_at
    }

    /// Modules declaring `token` in `OpenIDE-Module-Provides`.
    pub fn providers_of(&self, token: &str) -> Vec<&Arc<ModuleEntry>> {
        self.all_entries()
            .filter(|e| e.provided_tokens().contains(token))
            .collect()
    }

    /// Transitive run-time dependencies of `cnb`, excluding itself.
    ///
    /// Dependencies on modules missing from the list are reported but not
    /// followed.
    pub fn runtime_closure(&self, cnb: &str) -> UniverseResult<BTreeSet<String>> {
        let root = self.require(cnb)?;
        let mut closure = BTreeSet::new();
        let mut queue: VecDeque<&Arc<ModuleEntry>> = VecDeque::from([root]);

        while let Some(current) = queue.pop_front() {
            for dep in current.run_dependencies() {
                if dep == cnb || !closure.insert(dep.clone()) {
                    continue;
                }
                if let Some(next) = self.entry(dep) {
                    queue.push_back(next);
                }
            }
        }
        Ok(closure)
    }

    /// Whether `module` needs `other` at run time, directly or transitively.
    pub fn depends_on(&self, module: &str, other: &str) -> UniverseResult<bool> {
        Ok(self.runtime_closure(module)?.contains(other))
    }

    /// Whether `consumer` may use the API of `provider` under its friend
    /// list.
    pub fn can_access(&self, consumer: &str, provider: &str) -> UniverseResult<bool> {
        Ok(self.require(provider)?.is_friend(consumer))
    }

    /// Declared dependencies of `cnb` that no module in the list satisfies.
    pub fn unsatisfied_dependencies(&self, cnb: &str) -> UniverseResult<Vec<Dependency>> {
        let entry = self.require(cnb)?;
        Ok(entry
            .dependencies()
            .iter()
            .filter(|dep| {
                self.entry(&dep.code_name_base)
                    .map_or(true, |target| !dep.is_satisfied_by(target))
            })
            .cloned()
            .collect())
    }
}

/// Short form of a code-name-base used for source directory names.
///
/// `org.netbeans.modules.foo` → `foo`, `org.netbeans.api.bar` → `api.bar`,
/// `org.openide.util` → `openide.util`, `com.sun.x` → `c.s.x`.
pub fn abbreviate(cnb: &str) -> String {
    const SHORT_KINDS: [&str; 5] = ["libs", "lib", "api", "spi", "core"];
    const PREFIXES: [(&str, &str); 5] = [
        ("org.netbeans.", "o.n."),
        ("org.openide.", "openide."),
        ("org.", "o."),
        ("com.sun.", "c.s."),
        ("com.", "c."),
    ];

    let mut name = cnb
        .strip_prefix("org.netbeans.modules.")
        .unwrap_or(cnb)
        .to_string();

    for kind in SHORT_KINDS {
        let prefix = format!("org.netbeans.{}.", kind);
        if let Some(rest) = name.strip_prefix(&prefix) {
            name = format!("{}.{}", kind, rest);
            break;
        }
    }

    for (from, to) in PREFIXES {
        if let Some(rest) = name.strip_prefix(from) {
            name = format!("{}{}", to, rest);
        }
    }
    name
}
