use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::error::{UniverseError, UniverseResult};

/// A package exported by a module.
///
/// Written in a manifest as `com.foo.*` (only `com.foo`) or `com.foo.**`
/// (`com.foo` and every subpackage).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageExport {
    pub package: String,
    pub recursive: bool,
}

impl PackageExport {
    pub fn new(package: impl Into<String>, recursive: bool) -> Self {
        Self {
            package: package.into(),
            recursive,
        }
    }

    /// Parse one `OpenIDE-Module-Public-Packages` item.
    pub fn parse(item: &str) -> UniverseResult<Self> {
        let item = item.trim();
        if let Some(package) = item.strip_suffix(".**") {
            return Self::checked(package, true, item);
        }
        if let Some(package) = item.strip_suffix(".*") {
            return Self::checked(package, false, item);
        }
        Err(UniverseError::Manifest(format!(
            "Public package '{}' must end with .* or .**",
            item
        )))
    }

    fn checked(package: &str, recursive: bool, item: &str) -> UniverseResult<Self> {
        let valid = !package.is_empty()
            && package
                .split('.')
                .all(|segment| !segment.is_empty() && !segment.contains(char::is_whitespace));
        if !valid {
            return Err(UniverseError::Manifest(format!(
                "Malformed public package '{}'",
                item
            )));
        }
        Ok(Self::new(package, recursive))
    }

    /// Parse the whole attribute value. `-` or an empty value exports nothing.
    pub fn parse_list(value: &str) -> UniverseResult<Vec<Self>> {
        let value = value.trim();
        if value.is_empty() || value == "-" {
            return Ok(Vec::new());
        }
        value
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(Self::parse)
            .collect()
    }

    /// Whether classes directly inside `package` are covered by this export.
    pub fn matches_package(&self, package: &str) -> bool {
        if package == self.package {
            return true;
        }
        self.recursive
            && package
                .strip_prefix(self.package.as_str())
                .is_some_and(|rest| rest.starts_with('.'))
    }

    /// Whether a dotted class name lies in an exported package.
    pub fn matches_class(&self, class_name: &str) -> bool {
        let package = class_name.rsplit_once('.').map_or("", |(pkg, _)| pkg);
        self.matches_package(package)
    }
}

impl fmt::Display for PackageExport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.recursive {
            write!(f, "{}.**", self.package)
        } else {
            write!(f, "{}.*", self.package)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exports() -> Vec<PackageExport> {
        vec![
            PackageExport::new("com.foo", false),
            PackageExport::new("com.bar", true),
        ]
    }

    fn exported(class_name: &str) -> bool {
        exports().iter().any(|e| e.matches_class(class_name))
    }

    #[test]
    fn non_recursive_export_matches_exact_package_only() {
        assert!(exported("com.foo.Baz"));
        assert!(!exported("com.foo.sub.Baz"));
    }

    #[test]
    fn recursive_export_matches_subpackages() {
        assert!(exported("com.bar.Baz"));
        assert!(exported("com.bar.sub.Baz"));
        assert!(exported("com.bar.sub.deeper.Baz"));
    }

    #[test]
    fn prefix_without_dot_boundary_is_not_a_subpackage() {
        assert!(!exported("com.barista.Baz"));
        assert!(!exported("com.food.Baz"));
    }

    #[test]
    fn parse_list_reads_both_forms() {
        let parsed = PackageExport::parse_list("com.foo.*, com.bar.**").unwrap();
        assert_eq!(parsed, exports());
    }

    #[test]
    fn dash_means_no_exports() {
        assert!(PackageExport::parse_list("-").unwrap().is_empty());
        assert!(PackageExport::parse_list("  ").unwrap().is_empty());
    }

    #[test]
    fn malformed_items_are_rejected() {
        assert!(PackageExport::parse("com.foo").is_err());
        assert!(PackageExport::parse(".*").is_err());
        assert!(PackageExport::parse("com..foo.*").is_err());
    }

    #[test]
    fn display_round_trips_manifest_syntax() {
        assert_eq!(PackageExport::new("org.x", true).to_string(), "org.x.**");
        assert_eq!(PackageExport::new("org.x", false).to_string(), "org.x.*");
    }
}
