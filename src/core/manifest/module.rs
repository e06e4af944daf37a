use std::collections::BTreeSet;

use tracing::warn;

use super::attributes::Manifest;
use crate::core::error::{UniverseError, UniverseResult};
use crate::core::module::{Dependency, PackageExport, ReleaseRange, SpecVersion};

pub const ATTR_MODULE: &str = "OpenIDE-Module";
pub const ATTR_SPECIFICATION_VERSION: &str = "OpenIDE-Module-Specification-Version";
pub const ATTR_IMPLEMENTATION_VERSION: &str = "OpenIDE-Module-Implementation-Version";
pub const ATTR_PROVIDES: &str = "OpenIDE-Module-Provides";
pub const ATTR_REQUIRES: &str = "OpenIDE-Module-Requires";
pub const ATTR_NEEDS: &str = "OpenIDE-Module-Needs";
pub const ATTR_PUBLIC_PACKAGES: &str = "OpenIDE-Module-Public-Packages";
pub const ATTR_FRIENDS: &str = "OpenIDE-Module-Friends";
pub const ATTR_DEPRECATED: &str = "OpenIDE-Module-Deprecated";
pub const ATTR_MODULE_DEPENDENCIES: &str = "OpenIDE-Module-Module-Dependencies";
pub const ATTR_LOCALIZING_BUNDLE: &str = "OpenIDE-Module-Localizing-Bundle";
pub const ATTR_CLASS_PATH: &str = "Class-Path";

/// Module metadata read from the `OpenIDE-Module-*` attributes of a JAR
/// manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleManifest {
    pub code_name_base: String,
    /// Release after the `/` of `OpenIDE-Module`, a single major release
    /// or a range such as `1-2`.
    pub release: Option<ReleaseRange>,
    pub specification_version: Option<SpecVersion>,
    pub implementation_version: Option<String>,
    pub provided_tokens: BTreeSet<String>,
    pub required_tokens: BTreeSet<String>,
    pub public_packages: Vec<PackageExport>,
    /// `None` when the module does not restrict its API to friends.
    pub friends: Option<BTreeSet<String>>,
    pub deprecated: bool,
    /// Clauses of `OpenIDE-Module-Module-Dependencies` that parsed.
    pub dependencies: Vec<Dependency>,
    /// Specifier of every clause as written (`cnb` or `cnb/release`),
    /// including clauses that did not parse.
    pub dependency_specifiers: Vec<String>,
    pub localizing_bundle: Option<String>,
    /// Extension JARs, relative to the directory of the module JAR.
    pub class_path: Vec<String>,
}

fn token_set(value: Option<&str>) -> BTreeSet<String> {
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

impl ModuleManifest {
    /// Interpret a manifest. Returns `Ok(None)` when it does not describe a
    /// module (no `OpenIDE-Module` attribute).
    pub fn from_manifest(manifest: &Manifest) -> UniverseResult<Option<Self>> {
        let Some(module) = manifest.get_non_empty(ATTR_MODULE) else {
            return Ok(None);
        };

        let (code_name_base, release) = match module.split_once('/') {
            Some((cnb, release)) => {
                let release = ReleaseRange::parse(release).map_err(|_| {
                    UniverseError::Manifest(format!("Invalid {} value '{}'", ATTR_MODULE, module))
                })?;
                (cnb.trim().to_string(), Some(release))
            }
            None => (module.to_string(), None),
        };

        let specification_version = manifest
            .get_non_empty(ATTR_SPECIFICATION_VERSION)
            .map(SpecVersion::parse)
            .transpose()?;

        let mut required_tokens = token_set(manifest.get(ATTR_REQUIRES));
        required_tokens.extend(token_set(manifest.get(ATTR_NEEDS)));

        let public_packages = manifest
            .get(ATTR_PUBLIC_PACKAGES)
            .map(PackageExport::parse_list)
            .transpose()?
            .unwrap_or_default();

        let friends = manifest.get(ATTR_FRIENDS).map(|v| token_set(Some(v)));

        let deprecated = manifest
            .get_non_empty(ATTR_DEPRECATED)
            .is_some_and(|v| v.eq_ignore_ascii_case("true"));

        let (dependencies, dependency_specifiers) =
            parse_dependencies(&code_name_base, manifest.get(ATTR_MODULE_DEPENDENCIES));

        let class_path = manifest
            .get(ATTR_CLASS_PATH)
            .map(|cp| cp.split_whitespace().map(String::from).collect())
            .unwrap_or_default();

        Ok(Some(Self {
            code_name_base,
            release,
            specification_version,
            implementation_version: manifest
                .get_non_empty(ATTR_IMPLEMENTATION_VERSION)
                .map(String::from),
            provided_tokens: token_set(manifest.get(ATTR_PROVIDES)),
            required_tokens,
            public_packages,
            friends,
            deprecated,
            dependencies,
            dependency_specifiers,
            localizing_bundle: manifest
                .get_non_empty(ATTR_LOCALIZING_BUNDLE)
                .map(String::from),
            class_path,
        }))
    }

}

/// Split a dependency attribute into its clauses. A clause that does not
/// parse is logged and left out of the typed list, but its specifier (the
/// text before any `>` or `=`) is kept.
fn parse_dependencies(module: &str, value: Option<&str>) -> (Vec<Dependency>, Vec<String>) {
    let mut dependencies = Vec::new();
    let mut specifiers = Vec::new();
    let clauses = value
        .into_iter()
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .filter(|clause| !clause.is_empty());

    for clause in clauses {
        let head = clause
            .split(&['>', '='][..])
            .next()
            .unwrap_or(clause)
            .trim();
        if !head.is_empty() {
            specifiers.push(head.to_string());
        }
        match Dependency::parse(clause) {
            Ok(dep) => dependencies.push(dep),
            Err(e) => warn!("Ignoring dependency clause of {}: {}", module, e),
        }
    }
    (dependencies, specifiers)
}
