use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::core::classfile::is_public_class;
use crate::core::error::{UniverseError, UniverseResult};
use crate::core::module::{EntryKind, ModuleEntry, SpecVersion};
use crate::core::universe::ModuleList;

#[derive(Debug, Serialize)]
pub struct ModuleSummary {
    pub code_name_base: String,
    pub display_name: String,
    pub category: Option<String>,
    pub kind: EntryKind,
    pub jar: PathBuf,
    pub release_version: Option<u32>,
    pub specification_version: Option<SpecVersion>,
    pub deprecated: bool,
}

impl ModuleSummary {
    pub fn from_entry(entry: &ModuleEntry) -> Self {
        Self {
            code_name_base: entry.code_name_base().to_string(),
            display_name: entry.localized_name().to_string(),
            category: entry.category().map(str::to_string),
            kind: entry.kind(),
            jar: entry.jar().to_path_buf(),
            release_version: entry.release_version(),
            specification_version: entry.specification_version().cloned(),
            deprecated: entry.is_deprecated(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ModuleDetails {
    #[serde(flatten)]
    pub summary: ModuleSummary,
    pub implementation_version: Option<String>,
    pub cluster: PathBuf,
    pub class_path_extensions: Vec<PathBuf>,
    pub provided_tokens: Vec<String>,
    pub required_tokens: Vec<String>,
    pub public_packages: Vec<String>,
    /// `None` when every module may use the API.
    pub friends: Option<Vec<String>>,
    pub dependencies: Vec<String>,
    pub run_dependencies: Vec<String>,
    pub unsatisfied_dependencies: Vec<String>,
    pub short_description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DependencyAnswer {
    pub module: String,
    pub dependency: String,
    pub depends: bool,
}

fn require<'a>(list: &'a ModuleList, cnb: &str) -> UniverseResult<&'a ModuleEntry> {
    list.entry(cnb)
        .map(|e| e.as_ref())
        .ok_or_else(|| UniverseError::ModuleNotFound(cnb.to_string()))
}

pub fn list_modules(list: &ModuleList) -> Vec<ModuleSummary> {
    list.all_entries()
        .map(|e| ModuleSummary::from_entry(e))
        .collect()
}

pub fn describe_module(list: &ModuleList, cnb: &str) -> UniverseResult<ModuleDetails> {
    let entry = require(list, cnb)?;
    let unsatisfied = list
        .unsatisfied_dependencies(cnb)?
        .iter()
        .map(ToString::to_string)
        .collect();

    Ok(ModuleDetails {
        summary: ModuleSummary::from_entry(entry),
        implementation_version: entry.implementation_version().map(str::to_string),
        cluster: entry.cluster().to_path_buf(),
        class_path_extensions: entry.class_path_extensions().to_vec(),
        provided_tokens: entry.provided_tokens().iter().cloned().collect(),
        required_tokens: entry.required_tokens().iter().cloned().collect(),
        public_packages: entry.public_packages().iter().map(ToString::to_string).collect(),
        friends: entry.friends().map(|f| f.iter().cloned().collect()),
        dependencies: entry.dependencies().iter().map(ToString::to_string).collect(),
        run_dependencies: entry.run_dependencies().iter().cloned().collect(),
        unsatisfied_dependencies: unsatisfied,
        short_description: entry.bundle_info().short_description.clone(),
    })
}

pub fn public_classes(list: &ModuleList, cnb: &str) -> UniverseResult<Vec<String>> {
    let entry = require(list, cnb)?;
    Ok(entry.public_class_names().iter().cloned().collect())
}

pub fn depends_on(list: &ModuleList, module: &str, dependency: &str) -> UniverseResult<DependencyAnswer> {
    Ok(DependencyAnswer {
        module: module.to_string(),
        dependency: dependency.to_string(),
        depends: list.depends_on(module, dependency)?,
    })
}

pub fn closure(list: &ModuleList, cnb: &str) -> UniverseResult<Vec<String>> {
    Ok(list.runtime_closure(cnb)?.into_iter().collect())
}

pub fn providers(list: &ModuleList, token: &str) -> Vec<ModuleSummary> {
    list.providers_of(token)
        .into_iter()
        .map(|e| ModuleSummary::from_entry(e))
        .collect()
}

/// Check one loose `.class` file.
pub fn is_public_class_file(path: &Path) -> UniverseResult<bool> {
    let file = File::open(path).map_err(|e| UniverseError::io(path, e))?;
    let public = is_public_class(BufReader::new(file))?;
    info!("{}: public={}", path.display(), public);
    Ok(public)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testutil::{private_class, public_class, write_module_jar};
    use crate::core::universe::scan_cluster;

    fn cluster() -> (tempfile::TempDir, ModuleList) {
        let dir = tempfile::tempdir().unwrap();
        write_module_jar(
            &dir.path().join("modules/org-api.jar"),
            "org.api/2",
            &[
                ("OpenIDE-Module-Specification-Version", "1.4"),
                ("OpenIDE-Module-Public-Packages", "org.api.*"),
                ("OpenIDE-Module-Provides", "org.api.Service"),
                ("OpenIDE-Module-Friends", "org.impl"),
            ],
            &[
                ("org/api/Api.class", public_class("org/api/Api")),
                ("org/api/Hidden.class", private_class("org/api/Hidden")),
                ("org/api/Api$1.class", public_class("org/api/Api$1")),
            ],
        );
        write_module_jar(
            &dir.path().join("modules/org-impl.jar"),
            "org.impl",
            &[("OpenIDE-Module-Module-Dependencies", "org.api/2 > 1.5, org.gone")],
            &[],
        );
        let list = scan_cluster(dir.path(), None, None).unwrap();
        (dir, list)
    }

    #[test]
    fn listing_and_details() {
        let (_dir, list) = cluster();
        let names: Vec<_> = list_modules(&list)
            .into_iter()
            .map(|m| m.code_name_base)
            .collect();
        assert_eq!(names, ["org.api", "org.impl"]);

        let api = describe_module(&list, "org.api").unwrap();
        assert_eq!(api.summary.release_version, Some(2));
        assert_eq!(api.public_packages, ["org.api.*"]);
        assert_eq!(api.friends, Some(vec!["org.impl".to_string()]));

        let impl_ = describe_module(&list, "org.impl").unwrap();
        assert_eq!(impl_.run_dependencies, ["org.api", "org.gone"]);
        assert_eq!(impl_.unsatisfied_dependencies.len(), 2);

        let json = serde_json::to_value(&api).unwrap();
        assert_eq!(json["code_name_base"], "org.api");
        assert_eq!(json["specification_version"], "1.4");
        assert_eq!(json["kind"], "binary");
    }

    #[test]
    fn class_and_dependency_queries() {
        let (_dir, list) = cluster();
        assert_eq!(public_classes(&list, "org.api").unwrap(), ["org.api.Api"]);
        assert!(depends_on(&list, "org.impl", "org.api").unwrap().depends);
        assert!(!depends_on(&list, "org.api", "org.impl").unwrap().depends);
        assert_eq!(closure(&list, "org.impl").unwrap(), ["org.api", "org.gone"]);
        assert_eq!(providers(&list, "org.api.Service").len(), 1);
        assert!(matches!(
            describe_module(&list, "org.none"),
            Err(UniverseError::ModuleNotFound(_))
        ));
    }

    #[test]
    fn loose_class_file_check() {
        let dir = tempfile::tempdir().unwrap();
        let public = dir.path().join("A.class");
        let private = dir.path().join("B.class");
        std::fs::write(&public, public_class("A")).unwrap();
        std::fs::write(&private, private_class("B")).unwrap();
        assert!(is_public_class_file(&public).unwrap());
        assert!(!is_public_class_file(&private).unwrap());
        assert!(is_public_class_file(&dir.path().join("C.class")).is_err());
    }
}
