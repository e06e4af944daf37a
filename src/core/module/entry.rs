use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::dependency::{reduce_to_bases, Dependency};
use super::export::PackageExport;
use super::version::{ReleaseRange, SpecVersion};
use crate::core::classfile::{scan_jar_packages, scan_jar_public_classes};
use crate::core::error::UniverseResult;
use crate::core::manifest::{LocalizedBundleInfo, ModuleManifest};
use crate::core::universe::ClusterInfo;

pub const JUNIT_PLACEHOLDER_CNB: &str = "org.netbeans.libs.junit4";
const JUNIT_PLACEHOLDER_NAME: &str = "JUnit from Maven";
const JUNIT_MAVEN_JAR: &str = ".m2/repository/junit/junit/4.13.2/junit-4.13.2.jar";

/// Where an entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Module JAR of a platform cluster.
    Binary,
    /// Module JAR of an external cluster with its own source/javadoc roots.
    ExternalCluster,
    /// Stand-in for a library the platform does not ship.
    Placeholder,
}

/// Filesystem location of a module JAR inside a platform.
#[derive(Debug, Clone)]
pub struct EntryLocation {
    pub jar: PathBuf,
    pub cluster: PathBuf,
    /// Platform installation root (`netbeans.dest.dir`), or the cluster when
    /// the module is not part of a platform.
    pub dest_dir: PathBuf,
}

/// One module of the universe.
///
/// Built once when a cluster is scanned and immutable afterwards, apart
/// from the derived values computed on first access.
#[derive(Debug)]
pub struct ModuleEntry {
    kind: EntryKind,
    code_name_base: String,
    jar: PathBuf,
    cluster: PathBuf,
    dest_dir: PathBuf,
    class_path_extensions: Vec<PathBuf>,
    release: Option<ReleaseRange>,
    specification_version: Option<SpecVersion>,
    implementation_version: Option<String>,
    provided_tokens: BTreeSet<String>,
    required_tokens: BTreeSet<String>,
    public_packages: Vec<PackageExport>,
    friends: Option<BTreeSet<String>>,
    deprecated: bool,
    dependencies: Vec<Dependency>,
    run_dependencies: BTreeSet<String>,
    localizing_bundle: Option<String>,
    source_roots: Vec<PathBuf>,
    javadoc_roots: Vec<PathBuf>,

    bundle_info: OnceLock<LocalizedBundleInfo>,
    public_class_names: OnceLock<BTreeSet<String>>,
    package_names: OnceLock<BTreeSet<String>>,
}

/// Lexically resolve `.` and `..` without touching the filesystem.
pub(crate) fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

impl ModuleEntry {
    /// Build an entry from a parsed module manifest.
    ///
    /// `Class-Path` items are resolved against the directory of the JAR.
    /// With `cluster_info` set for a non-platform cluster the entry is an
    /// [`EntryKind::ExternalCluster`] carrying its source and javadoc roots.
    pub fn from_manifest(
        location: EntryLocation,
        manifest: ModuleManifest,
        cluster_info: Option<&ClusterInfo>,
    ) -> Self {
        let jar_dir = location
            .jar
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let class_path_extensions = manifest
            .class_path
            .iter()
            .map(|piece| normalize_path(&jar_dir.join(piece)))
            .collect();

        let run_dependencies = reduce_to_bases(&manifest.dependency_specifiers);

        let (kind, source_roots, javadoc_roots) = match cluster_info {
            Some(ci) if !ci.platform_cluster => (
                EntryKind::ExternalCluster,
                ci.source_roots.clone(),
                ci.javadoc_roots.clone(),
            ),
            _ => (EntryKind::Binary, Vec::new(), Vec::new()),
        };

        Self {
            kind,
            code_name_base: manifest.code_name_base,
            jar: location.jar,
            cluster: location.cluster,
            dest_dir: location.dest_dir,
            class_path_extensions,
            release: manifest.release,
            specification_version: manifest.specification_version,
            implementation_version: manifest.implementation_version,
            provided_tokens: manifest.provided_tokens,
            required_tokens: manifest.required_tokens,
            public_packages: manifest.public_packages,
            friends: manifest.friends,
            deprecated: manifest.deprecated,
            dependencies: manifest.dependencies,
            run_dependencies,
            localizing_bundle: manifest.localizing_bundle,
            source_roots,
            javadoc_roots,
            bundle_info: OnceLock::new(),
            public_class_names: OnceLock::new(),
            package_names: OnceLock::new(),
        }
    }

    /// Placeholder for the JUnit 4 library module, backed by the JAR in the
    /// local Maven repository when there is one.
    pub fn junit_placeholder(platform_root: &Path) -> Self {
        let cluster = platform_root.join("platform");
        let jar = cluster
            .join("modules")
            .join(format!("{}.jar", JUNIT_PLACEHOLDER_CNB.replace('.', "-")));
        let class_path_extensions = dirs::home_dir()
            .map(|home| vec![home.join(JUNIT_MAVEN_JAR)])
            .unwrap_or_default();

        Self {
            kind: EntryKind::Placeholder,
            code_name_base: JUNIT_PLACEHOLDER_CNB.to_string(),
            jar,
            cluster,
            dest_dir: platform_root.to_path_buf(),
            class_path_extensions,
            release: None,
            specification_version: None,
            implementation_version: None,
            provided_tokens: BTreeSet::new(),
            required_tokens: BTreeSet::new(),
            public_packages: vec![
                PackageExport::new("junit", true),
                PackageExport::new("org.junit", true),
            ],
            friends: None,
            deprecated: false,
            dependencies: Vec::new(),
            run_dependencies: BTreeSet::new(),
            localizing_bundle: None,
            source_roots: Vec::new(),
            javadoc_roots: Vec::new(),
            bundle_info: OnceLock::new(),
            public_class_names: OnceLock::new(),
            package_names: OnceLock::new(),
        }
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn code_name_base(&self) -> &str {
        &self.code_name_base
    }

    pub fn jar(&self) -> &Path {
        &self.jar
    }

    pub fn cluster(&self) -> &Path {
        &self.cluster
    }

    pub fn dest_dir(&self) -> &Path {
        &self.dest_dir
    }

    pub fn class_path_extensions(&self) -> &[PathBuf] {
        &self.class_path_extensions
    }

    /// Declared release, possibly a range of compatible majors.
    pub fn release(&self) -> Option<ReleaseRange> {
        self.release
    }

    /// Current major release: the top of the declared range.
    pub fn release_version(&self) -> Option<u32> {
        self.release.map(|r| r.high)
    }

    pub fn specification_version(&self) -> Option<&SpecVersion> {
        self.specification_version.as_ref()
    }

    pub fn implementation_version(&self) -> Option<&str> {
        self.implementation_version.as_deref()
    }

    pub fn provided_tokens(&self) -> &BTreeSet<String> {
        &self.provided_tokens
    }

    pub fn required_tokens(&self) -> &BTreeSet<String> {
        &self.required_tokens
    }

    pub fn public_packages(&self) -> &[PackageExport] {
        &self.public_packages
    }

    /// Declared friends; `None` means the API is open to every module.
    pub fn friends(&self) -> Option<&BTreeSet<String>> {
        self.friends.as_ref()
    }

    pub fn is_deprecated(&self) -> bool {
        self.deprecated
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    /// Code-name-bases this module needs at run time.
    pub fn run_dependencies(&self) -> &BTreeSet<String> {
        &self.run_dependencies
    }

    pub fn source_roots(&self) -> &[PathBuf] {
        &self.source_roots
    }

    pub fn javadoc_roots(&self) -> &[PathBuf] {
        &self.javadoc_roots
    }

    /// Whether `cnb` is a direct run-time dependency.
    pub fn runs_with(&self, cnb: &str) -> bool {
        self.run_dependencies.contains(cnb)
    }

    /// Whether `cnb` may use this module's API.
    pub fn is_friend(&self, cnb: &str) -> bool {
        self.friends.as_ref().map_or(true, |f| f.contains(cnb))
    }

    // ── Derived, computed once ──────────────────────────

    pub fn bundle_info(&self) -> &LocalizedBundleInfo {
        self.bundle_info.get_or_init(|| self.load_bundle_info())
    }

    /// Display name, falling back to the code-name-base.
    pub fn localized_name(&self) -> &str {
        self.bundle_info()
            .display_name
            .as_deref()
            .unwrap_or(&self.code_name_base)
    }

    pub fn category(&self) -> Option<&str> {
        self.bundle_info().category.as_deref()
    }

    /// Fully qualified names of the public API classes in exported
    /// packages. Empty when any JAR of the module cannot be scanned.
    pub fn public_class_names(&self) -> &BTreeSet<String> {
        self.public_class_names.get_or_init(|| {
            if self.kind == EntryKind::Placeholder {
                return BTreeSet::new();
            }
            let mut names = BTreeSet::new();
            match self.scan_public_classes(&mut names) {
                Ok(()) => names,
                Err(e) => {
                    info!(
                        "Cannot compute public classes of {} ({}): {}",
                        self.code_name_base,
                        self.jar.display(),
                        e
                    );
                    BTreeSet::new()
                }
            }
        })
    }

    pub fn is_public_class_name(&self, class_name: &str) -> bool {
        self.public_class_names().contains(class_name)
    }

    /// Every package with classes in the module JAR and its extensions.
    pub fn package_names(&self) -> &BTreeSet<String> {
        self.package_names.get_or_init(|| {
            let mut packages = BTreeSet::new();
            for jar in self.jars() {
                if let Err(e) = scan_jar_packages(jar, &mut packages) {
                    debug!("Cannot list packages of {}: {}", jar.display(), e);
                }
            }
            packages
        })
    }

    fn jars(&self) -> impl Iterator<Item = &Path> {
        std::iter::once(self.jar.as_path()).chain(
            self.class_path_extensions
                .iter()
                .map(PathBuf::as_path)
                .filter(|ext| ext.is_file()),
        )
    }

    fn scan_public_classes(&self, names: &mut BTreeSet<String>) -> UniverseResult<()> {
        for jar in self.jars() {
            scan_jar_public_classes(jar, &self.public_packages, names)?;
        }
        Ok(())
    }

    fn load_bundle_info(&self) -> LocalizedBundleInfo {
        if self.kind == EntryKind::Placeholder {
            return LocalizedBundleInfo {
                display_name: Some(JUNIT_PLACEHOLDER_NAME.to_string()),
                ..LocalizedBundleInfo::EMPTY
            };
        }
        let Some(resource) = &self.localizing_bundle else {
            return LocalizedBundleInfo::EMPTY;
        };
        LocalizedBundleInfo::read_from_jar(&self.jar, resource).unwrap_or_else(|e| {
            debug!(
                "Cannot read bundle {} of {}: {}",
                resource, self.code_name_base, e
            );
            LocalizedBundleInfo::EMPTY
        })
    }
}

impl std::fmt::Display for ModuleEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]", self.code_name_base, self.jar.display())
    }
}
