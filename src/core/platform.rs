use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::core::error::{UniverseError, UniverseResult};
use crate::core::manifest::{Manifest, ModuleManifest};
use crate::core::module::SpecVersion;
use crate::core::state::PlatformConfig;
use crate::core::universe::{abbreviate, ModuleList, ModuleUniverse};

const HARNESS_JAR: &str = "harness/modules/org-netbeans-modules-apisupport-harness.jar";
const PLATFORM_MARKERS: [&str; 2] = ["core/core.jar", "lib/boot.jar"];

/// An installed platform: a root directory holding clusters.
#[derive(Debug)]
pub struct NbPlatform {
    id: String,
    label: String,
    dest_dir: PathBuf,
    source_roots: Vec<PathBuf>,
    javadoc_roots: Vec<PathBuf>,
    universe: Arc<ModuleUniverse>,

    modules: OnceLock<Arc<ModuleList>>,
    harness_version: OnceLock<Option<SpecVersion>>,
}

/// Serializable view of a platform.
#[derive(Debug, Clone, Serialize)]
pub struct PlatformSummary {
    pub id: String,
    pub label: String,
    pub dest_dir: PathBuf,
    pub valid: bool,
    pub harness_version: Option<SpecVersion>,
    pub module_count: usize,
    /// When the module list was scanned.
    pub scanned_at: DateTime<Utc>,
}

impl NbPlatform {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        dest_dir: impl Into<PathBuf>,
        universe: Arc<ModuleUniverse>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            dest_dir: dest_dir.into(),
            source_roots: Vec::new(),
            javadoc_roots: Vec::new(),
            universe,
            modules: OnceLock::new(),
            harness_version: OnceLock::new(),
        }
    }

    pub fn from_config(config: &PlatformConfig, universe: Arc<ModuleUniverse>) -> Self {
        let label = config.label.clone().unwrap_or_else(|| config.id.clone());
        let mut platform = Self::new(config.id.clone(), label, config.dest_dir.clone(), universe);
        platform.source_roots = config.sources.clone();
        platform.javadoc_roots = config.javadoc.clone();
        platform
    }

    /// Pick the configured platform with `id`.
    pub fn find(
        configs: &[PlatformConfig],
        id: &str,
        universe: Arc<ModuleUniverse>,
    ) -> UniverseResult<Self> {
        configs
            .iter()
            .find(|c| c.id == id)
            .map(|c| Self::from_config(c, universe))
            .ok_or_else(|| UniverseError::PlatformNotFound(id.to_string()))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn dest_dir(&self) -> &Path {
        &self.dest_dir
    }

    pub fn source_roots(&self) -> &[PathBuf] {
        &self.source_roots
    }

    pub fn javadoc_roots(&self) -> &[PathBuf] {
        &self.javadoc_roots
    }

    /// A platform needs a `platform*` cluster with a core or boot JAR.
    pub fn is_valid(&self) -> bool {
        let Ok(entries) = std::fs::read_dir(&self.dest_dir) else {
            return false;
        };
        entries.flatten().any(|entry| {
            let path = entry.path();
            let is_platform_cluster = entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with("platform"));
            is_platform_cluster
                && path.is_dir()
                && PLATFORM_MARKERS.iter().any(|m| path.join(m).is_file())
        })
    }

    /// Modules of every cluster of the platform, scanned once.
    pub fn modules(&self) -> Arc<ModuleList> {
        Arc::clone(self.modules.get_or_init(|| {
            if !self.is_valid() {
                info!("Platform {} at {} is not valid", self.id, self.dest_dir.display());
                return Arc::new(ModuleList::empty(Some(self.dest_dir.clone())));
            }
            self.universe.binary_list(&self.dest_dir)
        }))
    }

    /// Specification version of the build harness, when installed.
    pub fn harness_version(&self) -> Option<&SpecVersion> {
        self.harness_version
            .get_or_init(|| {
                let jar = self.dest_dir.join(HARNESS_JAR);
                if !jar.is_file() {
                    return None;
                }
                match read_spec_version(&jar) {
                    Ok(version) => version,
                    Err(e) => {
                        debug!("Cannot read harness version from {}: {}", jar.display(), e);
                        None
                    }
                }
            })
            .as_ref()
    }

    /// Source directory of the module built into `jar`: the first source
    /// root with a directory named after the abbreviated code-name-base.
    pub fn source_location_for(&self, jar: &Path) -> Option<PathBuf> {
        let modules = self.modules();
        let entry = modules.all_entries().find(|e| e.jar() == jar)?;
        let dir_name = abbreviate(entry.code_name_base());
        self.source_roots
            .iter()
            .map(|root| root.join(&dir_name))
            .find(|candidate| candidate.is_dir())
    }

    pub fn summary(&self) -> PlatformSummary {
        let modules = self.modules();
        PlatformSummary {
            id: self.id.clone(),
            label: self.label.clone(),
            dest_dir: self.dest_dir.clone(),
            valid: self.is_valid(),
            harness_version: self.harness_version().cloned(),
            module_count: modules.len(),
            scanned_at: modules.scanned_at(),
        }
    }
}

fn read_spec_version(jar: &Path) -> UniverseResult<Option<SpecVersion>> {
    let manifest = Manifest::read_from_jar(jar)?;
    Ok(ModuleManifest::from_manifest(&manifest)?.and_then(|m| m.specification_version))
}
