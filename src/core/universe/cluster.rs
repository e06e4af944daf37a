use quick_xml::de::from_str;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use super::module_list::ModuleList;
use crate::core::error::{UniverseError, UniverseResult};
use crate::core::manifest::{Manifest, ModuleManifest};
use crate::core::module::{EntryLocation, ModuleEntry};

/// Cluster sub-directories that hold module JARs.
pub const MODULE_DIRS: [&str; 5] = ["modules", "modules/eager", "modules/autoload", "lib", "core"];

/// Extra data for clusters that are not part of the platform itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterInfo {
    #[serde(default)]
    pub source_roots: Vec<PathBuf>,
    #[serde(default)]
    pub javadoc_roots: Vec<PathBuf>,
    #[serde(default)]
    pub platform_cluster: bool,
}

/// `config/Modules/<cnb>.xml` module status descriptor.
#[derive(Debug, Deserialize, Default)]
struct ModuleStatus {
    #[serde(rename = "@name", default)]
    name: Option<String>,
    #[serde(rename = "param", default)]
    params: Vec<StatusParam>,
}

#[derive(Debug, Deserialize, Default)]
struct StatusParam {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "$text", default)]
    value: String,
}

impl ModuleStatus {
    fn parse(xml: &str) -> UniverseResult<Self> {
        Ok(from_str(xml)?)
    }

    fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.trim())
            .filter(|v| !v.is_empty())
    }
}

/// Sorted directory listing, filtered by `keep`.
fn list_dir(dir: &Path, keep: impl Fn(&Path) -> bool) -> UniverseResult<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| UniverseError::io(dir, e))? {
        let path = entry.map_err(|e| UniverseError::io(dir, e))?.path();
        if keep(&path) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension().is_some_and(|e| e == ext)
}

struct ClusterScan<'a> {
    cluster: &'a Path,
    dest_dir: &'a Path,
    info: Option<&'a ClusterInfo>,
    entries: BTreeMap<String, Arc<ModuleEntry>>,
    shadowed: Vec<Arc<ModuleEntry>>,
}

impl ClusterScan<'_> {
    fn scan_jar(&mut self, jar: &Path) {
        let manifest = match Manifest::read_from_jar(jar) {
            Ok(m) => m,
            Err(e) => {
                warn!("Skipping unreadable JAR {}: {}", jar.display(), e);
                return;
            }
        };
        let module = match ModuleManifest::from_manifest(&manifest) {
            Ok(Some(module)) => module,
            Ok(None) => return,
            Err(e) => {
                warn!("Skipping {} with invalid module manifest: {}", jar.display(), e);
                return;
            }
        };

        let entry = ModuleEntry::from_manifest(
            EntryLocation {
                jar: jar.to_path_buf(),
                cluster: self.cluster.to_path_buf(),
                dest_dir: self.dest_dir.to_path_buf(),
            },
            module,
            self.info,
        );

        if let Some(prev) = self.entries.get(entry.code_name_base()) {
            warn!(
                "Two modules found with the same code name base ({}): {} and {}",
                entry.code_name_base(),
                prev,
                entry
            );
            self.shadowed.push(Arc::new(entry));
            return;
        }
        self.entries
            .insert(entry.code_name_base().to_string(), Arc::new(entry));
    }

    fn scan_status_descriptors(&mut self) -> UniverseResult<()> {
        let configs = self.cluster.join("config").join("Modules");
        if !configs.is_dir() {
            return Ok(());
        }
        for xml in list_dir(&configs, |p| has_extension(p, "xml"))? {
            let Some(stem) = xml.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let cnb = stem.replace('-', ".");
            if self.entries.contains_key(&cnb) {
                continue;
            }

            let text = std::fs::read_to_string(&xml).map_err(|e| UniverseError::io(&xml, e))?;
            let status = match ModuleStatus::parse(&text) {
                Ok(status) => status,
                Err(e) => {
                    warn!("Cannot parse module status {}: {}", xml.display(), e);
                    continue;
                }
            };
            if let Some(jar) = status.param("jar") {
                let jar = self.cluster.join(jar);
                if jar.is_file() {
                    debug!(
                        "Module {} located through {}",
                        status.name.as_deref().unwrap_or(&cnb),
                        xml.display()
                    );
                    self.scan_jar(&jar);
                }
            }
        }
        Ok(())
    }
}

/// Scan one cluster directory for modules.
///
/// JARs in [`MODULE_DIRS`] come first, then modules only known through a
/// `config/Modules` descriptor. JARs without an `OpenIDE-Module` attribute
/// are ignored; the first JAR wins when two declare the same module.
pub fn scan_cluster(
    cluster: &Path,
    dest_dir: Option<&Path>,
    info: Option<&ClusterInfo>,
) -> UniverseResult<ModuleList> {
    let mut scan = ClusterScan {
        cluster,
        dest_dir: dest_dir.unwrap_or(cluster),
        info,
        entries: BTreeMap::new(),
        shadowed: Vec::new(),
    };

    for module_dir in MODULE_DIRS {
        let dir = cluster.join(module_dir);
        if !dir.is_dir() {
            continue;
        }
        for jar in list_dir(&dir, |p| p.is_file() && has_extension(p, "jar"))? {
            scan.scan_jar(&jar);
        }
    }
    scan.scan_status_descriptors()?;

    debug!(
        "Scanned cluster {}: {} modules",
        cluster.display(),
        scan.entries.len()
    );
    Ok(ModuleList::new(scan.entries, dest_dir.map(Path::to_path_buf))
        .with_shadowed(scan.shadowed))
}

/// Every sub-directory of a platform root is a cluster.
pub fn list_clusters(root: &Path) -> UniverseResult<Vec<PathBuf>> {
    list_dir(root, Path::is_dir)
}
