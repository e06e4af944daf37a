use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::cluster::{list_clusters, scan_cluster, ClusterInfo};
use super::module_list::ModuleList;
use super::tracking::binary_nbm_files;
use crate::core::module::{normalize_path, EntryKind, ModuleEntry, JUNIT_PLACEHOLDER_CNB};

/// Session-wide cache of scanned clusters and platforms.
///
/// Scans happen once per directory until [`ModuleUniverse::refresh`]. A
/// directory that cannot be scanned caches as an empty list.
#[derive(Debug, Default)]
pub struct ModuleUniverse {
    /// Keyed by cluster directory.
    cluster_lists: Mutex<HashMap<PathBuf, Arc<ModuleList>>>,
    /// Keyed by platform root.
    binary_lists: Mutex<HashMap<PathBuf, Arc<ModuleList>>>,
    /// Every file known to belong to a binary module.
    known_entries: Mutex<HashMap<PathBuf, Vec<Arc<ModuleEntry>>>>,
}

impl ModuleUniverse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Modules of one cluster.
    ///
    /// `dest_dir` is the platform root the cluster belongs to; `info` marks
    /// an external cluster with its own source and javadoc roots.
    pub fn cluster_list(
        &self,
        cluster: &Path,
        dest_dir: Option<&Path>,
        info: Option<&ClusterInfo>,
    ) -> Arc<ModuleList> {
        let mut lists = self.cluster_lists.lock();
        if let Some(list) = lists.get(cluster) {
            return Arc::clone(list);
        }

        let list = match scan_cluster(cluster, dest_dir, info) {
            Ok(list) => {
                self.register(cluster, &list);
                list
            }
            Err(e) => {
                info!("Cannot scan cluster {}: {}", cluster.display(), e);
                ModuleList::empty(dest_dir.map(Path::to_path_buf))
            }
        };
        let list = Arc::new(list);
        lists.insert(cluster.to_path_buf(), Arc::clone(&list));
        list
    }

    /// Modules of a whole platform installation: every sub-directory of
    /// `root` is scanned as a cluster, earlier clusters (by name) winning
    /// conflicts. A missing root yields an empty list. The JUnit placeholder
    /// is added when the platform does not ship that module.
    pub fn binary_list(&self, root: &Path) -> Arc<ModuleList> {
        let mut lists = self.binary_lists.lock();
        if let Some(list) = lists.get(root) {
            return Arc::clone(list);
        }

        let clusters = match list_clusters(root) {
            Ok(clusters) => clusters,
            Err(e) => {
                info!("No modules available under {}: {}", root.display(), e);
                Vec::new()
            }
        };

        let cluster_lists: Vec<Arc<ModuleList>> = clusters
            .iter()
            .map(|cluster| self.cluster_list(cluster, Some(root), None))
            .collect();
        let mut merged =
            ModuleList::merge(cluster_lists.iter().map(Arc::as_ref), Some(root.to_path_buf()));
        if merged.entry(JUNIT_PLACEHOLDER_CNB).is_none() {
            merged.insert_if_absent(ModuleEntry::junit_placeholder(root));
        }

        debug!(
            "Platform {}: {} clusters, {} modules",
            root.display(),
            clusters.len(),
            merged.len()
        );
        let merged = Arc::new(merged);
        lists.insert(root.to_path_buf(), Arc::clone(&merged));
        merged
    }

    fn register(&self, cluster: &Path, list: &ModuleList) {
        let mut known = self.known_entries.lock();
        for entry in list.all_entries().chain(list.shadowed_entries()) {
            let files = match binary_nbm_files(cluster, entry.code_name_base(), entry.jar()) {
                Ok(files) => files,
                Err(e) => {
                    warn!(
                        "Cannot read update tracking of {}: {}",
                        entry.code_name_base(),
                        e
                    );
                    std::iter::once(entry.jar().to_path_buf()).collect()
                }
            };
            for file in files {
                known
                    .entry(normalize_path(&file))
                    .or_default()
                    .push(Arc::clone(entry));
            }
        }
    }

    pub fn has_known_entries(&self) -> bool {
        !self.known_entries.lock().is_empty()
    }

    /// Entries owning `file`: a module JAR, its update-tracking descriptor
    /// or a file that descriptor lists.
    pub fn known_entries(&self, file: &Path) -> Vec<Arc<ModuleEntry>> {
        self.known_entries
            .lock()
            .get(&normalize_path(file))
            .cloned()
            .unwrap_or_default()
    }

    fn external_entry(&self, file: &Path) -> Option<Arc<ModuleEntry>> {
        self.known_entries(file)
            .into_iter()
            .find(|e| e.kind() == EntryKind::ExternalCluster)
    }

    /// Source roots configured for the external cluster owning `jar`, or
    /// any other file known to belong to one of its modules.
    pub fn source_roots_for_jar(&self, jar: &Path) -> Vec<PathBuf> {
        self.external_entry(jar)
            .map(|e| e.source_roots().to_vec())
            .unwrap_or_default()
    }

    /// Javadoc roots configured for the external cluster owning `jar`.
    pub fn javadoc_roots_for_jar(&self, jar: &Path) -> Vec<PathBuf> {
        self.external_entry(jar)
            .map(|e| e.javadoc_roots().to_vec())
            .unwrap_or_default()
    }

    /// Forget every cached scan.
    pub fn refresh(&self) {
        self.binary_lists.lock().clear();
        self.cluster_lists.lock().clear();
        self.known_entries.lock().clear();
        debug!("Module universe caches cleared");
    }

    /// Forget one cluster and every platform that includes it.
    pub fn refresh_cluster(&self, cluster: &Path) {
        self.binary_lists
            .lock()
            .retain(|root, _| !cluster.starts_with(root));
        self.cluster_lists.lock().remove(cluster);
        self.known_entries.lock().retain(|_, entries| {
            entries.retain(|e| e.cluster() != cluster);
            !entries.is_empty()
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testutil::{public_class, write_module_jar};

    fn platform() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write_module_jar(
            &root.join("platform/modules/org-openide-util.jar"),
            "org.openide.util/9",
            &[("OpenIDE-Module-Public-Packages", "org.openide.util.*")],
            &[("org/openide/util/Lookup.class", public_class("org/openide/util/Lookup"))],
        );
        write_module_jar(
            &root.join("ide/modules/org-netbeans-modules-editor.jar"),
            "org.netbeans.modules.editor/3",
            &[("OpenIDE-Module-Module-Dependencies", "org.openide.util/9 > 9.0")],
            &[],
        );
        // Same module in a later cluster loses.
        write_module_jar(
            &root.join("z-extra/modules/org-openide-util.jar"),
            "org.openide.util/9",
            &[],
            &[],
        );
        std::fs::create_dir_all(root.join("platform/update_tracking")).unwrap();
        std::fs::write(
            root.join("platform/update_tracking/org-openide-util.xml"),
            r#"<module codename="org.openide.util/9"><module_version last="true"><file name="modules/org-openide-util.jar"/></module_version></module>"#,
        )
        .unwrap();
        dir
    }

    #[test]
    fn binary_list_merges_clusters_and_adds_placeholder() {
        let dir = platform();
        let universe = ModuleUniverse::new();
        let list = universe.binary_list(dir.path());

        assert_eq!(list.len(), 3);
        let util = list.entry("org.openide.util").unwrap();
        assert!(util.cluster().ends_with("platform"));
        assert_eq!(util.dest_dir(), dir.path());
        assert!(list.entry(JUNIT_PLACEHOLDER_CNB).is_some());
        assert!(list
            .depends_on("org.netbeans.modules.editor", "org.openide.util")
            .unwrap());
    }

    #[test]
    fn scans_are_memoized_until_refresh() {
        let dir = platform();
        let universe = ModuleUniverse::new();
        let first = universe.binary_list(dir.path());
        let second = universe.binary_list(dir.path());
        assert!(Arc::ptr_eq(&first, &second));

        universe.refresh();
        assert!(!universe.has_known_entries());
        let third = universe.binary_list(dir.path());
        assert!(!Arc::ptr_eq(&first, &third));
    }

    #[test]
    fn refresh_cluster_drops_owning_platform() {
        let dir = platform();
        let universe = ModuleUniverse::new();
        let first = universe.binary_list(dir.path());
        universe.refresh_cluster(&dir.path().join("ide"));
        let second = universe.binary_list(dir.path());
        assert!(!Arc::ptr_eq(&first, &second));
        assert!(!universe
            .known_entries(&dir.path().join("platform/modules/org-openide-util.jar"))
            .is_empty());
    }

    #[test]
    fn missing_root_is_empty_apart_from_placeholder() {
        let universe = ModuleUniverse::new();
        let list = universe.binary_list(Path::new("/definitely/not/a/platform"));
        assert_eq!(list.len(), 1);
        assert!(list.entry(JUNIT_PLACEHOLDER_CNB).is_some());
    }

    #[test]
    fn known_entries_cover_tracked_files() {
        let dir = platform();
        let universe = ModuleUniverse::new();
        universe.binary_list(dir.path());

        let tracking = dir.path().join("platform/update_tracking/org-openide-util.xml");
        let owners = universe.known_entries(&tracking);
        assert_eq!(owners.len(), 1);
        assert_eq!(owners[0].code_name_base(), "org.openide.util");

        let via_dotdot = dir
            .path()
            .join("ide/../platform/modules/org-openide-util.jar");
        assert_eq!(universe.known_entries(&via_dotdot).len(), 1);
    }

    #[test]
    fn losing_duplicate_jar_is_still_known() {
        let dir = tempfile::tempdir().unwrap();
        let cluster = dir.path().join("c");
        let first = cluster.join("modules/a-first.jar");
        let second = cluster.join("modules/b-second.jar");
        write_module_jar(&first, "org.dup", &[], &[]);
        write_module_jar(&second, "org.dup", &[], &[]);

        let universe = ModuleUniverse::new();
        let list = universe.cluster_list(&cluster, None, None);
        assert_eq!(list.len(), 1);
        assert_eq!(universe.known_entries(&first)[0].jar(), first.as_path());
        let owners = universe.known_entries(&second);
        assert_eq!(owners.len(), 1);
        assert_eq!(owners[0].jar(), second.as_path());
    }

    #[test]
    fn external_cluster_roots_are_found_by_jar() {
        let dir = tempfile::tempdir().unwrap();
        let cluster = dir.path().join("mycluster");
        let jar = cluster.join("modules/org-mine.jar");
        write_module_jar(&jar, "org.mine", &[], &[]);
        let info = ClusterInfo {
            source_roots: vec![dir.path().join("src")],
            javadoc_roots: vec![dir.path().join("javadoc")],
            platform_cluster: false,
        };

        let universe = ModuleUniverse::new();
        let list = universe.cluster_list(&cluster, None, Some(&info));
        assert_eq!(list.len(), 1);
        assert_eq!(universe.source_roots_for_jar(&jar), [dir.path().join("src")]);
        assert_eq!(universe.javadoc_roots_for_jar(&jar), [dir.path().join("javadoc")]);
        assert!(universe
            .source_roots_for_jar(&dir.path().join("other.jar"))
            .is_empty());
    }

    #[test]
    fn external_cluster_roots_are_found_by_tracked_file() {
        let dir = tempfile::tempdir().unwrap();
        let cluster = dir.path().join("mycluster");
        write_module_jar(&cluster.join("modules/org-mine.jar"), "org.mine", &[], &[]);
        std::fs::create_dir_all(cluster.join("modules/ext")).unwrap();
        std::fs::write(cluster.join("modules/ext/helper.jar"), b"x").unwrap();
        std::fs::create_dir_all(cluster.join("update_tracking")).unwrap();
        let tracking = cluster.join("update_tracking/org-mine.xml");
        std::fs::write(
            &tracking,
            r#"<module codename="org.mine"><module_version last="true"><file name="modules/org-mine.jar"/><file name="modules/ext/helper.jar"/></module_version></module>"#,
        )
        .unwrap();
        let info = ClusterInfo {
            source_roots: vec![dir.path().join("src")],
            javadoc_roots: Vec::new(),
            platform_cluster: false,
        };

        let universe = ModuleUniverse::new();
        universe.cluster_list(&cluster, None, Some(&info));
        assert_eq!(universe.source_roots_for_jar(&tracking), [dir.path().join("src")]);
        assert_eq!(
            universe.source_roots_for_jar(&cluster.join("modules/ext/helper.jar")),
            [dir.path().join("src")]
        );
    }
}
