mod cache;
mod cluster;
mod module_list;
mod tracking;

pub use cache::ModuleUniverse;
pub use cluster::{list_clusters, scan_cluster, ClusterInfo, MODULE_DIRS};
pub use module_list::{abbreviate, ModuleList};
pub use tracking::{binary_nbm_files, tracking_file, TrackedFile, TrackedVersion, UpdateTracking};
