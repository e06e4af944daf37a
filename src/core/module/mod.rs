mod dependency;
mod entry;
mod export;
mod version;

pub use dependency::{reduce_to_bases, Dependency, VersionRequirement};
pub use entry::{EntryKind, EntryLocation, ModuleEntry, JUNIT_PLACEHOLDER_CNB};
pub use export::PackageExport;
pub use version::{ReleaseRange, SpecVersion};

pub(crate) use entry::normalize_path;
