// ─── Module Universe Core ───
// Metadata cache over the modules of an installed IDE platform.
//
// Architecture:
//   core/
//     classfile/  — Constant-pool walker + JAR public class scan
//     manifest/   — JAR manifest, module attributes, localizing bundles
//     module/     — Module entries, dependencies, versions, exports
//     universe/   — Cluster scan, module lists, update tracking, caches
//     platform    — Platform installations (validity, harness, sources)
//     state/      — Persistent settings

pub mod classfile;
pub mod error;
pub mod manifest;
pub mod module;
pub mod platform;
pub mod state;
pub mod universe;

#[cfg(test)]
pub(crate) mod testutil;
