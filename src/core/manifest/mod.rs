mod attributes;
mod bundle;
mod module;

pub use attributes::Manifest;
pub use bundle::LocalizedBundleInfo;
pub use module::{ModuleManifest, ATTR_MODULE, ATTR_MODULE_DEPENDENCIES, ATTR_PUBLIC_PACKAGES};
