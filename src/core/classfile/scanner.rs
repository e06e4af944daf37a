use std::collections::BTreeSet;
use std::fs::File;
use std::path::Path;

use tracing::debug;

use super::reader::is_public_class;
use crate::core::error::{UniverseError, UniverseResult};
use crate::core::module::PackageExport;

const CLASS_SUFFIX: &str = ".class";

/// Heuristic for compiler-generated nested classes.
///
/// A `$`-separated component starting with a digit (`Outer$1`,
/// `Outer$1Local`) marks an anonymous or local class.
pub fn is_synthetic_nested(class_name: &str) -> bool {
    class_name
        .split('$')
        .skip(1)
        .any(|component| component.starts_with(|c: char| c.is_ascii_digit()))
}

/// Split a JAR entry name into `(package, simple_name)` in dotted form.
///
/// Returns `None` for non-class entries, directories, `META-INF` content
/// and the `module-info` / `package-info` descriptors.
fn class_entry_name(entry_name: &str) -> Option<(String, String)> {
    if entry_name.starts_with("META-INF/") {
        return None;
    }
    let binary_name = entry_name.strip_suffix(CLASS_SUFFIX)?;
    let (package, simple) = match binary_name.rsplit_once('/') {
        Some((package, simple)) => (package.replace('/', "."), simple),
        None => (String::new(), binary_name),
    };
    if simple.is_empty() || simple == "module-info" || simple == "package-info" {
        return None;
    }
    Some((package, simple.to_string()))
}

fn open_jar(jar: &Path) -> UniverseResult<zip::ZipArchive<File>> {
    let file = File::open(jar).map_err(|e| UniverseError::io(jar, e))?;
    Ok(zip::ZipArchive::new(file)?)
}

/// Collect the public top-level API classes of one JAR.
///
/// A class is collected when its package is covered by `exports`, it is
/// not a synthetic nested class and its `ACC_PUBLIC` flag is set. Any
/// unreadable class aborts the scan of this JAR.
pub fn scan_jar_public_classes(
    jar: &Path,
    exports: &[PackageExport],
    into: &mut BTreeSet<String>,
) -> UniverseResult<()> {
    if exports.is_empty() {
        return Ok(());
    }

    let mut archive = open_jar(jar)?;
    let mut checked = 0usize;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.is_dir() {
            continue;
        }
        let Some((package, simple)) = class_entry_name(entry.name()) else {
            continue;
        };
        if !exports.iter().any(|e| e.matches_package(&package)) {
            continue;
        }
        if is_synthetic_nested(&simple) {
            continue;
        }

        checked += 1;
        if is_public_class(&mut entry)? {
            let name = if package.is_empty() {
                simple
            } else {
                format!("{}.{}", package, simple)
            };
            into.insert(name);
        }
    }

    debug!(
        "Scanned {} exported classes in {}",
        checked,
        jar.display()
    );
    Ok(())
}

/// Collect every package of a JAR that holds at least one class.
pub fn scan_jar_packages(jar: &Path, into: &mut BTreeSet<String>) -> UniverseResult<()> {
    let archive = open_jar(jar)?;
    for name in archive.file_names() {
        if let Some((package, _)) = class_entry_name(name) {
            if !package.is_empty() {
                into.insert(package);
            }
        }
    }
    Ok(())
}
