use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::core::error::{UniverseError, UniverseResult};

const MANIFEST_ENTRY: &str = "META-INF/MANIFEST.MF";

/// Main section of a JAR manifest.
///
/// Attribute order is kept; lookups ignore ASCII case as the JAR format
/// requires.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    attributes: Vec<(String, String)>,
}

impl Manifest {
    /// Parse manifest text. Only the main section is read: it ends at the
    /// first blank line after an attribute. A line starting with a single
    /// space continues the previous value.
    pub fn parse(text: &str) -> Self {
        let mut attributes: Vec<(String, String)> = Vec::new();
        for line in text.lines() {
            if line.is_empty() {
                if attributes.is_empty() {
                    continue;
                }
                break;
            }

            if let Some(rest) = line.strip_prefix(' ') {
                if let Some((_, value)) = attributes.last_mut() {
                    value.push_str(rest);
                }
                continue;
            }

            if let Some((key, value)) = line.split_once(':') {
                attributes.push((key.trim().to_string(), value.trim_start().to_string()));
            }
        }

        for (_, value) in attributes.iter_mut() {
            let trimmed = value.trim_end().len();
            value.truncate(trimmed);
        }

        Self { attributes }
    }

    /// Read `META-INF/MANIFEST.MF` from a JAR. A JAR without a manifest
    /// yields an empty one.
    pub fn read_from_jar(jar: &Path) -> UniverseResult<Self> {
        let file = File::open(jar).map_err(|e| UniverseError::io(jar, e))?;
        let mut archive = zip::ZipArchive::new(file)?;
        let mut entry = match archive.by_name(MANIFEST_ENTRY) {
            Ok(entry) => entry,
            Err(zip::result::ZipError::FileNotFound) => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };

        let mut bytes = Vec::new();
        entry
            .read_to_end(&mut bytes)
            .map_err(|e| UniverseError::io(jar, e))?;
        Ok(Self::parse(&String::from_utf8_lossy(&bytes)))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Value of `key`, `None` when missing or blank.
    pub fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testutil::write_jar;

    #[test]
    fn parse_reads_main_section_with_continuations() {
        let text = "Manifest-Version: 1.0\r\n\
                    OpenIDE-Module-Public-Packages: org.foo.api.*, org.foo.s\r\n \
                    pi.**\r\n\
                    Class-Path: ext/a.jar\r\n\
                    \r\n\
                    Name: org/foo/api/\r\n\
                    Sealed: true\r\n";
        let manifest = Manifest::parse(text);
        assert_eq!(manifest.len(), 3);
        assert_eq!(
            manifest.get("OpenIDE-Module-Public-Packages"),
            Some("org.foo.api.*, org.foo.spi.**")
        );
        assert_eq!(manifest.get("class-path"), Some("ext/a.jar"));
        assert_eq!(manifest.get("Sealed"), None);
    }

    #[test]
    fn blank_values_are_filtered() {
        let manifest = Manifest::parse("A: \nB: x\n");
        assert_eq!(manifest.get("A"), Some(""));
        assert_eq!(manifest.get_non_empty("A"), None);
        assert_eq!(manifest.get_non_empty("B"), Some("x"));
    }

    #[test]
    fn jar_without_manifest_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let jar = dir.path().join("plain.jar");
        write_jar(&jar, &[("a.txt", b"a".to_vec())], None);
        assert!(Manifest::read_from_jar(&jar).unwrap().is_empty());
    }

    #[test]
    fn manifest_is_read_from_jar() {
        let dir = tempfile::tempdir().unwrap();
        let jar = dir.path().join("m.jar");
        write_jar(&jar, &[], Some("Manifest-Version: 1.0\nOpenIDE-Module: org.foo/1\n\n"));
        let manifest = Manifest::read_from_jar(&jar).unwrap();
        assert_eq!(manifest.get("OpenIDE-Module"), Some("org.foo/1"));
    }

    #[test]
    fn missing_jar_reports_path() {
        let err = Manifest::read_from_jar(Path::new("/no/such/module.jar")).unwrap_err();
        assert!(err.to_string().contains("module.jar"));
    }
}
