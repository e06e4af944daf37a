use quick_xml::de::from_str;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::core::error::{UniverseError, UniverseResult};

/// `update_tracking/<cnb>.xml`: the files installed for a module.
#[derive(Debug, Deserialize, Default)]
pub struct UpdateTracking {
    #[serde(rename = "@codename", default)]
    pub codename: Option<String>,
    #[serde(rename = "module_version", default)]
    pub versions: Vec<TrackedVersion>,
}

#[derive(Debug, Deserialize, Default)]
pub struct TrackedVersion {
    #[serde(rename = "@last", default)]
    pub last: Option<String>,
    #[serde(rename = "@specification_version", default)]
    pub specification_version: Option<String>,
    #[serde(rename = "file", default)]
    pub files: Vec<TrackedFile>,
}

#[derive(Debug, Deserialize, Default)]
pub struct TrackedFile {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "@crc", default)]
    pub crc: Option<String>,
}

impl UpdateTracking {
    pub fn parse(xml: &str) -> UniverseResult<Self> {
        Ok(from_str(xml)?)
    }

    /// Files of the `module_version` marked `last="true"`.
    pub fn last_files(&self) -> impl Iterator<Item = &str> {
        self.versions
            .iter()
            .filter(|v| v.last.as_deref() == Some("true"))
            .flat_map(|v| v.files.iter().map(|f| f.name.as_str()))
    }
}

pub fn tracking_file(cluster: &Path, cnb: &str) -> PathBuf {
    cluster
        .join("update_tracking")
        .join(format!("{}.xml", cnb.replace('.', "-")))
}

/// Files belonging to a module's binary build: the JAR itself, plus the
/// update-tracking descriptor and every existing file it lists.
pub fn binary_nbm_files(cluster: &Path, cnb: &str, jar: &Path) -> UniverseResult<BTreeSet<PathBuf>> {
    let mut files = BTreeSet::new();
    files.insert(jar.to_path_buf());

    let tracking = tracking_file(cluster, cnb);
    if !tracking.is_file() {
        return Ok(files);
    }
    files.insert(tracking.clone());

    let xml = std::fs::read_to_string(&tracking).map_err(|e| UniverseError::io(&tracking, e))?;
    let doc = UpdateTracking::parse(&xml)?;
    for name in doc.last_files() {
        let file = cluster.join(name);
        if file.is_file() {
            files.insert(file);
        }
    }
    Ok(files)
}
